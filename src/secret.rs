use log::{error, warn};
use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::Path,
};

use crate::error::{Error, Result};

pub static PEPPER: &str = "dashboard_auth_pepper";
pub static COOKIE_KEY: &str = "dashboard_auth_cookie_key";

/// The cookie signing key must carry at least this many bytes.
pub const COOKIE_KEY_LEN: usize = 64;

/// Read the pepper mixed into every password hash. A missing file means the
/// hashes are not peppered.
pub fn pepper(dir: &Path) -> Result<Vec<u8>> {
    if !dir.join(PEPPER).exists() {
        warn!("{} not found, password hashes will not be peppered", PEPPER);
        return Ok(Vec::new());
    }

    secret(dir, PEPPER)
}

pub fn cookie_key(dir: &Path) -> Result<Vec<u8>> {
    let data = secret(dir, COOKIE_KEY)?;
    if data.len() < COOKIE_KEY_LEN {
        return Err(Error::Secret(
            COOKIE_KEY.to_string(),
            format!("need at least {} bytes, found {}", COOKIE_KEY_LEN, data.len()),
        ));
    }
    Ok(data)
}

fn secret<S>(dir: &Path, name: S) -> Result<Vec<u8>>
where
    S: AsRef<str>,
{
    let path = dir.join(name.as_ref());

    let mut f = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            match e.kind() {
                ErrorKind::NotFound => error!(
                    "{} not found. Make sure to create the '{}' secret with \
                     'docker secret create' before starting the service.",
                    path.display(),
                    name.as_ref(),
                ),
                _ => error!("Failed to open {}: {}", path.display(), e),
            }

            return Err(Error::Secret(name.as_ref().to_string(), e.to_string()));
        }
    };

    let mut data = Vec::new();
    f.read_to_end(&mut data)
        .map_err(|e| Error::Secret(name.as_ref().to_string(), e.to_string()))?;

    Ok(data)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn missing_pepper_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pepper(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn reads_pepper_bytes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PEPPER), "NAqdplo5YPcZ84UbCCvWH9OOTJOXAEzr").unwrap();
        assert_eq!(pepper(dir.path()).unwrap(), b"NAqdplo5YPcZ84UbCCvWH9OOTJOXAEzr");
    }

    #[test]
    fn short_cookie_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cookie_key(dir.path()).is_err());

        fs::write(dir.path().join(COOKIE_KEY), "ChzeqPjoSsrdO5xZ14gMoaW67yMn5Ev1").unwrap();
        match cookie_key(dir.path()) {
            Err(Error::Secret(name, _)) => assert_eq!(name, COOKIE_KEY),
            other => panic!("unexpected result: {:?}", other.map(|k| k.len())),
        }

        fs::write(dir.path().join(COOKIE_KEY), [7u8; 64]).unwrap();
        assert_eq!(cookie_key(dir.path()).unwrap().len(), 64);
    }
}
