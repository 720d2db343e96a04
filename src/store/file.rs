use std::{
    fs::{self, File, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    str,
    sync::Mutex,
};

use log::{debug, error};

use super::CredentialStore;
use crate::error::{Error, Result};
use crate::models::{User, DEFAULT_ROLE};

/// Flat `username,password_hash` file, one record per line.
pub struct FileStore {
    path: PathBuf,
    // check-then-append must not interleave
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> FileStore {
        FileStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(contents) => Ok(contents),
            Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Usernames must survive the line format: no delimiter, no control
/// characters, nothing that trimming on read would strip.
fn check_username(username: &str) -> Result<()> {
    if username.trim() != username {
        return Err(Error::invalid_input(
            "username cannot start or end with whitespace",
        ));
    }
    if username.chars().any(|c| c == ',' || c.is_control()) {
        return Err(Error::invalid_input(
            "username cannot contain commas or control characters",
        ));
    }
    Ok(())
}

/// Split a line at its first comma. Lines without one are skipped.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (username, hash) = line.split_once(',')?;
    Some((username.trim(), hash.trim()))
}

fn lookup<'a>(contents: &'a [u8], username: &str) -> Option<&'a str> {
    contents
        .split(|b| *b == b'\n')
        .enumerate()
        .find_map(|(n, bytes)| {
            let line = match str::from_utf8(bytes) {
                Ok(line) => line,
                Err(e) => {
                    debug!("skipping line {} in credential file: {}", n + 1, e);
                    return None;
                }
            };

            match parse_line(line) {
                Some((name, hash)) if name == username => Some(hash),
                Some(_) => None,
                None => {
                    if !line.trim().is_empty() {
                        debug!("skipping malformed line {} in credential file", n + 1);
                    }
                    None
                }
            }
        })
}

/// Append `record` with `write`, truncating back to the original length if
/// anything fails so no partial record is left behind.
fn append_record<F>(f: &mut File, record: &[u8], write: F) -> io::Result<()>
where
    F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
    let original_len = f.metadata()?.len();

    if let Err(e) = write(f, record).and_then(|()| f.sync_data()) {
        if let Err(truncate) = f.set_len(original_len) {
            error!("failed to roll back partial credential record: {}", truncate);
        }
        return Err(e);
    }
    Ok(())
}

impl CredentialStore for FileStore {
    fn initialize(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(())
    }

    fn insert(&self, username: &str, password_hash: &str) -> Result<()> {
        check_username(username)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| Error::Storage(failure::err_msg("credential file lock poisoned")))?;

        let contents = self.read()?;
        if lookup(&contents, username).is_some() {
            return Err(Error::AlreadyExists(username.to_string()));
        }

        let mut record = String::new();
        if contents.last().map_or(false, |b| *b != b'\n') {
            record.push('\n');
        }
        record.push_str(username);
        record.push(',');
        record.push_str(password_hash);
        record.push('\n');

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        append_record(&mut f, record.as_bytes(), |f, bytes| f.write_all(bytes))?;

        debug!("appended user '{}' to {}", username, self.path.display());
        Ok(())
    }

    fn find(&self, username: &str) -> Result<Option<User>> {
        let contents = self.read()?;

        Ok(lookup(&contents, username).map(|hash| User {
            username: username.to_string(),
            password_hash: hash.to_string(),
            role: DEFAULT_ROLE.to_string(),
        }))
    }
}
