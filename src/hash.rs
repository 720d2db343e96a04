use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Algorithm, Argon2, Params, Version,
};
use log::warn;
use ring::rand::{SecureRandom, SystemRandom};

use crate::config::HashCost;
use crate::error::{Error, Result};

lazy_static::lazy_static! {
    static ref RNG: SystemRandom = SystemRandom::new();
}

/// Generate a random 16-byte salt value.
fn random_salt(rng: &SystemRandom) -> Result<[u8; 16]> {
    let mut salt = [0; 16];
    rng.fill(&mut salt)
        .map_err(|_| Error::Hashing("system randomness unavailable".to_string()))?;
    Ok(salt)
}

/// Argon2id hasher producing self-contained PHC strings. The salt and cost
/// parameters travel inside the string; the pepper does not.
pub struct SaltedHasher {
    pepper: Vec<u8>,
    params: Params,
}

impl SaltedHasher {
    pub fn new(pepper: Vec<u8>, cost: HashCost) -> Result<SaltedHasher> {
        let params = Params::new(
            cost.memory_kib,
            cost.iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| Error::Config(format!("argon2 parameters: {}", e)))?;

        let hasher = SaltedHasher { pepper, params };
        hasher.argon2_session()?;
        Ok(hasher)
    }

    fn argon2_session(&self) -> Result<Argon2<'_>> {
        Argon2::new_with_secret(
            &self.pepper,
            Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
        .map_err(|e| Error::Hashing(e.to_string()))
    }

    /// Generate a fresh salt, then salt and pepper the password.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = random_salt(&RNG)?;
        let salt = SaltString::encode_b64(&salt).map_err(|e| Error::Hashing(e.to_string()))?;

        self.argon2_session()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Hashing(e.to_string()))
    }

    /// Check `password` against a stored PHC string. Unparseable hashes never
    /// match.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("stored password hash is malformed: {}", e);
                return false;
            }
        };

        match self.argon2_session() {
            Ok(argon2) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}
