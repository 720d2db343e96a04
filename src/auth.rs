use std::sync::OnceLock;

use log::{error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::SaltedHasher;
use crate::models::User;
use crate::secret;
use crate::store::{self, CredentialStore};

/// Registration and login over a credential store.
pub struct Authenticator {
    store: Box<dyn CredentialStore>,
    hasher: SaltedHasher,
    min_password_length: usize,
    // verified against for unknown users so both failures cost one hash
    dummy_hash: OnceLock<String>,
}

impl Authenticator {
    pub fn new(
        store: Box<dyn CredentialStore>,
        hasher: SaltedHasher,
        min_password_length: usize,
    ) -> Authenticator {
        Authenticator {
            store,
            hasher,
            min_password_length,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Open the configured store and load the pepper. The store is not
    /// initialized yet.
    pub fn from_config(config: &Config) -> Result<Authenticator> {
        let store = store::open(&config.store)?;
        let hasher = SaltedHasher::new(secret::pepper(&config.secrets_dir)?, config.hash_cost)?;
        Ok(Authenticator::new(store, hasher, config.min_password_length))
    }

    pub fn initialize(&self) -> Result<()> {
        self.store.initialize()
    }

    pub fn register(&self, username: &str, password: &str) -> Result<()> {
        self.check_username(username)?;
        self.check_password(password)?;

        let password_hash = self.hasher.hash(password)?;

        match self.store.insert(username, &password_hash) {
            Ok(()) => {
                info!("registered user '{}'", username);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                warn!("registration rejected: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("registration of '{}' failed: {}", username, e);
                Err(e)
            }
        }
    }

    /// True iff `username` exists and `password` matches its stored hash.
    /// Only storage faults are errors.
    pub fn verify(&self, username: &str, password: &str) -> Result<bool> {
        let user = match self.store.find(username) {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.hasher.verify(password, self.dummy_hash());
                return Ok(false);
            }
            Err(e) => {
                error!("credential lookup for '{}' failed: {}", username, e);
                return Err(e);
            }
        };

        let verified = self.hasher.verify(password, &user.password_hash);
        if !verified {
            warn!("failed login for '{}'", username);
        }
        Ok(verified)
    }

    fn dummy_hash(&self) -> &str {
        self.dummy_hash.get_or_init(|| match self.hasher.hash("dummy password") {
            Ok(hash) => hash,
            Err(e) => {
                error!("failed to prepare dummy hash: {}", e);
                String::new()
            }
        })
    }

    pub fn user(&self, username: &str) -> Result<Option<User>> {
        self.store.find(username)
    }

    fn check_username(&self, username: &str) -> Result<()> {
        if username.is_empty() {
            return Err(Error::invalid_input("username cannot be empty"));
        }
        Ok(())
    }

    fn check_password(&self, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(Error::invalid_input("password cannot be empty"));
        }
        if password.chars().count() < self.min_password_length {
            return Err(Error::InvalidInput(format!(
                "password must be at least {} characters",
                self.min_password_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::hash::test::cheap_hasher;
    use crate::store::{FileStore, SqliteStore};

    pub fn sqlite_authenticator(dir: &tempfile::TempDir) -> Authenticator {
        let store = SqliteStore::open(dir.path().join("users.db")).unwrap();
        let auth = Authenticator::new(Box::new(store), cheap_hasher(), 4);
        auth.initialize().unwrap();
        auth
    }

    fn file_authenticator(dir: &tempfile::TempDir) -> Authenticator {
        let store = FileStore::new(dir.path().join("users.txt"));
        let auth = Authenticator::new(Box::new(store), cheap_hasher(), 4);
        auth.initialize().unwrap();
        auth
    }

    fn alice_scenario(auth: &Authenticator) {
        auth.register("alice", "sunshine").unwrap();
        assert!(auth.verify("alice", "sunshine").unwrap());
        assert!(!auth.verify("alice", "wrong").unwrap());

        assert!(matches!(
            auth.register("alice", "other"),
            Err(Error::AlreadyExists(_))
        ));
        assert!(auth.verify("alice", "sunshine").unwrap());
        assert!(!auth.verify("alice", "other").unwrap());
    }

    #[test]
    fn alice_scenario_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        alice_scenario(&sqlite_authenticator(&dir));
    }

    #[test]
    fn alice_scenario_file() {
        let dir = tempfile::tempdir().unwrap();
        alice_scenario(&file_authenticator(&dir));
    }

    #[test]
    fn empty_fields_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let auth = sqlite_authenticator(&dir);
        assert!(matches!(auth.register("", "x"), Err(Error::InvalidInput(_))));
        assert!(matches!(auth.register("bob", ""), Err(Error::InvalidInput(_))));
        assert!(auth.user("bob").unwrap().is_none());
    }

    #[test]
    fn password_policy_applies_to_every_caller() {
        let dir = tempfile::tempdir().unwrap();
        let auth = sqlite_authenticator(&dir);
        match auth.register("bob", "abc") {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("at least 4")),
            other => panic!("unexpected result: {:?}", other),
        }
        auth.register("bob", "abcd").unwrap();
        // counted in characters, not bytes
        auth.register("carol", "äöü€").unwrap();
    }

    #[test]
    fn usernames_that_break_the_file_format_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let auth = file_authenticator(&dir);
        for name in &["a,b", " alice", "alice ", "al\nice", "tab\there"] {
            assert!(
                matches!(auth.register(name, "sunshine"), Err(Error::InvalidInput(_))),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn unknown_user_does_not_verify() {
        let dir = tempfile::tempdir().unwrap();
        let auth = sqlite_authenticator(&dir);
        assert!(!auth.verify("nobody", "sunshine").unwrap());
        assert!(!auth.verify("", "").unwrap());
    }

    #[test]
    fn unknown_user_still_pays_for_a_hash() {
        let dir = tempfile::tempdir().unwrap();
        let auth = sqlite_authenticator(&dir);
        assert!(auth.dummy_hash.get().is_none());

        assert!(!auth.verify("nobody", "dummy password").unwrap());
        let dummy = auth.dummy_hash.get().unwrap();
        // same cost parameters as real records
        assert!(dummy.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));

        auth.register("nobody", "sunshine").unwrap();
        assert!(!auth.verify("nobody", "dummy password").unwrap());
    }

    #[test]
    fn sqlite_accepts_usernames_the_file_store_cannot_hold() {
        let dir = tempfile::tempdir().unwrap();
        let auth = sqlite_authenticator(&dir);
        auth.register("smith, john", "sunshine").unwrap();
        assert!(auth.verify("smith, john", "sunshine").unwrap());
    }

    #[test]
    fn same_password_different_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let auth = file_authenticator(&dir);
        auth.register("alice", "sunshine").unwrap();
        auth.register("bob", "sunshine").unwrap();

        let alice = auth.user("alice").unwrap().unwrap();
        let bob = auth.user("bob").unwrap().unwrap();
        assert_ne!(alice.password_hash, bob.password_hash);
        assert!(auth.verify("alice", "sunshine").unwrap());
        assert!(auth.verify("bob", "sunshine").unwrap());
    }
}
