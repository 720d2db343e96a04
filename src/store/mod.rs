//! Credential persistence.
//!
//! Both backends expose the same contract: a username → password hash mapping
//! with an insert-if-absent operation. Uniqueness is enforced by the backend
//! itself, so concurrent registrations of one username see exactly one winner.

pub mod file;
pub mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

use crate::config::StoreLocation;
use crate::error::Result;
use crate::models::User;

pub trait CredentialStore: Send + Sync {
    /// Create the backing schema or file if it is absent. Safe to repeat.
    fn initialize(&self) -> Result<()>;

    /// Insert a new record. Fails with `Error::AlreadyExists` and leaves the
    /// store untouched when `username` is taken.
    fn insert(&self, username: &str, password_hash: &str) -> Result<()>;

    fn find(&self, username: &str) -> Result<Option<User>>;
}

pub fn open(location: &StoreLocation) -> Result<Box<dyn CredentialStore>> {
    Ok(match location {
        StoreLocation::Sqlite(path) => Box::new(SqliteStore::open(path)?),
        StoreLocation::File(path) => Box::new(FileStore::new(path)),
    })
}
