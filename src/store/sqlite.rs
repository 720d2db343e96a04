use std::{fs, path::Path, time::Duration};

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use log::debug;

use super::CredentialStore;
use crate::error::{Error, Result};
use crate::models::{NewUser, User, UserRow};
use crate::schema::users;

type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

static CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT DEFAULT 'user'
)";

static IN_MEMORY: &str = ":memory:";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Lets writers from other pooled connections wait for the lock instead of
/// failing with SQLITE_BUSY.
#[derive(Debug)]
struct BusyTimeout;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for BusyTimeout {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT.as_millis()))
            .map_err(r2d2::Error::QueryError)
    }
}

/// Single-table SQLite credential store behind an r2d2 pool.
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SqliteStore> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let manager = ConnectionManager::<SqliteConnection>::new(path.to_string_lossy());
        let mut builder = r2d2::Pool::builder()
            .max_size(4)
            .connection_customizer(Box::new(BusyTimeout));
        // every connection to :memory: is its own database, so keep exactly one alive
        if path == Path::new(IN_MEMORY) {
            builder = builder.max_size(1).idle_timeout(None).max_lifetime(None);
        }
        let pool = builder.build(manager)?;

        Ok(SqliteStore { pool })
    }
}

impl CredentialStore for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let mut conn = self.pool.get()?;
        diesel::sql_query(CREATE_USERS).execute(&mut conn)?;
        Ok(())
    }

    fn insert(&self, username: &str, password_hash: &str) -> Result<()> {
        let mut conn = self.pool.get()?;

        let new_user = NewUser {
            username,
            password_hash,
        };

        match diesel::insert_into(users::table)
            .values(&new_user)
            .execute(&mut conn)
        {
            Ok(_) => {
                debug!("inserted user '{}'", username);
                Ok(())
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(Error::AlreadyExists(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find(&self, username: &str) -> Result<Option<User>> {
        let mut conn = self.pool.get()?;

        let row = users::table
            .filter(users::username.eq(username))
            .first::<UserRow>(&mut conn)
            .optional()?;

        Ok(row.map(|row| {
            debug!("found user '{}' (id {})", row.username, row.id);
            User::from(row)
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> SqliteStore {
        let store = SqliteStore::open(dir.path().join("DATA").join("users.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.insert("alice", "$argon2id$hash").unwrap();
        store.initialize().unwrap();
        assert!(store.find("alice").unwrap().is_some());
    }

    #[test]
    fn duplicate_insert_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.insert("alice", "first").unwrap();

        match store.insert("alice", "second") {
            Err(Error::AlreadyExists(name)) => assert_eq!(name, "alice"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(store.find("alice").unwrap().unwrap().password_hash, "first");
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.insert("alice", "lower").unwrap();
        store.insert("Alice", "upper").unwrap();
        assert_eq!(store.find("Alice").unwrap().unwrap().password_hash, "upper");
        assert!(store.find("ALICE").unwrap().is_none());
    }

    #[test]
    fn role_defaults_to_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.insert("bob", "hashed_password_here").unwrap();
        let bob = store.find("bob").unwrap().unwrap();
        assert_eq!(
            bob,
            User {
                username: "bob".to_string(),
                password_hash: "hashed_password_here".to_string(),
                role: "user".to_string(),
            }
        );
    }

    #[test]
    fn missing_table_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("users.db")).unwrap();
        assert!(matches!(store.find("alice"), Err(Error::Storage(_))));
    }

    #[test]
    fn in_memory_database_keeps_its_table() {
        let store = SqliteStore::open(":memory:").unwrap();
        store.initialize().unwrap();
        store.insert("alice", "hash").unwrap();
        assert_eq!(store.find("alice").unwrap().unwrap().password_hash, "hash");
        assert!(matches!(store.insert("alice", "other"), Err(Error::AlreadyExists(_))));
    }
}
