use dashboard_auth::{
    config::HashCost,
    hash::SaltedHasher,
    store::{CredentialStore, FileStore, SqliteStore},
    Authenticator,
};

pub fn cheap_hasher() -> SaltedHasher {
    SaltedHasher::new(
        b"integration-pepper".to_vec(),
        HashCost {
            memory_kib: 1024,
            iterations: 1,
        },
    )
    .expect("valid argon2 parameters")
}

pub fn authenticator(store: Box<dyn CredentialStore>) -> Authenticator {
    let auth = Authenticator::new(store, cheap_hasher(), 4);
    auth.initialize().expect("failed to initialize store");
    auth
}

pub fn sqlite(dir: &tempfile::TempDir) -> Authenticator {
    let store = SqliteStore::open(dir.path().join("DATA").join("intelligence_platform.db"))
        .expect("failed to open sqlite store");
    authenticator(Box::new(store))
}

pub fn file(dir: &tempfile::TempDir) -> Authenticator {
    authenticator(Box::new(FileStore::new(dir.path().join("DATA").join("users.txt"))))
}

/// Both backends, for tests that must hold for either.
pub fn backends(dir: &tempfile::TempDir) -> Vec<(&'static str, Authenticator)> {
    vec![("sqlite", sqlite(dir)), ("file", file(dir))]
}
