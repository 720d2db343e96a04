use std::path::PathBuf;

use argon2::Params;

use crate::error::{Error, Result};

pub static DATABASE_URL: &str = "DATABASE_URL";
pub static DOMAIN: &str = "DOMAIN";
pub static BIND_ADDR: &str = "BIND_ADDR";
pub static SECRETS_DIR: &str = "SECRETS_DIR";
pub static MIN_PASSWORD_LENGTH: &str = "MIN_PASSWORD_LENGTH";
pub static HASH_MEMORY_KIB: &str = "HASH_MEMORY_KIB";
pub static HASH_ITERATIONS: &str = "HASH_ITERATIONS";

static DEFAULT_DATABASE: &str = "DATA/intelligence_platform.db";

/// Where the credentials live.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreLocation {
    Sqlite(PathBuf),
    File(PathBuf),
}

impl StoreLocation {
    /// `file://path` selects the flat-file store, anything else is an SQLite
    /// path with an optional `sqlite://` prefix.
    pub fn parse(url: &str) -> Result<StoreLocation> {
        let location = if let Some(path) = url.strip_prefix("file://") {
            StoreLocation::File(path.into())
        } else {
            let path = url.strip_prefix("sqlite://").unwrap_or(url);
            StoreLocation::Sqlite(path.into())
        };

        match &location {
            StoreLocation::Sqlite(p) | StoreLocation::File(p) if p.as_os_str().is_empty() => Err(
                Error::Config(format!("{}: empty store path in '{}'", DATABASE_URL, url)),
            ),
            _ => Ok(location),
        }
    }
}

/// Argon2 cost parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        HashCost {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub store: StoreLocation,
    pub domain: String,
    pub bind_addr: String,
    pub secrets_dir: PathBuf,
    pub min_password_length: usize,
    pub hash_cost: HashCost,
}

impl Config {
    /// Read the configuration from the process environment, after loading
    /// `.env` if one exists.
    pub fn from_env() -> Result<Config> {
        dotenv::dotenv().ok();
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(DATABASE_URL).unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let defaults = HashCost::default();

        Ok(Config {
            store: StoreLocation::parse(&url)?,
            domain: lookup(DOMAIN).unwrap_or_else(|| "localhost".to_string()),
            bind_addr: lookup(BIND_ADDR).unwrap_or_else(|| "localhost:8080".to_string()),
            secrets_dir: lookup(SECRETS_DIR)
                .unwrap_or_else(|| "/run/secrets".to_string())
                .into(),
            min_password_length: number(&lookup, MIN_PASSWORD_LENGTH, 4)?,
            hash_cost: HashCost {
                memory_kib: number(&lookup, HASH_MEMORY_KIB, defaults.memory_kib)?,
                iterations: number(&lookup, HASH_ITERATIONS, defaults.iterations)?,
            },
        })
    }
}

fn number<F, N>(lookup: &F, key: &str, default: N) -> Result<N>
where
    F: Fn(&str) -> Option<String>,
    N: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{}: '{}' is not a valid number", key, v))),
    }
}
