#[macro_use]
extern crate diesel;

pub mod auth;
pub mod config;
pub mod error;
pub mod hash;
pub mod models;
pub mod resource;
pub mod schema;
pub mod secret;
pub mod shell;
pub mod store;

pub use auth::Authenticator;
pub use config::Config;
pub use error::Error;
pub use models::User;
