use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use failure::Fail;
use serde_json::json;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "invalid input: {}", _0)]
    InvalidInput(String),

    #[fail(display = "username '{}' already exists", _0)]
    AlreadyExists(String),

    #[fail(display = "invalid credentials")]
    InvalidCredentials,

    #[fail(display = "storage error: {}", _0)]
    Storage(failure::Error),

    #[fail(display = "password hashing failed: {}", _0)]
    Hashing(String),

    #[fail(display = "configuration error: {}", _0)]
    Config(String),

    #[fail(display = "failed to read secret '{}': {}", _0, _1)]
    Secret(String, String),

    #[fail(display = "session error: {}", _0)]
    Session(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input<S: Into<String>>(reason: S) -> Self {
        Error::InvalidInput(reason.into())
    }

    /// Whether the caller can fix this by changing its input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::AlreadyExists(_))
    }
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        Error::Storage(e.into())
    }
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Error::Storage(e.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.into())
    }
}

impl From<BlockingError> for Error {
    fn from(_: BlockingError) -> Self {
        Error::Storage(failure::err_msg("blocking thread pool is unavailable"))
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::Storage(_)
            | Error::Hashing(_)
            | Error::Config(_)
            | Error::Secret(..)
            | Error::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // internals stay in the server log
    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Error::InvalidInput(_) | Error::AlreadyExists(_) | Error::InvalidCredentials => {
                self.to_string()
            }
            _ => "internal error".to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}
