pub mod login;
pub mod logout;
pub mod register;
pub mod session;

pub use login::login;
pub use logout::logout;
pub use register::register;
pub use session::session;

use actix_web::web;
use serde::{Deserialize, Serialize};

use crate::models::User;

/// API Guide (keep updated!)
/// - /api/register
///     - POST { username, password, confirm? }: register user
/// - /api/auth
///     - POST { username, password }: log user in
///     - DELETE: log user out
///     - GET: get user data
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(4096)).service(
        web::scope("/api")
            .service(web::resource("/register").route(web::post().to(register)))
            .service(
                web::resource("/auth")
                    .route(web::post().to(login))
                    .route(web::delete().to(logout))
                    .route(web::get().to(session)),
            ),
    );
}

#[derive(Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct UserResponse {
    pub username: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            username: user.username,
            role: user.role,
        }
    }
}
