use actix_identity::Identity;
use actix_web::{web, HttpResponse};

use super::UserResponse;
use crate::auth::Authenticator;
use crate::error::Error;

/// The user behind the current session cookie.
pub async fn session(
    id: Option<Identity>,
    auth: web::Data<Authenticator>,
) -> Result<HttpResponse, Error> {
    let username = match id {
        Some(id) => id.id().map_err(|e| Error::Session(e.to_string()))?,
        None => return Err(Error::InvalidCredentials),
    };

    let auth = auth.into_inner();
    let user = web::block(move || auth.user(&username))
        .await??
        .ok_or(Error::InvalidCredentials)?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
