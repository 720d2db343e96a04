use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::UserResponse;
use crate::auth::Authenticator;
use crate::error::Error;
use crate::models::DEFAULT_ROLE;

#[derive(Deserialize)]
pub struct RegisterParams {
    username: String,
    password: String,
    /// Repeated password from the registration form. Checked when present.
    #[serde(default)]
    confirm: Option<String>,
}

pub async fn register(
    params: web::Json<RegisterParams>,
    auth: web::Data<Authenticator>,
) -> Result<HttpResponse, Error> {
    let RegisterParams {
        username,
        password,
        confirm,
    } = params.into_inner();

    if confirm.map_or(false, |confirm| confirm != password) {
        return Err(Error::invalid_input("passwords do not match"));
    }

    let auth = auth.into_inner();

    // hashing is slow on purpose, keep it off the async workers
    let username = web::block(move || auth.register(&username, &password).map(|()| username))
        .await??;

    Ok(HttpResponse::Created().json(UserResponse {
        username,
        role: DEFAULT_ROLE.to_string(),
    }))
}
