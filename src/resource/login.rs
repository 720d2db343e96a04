use actix_identity::Identity;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use log::info;

use super::{Credentials, UserResponse};
use crate::auth::Authenticator;
use crate::error::Error;

pub async fn login(
    req: HttpRequest,
    params: web::Json<Credentials>,
    auth: web::Data<Authenticator>,
) -> Result<HttpResponse, Error> {
    let Credentials { username, password } = params.into_inner();
    let auth = auth.into_inner();

    let user = web::block(move || -> Result<_, Error> {
        if auth.verify(&username, &password)? {
            auth.user(&username)
        } else {
            Ok(None)
        }
    })
    .await??
    .ok_or(Error::InvalidCredentials)?;

    Identity::login(&req.extensions(), user.username.clone())
        .map_err(|e| Error::Session(e.to_string()))?;
    info!("'{}' logged in", user.username);

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
