use actix_identity::Identity;
use actix_web::HttpResponse;

pub async fn logout(id: Option<Identity>) -> HttpResponse {
    if let Some(id) = id {
        id.logout();
    }
    HttpResponse::NoContent().finish()
}
