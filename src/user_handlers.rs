use actix_web::{get, post, web, HttpResponse, Responder};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, ProtectedResponse, SignupRequest, SignupResponse};
use crate::service::AuthService;

#[post("/signup")]
pub async fn signup(
    service: web::Data<AuthService>,
    data: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let user = service.signup(data.into_inner()).await?;
    Ok(HttpResponse::Created().json(SignupResponse::from(&user)))
}

#[post("/login")]
pub async fn login(
    service: web::Data<AuthService>,
    data: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let token = service.login(data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LoginResponse { token }))
}

#[get("/protected")]
pub async fn protected(
    service: web::Data<AuthService>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = service.authorize(&auth.claims).await?;
    Ok(HttpResponse::Ok().json(ProtectedResponse {
        message: "Token verified.".to_string(),
        username: user.username,
    }))
}

/// Simple health check
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}
