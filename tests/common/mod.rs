use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use chrono::Duration;
use user_auth::auth::TokenService;
use user_auth::db::InMemoryUserStore;
use user_auth::password::PasswordHasher;
use user_auth::AuthService;

pub const SECRET: &[u8] = b"integration-secret";

pub fn test_service() -> AuthService {
    AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        TokenService::new(SECRET, Duration::hours(1)),
        PasswordHasher::new(4).expect("bcrypt cost 4"),
    )
}

pub fn test_app(
    service: AuthService,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(service))
        .configure(user_auth::configure)
}

pub mod test_data {
    use serde_json::{json, Value};

    pub fn signup_payload() -> Value {
        json!({
            "username": "testuser",
            "email": "test@example.com",
            "password": "strongpassword123"
        })
    }

    pub fn login_payload(username: &str, password: &str) -> Value {
        json!({ "username": username, "password": password })
    }
}
