//! Minimal user-account service: signup, password login and a
//! bearer-token protected endpoint, served with actix-web.

use actix_web::web;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod password;
pub mod service;
pub mod user_handlers;
pub mod validation;

pub use error::AppError;
pub use service::AuthService;

/// Registers every route plus the JSON body error mapping.
///
/// The caller supplies `web::Data<AuthService>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(user_handlers::signup)
        .service(user_handlers::login)
        .service(user_handlers::protected)
        .service(user_handlers::health);
}
