use std::io;

use actix_web::{middleware::Logger, web, App, HttpServer};
use user_auth::config::EnvConfig;
use user_auth::AuthService;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = EnvConfig::from_env().map_err(io::Error::other)?;
    let service = AuthService::from_config(&config)
        .await
        .map_err(io::Error::other)?;
    let addr = config.bind_addr();

    log::info!(
        "listening on {addr} (token ttl {}m, bcrypt cost {})",
        config.token_ttl_minutes,
        config.bcrypt_cost
    );

    let service = web::Data::new(service);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(service.clone())
            .configure(user_auth::configure)
    })
    .bind(addr)?
    .run()
    .await
}
