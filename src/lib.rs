#![doc = "The `fluentia` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication, exercise generation, routing and error handling"]
#![doc = "of the Fluentia vocabulary service. The binary (`main.rs`) wires them into an"]
#![doc = "`HttpServer`; integration tests wire them into `actix_web::test` services."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;
pub mod text;

use actix_web::web;

/// Registers the payload error handlers, the health check and every API route.
///
/// Middleware (`Cors`, `Logger`, `AuthMiddleware`) and the `PgPool`/`Config`
/// app data are added by the caller, since `ServiceConfig` can't wrap services.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::FormConfig::default().error_handler(error::form_error_handler))
        .service(routes::health::health)
        .configure(routes::config);
}
