use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::warn;
use serde_json::json;
use sqlx::PgPool;

/// Health check endpoint
///
/// Reports the service status, the current timestamp and whether the database
/// answers. Always `200`; `database` is `"unavailable"` when the ping fails.
#[get("/health")]
pub async fn health(pool: Option<web::Data<PgPool>>) -> impl Responder {
    let database = match pool {
        Some(pool) => match sqlx::query("SELECT 1").execute(&**pool).await {
            Ok(_) => "ok",
            Err(e) => {
                warn!("health check database ping failed: {}", e);
                "unavailable"
            }
        },
        None => "unconfigured",
    };

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "database": database,
        "timestamp": Utc::now()
    }))
}
