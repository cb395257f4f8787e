#![allow(dead_code)]

use actix_web::{body::MessageBody, dev::ServiceResponse, http::header, http::StatusCode, test};
use dotenv::dotenv;
use fluentia::auth::{generate_token, hash_password};
use fluentia::config::Config;
use jsonwebtoken::Algorithm;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

/// Builds the application the way `main` does, on top of a test pool and config.
macro_rules! test_app {
    ($pool:expr, $config:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .app_data(actix_web::web::Data::new($config.clone()))
                .wrap(fluentia::auth::AuthMiddleware)
                .wrap(actix_web::middleware::Logger::default())
                .wrap(actix_cors::Cors::permissive())
                .configure(fluentia::app_config),
        )
        .await
    };
}

pub struct TestUser {
    pub id: i32,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

pub async fn test_pool() -> PgPool {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    fluentia::db::migrate(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

pub fn test_config() -> Config {
    Config {
        database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
        database_max_connections: 5,
        server_port: 0,
        server_host: "127.0.0.1".to_string(),
        secret_key: "integration-test-secret".to_string(),
        algorithm: Algorithm::HS256,
        access_token_expire_minutes: 30,
    }
}

/// A short random suffix; `clean_text` keeps it intact.
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

/// Percent-encodes `text` for a query string; only ASCII alphanumerics stay as is.
pub fn encode_query(text: &str) -> String {
    text.bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect()
}

/// Inserts a user straight into the database and signs a token for it.
pub async fn create_user(pool: &PgPool, config: &Config, is_superuser: bool) -> TestUser {
    let email = format!("user_{}@example.com", unique());
    let password = hash_password("Password123!").expect("Failed to hash password");

    let id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, email, password, native_language, is_superuser)
         VALUES ($1, $2, $3, 'pt', $4)
         RETURNING id",
    )
    .bind("tester")
    .bind(&email)
    .bind(password)
    .bind(is_superuser)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test user");

    let token = generate_token(&email, config).expect("Failed to sign token");
    TestUser { id, email, token }
}

pub async fn cleanup_user(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

/// Removes a term, everything hanging off it and its pronunciations.
pub async fn cleanup_term(pool: &PgPool, term: &str) {
    let _ = sqlx::query(
        "DELETE FROM pronunciations WHERE id IN (
             SELECT l.pronunciation_id FROM pronunciation_links l
             LEFT JOIN term_examples e ON e.id = l.term_example_id
             LEFT JOIN term_lexicals x ON x.id = l.term_lexical_id
             WHERE l.term = $1 OR e.term = $1 OR x.term = $1)",
    )
    .bind(term)
    .execute(pool)
    .await;
    let _ = sqlx::query("DELETE FROM terms WHERE term = $1")
        .bind(term)
        .execute(pool)
        .await;
}

/// Reads a response as `(status, json)`; an empty body reads as `Null`.
pub async fn read_response<B: MessageBody>(resp: ServiceResponse<B>) -> (StatusCode, Value) {
    let status = resp.status();
    let body = test::read_body(resp).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            json!({ "raw": String::from_utf8_lossy(&body).to_string() })
        })
    };
    (status, value)
}

pub async fn create_term(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    admin: &TestUser,
    term: &str,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri("/term")
        .append_header(admin.bearer())
        .set_json(&json!({ "term": term, "origin_language": "pt" }))
        .to_request();
    read_response(test::call_service(app, req).await).await
}

pub async fn post_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    uri: &str,
    user: &TestUser,
    body: Value,
) -> (StatusCode, Value) {
    let req = test::TestRequest::post()
        .uri(uri)
        .append_header(user.bearer())
        .set_json(&body)
        .to_request();
    read_response(test::call_service(app, req).await).await
}

pub async fn patch_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    uri: &str,
    user: &TestUser,
    body: Value,
) -> (StatusCode, Value) {
    let req = test::TestRequest::patch()
        .uri(uri)
        .append_header(user.bearer())
        .set_json(&body)
        .to_request();
    read_response(test::call_service(app, req).await).await
}

pub async fn get_json(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    uri: &str,
    user: Option<&TestUser>,
) -> (StatusCode, Value) {
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(user) = user {
        req = req.append_header(user.bearer());
    }
    read_response(test::call_service(app, req.to_request()).await).await
}
