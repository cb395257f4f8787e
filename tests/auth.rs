#[macro_use]
mod common;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http::header, http::StatusCode, rt, test, web, App, HttpServer};
use common::{cleanup_user, create_user, get_json, patch_json, read_response, test_config, test_pool, unique};
use fluentia::auth::TokenResponse;
use fluentia::models::UserView;
use serde_json::json;
use std::net::TcpListener;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let email = format!("register_{}@example.com", unique());

    // Register a new user
    let req = test::TestRequest::post()
        .uri("/user")
        .set_json(&json!({
            "username": "integration_user",
            "email": email,
            "password": "Password123!",
            "native_language": "pt"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let (status, body) = read_response(resp).await;
    assert_eq!(status, StatusCode::CREATED, "Registration failed: {}", body);
    let user: UserView = serde_json::from_value(body).unwrap();
    assert_eq!(user.email, email);
    assert!(!user.is_superuser);

    // The same e-mail can't be registered twice
    let req = test::TestRequest::post()
        .uri("/user")
        .set_json(&json!({
            "username": "integration_user",
            "email": email,
            "password": "Password123!",
            "native_language": "pt"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Log in with the form, the e-mail goes in `username`
    let req = test::TestRequest::post()
        .uri("/auth/token")
        .set_form(&[("username", email.as_str()), ("password", "Password123!")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    let (status, body) = read_response(resp).await;
    assert_eq!(status, StatusCode::CREATED, "Login failed: {}", body);
    let token: TokenResponse = serde_json::from_value(body).unwrap();
    assert_eq!(token.token_type, "bearer");

    // The token identifies the user
    let req = test::TestRequest::get()
        .uri("/user/me")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", token.access_token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let (status, body) = read_response(resp).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email.as_str());
    assert!(body.get("password").is_none());

    // Wrong password
    let req = test::TestRequest::post()
        .uri("/auth/token")
        .set_form(&[("username", email.as_str()), ("password", "WrongPassword!")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    let (status, body) = read_response(resp).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "incorrect e-mail or password");

    cleanup_user(&pool, &email).await;
}

#[actix_rt::test]
async fn test_register_validation() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let req = test::TestRequest::post()
        .uri("/user")
        .set_json(&json!({
            "username": "bad",
            "email": "not-an-email",
            "password": "Password123!",
            "native_language": "pt"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Unknown language code
    let req = test::TestRequest::post()
        .uri("/user")
        .set_json(&json!({
            "username": "someone",
            "email": format!("lang_{}@example.com", unique()),
            "password": "Password123!",
            "native_language": "xx"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Login form without a password
    let req = test::TestRequest::post()
        .uri("/auth/token")
        .set_form(&[("username", "someone@example.com")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_rt::test]
async fn test_update_user() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let user = create_user(&pool, &config, false).await;
    let other = create_user(&pool, &config, false).await;

    let (status, body) = patch_json(
        &app,
        &format!("/user/{}", user.id),
        &user,
        json!({ "username": "renamed", "native_language": "en" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Update failed: {}", body);
    assert_eq!(body["username"], "renamed");
    assert_eq!(body["native_language"], "en");
    assert_eq!(body["email"], user.email.as_str());

    // Someone else's account
    let (status, body) = patch_json(
        &app,
        &format!("/user/{}", other.id),
        &user,
        json!({ "username": "hijacked" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "credentials do not match.");

    // A new password is usable right away
    let (status, _) = patch_json(
        &app,
        &format!("/user/{}", user.id),
        &user,
        json!({ "password": "NewPassword456!" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/token")
        .set_form(&[("username", user.email.as_str()), ("password", "NewPassword456!")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    cleanup_user(&pool, &user.email).await;
    cleanup_user(&pool, &other.email).await;
}

#[actix_rt::test]
async fn test_refresh_token_and_bad_tokens() {
    let pool = test_pool().await;
    let config = test_config();
    let app = test_app!(pool, config);

    let user = create_user(&pool, &config, false).await;

    let req = test::TestRequest::post()
        .uri("/auth/refresh_token")
        .append_header(user.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    let (status, body) = read_response(resp).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));

    // No header on a protected route
    let (status, _) = get_json(&app, "/user/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A header that isn't a valid token
    let req = test::TestRequest::get()
        .uri("/user/me")
        .append_header((header::AUTHORIZATION, "Bearer not.a.token"))
        .append_header((header::ORIGIN, "http://localhost:3000"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
    // The rejection still passes through the CORS layer
    assert!(resp.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    let (_, body) = read_response(resp).await;
    assert_eq!(body["detail"], "could not validate credentials");

    // Not a bearer header at all, even on a public route
    let req = test::TestRequest::get()
        .uri("/health")
        .append_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // A valid token for an account that no longer exists
    cleanup_user(&pool, &user.email).await;
    let (status, _) = get_json(&app, "/user/me", Some(&user)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_me_unauthorized_over_http() {
    let pool = test_pool().await;
    let config = test_config();

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let server_pool = pool.clone();
    let server_config = config.clone();
    let server_handle = rt::spawn(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(server_pool.clone()))
                .app_data(web::Data::new(server_config.clone()))
                .wrap(fluentia::auth::AuthMiddleware)
                .wrap(Logger::default())
                .wrap(Cors::permissive())
                .configure(fluentia::app_config)
        })
        .bind(("127.0.0.1", port))
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
        .run()
        .await
    });

    // Give the server a moment to start
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let health: serde_json::Value = resp.json().await.expect("Failed to parse health body");
    assert_eq!(health["database"], "ok");

    let resp = client
        .get(format!("http://127.0.0.1:{}/user/me", port))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(
        resp.status(),
        reqwest::StatusCode::UNAUTHORIZED,
        "Expected 401 Unauthorized, got {}. Body: {:?}",
        resp.status(),
        resp.text().await.unwrap_or_else(|_| "<failed to read body>".to_string())
    );

    server_handle.abort();
}
