use crate::{
    auth::{generate_token, verify_password, CurrentUser, LoginForm, TokenResponse},
    config::Config,
    error::AppError,
    models::User,
};
use actix_web::{post, web, HttpResponse, Responder};
use log::{info, warn};
use sqlx::PgPool;
use validator::Validate;

/// Exchange credentials for an access token
///
/// OAuth2 password flow: the form's `username` is the user's e-mail.
///
/// ## Responses:
/// - `201 Created`: `{access_token, token_type}`.
/// - `400 Bad Request`: Unknown e-mail or wrong password.
/// - `422 Unprocessable Entity`: Missing form fields.
#[post("/token")]
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    form.validate()?;

    let user = User::find_by_email(&**pool, &form.username).await?;
    let user = match user {
        Some(user) if verify_password(&form.password, &user.password)? => user,
        _ => {
            warn!("failed login attempt for {}", form.username);
            return Err(AppError::BadRequest("incorrect e-mail or password".into()));
        }
    };

    let token = generate_token(&user.email, &config)?;
    info!("user {} logged in", user.id);

    Ok(HttpResponse::Created().json(TokenResponse::bearer(token)))
}

/// Issue a fresh token for the authenticated user
#[post("/refresh_token")]
pub async fn refresh_token(
    config: web::Data<Config>,
    CurrentUser(user): CurrentUser,
) -> Result<impl Responder, AppError> {
    let token = generate_token(&user.email, &config)?;
    Ok(HttpResponse::Created().json(TokenResponse::bearer(token)))
}
