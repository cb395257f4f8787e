use crate::{
    auth::{hash_password, CurrentUser},
    error::AppError,
    models::user::USER_COLUMNS,
    models::{User, UserInput, UserUpdate, UserView},
};
use actix_web::{get, patch, post, web, HttpResponse, Responder};
use log::info;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// ## Request Body:
/// - `username`: 3 to 50 characters.
/// - `email`: A valid, unused e-mail address.
/// - `password`: At least 6 characters; stored as a bcrypt hash.
/// - `native_language`: Language code, e.g. `pt`.
///
/// ## Responses:
/// - `201 Created`: The new `UserView`.
/// - `409 Conflict`: The e-mail is already registered.
/// - `422 Unprocessable Entity`: Validation failed.
#[post("")]
pub async fn create_user(
    pool: web::Data<PgPool>,
    user_data: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;

    let password_hash = hash_password(&user_data.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, email, password, native_language)
         VALUES ($1, $2, $3, $4)
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&user_data.username)
    .bind(&user_data.email)
    .bind(password_hash)
    .bind(user_data.native_language)
    .fetch_one(&**pool)
    .await?;

    info!("registered user {}", user.id);
    Ok(HttpResponse::Created().json(UserView::from(user)))
}

/// Update the authenticated user's account
///
/// Only fields present in the body change. A new password is re-hashed.
///
/// ## Responses:
/// - `200 OK`: The updated `UserView`.
/// - `401 Unauthorized`: Not authenticated, or `user_id` is another user.
/// - `409 Conflict`: The new e-mail belongs to another user.
/// - `422 Unprocessable Entity`: Validation failed.
#[patch("/{user_id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
    user_data: web::Json<UserUpdate>,
    CurrentUser(current): CurrentUser,
) -> Result<impl Responder, AppError> {
    if current.id != user_id.into_inner() {
        return Err(AppError::Unauthorized("credentials do not match.".into()));
    }
    user_data.validate()?;

    let password_hash = match &user_data.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users
         SET username = COALESCE($1, username),
             email = COALESCE($2, email),
             password = COALESCE($3, password),
             native_language = COALESCE($4, native_language)
         WHERE id = $5
         RETURNING {}",
        USER_COLUMNS
    ))
    .bind(&user_data.username)
    .bind(&user_data.email)
    .bind(password_hash)
    .bind(user_data.native_language)
    .bind(current.id)
    .fetch_one(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(user.view()))
}

/// The authenticated user
#[get("/me")]
pub async fn me(CurrentUser(user): CurrentUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(user.view()))
}
