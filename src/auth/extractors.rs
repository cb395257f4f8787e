use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::User;

/// The user owning the request's bearer token.
///
/// Relies on `AuthMiddleware` having verified the token and stored its
/// `Claims` in the request extensions. A request without claims, or whose token
/// subject no longer exists, is rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// A `CurrentUser` that is also a superuser; others get 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

async fn load_user(claims: Option<Claims>, pool: Option<web::Data<PgPool>>) -> Result<User, AppError> {
    let claims = claims.ok_or_else(|| AppError::Unauthorized("not authenticated".into()))?;
    let pool = pool.ok_or_else(|| AppError::InternalServerError("database pool not available".into()))?;

    User::find_by_email(pool.get_ref(), &claims.sub)
        .await?
        .ok_or_else(AppError::invalid_credentials)
}

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let pool = req.app_data::<web::Data<PgPool>>().cloned();

        Box::pin(async move {
            let user = load_user(claims, pool).await?;
            Ok(CurrentUser(user))
        })
    }
}

impl FromRequest for AdminUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        let pool = req.app_data::<web::Data<PgPool>>().cloned();

        Box::pin(async move {
            let user = load_user(claims, pool).await?;
            if !user.is_superuser {
                return Err(AppError::not_enough_permission().into());
            }
            Ok(AdminUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_current_user_without_claims_is_unauthorized() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = CurrentUser::from_request(&req, &mut payload).await;

        let err = result.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_admin_user_without_claims_is_unauthorized() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let result = AdminUser::from_request(&req, &mut payload).await;

        let err = result.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
