use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use log::{debug, warn};

use crate::auth::token::verify_token;
use crate::config::Config;
use crate::error::AppError;

/// Decodes the bearer token of every request that carries one.
///
/// Requests without an `Authorization` header pass through untouched, so public
/// routes stay public. A header that doesn't hold a valid token is rejected with
/// 401. Valid claims are stored in the request extensions for the
/// `CurrentUser`/`AdminUser` extractors.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let auth_header = req
            .headers()
            .get(header::AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default().to_string());

        let Some(auth_header) = auth_header else {
            return self.forward(req);
        };

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            debug!("rejecting non-bearer authorization header on {}", req.path());
            return reject(req, AppError::invalid_credentials());
        };

        let Some(config) = req.app_data::<web::Data<Config>>() else {
            return reject(
                req,
                AppError::InternalServerError("configuration not available".into()),
            );
        };

        match verify_token(token, config) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                self.forward(req)
            }
            Err(app_err) => {
                warn!("invalid bearer token on {}", req.path());
                reject(req, app_err)
            }
        }
    }
}

impl<S, B> AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    fn forward(
        &self,
        req: ServiceRequest,
    ) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>> {
        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}

/// Answers the request with the error's response instead of calling the service.
fn reject<B: 'static>(
    req: ServiceRequest,
    err: AppError,
) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>> {
    let resp = req.error_response(err).map_into_right_body();
    Box::pin(async move { Ok(resp) })
}
