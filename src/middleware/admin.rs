use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    http::header,
    web, Error,
};
use futures_util::future::LocalBoxFuture;
use secrecy::ExposeSecret;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use crate::config::settings::AdminSettings;

/// Guards the admin scope with the configured bearer token.
pub struct AdminMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AdminMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminMiddlewareService<S> {
    service: Rc<S>,
}

fn check_admin_token(req: &ServiceRequest) -> Result<(), Error> {
    let settings = req
        .app_data::<web::Data<AdminSettings>>()
        .ok_or_else(|| ErrorInternalServerError("Admin settings not found"))?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ErrorUnauthorized("No authorization header"))?
        .to_str()
        .map_err(|_| ErrorUnauthorized("Invalid authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ErrorUnauthorized("Invalid authorization header format"))?;

    if token != settings.api_token.expose_secret() {
        tracing::warn!("Rejected admin request to {} with an invalid token", req.path());
        return Err(ErrorForbidden("Invalid admin token"));
    }

    Ok(())
}

impl<S, B> Service<ServiceRequest> for AdminMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        if let Err(e) = check_admin_token(&req) {
            return Box::pin(async move { Err(e) });
        }

        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res)
        })
    }
}
