use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web, Error,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::config::settings::ChatSettings;

pub const CHAT_ID_HEADER: &str = "X-Chat-Id";
pub const CHAT_TYPE_HEADER: &str = "X-Chat-Type";

/// Only lets requests relayed from the configured group chat through.
///
/// The bot forwards the chat a command came from in `X-Chat-Id` and
/// `X-Chat-Type`. Private chats are always refused.
pub struct ChatGroupMiddleware;

impl<S, B> Transform<S, ServiceRequest> for ChatGroupMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ChatGroupMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ChatGroupMiddlewareService { service }))
    }
}

pub struct ChatGroupMiddlewareService<S> {
    service: S,
}

fn header_value<'a>(req: &'a ServiceRequest, name: &str) -> Result<&'a str, Error> {
    req.headers()
        .get(name)
        .ok_or_else(|| ErrorBadRequest(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| ErrorBadRequest(format!("Invalid {} header", name)))
}

fn check_chat(req: &ServiceRequest) -> Result<(), Error> {
    let chat_type = header_value(req, CHAT_TYPE_HEADER)?;
    if chat_type.eq_ignore_ascii_case("private") {
        return Err(ErrorForbidden("This bot only works in the group chat"));
    }

    let chat_id: i64 = header_value(req, CHAT_ID_HEADER)?
        .trim()
        .parse()
        .map_err(|_| ErrorBadRequest(format!("Invalid {} header", CHAT_ID_HEADER)))?;

    let allowed = req
        .app_data::<web::Data<ChatSettings>>()
        .and_then(|settings| settings.allowed_group_id);
    if let Some(allowed_id) = allowed {
        if chat_id != allowed_id {
            tracing::warn!("Rejected bot request from unauthorized chat {}", chat_id);
            return Err(ErrorForbidden("This chat is not authorized to use the bot"));
        }
    }

    Ok(())
}

impl<S, B> Service<ServiceRequest> for ChatGroupMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Err(e) = check_chat(&req) {
            return Box::pin(async move { Err(e) });
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}
