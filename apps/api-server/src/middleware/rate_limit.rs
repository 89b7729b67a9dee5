//! Rate limiting middleware.
//!
//! The limiter is looked up in app data on every call, so a scope wrapped in this
//! middleware passes requests straight through when no limiter is registered.
//!
//! Clients are keyed by the socket peer address. `Forwarded`/`X-Forwarded-For` are
//! only honoured when [`TrustForwardedFor`] is registered, i.e. behind a proxy that
//! overwrites those headers.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use quill_core::ports::RateLimiter;
use quill_shared::ErrorResponse;

/// Registered as app data when forwarded-for headers come from a trusted proxy.
#[derive(Debug, Clone, Copy)]
pub struct TrustForwardedFor;

fn client_key(req: &ServiceRequest) -> String {
    if req.app_data::<web::Data<TrustForwardedFor>>().is_some() {
        if let Some(addr) = req.connection_info().realip_remote_addr() {
            return addr.to_string();
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware factory. Requests are keyed by client IP.
#[derive(Default)]
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = req
            .app_data::<web::Data<Arc<dyn RateLimiter>>>()
            .map(|data| Arc::clone(data.get_ref()));

        Box::pin(async move {
            let Some(limiter) = limiter else {
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            };

            let key = client_key(&req);

            match limiter.check(&key).await {
                Ok(result) if !result.allowed => {
                    // Round up so clients never retry early.
                    let retry_secs = result.retry_after.as_secs()
                        + u64::from(result.retry_after.subsec_nanos() > 0);
                    tracing::warn!(client = %key, retry_after = retry_secs, "Rate limit exceeded");

                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("Retry-After", retry_secs.to_string()))
                        .json(ErrorResponse::too_many_requests(retry_secs));

                    let (http_req, _payload) = req.into_parts();
                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
                Ok(_) => service.call(req).await.map(ServiceResponse::map_into_left_body),
                Err(e) => {
                    tracing::error!(error = %e, "Rate limiter error, failing open");
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
            }
        })
    }
}
