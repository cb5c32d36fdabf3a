//! Rate limiting middleware.

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use futures::future::LocalBoxFuture;
use quill_core::ports::RateLimiter;
use quill_shared::ErrorResponse;
use std::future::{Ready, ready};
use std::rc::Rc;

use crate::observability::RequestId;
use crate::state::AppState;

/// Throttles each client per route. The limiter comes from [`AppState`].
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

/// Bucket key: client address plus path.
fn client_key(req: &ServiceRequest) -> String {
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    format!("{}:{}", ip, req.path())
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.rate_limiter.clone());
        let key = client_key(&req);

        Box::pin(async move {
            let check = match limiter {
                Some(limiter) => Some(limiter.check(&key).await),
                None => None,
            };

            let limited = match &check {
                Some(Ok(decision)) => decision.retry_after_secs(),
                _ => None,
            };

            match (limited, check) {
                (Some(retry_after), _) => {
                    tracing::warn!(%key, retry_after, "Rate limit exceeded");

                    let mut error = ErrorResponse::too_many_requests(retry_after)
                        .with_instance(req.path().to_string());
                    if let Some(id) = RequestId::of(&req) {
                        error = error.with_request_id(id.0);
                    }

                    let response = HttpResponse::TooManyRequests()
                        .insert_header(("X-RateLimit-Remaining", "0"))
                        .insert_header(("Retry-After", retry_after.to_string()))
                        .json(error);

                    let (http_req, _payload) = req.into_parts();
                    Ok(ServiceResponse::new(http_req, response).map_into_right_body())
                }
                (None, check) => {
                    // fail open when the limiter is unavailable
                    if let Some(Err(e)) = &check {
                        tracing::error!(error = %e, "Rate limiter error, failing open");
                    }

                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
            }
        })
    }
}
