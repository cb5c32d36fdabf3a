//! Reject request bodies that are not JSON.

use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::Method,
};
use futures::future::LocalBoxFuture;
use quill_shared::ErrorResponse;
use std::future::{Ready, ready};

use crate::observability::RequestId;

/// Answers `415 Unsupported Media Type` to any POST whose `Content-Type`
/// is not `application/json`.
pub struct StrictJson;

impl<S, B> Transform<S, ServiceRequest> for StrictJson
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = StrictJsonService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StrictJsonService { service }))
    }
}

pub struct StrictJsonService<S> {
    service: S,
}

fn is_json(req: &ServiceRequest) -> bool {
    req.content_type().eq_ignore_ascii_case("application/json")
}

impl<S, B> Service<ServiceRequest> for StrictJsonService<S>
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
        if req.method() == Method::POST && !is_json(&req) {
            let mut error =
                ErrorResponse::unsupported_media_type("Content-Type must be application/json")
                    .with_instance(req.path().to_string());
            if let Some(id) = RequestId::of(&req) {
                error = error.with_request_id(id.0);
            }
            let response = HttpResponse::UnsupportedMediaType().json(error);
            let (http_req, _payload) = req.into_parts();
            let response = ServiceResponse::new(http_req, response).map_into_right_body();
            return Box::pin(async move { Ok(response) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}
