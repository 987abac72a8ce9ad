//! Request sanitizer.
//!
//! Buffers inbound JSON bodies, HTML-escapes every string value in the
//! document, and hands the cleaned bytes to the extractors. Bodies over
//! the configured limit are rejected with 413 before buffering when the
//! client declares a length, or as soon as the limit is crossed when it
//! does not.

use std::future::{Ready, ready};
use std::rc::Rc;

use actix_http::h1;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{Method, header},
    web::BytesMut,
};
use futures::{StreamExt, future::LocalBoxFuture};

use quill_shared::Message;

const TOO_LARGE: &str = "Request payload is too large";

/// Sanitizing middleware factory.
pub struct Sanitize {
    max_size: usize,
}

impl Sanitize {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Sanitize
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SanitizeService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SanitizeService {
            service: Rc::new(service),
            max_size: self.max_size,
        }))
    }
}

pub struct SanitizeService<S> {
    service: Rc<S>,
    max_size: usize,
}

fn too_large<B>(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
    let response = HttpResponse::PayloadTooLarge().json(Message::new(TOO_LARGE));
    let (http_req, _payload) = req.into_parts();
    ServiceResponse::new(http_req, response).map_into_right_body()
}

impl<S, B> Service<ServiceRequest> for SanitizeService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let max_size = self.max_size;

        Box::pin(async move {
            let has_json_body = matches!(
                *req.method(),
                Method::POST | Method::PUT | Method::PATCH | Method::DELETE
            ) && req
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.starts_with("application/json"))
                .unwrap_or(false);

            if !has_json_body {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let declared_len = req
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<usize>().ok());
            if declared_len.is_some_and(|len| len > max_size) {
                return Ok(too_large(req));
            }

            let mut body = BytesMut::new();
            let mut payload = req.take_payload();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk?;
                if body.len() + chunk.len() > max_size {
                    return Ok(too_large(req));
                }
                body.extend_from_slice(&chunk);
            }

            // Unparseable bodies are re-injected untouched so the Json
            // extractor produces its usual 400.
            let sanitized = match serde_json::from_slice::<serde_json::Value>(&body) {
                Ok(mut value) => {
                    sanitize_value(&mut value);
                    serde_json::to_vec(&value).unwrap_or_else(|_| body.to_vec())
                }
                Err(_) => body.to_vec(),
            };

            req.headers_mut().insert(
                header::CONTENT_LENGTH,
                header::HeaderValue::from(sanitized.len()),
            );

            let (_sender, mut new_payload) = h1::Payload::create(true);
            new_payload.unread_data(sanitized.into());
            req.set_payload(actix_web::dev::Payload::from(new_payload));

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// HTML-escape every string value in the document, recursively.
fn sanitize_value(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::String(s) => *s = escape_html(s),
        serde_json::Value::Array(items) => items.iter_mut().for_each(sanitize_value),
        serde_json::Value::Object(map) => map.values_mut().for_each(sanitize_value),
        _ => {}
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(ch),
        }
    }
    out
}
