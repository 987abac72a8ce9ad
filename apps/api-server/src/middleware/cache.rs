//! Response caching middleware for anonymous GET traffic.
//!
//! Hits are served verbatim from the cache with an `X-Cache: HIT`
//! header. Misses pass through and, when the response is a 200, the
//! streamed body is captured and stored asynchronously after the last
//! chunk is sent, so caching never delays the response itself.

use std::future::{Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::{
    Error, HttpResponse,
    body::{BodySize, EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{Method, StatusCode, header},
    web::{Bytes, BytesMut},
};
use futures::future::LocalBoxFuture;
use pin_project::pin_project;

use quill_core::ports::Cache;

/// Response cache middleware factory.
pub struct ResponseCache {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ResponseCache
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<CacheTee<B>>>;
    type Error = Error;
    type Transform = ResponseCacheService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ResponseCacheService {
            service: Rc::new(service),
            cache: self.cache.clone(),
            ttl: self.ttl,
        }))
    }
}

pub struct ResponseCacheService<S> {
    service: Rc<S>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl<S, B> Service<ServiceRequest> for ResponseCacheService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<CacheTee<B>>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let cache = self.cache.clone();
        let ttl = self.ttl;

        Box::pin(async move {
            // Only anonymous reads are cacheable: authenticated responses
            // may be personalized.
            let cacheable = req.method() == Method::GET
                && !req.headers().contains_key(header::AUTHORIZATION);

            let key = format!(
                "cache:{}",
                req.uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or_else(|| req.path())
            );

            if cacheable {
                if let Some(hit) = cache.get(&key).await {
                    tracing::debug!(%key, "Cache hit");

                    let response = HttpResponse::Ok()
                        .content_type(header::ContentType::json())
                        .insert_header(("X-Cache", "HIT"))
                        .body(hit);

                    let (http_req, _payload) = req.into_parts();
                    return Ok(ServiceResponse::new(http_req, response).map_into_right_body());
                }
            }

            let res = service.call(req).await?;
            let store = (cacheable && res.status() == StatusCode::OK)
                .then(|| TeeSink {
                    key,
                    cache,
                    ttl,
                    buf: BytesMut::new(),
                });

            Ok(res
                .map_body(move |_head, body| CacheTee { inner: body, sink: store })
                .map_into_left_body())
        })
    }
}

struct TeeSink {
    key: String,
    cache: Arc<dyn Cache>,
    ttl: Duration,
    buf: BytesMut,
}

/// Body wrapper that forwards chunks unchanged while accumulating a copy.
/// When the body completes, the copy is written to the cache on a spawned
/// task.
#[pin_project]
pub struct CacheTee<B> {
    #[pin]
    inner: B,
    sink: Option<TeeSink>,
}

impl<B: MessageBody> MessageBody for CacheTee<B> {
    type Error = B::Error;

    fn size(&self) -> BodySize {
        self.inner.size()
    }

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Bytes, Self::Error>>> {
        let this = self.project();

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if let Some(sink) = this.sink.as_mut() {
                    sink.buf.extend_from_slice(&chunk);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                // Incomplete bodies must not be cached
                *this.sink = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                if let Some(sink) = this.sink.take() {
                    if let Ok(body) = String::from_utf8(sink.buf.to_vec()) {
                        let TeeSink { key, cache, ttl, .. } = sink;
                        actix_web::rt::spawn(async move {
                            if let Err(e) = cache.set(&key, &body, Some(ttl)).await {
                                tracing::warn!(%key, error = %e, "Failed to cache response");
                            }
                        });
                    }
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
