//! Security response headers.

use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;

const CSP: &str = "default-src 'self'; img-src 'self' data:; style-src 'self' 'unsafe-inline'; \
     script-src 'self'; connect-src 'self'; font-src 'self'; object-src 'none'; \
     media-src 'self'; frame-src 'none';";

/// Headers attached to every response: MIME sniffing and framing disabled,
/// a restrictive content security policy, and browser caching off for API
/// responses. HSTS is only sent in production, where TLS is guaranteed.
pub fn security_headers(production: bool) -> DefaultHeaders {
    let headers = DefaultHeaders::new()
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "DENY"))
        .add((header::X_XSS_PROTECTION, "1; mode=block"))
        .add((header::CONTENT_SECURITY_POLICY, CSP))
        .add((
            header::CACHE_CONTROL,
            "no-store, no-cache, must-revalidate, proxy-revalidate",
        ))
        .add((header::PRAGMA, "no-cache"))
        .add((header::EXPIRES, "0"));

    if production {
        headers.add((
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=31536000; includeSubDomains; preload",
        ))
    } else {
        headers
    }
}
