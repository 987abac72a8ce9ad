//! Authentication extractor.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;

use quill_core::domain::User;
use quill_core::ports::AuthError;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated user extractor.
///
/// Verifies the bearer token and resolves the full user record, so
/// handlers receive the current profile rather than stale claims.
/// Use it in handlers to require authentication:
/// ```ignore
/// async fn protected_route(user: AuthUser) -> impl Responder {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl std::ops::Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    header_value
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::Internal("Application state missing".to_string()))?;

            let token = bearer_token(&req)?;
            let claims = state.tokens.verify(token)?;

            let user = state
                .users
                .find_by_id(claims.user_id)
                .await?
                .filter(|u| u.is_active)
                .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

            // A password change invalidates tokens minted before it. The
            // change timestamp is backdated by the domain, so a token
            // issued in the same second still passes.
            if let Some(changed_at) = user.password_changed_at {
                if claims.iat < changed_at.timestamp() {
                    return Err(AppError::Unauthorized("Token is not valid".to_string()));
                }
            }

            Ok(AuthUser(user))
        })
    }
}
