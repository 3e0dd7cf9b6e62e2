//! Bearer-token and admin-role gates, applied as axum layers.
//!
//! `require_auth` runs first and inserts the verified [`Claims`] as a
//! request extension; `require_admin` then checks the embedded role.
//! Both pass everything through unchanged when enforcement is off.

use super::Claims;
use crate::api::{ApiError, AppState};
use crate::Role;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

/// Extract and verify the bearer token, attaching its claims to the
/// request. 401 when the token is missing, malformed or expired.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.tokens.enforced() {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.tokens.verify(token).map_err(|err| {
        warn!("Token verification failed: {err}");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Reject non-admin callers. Must be layered inside `require_auth` so
/// the claims extension is present.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.tokens.enforced() {
        return Ok(next.run(request).await);
    }

    match request.extensions().get::<Claims>() {
        Some(claims) if claims.role == Role::Admin => Ok(next.run(request).await),
        Some(claims) => {
            warn!("Access denied for {} (role {})", claims.nim, claims.role);
            Err(ApiError::Forbidden("Admin role required".to_string()))
        }
        None => Err(ApiError::Unauthorized("Missing bearer token".to_string())),
    }
}
