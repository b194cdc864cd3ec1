use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use service::auth::{
    domain::{AdminSession, LoginInput},
    errors::AuthError,
    repository::AdminRepository,
    AuthService,
};
use service::AccountStore;

use crate::errors::ApiError;

/// Header carrying the base64-encoded session token.
pub const TOKEN_HEADER: &str = "API-Token";

#[derive(Clone)]
pub struct ServerState {
    pub accounts: Arc<dyn AccountStore>,
    pub auth: Arc<AuthService<dyn AdminRepository>>,
}

#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub username: String,
    /// Base64 of the raw session token; send it back in the `API-Token` header.
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[utoipa::path(
    post, path = "/login", tag = "auth", request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = crate::openapi::LoginResponse),
        (status = 400, description = "Bad Request"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<LoginOutput>, ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let session = state.auth.login(input).await?;
    Ok(Json(LoginOutput {
        username: session.username,
        token: STANDARD.encode(&session.token),
        expires_at: session.expires_at,
    }))
}

#[utoipa::path(
    post, path = "/logout", tag = "auth",
    responses(
        (status = 200, description = "Session revoked"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    State(state): State<ServerState>,
    Extension(session): Extension<AdminSession>,
) -> Result<StatusCode, ApiError> {
    state.auth.logout(&session.token).await?;
    Ok(StatusCode::OK)
}

/// Raw token bytes from `API-Token`, falling back to `Authorization: Bearer`.
fn presented_token(headers: &HeaderMap) -> Result<Vec<u8>, AuthError> {
    let encoded = match headers.get(TOKEN_HEADER) {
        Some(v) => v.to_str().map_err(|_| AuthError::Unauthorized)?,
        None => {
            let authz = headers
                .get(header::AUTHORIZATION)
                .ok_or(AuthError::Unauthorized)?
                .to_str()
                .map_err(|_| AuthError::Unauthorized)?;
            authz.strip_prefix("Bearer ").ok_or(AuthError::Unauthorized)?
        }
    };
    STANDARD.decode(encoded.trim()).map_err(|_| AuthError::Unauthorized)
}

/// Auth gate for every administrative route: missing, malformed and unknown tokens all end in 401
/// before the handler runs. The resolved session is handed to handlers as a request extension.
pub async fn require_session(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let token = presented_token(req.headers()).map_err(|e| {
        warn!(path = %path, "missing or malformed session token");
        e
    })?;
    let Some(session) = state.auth.validate(&token).await else {
        warn!(path = %path, "unknown or expired session token");
        return Err(AuthError::Unauthorized.into());
    };
    debug!(path = %path, session_id = %session.session_id, "session accepted");
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_header_wins_over_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("AQID"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer BAUG"));
        assert_eq!(presented_token(&headers).ok(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn bearer_fallback_and_rejections() {
        let mut headers = HeaderMap::new();
        assert!(presented_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer BAUG"));
        assert_eq!(presented_token(&headers).ok(), Some(vec![4, 5, 6]));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic BAUG"));
        assert!(presented_token(&headers).is_err());

        headers.insert(TOKEN_HEADER, HeaderValue::from_static("not base64!"));
        assert!(presented_token(&headers).is_err());
    }
}
