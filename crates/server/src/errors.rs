use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::auth::errors::AuthError;
use service::errors::AccountError;
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with, mapped onto client (4xx) or server (5xx) responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Account(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Account(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(AuthError::InvalidCredentials | AuthError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = if status.is_server_error() {
            // details stay in the log
            error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(serde_json::json!({"error": msg}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status_categories() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AccountError::InvalidName("x".into()).into(), StatusCode::BAD_REQUEST),
            (AccountError::already_exists("domain", "a.com").into(), StatusCode::BAD_REQUEST),
            (AccountError::not_found("user", "bob").into(), StatusCode::BAD_REQUEST),
            (AccountError::io("list", std::io::Error::other("disk")).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (AccountError::corrupt(std::path::Path::new("/r"), "bad").into(), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (AuthError::Unauthorized.into(), StatusCode::UNAUTHORIZED),
            (AuthError::AdminRecord("gone".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err}");
        }
    }

    #[tokio::test]
    async fn server_errors_hide_details() -> anyhow::Result<()> {
        let err: ApiError = AccountError::corrupt(std::path::Path::new("/srv/mail/a.com/bob/account.json"), "eof").into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
        let v: serde_json::Value = serde_json::from_slice(&body)?;
        assert_eq!(v["error"], "internal server error");
        Ok(())
    }
}
