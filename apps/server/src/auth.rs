//! Caller identity.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user id in the `X-User-Id` header and this extractor only parses it.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?;
        let user_id = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::Unauthorized("Invalid X-User-Id header".to_string()))?;
        Ok(AuthUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<AuthUser, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_parses_user_id() {
        assert_eq!(extract(Some("42")).await.unwrap(), AuthUser(42));
    }

    #[tokio::test]
    async fn test_rejects_missing_or_invalid() {
        assert!(matches!(extract(None).await, Err(ApiError::Unauthorized(_))));
        assert!(matches!(extract(Some("abc")).await, Err(ApiError::Unauthorized(_))));
        assert!(matches!(extract(Some("0")).await, Err(ApiError::Unauthorized(_))));
    }
}
