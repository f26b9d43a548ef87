//! Owner identity extractor
//!
//! Authentication happens upstream; requests arrive with the authenticated
//! principal in the `X-Owner-Id` header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const OWNER_HEADER: &str = "x-owner-id";

const MAX_OWNER_LEN: usize = 128;

/// Authenticated owner of the hackathons a request may touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl Owner {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-Owner-Id header".to_string()))?;

        let owner = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid X-Owner-Id header".to_string()))?
            .trim();

        if owner.is_empty() || owner.len() > MAX_OWNER_LEN {
            return Err(ApiError::Unauthorized("Invalid X-Owner-Id header".to_string()));
        }

        Ok(Owner(owner.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Owner, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(OWNER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Owner::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_owner_header() {
        assert_eq!(extract(Some(" alice ")).await.unwrap().as_str(), "alice");
        assert!(matches!(extract(None).await, Err(ApiError::Unauthorized(_))));
        assert!(matches!(extract(Some("   ")).await, Err(ApiError::Unauthorized(_))));
    }
}
