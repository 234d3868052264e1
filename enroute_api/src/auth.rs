use std::sync::Arc;

use aide::OperationInput;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use enroute_tracking::{error::TrackingError, order::UserId};
use tracing::error;

use crate::{error::ApiError, state::AppState};

/// The authenticated user making the request, resolved from the
/// `Authorization: Bearer <token>` header.
pub struct Caller {
    pub user_id: UserId,
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(TrackingError::Unauthenticated)?;

        match state.authenticator.authenticate(token).await {
            Ok(Some(user_id)) => Ok(Caller { user_id }),
            Ok(None) => Err(TrackingError::Unauthenticated.into()),
            Err(err) => {
                error!("Failed to authenticate caller: {}", err);
                Err(ApiError::InternalServerError(String::from(
                    "Failed to authenticate caller",
                )))
            }
        }
    }
}

impl OperationInput for Caller {}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
