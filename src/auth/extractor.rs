use super::{Authenticator, bearer_token};
use crate::accounts::types::Identity;
use crate::error::AppError;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;

/// Identity of the caller of an authenticated HTTP route.
///
/// Requires an `Extension<Arc<Authenticator>>` layer on the router.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = parts
            .extensions
            .get::<Arc<Authenticator>>()
            .cloned()
            .ok_or_else(|| AppError::Auth("authenticator not configured".to_string()))?;

        let credential = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(bearer_token);

        authenticator.authenticate(credential).map(AuthenticatedUser)
    }
}
