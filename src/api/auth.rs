//! Request identity.
//!
//! Authentication itself (login, cookies, tokens) happens in front of this service. By
//! the time a request arrives, an upstream gateway has verified the caller and put the
//! user id in a trusted header; [`IdentityResolver`] turns that into an owner id and the
//! [`CurrentUser`] extractor rejects requests without one before any handler runs.

use super::AppState;
use crate::errors::{Error, Result};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderName, request::Parts},
};

/// Resolves request headers to the id of the calling user.
pub trait IdentityResolver: Send + Sync {
    /// Returns the user id, or `None` when the request carries no usable identity.
    fn resolve(&self, headers: &HeaderMap) -> Option<String>;
}

/// Reads the user id from a single trusted header.
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    header: HeaderName,
}

impl HeaderIdentity {
    /// Creates a resolver reading `header_name`.
    ///
    /// # Errors
    /// [`Error::Config`] if `header_name` is not a valid HTTP header name.
    pub fn new(header_name: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(header_name.as_bytes()).map_err(|e| Error::Config {
            message: format!("Invalid identity header '{header_name}': {e}"),
        })?;
        Ok(Self { header })
    }
}

impl IdentityResolver for HeaderIdentity {
    fn resolve(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(&self.header)?.to_str().ok()?.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// The authenticated owner of the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        state
            .identity
            .resolve(&parts.headers)
            .map(Self)
            .ok_or(Error::Unauthenticated)
    }
}
