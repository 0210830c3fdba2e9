//! Bearer Credential Module
//!
//! Turns an opaque bearer token into exactly one `Identity`.
//!
//! ## Resolution order
//! 1. Verify the token signature and expiry (`TokenService`).
//! 2. Look the embedded account id up in the volunteer store, then the NGO store.
//!
//! The resulting `Identity` carries its `AccountKind`, so nothing downstream
//! ever has to probe the stores again.

pub mod extractor;
pub mod token;

use crate::accounts::directory::AccountDirectory;
use crate::accounts::types::Identity;
use crate::error::{AppError, Result};
use std::sync::Arc;
use token::TokenService;

/// Verifies credentials and resolves them against the account directory.
pub struct Authenticator {
    tokens: TokenService,
    accounts: Arc<AccountDirectory>,
}

impl Authenticator {
    pub fn new(tokens: TokenService, accounts: Arc<AccountDirectory>) -> Self {
        Self { tokens, accounts }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn authenticate(&self, credential: Option<&str>) -> Result<Identity> {
        let token = credential
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Auth("no token provided".to_string()))?;

        let claims = self.tokens.verify(token)?;

        self.accounts
            .resolve(&claims.id)
            .ok_or_else(|| AppError::Auth("user not found".to_string()))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let mut parts = header_value.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
