//! Ready-made [`TokenStore`](crate::finnotech::TokenStore) implementations.
mod file;
mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

use crate::error::{Error, Result};
use crate::finnotech::TokenSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Refresh this many seconds before the reported expiry
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoredToken {
    pub tokens: TokenSet,
    /// Expiry time as seconds since Unix epoch
    pub expires_at: i64,
}

impl StoredToken {
    pub fn new(tokens: TokenSet) -> Self {
        let life_time = i64::try_from(tokens.life_time).unwrap_or(i64::MAX);
        let expires_at = chrono::Utc::now().timestamp().saturating_add(life_time);
        Self { tokens, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.expires_at < now.saturating_add(EXPIRY_SKEW_SECS)
    }
}

type TokenMap = HashMap<String, StoredToken>;

/// File a token set under each scope it covers
fn insert_tokens(map: &mut TokenMap, tokens: TokenSet) {
    let stored = StoredToken::new(tokens);
    for scope in &stored.tokens.scopes {
        map.insert(scope.clone(), stored.clone());
    }
}

fn access_token(map: &TokenMap, scope: &str) -> Result<String> {
    let stored = map
        .get(scope)
        .ok_or_else(|| Error::TokenNotFound(scope.to_string()))?;

    if stored.is_expired() {
        return Err(Error::TokenExpired(scope.to_string()));
    }

    Ok(stored.tokens.access_token.clone())
}

fn refresh_token(map: &TokenMap, scope: &str) -> Result<String> {
    map.get(scope)
        .map(|stored| stored.tokens.refresh_token.clone())
        .ok_or_else(|| Error::TokenNotFound(scope.to_string()))
}
