use super::{TokenMap, access_token, insert_tokens, refresh_token};
use crate::error::Result;
use crate::finnotech::{TokenSet, TokenStore};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Keeps tokens for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<TokenMap>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn fetch_access(&self, scope: &str) -> Result<String> {
        access_token(&*self.tokens.read().await, scope)
    }

    async fn fetch_refresh(&self, scope: &str) -> Result<String> {
        refresh_token(&*self.tokens.read().await, scope)
    }

    async fn persist(&self, tokens: TokenSet) -> Result<()> {
        debug!(scopes = ?tokens.scopes, "Storing tokens in memory");
        insert_tokens(&mut *self.tokens.write().await, tokens);
        Ok(())
    }
}
