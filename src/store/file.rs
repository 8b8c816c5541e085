use super::{TokenMap, access_token, insert_tokens, refresh_token};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::finnotech::{TokenSet, TokenStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const TOKEN_CACHE_FILE: &str = "tokens.json";

/// Keeps tokens in a JSON file readable only by the current user
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store under the XDG cache directory
    pub fn in_cache_dir() -> Result<Self> {
        Ok(Self::new(Config::cache_file(TOKEN_CACHE_FILE)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_tokens(&self) -> Result<TokenMap> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TokenMap::new()),
            Err(e) => return Err(e.into()),
        };

        let tokens = serde_json::from_str(&contents)?;

        Ok(tokens)
    }

    /// Sibling file the next version is written to before it replaces `path`
    fn staging_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| TOKEN_CACHE_FILE.to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()))
    }

    async fn save_tokens(&self, tokens: &TokenMap) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::Config(format!("Failed to create token cache directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(tokens)?;
        let staging = self.staging_path();

        // Readers only ever see a complete file: write aside, then rename over
        if let Err(e) = Self::write_private(&staging, contents.as_bytes()).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&staging, &self.path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
        // Create file with owner-only permissions from the start
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .mode(0o600)
            .open(path)
            .await?;

        file.write_all(contents).await?;
        file.sync_all().await?;

        Ok(())
    }

    /// Remove the token file if present
    #[instrument(name = "Clearing cached tokens", skip_all)]
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cached tokens to clear");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        info!(path = ?self.path, "Cleared cached tokens");

        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn fetch_access(&self, scope: &str) -> Result<String> {
        access_token(&self.load_tokens().await?, scope)
    }

    async fn fetch_refresh(&self, scope: &str) -> Result<String> {
        refresh_token(&self.load_tokens().await?, scope)
    }

    async fn persist(&self, tokens: TokenSet) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut stored = self.load_tokens().await?;
        insert_tokens(&mut stored, tokens);
        self.save_tokens(&stored).await?;

        debug!(path = ?self.path, "Saved tokens");
        Ok(())
    }
}
