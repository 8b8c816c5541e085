use crate::config::FinnotechConfig;
use crate::error::{Error, Result};
use crate::finnotech::scope::GrantType;
use crate::finnotech::resolve_track_id;
use crate::finnotech::types::ApiResponse;
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

const TOKEN_PATH: &str = "/dev/v2/oauth2/token";
const REFRESH_TOKEN_TYPE: &str = "CLIENT-CREDENTIAL";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub client_id: String,
    pub client_secret: String,
    pub nid: String,
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("nid", &self.nid)
            .finish()
    }
}

/// Token record handed to the store after every issuance or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds as reported by the token endpoint
    pub life_time: u64,
    pub scopes: Vec<String>,
    pub token_type: GrantType,
}

/// Where tokens live is up to the embedding application.
///
/// Each operation defaults to failing with [`Error::MissingDelegate`], so an
/// implementation only needs to provide the operations it supports.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn fetch_access(&self, _scope: &str) -> Result<String> {
        Err(Error::MissingDelegate("fetch_access"))
    }

    async fn fetch_refresh(&self, _scope: &str) -> Result<String> {
        Err(Error::MissingDelegate("fetch_refresh"))
    }

    async fn persist(&self, _tokens: TokenSet) -> Result<()> {
        Err(Error::MissingDelegate("persist"))
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
enum TokenRequest<'a> {
    ClientCredentials {
        nid: &'a str,
        scopes: String,
    },
    RefreshToken {
        token_type: &'static str,
        refresh_token: &'a str,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuedToken {
    value: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    life_time: u64,
    #[serde(default)]
    scopes: Vec<String>,
}

impl From<IssuedToken> for TokenSet {
    fn from(issued: IssuedToken) -> Self {
        TokenSet {
            access_token: issued.value,
            refresh_token: issued.refresh_token,
            life_time: issued.life_time,
            scopes: issued.scopes,
            token_type: GrantType::ClientCredentials,
        }
    }
}

/// Issues client-credentials tokens and relays token storage to a [`TokenStore`].
///
/// The service keeps no token state of its own.
pub struct TokenService {
    identity: ClientIdentity,
    store: Option<Arc<dyn TokenStore>>,
    http_client: reqwest::Client,
    token_url: String,
}

impl TokenService {
    pub fn new(identity: ClientIdentity, api_base_url: &str) -> Self {
        Self {
            identity,
            store: None,
            http_client: reqwest::Client::new(),
            token_url: format!("{}{}", api_base_url.trim_end_matches('/'), TOKEN_PATH),
        }
    }

    pub fn from_config(config: &FinnotechConfig) -> Self {
        Self::new(config.identity(), &config.api_base_url())
    }

    pub fn with_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.identity.client_id
    }

    pub(super) fn http_client(&self) -> reqwest::Client {
        self.http_client.clone()
    }

    fn store(&self) -> Result<&Arc<dyn TokenStore>> {
        self.store
            .as_ref()
            .ok_or(Error::MissingDelegate("token store"))
    }

    pub async fn get_access_token(&self, scope: &str) -> Result<String> {
        self.store()?.fetch_access(scope).await
    }

    pub async fn get_refresh_token(&self, scope: &str) -> Result<String> {
        self.store()?.fetch_refresh(scope).await
    }

    pub async fn set_tokens(&self, tokens: TokenSet) -> Result<()> {
        self.store()?.persist(tokens).await
    }

    /// Exchange the client identity for a fresh token covering `scopes`
    pub async fn get_client_credential_token(&self, scopes: &[&str]) -> Result<TokenSet> {
        self.get_client_credential_token_with_track_id(scopes, None)
            .await
    }

    /// As [`get_client_credential_token`](Self::get_client_credential_token),
    /// sending `track_id` instead of a generated one
    #[instrument(name = "Issuing client-credentials token", skip_all, fields(scopes = scopes.len()))]
    pub async fn get_client_credential_token_with_track_id(
        &self,
        scopes: &[&str],
        track_id: Option<&str>,
    ) -> Result<TokenSet> {
        if scopes.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one scope is required".to_string(),
            ));
        }

        let request = TokenRequest::ClientCredentials {
            nid: &self.identity.nid,
            scopes: scopes.join(","),
        };
        let tokens = self.request_token(&request, track_id).await?;

        debug!(scopes = ?tokens.scopes, "Client-credentials token issued");
        self.set_tokens(tokens.clone()).await?;

        Ok(tokens)
    }

    /// Refresh the client-credentials token stored for `scope`
    pub async fn get_client_credentials_refresh_token(&self, scope: &str) -> Result<TokenSet> {
        self.get_client_credentials_refresh_token_with_track_id(scope, None)
            .await
    }

    #[instrument(name = "Refreshing client-credentials token", skip_all, fields(scope = %scope))]
    pub async fn get_client_credentials_refresh_token_with_track_id(
        &self,
        scope: &str,
        track_id: Option<&str>,
    ) -> Result<TokenSet> {
        let refresh_token = self.get_refresh_token(scope).await?;

        let request = TokenRequest::RefreshToken {
            token_type: REFRESH_TOKEN_TYPE,
            refresh_token: &refresh_token,
        };
        let tokens = self.request_token(&request, track_id).await?;

        debug!("Client-credentials token refreshed");
        self.set_tokens(tokens.clone()).await?;

        Ok(tokens)
    }

    async fn request_token(
        &self,
        request: &TokenRequest<'_>,
        track_id: Option<&str>,
    ) -> Result<TokenSet> {
        let track_id = resolve_track_id(track_id);
        debug!(track_id, "Requesting token");

        let response: ApiResponse<IssuedToken> = self
            .http_client
            .post(&self.token_url)
            .header(AUTHORIZATION, self.basic_authorization())
            .query(&[("trackId", &track_id)])
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.result.into())
    }

    fn basic_authorization(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.identity.client_id, self.identity.client_secret
        );
        format!("Basic {}", STANDARD.encode(credentials))
    }
}
