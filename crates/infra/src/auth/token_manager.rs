//! Single-flight token refresh.
//!
//! All outbound catalog calls source their bearer token here. Concurrent
//! callers racing an expired token are serialized through a capacity-one
//! gate, and the cache is re-checked inside the gate so waiters piggyback on
//! a refresh that completed while they were queued — at most one
//! authorization request is in flight at any time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gamesync_core::AccessTokenProvider;
use gamesync_domain::{GameSyncError, IgdbConfig, Result, TwitchTokenResponse};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::token_cache::TokenCache;

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches and refreshes the client-credentials token, backed by a shared
/// [`TokenCache`].
pub struct TokenManager {
    http: reqwest::Client,
    config: IgdbConfig,
    cache: Arc<TokenCache>,
    refresh_gate: Mutex<()>,
}

impl TokenManager {
    /// Create a manager over the given credentials and shared cache.
    pub fn new(config: IgdbConfig, cache: Arc<TokenCache>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(|err| GameSyncError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(Self { http, config, cache, refresh_gate: Mutex::new(()) })
    }

    /// Return a currently valid token, refreshing it if necessary.
    ///
    /// # Errors
    /// Returns `GameSyncError::TokenRetrieval` when the authorization
    /// endpoint is unreachable, answers with a non-success status, or
    /// returns a payload without a usable token. The cache is left untouched
    /// on every failure path.
    pub async fn get_valid_token(&self) -> Result<String> {
        // Fast path: no locking while the cached token is still good.
        if self.cache.is_valid() {
            return Ok(self.cache.get());
        }

        let _gate = self.refresh_gate.lock().await;

        // Double-check: another caller may have refreshed while we waited.
        if self.cache.is_valid() {
            debug!("Token refreshed by a concurrent caller, skipping request");
            return Ok(self.cache.get());
        }

        self.refresh_token().await
    }

    async fn refresh_token(&self) -> Result<String> {
        debug!("Requesting a new access token");

        let response = self
            .http
            .post(&self.config.auth_url)
            .query(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|err| {
                GameSyncError::TokenRetrieval(format!("authorization request failed: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GameSyncError::TokenRetrieval(format!(
                "authorization endpoint returned {status}"
            )));
        }

        let token: TwitchTokenResponse = response.json().await.map_err(|err| {
            GameSyncError::TokenRetrieval(format!("unparseable token response: {err}"))
        })?;

        if token.access_token.is_empty() {
            return Err(GameSyncError::TokenRetrieval(
                "authorization endpoint returned an empty access token".into(),
            ));
        }

        self.cache.set(&token.access_token, token.expires_in);
        info!(expires_in = token.expires_in, "Access token refreshed");

        Ok(token.access_token)
    }
}

#[async_trait]
impl AccessTokenProvider for TokenManager {
    async fn get_valid_token(&self) -> Result<String> {
        Self::get_valid_token(self).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(auth_url: String) -> IgdbConfig {
        IgdbConfig {
            auth_url,
            base_url: "http://unused.invalid".to_string(),
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
        }
    }

    fn token_body(token: &str, expires_in: u64) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "expires_in": expires_in,
            "token_type": "bearer",
        })
    }

    #[tokio::test]
    async fn fetches_token_with_client_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("client_id", "client-id"))
            .and(query_param("client_secret", "client-secret"))
            .and(query_param("grant_type", "client_credentials"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(TokenCache::new());
        let manager = TokenManager::new(config(server.uri()), cache.clone()).expect("manager");

        let token = manager.get_valid_token().await.expect("token");

        assert_eq!(token, "tok-1");
        assert!(cache.is_valid());
    }

    #[tokio::test]
    async fn cached_token_is_reused_without_a_second_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let manager =
            TokenManager::new(config(server.uri()), Arc::new(TokenCache::new())).expect("manager");

        let first = manager.get_valid_token().await.expect("token");
        let second = manager.get_valid_token().await.expect("token");

        assert_eq!(first, second);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_token_triggers_exactly_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-2", 3600)))
            .expect(1)
            .mount(&server)
            .await;

        let cache = Arc::new(TokenCache::new());
        // Already expired after margin subtraction.
        cache.set("stale", 0);
        assert!(!cache.is_valid());

        let manager = TokenManager::new(config(server.uri()), cache.clone()).expect("manager");
        let token = manager.get_valid_token().await.expect("token");

        assert_eq!(token, "tok-2");
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_a_token_retrieval_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let cache = Arc::new(TokenCache::new());
        let manager = TokenManager::new(config(server.uri()), cache.clone()).expect("manager");

        let result = manager.get_valid_token().await;

        assert!(matches!(result, Err(GameSyncError::TokenRetrieval(_))));
        assert!(!cache.is_valid());
    }

    #[tokio::test]
    async fn empty_access_token_is_a_token_retrieval_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("", 3600)))
            .mount(&server)
            .await;

        let cache = Arc::new(TokenCache::new());
        let manager = TokenManager::new(config(server.uri()), cache.clone()).expect("manager");

        let result = manager.get_valid_token().await;

        assert!(matches!(result, Err(GameSyncError::TokenRetrieval(_))));
        assert!(!cache.is_valid());
    }

    #[tokio::test]
    async fn unparseable_body_is_a_token_retrieval_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not-json"))
            .mount(&server)
            .await;

        let manager =
            TokenManager::new(config(server.uri()), Arc::new(TokenCache::new())).expect("manager");

        let result = manager.get_valid_token().await;
        assert!(matches!(result, Err(GameSyncError::TokenRetrieval(_))));
    }

    #[tokio::test]
    async fn concurrent_callers_share_a_single_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("tok-race", 3600))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = Arc::new(
            TokenManager::new(config(server.uri()), Arc::new(TokenCache::new())).expect("manager"),
        );

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            tasks.push(tokio::spawn(async move { manager.get_valid_token().await }));
        }

        for task in tasks {
            let token = task.await.expect("join").expect("token");
            assert_eq!(token, "tok-race");
        }

        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
