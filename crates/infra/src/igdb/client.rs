//! Authenticated catalog API client.
//!
//! Every request carries the `Client-ID` header and a bearer token obtained
//! from the token provider. Endpoints are paged with the API's query body
//! format (`fields ...; where ...; limit N; offset M;`), looping until an
//! empty page comes back.

use std::sync::Arc;

use async_trait::async_trait;
use gamesync_core::{AccessTokenProvider, CatalogProvider};
use gamesync_domain::{GameSyncError, IgdbConfig, IgdbGame, IgdbGenre, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http::HttpClient;

const PAGE_SIZE: usize = 500;

/// Catalog API client implementing the [`CatalogProvider`] port.
pub struct IgdbClient {
    http: HttpClient,
    base_url: String,
    client_id: String,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl IgdbClient {
    pub fn new(config: &IgdbConfig, tokens: Arc<dyn AccessTokenProvider>) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            tokens,
        })
    }

    async fn fetch_all_paged<T>(
        &self,
        endpoint: &str,
        fields: &str,
        where_clause: Option<&str>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut offset = 0;
        let mut all_items = Vec::new();

        loop {
            let filter = match where_clause {
                Some(clause) => format!(" where {clause};"),
                None => String::new(),
            };
            let query = format!("fields {fields};{filter} limit {PAGE_SIZE}; offset {offset};");

            debug!(endpoint = %endpoint, offset, "Fetching catalog page");

            let token = self.tokens.get_valid_token().await?;
            let request = self
                .http
                .request(Method::POST, format!("{}/{endpoint}", self.base_url))
                .header("Client-ID", &self.client_id)
                .bearer_auth(token)
                .header(CONTENT_TYPE, "text/plain")
                .body(query);

            let response = self.http.send(request).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(GameSyncError::Network(format!(
                    "catalog endpoint {endpoint} returned {status}"
                )));
            }

            let items: Vec<T> = response.json().await.map_err(|err| {
                GameSyncError::Network(format!("unparseable catalog response: {err}"))
            })?;

            if items.is_empty() {
                break;
            }

            all_items.extend(items);
            offset += PAGE_SIZE;
        }

        Ok(all_items)
    }
}

#[async_trait]
impl CatalogProvider for IgdbClient {
    async fn fetch_genres(&self) -> Result<Vec<IgdbGenre>> {
        self.fetch_all_paged("genres", "name,slug", None).await
    }

    async fn fetch_games_by_platforms(&self, platform_ids: &[i64]) -> Result<Vec<IgdbGame>> {
        let fields = "name,slug,summary,storyline,platforms,genres";
        if platform_ids.is_empty() {
            return self.fetch_all_paged("games", fields, None).await;
        }

        let platforms_filter =
            platform_ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        let where_clause = format!("platforms = ({platforms_filter})");

        self.fetch_all_paged("games", fields, Some(&where_clause)).await
    }
}
