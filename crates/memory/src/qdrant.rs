//! Qdrant fact store over the REST API.
//!
//! Endpoints used:
//! - `GET/PUT/DELETE /collections/{name}`
//! - `PUT /collections/{name}/points?wait=true`
//! - `POST /collections/{name}/points/search`
//! - `POST /collections/{name}/points/count`

use async_trait::async_trait;
use citewright_core::error::MemoryError;
use citewright_core::memory::{FactPayload, FactStore, MemoryRecord, ScoredFact};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

pub struct QdrantFactStore {
    base_url: String,
    collection: String,
    api_key: Option<String>,
    /// Vector size used when `reset` recreates the collection
    dimension: usize,
    client: reqwest::Client,
}

impl QdrantFactStore {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key: None,
            dimension,
            client: build_client(Duration::from_secs(30)),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, MemoryError> {
        builder
            .send()
            .await
            .map_err(|e| MemoryError::Unreachable(e.to_string()))
    }

    async fn create_collection(&self, dimension: usize) -> Result<(), MemoryError> {
        let response = self
            .send(
                self.request(reqwest::Method::PUT, self.collection_url())
                    .json(&create_collection_body(dimension)),
            )
            .await?;
        expect_success(response, MemoryError::Storage).await?;
        info!(collection = %self.collection, dimension, "Created Qdrant collection");
        Ok(())
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

async fn expect_success(
    response: reqwest::Response,
    wrap: fn(String) -> MemoryError,
) -> Result<reqwest::Response, MemoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(wrap(format!("Qdrant returned {status}: {body}")))
}

fn create_collection_body(dimension: usize) -> serde_json::Value {
    serde_json::json!({
        "vectors": { "size": dimension, "distance": "Cosine" }
    })
}

fn upsert_body(record: &MemoryRecord) -> serde_json::Value {
    serde_json::json!({
        "points": [{
            "id": record.id,
            "vector": record.vector,
            "payload": record.payload,
        }]
    })
}

fn search_body(vector: &[f32], top_k: usize) -> serde_json::Value {
    serde_json::json!({
        "vector": vector,
        "limit": top_k,
        "with_payload": true,
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    score: f32,
    #[serde(default)]
    payload: Option<FactPayload>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: usize,
}

/// Hits without a usable payload are dropped.
fn parse_search(body: &str) -> Result<Vec<ScoredFact>, MemoryError> {
    let parsed: SearchResponse = serde_json::from_str(body)
        .map_err(|e| MemoryError::QueryFailed(format!("Malformed search response: {e}")))?;
    Ok(parsed
        .result
        .into_iter()
        .filter_map(|hit| {
            hit.payload
                .filter(|p| !p.fact.is_empty())
                .map(|payload| ScoredFact { payload, score: hit.score })
        })
        .collect())
}

#[async_trait]
impl FactStore for QdrantFactStore {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), MemoryError> {
        let response = self
            .send(self.request(reqwest::Method::GET, self.collection_url()))
            .await?;

        match response.status().as_u16() {
            200 => Ok(()),
            404 => self.create_collection(dimension).await,
            _ => expect_success(response, MemoryError::Storage).await.map(|_| ()),
        }
    }

    async fn upsert(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        if record.vector.len() != self.dimension {
            return Err(MemoryError::DimensionMismatch {
                expected: self.dimension,
                actual: record.vector.len(),
            });
        }

        debug!(id = %record.id, collection = %self.collection, "Upserting fact");
        let url = format!("{}/points?wait=true", self.collection_url());
        let response = self
            .send(self.request(reqwest::Method::PUT, url).json(&upsert_body(&record)))
            .await?;
        expect_success(response, MemoryError::Storage).await?;
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredFact>, MemoryError> {
        let url = format!("{}/points/search", self.collection_url());
        let response = self
            .send(self.request(reqwest::Method::POST, url).json(&search_body(vector, top_k)))
            .await?;
        let response = expect_success(response, MemoryError::QueryFailed).await?;
        let body = response
            .text()
            .await
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;
        parse_search(&body)
    }

    async fn reset(&self) -> Result<(), MemoryError> {
        let response = self
            .send(self.request(reqwest::Method::DELETE, self.collection_url()))
            .await?;
        // Deleting a collection that never existed is fine
        if response.status().as_u16() != 404 {
            expect_success(response, MemoryError::Storage).await?;
        }
        self.create_collection(self.dimension).await
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let url = format!("{}/points/count", self.collection_url());
        let response = self
            .send(
                self.request(reqwest::Method::POST, url)
                    .json(&serde_json::json!({ "exact": true })),
            )
            .await?;
        let response = expect_success(response, MemoryError::QueryFailed).await?;
        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("Malformed count response: {e}")))?;
        Ok(parsed.result.count)
    }
}
