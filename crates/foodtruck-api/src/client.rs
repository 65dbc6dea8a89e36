use async_trait::async_trait;
use foodtruck_core::error::{FoodtruckError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::*;

/// The three lookups the bot needs from the food-truck API.
#[async_trait]
pub trait FoodTruckApi: Send + Sync {
    async fn fetch_neighborhoods(&self) -> Result<NeighborhoodList>;
    async fn fetch_locations(&self, query: &LocationQuery) -> Result<LocationList>;
    async fn fetch_location_events(&self, query: &LocationEventsQuery) -> Result<EventList>;
}

pub struct FoodTruckClient {
    http: Client,
    base_url: String,
}

impl FoodTruckClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(FoodtruckError::InvalidConfig(
                "food truck api base url is missing".to_string(),
            ));
        }
        Ok(Self {
            http: Client::new(),
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the body. The body is read in full before decoding
    /// so the connection goes back to the pool on every path.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: Option<String>) -> Result<T> {
        let url = match &query {
            Some(qs) => format!("{}{path}?{qs}", self.base_url),
            None => format!("{}{path}", self.base_url),
        };
        debug!(path, query = query.as_deref().unwrap_or(""), "[api] GET");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FoodtruckError::Network(format!("failed to query {path}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FoodtruckError::Network(format!("failed to read {path} response: {e}")))?;

        if !status.is_success() {
            return Err(FoodtruckError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| FoodtruckError::Decode(format!("unexpected {path} response: {e}")))
    }
}

#[async_trait]
impl FoodTruckApi for FoodTruckClient {
    async fn fetch_neighborhoods(&self) -> Result<NeighborhoodList> {
        self.get_json("/api/neighborhoods", None).await
    }

    async fn fetch_locations(&self, query: &LocationQuery) -> Result<LocationList> {
        self.get_json("/api/locations", Some(query.query_string()))
            .await
    }

    async fn fetch_location_events(&self, query: &LocationEventsQuery) -> Result<EventList> {
        self.get_json("/api/events", Some(query.query_string())).await
    }
}
