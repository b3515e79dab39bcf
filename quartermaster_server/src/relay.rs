//! The catalog relay client.
//!
//! Whenever the catalog changes, the change is pushed to the chat bot's internal endpoint so the
//! posted shop listings can be refreshed in place. Delivery is at-least-once: a failed push is
//! logged and reported to the caller, but the catalog write it refers to has already committed.
//! Replays are harmless because listings are keyed by item name on the bot side.

use std::sync::Arc;

use log::*;
use quartermaster_engine::db_types::{ShopItem, Taxi};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::RelayConfig;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Could not initialize the relay client. {0}")]
    Initialization(String),
    #[error("Relay request failed: {0}")]
    RequestError(String),
    #[error("Relay returned an error. Code: {status}, message: {message}")]
    QueryError { status: u16, message: String },
}

#[derive(Clone)]
pub struct CatalogRelay {
    config: RelayConfig,
    client: Arc<Client>,
}

impl CatalogRelay {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let mut headers = HeaderMap::with_capacity(2);
        let token = config.auth_token.reveal();
        if !token.is_empty() {
            let val = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| RelayError::Initialization(e.to_string()))?;
            headers.insert("Authorization", val);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| RelayError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn publish_item(&self, item: &ShopItem) -> Result<(), RelayError> {
        self.post("/internal/items", item).await?;
        info!("🔗️ Item '{}' pushed to the chat surface", item.name);
        Ok(())
    }

    pub async fn publish_taxi(&self, taxi: &Taxi) -> Result<(), RelayError> {
        self.post("/internal/taxis", taxi).await?;
        info!("🔗️ Taxi '{}' pushed to the chat surface", taxi.name);
        Ok(())
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(), RelayError> {
        let Some(base) = &self.config.url else {
            debug!("🔗️ Relay is not configured. Skipping push to {path}");
            return Ok(());
        };
        let url = format!("{base}{path}");
        trace!("🔗️ Sending relay POST: {url}");
        let response =
            self.client.post(url).json(body).send().await.map_err(|e| RelayError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("🔗️ Relay POST successful. {}", response.status());
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| RelayError::RequestError(e.to_string()))?;
            Err(RelayError::QueryError { status, message })
        }
    }
}
