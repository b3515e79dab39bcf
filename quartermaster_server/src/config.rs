use std::env;

use chrono::Duration;
use log::*;
use qm_common::Secret;

const DEFAULT_QM_HOST: &str = "127.0.0.1";
const DEFAULT_QM_PORT: u16 = 8360;
const DEFAULT_PURCHASE_COOLDOWN_SECS: i64 = 30;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Where catalog changes get pushed so the chat surface can refresh its listings.
    pub relay: RelayConfig,
    /// The per-player cooldown applied to purchases and taxi orders. `None` disables it.
    pub purchase_cooldown: Option<Duration>,
}

/// The cooldown wrapped for injection into request handlers.
#[derive(Clone, Copy, Debug)]
pub struct PurchaseCooldown(pub Option<Duration>);

#[derive(Clone, Debug, Default)]
pub struct RelayConfig {
    /// Base URL of the chat bot's internal endpoint. Empty disables the relay entirely.
    pub url: Option<String>,
    pub auth_token: Secret<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_QM_HOST.to_string(),
            port: DEFAULT_QM_PORT,
            database_url: String::default(),
            relay: RelayConfig::default(),
            purchase_cooldown: Some(Duration::seconds(DEFAULT_PURCHASE_COOLDOWN_SECS)),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("QM_HOST").ok().unwrap_or_else(|| DEFAULT_QM_HOST.into());
        let port = env::var("QM_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for QM_PORT. {e} Using the default, {DEFAULT_QM_PORT}, instead.");
                    DEFAULT_QM_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_QM_PORT);
        let database_url = env::var("QM_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ QM_DATABASE_URL is not set. Please set it to the URL for the Quartermaster database.");
            String::default()
        });
        let relay = RelayConfig::from_env_or_default();
        let purchase_cooldown = env::var("QM_PURCHASE_COOLDOWN_SECS")
            .map(|s| {
                s.parse::<i64>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid value for QM_PURCHASE_COOLDOWN_SECS. {e} Using the default, \
                         {DEFAULT_PURCHASE_COOLDOWN_SECS}s, instead."
                    );
                    DEFAULT_PURCHASE_COOLDOWN_SECS
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PURCHASE_COOLDOWN_SECS);
        let purchase_cooldown = if purchase_cooldown <= 0 {
            warn!("🪛️ The purchase cooldown is disabled. Players can spam purchases as fast as they can type.");
            None
        } else {
            Some(Duration::seconds(purchase_cooldown))
        };
        Self { host, port, database_url, relay, purchase_cooldown }
    }
}

impl RelayConfig {
    pub fn from_env_or_default() -> Self {
        let url = match env::var("QM_RELAY_URL") {
            Ok(s) if !s.trim().is_empty() => Some(s.trim_end_matches('/').to_string()),
            _ => {
                warn!("🪛️ QM_RELAY_URL is not set. Catalog changes will not be pushed to the chat surface.");
                None
            },
        };
        let auth_token = Secret::new(env::var("QM_RELAY_TOKEN").unwrap_or_else(|_| {
            if url.is_some() {
                warn!("🪛️ QM_RELAY_TOKEN is not set. Relay requests will be sent unauthenticated.");
            }
            String::default()
        }));
        Self { url, auth_token }
    }
}
