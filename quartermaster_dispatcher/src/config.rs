use std::{env, time::Duration};

use log::*;
use quartermaster_engine::commands::Coordinate;

const DEFAULT_CONSOLE_ADDR: &str = "127.0.0.1:7779";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_BATCH_SIZE: i64 = 5;
const DEFAULT_ACTUATOR_TIMEOUT_SECS: u64 = 30;
const DEFAULT_COMMAND_DELAY_MS: u64 = 3000;
const DEFAULT_LEASE_TTL_SECS: i64 = 60;

#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    pub database_url: String,
    /// How often the ledger is polled for pending work.
    pub poll_interval: Duration,
    /// The maximum number of shop (and taxi) orders claimed per cycle.
    pub batch_size: i64,
    /// Identifies this instance in the lease row. Unique per process.
    pub instance_id: String,
    /// The lease must be renewed within this window, or another instance may take over.
    pub lease_ttl: chrono::Duration,
    pub actuator: ActuatorConfig,
}

#[derive(Clone, Debug)]
pub struct ActuatorConfig {
    /// Address of the game console bridge.
    pub console_addr: String,
    /// Upper bound on any single actuator step.
    pub timeout: Duration,
    /// Think-time pause after each console command, matching the pace the game tolerates.
    pub command_delay: Duration,
    /// Where the drone parks between deliveries.
    pub staging: Option<Coordinate>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            database_url: String::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            instance_id: default_instance_id(),
            lease_ttl: chrono::Duration::seconds(DEFAULT_LEASE_TTL_SECS),
            actuator: ActuatorConfig::default(),
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            console_addr: DEFAULT_CONSOLE_ADDR.to_string(),
            timeout: Duration::from_secs(DEFAULT_ACTUATOR_TIMEOUT_SECS),
            command_delay: Duration::from_millis(DEFAULT_COMMAND_DELAY_MS),
            staging: None,
        }
    }
}

fn default_instance_id() -> String {
    format!("dispatcher-{}", std::process::id())
}

fn env_u64(var: &str, default: u64) -> u64 {
    env::var(var)
        .map(|s| {
            s.parse::<u64>().unwrap_or_else(|e| {
                error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
                default
            })
        })
        .ok()
        .unwrap_or(default)
}

impl DispatcherConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("QM_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ QM_DATABASE_URL is not set. Please set it to the URL for the Quartermaster database.");
            String::default()
        });
        let poll_interval = Duration::from_secs(env_u64("QM_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS));
        let batch_size = env_u64("QM_BATCH_SIZE", DEFAULT_BATCH_SIZE as u64) as i64;
        let instance_id = env::var("QM_INSTANCE_ID").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
            let id = default_instance_id();
            info!("🪛️ QM_INSTANCE_ID is not set. Using {id}.");
            id
        });
        let lease_ttl = chrono::Duration::seconds(env_u64("QM_LEASE_TTL_SECS", DEFAULT_LEASE_TTL_SECS as u64) as i64);
        let actuator = ActuatorConfig::from_env_or_default();
        Self { database_url, poll_interval, batch_size, instance_id, lease_ttl, actuator }
    }
}

impl ActuatorConfig {
    pub fn from_env_or_default() -> Self {
        let console_addr = env::var("QM_CONSOLE_ADDR").ok().unwrap_or_else(|| {
            warn!("🪛️ QM_CONSOLE_ADDR is not set. Using the default, {DEFAULT_CONSOLE_ADDR}.");
            DEFAULT_CONSOLE_ADDR.to_string()
        });
        let timeout = Duration::from_secs(env_u64("QM_ACTUATOR_TIMEOUT", DEFAULT_ACTUATOR_TIMEOUT_SECS));
        let command_delay = Duration::from_millis(env_u64("QM_COMMAND_DELAY_MS", DEFAULT_COMMAND_DELAY_MS));
        let staging = match env::var("QM_STAGING_COORDS") {
            Ok(s) => match s.parse::<Coordinate>() {
                Ok(c) => Some(c),
                Err(e) => {
                    error!("🪛️ QM_STAGING_COORDS could not be parsed. {e}. The drone will not return to staging.");
                    None
                },
            },
            Err(_) => {
                warn!("🪛️ QM_STAGING_COORDS is not set. The drone will stay wherever its last delivery left it.");
                None
            },
        };
        Self { console_addr, timeout, command_delay, staging }
    }
}
