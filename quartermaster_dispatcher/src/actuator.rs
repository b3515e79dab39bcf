//! The actuator drives the game's admin console.
//!
//! The console is a singleton, stateful session: the drone must be attached and parked at a
//! staging spot before any delivery, and commands have to be paced or the game drops them.
//! [`Actuator`] captures that lifecycle so the worker can be tested against a scripted double,
//! and [`ConsoleActuator`] is the real line-oriented TCP implementation talking to the console
//! bridge.

use log::*;
use quartermaster_engine::commands::ConsoleCommand;
use thiserror::Error;
use tokio::{
    io::{AsyncWriteExt, BufWriter},
    net::TcpStream,
};

use crate::config::ActuatorConfig;

#[derive(Debug, Clone, Error)]
pub enum ActuatorError {
    #[error("Could not reach the game console: {0}")]
    ConnectionError(String),
    #[error("The console connection was lost: {0}")]
    ConnectionLost(String),
    #[error("The console did not accept the command in time")]
    Timeout,
    #[error("The actuator session is not connected")]
    NotConnected,
}

/// One admin-console session.
///
/// `connect` must succeed before anything else; every other method may assume an attached
/// session. Implementations do not retry: the worker decides what a fault means for the order
/// being delivered.
#[allow(async_fn_in_trait)]
pub trait Actuator {
    /// Attach to the console and park the drone at the staging spot.
    async fn connect(&mut self) -> Result<(), ActuatorError>;

    /// Type one rendered command into the console.
    async fn issue(&mut self, command: &ConsoleCommand) -> Result<(), ActuatorError>;

    /// Park the drone back at the staging spot, if one is configured.
    async fn return_to_staging(&mut self) -> Result<(), ActuatorError>;

    async fn close(&mut self) -> Result<(), ActuatorError>;
}

/// Writes `#command` lines to the console bridge over TCP, with a think-time pause after each
/// line.
pub struct ConsoleActuator {
    config: ActuatorConfig,
    stream: Option<BufWriter<TcpStream>>,
}

impl ConsoleActuator {
    pub fn new(config: ActuatorConfig) -> Self {
        Self { config, stream: None }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), ActuatorError> {
        let stream = self.stream.as_mut().ok_or(ActuatorError::NotConnected)?;
        stream.write_all(line.as_bytes()).await.map_err(|e| ActuatorError::ConnectionLost(e.to_string()))?;
        stream.write_all(b"\n").await.map_err(|e| ActuatorError::ConnectionLost(e.to_string()))?;
        stream.flush().await.map_err(|e| ActuatorError::ConnectionLost(e.to_string()))?;
        tokio::time::sleep(self.config.command_delay).await;
        Ok(())
    }
}

impl Actuator for ConsoleActuator {
    async fn connect(&mut self) -> Result<(), ActuatorError> {
        let addr = self.config.console_addr.clone();
        let stream = TcpStream::connect(&addr).await.map_err(|e| ActuatorError::ConnectionError(e.to_string()))?;
        self.stream = Some(BufWriter::new(stream));
        info!("🎮️ Connected to the game console at {addr}");
        self.return_to_staging().await
    }

    async fn issue(&mut self, command: &ConsoleCommand) -> Result<(), ActuatorError> {
        debug!("🎮️ {command}");
        self.write_line(command.as_str()).await
    }

    async fn return_to_staging(&mut self) -> Result<(), ActuatorError> {
        let Some(staging) = self.config.staging else {
            trace!("🎮️ No staging spot configured; drone stays put");
            return Ok(());
        };
        let command = ConsoleCommand::new(format!("teleport {staging}"));
        debug!("🎮️ Returning to staging at {staging}");
        self.write_line(command.as_str()).await
    }

    async fn close(&mut self) -> Result<(), ActuatorError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await.map_err(|e| ActuatorError::ConnectionLost(e.to_string()))?;
            info!("🎮️ Console session closed");
        }
        Ok(())
    }
}
