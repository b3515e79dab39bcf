//! The delivery command vocabulary.
//!
//! Catalog items carry an ordered list of [`CommandTemplate`]s rather than free-form strings.
//! Templates are validated when the catalog is written, and rendered into literal console
//! commands at delivery time via a named-parameter context. The dispatcher only sequences the
//! rendered commands; the console language itself is defined by the game.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------    Coordinate      ----------------------------------------------------------
/// A world position. Rendered in the console's native `X=.. Y=.. Z=..` form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X={} Y={} Z={}", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Could not parse coordinate: {0}")]
pub struct CoordinateParseError(String);

impl FromStr for Coordinate {
    type Err = CoordinateParseError;

    /// Accepts `X=1 Y=2 Z=3`, `1 2 3` and `1,2,3`. Admins paste coordinates straight out of the
    /// game console, so all three historical forms are tolerated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned = s
            .replace(['X', 'Y', 'Z', 'x', 'y', 'z'], " ")
            .replace('=', " ")
            .replace(',', " ");
        let parts = cleaned.split_whitespace().map(str::parse::<f64>).collect::<Result<Vec<_>, _>>().map_err(|e| {
            CoordinateParseError(format!("{s}: {e}"))
        })?;
        match parts.as_slice() {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            _ => Err(CoordinateParseError(format!("{s}: expected exactly three components"))),
        }
    }
}

//--------------------------------------  ConsoleCommand    ----------------------------------------------------------
/// A fully rendered admin-console command, `#`-prefix included. This is the literal line the
/// actuator types into the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleCommand(String);

impl ConsoleCommand {
    pub fn new<S: AsRef<str>>(command: S) -> Self {
        let command = command.as_ref();
        Self(format!("#{}", command.trim_start_matches('#')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConsoleCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------  CommandContext    ----------------------------------------------------------
/// Named parameters available to templates at render time. This replaces the original scheme of
/// splicing the player name into free-form strings.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// The in-game name of the player the delivery is for.
    pub player: &'a str,
}

//--------------------------------------  CommandTemplate   ----------------------------------------------------------
/// One step of a delivery sequence, validated at catalog-write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandTemplate {
    /// Spawn `quantity` of `item` on the target player.
    SpawnItem { item: String, quantity: u32 },
    /// Move the actor (drone) to a fixed location.
    Teleport { location: Coordinate },
    /// Move the actor to the target player.
    TeleportToPlayer,
    /// Pull the target player to the actor.
    PullPlayerToMe,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandValidationError {
    #[error("A delivery sequence must contain at least one command")]
    EmptySequence,
    #[error("Spawn command has an empty item name")]
    EmptyItemName,
    #[error("Spawn command has a zero quantity")]
    ZeroQuantity,
}

impl CommandTemplate {
    pub fn validate(&self) -> Result<(), CommandValidationError> {
        match self {
            CommandTemplate::SpawnItem { item, quantity } => {
                if item.trim().is_empty() {
                    return Err(CommandValidationError::EmptyItemName);
                }
                if *quantity == 0 {
                    return Err(CommandValidationError::ZeroQuantity);
                }
                Ok(())
            },
            _ => Ok(()),
        }
    }

    /// Validates a whole delivery sequence, as stored on a catalog item.
    pub fn validate_all(templates: &[CommandTemplate]) -> Result<(), CommandValidationError> {
        if templates.is_empty() {
            return Err(CommandValidationError::EmptySequence);
        }
        templates.iter().try_for_each(CommandTemplate::validate)
    }

    pub fn render(&self, ctx: &CommandContext<'_>) -> ConsoleCommand {
        match self {
            CommandTemplate::SpawnItem { item, quantity } => {
                ConsoleCommand::new(format!("spawnitem {item} {} {}", quantity, ctx.player))
            },
            CommandTemplate::Teleport { location } => ConsoleCommand::new(format!("teleport {location}")),
            CommandTemplate::TeleportToPlayer => ConsoleCommand::new(format!("teleportto {}", ctx.player)),
            CommandTemplate::PullPlayerToMe => ConsoleCommand::new(format!("teleporttome {}", ctx.player)),
        }
    }
}
