//! Adapter layer: command strings, a registry of independent games and
//! option listings for callers that drive the engine by text.

pub mod command;
pub mod registry;
pub mod view;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{ConfigError, RuleError};

pub use command::Command;
pub use registry::{apply_command, CommandOutcome, GameId, GameRegistry, GameSession};
pub use view::{MoveOption, OptionsView, PendingSummary};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum SessionError {
    #[error("no active game with id {id}")]
    NoActiveGame { id: GameId },
    #[error("could not understand `{input}`: {message}")]
    ParseFailure { input: String, message: String },
    #[error("{error}")]
    Rule { error: RuleError },
    #[error("{error}")]
    Config { error: ConfigError },
    #[error("step {step} of the chain (`{command}`) failed: {error}")]
    ChainFailed {
        step: usize,
        command: String,
        error: Box<SessionError>,
    },
}

impl SessionError {
    pub fn suggestion(&self) -> String {
        match self {
            SessionError::NoActiveGame { .. } => "create a game first".to_string(),
            SessionError::ParseFailure { .. } => {
                "list the options and use `play <n>` or one of the listed commands".to_string()
            }
            SessionError::Rule { error } => error.suggestion(),
            SessionError::Config { .. } => "fix the game config and try again".to_string(),
            SessionError::ChainFailed { error, .. } => {
                format!("nothing from the chain was applied; {}", error.suggestion())
            }
        }
    }
}

impl From<RuleError> for SessionError {
    fn from(error: RuleError) -> Self {
        SessionError::Rule { error }
    }
}

impl From<ConfigError> for SessionError {
    fn from(error: ConfigError) -> Self {
        SessionError::Config { error }
    }
}
