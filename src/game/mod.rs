//! Core rules: card table, zones, legal moves, execution and pending effects.

pub mod catalog;
pub mod config;
pub mod effects;
pub mod generator;
pub mod moves;
pub mod pending;
pub mod rules;
pub mod shuffle;
pub mod state;
pub mod victory;
pub mod zones;

pub use catalog::{catalog, Bonus, Card, CardDef, CardFilter, CardType, EffectKind, UnknownCard};
pub use config::{ConfigError, GameConfig};
pub use effects::EffectEngine;
pub use generator::{valid_moves, MoveGenerator};
pub use moves::{GainDestination, Move, MoveKind, ParseError};
pub use pending::{PendingEffect, PendingKind};
pub use rules::{execute_move, InvalidMoveReason, RuleEngine, RuleError, RuleResolution};
pub use shuffle::Shuffler;
pub use state::{GameEvent, GameState, IntegrityError, Phase, PlayerState, SupplyPile};
pub use victory::{is_game_over, GameOutcome};
pub use zones::Drawn;
