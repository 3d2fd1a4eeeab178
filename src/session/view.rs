//! Caller-facing snapshots of what can be done next.

use serde::{Deserialize, Serialize};

use crate::game::victory::{self, GameOutcome};
use crate::game::{Card, GameState, Move, MoveGenerator, MoveKind, PendingEffect, Phase};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MoveOption {
    /// 1-based, stable for this state; `play <index>` executes it.
    pub index: usize,
    pub description: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingSummary {
    pub card: Card,
    pub player: usize,
    pub step: u8,
    pub expects: MoveKind,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_gain_cost: Option<u8>,
}

impl From<&PendingEffect> for PendingSummary {
    fn from(pending: &PendingEffect) -> Self {
        Self {
            card: pending.card,
            player: pending.player,
            step: pending.step,
            expects: pending.expects(),
            prompt: pending.prompt(),
            max_gain_cost: pending.max_gain_cost(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OptionsView {
    pub turn_number: u32,
    pub phase: Phase,
    pub current_player: usize,
    /// Player the game is waiting on.
    pub actor: usize,
    pub options: Vec<MoveOption>,
    /// Legal moves in total; `options` may show fewer.
    pub total: usize,
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

impl OptionsView {
    pub fn build(state: &GameState, limit: usize) -> Self {
        let (moves, total) = MoveGenerator::first_moves(state, limit);
        let options = moves
            .iter()
            .enumerate()
            .map(|(idx, mv)| MoveOption::new(idx + 1, mv))
            .collect();

        Self {
            turn_number: state.turn_number,
            phase: state.phase,
            current_player: state.current_player,
            actor: state.actor(),
            options,
            total,
            truncated: total > limit,
            pending: state.pending_effect.as_ref().map(PendingSummary::from),
            outcome: victory::outcome(state),
        }
    }
}

impl MoveOption {
    pub fn new(index: usize, mv: &Move) -> Self {
        Self {
            index,
            description: mv.describe(),
            command: mv.to_string(),
        }
    }
}
