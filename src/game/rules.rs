use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::Card;
use super::effects::EffectEngine;
use super::generator::MoveGenerator;
use super::moves::{GainDestination, Move, MoveKind};
use super::pending::PendingKind;
use super::state::{GameEvent, GameState, IntegrityError, Phase};
use super::victory::{self, GameOutcome};

/// Why a well-formed move was turned down.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidMoveReason {
    #[error("{card} costs ${required}, you have ${available}")]
    InsufficientCoins {
        card: Card,
        required: u32,
        available: u32,
    },
    #[error("no buys left")]
    InsufficientBuys,
    #[error("no actions left")]
    InsufficientActions,
    #[error("{card} is not in hand")]
    CardNotInHand { card: Card },
    #[error("{card} is not in the supply")]
    CardNotInSupply { card: Card },
    #[error("the {card} pile is empty")]
    PileEmpty { card: Card },
    #[error("a pending effect expects {expected}, got {actual}")]
    PendingEffectMismatch { expected: MoveKind, actual: MoveKind },
    #[error("not allowed in the {phase} phase")]
    WrongPhase { phase: Phase },
    #[error("there is no pending effect to answer")]
    NoPendingEffect,
    #[error("{card} is gained to {expected} here")]
    WrongDestination {
        card: Card,
        expected: GainDestination,
    },
    #[error("not one of the allowed choices")]
    NotAllowed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("the game is already over")]
    GameAlreadyOver,
    #[error("invalid move `{attempted}`: {reason}")]
    InvalidMove {
        attempted: String,
        reason: InvalidMoveReason,
        phase: Phase,
        coins: u32,
        buys: u32,
        actions: u32,
        /// Command strings of every move that is legal right now.
        legal: Vec<String>,
    },
    #[error("state failed integrity check: {error:?}")]
    IntegrityViolation { error: IntegrityError },
}

impl RuleError {
    /// One line a caller can act on without asking again.
    pub fn suggestion(&self) -> String {
        match self {
            RuleError::GameAlreadyOver => "start a new game".to_string(),
            RuleError::InvalidMove {
                phase,
                coins,
                buys,
                actions,
                legal,
                ..
            } => {
                let mut hint = format!(
                    "{phase} phase, ${coins}, {buys} buy(s), {actions} action(s); legal: "
                );
                if legal.is_empty() {
                    hint.push_str("none");
                } else {
                    hint.push_str(&legal.join(" | "));
                }
                hint
            }
            RuleError::IntegrityViolation { .. } => {
                "the game state is corrupt and cannot continue".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

impl RuleResolution {
    pub fn new(state: GameState, mut events: Vec<GameEvent>) -> Self {
        let outcome = victory::outcome(&state);
        if let Some(ref result) = outcome {
            let has_event = events
                .iter()
                .any(|event| matches!(event, GameEvent::GameOver { .. }));
            if !has_event {
                events.push(GameEvent::GameOver {
                    outcome: result.clone(),
                });
            }
        }

        Self {
            state,
            events,
            outcome,
        }
    }
}

#[derive(Default)]
pub struct RuleEngine {
    effect_engine: EffectEngine,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            effect_engine: EffectEngine::default(),
        }
    }

    fn ensure_not_over(state: &GameState) -> Result<(), RuleError> {
        if victory::is_game_over(state) {
            return Err(RuleError::GameAlreadyOver);
        }
        Ok(())
    }

    fn ensure_integrity(state: &GameState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn ensure_legal(state: &GameState, mv: &Move) -> Result<(), RuleError> {
        if MoveGenerator::is_legal(state, mv) {
            return Ok(());
        }
        let resources = &state.players[state.actor()];
        let rejection = RuleError::InvalidMove {
            attempted: mv.to_string(),
            reason: Self::diagnose(state, mv),
            phase: state.phase,
            coins: resources.coins,
            buys: resources.buys,
            actions: resources.actions,
            legal: MoveGenerator::valid_moves(state)
                .iter()
                .map(Move::to_string)
                .collect(),
        };
        log::debug!("rejected: {rejection}");
        Err(rejection)
    }

    /// Picks the most specific reason `mv` is not legal. Only called once the
    /// generator has already said no.
    fn diagnose(state: &GameState, mv: &Move) -> InvalidMoveReason {
        if let Some(pending) = &state.pending_effect {
            let expected = pending.expects();
            if mv.kind() != expected {
                return InvalidMoveReason::PendingEffectMismatch {
                    expected,
                    actual: mv.kind(),
                };
            }
            let chooser = &state.players[pending.player];
            return match mv {
                Move::GainCard { card, destination } => match state.supply_count(*card) {
                    None => InvalidMoveReason::CardNotInSupply { card: *card },
                    Some(0) => InvalidMoveReason::PileEmpty { card: *card },
                    Some(_) => match &pending.effect {
                        PendingKind::GainCard {
                            destination: expected,
                            ..
                        } if expected != destination => InvalidMoveReason::WrongDestination {
                            card: *card,
                            expected: *expected,
                        },
                        _ => InvalidMoveReason::NotAllowed,
                    },
                },
                Move::SelectTreasureToTrash { card }
                | Move::SelectCardToTrash { card }
                | Move::SelectActionToReplay { card }
                    if !chooser.has_in_hand(*card) =>
                {
                    InvalidMoveReason::CardNotInHand { card: *card }
                }
                Move::TrashCards { cards }
                | Move::DiscardForCellar { cards }
                | Move::DiscardCards { cards } => cards
                    .iter()
                    .find(|card| {
                        cards.iter().filter(|c| c == card).count() > chooser.count_in_hand(**card)
                    })
                    .map(|card| InvalidMoveReason::CardNotInHand { card: *card })
                    .unwrap_or(InvalidMoveReason::NotAllowed),
                _ => InvalidMoveReason::NotAllowed,
            };
        }

        let player = state.current();
        match mv {
            Move::PlayAction { card } => {
                if state.phase != Phase::Action {
                    InvalidMoveReason::WrongPhase { phase: state.phase }
                } else if !card.is_action() {
                    InvalidMoveReason::NotAllowed
                } else if !player.has_in_hand(*card) {
                    InvalidMoveReason::CardNotInHand { card: *card }
                } else if player.actions == 0 {
                    InvalidMoveReason::InsufficientActions
                } else {
                    InvalidMoveReason::NotAllowed
                }
            }
            Move::PlayTreasure { card } => {
                if state.phase != Phase::Buy {
                    InvalidMoveReason::WrongPhase { phase: state.phase }
                } else if !card.is_treasure() {
                    InvalidMoveReason::NotAllowed
                } else if !player.has_in_hand(*card) {
                    InvalidMoveReason::CardNotInHand { card: *card }
                } else {
                    InvalidMoveReason::NotAllowed
                }
            }
            Move::Buy { card } => {
                if state.phase != Phase::Buy {
                    return InvalidMoveReason::WrongPhase { phase: state.phase };
                }
                match state.supply_count(*card) {
                    None => InvalidMoveReason::CardNotInSupply { card: *card },
                    Some(0) => InvalidMoveReason::PileEmpty { card: *card },
                    Some(_) if player.buys == 0 => InvalidMoveReason::InsufficientBuys,
                    Some(_) if u32::from(card.cost()) > player.coins => {
                        InvalidMoveReason::InsufficientCoins {
                            card: *card,
                            required: u32::from(card.cost()),
                            available: player.coins,
                        }
                    }
                    Some(_) => InvalidMoveReason::NotAllowed,
                }
            }
            Move::EndPhase => InvalidMoveReason::NotAllowed,
            _ => InvalidMoveReason::NoPendingEffect,
        }
    }

    /// Validates `mv` against `state` and applies it to a copy. `state` itself
    /// is never touched, so a caller can always fall back to it.
    pub fn execute_move(
        &mut self,
        state: &GameState,
        mv: &Move,
    ) -> Result<RuleResolution, RuleError> {
        Self::ensure_not_over(state)?;
        Self::ensure_integrity(state)?;
        let mv = mv.clone().canonical();
        Self::ensure_legal(state, &mv)?;

        let mut next = state.clone();
        log::debug!(
            "turn {} player {} ({}): {}",
            state.turn_number,
            state.actor(),
            state.phase,
            mv
        );
        let events = match next.pending_effect.take() {
            Some(pending) => self.effect_engine.resume(&mut next, pending, &mv),
            None => self.apply_phase_move(&mut next, &mv),
        };

        let resolution = RuleResolution::new(next, events);
        if let Some(outcome) = &resolution.outcome {
            log::debug!("game over: scores {:?}, winners {:?}", outcome.scores, outcome.winners);
        }
        Ok(resolution)
    }

    fn apply_phase_move(&mut self, state: &mut GameState, mv: &Move) -> Vec<GameEvent> {
        let player = state.current_player;
        match mv {
            Move::PlayAction { card } => {
                let owner = state.current_mut();
                if !owner.take_from_hand(*card) {
                    return Vec::new();
                }
                owner.actions -= 1;
                owner.in_play.push(*card);
                self.effect_engine.queue_play(*card);
                self.effect_engine.resolve_all(state)
            }
            Move::PlayTreasure { card } => {
                let owner = state.current_mut();
                if !owner.take_from_hand(*card) {
                    return Vec::new();
                }
                owner.in_play.push(*card);
                owner.coins += u32::from(card.def().coins);
                vec![GameEvent::CardPlayed {
                    player,
                    card: *card,
                }]
            }
            Move::Buy { card } => {
                let cost = u32::from(card.cost());
                if !state.gain(player, *card, GainDestination::Discard) {
                    return Vec::new();
                }
                let owner = state.current_mut();
                owner.coins -= cost;
                owner.buys -= 1;
                vec![GameEvent::CardBought {
                    player,
                    card: *card,
                }]
            }
            Move::EndPhase => Self::end_phase(state),
            other => {
                log::warn!("{other} reached the phase controller without a pending effect");
                Vec::new()
            }
        }
    }

    fn end_phase(state: &mut GameState) -> Vec<GameEvent> {
        match state.phase {
            Phase::Action => {
                state.phase = Phase::Buy;
                vec![GameEvent::PhaseChanged { phase: Phase::Buy }]
            }
            Phase::Buy => {
                state.phase = Phase::Cleanup;
                vec![GameEvent::PhaseChanged {
                    phase: Phase::Cleanup,
                }]
            }
            Phase::Cleanup => {
                let player = state.current_player;
                let mut events = Vec::new();
                let owner = state.current();
                let discarded: Vec<Card> = owner
                    .hand
                    .iter()
                    .chain(owner.in_play.iter())
                    .copied()
                    .collect();
                if !discarded.is_empty() {
                    events.push(GameEvent::CardsDiscarded {
                        player,
                        cards: discarded,
                    });
                }
                events.extend(state.cleanup(player).events(player));

                let next = (player + 1) % state.players.len();
                state.current_player = next;
                state.turn_number += 1;
                state.phase = Phase::Action;
                events.push(GameEvent::TurnEnded { player, next });
                events.push(GameEvent::PhaseChanged {
                    phase: Phase::Action,
                });
                log::debug!("turn {} begins for player {}", state.turn_number, next);
                events
            }
        }
    }
}

/// One-shot [`RuleEngine::execute_move`].
pub fn execute_move(state: &GameState, mv: &Move) -> Result<RuleResolution, RuleError> {
    RuleEngine::new().execute_move(state, mv)
}
