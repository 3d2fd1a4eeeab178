//! Suspended card effects.
//!
//! A pending effect is the work a played card still owes once it needs a
//! decision. It lives inside [`GameState`](super::state::GameState) and is the
//! only thing the move generator consults while it is present.

use serde::{Deserialize, Serialize};

use super::catalog::{Card, CardFilter};
use super::moves::{GainDestination, MoveKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum PendingKind {
    /// Pick a card to trash; the gain ceiling is derived from it.
    #[serde(rename_all = "camelCase")]
    TrashForGain {
        filter: CardFilter,
        bonus_cost: u8,
        destination: GainDestination,
    },
    #[serde(rename_all = "camelCase")]
    GainCard {
        max_gain_cost: u8,
        filter: CardFilter,
        destination: GainDestination,
    },
    TrashUpTo {
        max: u8,
    },
    TrashCopper {
        coins: u8,
    },
    CellarDiscard,
    ReplayAction,
    /// One revealed action card awaiting keep/set-aside.
    #[serde(rename_all = "camelCase")]
    LibraryReveal {
        revealed: Card,
        #[serde(default)]
        set_aside: Vec<Card>,
        hand_size: u8,
    },
    ChancellorChoice,
    /// The chooser discards down to `hand_size`; `victims` still owe the same afterwards.
    #[serde(rename_all = "camelCase")]
    DiscardDownTo {
        hand_size: u8,
        #[serde(default)]
        victims: Vec<usize>,
    },
}

impl PendingKind {
    /// The only move type accepted while this effect is pending.
    pub fn expects(&self) -> MoveKind {
        match self {
            PendingKind::TrashForGain {
                filter: CardFilter::Treasure,
                ..
            } => MoveKind::SelectTreasureToTrash,
            PendingKind::TrashForGain { .. } => MoveKind::SelectCardToTrash,
            PendingKind::GainCard { .. } => MoveKind::GainCard,
            PendingKind::TrashUpTo { .. } | PendingKind::TrashCopper { .. } => {
                MoveKind::TrashCards
            }
            PendingKind::CellarDiscard => MoveKind::DiscardForCellar,
            PendingKind::ReplayAction => MoveKind::SelectActionToReplay,
            PendingKind::LibraryReveal { .. } => MoveKind::LibraryDecision,
            PendingKind::ChancellorChoice => MoveKind::ChancellorDecision,
            PendingKind::DiscardDownTo { .. } => MoveKind::DiscardCards,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PendingEffect {
    pub card: Card,
    /// Index of the player who must decide.
    pub player: usize,
    pub step: u8,
    #[serde(flatten)]
    pub effect: PendingKind,
    /// Action cards still owed a play (Throne Room) once this resolves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replays: Vec<Card>,
}

impl PendingEffect {
    pub fn new(card: Card, player: usize, effect: PendingKind) -> Self {
        Self {
            card,
            player,
            step: 1,
            effect,
            replays: Vec::new(),
        }
    }

    pub fn with_replays(mut self, replays: Vec<Card>) -> Self {
        self.replays = replays;
        self
    }

    /// Moves to the next step of the same card's resolution.
    pub fn advance(mut self, effect: PendingKind) -> Self {
        self.step = self.step.saturating_add(1);
        self.effect = effect;
        self
    }

    pub fn expects(&self) -> MoveKind {
        self.effect.expects()
    }

    pub fn max_gain_cost(&self) -> Option<u8> {
        match self.effect {
            PendingKind::GainCard { max_gain_cost, .. } => Some(max_gain_cost),
            _ => None,
        }
    }

    pub fn prompt(&self) -> String {
        match &self.effect {
            PendingKind::TrashForGain {
                filter: CardFilter::Treasure,
                bonus_cost,
                ..
            } => format!(
                "{}: choose a treasure to trash (gain one costing up to ${bonus_cost} more)",
                self.card
            ),
            PendingKind::TrashForGain { bonus_cost, .. } => format!(
                "{}: choose a card to trash (gain one costing up to ${bonus_cost} more)",
                self.card
            ),
            PendingKind::GainCard {
                max_gain_cost,
                filter,
                destination,
            } => {
                let what = match filter {
                    CardFilter::Treasure => "a treasure",
                    CardFilter::Action => "an action",
                    CardFilter::Any => "a card",
                };
                format!(
                    "{}: gain {what} costing up to ${max_gain_cost} to your {destination}",
                    self.card
                )
            }
            PendingKind::TrashUpTo { max } => {
                format!("{}: trash up to {max} cards from your hand", self.card)
            }
            PendingKind::TrashCopper { coins } => {
                format!("{}: you may trash a Copper for +${coins}", self.card)
            }
            PendingKind::CellarDiscard => format!(
                "{}: discard any number of cards, then draw that many",
                self.card
            ),
            PendingKind::ReplayAction => {
                format!("{}: choose an action card to play twice", self.card)
            }
            PendingKind::LibraryReveal { revealed, .. } => {
                format!("{}: you drew {revealed}; keep it or set it aside", self.card)
            }
            PendingKind::ChancellorChoice => format!(
                "{}: you may put your draw pile into your discard pile",
                self.card
            ),
            PendingKind::DiscardDownTo { hand_size, .. } => format!(
                "{}: player {} discards down to {hand_size} cards",
                self.card,
                self.player + 1
            ),
        }
    }
}
