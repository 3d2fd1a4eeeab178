use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::Card;
use super::config::{ConfigError, GameConfig, DEFAULT_HAND_SIZE};
use super::moves::GainDestination;
use super::pending::PendingEffect;
use super::shuffle::Shuffler;
use super::victory::GameOutcome;

const STARTING_COPPERS: usize = 7;
const STARTING_ESTATES: usize = 3;
const KINGDOM_PILE: u8 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Action,
    Buy,
    Cleanup,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Action
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Action => f.write_str("action"),
            Phase::Buy => f.write_str("buy"),
            Phase::Cleanup => f.write_str("cleanup"),
        }
    }
}

/// One player's zones and per-turn resources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hand: Vec<Card>,
    /// Top of the pile is the end of the vector.
    #[serde(default)]
    pub draw_pile: Vec<Card>,
    #[serde(default)]
    pub discard_pile: Vec<Card>,
    #[serde(default)]
    pub in_play: Vec<Card>,
    pub actions: u32,
    pub buys: u32,
    pub coins: u32,
}

impl PlayerState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hand: Vec::new(),
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            in_play: Vec::new(),
            actions: 1,
            buys: 1,
            coins: 0,
        }
    }

    pub fn with_hand(mut self, hand: Vec<Card>) -> Self {
        self.hand = hand;
        self
    }

    pub fn with_draw_pile(mut self, draw_pile: Vec<Card>) -> Self {
        self.draw_pile = draw_pile;
        self
    }

    pub fn count_in_hand(&self, card: Card) -> usize {
        self.hand.iter().filter(|c| **c == card).count()
    }

    pub fn has_in_hand(&self, card: Card) -> bool {
        self.hand.contains(&card)
    }

    /// Removes the first copy of `card` from hand.
    pub fn take_from_hand(&mut self, card: Card) -> bool {
        match self.hand.iter().position(|c| *c == card) {
            Some(idx) => {
                self.hand.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Removes the most recently played copy of `card` from play.
    pub fn take_from_play(&mut self, card: Card) -> bool {
        match self.in_play.iter().rposition(|c| *c == card) {
            Some(idx) => {
                self.in_play.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn all_cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.hand
            .iter()
            .chain(self.draw_pile.iter())
            .chain(self.discard_pile.iter())
            .chain(self.in_play.iter())
            .copied()
    }

    pub fn card_count(&self) -> usize {
        self.hand.len() + self.draw_pile.len() + self.discard_pile.len() + self.in_play.len()
    }

    pub fn reset_resources(&mut self) {
        self.actions = 1;
        self.buys = 1;
        self.coins = 0;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplyPile {
    pub card: Card,
    pub count: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    CardPlayed {
        player: usize,
        card: Card,
    },
    CardsDrawn {
        player: usize,
        count: usize,
    },
    Reshuffled {
        player: usize,
    },
    CardBought {
        player: usize,
        card: Card,
    },
    CardGained {
        player: usize,
        card: Card,
        destination: GainDestination,
    },
    CardTrashed {
        player: usize,
        card: Card,
    },
    CardsDiscarded {
        player: usize,
        cards: Vec<Card>,
    },
    CardsRevealed {
        player: usize,
        cards: Vec<Card>,
    },
    AttackBlocked {
        player: usize,
        card: Card,
    },
    PhaseChanged {
        phase: Phase,
    },
    TurnEnded {
        player: usize,
        next: usize,
    },
    GameOver {
        outcome: GameOutcome,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    NoPlayers,
    InvalidPlayerIndex { player: usize },
    InvalidPendingPlayer { player: usize },
    DuplicateSupplyPile { card: Card },
}

/// Immutable snapshot of a game. The engine never mutates a state it was
/// handed; every move yields a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub phase: Phase,
    pub turn_number: u32,
    pub current_player: usize,
    pub players: Vec<PlayerState>,
    /// Piles in display order.
    pub supply: Vec<SupplyPile>,
    #[serde(default)]
    pub trash: Vec<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_effect: Option<PendingEffect>,
    #[serde(default = "default_hand_size")]
    pub hand_size: u8,
    pub shuffler: Shuffler,
}

fn default_hand_size() -> u8 {
    DEFAULT_HAND_SIZE
}

impl GameState {
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let count = config.players.len();
        let victory_pile: u8 = if count == 2 { 8 } else { 12 };

        let mut supply = vec![
            SupplyPile {
                card: Card::Copper,
                count: (60 - STARTING_COPPERS * count) as u8,
            },
            SupplyPile {
                card: Card::Silver,
                count: 40,
            },
            SupplyPile {
                card: Card::Gold,
                count: 30,
            },
            SupplyPile {
                card: Card::Estate,
                count: victory_pile,
            },
            SupplyPile {
                card: Card::Duchy,
                count: victory_pile,
            },
            SupplyPile {
                card: Card::Province,
                count: victory_pile,
            },
            SupplyPile {
                card: Card::Curse,
                count: (10 * (count - 1)) as u8,
            },
        ];
        supply.extend(config.kingdom.iter().map(|card| SupplyPile {
            card: *card,
            count: if card.is_victory() {
                victory_pile
            } else {
                KINGDOM_PILE
            },
        }));

        let mut state = Self {
            phase: Phase::Action,
            turn_number: 1,
            current_player: 0,
            players: config.players.iter().map(PlayerState::new).collect(),
            supply,
            trash: Vec::new(),
            pending_effect: None,
            hand_size: config.hand_size,
            shuffler: Shuffler::new(config.seed),
        };

        for idx in 0..count {
            let mut deck = Vec::with_capacity(STARTING_COPPERS + STARTING_ESTATES);
            deck.extend(std::iter::repeat(Card::Copper).take(STARTING_COPPERS));
            deck.extend(std::iter::repeat(Card::Estate).take(STARTING_ESTATES));
            state.shuffler.shuffle(&mut deck);
            state.players[idx].draw_pile = deck;
            state.draw(idx, state.hand_size as usize);
        }

        log::debug!(
            "new game: {} players, seed {}, kingdom {:?}",
            count,
            config.seed,
            config.kingdom
        );
        Ok(state)
    }

    pub fn current(&self) -> &PlayerState {
        &self.players[self.current_player]
    }

    pub fn current_mut(&mut self) -> &mut PlayerState {
        &mut self.players[self.current_player]
    }

    /// The player whose decision the game is waiting on.
    pub fn actor(&self) -> usize {
        self.pending_effect
            .as_ref()
            .map(|pending| pending.player)
            .unwrap_or(self.current_player)
    }

    pub fn supply_count(&self, card: Card) -> Option<u8> {
        self.supply
            .iter()
            .find(|pile| pile.card == card)
            .map(|pile| pile.count)
    }

    pub fn supply_pile_mut(&mut self, card: Card) -> Option<&mut SupplyPile> {
        self.supply.iter_mut().find(|pile| pile.card == card)
    }

    pub fn empty_piles(&self) -> usize {
        self.supply.iter().filter(|pile| pile.count == 0).count()
    }

    /// Other players in turn order, starting after `player`.
    pub fn others(&self, player: usize) -> Vec<usize> {
        let n = self.players.len();
        (1..n).map(|offset| (player + offset) % n).collect()
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        if self.players.is_empty() {
            return Err(IntegrityError::NoPlayers);
        }
        if self.current_player >= self.players.len() {
            return Err(IntegrityError::InvalidPlayerIndex {
                player: self.current_player,
            });
        }
        if let Some(pending) = &self.pending_effect {
            if pending.player >= self.players.len() {
                return Err(IntegrityError::InvalidPendingPlayer {
                    player: pending.player,
                });
            }
        }
        for (i, pile) in self.supply.iter().enumerate() {
            if self.supply[..i].iter().any(|other| other.card == pile.card) {
                return Err(IntegrityError::DuplicateSupplyPile { card: pile.card });
            }
        }
        Ok(())
    }

    /// Cards held by the pending effect outside any zone (Library's set-aside).
    pub fn cards_held_by_pending(&self) -> Vec<Card> {
        use super::pending::PendingKind;
        match self.pending_effect.as_ref().map(|pending| &pending.effect) {
            Some(PendingKind::LibraryReveal {
                revealed,
                set_aside,
                ..
            }) => std::iter::once(*revealed)
                .chain(set_aside.iter().copied())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// A two-player state with empty zones and the first-game kingdom, for tests
    /// and adapters that lay out a position by hand.
    pub fn sample() -> Self {
        let config = GameConfig::default();
        let mut state = Self {
            phase: Phase::Action,
            turn_number: 1,
            current_player: 0,
            players: config.players.iter().map(PlayerState::new).collect(),
            supply: Vec::new(),
            trash: Vec::new(),
            pending_effect: None,
            hand_size: config.hand_size,
            shuffler: Shuffler::new(config.seed),
        };
        let victory_pile = 8;
        state.supply = Card::BASIC
            .iter()
            .chain(config.kingdom.iter())
            .map(|card| SupplyPile {
                card: *card,
                count: match card {
                    Card::Copper => 46,
                    Card::Silver => 40,
                    Card::Gold => 30,
                    Card::Curse => 10,
                    c if c.is_victory() => victory_pile,
                    _ => KINGDOM_PILE,
                },
            })
            .collect();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_deals_five_from_ten() {
        let state = GameState::new(&GameConfig::default().with_seed(11)).expect("new game");
        for player in &state.players {
            assert_eq!(player.hand.len(), 5);
            assert_eq!(player.draw_pile.len(), 5);
            assert_eq!(player.card_count(), 10);
            assert_eq!(player.all_cards().filter(|c| *c == Card::Copper).count(), 7);
            assert_eq!((player.actions, player.buys, player.coins), (1, 1, 0));
        }
        assert_eq!(state.phase, Phase::Action);
        assert_eq!(state.turn_number, 1);
        assert_eq!(state.supply_count(Card::Province), Some(8));
        assert_eq!(state.supply_count(Card::Copper), Some(46));
        assert_eq!(state.supply_count(Card::Curse), Some(10));
        assert_eq!(state.supply_count(Card::Village), Some(10));
        assert!(state.pending_effect.is_none());
    }

    #[test]
    fn supply_keeps_insertion_order() {
        let config = GameConfig::default().with_kingdom([Card::Witch, Card::Gardens, Card::Chapel]);
        let state = GameState::new(&config).expect("new game");
        let order: Vec<Card> = state.supply.iter().map(|pile| pile.card).collect();
        assert_eq!(&order[..7], &Card::BASIC);
        assert_eq!(&order[7..], &[Card::Witch, Card::Gardens, Card::Chapel]);
        assert_eq!(state.supply_count(Card::Gardens), Some(8));
    }

    #[test]
    fn larger_games_get_bigger_victory_piles() {
        let config = GameConfig::default().with_players(["a", "b", "c", "d"]);
        let state = GameState::new(&config).expect("new game");
        assert_eq!(state.supply_count(Card::Province), Some(12));
        assert_eq!(state.supply_count(Card::Curse), Some(30));
        assert_eq!(state.supply_count(Card::Copper), Some(32));
    }

    #[test]
    fn same_seed_same_opening_hands() {
        let a = GameState::new(&GameConfig::default().with_seed(5)).expect("game a");
        let b = GameState::new(&GameConfig::default().with_seed(5)).expect("game b");
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let state = GameState::sample();
        let json = serde_json::to_value(&state).expect("serialize state");
        assert!(json.get("turnNumber").is_some());
        assert!(json.get("currentPlayer").is_some());
        assert_eq!(json["phase"], "action");
        let back: GameState = serde_json::from_value(json).expect("deserialize state");
        assert_eq!(back, state);
    }

    #[test]
    fn integrity_check_flags_bad_indices() {
        let mut state = GameState::sample();
        assert!(state.integrity_check().is_ok());
        state.current_player = 9;
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::InvalidPlayerIndex { player: 9 })
        );
    }
}
