use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::victory::{self, GameOutcome};
use crate::game::{
    valid_moves, Card, GameState, Move, Phase, PlayerState, RuleEngine, RuleError, RuleResolution,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiStrategy {
    Random,
    BigMoney,
    Greedy,
}

impl FromStr for AiStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "random" => Ok(AiStrategy::Random),
            "big_money" | "bigmoney" | "money" => Ok(AiStrategy::BigMoney),
            "greedy" | "lookahead" => Ok(AiStrategy::Greedy),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    Normal,
    Hard,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "normal" | "medium" => Ok(AiDifficulty::Normal),
            "hard" => Ok(AiDifficulty::Hard),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Chance of ignoring the strategy and picking a uniformly random move.
    pub randomness: f64,
    pub strategy: AiStrategy,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        match difficulty {
            AiDifficulty::Easy => Self {
                randomness: 0.4,
                strategy: AiStrategy::BigMoney,
            },
            AiDifficulty::Normal => Self {
                randomness: 0.1,
                strategy: AiStrategy::BigMoney,
            },
            AiDifficulty::Hard => Self {
                randomness: 0.0,
                strategy: AiStrategy::Greedy,
            },
        }
    }

    pub fn with_strategy(mut self, strategy: AiStrategy) -> Self {
        self.strategy = strategy;
        if matches!(self.strategy, AiStrategy::Random) {
            self.randomness = 1.0;
        }
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Normal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Move>,
    pub evaluation: f64,
    /// Number of legal moves weighed.
    pub considered: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<RuleResolution>,
    pub strategy: AiStrategy,
}

pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Picks a move for whoever the game is waiting on.
    pub fn decide_action(&mut self, state: &GameState) -> AiDecision {
        let player = state.actor();
        let moves = valid_moves(state);
        let strategy = self.config.strategy;
        let considered = moves.len();

        if moves.is_empty() {
            return AiDecision {
                action: None,
                evaluation: evaluate(state, player),
                considered,
                resolution: None,
                strategy,
            };
        }

        let wander = self.config.randomness > 0.0 && self.rng.gen::<f64>() < self.config.randomness;
        let chosen = if strategy == AiStrategy::Random || wander {
            moves.choose(&mut self.rng).cloned()
        } else {
            let scored: Vec<(f64, &Move)> = moves
                .iter()
                .map(|mv| {
                    let score = match strategy {
                        AiStrategy::Greedy => greedy_score(state, player, mv),
                        _ => big_money_score(state, player, mv),
                    };
                    (score, mv)
                })
                .collect();
            best_of(&scored).cloned()
        };

        let resolution = chosen
            .as_ref()
            .and_then(|mv| simulate(state, mv).ok());
        let evaluation = resolution
            .as_ref()
            .map(|res| evaluate(&res.state, player))
            .unwrap_or_else(|| evaluate(state, player));

        AiDecision {
            action: chosen,
            evaluation,
            considered,
            resolution,
            strategy,
        }
    }
}

/// First move with the highest score, so ties fall to generator order.
fn best_of<'a>(scored: &[(f64, &'a Move)]) -> Option<&'a Move> {
    let mut best: Option<(f64, &'a Move)> = None;
    for (score, mv) in scored {
        match best {
            Some((top, _)) if *score <= top => {}
            _ => best = Some((*score, *mv)),
        }
    }
    best.map(|(_, mv)| mv)
}

fn simulate(state: &GameState, mv: &Move) -> Result<RuleResolution, RuleError> {
    RuleEngine::new().execute_move(state, mv)
}

fn provinces_left(state: &GameState) -> u8 {
    state.supply_count(Card::Province).unwrap_or(0)
}

fn money_density(player: &PlayerState) -> f64 {
    let total = player.card_count().max(1) as f64;
    let money: u32 = player
        .all_cards()
        .map(|card| u32::from(card.def().coins + card.def().bonus.coins))
        .sum();
    f64::from(money) / total
}

/// Deck strength for `player`, independent of the current turn.
pub fn evaluate(state: &GameState, player: usize) -> f64 {
    if let Some(GameOutcome { winners, .. }) = victory::outcome(state) {
        return if winners.contains(&player) {
            1_000_000.0
        } else {
            -1_000_000.0
        };
    }
    let Some(owner) = state.players.get(player) else {
        return -1_000_000.0;
    };
    // Points matter more as the Province pile shrinks.
    let urgency = 1.0 + 3.0 * (1.0 - f64::from(provinces_left(state)) / 12.0).max(0.0);
    let points = f64::from(victory::player_score(owner));
    let engine = owner
        .all_cards()
        .filter(|card| card.is_action())
        .map(|card| {
            let bonus = card.def().bonus;
            0.15 * f64::from(bonus.cards) + 0.1 * f64::from(bonus.actions) + 0.05
        })
        .sum::<f64>()
        / owner.card_count().max(1) as f64;

    points * urgency + money_density(owner) * 12.0 + engine * 6.0
}

/// Money available this turn: coins already made plus treasures still in hand.
fn turn_money(player: &PlayerState) -> f64 {
    let in_hand: u32 = player
        .hand
        .iter()
        .map(|card| u32::from(card.def().coins))
        .sum();
    f64::from(player.coins + in_hand)
}

fn greedy_score(state: &GameState, player: usize, mv: &Move) -> f64 {
    if state.pending_effect.is_none() && state.phase == Phase::Buy {
        if matches!(mv, Move::PlayTreasure { .. }) {
            return f64::INFINITY;
        }
        return simulate(state, mv)
            .map(|res| evaluate(&res.state, player))
            .unwrap_or(f64::NEG_INFINITY);
    }
    simulate(state, mv)
        .map(|res| {
            let owner = &res.state.players[player];
            let mut score = evaluate(&res.state, player);
            if res.state.current_player == player {
                score += turn_money(owner) * 0.25 + f64::from(owner.actions) * 0.1;
            }
            score
        })
        .unwrap_or(f64::NEG_INFINITY)
}

/// What a card is worth keeping in a deck; negative for junk.
fn keep_value(card: Card) -> f64 {
    match card {
        Card::Curse => -3.0,
        Card::Estate => -1.0,
        Card::Copper => 0.5,
        other if other.is_victory() => 0.0,
        other => f64::from(other.cost()),
    }
}

fn big_money_buy(state: &GameState, coins: u32) -> Option<Card> {
    let left = provinces_left(state);
    let wanted = [
        (Card::Province, 8, u8::MAX),
        (Card::Duchy, 5, 4),
        (Card::Estate, 2, 2),
        (Card::Gold, 6, u8::MAX),
        (Card::Silver, 3, u8::MAX),
    ];
    wanted
        .into_iter()
        .find(|(card, cost, max_left)| {
            coins >= *cost && left <= *max_left && state.supply_count(*card).unwrap_or(0) > 0
        })
        .map(|(card, _, _)| card)
}

fn big_money_score(state: &GameState, player: usize, mv: &Move) -> f64 {
    let owner = &state.players[player];
    match mv {
        Move::PlayTreasure { .. } => 100.0,
        Move::PlayAction { card } => {
            let bonus = card.def().bonus;
            // Villages first so terminals still get played.
            10.0 + f64::from(bonus.actions) * 5.0 + f64::from(bonus.cards)
        }
        Move::Buy { card } => {
            if big_money_buy(state, owner.coins) == Some(*card) {
                50.0
            } else {
                -1.0
            }
        }
        Move::EndPhase => 0.0,
        Move::SelectTreasureToTrash { card } | Move::SelectCardToTrash { card } => {
            f64::from(card.cost()) - keep_value(*card)
        }
        Move::GainCard { card, .. } => match card {
            Card::Curse => -10.0,
            other => f64::from(other.cost()) + if other.is_treasure() { 0.5 } else { 0.0 },
        },
        Move::TrashCards { cards } => cards.iter().map(|card| -keep_value(*card)).sum(),
        Move::DiscardForCellar { cards } => cards
            .iter()
            .map(|card| {
                if card.is_victory() || *card == Card::Curse {
                    1.0
                } else {
                    -1.0
                }
            })
            .sum(),
        Move::DiscardCards { cards } => -cards.iter().map(|card| keep_value(*card)).sum::<f64>(),
        Move::SelectActionToReplay { card } => {
            let bonus = card.def().bonus;
            f64::from(bonus.cards + bonus.coins + bonus.actions)
        }
        Move::LibraryDecision { set_aside, .. } => {
            let skip = owner.actions == 0;
            if *set_aside == skip {
                1.0
            } else {
                0.0
            }
        }
        Move::ChancellorDecision { discard_deck } => {
            if *discard_deck {
                1.0
            } else {
                0.0
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayOut {
    pub state: GameState,
    pub moves: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

/// Lets `agents` play against each other, one agent per seat, until the game
/// ends or `max_moves` have been made.
pub fn play_out(
    mut state: GameState,
    agents: &mut [AiAgent],
    max_moves: usize,
) -> Result<PlayOut, RuleError> {
    let mut engine = RuleEngine::new();
    let mut moves = 0;
    while moves < max_moves && !victory::is_game_over(&state) && !agents.is_empty() {
        let seat = state.actor() % agents.len();
        let decision = agents[seat].decide_action(&state);
        let Some(action) = decision.action else {
            break;
        };
        state = engine.execute_move(&state, &action)?.state;
        moves += 1;
    }
    let outcome = victory::outcome(&state);
    log::debug!("play-out stopped after {moves} moves, finished: {}", outcome.is_some());
    Ok(PlayOut {
        state,
        moves,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;

    fn seats(strategy: AiStrategy, count: usize) -> Vec<AiAgent> {
        (0..count)
            .map(|seat| {
                AiAgent::with_seed(
                    AiConfig::from_difficulty(AiDifficulty::Hard).with_strategy(strategy),
                    seat as u64 + 1,
                )
            })
            .collect()
    }

    #[test]
    fn ai_handles_finished_game() {
        let mut state = GameState::sample();
        if let Some(pile) = state.supply_pile_mut(Card::Province) {
            pile.count = 0;
        }
        state.players[0].hand = vec![Card::Duchy];
        let mut agent = AiAgent::new(AiConfig::from_difficulty(AiDifficulty::Easy));
        let decision = agent.decide_action(&state);
        assert!(decision.action.is_none());
        assert!(decision.evaluation > 0.0);
    }

    #[test]
    fn big_money_buys_gold_at_six() {
        let mut state = GameState::sample();
        state.phase = Phase::Buy;
        state.players[0].coins = 6;
        let mut agent = AiAgent::with_seed(AiConfig::default().with_strategy(AiStrategy::BigMoney), 1);
        agent.config.randomness = 0.0;
        let decision = agent.decide_action(&state);
        assert_eq!(decision.action, Some(Move::Buy { card: Card::Gold }));
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!("big_money".parse(), Ok(AiStrategy::BigMoney));
        assert_eq!("Greedy".parse(), Ok(AiStrategy::Greedy));
        assert_eq!("medium".parse(), Ok(AiDifficulty::Normal));
        assert!("minimax".parse::<AiStrategy>().is_err());
    }

    #[test]
    fn decisions_are_always_legal() {
        let state = GameState::new(&GameConfig::default().with_seed(21)).expect("new game");
        let mut agents = seats(AiStrategy::Random, 2);
        let result = play_out(state, &mut agents, 300).expect("legal moves only");
        assert!(result.moves > 0);
    }

    #[test]
    fn seeded_play_out_is_reproducible() {
        let state = GameState::new(&GameConfig::default().with_seed(4)).expect("new game");
        let a = play_out(state.clone(), &mut seats(AiStrategy::BigMoney, 2), 400).expect("run a");
        let b = play_out(state, &mut seats(AiStrategy::BigMoney, 2), 400).expect("run b");
        assert_eq!(a.state, b.state);
        assert_eq!(a.moves, b.moves);
    }

    #[test]
    fn big_money_finishes_a_game() {
        let state = GameState::new(&GameConfig::default().with_seed(8)).expect("new game");
        let result = play_out(state, &mut seats(AiStrategy::BigMoney, 2), 5_000).expect("play out");
        let outcome = result.outcome.expect("game should end");
        assert!(!outcome.winners.is_empty());
    }
}
