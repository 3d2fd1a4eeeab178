use serde::{Deserialize, Serialize};

use super::catalog::Card;
use super::state::{GameState, PlayerState};

const EMPTY_PILES_TO_END: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameOutcome {
    pub scores: Vec<i32>,
    /// Every player tied for the top score.
    pub winners: Vec<usize>,
}

/// The game is over once the Province pile is empty or three piles are.
pub fn is_game_over(state: &GameState) -> bool {
    state.supply_count(Card::Province) == Some(0) || state.empty_piles() >= EMPTY_PILES_TO_END
}

pub fn player_score(player: &PlayerState) -> i32 {
    let owned = player.card_count() as i32;
    player
        .all_cards()
        .map(|card| match card {
            Card::Gardens => owned / 10,
            other => i32::from(other.def().victory),
        })
        .sum()
}

pub fn scores(state: &GameState) -> Vec<i32> {
    state.players.iter().map(player_score).collect()
}

pub fn outcome(state: &GameState) -> Option<GameOutcome> {
    if !is_game_over(state) {
        return None;
    }
    let scores = scores(state);
    let best = scores.iter().copied().max()?;
    let winners = scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score == best)
        .map(|(idx, _)| idx)
        .collect();
    Some(GameOutcome { scores, winners })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(state: &mut GameState, card: Card) {
        if let Some(pile) = state.supply_pile_mut(card) {
            pile.count = 0;
        }
    }

    #[test]
    fn province_pile_ends_the_game() {
        let mut state = GameState::sample();
        assert!(!is_game_over(&state));
        empty(&mut state, Card::Province);
        assert!(is_game_over(&state));
    }

    #[test]
    fn three_empty_piles_end_the_game() {
        let mut state = GameState::sample();
        empty(&mut state, Card::Village);
        empty(&mut state, Card::Smithy);
        assert!(!is_game_over(&state));
        empty(&mut state, Card::Curse);
        assert!(is_game_over(&state));
    }

    #[test]
    fn gardens_scale_with_deck_size() {
        let mut player = PlayerState::new("p");
        player.draw_pile = vec![Card::Copper; 18];
        player.hand = vec![Card::Gardens, Card::Estate];
        player.discard_pile = vec![Card::Curse];
        // 21 cards: Gardens 2 + Estate 1 + Curse -1
        assert_eq!(player_score(&player), 2);
    }

    #[test]
    fn ties_share_the_win() {
        let mut state = GameState::sample();
        state.players[0].hand = vec![Card::Province];
        state.players[1].discard_pile = vec![Card::Duchy, Card::Duchy];
        assert_eq!(outcome(&state), None);
        empty(&mut state, Card::Province);
        let result = outcome(&state).expect("game should be over");
        assert_eq!(result.scores, vec![6, 6]);
        assert_eq!(result.winners, vec![0, 1]);
    }
}
