//! Legal move enumeration. This is the single authority on what may be played.

use super::catalog::{Card, CardFilter};
use super::moves::{Move, MoveKind};
use super::pending::{PendingEffect, PendingKind};
use super::state::{GameState, Phase};
use super::victory::is_game_over;

/// Distinct cards in first-appearance order.
fn distinct(cards: impl IntoIterator<Item = Card>) -> Vec<Card> {
    let mut seen = Vec::new();
    for card in cards {
        if !seen.contains(&card) {
            seen.push(card);
        }
    }
    seen
}

/// Size limits and card pool for the multiset-shaped choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultisetBounds {
    pub pool: Vec<Card>,
    pub min: usize,
    pub max: usize,
}

impl MultisetBounds {
    pub fn accepts(&self, cards: &[Card]) -> bool {
        if cards.len() < self.min || cards.len() > self.max {
            return false;
        }
        distinct(cards.iter().copied()).into_iter().all(|card| {
            let wanted = cards.iter().filter(|c| **c == card).count();
            let held = self.pool.iter().filter(|c| **c == card).count();
            wanted <= held
        })
    }

    /// Every accepted multiset, each sorted in catalog order, shortest first.
    pub fn enumerate(&self) -> Vec<Vec<Card>> {
        self.enumerate_first(usize::MAX)
    }

    /// The first `limit` multisets in `enumerate` order.
    pub fn enumerate_first(&self, limit: usize) -> Vec<Vec<Card>> {
        let counts = self.counts();
        let mut rest = vec![0; counts.len() + 1];
        for idx in (0..counts.len()).rev() {
            rest[idx] = rest[idx + 1] + counts[idx].1;
        }

        let mut out = Vec::new();
        let mut current = Vec::new();
        for len in self.min..=self.top() {
            if out.len() >= limit {
                break;
            }
            walk(&counts, &rest, 0, len, &mut current, limit, &mut out);
        }
        out
    }

    /// How many multisets `enumerate` would return, without building them.
    pub fn count(&self) -> usize {
        let top = self.top();
        if self.min > top {
            return 0;
        }
        let mut ways = vec![0usize; top + 1];
        ways[0] = 1;
        for (_, available) in self.counts() {
            let mut next = vec![0usize; top + 1];
            for (size, slot) in next.iter_mut().enumerate() {
                for take in 0..=available.min(size) {
                    *slot = slot.saturating_add(ways[size - take]);
                }
            }
            ways = next;
        }
        ways[self.min..=top]
            .iter()
            .fold(0, |total, n| total.saturating_add(*n))
    }

    pub fn is_satisfiable(&self) -> bool {
        self.min <= self.top()
    }

    fn top(&self) -> usize {
        self.max.min(self.pool.len())
    }

    /// Distinct cards in catalog order with how many of each the pool holds.
    fn counts(&self) -> Vec<(Card, usize)> {
        let mut sorted = self.pool.clone();
        sorted.sort_unstable();
        distinct(sorted.iter().copied())
            .into_iter()
            .map(|card| (card, sorted.iter().filter(|c| **c == card).count()))
            .collect()
    }
}

/// Multisets of exactly `remaining` more cards, in catalog-lexicographic order:
/// taking more of an earlier card sorts first.
fn walk(
    counts: &[(Card, usize)],
    rest: &[usize],
    idx: usize,
    remaining: usize,
    current: &mut Vec<Card>,
    limit: usize,
    out: &mut Vec<Vec<Card>>,
) {
    if out.len() >= limit {
        return;
    }
    if remaining == 0 {
        out.push(current.clone());
        return;
    }
    if remaining > rest[idx] {
        return;
    }
    let (card, available) = counts[idx];
    for take in (0..=available.min(remaining)).rev() {
        current.extend(std::iter::repeat(card).take(take));
        walk(counts, rest, idx + 1, remaining - take, current, limit, out);
        current.truncate(current.len() - take);
    }
}

pub struct MoveGenerator;

impl MoveGenerator {
    /// Ordered, deterministic list of every legal move. Empty once the game is over.
    pub fn valid_moves(state: &GameState) -> Vec<Move> {
        if is_game_over(state) {
            return Vec::new();
        }
        match &state.pending_effect {
            Some(pending) => Self::pending_moves(state, pending),
            None => Self::phase_moves(state),
        }
    }

    /// Same answer as `!valid_moves(state).is_empty()`, without enumerating
    /// multiset choices.
    pub fn has_any_move(state: &GameState) -> bool {
        if is_game_over(state) {
            return false;
        }
        match &state.pending_effect {
            Some(pending) => match Self::multiset_bounds(state, pending) {
                Some(bounds) => bounds.is_satisfiable(),
                None => !Self::pending_moves(state, pending).is_empty(),
            },
            None => state.players.get(state.current_player).is_some(),
        }
    }

    /// The first `limit` moves of `valid_moves(state)` and the length of the
    /// full list.
    pub fn first_moves(state: &GameState, limit: usize) -> (Vec<Move>, usize) {
        if is_game_over(state) {
            return (Vec::new(), 0);
        }
        if let Some(pending) = &state.pending_effect {
            if let Some(bounds) = Self::multiset_bounds(state, pending) {
                let expects = pending.expects();
                let moves = bounds
                    .enumerate_first(limit)
                    .into_iter()
                    .map(|cards| card_set_move(expects, cards))
                    .collect();
                return (moves, bounds.count());
            }
        }
        let mut moves = Self::valid_moves(state);
        let total = moves.len();
        moves.truncate(limit);
        (moves, total)
    }

    /// Same answer as `valid_moves(state).contains(mv)`, without enumerating
    /// large multiset option lists.
    pub fn is_legal(state: &GameState, mv: &Move) -> bool {
        if is_game_over(state) {
            return false;
        }
        let mv = mv.clone().canonical();
        if let Some(pending) = &state.pending_effect {
            if mv.kind() != pending.expects() {
                return false;
            }
            if let (Some(bounds), Some(cards)) =
                (Self::multiset_bounds(state, pending), mv.card_set())
            {
                return bounds.accepts(cards);
            }
        } else if !mv.kind().is_phase_move() {
            return false;
        }
        Self::valid_moves(state).contains(&mv)
    }

    pub fn multiset_bounds(state: &GameState, pending: &PendingEffect) -> Option<MultisetBounds> {
        let hand = &state.players.get(pending.player)?.hand;
        match &pending.effect {
            PendingKind::TrashUpTo { max } => Some(MultisetBounds {
                pool: hand.clone(),
                min: 0,
                max: *max as usize,
            }),
            PendingKind::TrashCopper { .. } => Some(MultisetBounds {
                pool: hand.iter().copied().filter(|c| *c == Card::Copper).collect(),
                min: 0,
                max: 1,
            }),
            PendingKind::CellarDiscard => Some(MultisetBounds {
                pool: hand.clone(),
                min: 0,
                max: hand.len(),
            }),
            PendingKind::DiscardDownTo { hand_size, .. } => {
                let excess = hand.len().saturating_sub(*hand_size as usize);
                Some(MultisetBounds {
                    pool: hand.clone(),
                    min: excess,
                    max: excess,
                })
            }
            _ => None,
        }
    }

    fn phase_moves(state: &GameState) -> Vec<Move> {
        let Some(player) = state.players.get(state.current_player) else {
            return Vec::new();
        };
        let mut moves = Vec::new();
        match state.phase {
            Phase::Action => {
                if player.actions > 0 {
                    moves.extend(
                        distinct(player.hand.iter().copied().filter(|c| c.is_action()))
                            .into_iter()
                            .map(|card| Move::PlayAction { card }),
                    );
                }
                moves.push(Move::EndPhase);
            }
            Phase::Buy => {
                moves.extend(
                    distinct(player.hand.iter().copied().filter(|c| c.is_treasure()))
                        .into_iter()
                        .map(|card| Move::PlayTreasure { card }),
                );
                if player.buys > 0 {
                    moves.extend(
                        state
                            .supply
                            .iter()
                            .filter(|pile| {
                                pile.count > 0 && u32::from(pile.card.cost()) <= player.coins
                            })
                            .map(|pile| Move::Buy { card: pile.card }),
                    );
                }
                moves.push(Move::EndPhase);
            }
            Phase::Cleanup => moves.push(Move::EndPhase),
        }
        moves
    }

    fn pending_moves(state: &GameState, pending: &PendingEffect) -> Vec<Move> {
        let Some(chooser) = state.players.get(pending.player) else {
            return Vec::new();
        };
        let hand_matching = |filter: CardFilter| {
            distinct(chooser.hand.iter().copied().filter(|c| filter.matches(*c)))
        };

        match &pending.effect {
            PendingKind::TrashForGain { filter, .. } => {
                let expects = pending.expects();
                hand_matching(*filter)
                    .into_iter()
                    .map(|card| match expects {
                        MoveKind::SelectTreasureToTrash => Move::SelectTreasureToTrash { card },
                        _ => Move::SelectCardToTrash { card },
                    })
                    .collect()
            }
            PendingKind::GainCard {
                max_gain_cost,
                filter,
                destination,
            } => state
                .supply
                .iter()
                .filter(|pile| {
                    pile.count > 0 && pile.card.cost() <= *max_gain_cost && filter.matches(pile.card)
                })
                .map(|pile| Move::GainCard {
                    card: pile.card,
                    destination: *destination,
                })
                .collect(),
            PendingKind::ReplayAction => hand_matching(CardFilter::Action)
                .into_iter()
                .map(|card| Move::SelectActionToReplay { card })
                .collect(),
            PendingKind::LibraryReveal { revealed, .. } => vec![
                Move::LibraryDecision {
                    card: *revealed,
                    set_aside: true,
                },
                Move::LibraryDecision {
                    card: *revealed,
                    set_aside: false,
                },
            ],
            PendingKind::ChancellorChoice => vec![
                Move::ChancellorDecision { discard_deck: true },
                Move::ChancellorDecision {
                    discard_deck: false,
                },
            ],
            PendingKind::TrashUpTo { .. }
            | PendingKind::TrashCopper { .. }
            | PendingKind::CellarDiscard
            | PendingKind::DiscardDownTo { .. } => {
                let Some(bounds) = Self::multiset_bounds(state, pending) else {
                    return Vec::new();
                };
                let expects = pending.expects();
                bounds
                    .enumerate()
                    .into_iter()
                    .map(|cards| card_set_move(expects, cards))
                    .collect()
            }
        }
    }
}

fn card_set_move(expects: MoveKind, cards: Vec<Card>) -> Move {
    match expects {
        MoveKind::DiscardForCellar => Move::DiscardForCellar { cards },
        MoveKind::DiscardCards => Move::DiscardCards { cards },
        _ => Move::TrashCards { cards },
    }
}

/// Shorthand for [`MoveGenerator::valid_moves`].
pub fn valid_moves(state: &GameState) -> Vec<Move> {
    MoveGenerator::valid_moves(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::moves::GainDestination;
    use crate::game::state::PlayerState;

    fn with_hand(hand: Vec<Card>) -> GameState {
        let mut state = GameState::sample();
        state.players[0] = PlayerState::new("p").with_hand(hand);
        state
    }

    #[test]
    fn action_phase_offers_one_move_per_distinct_action() {
        let state = with_hand(vec![Card::Village, Card::Copper, Card::Village, Card::Smithy]);
        assert_eq!(
            valid_moves(&state),
            vec![
                Move::PlayAction { card: Card::Village },
                Move::PlayAction { card: Card::Smithy },
                Move::EndPhase,
            ]
        );
    }

    #[test]
    fn no_actions_left_means_only_end_phase() {
        let mut state = with_hand(vec![Card::Village]);
        state.players[0].actions = 0;
        assert_eq!(valid_moves(&state), vec![Move::EndPhase]);
    }

    #[test]
    fn buy_phase_lists_treasures_then_affordable_piles() {
        let mut state = with_hand(vec![Card::Copper, Card::Silver, Card::Copper, Card::Estate]);
        state.phase = Phase::Buy;
        state.players[0].coins = 2;
        let moves = valid_moves(&state);
        assert_eq!(moves[0], Move::PlayTreasure { card: Card::Copper });
        assert_eq!(moves[1], Move::PlayTreasure { card: Card::Silver });
        assert!(moves.contains(&Move::Buy { card: Card::Estate }));
        assert!(moves.contains(&Move::Buy { card: Card::Cellar }));
        assert!(!moves.contains(&Move::Buy { card: Card::Silver }));
        assert_eq!(moves.last(), Some(&Move::EndPhase));

        state.players[0].buys = 0;
        assert!(!valid_moves(&state)
            .iter()
            .any(|mv| matches!(mv, Move::Buy { .. })));
    }

    #[test]
    fn empty_piles_cannot_be_bought() {
        let mut state = with_hand(Vec::new());
        state.phase = Phase::Buy;
        state.players[0].coins = 8;
        if let Some(pile) = state.supply_pile_mut(Card::Gold) {
            pile.count = 0;
        }
        assert!(!valid_moves(&state).contains(&Move::Buy { card: Card::Gold }));
    }

    #[test]
    fn cleanup_is_a_singleton() {
        let mut state = with_hand(vec![Card::Copper, Card::Copper, Card::Estate]);
        state.phase = Phase::Cleanup;
        assert_eq!(valid_moves(&state), vec![Move::EndPhase]);
    }

    #[test]
    fn pending_effect_overrides_phase() {
        let mut state = with_hand(vec![Card::Copper, Card::Silver, Card::Village]);
        state.players[0].actions = 2;
        state.pending_effect = Some(PendingEffect::new(
            Card::Mine,
            0,
            PendingKind::TrashForGain {
                filter: CardFilter::Treasure,
                bonus_cost: 3,
                destination: GainDestination::Hand,
            },
        ));
        assert_eq!(
            valid_moves(&state),
            vec![
                Move::SelectTreasureToTrash { card: Card::Copper },
                Move::SelectTreasureToTrash { card: Card::Silver },
            ]
        );
        assert!(!MoveGenerator::is_legal(&state, &Move::EndPhase));
        assert!(!MoveGenerator::is_legal(
            &state,
            &Move::PlayAction { card: Card::Village }
        ));
    }

    #[test]
    fn pending_with_no_candidates_is_empty_not_phase_moves() {
        let mut state = with_hand(vec![Card::Village]);
        state.pending_effect = Some(PendingEffect::new(
            Card::Mine,
            0,
            PendingKind::TrashForGain {
                filter: CardFilter::Treasure,
                bonus_cost: 3,
                destination: GainDestination::Hand,
            },
        ));
        assert!(valid_moves(&state).is_empty());
    }

    #[test]
    fn gain_respects_cost_ceiling_filter_and_supply() {
        let mut state = with_hand(Vec::new());
        if let Some(pile) = state.supply_pile_mut(Card::Silver) {
            pile.count = 0;
        }
        state.pending_effect = Some(PendingEffect::new(
            Card::Workshop,
            0,
            PendingKind::GainCard {
                max_gain_cost: 4,
                filter: CardFilter::Any,
                destination: GainDestination::Discard,
            },
        ));
        let moves = valid_moves(&state);
        assert!(moves.contains(&Move::GainCard {
            card: Card::Smithy,
            destination: GainDestination::Discard
        }));
        assert!(!moves.iter().any(|mv| mv.card() == Some(Card::Silver)));
        assert!(!moves.iter().any(|mv| mv.card() == Some(Card::Market)));
    }

    #[test]
    fn chapel_enumerates_multisets_up_to_four() {
        let mut state = with_hand(vec![Card::Copper, Card::Estate, Card::Copper]);
        state.pending_effect = Some(PendingEffect::new(
            Card::Chapel,
            0,
            PendingKind::TrashUpTo { max: 4 },
        ));
        let moves = valid_moves(&state);
        // {}, {C}, {E}, {C,C}, {C,E}, {C,C,E}
        assert_eq!(moves.len(), 6);
        assert_eq!(moves[0], Move::TrashCards { cards: Vec::new() });
        assert_eq!(
            moves[5],
            Move::TrashCards {
                cards: vec![Card::Copper, Card::Copper, Card::Estate]
            }
        );
        assert!(MoveGenerator::is_legal(
            &state,
            &Move::TrashCards {
                cards: vec![Card::Estate, Card::Copper]
            }
        ));
        assert!(!MoveGenerator::is_legal(
            &state,
            &Move::TrashCards {
                cards: vec![Card::Estate, Card::Estate]
            }
        ));
    }

    #[test]
    fn militia_victim_must_discard_exact_excess() {
        let mut state = GameState::sample();
        state.players[1].hand = vec![Card::Copper, Card::Copper, Card::Estate, Card::Silver, Card::Gold];
        state.pending_effect = Some(PendingEffect::new(
            Card::Militia,
            1,
            PendingKind::DiscardDownTo {
                hand_size: 3,
                victims: Vec::new(),
            },
        ));
        assert_eq!(state.actor(), 1);
        let moves = valid_moves(&state);
        assert!(moves.iter().all(|mv| mv.card_set().map(<[Card]>::len) == Some(2)));
        assert!(MoveGenerator::is_legal(
            &state,
            &Move::DiscardCards {
                cards: vec![Card::Estate, Card::Copper]
            }
        ));
        assert!(!MoveGenerator::is_legal(
            &state,
            &Move::DiscardCards {
                cards: vec![Card::Estate]
            }
        ));
    }

    #[test]
    fn repeated_calls_agree() {
        let mut state = with_hand(vec![Card::Cellar, Card::Copper, Card::Estate, Card::Silver]);
        state.pending_effect = Some(PendingEffect::new(Card::Cellar, 0, PendingKind::CellarDiscard));
        assert_eq!(valid_moves(&state), valid_moves(&state));
    }

    #[test]
    fn out_of_range_player_yields_no_moves() {
        let mut state = GameState::sample();
        state.current_player = 7;
        assert!(valid_moves(&state).is_empty());
        assert!(!MoveGenerator::has_any_move(&state));
        assert!(!MoveGenerator::is_legal(&state, &Move::EndPhase));

        state.current_player = 0;
        state.pending_effect = Some(PendingEffect::new(Card::Chapel, 9, PendingKind::TrashUpTo { max: 4 }));
        assert!(valid_moves(&state).is_empty());
        assert!(!MoveGenerator::has_any_move(&state));
    }

    #[test]
    fn has_any_move_agrees_with_the_full_list() {
        let mut state = with_hand(vec![Card::Copper, Card::Estate]);
        assert!(MoveGenerator::has_any_move(&state));

        state.pending_effect = Some(PendingEffect::new(Card::Cellar, 0, PendingKind::CellarDiscard));
        assert!(MoveGenerator::has_any_move(&state));

        state.pending_effect = Some(PendingEffect::new(
            Card::Mine,
            0,
            PendingKind::TrashForGain {
                filter: CardFilter::Treasure,
                bonus_cost: 3,
                destination: GainDestination::Hand,
            },
        ));
        assert!(MoveGenerator::has_any_move(&state));
        state.players[0].hand = vec![Card::Estate];
        assert!(!MoveGenerator::has_any_move(&state));
        assert!(valid_moves(&state).is_empty());
    }

    #[test]
    fn multiset_count_and_prefix_match_enumeration() {
        let bounds = MultisetBounds {
            pool: vec![Card::Estate, Card::Copper, Card::Copper, Card::Silver, Card::Estate],
            min: 1,
            max: 3,
        };
        let all = bounds.enumerate();
        assert_eq!(bounds.count(), all.len());
        assert_eq!(bounds.enumerate_first(7), all[..7].to_vec());
        assert_eq!(all[0], vec![Card::Copper]);
        let mut sorted = all.clone();
        sorted.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        assert_eq!(all, sorted);

        let exact = MultisetBounds {
            pool: vec![Card::Copper, Card::Estate],
            min: 3,
            max: 3,
        };
        assert!(!exact.is_satisfiable());
        assert_eq!(exact.count(), 0);
        assert!(exact.enumerate().is_empty());
    }

    #[test]
    fn first_moves_truncates_without_losing_the_total() {
        let mut state = with_hand(vec![Card::Copper, Card::Estate, Card::Silver, Card::Gold]);
        state.pending_effect = Some(PendingEffect::new(Card::Chapel, 0, PendingKind::TrashUpTo { max: 4 }));
        let full = valid_moves(&state);
        let (head, total) = MoveGenerator::first_moves(&state, 5);
        assert_eq!(total, full.len());
        assert_eq!(total, 16);
        assert_eq!(head, full[..5].to_vec());

        state.pending_effect = None;
        let (head, total) = MoveGenerator::first_moves(&state, 1);
        assert_eq!(head, vec![Move::EndPhase]);
        assert_eq!(total, 1);
    }
}
