//! Card effect resolution.
//!
//! Played actions go through a FIFO play queue. Resolution runs until the queue
//! drains or an effect needs a decision; at that point the effect is parked in
//! `GameState::pending_effect` together with whatever is left on the queue, so
//! resuming later needs nothing but the state itself.

use std::collections::VecDeque;

use super::catalog::{Card, CardFilter, EffectKind};
use super::generator::MoveGenerator;
use super::moves::{GainDestination, Move};
use super::pending::{PendingEffect, PendingKind};
use super::state::{GameEvent, GameState};

#[derive(Debug, Default)]
pub struct EffectEngine {
    queue: VecDeque<Card>,
}

/// Parks `pending` on the state if it has at least one legal option,
/// otherwise drops it so resolution carries on.
fn offer(state: &mut GameState, pending: PendingEffect) -> bool {
    let card = pending.card;
    let expects = pending.expects();
    state.pending_effect = Some(pending);
    if !MoveGenerator::has_any_move(state) {
        log::trace!("{card}: no options for {expects}, skipping");
        state.pending_effect = None;
        return false;
    }
    true
}

fn gain_step(
    card: Card,
    player: usize,
    max_gain_cost: u8,
    filter: CardFilter,
    destination: GainDestination,
) -> PendingEffect {
    PendingEffect::new(
        card,
        player,
        PendingKind::GainCard {
            max_gain_cost,
            filter,
            destination,
        },
    )
}

impl EffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_play(&mut self, card: Card) {
        self.queue.push_back(card);
    }

    /// Resolves queued plays until the queue is empty or a decision is needed.
    pub fn resolve_all(&mut self, state: &mut GameState) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while state.pending_effect.is_none() {
            let Some(card) = self.queue.pop_front() else {
                break;
            };
            self.resolve_card(state, card, &mut events);
        }
        if let Some(pending) = state.pending_effect.as_mut() {
            pending.replays.extend(self.queue.drain(..));
        }
        self.queue.clear();
        events
    }

    /// Applies the decision `mv` to the already-detached `pending` effect, then
    /// keeps resolving whatever the effect still owes.
    pub fn resume(
        &mut self,
        state: &mut GameState,
        mut pending: PendingEffect,
        mv: &Move,
    ) -> Vec<GameEvent> {
        self.queue.extend(std::mem::take(&mut pending.replays));
        let mut events = Vec::new();
        let player = pending.player;
        let source = pending.card;

        match (pending.effect.clone(), mv) {
            (
                PendingKind::TrashForGain {
                    filter,
                    bonus_cost,
                    destination,
                },
                Move::SelectTreasureToTrash { card } | Move::SelectCardToTrash { card },
            ) => {
                if state.trash_from_hand(player, *card) {
                    events.push(GameEvent::CardTrashed { player, card: *card });
                }
                let max_gain_cost = card.cost().saturating_add(bonus_cost);
                offer(
                    state,
                    pending.advance(PendingKind::GainCard {
                        max_gain_cost,
                        filter,
                        destination,
                    }),
                );
            }
            (PendingKind::GainCard { destination, .. }, Move::GainCard { card, .. }) => {
                if state.gain(player, *card, destination) {
                    events.push(GameEvent::CardGained {
                        player,
                        card: *card,
                        destination,
                    });
                }
            }
            (PendingKind::TrashUpTo { .. }, Move::TrashCards { cards }) => {
                for card in cards {
                    if state.trash_from_hand(player, *card) {
                        events.push(GameEvent::CardTrashed { player, card: *card });
                    }
                }
            }
            (PendingKind::TrashCopper { coins }, Move::TrashCards { cards }) => {
                if cards.contains(&Card::Copper) && state.trash_from_hand(player, Card::Copper) {
                    events.push(GameEvent::CardTrashed {
                        player,
                        card: Card::Copper,
                    });
                    state.players[player].coins += u32::from(coins);
                }
            }
            (PendingKind::CellarDiscard, Move::DiscardForCellar { cards }) => {
                let moved = state.discard_from_hand(player, cards);
                let count = moved.len();
                if count > 0 {
                    events.push(GameEvent::CardsDiscarded {
                        player,
                        cards: moved,
                    });
                    events.extend(state.draw(player, count).events(player));
                }
            }
            (PendingKind::ReplayAction, Move::SelectActionToReplay { card }) => {
                if state.players[player].take_from_hand(*card) {
                    state.players[player].in_play.push(*card);
                    self.queue.push_front(*card);
                    self.queue.push_front(*card);
                }
            }
            (
                PendingKind::LibraryReveal {
                    revealed,
                    mut set_aside,
                    hand_size,
                },
                Move::LibraryDecision {
                    set_aside: aside, ..
                },
            ) => {
                if *aside {
                    set_aside.push(revealed);
                } else {
                    state.players[player].hand.push(revealed);
                    events.push(GameEvent::CardsDrawn { player, count: 1 });
                }
                let step = pending.step.saturating_add(1);
                Self::draw_for_library(
                    state,
                    source,
                    player,
                    step,
                    set_aside,
                    hand_size,
                    &mut events,
                );
            }
            (PendingKind::ChancellorChoice, Move::ChancellorDecision { discard_deck }) => {
                if *discard_deck {
                    let target = &mut state.players[player];
                    let deck = std::mem::take(&mut target.draw_pile);
                    if !deck.is_empty() {
                        target.discard_pile.extend(deck.iter().copied());
                        events.push(GameEvent::CardsDiscarded { player, cards: deck });
                    }
                }
            }
            (PendingKind::DiscardDownTo { hand_size, victims }, Move::DiscardCards { cards }) => {
                let moved = state.discard_from_hand(player, cards);
                if !moved.is_empty() {
                    events.push(GameEvent::CardsDiscarded {
                        player,
                        cards: moved,
                    });
                }
                Self::next_victim(state, source, hand_size, victims);
            }
            (effect, mv) => {
                log::warn!("{source}: move {mv} does not answer {}", effect.expects());
            }
        }

        events.extend(self.resolve_all(state));
        events
    }

    fn resolve_card(&mut self, state: &mut GameState, card: Card, events: &mut Vec<GameEvent>) {
        let player = state.current_player;
        let def = card.def();
        events.push(GameEvent::CardPlayed { player, card });
        log::debug!("player {player} resolves {card}");

        let bonus = def.bonus;
        if bonus.cards > 0 {
            events.extend(state.draw(player, usize::from(bonus.cards)).events(player));
        }
        {
            let owner = &mut state.players[player];
            owner.actions += u32::from(bonus.actions);
            owner.buys += u32::from(bonus.buys);
            owner.coins += u32::from(bonus.coins);
        }

        let targets = if def.attack {
            Self::attack_targets(state, player, events)
        } else {
            Vec::new()
        };

        match def.effect {
            EffectKind::None => {}
            EffectKind::TrashForGain {
                filter,
                bonus_cost,
                destination,
            } => {
                offer(
                    state,
                    PendingEffect::new(
                        card,
                        player,
                        PendingKind::TrashForGain {
                            filter,
                            bonus_cost,
                            destination,
                        },
                    ),
                );
            }
            EffectKind::TrashUpTo { max } => {
                if !state.players[player].hand.is_empty() {
                    offer(state, PendingEffect::new(card, player, PendingKind::TrashUpTo { max }));
                }
            }
            EffectKind::DiscardAndDraw => {
                if !state.players[player].hand.is_empty() {
                    offer(state, PendingEffect::new(card, player, PendingKind::CellarDiscard));
                }
            }
            EffectKind::Gain { max_cost } => {
                offer(
                    state,
                    gain_step(card, player, max_cost, CardFilter::Any, GainDestination::Discard),
                );
            }
            EffectKind::TrashSelfAndGain { max_cost } => {
                if state.trash_from_play(player, card) {
                    events.push(GameEvent::CardTrashed { player, card });
                }
                offer(
                    state,
                    gain_step(card, player, max_cost, CardFilter::Any, GainDestination::Discard),
                );
            }
            EffectKind::PlayTwice => {
                offer(state, PendingEffect::new(card, player, PendingKind::ReplayAction));
            }
            EffectKind::DrawToHandSize { size } => {
                Self::draw_for_library(state, card, player, 1, Vec::new(), size, events);
            }
            EffectKind::RevealForTreasures { count } => {
                Self::reveal_for_treasures(state, player, count, events);
            }
            EffectKind::MayDiscardDrawPile => {
                if !state.players[player].draw_pile.is_empty() {
                    offer(state, PendingEffect::new(card, player, PendingKind::ChancellorChoice));
                }
            }
            EffectKind::TrashCopperForCoins { coins } => {
                if state.players[player].has_in_hand(Card::Copper) {
                    offer(
                        state,
                        PendingEffect::new(card, player, PendingKind::TrashCopper { coins }),
                    );
                }
            }
            EffectKind::OthersDiscardDownTo { size } => {
                Self::next_victim(state, card, size, targets);
            }
            EffectKind::OthersGainCurse => {
                for other in targets {
                    if state.gain(other, Card::Curse, GainDestination::Discard) {
                        events.push(GameEvent::CardGained {
                            player: other,
                            card: Card::Curse,
                            destination: GainDestination::Discard,
                        });
                    }
                }
            }
            EffectKind::OthersDraw { count } => {
                for other in state.others(player) {
                    events.extend(state.draw(other, usize::from(count)).events(other));
                }
            }
        }
    }

    /// Other players in turn order, minus anyone revealing a Moat.
    fn attack_targets(state: &GameState, player: usize, events: &mut Vec<GameEvent>) -> Vec<usize> {
        state
            .others(player)
            .into_iter()
            .filter(|other| {
                let blocked = state.players[*other]
                    .hand
                    .iter()
                    .any(|card| card.def().reaction);
                if blocked {
                    events.push(GameEvent::AttackBlocked {
                        player: *other,
                        card: Card::Moat,
                    });
                }
                !blocked
            })
            .collect()
    }

    /// Hands the discard decision to the next victim still above `size`.
    fn next_victim(state: &mut GameState, card: Card, size: u8, mut victims: Vec<usize>) {
        while !victims.is_empty() {
            let victim = victims.remove(0);
            if state.players[victim].hand.len() > usize::from(size) {
                let pending = PendingEffect::new(
                    card,
                    victim,
                    PendingKind::DiscardDownTo {
                        hand_size: size,
                        victims,
                    },
                );
                offer(state, pending);
                return;
            }
        }
    }

    /// Draws one card at a time up to `size`, stopping at each action card for
    /// a keep/set-aside decision. Set-aside cards are discarded at the end.
    fn draw_for_library(
        state: &mut GameState,
        card: Card,
        player: usize,
        step: u8,
        mut set_aside: Vec<Card>,
        size: u8,
        events: &mut Vec<GameEvent>,
    ) {
        let mut drawn = 0;
        while state.players[player].hand.len() < usize::from(size) {
            let (next, reshuffled) = state.reveal_one(player);
            if reshuffled {
                events.push(GameEvent::Reshuffled { player });
            }
            let Some(next) = next else {
                break;
            };
            if next.is_action() {
                if drawn > 0 {
                    events.push(GameEvent::CardsDrawn { player, count: drawn });
                }
                let mut pending = PendingEffect::new(
                    card,
                    player,
                    PendingKind::LibraryReveal {
                        revealed: next,
                        set_aside,
                        hand_size: size,
                    },
                );
                pending.step = step;
                state.pending_effect = Some(pending);
                return;
            }
            state.players[player].hand.push(next);
            drawn += 1;
        }
        if drawn > 0 {
            events.push(GameEvent::CardsDrawn { player, count: drawn });
        }
        if !set_aside.is_empty() {
            state.players[player].discard_pile.extend(set_aside.iter().copied());
            events.push(GameEvent::CardsDiscarded {
                player,
                cards: set_aside,
            });
        }
    }

    /// Reveals until `count` treasures turn up or the deck runs dry. Treasures
    /// go to hand, everything else revealed is discarded afterwards.
    fn reveal_for_treasures(
        state: &mut GameState,
        player: usize,
        count: u8,
        events: &mut Vec<GameEvent>,
    ) {
        let mut revealed = Vec::new();
        let mut aside = Vec::new();
        let mut found = 0;
        while found < count {
            let (next, reshuffled) = state.reveal_one(player);
            if reshuffled {
                events.push(GameEvent::Reshuffled { player });
            }
            let Some(next) = next else {
                break;
            };
            revealed.push(next);
            if next.is_treasure() {
                state.players[player].hand.push(next);
                found += 1;
            } else {
                aside.push(next);
            }
        }
        if !revealed.is_empty() {
            events.push(GameEvent::CardsRevealed {
                player,
                cards: revealed,
            });
        }
        if found > 0 {
            events.push(GameEvent::CardsDrawn {
                player,
                count: usize::from(found),
            });
        }
        if !aside.is_empty() {
            state.players[player].discard_pile.extend(aside.iter().copied());
            events.push(GameEvent::CardsDiscarded {
                player,
                cards: aside,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::PlayerState;

    /// Puts `card` in play for player 0 and resolves it, the way playing it from
    /// hand would.
    fn play(state: &mut GameState, card: Card) -> Vec<GameEvent> {
        state.players[0].in_play.push(card);
        let mut engine = EffectEngine::new();
        engine.queue_play(card);
        engine.resolve_all(state)
    }

    fn resume(state: &mut GameState, mv: Move) -> Vec<GameEvent> {
        let pending = state.pending_effect.take().expect("a pending effect");
        EffectEngine::new().resume(state, pending, &mv)
    }

    fn with_hand(hand: Vec<Card>) -> GameState {
        let mut state = GameState::sample();
        state.players[0] = PlayerState::new("p").with_hand(hand);
        state
    }

    #[test]
    fn smithy_draws_three() {
        let mut state = with_hand(Vec::new());
        state.players[0].draw_pile = vec![Card::Copper; 4];
        play(&mut state, Card::Smithy);
        assert_eq!(state.players[0].hand.len(), 3);
        assert!(state.pending_effect.is_none());
    }

    #[test]
    fn mine_without_treasure_is_skipped() {
        let mut state = with_hand(vec![Card::Estate, Card::Village]);
        play(&mut state, Card::Mine);
        assert!(state.pending_effect.is_none());
    }

    #[test]
    fn remodel_gain_ceiling_comes_from_trashed_card() {
        let mut state = with_hand(vec![Card::Estate, Card::Gold]);
        play(&mut state, Card::Remodel);
        resume(&mut state, Move::SelectCardToTrash { card: Card::Estate });
        let pending = state.pending_effect.as_ref().expect("gain step");
        assert_eq!(pending.step, 2);
        assert_eq!(pending.max_gain_cost(), Some(4));
        assert_eq!(state.trash, vec![Card::Estate]);

        resume(
            &mut state,
            Move::GainCard {
                card: Card::Smithy,
                destination: GainDestination::Discard,
            },
        );
        assert!(state.pending_effect.is_none());
        assert_eq!(state.players[0].discard_pile, vec![Card::Smithy]);
    }

    #[test]
    fn cellar_discards_then_draws_as_many() {
        let mut state = with_hand(vec![Card::Estate, Card::Estate, Card::Copper]);
        state.players[0].draw_pile = vec![Card::Gold, Card::Silver];
        play(&mut state, Card::Cellar);
        assert_eq!(state.players[0].actions, 2);
        resume(
            &mut state,
            Move::DiscardForCellar {
                cards: vec![Card::Estate, Card::Estate],
            },
        );
        let mut hand = state.players[0].hand.clone();
        hand.sort();
        assert_eq!(hand, vec![Card::Copper, Card::Silver, Card::Gold]);
        assert_eq!(state.players[0].discard_pile, vec![Card::Estate, Card::Estate]);
    }

    #[test]
    fn moneylender_pays_for_a_copper() {
        let mut state = with_hand(vec![Card::Copper, Card::Estate]);
        play(&mut state, Card::Moneylender);
        resume(
            &mut state,
            Move::TrashCards {
                cards: vec![Card::Copper],
            },
        );
        assert_eq!(state.players[0].coins, 3);
        assert_eq!(state.players[0].hand, vec![Card::Estate]);
    }

    #[test]
    fn throne_room_plays_the_chosen_card_twice() {
        let mut state = with_hand(vec![Card::Smithy, Card::Village]);
        state.players[0].draw_pile = vec![Card::Copper; 10];
        play(&mut state, Card::ThroneRoom);
        resume(&mut state, Move::SelectActionToReplay { card: Card::Smithy });
        let player = &state.players[0];
        assert_eq!(player.hand.len(), 7);
        assert_eq!(player.in_play, vec![Card::ThroneRoom, Card::Smithy]);
    }

    #[test]
    fn replays_survive_an_interrupting_choice() {
        let mut state = with_hand(vec![Card::Workshop]);
        play(&mut state, Card::ThroneRoom);
        resume(&mut state, Move::SelectActionToReplay { card: Card::Workshop });
        let pending = state.pending_effect.as_ref().expect("first workshop gain");
        assert_eq!(pending.replays, vec![Card::Workshop]);

        let gain = Move::GainCard {
            card: Card::Silver,
            destination: GainDestination::Discard,
        };
        resume(&mut state, gain.clone());
        let pending = state.pending_effect.as_ref().expect("second workshop gain");
        assert!(pending.replays.is_empty());
        resume(&mut state, gain);
        assert!(state.pending_effect.is_none());
        assert_eq!(state.players[0].discard_pile, vec![Card::Silver, Card::Silver]);
    }

    #[test]
    fn library_stops_on_actions_and_discards_set_aside() {
        let mut state = with_hand(vec![Card::Copper; 4]);
        // Top of the pile is the end.
        state.players[0].draw_pile = vec![Card::Gold, Card::Silver, Card::Village, Card::Estate];
        play(&mut state, Card::Library);
        let pending = state.pending_effect.as_ref().expect("village revealed");
        assert_eq!(
            pending.effect,
            PendingKind::LibraryReveal {
                revealed: Card::Village,
                set_aside: Vec::new(),
                hand_size: 7,
            }
        );
        assert_eq!(state.players[0].hand.len(), 5);

        resume(
            &mut state,
            Move::LibraryDecision {
                card: Card::Village,
                set_aside: true,
            },
        );
        assert!(state.pending_effect.is_none());
        assert_eq!(state.players[0].hand.len(), 7);
        assert_eq!(state.players[0].discard_pile, vec![Card::Village]);
    }

    #[test]
    fn library_reenters_for_each_action_until_the_deck_runs_out() {
        let mut state = with_hand(vec![Card::Copper; 3]);
        state.players[0].draw_pile = vec![Card::Smithy, Card::Village];
        play(&mut state, Card::Library);
        let pending = state.pending_effect.as_ref().expect("village revealed");
        assert_eq!(pending.step, 1);

        resume(
            &mut state,
            Move::LibraryDecision {
                card: Card::Village,
                set_aside: true,
            },
        );
        let pending = state.pending_effect.as_ref().expect("smithy revealed");
        assert_eq!(pending.step, 2);
        assert_eq!(
            pending.effect,
            PendingKind::LibraryReveal {
                revealed: Card::Smithy,
                set_aside: vec![Card::Village],
                hand_size: 7,
            }
        );
        assert_eq!(state.cards_held_by_pending(), vec![Card::Smithy, Card::Village]);
        assert!(state.players[0].discard_pile.is_empty());

        resume(
            &mut state,
            Move::LibraryDecision {
                card: Card::Smithy,
                set_aside: false,
            },
        );
        assert!(state.pending_effect.is_none());
        assert_eq!(
            state.players[0].hand,
            vec![Card::Copper, Card::Copper, Card::Copper, Card::Smithy]
        );
        assert_eq!(state.players[0].discard_pile, vec![Card::Village]);
        assert!(state.players[0].draw_pile.is_empty());
    }

    #[test]
    fn council_room_lets_everyone_else_draw_one() {
        let mut state = with_hand(Vec::new());
        state.players[0].draw_pile = vec![Card::Copper; 4];
        state.players[1].hand.clear();
        state.players[1].draw_pile = vec![Card::Copper, Card::Estate];
        let buys = state.players[0].buys;
        play(&mut state, Card::CouncilRoom);
        assert_eq!(state.players[0].hand.len(), 4);
        assert_eq!(state.players[0].buys, buys + 1);
        assert_eq!(state.players[1].hand, vec![Card::Estate]);
        assert_eq!(state.players[1].draw_pile, vec![Card::Copper]);
    }

    #[test]
    fn adventurer_digs_for_two_treasures() {
        let mut state = with_hand(Vec::new());
        state.players[0].draw_pile = vec![Card::Gold, Card::Silver, Card::Estate, Card::Smithy];
        play(&mut state, Card::Adventurer);
        let mut hand = state.players[0].hand.clone();
        hand.sort();
        assert_eq!(hand, vec![Card::Silver, Card::Gold]);
        assert_eq!(state.players[0].discard_pile, vec![Card::Smithy, Card::Estate]);
        assert!(state.players[0].draw_pile.is_empty());
    }

    #[test]
    fn militia_makes_victim_choose_and_moat_blocks() {
        let mut state = GameState::new(
            &crate::game::config::GameConfig::default()
                .with_players(["a", "b", "c"])
                .with_seed(3),
        )
        .expect("three player game");
        state.players[2].hand.push(Card::Moat);
        state.players[0].in_play.push(Card::Militia);
        let mut engine = EffectEngine::new();
        engine.queue_play(Card::Militia);
        let events = engine.resolve_all(&mut state);

        assert!(events.contains(&GameEvent::AttackBlocked {
            player: 2,
            card: Card::Moat
        }));
        assert_eq!(state.players[0].coins, 2);
        let pending = state.pending_effect.as_ref().expect("victim decision");
        assert_eq!(pending.player, 1);
        assert_eq!(state.actor(), 1);

        let discard: Vec<Card> = state.players[1].hand[..2].to_vec();
        resume(&mut state, Move::DiscardCards { cards: discard });
        assert!(state.pending_effect.is_none());
        assert_eq!(state.players[1].hand.len(), 3);
        assert_eq!(state.players[2].hand.len(), 6);
    }

    #[test]
    fn witch_curses_everyone_else() {
        let mut state = with_hand(Vec::new());
        play(&mut state, Card::Witch);
        assert_eq!(state.players[1].discard_pile, vec![Card::Curse]);
        assert_eq!(state.supply_count(Card::Curse), Some(9));
    }

    #[test]
    fn chancellor_can_dump_the_deck() {
        let mut state = with_hand(Vec::new());
        state.players[0].draw_pile = vec![Card::Copper, Card::Estate];
        play(&mut state, Card::Chancellor);
        assert_eq!(state.players[0].coins, 2);
        resume(&mut state, Move::ChancellorDecision { discard_deck: true });
        assert!(state.players[0].draw_pile.is_empty());
        assert_eq!(state.players[0].discard_pile.len(), 2);
    }

    #[test]
    fn feast_trashes_itself() {
        let mut state = with_hand(Vec::new());
        play(&mut state, Card::Feast);
        assert!(state.players[0].in_play.is_empty());
        assert_eq!(state.trash, vec![Card::Feast]);
        assert_eq!(state.pending_effect.as_ref().and_then(PendingEffect::max_gain_cost), Some(5));
    }
}
