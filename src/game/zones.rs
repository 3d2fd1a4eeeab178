//! Card movement between hand, draw pile, discard pile, play and trash.

use super::catalog::Card;
use super::moves::GainDestination;
use super::state::{GameEvent, GameState};

/// Cards pulled off a draw pile, and whether the discard pile had to be
/// reshuffled to get them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drawn {
    pub cards: Vec<Card>,
    pub reshuffled: bool,
}

impl Drawn {
    pub fn events(&self, player: usize) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.reshuffled {
            events.push(GameEvent::Reshuffled { player });
        }
        if !self.cards.is_empty() {
            events.push(GameEvent::CardsDrawn {
                player,
                count: self.cards.len(),
            });
        }
        events
    }
}

impl GameState {
    /// Takes the top card of the draw pile without putting it anywhere,
    /// shuffling the discard pile in first if the draw pile is empty.
    pub fn reveal_one(&mut self, player: usize) -> (Option<Card>, bool) {
        let mut reshuffled = false;
        if self.players[player].draw_pile.is_empty() && !self.players[player].discard_pile.is_empty()
        {
            let mut pile = std::mem::take(&mut self.players[player].discard_pile);
            self.shuffler.shuffle(&mut pile);
            self.players[player].draw_pile = pile;
            reshuffled = true;
        }
        (self.players[player].draw_pile.pop(), reshuffled)
    }

    /// Draws up to `count` cards into hand. Runs short, without error, when
    /// both the draw and discard piles are exhausted.
    pub fn draw(&mut self, player: usize, count: usize) -> Drawn {
        let mut drawn = Drawn::default();
        for _ in 0..count {
            let (card, reshuffled) = self.reveal_one(player);
            drawn.reshuffled |= reshuffled;
            match card {
                Some(card) => {
                    self.players[player].hand.push(card);
                    drawn.cards.push(card);
                }
                None => break,
            }
        }
        if drawn.cards.len() < count {
            log::trace!(
                "player {} drew {} of {} requested cards",
                player,
                drawn.cards.len(),
                count
            );
        }
        drawn
    }

    /// Moves each listed card from hand to the discard pile. Cards not in hand
    /// are skipped; the cards actually moved are returned.
    pub fn discard_from_hand(&mut self, player: usize, cards: &[Card]) -> Vec<Card> {
        let mut moved = Vec::with_capacity(cards.len());
        for card in cards {
            if self.players[player].take_from_hand(*card) {
                self.players[player].discard_pile.push(*card);
                moved.push(*card);
            }
        }
        moved
    }

    pub fn trash_from_hand(&mut self, player: usize, card: Card) -> bool {
        if self.players[player].take_from_hand(card) {
            self.trash.push(card);
            true
        } else {
            false
        }
    }

    pub fn trash_from_play(&mut self, player: usize, card: Card) -> bool {
        if self.players[player].take_from_play(card) {
            self.trash.push(card);
            true
        } else {
            false
        }
    }

    /// Takes one card from its supply pile. Fails when the pile is missing or empty.
    pub fn gain(&mut self, player: usize, card: Card, destination: GainDestination) -> bool {
        let Some(pile) = self.supply_pile_mut(card) else {
            return false;
        };
        if pile.count == 0 {
            return false;
        }
        pile.count -= 1;
        let target = &mut self.players[player];
        match destination {
            GainDestination::Discard => target.discard_pile.push(card),
            GainDestination::Hand => target.hand.push(card),
        }
        true
    }

    /// End-of-turn cleanup for one player: hand and play go to the discard
    /// pile, a fresh hand is drawn and per-turn resources reset.
    pub fn cleanup(&mut self, player: usize) -> Drawn {
        let hand_size = self.hand_size as usize;
        let target = &mut self.players[player];
        let mut hand = std::mem::take(&mut target.hand);
        let mut in_play = std::mem::take(&mut target.in_play);
        target.discard_pile.append(&mut hand);
        target.discard_pile.append(&mut in_play);
        target.reset_resources();
        self.draw(player, hand_size)
    }
}
