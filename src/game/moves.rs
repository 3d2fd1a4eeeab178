use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::Card;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GainDestination {
    Discard,
    Hand,
}

impl fmt::Display for GainDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GainDestination::Discard => f.write_str("discard"),
            GainDestination::Hand => f.write_str("hand"),
        }
    }
}

/// A single player decision. The variant set is closed; each pending effect
/// expects exactly one of the choice variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Move {
    PlayAction {
        card: Card,
    },
    PlayTreasure {
        card: Card,
    },
    Buy {
        card: Card,
    },
    EndPhase,
    SelectTreasureToTrash {
        card: Card,
    },
    SelectCardToTrash {
        card: Card,
    },
    TrashCards {
        cards: Vec<Card>,
    },
    GainCard {
        card: Card,
        destination: GainDestination,
    },
    DiscardForCellar {
        cards: Vec<Card>,
    },
    DiscardCards {
        cards: Vec<Card>,
    },
    SelectActionToReplay {
        card: Card,
    },
    #[serde(rename_all = "camelCase")]
    LibraryDecision {
        card: Card,
        set_aside: bool,
    },
    #[serde(rename_all = "camelCase")]
    ChancellorDecision {
        discard_deck: bool,
    },
}

/// Discriminant of [`Move`], used to match moves against what a pending effect expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    PlayAction,
    PlayTreasure,
    Buy,
    EndPhase,
    SelectTreasureToTrash,
    SelectCardToTrash,
    TrashCards,
    GainCard,
    DiscardForCellar,
    DiscardCards,
    SelectActionToReplay,
    LibraryDecision,
    ChancellorDecision,
}

impl MoveKind {
    pub fn keyword(self) -> &'static str {
        match self {
            MoveKind::PlayAction => "play_action",
            MoveKind::PlayTreasure => "play_treasure",
            MoveKind::Buy => "buy",
            MoveKind::EndPhase => "end",
            MoveKind::SelectTreasureToTrash => "select_treasure_to_trash",
            MoveKind::SelectCardToTrash => "select_card_to_trash",
            MoveKind::TrashCards => "trash_cards",
            MoveKind::GainCard => "gain_card",
            MoveKind::DiscardForCellar => "discard_for_cellar",
            MoveKind::DiscardCards => "discard_cards",
            MoveKind::SelectActionToReplay => "select_action_to_replay",
            MoveKind::LibraryDecision => "library_decision",
            MoveKind::ChancellorDecision => "chancellor_decision",
        }
    }

    /// Phase-level moves are the only ones legal without a pending effect.
    pub fn is_phase_move(self) -> bool {
        matches!(
            self,
            MoveKind::PlayAction | MoveKind::PlayTreasure | MoveKind::Buy | MoveKind::EndPhase
        )
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl Move {
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::PlayAction { .. } => MoveKind::PlayAction,
            Move::PlayTreasure { .. } => MoveKind::PlayTreasure,
            Move::Buy { .. } => MoveKind::Buy,
            Move::EndPhase => MoveKind::EndPhase,
            Move::SelectTreasureToTrash { .. } => MoveKind::SelectTreasureToTrash,
            Move::SelectCardToTrash { .. } => MoveKind::SelectCardToTrash,
            Move::TrashCards { .. } => MoveKind::TrashCards,
            Move::GainCard { .. } => MoveKind::GainCard,
            Move::DiscardForCellar { .. } => MoveKind::DiscardForCellar,
            Move::DiscardCards { .. } => MoveKind::DiscardCards,
            Move::SelectActionToReplay { .. } => MoveKind::SelectActionToReplay,
            Move::LibraryDecision { .. } => MoveKind::LibraryDecision,
            Move::ChancellorDecision { .. } => MoveKind::ChancellorDecision,
        }
    }

    /// The single card a move names, if any.
    pub fn card(&self) -> Option<Card> {
        match self {
            Move::PlayAction { card }
            | Move::PlayTreasure { card }
            | Move::Buy { card }
            | Move::SelectTreasureToTrash { card }
            | Move::SelectCardToTrash { card }
            | Move::GainCard { card, .. }
            | Move::SelectActionToReplay { card }
            | Move::LibraryDecision { card, .. } => Some(*card),
            _ => None,
        }
    }

    /// Cards named by a multiset move.
    pub fn card_set(&self) -> Option<&[Card]> {
        match self {
            Move::TrashCards { cards }
            | Move::DiscardForCellar { cards }
            | Move::DiscardCards { cards } => Some(cards),
            _ => None,
        }
    }

    /// Multiset moves compare independent of the order cards were listed in.
    pub fn canonical(mut self) -> Self {
        if let Move::TrashCards { cards }
        | Move::DiscardForCellar { cards }
        | Move::DiscardCards { cards } = &mut self
        {
            cards.sort_unstable();
        }
        self
    }

    /// Human readable one-liner for option lists.
    pub fn describe(&self) -> String {
        match self {
            Move::PlayAction { card } => format!("Play {card}"),
            Move::PlayTreasure { card } => format!("Play treasure {card}"),
            Move::Buy { card } => format!("Buy {card} (${})", card.cost()),
            Move::EndPhase => "End phase".to_string(),
            Move::SelectTreasureToTrash { card } => format!("Trash treasure {card}"),
            Move::SelectCardToTrash { card } => format!("Trash {card}"),
            Move::TrashCards { cards } if cards.is_empty() => "Trash nothing".to_string(),
            Move::TrashCards { cards } => format!("Trash {}", join_cards(cards)),
            Move::GainCard { card, destination } => {
                format!("Gain {card} (${}) to {destination}", card.cost())
            }
            Move::DiscardForCellar { cards } if cards.is_empty() => {
                "Discard nothing".to_string()
            }
            Move::DiscardForCellar { cards } => {
                format!("Discard {} and draw {}", join_cards(cards), cards.len())
            }
            Move::DiscardCards { cards } => format!("Discard {}", join_cards(cards)),
            Move::SelectActionToReplay { card } => format!("Play {card} twice"),
            Move::LibraryDecision {
                card,
                set_aside: true,
            } => format!("Set aside {card}"),
            Move::LibraryDecision {
                card,
                set_aside: false,
            } => format!("Keep {card} in hand"),
            Move::ChancellorDecision { discard_deck: true } => {
                "Put your draw pile into your discard pile".to_string()
            }
            Move::ChancellorDecision {
                discard_deck: false,
            } => "Keep your draw pile".to_string(),
        }
    }
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| card.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prints the command string that parses back into the same move.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = self.kind().keyword();
        match self {
            Move::EndPhase => f.write_str(keyword),
            Move::TrashCards { cards }
            | Move::DiscardForCellar { cards }
            | Move::DiscardCards { cards } => {
                if cards.is_empty() {
                    write!(f, "{keyword} none")
                } else {
                    write!(f, "{keyword} {}", join_cards(cards))
                }
            }
            Move::GainCard { card, destination } => {
                write!(f, "{keyword} {card} to {destination}")
            }
            Move::LibraryDecision { card, set_aside } => {
                let choice = if *set_aside { "set_aside" } else { "keep" };
                write!(f, "{keyword} {card} {choice}")
            }
            Move::ChancellorDecision { discard_deck } => {
                let choice = if *discard_deck { "yes" } else { "no" };
                write!(f, "{keyword} {choice}")
            }
            Move::PlayAction { card }
            | Move::PlayTreasure { card }
            | Move::Buy { card }
            | Move::SelectTreasureToTrash { card }
            | Move::SelectCardToTrash { card }
            | Move::SelectActionToReplay { card } => write!(f, "{keyword} {card}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{command}` needs {expected}")]
    MissingArgument {
        command: String,
        expected: &'static str,
    },
    #[error("unknown card `{0}`")]
    UnknownCard(String),
    #[error("unrecognised option `{value}` for `{command}`")]
    BadOption { command: String, value: String },
}

fn parse_card(raw: &str) -> Result<Card, ParseError> {
    Card::lookup(raw).ok_or_else(|| ParseError::UnknownCard(raw.trim().to_string()))
}

fn parse_card_list(raw: &str) -> Result<Vec<Card>, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return Ok(Vec::new());
    }
    raw.split(',').map(parse_card).collect()
}

fn parse_yes_no(command: &str, raw: &str) -> Result<bool, ParseError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" => Ok(true),
        "no" | "n" | "false" => Ok(false),
        other => Err(ParseError::BadOption {
            command: command.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Splits `"<card words> <trailing keyword>"` at the last space.
fn split_last_word(rest: &str) -> Option<(&str, &str)> {
    let rest = rest.trim();
    let at = rest.rfind(' ')?;
    Some((&rest[..at], &rest[at + 1..]))
}

impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(ParseError::Empty);
        }
        let (keyword, rest) = match input.find(char::is_whitespace) {
            Some(at) => (&input[..at], input[at..].trim()),
            None => (input, ""),
        };
        let keyword = keyword.to_ascii_lowercase();
        let missing = |expected| ParseError::MissingArgument {
            command: keyword.clone(),
            expected,
        };

        let single_card = |rest: &str| -> Result<Card, ParseError> {
            if rest.is_empty() {
                Err(missing("a card name"))
            } else {
                parse_card(rest)
            }
        };

        match keyword.as_str() {
            "end" | "end_phase" => Ok(Move::EndPhase),
            "play_action" => Ok(Move::PlayAction {
                card: single_card(rest)?,
            }),
            "play_treasure" => Ok(Move::PlayTreasure {
                card: single_card(rest)?,
            }),
            "buy" => Ok(Move::Buy {
                card: single_card(rest)?,
            }),
            "select_treasure_to_trash" => Ok(Move::SelectTreasureToTrash {
                card: single_card(rest)?,
            }),
            "select_card_to_trash" => Ok(Move::SelectCardToTrash {
                card: single_card(rest)?,
            }),
            "select_action_to_replay" => Ok(Move::SelectActionToReplay {
                card: single_card(rest)?,
            }),
            "trash_cards" => Ok(Move::TrashCards {
                cards: parse_card_list(rest)?,
            }),
            "discard_for_cellar" => Ok(Move::DiscardForCellar {
                cards: parse_card_list(rest)?,
            }),
            "discard_cards" => Ok(Move::DiscardCards {
                cards: parse_card_list(rest)?,
            }),
            "gain_card" => {
                if rest.is_empty() {
                    return Err(missing("a card name"));
                }
                let lowered = rest.to_ascii_lowercase();
                if let Some(at) = lowered.rfind(" to ") {
                    let destination = match lowered[at + 4..].trim() {
                        "hand" => GainDestination::Hand,
                        "discard" => GainDestination::Discard,
                        other => {
                            return Err(ParseError::BadOption {
                                command: keyword.clone(),
                                value: other.to_string(),
                            })
                        }
                    };
                    Ok(Move::GainCard {
                        card: parse_card(&rest[..at])?,
                        destination,
                    })
                } else {
                    Ok(Move::GainCard {
                        card: parse_card(rest)?,
                        destination: GainDestination::Discard,
                    })
                }
            }
            "library_decision" => {
                let (card, choice) =
                    split_last_word(rest).ok_or_else(|| missing("a card and set_aside|keep"))?;
                let set_aside = match choice.to_ascii_lowercase().as_str() {
                    "set_aside" | "aside" | "skip" => true,
                    "keep" | "take" => false,
                    other => {
                        return Err(ParseError::BadOption {
                            command: keyword.clone(),
                            value: other.to_string(),
                        })
                    }
                };
                Ok(Move::LibraryDecision {
                    card: parse_card(card)?,
                    set_aside,
                })
            }
            "chancellor_decision" => {
                if rest.is_empty() {
                    return Err(missing("yes or no"));
                }
                Ok(Move::ChancellorDecision {
                    discard_deck: parse_yes_no(&keyword, rest)?,
                })
            }
            _ => Err(ParseError::UnknownCommand(keyword.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_print_and_parse_back() {
        let moves = vec![
            Move::PlayAction {
                card: Card::ThroneRoom,
            },
            Move::Buy { card: Card::Silver },
            Move::EndPhase,
            Move::TrashCards {
                cards: vec![Card::Copper, Card::Estate],
            },
            Move::TrashCards { cards: Vec::new() },
            Move::GainCard {
                card: Card::Silver,
                destination: GainDestination::Hand,
            },
            Move::LibraryDecision {
                card: Card::CouncilRoom,
                set_aside: true,
            },
            Move::ChancellorDecision {
                discard_deck: false,
            },
        ];
        for mv in moves {
            let command = mv.to_string();
            let parsed: Move = command.parse().expect("command should parse");
            assert_eq!(parsed, mv, "round trip of `{command}`");
        }
    }

    #[test]
    fn parse_is_forgiving_about_case() {
        let mv: Move = "BUY  province".parse().expect("parse buy");
        assert_eq!(mv, Move::Buy { card: Card::Province });
        let mv: Move = "gain_card gold".parse().expect("parse gain");
        assert_eq!(
            mv,
            Move::GainCard {
                card: Card::Gold,
                destination: GainDestination::Discard
            }
        );
    }

    #[test]
    fn parse_errors_are_specific() {
        assert_eq!("".parse::<Move>(), Err(ParseError::Empty));
        assert_eq!(
            "dance".parse::<Move>(),
            Err(ParseError::UnknownCommand("dance".into()))
        );
        assert_eq!(
            "buy Unicorn".parse::<Move>(),
            Err(ParseError::UnknownCard("Unicorn".into()))
        );
        assert!(matches!(
            "buy".parse::<Move>(),
            Err(ParseError::MissingArgument { .. })
        ));
        assert!(matches!(
            "chancellor_decision maybe".parse::<Move>(),
            Err(ParseError::BadOption { .. })
        ));
    }

    #[test]
    fn canonical_sorts_multisets_only() {
        let mv = Move::DiscardForCellar {
            cards: vec![Card::Estate, Card::Copper, Card::Estate],
        }
        .canonical();
        assert_eq!(
            mv,
            Move::DiscardForCellar {
                cards: vec![Card::Copper, Card::Estate, Card::Estate]
            }
        );
    }

    #[test]
    fn json_shape_uses_type_tag() {
        let json = serde_json::to_value(Move::PlayAction { card: Card::Village })
            .expect("serialize move");
        assert_eq!(json["type"], "play_action");
        assert_eq!(json["card"], "Village");
        let json = serde_json::to_value(Move::LibraryDecision {
            card: Card::Smithy,
            set_aside: true,
        })
        .expect("serialize move");
        assert_eq!(json["setAside"], true);
    }
}
