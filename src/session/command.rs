use std::fmt;
use std::str::FromStr;

use crate::game::{Card, Move, ParseError};

/// What an adapter can type. Everything except the two shorthands is a plain
/// [`Move`] in its command-string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(Move),
    /// 1-based index into the legal-move list at the time of execution.
    Pick(usize),
    /// Plays every treasure in hand, one `play_treasure` at a time.
    PlayAllTreasures,
    /// `gain_card <Card>` with no destination; the pending gain supplies it.
    Gain(Card),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let mut words = input.split_whitespace();
        let keyword = words.next().map(str::to_ascii_lowercase);
        let argument = words.next();
        let extra = words.next();

        match (keyword.as_deref(), argument, extra) {
            (Some("play"), None, _) => Err(ParseError::MissingArgument {
                command: "play".to_string(),
                expected: "an option number",
            }),
            (Some("play"), Some(raw), None) => match raw.parse::<usize>() {
                Ok(index) if index > 0 => Ok(Command::Pick(index)),
                _ => Err(ParseError::BadOption {
                    command: "play".to_string(),
                    value: raw.to_string(),
                }),
            },
            (Some("play_treasure"), Some(raw), None) if raw.eq_ignore_ascii_case("all") => {
                Ok(Command::PlayAllTreasures)
            }
            (Some("gain_card"), Some(_), _)
                if !input.to_ascii_lowercase().contains(" to ") =>
            {
                match input.parse()? {
                    Move::GainCard { card, .. } => Ok(Command::Gain(card)),
                    other => Ok(Command::Move(other)),
                }
            }
            _ => input.parse().map(Command::Move),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move(mv) => write!(f, "{mv}"),
            Command::Pick(index) => write!(f, "play {index}"),
            Command::PlayAllTreasures => f.write_str("play_treasure all"),
            Command::Gain(card) => write!(f, "gain_card {card}"),
        }
    }
}

impl From<Move> for Command {
    fn from(mv: Move) -> Self {
        Command::Move(mv)
    }
}
