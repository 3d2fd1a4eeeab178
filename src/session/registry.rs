use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::command::Command;
use super::view::OptionsView;
use super::SessionError;
use crate::game::victory::{self, GameOutcome};
use crate::game::{
    valid_moves, GainDestination, GameConfig, GameEvent, GameState, Move, PendingKind, Phase,
    RuleEngine, RuleError,
};

pub type GameId = u64;

#[derive(Debug, Clone)]
pub struct GameSession {
    pub state: GameState,
    pub config: GameConfig,
    pub moves_played: usize,
}

/// Result of one command or chain: the state now stored for the game and
/// everything that happened on the way there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub state: GameState,
    pub executed: Vec<Move>,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<GameOutcome>,
}

impl CommandOutcome {
    fn start(state: GameState) -> Self {
        Self {
            state,
            executed: Vec::new(),
            events: Vec::new(),
            outcome: None,
        }
    }

    fn step(&mut self, engine: &mut RuleEngine, mv: Move) -> Result<(), SessionError> {
        let resolution = engine.execute_move(&self.state, &mv)?;
        self.state = resolution.state;
        self.events.extend(resolution.events);
        self.executed.push(mv);
        Ok(())
    }

    fn finish(mut self) -> Self {
        self.outcome = victory::outcome(&self.state);
        self
    }
}

/// Applies one command to `state` without touching it, including the
/// automatic cleanup step unless `manual_cleanup` is set.
pub fn apply_command(
    engine: &mut RuleEngine,
    state: &GameState,
    command: &Command,
    manual_cleanup: bool,
) -> Result<CommandOutcome, SessionError> {
    let mut result = CommandOutcome::start(state.clone());
    match command {
        Command::Move(mv) => result.step(engine, mv.clone())?,
        Command::Pick(index) => {
            let moves = valid_moves(state);
            let mv = index
                .checked_sub(1)
                .and_then(|idx| moves.get(idx))
                .cloned()
                .ok_or_else(|| SessionError::ParseFailure {
                    input: command.to_string(),
                    message: format!("option {index} does not exist, there are {}", moves.len()),
                })?;
            result.step(engine, mv)?;
        }
        Command::Gain(card) => {
            let destination = match state.pending_effect.as_ref().map(|p| &p.effect) {
                Some(PendingKind::GainCard { destination, .. }) => *destination,
                _ => GainDestination::Discard,
            };
            result.step(
                engine,
                Move::GainCard {
                    card: *card,
                    destination,
                },
            )?;
        }
        Command::PlayAllTreasures => {
            let treasures: Vec<_> = state
                .current()
                .hand
                .iter()
                .copied()
                .filter(|card| card.is_treasure())
                .collect();
            for card in treasures {
                if let Err(error) = result.step(engine, Move::PlayTreasure { card }) {
                    if result.executed.is_empty() {
                        return Err(error);
                    }
                    log::debug!("play_treasure all stopped at {card}: {error}");
                    break;
                }
            }
        }
    }

    if !manual_cleanup {
        while result.state.phase == Phase::Cleanup
            && result.state.pending_effect.is_none()
            && valid_moves(&result.state) == [Move::EndPhase]
        {
            result.step(engine, Move::EndPhase)?;
        }
    }
    Ok(result.finish())
}

/// Independent games keyed by id. All mutation goes through `set` or the
/// command methods; nothing outside holds a game's state by reference.
#[derive(Default)]
pub struct GameRegistry {
    games: HashMap<GameId, GameSession>,
    next_id: GameId,
    engine: RuleEngine,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, config: GameConfig) -> Result<GameId, SessionError> {
        let state = GameState::new(&config)?;
        self.next_id += 1;
        let id = self.next_id;
        self.games.insert(
            id,
            GameSession {
                state,
                config,
                moves_played: 0,
            },
        );
        log::info!("created game {id}");
        Ok(id)
    }

    pub fn session(&self, id: GameId) -> Result<&GameSession, SessionError> {
        self.games.get(&id).ok_or(SessionError::NoActiveGame { id })
    }

    pub fn get(&self, id: GameId) -> Result<&GameState, SessionError> {
        self.session(id).map(|session| &session.state)
    }

    /// Replaces a game's state. A state whose indices point outside its own
    /// player list is refused and the stored one kept.
    pub fn set(&mut self, id: GameId, state: GameState) -> Result<(), SessionError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })?;
        let session = self
            .games
            .get_mut(&id)
            .ok_or(SessionError::NoActiveGame { id })?;
        session.state = state;
        Ok(())
    }

    pub fn remove(&mut self, id: GameId) -> Result<GameState, SessionError> {
        self.games
            .remove(&id)
            .map(|session| session.state)
            .inspect(|_| log::info!("removed game {id}"))
            .ok_or(SessionError::NoActiveGame { id })
    }

    pub fn ids(&self) -> Vec<GameId> {
        let mut ids: Vec<GameId> = self.games.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn options(&self, id: GameId) -> Result<OptionsView, SessionError> {
        let session = self.session(id)?;
        Ok(OptionsView::build(
            &session.state,
            session.config.option_display_limit,
        ))
    }

    pub fn execute(&mut self, id: GameId, input: &str) -> Result<CommandOutcome, SessionError> {
        let command = parse(input)?;
        let session = self
            .games
            .get_mut(&id)
            .ok_or(SessionError::NoActiveGame { id })?;
        let result = apply_command(
            &mut self.engine,
            &session.state,
            &command,
            session.config.manual_cleanup,
        )?;
        session.state = result.state.clone();
        session.moves_played += result.executed.len();
        if let Some(outcome) = &result.outcome {
            log::info!("game {id} finished, winners {:?}", outcome.winners);
        }
        Ok(result)
    }

    /// Runs `inputs` in order as one unit. If any step fails, the game keeps
    /// the state it had before the chain and the error names the step.
    pub fn execute_chain<S: AsRef<str>>(
        &mut self,
        id: GameId,
        inputs: &[S],
    ) -> Result<CommandOutcome, SessionError> {
        let session = self
            .games
            .get_mut(&id)
            .ok_or(SessionError::NoActiveGame { id })?;
        let mut total = CommandOutcome::start(session.state.clone());

        for (step, input) in inputs.iter().enumerate() {
            let input = input.as_ref();
            let applied = parse(input).and_then(|command| {
                apply_command(
                    &mut self.engine,
                    &total.state,
                    &command,
                    session.config.manual_cleanup,
                )
            });
            match applied {
                Ok(result) => {
                    total.state = result.state;
                    total.executed.extend(result.executed);
                    total.events.extend(result.events);
                }
                Err(error) => {
                    log::warn!("chain on game {id} rolled back at step {}: {error}", step + 1);
                    return Err(SessionError::ChainFailed {
                        step: step + 1,
                        command: input.to_string(),
                        error: Box::new(error),
                    });
                }
            }
        }

        session.state = total.state.clone();
        session.moves_played += total.executed.len();
        Ok(total.finish())
    }
}

fn parse(input: &str) -> Result<Command, SessionError> {
    input.parse().map_err(|err: crate::game::ParseError| SessionError::ParseFailure {
        input: input.trim().to_string(),
        message: err.to_string(),
    })
}
