pub mod ai;
pub mod game;
pub mod session;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{play_out, AiAgent, AiConfig, AiDecision, AiDifficulty, AiStrategy, PlayOut};
pub use game::{
    catalog, execute_move, is_game_over, valid_moves, Card, CardType, ConfigError, GameConfig,
    GameEvent, GameOutcome, GameState, IntegrityError, InvalidMoveReason, Move, MoveGenerator,
    PendingEffect, PendingKind, Phase, PlayerState, RuleEngine, RuleError, RuleResolution,
};
pub use session::{Command, CommandOutcome, GameId, GameRegistry, OptionsView, SessionError};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

/// Decodes a state handed in from JavaScript and rejects one whose indices
/// point outside its own player list.
fn checked_state(state: JsValue) -> Result<GameState, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(state)
}

fn ai_config(difficulty: Option<&str>, strategy: Option<&str>) -> AiConfig {
    let difficulty = difficulty
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or(AiDifficulty::Normal);
    let mut config = AiConfig::from_difficulty(difficulty);
    if let Some(strategy) = strategy.and_then(|value| AiStrategy::from_str(value).ok()) {
        config = config.with_strategy(strategy);
    }
    config
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<CommandOutcome>,
}

/// One game held behind a registry slot, driven from JavaScript.
#[wasm_bindgen]
pub struct GameEngine {
    registry: GameRegistry,
    id: GameId,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<GameEngine, JsValue> {
        let config = match config_json {
            Some(json) => GameConfig::from_json(&json).map_err(to_js_error)?,
            None => GameConfig::default(),
        };
        let mut registry = GameRegistry::new();
        let id = registry.create(config).map_err(to_js_error)?;
        Ok(GameEngine { registry, id })
    }

    fn state(&self) -> Result<&GameState, JsValue> {
        self.registry.get(self.id).map_err(to_js_error)
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        to_json(self.state()?)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: GameState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.registry.set(self.id, state).map_err(to_js_error)
    }

    pub fn valid_moves_json(&self) -> Result<String, JsValue> {
        to_json(&valid_moves(self.state()?))
    }

    pub fn options_json(&self) -> Result<String, JsValue> {
        to_json(&self.registry.options(self.id).map_err(to_js_error)?)
    }

    /// Executes a move given as JSON (`{"type": "buy", "card": "Silver"}`).
    pub fn execute_json(&mut self, move_json: &str) -> Result<String, JsValue> {
        let mv: Move = serde_json::from_str(move_json).map_err(serde_to_js_error)?;
        self.execute_command(&mv.to_string())
    }

    /// Executes a command string such as `buy Silver`, `play 2` or `play_treasure all`.
    pub fn execute_command(&mut self, input: &str) -> Result<String, JsValue> {
        let outcome = self.registry.execute(self.id, input).map_err(to_js_error)?;
        to_json(&outcome)
    }

    /// Executes a JSON array of command strings atomically.
    pub fn execute_chain(&mut self, commands_json: &str) -> Result<String, JsValue> {
        let commands: Vec<String> =
            serde_json::from_str(commands_json).map_err(serde_to_js_error)?;
        let outcome = self
            .registry
            .execute_chain(self.id, &commands)
            .map_err(to_js_error)?;
        to_json(&outcome)
    }

    pub fn is_game_over(&self) -> Result<bool, JsValue> {
        Ok(is_game_over(self.state()?))
    }

    pub fn scores_json(&self) -> Result<String, JsValue> {
        to_json(&game::victory::scores(self.state()?))
    }

    pub fn apply_ai_move(
        &mut self,
        difficulty: Option<String>,
        strategy: Option<String>,
    ) -> Result<String, JsValue> {
        let config = ai_config(difficulty.as_deref(), strategy.as_deref());
        let state_for_ai = self.state()?.clone();
        let mut agent = AiAgent::new(config);
        let decision = agent.decide_action(&state_for_ai);

        let applied = match decision.action.as_ref() {
            Some(action) => Some(
                self.registry
                    .execute(self.id, &action.to_string())
                    .map_err(to_js_error)?,
            ),
            None => None,
        };

        to_json(&AiMoveResponse { decision, applied })
    }

    pub fn think_ai(
        &self,
        difficulty: Option<String>,
        strategy: Option<String>,
        delay_ms: Option<u32>,
    ) -> Result<Promise, JsValue> {
        let state = self.state()?.clone();
        let config = ai_config(difficulty.as_deref(), strategy.as_deref());
        let delay = delay_ms.unwrap_or(0);

        Ok(future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new(config);
            let decision = agent.decide_action(&state);
            let json = to_json(&decision)?;
            Ok(JsValue::from_str(&json))
        }))
    }
}

/// Starts a new game from a config object; missing fields take defaults.
#[wasm_bindgen(js_name = "createGame")]
pub fn create_game(config: JsValue) -> Result<JsValue, JsValue> {
    let config: GameConfig = if config.is_undefined() || config.is_null() {
        GameConfig::default()
    } else {
        from_value(config).map_err(JsValue::from)?
    };
    let state = GameState::new(&config).map_err(to_js_error)?;
    to_value(&state).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validMoves")]
pub fn valid_moves_js(state: JsValue) -> Result<JsValue, JsValue> {
    let state = checked_state(state)?;
    to_value(&valid_moves(&state)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "executeMove")]
pub fn execute_move_js(state: JsValue, mv: JsValue) -> Result<JsValue, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    let mv: Move = from_value(mv).map_err(JsValue::from)?;
    match execute_move(&state, &mv) {
        Ok(resolution) => to_value(&resolution).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "parseMove")]
pub fn parse_move(input: &str) -> Result<JsValue, JsValue> {
    let mv: Move = input.parse().map_err(serde_to_js_error)?;
    to_value(&mv).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "isGameOver")]
pub fn is_game_over_js(state: JsValue) -> Result<bool, JsValue> {
    let state: GameState = from_value(state).map_err(JsValue::from)?;
    Ok(is_game_over(&state))
}

#[wasm_bindgen(js_name = "cardCatalog")]
pub fn card_catalog() -> Result<JsValue, JsValue> {
    to_value(catalog()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    checked_state(state).map(|_| ())
}

#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    state: JsValue,
    difficulty: Option<String>,
    strategy: Option<String>,
) -> Result<JsValue, JsValue> {
    let state = checked_state(state)?;
    let mut agent = AiAgent::new(ai_config(difficulty.as_deref(), strategy.as_deref()));
    let decision = agent.decide_action(&state);
    to_value(&decision).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "initLogging")]
pub fn init_logging(level: Option<String>) {
    utils::init_logging(utils::parse_level(level.as_deref()));
}
