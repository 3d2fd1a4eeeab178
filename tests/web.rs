#![cfg(target_arch = "wasm32")]

use deckbuilder::{
    compute_ai_move, valid_moves_js, GameConfig, GameEngine, GameState, Move, OptionsView,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn engine_round_trips_commands() {
    let mut engine = GameEngine::new(Some(r#"{"seed": 7}"#.to_string())).expect("engine");
    let options: OptionsView =
        serde_json::from_str(&engine.options_json().expect("options")).expect("options json");
    assert_eq!(options.options.last().map(|o| o.command.as_str()), Some("end"));

    engine.execute_command("end").expect("end action phase");
    let moves: Vec<Move> =
        serde_json::from_str(&engine.valid_moves_json().expect("moves")).expect("moves json");
    assert!(moves.contains(&Move::EndPhase));
    assert!(!engine.is_game_over().expect("status"));
}

#[wasm_bindgen_test]
fn ai_move_is_applied() {
    let mut engine = GameEngine::new(None).expect("engine");
    let before = engine.state_json().expect("state");
    engine
        .apply_ai_move(Some("hard".into()), Some("big_money".into()))
        .expect("ai move");
    assert_ne!(before, engine.state_json().expect("state"));
}

#[wasm_bindgen_test]
fn state_with_bad_player_index_is_rejected() {
    let mut state = GameState::new(&GameConfig::default()).expect("new game");
    state.current_player = 7;
    let js = serde_wasm_bindgen::to_value(&state).expect("state to js");
    assert!(valid_moves_js(js.clone()).is_err());
    assert!(compute_ai_move(js, None, None).is_err());
}
