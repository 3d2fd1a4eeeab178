//! Computer players: scripted money strategies and one-ply lookahead.

pub mod agent;

pub use agent::{
    evaluate, play_out, AiAgent, AiConfig, AiDecision, AiDifficulty, AiStrategy, PlayOut,
};
