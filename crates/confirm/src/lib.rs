pub mod engine;
pub mod evaluator;
pub mod state;

pub use engine::ConfirmEngine;
pub use evaluator::{EmaEvaluator, Evaluation, PairEvaluator};
pub use state::ConfirmState;
