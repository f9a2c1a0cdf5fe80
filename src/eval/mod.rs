//! Offline evaluation: replay queries through the chat pipeline and score
//! the responses.

mod dataset;
mod evaluators;
mod runner;

pub use dataset::{generate, read_dataset, write_dataset, EvalRecord};
pub use evaluators::{Evaluator, GroundednessEvaluator, LengthEvaluator};
pub use runner::{run, EvalReport, EvalRow};
