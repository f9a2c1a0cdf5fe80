//! Evaluation commands.

use crate::chat::ChatEngine;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::eval::{self, Evaluator, GroundednessEvaluator, LengthEvaluator};
use anyhow::Result;
use std::path::PathBuf;

/// Default evaluation dataset file name in the asset directory.
const EVAL_DATASET: &str = "chat_eval_data.jsonl";

fn resolve_input(input: Option<String>, settings: &Settings) -> PathBuf {
    input
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.asset_dir().join(EVAL_DATASET))
}

/// Replay dataset queries and write the augmented JSONL dataset.
pub async fn run_generate(
    input: Option<String>,
    output: &str,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Eval, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let engine = ChatEngine::from_settings(&settings)?;
    let input = resolve_input(input, &settings);
    let output = PathBuf::from(output);

    let spinner = Output::spinner("Replaying dataset queries...");
    let count = eval::generate(&engine, &input, &output).await?;
    spinner.finish_and_clear();

    Output::success(&format!(
        "Wrote {} record(s) to {}",
        count,
        output.display()
    ));
    Ok(())
}

/// Replay dataset queries, score responses, and write a report.
pub async fn run_eval(input: Option<String>, output: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Eval, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let engine = ChatEngine::from_settings(&settings)?;
    let input = resolve_input(input, &settings);
    let output = PathBuf::from(output);

    let evaluators: Vec<Box<dyn Evaluator>> = vec![
        Box::new(GroundednessEvaluator::new(&settings.evaluation)),
        Box::new(LengthEvaluator::new(settings.evaluation.min_response_chars)),
    ];

    let spinner = Output::spinner("Evaluating responses...");
    let report = eval::run(&engine, &evaluators, &input, &output).await?;
    spinner.finish_and_clear();

    Output::header(&format!("Evaluation: {}", report.name));
    for (metric, mean) in &report.metrics {
        Output::kv(metric, &format!("{:.2}", mean));
    }
    println!();
    Output::success(&format!(
        "Report with {} row(s) written to {}",
        report.rows.len(),
        output.display()
    ));
    Ok(())
}
