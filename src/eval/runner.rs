//! Evaluation runner: replay, score, aggregate, report.

use super::dataset::read_dataset;
use super::Evaluator;
use crate::chat::{ChatEngine, Context, ConversationHistory, GROUNDING_DATA_KEY};
use crate::error::Result;
use chrono::Local;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Per-record evaluation result.
#[derive(Debug, Clone, Serialize)]
pub struct EvalRow {
    pub query: String,
    pub response: String,
    pub scores: BTreeMap<String, f64>,
}

/// A completed evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    /// Timestamped run name.
    pub name: String,
    /// Mean score per evaluator across all rows.
    pub metrics: BTreeMap<String, f64>,
    pub rows: Vec<EvalRow>,
}

/// Replay every dataset query through the engine, score each response with
/// all evaluators, and write the aggregated report as JSON.
#[instrument(skip(engine, evaluators), fields(input = %input.display()))]
pub async fn run(
    engine: &ChatEngine,
    evaluators: &[Box<dyn Evaluator>],
    input: &Path,
    output: &Path,
) -> Result<EvalReport> {
    let name = format!(
        "evaluate_chat_{}",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let records = read_dataset(input)?;
    let mut rows = Vec::new();

    for record in records {
        let Some(query) = record.query.filter(|q| !q.is_empty()) else {
            warn!("skipping record without a query");
            continue;
        };

        let mut history = ConversationHistory::new();
        let turn = engine.converse(&query, &mut history, Context::new()).await?;

        let response = turn
            .message
            .content
            .as_text()
            .unwrap_or_default()
            .to_string();
        let context = turn
            .context
            .get(GROUNDING_DATA_KEY)
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        let mut scores = BTreeMap::new();
        for evaluator in evaluators {
            let score = evaluator.evaluate(&query, &response, &context).await?;
            scores.insert(evaluator.name().to_string(), score);
        }

        rows.push(EvalRow {
            query,
            response,
            scores,
        });
    }

    let metrics = aggregate(&rows);
    let report = EvalReport {
        name,
        metrics,
        rows,
    };

    std::fs::write(output, serde_json::to_string_pretty(&report)?)?;
    info!(
        "evaluated {} row(s), report written to {}",
        report.rows.len(),
        output.display()
    );

    Ok(report)
}

/// Mean score per evaluator across all rows.
fn aggregate(rows: &[EvalRow]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for row in rows {
        for (name, score) in &row.scores {
            let entry = sums.entry(name.clone()).or_insert((0.0, 0));
            entry.0 += score;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(name, (sum, count))| (name, sum / count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(scores: &[(&str, f64)]) -> EvalRow {
        EvalRow {
            query: "q".to_string(),
            response: "r".to_string(),
            scores: scores
                .iter()
                .map(|(n, s)| (n.to_string(), *s))
                .collect(),
        }
    }

    #[test]
    fn test_aggregate_means() {
        let rows = vec![
            row(&[("length", 1.0), ("groundedness", 5.0)]),
            row(&[("length", 0.0), ("groundedness", 3.0)]),
        ];
        let metrics = aggregate(&rows);
        assert_eq!(metrics["length"], 0.5);
        assert_eq!(metrics["groundedness"], 4.0);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
    }
}
