//! JSONL evaluation datasets.
//!
//! Input records carry a `query` field; replaying a record through the chat
//! pipeline augments it with `response` and `context` fields, one JSON
//! object per line.

use crate::chat::{ChatEngine, Context, ConversationHistory, GROUNDING_DATA_KEY};
use crate::error::{GearchatError, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::{info, instrument};

/// One evaluation dataset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    /// Any other fields in the record, carried through unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Read a JSONL dataset. Blank lines are skipped.
pub fn read_dataset(path: &Path) -> Result<Vec<EvalRecord>> {
    let file = std::fs::File::open(path).map_err(|e| {
        GearchatError::ResourceNotFound(format!("dataset {}: {}", path.display(), e))
    })?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Write a JSONL dataset, one JSON object per line.
pub fn write_dataset(path: &Path, records: &[EvalRecord]) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    for record in records {
        serde_json::to_writer(&mut file, record)?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

/// Replay each record's query through the engine and write the augmented
/// dataset. Each record runs with a fresh history/context pair; records
/// without a query pass through unchanged. Returns the number of records
/// written.
#[instrument(skip(engine), fields(input = %input.display()))]
pub async fn generate(engine: &ChatEngine, input: &Path, output: &Path) -> Result<usize> {
    let mut records = read_dataset(input)?;

    for record in &mut records {
        let Some(query) = record.query.clone().filter(|q| !q.is_empty()) else {
            continue;
        };

        let mut history = ConversationHistory::new();
        let turn = engine.converse(&query, &mut history, Context::new()).await?;

        record.response = turn.message.content.as_text().map(|t| t.to_string());
        record.context = turn.context.get(GROUNDING_DATA_KEY).cloned();
    }

    write_dataset(output, &records)?;
    info!("wrote {} record(s) to {}", records.len(), output.display());
    Ok(records.len())
}
