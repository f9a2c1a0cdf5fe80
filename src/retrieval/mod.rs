//! Product document retrieval.
//!
//! Retrieval is delegated to a hosted search index; this module owns the
//! client plumbing and the intent-mapping step, not the ranking.

mod search;

pub use search::SearchRetriever;

use crate::chat::{Context, Document, Message};
use crate::error::Result;
use async_trait::async_trait;

/// Trait for grounding-document retrieval.
///
/// Given the conversation so far, returns the product documents to ground
/// the next reply on. Implementations record their results under the
/// `grounding_data` context key so the caller can carry them forward.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, history: &[Message], context: &mut Context) -> Result<Vec<Document>>;
}
