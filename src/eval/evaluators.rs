//! Response evaluators.

use crate::config::EvaluationSettings;
use crate::error::{GearchatError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::instrument;

/// Trait for scoring a single evaluated response.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Metric name used in report rows and aggregates.
    fn name(&self) -> &str;

    /// Score one query/response pair against its retrieved context.
    async fn evaluate(
        &self,
        query: &str,
        response: &str,
        context: &serde_json::Value,
    ) -> Result<f64>;
}

/// Scores 1 when the response is longer than a minimum, else 0.
pub struct LengthEvaluator {
    min_chars: usize,
}

impl LengthEvaluator {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

#[async_trait]
impl Evaluator for LengthEvaluator {
    fn name(&self) -> &str {
        "length"
    }

    async fn evaluate(
        &self,
        _query: &str,
        response: &str,
        _context: &serde_json::Value,
    ) -> Result<f64> {
        Ok(if response.len() > self.min_chars { 1.0 } else { 0.0 })
    }
}

const GROUNDEDNESS_SYSTEM: &str = r#"You are an evaluation assistant. Rate how well an answer is grounded in the provided context documents on a scale of 1 to 5:
1 - the answer is entirely ungrounded or contradicts the context
3 - the answer is partially supported by the context
5 - every claim in the answer is directly supported by the context
Respond with the rating number only."#;

/// LLM-judge groundedness score (1-5) for a response against its context.
pub struct GroundednessEvaluator {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
}

impl GroundednessEvaluator {
    pub fn new(settings: &EvaluationSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl Evaluator for GroundednessEvaluator {
    fn name(&self) -> &str {
        "groundedness"
    }

    #[instrument(skip(self, query, response, context))]
    async fn evaluate(
        &self,
        query: &str,
        response: &str,
        context: &serde_json::Value,
    ) -> Result<f64> {
        let prompt = format!(
            "Context:\n{}\n\nQuery: {}\n\nAnswer: {}\n\nRating:",
            serde_json::to_string_pretty(context)?,
            query,
            response
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(GROUNDEDNESS_SYSTEM)
                    .build()
                    .map_err(|e| GearchatError::Evaluation(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|e| GearchatError::Evaluation(e.to_string()))?
                    .into(),
            ])
            .max_completion_tokens(10u32)
            .build()
            .map_err(|e| GearchatError::Evaluation(e.to_string()))?;

        let reply = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| GearchatError::OpenAI(format!("Judge API error: {}", e)))?;

        let text = reply
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        parse_rating(&text).ok_or_else(|| {
            GearchatError::Evaluation(format!("judge returned no 1-5 rating: {:?}", text))
        })
    }
}

/// Extract the first 1-5 rating digit from judge output.
fn parse_rating(text: &str) -> Option<f64> {
    text.chars()
        .find(|c| ('1'..='5').contains(c))
        .and_then(|c| c.to_digit(10))
        .map(|d| d as f64)
}
