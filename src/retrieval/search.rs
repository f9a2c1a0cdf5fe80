//! Hosted search index retriever.

use super::Retriever;
use crate::chat::{last_user_query, Context, Document, Message, MessageContent, Role, GROUNDING_DATA_KEY};
use crate::config::{IntentPrompt, Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{GearchatError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Search API version pinned for the index queries.
const SEARCH_API_VERSION: &str = "2024-07-01";

/// Output budget for the intent-rewrite call; intents are one short query.
const INTENT_MAX_TOKENS: u32 = 100;

/// Retrieves product documents from a hosted search index.
///
/// A turn is retrieved in three steps: rewrite the conversation into a
/// search intent with a small chat-model call, embed the intent, then run
/// a hybrid text+vector query against the index. Any failure along the way
/// is terminal for the turn.
pub struct SearchRetriever {
    http: reqwest::Client,
    openai: async_openai::Client<OpenAIConfig>,
    embedder: Arc<dyn Embedder>,
    endpoint: String,
    index: String,
    api_key: String,
    top_k: usize,
    intent_model: String,
    intent_prompt: IntentPrompt,
}

impl SearchRetriever {
    /// Create a retriever from settings.
    ///
    /// Fails at startup when the search endpoint or API key is missing.
    pub fn new(settings: &Settings, intent_prompt: IntentPrompt) -> Result<Self> {
        if settings.search.endpoint.is_empty() {
            return Err(GearchatError::Config(
                "search.endpoint is not configured".to_string(),
            ));
        }
        let api_key = settings.search_api_key()?;
        let timeout = Duration::from_secs(settings.chat.request_timeout_seconds);

        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(GearchatError::Http)?,
            openai: create_client_with_timeout(timeout),
            embedder: Arc::new(OpenAIEmbedder::with_config(
                &settings.embedding.model,
                settings.embedding.dimensions as usize,
            )),
            endpoint: settings.search.endpoint.trim_end_matches('/').to_string(),
            index: settings.search.index.clone(),
            api_key,
            top_k: settings.search.top_k,
            intent_model: settings.search.intent_model.clone(),
            intent_prompt,
        })
    }

    /// Rewrite the conversation into a single search query.
    async fn map_intent(&self, history: &[Message], query: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("conversation".to_string(), conversation_transcript(history));
        vars.insert("query".to_string(), query.to_string());

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.intent_model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(self.intent_prompt.system.as_str())
                    .build()
                    .map_err(|e| GearchatError::Retrieval(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(Prompts::render(&self.intent_prompt.user, &vars))
                    .build()
                    .map_err(|e| GearchatError::Retrieval(e.to_string()))?
                    .into(),
            ])
            .max_completion_tokens(INTENT_MAX_TOKENS)
            .build()
            .map_err(|e| GearchatError::Retrieval(e.to_string()))?;

        let response = self
            .openai
            .chat()
            .create(request)
            .await
            .map_err(|e| GearchatError::Retrieval(format!("intent mapping failed: {}", e)))?;

        let intent = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let intent = intent.trim();

        // A model that returns nothing still leaves us with the raw query.
        if intent.is_empty() {
            Ok(query.to_string())
        } else {
            Ok(intent.to_string())
        }
    }

    /// Run the hybrid query against the index.
    async fn query_index(&self, intent: &str, vector: Vec<f32>) -> Result<Vec<Document>> {
        let url = format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index, SEARCH_API_VERSION
        );

        let body = SearchRequest {
            search: intent.to_string(),
            top: self.top_k,
            select: "id,title,content,imagepath".to_string(),
            vector_queries: vec![VectorQuery {
                kind: "vector".to_string(),
                vector,
                k: self.top_k,
                fields: "contentVector".to_string(),
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GearchatError::Retrieval(format!("search request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| GearchatError::Retrieval(format!("search request rejected: {}", e)))?;

        let results: SearchResponse = response
            .json()
            .await
            .map_err(|e| GearchatError::Retrieval(format!("malformed search response: {}", e)))?;

        Ok(results.value.into_iter().map(Document::from).collect())
    }
}

#[async_trait]
impl Retriever for SearchRetriever {
    #[instrument(skip(self, history, context), fields(history_len = history.len()))]
    async fn retrieve(&self, history: &[Message], context: &mut Context) -> Result<Vec<Document>> {
        let query = last_user_query(history).ok_or_else(|| {
            GearchatError::InvalidInput("conversation has no user query".to_string())
        })?;

        let intent = self.map_intent(history, query).await?;
        debug!(intent = %intent, "mapped search intent");

        let vector = self.embedder.embed(&intent).await?;
        let documents = self.query_index(&intent, vector).await?;
        info!("search returned {} document(s)", documents.len());

        context.insert(
            GROUNDING_DATA_KEY.to_string(),
            serde_json::to_value(&documents)?,
        );

        Ok(documents)
    }
}

/// Flatten the conversation for the intent prompt; image parts are skipped.
fn conversation_transcript(history: &[Message]) -> String {
    history
        .iter()
        .filter(|m| m.role != Role::System)
        .filter_map(|m| match &m.content {
            MessageContent::Text(text) => {
                let speaker = match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => unreachable!(),
                };
                Some(format!("{}: {}", speaker, text))
            }
            MessageContent::Parts(_) => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    search: String,
    top: usize,
    select: String,
    vector_queries: Vec<VectorQuery>,
}

#[derive(Debug, Serialize)]
struct VectorQuery {
    kind: String,
    vector: Vec<f32>,
    k: usize,
    fields: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    imagepath: Option<String>,
}

impl From<SearchHit> for Document {
    fn from(hit: SearchHit) -> Self {
        Document {
            id: hit.id,
            title: hit.title,
            text: hit.content,
            imagepath: hit.imagepath.filter(|p| !p.is_empty()),
        }
    }
}
