//! Conversation engine: one grounded turn at a time.

use super::{
    append_image_message, CompletionClient, Context, ConversationHistory, Message,
    OpenAiCompletion, PromptAssembler,
};
use crate::config::{Prompts, Settings};
use crate::error::{GearchatError, Result};
use crate::retrieval::{Retriever, SearchRetriever};
use std::sync::Arc;
use tracing::{info, instrument};

/// Result of one successful conversation turn.
#[derive(Debug, Clone)]
pub struct Turn {
    /// The assistant's reply.
    pub message: Message,
    /// Carry-forward context for the next turn.
    pub context: Context,
}

/// Orchestrates a grounded chat turn: retrieve, assemble, attach images,
/// complete, then commit to history.
///
/// The engine itself is stateless; callers own the history/context pair,
/// one per session. The user message is staged and only committed to
/// history together with the assistant reply once the upstream call
/// succeeds, so a failed turn leaves history unchanged.
pub struct ChatEngine {
    retriever: Arc<dyn Retriever>,
    assembler: PromptAssembler,
    completion: Arc<dyn CompletionClient>,
}

impl ChatEngine {
    /// Build the production engine from settings.
    ///
    /// Loads the prompt assets and wires up the search retriever and the
    /// OpenAI completion client. Fails fast on a missing template asset or
    /// an absent search API key.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(&settings.asset_dir())?;
        let retriever = SearchRetriever::new(settings, prompts.intent.clone())?;

        Ok(Self {
            retriever: Arc::new(retriever),
            assembler: PromptAssembler::new(prompts.grounded),
            completion: Arc::new(OpenAiCompletion::new(&settings.chat)),
        })
    }

    /// Build an engine from explicit components.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        assembler: PromptAssembler,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            retriever,
            assembler,
            completion,
        }
    }

    /// Run one conversation turn.
    ///
    /// On success the user message and the assistant reply are appended to
    /// `history` (exactly two new entries) and the updated context is
    /// returned. On failure `history` is left untouched and the error
    /// surfaces to the caller; no retry is attempted.
    #[instrument(skip(self, history, context), fields(history_len = history.len()))]
    pub async fn converse(
        &self,
        query: &str,
        history: &mut ConversationHistory,
        mut context: Context,
    ) -> Result<Turn> {
        if query.trim().is_empty() {
            return Err(GearchatError::InvalidInput("empty query".to_string()));
        }

        // Stage the user message; it is committed only once the turn succeeds.
        let staged = Message::user(query);
        let mut working: Vec<Message> = history.clone();
        working.push(staged.clone());

        let documents = self.retriever.retrieve(&working, &mut context).await?;
        info!("retrieved {} grounding document(s)", documents.len());

        let mut messages = self.assembler.assemble(&documents, &context);
        messages.extend(working);
        append_image_message(&mut messages, &documents)?;

        let assistant = self.completion.complete(&messages).await?;

        history.push(staged);
        history.push(assistant.clone());

        Ok(Turn {
            message: assistant,
            context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ContentPart, Document, MessageContent, Role, GROUNDING_DATA_KEY};
    use crate::config::GroundedChatPrompt;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Retriever returning a fixed document set and recording grounding data.
    struct StaticRetriever {
        documents: Vec<Document>,
    }

    #[async_trait]
    impl Retriever for StaticRetriever {
        async fn retrieve(
            &self,
            _history: &[Message],
            context: &mut Context,
        ) -> Result<Vec<Document>> {
            context.insert(
                GROUNDING_DATA_KEY.to_string(),
                serde_json::to_value(&self.documents)?,
            );
            Ok(self.documents.clone())
        }
    }

    /// Completion client capturing the assembled messages.
    struct RecordingCompleter {
        seen: Mutex<Vec<Vec<Message>>>,
        fail: bool,
    }

    impl RecordingCompleter {
        fn new(fail: bool) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl CompletionClient for RecordingCompleter {
        async fn complete(&self, messages: &[Message]) -> Result<Message> {
            self.seen.lock().unwrap().push(messages.to_vec());
            if self.fail {
                return Err(GearchatError::Completion("upstream rejected".to_string()));
            }
            Ok(Message::assistant("The TrailMaster X4 fits 4 people."))
        }
    }

    fn text_doc() -> Document {
        Document {
            id: "1".to_string(),
            title: "TrailMaster X4 Tent".to_string(),
            text: "A waterproof tent that sleeps four.".to_string(),
            imagepath: None,
        }
    }

    fn engine(documents: Vec<Document>, fail: bool) -> (ChatEngine, Arc<RecordingCompleter>) {
        let completer = Arc::new(RecordingCompleter::new(fail));
        let engine = ChatEngine::new(
            Arc::new(StaticRetriever { documents }),
            PromptAssembler::new(GroundedChatPrompt::default()),
            completer.clone(),
        );
        (engine, completer)
    }

    #[tokio::test]
    async fn test_successful_turn_appends_two_messages() {
        let (engine, _) = engine(vec![text_doc()], false);
        let mut history = ConversationHistory::new();

        let turn = engine
            .converse("I need a new tent for 4 people", &mut history, Context::new())
            .await
            .unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1], turn.message);
        assert!(turn.message.content.as_text().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_unchanged() {
        let (engine, _) = engine(vec![text_doc()], true);
        let mut history = vec![Message::user("earlier"), Message::assistant("reply")];

        let err = engine
            .converse("another question", &mut history, Context::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GearchatError::Completion(_)));
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_text_only_turn_has_no_image_message() {
        let (engine, completer) = engine(vec![text_doc()], false);
        let mut history = ConversationHistory::new();

        let turn = engine
            .converse("I need a new tent for 4 people", &mut history, Context::new())
            .await
            .unwrap();

        // One system message plus the staged user message, nothing trailing.
        let seen = completer.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][1].role, Role::User);

        // Context carries only what the retriever recorded.
        assert!(turn.context.contains_key(GROUNDING_DATA_KEY));
        assert_eq!(turn.context.len(), 1);
    }

    #[tokio::test]
    async fn test_image_document_adds_one_trailing_message() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("tent.jpg");
        std::fs::write(&image, b"\xff\xd8fake").unwrap();

        let mut doc = text_doc();
        doc.imagepath = Some(image.to_string_lossy().into_owned());
        let (engine, completer) = engine(vec![doc], false);

        engine
            .converse(
                "I need a new tent for 4 people",
                &mut ConversationHistory::new(),
                Context::new(),
            )
            .await
            .unwrap();

        let seen = completer.seen.lock().unwrap();
        let messages = &seen[0];
        assert_eq!(messages.len(), 3);
        let trailing = messages.last().unwrap();
        assert_eq!(trailing.role, Role::User);
        let MessageContent::Parts(parts) = &trailing.content else {
            panic!("trailing message should carry content parts");
        };
        assert_eq!(parts.len(), 1);
        assert!(matches!(parts[0], ContentPart::ImageUrl { .. }));
    }

    #[tokio::test]
    async fn test_context_threads_between_turns() {
        let (engine, _) = engine(vec![text_doc()], false);
        let mut history = ConversationHistory::new();

        let first = engine
            .converse("I need a new tent for 4 people", &mut history, Context::new())
            .await
            .unwrap();
        let second = engine
            .converse("does it come with a rainfly?", &mut history, first.context.clone())
            .await
            .unwrap();

        // The retriever rewrites grounding_data; everything else carries over.
        assert_eq!(first.context, second.context);
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let (engine, _) = engine(vec![], false);
        let err = engine
            .converse("   ", &mut ConversationHistory::new(), Context::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GearchatError::InvalidInput(_)));
    }
}
