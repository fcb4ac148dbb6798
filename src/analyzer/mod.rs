//! Conversation analysis via a generative-language model.
//!
//! Defines the [`TextModel`] trait (the model collaborator contract), the
//! sales-assistant prompt builder, and the [`Analyzer`] boundary that
//! wraps any underlying failure into a single [`AnalysisError`].
//!
//! One provider is implemented: [`gemini::GeminiModel`] — the Gemini
//! `generateContent` API.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod gemini;

// ---------------------------------------------------------------------------
// Caller-supplied input
// ---------------------------------------------------------------------------

/// One chat turn as supplied by the caller. Narrower than the fetched
/// model: no sender identifier, no derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInput {
    /// Raw message body.
    pub message: String,
    /// Display name of the sender.
    pub sender: String,
    /// Provider-native timestamp string.
    pub created_time: String,
}

/// A conversation to analyze: thread id plus ordered messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationInput {
    /// Thread identifier, echoed into the prompt transcript.
    pub conversation_id: String,
    /// Messages in chronological order.
    pub messages: Vec<MessageInput>,
}

/// The model's free-text analysis, returned verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Unparsed analysis paragraph from the model.
    pub analysis: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by model collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// HTTP transport failure, including timeout expiry.
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match the expected schema.
    #[error("model response parse error: {0}")]
    Parse(String),
    /// Upstream model API responded with an error status.
    #[error("model API returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
    /// The model cannot be called with the current configuration.
    #[error("model unavailable: {0}")]
    Unavailable(String),
}

/// Failure analyzing a conversation.
///
/// Deliberate catch-all boundary: prompt-assembly and model-invocation
/// failures of every kind collapse into this one shape, carrying the
/// underlying cause's message for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Any failure composing the prompt or invoking the model.
    #[error("error analyzing messages: {0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// Model contract
// ---------------------------------------------------------------------------

/// Generative-language model collaborator.
///
/// One prompt in, one text completion out. No streaming, no multi-turn
/// context. Implementations must be `Send + Sync`.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate a completion for a single prompt.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] on API, network, or parse failure.
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;

    /// The model identifier this collaborator is instantiated for.
    fn model_id(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Prompt builder
// ---------------------------------------------------------------------------

/// Build the sales-assistant analysis prompt.
///
/// Colloquial Egyptian Arabic, asking for one short, dense paragraph:
/// subscription verdict (keyword or clear intent, weighed against when it
/// happened), core interests, upsell or conversion strategy, next action,
/// and an opening message isolated on its own line so it can be extracted
/// mechanically. The current date (ISO `YYYY-MM-DD`) and the serialized
/// transcript are embedded in the body.
///
/// # Errors
///
/// Returns a serialization error if the transcript cannot be rendered.
pub fn build_prompt(
    conversation: &ConversationInput,
    today: NaiveDate,
) -> Result<String, serde_json::Error> {
    let transcript = serde_json::to_string_pretty(conversation)?;
    let date = today.format("%Y-%m-%d");

    Ok(format!(
        r#"أنت مساعد مبيعات شاطر. حلّل المحادثة وطلع لنا فقرة قصيرة بس دسمة، فيها:

1. هل الزبون اشترك؟ (دقق في كلمة "وصل" أو أي نية واضحة) وخد بالك من وقت الاشتراك عشان نعرف هل هو خلص ولا لسه مستمر
2. إيه اهتماماته أو مخاوفه الأساسية؟
3. لو اشترك: إزاي نبيع له أكتر؟
4. لو لسه: إزاي نقنعه يشترك؟
5. الخطوة اللي لازم وكيل المبيعات يعملها بعد كده
6. رسالة تبدأ بيها الكلام مع الزبون (حطها في سطر لوحدها)

اكتب بالعامية، خلي أسلوبك سلس ومبدع، وخد بالك من توقيت الرسائل عشان نوصل في الوقت الصح.

تاريخ النهاردة : {date}
المحادثة:
{transcript}
"#
    ))
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Composes the analysis prompt and invokes the model collaborator.
///
/// Strictly success-or-fail: no partial or degraded response exists.
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn TextModel>,
}

impl Analyzer {
    /// Create an analyzer over a model collaborator.
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Analyze a conversation using today's calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] wrapping any underlying failure.
    pub async fn analyze(
        &self,
        conversation: &ConversationInput,
    ) -> Result<AnalysisResult, AnalysisError> {
        let today = chrono::Local::now().date_naive();
        self.analyze_on(conversation, today).await
    }

    /// Analyze a conversation as of an explicit date (deterministic for
    /// testing).
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] wrapping any underlying failure.
    pub async fn analyze_on(
        &self,
        conversation: &ConversationInput,
        today: NaiveDate,
    ) -> Result<AnalysisResult, AnalysisError> {
        let prompt = build_prompt(conversation, today)
            .map_err(|e| AnalysisError::Failed(e.to_string()))?;

        tracing::debug!(
            conversation_id = %conversation.conversation_id,
            model = %self.model.model_id(),
            "requesting conversation analysis"
        );

        let analysis = self
            .model
            .generate(&prompt)
            .await
            .map_err(|e| AnalysisError::Failed(e.to_string()))?;

        Ok(AnalysisResult { analysis })
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("model", &self.model.model_id())
            .finish()
    }
}
