//! Conversation model and normalization.
//!
//! Turns the raw Graph API conversations payload into an ordered list of
//! [`Conversation`]s, resolving the customer's display name and scanning
//! for a subscription event along the way.
//!
//! Normalization is a pure function of its input: no I/O, deterministic,
//! and every input message appears in the output exactly once.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display name used when no non-owner sender appears in a thread.
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

// ---------------------------------------------------------------------------
// Normalized model
// ---------------------------------------------------------------------------

/// One chat turn, as exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Provider identifier of the sender.
    pub user_id: String,
    /// Provider-native timestamp string, not reparsed.
    pub created_time: String,
    /// Raw message body.
    pub message: String,
    /// Display name of the sender.
    pub sender: String,
}

/// One chat thread with its resolved customer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Provider-assigned thread identifier.
    pub conversation_id: String,
    /// Resolved customer display name, or [`UNKNOWN_CUSTOMER`] when every
    /// sender is the page owner. Never equals the owner name.
    pub conversation_name: String,
    /// `created_time` of a keyword-matching message, if any.
    pub subscription_date: Option<String>,
    /// Messages in provider order (assumed chronological).
    pub messages: Vec<Message>,
}

// ---------------------------------------------------------------------------
// Wire schema (Graph API conversations envelope)
// ---------------------------------------------------------------------------

/// Top-level conversations listing payload.
///
/// Lenient where the provider is allowed to omit collections, strict on
/// per-message fields: a message without `message`, `from`, or
/// `created_time` fails the whole decode.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    data: Vec<RawConversation>,
}

#[derive(Debug, Deserialize)]
struct RawConversation {
    id: String,
    #[serde(default)]
    messages: RawMessageList,
}

#[derive(Debug, Default, Deserialize)]
struct RawMessageList {
    #[serde(default)]
    data: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    message: String,
    from: RawSender,
    created_time: String,
}

#[derive(Debug, Deserialize)]
struct RawSender {
    name: String,
    id: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while normalizing a provider payload.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// The payload did not match the expected conversations schema.
    /// No partial-record recovery: one bad message fails the request.
    #[error("malformed conversations payload: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Normalize a raw conversations payload into ordered [`Conversation`]s.
///
/// Per thread, in provider order:
/// - the first message whose sender differs from `page_owner` names the
///   conversation; later non-owner senders do not override it;
/// - every message whose text contains `subscription_keyword`
///   (case-folded) sets the subscription date, so the last match in
///   iteration order wins.
///
/// # Errors
///
/// Returns [`NormalizeError::Malformed`] when a message record lacks
/// `message`, `from`, or `created_time`.
pub fn normalize(
    payload: &Value,
    page_owner: &str,
    subscription_keyword: &str,
) -> Result<Vec<Conversation>, NormalizeError> {
    let envelope =
        RawEnvelope::deserialize(payload).map_err(|e| NormalizeError::Malformed(e.to_string()))?;

    let keyword = subscription_keyword.to_lowercase();

    let conversations = envelope
        .data
        .into_iter()
        .map(|raw| normalize_thread(raw, page_owner, &keyword))
        .collect();

    Ok(conversations)
}

fn normalize_thread(raw: RawConversation, page_owner: &str, keyword: &str) -> Conversation {
    let mut conversation_name: Option<String> = None;
    let mut subscription_date: Option<String> = None;
    let mut messages = Vec::with_capacity(raw.messages.data.len());

    for msg in raw.messages.data {
        if msg.from.name != page_owner && conversation_name.is_none() {
            conversation_name = Some(msg.from.name.clone());
        }
        if msg.message.to_lowercase().contains(keyword) {
            subscription_date = Some(msg.created_time.clone());
        }
        messages.push(Message {
            user_id: msg.from.id,
            created_time: msg.created_time,
            message: msg.message,
            sender: msg.from.name,
        });
    }

    Conversation {
        conversation_id: raw.id,
        conversation_name: conversation_name
            .unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
        subscription_date,
        messages,
    }
}
