//! Chat relay: send a prompt to the assistant, then save whatever
//! structured items it hands back.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::{AiReply, ApiError, PlannerStore, Resource};

const FALLBACK_REPLY: &str = "🤖 I didn't understand that. Try again!";
const GENERIC_FAILURE: &str = "⚠️ Something went wrong. Try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    Saved,
    Failed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub text: String,
}

/// Chat history for one session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
}

impl Transcript {
    pub fn push(&mut self, role: ChatRole, text: impl Into<String>) {
        self.entries.push(ChatEntry {
            role,
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries appended since `from`.
    pub fn since(&self, from: usize) -> &[ChatEntry] {
        self.entries.get(from..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub saved: usize,
    pub failed: usize,
    pub ai_failed: bool,
}

/// Title or text of a structured item, for echoing back in the transcript.
fn item_label(item: &Value) -> &str {
    item.get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| item.get("text").and_then(Value::as_str))
        .unwrap_or("(untitled)")
}

fn structured_lists(reply: &AiReply) -> [(Resource, Option<&Vec<Value>>); 4] {
    [
        (Resource::Tasks, reply.tasks.as_ref().and_then(Value::as_array)),
        (Resource::Goals, reply.goals.as_ref().and_then(Value::as_array)),
        (Resource::Lessons, reply.lessons.as_ref().and_then(Value::as_array)),
        (Resource::Schedule, reply.schedule.as_ref().and_then(Value::as_array)),
    ]
}

fn failure_text(err: &ApiError) -> String {
    match err {
        ApiError::Status { body, .. } if !body.is_empty() => format!("⚠️ Error: {}", body),
        _ => GENERIC_FAILURE.to_string(),
    }
}

/// Send `prompt` to the assistant and fan its structured items out to
/// their collections.
///
/// A failed assistant call leaves one error entry and saves nothing. Once
/// the reply is in, every item is saved on its own; a failed save is
/// recorded and the loop moves on.
pub async fn relay<S>(store: &S, prompt: &str, transcript: &mut Transcript) -> RelaySummary
where
    S: PlannerStore + ?Sized,
{
    let mut summary = RelaySummary::default();
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return summary;
    }
    transcript.push(ChatRole::User, prompt);

    let reply = match store.ask(prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("assistant request failed: {}", e);
            transcript.push(ChatRole::Error, failure_text(&e));
            summary.ai_failed = true;
            return summary;
        }
    };

    let lists = structured_lists(&reply);
    let has_items = lists.iter().any(|(_, list)| list.is_some_and(|l| !l.is_empty()));

    match reply.reply.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(text) => transcript.push(ChatRole::Assistant, text),
        None if !has_items => transcript.push(ChatRole::Assistant, FALLBACK_REPLY),
        None => {}
    }

    for (resource, list) in lists {
        let Some(items) = list else { continue };
        for item in items {
            let label = item_label(item);
            match store.create(resource, item).await {
                Ok(()) => {
                    info!(resource = resource.path(), "saved assistant item");
                    let line = format!("✅ Saved {}: {}", resource.noun(), label);
                    transcript.push(ChatRole::Saved, line);
                    summary.saved += 1;
                }
                Err(e) => {
                    warn!(resource = resource.path(), "failed to save assistant item: {}", e);
                    let line = format!("⚠️ Failed to save {}: {}", resource.noun(), label);
                    transcript.push(ChatRole::Failed, line);
                    summary.failed += 1;
                }
            }
        }
    }

    summary
}
