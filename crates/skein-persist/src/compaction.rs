//! Context window compaction.
//!
//! When the active window plus the reserved output budget no longer fits the
//! model's context, the whole active window is replaced by one summary
//! record produced by a caller-supplied [`HistorySummarizer`]. `history` is
//! never touched, so compaction can always be undone with
//! `rebuild_active_history`.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skein_types::{MessageContent, ModelMessage, RawPart};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PersistError, Result};
use crate::models::{ThreadMessageRecord, ThreadRecord, ThreadUsage};
use crate::usage::aggregate_context_size;

/// Used when the summarizer returns nothing readable.
pub const EMPTY_SUMMARY_TEXT: &str = "Conversation summary.";

/// Token budget that triggers compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionPolicy {
    pub max_context_tokens: u64,
    pub reserved_output_tokens: u64,
}

impl CompactionPolicy {
    pub fn new(max_context_tokens: u64) -> Self {
        Self {
            max_context_tokens,
            reserved_output_tokens: 0,
        }
    }

    pub fn with_reserved_output_tokens(mut self, tokens: u64) -> Self {
        self.reserved_output_tokens = tokens;
        self
    }
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self::new(30_000)
    }
}

/// Turns a thread's history into a single message that replaces the active
/// window.
///
/// Any `Fn(Vec<ThreadMessageRecord>) -> impl Future<Output = anyhow::Result<ModelMessage>>`
/// closure works as a summarizer.
///
/// The summarizer runs while the store holds the thread's lock and its
/// listing barrier. It must not write to the thread being compacted, and
/// writes to other threads of the same store can stall behind a queued
/// `list_threads` until the summary returns.
#[async_trait]
pub trait HistorySummarizer: Send + Sync {
    async fn summarize(&self, history: &[ThreadMessageRecord]) -> anyhow::Result<ModelMessage>;
}

#[async_trait]
impl<F, Fut> HistorySummarizer for F
where
    F: Fn(Vec<ThreadMessageRecord>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ModelMessage>> + Send + 'static,
{
    async fn summarize(&self, history: &[ThreadMessageRecord]) -> anyhow::Result<ModelMessage> {
        self(history.to_vec()).await
    }
}

pub struct CompactThreadOptions<'a> {
    pub policy: CompactionPolicy,
    pub summarizer: &'a dyn HistorySummarizer,
    /// Timestamp for the summary record and `updated_at`; defaults to now
    pub now: Option<DateTime<Utc>>,
}

impl<'a> CompactThreadOptions<'a> {
    pub fn new(policy: CompactionPolicy, summarizer: &'a dyn HistorySummarizer) -> Self {
        Self {
            policy,
            summarizer,
            now: None,
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompactThreadResult {
    pub did_compact: bool,
    pub thread: ThreadRecord,
}

/// True when the active window plus reserved output exceeds the budget.
pub fn should_compact(thread: &ThreadRecord, policy: &CompactionPolicy) -> bool {
    let active_tokens = aggregate_context_size(&thread.active_history).total();
    active_tokens.saturating_add(policy.reserved_output_tokens) > policy.max_context_tokens
}

/// Compacts `thread` in memory if the policy says so. Persisting is the
/// caller's job.
pub async fn compact_if_needed(
    mut thread: ThreadRecord,
    options: CompactThreadOptions<'_>,
) -> Result<CompactThreadResult> {
    if !should_compact(&thread, &options.policy) {
        debug!(thread_id = %thread.id, "Context within budget, skipping compaction");
        return Ok(CompactThreadResult {
            did_compact: false,
            thread,
        });
    }

    let summary = options
        .summarizer
        .summarize(&thread.history)
        .await
        .map_err(|e| PersistError::summarization(thread.id.clone(), e))?;

    let now = options.now.unwrap_or_else(Utc::now);
    let summary_record = ThreadMessageRecord {
        id: Uuid::new_v4().to_string(),
        ordinal: 1,
        version: 1,
        message: ModelMessage::user(summary_text(&summary.content)),
        usage: ThreadUsage::default(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
        error: None,
    };

    let absorbed = thread.active_history.len();
    thread.active_history = vec![summary_record];
    thread.last_compaction_ordinal = thread.last_ordinal();
    thread.context_size = aggregate_context_size(&thread.active_history);
    thread.updated_at = now;

    info!(
        thread_id = %thread.id,
        absorbed,
        last_compaction_ordinal = ?thread.last_compaction_ordinal,
        "Compacted thread context"
    );

    Ok(CompactThreadResult {
        did_compact: true,
        thread,
    })
}

/// Flattens summarizer output into the plain text stored in the summary
/// record.
pub fn summary_text(content: &MessageContent) -> String {
    let parts = match content {
        MessageContent::Text(text) => return text.clone(),
        MessageContent::Parts(parts) => parts,
    };

    let text = parts
        .iter()
        .map(part_text)
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();

    if text.is_empty() {
        EMPTY_SUMMARY_TEXT.to_string()
    } else {
        text.to_string()
    }
}

fn part_text(part: &RawPart) -> String {
    if let Some(text) = part.get("text").and_then(Value::as_str) {
        return text.to_string();
    }

    let tool_name = part.get("toolName").and_then(Value::as_str).unwrap_or_default();
    match part.get("type").and_then(Value::as_str) {
        Some("tool-call") => format!(
            "Tool call {}: {}",
            tool_name,
            json_text(part.get("input"))
        ),
        Some("tool-result") => format!(
            "Tool result {}: {}",
            tool_name,
            json_text(part.get("output"))
        ),
        _ => serde_json::to_string(part).unwrap_or_default(),
    }
}

fn json_text(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_else(|| "null".to_string())
}
