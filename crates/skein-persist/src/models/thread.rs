use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{ContextSize, ThreadMessageRecord, ThreadUsage};

/// Bumped when the shape of `ThreadRecord` itself changes in a breaking way.
pub const THREAD_SCHEMA_VERSION: u32 = 1;

/// Bumped when the shape of the stored `ModelMessage` payload changes.
pub const CONTENT_SCHEMA_VERSION: u32 = 1;

/// Persisted model/provider selection for a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelection {
    pub provider_id: String,
    pub model_id: String,
    pub reasoning_budget: String,
}

/// The root object written to each `thread.<id>.json` file.
///
/// - `history` is the append-only log of every message ever saved.
/// - `active_history` is what gets sent to the model next; it equals
///   `history` until the first compaction and can always be rebuilt from it.
/// - `context_size` is aggregated from `active_history`, `usage` from
///   `history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    pub schema_version: u32,
    pub content_schema_version: u32,
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_selection: Option<ModelSelection>,

    pub history: Vec<ThreadMessageRecord>,
    pub active_history: Vec<ThreadMessageRecord>,
    pub last_compaction_ordinal: Option<u64>,
    pub context_size: ContextSize,
    pub usage: ThreadUsage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ThreadRecord {
    /// A freshly created thread with no history
    pub fn empty(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            schema_version: THREAD_SCHEMA_VERSION,
            content_schema_version: CONTENT_SCHEMA_VERSION,
            id: id.into(),
            user_id: None,
            title: None,
            model_selection: None,
            history: Vec::new(),
            active_history: Vec::new(),
            last_compaction_ordinal: None,
            context_size: ContextSize::default(),
            usage: ThreadUsage::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Ordinal of the newest entry in `history`, if any
    pub fn last_ordinal(&self) -> Option<u64> {
        self.history.last().map(|record| record.ordinal)
    }

    /// Ordinal the next appended message will receive
    pub fn next_ordinal(&self) -> u64 {
        self.last_ordinal().map_or(1, |ordinal| ordinal + 1)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
