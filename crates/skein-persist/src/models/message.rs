use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skein_types::ModelMessage;

/// Accumulated token counts and cost for a single message or a whole thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_duration_ms: u64,
    pub total_cost_usd: f64,
}

/// Token footprint of the active context window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSize {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

impl ContextSize {
    pub fn total(&self) -> u64 {
        self.total_input_tokens.saturating_add(self.total_output_tokens)
    }
}

/// One persisted turn of a thread.
///
/// `ordinal` is assigned at append time and never reused. `version` starts at
/// 1 and is bumped whenever the record is mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessageRecord {
    pub id: String,
    pub ordinal: u64,
    pub version: u32,
    pub message: ModelMessage,
    pub usage: ThreadUsage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ThreadMessageRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
