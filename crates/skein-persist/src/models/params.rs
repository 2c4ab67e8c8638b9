use chrono::{DateTime, Utc};
use skein_types::ModelMessage;

use super::thread::ModelSelection;

/// Options for `create_thread`. Everything is optional.
#[derive(Debug, Clone, Default)]
pub struct CreateThreadParams {
    /// Deterministic id instead of a random UUID
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub model_selection: Option<ModelSelection>,
    /// Override the creation timestamp (useful in tests)
    pub created_at: Option<DateTime<Utc>>,
}

impl CreateThreadParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_model_selection(mut self, selection: ModelSelection) -> Self {
        self.model_selection = Some(selection);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Usage reported by the caller for one message.
///
/// When `total_cost_usd` is `None` the store asks its pricing calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MessageUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_duration_ms: u64,
    pub total_cost_usd: Option<f64>,
}

impl MessageUsage {
    pub fn new(input_tokens: u64, output_tokens: u64, total_duration_ms: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_duration_ms,
            total_cost_usd: None,
        }
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.total_cost_usd = Some(cost_usd);
        self
    }
}

/// Payload required to append a message to an existing thread
#[derive(Debug, Clone)]
pub struct SaveThreadMessageParams {
    /// Deterministic record id instead of a random UUID
    pub id: Option<String>,
    /// Persisted verbatim
    pub message: ModelMessage,
    /// Handed to the pricing calculator
    pub model_id: Option<String>,
    pub usage: MessageUsage,
    pub error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SaveThreadMessageParams {
    pub fn new(message: ModelMessage, usage: MessageUsage) -> Self {
        Self {
            id: None,
            message,
            model_id: None,
            usage,
            error: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListThreadsOptions {
    pub include_deleted: bool,
    pub user_id: Option<String>,
}

impl ListThreadsOptions {
    pub fn include_deleted() -> Self {
        Self {
            include_deleted: true,
            user_id: None,
        }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            include_deleted: false,
            user_id: Some(user_id.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SoftDeleteOptions {
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RebuildOptions {
    pub now: Option<DateTime<Utc>>,
}

/// New payload for an existing record, matched by record id
#[derive(Debug, Clone)]
pub struct MessageReplacement {
    pub record_id: String,
    pub message: ModelMessage,
}

impl MessageReplacement {
    pub fn new(record_id: impl Into<String>, message: ModelMessage) -> Self {
        Self {
            record_id: record_id.into(),
            message,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplaceThreadMessagesParams {
    pub messages: Vec<MessageReplacement>,
    pub now: Option<DateTime<Utc>>,
}

/// Thread metadata update.
///
/// `model_selection: Some(None)` clears the stored selection, `None` leaves it
/// alone.
#[derive(Debug, Clone, Default)]
pub struct UpdateThreadSettingsParams {
    pub title: Option<String>,
    pub model_selection: Option<Option<ModelSelection>>,
    pub now: Option<DateTime<Utc>>,
}
