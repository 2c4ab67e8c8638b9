use async_trait::async_trait;

use crate::compaction::{CompactThreadOptions, CompactThreadResult};
use crate::error::Result;
use crate::models::{
    CreateThreadParams, ListThreadsOptions, RebuildOptions, ReplaceThreadMessagesParams,
    SaveThreadMessageParams, SoftDeleteOptions, ThreadRecord, UpdateThreadSettingsParams,
};

/// Durable storage for conversation threads.
///
/// A thread that does not exist is reported as `None` (or `false`), never as
/// an error. Thread ids outside `[A-Za-z0-9_-]+` are rejected with
/// `INVALID_STATE` before any storage access.
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Create and persist an empty thread
    async fn create_thread(&self, params: CreateThreadParams) -> Result<ThreadRecord>;

    /// Get a thread by id, after any queued mutation of it has finished
    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>>;

    /// All threads, most recently updated first
    async fn list_threads(&self, options: ListThreadsOptions) -> Result<Vec<ThreadRecord>>;

    /// Append one message to `history` and `active_history`
    async fn save_message(
        &self,
        thread_id: &str,
        params: SaveThreadMessageParams,
    ) -> Result<Option<ThreadRecord>>;

    /// Replace the payload of existing messages, matched by record id
    async fn replace_messages(
        &self,
        thread_id: &str,
        params: ReplaceThreadMessagesParams,
    ) -> Result<Option<ThreadRecord>>;

    /// Mark one message deleted and drop it from every rollup
    async fn soft_delete_message(
        &self,
        thread_id: &str,
        message_id: &str,
        options: SoftDeleteOptions,
    ) -> Result<Option<ThreadRecord>>;

    /// Mark a thread deleted. Returns `false` only if it does not exist.
    async fn soft_delete_thread(&self, thread_id: &str, options: SoftDeleteOptions)
        -> Result<bool>;

    /// Reset `active_history` to the non-deleted `history`
    async fn rebuild_active_history(
        &self,
        thread_id: &str,
        options: RebuildOptions,
    ) -> Result<Option<ThreadRecord>>;

    /// Summarize the active window if it no longer fits the policy budget
    async fn compact_if_needed(
        &self,
        thread_id: &str,
        options: CompactThreadOptions<'_>,
    ) -> Result<Option<CompactThreadResult>>;

    /// Update title and/or model selection
    async fn update_thread_settings(
        &self,
        thread_id: &str,
        params: UpdateThreadSettingsParams,
    ) -> Result<Option<ThreadRecord>>;

    /// Recompute `usage` from `history`
    async fn update_thread_usage(&self, thread_id: &str) -> Result<Option<ThreadRecord>>;

    /// Recompute `context_size` from `active_history`
    async fn update_context_size(&self, thread_id: &str) -> Result<Option<ThreadRecord>>;
}
