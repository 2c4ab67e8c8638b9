//! File-backed [`ThreadRepository`].
//!
//! Directory layout:
//! ```text
//! {dir_path}/
//!   thread.{id}.json                 # one pretty-printed ThreadRecord per thread
//!   thread.{id}.json.{uuid}.tmp      # only while a write is in flight
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::compaction::{self, CompactThreadOptions, CompactThreadResult};
use crate::error::{PersistError, Result};
use crate::fs::ThreadFs;
use crate::models::{
    CreateThreadParams, ListThreadsOptions, RebuildOptions, ReplaceThreadMessagesParams,
    SaveThreadMessageParams, SoftDeleteOptions, ThreadMessageRecord, ThreadRecord, ThreadUsage,
    UpdateThreadSettingsParams,
};
use crate::sync::ThreadLocks;
use crate::trait_client::ThreadRepository;
use crate::usage::{
    aggregate_context_size, aggregate_thread_usage, resolve_message_cost, PricingCalculator,
};
use crate::validation::{
    ensure_thread_id, parse_thread, thread_file_name, thread_id_from_file_name, validate_thread,
};

pub const DEFAULT_THREADS_DIR: &str = ".threads";

/// What a synchronous mutation did to the thread it was handed.
enum Mutation {
    Changed,
    Unchanged,
    /// The thread exists but the record the caller asked for does not
    TargetMissing,
}

/// Stores each thread as its own JSON file below `dir_path`.
///
/// Mutations of one thread are serialized in arrival order; different
/// threads proceed concurrently. Safe for a single process only.
pub struct FileThreadStore {
    fs: Arc<dyn ThreadFs>,
    dir_path: PathBuf,
    pricing: Option<Arc<dyn PricingCalculator>>,
    locks: ThreadLocks,
}

impl FileThreadStore {
    pub fn new(fs: Arc<dyn ThreadFs>) -> Self {
        Self {
            fs,
            dir_path: PathBuf::from(DEFAULT_THREADS_DIR),
            pricing: None,
            locks: ThreadLocks::new(),
        }
    }

    /// Directory (relative to the fs root) holding the thread files
    pub fn with_dir_path(mut self, dir_path: impl Into<PathBuf>) -> Self {
        self.dir_path = dir_path.into();
        self
    }

    pub fn with_pricing_calculator(mut self, pricing: Arc<dyn PricingCalculator>) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir_path
    }

    fn thread_path(&self, thread_id: &str) -> PathBuf {
        self.dir_path.join(thread_file_name(thread_id))
    }

    async fn read_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        let path = self.thread_path(thread_id);

        let raw = match self.fs.read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistError::read(&path, e)),
        };

        let thread = parse_thread(&path, &raw).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Thread file failed validation");
            e
        })?;

        if thread.id != thread_id {
            return Err(PersistError::validation(
                &path,
                format!("File holds thread {} instead of {}", thread.id, thread_id),
            ));
        }

        Ok(Some(thread))
    }

    /// Validate, write a temp copy, overwrite the canonical file, drop the
    /// temp copy.
    async fn write_thread(&self, thread: &ThreadRecord) -> Result<()> {
        let path = self.thread_path(&thread.id);

        validate_thread(&path, thread).map_err(|e| {
            warn!(thread_id = %thread.id, error = %e, "Refusing to write invalid thread");
            e
        })?;
        let payload = serde_json::to_string_pretty(thread).map_err(|e| {
            PersistError::validation(&path, format!("Refusing to write invalid state: {}", e))
        })?;

        let temp_path = self.dir_path.join(format!(
            "{}.{}.tmp",
            thread_file_name(&thread.id),
            Uuid::new_v4()
        ));

        if let Err(e) = self.fs.write(&temp_path, &payload).await {
            self.discard_temp(&temp_path).await;
            return Err(PersistError::write(&temp_path, e));
        }
        if let Err(e) = self.fs.write(&path, &payload).await {
            self.discard_temp(&temp_path).await;
            return Err(PersistError::write(&path, e));
        }
        self.fs
            .remove(&temp_path)
            .await
            .map_err(|e| PersistError::write(&temp_path, e))?;

        debug!(thread_id = %thread.id, bytes = payload.len(), "Persisted thread");
        Ok(())
    }

    async fn discard_temp(&self, temp_path: &Path) {
        if let Err(e) = self.fs.remove(temp_path).await {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
            }
        }
    }

    /// Runs `apply` on the current state of a thread under its lock and
    /// persists the result if anything changed.
    async fn mutate<F>(
        &self,
        thread_id: &str,
        op: &'static str,
        apply: F,
    ) -> Result<Option<ThreadRecord>>
    where
        F: FnOnce(&mut ThreadRecord) -> Mutation + Send,
    {
        ensure_thread_id(thread_id)?;
        let _guard = self.locks.write(thread_id).await;

        let Some(mut thread) = self.read_thread(thread_id).await? else {
            debug!(thread_id, op, "Thread not found");
            return Ok(None);
        };

        match apply(&mut thread) {
            Mutation::Changed => {
                self.write_thread(&thread).await?;
                debug!(thread_id, op, "Thread updated");
                Ok(Some(thread))
            }
            Mutation::Unchanged => {
                debug!(thread_id, op, "Nothing to update");
                Ok(Some(thread))
            }
            Mutation::TargetMissing => {
                debug!(thread_id, op, "Target record not found");
                Ok(None)
            }
        }
    }
}

/// Recompute both cached rollups after a mutation.
fn refresh_rollups(thread: &mut ThreadRecord) {
    thread.usage = aggregate_thread_usage(&thread.history);
    thread.context_size = aggregate_context_size(&thread.active_history);
}

#[async_trait]
impl ThreadRepository for FileThreadStore {
    async fn create_thread(&self, params: CreateThreadParams) -> Result<ThreadRecord> {
        let now = params.created_at.unwrap_or_else(Utc::now);
        let thread_id = params.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        ensure_thread_id(&thread_id)?;

        let mut thread = ThreadRecord::empty(thread_id, now);
        thread.user_id = params.user_id;
        thread.title = params.title;
        thread.model_selection = params.model_selection;

        let _guard = self.locks.write(&thread.id).await;
        if self.read_thread(&thread.id).await?.is_some() {
            return Err(PersistError::invalid_state(format!(
                "Thread already exists: {}",
                thread.id
            )));
        }

        self.write_thread(&thread).await?;
        info!(thread_id = %thread.id, "Created thread");
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        ensure_thread_id(thread_id)?;
        let _guard = self.locks.read(thread_id).await;
        self.read_thread(thread_id).await
    }

    async fn list_threads(&self, options: ListThreadsOptions) -> Result<Vec<ThreadRecord>> {
        let _drain = self.locks.drain().await;

        let entries = match self.fs.read_dir(&self.dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistError::read(&self.dir_path, e)),
        };

        let mut threads = Vec::new();
        for entry in entries.iter().filter(|entry| !entry.is_dir) {
            let Some(thread_id) = thread_id_from_file_name(&entry.name) else {
                continue;
            };
            if let Some(thread) = self.read_thread(thread_id).await? {
                threads.push(thread);
            }
        }

        threads.retain(|thread| {
            (options.include_deleted || !thread.is_deleted())
                && options
                    .user_id
                    .as_deref()
                    .map_or(true, |user_id| thread.user_id.as_deref() == Some(user_id))
        });
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        debug!(count = threads.len(), "Listed threads");
        Ok(threads)
    }

    async fn save_message(
        &self,
        thread_id: &str,
        params: SaveThreadMessageParams,
    ) -> Result<Option<ThreadRecord>> {
        let pricing = self.pricing.as_deref();

        self.mutate(thread_id, "save_message", move |thread| {
            let now = params.updated_at.unwrap_or_else(Utc::now);
            let usage = ThreadUsage {
                input_tokens: params.usage.input_tokens,
                output_tokens: params.usage.output_tokens,
                total_duration_ms: params.usage.total_duration_ms,
                total_cost_usd: resolve_message_cost(
                    params.usage.total_cost_usd,
                    params.model_id.as_deref(),
                    params.usage.input_tokens,
                    params.usage.output_tokens,
                    pricing,
                ),
            };

            let record = ThreadMessageRecord {
                id: params.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                ordinal: thread.next_ordinal(),
                version: 1,
                message: params.message,
                usage,
                created_at: params.created_at.unwrap_or(now),
                updated_at: now,
                deleted_at: None,
                error: params.error,
            };

            thread.history.push(record.clone());
            thread.active_history.push(record);
            thread.updated_at = now;
            refresh_rollups(thread);
            Mutation::Changed
        })
        .await
    }

    async fn replace_messages(
        &self,
        thread_id: &str,
        params: ReplaceThreadMessagesParams,
    ) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, "replace_messages", move |thread| {
            let now = params.now.unwrap_or_else(Utc::now);
            let mut replaced = 0usize;

            for replacement in params.messages {
                for list in [&mut thread.history, &mut thread.active_history] {
                    if let Some(record) = list.iter_mut().find(|r| r.id == replacement.record_id) {
                        record.message = replacement.message.clone();
                        record.version += 1;
                        record.updated_at = now;
                        replaced += 1;
                    }
                }
            }

            if replaced == 0 {
                return Mutation::Unchanged;
            }
            thread.updated_at = now;
            refresh_rollups(thread);
            Mutation::Changed
        })
        .await
    }

    async fn soft_delete_message(
        &self,
        thread_id: &str,
        message_id: &str,
        options: SoftDeleteOptions,
    ) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, "soft_delete_message", move |thread| {
            let now = Utc::now();
            let deleted_at = options.deleted_at.unwrap_or(now);

            let Some(record) = thread.history.iter_mut().find(|r| r.id == message_id) else {
                return Mutation::TargetMissing;
            };
            if record.is_deleted() {
                return Mutation::Unchanged;
            }
            record.deleted_at = Some(deleted_at);
            record.version += 1;
            record.updated_at = now;

            thread.active_history.retain(|r| r.id != message_id);

            thread.updated_at = now;
            refresh_rollups(thread);
            info!(thread_id = %thread.id, message_id, "Soft-deleted message");
            Mutation::Changed
        })
        .await
    }

    async fn soft_delete_thread(&self, thread_id: &str, options: SoftDeleteOptions) -> Result<bool> {
        let thread = self
            .mutate(thread_id, "soft_delete_thread", move |thread| {
                if thread.is_deleted() {
                    return Mutation::Unchanged;
                }
                let now = Utc::now();
                thread.deleted_at = Some(options.deleted_at.unwrap_or(now));
                thread.updated_at = now;
                info!(thread_id = %thread.id, "Soft-deleted thread");
                Mutation::Changed
            })
            .await?;

        Ok(thread.is_some())
    }

    async fn rebuild_active_history(
        &self,
        thread_id: &str,
        options: RebuildOptions,
    ) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, "rebuild_active_history", move |thread| {
            thread.active_history = thread
                .history
                .iter()
                .filter(|record| !record.is_deleted())
                .cloned()
                .collect();
            thread.last_compaction_ordinal = None;
            thread.updated_at = options.now.unwrap_or_else(Utc::now);
            refresh_rollups(thread);
            Mutation::Changed
        })
        .await
    }

    async fn compact_if_needed(
        &self,
        thread_id: &str,
        options: CompactThreadOptions<'_>,
    ) -> Result<Option<CompactThreadResult>> {
        ensure_thread_id(thread_id)?;
        let _guard = self.locks.write(thread_id).await;

        let Some(thread) = self.read_thread(thread_id).await? else {
            debug!(thread_id, "Thread not found, nothing to compact");
            return Ok(None);
        };

        let result = compaction::compact_if_needed(thread, options).await?;
        if result.did_compact {
            self.write_thread(&result.thread).await?;
        }
        Ok(Some(result))
    }

    async fn update_thread_settings(
        &self,
        thread_id: &str,
        params: UpdateThreadSettingsParams,
    ) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, "update_thread_settings", move |thread| {
            if let Some(title) = params.title {
                thread.title = Some(title);
            }
            if let Some(selection) = params.model_selection {
                thread.model_selection = selection;
            }
            thread.updated_at = params.now.unwrap_or_else(Utc::now);
            Mutation::Changed
        })
        .await
    }

    async fn update_thread_usage(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, "update_thread_usage", |thread| {
            thread.usage = aggregate_thread_usage(&thread.history);
            thread.updated_at = Utc::now();
            Mutation::Changed
        })
        .await
    }

    async fn update_context_size(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, "update_context_size", |thread| {
            thread.context_size = aggregate_context_size(&thread.active_history);
            thread.updated_at = Utc::now();
            Mutation::Changed
        })
        .await
    }
}
