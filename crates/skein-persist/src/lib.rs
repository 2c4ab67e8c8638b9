//! File-backed thread persistence with context compaction.
//!
//! Each conversation thread lives in its own JSON file. `history` is an
//! append-only log; `active_history` is the window handed back to the model
//! and can be compacted into a single summary record once it outgrows the
//! configured token budget.

pub mod builder;
pub mod compaction;
pub mod config;
pub mod error;
pub mod fs;
pub mod models;
pub mod store;
pub mod sync;
pub mod trait_client;
pub mod usage;
pub mod validation;

pub use builder::ThreadStoreBuilder;
pub use compaction::{
    compact_if_needed, should_compact, CompactThreadOptions, CompactThreadResult,
    CompactionPolicy, HistorySummarizer,
};
pub use crate::config::{LoggingConfig, StoreConfig};
pub use error::{ErrorCode, PersistError, Result};
pub use fs::{FileEntry, LocalFs, ThreadFs};
pub use models::{
    ContextSize, CreateThreadParams, ListThreadsOptions, MessageReplacement, MessageUsage,
    ModelSelection, RebuildOptions, ReplaceThreadMessagesParams, SaveThreadMessageParams,
    SoftDeleteOptions, ThreadMessageRecord, ThreadRecord, ThreadUsage,
    UpdateThreadSettingsParams, CONTENT_SCHEMA_VERSION, THREAD_SCHEMA_VERSION,
};
pub use store::{FileThreadStore, DEFAULT_THREADS_DIR};
pub use trait_client::ThreadRepository;
pub use usage::{
    aggregate_context_size, aggregate_thread_usage, resolve_message_cost, PricingCalculator,
};
