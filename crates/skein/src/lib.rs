//! # Skein
//!
//! Durable conversation threads for AI agents.
//!
//! Skein records every turn of a conversation with a language model, keeps a
//! bounded "active" view of it that fits the model's context window, and
//! serializes all mutation so concurrent writers never lose a message.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skein::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = ThreadStoreBuilder::new().local_root("./data").build()?;
//!
//!     let thread = store.create_thread(CreateThreadParams::new()).await?;
//!     store
//!         .save_message(
//!             &thread.id,
//!             SaveThreadMessageParams::new(
//!                 ModelMessage::user("Hello!"),
//!                 MessageUsage::new(12, 0, 0),
//!             ),
//!         )
//!         .await?;
//!
//!     // Any async closure returning a ModelMessage can summarize
//!     let summarizer = |history: Vec<ThreadMessageRecord>| async move {
//!         Ok::<_, anyhow::Error>(ModelMessage::assistant(format!(
//!             "{} earlier messages",
//!             history.len()
//!         )))
//!     };
//!
//!     let options = CompactThreadOptions::new(CompactionPolicy::new(8_000), &summarizer);
//!     if let Some(result) = store.compact_if_needed(&thread.id, options).await? {
//!         println!("compacted: {}", result.did_compact);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`skein-types`**: the message payload stored in each record
//! - **`skein-persist`**: file store, validation, usage rollups and compaction
//!
//! ## License
//!
//! MIT

pub use skein_types::{ContentPart, MessageContent, MessageRole, ModelMessage, RawPart};

pub use skein_persist::{
    CompactThreadOptions, CompactThreadResult, CompactionPolicy, ContextSize, CreateThreadParams,
    ErrorCode, FileEntry, FileThreadStore, HistorySummarizer, ListThreadsOptions, LocalFs,
    LoggingConfig, MessageReplacement, MessageUsage, ModelSelection, PersistError,
    PricingCalculator, RebuildOptions, ReplaceThreadMessagesParams, SaveThreadMessageParams,
    SoftDeleteOptions, StoreConfig, ThreadFs, ThreadMessageRecord, ThreadRecord, ThreadRepository,
    ThreadStoreBuilder, ThreadUsage, UpdateThreadSettingsParams,
};

/// Convenient prelude with the types most callers need
pub mod prelude {
    pub use crate::{
        CompactThreadOptions, CompactionPolicy, ContentPart, CreateThreadParams, FileThreadStore,
        HistorySummarizer, ListThreadsOptions, LocalFs, MessageContent, MessageRole, MessageUsage,
        ModelMessage, PersistError, PricingCalculator, SaveThreadMessageParams, StoreConfig,
        ThreadFs, ThreadMessageRecord, ThreadRecord, ThreadRepository, ThreadStoreBuilder,
    };
}
