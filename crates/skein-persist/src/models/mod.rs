mod message;
mod params;
mod thread;

pub use message::{ContextSize, ThreadMessageRecord, ThreadUsage};
pub use params::{
    CreateThreadParams, ListThreadsOptions, MessageReplacement, MessageUsage, RebuildOptions,
    ReplaceThreadMessagesParams, SaveThreadMessageParams, SoftDeleteOptions,
    UpdateThreadSettingsParams,
};
pub use thread::{ModelSelection, ThreadRecord, CONTENT_SCHEMA_VERSION, THREAD_SCHEMA_VERSION};
