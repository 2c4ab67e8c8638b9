//! Message payload types stored by the Skein thread store.
//!
//! These mirror the shape the model-call layer produces (role + content
//! parts). The store persists them verbatim and only looks at the role and
//! at text/tool parts when it needs to flatten a summary.

pub mod content;
pub mod message;

pub use content::{ContentPart, MessageContent, RawPart};
pub use message::{MessageRole, ModelMessage};
