//! Shape and invariant checks applied to every thread read from or written
//! to storage.

use std::path::Path;

use serde_json::error::Category;

use crate::error::{PersistError, Result};
use crate::models::{
    ThreadMessageRecord, ThreadRecord, ThreadUsage, CONTENT_SCHEMA_VERSION, THREAD_SCHEMA_VERSION,
};

const THREAD_FILE_PREFIX: &str = "thread.";
const THREAD_FILE_SUFFIX: &str = ".json";

/// Thread ids double as file name components, so only `[A-Za-z0-9_-]+` is
/// accepted.
pub fn is_safe_thread_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn ensure_thread_id(id: &str) -> Result<()> {
    if is_safe_thread_id(id) {
        Ok(())
    } else {
        Err(PersistError::invalid_state(format!("Invalid thread id: {}", id)))
    }
}

pub fn thread_file_name(id: &str) -> String {
    format!("{}{}{}", THREAD_FILE_PREFIX, id, THREAD_FILE_SUFFIX)
}

/// Extracts the thread id from a `thread.<id>.json` file name.
pub fn thread_id_from_file_name(name: &str) -> Option<&str> {
    let id = name
        .strip_prefix(THREAD_FILE_PREFIX)?
        .strip_suffix(THREAD_FILE_SUFFIX)?;
    is_safe_thread_id(id).then_some(id)
}

/// Deserializes and validates a thread document.
pub fn parse_thread(path: &Path, raw: &str) -> Result<ThreadRecord> {
    let thread: ThreadRecord = serde_json::from_str(raw).map_err(|e| match e.classify() {
        Category::Syntax | Category::Eof => {
            PersistError::validation(path, format!("Thread file is not valid JSON: {}", e))
        }
        Category::Data | Category::Io => {
            PersistError::validation(path, format!("Invalid thread state: {}", e))
        }
    })?;

    validate_thread(path, &thread)?;
    Ok(thread)
}

/// Checks the invariants serde cannot express.
pub fn validate_thread(path: &Path, thread: &ThreadRecord) -> Result<()> {
    let invalid = |message: String| PersistError::validation(path, message);

    if thread.schema_version != THREAD_SCHEMA_VERSION {
        return Err(invalid(format!(
            "Unsupported schemaVersion {} (expected {})",
            thread.schema_version, THREAD_SCHEMA_VERSION
        )));
    }
    if thread.content_schema_version != CONTENT_SCHEMA_VERSION {
        return Err(invalid(format!(
            "Unsupported contentSchemaVersion {} (expected {})",
            thread.content_schema_version, CONTENT_SCHEMA_VERSION
        )));
    }
    if !is_safe_thread_id(&thread.id) {
        return Err(invalid(format!("Invalid thread id: {}", thread.id)));
    }

    for (index, record) in thread.history.iter().enumerate() {
        let expected = index as u64 + 1;
        if record.ordinal != expected {
            return Err(invalid(format!(
                "history[{}] has ordinal {} (expected {})",
                index, record.ordinal, expected
            )));
        }
        check_record(record, "history", index).map_err(invalid)?;
    }

    for (index, record) in thread.active_history.iter().enumerate() {
        if record.ordinal == 0 {
            return Err(invalid(format!("activeHistory[{}] has ordinal 0", index)));
        }
        check_record(record, "activeHistory", index).map_err(invalid)?;
    }

    if let Some(marker) = thread.last_compaction_ordinal {
        let last = thread.last_ordinal().unwrap_or(0);
        if marker == 0 || marker > last {
            return Err(invalid(format!(
                "lastCompactionOrdinal {} is outside history (last ordinal {})",
                marker, last
            )));
        }
    }

    check_usage(&thread.usage).map_err(|reason| invalid(format!("usage {}", reason)))?;

    Ok(())
}

fn check_record(
    record: &ThreadMessageRecord,
    list: &str,
    index: usize,
) -> std::result::Result<(), String> {
    if record.version == 0 {
        return Err(format!("{}[{}] has version 0", list, index));
    }
    check_usage(&record.usage).map_err(|reason| format!("{}[{}].usage {}", list, index, reason))
}

fn check_usage(usage: &ThreadUsage) -> std::result::Result<(), String> {
    let cost = usage.total_cost_usd;
    if !cost.is_finite() || cost < 0.0 {
        return Err(format!("has invalid totalCostUsd {}", cost));
    }
    Ok(())
}
