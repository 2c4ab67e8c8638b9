//! Shared helpers for the store integration tests.

#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use skein_persist::{
    FileEntry, FileThreadStore, LocalFs, MessageUsage, SaveThreadMessageParams, ThreadFs,
};
use skein_types::ModelMessage;
use tempfile::TempDir;

/// [`LocalFs`] wrapper that fails selected operations on demand and counts
/// every call that reaches it.
pub struct FaultyFs {
    inner: LocalFs,
    pub fail_reads: AtomicBool,
    pub fail_read_dir: AtomicBool,
    pub fail_temp_writes: AtomicBool,
    pub fail_canonical_writes: AtomicBool,
    calls: AtomicUsize,
}

impl FaultyFs {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: LocalFs::new(root),
            fail_reads: AtomicBool::new(false),
            fail_read_dir: AtomicBool::new(false),
            fail_temp_writes: AtomicBool::new(false),
            fail_canonical_writes: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn injected() -> io::Error {
    io::Error::new(io::ErrorKind::PermissionDenied, "injected failure")
}

#[async_trait]
impl ThreadFs for FaultyFs {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.record_call();
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.record_call();
        let is_temp = path.extension().is_some_and(|ext| ext == "tmp");
        if is_temp && self.fail_temp_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        if !is_temp && self.fail_canonical_writes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.write(path, contents).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<FileEntry>> {
        self.record_call();
        if self.fail_read_dir.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.read_dir(path).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        self.record_call();
        self.inner.remove(path).await
    }
}

pub fn local_store(tmp: &TempDir) -> FileThreadStore {
    FileThreadStore::new(Arc::new(LocalFs::new(tmp.path())))
}

pub fn faulty_store(tmp: &TempDir) -> (FileThreadStore, Arc<FaultyFs>) {
    let fs = Arc::new(FaultyFs::new(tmp.path()));
    (FileThreadStore::new(fs.clone()), fs)
}

pub fn user_message(text: &str, input_tokens: u64, output_tokens: u64) -> SaveThreadMessageParams {
    SaveThreadMessageParams::new(
        ModelMessage::user(text),
        MessageUsage::new(input_tokens, output_tokens, 0),
    )
}

/// Names of the files currently in the default threads directory
pub fn thread_dir_files(tmp: &TempDir) -> Vec<String> {
    match std::fs::read_dir(tmp.path().join(".threads")) {
        Ok(entries) => entries
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}
