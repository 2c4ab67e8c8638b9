//! Storage substrate consumed by the thread store.
//!
//! Paths handed to a [`ThreadFs`] are always relative to the root of the
//! implementation's sandbox. A missing file or directory is reported as
//! [`std::io::ErrorKind::NotFound`].

mod local;

pub use local::LocalFs;

use std::io;
use std::path::Path;

use async_trait::async_trait;

/// One directory entry returned by [`ThreadFs::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub is_dir: bool,
}

#[async_trait]
pub trait ThreadFs: Send + Sync {
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Overwrites `path`, creating parent directories as needed.
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<FileEntry>>;

    async fn remove(&self, path: &Path) -> io::Result<()>;
}
