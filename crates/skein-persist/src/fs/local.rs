use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{FileEntry, ThreadFs};

/// [`ThreadFs`] backed by a directory on the local disk.
///
/// Every path is resolved below `root`; absolute paths and `..` components
/// are refused with [`io::ErrorKind::InvalidInput`].
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// The root directory is created lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path escapes store root: {}", path.display()),
            ));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ThreadFs for LocalFs {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let full = self.resolve(path)?;
        debug!(path = %full.display(), "Reading file");
        fs::read_to_string(&full).await
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        debug!(path = %full.display(), bytes = contents.len(), "Writing file");
        fs::write(&full, contents).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<FileEntry>> {
        let full = self.resolve(path)?;
        debug!(path = %full.display(), "Listing directory");

        let mut entries = fs::read_dir(&full).await?;
        let mut listing = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            listing.push(FileEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: entry.file_type().await?.is_dir(),
            });
        }
        Ok(listing)
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let full = self.resolve(path)?;
        debug!(path = %full.display(), "Removing file");
        fs::remove_file(&full).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_creates_parent_dirs_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let local = LocalFs::new(tmp.path());
        let path = Path::new(".threads/thread.a.json");

        local.write(path, "one").await.unwrap();
        local.write(path, "two").await.unwrap();

        assert_eq!(local.read_to_string(path).await.unwrap(), "two");
        assert!(tmp.path().join(".threads/thread.a.json").exists());
    }

    #[tokio::test]
    async fn read_dir_lists_names() {
        let tmp = TempDir::new().unwrap();
        let local = LocalFs::new(tmp.path());
        local.write(Path::new("d/a.json"), "{}").await.unwrap();
        local.write(Path::new("d/sub/b.json"), "{}").await.unwrap();

        let mut entries = local.read_dir(Path::new("d")).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            entries,
            vec![
                FileEntry { name: "a.json".into(), is_dir: false },
                FileEntry { name: "sub".into(), is_dir: true },
            ]
        );
    }

    #[tokio::test]
    async fn missing_paths_are_not_found() {
        let tmp = TempDir::new().unwrap();
        let local = LocalFs::new(tmp.path());

        let err = local.read_to_string(Path::new("nope.json")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let err = local.read_dir(Path::new("nope")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn remove_deletes_file() {
        let tmp = TempDir::new().unwrap();
        let local = LocalFs::new(tmp.path());
        local.write(Path::new("x.tmp"), "x").await.unwrap();

        local.remove(Path::new("x.tmp")).await.unwrap();
        assert!(!tmp.path().join("x.tmp").exists());
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let local = LocalFs::new(tmp.path().join("root"));

        let err = local.write(Path::new("../outside.json"), "x").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let err = local.read_to_string(Path::new("/etc/hostname")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!tmp.path().join("outside.json").exists());
    }
}
