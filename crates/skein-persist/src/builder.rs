use std::path::PathBuf;
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::{PersistError, Result};
use crate::fs::{LocalFs, ThreadFs};
use crate::store::{FileThreadStore, DEFAULT_THREADS_DIR};
use crate::usage::PricingCalculator;

pub struct ThreadStoreBuilder {
    fs: Option<Arc<dyn ThreadFs>>,
    dir_path: PathBuf,
    pricing_calculator: Option<Arc<dyn PricingCalculator>>,
}

impl ThreadStoreBuilder {
    pub fn new() -> Self {
        Self {
            fs: None,
            dir_path: PathBuf::from(DEFAULT_THREADS_DIR),
            pricing_calculator: None,
        }
    }

    /// Seed root and threads directory from a loaded [`StoreConfig`]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new()
            .local_root(config.root_dir.clone())
            .dir_path(config.threads_dir.clone())
    }

    pub fn fs(mut self, fs: Arc<dyn ThreadFs>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Use a [`LocalFs`] rooted at `root`
    pub fn local_root(self, root: impl Into<PathBuf>) -> Self {
        self.fs(Arc::new(LocalFs::new(root)))
    }

    pub fn dir_path(mut self, dir_path: impl Into<PathBuf>) -> Self {
        self.dir_path = dir_path.into();
        self
    }

    pub fn pricing_calculator(mut self, calculator: impl PricingCalculator + 'static) -> Self {
        self.pricing_calculator = Some(Arc::new(calculator));
        self
    }

    pub fn build(self) -> Result<FileThreadStore> {
        let fs = self
            .fs
            .ok_or_else(|| PersistError::invalid_state("fs is required"))?;

        let mut store = FileThreadStore::new(fs).with_dir_path(self.dir_path);
        if let Some(calculator) = self.pricing_calculator {
            store = store.with_pricing_calculator(calculator);
        }
        Ok(store)
    }
}

impl Default for ThreadStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_missing_fs_is_invalid_state() {
        let err = ThreadStoreBuilder::new().build().err().unwrap();
        assert_eq!(err.code(), ErrorCode::InvalidState);
    }

    #[test]
    fn test_from_config_uses_threads_dir() {
        let config = StoreConfig {
            threads_dir: PathBuf::from("conversations"),
            ..Default::default()
        };

        let store = ThreadStoreBuilder::from_config(&config).build().unwrap();
        assert_eq!(store.dir_path(), std::path::Path::new("conversations"));
    }

    #[test]
    fn test_pricing_closure_accepted() {
        let store = ThreadStoreBuilder::new()
            .local_root(".")
            .pricing_calculator(|_: &str, input: u64, output: u64| (input + output) as f64)
            .build();
        assert!(store.is_ok());
    }
}
