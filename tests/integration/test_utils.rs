//! Shared test utilities for integration tests

#![allow(dead_code)]

use hotbox::header::Header;
use hotbox::repository::Repository;
use hotbox::store::OrdinalStore;
use hotbox::types::Ordinal;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A repository rooted in its own temp directory. The directory lives as
/// long as the fixture.
pub struct TestRepo {
    pub temp_dir: TempDir,
    pub repo: Repository,
    pub store: OrdinalStore,
}

impl TestRepo {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::local(temp_dir.path().join("hotbox"));
        repo.ensure_layout().unwrap();
        TestRepo {
            temp_dir,
            repo,
            store: OrdinalStore::default(),
        }
    }

    /// Write a leaf at an explicit ordinal, creating the folder if needed.
    pub fn write_leaf(&self, folder: &Path, ordinal: u32, name: &str, body: &str) -> PathBuf {
        fs::create_dir_all(folder).unwrap();
        let source = format!("{}{}", Header::with_name(name).render(), body);
        self.store
            .create_leaf(folder, Ordinal::new(ordinal).unwrap(), &source)
            .unwrap()
    }

    /// Display names of a folder's items in ordinal order.
    pub fn names_in(&self, folder: &Path) -> Vec<String> {
        self.store
            .list_ordered(folder)
            .iter()
            .map(|item| {
                self.store
                    .display_name(&item.path)
                    .unwrap_or_else(|| item.ordinal.to_name())
            })
            .collect()
    }
}
