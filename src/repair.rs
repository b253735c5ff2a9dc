//! Repair: restore the contiguous-ordinal invariant.
//!
//! Every mutation that depends on dense, predictable ordinals runs a repair
//! first; a folder that drifted through manual filesystem edits self-heals
//! the same way. Repair never reorders an item relative to its pre-repair
//! siblings, it only closes numbering gaps, in two phases so in-flight
//! renames cannot collide with final names.

use crate::error::StoreError;
use crate::repository::Repository;
use crate::store::{is_reserved, OrdinalStore};
use crate::types::Section;
use std::fs;
use std::path::Path;
use tracing::info;

/// Renumber the direct contents of a single folder.
pub fn repair_folder(store: &OrdinalStore, folder: &Path) -> Result<(), StoreError> {
    store.tempify_folder(folder)?;
    store.finalize_folder(folder)
}

/// Renumber a folder and every descendant submenu, skipping reserved
/// subtrees.
pub fn repair_tree(store: &OrdinalStore, root: &Path) -> Result<(), StoreError> {
    store.tempify_tree(root)?;
    store.finalize_tree(root)
}

/// Repair a whole repository.
///
/// Sections whose direct children are items (`All`, `Templates`) are
/// repaired as trees from the section folder itself; in the grouped
/// sections the class, combination and rule folders keep their names and
/// only their contents are renumbered.
pub fn repair_repository(store: &OrdinalStore, repository: &Repository) -> Result<(), StoreError> {
    for section in Section::ALL_SECTIONS {
        let path = repository.section_path(section);
        if !path.is_dir() {
            continue;
        }

        if section.item_depth() == 1 {
            repair_tree(store, &path)?;
            continue;
        }

        for entry in fs::read_dir(&path)?.flatten() {
            let child = entry.path();
            let keep = entry
                .file_name()
                .to_str()
                .map(|name| !is_reserved(name))
                .unwrap_or(false);
            if keep && child.is_dir() {
                repair_tree(store, &child)?;
            }
        }
    }

    info!(root = %repository.root().display(), "repository repaired");
    Ok(())
}
