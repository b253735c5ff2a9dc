//! Physical naming and ordering primitives over a repository folder tree.
//!
//! The filesystem is the database: sibling order is encoded in fixed-width
//! zero-padded ordinal names, leaves carry a script-type suffix, submenus are
//! bare ordinal directories with a `_name.json` sidecar. All two-phase
//! rename machinery (tempify/finalize) lives here so repair and reorder share
//! one implementation.

use crate::error::StoreError;
use crate::header::{body_of, Header};
use crate::types::{Item, ItemKind, Ordinal, ORDINAL_WIDTH};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Marker suffix appended during phase A of a two-phase rename.
pub const TEMP_MARKER: &str = ".tmp";

/// Sidecar file holding a submenu's display name.
pub const NAME_SIDECAR: &str = "_name.json";

/// Soft-delete trash folder created next to removed items.
pub const TRASH_DIR: &str = "_old";

/// Stem of the gating script inside a rule folder.
pub const RULE_STEM: &str = "_rule";

/// Names starting with `.` or `_` are hidden/internal: excluded from
/// ordinal accounting and from resolution.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Ordered-item storage primitives for one script-type suffix.
#[derive(Debug, Clone)]
pub struct OrdinalStore {
    script_suffix: String,
}

impl Default for OrdinalStore {
    fn default() -> Self {
        OrdinalStore::new(".py")
    }
}

impl OrdinalStore {
    pub fn new(script_suffix: impl Into<String>) -> Self {
        OrdinalStore {
            script_suffix: script_suffix.into(),
        }
    }

    pub fn script_suffix(&self) -> &str {
        &self.script_suffix
    }

    /// On-disk file name for a leaf at the given ordinal.
    pub fn leaf_name(&self, ordinal: Ordinal) -> String {
        format!("{}{}", ordinal.to_name(), self.script_suffix)
    }

    /// Name of the gating script file inside a rule folder.
    pub fn rule_file_name(&self) -> String {
        format!("{}{}", RULE_STEM, self.script_suffix)
    }

    /// Interpret a directory entry as an item.
    ///
    /// Entries whose names are reserved or do not match the expected fixed
    /// width (bare ordinal for submenus, ordinal plus suffix for leaves)
    /// yield `None` and are silently skipped by callers.
    pub fn item_at(&self, path: &Path) -> Option<Item> {
        let name = path.file_name()?.to_str()?;
        if is_reserved(name) {
            return None;
        }

        if path.is_dir() {
            let ordinal = Ordinal::parse(name)?;
            return Some(Item {
                path: path.to_path_buf(),
                ordinal,
                kind: ItemKind::Submenu,
            });
        }

        if name.len() != ORDINAL_WIDTH + self.script_suffix.len() {
            return None;
        }
        let stem = name.strip_suffix(self.script_suffix.as_str())?;
        let ordinal = Ordinal::parse(stem)?;
        Some(Item {
            path: path.to_path_buf(),
            ordinal,
            kind: ItemKind::Leaf,
        })
    }

    /// List the items of a folder sorted by ordinal.
    ///
    /// A missing or unreadable folder yields an empty list, not an error:
    /// callers treat absent sections as "no applicable items".
    pub fn list_ordered(&self, folder: &Path) -> Vec<Item> {
        let entries = match fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(err) => {
                trace!(folder = %folder.display(), %err, "folder not readable, treating as empty");
                return Vec::new();
            }
        };

        let mut items: Vec<Item> = entries
            .flatten()
            .filter_map(|entry| self.item_at(&entry.path()))
            .collect();
        items.sort_by_key(|item| item.ordinal);
        items
    }

    /// Smallest ordinal not currently in use in `folder`.
    ///
    /// Not necessarily `N + 1`: after external edits the folder may contain
    /// gaps, and single-insert paths fill the first one.
    pub fn next_free_ordinal(&self, folder: &Path) -> Ordinal {
        let used: BTreeSet<Ordinal> = self
            .list_ordered(folder)
            .into_iter()
            .map(|item| item.ordinal)
            .collect();

        let mut candidate = Ordinal::FIRST;
        while used.contains(&candidate) {
            candidate = candidate.next();
        }
        candidate
    }

    /// Write a new leaf file at the given ordinal. `source` must already
    /// include its header block.
    pub fn create_leaf(
        &self,
        folder: &Path,
        ordinal: Ordinal,
        source: &str,
    ) -> Result<PathBuf, StoreError> {
        let path = folder.join(self.leaf_name(ordinal));
        fs::write(&path, source)?;
        debug!(path = %path.display(), "created leaf");
        Ok(path)
    }

    /// Create a new submenu directory at the given ordinal, tagged with its
    /// display name.
    pub fn create_submenu(
        &self,
        folder: &Path,
        ordinal: Ordinal,
        display_name: &str,
    ) -> Result<PathBuf, StoreError> {
        let path = folder.join(ordinal.to_name());
        fs::create_dir(&path)?;
        fs::write(path.join(NAME_SIDECAR), display_name)?;
        debug!(path = %path.display(), name = display_name, "created submenu");
        Ok(path)
    }

    /// Read an item's display name: the sidecar for submenus, the header
    /// `NAME` tag for leaves. Unreadable or untagged items yield `None`.
    pub fn display_name(&self, path: &Path) -> Option<String> {
        if path.is_dir() {
            return match fs::read_to_string(path.join(NAME_SIDECAR)) {
                Ok(name) => Some(name),
                Err(err) => {
                    trace!(path = %path.display(), %err, "submenu has no readable name sidecar");
                    None
                }
            };
        }

        let source = fs::read_to_string(path).ok()?;
        Header::parse(&source).name
    }

    /// Update an item's display name without touching its ordinal or, for
    /// leaves, its script body.
    pub fn set_display_name(&self, path: &Path, name: &str) -> Result<(), StoreError> {
        if path.is_dir() {
            fs::write(path.join(NAME_SIDECAR), name)?;
            return Ok(());
        }

        let source = fs::read_to_string(path)?;
        let mut header = Header::parse(&source);
        header.name = Some(name.to_string());
        fs::write(path, format!("{}{}", header.render(), body_of(&source)))?;
        Ok(())
    }

    /// Move an item into the sibling `_old` trash folder, tagged with the
    /// current timestamp. The core never hard-deletes items.
    pub fn soft_delete(&self, path: &Path) -> Result<PathBuf, StoreError> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::NotAnItem(path.to_path_buf()))?;
        let trash = parent.join(TRASH_DIR);
        if !trash.is_dir() {
            fs::create_dir(&trash)?;
        }

        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        let mut destination = trash.join(&stamp);
        let mut counter = 1u32;
        while destination.exists() {
            destination = trash.join(format!("{}_{:03}", stamp, counter));
            counter += 1;
        }

        rename(path, &destination)?;
        debug!(from = %path.display(), to = %destination.display(), "soft-deleted item");
        Ok(destination)
    }

    // ---- two-phase rename protocol ------------------------------------

    /// Phase A: append the temp marker to every non-reserved entry of
    /// `folder`, preserving relative lexicographic order.
    pub fn tempify_folder(&self, folder: &Path) -> Result<(), StoreError> {
        for name in sorted_entry_names(folder, |name| !is_reserved(name))? {
            let from = folder.join(&name);
            let to = folder.join(format!("{}{}", name, TEMP_MARKER));
            rename(&from, &to)?;
        }
        Ok(())
    }

    /// Phase B: rename the temp-marked entries of `folder` back to dense
    /// sequential ordinals, in their temp-marked (lexicographic) order,
    /// restoring the type-appropriate suffix.
    ///
    /// Ordinals already occupied by non-temp entries are skipped over; the
    /// reorder path relies on that to number around a directly-placed item.
    pub fn finalize_folder(&self, folder: &Path) -> Result<(), StoreError> {
        let temped = sorted_entry_names(folder, |name| {
            name.ends_with(TEMP_MARKER) && !is_reserved(name)
        })?;

        let mut counter = Ordinal::FIRST;
        for name in temped {
            let from = folder.join(&name);
            let suffix = if from.is_dir() {
                ""
            } else {
                self.script_suffix.as_str()
            };

            while occupied(folder, counter, &self.script_suffix) {
                counter = counter.next();
            }

            let to = folder.join(format!("{}{}", counter.to_name(), suffix));
            rename(&from, &to)?;
            counter = counter.next();
        }
        Ok(())
    }

    /// Tempify `root` and every non-reserved descendant folder.
    ///
    /// Folders are processed deepest-first so the paths collected up front
    /// stay valid while their parents' entries are still being renamed.
    pub fn tempify_tree(&self, root: &Path) -> Result<(), StoreError> {
        for folder in folders_deepest_first(root) {
            self.tempify_folder(&folder)?;
        }
        Ok(())
    }

    /// Finalize `root` and every descendant folder, deepest-first.
    pub fn finalize_tree(&self, root: &Path) -> Result<(), StoreError> {
        for folder in folders_deepest_first(root) {
            self.finalize_folder(&folder)?;
        }
        Ok(())
    }
}

/// `true` if `ordinal` is taken by a non-temp entry (bare or suffixed).
fn occupied(folder: &Path, ordinal: Ordinal, script_suffix: &str) -> bool {
    let name = ordinal.to_name();
    folder.join(&name).exists() || folder.join(format!("{}{}", name, script_suffix)).exists()
}

/// Sorted names of the direct entries of `folder` matching `keep`.
fn sorted_entry_names(
    folder: &Path,
    keep: impl Fn(&str) -> bool,
) -> Result<Vec<String>, StoreError> {
    let mut names: Vec<String> = fs::read_dir(folder)?
        .flatten()
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| keep(name))
        .collect();
    names.sort();
    Ok(names)
}

/// `root` plus every non-reserved descendant directory, children before
/// parents. Reserved subtrees (`_old`, dot-folders) are pruned.
fn folders_deepest_first(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .contents_first(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || entry
                    .file_name()
                    .to_str()
                    .map(|name| !is_reserved(name))
                    .unwrap_or(false)
        })
        .flatten()
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect()
}

fn rename(from: &Path, to: &Path) -> Result<(), StoreError> {
    fs::rename(from, to).map_err(|source| StoreError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}
