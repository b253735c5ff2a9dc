//! Repository layout and item lifecycle operations.
//!
//! A repository is one root folder holding the five sections. Several
//! repositories may be active at once: the local one plus optional named
//! extras; extras are tagged in resolution output but structurally
//! identical. The `Manager` bundles the composite mutations the manager UI
//! performs (create, remove, paste, rename), each one bracketed by the
//! defensive repair the ordinal invariant requires.

use crate::error::StoreError;
use crate::header::{body_of, Header};
use crate::repair;
use crate::store::{is_reserved, OrdinalStore, TRASH_DIR};
use crate::types::{ItemKind, Section, NO_SELECTION_TOKEN};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Default display names for freshly created items.
pub const NEW_LEAF_NAME: &str = "New Item";
pub const NEW_SUBMENU_NAME: &str = "New Menu";

/// One active repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    name: Option<String>,
    root: PathBuf,
}

impl Repository {
    /// The user's own repository.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Repository {
            name: None,
            root: root.into(),
        }
    }

    /// An extra, named repository (shared studio scripts and the like).
    pub fn named(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Repository {
            name: Some(name.into()),
            root: root.into(),
        }
    }

    /// `None` for the local repository, the tag name for extras.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn section_path(&self, section: Section) -> PathBuf {
        self.root.join(section.dir_name())
    }

    pub fn class_path(&self, section: Section, class: &str) -> PathBuf {
        self.section_path(section).join(class)
    }

    /// Create any missing section folders, including the synthetic
    /// `Single/No Selection` class.
    pub fn ensure_layout(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        for section in Section::ALL_SECTIONS {
            fs::create_dir_all(self.section_path(section))?;
        }
        fs::create_dir_all(self.class_path(Section::Single, NO_SELECTION_TOKEN))?;
        Ok(())
    }

    /// Sorted class folder names of a section.
    pub fn list_classes(&self, section: Section) -> Vec<String> {
        let path = self.section_path(section);
        let entries = match fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut classes: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !is_reserved(name))
            .collect();
        classes.sort();
        classes
    }

    /// Create a new class folder under `Single` or `Multiple`.
    pub fn add_class(&self, section: Section, class: &str) -> Result<PathBuf, StoreError> {
        let path = self.class_path(section, class);
        fs::create_dir_all(self.section_path(section))?;
        fs::create_dir(&path)?;
        debug!(class, section = %section, "added class folder");
        Ok(path)
    }

    /// Soft-delete a class folder into the section's `_old` trash.
    pub fn remove_class(&self, section: Section, class: &str) -> Result<PathBuf, StoreError> {
        let path = self.class_path(section, class);
        let trash = self.section_path(section).join(TRASH_DIR);
        if !trash.is_dir() {
            fs::create_dir(&trash)?;
        }

        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S").to_string();
        let destination = trash.join(format!("{}_{}", class, stamp));
        fs::rename(&path, &destination).map_err(|source| StoreError::Rename {
            from: path,
            to: destination.clone(),
            source,
        })?;
        info!(class, section = %section, "class folder moved to trash");
        Ok(destination)
    }

    /// Rename a class folder; its items keep their ordinals.
    pub fn rename_class(
        &self,
        section: Section,
        class: &str,
        new_name: &str,
    ) -> Result<PathBuf, StoreError> {
        let from = self.class_path(section, class);
        let to = self.class_path(section, new_name);
        fs::rename(&from, &to).map_err(|source| StoreError::Rename {
            from,
            to: to.clone(),
            source,
        })?;
        Ok(to)
    }

    /// Erase and recreate the named sections. The one destructive
    /// operation in the core; callers confirm before invoking it.
    pub fn clear_sections(&self, sections: &[Section]) -> Result<(), StoreError> {
        for section in sections {
            let path = self.section_path(*section);
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            }
            fs::create_dir_all(&path)?;
            info!(section = %section, "section cleared");
        }
        Ok(())
    }
}

/// Composite item mutations, each wrapped in the defensive repair pass.
pub struct Manager<'a> {
    store: &'a OrdinalStore,
}

impl<'a> Manager<'a> {
    pub fn new(store: &'a OrdinalStore) -> Self {
        Manager { store }
    }

    /// Create a new leaf in `folder` at the next free ordinal.
    pub fn create_leaf_item(&self, folder: &Path, name: &str) -> Result<PathBuf, StoreError> {
        repair::repair_folder(self.store, folder)?;
        let ordinal = self.store.next_free_ordinal(folder);
        self.store
            .create_leaf(folder, ordinal, &Header::with_name(name).render())
    }

    /// Create a new submenu in `folder` at the next free ordinal.
    pub fn create_submenu_item(&self, folder: &Path, name: &str) -> Result<PathBuf, StoreError> {
        repair::repair_folder(self.store, folder)?;
        let ordinal = self.store.next_free_ordinal(folder);
        self.store.create_submenu(folder, ordinal, name)
    }

    /// Soft-delete an item, then close the numbering gap it leaves.
    pub fn remove_item(&self, path: &Path) -> Result<PathBuf, StoreError> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::NotAnItem(path.to_path_buf()))?
            .to_path_buf();
        let moved = self.store.soft_delete(path)?;
        repair::repair_folder(self.store, &parent)?;
        Ok(moved)
    }

    /// Read a leaf's display name and script body.
    pub fn read_script(&self, path: &Path) -> Result<(Option<String>, String), StoreError> {
        let source = fs::read_to_string(path)?;
        let header = Header::parse(&source);
        Ok((header.name, body_of(&source).to_string()))
    }

    /// Rewrite a leaf, preserving header structure around the new name and
    /// body.
    pub fn write_script(&self, path: &Path, name: &str, body: &str) -> Result<(), StoreError> {
        let mut header = if path.exists() {
            Header::parse(&fs::read_to_string(path)?)
        } else {
            Header::default()
        };
        header.name = Some(name.to_string());
        fs::write(path, format!("{}{}", header.render(), body))?;
        Ok(())
    }

    /// Copy previously collected items into `folder`, each at the next
    /// free ordinal. Submenus are copied with their whole subtree.
    pub fn paste_items(
        &self,
        folder: &Path,
        clipboard: &[PathBuf],
    ) -> Result<Vec<PathBuf>, StoreError> {
        repair::repair_folder(self.store, folder)?;

        let mut pasted = Vec::with_capacity(clipboard.len());
        for source in clipboard {
            let ordinal = self.store.next_free_ordinal(folder);
            let destination = if source.is_dir() {
                let destination = folder.join(ordinal.to_name());
                copy_tree(source, &destination)?;
                destination
            } else {
                let destination = folder.join(self.store.leaf_name(ordinal));
                fs::copy(source, &destination)?;
                destination
            };
            pasted.push(destination);
        }
        Ok(pasted)
    }

    /// Duplicate an item next to itself.
    pub fn duplicate_item(&self, path: &Path) -> Result<PathBuf, StoreError> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::NotAnItem(path.to_path_buf()))?
            .to_path_buf();
        let mut copies = self.paste_items(&parent, std::slice::from_ref(&path.to_path_buf()))?;
        Ok(copies.remove(0))
    }

    /// Kind of the item at `path`, if it is one.
    pub fn item_kind(&self, path: &Path) -> Option<ItemKind> {
        self.store.item_at(path).map(|item| item.kind)
    }
}

/// Recursive directory copy (paste/duplicate of submenus).
fn copy_tree(source: &Path, destination: &Path) -> Result<(), StoreError> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|err| StoreError::Io(err.into()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("walkdir yields paths under its root");
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
