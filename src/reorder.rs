//! Drag-and-drop reorder protocol.
//!
//! A drag produces a drop zone (above or below a sibling, or into a
//! submenu), the zone maps to a destination ordinal, and the move executes
//! through the two-phase rename machinery so every other sibling renumbers
//! around the dropped item in one pass.

use crate::error::StoreError;
use crate::repair;
use crate::store::{OrdinalStore, TEMP_MARKER};
use crate::types::{Item, ItemKind, Ordinal};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Vertical hit zones of an item slot during a drag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragZoneConfig {
    /// Cursor fractions below this land above the target.
    #[serde(default = "default_above_fraction")]
    pub above_fraction: f64,

    /// Start of the "into" band on submenu targets.
    #[serde(default = "default_into_start")]
    pub into_start: f64,

    /// End of the "into" band on submenu targets.
    #[serde(default = "default_into_end")]
    pub into_end: f64,
}

fn default_above_fraction() -> f64 {
    0.5
}

fn default_into_start() -> f64 {
    1.0 / 6.0
}

fn default_into_end() -> f64 {
    0.75
}

impl Default for DragZoneConfig {
    fn default() -> Self {
        DragZoneConfig {
            above_fraction: default_above_fraction(),
            into_start: default_into_start(),
            into_end: default_into_end(),
        }
    }
}

/// Where a drop lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropZone {
    Above,
    Below,
    Into,
}

/// Classify a drop from the cursor's vertical fraction within the target
/// slot (0.0 at the top). Only submenu targets have an "into" band; it
/// wins over above/below when the cursor is inside it.
pub fn classify_drop(fraction: f64, target_is_submenu: bool, zones: &DragZoneConfig) -> DropZone {
    if target_is_submenu && fraction >= zones.into_start && fraction <= zones.into_end {
        return DropZone::Into;
    }
    if fraction < zones.above_fraction {
        DropZone::Above
    } else {
        DropZone::Below
    }
}

/// A fully specified move, ready to execute.
#[derive(Debug, Clone)]
pub struct Placement {
    /// Folder the item ends up in.
    pub folder: PathBuf,
    /// Ordinal the item is directly placed at before renumbering.
    pub ordinal: Ordinal,
}

/// Resolve a drop into a placement.
///
/// For sibling drops the destination ordinal is the target's, shifted one
/// down for `Below`, and corrected one back when the dragged item starts
/// earlier in the same folder (its own slot vanishes from under the
/// target). An `Into` drop always lands at the head of the submenu.
pub fn plan_drop(dragged: &Item, target: &Item, zone: DropZone) -> Option<Placement> {
    if zone == DropZone::Into {
        if target.kind != ItemKind::Submenu {
            return None;
        }
        return Some(Placement {
            folder: target.path.clone(),
            ordinal: Ordinal::FIRST,
        });
    }

    let folder = target.path.parent()?.to_path_buf();
    let mut slot = target.ordinal.get();
    if zone == DropZone::Below {
        slot += 1;
    }
    let same_folder = dragged.path.parent() == target.path.parent();
    if same_folder && dragged.ordinal < target.ordinal {
        slot -= 1;
    }
    Some(Placement {
        folder,
        ordinal: Ordinal::new(slot.max(1))?,
    })
}

/// Execute a planned move under `scope`, the folder tree containing both
/// ends of the drag (typically the section or class folder).
///
/// The whole scope is tempified, the dragged item is renamed straight to
/// its final destination name, then finalize renumbers every temp-marked
/// sibling around it and a full repair closes anything left.
pub fn execute_move(
    store: &OrdinalStore,
    scope: &Path,
    dragged: &Item,
    placement: &Placement,
) -> Result<(), StoreError> {
    store.tempify_tree(scope)?;

    let source = tempified_path(scope, &dragged.path);
    let suffix = match dragged.kind {
        ItemKind::Leaf => store.script_suffix(),
        ItemKind::Submenu => "",
    };
    let destination = tempified_folder(scope, &placement.folder)
        .join(format!("{}{}", placement.ordinal.to_name(), suffix));

    // A vanished source means the tree changed under the drag; renumbering
    // still has to run, so log and carry on.
    if let Err(err) = std::fs::rename(&source, &destination) {
        warn!(
            from = %source.display(),
            to = %destination.display(),
            %err,
            "dragged item could not be placed, renumbering without it"
        );
    } else {
        debug!(
            from = %dragged.path.display(),
            to = %destination.display(),
            "placed dragged item"
        );
    }

    store.finalize_tree(scope)?;
    repair::repair_tree(store, scope)
}

/// Map a pre-tempify item path to its in-flight temp-marked path.
fn tempified_path(scope: &Path, path: &Path) -> PathBuf {
    let folder = match path.parent() {
        Some(parent) => tempified_folder(scope, parent),
        None => return path.to_path_buf(),
    };
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => folder.join(format!("{}{}", name, TEMP_MARKER)),
        None => path.to_path_buf(),
    }
}

/// Map a pre-tempify folder path to its in-flight temp-marked path. Every
/// path component below `scope` gains the marker; `scope` itself is never
/// renamed.
fn tempified_folder(scope: &Path, folder: &Path) -> PathBuf {
    let relative = match folder.strip_prefix(scope) {
        Ok(relative) => relative,
        Err(_) => return folder.to_path_buf(),
    };
    let mut result = scope.to_path_buf();
    for component in relative.components() {
        let name = component.as_os_str().to_string_lossy();
        result.push(format!("{}{}", name, TEMP_MARKER));
    }
    result
}
