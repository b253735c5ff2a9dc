//! Archive export and merge import.
//!
//! A repository exports as a gzipped tarball (optionally base64-armored
//! for clipboard transport). Import is a merge, not a restore: archive
//! items are matched against the destination by logical path (display
//! names, not ordinals), matches are overwritten in place and everything
//! else is appended at the next free ordinals. Existing destination items
//! never move or disappear.

use crate::error::ArchiveError;
use crate::repair;
use crate::repository::Repository;
use crate::store::{is_reserved, OrdinalStore};
use crate::types::{ItemKind, LogicalPath, Ordinal, Section};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Conventional file suffix for exported archives.
pub const ARCHIVE_SUFFIX: &str = ".hotbox";

/// Outcome counts of a merge import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Destination items overwritten by an archive match.
    pub updated: usize,
    /// Items newly created in the destination.
    pub created: usize,
}

/// Serialize a repository root into a gzipped tarball.
pub fn export(root: &Path) -> Result<Vec<u8>, ArchiveError> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(".", root)?;
    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}

/// Export to a file, appending the conventional suffix when missing.
pub fn export_to_file(root: &Path, output: &Path) -> Result<PathBuf, ArchiveError> {
    let output = match output.extension() {
        Some(ext) if format!(".{}", ext.to_string_lossy()) == ARCHIVE_SUFFIX => {
            output.to_path_buf()
        }
        _ => {
            let mut name = output.as_os_str().to_os_string();
            name.push(ARCHIVE_SUFFIX);
            PathBuf::from(name)
        }
    };
    fs::write(&output, export(root)?)?;
    info!(root = %root.display(), output = %output.display(), "repository exported");
    Ok(output)
}

/// Export as base64 text, for transport through channels that mangle
/// binary data.
pub fn export_to_base64(root: &Path) -> Result<String, ArchiveError> {
    Ok(BASE64.encode(export(root)?))
}

/// Merge an archive file into `destination`.
pub fn import_from_file(
    store: &OrdinalStore,
    destination: &Repository,
    input: &Path,
) -> Result<ImportReport, ArchiveError> {
    let file = File::open(input)?;
    import_reader(store, destination, file)
}

/// Merge a base64-armored archive into `destination`.
pub fn import_from_base64(
    store: &OrdinalStore,
    destination: &Repository,
    armored: &str,
) -> Result<ImportReport, ArchiveError> {
    let compact: String = armored.split_whitespace().collect();
    let bytes = BASE64.decode(compact.as_bytes())?;
    import_reader(store, destination, bytes.as_slice())
}

fn import_reader(
    store: &OrdinalStore,
    destination: &Repository,
    reader: impl std::io::Read,
) -> Result<ImportReport, ArchiveError> {
    // Unpack into a scratch tree first; a malformed archive fails here,
    // before the destination is touched.
    let scratch = tempfile::tempdir()?;
    tar::Archive::new(GzDecoder::new(reader))
        .unpack(scratch.path())
        .map_err(|err| ArchiveError::Format(err.to_string()))?;

    destination.ensure_layout()?;
    repair::repair_repository(store, destination)?;
    let scratch_repo = Repository::local(scratch.path());
    repair::repair_repository(store, &scratch_repo)?;

    merge(store, scratch.path(), destination.root())
}

/// What an indexed logical path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Leaf,
    Submenu,
    /// Reserved-name file (rule script, name sidecar). Overwritten on
    /// match, never created as a standalone new item.
    Internal,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    path: PathBuf,
    kind: EntryKind,
}

type LogicalIndex = BTreeMap<LogicalPath, IndexEntry>;

fn merge(
    store: &OrdinalStore,
    archive_root: &Path,
    dest_root: &Path,
) -> Result<ImportReport, ArchiveError> {
    let archive_index = index_tree(store, archive_root);
    let dest_index = index_tree(store, dest_root);

    let mut report = ImportReport::default();

    // Phase 1: overwrite matches in place, keeping destination ordinals.
    for (logical, entry) in &archive_index {
        if entry.kind == EntryKind::Submenu {
            continue;
        }
        if let Some(existing) = dest_index.get(logical) {
            if existing.kind != entry.kind {
                warn!(item = %logical, "match has a different item kind, skipped");
                continue;
            }
            fs::copy(&entry.path, &existing.path)?;
            debug!(item = %logical, "overwrote matching item");
            if entry.kind == EntryKind::Leaf {
                report.updated += 1;
            }
        }
    }

    // Phase 2: append everything new. BTreeMap order puts parents before
    // their children, so submenus exist by the time their contents arrive.
    let mut created: HashMap<LogicalPath, PathBuf> = HashMap::new();
    for (logical, entry) in &archive_index {
        if entry.kind == EntryKind::Internal || dest_index.contains_key(logical) {
            continue;
        }
        match materialize(store, dest_root, archive_root, logical, entry, &mut created) {
            Ok(true) => report.created += 1,
            Ok(false) => {}
            Err(err) => return Err(err),
        }
    }

    info!(
        updated = report.updated,
        created = report.created,
        "archive merged"
    );
    Ok(report)
}

/// Create one archive item in the destination. Returns `false` when the
/// item was skipped (unrecognized section).
fn materialize(
    store: &OrdinalStore,
    dest_root: &Path,
    archive_root: &Path,
    logical: &LogicalPath,
    entry: &IndexEntry,
    created: &mut HashMap<LogicalPath, PathBuf>,
) -> Result<bool, ArchiveError> {
    let segments = logical.segments();
    let section = match segments.first().and_then(|name| Section::parse(name)) {
        Some(section) => section,
        None => {
            warn!(item = %logical, "archive entry outside any known section, skipped");
            return Ok(false);
        }
    };

    // The section folder and, in grouped sections, the class or rule
    // folder keep their literal names.
    let base_depth = section.item_depth();
    if segments.len() <= base_depth {
        // A bare class folder with no items; create it so an empty rule
        // or class still round-trips.
        let folder = dest_root.join(segments.join_as_path());
        if !folder.is_dir() {
            create_base_folder(store, archive_root, &folder, logical, section)?;
        }
        return Ok(false);
    }

    let mut folder = dest_root.join(segments[..base_depth].join_as_path());
    if !folder.is_dir() {
        create_base_folder(
            store,
            archive_root,
            &folder,
            &LogicalPath::new(segments[..base_depth].to_vec()),
            section,
        )?;
    }

    // Descend through display-named submenus, reusing ones created
    // earlier in this pass.
    let mut prefix = LogicalPath::new(segments[..base_depth].to_vec());
    for segment in &segments[base_depth..segments.len() - 1] {
        prefix.push(segment.clone());
        folder = match created.get(&prefix) {
            Some(existing) => existing.clone(),
            None => match find_submenu(store, &folder, segment) {
                Some(existing) => existing,
                None => {
                    let ordinal = store.next_free_ordinal(&folder);
                    let path = store.create_submenu(&folder, ordinal, segment)?;
                    created.insert(prefix.clone(), path.clone());
                    path
                }
            },
        };
    }

    let name = segments
        .last()
        .expect("logical paths below base depth have a final segment");
    let ordinal = store.next_free_ordinal(&folder);
    match entry.kind {
        EntryKind::Submenu => {
            let path = store.create_submenu(&folder, ordinal, name)?;
            created.insert(logical.clone(), path);
        }
        EntryKind::Leaf => {
            fs::copy(&entry.path, folder.join(store.leaf_name(ordinal)))?;
        }
        EntryKind::Internal => unreachable!("internal entries are filtered before materialize"),
    }
    debug!(item = %logical, ordinal = %ordinal, "created item");
    Ok(true)
}

/// Create a missing section, class or rule folder, carrying over the
/// archive folder's gating script when there is one.
fn create_base_folder(
    store: &OrdinalStore,
    archive_root: &Path,
    folder: &Path,
    logical: &LogicalPath,
    section: Section,
) -> Result<(), ArchiveError> {
    fs::create_dir_all(folder)?;
    if section == Section::Rules {
        let rule = archive_root
            .join(logical.segments().join_as_path())
            .join(store.rule_file_name());
        if rule.is_file() {
            fs::copy(&rule, folder.join(store.rule_file_name()))?;
        }
    }
    Ok(())
}

/// Find a direct child submenu by display name.
fn find_submenu(store: &OrdinalStore, folder: &Path, name: &str) -> Option<PathBuf> {
    store
        .list_ordered(folder)
        .into_iter()
        .filter(|item| item.kind == ItemKind::Submenu)
        .find(|item| store.display_name(&item.path).as_deref() == Some(name))
        .map(|item| item.path)
}

/// Index a repository tree by logical path.
///
/// Sections and class/rule folders contribute their literal names as
/// segments; ordinal-named entries contribute their display names, falling
/// back to the ordinal itself when a name is missing. Reserved-name files
/// are indexed as internal so matches keep rule scripts and sidecars in
/// sync. Trash and dot entries are skipped entirely.
fn index_tree(store: &OrdinalStore, root: &Path) -> LogicalIndex {
    let mut index = LogicalIndex::new();
    index_folder(store, root, &LogicalPath::default(), &mut index);
    index
}

fn index_folder(store: &OrdinalStore, folder: &Path, prefix: &LogicalPath, index: &mut LogicalIndex) {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            if is_reserved(&name) {
                continue;
            }
            let ordinal = Ordinal::parse(&name);
            let segment = match ordinal {
                Some(ordinal) => store
                    .display_name(&path)
                    .unwrap_or_else(|| ordinal.to_name()),
                None => name,
            };
            let logical = prefix.child(segment);
            if ordinal.is_some() {
                index.insert(
                    logical.clone(),
                    IndexEntry {
                        path: path.clone(),
                        kind: EntryKind::Submenu,
                    },
                );
            }
            index_folder(store, &path, &logical, index);
            continue;
        }

        if name.starts_with('_') {
            // Rule scripts and sidecars; matched by literal name.
            index.insert(
                prefix.child(name),
                IndexEntry {
                    path,
                    kind: EntryKind::Internal,
                },
            );
            continue;
        }

        let segment = match store.item_at(&path) {
            Some(item) => store
                .display_name(&path)
                .unwrap_or_else(|| item.ordinal.to_name()),
            None => continue,
        };
        index.insert(
            prefix.child(segment),
            IndexEntry {
                path,
                kind: EntryKind::Leaf,
            },
        );
    }
}

/// Join logical segments into a relative filesystem path. Only valid for
/// the literal-name prefix (sections, class and rule folders), where
/// segments are real folder names.
trait JoinAsPath {
    fn join_as_path(&self) -> PathBuf;
}

impl JoinAsPath for [String] {
    fn join_as_path(&self) -> PathBuf {
        self.iter().collect()
    }
}
