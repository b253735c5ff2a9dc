//! Core types shared across the hotbox repository engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Width of the zero-padded ordinal names on disk (`"001"`, `"002"`, ...).
pub const ORDINAL_WIDTH: usize = 3;

/// Synthetic class token used when nothing is selected.
pub const NO_SELECTION_TOKEN: &str = "No Selection";

/// Position of an item among its siblings, backed by its on-disk name.
///
/// Ordinals start at 1. Within a healthy folder they are exactly `1..=N`
/// with no gaps; repair restores that invariant after mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ordinal(u32);

impl Ordinal {
    pub const FIRST: Ordinal = Ordinal(1);

    /// Create an ordinal. Returns `None` for zero, ordinals are 1-based.
    pub fn new(value: u32) -> Option<Self> {
        if value == 0 {
            None
        } else {
            Some(Ordinal(value))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Parse a fixed-width ordinal name such as `"007"`.
    ///
    /// Rejects names of the wrong width, non-digit names and `"000"`.
    pub fn parse(name: &str) -> Option<Self> {
        if name.len() != ORDINAL_WIDTH || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse::<u32>().ok().and_then(Ordinal::new)
    }

    /// Render as the fixed-width on-disk name.
    pub fn to_name(self) -> String {
        format!("{:0width$}", self.0, width = ORDINAL_WIDTH)
    }

    pub fn next(self) -> Ordinal {
        Ordinal(self.0 + 1)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = ORDINAL_WIDTH)
    }
}

/// The two storable item shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A script file with a metadata header.
    Leaf,
    /// A directory holding nested items plus a name sidecar.
    Submenu,
}

/// A stored menu item, as returned by ordered listing.
#[derive(Debug, Clone)]
pub struct Item {
    /// Absolute path of the file or directory backing the item.
    pub path: PathBuf,
    pub ordinal: Ordinal,
    pub kind: ItemKind,
}

/// Top-level sections of a repository root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Single,
    Multiple,
    All,
    Rules,
    Templates,
}

impl Section {
    pub const ALL_SECTIONS: [Section; 5] = [
        Section::Single,
        Section::Multiple,
        Section::All,
        Section::Rules,
        Section::Templates,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Section::Single => "Single",
            Section::Multiple => "Multiple",
            Section::All => "All",
            Section::Rules => "Rules",
            Section::Templates => "Templates",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Section::ALL_SECTIONS
            .into_iter()
            .find(|section| section.dir_name() == name)
    }

    /// Depth below the repository root at which items live: `All` and
    /// `Templates` hold items directly, the other sections group them one
    /// level down (class folder or rule folder).
    pub fn item_depth(self) -> usize {
        match self {
            Section::All | Section::Templates => 1,
            Section::Single | Section::Multiple | Section::Rules => 2,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One selected node of the host's node graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedNode {
    /// The node's class token (type name).
    pub class: String,
    /// The node's instance name, used to derive synthetic tokens for
    /// user-named group variants.
    pub name: String,
}

impl SelectedNode {
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        SelectedNode {
            class: class.into(),
            name: name.into(),
        }
    }
}

/// The current selection context a resolution pass runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub nodes: Vec<SelectedNode>,
}

impl Selection {
    pub fn empty() -> Self {
        Selection::default()
    }

    pub fn of(nodes: Vec<SelectedNode>) -> Self {
        Selection { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Display-name-based path of an item, used for cross-repository identity
/// during archive merge. Segments are display names, never ordinals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    pub fn new(segments: Vec<String>) -> Self {
        LogicalPath { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn child(&self, segment: impl Into<String>) -> LogicalPath {
        let mut child = self.clone();
        child.push(segment);
        child
    }

    pub fn parent(&self) -> Option<LogicalPath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(LogicalPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for LogicalPath {
    /// Render with `/` separators. Separators embedded in a display name
    /// are escaped so two distinct paths never render identically.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped: Vec<String> = self
            .segments
            .iter()
            .map(|segment| segment.replace('/', "\\/"))
            .collect();
        f.write_str(&escaped.join("/"))
    }
}
