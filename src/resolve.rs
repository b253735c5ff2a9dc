//! Resolution engine: selection context to ordered menu rows.
//!
//! Given the classes of the current selection, the active repositories and
//! the layout preferences, decide which stored folders apply, enumerate
//! their items and partition them into rows. The caller renders the rows;
//! the row count of each half is part of this engine's contract so the two
//! halves can be balanced visually.

use crate::repository::Repository;
use crate::rules::{evaluate_rule, ScriptRunner};
use crate::store::{is_reserved, OrdinalStore};
use crate::types::{Item, Section, Selection, NO_SELECTION_TOKEN};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Class token of the host's generic group container. Selected groups also
/// contribute a synthetic token derived from their instance name.
pub const GROUP_CLASS: &str = "Group";

/// Order in which class-matched and rule-matched folders are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineOrder {
    #[default]
    ClassRule,
    RuleClass,
}

/// Layout preferences for a resolution pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Starting row capacity for the contextual half.
    #[serde(default = "default_row_amount")]
    pub row_amount_selection: usize,

    /// Starting row capacity for the non-contextual half.
    #[serde(default = "default_row_amount")]
    pub row_amount_all: usize,

    /// Capacity increase applied every time a row closes, producing the
    /// triangular growth across rows.
    #[serde(default = "default_row_step")]
    pub row_step_size: usize,

    /// Alternate front/back insertion inside a row, keeping new items near
    /// the sides so existing muscle memory survives.
    #[serde(default = "default_true")]
    pub side_insertion: bool,

    /// Swap which half gets its row order reversed.
    #[serde(default)]
    pub mirrored: bool,

    #[serde(default)]
    pub combine_order: CombineOrder,
}

fn default_row_amount() -> usize {
    3
}

fn default_row_step() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            row_amount_selection: default_row_amount(),
            row_amount_all: default_row_amount(),
            row_step_size: default_row_step(),
            side_insertion: default_true(),
            mirrored: false,
            combine_order: CombineOrder::default(),
        }
    }
}

/// An item selected for display, tagged with the extra repository it came
/// from (`None` for the local repository).
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub item: Item,
    pub repository: Option<String>,
}

/// One half of the menu: ordered rows of ordered items.
#[derive(Debug, Clone, Default)]
pub struct MenuHalf {
    pub rows: Vec<Vec<ResolvedItem>>,
}

impl MenuHalf {
    /// Row count, used by the caller to balance the two halves.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Full resolution output.
#[derive(Debug, Clone, Default)]
pub struct Menu {
    /// Selection-dependent half: class- and rule-matched folders.
    pub contextual: MenuHalf,
    /// Selection-independent half: every repository's `All` section.
    pub global: MenuHalf,
}

/// Resolution engine over an injected store, script runner and layout.
pub struct Resolver<'a> {
    store: &'a OrdinalStore,
    runner: &'a dyn ScriptRunner,
    layout: &'a LayoutConfig,
}

/// A qualifying folder plus the repository tag of its origin.
type TaggedFolder = (PathBuf, Option<String>);

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a OrdinalStore,
        runner: &'a dyn ScriptRunner,
        layout: &'a LayoutConfig,
    ) -> Self {
        Resolver {
            store,
            runner,
            layout,
        }
    }

    /// Resolve both menu halves for the given selection.
    pub fn resolve(&self, repositories: &[Repository], selection: &Selection) -> Menu {
        let contextual_items = self.enumerate(self.contextual_folders(repositories, selection));
        let global_items = self.enumerate(self.global_folders(repositories));

        let mut contextual = MenuHalf {
            rows: partition_rows(
                contextual_items,
                self.layout.row_amount_selection,
                self.layout.row_step_size,
                self.layout.side_insertion,
            ),
        };
        let mut global = MenuHalf {
            rows: partition_rows(
                global_items,
                self.layout.row_amount_all,
                self.layout.row_step_size,
                self.layout.side_insertion,
            ),
        };

        // Exactly one half grows away from the center; the mirrored flag
        // picks which.
        if self.layout.mirrored {
            global.rows.reverse();
        } else {
            contextual.rows.reverse();
        }

        debug!(
            contextual_rows = contextual.row_count(),
            global_rows = global.row_count(),
            "resolved menu"
        );

        Menu { contextual, global }
    }

    /// The folders feeding the contextual half: class matches combined with
    /// rule matches, or rule matches alone when a matched rule asked to
    /// ignore classes.
    fn contextual_folders(
        &self,
        repositories: &[Repository],
        selection: &Selection,
    ) -> Vec<TaggedFolder> {
        let mut ignore_classes = false;
        let mut rule_folders: Vec<TaggedFolder> = Vec::new();

        for repository in repositories {
            for rule_dir in rule_dirs(repository) {
                if let Some(matched) =
                    evaluate_rule(self.store, self.runner, &rule_dir, selection)
                {
                    ignore_classes |= matched.ignore_classes;
                    rule_folders.push((matched.path, repository.name().map(String::from)));
                }
            }
        }

        if ignore_classes {
            return rule_folders;
        }

        let class_folders = self.class_folders(repositories, selection);
        match self.layout.combine_order {
            CombineOrder::ClassRule => {
                let mut folders = class_folders;
                folders.extend(rule_folders);
                folders
            }
            CombineOrder::RuleClass => {
                let mut folders = rule_folders;
                folders.extend(class_folders);
                folders
            }
        }
    }

    /// Class-matched folders for every candidate token set of the
    /// selection, deduplicated in first-match order.
    fn class_folders(
        &self,
        repositories: &[Repository],
        selection: &Selection,
    ) -> Vec<TaggedFolder> {
        let candidates = candidate_token_sets(selection);
        let mut folders: Vec<TaggedFolder> = Vec::new();

        for repository in repositories {
            let tag = repository.name().map(String::from);
            for candidate in &candidates {
                if let [token] = candidate.as_slice() {
                    let folder = repository.class_path(Section::Single, token);
                    if folder.is_dir() && !folders.iter().any(|(path, _)| *path == folder) {
                        folders.push((folder, tag.clone()));
                    }
                    continue;
                }

                let wanted: HashSet<&str> = candidate.iter().map(String::as_str).collect();
                for combination in combination_dirs(repository) {
                    let name = match combination.file_name().and_then(|n| n.to_str()) {
                        Some(name) => name.to_string(),
                        None => continue,
                    };
                    // A folder may be gated by a superset of the classes
                    // actually selected; subset semantics, not equality.
                    let tagged: HashSet<&str> = name.split('-').collect();
                    if wanted.is_subset(&tagged)
                        && !folders.iter().any(|(path, _)| *path == combination)
                    {
                        folders.push((combination.clone(), tag.clone()));
                    }
                }
            }
        }

        folders
    }

    /// Every repository's `All` folder, selection-independent.
    fn global_folders(&self, repositories: &[Repository]) -> Vec<TaggedFolder> {
        repositories
            .iter()
            .map(|repository| {
                (
                    repository.section_path(Section::All),
                    repository.name().map(String::from),
                )
            })
            .collect()
    }

    /// Flatten qualifying folders into their ordered items.
    fn enumerate(&self, folders: Vec<TaggedFolder>) -> Vec<ResolvedItem> {
        folders
            .into_iter()
            .flat_map(|(folder, tag)| {
                self.store
                    .list_ordered(&folder)
                    .into_iter()
                    .map(move |item| ResolvedItem {
                        item,
                        repository: tag.clone(),
                    })
            })
            .collect()
    }
}

/// Candidate class token sets for a selection.
///
/// The literal distinct classes always form one candidate. When a group
/// container is selected, a second candidate replaces the generic group
/// token with synthetic tokens derived from the group instance names
/// (trailing digits stripped), capturing user-named group variants.
pub fn candidate_token_sets(selection: &Selection) -> Vec<Vec<String>> {
    let mut classes: Vec<String> = Vec::new();
    for node in &selection.nodes {
        if !classes.contains(&node.class) {
            classes.push(node.class.clone());
        }
    }

    if classes.is_empty() {
        return vec![vec![NO_SELECTION_TOKEN.to_string()]];
    }

    let mut group_tokens: Vec<String> = Vec::new();
    if classes.iter().any(|class| class == GROUP_CLASS) {
        for node in &selection.nodes {
            if node.class != GROUP_CLASS {
                continue;
            }
            let derived = node.name.trim_end_matches(|c: char| c.is_ascii_digit());
            if !derived.is_empty()
                && derived != GROUP_CLASS
                && !group_tokens.iter().any(|token| token == derived)
            {
                group_tokens.push(derived.to_string());
            }
        }
    }

    let mut candidates = vec![classes.clone()];
    if !group_tokens.is_empty() {
        let mut named: Vec<String> = classes
            .into_iter()
            .filter(|class| class != GROUP_CLASS)
            .collect();
        named.extend(group_tokens);
        candidates.push(named);
    }
    candidates
}

/// Partition a flat item list into rows.
///
/// Rows start at `capacity` items and grow by `step` each time a row
/// closes. With side insertion, items alternate between the front and the
/// back of the current row (front first), producing a near-symmetric row;
/// otherwise they are appended. A final partially-filled row is still
/// emitted.
pub fn partition_rows<T>(
    items: impl IntoIterator<Item = T>,
    capacity: usize,
    step: usize,
    side_insertion: bool,
) -> Vec<Vec<T>> {
    let mut capacity = capacity.max(1);
    let mut rows: Vec<Vec<T>> = Vec::new();
    let mut row: Vec<T> = Vec::new();

    for item in items {
        if side_insertion && row.len() % 2 == 0 {
            row.insert(0, item);
        } else {
            row.push(item);
        }

        if row.len() >= capacity {
            rows.push(std::mem::take(&mut row));
            capacity += step;
        }
    }

    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

/// Rule folders of a repository, sorted for determinism. Names ending in
/// `_` are parked rules and skipped.
fn rule_dirs(repository: &Repository) -> Vec<PathBuf> {
    let rules_path = repository.section_path(Section::Rules);
    let entries = match fs::read_dir(&rules_path) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !is_reserved(name) && !name.ends_with('_'))
        .collect();
    names.sort();
    names.into_iter().map(|name| rules_path.join(name)).collect()
}

/// Combination folders under a repository's `Multiple` section.
fn combination_dirs(repository: &Repository) -> Vec<PathBuf> {
    let multiple_path = repository.section_path(Section::Multiple);
    let entries = match fs::read_dir(&multiple_path) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !is_reserved(name))
        .collect();
    names.sort();
    names
        .into_iter()
        .map(|name| multiple_path.join(name))
        .collect()
}
