//! Filesystem-backed popup menu repository engine.
//!
//! Menu items are scripts stored in an ordinary folder tree; sibling order
//! is encoded in fixed-width ordinal file names, so the whole menu can be
//! edited, versioned and shared with plain filesystem tools. The crate
//! covers the storage and naming protocol, context resolution (which items
//! apply to the current selection), rule evaluation, the self-healing
//! renumber pass, drag-and-drop reordering and archive export/merge.
//!
//! Rendering and host integration stay outside: the host supplies a
//! [`rules::ScriptRunner`] and draws the [`resolve::Menu`] this crate
//! returns.

pub mod archive;
pub mod config;
pub mod error;
pub mod header;
pub mod logging;
pub mod repair;
pub mod reorder;
pub mod repository;
pub mod resolve;
pub mod rules;
pub mod store;
pub mod types;

pub use config::HotboxConfig;
pub use error::{ArchiveError, ConfigError, RuleError, StoreError};
pub use repository::{Manager, Repository};
pub use resolve::{Menu, Resolver};
pub use store::OrdinalStore;
pub use types::{Item, ItemKind, Ordinal, Section, Selection};
