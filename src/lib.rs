//! Template-driven file generation with idempotent merging.
//!
//! A [`Template`] describes a tree of files whose names and contents may use
//! `{{.Key}}` placeholders. Files that do not exist yet are written as-is;
//! files that do exist are merged: code between `// START OF KEY` and
//! `// END OF KEY` in the template is inserted next to the matching
//! `// ADD KEY ABOVE|BELOW` marker in the file, unless it is already there.
//! Running the same template twice leaves the tree unchanged.

pub mod classify;
pub mod cleanup;
pub mod config;
pub mod error;
pub mod indexer;
pub mod insertion;
pub mod markers;
pub mod materialize;
pub mod merge;
pub mod placeholders;
pub mod preview;
pub mod snippets;
pub mod template;
pub mod text;

pub use config::{MergeConfig, ProjectConfig};
pub use error::{Error, Result};
pub use insertion::InsertionAction;
pub use materialize::{ChangeKind, FileChange, Materializer, Report};
pub use merge::{smart_merge, Outcome};
pub use placeholders::Placeholders;
pub use preview::PreviewTree;
pub use snippets::{Extraction, SnippetMap};
pub use template::{Node, PathGroup, Template};
