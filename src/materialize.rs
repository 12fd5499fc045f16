use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cleanup;
use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::indexer;
use crate::insertion::{self, InsertionAction};
use crate::markers::strip_marker_lines;
use crate::merge::{merge_snippets, Outcome};
use crate::placeholders::Placeholders;
use crate::preview::PreviewTree;
use crate::snippets::SnippetMap;
use crate::template::{Node, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the output root.
    pub relative: PathBuf,
    pub kind: ChangeKind,
}

/// Every file a template run visited, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub changes: Vec<FileChange>,
}

impl Report {
    /// Files that were (or would be) created or modified.
    pub fn touched(&self) -> impl Iterator<Item = &FileChange> {
        self.changes
            .iter()
            .filter(|c| c.kind != ChangeKind::Unchanged)
    }

    pub fn touched_paths(&self) -> Vec<PathBuf> {
        self.touched().map(|c| c.path.clone()).collect()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    pub fn extend(&mut self, other: Report) {
        self.changes.extend(other.changes);
    }
}

/// Walks a template tree and writes or merges every file it describes.
pub struct Materializer {
    placeholders: Placeholders,
    merge: MergeConfig,
    dry_run: bool,
}

impl Materializer {
    pub fn new(placeholders: Placeholders, dry_run: bool) -> Self {
        Self {
            placeholders,
            merge: MergeConfig::default(),
            dry_run,
        }
    }

    pub fn with_merge_config(mut self, merge: MergeConfig) -> Self {
        self.merge = merge;
        self
    }

    /// Materializes `template` under `root`. In dry-run mode the same report
    /// is computed but nothing is written.
    pub fn run(&self, template: &Template, root: &Path) -> Result<Report> {
        self.walk_template(template, root, !self.dry_run)
    }

    /// Computes the dry-run plan of `template` regardless of the mode.
    pub fn plan(&self, template: &Template, root: &Path) -> Result<Report> {
        self.walk_template(template, root, false)
    }

    pub fn preview(&self, template: &Template, root: &Path) -> Result<PreviewTree> {
        Ok(PreviewTree::from_report(&self.plan(template, root)?))
    }

    fn walk_template(&self, template: &Template, root: &Path, write: bool) -> Result<Report> {
        let root = absolute(root)?;
        let mut report = Report::default();
        for group in &template.file_paths {
            let base = root.join(self.placeholders.substitute(&group.path));
            if write {
                Self::ensure_dir_exists(&base)?;
            }
            self.walk(&group.nodes, &base, &root, write, &mut report)?;
        }
        if !write {
            info!(
                "[DRY RUN] {} file(s) would be created, {} modified",
                report.count(ChangeKind::Created),
                report.count(ChangeKind::Modified)
            );
        }
        Ok(report)
    }

    fn walk(
        &self,
        nodes: &[Node],
        dir: &Path,
        root: &Path,
        write: bool,
        report: &mut Report,
    ) -> Result<()> {
        for node in nodes {
            let name = self.placeholders.substitute(&node.name);
            if name.trim().is_empty() {
                warn!("Skipping node without a name under {:?}", dir);
                continue;
            }
            let path = dir.join(&name);
            if node.is_dir() {
                if write {
                    Self::ensure_dir_exists(&path)?;
                }
                self.walk(&node.children, &path, root, write, report)?;
                continue;
            }

            let kind = self.materialize_file(node, &path, write)?;
            let relative = path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf();
            report.changes.push(FileChange { path, relative, kind });
        }
        Ok(())
    }

    fn materialize_file(&self, node: &Node, path: &Path, write: bool) -> Result<ChangeKind> {
        let body = self.placeholders.substitute(&node.code);

        if !path.exists() {
            let content = strip_marker_lines(&body, node.is_indexer);
            if write {
                if let Some(parent) = path.parent() {
                    Self::ensure_dir_exists(parent)?;
                }
                fs::write(path, content).map_err(|e| {
                    error!("Failed to write output file: {:?}", path);
                    Error::io("Failed to write", path, e)
                })?;
                info!("{:?}", path);
            } else {
                info!("[DRY RUN] Would create: {:?}", path);
            }
            return Ok(ChangeKind::Created);
        }

        let existing = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read output file: {:?}", path);
            Error::io("Failed to read", path, e)
        })?;
        let outcome = self.merge_existing(node, &existing, &body);
        if !outcome.changed {
            debug!("Up to date: {:?}", path);
            return Ok(ChangeKind::Unchanged);
        }

        if write {
            fs::write(path, &outcome.content).map_err(|e| {
                error!("Failed to write output file: {:?}", path);
                Error::io("Failed to write", path, e)
            })?;
            info!("{:?}", path);
        } else {
            info!("[DRY RUN] Would modify: {:?}", path);
        }
        Ok(ChangeKind::Modified)
    }

    /// The merge pipeline for a file that already exists: marker seeding,
    /// insertion actions, the snippet merge, then cleanup.
    pub fn merge_existing(&self, node: &Node, existing: &str, body: &str) -> Outcome {
        let snippets = SnippetMap::extract(body);
        let mut outcome = Outcome::unchanged(existing);

        if node.is_indexer && self.merge.seed_indexer_markers {
            outcome = outcome.then(|c| indexer::seed_markers(c, body));
        }
        if !node.insertions.is_empty() {
            let actions: Vec<InsertionAction> = node
                .insertions
                .iter()
                .map(|a| a.map_text(|s| self.placeholders.substitute(s)))
                .collect();
            outcome = outcome.then(|c| insertion::apply_all(c, &actions, &snippets));
        }
        outcome = outcome.then(|c| merge_snippets(c, &snippets));
        if self.merge.cleanup && outcome.changed {
            outcome = outcome.then(cleanup::cleanup);
        }
        // Steps can undo each other; only the final bytes count.
        outcome.changed = outcome.content != existing;
        outcome
    }

    /// Ensures that the specified directory exists, creating it if necessary.
    fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| {
                error!("Failed to create directory: {:?}", path);
                Error::io("Failed to create directory", path, e)
            })?;
        }
        Ok(())
    }
}

fn absolute(root: &Path) -> Result<PathBuf> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Error::io("Failed to resolve current directory for", root, e))?;
    Ok(cwd.join(root))
}
