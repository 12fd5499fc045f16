//! Dry-run preview: the files a run would create or modify, drawn as a tree.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use crate::materialize::Report;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TreeNode {
    name: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn child_mut(&mut self, name: &str) -> &mut TreeNode {
        let idx = match self.children.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                self.children.push(TreeNode {
                    name: name.to_string(),
                    children: Vec::new(),
                });
                self.children.len() - 1
            }
        };
        &mut self.children[idx]
    }
}

/// Relative paths grouped into a directory tree, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewTree {
    root: TreeNode,
    paths: Vec<PathBuf>,
}

impl PreviewTree {
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut tree = PreviewTree::default();
        for path in paths {
            tree.insert(path.as_ref());
        }
        tree
    }

    /// The created and modified files of `report`, by root-relative path.
    pub fn from_report(report: &Report) -> Self {
        Self::from_paths(report.touched().map(|c| c.relative.as_path()))
    }

    fn insert(&mut self, path: &Path) {
        if self.paths.iter().any(|p| p == path) {
            return;
        }
        let mut node = &mut self.root;
        for component in path.components() {
            if let Component::Normal(name) = component {
                node = node.child_mut(&name.to_string_lossy());
            }
        }
        self.paths.push(path.to_path_buf());
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The file paths in the order they were added.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    /// Renders the tree under a `label` line:
    ///
    /// ```text
    /// studio
    /// └── schemas
    ///     ├── post.ts
    ///     └── index.ts
    /// ```
    pub fn render(&self, label: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", label);
        render_children(&self.root, "", &mut out);
        out
    }
}

fn render_children(node: &TreeNode, prefix: &str, out: &mut String) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        let _ = writeln!(out, "{}{}{}", prefix, connector, child.name);
        let extension = if last { "    " } else { "│   " };
        render_children(child, &format!("{}{}", prefix, extension), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tree() {
        let tree = PreviewTree::from_paths([
            "schemas/post.ts",
            "schemas/index.ts",
            "README.md",
            "schemas/nested/a.ts",
        ]);
        assert_eq!(
            tree.render("studio"),
            "\
studio
├── schemas
│   ├── post.ts
│   ├── index.ts
│   └── nested
│       └── a.ts
└── README.md
"
        );
    }

    #[test]
    fn test_duplicates_are_listed_once() {
        let tree = PreviewTree::from_paths(["a/b.txt", "a/b.txt"]);
        assert_eq!(tree.paths(), vec![PathBuf::from("a/b.txt")]);
        assert_eq!(tree.render("."), ".\n└── a\n    └── b.txt\n");
    }

    #[test]
    fn test_empty_tree() {
        let tree = PreviewTree::default();
        assert!(tree.is_empty());
        assert_eq!(tree.render("out"), "out\n");
    }
}
