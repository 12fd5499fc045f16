//! Marker-aware merging of template snippets into an existing file.
//!
//! For every `// ADD <key> ABOVE|BELOW` line in the existing file, the
//! snippet for `<key>` is looked up in the template's snippet map and
//! inserted next to the marker unless the file already contains it. Marker
//! lines are kept, so the same file can be merged again later. Running the
//! merge twice with the same template changes nothing the second time.

use log::debug;
use std::collections::HashSet;

use crate::classify::import_module;
use crate::markers::{self, parse_line, Marker, Position};
use crate::snippets::SnippetMap;
use crate::text::{
    contains_run, indentation, normalized_lines, reindent, same_block, strip_whitespace, Lines,
};

/// Content after a merge step, plus whether the step modified it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub content: String,
    pub changed: bool,
}

impl Outcome {
    pub fn unchanged(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            changed: false,
        }
    }

    pub fn changed(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            changed: true,
        }
    }

    /// Runs the next step on this content, keeping `changed` sticky.
    pub fn then<F>(self, step: F) -> Self
    where
        F: FnOnce(&str) -> Outcome,
    {
        let next = step(&self.content);
        Self {
            content: next.content,
            changed: self.changed || next.changed,
        }
    }
}

/// Merges the snippets declared in `template` into `existing`.
pub fn smart_merge(existing: &str, template: &str) -> Outcome {
    merge_snippets(existing, &SnippetMap::extract(template))
}

/// Merges `snippets` into `existing` at its `ADD` markers.
pub fn merge_snippets(existing: &str, snippets: &SnippetMap) -> Outcome {
    if snippets.is_empty() || markers::add_markers(existing).is_empty() {
        return Outcome::unchanged(existing);
    }

    let source = Lines::parse(existing);
    let mut out: Vec<String> = Vec::with_capacity(source.lines.len());
    let mut handled: HashSet<&str> = HashSet::new();
    let mut changed = false;

    for (idx, line) in source.lines.iter().enumerate() {
        let Some(Marker::Add { key, position }) = parse_line(line) else {
            out.push(line.clone());
            continue;
        };
        if !handled.insert(key) {
            out.push(line.clone());
            continue;
        }
        let Some((resolved, snippet)) = snippets.resolve(key) else {
            debug!("No snippet for marker '{}'", key);
            out.push(line.clone());
            continue;
        };

        let current: Vec<&str> = out
            .iter()
            .chain(source.lines[idx..].iter())
            .map(String::as_str)
            .collect();
        if is_present(&current, snippet) {
            debug!("Snippet '{}' already present", resolved);
            out.push(line.clone());
            continue;
        }

        let block = reindent(snippet, indentation(line));
        match position {
            Position::Below => {
                out.push(line.clone());
                let next = &source.lines[idx + 1..];
                if next.len() >= block.len() && same_block(&next[..block.len()], &block) {
                    continue;
                }
                debug!("Inserted snippet '{}' below '{}'", resolved, key);
                out.extend(block);
                changed = true;
            }
            Position::Above => {
                let adjacent = out.len() >= block.len()
                    && same_block(&out[out.len() - block.len()..], &block);
                if !adjacent {
                    debug!("Inserted snippet '{}' above '{}'", resolved, key);
                    out.extend(block);
                    changed = true;
                }
                out.push(line.clone());
            }
        }
    }

    if !changed {
        return Outcome::unchanged(existing);
    }
    Outcome::changed(source.render(&out))
}

/// Whether `snippet` is already in `file_lines`.
///
/// True when the snippet's normalized lines appear as a contiguous run of the
/// file's normalized lines, when its first line imports a module the file
/// already imports, or when its first line is a `,`-terminated list entry
/// the file already has (ignoring whitespace). An empty snippet counts as
/// present.
pub fn is_present<S: AsRef<str>>(file_lines: &[S], snippet: &[String]) -> bool {
    let wanted = normalized_lines(snippet.iter().map(String::as_str));
    let Some(first) = wanted.first() else {
        return true;
    };

    let file = normalized_lines(file_lines.iter().map(|l| l.as_ref()));
    if contains_run(&file, &wanted) {
        return true;
    }

    if let Some(module) = import_module(first) {
        if file_lines
            .iter()
            .any(|l| import_module(l.as_ref()) == Some(module))
        {
            return true;
        }
    }

    if first.ends_with(',') {
        let entry = strip_whitespace(first);
        if file_lines
            .iter()
            .any(|l| strip_whitespace(l.as_ref()) == entry)
        {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMPORTS_TEMPLATE: &str = "// START OF IMPORTS\nimport bar from \"bar\"\n// END OF IMPORTS\n";

    #[test]
    fn test_scenario_import_below_marker() {
        let existing = "// ADD IMPORTS BELOW\nexport const items = [\n  foo,\n];\n";
        let first = smart_merge(existing, IMPORTS_TEMPLATE);
        assert!(first.changed);
        assert_eq!(
            first.content,
            "// ADD IMPORTS BELOW\nimport bar from \"bar\"\nexport const items = [\n  foo,\n];\n"
        );

        let second = smart_merge(&first.content, IMPORTS_TEMPLATE);
        assert!(!second.changed);
        assert_eq!(second.content, first.content);
    }

    #[test]
    fn test_round_trip_into_unrelated_file() {
        let existing = "line one\n// ADD X BELOW\nline two";
        let merged = smart_merge(existing, "// START OF X\nfoo\n// END OF X");
        assert_eq!(merged.content, "line one\n// ADD X BELOW\nfoo\nline two");
    }

    #[test]
    fn test_above_marker_keeps_indentation() {
        let existing = "export const schemaTypes = [\n  post,\n  // ADD VALUE 1 ABOVE\n]\n";
        let template = "[\n  // START OF VALUE 1\n  author,\n  // END OF VALUE 1\n]";
        let merged = smart_merge(existing, template);
        assert_eq!(
            merged.content,
            "export const schemaTypes = [\n  post,\n  author,\n  // ADD VALUE 1 ABOVE\n]\n"
        );
        assert!(!smart_merge(&merged.content, template).changed);
    }

    #[test]
    fn test_duplicate_import_with_different_spacing() {
        let existing = "import { A } from 'mod';\n// ADD IMPORTS BELOW\n";
        let template = "// START OF IMPORTS\nimport {A} from \"mod\"\n// END OF IMPORTS";
        let merged = smart_merge(existing, template);
        assert!(!merged.changed);
        assert_eq!(merged.content, existing);
    }

    #[test]
    fn test_trailing_comma_entry_is_not_duplicated() {
        let existing = "const list = [\n    author ,\n    // ADD VALUE BELOW\n];\n";
        let template = "// START OF VALUE\nauthor,\n// END OF VALUE";
        assert!(!smart_merge(existing, template).changed);
    }

    #[test]
    fn test_entry_prefix_is_not_mistaken_for_presence() {
        let existing = "[\n  blogAuthor,\n  // ADD VALUE ABOVE\n]";
        let template = "// START OF VALUE\nAuthor,\n// END OF VALUE";
        let merged = smart_merge(existing, template);
        assert_eq!(merged.content, "[\n  blogAuthor,\n  Author,\n  // ADD VALUE ABOVE\n]");
    }

    #[test]
    fn test_first_marker_per_key_wins() {
        let existing = "// ADD X BELOW\na\n// ADD X BELOW\n";
        let merged = smart_merge(existing, "// START OF X\nfoo\n// END OF X");
        assert_eq!(merged.content, "// ADD X BELOW\nfoo\na\n// ADD X BELOW\n");
    }

    #[test]
    fn test_fuzzy_key_lookup() {
        let existing = "class A {\n    // ADD property variable ABOVE\n}\n";
        let template = "// START OF PROPERTY VARIABLE: String\nvar name: String = \"\"\n// END OF PROPERTY VARIABLE: String";
        let merged = smart_merge(existing, template);
        assert_eq!(
            merged.content,
            "class A {\n    var name: String = \"\"\n    // ADD property variable ABOVE\n}\n"
        );
    }

    #[test]
    fn test_missing_snippet_is_a_no_op() {
        let existing = "// ADD NOTHING BELOW\n";
        let merged = smart_merge(existing, "// START OF X\nfoo\n// END OF X");
        assert_eq!(merged, Outcome::unchanged(existing));
    }

    #[test]
    fn test_same_snippet_under_two_keys_is_inserted_once() {
        let existing = "// ADD A BELOW\n// ADD B BELOW\n";
        let template = "// START OF A\nfoo\n// END OF A\n// START OF B\nfoo\n// END OF B";
        let merged = smart_merge(existing, template);
        assert_eq!(merged.content, "// ADD A BELOW\nfoo\n// ADD B BELOW\n");
    }

    #[test]
    fn test_crlf_is_preserved() {
        let existing = "a\r\n// ADD X BELOW\r\nb\r\n";
        let merged = smart_merge(existing, "// START OF X\nfoo\n// END OF X");
        assert_eq!(merged.content, "a\r\n// ADD X BELOW\r\nfoo\r\nb\r\n");
    }

    #[test]
    fn test_idempotent_over_several_markers() {
        let existing = "import x from 'x'\n// ADD IMPORTS BELOW\n\nexport const schemaTypes = [\n  x,\n  // ADD VALUE ABOVE\n]\n";
        let template = "// START OF IMPORTS\nimport post from './post'\n// END OF IMPORTS\n// START OF VALUE\npost,\n// END OF VALUE\n";
        let once = smart_merge(existing, template);
        let twice = smart_merge(&once.content, template);
        assert!(once.changed);
        assert_eq!(twice, Outcome::unchanged(once.content.clone()));
    }

    #[test]
    fn test_outcome_then_keeps_changed() {
        let outcome = Outcome::changed("a").then(|c| Outcome::unchanged(format!("{}b", c)));
        assert_eq!(outcome, Outcome::changed("ab"));
    }
}
