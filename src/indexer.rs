//! Seeds `ADD` markers into indexer files that have none yet, so the merge
//! pass has somewhere to put the template's snippets.

use log::debug;

use crate::classify::{is_export_like, is_import_like, is_list_item};
use crate::markers::{self, add_marker_line, Position};
use crate::merge::Outcome;
use crate::snippets::SnippetMap;
use crate::text::{indentation, Lines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Before(usize),
    After(usize),
    End,
}

/// Keys the template wants merged: its `ADD` marker keys in order, or its
/// snippet keys when it has no `ADD` markers.
pub fn needed_keys(template: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for (key, _) in markers::add_markers(template) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    if keys.is_empty() {
        keys = SnippetMap::extract(template).keys().map(str::to_string).collect();
    }
    keys
}

/// Inserts synthetic `ADD` markers into `existing` for every key `template`
/// needs. Files that already carry any marker are left alone.
///
/// `*import*` keys go below the last import-like line (top of file when
/// there is none), `*export*` keys above the first export-like line, and
/// anything else below the last list entry, above the first export, or at
/// the end of the file, whichever is found first.
pub fn seed_markers(existing: &str, template: &str) -> Outcome {
    if markers::has_any_marker(existing) {
        return Outcome::unchanged(existing);
    }
    let keys = needed_keys(template);
    if keys.is_empty() {
        return Outcome::unchanged(existing);
    }

    let source = Lines::parse(existing);
    let lines = &source.lines;
    let last_import = lines.iter().rposition(|l| is_import_like(l));
    let first_export = lines.iter().position(|l| is_export_like(l));
    let last_list_item = lines.iter().rposition(|l| is_list_item(l));

    let mut placed: Vec<(Slot, String)> = Vec::with_capacity(keys.len());
    for key in &keys {
        let lowered = key.to_lowercase();
        let (slot, position) = if lowered.contains("import") {
            match last_import {
                Some(idx) => (Slot::After(idx), Position::Below),
                None if !lines.is_empty() => (Slot::Before(0), Position::Below),
                None => (Slot::End, Position::Below),
            }
        } else if lowered.contains("export") {
            match first_export {
                Some(idx) => (Slot::Before(idx), Position::Above),
                None => (Slot::End, Position::Below),
            }
        } else {
            match (last_list_item, first_export) {
                (Some(idx), _) => (Slot::After(idx), Position::Below),
                (None, Some(idx)) => (Slot::Before(idx), Position::Above),
                (None, None) => (Slot::End, Position::Below),
            }
        };
        let indent = match slot {
            Slot::Before(idx) | Slot::After(idx) => indentation(&lines[idx]),
            Slot::End => "",
        };
        debug!("Seeding marker for '{}' at {:?}", key, slot);
        placed.push((slot, add_marker_line(indent, key, position)));
    }

    let emit = |out: &mut Vec<String>, slot: Slot| {
        for (s, marker) in &placed {
            if *s == slot {
                out.push(marker.clone());
            }
        }
    };
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + placed.len());
    for (idx, line) in lines.iter().enumerate() {
        emit(&mut out, Slot::Before(idx));
        out.push(line.clone());
        emit(&mut out, Slot::After(idx));
    }
    emit(&mut out, Slot::End);

    Outcome::changed(source.render(&out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::smart_merge;

    const TEMPLATE: &str = "\
// START OF IMPORTS
import {{.Name}} from './{{.Name}}'
// END OF IMPORTS
// ADD IMPORTS BELOW

export const schemaTypes = [
  // START OF VALUE
  {{.Name}},
  // END OF VALUE
  // ADD VALUE BELOW
]
";

    #[test]
    fn test_needed_keys_prefers_add_markers() {
        assert_eq!(needed_keys(TEMPLATE), vec!["IMPORTS", "VALUE"]);
        assert_eq!(needed_keys("// START OF A\na\n// END OF A"), vec!["A"]);
    }

    #[test]
    fn test_seed_markers_near_imports_and_list() {
        let existing = "import a from './a'\n\nexport const schemaTypes = [\n  a,\n]\n";
        let seeded = seed_markers(existing, TEMPLATE);
        assert!(seeded.changed);
        assert_eq!(
            seeded.content,
            "import a from './a'\n// ADD IMPORTS BELOW\n\nexport const schemaTypes = [\n  a,\n  // ADD VALUE BELOW\n]\n"
        );
    }

    #[test]
    fn test_seed_markers_falls_back_to_export_and_end() {
        let template = "// START OF EXPORTS\nexport * from './x'\n// END OF EXPORTS\n// START OF OTHER\nx\n// END OF OTHER\n";
        let existing = "const y = 1;\nexport default y;\n";
        let seeded = seed_markers(existing, template);
        assert_eq!(
            seeded.content,
            "const y = 1;\n// ADD EXPORTS ABOVE\n// ADD OTHER ABOVE\nexport default y;\n"
        );

        let plain = seed_markers("const y = 1;\n", "// START OF OTHER\nx\n// END OF OTHER\n");
        assert_eq!(plain.content, "const y = 1;\n// ADD OTHER BELOW\n");
    }

    #[test]
    fn test_import_without_imports_goes_to_top() {
        let seeded = seed_markers("const y = 1;\n", "// ADD MODEL IMPORT BELOW\n");
        assert_eq!(seeded.content, "// ADD MODEL IMPORT BELOW\nconst y = 1;\n");
    }

    #[test]
    fn test_files_with_markers_are_skipped() {
        let existing = "import a from './a'\n// ADD SOMETHING ELSE BELOW\n";
        assert_eq!(seed_markers(existing, TEMPLATE), Outcome::unchanged(existing));
    }

    #[test]
    fn test_seeded_markers_feed_the_merge() {
        let template = TEMPLATE.replace("{{.Name}}", "post");
        let existing = "import a from './a'\n\nexport const schemaTypes = [\n  a,\n]\n";
        let seeded = seed_markers(existing, &template);
        let merged = smart_merge(&seeded.content, &template);
        assert_eq!(
            merged.content,
            "import a from './a'\n// ADD IMPORTS BELOW\nimport post from './post'\n\nexport const schemaTypes = [\n  a,\n  // ADD VALUE BELOW\n  post,\n]\n"
        );
        assert!(!smart_merge(&merged.content, &template).changed);
    }
}
