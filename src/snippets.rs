use log::debug;

use crate::markers::{parse_line, Marker};
use crate::text::dedent;

/// Snippet code keyed by the label of its `START OF` / `END OF` block, in
/// template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetMap {
    entries: Vec<(String, Vec<String>)>,
}

/// Result of scanning a template body.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub snippets: SnippetMap,
    /// The template body without marker lines and without the code inside
    /// snippet blocks.
    pub residual: String,
}

impl SnippetMap {
    /// Scans `template` for snippet blocks.
    pub fn extract(template: &str) -> Self {
        extract(template).snippets
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Dedented snippet lines under exactly `key`.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, lines)| lines.as_slice())
    }

    fn insert(&mut self, key: String, lines: Vec<String>) {
        if self.get(&key).is_some() {
            debug!("Ignoring repeated snippet block '{}'", key);
            return;
        }
        self.entries.push((key, lines));
    }

    /// Looks up the snippet a marker key refers to.
    ///
    /// An exact key wins. Otherwise keys are compared in normalized form
    /// (upper-cased, non-alphanumerics removed): an equal normalized key,
    /// then the shortest key containing the target, then the first key the
    /// target contains.
    pub fn resolve(&self, key: &str) -> Option<(&str, &[String])> {
        if let Some((k, lines)) = self.entries.iter().find(|(k, _)| k == key) {
            return Some((k.as_str(), lines.as_slice()));
        }

        let target = normalize_key(key);
        if target.is_empty() {
            return None;
        }
        let normalized: Vec<(usize, String)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (i, normalize_key(k)))
            .filter(|(_, n)| !n.is_empty())
            .collect();

        let found = normalized
            .iter()
            .find(|(_, n)| *n == target)
            .or_else(|| {
                normalized
                    .iter()
                    .filter(|(_, n)| n.contains(&target))
                    .min_by_key(|(_, n)| n.len())
            })
            .or_else(|| normalized.iter().find(|(_, n)| target.contains(n.as_str())));

        found.map(|(i, _)| {
            let (k, lines) = &self.entries[*i];
            debug!("Resolved marker key '{}' to snippet '{}'", key, k);
            (k.as_str(), lines.as_slice())
        })
    }
}

/// Upper-cases `key` and drops everything but letters and digits.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Single pass over `template`, collecting snippet blocks and the residual
/// text. Malformed nesting never fails: a stray `END OF` is dropped, a
/// `START OF` inside an open block closes that block first, and end of input
/// closes whatever is still open.
pub fn extract(template: &str) -> Extraction {
    let mut snippets = SnippetMap::default();
    let mut residual: Vec<&str> = Vec::new();
    let mut open: Option<(&str, Vec<&str>)> = None;

    for line in template.lines() {
        match parse_line(line) {
            Some(Marker::Start(key)) => {
                if let Some((prev, body)) = open.take() {
                    debug!("Snippet '{}' closed by start of '{}'", prev, key);
                    snippets.insert(prev.to_string(), dedent(&body.join("\n")));
                }
                open = Some((key, Vec::new()));
            }
            Some(Marker::End(key)) => match open.take() {
                Some((prev, body)) => {
                    if prev != key {
                        debug!("Snippet '{}' closed by end of '{}'", prev, key);
                    }
                    snippets.insert(prev.to_string(), dedent(&body.join("\n")));
                }
                None => debug!("Ignoring unmatched end of '{}'", key),
            },
            Some(Marker::Add { .. }) => {}
            None => match open.as_mut() {
                Some((_, body)) => body.push(line),
                None => residual.push(line),
            },
        }
    }
    if let Some((prev, body)) = open.take() {
        debug!("Snippet '{}' still open at end of template", prev);
        snippets.insert(prev.to_string(), dedent(&body.join("\n")));
    }

    let mut residual = residual.join("\n");
    if template.ends_with('\n') && !residual.is_empty() {
        residual.push('\n');
    }
    Extraction { snippets, residual }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(snippets: &SnippetMap, key: &str) -> Option<String> {
        snippets.get(key).map(|lines| lines.join("\n"))
    }

    fn map(pairs: &[(&str, &str)]) -> SnippetMap {
        let mut m = SnippetMap::default();
        for (k, v) in pairs {
            m.insert(k.to_string(), dedent(v));
        }
        m
    }

    #[test]
    fn test_extract_single_block() {
        let snippets = SnippetMap::extract("// START OF X\nfoo\n// END OF X");
        assert_eq!(code(&snippets, "X").as_deref(), Some("foo"));
        assert_eq!(snippets.len(), 1);
    }

    #[test]
    fn test_extract_dedents_and_trims() {
        let template = "[\n  // START OF VALUE 1\n\n    {{.Name}},\n      extra\n\n  // END OF VALUE 1\n]\n";
        let snippets = SnippetMap::extract(template);
        assert_eq!(code(&snippets, "VALUE 1").as_deref(), Some("{{.Name}},\n  extra"));
    }

    #[test]
    fn test_residual_drops_blocks_and_markers() {
        let template = "a\n// START OF X\nfoo\n// END OF X\n// ADD X BELOW\nb\n";
        let extraction = extract(template);
        assert_eq!(extraction.residual, "a\nb\n");
    }

    #[test]
    fn test_malformed_nesting_is_tolerated() {
        let template = "// END OF NOTHING\n// START OF A\na\n// START OF B\nb\n// END OF C\n// START OF D\nd";
        let snippets = SnippetMap::extract(template);
        assert_eq!(code(&snippets, "A").as_deref(), Some("a"));
        assert_eq!(code(&snippets, "B").as_deref(), Some("b"));
        assert_eq!(code(&snippets, "D").as_deref(), Some("d"));
        assert!(snippets.get("NOTHING").is_none());
    }

    #[test]
    fn test_first_block_wins() {
        let snippets = SnippetMap::extract("// START OF X\none\n// END OF X\n// START OF X\ntwo\n// END OF X\n");
        assert_eq!(code(&snippets, "X").as_deref(), Some("one"));
    }

    #[test]
    fn test_resolve_exact() {
        let m = map(&[("VALUE", "a"), ("VALUE 1", "b")]);
        assert_eq!(m.resolve("VALUE 1").map(|(k, _)| k), Some("VALUE 1"));
    }

    #[test]
    fn test_resolve_normalized_exact() {
        let m = map(&[("PROPERTY VARIABLE: String", "a"), ("property-variable", "b")]);
        assert_eq!(m.resolve("Property Variable").map(|(k, _)| k), Some("property-variable"));
    }

    #[test]
    fn test_resolve_prefers_shortest_containing_key() {
        let m = map(&[("PROPERTY VARIABLE: String", "a"), ("PROPERTY VARIABLE: Int", "b")]);
        assert_eq!(m.resolve("property variable").map(|(k, _)| k), Some("PROPERTY VARIABLE: Int"));
    }

    #[test]
    fn test_resolve_contained_within_target() {
        let m = map(&[("IMPORT", "a"), ("EXPORT", "b")]);
        assert_eq!(m.resolve("EXPORT DEFAULT").map(|(k, _)| k), Some("EXPORT"));
        assert!(m.resolve("UNRELATED").is_none());
        assert!(m.resolve("::").is_none());
    }
}
