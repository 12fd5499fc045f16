use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::classify::{bare_identifier, import_module};
use crate::merge::Outcome;
use crate::text::{collapse_whitespace, Lines};

fn schema_types_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*export\s+const\s+schemaTypes\b[^=]*=\s*\[").expect("Invalid regex")
    })
}

/// Removes duplicates that repeated merges can leave behind in aggregator
/// files: repeated imports and repeated `schemaTypes` entries.
pub fn cleanup(content: &str) -> Outcome {
    dedupe_imports(content).then(dedupe_schema_types)
}

/// Drops every single-line `import`/`require` statement that repeats an
/// earlier one. Statements are compared ignoring whitespace, quote style and
/// a trailing `;`, so different bindings from one module all stay.
pub fn dedupe_imports(content: &str) -> Outcome {
    let source = Lines::parse(content);
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::with_capacity(source.lines.len());

    for line in &source.lines {
        if let Some(module) = import_module(line) {
            if !seen.insert(import_statement_key(line)) {
                debug!("Removing duplicate import of '{}'", module);
                continue;
            }
        }
        out.push(line.clone());
    }

    if out.len() == source.lines.len() {
        return Outcome::unchanged(content);
    }
    Outcome::changed(source.render(&out))
}

/// Drops repeated bare identifiers at the top level of a multi-line
/// `export const schemaTypes = [ ... ]` literal.
pub fn dedupe_schema_types(content: &str) -> Outcome {
    let source = Lines::parse(content);
    let mut out: Vec<String> = Vec::with_capacity(source.lines.len());
    let mut seen: HashSet<&str> = HashSet::new();
    // Bracket depth while inside the literal; `None` outside it.
    let mut depth: Option<i64> = None;
    let mut done = false;

    for line in &source.lines {
        match depth {
            None if !done => {
                if let Some(m) = schema_types_regex().find(line) {
                    let d = bracket_delta(&line[m.end() - 1..]);
                    if d > 0 {
                        depth = Some(d);
                    } else {
                        done = true;
                    }
                }
            }
            Some(d) => {
                if d == 1 {
                    if let Some(ident) = bare_identifier(line) {
                        if !seen.insert(ident) {
                            debug!("Removing duplicate schema type '{}'", ident);
                            continue;
                        }
                    }
                }
                let next = d + bracket_delta(line);
                if next > 0 {
                    depth = Some(next);
                } else {
                    depth = None;
                    done = true;
                }
            }
            None => {}
        }
        out.push(line.clone());
    }

    if out.len() == source.lines.len() {
        return Outcome::unchanged(content);
    }
    Outcome::changed(source.render(&out))
}

fn import_statement_key(line: &str) -> String {
    let statement = collapse_whitespace(line).replace('"', "'");
    statement.trim_end_matches(';').trim_end().to_string()
}

fn bracket_delta(s: &str) -> i64 {
    s.chars().fold(0, |acc, c| match c {
        '[' => acc + 1,
        ']' => acc - 1,
        _ => acc,
    })
}
