//! Regex line classifiers for import, export and list-entry lines.

use regex::Regex;
use std::sync::OnceLock;

fn import_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"^\s*import\b[^'"]*['"](?P<path>[^'"]+)['"]"#).expect("Invalid regex")
    })
}

fn require_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r#"^\s*(?:(?:const|let|var)\s+[^=]+=\s*)?require\(\s*['"](?P<path>[^'"]+)['"]\s*\)"#,
        )
        .expect("Invalid regex")
    })
}

fn import_like_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"^\s*(?:import\b|from\s+\S+\s+import\b|use\s+\S|#include\b|(?:const|let|var)\s+[^=]+=\s*require\()"#)
            .expect("Invalid regex")
    })
}

fn export_like_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:export\b|module\.exports\b|exports\.)").expect("Invalid regex")
    })
}

fn list_item_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"^\s*(?:[A-Za-z_$][\w$.]*(?:\(.*\))?|'[^']*'|"[^"]*")\s*,\s*$"#)
            .expect("Invalid regex")
    })
}

fn bare_identifier_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?P<ident>[A-Za-z_$][\w$]*)\s*,?\s*$").expect("Invalid regex")
    })
}

/// The module path of a single-line `import` or `require` statement.
pub fn import_module(line: &str) -> Option<&str> {
    import_regex()
        .captures(line)
        .or_else(|| require_regex().captures(line))
        .and_then(|caps| caps.name("path"))
        .map(|m| m.as_str())
}

pub fn is_import_like(line: &str) -> bool {
    import_like_regex().is_match(line)
}

pub fn is_export_like(line: &str) -> bool {
    export_like_regex().is_match(line)
}

/// A one-line entry of a list or array literal, e.g. `foo,` or `"bar",`.
pub fn is_list_item(line: &str) -> bool {
    list_item_regex().is_match(line)
}

/// The identifier of a line holding only `ident` or `ident,`.
pub fn bare_identifier(line: &str) -> Option<&str> {
    bare_identifier_regex()
        .captures(line)
        .and_then(|caps| caps.name("ident"))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_module() {
        assert_eq!(import_module(r#"import {A} from "mod""#), Some("mod"));
        assert_eq!(import_module("import { A, B } from './a/b';"), Some("./a/b"));
        assert_eq!(import_module("import './styles.css'"), Some("./styles.css"));
        assert_eq!(import_module(r#"const x = require("lodash");"#), Some("lodash"));
        assert_eq!(import_module("import {"), None);
        assert_eq!(import_module("importantThing('x')"), None);
    }

    #[test]
    fn test_import_and_export_like() {
        assert!(is_import_like("import Foo from './Foo'"));
        assert!(is_import_like("use crate::foo;"));
        assert!(!is_import_like("const x = 1"));
        assert!(is_export_like("export const schemaTypes = ["));
        assert!(is_export_like("module.exports = {}"));
        assert!(!is_export_like("exported()"));
    }

    #[test]
    fn test_list_items() {
        assert!(is_list_item("  foo,"));
        assert!(is_list_item("  'bar' ,"));
        assert!(is_list_item("  defineType(x),"));
        assert!(!is_list_item("  foo"));
        assert!(!is_list_item("  a: 1,"));
    }

    #[test]
    fn test_bare_identifier() {
        assert_eq!(bare_identifier("  post,"), Some("post"));
        assert_eq!(bare_identifier("author"), Some("author"));
        assert_eq!(bare_identifier("  ...rest,"), None);
    }
}
