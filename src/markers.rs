//! Marker comment grammar.
//!
//! Three whole-line `//` comments are recognized, whatever the host language:
//!
//! ```text
//! // START OF <key>
//! // END OF <key>
//! // ADD <key> ABOVE
//! // ADD <key> BELOW
//! ```
//!
//! `<key>` is free text up to the end of the line (or up to the trailing
//! position keyword for `ADD`).

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Where an `ADD` marker wants its snippet relative to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Above,
    Below,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Above => write!(f, "ABOVE"),
            Position::Below => write!(f, "BELOW"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker<'a> {
    Start(&'a str),
    End(&'a str),
    Add { key: &'a str, position: Position },
}

fn block_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*//\s*(?P<kind>START|END) OF\s+(?P<key>.*?)\s*$").expect("Invalid regex")
    })
}

fn add_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^\s*//\s*ADD\s+(?P<key>.+?)\s+(?P<pos>ABOVE|BELOW)\s*$").expect("Invalid regex")
    })
}

/// Classifies a single line.
pub fn parse_line(line: &str) -> Option<Marker<'_>> {
    if let Some(caps) = add_regex().captures(line) {
        let key = caps.name("key")?.as_str();
        let position = match caps.name("pos")?.as_str() {
            "ABOVE" => Position::Above,
            _ => Position::Below,
        };
        return Some(Marker::Add { key, position });
    }
    let caps = block_regex().captures(line)?;
    let key = caps.name("key")?.as_str();
    if key.is_empty() {
        return None;
    }
    match caps.name("kind")?.as_str() {
        "START" => Some(Marker::Start(key)),
        _ => Some(Marker::End(key)),
    }
}

pub fn is_marker(line: &str) -> bool {
    parse_line(line).is_some()
}

pub fn has_any_marker(content: &str) -> bool {
    content.lines().any(is_marker)
}

/// `ADD` markers in `content`, in order of appearance.
pub fn add_markers(content: &str) -> Vec<(&str, Position)> {
    content
        .lines()
        .filter_map(|line| match parse_line(line) {
            Some(Marker::Add { key, position }) => Some((key, position)),
            _ => None,
        })
        .collect()
}

/// Whether `content` holds an `ADD` marker for `key`, in either position.
pub fn has_add_marker(content: &str, key: &str) -> bool {
    add_markers(content).iter().any(|(k, _)| *k == key)
}

/// Renders an `ADD` marker line at the given indentation.
pub fn add_marker_line(indent: &str, key: &str, position: Position) -> String {
    format!("{}// ADD {} {}", indent, key, position)
}

/// Prepares a template body for a file that does not exist yet: `START OF`
/// and `END OF` lines are removed (the snippet code between them stays) and,
/// unless `keep_add_markers` is set, so are `ADD` lines.
pub fn strip_marker_lines(content: &str, keep_add_markers: bool) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in content.lines() {
        match parse_line(line) {
            Some(Marker::Start(_)) | Some(Marker::End(_)) => {}
            Some(Marker::Add { .. }) if !keep_add_markers => {}
            _ => out.push(line),
        }
    }
    let mut stripped = out.join("\n");
    if content.ends_with('\n') && !stripped.is_empty() {
        stripped.push('\n');
    }
    stripped
}
