//! Insertion actions for files that have no (or not enough) markers.
//!
//! Every action locates an anchor substring and edits around it. An action
//! whose anchor or snippet cannot be found leaves the content untouched.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::markers::{self, add_marker_line, is_marker, Position};
use crate::merge::{is_present, Outcome};
use crate::snippets::SnippetMap;
use crate::text::{collapse_whitespace, indentation, reindent, same_block, Lines};

/// Which matching line an action anchors to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    #[default]
    First,
    Last,
}

/// An anchor line plus the snippet key to place relative to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchored {
    pub target: String,
    pub key: String,
    #[serde(default)]
    pub occurrence: Occurrence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRange {
    pub start: String,
    pub end: String,
    pub key: String,
    #[serde(default)]
    pub occurrence: Occurrence,
    #[serde(default)]
    pub require_absent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    pub target: String,
    pub replacement: String,
    #[serde(default)]
    pub occurrence: Occurrence,
    /// Defaults to `replacement` itself.
    #[serde(default)]
    pub require_absent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InsertionAction {
    InsertBeforeLine(Anchored),
    InsertAfterLine(Anchored),
    InsertBeforeInline(Anchored),
    InsertAfterInline(Anchored),
    AddMarkerAboveTarget(Anchored),
    AddMarkerBelowTarget(Anchored),
    ReplaceBetweenAnchors(AnchorRange),
    ConditionalReplace(Replacement),
}

impl InsertionAction {
    /// Applies the action to `content`, resolving snippet keys in `snippets`.
    pub fn apply(&self, content: &str, snippets: &SnippetMap) -> Outcome {
        match self {
            InsertionAction::InsertBeforeLine(a) => insert_line(content, a, snippets, Position::Above),
            InsertionAction::InsertAfterLine(a) => insert_line(content, a, snippets, Position::Below),
            InsertionAction::InsertBeforeInline(a) => {
                insert_inline(content, a, snippets, Position::Above)
            }
            InsertionAction::InsertAfterInline(a) => {
                insert_inline(content, a, snippets, Position::Below)
            }
            InsertionAction::AddMarkerAboveTarget(a) => seed_marker(content, a, Position::Above),
            InsertionAction::AddMarkerBelowTarget(a) => seed_marker(content, a, Position::Below),
            InsertionAction::ReplaceBetweenAnchors(r) => replace_between(content, r, snippets),
            InsertionAction::ConditionalReplace(r) => conditional_replace(content, r),
        }
    }

    /// A copy with `f` applied to every anchor, key and replacement string.
    pub fn map_text<F: Fn(&str) -> String>(&self, f: F) -> Self {
        let anchored = |a: &Anchored| Anchored {
            target: f(&a.target),
            key: f(&a.key),
            occurrence: a.occurrence,
        };
        match self {
            InsertionAction::InsertBeforeLine(a) => InsertionAction::InsertBeforeLine(anchored(a)),
            InsertionAction::InsertAfterLine(a) => InsertionAction::InsertAfterLine(anchored(a)),
            InsertionAction::InsertBeforeInline(a) => {
                InsertionAction::InsertBeforeInline(anchored(a))
            }
            InsertionAction::InsertAfterInline(a) => InsertionAction::InsertAfterInline(anchored(a)),
            InsertionAction::AddMarkerAboveTarget(a) => {
                InsertionAction::AddMarkerAboveTarget(anchored(a))
            }
            InsertionAction::AddMarkerBelowTarget(a) => {
                InsertionAction::AddMarkerBelowTarget(anchored(a))
            }
            InsertionAction::ReplaceBetweenAnchors(r) => {
                InsertionAction::ReplaceBetweenAnchors(AnchorRange {
                    start: f(&r.start),
                    end: f(&r.end),
                    key: f(&r.key),
                    occurrence: r.occurrence,
                    require_absent: r.require_absent.as_deref().map(&f),
                })
            }
            InsertionAction::ConditionalReplace(r) => InsertionAction::ConditionalReplace(Replacement {
                target: f(&r.target),
                replacement: f(&r.replacement),
                occurrence: r.occurrence,
                require_absent: r.require_absent.as_deref().map(&f),
            }),
        }
    }
}

/// Applies `actions` in order.
pub fn apply_all(content: &str, actions: &[InsertionAction], snippets: &SnippetMap) -> Outcome {
    actions
        .iter()
        .fold(Outcome::unchanged(content), |acc, action| {
            acc.then(|c| action.apply(c, snippets))
        })
}

/// Index of the first or last non-marker line containing `target`.
fn find_line(lines: &[String], target: &str, occurrence: Occurrence) -> Option<usize> {
    if target.is_empty() {
        return None;
    }
    let matches = |l: &&String| l.contains(target) && !is_marker(l);
    match occurrence {
        Occurrence::First => lines.iter().position(|l| matches(&l)),
        Occurrence::Last => lines.iter().rposition(|l| matches(&l)),
    }
}

fn insert_line(content: &str, a: &Anchored, snippets: &SnippetMap, position: Position) -> Outcome {
    let Some((_, snippet)) = snippets.resolve(&a.key) else {
        debug!("No snippet '{}' to insert", a.key);
        return Outcome::unchanged(content);
    };
    let mut source = Lines::parse(content);
    let Some(idx) = find_line(&source.lines, &a.target, a.occurrence) else {
        debug!("Anchor '{}' not found", a.target);
        return Outcome::unchanged(content);
    };
    // Covers an identical block right next to the anchor as well.
    if is_present(&source.lines, snippet) {
        return Outcome::unchanged(content);
    }

    let block = reindent(snippet, indentation(&source.lines[idx]));
    let at = match position {
        Position::Above => idx,
        Position::Below => idx + 1,
    };
    source.lines.splice(at..at, block);
    Outcome::changed(source.join())
}

fn insert_inline(content: &str, a: &Anchored, snippets: &SnippetMap, position: Position) -> Outcome {
    let Some((_, snippet)) = snippets.resolve(&a.key) else {
        debug!("No snippet '{}' to insert inline", a.key);
        return Outcome::unchanged(content);
    };
    let text = collapse_whitespace(&snippet.join(" "));
    if text.is_empty() {
        return Outcome::unchanged(content);
    }
    let mut source = Lines::parse(content);
    let Some(idx) = find_line(&source.lines, &a.target, a.occurrence) else {
        debug!("Inline anchor '{}' not found", a.target);
        return Outcome::unchanged(content);
    };

    let line = &source.lines[idx];
    let Some(pos) = line.find(a.target.as_str()) else {
        return Outcome::unchanged(content);
    };
    let updated = match position {
        Position::Above => {
            let (head, tail) = line.split_at(pos);
            if head.trim_end().ends_with(&text) {
                return Outcome::unchanged(content);
            }
            format!("{}{} {}", head, text, tail)
        }
        Position::Below => {
            let (head, tail) = line.split_at(pos + a.target.len());
            if tail.trim_start().starts_with(&text) {
                return Outcome::unchanged(content);
            }
            format!("{} {}{}", head, text, tail)
        }
    };
    source.lines[idx] = updated;
    Outcome::changed(source.join())
}

fn seed_marker(content: &str, a: &Anchored, position: Position) -> Outcome {
    if markers::has_add_marker(content, &a.key) {
        return Outcome::unchanged(content);
    }
    let mut source = Lines::parse(content);
    let Some(idx) = find_line(&source.lines, &a.target, a.occurrence) else {
        debug!("Marker anchor '{}' not found", a.target);
        return Outcome::unchanged(content);
    };
    let marker = add_marker_line(indentation(&source.lines[idx]), &a.key, position);
    let at = match position {
        Position::Above => idx,
        Position::Below => idx + 1,
    };
    source.lines.insert(at, marker);
    Outcome::changed(source.join())
}

/// Replaces the lines from the `start` anchor through the next line holding
/// the `end` anchor, both included.
fn replace_between(content: &str, r: &AnchorRange, snippets: &SnippetMap) -> Outcome {
    if let Some(guard) = r.require_absent.as_deref() {
        if !guard.is_empty() && content.contains(guard) {
            return Outcome::unchanged(content);
        }
    }
    let Some((_, snippet)) = snippets.resolve(&r.key) else {
        debug!("No snippet '{}' for anchor range", r.key);
        return Outcome::unchanged(content);
    };
    let mut source = Lines::parse(content);
    let Some(start) = find_line(&source.lines, &r.start, r.occurrence) else {
        debug!("Range start '{}' not found", r.start);
        return Outcome::unchanged(content);
    };
    let Some(end) = source.lines[start + 1..]
        .iter()
        .position(|l| !r.end.is_empty() && l.contains(r.end.as_str()))
        .map(|offset| start + 1 + offset)
    else {
        debug!("Range end '{}' not found", r.end);
        return Outcome::unchanged(content);
    };

    let replacement = reindent(snippet, indentation(&source.lines[start]));
    if same_block(&source.lines[start..=end], &replacement) {
        return Outcome::unchanged(content);
    }
    source.lines.splice(start..=end, replacement);
    Outcome::changed(source.join())
}

fn conditional_replace(content: &str, r: &Replacement) -> Outcome {
    let guard = r.require_absent.as_deref().unwrap_or(&r.replacement);
    if r.target.is_empty() || (!guard.is_empty() && content.contains(guard)) {
        return Outcome::unchanged(content);
    }
    let found = match r.occurrence {
        Occurrence::First => content.find(r.target.as_str()),
        Occurrence::Last => content.rfind(r.target.as_str()),
    };
    let Some(pos) = found else {
        debug!("Replace target '{}' not found", r.target);
        return Outcome::unchanged(content);
    };
    let mut updated = String::with_capacity(content.len() + r.replacement.len());
    updated.push_str(&content[..pos]);
    updated.push_str(&r.replacement);
    updated.push_str(&content[pos + r.target.len()..]);
    Outcome::changed(updated)
}
