//! Line-level helpers shared by the merge passes.
//!
//! Everything here works on `Vec<String>` line buffers. [`Lines`] remembers
//! the newline style and whether the input ended with a newline, so a file
//! that passes through a merge untouched serializes back to the same bytes.

/// A file split into lines, plus what is needed to join it back.
#[derive(Debug, Clone)]
pub struct Lines {
    pub lines: Vec<String>,
    newline: &'static str,
    trailing_newline: bool,
}

impl Lines {
    pub fn parse(content: &str) -> Self {
        let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
        Self {
            lines: content.lines().map(str::to_string).collect(),
            newline,
            trailing_newline: content.ends_with('\n'),
        }
    }

    pub fn join(&self) -> String {
        self.render(&self.lines)
    }

    /// Joins `lines` with this file's newline style and trailing newline.
    pub fn render(&self, lines: &[String]) -> String {
        let mut out = lines.join(self.newline);
        if self.trailing_newline && !lines.is_empty() {
            out.push_str(self.newline);
        }
        out
    }
}

/// The leading whitespace of `line`.
pub fn indentation(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Removes leading and trailing blank lines and the indentation common to
/// every non-blank line.
pub fn dedent(block: &str) -> Vec<String> {
    let lines: Vec<&str> = block.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return Vec::new();
    };
    let body = &lines[first..=last];

    let common = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indentation(l).len())
        .min()
        .unwrap_or(0);

    body.iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l.get(common..).unwrap_or_else(|| l.trim_start()).trim_end().to_string()
            }
        })
        .collect()
}

/// Prefixes every non-blank line with `indent`.
pub fn reindent(lines: &[String], indent: &str) -> Vec<String> {
    lines
        .iter()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("{}{}", indent, l)
            }
        })
        .collect()
}

/// Trims `line` and collapses inner whitespace runs to a single space.
pub fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `line` with every whitespace character removed.
pub fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalized non-blank lines, used for presence checks.
pub fn normalized_lines<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Whether `needle` occurs as a contiguous run inside `haystack`.
pub fn contains_run<T: PartialEq>(haystack: &[T], needle: &[T]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Compares two blocks line by line, ignoring surrounding whitespace.
pub fn same_block(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.trim() == y.trim())
}
