//! Unified diff parsing.
//!
//! Turns raw unified-diff text (as returned by `differential.getrawdiff`)
//! into an addressable structure: file → hunk → line, with every line
//! carrying its post-change line number unless it was removed.

use once_cell::sync::Lazy;
use regex::Regex;

use phab_core::{Error, Result};

static HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

/// How a line changed within a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

/// One line of a hunk body.
///
/// `new_line` is present unless the line was removed; `old_line` is present
/// unless the line was added. A line is never both.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
}

/// A contiguous changed region of one file.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Hunk {
    /// The raw `@@ -a,b +c,d @@` header text
    pub header: String,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Whether `line` falls inside this hunk's post-change range.
    pub fn contains_new_line(&self, line: u32) -> bool {
        line >= self.new_start && line < self.new_start + self.new_count
    }
}

/// All hunks of one file in the diff.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiffFile {
    pub path: String,
    pub hunks: Vec<Hunk>,
}

impl DiffFile {
    /// Lines present in the post-change file (context + added), in order.
    pub fn post_change_lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .filter(|l| l.new_line.is_some())
    }
}

/// Parse unified-diff text into per-file hunk structures.
///
/// Fails with [`Error::MalformedDiff`] when a `@@` line does not match the
/// hunk header pattern, or when hunks appear without any file header.
pub fn parse(raw: &str) -> Result<Vec<DiffFile>> {
    let lines: Vec<&str> = raw.lines().collect();
    let mut files = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("diff --git") {
            files.push(parse_git_file(&lines, &mut i)?);
        } else if lines[i].starts_with("--- ")
            && i + 1 < lines.len()
            && lines[i + 1].starts_with("+++ ")
        {
            files.push(parse_plain_file(&lines, &mut i)?);
        } else if lines[i].starts_with("@@") {
            return Err(Error::MalformedDiff(format!(
                "hunk without a preceding file header: {}",
                lines[i]
            )));
        } else {
            i += 1;
        }
    }

    if files.is_empty() {
        return Err(Error::MalformedDiff(
            "no file headers found in diff".to_string(),
        ));
    }

    Ok(files)
}

/// Parse one `diff --git a/... b/...` segment.
fn parse_git_file(lines: &[&str], i: &mut usize) -> Result<DiffFile> {
    let mut path = path_from_git_header(lines[*i])?;
    *i += 1;

    // Skip extended headers (index, mode, rename) up to the hunks; a
    // `+++ b/...` line overrides the path taken from the git header.
    while *i < lines.len()
        && !lines[*i].starts_with("@@")
        && !lines[*i].starts_with("diff --git")
    {
        if let Some(new_path) = lines[*i].strip_prefix("+++ ") {
            let trimmed = strip_path_prefix(new_path);
            if trimmed != "/dev/null" {
                path = trimmed.to_string();
            }
        }
        *i += 1;
    }

    let hunks = parse_hunks(lines, i)?;
    Ok(DiffFile { path, hunks })
}

/// Parse a bare `--- a/... / +++ b/...` segment (no git header).
fn parse_plain_file(lines: &[&str], i: &mut usize) -> Result<DiffFile> {
    let old_path = strip_path_prefix(&lines[*i]["--- ".len()..]).to_string();
    let new_path = strip_path_prefix(&lines[*i + 1]["+++ ".len()..]).to_string();
    *i += 2;

    let path = if new_path != "/dev/null" {
        new_path
    } else {
        old_path
    };

    let hunks = parse_hunks(lines, i)?;
    Ok(DiffFile { path, hunks })
}

/// Parse consecutive hunks until the next file marker.
fn parse_hunks(lines: &[&str], i: &mut usize) -> Result<Vec<Hunk>> {
    let mut hunks = Vec::new();
    while *i < lines.len() && lines[*i].starts_with("@@") {
        hunks.push(parse_hunk(lines, i)?);
    }
    Ok(hunks)
}

fn parse_hunk(lines: &[&str], i: &mut usize) -> Result<Hunk> {
    let header = lines[*i];
    let caps = HUNK_HEADER.captures(header).ok_or_else(|| {
        Error::MalformedDiff(format!("invalid hunk header: {}", header))
    })?;

    let old_start: u32 = caps[1].parse().unwrap_or(0);
    let old_count: u32 = caps.get(2).map_or(1, |m| m.as_str().parse().unwrap_or(1));
    let new_start: u32 = caps[3].parse().unwrap_or(0);
    let new_count: u32 = caps.get(4).map_or(1, |m| m.as_str().parse().unwrap_or(1));
    *i += 1;

    let mut body = Vec::new();
    let mut old_line = old_start;
    let mut new_line = new_start;
    let mut old_remaining = old_count;
    let mut new_remaining = new_count;

    // Walk the body until both declared counts are consumed. A header with
    // zero counts therefore yields an empty hunk, not an error.
    while *i < lines.len() && (old_remaining > 0 || new_remaining > 0) {
        let line = lines[*i];

        // "\ No newline at end of file" markers carry no line of their own
        if line.starts_with('\\') {
            *i += 1;
            continue;
        }

        let parsed = match line.chars().next() {
            Some('+') if new_remaining > 0 => {
                let l = DiffLine {
                    kind: LineKind::Added,
                    content: line[1..].to_string(),
                    old_line: None,
                    new_line: Some(new_line),
                };
                new_line += 1;
                new_remaining -= 1;
                l
            }
            Some('-') if old_remaining > 0 => {
                let l = DiffLine {
                    kind: LineKind::Removed,
                    content: line[1..].to_string(),
                    old_line: Some(old_line),
                    new_line: None,
                };
                old_line += 1;
                old_remaining -= 1;
                l
            }
            Some(' ') | None if old_remaining > 0 && new_remaining > 0 => {
                let content = line.strip_prefix(' ').unwrap_or(line);
                let l = DiffLine {
                    kind: LineKind::Context,
                    content: content.to_string(),
                    old_line: Some(old_line),
                    new_line: Some(new_line),
                };
                old_line += 1;
                new_line += 1;
                old_remaining -= 1;
                new_remaining -= 1;
                l
            }
            // Next file or hunk started before the counts were satisfied;
            // stop here and let the outer loop pick the marker up.
            _ => break,
        };

        body.push(parsed);
        *i += 1;
    }

    Ok(Hunk {
        header: hunk_info_of(header),
        old_start,
        old_count,
        new_start,
        new_count,
        lines: body,
    })
}

/// Keep only the `@@ ... @@` portion of a header, dropping section text.
fn hunk_info_of(header: &str) -> String {
    match header[2..].find("@@") {
        Some(pos) => header[..pos + 4].to_string(),
        None => header.to_string(),
    }
}

fn path_from_git_header(line: &str) -> Result<String> {
    // "diff --git a/src/foo.rs b/src/foo.rs"
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() >= 4 {
        Ok(strip_path_prefix(parts[3]).to_string())
    } else {
        Err(Error::MalformedDiff(format!("invalid diff header: {}", line)))
    }
}

fn strip_path_prefix(path: &str) -> &str {
    let path = path.split_whitespace().next().unwrap_or(path);
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
}
