//! Comment-to-code correlation.
//!
//! Maps each review comment to a concrete file and line in the parsed diff.
//! Explicit inline-comment metadata is used when present; otherwise
//! correlation falls back to keyword matching against diff content, which is
//! a heuristic with no precision guarantee; the result is marked
//! [`Confidence::Inferred`] and never silently upgraded.

use serde::Serialize;
use tracing::debug;

use phab_core::RawComment;

use crate::diff::{DiffFile, DiffLine};
use crate::keywords;

/// How a comment's location was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Taken from the review system's own inline-comment metadata
    Explicit,
    /// Best keyword match against diff content
    Inferred,
    /// No location could be established
    Unresolved,
}

/// One line of surrounding source shown with a located comment.
#[derive(Debug, Clone, Serialize)]
pub struct ContextLine {
    pub line_number: u32,
    pub content: String,
    pub is_target: bool,
}

/// Source context around a comment's target line.
#[derive(Debug, Clone, Serialize)]
pub struct CodeContext {
    pub file: String,
    pub target_line: u32,
    pub hunk_info: String,
    pub lines: Vec<ContextLine>,
}

/// A comment with its resolved location and context window.
#[derive(Debug, Clone)]
pub struct LocatedComment {
    pub comment: RawComment,
    pub file: Option<String>,
    pub target_line: Option<u32>,
    pub confidence: Confidence,
    pub context: Option<CodeContext>,
}

/// Correlates comments against one parsed diff.
pub struct Correlator<'a> {
    files: &'a [DiffFile],
    context_lines: usize,
}

impl<'a> Correlator<'a> {
    pub fn new(files: &'a [DiffFile], context_lines: usize) -> Self {
        Self {
            files,
            context_lines,
        }
    }

    /// Locate every comment. Output order matches input order.
    pub fn correlate(&self, comments: &[RawComment]) -> Vec<LocatedComment> {
        comments.iter().map(|c| self.locate(c)).collect()
    }

    fn locate(&self, comment: &RawComment) -> LocatedComment {
        if let Some((path, line)) = comment.explicit_location() {
            return self.locate_explicit(comment, path, line);
        }
        self.locate_by_keywords(comment)
    }

    /// Use the review system's own metadata. Only fails when the named file
    /// is absent from the diff.
    fn locate_explicit(&self, comment: &RawComment, path: &str, line: u32) -> LocatedComment {
        let Some(file) = self.files.iter().find(|f| f.path == path) else {
            debug!(path = path, "explicitly referenced file absent from diff");
            return unresolved(comment);
        };

        LocatedComment {
            comment: comment.clone(),
            file: Some(file.path.clone()),
            target_line: Some(line),
            confidence: Confidence::Explicit,
            context: self.context_for(file, line),
        }
    }

    /// Keyword fallback: pick the file with the most keyword hits, then the
    /// line within it with the highest hit count (earliest post-change line
    /// number on ties).
    fn locate_by_keywords(&self, comment: &RawComment) -> LocatedComment {
        let keywords = keywords::extract(&comment.text);
        if keywords.is_empty() {
            return unresolved(comment);
        }

        let hits = |line: &DiffLine| -> usize {
            let content = line.content.to_lowercase();
            keywords.iter().filter(|k| content.contains(k.as_str())).count()
        };

        let best_file = self
            .files
            .iter()
            .map(|f| {
                let score: usize = f.hunks.iter().flat_map(|h| &h.lines).map(&hits).sum();
                (f, score)
            })
            .filter(|(_, score)| *score > 0)
            // max_by_key takes the last maximum; compare against the
            // reversed index so earlier files win ties
            .enumerate()
            .max_by_key(|(idx, (_, score))| (*score, usize::MAX - idx))
            .map(|(_, (f, _))| f);

        let Some(file) = best_file else {
            return unresolved(comment);
        };

        // Target selection is restricted to lines that exist post-change;
        // hits that only touch removed lines leave the comment unresolved.
        let best_line = file
            .post_change_lines()
            .map(|l| (l, hits(l)))
            .filter(|(_, n)| *n > 0)
            .max_by_key(|(l, n)| (*n, u32::MAX - l.new_line.unwrap_or(u32::MAX)))
            .map(|(l, _)| l);

        let Some(line) = best_line.and_then(|l| l.new_line) else {
            return unresolved(comment);
        };

        debug!(
            file = file.path.as_str(),
            line = line,
            "correlated comment by keywords"
        );

        LocatedComment {
            comment: comment.clone(),
            file: Some(file.path.clone()),
            target_line: Some(line),
            confidence: Confidence::Inferred,
            context: self.context_for(file, line),
        }
    }

    /// Build the context window: up to `context_lines` lines before and
    /// after the target within the file's flattened post-change sequence.
    /// Absent when the target line does not appear in the diff at all.
    fn context_for(&self, file: &DiffFile, target: u32) -> Option<CodeContext> {
        let flat: Vec<&DiffLine> = file.post_change_lines().collect();
        let idx = flat.iter().position(|l| l.new_line == Some(target))?;

        let start = idx.saturating_sub(self.context_lines);
        let end = (idx + self.context_lines + 1).min(flat.len());

        let lines = flat[start..end]
            .iter()
            .map(|l| ContextLine {
                line_number: l.new_line.expect("post-change lines carry new_line"),
                content: l.content.clone(),
                is_target: l.new_line == Some(target),
            })
            .collect();

        let hunk_info = file
            .hunks
            .iter()
            .find(|h| h.contains_new_line(target))
            .map(|h| h.header.clone())
            .unwrap_or_default();

        Some(CodeContext {
            file: file.path.clone(),
            target_line: target,
            hunk_info,
            lines,
        })
    }
}

fn unresolved(comment: &RawComment) -> LocatedComment {
    LocatedComment {
        comment: comment.clone(),
        file: None,
        target_line: None,
        confidence: Confidence::Unresolved,
        context: None,
    }
}

/// Convenience wrapper over [`Correlator`].
pub fn correlate(
    comments: &[RawComment],
    files: &[DiffFile],
    context_lines: usize,
) -> Vec<LocatedComment> {
    Correlator::new(files, context_lines).correlate(comments)
}
