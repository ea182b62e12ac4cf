//! Feedback aggregation.
//!
//! Assembles classified comments into the report returned to the caller:
//! the ordered feedback entries, per-category counts, generated action
//! items, and the context bookkeeping counters. Pure function, no I/O.

use std::collections::BTreeMap;

use serde::Serialize;

use phab_core::Revision;

use crate::classify::{Category, ClassifiedComment};
use crate::correlate::{CodeContext, Confidence};

/// Sentinel bucket for comments that resolved to no file.
pub const UNATTRIBUTED: &str = "unattributed";

/// Action items are generated from the first characters of comment text.
const ACTION_ITEM_SNIPPET_CHARS: usize = 80;

/// Per-category totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub issues: usize,
    pub suggestions: usize,
    pub nits: usize,
    pub other: usize,
}

impl CategoryCounts {
    fn record(&mut self, category: Category) {
        match category {
            Category::Issue => self.issues += 1,
            Category::Suggestion => self.suggestions += 1,
            Category::Nit => self.nits += 1,
            Category::Other => self.other += 1,
        }
    }
}

/// One comment in the final report.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackEntry {
    pub comment: String,
    pub author: String,
    #[serde(rename = "type")]
    pub comment_type: String,
    pub code_context: Option<CodeContext>,
    pub primary_file: Option<String>,
    pub primary_line: Option<u32>,
    pub category: Category,
    #[serde(skip_serializing)]
    pub confidence: Confidence,
}

/// The assembled review-feedback report.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReport {
    pub revision: Revision,
    pub review_feedback: Vec<FeedbackEntry>,
    pub summary: String,
    pub category_counts: CategoryCounts,
    pub action_items: Vec<String>,
    pub total_comments: usize,
    pub comments_with_context: usize,
}

impl FeedbackReport {
    /// Feedback entries grouped by resolved file; comments without a file
    /// land in the [`UNATTRIBUTED`] bucket.
    pub fn by_file(&self) -> BTreeMap<&str, Vec<&FeedbackEntry>> {
        let mut groups: BTreeMap<&str, Vec<&FeedbackEntry>> = BTreeMap::new();
        for entry in &self.review_feedback {
            let key = entry.primary_file.as_deref().unwrap_or(UNATTRIBUTED);
            groups.entry(key).or_default().push(entry);
        }
        groups
    }
}

/// Assemble the report. Entry order matches the classified input order.
pub fn aggregate(revision: Revision, classified: Vec<ClassifiedComment>) -> FeedbackReport {
    let total_comments = classified.len();
    let mut category_counts = CategoryCounts::default();
    let mut action_items = Vec::new();
    let mut comments_with_context = 0;

    let review_feedback: Vec<FeedbackEntry> = classified
        .into_iter()
        .map(|c| {
            category_counts.record(c.category);
            if c.located.confidence != Confidence::Unresolved {
                comments_with_context += 1;
            }
            if matches!(c.category, Category::Issue | Category::Suggestion) {
                action_items.push(action_item(&c));
            }

            FeedbackEntry {
                comment: c.located.comment.text.clone(),
                author: c.located.comment.author.clone(),
                comment_type: c.located.comment.kind.report_type().to_string(),
                code_context: c.located.context,
                primary_file: c.located.file,
                primary_line: c.located.target_line,
                category: c.category,
                confidence: c.located.confidence,
            }
        })
        .collect();

    let summary = format!(
        "{} review comment(s): {} issue(s), {} suggestion(s), {} nit(s), {} other. {} of {} mapped to changed code.",
        total_comments,
        category_counts.issues,
        category_counts.suggestions,
        category_counts.nits,
        category_counts.other,
        comments_with_context,
        total_comments,
    );

    FeedbackReport {
        revision,
        review_feedback,
        summary,
        category_counts,
        action_items,
        total_comments,
        comments_with_context,
    }
}

/// `"<category>: <first-80-chars> (<file>:<line>)"`
fn action_item(c: &ClassifiedComment) -> String {
    let snippet: String = c
        .located
        .comment
        .text
        .chars()
        .take(ACTION_ITEM_SNIPPET_CHARS)
        .collect();
    let file = c.located.file.as_deref().unwrap_or(UNATTRIBUTED);
    let line = c
        .located
        .target_line
        .map(|l| l.to_string())
        .unwrap_or_else(|| "?".to_string());

    format!("{}: {} ({}:{})", c.category.label(), snippet, file, line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::LocatedComment;
    use phab_core::{CommentKind, RawComment};

    fn revision() -> Revision {
        Revision {
            id: 123,
            phid: "PHID-DREV-abc".into(),
            title: "Add request validation".into(),
            summary: Some("Validates all inbound requests".into()),
            status: "needs-review".into(),
            author_phid: Some("PHID-USER-author".into()),
            uri: None,
        }
    }

    fn classified(
        text: &str,
        category: Category,
        file: Option<&str>,
        line: Option<u32>,
        confidence: Confidence,
    ) -> ClassifiedComment {
        ClassifiedComment {
            located: LocatedComment {
                comment: RawComment {
                    author: "PHID-USER-reviewer".into(),
                    text: text.into(),
                    kind: if file.is_some() {
                        CommentKind::Inline
                    } else {
                        CommentKind::General
                    },
                    path: file.map(str::to_string),
                    line,
                    timestamp: None,
                },
                file: file.map(str::to_string),
                target_line: line,
                confidence,
                context: None,
            },
            category,
        }
    }

    #[test]
    fn test_counts_and_invariant() {
        let report = aggregate(
            revision(),
            vec![
                classified("broken", Category::Issue, Some("a.rs"), Some(1), Confidence::Explicit),
                classified("consider", Category::Suggestion, Some("a.rs"), Some(2), Confidence::Inferred),
                classified("nit: typo", Category::Nit, None, None, Confidence::Unresolved),
                classified("thanks", Category::Other, None, None, Confidence::Unresolved),
            ],
        );

        assert_eq!(report.total_comments, 4);
        assert_eq!(report.comments_with_context, 2);
        assert_eq!(report.category_counts.issues, 1);
        assert_eq!(report.category_counts.suggestions, 1);
        assert_eq!(report.category_counts.nits, 1);
        assert_eq!(report.category_counts.other, 1);

        // comments_with_context + unresolved == total
        let unresolved = report
            .review_feedback
            .iter()
            .filter(|e| e.confidence == Confidence::Unresolved)
            .count();
        assert_eq!(report.comments_with_context + unresolved, report.total_comments);
    }

    #[test]
    fn test_action_items_only_for_issues_and_suggestions() {
        let report = aggregate(
            revision(),
            vec![
                classified("broken thing", Category::Issue, Some("a.rs"), Some(7), Confidence::Explicit),
                classified("nit: typo", Category::Nit, Some("a.rs"), Some(9), Confidence::Explicit),
                classified("consider this", Category::Suggestion, None, None, Confidence::Unresolved),
            ],
        );

        assert_eq!(report.action_items.len(), 2);
        assert_eq!(report.action_items[0], "Issue: broken thing (a.rs:7)");
        assert_eq!(
            report.action_items[1],
            "Suggestion: consider this (unattributed:?)"
        );
    }

    #[test]
    fn test_action_item_snippet_truncated() {
        let long = "x".repeat(200);
        let report = aggregate(
            revision(),
            vec![classified(&long, Category::Issue, Some("a.rs"), Some(1), Confidence::Explicit)],
        );
        let expected = format!("Issue: {} (a.rs:1)", "x".repeat(80));
        assert_eq!(report.action_items[0], expected);
    }

    #[test]
    fn test_by_file_grouping() {
        let report = aggregate(
            revision(),
            vec![
                classified("one", Category::Other, Some("b.rs"), Some(1), Confidence::Explicit),
                classified("two", Category::Other, Some("a.rs"), Some(2), Confidence::Inferred),
                classified("three", Category::Other, None, None, Confidence::Unresolved),
                classified("four", Category::Other, Some("a.rs"), Some(9), Confidence::Explicit),
            ],
        );

        let groups = report.by_file();
        assert_eq!(groups["a.rs"].len(), 2);
        assert_eq!(groups["b.rs"].len(), 1);
        assert_eq!(groups[UNATTRIBUTED].len(), 1);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let report = aggregate(
            revision(),
            vec![classified("broken", Category::Issue, Some("a.rs"), Some(1), Confidence::Explicit)],
        );
        assert!(report.summary.contains("1 issue(s)"));
        assert!(report.summary.contains("1 of 1 mapped"));
    }

    #[test]
    fn test_report_json_shape() {
        let report = aggregate(
            revision(),
            vec![classified("broken", Category::Issue, Some("a.rs"), Some(1), Confidence::Explicit)],
        );

        let json = serde_json::to_value(&report).unwrap();
        let entry = &json["review_feedback"][0];
        assert_eq!(entry["comment"], "broken");
        assert_eq!(entry["type"], "inline");
        assert_eq!(entry["category"], "Issue");
        assert_eq!(entry["primary_file"], "a.rs");
        assert_eq!(entry["primary_line"], 1);
        assert!(entry["code_context"].is_null());
        // confidence is internal bookkeeping, not part of the wire shape
        assert!(entry.get("confidence").is_none());
        assert!(json["total_comments"].is_number());
        assert!(json["summary"].is_string());
    }

    #[test]
    fn test_empty_input() {
        let report = aggregate(revision(), vec![]);
        assert_eq!(report.total_comments, 0);
        assert_eq!(report.comments_with_context, 0);
        assert!(report.review_feedback.is_empty());
        assert!(report.action_items.is_empty());
        assert!(report.by_file().is_empty());
    }
}
