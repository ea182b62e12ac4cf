//! Markdown conversion of Phabricator objects.
//!
//! Output is written for an LLM to read back: compact headers, grouped
//! comment sections, and code-context blocks with the commented line
//! marked.

use phab_core::{CommentKind, RawComment, Revision, Task};
use phab_review::{Category, CodeContext, FeedbackEntry, FeedbackReport, UNATTRIBUTED};

use crate::truncation::truncate_text;

/// Comment bodies longer than this are trimmed in list views.
const MAX_COMMENT_LEN: usize = 400;

// ============================================================================
// Tasks
// ============================================================================

/// Render a task with its comment stream.
pub fn task_to_markdown(task: &Task, comments: &[RawComment]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# T{}: {}\n\n", task.id, task.title));
    out.push_str(&format!("**Status:** {}", task.status));
    if let Some(priority) = &task.priority {
        out.push_str(&format!(" | **Priority:** {}", priority));
    }
    out.push('\n');

    if let Some(author) = &task.author_phid {
        out.push_str(&format!("**Author:** {}\n", author));
    }
    if let Some(uri) = &task.uri {
        out.push_str(&format!("**URL:** {}\n", uri));
    }

    if let Some(description) = &task.description {
        if !description.is_empty() {
            out.push_str(&format!("\n{}\n", description));
        }
    }

    if !comments.is_empty() {
        out.push_str("\n## Comments\n\n");
        out.push_str(&comments_to_markdown(comments));
    }

    out
}

// ============================================================================
// Revisions
// ============================================================================

/// Render a revision with its comment stream (no code context).
pub fn revision_to_markdown(revision: &Revision, comments: &[RawComment]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# D{}: {}\n\n", revision.id, revision.title));
    out.push_str(&format!("**Status:** {}\n", revision.status));
    if let Some(author) = &revision.author_phid {
        out.push_str(&format!("**Author:** {}\n", author));
    }
    if let Some(uri) = &revision.uri {
        out.push_str(&format!("**URL:** {}\n", uri));
    }

    if let Some(summary) = &revision.summary {
        if !summary.is_empty() {
            out.push_str(&format!("\n{}\n", summary));
        }
    }

    if !comments.is_empty() {
        out.push_str("\n## Review comments\n\n");
        out.push_str(&comments_to_markdown(comments));
    }

    out
}

// ============================================================================
// Comments
// ============================================================================

/// Render a comment stream grouped into actions, general comments, and
/// inline comments.
pub fn comments_to_markdown(comments: &[RawComment]) -> String {
    if comments.is_empty() {
        return "No comments.\n".to_string();
    }

    let mut actions = Vec::new();
    let mut general = Vec::new();
    let mut inline = Vec::new();

    for comment in comments {
        match comment.kind {
            CommentKind::Accept | CommentKind::RequestChanges => actions.push(comment),
            CommentKind::Inline => inline.push(comment),
            CommentKind::General => {
                if !comment.text.is_empty() {
                    general.push(comment);
                }
            }
        }
    }

    let mut out = String::new();

    for action in actions {
        let verdict = match action.kind {
            CommentKind::Accept => "✅ ACCEPTED",
            _ => "❌ REQUESTED CHANGES",
        };
        out.push_str(&format!("{} by {}\n", verdict, action.author));
        if !action.text.is_empty() {
            out.push_str(&format!("> {}\n", truncate_text(&action.text, MAX_COMMENT_LEN)));
        }
        out.push('\n');
    }

    for comment in general {
        out.push_str(&format!(
            "**{}:** {}\n\n",
            comment.author,
            truncate_text(&comment.text, MAX_COMMENT_LEN)
        ));
    }

    for comment in inline {
        let location = match (&comment.path, comment.line) {
            (Some(path), Some(line)) => format!("{}:{}", path, line),
            (Some(path), None) => path.clone(),
            _ => "unknown location".to_string(),
        };
        out.push_str(&format!(
            "**{}** (inline, {}): {}\n\n",
            comment.author,
            location,
            truncate_text(&comment.text, MAX_COMMENT_LEN)
        ));
    }

    out
}

// ============================================================================
// Feedback reports
// ============================================================================

/// Render the full review-feedback report: summary, prioritized sections
/// with code context, and the action-item list.
pub fn feedback_to_markdown(report: &FeedbackReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "# Review feedback for D{}: {}\n\n",
        report.revision.id, report.revision.title
    ));
    out.push_str(&format!("**Status:** {}\n\n", report.revision.status));
    out.push_str(&format!("{}\n", report.summary));

    if report.review_feedback.is_empty() {
        out.push_str("\nNo actionable review feedback found.\n");
        return out;
    }

    let sections = [
        (Category::Issue, "🚨 Issues to fix"),
        (Category::Suggestion, "💡 Suggestions"),
        (Category::Nit, "🔧 Nits & style"),
        (Category::Other, "📝 Other feedback"),
    ];

    for (category, title) in sections {
        let entries: Vec<&FeedbackEntry> = report
            .review_feedback
            .iter()
            .filter(|e| e.category == category)
            .collect();
        if entries.is_empty() {
            continue;
        }

        out.push_str(&format!("\n## {} ({})\n\n", title, entries.len()));
        for (i, entry) in entries.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, feedback_entry(entry)));
        }
    }

    if !report.action_items.is_empty() {
        out.push_str("\n## Action items\n\n");
        for item in &report.action_items {
            out.push_str(&format!("- {}\n", item));
        }
    }

    out
}

/// Render the report as pretty-printed JSON (the wire shape of the report
/// itself) for callers that want structure instead of prose.
pub fn feedback_to_json(report: &FeedbackReport) -> phab_core::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn feedback_entry(entry: &FeedbackEntry) -> String {
    let mut out = format!("**{}:** {}\n", entry.author, entry.comment);

    if let (Some(file), Some(line)) = (&entry.primary_file, entry.primary_line) {
        if file != UNATTRIBUTED {
            out.push_str(&format!("   📍 {}:{}\n", file, line));
        }
    }

    if let Some(context) = &entry.code_context {
        out.push_str(&code_context_block(context));
    }

    out
}

fn code_context_block(context: &CodeContext) -> String {
    let mut out = String::new();

    if !context.hunk_info.is_empty() {
        out.push_str(&format!("   {}\n", context.hunk_info));
    }

    for line in &context.lines {
        let marker = if line.is_target { ">>>" } else { "   " };
        out.push_str(&format!(
            "   {} {:>4} | {}\n",
            marker, line.line_number, line.content
        ));
    }

    out
}
