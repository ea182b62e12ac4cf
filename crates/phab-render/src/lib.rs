//! Text rendering of Phabricator objects for tool output.
//!
//! Converts tasks, revisions, comment streams, and feedback reports into
//! Markdown-ish text for the LLM to read. JSON output is available for the
//! feedback report where callers want the raw structure instead.

pub mod markdown;
pub mod truncation;

pub use markdown::{
    comments_to_markdown, feedback_to_json, feedback_to_markdown, revision_to_markdown,
    task_to_markdown,
};
pub use truncation::truncate_text;
