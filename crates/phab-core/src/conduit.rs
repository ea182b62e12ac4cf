//! The Conduit trait: the boundary between tools and the remote API.
//!
//! Tool handlers and the CLI program against this trait; the concrete
//! reqwest-backed implementation lives in the `phab-conduit` crate. Tests
//! substitute hand-rolled mocks.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{RawComment, Revision, Task};

/// Operations the remote Phabricator instance exposes to this server.
///
/// All calls are single-shot: no retries, no caching. Errors from the
/// remote propagate unchanged to the caller.
#[async_trait]
pub trait Conduit: Send + Sync {
    /// Fetch a Maniphest task by numeric ID (without the `T` prefix).
    async fn get_task(&self, task_id: &str) -> Result<Task>;

    /// Fetch the comment transactions on a task.
    async fn get_task_comments(&self, task_id: &str) -> Result<Vec<RawComment>>;

    /// Add a comment to a task.
    async fn add_task_comment(&self, task_id: &str, comment: &str) -> Result<()>;

    /// Subscribe users (by PHID) to a task.
    async fn subscribe_to_task(&self, task_id: &str, user_phids: &[String]) -> Result<()>;

    /// Fetch a Differential revision by numeric ID (without the `D` prefix).
    async fn get_revision(&self, revision_id: &str) -> Result<Revision>;

    /// Fetch the review comments and actions on a revision.
    async fn get_revision_comments(&self, revision_id: &str) -> Result<Vec<RawComment>>;

    /// Fetch the latest diff of a revision as unified-diff text.
    async fn get_raw_diff(&self, revision_id: &str) -> Result<String>;

    /// Add a top-level comment to a revision.
    async fn add_revision_comment(&self, revision_id: &str, comment: &str) -> Result<()>;

    /// Add an inline comment at a specific file and line.
    async fn add_inline_comment(
        &self,
        revision_id: &str,
        file_path: &str,
        line_number: u32,
        content: &str,
        is_new_file: bool,
    ) -> Result<()>;

    /// Accept the revision.
    async fn accept_revision(&self, revision_id: &str) -> Result<()>;

    /// Request changes on the revision, with an optional explanation.
    async fn request_changes(&self, revision_id: &str, comment: Option<&str>) -> Result<()>;

    /// Subscribe users (by PHID) to a revision.
    async fn subscribe_to_revision(&self, revision_id: &str, user_phids: &[String]) -> Result<()>;
}
