//! Tool execution.
//!
//! Dispatches tools/call requests to the Conduit client, runs the review
//! pipeline where a tool needs it, and renders the result as text. Every
//! failure becomes a structured error result, never a silent empty report.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use phab_conduit::ConduitSource;
use phab_core::{Conduit, Error, Result};
use phab_render as render;
use phab_review::{build_report, ReviewConfig};

use crate::protocol::{ToolCallResult, ToolDefinition};
use crate::tools;

/// Default code-context window when the caller does not pass one.
const DEFAULT_CONTEXT_LINES: usize = 7;

/// Executes tools against a [`ConduitSource`].
pub struct ToolHandler {
    source: Arc<dyn ConduitSource>,
}

impl ToolHandler {
    pub fn new(source: Arc<dyn ConduitSource>) -> Self {
        Self { source }
    }

    /// Tool definitions for tools/list.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        tools::definitions()
    }

    /// Execute a tool by name. Errors surface as error results.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        tracing::info!(tool = name, "executing tool");

        match self.dispatch(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool failed");
                ToolCallResult::error(format!("Phabricator API error: {}", e))
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: Option<Value>) -> Result<ToolCallResult> {
        match name {
            "get_task" => self.get_task(parse(arguments)?).await,
            "add_task_comment" => self.add_task_comment(parse(arguments)?).await,
            "subscribe_to_task" => self.subscribe_to_task(parse(arguments)?).await,
            "get_differential" => self.get_differential(parse(arguments)?).await,
            "get_differential_detailed" => {
                self.get_differential_detailed(parse(arguments)?).await
            }
            "add_differential_comment" => {
                self.add_differential_comment(parse(arguments)?).await
            }
            "accept_differential" => self.accept_differential(parse(arguments)?).await,
            "request_changes_differential" => {
                self.request_changes_differential(parse(arguments)?).await
            }
            "subscribe_to_differential" => {
                self.subscribe_to_differential(parse(arguments)?).await
            }
            "get_review_feedback" => self.get_review_feedback(parse(arguments)?).await,
            "add_inline_comment" => self.add_inline_comment(parse(arguments)?).await,
            _ => Ok(ToolCallResult::error(format!("Unknown tool: {}", name))),
        }
    }

    fn client(&self, api_token: &Option<String>) -> Result<Arc<dyn Conduit>> {
        self.source.client(api_token.as_deref())
    }

    // =========================================================================
    // Maniphest tools
    // =========================================================================

    async fn get_task(&self, params: TaskParams) -> Result<ToolCallResult> {
        let client = self.client(&params.api_token)?;

        let (task, comments) = tokio::join!(
            client.get_task(&params.task_id),
            client.get_task_comments(&params.task_id),
        );
        let task = task?;
        let comments = comments?;

        Ok(ToolCallResult::text(render::task_to_markdown(&task, &comments)))
    }

    async fn add_task_comment(&self, params: TaskCommentParams) -> Result<ToolCallResult> {
        let client = self.client(&params.api_token)?;
        client
            .add_task_comment(&params.task_id, &params.comment)
            .await?;
        Ok(ToolCallResult::text(format!(
            "✓ Comment added successfully to task T{}",
            params.task_id
        )))
    }

    async fn subscribe_to_task(&self, params: SubscribeTaskParams) -> Result<ToolCallResult> {
        let phids = split_phids(&params.user_phids)?;
        let client = self.client(&params.api_token)?;
        client.subscribe_to_task(&params.task_id, &phids).await?;
        Ok(ToolCallResult::text(format!(
            "✓ {} user(s) subscribed successfully to task T{}",
            phids.len(),
            params.task_id
        )))
    }

    // =========================================================================
    // Differential tools
    // =========================================================================

    async fn get_differential(&self, params: RevisionParams) -> Result<ToolCallResult> {
        let client = self.client(&params.api_token)?;

        let (revision, comments) = tokio::join!(
            client.get_revision(&params.revision_id),
            client.get_revision_comments(&params.revision_id),
        );
        let revision = revision?;
        let comments = comments?;

        Ok(ToolCallResult::text(render::revision_to_markdown(
            &revision, &comments,
        )))
    }

    async fn get_differential_detailed(&self, params: RevisionParams) -> Result<ToolCallResult> {
        let report = self
            .correlated_report(&params.revision_id, &params.api_token, DEFAULT_CONTEXT_LINES)
            .await?;
        Ok(ToolCallResult::text(render::feedback_to_markdown(&report)))
    }

    async fn add_differential_comment(
        &self,
        params: RevisionCommentParams,
    ) -> Result<ToolCallResult> {
        let client = self.client(&params.api_token)?;
        client
            .add_revision_comment(&params.revision_id, &params.comment)
            .await?;
        Ok(ToolCallResult::text(format!(
            "✓ Comment added successfully to revision D{}",
            params.revision_id
        )))
    }

    async fn accept_differential(&self, params: RevisionParams) -> Result<ToolCallResult> {
        let client = self.client(&params.api_token)?;
        client.accept_revision(&params.revision_id).await?;
        Ok(ToolCallResult::text(format!(
            "✓ Revision D{} accepted successfully",
            params.revision_id
        )))
    }

    async fn request_changes_differential(
        &self,
        params: RequestChangesParams,
    ) -> Result<ToolCallResult> {
        let client = self.client(&params.api_token)?;
        client
            .request_changes(&params.revision_id, params.comment.as_deref())
            .await?;
        Ok(ToolCallResult::text(format!(
            "✓ Changes requested for revision D{}",
            params.revision_id
        )))
    }

    async fn subscribe_to_differential(
        &self,
        params: SubscribeRevisionParams,
    ) -> Result<ToolCallResult> {
        let phids = split_phids(&params.user_phids)?;
        let client = self.client(&params.api_token)?;
        client
            .subscribe_to_revision(&params.revision_id, &phids)
            .await?;
        Ok(ToolCallResult::text(format!(
            "✓ {} user(s) subscribed successfully to revision D{}",
            phids.len(),
            params.revision_id
        )))
    }

    async fn get_review_feedback(&self, params: FeedbackParams) -> Result<ToolCallResult> {
        let context_lines = params.context_lines.unwrap_or(DEFAULT_CONTEXT_LINES);
        let report = self
            .correlated_report(&params.revision_id, &params.api_token, context_lines)
            .await?;

        let text = match params.format.as_deref() {
            Some("json") => render::feedback_to_json(&report)?,
            _ => render::feedback_to_markdown(&report),
        };
        Ok(ToolCallResult::text(text))
    }

    async fn add_inline_comment(&self, params: InlineCommentParams) -> Result<ToolCallResult> {
        let client = self.client(&params.api_token)?;
        client
            .add_inline_comment(
                &params.revision_id,
                &params.file_path,
                params.line_number,
                &params.content,
                params.is_new_file.unwrap_or(true),
            )
            .await?;
        Ok(ToolCallResult::text(format!(
            "✓ Inline comment added successfully to {}:{} in revision D{}",
            params.file_path, params.line_number, params.revision_id
        )))
    }

    /// Fetch everything the correlation pipeline needs and run it.
    ///
    /// Revision metadata and comments have no ordering dependency and are
    /// fetched concurrently; the diff fetch and parse must complete before
    /// correlation, a data dependency rather than a lock.
    async fn correlated_report(
        &self,
        revision_id: &str,
        api_token: &Option<String>,
        context_lines: usize,
    ) -> Result<phab_review::FeedbackReport> {
        let client = self.client(api_token)?;

        let (revision, comments) = tokio::join!(
            client.get_revision(revision_id),
            client.get_revision_comments(revision_id),
        );
        let revision = revision?;
        let comments = comments?;

        let raw_diff = client.get_raw_diff(revision_id).await?;

        let config = ReviewConfig {
            context_lines,
            ..Default::default()
        };
        build_report(revision, &comments, Some(&raw_diff), &config)
    }
}

fn parse<T: for<'de> Deserialize<'de>>(arguments: Option<Value>) -> Result<T> {
    let value = arguments.unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| Error::InvalidData(format!("Invalid tool arguments: {}", e)))
}

/// Split a comma-separated PHID list, rejecting an empty result.
fn split_phids(raw: &str) -> Result<Vec<String>> {
    let phids: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if phids.is_empty() {
        return Err(Error::InvalidData("No user PHIDs provided".to_string()));
    }
    Ok(phids)
}

// =============================================================================
// Tool parameter types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TaskParams {
    task_id: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskCommentParams {
    task_id: String,
    comment: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscribeTaskParams {
    task_id: String,
    user_phids: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevisionParams {
    revision_id: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevisionCommentParams {
    revision_id: String,
    comment: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RequestChangesParams {
    revision_id: String,
    comment: Option<String>,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscribeRevisionParams {
    revision_id: String,
    user_phids: String,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedbackParams {
    revision_id: String,
    context_lines: Option<usize>,
    format: Option<String>,
    api_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InlineCommentParams {
    revision_id: String,
    file_path: String,
    line_number: u32,
    content: String,
    is_new_file: Option<bool>,
    api_token: Option<String>,
}
