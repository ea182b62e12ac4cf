//! Conduit API client implementation.
//!
//! Conduit is Phabricator's RPC interface: every method is a POST to
//! `{instance}/api/{method}` with a form-encoded `params` field holding the
//! JSON parameters (the API token rides inside as `__conduit__.token`).
//! Responses arrive in an envelope with `result` / `error_code` /
//! `error_info`.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use phab_core::{
    CommentKind, Conduit, Credentials, Error, RawComment, Result, Revision, Task,
};

use crate::types::{
    ConduitResponse, RevisionData, SearchResult, TaskData, TaskTransaction, TransactionData,
};

/// Conduit API client for one Phabricator instance.
pub struct ConduitClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl ConduitClient {
    /// Create a client from resolved credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials.url, credentials.token)
    }

    /// Create a client with an explicit base URL (also used with httpmock).
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::builder()
                .user_agent("phab-tools")
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Invoke one Conduit method and unwrap the response envelope.
    async fn call(&self, method: &str, mut params: Value) -> Result<Value> {
        params["__conduit__"] = json!({ "token": self.token });

        let url = format!("{}/api/{}", self.base_url, method);
        debug!(method = method, "Conduit call");

        let form = [
            ("params", serde_json::to_string(&params)?),
            ("output", "json".to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                method = method,
                status = status_code,
                "Conduit HTTP error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        let envelope: ConduitResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;

        if let Some(code) = envelope.error_code {
            let info = envelope.error_info.unwrap_or_default();
            warn!(method = method, code = code.as_str(), "Conduit error");
            return Err(Error::Conduit { code, info });
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }

    /// Run one `*.edit` transaction batch against an object like `T123`.
    async fn edit_object(&self, method: &str, identifier: String, transactions: Value) -> Result<()> {
        self.call(
            method,
            json!({
                "transactions": transactions,
                "objectIdentifier": identifier,
            }),
        )
        .await?;
        Ok(())
    }
}

/// Parse a task/revision ID, tolerating a leading `T`/`D` prefix.
fn parse_id(raw: &str, prefix: char) -> Result<u32> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix(prefix)
        .or_else(|| trimmed.strip_prefix(prefix.to_ascii_lowercase()))
        .unwrap_or(trimmed);
    digits
        .parse()
        .map_err(|_| Error::InvalidData(format!("Invalid ID: {}", raw)))
}

/// Map one `transaction.search` entry to a review comment, dropping
/// transaction types that carry no reviewer feedback.
fn comment_from_transaction(t: TransactionData) -> Option<RawComment> {
    let kind = match t.kind.as_deref()? {
        "comment" => CommentKind::General,
        "inline" => CommentKind::Inline,
        "accept" => CommentKind::Accept,
        "reject" | "request-changes" => CommentKind::RequestChanges,
        _ => return None,
    };

    let text = t
        .comments
        .first()
        .map(|c| c.content.raw.clone())
        .unwrap_or_default();

    // System actions without content are noise, not feedback
    if text.is_empty() && kind == CommentKind::General {
        return None;
    }

    let path = t
        .fields
        .get("path")
        .and_then(Value::as_str)
        .map(String::from);
    let line = t.fields.get("line").and_then(Value::as_u64).map(|l| l as u32);

    Some(RawComment {
        author: t.author_phid.unwrap_or_else(|| "unknown".to_string()),
        text,
        kind,
        path,
        line,
        timestamp: t.date_created,
    })
}

/// Epoch seconds from a Conduit value that may be a number or a string.
fn epoch(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl Conduit for ConduitClient {
    async fn get_task(&self, task_id: &str) -> Result<Task> {
        let id = parse_id(task_id, 'T')?;
        let result = self
            .call("maniphest.search", json!({ "constraints": { "ids": [id] } }))
            .await?;

        let search: SearchResult<TaskData> = serde_json::from_value(result)?;
        let task = search
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Task T{} not found", id)))?;

        Ok(Task {
            id: task.id,
            phid: task.phid,
            title: task.fields.name,
            description: task.fields.description.map(|d| d.raw).filter(|d| !d.is_empty()),
            status: task.fields.status.name,
            priority: task.fields.priority.map(|p| p.name).filter(|p| !p.is_empty()),
            author_phid: task.fields.author_phid,
            uri: task.fields.uri,
        })
    }

    async fn get_task_comments(&self, task_id: &str) -> Result<Vec<RawComment>> {
        let id = parse_id(task_id, 'T')?;
        let result = self
            .call("maniphest.gettasktransactions", json!({ "ids": [id] }))
            .await;

        // Comment retrieval degrades to an empty stream rather than failing
        // the whole tool call; the task itself already fetched fine.
        let result = match result {
            Ok(value) => value,
            Err(e) => {
                warn!(task = id, error = %e, "Could not fetch task transactions");
                return Ok(Vec::new());
            }
        };

        let transactions: Vec<TaskTransaction> = result
            .get(id.to_string().as_str())
            .cloned()
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();

        Ok(transactions
            .into_iter()
            .filter(|t| {
                matches!(t.transaction_type.as_str(), "comment" | "core:comment")
            })
            .filter_map(|t| {
                let text = t.comments.unwrap_or_default();
                if text.is_empty() {
                    return None;
                }
                Some(RawComment {
                    author: t.author_phid.unwrap_or_else(|| "unknown".to_string()),
                    text,
                    kind: CommentKind::General,
                    path: None,
                    line: None,
                    timestamp: t.date_created.and_then(|d| d.parse().ok()),
                })
            })
            .collect())
    }

    async fn add_task_comment(&self, task_id: &str, comment: &str) -> Result<()> {
        let id = parse_id(task_id, 'T')?;
        self.edit_object(
            "maniphest.edit",
            format!("T{}", id),
            json!([{ "type": "comment", "value": comment }]),
        )
        .await
    }

    async fn subscribe_to_task(&self, task_id: &str, user_phids: &[String]) -> Result<()> {
        let id = parse_id(task_id, 'T')?;
        self.edit_object(
            "maniphest.edit",
            format!("T{}", id),
            json!([{ "type": "subscribers.add", "value": user_phids }]),
        )
        .await
    }

    async fn get_revision(&self, revision_id: &str) -> Result<Revision> {
        let id = parse_id(revision_id, 'D')?;
        let result = self
            .call(
                "differential.revision.search",
                json!({ "constraints": { "ids": [id] } }),
            )
            .await?;

        let search: SearchResult<RevisionData> = serde_json::from_value(result)?;
        let revision = search
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Revision D{} not found", id)))?;

        Ok(Revision {
            id: revision.id,
            phid: revision.phid,
            title: revision.fields.title,
            summary: revision.fields.summary.filter(|s| !s.is_empty()),
            status: revision.fields.status.name,
            author_phid: revision.fields.author_phid,
            uri: revision.fields.uri,
        })
    }

    async fn get_revision_comments(&self, revision_id: &str) -> Result<Vec<RawComment>> {
        let id = parse_id(revision_id, 'D')?;
        let result = self
            .call(
                "transaction.search",
                json!({ "objectIdentifier": format!("D{}", id) }),
            )
            .await;

        let result = match result {
            Ok(value) => value,
            Err(e) => {
                warn!(revision = id, error = %e, "Could not fetch revision transactions");
                return Ok(Vec::new());
            }
        };

        let search: SearchResult<TransactionData> = serde_json::from_value(result)?;
        Ok(search
            .data
            .into_iter()
            .filter_map(comment_from_transaction)
            .collect())
    }

    async fn get_raw_diff(&self, revision_id: &str) -> Result<String> {
        let id = parse_id(revision_id, 'D')?;

        let diffs = self
            .call("differential.querydiffs", json!({ "revisionIDs": [id] }))
            .await?;

        let diffs = diffs
            .as_object()
            .ok_or_else(|| Error::InvalidData("Unexpected querydiffs response".to_string()))?;

        // Keys are diff IDs; take the newest diff of the revision
        let latest = diffs
            .iter()
            .max_by_key(|(_, diff)| epoch(diff.get("dateCreated").unwrap_or(&Value::Null)))
            .map(|(diff_id, _)| diff_id.clone())
            .ok_or_else(|| Error::NotFound(format!("No diffs found for revision D{}", id)))?;

        let diff_id: u64 = latest
            .parse()
            .map_err(|_| Error::InvalidData(format!("Unexpected diff ID: {}", latest)))?;

        let raw = self
            .call("differential.getrawdiff", json!({ "diffID": diff_id }))
            .await?;

        raw.as_str()
            .map(String::from)
            .ok_or_else(|| Error::InvalidData("Raw diff is not a string".to_string()))
    }

    async fn add_revision_comment(&self, revision_id: &str, comment: &str) -> Result<()> {
        let id = parse_id(revision_id, 'D')?;
        self.edit_object(
            "differential.revision.edit",
            format!("D{}", id),
            json!([{ "type": "comment", "value": comment }]),
        )
        .await
    }

    async fn add_inline_comment(
        &self,
        revision_id: &str,
        file_path: &str,
        line_number: u32,
        content: &str,
        is_new_file: bool,
    ) -> Result<()> {
        let id = parse_id(revision_id, 'D')?;
        self.edit_object(
            "differential.revision.edit",
            format!("D{}", id),
            json!([{
                "type": "inline",
                "value": {
                    "content": content,
                    "path": file_path,
                    "line": line_number,
                    "isNewFile": is_new_file,
                },
            }]),
        )
        .await
    }

    async fn accept_revision(&self, revision_id: &str) -> Result<()> {
        let id = parse_id(revision_id, 'D')?;
        self.edit_object(
            "differential.revision.edit",
            format!("D{}", id),
            json!([{ "type": "accept", "value": true }]),
        )
        .await
    }

    async fn request_changes(&self, revision_id: &str, comment: Option<&str>) -> Result<()> {
        let id = parse_id(revision_id, 'D')?;

        let mut transactions = vec![json!({ "type": "reject", "value": true })];
        if let Some(comment) = comment {
            transactions.push(json!({ "type": "comment", "value": comment }));
        }

        self.edit_object(
            "differential.revision.edit",
            format!("D{}", id),
            Value::Array(transactions),
        )
        .await
    }

    async fn subscribe_to_revision(&self, revision_id: &str, user_phids: &[String]) -> Result<()> {
        let id = parse_id(revision_id, 'D')?;
        self.edit_object(
            "differential.revision.edit",
            format!("D{}", id),
            json!([{ "type": "subscribers.add", "value": user_phids }]),
        )
        .await
    }
}
