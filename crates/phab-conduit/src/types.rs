//! Wire types for Conduit responses.
//!
//! Only the fields this crate consumes are modeled; Conduit envelopes carry
//! plenty more that is ignored during deserialization.

use serde::Deserialize;
use serde_json::Value;

/// The envelope every Conduit method responds with.
#[derive(Debug, Deserialize)]
pub struct ConduitResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_info: Option<String>,
}

/// `*.search` result body.
#[derive(Debug, Deserialize)]
pub struct SearchResult<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Nested `{"raw": ...}` text fields of the modern API.
#[derive(Debug, Default, Deserialize)]
pub struct RawText {
    #[serde(default)]
    pub raw: String,
}

/// Nested `{"name": ..., "value": ...}` status/priority fields.
#[derive(Debug, Default, Deserialize)]
pub struct NamedValue {
    #[serde(default)]
    pub name: String,
}

// =============================================================================
// maniphest.search
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TaskData {
    pub id: u32,
    pub phid: String,
    pub fields: TaskFields,
}

#[derive(Debug, Deserialize)]
pub struct TaskFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<RawText>,
    #[serde(default)]
    pub status: NamedValue,
    #[serde(default)]
    pub priority: Option<NamedValue>,
    #[serde(default, rename = "authorPHID")]
    pub author_phid: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

// =============================================================================
// differential.revision.search
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RevisionData {
    pub id: u32,
    pub phid: String,
    pub fields: RevisionFields,
}

#[derive(Debug, Deserialize)]
pub struct RevisionFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: NamedValue,
    #[serde(default, rename = "authorPHID")]
    pub author_phid: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

// =============================================================================
// transaction.search
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TransactionData {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "authorPHID")]
    pub author_phid: Option<String>,
    #[serde(default, rename = "dateCreated")]
    pub date_created: Option<i64>,
    #[serde(default)]
    pub comments: Vec<TransactionComment>,
    /// Inline comments carry `path` and `line` here
    #[serde(default)]
    pub fields: Value,
}

#[derive(Debug, Deserialize)]
pub struct TransactionComment {
    #[serde(default)]
    pub content: RawText,
}

// =============================================================================
// maniphest.gettasktransactions (older API, string-keyed)
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TaskTransaction {
    #[serde(default, rename = "transactionType")]
    pub transaction_type: String,
    /// Comment text; the old API inlines it as a plain string
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default, rename = "authorPHID")]
    pub author_phid: Option<String>,
    #[serde(default, rename = "dateCreated")]
    pub date_created: Option<String>,
}
