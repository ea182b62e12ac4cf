//! Domain types fetched from Phabricator.
//!
//! All entities are constructed fresh per tool invocation from Conduit
//! responses and are immutable once built; nothing here persists beyond a
//! single request.

use serde::{Deserialize, Serialize};

/// A Maniphest task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Numeric ID (the `123` in `T123`)
    pub id: u32,
    pub phid: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub author_phid: Option<String>,
    pub uri: Option<String>,
}

/// A Differential revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
    /// Numeric ID (the `456` in `D456`)
    pub id: u32,
    pub phid: String,
    pub title: String,
    pub summary: Option<String>,
    pub status: String,
    pub author_phid: Option<String>,
    pub uri: Option<String>,
}

/// What kind of transaction a review comment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentKind {
    /// Free-standing discussion comment
    General,
    /// Comment anchored to a file and line
    Inline,
    /// Reviewer accepted the revision
    Accept,
    /// Reviewer rejected / requested changes
    RequestChanges,
}

impl CommentKind {
    /// Coarse type used in the feedback report: inline, general, or action.
    pub fn report_type(&self) -> &'static str {
        match self {
            CommentKind::Inline => "inline",
            CommentKind::General => "general",
            CommentKind::Accept | CommentKind::RequestChanges => "action",
        }
    }

    pub fn is_action(&self) -> bool {
        matches!(self, CommentKind::Accept | CommentKind::RequestChanges)
    }
}

/// A review or task comment as fetched from Conduit, before any correlation.
///
/// `path`/`line` are the explicit location metadata Phabricator attaches to
/// inline comments; both are absent for general comments and actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawComment {
    /// Author PHID (Phabricator does not expand these in transaction data)
    pub author: String,
    pub text: String,
    pub kind: CommentKind,
    pub path: Option<String>,
    pub line: Option<u32>,
    /// Epoch seconds, when the transaction carried one
    pub timestamp: Option<i64>,
}

impl RawComment {
    /// Explicit {file, line} location, when the source system provided one.
    pub fn explicit_location(&self) -> Option<(&str, u32)> {
        match (self.path.as_deref(), self.line) {
            (Some(path), Some(line)) => Some((path, line)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_type() {
        assert_eq!(CommentKind::Inline.report_type(), "inline");
        assert_eq!(CommentKind::General.report_type(), "general");
        assert_eq!(CommentKind::Accept.report_type(), "action");
        assert_eq!(CommentKind::RequestChanges.report_type(), "action");
    }

    #[test]
    fn test_is_action() {
        assert!(CommentKind::Accept.is_action());
        assert!(CommentKind::RequestChanges.is_action());
        assert!(!CommentKind::Inline.is_action());
        assert!(!CommentKind::General.is_action());
    }

    #[test]
    fn test_explicit_location() {
        let comment = RawComment {
            author: "PHID-USER-1".into(),
            text: "fix this".into(),
            kind: CommentKind::Inline,
            path: Some("src/main.rs".into()),
            line: Some(42),
            timestamp: None,
        };
        assert_eq!(comment.explicit_location(), Some(("src/main.rs", 42)));

        let general = RawComment {
            path: None,
            line: None,
            kind: CommentKind::General,
            ..comment
        };
        assert_eq!(general.explicit_location(), None);
    }

    #[test]
    fn test_comment_kind_serde() {
        let json = serde_json::to_string(&CommentKind::RequestChanges).unwrap();
        assert_eq!(json, "\"request-changes\"");
        let back: CommentKind = serde_json::from_str("\"inline\"").unwrap();
        assert_eq!(back, CommentKind::Inline);
    }
}
