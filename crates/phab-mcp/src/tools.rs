//! Tool definitions exposed over tools/list.

use serde_json::json;

use crate::protocol::ToolDefinition;

fn tool(name: &str, description: &str, input_schema: serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn api_token() -> serde_json::Value {
    json!({
        "type": "string",
        "description": "Optional API token overriding the configured one"
    })
}

/// All tools this server exposes.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "get_task",
            "Get details of a Phabricator task, including its comments",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "Task ID (without 'T' prefix)"
                    },
                    "api_token": api_token(),
                },
                "required": ["task_id"]
            }),
        ),
        tool(
            "add_task_comment",
            "Add a comment to a Phabricator task",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "Task ID (without 'T' prefix)"
                    },
                    "comment": { "type": "string", "description": "Comment text to add" },
                    "api_token": api_token(),
                },
                "required": ["task_id", "comment"]
            }),
        ),
        tool(
            "subscribe_to_task",
            "Subscribe users to a Phabricator task",
            json!({
                "type": "object",
                "properties": {
                    "task_id": {
                        "type": "string",
                        "description": "Task ID (without 'T' prefix)"
                    },
                    "user_phids": {
                        "type": "string",
                        "description": "Comma-separated list of user PHIDs to subscribe"
                    },
                    "api_token": api_token(),
                },
                "required": ["task_id", "user_phids"]
            }),
        ),
        tool(
            "get_differential",
            "Get details of a Phabricator differential revision",
            json!({
                "type": "object",
                "properties": {
                    "revision_id": {
                        "type": "string",
                        "description": "Revision ID (without 'D' prefix)"
                    },
                    "api_token": api_token(),
                },
                "required": ["revision_id"]
            }),
        ),
        tool(
            "get_differential_detailed",
            "Get detailed code review information including comments correlated with code changes",
            json!({
                "type": "object",
                "properties": {
                    "revision_id": {
                        "type": "string",
                        "description": "Revision ID (without 'D' prefix)"
                    },
                    "api_token": api_token(),
                },
                "required": ["revision_id"]
            }),
        ),
        tool(
            "add_differential_comment",
            "Add a comment to a differential revision",
            json!({
                "type": "object",
                "properties": {
                    "revision_id": {
                        "type": "string",
                        "description": "Revision ID (without 'D' prefix)"
                    },
                    "comment": { "type": "string", "description": "Comment text to add" },
                    "api_token": api_token(),
                },
                "required": ["revision_id", "comment"]
            }),
        ),
        tool(
            "accept_differential",
            "Accept a differential revision",
            json!({
                "type": "object",
                "properties": {
                    "revision_id": {
                        "type": "string",
                        "description": "Revision ID (without 'D' prefix)"
                    },
                    "api_token": api_token(),
                },
                "required": ["revision_id"]
            }),
        ),
        tool(
            "request_changes_differential",
            "Request changes on a differential revision",
            json!({
                "type": "object",
                "properties": {
                    "revision_id": {
                        "type": "string",
                        "description": "Revision ID (without 'D' prefix)"
                    },
                    "comment": {
                        "type": "string",
                        "description": "Optional comment explaining the requested changes"
                    },
                    "api_token": api_token(),
                },
                "required": ["revision_id"]
            }),
        ),
        tool(
            "subscribe_to_differential",
            "Subscribe users to a differential revision",
            json!({
                "type": "object",
                "properties": {
                    "revision_id": {
                        "type": "string",
                        "description": "Revision ID (without 'D' prefix)"
                    },
                    "user_phids": {
                        "type": "string",
                        "description": "Comma-separated list of user PHIDs to subscribe"
                    },
                    "api_token": api_token(),
                },
                "required": ["revision_id", "user_phids"]
            }),
        ),
        tool(
            "get_review_feedback",
            "Get review feedback with code context for addressing comments: each comment \
             is mapped to the file and line it refers to, prioritized, and summarized \
             into action items",
            json!({
                "type": "object",
                "properties": {
                    "revision_id": {
                        "type": "string",
                        "description": "Revision ID (without 'D' prefix)"
                    },
                    "context_lines": {
                        "type": "integer",
                        "description": "Lines of code context around each comment (default: 7)",
                        "minimum": 0
                    },
                    "format": {
                        "type": "string",
                        "enum": ["markdown", "json"],
                        "description": "Output format (default: markdown)"
                    },
                    "api_token": api_token(),
                },
                "required": ["revision_id"]
            }),
        ),
        tool(
            "add_inline_comment",
            "Add an inline comment to a specific line in a differential revision",
            json!({
                "type": "object",
                "properties": {
                    "revision_id": {
                        "type": "string",
                        "description": "Revision ID (without 'D' prefix)"
                    },
                    "file_path": {
                        "type": "string",
                        "description": "Path to the file to comment on"
                    },
                    "line_number": {
                        "type": "integer",
                        "description": "Line number to comment on",
                        "minimum": 1
                    },
                    "content": { "type": "string", "description": "Comment text to add" },
                    "is_new_file": {
                        "type": "boolean",
                        "description": "Comment on the new (true, default) or old (false) version"
                    },
                    "api_token": api_token(),
                },
                "required": ["revision_id", "file_path", "line_number", "content"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_present() {
        let tools = definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();

        for expected in [
            "get_task",
            "add_task_comment",
            "subscribe_to_task",
            "get_differential",
            "get_differential_detailed",
            "add_differential_comment",
            "accept_differential",
            "request_changes_differential",
            "subscribe_to_differential",
            "get_review_feedback",
            "add_inline_comment",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
        assert_eq!(tools.len(), 11);
    }

    #[test]
    fn test_schemas_declare_required_params() {
        for tool in definitions() {
            let schema = &tool.input_schema;
            assert_eq!(schema["type"], "object", "{}", tool.name);
            assert!(
                schema["required"].as_array().is_some(),
                "{} lacks required list",
                tool.name
            );
        }
    }
}
