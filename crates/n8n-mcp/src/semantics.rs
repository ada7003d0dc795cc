//! MCP tool annotations derived from HTTP method semantics.
//!
//! Every n8n tool talks to an external system, so `openWorldHint` is always set. Reads (GET) are
//! read-only and idempotent; POSTs change workflow state and are not assumed idempotent.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

#[must_use]
pub fn annotations_for(method: &Method, title: &str) -> ToolAnnotations {
    let title = Some(title.to_string());
    let open_world_hint = Some(true);

    if method == Method::GET || method == Method::HEAD {
        return ToolAnnotations {
            title,
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint,
        };
    }

    if method == Method::POST {
        return ToolAnnotations {
            title,
            read_only_hint: Some(false),
            destructive_hint: Some(false),
            idempotent_hint: Some(false),
            open_world_hint,
        };
    }

    ToolAnnotations {
        title,
        read_only_hint: None,
        destructive_hint: None,
        idempotent_hint: None,
        open_world_hint,
    }
}
