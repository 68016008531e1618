use std::fmt;

use chrono::{DateTime, Local};
use serde::Deserialize;

/// A conversational agent exposed by the controller service.
///
/// The controller capitalizes field names inconsistently across endpoints,
/// so the common variants are accepted as aliases on deserialize.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Agent {
    #[serde(alias = "ID", default)]
    pub id: String,
    #[serde(alias = "Namespace", default)]
    pub namespace: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl Agent {
    pub fn new(id: &str, namespace: &str, name: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            title: (!title.is_empty()).then(|| title.to_string()),
        }
    }

    /// Stable identity within a run: `namespace/name`. Two records with
    /// equal refs are the same agent; session memoization keys on this.
    pub fn agent_ref(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Human-friendly name shown in the selector and status bar.
    ///
    /// Drops the mangled-namespace prefix (everything through `__NS__`),
    /// one conventional `_agent` suffix, and hyphenates the rest. Total:
    /// any input string yields a name without panicking.
    pub fn display_name(&self) -> String {
        let raw = if self.id.is_empty() { &self.name } else { &self.id };
        let base = match raw.split_once("__NS__") {
            Some((_, rest)) => rest,
            None => raw.as_str(),
        };
        let base = base.strip_suffix("_agent").unwrap_or(base);
        base.replace('_', "-")
    }
}

/// Who produced a chat turn.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        })
    }
}

/// One chat turn, possibly a partial fragment when streamed. Immutable once
/// constructed; the transcript concatenates fragments, messages are never
/// rewritten.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub ts: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            ts: Local::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Server-side session record as returned by the listing endpoints.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SessionSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, alias = "agent_id")]
    pub agent_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_ref_joins_namespace_and_name() {
        let agent = Agent::new("default/echo", "default", "echo", "Echo Agent");
        assert_eq!(agent.agent_ref(), "default/echo");
    }

    #[test]
    fn display_name_strips_prefix_and_suffix() {
        let agent = Agent::new("ns__NS__foo_agent", "ns", "foo_agent", "Foo");
        assert_eq!(agent.display_name(), "foo");
    }

    #[test]
    fn display_name_hyphenates_separators() {
        let agent = Agent::new("default__NS__search_agent", "default", "search_agent", "");
        assert_eq!(agent.display_name(), "search");

        let agent = Agent::new("web_search_agent", "default", "web_search_agent", "");
        assert_eq!(agent.display_name(), "web-search");
    }

    #[test]
    fn display_name_total_on_odd_inputs() {
        // No separator, no suffix: passes through hyphenated.
        let plain = Agent::new("plain", "default", "plain", "");
        assert_eq!(plain.display_name(), "plain");

        // Empty id falls back to the name field.
        let unnamed = Agent {
            id: String::new(),
            namespace: "default".into(),
            name: "helper".into(),
            title: None,
        };
        assert_eq!(unnamed.display_name(), "helper");

        // Fully empty record still yields a (blank) name, no panic.
        let empty = Agent {
            id: String::new(),
            namespace: String::new(),
            name: String::new(),
            title: None,
        };
        assert_eq!(empty.display_name(), "");

        // Suffix-only and prefix-only edge shapes.
        let suffix_only = Agent::new("_agent", "default", "_agent", "");
        assert_eq!(suffix_only.display_name(), "");
        let prefix_only = Agent::new("x__NS__", "default", "x", "");
        assert_eq!(prefix_only.display_name(), "");
    }

    #[test]
    fn display_name_is_idempotent() {
        let agent = Agent::new("default__NS__search_agent", "default", "search_agent", "");
        let once = agent.display_name();
        let again = Agent::new(&once, "default", &once, "");
        assert_eq!(again.display_name(), once);
    }

    #[test]
    fn agent_decodes_capitalized_wire_fields() {
        let agent: Agent = serde_json::from_str(
            r#"{"ID": "default/echo", "Namespace": "default", "Name": "echo"}"#,
        )
        .expect("alias decode");
        assert_eq!(agent.agent_ref(), "default/echo");
        assert_eq!(agent.title, None);
    }

    #[test]
    fn session_summary_accepts_agent_id_alias() {
        let summary: SessionSummary =
            serde_json::from_str(r#"{"id": "abc123", "agent_id": "default/echo"}"#)
                .expect("alias decode");
        assert_eq!(summary.agent_ref.as_deref(), Some("default/echo"));
        assert_eq!(summary.name, None);
    }

    #[test]
    fn role_displays_lowercase() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::System.to_string(), "system");
    }
}
