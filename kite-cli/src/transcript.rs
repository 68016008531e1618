use kite::{Agent, ChatMessage, Role, SessionSummary};

/// Upper bound on kept transcript lines (FIFO eviction). Bounds memory and
/// render cost, not semantic history.
const MAX_LINES: usize = 400;

/// Row cap for the all-sessions table.
const MAX_SESSION_ROWS: usize = 200;

/// What the chat pane is currently showing.
enum View {
    /// The rolling chat log.
    Chat,
    /// A read-only summary block (session listings). The chat log is kept
    /// underneath and comes back with the next message.
    Summary {
        heading: Option<String>,
        rows: Vec<String>,
    },
}

/// The scrolling message log plus the session summary views that can
/// temporarily replace it on screen.
pub struct Transcript {
    lines: Vec<String>,
    view: View,
    pub scroll_offset: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            view: View::Chat,
            scroll_offset: 0,
        }
    }

    /// Append one message with role-aware formatting. Consecutive assistant
    /// fragments are coalesced onto the current assistant line instead of
    /// starting a new one.
    pub fn add_message(&mut self, msg: &ChatMessage) {
        self.view = View::Chat;
        match self.lines.last_mut() {
            Some(last) if msg.role == Role::Assistant && last.starts_with("assistant:") => {
                last.push_str(&msg.content);
            }
            _ => self.lines.push(format!("{}: {}", msg.role, msg.content)),
        }
        if self.lines.len() > MAX_LINES {
            let excess = self.lines.len() - MAX_LINES;
            self.lines.drain(..excess);
        }
        self.scroll_to_bottom();
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.view = View::Chat;
        self.scroll_offset = 0;
    }

    /// Read-only session summary for one agent.
    pub fn show_sessions(&mut self, agent: &Agent, sessions: &[SessionSummary]) {
        let (heading, rows) = if sessions.is_empty() {
            (agent.display_name(), vec!["(no sessions yet)".to_string()])
        } else {
            let rows = sessions
                .iter()
                .map(|s| {
                    format!("• {} ({})", s.name.as_deref().unwrap_or("-"), short_id(&s.id))
                })
                .collect();
            (format!("{} sessions", agent.display_name()), rows)
        };
        self.view = View::Summary {
            heading: Some(heading),
            rows,
        };
        self.scroll_offset = 0;
    }

    /// Read-only table of every known session.
    pub fn show_all_sessions(&mut self, sessions: &[SessionSummary]) {
        if sessions.is_empty() {
            self.view = View::Summary {
                heading: None,
                rows: vec!["(no sessions)".to_string()],
            };
        } else {
            let mut rows = vec!["ID(short)  NAME         AGENT".to_string()];
            for s in sessions.iter().take(MAX_SESSION_ROWS) {
                rows.push(format!(
                    "{:<9} {:<12} {}",
                    short_id(&s.id),
                    s.name.as_deref().unwrap_or("-"),
                    s.agent_ref.as_deref().unwrap_or(""),
                ));
            }
            self.view = View::Summary {
                heading: Some("All sessions".to_string()),
                rows,
            };
        }
        self.scroll_offset = 0;
    }

    /// (optional bold heading, body lines) for whatever is on screen.
    pub fn visible(&self) -> (Option<&str>, &[String]) {
        match &self.view {
            View::Chat => (None, &self.lines),
            View::Summary { heading, rows } => (heading.as_deref(), rows),
        }
    }

    /// The chat log itself, regardless of the active view.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize, viewport_height: usize) {
        let (heading, rows) = self.visible();
        let total = rows.len() + heading.map_or(0, |_| 1);
        let max_scroll = total.saturating_sub(viewport_height);
        self.scroll_offset = self.scroll_offset.saturating_add(amount).min(max_scroll);
    }

    pub fn scroll_to_bottom(&mut self) {
        // Clamped at draw time when the viewport height is known.
        self.scroll_offset = usize::MAX;
    }
}

/// First 8 characters of an opaque id, for compact display.
pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sess(id: &str, name: Option<&str>, agent_ref: Option<&str>) -> SessionSummary {
        SessionSummary {
            id: id.to_string(),
            name: name.map(str::to_string),
            created_at: None,
            agent_ref: agent_ref.map(str::to_string),
        }
    }

    #[test]
    fn consecutive_assistant_fragments_coalesce() {
        let mut transcript = Transcript::new();
        transcript.add_message(&ChatMessage::assistant("a"));
        transcript.add_message(&ChatMessage::assistant("b"));
        transcript.add_message(&ChatMessage::assistant("c"));
        assert_eq!(transcript.lines(), ["assistant: abc"]);
    }

    #[test]
    fn non_assistant_message_breaks_coalescing() {
        let mut transcript = Transcript::new();
        transcript.add_message(&ChatMessage::assistant("a"));
        transcript.add_message(&ChatMessage::user("hi"));
        transcript.add_message(&ChatMessage::assistant("b"));
        transcript.add_message(&ChatMessage::assistant("c"));
        assert_eq!(
            transcript.lines(),
            ["assistant: a", "user: hi", "assistant: bc"]
        );
    }

    #[test]
    fn buffer_is_capped_with_oldest_dropped_first() {
        let mut transcript = Transcript::new();
        for i in 0..1000 {
            transcript.add_message(&ChatMessage::user(i.to_string()));
        }
        assert_eq!(transcript.lines().len(), 400);
        assert_eq!(transcript.lines()[0], "user: 600");
        assert_eq!(transcript.lines()[399], "user: 999");
    }

    #[test]
    fn session_summary_renders_bullets_with_short_ids() {
        let mut transcript = Transcript::new();
        let agent = Agent::new("default/echo", "default", "echo", "");
        transcript.show_sessions(
            &agent,
            &[
                sess("0123456789abcdef", Some("morning"), None),
                sess("fe", None, None),
            ],
        );
        let (heading, rows) = transcript.visible();
        assert_eq!(heading, Some("echo sessions"));
        assert_eq!(rows, ["• morning (01234567)", "• - (fe)"]);
    }

    #[test]
    fn empty_session_summary_shows_placeholder() {
        let mut transcript = Transcript::new();
        let agent = Agent::new("default/echo", "default", "echo", "");
        transcript.show_sessions(&agent, &[]);
        let (heading, rows) = transcript.visible();
        assert_eq!(heading, Some("echo"));
        assert_eq!(rows, ["(no sessions yet)"]);
    }

    #[test]
    fn all_sessions_table_is_capped_at_200_rows() {
        let mut transcript = Transcript::new();
        let sessions: Vec<SessionSummary> = (0..250)
            .map(|i| sess(&format!("id-{i:04}"), None, Some("default/echo")))
            .collect();
        transcript.show_all_sessions(&sessions);
        let (heading, rows) = transcript.visible();
        assert_eq!(heading, Some("All sessions"));
        // Header row + 200 capped entries.
        assert_eq!(rows.len(), 201);
        assert!(rows[1].starts_with("id-0000"));
    }

    #[test]
    fn all_sessions_empty_shows_placeholder() {
        let mut transcript = Transcript::new();
        transcript.show_all_sessions(&[]);
        let (heading, rows) = transcript.visible();
        assert_eq!(heading, None);
        assert_eq!(rows, ["(no sessions)"]);
    }

    #[test]
    fn next_message_returns_from_summary_to_chat() {
        let mut transcript = Transcript::new();
        transcript.add_message(&ChatMessage::user("kept"));
        transcript.show_all_sessions(&[]);
        transcript.add_message(&ChatMessage::assistant("back"));
        let (heading, rows) = transcript.visible();
        assert_eq!(heading, None);
        assert_eq!(rows, ["user: kept", "assistant: back"]);
    }
}
