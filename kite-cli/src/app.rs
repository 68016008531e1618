use kite::Agent;

use crate::agents::AgentList;
use crate::input::{Editor, InputMode};
use crate::transcript::Transcript;

/// Where keyboard input is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Agents,
    Input,
}

/// View-side state. Mutated only by the main loop; the status fields are
/// plain values re-rendered on every change rather than observed properties.
pub struct App {
    pub transcript: Transcript,
    pub agents: AgentList,
    pub editor: Editor,
    pub focus: Focus,
    pub status: String,
    pub agent_label: String,
    pub session_label: String,
    /// True while a response stream is active; drives the spinner.
    pub streaming: bool,
    pub show_help: bool,
    /// Spinner frame counter.
    pub tick: usize,
    /// Whether the UI needs a redraw.
    pub dirty: bool,
}

impl App {
    pub fn new(mode: InputMode) -> Self {
        Self {
            transcript: Transcript::new(),
            agents: AgentList::new(),
            editor: Editor::new(mode),
            focus: Focus::Input,
            status: "Ready".to_string(),
            agent_label: "-".to_string(),
            session_label: "-".to_string(),
            streaming: false,
            show_help: false,
            tick: 0,
            dirty: true,
        }
    }

    /// Status-bar bookkeeping for a committed selection. The session
    /// indicator resets: nothing is created until the first message.
    pub fn note_agent_selected(&mut self, agent: &Agent) {
        self.status = "Agent selected".to_string();
        self.agent_label = agent.display_name();
        self.session_label = "-".to_string();
        self.streaming = false;
        self.dirty = true;
    }

    /// Status-bar bookkeeping for a highlight move that has not committed.
    pub fn note_agent_focus(&mut self, agent: &Agent) {
        self.status = "Agent focus".to_string();
        self.agent_label = agent.display_name();
        self.dirty = true;
    }
}
