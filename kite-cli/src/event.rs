use crossterm::event::Event as TermEvent;
use kite::{Agent, ChatMessage, SessionSummary};

/// Unified event type for the main loop. Terminal input, timer ticks, and
/// controller output all arrive through the one channel, so view state has a
/// single writer.
pub enum AppEvent {
    Terminal(TermEvent),
    Tick,
    /// Wholesale replacement agent list from the gateway.
    Agents(Vec<Agent>),
    /// Session preview for one agent.
    Sessions {
        agent: Agent,
        sessions: Vec<SessionSummary>,
    },
    /// The all-sessions table.
    AllSessions(Vec<SessionSummary>),
    Status(String),
    /// Session id memoized for the current agent.
    SessionId(String),
    /// Local echo of a submitted user message.
    Echo(ChatMessage),
    /// Stream lifecycle, tagged with the controller turn that produced it.
    /// The main loop drops events from superseded turns.
    StreamStarted {
        turn: u64,
    },
    Stream {
        turn: u64,
        msg: ChatMessage,
    },
    StreamDone {
        turn: u64,
    },
    StreamError {
        turn: u64,
        message: String,
    },
    Quit,
}
