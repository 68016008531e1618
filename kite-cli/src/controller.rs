use std::collections::HashMap;
use std::sync::Arc;

use kite::{Agent, ChatMessage, Gateway, Role};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event::AppEvent;

/// Handle on the in-flight response stream.
struct StreamTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Session/stream lifecycle state. Owns the per-agent session memo and the
/// one-active-stream rule; every output goes through the app event channel so
/// the main loop stays the single writer of view state.
pub struct Controller {
    gateway: Arc<dyn Gateway>,
    current_agent: Option<Agent>,
    session_ids: HashMap<String, String>,
    active: Option<StreamTask>,
    turn: u64,
}

impl Controller {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            current_agent: None,
            session_ids: HashMap::new(),
            active: None,
            turn: 0,
        }
    }

    /// Turn counter of the most recent stream. Events tagged with an older
    /// turn are stale and must be ignored by the consumer.
    pub fn current_turn(&self) -> u64 {
        self.turn
    }

    /// Commit a new chat target. Supersedes any in-flight stream and kicks
    /// off a best-effort session preview.
    pub async fn select_agent(&mut self, agent: Agent, tx: &UnboundedSender<AppEvent>) {
        self.cancel_active().await;
        self.current_agent = Some(agent.clone());
        self.spawn_session_preview(agent, tx);
    }

    /// Fetch and display one agent's sessions without changing the chat
    /// target. A failed fetch is dropped here, leaving whatever was rendered
    /// before on screen.
    pub fn spawn_session_preview(&self, agent: Agent, tx: &UnboundedSender<AppEvent>) {
        let gateway = Arc::clone(&self.gateway);
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Ok(sessions) = gateway.list_sessions(&agent).await {
                let _ = tx.send(AppEvent::Sessions { agent, sessions });
            }
        });
    }

    /// Best-effort all-sessions table.
    pub fn spawn_all_sessions(&self, tx: &UnboundedSender<AppEvent>) {
        let gateway = Arc::clone(&self.gateway);
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Ok(sessions) = gateway.list_all_sessions().await {
                let _ = tx.send(AppEvent::AllSessions(sessions));
            }
        });
    }

    /// Handle a submitted message: lazily create the session on first use,
    /// supersede the previous stream, echo the user turn, then start
    /// streaming the reply.
    pub async fn submit(&mut self, text: String, tx: &UnboundedSender<AppEvent>) {
        let agent = match &self.current_agent {
            Some(agent) => agent.clone(),
            None => {
                let _ = tx.send(AppEvent::Status("No agent selected".to_string()));
                return;
            }
        };

        let key = agent.agent_ref();
        let session_id = match self.session_ids.get(&key) {
            Some(id) => id.clone(),
            None => {
                let id = self.gateway.create_session(&agent, None).await;
                self.session_ids.insert(key, id.clone());
                id
            }
        };
        let _ = tx.send(AppEvent::SessionId(session_id.clone()));

        // The superseded stream must have stopped before this turn produces
        // any output; a cancel signal alone would still race its tail.
        self.cancel_active().await;

        let _ = tx.send(AppEvent::Echo(ChatMessage::user(text.clone())));

        self.turn += 1;
        let turn = self.turn;
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        let gateway = Arc::clone(&self.gateway);
        let task_tx = tx.clone();
        let handle = tokio::spawn(async move {
            stream_turn(gateway, agent, session_id, text, turn, child, task_tx).await;
        });
        self.active = Some(StreamTask { cancel, handle });
    }

    /// Cancel the in-flight stream task, if any, and wait until it has
    /// stopped emitting.
    pub async fn cancel_active(&mut self) {
        if let Some(task) = self.active.take() {
            task.cancel.cancel();
            let _ = task.handle.await;
        }
    }

    /// Final teardown: stop any stream, then release the gateway. Runs
    /// exactly once at shutdown, whether or not a stream ever started.
    pub async fn shutdown(&mut self) {
        self.cancel_active().await;
        self.gateway.close().await;
    }
}

/// Body of one streaming turn. Consumes the gateway stream item by item,
/// checking the cancellation token at every step.
async fn stream_turn(
    gateway: Arc<dyn Gateway>,
    agent: Agent,
    session_id: String,
    text: String,
    turn: u64,
    cancel: CancellationToken,
    tx: UnboundedSender<AppEvent>,
) {
    let _ = tx.send(AppEvent::StreamStarted { turn });
    let mut rx = gateway.stream_message(&agent, &session_id, &text).await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            item = rx.recv() => match item {
                Some(Ok(msg)) => {
                    if msg.role == Role::User {
                        // Already echoed locally on submit.
                        continue;
                    }
                    if tx.send(AppEvent::Stream { turn, msg }).is_err() {
                        return;
                    }
                }
                Some(Err(err)) => {
                    let _ = tx.send(AppEvent::StreamError {
                        turn,
                        message: err.to_string(),
                    });
                    return;
                }
                None => {
                    let _ = tx.send(AppEvent::StreamDone { turn });
                    return;
                }
            },
        }
    }
}
