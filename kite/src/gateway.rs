use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::model::{Agent, ChatMessage, Role, SessionSummary};

/// Item yielded by a message stream: a message, or the failure that ended it.
pub type StreamItem = Result<ChatMessage, GatewayError>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Operations the terminal UI consumes from the remote controller.
///
/// `list_agents` and `create_session` are infallible from the caller's side:
/// they degrade to offline placeholders / a locally generated id. The session
/// listings surface failures so best-effort displays can discard them at the
/// call site.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn list_agents(&self) -> Vec<Agent>;

    async fn list_sessions(&self, agent: &Agent) -> Result<Vec<SessionSummary>, GatewayError>;

    async fn list_all_sessions(&self) -> Result<Vec<SessionSummary>, GatewayError>;

    async fn create_session(&self, agent: &Agent, name: Option<&str>) -> String;

    /// Start streaming one reply. The returned sequence is finite and
    /// one-shot; the first item conventionally echoes the user message. A
    /// mid-stream failure arrives as a single `Err` item and ends the
    /// stream. Dropping the receiver stops production.
    async fn stream_message(
        &self,
        agent: &Agent,
        session_id: &str,
        text: &str,
    ) -> mpsc::Receiver<StreamItem>;

    /// Scoped teardown. Safe to call more than once.
    async fn close(&self);
}

/// Message line as framed on the a2a streaming endpoint.
#[derive(Debug, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: String,
}

/// Gateway over the controller's HTTP API.
///
/// Every operation degrades gracefully when the controller is unreachable so
/// the UI stays usable offline: placeholder agents, a locally generated
/// session id, and a synthetic echo stream.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    namespace: String,
    closed: AtomicBool,
}

impl HttpGateway {
    pub fn new(base_url: &str, namespace: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
            closed: AtomicBool::new(false),
        }
    }

    /// Fixed placeholder pair returned when the controller is unreachable.
    pub fn offline_agents() -> Vec<Agent> {
        vec![
            Agent::new("default/echo", "default", "echo", "Echo Agent"),
            Agent::new("default/helper", "default", "helper", "Helper Agent"),
        ]
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>, GatewayError> {
        let resp = self
            .http
            .get(format!("{}/api/agents", self.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Status(resp.status().as_u16()));
        }
        let body: serde_json::Value = resp.json().await?;
        let data = body.get("data").cloned().unwrap_or_default();
        let mut agents: Vec<Agent> = serde_json::from_value(data).unwrap_or_default();
        for agent in &mut agents {
            if agent.namespace.is_empty() {
                agent.namespace = self.namespace.clone();
            }
            if agent.name.is_empty() {
                agent.name = agent.id.rsplit('/').next().unwrap_or_default().to_string();
            }
        }
        Ok(agents)
    }

    async fn fetch_sessions(
        &self,
        agent_ref: Option<&str>,
    ) -> Result<Vec<SessionSummary>, GatewayError> {
        let mut req = self.http.get(format!("{}/api/sessions", self.base_url));
        if let Some(r) = agent_ref {
            req = req.query(&[("agent", r)]);
        }
        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Status(resp.status().as_u16()));
        }
        let body: serde_json::Value = resp.json().await?;
        let data = body.get("data").cloned().unwrap_or(body);
        Ok(serde_json::from_value(data).unwrap_or_default())
    }

    async fn request_session(
        &self,
        agent: &Agent,
        name: Option<&str>,
    ) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(format!("{}/api/sessions", self.base_url))
            .json(&json!({ "name": name, "agentRef": agent.agent_ref() }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(GatewayError::Status(resp.status().as_u16()));
        }
        let body: serde_json::Value = resp.json().await?;
        let id = body
            .pointer("/data/id")
            .or_else(|| body.get("id"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(id.to_string())
    }
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn list_agents(&self) -> Vec<Agent> {
        match self.fetch_agents().await {
            Ok(agents) if !agents.is_empty() => agents,
            Ok(_) => Self::offline_agents(),
            Err(err) => {
                tracing::debug!("agent list fetch failed, using offline placeholders: {err}");
                Self::offline_agents()
            }
        }
    }

    async fn list_sessions(&self, agent: &Agent) -> Result<Vec<SessionSummary>, GatewayError> {
        self.fetch_sessions(Some(&agent.agent_ref())).await
    }

    async fn list_all_sessions(&self) -> Result<Vec<SessionSummary>, GatewayError> {
        self.fetch_sessions(None).await
    }

    async fn create_session(&self, agent: &Agent, name: Option<&str>) -> String {
        match self.request_session(agent, name).await {
            Ok(id) if !id.is_empty() => id,
            Ok(_) | Err(_) => {
                let id = local_session_id();
                tracing::debug!("session create fell back to local id {id}");
                id
            }
        }
    }

    async fn stream_message(
        &self,
        agent: &Agent,
        session_id: &str,
        text: &str,
    ) -> mpsc::Receiver<StreamItem> {
        let (tx, rx) = mpsc::channel(32);
        let url = format!("{}/api/a2a/{}", self.base_url, agent.agent_ref());
        let body = json!({ "sessionId": session_id, "message": text });
        let http = self.http.clone();
        let user_text = text.to_string();

        tokio::spawn(async move {
            // Echo the user turn first so consumers see the turn in order.
            if tx.send(Ok(ChatMessage::user(user_text.clone()))).await.is_err() {
                return;
            }

            let resp = match http.post(&url).json(&body).send().await {
                Ok(r) if r.status().is_success() => r,
                Ok(r) => {
                    tracing::debug!("a2a stream returned {}, using demo stub", r.status());
                    demo_stream(&tx, &user_text).await;
                    return;
                }
                Err(err) => {
                    tracing::debug!("a2a stream connect failed, using demo stub: {err}");
                    demo_stream(&tx, &user_text).await;
                    return;
                }
            };

            // Line-delimited JSON, one message per line. SSE-style `data:`
            // prefixes are tolerated; unparseable lines are skipped.
            let mut bytes = resp.bytes_stream();
            let mut buf = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(err) => {
                        let _ = tx.send(Err(GatewayError::Http(err))).await;
                        return;
                    }
                };
                buf.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buf.find('\n') {
                    let line = buf[..pos]
                        .trim()
                        .trim_start_matches("data:")
                        .trim()
                        .to_string();
                    buf.drain(..=pos);
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<WireMessage>(&line) {
                        Ok(wire) => {
                            let msg = ChatMessage::new(wire.role, wire.content);
                            if tx.send(Ok(msg)).await.is_err() {
                                return;
                            }
                        }
                        Err(err) => tracing::debug!("skipping unparseable stream line: {err}"),
                    }
                }
            }
        });

        rx
    }

    async fn close(&self) {
        // Connection teardown is drop-based; the flag keeps repeat calls
        // observable as no-ops.
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("gateway closed");
        }
    }
}

/// Degraded-mode session id: opaque, unique within a run.
fn local_session_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("sess-{}", &id[..8])
}

/// Synthetic per-character reply used when the controller is unreachable.
async fn demo_stream(tx: &mpsc::Sender<StreamItem>, text: &str) {
    let reply = format!("You said: {text}. (demo stub)");
    for ch in reply.chars() {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if tx.send(Ok(ChatMessage::assistant(ch.to_string()))).await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Discard port: connections are refused immediately, exercising every
    // offline fallback without waiting on timeouts.
    fn offline() -> HttpGateway {
        HttpGateway::new("http://127.0.0.1:9", "default")
    }

    #[tokio::test]
    async fn unreachable_controller_yields_placeholder_agents() {
        let agents = offline().list_agents().await;
        let refs: Vec<String> = agents.iter().map(|a| a.agent_ref()).collect();
        assert_eq!(refs, vec!["default/echo", "default/helper"]);
        assert_eq!(agents[0].title.as_deref(), Some("Echo Agent"));
    }

    #[tokio::test]
    async fn unreachable_controller_surfaces_session_list_failure() {
        let gateway = offline();
        let agent = &HttpGateway::offline_agents()[0];
        assert!(gateway.list_sessions(agent).await.is_err());
        assert!(gateway.list_all_sessions().await.is_err());
    }

    #[tokio::test]
    async fn create_session_falls_back_to_local_id() {
        let gateway = offline();
        let agent = &HttpGateway::offline_agents()[0];
        let first = gateway.create_session(agent, None).await;
        let second = gateway.create_session(agent, None).await;
        assert!(first.starts_with("sess-"));
        assert_eq!(first.len(), "sess-".len() + 8);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn offline_stream_echoes_user_then_streams_reply() {
        let gateway = offline();
        let agent = &HttpGateway::offline_agents()[0];
        let mut rx = gateway.stream_message(agent, "sess-test", "hi").await;

        let first = rx.recv().await.expect("user echo").expect("ok item");
        assert_eq!(first.role, Role::User);
        assert_eq!(first.content, "hi");

        let mut reply = String::new();
        while let Some(item) = rx.recv().await {
            let msg = item.expect("ok item");
            assert_eq!(msg.role, Role::Assistant);
            reply.push_str(&msg.content);
        }
        assert_eq!(reply, "You said: hi. (demo stub)");
    }

    #[tokio::test]
    async fn dropping_the_receiver_stops_the_stream() {
        let gateway = offline();
        let agent = &HttpGateway::offline_agents()[0];
        let mut rx = gateway.stream_message(agent, "sess-test", "hello").await;
        let _ = rx.recv().await;
        drop(rx);
        // Nothing to assert beyond "no panic": the producer task notices the
        // closed channel on its next send and exits.
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let gateway = offline();
        gateway.close().await;
        gateway.close().await;
    }
}
