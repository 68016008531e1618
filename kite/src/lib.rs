//! Client-side library for the agent controller service: the chat data
//! model and the HTTP backend gateway consumed by the terminal UI.

pub mod gateway;
pub mod model;

pub use gateway::{Gateway, GatewayError, HttpGateway, StreamItem};
pub use model::{Agent, ChatMessage, Role, SessionSummary};
