//! Client connector for a remote messaging-relay server.
//!
//! The connector owns one persistent websocket to the relay and turns its
//! event/acknowledgement protocol into typed async operations: every call
//! sends exactly one request frame and suspends on a oneshot channel until
//! the acknowledgement carrying the same id comes back (or the request
//! timeout fires). Acknowledgements are routed purely by id, so concurrent
//! callers never see each other's responses.

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod transport;
pub mod types;
pub mod websocket;
pub mod wire;

pub use client::{ConnectionState, Connector, ConnectorOptions};
pub use config::{ConfigStore, ConnectionConfig, MemoryConfigStore};
pub use error::{ConnectError, RequestError};
pub use types::{
    Attachment, Chat, GetAttachmentChunkOptions, GetChatMessagesOptions, GetChatsOptions, Message,
    MessageSort, Participant,
};
