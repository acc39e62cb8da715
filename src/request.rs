//! The request/acknowledgement correlation layer and the typed operations
//! built on it. Every operation is exactly one round trip: no pagination
//! loops, no retries, no result merging.

use crate::client::Connector;
use crate::error::RequestError;
use crate::types::{
    Chat, GetAttachmentChunkOptions, GetChatMessagesOptions, GetChatsOptions, Message,
};
use crate::wire::{RequestFrame, ResponseEnvelope};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::time::timeout;

/// Attaches the target identifier to an operation's option struct so both
/// serialize into one flat payload object.
#[derive(Serialize)]
struct WithIdentifier<'a, T: Serialize> {
    identifier: &'a str,
    #[serde(flatten)]
    options: &'a T,
}

impl Connector {
    /// Fetches the chat list.
    pub async fn get_chats(&self, options: GetChatsOptions) -> Result<Vec<Chat>, RequestError> {
        self.send_request("get-chats", serde_json::to_value(&options)?)
            .await
    }

    /// Fetches a single chat by guid.
    pub async fn get_chat(&self, chat_guid: &str) -> Result<Chat, RequestError> {
        self.send_request("get-chat", json!({ "chatGuid": chat_guid }))
            .await
    }

    /// Fetches one page of messages for a chat.
    pub async fn get_chat_messages(
        &self,
        identifier: &str,
        options: GetChatMessagesOptions,
    ) -> Result<Vec<Message>, RequestError> {
        let payload = serde_json::to_value(WithIdentifier {
            identifier,
            options: &options,
        })?;
        self.send_request("get-chat-messages", payload).await
    }

    /// Fetches one chunk of an attachment, base64-encoded. Assembling a whole
    /// attachment is the caller's loop over `start`.
    pub async fn get_attachment_chunk(
        &self,
        identifier: &str,
        options: GetAttachmentChunkOptions,
    ) -> Result<String, RequestError> {
        let payload = serde_json::to_value(WithIdentifier {
            identifier,
            options: &options,
        })?;
        self.send_request("get-attachment-chunk", payload).await
    }

    /// Sends a text message to a chat; the acknowledgement carries the
    /// message record the relay created.
    pub async fn send_message(
        &self,
        chat_guid: &str,
        text: &str,
    ) -> Result<Message, RequestError> {
        self.send_request("send-message", json!({ "guid": chat_guid, "message": text }))
            .await
    }

    /// Sends one request event and waits for its acknowledgement, then
    /// classifies the envelope: success statuses yield `data` deserialized
    /// into the operation's result type, everything else rejects with the
    /// peer-supplied message.
    pub(crate) async fn send_request<T: serde::de::DeserializeOwned>(
        &self,
        event: &'static str,
        data: Value,
    ) -> Result<T, RequestError> {
        let envelope = self.round_trip(event, data).await?;
        if !envelope.is_success() {
            return Err(RequestError::RemoteRejected {
                status: envelope.status,
                message: envelope.message.unwrap_or_default(),
            });
        }
        Ok(serde_json::from_value(envelope.data.unwrap_or(Value::Null))?)
    }

    async fn round_trip(
        &self,
        event: &'static str,
        data: Value,
    ) -> Result<ResponseEnvelope, RequestError> {
        let req_id = self.generate_request_id();
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.response_waiters
            .lock()
            .await
            .insert(req_id.clone(), tx);

        // Clone the handle out so concurrent requests do not serialize on
        // the transport lock.
        let transport = { self.transport.lock().await.clone() };
        let transport = match transport {
            Some(t) => t,
            None => {
                self.response_waiters.lock().await.remove(&req_id);
                return Err(RequestError::NotConnected);
            }
        };

        let frame = RequestFrame {
            id: req_id.clone(),
            event: event.to_owned(),
            data,
        };
        let encoded = frame.encode()?;
        if let Err(e) = transport.send(&encoded).await {
            self.response_waiters.lock().await.remove(&req_id);
            return Err(RequestError::Transport(e));
        }

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(ack)) => Ok(ack.envelope),
            // The waiter map was drained by a disconnect.
            Ok(Err(_)) => Err(RequestError::ConnectionLost),
            Err(_) => {
                self.response_waiters.lock().await.remove(&req_id);
                Err(RequestError::NoResponse)
            }
        }
    }
}
