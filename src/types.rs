//! Passive records for the relay's JSON payloads: the domain objects the
//! typed operations return, and the per-operation option structs with their
//! documented defaults. Field names follow the relay's camelCase wire names.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub address: String,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub guid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub guid: String,
    #[serde(default)]
    pub transfer_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub total_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub guid: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub handle: Option<Participant>,
    /// Unix milliseconds.
    #[serde(default)]
    pub date_created: Option<i64>,
    #[serde(default)]
    pub is_from_me: bool,
    /// Only populated when the request asked for `withChats`.
    #[serde(default)]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Options for [`Connector::get_chats`](crate::Connector::get_chats).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChatsOptions {
    pub with_participants: bool,
}

impl Default for GetChatsOptions {
    fn default() -> Self {
        Self {
            with_participants: true,
        }
    }
}

/// Message ordering, as the relay spells it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSort {
    #[serde(rename = "DESC")]
    Descending,
    #[serde(rename = "ASC")]
    Ascending,
}

/// Options for [`Connector::get_chat_messages`](crate::Connector::get_chat_messages).
/// `after`/`before` bound the window by message date, in unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChatMessagesOptions {
    pub offset: u64,
    pub limit: u64,
    pub after: Option<i64>,
    pub before: Option<i64>,
    pub with_chats: bool,
    pub sort: MessageSort,
}

impl Default for GetChatMessagesOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 25,
            after: None,
            before: None,
            with_chats: false,
            sort: MessageSort::Descending,
        }
    }
}

/// Options for [`Connector::get_attachment_chunk`](crate::Connector::get_attachment_chunk).
/// One call fetches one chunk; assembling a whole attachment is the caller's
/// loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAttachmentChunkOptions {
    pub start: u64,
    pub chunk_size: u64,
    pub compress: bool,
}

impl Default for GetAttachmentChunkOptions {
    fn default() -> Self {
        Self {
            start: 0,
            chunk_size: 1024,
            compress: false,
        }
    }
}
