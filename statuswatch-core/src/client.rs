//! Messaging client port
//!
//! The narrow seam between the core and whatever chat platform SDK carries
//! the traffic. The sync driver and command layer are written against this
//! trait; platform adapters (and the in-memory fake used in tests) implement
//! it.

use async_trait::async_trait;

/// Platform identifier for a channel
pub type ChannelId = String;
/// Platform identifier for a message
pub type MessageId = String;

/// What the destination channel supports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    /// Plain text channel
    Text,
    /// Announcement channel, published messages can be crossposted
    Announcement,
}

/// A resolved channel handle
#[derive(Clone, Debug)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub kind: ChannelKind,
}

/// A prior message in a channel, as seen when purging
#[derive(Clone, Debug)]
pub struct MessageRef {
    pub id: MessageId,
    /// True when the bot itself authored the message
    pub from_me: bool,
}

/// Wire form of a rich message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: String,
    /// 0xRRGGBB
    pub color: u32,
    pub footer: Option<String>,
}

/// Errors from the messaging client
#[derive(Clone, Debug)]
pub enum ClientError {
    /// Channel id did not resolve
    ChannelNotFound { id: ChannelId },
    /// Failed to fetch channel history
    FetchFailed { message: String },
    /// Failed to send a message
    SendFailed { message: String },
    /// Failed to delete a message
    DeleteFailed { id: MessageId, message: String },
    /// Failed to crosspost a published message
    CrosspostFailed { id: MessageId, message: String },
    /// Failed to rename the channel
    RenameFailed { message: String },
    /// Operation not supported by this channel or client
    NotSupported { operation: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::ChannelNotFound { id } => write!(f, "channel not found: {}", id),
            ClientError::FetchFailed { message } => {
                write!(f, "failed to fetch channel history: {}", message)
            }
            ClientError::SendFailed { message } => write!(f, "failed to send message: {}", message),
            ClientError::DeleteFailed { id, message } => {
                write!(f, "failed to delete message {}: {}", id, message)
            }
            ClientError::CrosspostFailed { id, message } => {
                write!(f, "failed to crosspost message {}: {}", id, message)
            }
            ClientError::RenameFailed { message } => {
                write!(f, "failed to rename channel: {}", message)
            }
            ClientError::NotSupported { operation } => {
                write!(f, "operation not supported: {}", operation)
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// The messaging operations the core needs from a platform SDK
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Human-readable name of this client implementation
    fn name(&self) -> &'static str;

    /// Resolve a configured channel id to a handle
    async fn resolve_channel(&self, id: &str) -> Result<ChannelRef, ClientError>;

    /// Most recent messages in the channel, newest first, up to `limit`
    async fn recent_messages(
        &self,
        channel: &ChannelRef,
        limit: usize,
    ) -> Result<Vec<MessageRef>, ClientError>;

    /// Delete a single message
    async fn delete_message(
        &self,
        channel: &ChannelRef,
        id: &MessageId,
    ) -> Result<(), ClientError>;

    /// Publish an embed, returning the new message's id
    async fn send_embed(
        &self,
        channel: &ChannelRef,
        embed: Embed,
    ) -> Result<MessageId, ClientError>;

    /// Crosspost a published message (announcement channels only)
    async fn crosspost(&self, channel: &ChannelRef, id: &MessageId) -> Result<(), ClientError> {
        let _ = (channel, id);
        Err(ClientError::NotSupported {
            operation: "crosspost".to_string(),
        })
    }

    /// Set the channel's display name
    async fn rename_channel(&self, channel: &ChannelRef, name: &str) -> Result<(), ClientError>;
}
