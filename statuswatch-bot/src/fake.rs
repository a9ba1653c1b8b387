//! In-memory chat client
//!
//! Stands in for the platform SDK in tests and the demo console: records
//! everything the sync driver does to it and can inject failures so the
//! swallow/abort semantics are exercisable without a network.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use statuswatch_core::client::{
    ChannelId, ChannelKind, ChannelRef, ChatClient, ClientError, Embed, MessageId, MessageRef,
};

#[derive(Clone, Debug)]
pub struct FakeMessage {
    pub id: MessageId,
    pub from_me: bool,
    pub embed: Option<Embed>,
}

#[derive(Debug)]
struct FakeChannel {
    kind: ChannelKind,
    name: String,
    messages: Vec<FakeMessage>,
    crossposted: Vec<MessageId>,
    rename_count: u64,
}

#[derive(Debug, Default)]
struct State {
    channels: BTreeMap<ChannelId, FakeChannel>,
    next_message_id: u64,
    fail_resolve: bool,
    fail_fetch: bool,
    fail_send: bool,
    fail_delete_ids: BTreeSet<MessageId>,
}

/// Records calls; never touches a network
#[derive(Debug, Default)]
pub struct InMemoryChat {
    state: Mutex<State>,
}

impl InMemoryChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_channel(&self, id: &str, kind: ChannelKind) {
        let mut state = self.state.lock().unwrap();
        state.channels.insert(
            id.to_string(),
            FakeChannel {
                kind,
                name: String::new(),
                messages: Vec::new(),
                crossposted: Vec::new(),
                rename_count: 0,
            },
        );
    }

    /// Seed a pre-existing message, returning its id
    pub fn seed_message(&self, channel_id: &str, from_me: bool) -> MessageId {
        let mut state = self.state.lock().unwrap();
        state.next_message_id += 1;
        let id = state.next_message_id.to_string();
        let channel = state.channels.get_mut(channel_id).unwrap();
        channel.messages.push(FakeMessage {
            id: id.clone(),
            from_me,
            embed: None,
        });
        id
    }

    pub fn set_fail_resolve(&self, fail: bool) {
        self.state.lock().unwrap().fail_resolve = fail;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.state.lock().unwrap().fail_fetch = fail;
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.state.lock().unwrap().fail_send = fail;
    }

    pub fn fail_delete_of(&self, message_id: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_delete_ids
            .insert(message_id.to_string());
    }

    pub fn channel_name(&self, channel_id: &str) -> String {
        self.state.lock().unwrap().channels[channel_id].name.clone()
    }

    pub fn rename_count(&self, channel_id: &str) -> u64 {
        self.state.lock().unwrap().channels[channel_id].rename_count
    }

    pub fn messages(&self, channel_id: &str) -> Vec<FakeMessage> {
        self.state.lock().unwrap().channels[channel_id]
            .messages
            .clone()
    }

    /// Embeds currently visible in the channel, oldest first
    pub fn embeds(&self, channel_id: &str) -> Vec<Embed> {
        self.messages(channel_id)
            .into_iter()
            .filter_map(|m| m.embed)
            .collect()
    }

    pub fn crossposted(&self, channel_id: &str) -> Vec<MessageId> {
        self.state.lock().unwrap().channels[channel_id]
            .crossposted
            .clone()
    }
}

#[async_trait]
impl ChatClient for InMemoryChat {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn resolve_channel(&self, id: &str) -> Result<ChannelRef, ClientError> {
        let state = self.state.lock().unwrap();
        if state.fail_resolve {
            return Err(ClientError::ChannelNotFound { id: id.to_string() });
        }
        match state.channels.get(id) {
            Some(channel) => Ok(ChannelRef {
                id: id.to_string(),
                kind: channel.kind,
            }),
            None => Err(ClientError::ChannelNotFound { id: id.to_string() }),
        }
    }

    async fn recent_messages(
        &self,
        channel: &ChannelRef,
        limit: usize,
    ) -> Result<Vec<MessageRef>, ClientError> {
        let state = self.state.lock().unwrap();
        if state.fail_fetch {
            return Err(ClientError::FetchFailed {
                message: "injected fetch failure".to_string(),
            });
        }
        let channel = state
            .channels
            .get(&channel.id)
            .ok_or(ClientError::ChannelNotFound {
                id: channel.id.clone(),
            })?;
        Ok(channel
            .messages
            .iter()
            .rev()
            .take(limit)
            .map(|m| MessageRef {
                id: m.id.clone(),
                from_me: m.from_me,
            })
            .collect())
    }

    async fn delete_message(
        &self,
        channel: &ChannelRef,
        id: &MessageId,
    ) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete_ids.contains(id) {
            return Err(ClientError::DeleteFailed {
                id: id.clone(),
                message: "injected delete failure".to_string(),
            });
        }
        let channel = state
            .channels
            .get_mut(&channel.id)
            .ok_or(ClientError::ChannelNotFound {
                id: channel.id.clone(),
            })?;
        channel.messages.retain(|m| &m.id != id);
        Ok(())
    }

    async fn send_embed(
        &self,
        channel: &ChannelRef,
        embed: Embed,
    ) -> Result<MessageId, ClientError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send {
            return Err(ClientError::SendFailed {
                message: "injected send failure".to_string(),
            });
        }
        state.next_message_id += 1;
        let id = state.next_message_id.to_string();
        let channel = state
            .channels
            .get_mut(&channel.id)
            .ok_or(ClientError::ChannelNotFound {
                id: channel.id.clone(),
            })?;
        channel.messages.push(FakeMessage {
            id: id.clone(),
            from_me: true,
            embed: Some(embed),
        });
        Ok(id)
    }

    async fn crosspost(&self, channel: &ChannelRef, id: &MessageId) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        let channel = state
            .channels
            .get_mut(&channel.id)
            .ok_or(ClientError::ChannelNotFound {
                id: channel.id.clone(),
            })?;
        if channel.kind != ChannelKind::Announcement {
            return Err(ClientError::NotSupported {
                operation: "crosspost".to_string(),
            });
        }
        channel.crossposted.push(id.clone());
        Ok(())
    }

    async fn rename_channel(&self, channel: &ChannelRef, name: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        let channel = state
            .channels
            .get_mut(&channel.id)
            .ok_or(ClientError::ChannelNotFound {
                id: channel.id.clone(),
            })?;
        channel.name = name.to_string();
        channel.rename_count += 1;
        Ok(())
    }
}
