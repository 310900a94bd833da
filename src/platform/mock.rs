//! In-memory [`ChatPlatform`] used by unit tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::{
    Author, ChannelKind, ChatPlatform, IncomingMessage, MemberRef, PostedMessage, ReactionCount,
};

pub const BOT_CHANNEL: u64 = 500;
pub const GUILD: u64 = 900;

#[derive(Default)]
pub struct MockPlatform {
    next_id: AtomicU64,
    pub sent: Mutex<Vec<(u64, String)>>,
    pub reactions: Mutex<Vec<(u64, String)>>,
    pub directs: Mutex<Vec<(u64, String)>>,
    /// Every set_voice_mute call as (user id, muted)
    pub mute_calls: Mutex<Vec<(u64, bool)>>,
    pub fetch_calls: Mutex<Vec<u64>>,
    fetch_queue: Mutex<VecDeque<Vec<ReactionCount>>>,
    members: Mutex<HashMap<u64, Vec<MemberRef>>>,
    pub fail_unmute: Mutex<bool>,
    pub fail_send: Mutex<bool>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Default::default()
        }
    }

    /// Raw counts (bot reaction included) returned by the next fetch
    pub fn queue_counts(&self, counts: &[(&str, u64)]) {
        let counts = counts
            .iter()
            .map(|(marker, count)| ReactionCount {
                marker: marker.to_string(),
                count: *count,
            })
            .collect();
        self.fetch_queue.lock().unwrap().push_back(counts);
    }

    pub fn set_members(&self, guild_id: u64, members: Vec<MemberRef>) {
        self.members.lock().unwrap().insert(guild_id, members);
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn last_sent(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, t)| t.clone())
    }

    pub fn reaction_markers(&self) -> Vec<String> {
        self.reactions.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn mute_calls(&self) -> Vec<(u64, bool)> {
        self.mute_calls.lock().unwrap().clone()
    }

    pub fn direct_texts(&self) -> Vec<(u64, String)> {
        self.directs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn send(&self, channel_id: u64, text: &str) -> Result<PostedMessage> {
        if *self.fail_send.lock().unwrap() {
            return Err(anyhow!("send failed"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push((channel_id, text.to_string()));
        Ok(PostedMessage { id, channel_id })
    }

    async fn add_reaction(&self, message: &PostedMessage, marker: &str) -> Result<()> {
        self.reactions
            .lock()
            .unwrap()
            .push((message.id, marker.to_string()));
        Ok(())
    }

    async fn fetch_reactions(&self, message: &PostedMessage) -> Result<Vec<ReactionCount>> {
        self.fetch_calls.lock().unwrap().push(message.id);
        if let Some(counts) = self.fetch_queue.lock().unwrap().pop_front() {
            return Ok(counts);
        }
        Ok(self
            .reactions
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == message.id)
            .map(|(_, marker)| ReactionCount {
                marker: marker.clone(),
                count: 1,
            })
            .collect())
    }

    async fn set_voice_mute(&self, member: &MemberRef, muted: bool) -> Result<()> {
        self.mute_calls.lock().unwrap().push((member.user_id, muted));
        if !muted && *self.fail_unmute.lock().unwrap() {
            return Err(anyhow!("member left voice"));
        }
        Ok(())
    }

    async fn send_direct(&self, user_id: u64, text: &str) -> Result<()> {
        self.directs.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }

    async fn guild_members(&self, guild_id: u64) -> Result<Vec<MemberRef>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&guild_id)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn member(user_id: u64, name: &str) -> MemberRef {
    MemberRef {
        guild_id: GUILD,
        user_id,
        name: name.to_string(),
        display_name: format!("{name} (nick)"),
    }
}

/// A guild text channel message from user 1
pub fn message(content: &str, mentions: Vec<MemberRef>) -> IncomingMessage {
    message_from(1, content, mentions)
}

pub fn message_from(author_id: u64, content: &str, mentions: Vec<MemberRef>) -> IncomingMessage {
    IncomingMessage {
        id: 10_000,
        channel_id: BOT_CHANNEL,
        guild_id: Some(GUILD),
        channel_kind: ChannelKind::GuildText,
        author: Author {
            id: author_id,
            name: format!("user{author_id}"),
            bot: false,
        },
        content: content.to_string(),
        mentions,
    }
}
