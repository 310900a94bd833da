//! Serenity-backed [`ChatPlatform`]
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Messages, reactions, voice mute, DMs and member listing over the Discord HTTP API

use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use serenity::http::Http;
use serenity::model::channel::{Channel, ChannelType, Message, ReactionType};
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use serenity::prelude::Context;
use std::sync::Arc;

use super::{
    Author, ChannelKind, ChatPlatform, IncomingMessage, MemberRef, PostedMessage, ReactionCount,
};

/// Discord's upper bound for a single member list page
const MEMBER_PAGE_LIMIT: u64 = 1000;

#[derive(Clone)]
pub struct DiscordPlatform {
    http: Arc<Http>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// Resolve a gateway message into an [`IncomingMessage`]
    ///
    /// Looks up the channel kind and the guild display names of mentioned users.
    pub async fn incoming(ctx: &Context, msg: &Message) -> IncomingMessage {
        let guild_id = msg.guild_id.map(|g| g.0);

        let channel_kind = match msg.channel_id.to_channel(&ctx.http).await {
            Ok(Channel::Guild(gc)) if gc.kind == ChannelType::Text => ChannelKind::GuildText,
            Ok(Channel::Private(_)) => ChannelKind::Direct,
            Ok(_) => ChannelKind::Other,
            Err(e) => {
                warn!("Could not resolve channel {}: {e}", msg.channel_id);
                if guild_id.is_none() {
                    ChannelKind::Direct
                } else {
                    ChannelKind::Other
                }
            }
        };

        let mut mentions = Vec::with_capacity(msg.mentions.len());
        for user in &msg.mentions {
            let display_name = match msg.guild_id {
                Some(gid) => match gid.member(ctx, user.id).await {
                    Ok(member) => member.display_name().to_string(),
                    Err(_) => user.name.clone(),
                },
                None => user.name.clone(),
            };
            mentions.push(MemberRef {
                guild_id: guild_id.unwrap_or_default(),
                user_id: user.id.0,
                name: user.name.clone(),
                display_name,
            });
        }

        IncomingMessage {
            id: msg.id.0,
            channel_id: msg.channel_id.0,
            guild_id,
            channel_kind,
            author: Author {
                id: msg.author.id.0,
                name: msg.author.name.clone(),
                bot: msg.author.bot,
            },
            content: msg.content.clone(),
            mentions,
        }
    }
}

/// Convert a serenity guild member into a [`MemberRef`]
pub fn member_ref(member: &Member) -> MemberRef {
    MemberRef {
        guild_id: member.guild_id.0,
        user_id: member.user.id.0,
        name: member.user.name.clone(),
        display_name: member.display_name().to_string(),
    }
}

fn marker_of(reaction_type: &ReactionType) -> String {
    match reaction_type {
        ReactionType::Unicode(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    async fn send(&self, channel_id: u64, text: &str) -> Result<PostedMessage> {
        let message = ChannelId(channel_id).say(&self.http, text).await?;
        Ok(PostedMessage {
            id: message.id.0,
            channel_id,
        })
    }

    async fn add_reaction(&self, message: &PostedMessage, marker: &str) -> Result<()> {
        ChannelId(message.channel_id)
            .create_reaction(
                &self.http,
                MessageId(message.id),
                ReactionType::Unicode(marker.to_string()),
            )
            .await?;
        Ok(())
    }

    async fn fetch_reactions(&self, message: &PostedMessage) -> Result<Vec<ReactionCount>> {
        let fresh = ChannelId(message.channel_id)
            .message(&self.http, MessageId(message.id))
            .await?;
        Ok(fresh
            .reactions
            .iter()
            .map(|r| ReactionCount {
                marker: marker_of(&r.reaction_type),
                count: r.count,
            })
            .collect())
    }

    async fn set_voice_mute(&self, member: &MemberRef, muted: bool) -> Result<()> {
        GuildId(member.guild_id)
            .edit_member(&self.http, UserId(member.user_id), |m| m.mute(muted))
            .await?;
        Ok(())
    }

    async fn send_direct(&self, user_id: u64, text: &str) -> Result<()> {
        let dm = UserId(user_id).create_dm_channel(&*self.http).await?;
        dm.say(&self.http, text).await?;
        Ok(())
    }

    async fn guild_members(&self, guild_id: u64) -> Result<Vec<MemberRef>> {
        let mut all = Vec::new();
        let mut after: Option<UserId> = None;
        loop {
            let page = GuildId(guild_id)
                .members(&self.http, Some(MEMBER_PAGE_LIMIT), after)
                .await?;
            let last_page = (page.len() as u64) < MEMBER_PAGE_LIMIT;
            after = page.last().map(|m| m.user.id);
            all.extend(page.iter().map(member_ref));
            if last_page || after.is_none() {
                return Ok(all);
            }
        }
    }
}
