//! Vote command family
//!
//! Handles: vote [poll], vote mute, vote unmute, vote banish
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.1: Zero-second polls are refused with a message
//! - 1.2.0: Ten-answer polls, whole-word `for` in mute clauses
//! - 1.1.0: Unmute votes refuse members that are not muted
//! - 1.0.0: Initial release with polls and mute votes

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::commands::context::CommandContext;
use crate::commands::handler::TextCommand;
use crate::commands::registry::CommandRegistry;
use crate::core::{interpret_time, DEFAULT_DURATION_SECS};
use crate::features::polls::{
    run_poll, PollSpec, MAX_ANSWERS, MIN_ANSWERS, NUMBER_LABELS, NUMBER_MARKERS, YES_NO_MARKERS,
};
use crate::platform::{ChannelKind, IncomingMessage, MemberRef};

/// Shortest poll allowed for moderation votes
pub const MIN_MODERATION_POLL_SECS: u64 = 60;

/// Fixed length of an unmute vote
pub const UNMUTE_POLL_SECS: u64 = 60;

const POLL_CHILD: &str = "poll";

/// Why a vote could not be started; the message is shown to the user as is
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("You did not ask a question.")]
    NoQuestion,
    #[error("You may only have between 2 and 10 answer choices.")]
    AnswerCount,
    #[error("You did not properly select someone to be {0}. Make sure you @mention them properly.")]
    NoMention(&'static str),
    #[error("You can only {0} 1 person per vote")]
    TooManyMentions(&'static str),
    #[error("This is not a valid command to run outside a server text channel.")]
    NotGuildText,
    #[error("Poll duration must be at least 60 seconds.")]
    PollTooShort,
    #[error("Poll duration must be a positive number of seconds.")]
    ZeroDuration,
    #[error("This user is not muted.")]
    NotMuted,
}

/// Parent of the vote sub-commands; anything that is not a sub-command is a poll
pub struct VoteCommand {
    children: CommandRegistry,
}

impl VoteCommand {
    pub fn new() -> Self {
        let mut children = CommandRegistry::new();
        children.register(Arc::new(PollCommand));
        children.register(Arc::new(MuteVoteCommand));
        children.register(Arc::new(UnmuteVoteCommand));
        children.register(Arc::new(BanishVoteCommand));
        Self { children }
    }
}

impl Default for VoteCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextCommand for VoteCommand {
    fn id(&self) -> &'static str {
        "vote"
    }

    fn summary(&self) -> &'static str {
        "Command to create a poll. Vote format `vote <question> | <answer 1>, <answer 2>, <answer 3> [| <duration>]`. \
         Moderation votes: `vote mute @member [for <duration>] [| <poll duration>]`, `vote unmute @member`"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        args: &str,
    ) -> Result<()> {
        match self.children.resolve(args, POLL_CHILD) {
            Some((child, rest)) => child.execute(ctx, msg, rest).await,
            None => Ok(()),
        }
    }
}

/// Reply with a validation error instead of failing the command
async fn refuse(ctx: &CommandContext, msg: &IncomingMessage, error: VoteError) -> Result<()> {
    info!("Vote from {} refused: {error}", msg.author.name);
    ctx.reply(msg, &error.to_string()).await?;
    Ok(())
}

fn as_poll_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

pub struct PollCommand;

/// Build a poll from `<question> | <a1>, <a2>, … [| <duration>]`
pub fn parse_poll(args: &str) -> Result<PollSpec, VoteError> {
    let mut parts = args.split('|');
    let question = parts.next().unwrap_or_default().trim();
    if question.is_empty() {
        return Err(VoteError::NoQuestion);
    }

    let answers: Vec<String> = parts
        .next()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|answer| !answer.is_empty())
        .map(str::to_string)
        .collect();
    if !(MIN_ANSWERS..=MAX_ANSWERS).contains(&answers.len()) {
        return Err(VoteError::AnswerCount);
    }

    let duration = parts
        .next()
        .map(interpret_time)
        .unwrap_or(DEFAULT_DURATION_SECS);
    if duration == 0 {
        return Err(VoteError::ZeroDuration);
    }

    let mut prompt = format!(
        "Question: **{question}**\nVotes will be tallied in {duration} seconds.\n"
    );
    for (label, answer) in NUMBER_LABELS.iter().zip(&answers) {
        prompt.push_str(&format!("{label} {answer}\n"));
    }

    Ok(PollSpec::new(prompt, answers, &NUMBER_MARKERS, as_poll_secs(duration)))
}

#[async_trait]
impl TextCommand for PollCommand {
    fn id(&self) -> &'static str {
        POLL_CHILD
    }

    fn summary(&self) -> &'static str {
        "Create a poll with up to ten answers"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        args: &str,
    ) -> Result<()> {
        let spec = match parse_poll(args) {
            Ok(spec) => spec,
            Err(e) => return refuse(&ctx, msg, e).await,
        };
        info!(
            "{} created poll with answer choices {:?} and duration {}",
            msg.author.name, spec.answers, spec.duration_secs
        );
        run_poll(ctx.platform.as_ref(), msg.channel_id, &spec).await?;
        Ok(())
    }
}

/// Target and timings of a mute vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteRequest {
    pub member: MemberRef,
    pub mute_secs: u64,
    pub poll_secs: u64,
}

/// The single mentioned member of a moderation vote in a guild text channel
fn vote_target(
    msg: &IncomingMessage,
    done: &'static str,
    verb: &'static str,
) -> Result<MemberRef, VoteError> {
    let member = match msg.mentions.as_slice() {
        [] => return Err(VoteError::NoMention(done)),
        [only] => only.clone(),
        _ => return Err(VoteError::TooManyMentions(verb)),
    };
    if msg.channel_kind != ChannelKind::GuildText {
        return Err(VoteError::NotGuildText);
    }
    Ok(member)
}

/// Whole-word `for` separating the member from the mute duration
fn for_clause() -> Option<&'static Regex> {
    static FOR: OnceLock<Option<Regex>> = OnceLock::new();
    FOR.get_or_init(|| Regex::new(r"\bfor\b").ok()).as_ref()
}

/// Read `@member [for <mute duration>] [| <poll duration>]`
pub fn parse_mute(msg: &IncomingMessage, args: &str) -> Result<MuteRequest, VoteError> {
    let member = vote_target(msg, "muted", "mute")?;

    let mut mute_secs = DEFAULT_DURATION_SECS;
    let mut poll_secs = DEFAULT_DURATION_SECS;
    if let Some(found) = for_clause().and_then(|re| re.find(args)) {
        let durations = &args[found.end()..];
        match durations.split_once('|') {
            Some((mute, poll)) => {
                mute_secs = interpret_time(mute);
                poll_secs = interpret_time(poll);
            }
            None => mute_secs = interpret_time(durations),
        }
    } else if let Some((_, poll)) = args.split_once('|') {
        poll_secs = interpret_time(poll);
    }

    if poll_secs < MIN_MODERATION_POLL_SECS {
        return Err(VoteError::PollTooShort);
    }
    Ok(MuteRequest {
        member,
        mute_secs,
        poll_secs,
    })
}

pub struct MuteVoteCommand;

#[async_trait]
impl TextCommand for MuteVoteCommand {
    fn id(&self) -> &'static str {
        "mute"
    }

    fn summary(&self) -> &'static str {
        "Vote to server-mute a member for a while"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        args: &str,
    ) -> Result<()> {
        let request = match parse_mute(msg, args) {
            Ok(request) => request,
            Err(e) => return refuse(&ctx, msg, e).await,
        };
        info!("{} voted to mute {}", msg.author.name, request.member.name);

        let prompt = format!(
            "**Mute {}?**\nPoll will close in {} seconds.",
            request.member.display_name, request.poll_secs
        );
        let spec = PollSpec::new(
            prompt,
            vec!["yes".to_string(), "no".to_string()],
            &YES_NO_MARKERS,
            as_poll_secs(request.poll_secs),
        );
        let outcome = run_poll(ctx.platform.as_ref(), msg.channel_id, &spec).await?;
        if outcome.is_win_for(1) {
            ctx.moderation
                .mute(&request.member, request.mute_secs)
                .await?;
        }
        Ok(())
    }
}

pub struct UnmuteVoteCommand;

#[async_trait]
impl TextCommand for UnmuteVoteCommand {
    fn id(&self) -> &'static str {
        "unmute"
    }

    fn summary(&self) -> &'static str {
        "Vote to lift a member's mute early"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        _args: &str,
    ) -> Result<()> {
        let member = match vote_target(msg, "unmuted", "unmute") {
            Ok(member) => member,
            Err(e) => return refuse(&ctx, msg, e).await,
        };
        if !ctx.moderation.is_muted(&member)? {
            return refuse(&ctx, msg, VoteError::NotMuted).await;
        }
        info!("{} voted to unmute {}", msg.author.name, member.name);

        let spec = PollSpec::new(
            format!("**Unmute {}?**", member.display_name),
            vec!["yes".to_string(), "no".to_string()],
            &YES_NO_MARKERS,
            as_poll_secs(UNMUTE_POLL_SECS),
        );
        let outcome = run_poll(ctx.platform.as_ref(), msg.channel_id, &spec).await?;
        if outcome.is_win_for(1) {
            ctx.moderation.unmute(&member).await?;
        }
        Ok(())
    }
}

/// Reserved; banish votes have no behavior yet
pub struct BanishVoteCommand;

#[async_trait]
impl TextCommand for BanishVoteCommand {
    fn id(&self) -> &'static str {
        "banish"
    }

    fn summary(&self) -> &'static str {
        "Reserved"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        _args: &str,
    ) -> Result<()> {
        warn!("{} asked for a banish vote, which is not available", msg.author.name);
        ctx.reply(msg, "Banish votes are not available.").await?;
        Ok(())
    }
}
