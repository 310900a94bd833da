//! Abomination Vaults campaign commands
//!
//! Handles: av help, av grdn <help|add|get|append|replace|delete|list|unlock|activate>
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Explicit access checks, `replace` requires an existing key
//! - 1.0.0: Initial release with the GRDN knowledge store

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::commands::context::CommandContext;
use crate::commands::handler::{split_token, TextCommand};
use crate::commands::registry::CommandRegistry;
use crate::core::format_key_list;
use crate::features::knowledge::{normalize_key, AddOutcome};
use crate::platform::IncomingMessage;

const HELP_CHILD: &str = "help";
const HIDDEN_FLAG: &str = "-h";
const ALL_FLAG: &str = "-all";

const NO_DATA_ACCESS: &str = "You cannot access this data.";
const NO_COMMAND_ACCESS: &str = "You cannot access this command.";

/// Direct messages sent by `grdn activate`, each followed by a pause in milliseconds
const ACTIVATION_SEQUENCE: &[(&str, u64)] = &[
    ("Gauntlight activation detected.", 5_000),
    ("Systems powering up", 500),
    (".", 500),
    (".", 500),
    (".", 500),
    (".", 500),
    ("Motor systems online.", 200),
    ("Running diagnostic.", 1_000),
    (".", 500),
    (".", 200),
    ("System degradation detected. Not all functions may be available.", 2_000),
    (".", 500),
    (".", 500),
    (".", 200),
    (
        "Error: Cognition systems corrupted. Repairs initialized. This action will run in the \
         background. Recommend re-visiting sites of importance.",
        2_000,
    ),
    (".", 500),
    (".", 1_000),
    ("Diagnostic complete. Waking...", 2_000),
    ("**Directive**: Eliminate Belcorra Haruvex and any associates.", 0),
];

/// Parent of the campaign sub-commands
pub struct AvCommand {
    children: CommandRegistry,
}

impl AvCommand {
    pub fn new() -> Self {
        let mut children = CommandRegistry::new();
        children.register(Arc::new(GrdnCommand));
        children.register(Arc::new(AvHelpCommand));
        Self { children }
    }
}

impl Default for AvCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextCommand for AvCommand {
    fn id(&self) -> &'static str {
        "av"
    }

    fn summary(&self) -> &'static str {
        "Retrieve info for the Abomination Vaults"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        args: &str,
    ) -> Result<()> {
        match self.children.resolve(args, HELP_CHILD) {
            Some((child, rest)) => child.execute(ctx, msg, rest).await,
            None => Ok(()),
        }
    }
}

pub struct AvHelpCommand;

#[async_trait]
impl TextCommand for AvHelpCommand {
    fn id(&self) -> &'static str {
        HELP_CHILD
    }

    fn summary(&self) -> &'static str {
        "List campaign commands"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        _args: &str,
    ) -> Result<()> {
        let text = format!(
            "Abomination Vaults commands:\n\
             `{0} av grdn <command>` to talk to GRDN. See `{0} av grdn help` for its commands.",
            ctx.prefix()
        );
        ctx.reply(msg, &text).await?;
        Ok(())
    }
}

/// Knowledge store front end
pub struct GrdnCommand;

#[async_trait]
impl TextCommand for GrdnCommand {
    fn id(&self) -> &'static str {
        "grdn"
    }

    fn summary(&self) -> &'static str {
        "Return any data GRDN might know"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        args: &str,
    ) -> Result<()> {
        let (sub, rest) = split_token(args);
        if sub.is_empty() {
            return send_help(&ctx, msg).await;
        }

        if let Err(e) = ctx.knowledge.refresh_if_stale().await {
            warn!("Knowledge refresh failed, using the local cache: {e:#}");
        }

        let author = msg.author.id;
        match sub {
            "help" => send_help(&ctx, msg).await,
            "add" => add(&ctx, msg, rest).await,
            "get" | "append" | "replace" | "delete" | "list" if !ctx.config.is_curator(author) => {
                info!("{} was refused grdn {sub}", msg.author.name);
                reply(&ctx, msg, NO_DATA_ACCESS).await
            }
            "get" => get(&ctx, msg, rest).await,
            "append" => append(&ctx, msg, rest).await,
            "replace" => replace(&ctx, msg, rest).await,
            "delete" => delete(&ctx, msg, rest).await,
            "list" => list(&ctx, msg, rest).await,
            "unlock" | "activate" if !ctx.config.is_owner(author) => {
                info!("{} was refused grdn {sub}", msg.author.name);
                reply(&ctx, msg, NO_COMMAND_ACCESS).await
            }
            "unlock" => unlock(&ctx, msg, rest).await,
            "activate" => activate(&ctx).await,
            _ => {
                let text = format!(
                    "Command `{sub}` is invalid. Use `{} av grdn help` to list commands.",
                    ctx.prefix()
                );
                reply(&ctx, msg, &text).await
            }
        }
    }
}

async fn reply(ctx: &CommandContext, msg: &IncomingMessage, text: &str) -> Result<()> {
    ctx.reply(msg, text).await?;
    Ok(())
}

async fn send_help(ctx: &CommandContext, msg: &IncomingMessage) -> Result<()> {
    let p = ctx.prefix();
    let text = format!(
        "You may add data to GRDN via `{p} av grdn add <data key> <data to add here>`\n\
         You may request data from GRDN via `{p} av grdn get <data key>`\n\
         You may append additional data for a specific key with `{p} av grdn append <data key> <adtl. data>`\n\
         You may replace data for a specific key with `{p} av grdn replace <data key> <new data>`\n\
         List known data keys with `{p} av grdn list`\n\
         Delete data associated with a key via `{p} av grdn delete <data key>`"
    );
    reply(ctx, msg, &text).await
}

async fn missing_key(ctx: &CommandContext, msg: &IncomingMessage, key: &str) -> Result<()> {
    reply(ctx, msg, &format!("There is no data associated with `{key}`")).await
}

async fn usage(ctx: &CommandContext, msg: &IncomingMessage, form: &str) -> Result<()> {
    reply(ctx, msg, &format!("Usage: `{} av grdn {form}`", ctx.prefix())).await
}

/// Split `<key> <words…>` into the normalized key and the remaining words
fn key_and_words(rest: &str) -> Option<(String, Vec<&str>)> {
    let mut words = rest.split_whitespace();
    let key = normalize_key(words.next()?);
    Some((key, words.collect()))
}

async fn add(ctx: &CommandContext, msg: &IncomingMessage, rest: &str) -> Result<()> {
    let Some((key, mut words)) = key_and_words(rest) else {
        return usage(ctx, msg, "add <data key> [-h] <data>").await;
    };
    let hidden = words.first() == Some(&HIDDEN_FLAG);
    if hidden {
        words.remove(0);
    }
    if words.is_empty() {
        return usage(ctx, msg, "add <data key> [-h] <data>").await;
    }

    match ctx.knowledge.add(&key, &words.join(" "), hidden).await? {
        AddOutcome::Added => {
            info!("{} added grdn key {key} (hidden: {hidden})", msg.author.name);
            reply(ctx, msg, &format!("Data for `{key}` added.")).await
        }
        AddOutcome::AlreadyExists => {
            let text = format!(
                "Data already logged for key {key}\n\
                 Use the `replace` command if you wish to update this data."
            );
            reply(ctx, msg, &text).await
        }
    }
}

async fn get(ctx: &CommandContext, msg: &IncomingMessage, rest: &str) -> Result<()> {
    let Some((key, words)) = key_and_words(rest) else {
        return usage(ctx, msg, "get <data key> [-h]").await;
    };
    let keep_hidden = words.contains(&HIDDEN_FLAG);
    match ctx.knowledge.get(&key, keep_hidden).await? {
        Some(lookup) => {
            if lookup.newly_revealed {
                info!("{} revealed grdn key {key}", msg.author.name);
            }
            reply(ctx, msg, &lookup.value).await
        }
        None => missing_key(ctx, msg, &key).await,
    }
}

async fn append(ctx: &CommandContext, msg: &IncomingMessage, rest: &str) -> Result<()> {
    let Some((key, words)) = key_and_words(rest) else {
        return usage(ctx, msg, "append <data key> <adtl. data>").await;
    };
    if ctx.knowledge.append(&key, &words.join(" ")).await? {
        reply(ctx, msg, &format!("Data for {key} updated")).await
    } else {
        missing_key(ctx, msg, &key).await
    }
}

async fn replace(ctx: &CommandContext, msg: &IncomingMessage, rest: &str) -> Result<()> {
    let Some((key, words)) = key_and_words(rest) else {
        return usage(ctx, msg, "replace <data key> <new data>").await;
    };
    if ctx.knowledge.replace(&key, &words.join(" ")).await? {
        reply(ctx, msg, &format!("Data for {key} replaced")).await
    } else {
        missing_key(ctx, msg, &key).await
    }
}

async fn delete(ctx: &CommandContext, msg: &IncomingMessage, rest: &str) -> Result<()> {
    let Some((key, _)) = key_and_words(rest) else {
        return usage(ctx, msg, "delete <data key>").await;
    };
    if ctx.knowledge.delete(&key).await? {
        info!("{} deleted grdn key {key}", msg.author.name);
        reply(ctx, msg, &format!("Data for {key} deleted")).await
    } else {
        missing_key(ctx, msg, &key).await
    }
}

/// Revealed keys; the owner can also list every key (`-all`) or only hidden ones (`-h`)
async fn list(ctx: &CommandContext, msg: &IncomingMessage, rest: &str) -> Result<()> {
    let flags: Vec<&str> = rest.split_whitespace().collect();
    let is_owner = ctx.config.is_owner(msg.author.id);
    let base = ctx.knowledge.snapshot().await;

    let text = if is_owner && flags.contains(&ALL_FLAG) {
        format!("All data keys: {}", format_key_list(base.all_keys()))
    } else if is_owner && flags.contains(&HIDDEN_FLAG) {
        format!("Unrevealed data keys: {}", format_key_list(base.hidden_keys()))
    } else {
        format!("Known data keys: {}", format_key_list(base.known_keys()))
    };
    reply(ctx, msg, &text).await
}

/// Reveal a key and send it to everyone on the notify list
async fn unlock(ctx: &CommandContext, msg: &IncomingMessage, rest: &str) -> Result<()> {
    let Some((key, _)) = key_and_words(rest) else {
        return usage(ctx, msg, "unlock <data key>").await;
    };
    let Some(lookup) = ctx.knowledge.unlock(&key).await? else {
        return reply(ctx, msg, &format!("Key `{key}` does not exist")).await;
    };
    if lookup.newly_revealed {
        notify(ctx, &format!("Key {key} added to known data.")).await;
    }
    notify(ctx, &format!("`{key}`: {}", lookup.value)).await;
    Ok(())
}

async fn activate(ctx: &CommandContext) -> Result<()> {
    info!("Running GRDN activation sequence");
    for (text, pause_ms) in ACTIVATION_SEQUENCE {
        notify(ctx, text).await;
        if *pause_ms > 0 {
            sleep(Duration::from_millis(*pause_ms)).await;
        }
    }
    Ok(())
}

/// DM every notify-list member; failures are logged and skipped
async fn notify(ctx: &CommandContext, text: &str) {
    for user_id in ctx.config.notify_ids() {
        if let Err(e) = ctx.platform.send_direct(user_id, text).await {
            warn!("Could not DM user {user_id}: {e}");
        }
    }
}
