use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, Member, UnavailableGuild};
use serenity::model::id::GuildId;
use serenity::model::voice::VoiceState;
use serenity::prelude::*;
use std::sync::Arc;

use crewbot::commands::{CommandContext, Dispatcher};
use crewbot::core::Config;
use crewbot::features::knowledge::{HttpBlob, KnowledgeStore, RemoteBlob};
use crewbot::features::moderation::{Moderation, Reconciliation, YamlRecordStore};
use crewbot::platform::discord::member_ref;
use crewbot::platform::{ChatPlatform, DiscordPlatform};

struct Handler {
    dispatcher: Arc<Dispatcher>,
    moderation: Arc<Moderation>,
}

impl Handler {
    fn new(dispatcher: Dispatcher, moderation: Arc<Moderation>) -> Self {
        Handler {
            dispatcher: Arc::new(dispatcher),
            moderation,
        }
    }

    /// Create missing member records and pick up mutes left pending by a restart
    async fn bootstrap_guild(&self, guild_id: GuildId) {
        if let Err(e) = self.moderation.safe_reload_guild(guild_id.0).await {
            error!("Failed to sync member records for guild {guild_id}: {e:#}");
        }
        match self.moderation.resume_pending(guild_id.0) {
            Ok(0) => {}
            Ok(n) => info!("⏳ Resumed {n} pending mutes in guild {guild_id}"),
            Err(e) => error!("Failed to resume pending mutes for guild {guild_id}: {e:#}"),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let incoming = DiscordPlatform::incoming(&ctx, &msg).await;
        self.dispatcher.dispatch(&incoming).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);

        for guild in &ready.guilds {
            self.bootstrap_guild(guild.id).await;
        }
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: bool) {
        if !is_new {
            return;
        }
        info!("🆕 Joined new guild: {} ({})", guild.name, guild.id);
        if let Err(e) = self.moderation.reload_guild(guild.id.0).await {
            error!("Failed to create member records for guild {}: {e:#}", guild.id);
        }
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        if incomplete.unavailable {
            // Outage, not a removal
            return;
        }
        info!("👋 Removed from guild {}", incomplete.id);
        if let Err(e) = self.moderation.remove_guild(incomplete.id.0) {
            error!("Failed to delete member records for guild {}: {e:#}", incomplete.id);
        }
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        let member = member_ref(&new_member);
        if let Err(e) = self.moderation.add_member(&member) {
            error!("Failed to create a record for {}: {e:#}", member.name);
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let was_in_voice = old.as_ref().and_then(|o| o.channel_id).is_some();
        if was_in_voice || new.channel_id.is_none() {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        let member = match &new.member {
            Some(member) => member_ref(member),
            None => match guild_id.member(&ctx, new.user_id).await {
                Ok(member) => member_ref(&member),
                Err(e) => {
                    warn!("Could not resolve member {} on voice join: {e}", new.user_id);
                    return;
                }
            },
        };

        match self.moderation.reconcile(&member, new.mute).await {
            Ok(Reconciliation::NotMuted) | Ok(Reconciliation::StillMuted) => {}
            Ok(outcome) => info!("🔇 Voice join of {} reconciled: {outcome:?}", member.name),
            Err(e) => error!("Failed to reconcile mute of {}: {e:#}", member.name),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Arc::new(Config::from_env()?);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting crewbot...");

    let http = Arc::new(Http::new(&config.discord_token));
    let platform: Arc<dyn ChatPlatform> = Arc::new(DiscordPlatform::new(http));

    let records = Arc::new(YamlRecordStore::new(&config.guilds_dir));
    let moderation = Arc::new(Moderation::new(platform.clone(), records));
    info!("📁 Member records in {}", config.guilds_dir.display());

    let remote: Option<Arc<dyn RemoteBlob>> = match &config.knowledge_remote_url {
        Some(url) => {
            info!("☁️ Knowledge remote: {url}");
            let blob: Arc<dyn RemoteBlob> = Arc::new(HttpBlob::new(
                url.clone(),
                config.knowledge_remote_token.clone(),
            )?);
            Some(blob)
        }
        None => {
            warn!("No KNOWLEDGE_REMOTE_URL set; knowledge store runs local-only");
            None
        }
    };
    let knowledge = Arc::new(KnowledgeStore::new(
        &config.knowledge_cache_path,
        remote,
        config.knowledge_refresh_interval,
    ));
    knowledge.load_local().await?;

    let ctx = Arc::new(CommandContext::new(
        config.clone(),
        platform,
        moderation.clone(),
        knowledge,
    ));
    let handler = Handler::new(Dispatcher::new(ctx), moderation);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Bot configured with prefix '{}'. Connecting to Discord gateway...", config.prefix);
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
