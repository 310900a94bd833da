//! Environment-driven bot configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Add knowledge store remote and access lists
//! - 1.0.0: Initial release with token, prefix and guild directory

use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PREFIX: &str = "!cc";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_GUILDS_DIR: &str = "guilds";
pub const DEFAULT_KNOWLEDGE_CACHE_PATH: &str = "data/grdn_data.json";
pub const DEFAULT_KNOWLEDGE_REFRESH_SECS: u64 = 3_600;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Activation prefix every command message starts with
    pub prefix: String,
    pub log_level: String,
    /// Root directory holding one sub-directory of member records per guild
    pub guilds_dir: PathBuf,
    pub knowledge_cache_path: PathBuf,
    pub knowledge_remote_url: Option<String>,
    pub knowledge_remote_token: Option<String>,
    pub knowledge_refresh_interval: Duration,
    /// Member allowed to run every knowledge command
    pub owner_id: Option<u64>,
    /// Members allowed to read and edit knowledge entries
    pub curator_ids: Vec<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, so tests don't have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let knowledge_refresh_secs = match get("KNOWLEDGE_REFRESH_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("KNOWLEDGE_REFRESH_SECS is not a number: {raw}"))?,
            None => DEFAULT_KNOWLEDGE_REFRESH_SECS,
        };

        let owner_id = get("OWNER_ID")
            .map(|raw| parse_id(&raw, "OWNER_ID"))
            .transpose()?;

        let curator_ids = match get("CURATOR_IDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| parse_id(id, "CURATOR_IDS"))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            discord_token,
            prefix: get("PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            guilds_dir: get("GUILDS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GUILDS_DIR)),
            knowledge_cache_path: get("KNOWLEDGE_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KNOWLEDGE_CACHE_PATH)),
            knowledge_remote_url: get("KNOWLEDGE_REMOTE_URL"),
            knowledge_remote_token: get("KNOWLEDGE_REMOTE_TOKEN"),
            knowledge_refresh_interval: Duration::from_secs(knowledge_refresh_secs),
            owner_id,
            curator_ids,
        })
    }

    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_id == Some(user_id)
    }

    /// Owner or curator
    pub fn is_curator(&self, user_id: u64) -> bool {
        self.is_owner(user_id) || self.curator_ids.contains(&user_id)
    }

    /// Members who receive knowledge store DMs: the owner first, then curators
    pub fn notify_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.owner_id.into_iter().collect();
        for id in &self.curator_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

fn parse_id(raw: &str, key: &str) -> Result<u64> {
    raw.parse::<u64>()
        .with_context(|| format!("{key} contains an invalid user id: {raw}"))
}
