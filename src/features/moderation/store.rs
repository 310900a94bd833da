//! Moderation record persistence
//!
//! Records live in one YAML file per member under a per-guild directory:
//! `<root>/<guild_id>/<member_id>.yml`.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::record::ModerationRecord;

pub trait RecordStore: Send + Sync {
    /// Read one member's record, `None` when the member has no record yet
    fn read(&self, guild_id: u64, member_id: u64) -> Result<Option<ModerationRecord>>;

    /// Create or overwrite one member's record
    fn write(&self, guild_id: u64, member_id: u64, record: &ModerationRecord) -> Result<()>;

    /// Every readable record of a guild
    fn list(&self, guild_id: u64) -> Result<Vec<ModerationRecord>>;

    /// Remove all records of a guild
    fn delete_guild(&self, guild_id: u64) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct YamlRecordStore {
    root: PathBuf,
}

impl YamlRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn guild_dir(&self, guild_id: u64) -> PathBuf {
        self.root.join(guild_id.to_string())
    }

    fn record_path(&self, guild_id: u64, member_id: u64) -> PathBuf {
        self.guild_dir(guild_id).join(format!("{member_id}.yml"))
    }
}

impl RecordStore for YamlRecordStore {
    fn read(&self, guild_id: u64, member_id: u64) -> Result<Option<ModerationRecord>> {
        let path = self.record_path(guild_id, member_id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let record = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(record))
    }

    fn write(&self, guild_id: u64, member_id: u64, record: &ModerationRecord) -> Result<()> {
        let dir = self.guild_dir(guild_id);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let path = self.record_path(guild_id, member_id);
        let yaml = serde_yaml::to_string(record)?;
        fs::write(&path, yaml).with_context(|| format!("writing {}", path.display()))?;
        debug!("Wrote moderation record {}", path.display());
        Ok(())
    }

    fn list(&self, guild_id: u64) -> Result<Vec<ModerationRecord>> {
        let dir = self.guild_dir(guild_id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
        };

        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yml") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|c| serde_yaml::from_str::<ModerationRecord>(&c).map_err(Into::into));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable record {}: {e}", path.display()),
            }
        }
        records.sort_by_key(|r| r.uid);
        Ok(records)
    }

    fn delete_guild(&self, guild_id: u64) -> Result<()> {
        let dir = self.guild_dir(guild_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", dir.display())),
        }
    }
}
