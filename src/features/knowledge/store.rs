//! Cached knowledge base with remote sync
//!
//! The whole base is kept in memory, mirrored to a local JSON cache file and,
//! when a remote is configured, pushed to it after every change. Pulls from
//! the remote happen at most once per refresh interval. The refresh check is
//! best-effort: two commands racing on a stale cache may both pull.
//!
//! A remote-backed store refuses changes until its base came from the remote
//! or from an existing cache file, so an empty base never overwrites the remote.

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::remote::RemoteBlob;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    /// Lower-cased key to stored text
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    /// Keys revealed to everyone, in reveal order
    #[serde(default)]
    pub known_data: Vec<String>,
}

impl KnowledgeBase {
    pub fn is_known(&self, key: &str) -> bool {
        self.known_data.iter().any(|k| k == key)
    }

    /// Mark a key as revealed; returns false when it already was
    pub fn reveal(&mut self, key: &str) -> bool {
        if self.is_known(key) {
            return false;
        }
        self.known_data.push(key.to_string());
        true
    }

    pub fn known_keys(&self) -> Vec<String> {
        self.known_data.clone()
    }

    pub fn all_keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    /// Keys that exist but were never revealed
    pub fn hidden_keys(&self) -> Vec<String> {
        self.data
            .keys()
            .filter(|k| !self.is_known(k))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyExists,
}

/// Value returned by a lookup, and whether the lookup revealed the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub value: String,
    pub newly_revealed: bool,
}

pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

pub struct KnowledgeStore {
    cache_path: PathBuf,
    remote: Option<Arc<dyn RemoteBlob>>,
    refresh_interval: Duration,
    base: RwLock<KnowledgeBase>,
    last_refreshed: Mutex<Option<Instant>>,
    /// Base holds real data: pulled, read from the cache file, or local-only
    synced: AtomicBool,
}

impl KnowledgeStore {
    pub fn new(
        cache_path: impl Into<PathBuf>,
        remote: Option<Arc<dyn RemoteBlob>>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            cache_path: cache_path.into(),
            refresh_interval,
            base: RwLock::new(KnowledgeBase::default()),
            synced: AtomicBool::new(remote.is_none()),
            remote,
            last_refreshed: Mutex::new(None),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    fn ensure_synced(&self) -> Result<()> {
        if !self.is_synced() {
            bail!(
                "knowledge base was never loaded from the remote or a cache file; \
                 refusing to overwrite the remote"
            );
        }
        Ok(())
    }

    /// Pull from the remote unless that already happened within the refresh interval.
    ///
    /// Returns whether a pull happened.
    pub async fn refresh_if_stale(&self) -> Result<bool> {
        let stale = match *self.last_refreshed.lock().await {
            Some(at) => at.elapsed() >= self.refresh_interval,
            None => true,
        };
        if !stale {
            return Ok(false);
        }
        self.pull().await?;
        *self.last_refreshed.lock().await = Some(Instant::now());
        Ok(true)
    }

    /// Load the local cache file; a missing file leaves the base empty
    pub async fn load_local(&self) -> Result<()> {
        match tokio::fs::read(&self.cache_path).await {
            Ok(bytes) => self.replace_base(&bytes).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "No knowledge cache at {}; starting empty",
                    self.cache_path.display()
                );
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the local cache with the remote copy.
    ///
    /// Without a remote the local cache file is (re)loaded instead.
    pub async fn pull(&self) -> Result<()> {
        let Some(remote) = &self.remote else {
            return self.load_local().await;
        };
        let bytes = remote.download().await?;
        self.replace_base(&bytes).await?;
        self.write_cache(&bytes).await?;
        info!("Pulled knowledge base from remote");
        Ok(())
    }

    async fn replace_base(&self, bytes: &[u8]) -> Result<()> {
        let parsed: KnowledgeBase =
            serde_json::from_slice(bytes).context("parsing knowledge base")?;
        *self.base.write().await = parsed;
        self.synced.store(true, Ordering::Release);
        Ok(())
    }

    /// Write the local cache and overwrite the remote with it
    pub async fn push(&self) -> Result<()> {
        self.ensure_synced()?;
        let bytes = serde_json::to_vec_pretty(&*self.base.read().await)?;
        self.write_cache(&bytes).await?;
        if let Some(remote) = &self.remote {
            remote.upload(bytes).await?;
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> KnowledgeBase {
        self.base.read().await.clone()
    }

    /// Add a new entry; hidden entries are not revealed
    pub async fn add(&self, key: &str, value: &str, hidden: bool) -> Result<AddOutcome> {
        let key = normalize_key(key);
        self.ensure_synced()?;
        {
            let mut base = self.base.write().await;
            if base.data.contains_key(&key) {
                return Ok(AddOutcome::AlreadyExists);
            }
            base.data.insert(key.clone(), value.to_string());
            if !hidden {
                base.reveal(&key);
            }
        }
        self.push().await?;
        Ok(AddOutcome::Added)
    }

    /// Look up an entry, revealing it unless `keep_hidden`
    pub async fn get(&self, key: &str, keep_hidden: bool) -> Result<Option<Lookup>> {
        self.lookup(key, !keep_hidden).await
    }

    /// Reveal an entry and return it
    pub async fn unlock(&self, key: &str) -> Result<Option<Lookup>> {
        self.lookup(key, true).await
    }

    async fn lookup(&self, key: &str, reveal: bool) -> Result<Option<Lookup>> {
        let key = normalize_key(key);
        let lookup = {
            let mut base = self.base.write().await;
            let Some(value) = base.data.get(&key).cloned() else {
                return Ok(None);
            };
            if reveal && !base.is_known(&key) {
                self.ensure_synced()?;
            }
            let newly_revealed = reveal && base.reveal(&key);
            Lookup {
                value,
                newly_revealed,
            }
        };
        if lookup.newly_revealed {
            self.push().await?;
        }
        Ok(Some(lookup))
    }

    /// Add text to the end of an existing entry; false when the key is unknown
    pub async fn append(&self, key: &str, more: &str) -> Result<bool> {
        self.modify(key, |value| {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(more);
        })
        .await
    }

    /// Replace an existing entry; false when the key is unknown
    pub async fn replace(&self, key: &str, new_value: &str) -> Result<bool> {
        self.modify(key, |value| *value = new_value.to_string())
            .await
    }

    async fn modify<F>(&self, key: &str, change: F) -> Result<bool>
    where
        F: FnOnce(&mut String),
    {
        let key = normalize_key(key);
        self.ensure_synced()?;
        {
            let mut base = self.base.write().await;
            let Some(value) = base.data.get_mut(&key) else {
                return Ok(false);
            };
            change(value);
        }
        self.push().await?;
        Ok(true)
    }

    /// Remove an entry and its revealed flag; false when the key is unknown
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let key = normalize_key(key);
        self.ensure_synced()?;
        {
            let mut base = self.base.write().await;
            if base.data.remove(&key).is_none() {
                return Ok(false);
            }
            base.known_data.retain(|k| k != &key);
        }
        self.push().await?;
        Ok(true)
    }

    async fn write_cache(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.cache_path, bytes)
            .await
            .with_context(|| format!("writing {}", self.cache_path.display()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    /// Remote kept in memory, counting transfers
    #[derive(Default)]
    pub(crate) struct MemoryBlob {
        pub contents: StdMutex<Vec<u8>>,
        pub downloads: StdMutex<usize>,
        pub uploads: StdMutex<usize>,
    }

    impl MemoryBlob {
        pub(crate) fn with(base: &KnowledgeBase) -> Self {
            let blob = Self::default();
            *blob.contents.lock().unwrap() = serde_json::to_vec(base).unwrap();
            blob
        }

        pub(crate) fn stored(&self) -> KnowledgeBase {
            serde_json::from_slice(&self.contents.lock().unwrap()).unwrap()
        }
    }

    #[async_trait]
    impl RemoteBlob for MemoryBlob {
        async fn download(&self) -> Result<Vec<u8>> {
            *self.downloads.lock().unwrap() += 1;
            Ok(self.contents.lock().unwrap().clone())
        }

        async fn upload(&self, bytes: Vec<u8>) -> Result<()> {
            *self.uploads.lock().unwrap() += 1;
            *self.contents.lock().unwrap() = bytes;
            Ok(())
        }
    }

    pub(crate) fn sample_base() -> KnowledgeBase {
        let mut base = KnowledgeBase::default();
        base.data.insert("gauntlight".into(), "A lighthouse.".into());
        base.data.insert("belcorra".into(), "Hidden villain.".into());
        base.known_data.push("gauntlight".into());
        base
    }

    fn store_with(blob: Arc<MemoryBlob>, dir: &tempfile::TempDir) -> KnowledgeStore {
        KnowledgeStore::new(
            dir.path().join("data").join("grdn.json"),
            Some(blob),
            Duration::from_secs(3_600),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_is_gated_by_interval() {
        let dir = tempfile::tempdir().unwrap();
        let blob = Arc::new(MemoryBlob::with(&sample_base()));
        let store = store_with(blob.clone(), &dir);

        assert!(store.refresh_if_stale().await.unwrap());
        assert!(!store.refresh_if_stale().await.unwrap());
        assert_eq!(*blob.downloads.lock().unwrap(), 1);

        tokio::time::advance(Duration::from_secs(3_601)).await;
        assert!(store.refresh_if_stale().await.unwrap());
        assert_eq!(*blob.downloads.lock().unwrap(), 2);
        assert_eq!(store.snapshot().await, sample_base());
        assert!(store.cache_path().exists());
    }

    #[tokio::test]
    async fn test_add_lowercases_and_reveals() {
        let dir = tempfile::tempdir().unwrap();
        let blob = Arc::new(MemoryBlob::with(&KnowledgeBase::default()));
        let store = store_with(blob.clone(), &dir);
        store.pull().await.unwrap();

        assert_eq!(store.add("Vault", "Deep down", false).await.unwrap(), AddOutcome::Added);
        assert_eq!(store.add("vault", "again", false).await.unwrap(), AddOutcome::AlreadyExists);
        assert_eq!(store.add("secret", "shh", true).await.unwrap(), AddOutcome::Added);

        let remote = blob.stored();
        assert_eq!(remote.data.get("vault").unwrap(), "Deep down");
        assert_eq!(remote.known_data, vec!["vault".to_string()]);
        assert_eq!(remote.hidden_keys(), vec!["secret".to_string()]);
        assert_eq!(*blob.uploads.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_reveals_unless_kept_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let blob = Arc::new(MemoryBlob::with(&sample_base()));
        let store = store_with(blob.clone(), &dir);
        store.pull().await.unwrap();

        let hidden = store.get("BELCORRA", true).await.unwrap().unwrap();
        assert!(!hidden.newly_revealed);
        assert_eq!(*blob.uploads.lock().unwrap(), 0);

        let revealed = store.get("belcorra", false).await.unwrap().unwrap();
        assert_eq!(revealed.value, "Hidden villain.");
        assert!(revealed.newly_revealed);
        assert!(blob.stored().is_known("belcorra"));

        let again = store.get("belcorra", false).await.unwrap().unwrap();
        assert!(!again.newly_revealed);
        assert!(store.get("nobody", false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_replace_delete() {
        let dir = tempfile::tempdir().unwrap();
        let blob = Arc::new(MemoryBlob::with(&sample_base()));
        let store = store_with(blob.clone(), &dir);
        store.pull().await.unwrap();

        assert!(store.append("gauntlight", "Very tall.").await.unwrap());
        assert_eq!(
            store.snapshot().await.data["gauntlight"],
            "A lighthouse. Very tall."
        );
        assert!(store.replace("gauntlight", "Rubble.").await.unwrap());
        assert_eq!(blob.stored().data["gauntlight"], "Rubble.");

        assert!(!store.append("missing", "x").await.unwrap());
        assert!(!store.replace("missing", "x").await.unwrap());

        assert!(store.delete("gauntlight").await.unwrap());
        assert!(!store.delete("gauntlight").await.unwrap());
        let remote = blob.stored();
        assert!(!remote.data.contains_key("gauntlight"));
        assert!(!remote.is_known("gauntlight"));
    }

    #[tokio::test]
    async fn test_local_only_store_round_trips_through_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grdn.json");
        let store = KnowledgeStore::new(&path, None, Duration::from_secs(60));

        store.pull().await.unwrap();
        store.add("key", "value", false).await.unwrap();

        let reopened = KnowledgeStore::new(&path, None, Duration::from_secs(60));
        reopened.pull().await.unwrap();
        assert_eq!(reopened.snapshot().await.data["key"], "value");
    }

    /// Remote whose downloads always fail
    struct UnreachableBlob(MemoryBlob);

    #[async_trait]
    impl RemoteBlob for UnreachableBlob {
        async fn download(&self) -> Result<Vec<u8>> {
            bail!("connection refused")
        }

        async fn upload(&self, bytes: Vec<u8>) -> Result<()> {
            self.0.upload(bytes).await
        }
    }

    #[tokio::test]
    async fn test_failed_first_pull_refuses_changes() {
        let dir = tempfile::tempdir().unwrap();
        let blob = Arc::new(UnreachableBlob(MemoryBlob::with(&sample_base())));
        let store = KnowledgeStore::new(
            dir.path().join("grdn.json"),
            Some(blob.clone()),
            Duration::from_secs(3_600),
        );
        store.load_local().await.unwrap();

        assert!(store.refresh_if_stale().await.is_err());
        assert!(!store.is_synced());
        assert!(store.add("otari", "A harbour town.", false).await.is_err());
        assert!(store.delete("gauntlight").await.is_err());

        assert_eq!(*blob.0.uploads.lock().unwrap(), 0);
        assert_eq!(blob.0.stored(), sample_base());
        assert!(store.snapshot().await.data.is_empty());
    }

    #[tokio::test]
    async fn test_existing_cache_file_allows_changes_while_remote_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grdn.json");
        std::fs::write(&path, serde_json::to_vec(&sample_base()).unwrap()).unwrap();
        let blob = Arc::new(UnreachableBlob(MemoryBlob::default()));
        let store = KnowledgeStore::new(&path, Some(blob.clone()), Duration::from_secs(3_600));
        store.load_local().await.unwrap();

        assert!(store.refresh_if_stale().await.is_err());
        assert!(store.is_synced());
        assert_eq!(store.add("otari", "A harbour town.", false).await.unwrap(), AddOutcome::Added);

        let remote = blob.0.stored();
        assert_eq!(remote.all_keys(), vec!["belcorra", "gauntlight", "otari"]);
    }

    #[test]
    fn test_key_lists() {
        let base = sample_base();
        assert_eq!(base.known_keys(), vec!["gauntlight".to_string()]);
        assert_eq!(base.all_keys(), vec!["belcorra".to_string(), "gauntlight".to_string()]);
        assert_eq!(base.hidden_keys(), vec!["belcorra".to_string()]);
    }
}
