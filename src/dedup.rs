// src/dedup.rs
//! Durable record of which item ids were already delivered.
//!
//! On disk: `{ "posted_ids": [...], "last_updated": "<ISO-8601>" }`.
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a reader never sees a half-written state file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::PersistenceError;

pub const DEFAULT_STATE_PATH: &str = "posted_jobs.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupSet {
    #[serde(rename = "posted_ids", default, deserialize_with = "de_ids")]
    notified_ids: BTreeSet<String>,
    #[serde(default, deserialize_with = "de_lenient_ts")]
    last_updated: Option<DateTime<Utc>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notified_ids.contains(id)
    }

    /// Returns true if the id was not present before. Re-marking is a no-op.
    pub fn mark_notified(&mut self, id: impl Into<String>) -> bool {
        self.notified_ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.notified_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notified_ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.notified_ids.iter().map(String::as_str)
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(now);
    }
}

impl<S: Into<String>> FromIterator<S> for DedupSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            notified_ids: iter.into_iter().map(Into::into).collect(),
            last_updated: None,
        }
    }
}

// Older state files stored ids as JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(u64),
}

fn de_ids<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<String>, D::Error> {
    let raw: Vec<RawId> = Vec::deserialize(d)?;
    Ok(raw
        .into_iter()
        .map(|r| match r {
            RawId::Str(s) => s,
            RawId::Num(n) => n.to_string(),
        })
        .collect())
}

// Accepts RFC 3339 and naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC).
// Anything else is dropped rather than failing the load.
fn de_lenient_ts<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    Ok(raw.and_then(|s| parse_lenient_ts(&s)))
}

fn parse_lenient_ts(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Missing state is an empty set, not an error.
    async fn load(&self) -> Result<DedupSet, PersistenceError>;

    /// Replace the stored state with `set` in one atomic step.
    async fn persist(&self, set: &DedupSet) -> Result<(), PersistenceError>;
}

/// JSON file on local disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "dedup-state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn write_temp(&self, tmp: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut f = fs::File::create(tmp).await?;
        f.write_all(bytes).await?;
        f.flush().await?;
        f.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl DedupStore for JsonFileStore {
    async fn load(&self) -> Result<DedupSet, PersistenceError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(target: "dedup", path = %self.path.display(), "no prior state");
                return Ok(DedupSet::new());
            }
            Err(e) => return Err(self.io_err(e)),
        };
        let set: DedupSet =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(target: "dedup", path = %self.path.display(), ids = set.len(), "state loaded");
        Ok(set)
    }

    async fn persist(&self, set: &DedupSet) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(set).map_err(|source| PersistenceError::Encode {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err(e))?;
        }

        let tmp = self.temp_path();
        if let Err(e) = self.write_temp(&tmp, &json).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.io_err(e));
        }
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(self.io_err(e));
        }

        tracing::debug!(target: "dedup", path = %self.path.display(), ids = set.len(), "state persisted");
        Ok(())
    }
}
