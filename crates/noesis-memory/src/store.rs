//! Append-only memory store.
//!
//! Layout under the data dir:
//!   records.jsonl    — full memory records, one JSON object per line
//!   summaries.jsonl  — paired abbreviated records sharing ids
//!   narrative.md     — chronological human-readable cycle trace
//!   recall.jsonl     — one entry per non-empty recall
//!   profile.json     — reflection history, {"reflections": [...]}
//!
//! Appends are single-writer: a mutex serializes all mutations so concurrent
//! cycles never interleave records. Write failures on the cycle path are
//! logged and swallowed — a cycle must not fail because persistence did.
//! The two reflection-owned operations (`patch_latest`,
//! `append_profile_reflection`) return errors instead, so the reflection
//! pass can stay fail-closed.

use crate::record::{MemoryRecord, ProfileReflection, SummaryRecord};
use chrono::Utc;
use noesis_core::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Which persisted artifacts `load` reads back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadScope {
    Full,
    Summaries,
    Both,
}

/// Audit entry for a memory recall: who asked, what for, and the full
/// ranked result — not just the top hit.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RecallEvent {
    pub timestamp: chrono::DateTime<Utc>,
    pub component: String,
    pub query: String,
    pub matches: Vec<noesis_core::MemoryMatch>,
}

struct StoreInner {
    /// content hash → record id, maintained incrementally. Hydrated from
    /// disk once at construction; appends update it in place so no write
    /// ever rescans the file.
    hash_index: HashMap<String, Uuid>,
    /// Most recently appended record — the only record `patch_latest` may
    /// touch.
    latest: Option<Uuid>,
}

pub struct MemoryStore {
    root: PathBuf,
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    /// Open (or create) the store at `root`, hydrating the hash index from
    /// any existing records file.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let mut hash_index = HashMap::new();
        let mut latest = None;
        let records_path = root.join("records.jsonl");
        if records_path.exists() {
            let content = std::fs::read_to_string(&records_path)?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<MemoryRecord>(line) {
                    Ok(record) => {
                        hash_index.insert(record.content_hash.clone(), record.id);
                        latest = Some(record.id);
                    }
                    Err(e) => warn!("Skipping unparsable record line: {}", e),
                }
            }
            info!(
                "Memory store hydrated: {} records at {}",
                hash_index.len(),
                root.display()
            );
        }

        Ok(Self {
            root,
            inner: Mutex::new(StoreInner { hash_index, latest }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn records_path(&self) -> PathBuf {
        self.root.join("records.jsonl")
    }

    fn summaries_path(&self) -> PathBuf {
        self.root.join("summaries.jsonl")
    }

    fn narrative_path(&self) -> PathBuf {
        self.root.join("narrative.md")
    }

    fn recall_path(&self) -> PathBuf {
        self.root.join("recall.jsonl")
    }

    pub fn profile_path(&self) -> PathBuf {
        self.root.join("profile.json")
    }

    /// Append a full record and its paired summary record.
    ///
    /// Re-submitting content with an already-stored hash is an idempotent
    /// no-op. I/O failures are logged and swallowed. Returns the id of the
    /// newly written record, `None` on duplicate or failure.
    pub async fn append(&self, record: MemoryRecord) -> Option<Uuid> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.hash_index.get(&record.content_hash) {
            debug!(
                "Duplicate content hash {} — keeping record {}",
                &record.content_hash[..12],
                existing
            );
            return None;
        }

        let summary = record.summary_record();
        let written = match append_json_line(&self.records_path(), &record).await {
            Ok(()) => append_json_line(&self.summaries_path(), &summary).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            error!("Memory record write failed (continuing): {}", e);
            return None;
        }

        inner.hash_index.insert(record.content_hash.clone(), record.id);
        inner.latest = Some(record.id);
        debug!("Appended memory record {}", record.id);
        Some(record.id)
    }

    /// Id of the most recently appended record, if any.
    pub async fn latest_id(&self) -> Option<Uuid> {
        self.inner.lock().await.latest
    }

    /// Load the most recent records, newest first.
    pub async fn load(
        &self,
        limit: usize,
        scope: LoadScope,
    ) -> (Vec<MemoryRecord>, Vec<SummaryRecord>) {
        let _guard = self.inner.lock().await;
        let full = if scope != LoadScope::Summaries {
            read_jsonl_tail::<MemoryRecord>(&self.records_path(), limit).await
        } else {
            Vec::new()
        };
        let summaries = if scope != LoadScope::Full {
            read_jsonl_tail::<SummaryRecord>(&self.summaries_path(), limit).await
        } else {
            Vec::new()
        };
        (full, summaries)
    }

    /// All full records matching a predicate, oldest first.
    pub async fn find(&self, predicate: impl Fn(&MemoryRecord) -> bool) -> Vec<MemoryRecord> {
        let _guard = self.inner.lock().await;
        read_jsonl_all::<MemoryRecord>(&self.records_path())
            .await
            .into_iter()
            .filter(|r| predicate(r))
            .collect()
    }

    /// A single full record by id.
    pub async fn get(&self, id: Uuid) -> Option<MemoryRecord> {
        self.find(|r| r.id == id).await.into_iter().next()
    }

    /// Append a chronological entry to the human-readable narrative log.
    /// Never parsed back; audit only. Failures logged and swallowed.
    pub async fn append_narrative(&self, markdown: &str) {
        let _guard = self.inner.lock().await;
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!("### {}\n{}\n\n", stamp, markdown);
        if let Err(e) = append_text(&self.narrative_path(), &entry).await {
            error!("Narrative log write failed (continuing): {}", e);
        }
    }

    /// Record a recall event: the querying component, the query, and the
    /// full ranked result list.
    pub async fn log_recall(&self, event: &RecallEvent) {
        let _guard = self.inner.lock().await;
        if let Err(e) = append_json_line(&self.recall_path(), event).await {
            error!("Recall log write failed (continuing): {}", e);
        }
    }

    /// Patch the most-recently-written record's tags (set union), insight,
    /// and behavioral adjustment. This is the only in-place mutation the
    /// store permits, and only when `id` is actually the latest record —
    /// the caller holds an explicit cycle handle, never a directory sort.
    pub async fn patch_latest(
        &self,
        id: Uuid,
        tags: &[String],
        insight: &str,
        behavioral_adjustment: &str,
    ) -> Result<()> {
        let inner = self.inner.lock().await;
        if inner.latest != Some(id) {
            return Err(Error::store_write(format!(
                "record {} is not the latest; refusing in-place patch",
                id
            )));
        }

        let path = self.records_path();
        let mut records = read_jsonl_all::<MemoryRecord>(&path).await;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Err(Error::TraceNotFound(id.to_string()));
        };

        let mut merged: Vec<String> = record
            .tags
            .iter()
            .chain(tags.iter())
            .cloned()
            .collect();
        merged.sort();
        merged.dedup();
        record.tags = merged;
        record.insight = insight.to_string();
        record.behavioral_adjustment = behavioral_adjustment.to_string();

        rewrite_jsonl(&path, &records).await?;
        info!("Patched memory record {} with reflection", id);
        Ok(())
    }

    /// Append a reflection entry to the profile history. Unlike the cycle
    /// path, errors propagate so the reflection pass can fail closed.
    pub async fn append_profile_reflection(&self, reflection: &ProfileReflection) -> Result<()> {
        let _guard = self.inner.lock().await;
        let path = self.profile_path();

        let mut data: serde_json::Value = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .unwrap_or_else(|_| serde_json::json!({ "reflections": [] })),
            Err(_) => serde_json::json!({ "reflections": [] }),
        };

        let entry = serde_json::to_value(reflection)?;
        data.as_object_mut()
            .ok_or_else(|| Error::store_write("profile root is not an object"))?
            .entry("reflections")
            .or_insert_with(|| serde_json::json!([]))
            .as_array_mut()
            .ok_or_else(|| Error::store_write("profile reflections is not an array"))?
            .push(entry);

        atomic_write(&path, &serde_json::to_string_pretty(&data)?).await?;
        Ok(())
    }
}

// ============================================================
// File helpers
// ============================================================

async fn append_json_line<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let line = serde_json::to_string(value)?;
    append_text(path, &format!("{}\n", line)).await
}

async fn append_text(path: &Path, text: &str) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(text.as_bytes()).await?;
    Ok(())
}

async fn read_jsonl_all<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    let Ok(content) = tokio::fs::read_to_string(path).await else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect()
}

async fn read_jsonl_tail<T: serde::de::DeserializeOwned>(path: &Path, limit: usize) -> Vec<T> {
    let mut all = read_jsonl_all::<T>(path).await;
    all.reverse(); // newest first
    all.truncate(limit);
    all
}

async fn rewrite_jsonl<T: serde::Serialize>(path: &Path, values: &[T]) -> Result<()> {
    let mut out = String::new();
    for v in values {
        out.push_str(&serde_json::to_string(v)?);
        out.push('\n');
    }
    atomic_write(path, &out).await
}

async fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
