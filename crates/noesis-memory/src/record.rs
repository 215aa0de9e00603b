//! Persisted memory units: full records, paired summary records, and the
//! profile reflection history entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex SHA-256 of a record's primary content, used for deduplication.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A full append-only memory record. Created once per logged event; the only
/// permitted later mutation is the reflection supervisor patching
/// tags/insight/behavioral_adjustment on the most-recently-written record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub tags: Vec<String>,
    /// Originating context — user input or reasoning trace.
    pub context: String,
    pub insight: String,
    pub behavioral_adjustment: String,
    pub reflective_summary: Option<String>,
    pub relevance_score: f64,
    pub content_hash: String,
}

impl MemoryRecord {
    pub fn new(content: impl Into<String>, context: impl Into<String>) -> Self {
        let content = content.into();
        let hash = content_hash(&content);
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            content,
            tags: Vec::new(),
            context: context.into(),
            insight: String::new(),
            behavioral_adjustment: String::new(),
            reflective_summary: None,
            relevance_score: 0.5,
            content_hash: hash,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_insight(mut self, insight: impl Into<String>) -> Self {
        self.insight = insight.into();
        self
    }

    pub fn with_adjustment(mut self, adjustment: impl Into<String>) -> Self {
        self.behavioral_adjustment = adjustment.into();
        self
    }

    pub fn with_reflective_summary(mut self, summary: impl Into<String>) -> Self {
        self.reflective_summary = Some(summary.into());
        self
    }

    pub fn with_relevance(mut self, score: f64) -> Self {
        self.relevance_score = score.clamp(0.0, 1.0);
        self
    }

    /// Abbreviated companion record sharing this record's id.
    pub fn summary_record(&self) -> SummaryRecord {
        const SUMMARY_CHARS: usize = 200;
        let summary = if self.insight.is_empty() {
            truncate_chars(&self.content, SUMMARY_CHARS)
        } else {
            self.insight.clone()
        };
        SummaryRecord {
            id: self.id,
            timestamp: self.timestamp,
            summary,
            tags: self.tags.clone(),
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Abbreviated record for fast scanning, written alongside each full record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub tags: Vec<String>,
}

/// One entry in the long-lived user-facing profile history, appended on each
/// successful reflection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileReflection {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub insight: String,
    pub behavioral_adjustment: String,
    pub tags: Vec<String>,
    pub meta_reflection: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_hashes_equal() {
        let a = MemoryRecord::new("same content", "ctx a");
        let b = MemoryRecord::new("same content", "ctx b");
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn different_content_hashes_differ() {
        let a = MemoryRecord::new("alpha", "ctx");
        let b = MemoryRecord::new("beta", "ctx");
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn relevance_is_clamped() {
        let r = MemoryRecord::new("x", "ctx").with_relevance(1.5);
        assert_eq!(r.relevance_score, 1.0);
        let r = MemoryRecord::new("x", "ctx").with_relevance(-0.5);
        assert_eq!(r.relevance_score, 0.0);
    }

    #[test]
    fn summary_record_shares_id() {
        let r = MemoryRecord::new("some long cycle content", "ctx")
            .with_tags(vec!["planning".into()]);
        let s = r.summary_record();
        assert_eq!(s.id, r.id);
        assert_eq!(s.tags, r.tags);
        assert!(s.summary.starts_with("some long"));
    }

    #[test]
    fn summary_prefers_insight_over_content() {
        let r = MemoryRecord::new("raw content", "ctx").with_insight("distilled point");
        assert_eq!(r.summary_record().summary, "distilled point");
    }

    #[test]
    fn summary_truncates_long_content_on_char_boundary() {
        let long = "é".repeat(500);
        let s = MemoryRecord::new(long, "ctx").summary_record();
        assert_eq!(s.summary.chars().count(), 200);
    }
}
