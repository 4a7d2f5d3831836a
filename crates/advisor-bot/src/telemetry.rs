use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_RETENTION: usize = 256;

/// Bounded in-process log of adviser outcomes.
#[derive(Debug)]
pub struct TelemetrySink {
    retention: usize,
    next_index: AtomicU64,
    records: RwLock<Vec<DecisionRecord>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision_index: u64,
    pub sport: String,
    pub history_len: usize,
    /// `question`, `rejection`, `final` or `error`.
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_safe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySummary {
    pub record_count: usize,
    pub questions: usize,
    pub rejections: usize,
    pub finals: usize,
    pub errors: usize,
    pub mean_p_safe: Option<f64>,
}

impl TelemetrySink {
    pub fn new(retention: usize) -> Self {
        Self {
            retention: retention.max(1),
            next_index: AtomicU64::new(1),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Retention from `ADVISOR_TELEMETRY_RETENTION`, defaulting to 256.
    pub fn from_env() -> Self {
        Self::new(retention_from_reader(|key| std::env::var(key).ok()))
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Stamps `record` with the next decision index and stores it.
    pub fn push(&self, mut record: DecisionRecord) {
        record.decision_index = self.next_index.fetch_add(1, Ordering::Relaxed);
        let mut records = self.records.write();
        records.push(record);
        if records.len() > self.retention {
            let overflow = records.len() - self.retention;
            records.drain(0..overflow);
        }
    }

    pub fn snapshot(&self) -> Vec<DecisionRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn clear(&self) {
        self.records.write().clear();
        self.next_index.store(1, Ordering::Relaxed);
    }

    pub fn summarize(&self) -> TelemetrySummary {
        TelemetrySummary::from_records(&self.snapshot())
    }

    /// Writes one JSON object per line, creating parent directories.
    pub fn write_jsonl(&self, path: &Path) -> io::Result<usize> {
        let records = self.snapshot();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        for record in &records {
            let json = serde_json::to_string(record).map_err(io::Error::other)?;
            writeln!(writer, "{json}")?;
        }
        writer.flush()?;
        Ok(records.len())
    }
}

impl Default for TelemetrySink {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl DecisionRecord {
    pub fn new(sport: impl Into<String>, history_len: usize, outcome: impl Into<String>) -> Self {
        Self {
            decision_index: 0,
            sport: sport.into(),
            history_len,
            outcome: outcome.into(),
            next_fact: None,
            p_safe: None,
            error: None,
        }
    }
}

impl TelemetrySummary {
    pub fn from_records(records: &[DecisionRecord]) -> Self {
        let count = |outcome: &str| records.iter().filter(|r| r.outcome == outcome).count();
        let probabilities: Vec<f64> = records.iter().filter_map(|r| r.p_safe).collect();
        let mean_p_safe = if probabilities.is_empty() {
            None
        } else {
            Some(probabilities.iter().sum::<f64>() / probabilities.len() as f64)
        };
        Self {
            record_count: records.len(),
            questions: count("question"),
            rejections: count("rejection"),
            finals: count("final"),
            errors: count("error"),
            mean_p_safe,
        }
    }
}

fn retention_from_reader<F>(mut read: F) -> usize
where
    F: FnMut(&str) -> Option<String>,
{
    read("ADVISOR_TELEMETRY_RETENTION")
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_RETENTION)
}
