use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One audit record. JSON Lines, one record per line, append-only.
///
/// `hash_prev`/`hash_self` form a chain: tampering with any line breaks
/// verification from that point on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub seq: u64,
    pub ts_utc: DateTime<Utc>,
    /// Approval token the record concerns, absent for run-level events.
    pub token: Option<Uuid>,
    /// Event name, e.g. "proposal_submitted", "execution_finished".
    pub event: String,
    pub detail: Value,
    pub hash_prev: Option<String>,
    pub hash_self: String,
}

struct ChainState {
    seq: u64,
    last_hash: Option<String>,
}

/// Append-only audit trail for the reclamation workflow.
///
/// Opening an existing log resumes the chain from its last line, so every
/// process invocation extends one continuous history.
pub struct AuditLog {
    path: PathBuf,
    state: Mutex<ChainState>,
}

impl AuditLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create audit dir {}", parent.display()))?;
        }

        let state = match read_tail(&path)? {
            Some(last) => ChainState {
                seq: last.seq + 1,
                last_hash: Some(last.hash_self),
            },
            None => ChainState {
                seq: 0,
                last_hash: None,
            },
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Append one record and return it.
    pub fn record(&self, event: &str, token: Option<Uuid>, detail: Value) -> Result<AuditRecord> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("audit log lock poisoned"))?;

        let mut record = AuditRecord {
            seq: state.seq,
            ts_utc: Utc::now(),
            token,
            event: event.to_string(),
            detail,
            hash_prev: state.last_hash.clone(),
            hash_self: String::new(),
        };
        record.hash_self = chain_hash(&record)?;

        let line = serde_json::to_string(&record).context("serialize audit record")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open audit log {}", self.path.display()))?;
        file.write_all(line.as_bytes()).context("write audit line")?;
        file.write_all(b"\n").context("write audit newline")?;

        state.seq += 1;
        state.last_hash = Some(record.hash_self.clone());
        Ok(record)
    }
}

/// Outcome of verifying an audit log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainCheck {
    Valid { records: usize },
    Broken { line: usize, reason: String },
}

/// Verify the hash chain of an audit log file.
pub fn verify(path: impl AsRef<Path>) -> Result<ChainCheck> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read audit log {}", path.as_ref().display()))?;
    verify_str(&content)
}

/// Verify the hash chain of JSONL content.
pub fn verify_str(content: &str) -> Result<ChainCheck> {
    let mut prev: Option<String> = None;
    let mut records = 0usize;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: AuditRecord = serde_json::from_str(line)
            .with_context(|| format!("parse audit record at line {}", i + 1))?;
        records += 1;

        if record.hash_prev != prev {
            return Ok(ChainCheck::Broken {
                line: i + 1,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev, record.hash_prev
                ),
            });
        }

        let recomputed = chain_hash(&record)?;
        if record.hash_self != recomputed {
            return Ok(ChainCheck::Broken {
                line: i + 1,
                reason: format!(
                    "hash_self mismatch: claimed {}, recomputed {recomputed}",
                    record.hash_self
                ),
            });
        }

        prev = Some(record.hash_self);
    }

    Ok(ChainCheck::Valid { records })
}

/// Hash over the canonical form of the record with `hash_self` blanked.
fn chain_hash(record: &AuditRecord) -> Result<String> {
    let mut unhashed = record.clone();
    unhashed.hash_self = String::new();

    let raw = serde_json::to_value(&unhashed).context("canonicalize audit record")?;
    let canonical =
        serde_json::to_string(&sort_keys(&raw)).context("stringify audit record")?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[&key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        _ => value.clone(),
    }
}

fn read_tail(path: &Path) -> Result<Option<AuditRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read audit log {}", path.display()))?;
    let last = content.lines().rev().find(|l| !l.trim().is_empty());
    match last {
        Some(line) => {
            let record: AuditRecord =
                serde_json::from_str(line.trim()).context("parse last audit record")?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}
