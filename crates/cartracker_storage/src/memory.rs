#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cartracker_contracts::{MonotonicTimeNs, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::stub::{ChaincodeStub, HistoryIter, KeyModification, LedgerError, SignedCreator};

pub const SNAPSHOT_SCHEMA_VERSION: SchemaVersion = SchemaVersion(1);

/// One committed version of a key inside [`MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRow {
    pub seq: u64,
    pub tx_id: String,
    pub timestamp: MonotonicTimeNs,
    #[serde(with = "value_b64")]
    pub value: Vec<u8>,
}

/// In-process ledger with per-key version history and optimistic commit.
///
/// Transactions simulate against the committed state through [`MemoryTxStub`]
/// and are applied by [`MemoryLedger::commit`], which rejects the write set if
/// any key the transaction read has been committed by someone else since.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLedger {
    last_seq: u64,
    keys: BTreeMap<String, Vec<VersionRow>>,
}

/// Read and write sets of one simulated transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRwSet {
    pub tx_id: String,
    pub timestamp: MonotonicTimeNs,
    pub reads: BTreeMap<String, Option<u64>>,
    pub writes: BTreeMap<String, Vec<u8>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(
        &self,
        tx_id: impl Into<String>,
        creator: Option<SignedCreator>,
        timestamp: MonotonicTimeNs,
    ) -> MemoryTxStub<'_> {
        MemoryTxStub {
            ledger: self,
            tx_id: tx_id.into(),
            creator,
            timestamp,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    pub fn commit(&mut self, rw_set: TxRwSet) -> Result<u64, LedgerError> {
        for (key, seen) in &rw_set.reads {
            if self.current_version(key) != *seen {
                tracing::warn!(tx_id = %rw_set.tx_id, key = %key, "mvcc read conflict");
                return Err(LedgerError::MvccReadConflict { key: key.clone() });
            }
        }
        self.last_seq = self.last_seq.saturating_add(1);
        let seq = self.last_seq;
        let write_count = rw_set.writes.len();
        for (key, value) in rw_set.writes {
            self.keys.entry(key).or_default().push(VersionRow {
                seq,
                tx_id: rw_set.tx_id.clone(),
                timestamp: rw_set.timestamp,
                value,
            });
        }
        tracing::debug!(tx_id = %rw_set.tx_id, seq, write_count, "transaction committed");
        Ok(seq)
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn current_value(&self, key: &str) -> Option<&[u8]> {
        self.keys
            .get(key)
            .and_then(|rows| rows.last())
            .map(|row| row.value.as_slice())
    }

    pub fn current_version(&self, key: &str) -> Option<u64> {
        self.keys
            .get(key)
            .and_then(|rows| rows.last())
            .map(|row| row.seq)
    }

    /// Every committed version of `key`, oldest first.
    pub fn versions(&self, key: &str) -> &[VersionRow] {
        self.keys.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Loads a snapshot written by [`MemoryLedger::save_snapshot`]; a missing
    /// or blank file yields an empty ledger.
    pub fn load_snapshot(path: &Path) -> Result<Self, LedgerError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        let doc: SnapshotIn = serde_json::from_str(&raw)?;
        if doc.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(LedgerError::SnapshotVersion {
                found: doc.schema_version.0,
            });
        }
        Ok(doc.ledger)
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_vec_pretty(&SnapshotOut {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            ledger: self,
        })?;
        let mut tmp = path.to_path_buf();
        tmp.set_extension("tmp");
        fs::write(&tmp, serialized)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    schema_version: SchemaVersion,
    ledger: &'a MemoryLedger,
}

#[derive(Deserialize)]
struct SnapshotIn {
    schema_version: SchemaVersion,
    ledger: MemoryLedger,
}

/// [`ChaincodeStub`] over one transaction simulated against a [`MemoryLedger`].
#[derive(Debug)]
pub struct MemoryTxStub<'a> {
    ledger: &'a MemoryLedger,
    tx_id: String,
    creator: Option<SignedCreator>,
    timestamp: MonotonicTimeNs,
    reads: BTreeMap<String, Option<u64>>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl MemoryTxStub<'_> {
    pub fn pending_writes(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.writes
    }

    pub fn into_rw_set(self) -> TxRwSet {
        TxRwSet {
            tx_id: self.tx_id,
            timestamp: self.timestamp,
            reads: self.reads,
            writes: self.writes,
        }
    }
}

fn require_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        return Err(LedgerError::EmptyKey);
    }
    Ok(())
}

impl ChaincodeStub for MemoryTxStub<'_> {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn creator(&self) -> Option<&SignedCreator> {
        self.creator.as_ref()
    }

    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        require_key(key)?;
        let version = self.ledger.current_version(key);
        self.reads.entry(key.to_string()).or_insert(version);
        Ok(self.ledger.current_value(key).map(<[u8]>::to_vec))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        require_key(key)?;
        self.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn history_for_key(&mut self, key: &str) -> Result<HistoryIter<'_>, LedgerError> {
        require_key(key)?;
        let rows = self.ledger.versions(key);
        let prior = rows.len().saturating_sub(1);
        Ok(Box::new(rows[..prior].iter().rev().map(|row| {
            Ok(KeyModification {
                tx_id: row.tx_id.clone(),
                value: row.value.clone(),
                timestamp: row.timestamp,
                is_delete: false,
            })
        })))
    }
}

mod value_b64 {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&BASE64.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(d)?;
        BASE64
            .decode(raw.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
