#![forbid(unsafe_code)]

use cartracker_contracts::MonotonicTimeNs;

/// Failures reported by the ledger collaborator.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger backend failure: {0}")]
    Backend(String),
    #[error("ledger key must not be empty")]
    EmptyKey,
    #[error("MVCC read conflict on key '{key}'")]
    MvccReadConflict { key: String },
    #[error("ledger snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger snapshot json error: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("ledger snapshot schema version {found} is not supported")]
    SnapshotVersion { found: u32 },
}

/// Transaction submitter as attested by the hosting runtime.
///
/// Certificate verification happens upstream; only the MSP id and the issuer
/// common name of the already-verified certificate are carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCreator {
    pub msp_id: String,
    pub certificate_issuer_cn: Option<String>,
}

impl SignedCreator {
    pub fn new(msp_id: impl Into<String>, certificate_issuer_cn: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            certificate_issuer_cn: Some(certificate_issuer_cn.into()),
        }
    }
}

/// One committed version of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub value: Vec<u8>,
    pub timestamp: MonotonicTimeNs,
    pub is_delete: bool,
}

pub type HistoryIter<'a> = Box<dyn Iterator<Item = Result<KeyModification, LedgerError>> + 'a>;

/// Per-invocation view of the ledger handed to chaincode by the host.
pub trait ChaincodeStub {
    fn tx_id(&self) -> &str;

    fn creator(&self) -> Option<&SignedCreator>;

    /// Committed value of `key`; pending writes of this transaction are not visible.
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Committed versions that precede the current value of `key`, most recent first.
    fn history_for_key(&mut self, key: &str) -> Result<HistoryIter<'_>, LedgerError>;
}
