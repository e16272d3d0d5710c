#![forbid(unsafe_code)]

use cartracker_contracts::invocation::Response;
use cartracker_contracts::MonotonicTimeNs;
use cartracker_storage::memory::{MemoryLedger, TxRwSet};
use cartracker_storage::stub::SignedCreator;
use sha2::{Digest, Sha256};

use crate::chaincode::CarTrackerChaincode;
use crate::identity::IdentityResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxProposal {
    pub creator: Option<SignedCreator>,
    pub function: String,
    pub args: Vec<String>,
    pub timestamp: MonotonicTimeNs,
}

impl TxProposal {
    pub fn v1(
        creator: Option<SignedCreator>,
        function: impl Into<String>,
        args: Vec<String>,
        timestamp: MonotonicTimeNs,
    ) -> Self {
        Self {
            creator,
            function: function.into(),
            args,
            timestamp,
        }
    }
}

/// Simulated, not yet committed, transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endorsement {
    pub tx_id: String,
    pub response: Response,
    pub rw_set: TxRwSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_id: String,
    pub response: Response,
    pub committed_seq: Option<u64>,
}

/// Drives chaincode against a [`MemoryLedger`]: simulate, then commit the
/// write set only when the handler succeeded.
#[derive(Debug)]
pub struct LocalPeer<R>
where
    R: IdentityResolver,
{
    ledger: MemoryLedger,
    chaincode: CarTrackerChaincode<R>,
}

impl<R> LocalPeer<R>
where
    R: IdentityResolver,
{
    pub fn new(ledger: MemoryLedger, chaincode: CarTrackerChaincode<R>) -> Self {
        Self { ledger, chaincode }
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn endorse(&self, proposal: &TxProposal) -> Endorsement {
        let tx_id = derive_tx_id(self.ledger.last_seq(), proposal);
        let mut stub = self
            .ledger
            .begin(tx_id.clone(), proposal.creator.clone(), proposal.timestamp);
        let response = self
            .chaincode
            .invoke(&mut stub, &proposal.function, &proposal.args);
        Endorsement {
            tx_id,
            response,
            rw_set: stub.into_rw_set(),
        }
    }

    /// Failed or read-only endorsements are dropped without touching the ledger.
    pub fn commit(&mut self, endorsement: Endorsement) -> TxOutcome {
        let Endorsement {
            tx_id,
            response,
            rw_set,
        } = endorsement;
        if !response.is_ok() || rw_set.writes.is_empty() {
            return TxOutcome {
                tx_id,
                response,
                committed_seq: None,
            };
        }
        match self.ledger.commit(rw_set) {
            Ok(seq) => TxOutcome {
                tx_id,
                response,
                committed_seq: Some(seq),
            },
            Err(err) => TxOutcome {
                tx_id,
                response: Response::error(err.to_string()),
                committed_seq: None,
            },
        }
    }

    pub fn submit(&mut self, proposal: &TxProposal) -> TxOutcome {
        let endorsement = self.endorse(proposal);
        self.commit(endorsement)
    }
}

fn derive_tx_id(last_seq: u64, proposal: &TxProposal) -> String {
    let mut hasher = Sha256::new();
    hasher.update(last_seq.to_be_bytes());
    hasher.update(proposal.timestamp.0.to_be_bytes());
    if let Some(creator) = &proposal.creator {
        hasher.update(creator.msp_id.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(proposal.function.as_bytes());
    for arg in &proposal.args {
        hasher.update([0u8]);
        hasher.update(arg.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
