#![forbid(unsafe_code)]

use std::env;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use cartracker_contracts::access::OrgRole;
use cartracker_contracts::MonotonicTimeNs;
use cartracker_os::chaincode::CarTrackerChaincode;
use cartracker_os::config::CarTrackerConfig;
use cartracker_os::identity::CreatorIdentityResolver;
use cartracker_os::runtime::{LocalPeer, TxProposal};
use cartracker_storage::memory::MemoryLedger;
use cartracker_storage::stub::SignedCreator;
use clap::{Parser, Subcommand};

pub const ENV_LEDGER_PATH: &str = "CARTRACKER_LEDGER_PATH";
pub const DEFAULT_LEDGER_FILE: &str = "cartracker-ledger.json";

/// Run car tracker transactions against a local ledger snapshot.
#[derive(Debug, Parser)]
#[command(name = "cartracker")]
pub struct Cli {
    /// Ledger snapshot file (defaults to $CARTRACKER_LEDGER_PATH, then ./cartracker-ledger.json)
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit one transaction and commit it when it succeeds.
    Invoke {
        /// Act as a member of this organisation (manufacturer, dealership,
        /// insurance, cra, buyer)
        #[arg(long = "as", conflicts_with_all = ["msp", "issuer"])]
        role: Option<String>,

        /// Creator MSP id
        #[arg(long, requires = "issuer")]
        msp: Option<String>,

        /// Issuer common name of the creator certificate
        #[arg(long, requires = "msp")]
        issuer: Option<String>,

        function: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List keys present in the ledger.
    Keys,
}

pub fn default_ledger_path() -> PathBuf {
    env::var(ENV_LEDGER_PATH)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE))
}

pub fn resolve_creator(
    role: Option<&str>,
    msp: Option<&str>,
    issuer: Option<&str>,
) -> Result<Option<SignedCreator>, String> {
    if let Some(raw) = role {
        let role = OrgRole::parse(raw).ok_or_else(|| {
            format!(
                "unknown organisation '{raw}'. expected one of: manufacturer, dealership, insurance, cra, buyer"
            )
        })?;
        return Ok(Some(SignedCreator::new(role.msp_id(), role.ca_common_name())));
    }
    match (msp, issuer) {
        (Some(msp), Some(issuer)) => Ok(Some(SignedCreator::new(msp, issuer))),
        (None, None) => Ok(None),
        _ => Err("--msp and --issuer must be given together".to_string()),
    }
}

pub fn execute_invoke(
    ledger_path: &Path,
    config: CarTrackerConfig,
    creator: Option<SignedCreator>,
    function: &str,
    args: Vec<String>,
) -> Result<String, String> {
    let ledger = MemoryLedger::load_snapshot(ledger_path)
        .map_err(|e| format!("failed to load ledger: {e}"))?;
    let mut peer = LocalPeer::new(
        ledger,
        CarTrackerChaincode::new(config, CreatorIdentityResolver),
    );
    let outcome = peer.submit(&TxProposal::v1(creator, function, args, now_ns()));
    if outcome.committed_seq.is_some() {
        peer.ledger()
            .save_snapshot(ledger_path)
            .map_err(|e| format!("failed to save ledger: {e}"))?;
    }
    tracing::info!(
        tx_id = %outcome.tx_id,
        committed = ?outcome.committed_seq,
        status = outcome.response.status,
        "transaction finished"
    );
    if !outcome.response.is_ok() {
        return Err(outcome.response.message);
    }
    Ok(String::from_utf8_lossy(&outcome.response.payload).into_owned())
}

pub fn execute_keys(ledger_path: &Path) -> Result<String, String> {
    let ledger = MemoryLedger::load_snapshot(ledger_path)
        .map_err(|e| format!("failed to load ledger: {e}"))?;
    Ok(ledger.keys().collect::<Vec<_>>().join("\n"))
}

fn now_ns() -> MonotonicTimeNs {
    let ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(1);
    MonotonicTimeNs(ns)
}
