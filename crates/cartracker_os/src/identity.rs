#![forbid(unsafe_code)]

use cartracker_contracts::access::CallerIdentity;
use cartracker_contracts::ContractViolation;
use cartracker_storage::stub::ChaincodeStub;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("transaction carries no creator")]
    MissingCreator,
    #[error("creator has no x509 certificate issuer")]
    MissingCertificate,
    #[error("invalid creator identity: {0}")]
    Invalid(#[from] ContractViolation),
}

/// Resolves who submitted the current transaction.
pub trait IdentityResolver {
    fn resolve<S>(&self, stub: &S) -> Result<CallerIdentity, IdentityError>
    where
        S: ChaincodeStub + ?Sized;
}

/// Reads the creator attested by the hosting runtime on the transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreatorIdentityResolver;

impl IdentityResolver for CreatorIdentityResolver {
    fn resolve<S>(&self, stub: &S) -> Result<CallerIdentity, IdentityError>
    where
        S: ChaincodeStub + ?Sized,
    {
        let creator = stub.creator().ok_or(IdentityError::MissingCreator)?;
        let issuer = creator
            .certificate_issuer_cn
            .as_deref()
            .ok_or(IdentityError::MissingCertificate)?;
        Ok(CallerIdentity::new(creator.msp_id.as_str(), issuer)?)
    }
}

/// Always answers with the same identity, whatever the transaction says.
/// Lets handler logic run without identity infrastructure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentityResolver {
    identity: CallerIdentity,
}

impl FixedIdentityResolver {
    pub fn new(identity: CallerIdentity) -> Self {
        Self { identity }
    }
}

impl IdentityResolver for FixedIdentityResolver {
    fn resolve<S>(&self, _stub: &S) -> Result<CallerIdentity, IdentityError>
    where
        S: ChaincodeStub + ?Sized,
    {
        Ok(self.identity.clone())
    }
}
