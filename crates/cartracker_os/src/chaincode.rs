#![forbid(unsafe_code)]

use cartracker_contracts::access::{CallerIdentity, OrgRole};
use cartracker_contracts::car::{Car, Repair, Vin};
use cartracker_contracts::invocation::{CarTrackerFunction, CarTrackerRequest, Response};
use cartracker_contracts::ContractViolation;
use cartracker_storage::repo::{CarRepo, StorageError};
use cartracker_storage::stub::{ChaincodeStub, LedgerError};

use crate::config::{CarTrackerConfig, CreatePolicy};
use crate::identity::{IdentityError, IdentityResolver};

/// Ledger or identity backend failure.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorFailure {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("error extracting creator identity info: {0}")]
    Identity(#[from] IdentityError),
}

#[derive(Debug, thiserror::Error)]
pub enum ChaincodeError {
    #[error("Caller not a member of {role} Org. Access denied.")]
    AuthorizationDenied { role: OrgRole },
    #[error("Car with VIN {vin} not found.")]
    RecordNotFound { vin: String },
    #[error("Car with VIN {vin} already exists.")]
    AlreadyExists { vin: Vin },
    #[error("Incorrect number of arguments. Expecting {expected}")]
    MalformedArgumentCount {
        function: CarTrackerFunction,
        expected: usize,
        got: usize,
    },
    #[error("Invalid argument for {function}: {violation}")]
    MalformedArgument {
        function: CarTrackerFunction,
        violation: ContractViolation,
    },
    #[error("{source}")]
    DeserializationFailure {
        vin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{source}")]
    EncodingFailure {
        vin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    CollaboratorFailure(#[from] CollaboratorFailure),
    #[error("Invalid chaincode function name.")]
    UnknownOperation { name: String },
}

impl From<StorageError> for ChaincodeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Ledger(err) => ChaincodeError::CollaboratorFailure(err.into()),
            StorageError::Decode { key, source } => {
                ChaincodeError::DeserializationFailure { vin: key, source }
            }
            StorageError::Encode { key, source } => {
                ChaincodeError::EncodingFailure { vin: key, source }
            }
        }
    }
}

impl From<IdentityError> for ChaincodeError {
    fn from(err: IdentityError) -> Self {
        ChaincodeError::CollaboratorFailure(err.into())
    }
}

impl ChaincodeError {
    fn from_violation(
        function: CarTrackerFunction,
        args: &[String],
        violation: ContractViolation,
    ) -> Self {
        match violation {
            // An empty id cannot name a stored car; only createCar, which would
            // write under it, reports it as a malformed argument.
            ContractViolation::InvalidValue { field: "car.vin", .. }
                if function != CarTrackerFunction::CreateCar =>
            {
                ChaincodeError::RecordNotFound {
                    vin: args.first().cloned().unwrap_or_default(),
                }
            }
            ContractViolation::InvalidArity { expected, got, .. } => {
                ChaincodeError::MalformedArgumentCount {
                    function,
                    expected,
                    got,
                }
            }
            violation => ChaincodeError::MalformedArgument {
                function,
                violation,
            },
        }
    }
}

/// Car tracker handler set: access gate, record mutation and queries.
///
/// Every invocation reloads the record from the stub; nothing is cached
/// between invocations.
#[derive(Debug, Clone)]
pub struct CarTrackerChaincode<R>
where
    R: IdentityResolver,
{
    config: CarTrackerConfig,
    identity: R,
}

impl<R> CarTrackerChaincode<R>
where
    R: IdentityResolver,
{
    pub fn new(config: CarTrackerConfig, identity: R) -> Self {
        Self { config, identity }
    }

    pub fn init<S>(&self, _stub: &mut S) -> Response
    where
        S: ChaincodeStub + ?Sized,
    {
        Response::empty()
    }

    pub fn invoke<S>(&self, stub: &mut S, function: &str, args: &[String]) -> Response
    where
        S: ChaincodeStub + ?Sized,
    {
        tracing::info!(tx_id = %stub.tx_id(), function, "car tracker invoke");
        match self.dispatch(stub, function, args) {
            Ok(payload) => Response::success(payload),
            Err(err) => {
                tracing::warn!(tx_id = %stub.tx_id(), function, error = %err, "invoke failed");
                Response::error(err.to_string())
            }
        }
    }

    /// Routes one invocation. Gated functions pass the access gate before
    /// their arguments are even parsed.
    pub fn dispatch<S>(
        &self,
        stub: &mut S,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, ChaincodeError>
    where
        S: ChaincodeStub + ?Sized,
    {
        let function =
            CarTrackerFunction::parse(function).ok_or_else(|| ChaincodeError::UnknownOperation {
                name: function.to_string(),
            })?;
        let caller = match function.required_role() {
            Some(role) => Some(self.authorize_caller(stub, role)?),
            None => None,
        };
        let request = CarTrackerRequest::from_args(function, args, caller.as_ref())
            .map_err(|v| ChaincodeError::from_violation(function, args, v))?;

        match request {
            CarTrackerRequest::CreateCar {
                vin,
                make,
                model,
                colour,
                owner,
                manufacturing_date,
            } => {
                let car = Car::v1(vin, make, model, colour, owner, manufacturing_date);
                self.create_car(stub, car)?;
                Ok(Vec::new())
            }
            CarTrackerRequest::ChangeCarOwner { vin, new_owner } => {
                self.change_car_owner(stub, &vin, new_owner)?;
                Ok(Vec::new())
            }
            CarTrackerRequest::AddRepairWork { vin, repair } => {
                self.add_repair_work(stub, &vin, repair)?;
                Ok(Vec::new())
            }
            CarTrackerRequest::QueryCar { vin } => self.query_car(stub, &vin),
            CarTrackerRequest::GetCarHistory { vin } => self.get_car_history(stub, &vin),
            CarTrackerRequest::InitLedger | CarTrackerRequest::QueryAllCars => Ok(Vec::new()),
        }
    }

    fn authorize_caller<S>(&self, stub: &S, role: OrgRole) -> Result<CallerIdentity, ChaincodeError>
    where
        S: ChaincodeStub + ?Sized,
    {
        let caller = self.identity.resolve(stub)?;
        tracing::info!(
            org = %caller.org_id,
            issuer = %caller.cert_issuer_cn,
            "car tracker invoke by"
        );
        if !caller.holds(role) {
            tracing::warn!(org = %caller.org_id, required = %role, "access denied");
            return Err(ChaincodeError::AuthorizationDenied { role });
        }
        Ok(caller)
    }

    /// Writes a fresh record. Under [`CreatePolicy::Overwrite`] an existing
    /// record at the same VIN is replaced, repairs included.
    pub fn create_car<S>(&self, stub: &mut S, car: Car) -> Result<(), ChaincodeError>
    where
        S: ChaincodeStub + ?Sized,
    {
        if self.config.create_policy == CreatePolicy::RejectExisting
            && stub.car_bytes(&car.vin)?.is_some()
        {
            return Err(ChaincodeError::AlreadyExists { vin: car.vin });
        }
        stub.store_car(&car)?;
        Ok(())
    }

    pub fn change_car_owner<S>(
        &self,
        stub: &mut S,
        vin: &Vin,
        new_owner: String,
    ) -> Result<(), ChaincodeError>
    where
        S: ChaincodeStub + ?Sized,
    {
        let car = require_car(stub, vin)?;
        stub.store_car(&car.with_owner(new_owner))?;
        Ok(())
    }

    pub fn add_repair_work<S>(
        &self,
        stub: &mut S,
        vin: &Vin,
        repair: Repair,
    ) -> Result<(), ChaincodeError>
    where
        S: ChaincodeStub + ?Sized,
    {
        let car = require_car(stub, vin)?;
        stub.store_car(&car.with_repair(repair))?;
        Ok(())
    }

    pub fn query_car<S>(&self, stub: &mut S, vin: &Vin) -> Result<Vec<u8>, ChaincodeError>
    where
        S: ChaincodeStub + ?Sized,
    {
        stub.car_bytes(vin)?
            .ok_or_else(|| ChaincodeError::RecordNotFound {
                vin: vin.to_string(),
            })
    }

    /// Returns only the version immediately preceding the current one, or an
    /// empty payload when the car has never been rewritten. Older versions
    /// are never returned; callers wanting a full audit trail must read the
    /// ledger history themselves.
    pub fn get_car_history<S>(&self, stub: &mut S, vin: &Vin) -> Result<Vec<u8>, ChaincodeError>
    where
        S: ChaincodeStub + ?Sized,
    {
        if stub.car_bytes(vin)?.is_none() {
            return Err(ChaincodeError::RecordNotFound {
                vin: vin.to_string(),
            });
        }
        let prior = stub.prior_car_bytes(vin)?.unwrap_or_default();
        tracing::debug!(vin = %vin, bytes = prior.len(), "returning prior car version");
        Ok(prior)
    }
}

fn require_car<S>(stub: &mut S, vin: &Vin) -> Result<Car, ChaincodeError>
where
    S: ChaincodeStub + ?Sized,
{
    stub.load_car(vin)?
        .ok_or_else(|| ChaincodeError::RecordNotFound {
            vin: vin.to_string(),
        })
}
