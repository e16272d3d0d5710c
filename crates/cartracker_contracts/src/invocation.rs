#![forbid(unsafe_code)]

use crate::access::{CallerIdentity, OrgRole};
use crate::car::{Repair, Vin};
use crate::ContractViolation;

pub const STATUS_OK: i32 = 200;
pub const STATUS_ERROR: i32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarTrackerFunction {
    CreateCar,
    ChangeCarOwner,
    AddRepairWork,
    QueryCar,
    GetCarHistory,
    InitLedger,
    QueryAllCars,
}

impl CarTrackerFunction {
    pub const ALL: [CarTrackerFunction; 7] = [
        CarTrackerFunction::CreateCar,
        CarTrackerFunction::ChangeCarOwner,
        CarTrackerFunction::AddRepairWork,
        CarTrackerFunction::QueryCar,
        CarTrackerFunction::GetCarHistory,
        CarTrackerFunction::InitLedger,
        CarTrackerFunction::QueryAllCars,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CarTrackerFunction::CreateCar => "createCar",
            CarTrackerFunction::ChangeCarOwner => "changeCarOwner",
            CarTrackerFunction::AddRepairWork => "addRepairWork",
            CarTrackerFunction::QueryCar => "queryCar",
            CarTrackerFunction::GetCarHistory => "getCarHistory",
            CarTrackerFunction::InitLedger => "initLedger",
            CarTrackerFunction::QueryAllCars => "queryAllCars",
        }
    }

    /// Organisation a caller must belong to; `None` for public operations.
    pub fn required_role(self) -> Option<OrgRole> {
        match self {
            CarTrackerFunction::CreateCar => Some(OrgRole::Manufacturer),
            CarTrackerFunction::ChangeCarOwner => Some(OrgRole::CarRegistrationAuthority),
            CarTrackerFunction::AddRepairWork => Some(OrgRole::Insurance),
            CarTrackerFunction::QueryCar
            | CarTrackerFunction::GetCarHistory
            | CarTrackerFunction::InitLedger
            | CarTrackerFunction::QueryAllCars => None,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            CarTrackerFunction::CreateCar => 6,
            CarTrackerFunction::ChangeCarOwner => 2,
            CarTrackerFunction::AddRepairWork => 4,
            CarTrackerFunction::QueryCar | CarTrackerFunction::GetCarHistory => 1,
            CarTrackerFunction::InitLedger | CarTrackerFunction::QueryAllCars => 0,
        }
    }
}

impl std::fmt::Display for CarTrackerFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed form of a positional-argument invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarTrackerRequest {
    CreateCar {
        vin: Vin,
        make: String,
        model: String,
        colour: String,
        owner: String,
        manufacturing_date: String,
    },
    ChangeCarOwner {
        vin: Vin,
        new_owner: String,
    },
    /// The third positional argument (claimed insurer) is accepted and dropped;
    /// the repair is attributed to the caller's organisation.
    AddRepairWork {
        vin: Vin,
        repair: Repair,
    },
    QueryCar {
        vin: Vin,
    },
    GetCarHistory {
        vin: Vin,
    },
    InitLedger,
    QueryAllCars,
}

impl CarTrackerRequest {
    /// `caller` is the identity that passed the access gate. `addRepairWork`
    /// is refused without one, since the repair is attributed to it.
    pub fn from_args(
        function: CarTrackerFunction,
        args: &[String],
        caller: Option<&CallerIdentity>,
    ) -> Result<Self, ContractViolation> {
        if args.len() != function.arity() {
            return Err(ContractViolation::InvalidArity {
                field: "invocation.args",
                expected: function.arity(),
                got: args.len(),
            });
        }
        let request = match function {
            CarTrackerFunction::CreateCar => CarTrackerRequest::CreateCar {
                vin: Vin::new(args[0].as_str())?,
                make: args[1].clone(),
                model: args[2].clone(),
                colour: args[3].clone(),
                owner: args[4].clone(),
                manufacturing_date: args[5].clone(),
            },
            CarTrackerFunction::ChangeCarOwner => CarTrackerRequest::ChangeCarOwner {
                vin: Vin::new(args[0].as_str())?,
                new_owner: args[1].clone(),
            },
            CarTrackerFunction::AddRepairWork => {
                let vin = Vin::new(args[0].as_str())?;
                let caller = caller.ok_or(ContractViolation::InvalidValue {
                    field: "invocation.caller",
                    reason: "repair requires a verified caller",
                })?;
                CarTrackerRequest::AddRepairWork {
                    vin,
                    repair: Repair::new(
                        args[1].as_str(),
                        caller.org_id.as_str(),
                        args[3].as_str(),
                    ),
                }
            }
            CarTrackerFunction::QueryCar => CarTrackerRequest::QueryCar {
                vin: Vin::new(args[0].as_str())?,
            },
            CarTrackerFunction::GetCarHistory => CarTrackerRequest::GetCarHistory {
                vin: Vin::new(args[0].as_str())?,
            },
            CarTrackerFunction::InitLedger => CarTrackerRequest::InitLedger,
            CarTrackerFunction::QueryAllCars => CarTrackerRequest::QueryAllCars,
        };
        Ok(request)
    }

    pub fn function(&self) -> CarTrackerFunction {
        match self {
            CarTrackerRequest::CreateCar { .. } => CarTrackerFunction::CreateCar,
            CarTrackerRequest::ChangeCarOwner { .. } => CarTrackerFunction::ChangeCarOwner,
            CarTrackerRequest::AddRepairWork { .. } => CarTrackerFunction::AddRepairWork,
            CarTrackerRequest::QueryCar { .. } => CarTrackerFunction::QueryCar,
            CarTrackerRequest::GetCarHistory { .. } => CarTrackerFunction::GetCarHistory,
            CarTrackerRequest::InitLedger => CarTrackerFunction::InitLedger,
            CarTrackerRequest::QueryAllCars => CarTrackerFunction::QueryAllCars,
        }
    }
}

/// Outcome handed back to the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: STATUS_OK,
            message: String::new(),
            payload,
        }
    }

    pub fn empty() -> Self {
        Self::success(Vec::new())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
