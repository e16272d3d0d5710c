#![forbid(unsafe_code)]

use serde::{Deserialize, Deserializer, Serialize};

use crate::common::validate_non_empty;
use crate::{ContractViolation, Validate};

/// Vehicle identification number; doubles as the ledger key of the car record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    pub fn new(vin: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(vin.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for Vin {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_non_empty("car.vin", &self.0)
    }
}

impl std::fmt::Display for Vin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One maintenance event. Immutable once appended to a car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repair {
    pub date: String,
    // Tag spelling is part of the stored format.
    #[serde(rename = "insurace_company")]
    pub insurance_company: String,
    pub details: String,
}

impl Repair {
    pub fn new(
        date: impl Into<String>,
        insurance_company: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            insurance_company: insurance_company.into(),
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    #[serde(rename = "VIN")]
    pub vin: Vin,
    pub make: String,
    pub model: String,
    pub colour: String,
    pub owner: String,
    pub manufacturing_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub repairs: Vec<Repair>,
}

impl Car {
    /// A freshly manufactured car with no repair history.
    pub fn v1(
        vin: Vin,
        make: String,
        model: String,
        colour: String,
        owner: String,
        manufacturing_date: String,
    ) -> Self {
        Self {
            vin,
            make,
            model,
            colour,
            owner,
            manufacturing_date,
            repairs: Vec::new(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_repair(mut self, repair: Repair) -> Self {
        self.repairs.push(repair);
        self
    }

    pub fn to_ledger_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_ledger_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Repair>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Repair>>::deserialize(deserializer)?.unwrap_or_default())
}
