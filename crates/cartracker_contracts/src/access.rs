#![forbid(unsafe_code)]

use std::fmt;

use crate::common::validate_non_empty;
use crate::{ContractViolation, Validate};

pub const MANUFACTURER_ORG_MSP: &str = "ManufacturerOrgMSP";
pub const MANUFACTURER_ORG_CA: &str = "ca.manufacturerorg.cartracker.com";
pub const DEALERSHIP_ORG_MSP: &str = "DealershipOrgMSP";
pub const DEALERSHIP_ORG_CA: &str = "ca.dealershiporg.cartracker.com";
pub const INSURANCE_ORG_MSP: &str = "InsuranceOrgMSP";
pub const INSURANCE_ORG_CA: &str = "ca.insuranceorg.cartracker.com";
pub const CAR_REGISTRATION_AUTHORITY_ORG_MSP: &str = "CarRegistrationAuthorityOrgMSP";
pub const CAR_REGISTRATION_AUTHORITY_ORG_CA: &str =
    "ca.carregistrationauthorityorg.cartracker.com";
pub const BUYER_ORG_MSP: &str = "BuyerOrgMSP";
pub const BUYER_ORG_CA: &str = "ca.buyerorg.cartracker.com";

/// Organisations participating in the car tracker network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgRole {
    Manufacturer,
    Dealership,
    Insurance,
    CarRegistrationAuthority,
    Buyer,
}

impl OrgRole {
    pub const ALL: [OrgRole; 5] = [
        OrgRole::Manufacturer,
        OrgRole::Dealership,
        OrgRole::Insurance,
        OrgRole::CarRegistrationAuthority,
        OrgRole::Buyer,
    ];

    pub fn msp_id(self) -> &'static str {
        match self {
            OrgRole::Manufacturer => MANUFACTURER_ORG_MSP,
            OrgRole::Dealership => DEALERSHIP_ORG_MSP,
            OrgRole::Insurance => INSURANCE_ORG_MSP,
            OrgRole::CarRegistrationAuthority => CAR_REGISTRATION_AUTHORITY_ORG_MSP,
            OrgRole::Buyer => BUYER_ORG_MSP,
        }
    }

    pub fn ca_common_name(self) -> &'static str {
        match self {
            OrgRole::Manufacturer => MANUFACTURER_ORG_CA,
            OrgRole::Dealership => DEALERSHIP_ORG_CA,
            OrgRole::Insurance => INSURANCE_ORG_CA,
            OrgRole::CarRegistrationAuthority => CAR_REGISTRATION_AUTHORITY_ORG_CA,
            OrgRole::Buyer => BUYER_ORG_CA,
        }
    }

    /// Human-readable name used in denial messages.
    pub fn display_name(self) -> &'static str {
        match self {
            OrgRole::Manufacturer => "Manufacturer",
            OrgRole::Dealership => "Dealership",
            OrgRole::Insurance => "Insurance",
            OrgRole::CarRegistrationAuthority => "Car Registration Authority",
            OrgRole::Buyer => "Buyer",
        }
    }

    /// Parses the short CLI/config spelling (`manufacturer`, `insurance`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "manufacturer" => Some(OrgRole::Manufacturer),
            "dealership" => Some(OrgRole::Dealership),
            "insurance" => Some(OrgRole::Insurance),
            "car_registration_authority" | "registration" | "cra" => {
                Some(OrgRole::CarRegistrationAuthority)
            }
            "buyer" => Some(OrgRole::Buyer),
            _ => None,
        }
    }

    /// Canonical identity of a member of this organisation.
    pub fn member_identity(self) -> CallerIdentity {
        CallerIdentity {
            org_id: self.msp_id().to_string(),
            cert_issuer_cn: self.ca_common_name().to_string(),
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Identity of the submitter of one invocation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity {
    pub org_id: String,
    pub cert_issuer_cn: String,
}

impl CallerIdentity {
    pub fn new(
        org_id: impl Into<String>,
        cert_issuer_cn: impl Into<String>,
    ) -> Result<Self, ContractViolation> {
        let identity = Self {
            org_id: org_id.into(),
            cert_issuer_cn: cert_issuer_cn.into(),
        };
        identity.validate()?;
        Ok(identity)
    }

    pub fn holds(&self, role: OrgRole) -> bool {
        authorize(
            &self.org_id,
            role.msp_id(),
            &self.cert_issuer_cn,
            role.ca_common_name(),
        )
    }
}

impl Validate for CallerIdentity {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_non_empty("caller_identity.org_id", &self.org_id)?;
        validate_non_empty("caller_identity.cert_issuer_cn", &self.cert_issuer_cn)?;
        Ok(())
    }
}

/// Exact, case-sensitive match on both the organisation and the issuer.
pub fn authorize(
    caller_org: &str,
    required_org: &str,
    caller_issuer: &str,
    required_issuer: &str,
) -> bool {
    caller_org == required_org && caller_issuer == required_issuer
}
