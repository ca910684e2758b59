//! Asset type classification for IP addresses
//!
//! The stored value set is closed; older exports used `IPMI_ILO` for BMC
//! controllers and those spellings still normalize on the way in.

use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of an IP address
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    DeriveActiveEnum,
    EnumIter,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum IpAssetType {
    /// Operating system address of a physical or virtual server
    #[sea_orm(string_value = "OS")]
    Os,

    /// Baseboard management controller (iLO, iDRAC, generic IPMI)
    #[sea_orm(string_value = "BMC")]
    Bmc,

    /// Virtual machine guest address
    #[sea_orm(string_value = "VM")]
    Vm,

    /// Floating/virtual service address
    #[sea_orm(string_value = "VIP")]
    Vip,

    /// Anything that does not fit the other buckets
    #[default]
    #[sea_orm(string_value = "OTHER")]
    Other,
}

/// Returned when a string does not name a known asset type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown asset type '{0}'")]
pub struct UnknownAssetType(pub String);

impl IpAssetType {
    /// Stored/displayed string form
    pub fn as_str(&self) -> &'static str {
        match self {
            IpAssetType::Os => "OS",
            IpAssetType::Bmc => "BMC",
            IpAssetType::Vm => "VM",
            IpAssetType::Vip => "VIP",
            IpAssetType::Other => "OTHER",
        }
    }

    /// Parse a stored or imported value, accepting legacy aliases.
    pub fn normalize(value: &str) -> Result<Self, UnknownAssetType> {
        match value.trim() {
            "OS" => Ok(IpAssetType::Os),
            "BMC" => Ok(IpAssetType::Bmc),
            "VM" => Ok(IpAssetType::Vm),
            "VIP" => Ok(IpAssetType::Vip),
            "OTHER" => Ok(IpAssetType::Other),
            "IPMI_ILO" | "IPMI_iLO" => Ok(IpAssetType::Bmc),
            other => Err(UnknownAssetType(other.to_string())),
        }
    }

    /// All stored values, in display order
    pub fn all() -> [IpAssetType; 5] {
        [
            IpAssetType::Os,
            IpAssetType::Bmc,
            IpAssetType::Vm,
            IpAssetType::Vip,
            IpAssetType::Other,
        ]
    }
}

impl std::fmt::Display for IpAssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IpAssetType {
    type Err = UnknownAssetType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_stored_values() {
        assert_eq!(IpAssetType::Os.to_string(), "OS");
        assert_eq!(IpAssetType::Bmc.to_string(), "BMC");
        assert_eq!(IpAssetType::Vm.to_string(), "VM");
        assert_eq!(IpAssetType::Vip.to_string(), "VIP");
        assert_eq!(IpAssetType::Other.to_string(), "OTHER");
    }

    #[test]
    fn test_normalize_accepts_stored_values() {
        for asset_type in IpAssetType::all() {
            assert_eq!(
                IpAssetType::normalize(asset_type.as_str()).unwrap(),
                asset_type
            );
        }
    }

    #[test]
    fn test_normalize_accepts_legacy_aliases() {
        assert_eq!(IpAssetType::normalize("IPMI_ILO").unwrap(), IpAssetType::Bmc);
        assert_eq!(IpAssetType::normalize("IPMI_iLO").unwrap(), IpAssetType::Bmc);
    }

    #[test]
    fn test_normalize_rejects_unknown_values() {
        assert!(IpAssetType::normalize("SERVER").is_err());
        assert!(IpAssetType::normalize("os").is_err());
        assert!(IpAssetType::normalize("").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        assert_eq!(serde_json::to_string(&IpAssetType::Bmc).unwrap(), "\"BMC\"");
        assert_eq!(
            serde_json::from_str::<IpAssetType>("\"VIP\"").unwrap(),
            IpAssetType::Vip
        );
    }
}
