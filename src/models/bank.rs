use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// The license classes whose question pools we mirror.
///
/// Each bank maps to exactly one remote pool and one cache file; the
/// lowercase form from [`BankName::as_str`] is the key for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankName {
    Technician,
    General,
    Extra,
}

impl BankName {
    /// All known banks, in license order.
    pub const ALL: [BankName; 3] = [BankName::Technician, BankName::General, BankName::Extra];

    pub fn as_str(&self) -> &'static str {
        match self {
            BankName::Technician => "technician",
            BankName::General => "general",
            BankName::Extra => "extra",
        }
    }
}

impl fmt::Display for BankName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BankName {
    type Err = SyncError;

    /// Bank names are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "technician" => Ok(BankName::Technician),
            "general" => Ok(BankName::General),
            "extra" => Ok(BankName::Extra),
            _ => Err(SyncError::UnknownName(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("technician".parse::<BankName>().unwrap(), BankName::Technician);
        assert_eq!("General".parse::<BankName>().unwrap(), BankName::General);
        assert_eq!("EXTRA".parse::<BankName>().unwrap(), BankName::Extra);
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "novice".parse::<BankName>().unwrap_err();
        assert!(matches!(err, SyncError::UnknownName(name) if name == "novice"));
    }

    #[test]
    fn test_as_str_is_lowercase() {
        for bank in BankName::ALL {
            assert_eq!(bank.as_str(), bank.as_str().to_lowercase());
        }
    }
}
