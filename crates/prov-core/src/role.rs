//! User roles and the permissions they imply.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseEnumError;

/// Role attached to a user profile.
///
/// Roles gate write operations: only manufacturers create and mutate
/// products; manufacturers and retailers create and complete orders;
/// consumers only read and verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Consumer,
    Manufacturer,
    Retailer,
}

impl UserRole {
    /// All valid roles, for validation error messages.
    pub const ALL: [UserRole; 3] = [Self::Consumer, Self::Manufacturer, Self::Retailer];

    /// The wire/store representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consumer => "consumer",
            Self::Manufacturer => "manufacturer",
            Self::Retailer => "retailer",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumer" => Ok(Self::Consumer),
            "manufacturer" => Ok(Self::Manufacturer),
            "retailer" => Ok(Self::Retailer),
            other => Err(ParseEnumError::new("user role", other)),
        }
    }
}
