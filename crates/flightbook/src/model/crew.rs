//! Aircraft owner and pilot records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of identity document the owner is registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    /// Citizen id card (cédula de ciudadanía).
    #[serde(rename = "CC")]
    Cc,
    /// Company tax id.
    #[serde(rename = "NIT")]
    Nit,
}

impl std::fmt::Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cc => write!(f, "CC"),
            Self::Nit => write!(f, "NIT"),
        }
    }
}

impl std::str::FromStr for IdType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CC" => Ok(Self::Cc),
            "NIT" => Ok(Self::Nit),
            other => Err(format!("unknown id type: {other}")),
        }
    }
}

/// The registered aircraft owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    /// Database id (assigned by storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Person or company name.
    pub name: String,
    /// Document type.
    pub id_type: IdType,
    /// Document number.
    pub id_num: String,
}

/// A licensed pilot who can be assigned to a flight crew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pilot {
    /// Database id (assigned by storage layer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Full name.
    pub name: String,
    /// National id number, unique.
    pub cc: String,
    /// License number.
    pub license_num: String,
    /// License category.
    pub license_type: String,
    /// When the license stops being valid.
    pub license_expiry: DateTime<Utc>,
}

impl Pilot {
    /// Whether the license is still valid at the given moment.
    #[must_use]
    pub fn is_license_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.license_expiry > at
    }

    /// Pilots whose license is valid at the given moment.
    pub fn eligible(pilots: &[Pilot], at: DateTime<Utc>) -> impl Iterator<Item = &Pilot> {
        pilots.iter().filter(move |p| p.is_license_valid_at(at))
    }
}
