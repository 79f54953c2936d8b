//! Portal roles.
//!
//! One canonical enum for every portal. The wire form is snake_case; the
//! hyphenated spellings used by some dashboard routes are accepted as aliases.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::AjayError;

/// A portal role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Central,
    State,
    Block,
    Agency,
    #[serde(alias = "field-officer")]
    FieldOfficer,
    #[serde(alias = "iva-officer")]
    IvaOfficer,
}

impl Role {
    /// Roles a broadcast can be addressed to.
    pub const RECIPIENTS: [Role; 4] = [Role::State, Role::Block, Role::Agency, Role::FieldOfficer];

    /// Convert to the canonical string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Central => "central",
            Self::State => "state",
            Self::Block => "block",
            Self::Agency => "agency",
            Self::FieldOfficer => "field_officer",
            Self::IvaOfficer => "iva_officer",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Central => "Central Ministry",
            Self::State => "State",
            Self::Block => "Block",
            Self::Agency => "Agency",
            Self::FieldOfficer => "Field Officer",
            Self::IvaOfficer => "IVA Officer",
        }
    }
}

impl FromStr for Role {
    type Err = AjayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "central" => Ok(Self::Central),
            "state" => Ok(Self::State),
            "block" => Ok(Self::Block),
            "agency" => Ok(Self::Agency),
            "field_officer" => Ok(Self::FieldOfficer),
            "iva_officer" => Ok(Self::IvaOfficer),
            _ => Err(AjayError::UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recipient tag of a stored broadcast.
///
/// Tags this build does not know are kept verbatim so they survive a rewrite;
/// they match no viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recipient {
    Role(Role),
    Unknown(String),
}

impl Recipient {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Role(role) => role.as_str(),
            Self::Unknown(tag) => tag,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Role(role) => role.label(),
            Self::Unknown(tag) => tag,
        }
    }
}

impl From<Role> for Recipient {
    fn from(role: Role) -> Self {
        Self::Role(role)
    }
}

impl PartialEq<Role> for Recipient {
    fn eq(&self, other: &Role) -> bool {
        matches!(self, Self::Role(role) if role == other)
    }
}

impl Serialize for Recipient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Recipient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.parse::<Role>() {
            Ok(role) => Self::Role(role),
            Err(_) => {
                warn!(tag = %tag, "Unknown recipient tag in stored broadcast");
                Self::Unknown(tag)
            }
        })
    }
}

/// Recipient checkboxes of the broadcast composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipientSelection {
    pub state: bool,
    pub block: bool,
    pub agency: bool,
    pub field_officer: bool,
}

impl Default for RecipientSelection {
    fn default() -> Self {
        Self {
            state: true,
            block: true,
            agency: true,
            field_officer: true,
        }
    }
}

impl RecipientSelection {
    /// Nothing selected.
    pub fn none() -> Self {
        Self {
            state: false,
            block: false,
            agency: false,
            field_officer: false,
        }
    }

    /// Select exactly the given roles. Non-recipient roles are ignored.
    pub fn only(roles: &[Role]) -> Self {
        let mut selection = Self::none();
        for role in roles {
            selection.set(*role, true);
        }
        selection
    }

    pub fn is_selected(&self, role: Role) -> bool {
        match role {
            Role::State => self.state,
            Role::Block => self.block,
            Role::Agency => self.agency,
            Role::FieldOfficer => self.field_officer,
            Role::Central | Role::IvaOfficer => false,
        }
    }

    pub fn set(&mut self, role: Role, selected: bool) {
        match role {
            Role::State => self.state = selected,
            Role::Block => self.block = selected,
            Role::Agency => self.agency = selected,
            Role::FieldOfficer => self.field_officer = selected,
            Role::Central | Role::IvaOfficer => {}
        }
    }

    /// Selected roles in canonical order.
    pub fn roles(&self) -> Vec<Role> {
        Role::RECIPIENTS
            .into_iter()
            .filter(|role| self.is_selected(*role))
            .collect()
    }
}
