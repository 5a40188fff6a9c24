//! Member roles within a group.

use serde::{Deserialize, Serialize};

use super::error::MembershipError;

/// Role of a user inside one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Manages members and group settings.
    Admin,
    /// Records transactions.
    #[default]
    Member,
    /// Read-only access.
    Viewer,
}

impl MemberRole {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }

    /// Returns true if this role can add, remove, or re-role members.
    #[must_use]
    pub const fn can_manage_members(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role can record group transactions.
    #[must_use]
    pub const fn can_write_transactions(self) -> bool {
        matches!(self, Self::Admin | Self::Member)
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemberRole {
    type Err = MembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            other => Err(MembershipError::InvalidRole(other.to_string())),
        }
    }
}
