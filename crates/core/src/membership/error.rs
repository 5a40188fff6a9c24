//! Membership error types.

use thiserror::Error;

/// Errors raised by membership rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MembershipError {
    /// The only admin would be demoted.
    #[error("Cannot demote the last admin of the group")]
    LastAdminDemotion,

    /// The only admin would be removed.
    #[error("Cannot remove the last admin of the group")]
    LastAdminRemoval,

    /// The only admin tried to leave.
    #[error("Cannot leave: you are the last admin of this group")]
    LastAdminLeave,

    /// The `(user, group)` pair already exists.
    #[error("User is already a member of this group")]
    AlreadyMember,

    /// The user has no membership in the group.
    #[error("User is not a member of this group")]
    NotMember,

    /// Unknown role string.
    #[error("Invalid role: {0}. Must be one of admin, member, viewer")]
    InvalidRole(String),

    /// Group name shorter than three characters after trimming.
    #[error("Group name must be at least 3 characters")]
    InvalidGroupName,

    /// Action requires the admin role.
    #[error("Only group admins can perform this action")]
    AdminRequired,
}

impl MembershipError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::LastAdminDemotion => "LAST_ADMIN_DEMOTION",
            Self::LastAdminRemoval => "LAST_ADMIN_REMOVAL",
            Self::LastAdminLeave => "LAST_ADMIN_LEAVE",
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::NotMember => "NOT_MEMBER",
            Self::InvalidRole(_) => "INVALID_ROLE",
            Self::InvalidGroupName => "INVALID_GROUP_NAME",
            Self::AdminRequired => "ADMIN_REQUIRED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::LastAdminDemotion
            | Self::LastAdminRemoval
            | Self::LastAdminLeave
            | Self::AlreadyMember
            | Self::InvalidRole(_)
            | Self::InvalidGroupName => 400,
            Self::AdminRequired => 403,
            Self::NotMember => 404,
        }
    }
}
