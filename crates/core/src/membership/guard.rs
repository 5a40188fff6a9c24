//! Last-admin guard and group name rules.

use super::error::MembershipError;
use super::role::MemberRole;

/// Minimum group name length after trimming.
pub const MIN_GROUP_NAME_LEN: usize = 3;

/// Checks a role change given the group's current admin count.
///
/// # Errors
///
/// Returns `LastAdminDemotion` when the only admin would lose the role.
pub fn check_role_change(
    current: MemberRole,
    new: MemberRole,
    admin_count: u64,
) -> Result<(), MembershipError> {
    if current == MemberRole::Admin && new != MemberRole::Admin && admin_count <= 1 {
        return Err(MembershipError::LastAdminDemotion);
    }
    Ok(())
}

/// Checks that a member with `role` can be removed by an admin.
///
/// # Errors
///
/// Returns `LastAdminRemoval` when removing the only admin.
pub fn check_removal(role: MemberRole, admin_count: u64) -> Result<(), MembershipError> {
    if role == MemberRole::Admin && admin_count <= 1 {
        return Err(MembershipError::LastAdminRemoval);
    }
    Ok(())
}

/// Checks that a member with `role` can leave the group on their own.
///
/// # Errors
///
/// Returns `LastAdminLeave` when the only admin tries to leave.
pub fn check_can_leave(role: MemberRole, admin_count: u64) -> Result<(), MembershipError> {
    check_removal(role, admin_count).map_err(|_| MembershipError::LastAdminLeave)
}

/// Trims and validates a group name.
///
/// # Errors
///
/// Returns `InvalidGroupName` if fewer than three characters remain.
pub fn normalize_group_name(name: &str) -> Result<String, MembershipError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_GROUP_NAME_LEN {
        return Err(MembershipError::InvalidGroupName);
    }
    Ok(trimmed.to_string())
}
