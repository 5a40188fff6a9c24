//! Group membership roles and the last-admin guard.
//!
//! Every group keeps at least one admin. The guard functions here are pure;
//! callers supply the current admin count read under a group-row lock.

mod error;
mod guard;
mod role;

pub use error::MembershipError;
pub use guard::{
    MIN_GROUP_NAME_LEN, check_can_leave, check_removal, check_role_change, normalize_group_name,
};
pub use role::MemberRole;
