//! `SeaORM` entity definitions.

pub mod prelude;

pub mod categories;
pub mod groups;
pub mod members;
pub mod password_reset_codes;
pub mod sea_orm_active_enums;
pub mod sessions;
pub mod transactions;
pub mod users;
