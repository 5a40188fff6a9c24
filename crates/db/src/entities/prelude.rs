//! Entity re-exports.

pub use super::categories::Entity as Categories;
pub use super::groups::Entity as Groups;
pub use super::members::Entity as Members;
pub use super::password_reset_codes::Entity as PasswordResetCodes;
pub use super::sessions::Entity as Sessions;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
