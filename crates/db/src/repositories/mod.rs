//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod category;
pub mod group;
pub mod member;
pub mod password_reset;
pub mod session;
pub mod stats;
pub mod transaction;
pub mod user;

pub use category::{
    CategoryError, CategoryFilter, CategoryRepository, CreateCategoryInput, UpdateCategoryInput,
};
pub use group::{GroupError, GroupRepository, UpdateGroupInput};
pub use member::{AddMemberInput, MemberError, MemberRepository, UpdateMemberInput};
pub use password_reset::PasswordResetRepository;
pub use session::SessionRepository;
pub use stats::{Dashboard, GroupBalance, StatsQueryError, StatsRepository};
pub use transaction::{
    Actor, BalanceCorrection, CreateTransactionInput, ReconcileReport, TransactionError,
    TransactionFilter, TransactionRepository, TransactionScope, UpdateTransactionInput, Visibility,
};
pub use user::{CreateUserInput, UpdateProfileInput, UserFilter, UserRepository};
