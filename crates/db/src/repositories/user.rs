//! User repository for database operations.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::users;

/// Default currency label for new users.
pub const DEFAULT_CURRENCY: &str = "XOF";

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Login e-mail. Stored lowercased.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Currency label, defaults to [`DEFAULT_CURRENCY`].
    pub currency: Option<String>,
}

/// Partial profile update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New currency label.
    pub currency: Option<String>,
}

/// Filter options for the superuser user listing.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Substring of e-mail, first or last name.
    pub search: Option<String>,
    /// Minimum personal balance.
    pub min_balance: Option<Decimal>,
    /// Maximum personal balance.
    pub max_balance: Option<Decimal>,
    /// Active flag.
    pub is_active: Option<bool>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Normalizes an e-mail address for storage and lookup.
    #[must_use]
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(Self::normalize_email(email)))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(Self::normalize_email(email)))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new user with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, DbErr> {
        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(Self::normalize_email(&input.email)),
            password_hash: Set(input.password_hash),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            balance: Set(Decimal::ZERO),
            currency: Set(input
                .currency
                .map_or_else(|| DEFAULT_CURRENCY.to_string(), |c| c.trim().to_uppercase())),
            is_active: Set(true),
            is_superuser: Set(false),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Updates profile fields. The balance is never touched here.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` or a database error.
    pub async fn update_profile(
        &self,
        id: Uuid,
        input: UpdateProfileInput,
    ) -> Result<users::Model, DbErr> {
        let user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {id}")))?;

        let mut active: users::ActiveModel = user.into();
        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name.trim().to_string());
        }
        if let Some(currency) = input.currency {
            active.currency = Set(currency.trim().to_uppercase());
        }
        active.updated_at = Set(Utc::now().into());

        active.update(&self.db).await
    }

    /// Replaces a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash.to_string()),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Records a successful login.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(id),
            last_login_at: Set(Some(Utc::now().into())),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Promotes or demotes a superuser.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_superuser(&self, id: Uuid, is_superuser: bool) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(id),
            is_superuser: Set(is_superuser),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Lists users matching `filter`, ordered by e-mail.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<users::Model>, DbErr> {
        let mut query = users::Entity::find();

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(users::Column::Email.contains(search))
                    .add(users::Column::FirstName.contains(search))
                    .add(users::Column::LastName.contains(search)),
            );
        }
        if let Some(min) = filter.min_balance {
            query = query.filter(users::Column::Balance.gte(min));
        }
        if let Some(max) = filter.max_balance {
            query = query.filter(users::Column::Balance.lte(max));
        }
        if let Some(active) = filter.is_active {
            query = query.filter(users::Column::IsActive.eq(active));
        }

        query.order_by_asc(users::Column::Email).all(&self.db).await
    }
}
