//! Category repository for database operations.

use chrono::Utc;
use efinance_core::ledger::{LedgerError, TransactionType, normalize_category_name};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::sea_orm_active_enums::TransactionType as DbTransactionType;
use crate::entities::{categories, members, transactions};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// A ledger rule was violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Cannot change the type of a category that transactions use.
    #[error("Cannot change category type: {0} transaction(s) use this category")]
    TypeLocked(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Display name.
    pub name: String,
    /// Income or expense.
    pub kind: TransactionType,
    /// Owner.
    pub user_id: Uuid,
    /// Group the category belongs to, if any.
    pub group_id: Option<Uuid>,
}

/// Partial update of a category. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New type. Rejected while transactions use the category.
    pub kind: Option<TransactionType>,
}

/// Filter options for listing categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Filter by type.
    pub kind: Option<TransactionType>,
    /// Only categories of this group.
    pub group_id: Option<Uuid>,
}

/// Category repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCategoryName` or a database error.
    pub async fn create(&self, input: CreateCategoryInput) -> Result<categories::Model, CategoryError> {
        let name = normalize_category_name(&input.name)?;
        let now = Utc::now().into();

        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            kind: Set(input.kind.into()),
            user_id: Set(input.user_id),
            group_id: Set(input.group_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        info!(category_id = %category.id, user_id = %input.user_id, "Category created");
        Ok(category)
    }

    /// Finds a category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<categories::Model>, DbErr> {
        categories::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists categories the user owns or that belong to the user's groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_visible(
        &self,
        user_id: Uuid,
        filter: &CategoryFilter,
    ) -> Result<Vec<categories::Model>, DbErr> {
        let my_groups = Query::select()
            .column(members::Column::GroupId)
            .from(members::Entity)
            .and_where(members::Column::UserId.eq(user_id))
            .to_owned();

        let mut query = categories::Entity::find().filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(categories::Column::UserId.eq(user_id))
                        .add(categories::Column::GroupId.is_null()),
                )
                .add(categories::Column::GroupId.in_subquery(my_groups)),
        );

        if let Some(kind) = filter.kind {
            query = query.filter(categories::Column::Kind.eq(DbTransactionType::from(kind)));
        }
        if let Some(group_id) = filter.group_id {
            query = query.filter(categories::Column::GroupId.eq(group_id));
        }

        query
            .order_by_asc(categories::Column::Kind)
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
    }

    /// Counts transactions using a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn transaction_count(&self, id: Uuid) -> Result<u64, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(id))
            .count(&self.db)
            .await
    }

    /// Updates a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound`, `InvalidCategoryName`, `TypeLocked`, or a
    /// database error.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let category = self
            .find_by_id(id)
            .await?
            .ok_or(LedgerError::CategoryNotFound(id))?;

        let mut active: categories::ActiveModel = category.clone().into();
        if let Some(name) = input.name {
            active.name = Set(normalize_category_name(&name)?);
        }
        if let Some(kind) = input.kind {
            if TransactionType::from(category.kind) != kind {
                let used = self.transaction_count(id).await?;
                if used > 0 {
                    return Err(CategoryError::TypeLocked(used));
                }
                active.kind = Set(kind.into());
            }
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a category that no transaction uses.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound`, `CategoryInUse`, or a database error.
    pub async fn delete(&self, id: Uuid) -> Result<(), CategoryError> {
        self.find_by_id(id)
            .await?
            .ok_or(LedgerError::CategoryNotFound(id))?;

        let count = self.transaction_count(id).await?;
        if count > 0 {
            return Err(LedgerError::CategoryInUse { count }.into());
        }

        categories::Entity::delete_by_id(id).exec(&self.db).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
