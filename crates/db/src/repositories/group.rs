//! Group repository for database operations.

use chrono::Utc;
use efinance_core::membership::{MemberRole, MembershipError, normalize_group_name};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{categories, groups, members, transactions};

/// Error types for group operations.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    /// A membership rule was violated.
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Group not found.
    #[error("Group not found: {0}")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Partial update of a group. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateGroupInput {
    /// New name.
    pub name: Option<String>,
    /// New description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
}

/// Group repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    db: DatabaseConnection,
}

impl GroupRepository {
    /// Creates a new group repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a group and makes its creator the first admin.
    ///
    /// Both rows are written in one database transaction, so a group never
    /// exists without an admin.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGroupName` or a database error.
    pub async fn create_with_admin(
        &self,
        creator_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> Result<(groups::Model, members::Model), GroupError> {
        let name = normalize_group_name(name)?;
        let now = Utc::now().into();

        let txn = self.db.begin().await?;

        let group = groups::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.clone()),
            description: Set(description),
            balance: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let admin = members::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(creator_id),
            group_id: Set(group.id),
            role: Set(MemberRole::Admin.into()),
            description: Set(Some(format!("Creator of {name}"))),
            personal_contribution_amount: Set(Decimal::ZERO),
            joined_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(group_id = %group.id, creator_id = %creator_id, "Group created");
        Ok((group, admin))
    }

    /// Finds a group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<groups::Model>, DbErr> {
        groups::Entity::find_by_id(id).one(&self.db).await
    }

    /// Updates a group's name or description. The balance is never touched here.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidGroupName`, or a database error.
    pub async fn update(&self, id: Uuid, input: UpdateGroupInput) -> Result<groups::Model, GroupError> {
        let group = self.find_by_id(id).await?.ok_or(GroupError::NotFound(id))?;

        let mut active: groups::ActiveModel = group.into();
        if let Some(name) = input.name {
            active.name = Set(normalize_group_name(&name)?);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a group with its transactions, categories and memberships.
    ///
    /// Members' personal balances are unaffected: group transactions only
    /// ever touched the group balance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or a database error.
    pub async fn delete(&self, id: Uuid) -> Result<(), GroupError> {
        let txn = self.db.begin().await?;

        // Serializes with balance writers, which lock the group row first.
        groups::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(GroupError::NotFound(id))?;

        let removed = transactions::Entity::delete_many()
            .filter(transactions::Column::GroupId.eq(id))
            .exec(&txn)
            .await?;
        categories::Entity::delete_many()
            .filter(categories::Column::GroupId.eq(id))
            .exec(&txn)
            .await?;
        members::Entity::delete_many()
            .filter(members::Column::GroupId.eq(id))
            .exec(&txn)
            .await?;
        groups::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!(group_id = %id, transactions = removed.rows_affected, "Group deleted");
        Ok(())
    }

    /// Lists the groups a user belongs to with the user's role in each.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(groups::Model, MemberRole)>, DbErr> {
        let rows = members::Entity::find()
            .filter(members::Column::UserId.eq(user_id))
            .find_also_related(groups::Entity)
            .order_by_asc(members::Column::JoinedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(member, group)| group.map(|g| (g, MemberRole::from(member.role))))
            .collect())
    }
}
