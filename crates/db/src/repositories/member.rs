//! Group membership repository.
//!
//! Role changes, removals and departures lock the group row before counting
//! admins, so two concurrent demotions cannot both see a second admin.

use chrono::Utc;
use efinance_core::membership::{
    MemberRole, MembershipError, check_can_leave, check_removal, check_role_change,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::sea_orm_active_enums::MemberRole as DbMemberRole;
use crate::entities::{groups, members, users};

/// Error types for membership operations.
#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    /// A membership rule was violated.
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(Uuid),

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for adding a member to a group.
#[derive(Debug, Clone)]
pub struct AddMemberInput {
    /// User to add.
    pub user_id: Uuid,
    /// Initial role.
    pub role: MemberRole,
    /// Optional note about the member.
    pub description: Option<String>,
    /// Informational contribution amount.
    pub personal_contribution_amount: Decimal,
}

/// Partial update of a membership. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateMemberInput {
    /// New role, checked against the last-admin guard.
    pub role: Option<MemberRole>,
    /// New note (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// New contribution amount.
    pub personal_contribution_amount: Option<Decimal>,
}

/// Member repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    db: DatabaseConnection,
}

impl MemberRepository {
    /// Creates a new member repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the membership of `user_id` in `group_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<members::Model>, DbErr> {
        find_member(&self.db, group_id, user_id).await
    }

    /// Returns the role of `user_id` in `group_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn role_of(&self, group_id: Uuid, user_id: Uuid) -> Result<Option<MemberRole>, DbErr> {
        Ok(self
            .find(group_id, user_id)
            .await?
            .map(|m| MemberRole::from(m.role)))
    }

    /// Lists a group's members with their user rows, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        group_id: Uuid,
    ) -> Result<Vec<(members::Model, users::Model)>, DbErr> {
        let rows = members::Entity::find()
            .filter(members::Column::GroupId.eq(group_id))
            .find_also_related(users::Entity)
            .order_by_asc(members::Column::JoinedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(member, user)| user.map(|u| (member, u)))
            .collect())
    }

    /// Counts the admins of a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_admins(&self, group_id: Uuid) -> Result<u64, DbErr> {
        count_admins(&self.db, group_id).await
    }

    /// Adds a user to a group.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyMember` for an existing pair, `GroupNotFound` or
    /// `UserNotFound`, or a database error.
    pub async fn add(
        &self,
        group_id: Uuid,
        input: AddMemberInput,
    ) -> Result<members::Model, MemberError> {
        let txn = self.db.begin().await?;
        lock_group(&txn, group_id).await?;

        users::Entity::find_by_id(input.user_id)
            .one(&txn)
            .await?
            .ok_or(MemberError::UserNotFound(input.user_id))?;

        if find_member(&txn, group_id, input.user_id).await?.is_some() {
            return Err(MembershipError::AlreadyMember.into());
        }

        let member = members::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            group_id: Set(group_id),
            role: Set(input.role.into()),
            description: Set(input.description),
            personal_contribution_amount: Set(input.personal_contribution_amount),
            joined_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(group_id = %group_id, user_id = %input.user_id, role = %input.role.as_str(), "Member added");
        Ok(member)
    }

    /// Joins a group as a regular member.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add`].
    pub async fn join(&self, group_id: Uuid, user_id: Uuid) -> Result<members::Model, MemberError> {
        self.add(
            group_id,
            AddMemberInput {
                user_id,
                role: MemberRole::Member,
                description: None,
                personal_contribution_amount: Decimal::ZERO,
            },
        )
        .await
    }

    /// Updates a membership, enforcing the last-admin guard on role changes.
    ///
    /// # Errors
    ///
    /// Returns `NotMember`, `LastAdminDemotion`, or a database error.
    pub async fn update(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        input: UpdateMemberInput,
    ) -> Result<members::Model, MemberError> {
        let txn = self.db.begin().await?;
        lock_group(&txn, group_id).await?;

        let member = find_member(&txn, group_id, user_id)
            .await?
            .ok_or(MembershipError::NotMember)?;

        if let Some(new_role) = input.role {
            let admins = count_admins(&txn, group_id).await?;
            check_role_change(MemberRole::from(member.role), new_role, admins)?;
        }

        let mut active: members::ActiveModel = member.into();
        if let Some(role) = input.role {
            active.role = Set(role.into());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(amount) = input.personal_contribution_amount {
            active.personal_contribution_amount = Set(amount);
        }
        let member = active.update(&txn).await?;

        txn.commit().await?;

        info!(group_id = %group_id, user_id = %user_id, "Member updated");
        Ok(member)
    }

    /// Removes a member from a group.
    ///
    /// # Errors
    ///
    /// Returns `NotMember`, `LastAdminRemoval`, or a database error.
    pub async fn remove(&self, group_id: Uuid, user_id: Uuid) -> Result<(), MemberError> {
        self.delete_member(group_id, user_id, check_removal).await?;
        info!(group_id = %group_id, user_id = %user_id, "Member removed");
        Ok(())
    }

    /// Leaves a group.
    ///
    /// # Errors
    ///
    /// Returns `NotMember`, `LastAdminLeave`, or a database error.
    pub async fn leave(&self, group_id: Uuid, user_id: Uuid) -> Result<(), MemberError> {
        self.delete_member(group_id, user_id, check_can_leave).await?;
        info!(group_id = %group_id, user_id = %user_id, "Member left group");
        Ok(())
    }

    async fn delete_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        guard: fn(MemberRole, u64) -> Result<(), MembershipError>,
    ) -> Result<(), MemberError> {
        let txn = self.db.begin().await?;
        lock_group(&txn, group_id).await?;

        let member = find_member(&txn, group_id, user_id)
            .await?
            .ok_or(MembershipError::NotMember)?;
        let admins = count_admins(&txn, group_id).await?;
        guard(MemberRole::from(member.role), admins)?;

        members::Entity::delete_by_id(member.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}

async fn lock_group(txn: &DatabaseTransaction, group_id: Uuid) -> Result<groups::Model, MemberError> {
    groups::Entity::find_by_id(group_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(MemberError::GroupNotFound(group_id))
}

async fn find_member<C: ConnectionTrait>(
    conn: &C,
    group_id: Uuid,
    user_id: Uuid,
) -> Result<Option<members::Model>, DbErr> {
    members::Entity::find()
        .filter(members::Column::GroupId.eq(group_id))
        .filter(members::Column::UserId.eq(user_id))
        .one(conn)
        .await
}

async fn count_admins<C: ConnectionTrait>(conn: &C, group_id: Uuid) -> Result<u64, DbErr> {
    members::Entity::find()
        .filter(members::Column::GroupId.eq(group_id))
        .filter(members::Column::Role.eq(DbMemberRole::Admin))
        .count(conn)
        .await
}
