//! Password reset code storage.

use chrono::{Duration, Utc};
use efinance_core::auth::RESET_CODE_TTL_MINUTES;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{password_reset_codes, sessions, users};

/// Password reset repository.
#[derive(Debug, Clone)]
pub struct PasswordResetRepository {
    db: DatabaseConnection,
}

impl PasswordResetRepository {
    /// Creates a new password reset repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a fresh code, invalidating any earlier unused ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn issue(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<password_reset_codes::Model, DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let expires_at = now + Duration::minutes(RESET_CODE_TTL_MINUTES);

        let txn = self.db.begin().await?;
        consume_all(&txn, user_id, now).await?;

        let record = password_reset_codes::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            code: Set(code.to_string()),
            expires_at: Set(expires_at),
            used_at: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(record)
    }

    /// Finds an unused, unexpired code for the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_valid(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<Option<password_reset_codes::Model>, DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        password_reset_codes::Entity::find()
            .filter(password_reset_codes::Column::UserId.eq(user_id))
            .filter(password_reset_codes::Column::Code.eq(code))
            .filter(password_reset_codes::Column::UsedAt.is_null())
            .filter(password_reset_codes::Column::ExpiresAt.gt(now))
            .order_by_desc(password_reset_codes::Column::CreatedAt)
            .one(&self.db)
            .await
    }

    /// Sets a new password, consumes every outstanding code and revokes all
    /// sessions, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn complete_reset(&self, user_id: Uuid, password_hash: &str) -> Result<(), DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let txn = self.db.begin().await?;

        users::ActiveModel {
            id: Set(user_id),
            password_hash: Set(password_hash.to_string()),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&txn)
        .await?;

        consume_all(&txn, user_id, now).await?;

        sessions::Entity::update_many()
            .col_expr(sessions::Column::RevokedAt, Expr::value(now))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }
}

async fn consume_all<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    now: DateTimeWithTimeZone,
) -> Result<u64, DbErr> {
    let result = password_reset_codes::Entity::update_many()
        .col_expr(password_reset_codes::Column::UsedAt, Expr::value(now))
        .filter(password_reset_codes::Column::UserId.eq(user_id))
        .filter(password_reset_codes::Column::UsedAt.is_null())
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}
