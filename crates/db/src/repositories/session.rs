//! Session repository for database operations.
//!
//! A session backs one refresh token. Only the SHA-256 hash of the token is
//! stored.

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entities::sessions;

/// Session repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    db: DatabaseConnection,
}

impl SessionRepository {
    /// Creates a new session repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes a refresh token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Creates a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
        user_agent: Option<&str>,
    ) -> Result<sessions::Model, DbErr> {
        let session = sessions::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            refresh_token_hash: Set(Self::hash_token(refresh_token)),
            user_agent: Set(user_agent.map(String::from)),
            expires_at: Set(expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        session.insert(&self.db).await
    }

    /// Finds a live session by refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<sessions::Model>, DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        sessions::Entity::find()
            .filter(sessions::Column::RefreshTokenHash.eq(Self::hash_token(refresh_token)))
            .filter(sessions::Column::RevokedAt.is_null())
            .filter(sessions::Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
    }

    /// Revokes a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke(&self, id: Uuid) -> Result<(), DbErr> {
        sessions::ActiveModel {
            id: Set(id),
            revoked_at: Set(Some(Utc::now().into())),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Revokes a session by refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_by_token(&self, refresh_token: &str) -> Result<bool, DbErr> {
        if let Some(session) = self.find_by_token(refresh_token).await? {
            self.revoke(session.id).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Revokes all sessions for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_all_user_sessions(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let result = sessions::Entity::update_many()
            .col_expr(sessions::Column::RevokedAt, Expr::value(now))
            .filter(sessions::Column::UserId.eq(user_id))
            .filter(sessions::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Deletes expired sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
