//! Transaction repository and balance maintainer.
//!
//! Every create, update and delete runs in one database transaction:
//! validation first, then the balance plan applied under row locks, then the
//! transaction row itself. Dropping the database transaction on any error
//! rolls everything back.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use efinance_core::ledger::{
    BalanceOwner, BalancePlan, LedgerError, Standing, TransactionDraft, TransactionSnapshot,
    TransactionType, check_modify, validate_transaction,
};
use efinance_core::membership::MemberRole;
use efinance_core::stats::{TransactionFact, net_balance};
use efinance_shared::types::{GroupId, PageRequest, UserId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::sea_orm_active_enums::TransactionType as DbTransactionType;
use crate::entities::{categories, groups, members, transactions, users};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// A ledger rule was violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// The user changing or deleting a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Acting user.
    pub user_id: Uuid,
    /// Superusers bypass authorship and membership checks.
    pub is_superuser: bool,
}

impl Actor {
    /// A regular user.
    #[must_use]
    pub const fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_superuser: false,
        }
    }
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Positive amount.
    pub amount: Decimal,
    /// Income or expense.
    pub kind: TransactionType,
    /// Transaction date.
    pub date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Attachment reference.
    pub proof: Option<String>,
    /// Category of the same type.
    pub category_id: Uuid,
    /// Author.
    pub user_id: Uuid,
    /// Group whose balance is affected, if any.
    pub group_id: Option<Uuid>,
}

/// Partial update of a transaction. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New type.
    pub kind: Option<TransactionType>,
    /// New date.
    pub date: Option<NaiveDate>,
    /// New description.
    pub description: Option<String>,
    /// New attachment reference (`Some(None)` clears it).
    pub proof: Option<Option<String>>,
    /// New category.
    pub category_id: Option<Uuid>,
    /// New group (`Some(None)` moves the transaction to the personal balance).
    pub group_id: Option<Option<Uuid>>,
}

/// Which transactions a listing may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The user's own transactions plus those of groups they belong to.
    User(Uuid),
    /// Every transaction. Callers check permissions first.
    All,
}

/// Personal or group transactions only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionScope {
    /// Transactions without a group.
    Personal,
    /// Transactions with a group.
    Group,
}

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by type.
    pub kind: Option<TransactionType>,
    /// Filter by group.
    pub group_id: Option<Uuid>,
    /// Filter by category.
    pub category_id: Option<Uuid>,
    /// Filter by author.
    pub user_id: Option<Uuid>,
    /// Personal or group only.
    pub scope: Option<TransactionScope>,
    /// Earliest date included.
    pub date_from: Option<NaiveDate>,
    /// Latest date included.
    pub date_to: Option<NaiveDate>,
    /// Substring of the description.
    pub search: Option<String>,
}

/// A cached balance that did not match its transactions.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceCorrection {
    /// The balance that was repaired.
    pub owner: BalanceOwner,
    /// Value found in the owner row.
    pub cached: Decimal,
    /// Value recomputed from transactions.
    pub computed: Decimal,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    /// Users whose balance was checked.
    pub users_checked: u64,
    /// Groups whose balance was checked.
    pub groups_checked: u64,
    /// Balances that were repaired.
    pub corrections: Vec<BalanceCorrection>,
}

/// Transaction repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a transaction and applies its amount to the owner's balance.
    ///
    /// # Errors
    ///
    /// Returns a ledger error when validation fails (nothing is written), or
    /// a database error.
    pub async fn create(
        &self,
        input: CreateTransactionInput,
        today: NaiveDate,
    ) -> Result<transactions::Model, TransactionError> {
        let txn = self.db.begin().await?;

        let category = load_category(&txn, input.category_id, input.user_id, input.group_id).await?;
        validate_transaction(
            &TransactionDraft {
                amount: input.amount,
                kind: input.kind,
                date: input.date,
                category_type: category.kind.into(),
            },
            today,
        )?;
        if let Some(group_id) = input.group_id {
            check_group_write(&txn, input.user_id, group_id).await?;
        }

        let snapshot = TransactionSnapshot::new(
            UserId::from(input.user_id),
            input.group_id.map(GroupId::from),
            input.kind,
            input.amount,
        );
        apply_plan(&txn, &BalancePlan::for_create(&snapshot)).await?;

        let now = Utc::now().into();
        let model = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            amount: Set(input.amount),
            kind: Set(input.kind.into()),
            date: Set(input.date),
            description: Set(input.description.trim().to_string()),
            proof: Set(input.proof),
            category_id: Set(input.category_id),
            user_id: Set(input.user_id),
            group_id: Set(input.group_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            transaction_id = %model.id,
            owner = %snapshot.owner,
            delta = %snapshot.delta(),
            "Transaction created"
        );
        Ok(model)
    }

    /// Updates a transaction, reversing its stored effect and applying the new one.
    ///
    /// The stored row is re-read under an exclusive lock, so the reversal is
    /// always computed from what is actually persisted. `actor` must be allowed
    /// to modify the transaction in its current group and, when it moves, in
    /// the new one.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, a permission or validation error, or a
    /// database error.
    pub async fn update(
        &self,
        id: Uuid,
        actor: Actor,
        input: UpdateTransactionInput,
        today: NaiveDate,
    ) -> Result<transactions::Model, TransactionError> {
        let txn = self.db.begin().await?;

        let current = lock_transaction(&txn, id).await?;
        check_actor(&txn, actor, current.user_id, current.group_id).await?;
        let previous = snapshot_of(&current);

        let amount = input.amount.unwrap_or(current.amount);
        let kind = input.kind.unwrap_or_else(|| current.kind.into());
        let date = input.date.unwrap_or(current.date);
        let category_id = input.category_id.unwrap_or(current.category_id);
        let group_id = input.group_id.unwrap_or(current.group_id);

        let category = load_category(&txn, category_id, current.user_id, group_id).await?;
        validate_transaction(
            &TransactionDraft {
                amount,
                kind,
                date,
                category_type: category.kind.into(),
            },
            today,
        )?;
        if group_id != current.group_id {
            check_actor(&txn, actor, current.user_id, group_id).await?;
            if let Some(group_id) = group_id {
                check_group_write(&txn, current.user_id, group_id).await?;
            }
        }

        let next = TransactionSnapshot::new(
            UserId::from(current.user_id),
            group_id.map(GroupId::from),
            kind,
            amount,
        );
        let plan = BalancePlan::for_update(&previous, &next);
        apply_plan(&txn, &plan).await?;

        let mut active: transactions::ActiveModel = current.into();
        active.amount = Set(amount);
        active.kind = Set(kind.into());
        active.date = Set(date);
        active.category_id = Set(category_id);
        active.group_id = Set(group_id);
        if let Some(description) = input.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(proof) = input.proof {
            active.proof = Set(proof);
        }
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            transaction_id = %id,
            adjustments = plan.adjustments().len(),
            "Transaction updated"
        );
        Ok(model)
    }

    /// Deletes a transaction and reverses its effect on the owner's balance.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound`, a permission error, or a database error.
    pub async fn delete(
        &self,
        id: Uuid,
        actor: Actor,
    ) -> Result<transactions::Model, TransactionError> {
        let txn = self.db.begin().await?;

        let current = lock_transaction(&txn, id).await?;
        check_actor(&txn, actor, current.user_id, current.group_id).await?;
        let snapshot = snapshot_of(&current);
        apply_plan(&txn, &BalancePlan::for_delete(&snapshot)).await?;

        transactions::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(transaction_id = %id, owner = %snapshot.owner, "Transaction deleted");
        Ok(current)
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(id).one(&self.db).await
    }

    /// Returns true if `user_id` may read `transaction`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_visible_to(
        &self,
        transaction: &transactions::Model,
        user_id: Uuid,
    ) -> Result<bool, DbErr> {
        if transaction.user_id == user_id {
            return Ok(true);
        }
        let Some(group_id) = transaction.group_id else {
            return Ok(false);
        };
        let count = members::Entity::find()
            .filter(members::Column::GroupId.eq(group_id))
            .filter(members::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Lists transactions, newest first, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        visibility: Visibility,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<transactions::Model>, u64), DbErr> {
        let page = page.normalized();
        let total = filtered(visibility, filter).count(&self.db).await?;

        let rows = filtered(visibility, filter)
            .order_by_desc(transactions::Column::Date)
            .order_by_desc(transactions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Counts transactions using a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_for_category(&self, category_id: Uuid) -> Result<u64, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(category_id))
            .count(&self.db)
            .await
    }

    /// Recomputes every cached balance from the transaction set and repairs drift.
    ///
    /// All user and group rows are locked for the duration of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn reconcile(&self) -> Result<ReconcileReport, TransactionError> {
        let txn = self.db.begin().await?;

        let users = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await?;
        let groups = groups::Entity::find()
            .order_by_asc(groups::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await?;

        let mut facts_by_owner: HashMap<BalanceOwner, Vec<TransactionFact>> = HashMap::new();
        for row in transactions::Entity::find().all(&txn).await? {
            let owner = snapshot_of(&row).owner;
            facts_by_owner
                .entry(owner)
                .or_default()
                .push(fact_from(row, String::new()));
        }
        let computed_for = |owner: BalanceOwner| {
            facts_by_owner
                .get(&owner)
                .map_or(Decimal::ZERO, |facts| net_balance(facts))
        };

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let mut corrections = Vec::new();
        let users_checked = users.len() as u64;
        let groups_checked = groups.len() as u64;

        for user in users {
            let owner = BalanceOwner::Personal(UserId::from(user.id));
            let computed = computed_for(owner);
            if user.balance != computed {
                corrections.push(BalanceCorrection {
                    owner,
                    cached: user.balance,
                    computed,
                });
                let mut active: users::ActiveModel = user.into();
                active.balance = Set(computed);
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
        }

        for group in groups {
            let owner = BalanceOwner::Group(GroupId::from(group.id));
            let computed = computed_for(owner);
            if group.balance != computed {
                corrections.push(BalanceCorrection {
                    owner,
                    cached: group.balance,
                    computed,
                });
                let mut active: groups::ActiveModel = group.into();
                active.balance = Set(computed);
                active.updated_at = Set(now);
                active.update(&txn).await?;
            }
        }

        txn.commit().await?;

        for correction in &corrections {
            warn!(
                owner = %correction.owner,
                cached = %correction.cached,
                computed = %correction.computed,
                "Balance drift repaired"
            );
        }
        info!(
            users_checked,
            groups_checked,
            corrected = corrections.len(),
            "Reconciliation finished"
        );

        Ok(ReconcileReport {
            users_checked,
            groups_checked,
            corrections,
        })
    }
}

/// Builds the filtered transaction query shared by listings and statistics.
pub(crate) fn filtered(
    visibility: Visibility,
    filter: &TransactionFilter,
) -> Select<transactions::Entity> {
    let mut query = transactions::Entity::find();

    if let Visibility::User(user_id) = visibility {
        let my_groups = Query::select()
            .column(members::Column::GroupId)
            .from(members::Entity)
            .and_where(members::Column::UserId.eq(user_id))
            .to_owned();
        query = query.filter(
            Condition::any()
                .add(transactions::Column::UserId.eq(user_id))
                .add(transactions::Column::GroupId.in_subquery(my_groups)),
        );
    }

    if let Some(kind) = filter.kind {
        query = query.filter(transactions::Column::Kind.eq(DbTransactionType::from(kind)));
    }
    if let Some(group_id) = filter.group_id {
        query = query.filter(transactions::Column::GroupId.eq(group_id));
    }
    if let Some(category_id) = filter.category_id {
        query = query.filter(transactions::Column::CategoryId.eq(category_id));
    }
    if let Some(user_id) = filter.user_id {
        query = query.filter(transactions::Column::UserId.eq(user_id));
    }
    match filter.scope {
        Some(TransactionScope::Personal) => {
            query = query.filter(transactions::Column::GroupId.is_null());
        }
        Some(TransactionScope::Group) => {
            query = query.filter(transactions::Column::GroupId.is_not_null());
        }
        None => {}
    }
    if let Some(from) = filter.date_from {
        query = query.filter(transactions::Column::Date.gte(from));
    }
    if let Some(to) = filter.date_to {
        query = query.filter(transactions::Column::Date.lte(to));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(transactions::Column::Description.contains(search));
    }

    query
}

/// Converts a stored row into an aggregation fact.
pub(crate) fn fact_from(row: transactions::Model, category_name: String) -> TransactionFact {
    TransactionFact {
        id: row.id,
        amount: row.amount,
        kind: row.kind.into(),
        date: row.date,
        category_id: row.category_id,
        category_name,
        user_id: row.user_id,
        group_id: row.group_id,
    }
}

fn snapshot_of(row: &transactions::Model) -> TransactionSnapshot {
    TransactionSnapshot::new(
        UserId::from(row.user_id),
        row.group_id.map(GroupId::from),
        row.kind.into(),
        row.amount,
    )
}

async fn lock_transaction(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<transactions::Model, TransactionError> {
    transactions::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| LedgerError::TransactionNotFound(id).into())
}

/// Loads a category the author may use for a transaction in `group_id`.
///
/// Group categories are only usable inside their group; personal categories
/// only by their owner.
async fn load_category<C: ConnectionTrait>(
    conn: &C,
    category_id: Uuid,
    author: Uuid,
    group_id: Option<Uuid>,
) -> Result<categories::Model, TransactionError> {
    let category = categories::Entity::find_by_id(category_id)
        .one(conn)
        .await?
        .ok_or(LedgerError::CategoryNotFound(category_id))?;

    let usable = match category.group_id {
        Some(owner_group) => group_id == Some(owner_group),
        None => category.user_id == author,
    };
    if !usable {
        return Err(LedgerError::CategoryNotFound(category_id).into());
    }
    Ok(category)
}

/// Requires `user_id` to hold a writing role in `group_id`.
async fn check_group_write<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    group_id: Uuid,
) -> Result<(), TransactionError> {
    let member = members::Entity::find()
        .filter(members::Column::GroupId.eq(group_id))
        .filter(members::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or(LedgerError::NotGroupMember)?;

    if !MemberRole::from(member.role).can_write_transactions() {
        return Err(LedgerError::ReadOnlyMember.into());
    }
    Ok(())
}

/// Requires `actor` to be allowed to modify a transaction by `author` in `group_id`.
///
/// The actor's membership row is read with a shared lock so a concurrent role
/// change cannot interleave with the write.
async fn check_actor(
    txn: &DatabaseTransaction,
    actor: Actor,
    author: Uuid,
    group_id: Option<Uuid>,
) -> Result<(), TransactionError> {
    if actor.is_superuser {
        return Ok(());
    }

    let standing = match group_id {
        None => Standing::Personal,
        Some(group_id) => {
            let role = members::Entity::find()
                .filter(members::Column::GroupId.eq(group_id))
                .filter(members::Column::UserId.eq(actor.user_id))
                .lock_shared()
                .one(txn)
                .await?
                .map(|member| MemberRole::from(member.role));
            Standing::Group(role)
        }
    };

    check_modify(UserId::from(actor.user_id), UserId::from(author), standing)?;
    Ok(())
}

/// Applies each adjustment under an exclusive lock on the owner row.
///
/// Adjustments arrive in owner order, so concurrent writers lock in the same
/// sequence.
async fn apply_plan(txn: &DatabaseTransaction, plan: &BalancePlan) -> Result<(), TransactionError> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

    for adjustment in plan.adjustments() {
        let missing = || LedgerError::OwnerNotFound(adjustment.owner.to_string());
        match adjustment.owner {
            BalanceOwner::Personal(user_id) => {
                let user = users::Entity::find_by_id(user_id.into_inner())
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(missing)?;
                let balance = user.balance + adjustment.delta;
                let mut active: users::ActiveModel = user.into();
                active.balance = Set(balance);
                active.updated_at = Set(now);
                active.update(txn).await?;
            }
            BalanceOwner::Group(group_id) => {
                let group = groups::Entity::find_by_id(group_id.into_inner())
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_else(missing)?;
                let balance = group.balance + adjustment.delta;
                let mut active: groups::ActiveModel = group.into();
                active.balance = Set(balance);
                active.updated_at = Set(now);
                active.update(txn).await?;
            }
        }
    }

    Ok(())
}
