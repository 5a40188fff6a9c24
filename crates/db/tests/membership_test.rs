//! Integration tests for group membership and the last-admin guard.

mod common;

use common::{create_group, create_user, setup_db};
use efinance_core::membership::{MemberRole, MembershipError};
use efinance_db::{
    AddMemberInput, GroupError, GroupRepository, MemberError, MemberRepository, UpdateMemberInput,
};
use futures::future::join_all;
use rust_decimal::Decimal;

fn promote(role: MemberRole) -> UpdateMemberInput {
    UpdateMemberInput {
        role: Some(role),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_creator_becomes_admin() {
    let db = setup_db().await;
    let alice = create_user(&db).await;

    let (group, admin) = GroupRepository::new(db.clone())
        .create_with_admin(alice.id, "  Flatmates  ", Some("Rent and groceries".into()))
        .await
        .unwrap();

    assert_eq!(group.name, "Flatmates");
    assert_eq!(admin.user_id, alice.id);
    assert_eq!(MemberRole::from(admin.role), MemberRole::Admin);
    assert_eq!(admin.description.as_deref(), Some("Creator of Flatmates"));

    let groups = GroupRepository::new(db.clone())
        .list_for_user(alice.id)
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].1, MemberRole::Admin);
}

#[tokio::test]
async fn test_short_group_name_rejected() {
    let db = setup_db().await;
    let alice = create_user(&db).await;

    let result = GroupRepository::new(db.clone())
        .create_with_admin(alice.id, " ab ", None)
        .await;
    assert!(matches!(
        result,
        Err(GroupError::Membership(MembershipError::InvalidGroupName))
    ));
}

#[tokio::test]
async fn test_last_admin_cannot_be_demoted() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    let repo = MemberRepository::new(db.clone());

    let result = repo.update(group, alice.id, promote(MemberRole::Member)).await;

    assert!(matches!(
        result,
        Err(MemberError::Membership(MembershipError::LastAdminDemotion))
    ));
    assert_eq!(repo.count_admins(group).await.unwrap(), 1);
}

#[tokio::test]
async fn test_last_admin_cannot_be_removed_or_leave() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    let repo = MemberRepository::new(db.clone());

    assert!(matches!(
        repo.remove(group, alice.id).await,
        Err(MemberError::Membership(MembershipError::LastAdminRemoval))
    ));
    assert!(matches!(
        repo.leave(group, alice.id).await,
        Err(MemberError::Membership(MembershipError::LastAdminLeave))
    ));
    assert!(repo.find(group, alice.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_admin_can_step_down_once_another_admin_exists() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    let repo = MemberRepository::new(db.clone());

    repo.join(group, bob.id).await.unwrap();
    repo.update(group, bob.id, promote(MemberRole::Admin))
        .await
        .unwrap();

    let alice_now = repo
        .update(group, alice.id, promote(MemberRole::Viewer))
        .await
        .unwrap();
    assert_eq!(MemberRole::from(alice_now.role), MemberRole::Viewer);
    assert_eq!(repo.count_admins(group).await.unwrap(), 1);

    repo.leave(group, alice.id).await.unwrap();
    assert!(repo.find(group, alice.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_membership_rejected() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    let repo = MemberRepository::new(db.clone());

    repo.add(
        group,
        AddMemberInput {
            user_id: bob.id,
            role: MemberRole::Member,
            description: Some("Pays the internet".into()),
            personal_contribution_amount: Decimal::from(25),
        },
    )
    .await
    .unwrap();

    let again = repo.join(group, bob.id).await;
    assert!(matches!(
        &again,
        Err(MemberError::Membership(MembershipError::AlreadyMember))
    ));
    assert_eq!(
        again.unwrap_err().to_string(),
        "User is already a member of this group"
    );
    assert_eq!(repo.list(group).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_group_or_member() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    let repo = MemberRepository::new(db.clone());

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        repo.join(missing, bob.id).await,
        Err(MemberError::GroupNotFound(id)) if id == missing
    ));
    assert!(matches!(
        repo.remove(group, bob.id).await,
        Err(MemberError::Membership(MembershipError::NotMember))
    ));
}

#[tokio::test]
async fn test_concurrent_demotions_keep_one_admin() {
    let db = setup_db().await;
    let alice = create_user(&db).await;
    let bob = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    let repo = MemberRepository::new(db.clone());

    repo.join(group, bob.id).await.unwrap();
    repo.update(group, bob.id, promote(MemberRole::Admin))
        .await
        .unwrap();

    let demotions = [alice.id, bob.id].map(|user_id| {
        let repo = repo.clone();
        async move { repo.update(group, user_id, promote(MemberRole::Member)).await }
    });
    let results = join_all(demotions).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(repo.count_admins(group).await.unwrap(), 1);
}

#[tokio::test]
async fn test_group_delete_keeps_personal_balances() {
    use common::{create_category, input, record, user_balance};
    use efinance_core::ledger::TransactionType;
    use rust_decimal_macros::dec;

    let db = setup_db().await;
    let alice = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    let shared = create_category(&db, alice.id, Some(group), TransactionType::Income).await;
    let personal = create_category(&db, alice.id, None, TransactionType::Income).await;

    record(&db, input(alice.id, Some(group), shared, TransactionType::Income, dec!(80))).await;
    record(&db, input(alice.id, None, personal, TransactionType::Income, dec!(15))).await;

    let groups = GroupRepository::new(db.clone());
    groups.delete(group).await.unwrap();

    assert!(groups.find_by_id(group).await.unwrap().is_none());
    assert_eq!(user_balance(&db, alice.id).await, dec!(15));
}

#[tokio::test]
async fn test_group_delete_races_with_group_writes() {
    use common::{create_category, input, today};
    use efinance_core::ledger::TransactionType;
    use efinance_db::TransactionRepository;
    use efinance_db::entities::transactions;
    use rust_decimal_macros::dec;
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    let db = setup_db().await;
    let alice = create_user(&db).await;
    let group = create_group(&db, alice.id).await;
    let shared = create_category(&db, alice.id, Some(group), TransactionType::Income).await;

    let writes = (0..5).map(|_| {
        let repo = TransactionRepository::new(db.clone());
        let tx = input(alice.id, Some(group), shared, TransactionType::Income, dec!(10));
        async move { repo.create(tx, today()).await.is_ok() }
    });
    let groups = GroupRepository::new(db.clone());
    let (_, deleted) = tokio::join!(join_all(writes), groups.delete(group));
    deleted.unwrap();

    let orphans = transactions::Entity::find()
        .filter(transactions::Column::GroupId.eq(group))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
    assert!(groups.find_by_id(group).await.unwrap().is_none());
}
