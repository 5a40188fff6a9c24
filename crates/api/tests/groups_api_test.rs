//! API tests for groups, membership roles and group statistics.

mod common;

use axum::http::StatusCode;
use common::{TestApp, decimal, id_of};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn test_group_transactions_move_group_balance() {
    let app = TestApp::new().await;
    let admin = app.register().await;
    let member = app.register().await;
    let group = app.group(&admin).await;

    let (status, _) = app
        .post(&format!("/groups/{group}/join"), &member.access_token, json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let rent = app.category(&admin, "expense", Some(group)).await;
    let dues = app.category(&member, "income", Some(group)).await;

    let (status, _) = app.transaction(&member, "income", "300", dues, Some(group)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.transaction(&admin, "expense", "120", rent, Some(group)).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(app.balance(&admin).await, Decimal::ZERO);
    assert_eq!(app.balance(&member).await, Decimal::ZERO);

    let (status, summary) = app
        .get(&format!("/groups/{group}/summary"), &member.access_token)
        .await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(decimal(&summary["balance"]), Decimal::from(180));
    assert_eq!(summary["members_count"], 2);
    assert_eq!(summary["stats"]["transaction_count"], 2);

    let (status, contributions) = app
        .get(&format!("/groups/{group}/contributions"), &admin.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rows = contributions.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let member_row = rows
        .iter()
        .find(|row| row["user_id"] == member.id.to_string())
        .expect("member contribution");
    assert_eq!(decimal(&member_row["total_income"]), Decimal::from(300));

    let (status, listed) = app.get("/transactions", &admin.access_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["meta"]["total"], 2);
}

#[tokio::test]
async fn test_viewers_and_outsiders() {
    let app = TestApp::new().await;
    let admin = app.register().await;
    let viewer = app.register().await;
    let outsider = app.register().await;
    let group = app.group(&admin).await;
    let rent = app.category(&admin, "expense", Some(group)).await;

    let (status, body) = app
        .post(
            &format!("/groups/{group}/members"),
            &admin.access_token,
            json!({ "user_id": viewer.id, "role": "viewer" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app.transaction(&viewer, "expense", "10", rent, Some(group)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "READ_ONLY_MEMBER");

    let (status, _) = app
        .get(&format!("/groups/{group}/members"), &viewer.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get(&format!("/groups/{group}/summary"), &outsider.access_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.transaction(&outsider, "expense", "10", rent, Some(group)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_GROUP_MEMBER");

    let (status, _) = app
        .post(
            &format!("/groups/{group}/members"),
            &viewer.access_token,
            json!({ "user_id": outsider.id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            &format!("/groups/{group}/members"),
            &admin.access_token,
            json!({ "user_id": outsider.id, "role": "owner" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ROLE");
}

#[tokio::test]
async fn test_last_admin_is_protected() {
    let app = TestApp::new().await;
    let admin = app.register().await;
    let member = app.register().await;
    let group = app.group(&admin).await;
    app.post(&format!("/groups/{group}/join"), &member.access_token, json!({}))
        .await;

    let (status, body) = app
        .post(&format!("/groups/{group}/leave"), &admin.access_token, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "LAST_ADMIN_LEAVE");

    let (status, body) = app
        .patch(
            &format!("/groups/{group}/members/{}", admin.id),
            &admin.access_token,
            json!({ "role": "member" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "LAST_ADMIN_DEMOTION");

    let (status, _) = app
        .patch(
            &format!("/groups/{group}/members/{}", member.id),
            &admin.access_token,
            json!({ "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(&format!("/groups/{group}/leave"), &admin.access_token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, members) = app
        .get(&format!("/groups/{group}/members"), &member.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_group_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.register().await;
    let member = app.register().await;

    let (status, body) = app
        .post("/groups", &admin.access_token, json!({ "name": "ab" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_GROUP_NAME");

    let group = app.group(&admin).await;
    let (status, body) = app
        .get(&format!("/groups/{group}"), &admin.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["my_role"], "admin");

    app.post(&format!("/groups/{group}/join"), &member.access_token, json!({}))
        .await;
    let (status, body) = app
        .post(&format!("/groups/{group}/join"), &member.access_token, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ALREADY_MEMBER");

    let (status, _) = app
        .patch(
            &format!("/groups/{group}"),
            &member.access_token,
            json!({ "name": "Renamed" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch(
            &format!("/groups/{group}"),
            &admin.access_token,
            json!({ "name": "Renamed", "description": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Renamed");

    let rent = app.category(&admin, "expense", Some(group)).await;
    let (_, created) = app.transaction(&member, "expense", "40", rent, Some(group)).await;
    let transaction = id_of(&created);

    let (status, _) = app
        .delete(&format!("/groups/{group}"), &member.access_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .delete(&format!("/groups/{group}"), &admin.access_token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .get(&format!("/transactions/{transaction}"), &member.access_token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get(&format!("/groups/{group}"), &admin.access_token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_transaction_changes_follow_current_role() {
    let app = TestApp::new().await;
    let admin = app.register().await;
    let member = app.register().await;
    let group = app.group(&admin).await;
    app.post(&format!("/groups/{group}/join"), &member.access_token, json!({}))
        .await;

    let rent = app.category(&admin, "expense", Some(group)).await;
    let dues = app.category(&admin, "income", Some(group)).await;
    let (_, expense) = app.transaction(&member, "expense", "40", rent, Some(group)).await;
    let (_, income) = app.transaction(&member, "income", "100", dues, Some(group)).await;
    let expense = id_of(&expense);
    let income = id_of(&income);

    let (status, body) = app
        .patch(
            &format!("/groups/{group}/members/{}", member.id),
            &admin.access_token,
            json!({ "role": "viewer" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = app
        .patch(
            &format!("/transactions/{expense}"),
            &member.access_token,
            json!({ "amount": "5" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "READ_ONLY_MEMBER");

    let (status, body) = app
        .delete(&format!("/transactions/{expense}"), &member.access_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "READ_ONLY_MEMBER");

    let (status, body) = app
        .patch(
            &format!("/transactions/{expense}"),
            &admin.access_token,
            json!({ "amount": "10" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = app
        .post(&format!("/groups/{group}/leave"), &member.access_token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .delete(&format!("/transactions/{income}"), &member.access_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_GROUP_MEMBER");

    let (status, summary) = app
        .get(&format!("/groups/{group}/summary"), &admin.access_token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&summary["balance"]), Decimal::from(90));
}

#[tokio::test]
async fn test_members_cannot_change_each_others_transactions() {
    let app = TestApp::new().await;
    let admin = app.register().await;
    let first = app.register().await;
    let second = app.register().await;
    let group = app.group(&admin).await;
    for user in [&first, &second] {
        app.post(&format!("/groups/{group}/join"), &user.access_token, json!({}))
            .await;
    }

    let rent = app.category(&admin, "expense", Some(group)).await;
    let (_, created) = app.transaction(&first, "expense", "30", rent, Some(group)).await;
    let id = id_of(&created);

    let (status, body) = app
        .delete(&format!("/transactions/{id}"), &second.access_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "NOT_TRANSACTION_AUTHOR");

    let (status, _) = app
        .delete(&format!("/transactions/{id}"), &admin.access_token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_group_activity_feed() {
    let app = TestApp::new().await;
    let admin = app.register().await;
    let member = app.register().await;
    let outsider = app.register().await;
    let group = app.group(&admin).await;
    app.post(&format!("/groups/{group}/join"), &member.access_token, json!({}))
        .await;

    let rent = app.category(&admin, "expense", Some(group)).await;
    let dues = app.category(&admin, "income", Some(group)).await;
    app.transaction(&member, "income", "250", dues, Some(group)).await;
    app.transaction(&admin, "expense", "50", rent, Some(group)).await;

    let (status, activity) = app
        .get(&format!("/groups/{group}/activity"), &member.access_token)
        .await;
    assert_eq!(status, StatusCode::OK, "{activity}");
    assert_eq!(activity["recent_transactions"].as_array().unwrap().len(), 2);
    assert_eq!(activity["recent_members"].as_array().unwrap().len(), 2);
    assert_eq!(activity["group_stats"]["member_count"], 2);
    assert_eq!(activity["group_stats"]["new_member_count"], 2);
    assert_eq!(decimal(&activity["group_stats"]["balance"]), Decimal::from(200));
    assert_eq!(activity["group_stats"]["stats"]["transaction_count"], 2);

    let (status, _) = app
        .get(&format!("/groups/{group}/activity"), &outsider.access_token)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
