mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_admin_creates_user_directly() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@direct.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Direct Org", "contact@direct.test").await;

    let res = app
        .send(
            "POST",
            "/api/enterprise/create-user",
            Some(&owner_token),
            Some(json!({
                "enterprise_id": enterprise_id,
                "first_name": "Nora",
                "last_name": "Nutritionist",
                "email": "nora@example.com",
                "password": "long-enough-secret",
                "role": "nutritionist"
            })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    assert_eq!(body["user"]["email"], json!("nora@example.com"));
    assert_eq!(body["user"]["enterprise_name"], json!("Direct Org"));
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    // Account exists and membership row was written.
    let account = app.state.identity.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(account.first_name(), "Nora");

    let users = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    let listed = users["users"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["first_name"], json!("Nora"));
    assert_eq!(listed[0]["role"], json!("nutritionist"));
    assert_eq!(listed[0]["has_accepted_invitation"], json!(false));

    // Duplicate email is refused.
    let res = app
        .send(
            "POST",
            "/api/enterprise/create-user",
            Some(&owner_token),
            Some(json!({
                "enterprise_id": enterprise_id,
                "first_name": "Copy",
                "last_name": "Cat",
                "email": "nora@example.com",
                "password": "long-enough-secret",
                "role": "client"
            })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Missing fields are refused.
    let res = app
        .send(
            "POST",
            "/api/enterprise/create-user",
            Some(&owner_token),
            Some(json!({"enterprise_id": enterprise_id, "email": "half@example.com"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_remove_membership() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@edit.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Edit Org", "contact@edit.test").await;
    app.add_member(&owner_token, &enterprise_id, "editable@example.com", "client").await;

    let users = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    let relation_id = users["users"][0]["id"].as_str().unwrap().to_string();

    let res = app
        .send(
            "PUT",
            &format!("/api/enterprise/{}/user/{}", enterprise_id, relation_id),
            Some(&owner_token),
            Some(json!({"status": "inactive", "notes": "on leave", "role": "patient"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let users = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    assert_eq!(users["users"][0]["status"], json!("inactive"));
    assert_eq!(users["users"][0]["notes"], json!("on leave"));
    assert_eq!(users["users"][0]["role"], json!("patient"));

    let res = app
        .send(
            "DELETE",
            &format!("/api/enterprise/{}/user/{}", enterprise_id, relation_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let users = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    assert_eq!(users["users"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_plain_members_cannot_manage() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@locked.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Locked Org", "contact@locked.test").await;
    let (_, patient_token) = app
        .add_member(&owner_token, &enterprise_id, "justapatient@example.com", "patient")
        .await;

    let res = app
        .send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&patient_token), None)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = parse_body(res).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("does not have permission"));

    let res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&patient_token),
            Some(json!({"email": "friend@example.com"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // A non-member is denied with a different reason.
    let (_, stranger_token) = app.register_user("stranger@example.com", json!({}));
    let res = app
        .send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&stranger_token), None)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = parse_body(res).await;
    assert!(body["error"].as_str().unwrap().contains("not a member"));
}

#[tokio::test]
async fn test_admin_member_can_manage_but_not_purge() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@tiers.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Tiered Org", "contact@tiers.test").await;

    // Promote one member to admin.
    app.add_member(&owner_token, &enterprise_id, "deputy@example.com", "client").await;
    let users = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    let deputy_relation = users["users"][0]["id"].as_str().unwrap().to_string();
    app.send(
        "PUT",
        &format!("/api/enterprise/{}/user/{}", enterprise_id, deputy_relation),
        Some(&owner_token),
        Some(json!({"role": "admin"})),
    )
    .await;

    let deputy_token = {
        let deputy_id = users["users"][0]["user_id"].as_str().unwrap();
        app.identity.issue_token(deputy_id)
    };

    // Admin members can invite.
    let res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&deputy_token),
            Some(json!({"email": "recruit@example.com"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let (victim_id, _) = app
        .add_member(&owner_token, &enterprise_id, "victim@example.com", "patient")
        .await;
    let users = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    let victim_relation = users["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["user_id"] == json!(victim_id))
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // The purge endpoint is owner-only; an admin member is refused.
    let res = app
        .send(
            "DELETE",
            &format!("/api/enterprise/user/{}", victim_relation),
            Some(&deputy_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The owner can purge, and everything about the user disappears.
    let res = app
        .send(
            "DELETE",
            &format!("/api/enterprise/user/{}", victim_relation),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["success"], json!(true));
    assert!(!body["deletion_log"].as_array().unwrap().is_empty());

    assert!(app.state.identity.get_user(&victim_id).await.unwrap().is_none());
    let users = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    assert!(users["users"]
        .as_array()
        .unwrap()
        .iter()
        .all(|u| u["user_id"] != json!(victim_id)));
}
