mod common;

use axum::http::StatusCode;
use common::{parse_body, TestApp};
use meallens_backend::domain::models::settings::SettingsHistoryEntry;
use serde_json::json;

#[tokio::test]
async fn test_settings_save_and_history_diff() {
    let app = TestApp::new().await;

    let (_, token) = app.register_user("health@example.com", json!({}));

    // First save
    let res = app
        .send(
            "POST",
            "/api/settings",
            Some(&token),
            Some(json!({"settings_data": {"age": 30, "gender": "female", "goal": "maintain"}})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["settings"]["age"], json!(30));
    assert_eq!(body["settings_type"], json!("health_profile"));

    // Change only the age
    let res = app
        .send(
            "POST",
            "/api/settings",
            Some(&token),
            Some(json!({"settings_data": {"age": 31, "gender": "female", "goal": "maintain"}})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let history = parse_body(app.send("GET", "/api/settings/history", Some(&token), None).await).await;
    assert_eq!(history["count"], json!(2));
    // Newest first; the latest entry records exactly the one changed field.
    assert_eq!(history["history"][0]["changed_fields"], json!(["age"]));
    assert_eq!(history["history"][0]["previous_settings_data"]["age"], json!(30));
    assert_eq!(history["history"][0]["settings_data"]["age"], json!(31));
    // The first save recorded its populated expected fields.
    assert_eq!(history["history"][1]["changed_fields"], json!(["age", "gender", "goal"]));

    // Current value reads back
    let settings = parse_body(app.send("GET", "/api/settings", Some(&token), None).await).await;
    assert_eq!(settings["settings"]["age"], json!(31));
}

#[tokio::test]
async fn test_settings_validation_and_defaults() {
    let app = TestApp::new().await;

    let (_, token) = app.register_user("empty@example.com", json!({}));

    // Empty settings refuse to save
    let res = app
        .send("POST", "/api/settings", Some(&token), Some(json!({"settings_data": {}})))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .send("POST", "/api/settings", Some(&token), Some(json!({})))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Missing settings read back as an empty object, not an error
    let body = parse_body(app.send("GET", "/api/settings", Some(&token), None).await).await;
    assert_eq!(body["settings"], json!({}));
    assert_eq!(body["message"], json!("No settings found"));

    // History limit parameter
    for age in 20..25 {
        app.send(
            "POST",
            "/api/settings",
            Some(&token),
            Some(json!({"settings_data": {"age": age}})),
        )
        .await;
    }
    let history = parse_body(
        app.send("GET", "/api/settings/history?limit=2", Some(&token), None)
            .await,
    )
    .await;
    assert_eq!(history["count"], json!(2));
}

#[tokio::test]
async fn test_delete_history_record_scoped_to_owner() {
    let app = TestApp::new().await;

    let (_, token) = app.register_user("mine@example.com", json!({}));
    let (_, thief_token) = app.register_user("thief@example.com", json!({}));

    app.send(
        "POST",
        "/api/settings",
        Some(&token),
        Some(json!({"settings_data": {"age": 40}})),
    )
    .await;

    let history = parse_body(app.send("GET", "/api/settings/history", Some(&token), None).await).await;
    let record_id = history["history"][0]["id"].as_str().unwrap().to_string();

    // Someone else's record id does not delete
    let res = app
        .send(
            "DELETE",
            &format!("/api/settings/history/{}", record_id),
            Some(&thief_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .send("DELETE", &format!("/api/settings/history/{}", record_id), Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let history = parse_body(app.send("GET", "/api/settings/history", Some(&token), None).await).await;
    assert_eq!(history["count"], json!(0));
}

#[tokio::test]
async fn test_admin_member_settings_flow() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@adminset.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Admin Set", "contact@adminset.test").await;
    let (member_id, member_token) = app
        .add_member(&owner_token, &enterprise_id, "settings.target@example.com", "patient")
        .await;

    // Admin writes the member's settings; history is recorded.
    let res = app
        .send(
            "PUT",
            &format!("/api/enterprise/{}/user/{}/settings", enterprise_id, member_id),
            Some(&owner_token),
            Some(json!({"settings_data": {"age": 55, "goal": "cut"}})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = parse_body(
        app.send(
            "GET",
            &format!("/api/enterprise/{}/user/{}/settings", enterprise_id, member_id),
            Some(&owner_token),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(body["settings"]["age"], json!(55));
    assert_eq!(body["user_email"], json!("settings.target@example.com"));

    // The member sees the same settings through the self endpoint.
    let body = parse_body(app.send("GET", "/api/settings", Some(&member_token), None).await).await;
    assert_eq!(body["settings"]["age"], json!(55));

    // A non-member target 404s.
    let (outsider_id, _) = app.register_user("not.in.org@example.com", json!({}));
    let res = app
        .send(
            "GET",
            &format!("/api/enterprise/{}/user/{}/settings", enterprise_id, outsider_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enterprise_settings_history_filters_artifacts() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@history.test");
    let enterprise_id = app.create_enterprise(&owner_token, "History Org", "contact@history.test").await;
    let (member_id, member_token) = app
        .add_member(&owner_token, &enterprise_id, "tracked@example.com", "patient")
        .await;

    app.send(
        "POST",
        "/api/settings",
        Some(&member_token),
        Some(json!({"settings_data": {"age": 22}})),
    )
    .await;

    // A legacy row with array-index artifacts in changed_fields.
    let legacy = SettingsHistoryEntry::new(
        member_id.clone(),
        "health_profile".to_string(),
        json!({"age": 23}),
        json!({"age": 22}),
        vec!["age".to_string(), "0 (removed)".to_string(), "3 (removed)".to_string()],
    );
    app.state.settings_repo.append_history(&legacy).await.unwrap();

    let body = parse_body(
        app.send(
            "GET",
            &format!("/api/enterprise/{}/settings-history", enterprise_id),
            Some(&owner_token),
            None,
        )
        .await,
    )
    .await;

    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    for record in history {
        assert_eq!(record["user_email"], json!("tracked@example.com"));
        let fields = record["changed_fields"].as_array().unwrap();
        assert!(fields.iter().all(|f| !f.as_str().unwrap().contains("(removed)")));
    }
}
