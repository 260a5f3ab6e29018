mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{parse_body, TestApp};
use meallens_backend::domain::models::invitation::Invitation;
use serde_json::json;

#[tokio::test]
async fn test_invitation_accept_flow() {
    let app = TestApp::new().await;

    let (owner_id, owner_token) = app.register_org_owner("owner@clinic.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Sunrise Clinic", "contact@clinic.test").await;

    // Invite
    let invite_res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "Pat.Patient@Example.COM", "role": "patient", "message": "Welcome!"})),
        )
        .await;
    assert_eq!(invite_res.status(), StatusCode::CREATED);
    let invite_body = parse_body(invite_res).await;
    assert_eq!(invite_body["success"], json!(true));
    assert_eq!(invite_body["email_sent"], json!(true));
    assert_eq!(invite_body["invitation"]["email"], json!("pat.patient@example.com"));
    assert_eq!(invite_body["invitation"]["status"], json!("pending"));
    let invitation_token = invite_body["invitation"]["invitation_token"].as_str().unwrap().to_string();
    let invitation_link = invite_body["invitation_link"].as_str().unwrap();
    assert!(invitation_link.contains(&invitation_token));

    // The invitation email went out synchronously.
    {
        let sent = app.emails.sent.lock().unwrap();
        assert!(sent.iter().any(|(to, _)| to == "pat.patient@example.com"));
    }

    // Verify (public)
    let verify_res = app
        .send(
            "GET",
            &format!("/api/enterprise/invitation/verify/{}", invitation_token),
            None,
            None,
        )
        .await;
    assert_eq!(verify_res.status(), StatusCode::OK);
    let verify_body = parse_body(verify_res).await;
    assert_eq!(verify_body["invitation"]["enterprise_name"], json!("Sunrise Clinic"));
    assert_eq!(verify_body["invitation"]["role"], json!("patient"));

    // Accept as a fresh authenticated user
    let (member_id, member_token) = app.register_user("pat.patient@example.com", json!({"first_name": "Pat"}));
    let accept_res = app
        .send(
            "POST",
            "/api/enterprise/invitation/accept",
            Some(&member_token),
            Some(json!({"token": invitation_token})),
        )
        .await;
    assert_eq!(accept_res.status(), StatusCode::OK);
    let accept_body = parse_body(accept_res).await;
    assert_eq!(accept_body["requires_registration"], json!(false));
    assert_eq!(accept_body["enterprise_name"], json!("Sunrise Clinic"));

    // Membership row exists, invitation is accepted
    let users_res = app
        .send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
        .await;
    let users_body = parse_body(users_res).await;
    let users = users_body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["user_id"], json!(member_id));
    assert_eq!(users[0]["role"], json!("patient"));
    assert_eq!(users[0]["has_accepted_invitation"], json!(true));

    // The owner never shows up in the membership listing.
    assert!(users.iter().all(|u| u["user_id"] != json!(owner_id)));

    let invitations_res = app
        .send("GET", &format!("/api/enterprise/{}/invitations", enterprise_id), Some(&owner_token), None)
        .await;
    let invitations_body = parse_body(invitations_res).await;
    assert_eq!(invitations_body["invitations"][0]["status"], json!("accepted"));
    assert_eq!(invitations_body["invitations"][0]["accepted_by"], json!(member_id));

    // Accepting again must not create a duplicate membership.
    let second_accept = app
        .send(
            "POST",
            "/api/enterprise/invitation/accept",
            Some(&member_token),
            Some(json!({"token": invitation_token})),
        )
        .await;
    assert_eq!(second_accept.status(), StatusCode::BAD_REQUEST);

    let users_res = app
        .send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
        .await;
    let users_body = parse_body(users_res).await;
    assert_eq!(users_body["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_anonymous_accept_then_complete() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@gym.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Iron Gym", "contact@gym.test").await;

    let invite_res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "newbie@example.com", "role": "client"})),
        )
        .await;
    let invite_body = parse_body(invite_res).await;
    let invitation_token = invite_body["invitation"]["invitation_token"].as_str().unwrap().to_string();
    let invitation_id = invite_body["invitation"]["id"].as_str().unwrap().to_string();

    // Anonymous accept defers membership creation to after registration.
    let accept_res = app
        .send(
            "POST",
            "/api/enterprise/invitation/accept",
            None,
            Some(json!({"token": invitation_token})),
        )
        .await;
    assert_eq!(accept_res.status(), StatusCode::OK);
    let accept_body = parse_body(accept_res).await;
    assert_eq!(accept_body["requires_registration"], json!(true));
    assert_eq!(accept_body["invitation"]["enterprise_name"], json!("Iron Gym"));

    let (member_id, member_token) = app.register_user("newbie@example.com", json!({}));
    let complete_res = app
        .send(
            "POST",
            "/api/enterprise/invitation/complete",
            Some(&member_token),
            Some(json!({"invitation_id": invitation_id})),
        )
        .await;
    assert_eq!(complete_res.status(), StatusCode::OK);

    let users_body = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    let users = users_body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["user_id"], json!(member_id));
    assert_eq!(users[0]["role"], json!("client"));

    // Completing twice stays idempotent with respect to membership.
    let complete_again = app
        .send(
            "POST",
            "/api/enterprise/invitation/complete",
            Some(&member_token),
            Some(json!({"invitation_id": invitation_id})),
        )
        .await;
    assert_eq!(complete_again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_only_while_pending() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@spa.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Calm Spa", "contact@spa.test").await;

    let invite_body = parse_body(
        app.send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "guest@example.com"})),
        )
        .await,
    )
    .await;
    let invitation_id = invite_body["invitation"]["id"].as_str().unwrap().to_string();
    let invitation_token = invite_body["invitation"]["invitation_token"].as_str().unwrap().to_string();

    let cancel_res = app
        .send(
            "POST",
            &format!("/api/enterprise/invitation/{}/cancel", invitation_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(cancel_res.status(), StatusCode::OK);

    // Cancelled is terminal: no second cancel, no verify, no accept.
    let cancel_again = app
        .send(
            "POST",
            &format!("/api/enterprise/invitation/{}/cancel", invitation_id),
            Some(&owner_token),
            None,
        )
        .await;
    assert_eq!(cancel_again.status(), StatusCode::BAD_REQUEST);

    let verify_res = app
        .send("GET", &format!("/api/enterprise/invitation/verify/{}", invitation_token), None, None)
        .await;
    assert_eq!(verify_res.status(), StatusCode::BAD_REQUEST);
    let verify_body = parse_body(verify_res).await;
    assert_eq!(verify_body["error"], json!("Invitation is cancelled"));

    let (_, guest_token) = app.register_user("guest@example.com", json!({}));
    let accept_res = app
        .send(
            "POST",
            "/api/enterprise/invitation/accept",
            Some(&guest_token),
            Some(json!({"token": invitation_token})),
        )
        .await;
    assert_eq!(accept_res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_invitation_rejected_even_if_pending() {
    let app = TestApp::new().await;

    let (owner_id, owner_token) = app.register_org_owner("owner@lab.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Night Lab", "contact@lab.test").await;

    let mut invitation = Invitation::new(
        enterprise_id.clone(),
        "slow@example.com".to_string(),
        owner_id,
        "patient".to_string(),
        None,
    );
    invitation.expires_at = Utc::now() - Duration::days(1);
    app.state.invitation_repo.create(&invitation).await.unwrap();

    let verify_res = app
        .send(
            "GET",
            &format!("/api/enterprise/invitation/verify/{}", invitation.invitation_token),
            None,
            None,
        )
        .await;
    assert_eq!(verify_res.status(), StatusCode::BAD_REQUEST);
    let verify_body = parse_body(verify_res).await;
    assert_eq!(verify_body["error"], json!("Invitation has expired"));

    let (_, token) = app.register_user("slow@example.com", json!({}));
    let accept_res = app
        .send(
            "POST",
            "/api/enterprise/invitation/accept",
            Some(&token),
            Some(json!({"token": invitation.invitation_token})),
        )
        .await;
    assert_eq!(accept_res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invite_validation_rules() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@farm.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Green Farm", "contact@farm.test").await;

    // Missing email
    let res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"role": "patient"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Unknown role
    let res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "cook@example.com", "role": "chef"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // "doctors" is normalized to "doctor"
    let res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "doc@example.com", "role": "doctors"})),
        )
        .await;
    let body = parse_body(res).await;
    assert_eq!(body["invitation"]["role"], json!("doctor"));

    // Second pending invitation for the same email
    let res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "doc@example.com"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // An email that already has an account cannot be invited
    app.register_user("taken@example.com", json!({}));
    let res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "taken@example.com"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = parse_body(res).await;
    assert!(body["error"].as_str().unwrap().contains("already has an account"));
}

#[tokio::test]
async fn test_invite_rejected_at_user_limit() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@dojo.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Quiet Dojo", "contact@dojo.test").await;

    let update_res = app
        .send(
            "PUT",
            &format!("/api/enterprise/{}", enterprise_id),
            Some(&owner_token),
            Some(json!({"max_users": 1})),
        )
        .await;
    assert_eq!(update_res.status(), StatusCode::OK);

    app.add_member(&owner_token, &enterprise_id, "first@example.com", "client").await;

    let res = app
        .send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "second@example.com"})),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["error"], json!("Maximum user limit (1) reached"));
}

#[tokio::test]
async fn test_auto_accept_on_session_sync() {
    let app = TestApp::new().await;

    let (_, owner_token) = app.register_org_owner("owner@team.test");
    let enterprise_id = app.create_enterprise(&owner_token, "Team Org", "contact@team.test").await;

    let invite_body = parse_body(
        app.send(
            "POST",
            &format!("/api/enterprise/{}/invite", enterprise_id),
            Some(&owner_token),
            Some(json!({"email": "late.joiner@example.com", "role": "nutritionist"})),
        )
        .await,
    )
    .await;
    let invitation_id = invite_body["invitation"]["id"].as_str().unwrap().to_string();

    // The invitee registers later and simply logs in.
    let (member_id, member_token) = app.register_user("late.joiner@example.com", json!({}));
    let session_res = app.send("POST", "/api/auth/session", Some(&member_token), None).await;
    assert_eq!(session_res.status(), StatusCode::OK);
    let session_body = parse_body(session_res).await;
    assert_eq!(session_body["accepted_invitations"], json!([invitation_id]));

    let users_body = parse_body(
        app.send("GET", &format!("/api/enterprise/{}/users", enterprise_id), Some(&owner_token), None)
            .await,
    )
    .await;
    let users = users_body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["user_id"], json!(member_id));
    assert_eq!(users[0]["role"], json!("nutritionist"));

    // Running the sync again accepts nothing new.
    let session_body = parse_body(app.send("POST", "/api/auth/session", Some(&member_token), None).await).await;
    assert_eq!(session_body["accepted_invitations"], json!([]));
}
