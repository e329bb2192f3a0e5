use serde_json::{Value, json};

use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn invite_and_accept_adds_the_student_to_the_roster() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let invitee = app.seed_student("Marco").await;

    let resp = app
        .post_as(
            &format!("/api/team/{}/invitation", team.id),
            &leader.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": invitee.hex(), "message": "Join us!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let invitation: Value = resp.json().await.unwrap();
    assert_eq!(invitation["status"], "pending");

    let mine: Value = app
        .get_as("/api/invitation", &invitee.hex(), "student")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let resp = app
        .post_as(
            &format!("/api/invitation/{}/respond", invitation["id"].as_str().unwrap()),
            &invitee.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let resolved: Value = resp.json().await.unwrap();
    assert_eq!(resolved["status"], "accepted");

    let roster: Value = app
        .get_as(
            &format!("/api/team/{}/member", team.id),
            &leader.hex(),
            "student",
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(roster.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn only_the_leader_can_invite() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let member = app.seed_student("Marco").await;
    app.post_as("/api/team/join", &member.hex(), "student")
        .json(&json!({ "code": team.join_code }))
        .send()
        .await
        .unwrap();
    let invitee = app.seed_student("Priya").await;

    let resp = app
        .post_as(
            &format!("/api/team/{}/invitation", team.id),
            &member.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn duplicate_pending_invitations_are_rejected() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let invitee = app.seed_student("Marco").await;

    let path = format!("/api/team/{}/invitation", team.id);
    let resp = app
        .post_as(&path, &leader.hex(), "student")
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .post_as(&path, &leader.hex(), "student")
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn declining_leaves_the_roster_unchanged() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let invitee = app.seed_student("Marco").await;

    let invitation: Value = app
        .post_as(
            &format!("/api/team/{}/invitation", team.id),
            &leader.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = app
        .post_as(
            &format!("/api/invitation/{}/respond", invitation["id"].as_str().unwrap()),
            &invitee.hex(),
            "student",
        )
        .json(&json!({ "accept": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let resolved: Value = resp.json().await.unwrap();
    assert_eq!(resolved["status"], "declined");

    let roster: Value = app
        .get_as(
            &format!("/api/team/{}/member", team.id),
            &leader.hex(),
            "student",
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(roster.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn an_invitation_cannot_be_resolved_twice() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let invitee = app.seed_student("Marco").await;

    let invitation: Value = app
        .post_as(
            &format!("/api/team/{}/invitation", team.id),
            &leader.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let respond = format!(
        "/api/invitation/{}/respond",
        invitation["id"].as_str().unwrap()
    );

    let resp = app
        .post_as(&respond, &invitee.hex(), "student")
        .json(&json!({ "accept": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .post_as(&respond, &invitee.hex(), "student")
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn only_the_recipient_can_respond() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let invitee = app.seed_student("Marco").await;
    let bystander = app.seed_student("Priya").await;

    let invitation: Value = app
        .post_as(
            &format!("/api/team/{}/invitation", team.id),
            &leader.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = app
        .post_as(
            &format!("/api/invitation/{}/respond", invitation["id"].as_str().unwrap()),
            &bystander.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn an_expired_invitation_cannot_be_accepted() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let invitee = app.seed_student("Marco").await;

    let invitation_id = app
        .seed_expired_invitation(&team.id, &invitee, &leader)
        .await;

    let resp = app
        .post_as(
            &format!("/api/invitation/{invitation_id}/respond"),
            &invitee.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let roster: Value = app
        .get_as(
            &format!("/api/team/{}/member", team.id),
            &leader.hex(),
            "student",
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(roster.as_array().unwrap().len(), 1);

    // The lazy transition is persisted, not just reported.
    let mine: Value = app
        .get_as("/api/invitation", &invitee.hex(), "student")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine[0]["status"], "expired");
}

#[tokio::test]
async fn listing_invitations_expires_overdue_ones() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let invitee = app.seed_student("Marco").await;
    app.seed_expired_invitation(&team.id, &invitee, &leader)
        .await;

    let mine: Value = app
        .get_as("/api/invitation", &invitee.hex(), "student")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine[0]["status"], "expired");
}

#[tokio::test]
async fn accepting_one_invitation_expires_the_others() {
    let app = TestApp::spawn().await;
    let lena = app.seed_student("Lena").await;
    let team_a = app.create_team(&lena, "Team A").await;
    let priya = app.seed_student("Priya").await;
    let team_b = app.create_team(&priya, "Team B").await;
    let invitee = app.seed_student("Marco").await;

    let first: Value = app
        .post_as(
            &format!("/api/team/{}/invitation", team_a.id),
            &lena.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = app
        .post_as(
            &format!("/api/team/{}/invitation", team_b.id),
            &priya.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = app
        .post_as(
            &format!("/api/invitation/{}/respond", first["id"].as_str().unwrap()),
            &invitee.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let mine: Value = app
        .get_as("/api/invitation", &invitee.hex(), "student")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let sibling = mine
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["id"] == second["id"])
        .expect("sibling invitation missing from the list");
    assert_eq!(sibling["status"], "expired");
}

#[tokio::test]
async fn join_request_flow_admits_the_applicant() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let applicant = app.seed_student("Marco").await;

    let resp = app
        .post_as(
            &format!("/api/team/{}/join-request", team.id),
            &applicant.hex(),
            "student",
        )
        .json(&json!({ "message": "I know axum" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let request: Value = resp.json().await.unwrap();
    assert_eq!(request["status"], "pending");

    let pending: Value = app
        .get_as(
            &format!("/api/team/{}/join-request", team.id),
            &leader.hex(),
            "student",
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let resp = app
        .post_as(
            &format!(
                "/api/team/{}/join-request/{}/respond",
                team.id,
                request["id"].as_str().unwrap()
            ),
            &leader.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let roster: Value = app
        .get_as(
            &format!("/api/team/{}/member", team.id),
            &leader.hex(),
            "student",
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(roster.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn join_requests_require_a_recruiting_team() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app
        .create_team_with(
            &leader,
            json!({ "name": "Closed Shop", "is_public": true, "is_recruiting": false }),
        )
        .await;
    let applicant = app.seed_student("Marco").await;

    let resp = app
        .post_as(
            &format!("/api/team/{}/join-request", team.id),
            &applicant.hex(),
            "student",
        )
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn join_request_survives_invitation_ttl() {
    // Invitations lapse after their deadline; join requests have none
    // and stay answerable no matter how old they are.
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let applicant = app.seed_student("Marco").await;

    let request_id = app.seed_stale_join_request(&team.id, &applicant).await;

    let resp = app
        .post_as(
            &format!("/api/team/{}/join-request/{request_id}/respond", team.id),
            &leader.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let roster: Value = app
        .get_as(
            &format!("/api/team/{}/member", team.id),
            &leader.hex(),
            "student",
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(roster.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn invitations_to_a_full_team_are_rejected() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app
        .create_team_with(
            &leader,
            json!({ "name": "Tiny Team", "is_public": true, "max_team_size": 1 }),
        )
        .await;
    let invitee = app.seed_student("Marco").await;

    let resp = app
        .post_as(
            &format!("/api/team/{}/invitation", team.id),
            &leader.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": invitee.hex() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn accepting_while_already_on_a_team_is_rejected() {
    let app = TestApp::spawn().await;
    let lena = app.seed_student("Lena").await;
    let team_a = app.create_team(&lena, "Team A").await;
    let priya = app.seed_student("Priya").await;
    let team_b = app.create_team(&priya, "Team B").await;
    let student = app.seed_student("Marco").await;

    let invitation: Value = app
        .post_as(
            &format!("/api/team/{}/invitation", team_b.id),
            &priya.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": student.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Joins Team A through the code while the invitation is still open.
    let resp = app
        .post_as("/api/team/join", &student.hex(), "student")
        .json(&json!({ "code": team_a.join_code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .post_as(
            &format!("/api/invitation/{}/respond", invitation["id"].as_str().unwrap()),
            &student.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}
