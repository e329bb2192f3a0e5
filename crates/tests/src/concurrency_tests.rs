use serde_json::{Value, json};

use crate::fixtures::test_app::TestApp;

/// Two students race for the last open slot through the join code.
/// The per-team lock serializes admission, so exactly one gets in and
/// the other sees a capacity conflict.
#[tokio::test]
async fn racing_joins_for_the_last_slot_admit_exactly_one() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app
        .create_team_with(
            &leader,
            json!({ "name": "Tiny Team", "is_public": true, "max_team_size": 2 }),
        )
        .await;
    let first = app.seed_student("Marco").await;
    let second = app.seed_student("Priya").await;

    let join_a = app
        .post_as("/api/team/join", &first.hex(), "student")
        .json(&json!({ "code": team.join_code }))
        .send();
    let join_b = app
        .post_as("/api/team/join", &second.hex(), "student")
        .json(&json!({ "code": team.join_code }))
        .send();
    let (resp_a, resp_b) = tokio::join!(join_a, join_b);

    let mut statuses = [
        resp_a.unwrap().status().as_u16(),
        resp_b.unwrap().status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, [200, 409]);

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

/// Two pending invitations, one open slot. Whichever acceptance loses
/// the race hits the capacity check under the lock and conflicts.
#[tokio::test]
async fn racing_invitation_accepts_cannot_overfill_the_team() {
    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app
        .create_team_with(
            &leader,
            json!({ "name": "Tiny Team", "is_public": true, "max_team_size": 2 }),
        )
        .await;
    let first = app.seed_student("Marco").await;
    let second = app.seed_student("Priya").await;

    let invite_path = format!("/api/team/{}/invitation", team.id);
    let invitation_a: Value = app
        .post_as(&invite_path, &leader.hex(), "student")
        .json(&json!({ "recipient_id": first.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let invitation_b: Value = app
        .post_as(&invite_path, &leader.hex(), "student")
        .json(&json!({ "recipient_id": second.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let accept_a = app
        .post_as(
            &format!(
                "/api/invitation/{}/respond",
                invitation_a["id"].as_str().unwrap()
            ),
            &first.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send();
    let accept_b = app
        .post_as(
            &format!(
                "/api/invitation/{}/respond",
                invitation_b["id"].as_str().unwrap()
            ),
            &second.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send();
    let (resp_a, resp_b) = tokio::join!(accept_a, accept_b);

    let mut statuses = [
        resp_a.unwrap().status().as_u16(),
        resp_b.unwrap().status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, [200, 409]);

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

/// One student, two invitations from two different teams, both accepted
/// at once. The team locks alone would let both accepts pass the
/// free-agent check; the per-student lock serializes them so the second
/// one sees the fresh membership and conflicts.
#[tokio::test]
async fn racing_accepts_across_teams_place_the_student_once() {
    let app = TestApp::spawn().await;
    let lena = app.seed_student("Lena").await;
    let team_a = app.create_team(&lena, "Team A").await;
    let priya = app.seed_student("Priya").await;
    let team_b = app.create_team(&priya, "Team B").await;
    let student = app.seed_student("Marco").await;

    let invitation_a: Value = app
        .post_as(
            &format!("/api/team/{}/invitation", team_a.id),
            &lena.hex(),
            "student",
        )
        .json(&json!({ "recipient_id": student.hex() }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let invitation_b: Value = app
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

    let accept_a = app
        .post_as(
            &format!(
                "/api/invitation/{}/respond",
                invitation_a["id"].as_str().unwrap()
            ),
            &student.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send();
    let accept_b = app
        .post_as(
            &format!(
                "/api/invitation/{}/respond",
                invitation_b["id"].as_str().unwrap()
            ),
            &student.hex(),
            "student",
        )
        .json(&json!({ "accept": true }))
        .send();
    let (resp_a, resp_b) = tokio::join!(accept_a, accept_b);

    let mut statuses = [
        resp_a.unwrap().status().as_u16(),
        resp_b.unwrap().status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, [200, 409]);

    let memberships: Value = app
        .get_as("/api/team", &student.hex(), "student")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(memberships.as_array().unwrap().len(), 1);
}

/// The same race through the join codes of two different teams.
#[tokio::test]
async fn racing_code_joins_across_teams_place_the_student_once() {
    let app = TestApp::spawn().await;
    let lena = app.seed_student("Lena").await;
    let team_a = app.create_team(&lena, "Team A").await;
    let priya = app.seed_student("Priya").await;
    let team_b = app.create_team(&priya, "Team B").await;
    let student = app.seed_student("Marco").await;

    let join_a = app
        .post_as("/api/team/join", &student.hex(), "student")
        .json(&json!({ "code": team_a.join_code }))
        .send();
    let join_b = app
        .post_as("/api/team/join", &student.hex(), "student")
        .json(&json!({ "code": team_b.join_code }))
        .send();
    let (resp_a, resp_b) = tokio::join!(join_a, join_b);

    let mut statuses = [
        resp_a.unwrap().status().as_u16(),
        resp_b.unwrap().status().as_u16(),
    ];
    statuses.sort();
    assert_eq!(statuses, [200, 409]);

    let memberships: Value = app
        .get_as("/api/team", &student.hex(), "student")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(memberships.as_array().unwrap().len(), 1);
}

/// The denormalized profile pointer is written after the lock is
/// released; it converges shortly after the admission.
#[tokio::test]
async fn the_profile_pointer_converges_after_a_join() {
    use bson::doc;
    use teamforge_db::models::Student;

    let app = TestApp::spawn().await;
    let leader = app.seed_student("Lena").await;
    let team = app.create_team(&leader, "Rust Rovers").await;
    let joiner = app.seed_student("Marco").await;

    let resp = app
        .post_as("/api/team/join", &joiner.hex(), "student")
        .json(&json!({ "code": team.join_code }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let students = app.db.collection::<Student>(Student::COLLECTION);
    let team_oid = bson::oid::ObjectId::parse_str(&team.id).unwrap();
    let mut synced = false;
    for _ in 0..50 {
        let student = students
            .find_one(doc! { "_id": joiner.id })
            .await
            .unwrap()
            .expect("seeded student vanished");
        if student.team_id == Some(team_oid) {
            synced = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    assert!(synced, "profile pointer never caught up with the roster");
}
