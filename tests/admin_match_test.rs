use reqwest::{Client, Method};
use serde_json::{json, Value};
use uuid::Uuid;

mod common;
use common::utils::{spawn_app, TEST_CHAT_ID};
use common::admin_helpers::{
    create_match, get_match_winners, make_admin_request, set_true_score, submit_prediction, update_match,
};
use scorecast_backend::models::prediction::NewPrediction;
use scorecast_backend::models::score::Score;

#[tokio::test]
async fn admin_create_match_builds_display_name() {
    let app = spawn_app().await;

    let fixture = create_match(&app, "  Galatasaray ", "Fenerbahce").await;

    assert_eq!(fixture["name"], "Galatasaray-Fenerbahce");
    assert_eq!(fixture["home_team"], "Galatasaray");
    assert_eq!(fixture["status"], "active");
    assert!(fixture["true_score"].is_null());
}

#[tokio::test]
async fn admin_create_match_rejects_empty_team() {
    let app = spawn_app().await;
    let client = Client::new();

    let response = make_admin_request(
        &client,
        Method::POST,
        &format!("{}/admin/matches", app.address),
        &app.admin_token,
        Some(json!({ "home_team": "", "away_team": "Roma" })),
    ).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn admin_create_match_rejects_names_over_the_length_limit() {
    let app = spawn_app().await;
    let client = Client::new();
    let create = |home: String, away: String| {
        let client = client.clone();
        let url = format!("{}/admin/matches", app.address);
        let token = app.admin_token.clone();
        async move {
            make_admin_request(&client, Method::POST, &url, &token, Some(json!({
                "home_team": home,
                "away_team": away,
            }))).await
        }
    };

    let long_team = create("h".repeat(101), "Roma".to_string()).await;
    assert_eq!(400, long_team.status().as_u16());

    // Each team fits but "home-away" is 201 characters
    let long_name = create("h".repeat(100), "a".repeat(100)).await;
    assert_eq!(400, long_name.status().as_u16());
    let body: Value = long_name.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let fits = create("h".repeat(100), "a".repeat(99)).await;
    assert_eq!(201, fits.status().as_u16());
}

#[tokio::test]
async fn admin_update_keeps_fields_left_out_of_the_request() {
    let app = spawn_app().await;
    let fixture = create_match(&app, "Porto", "Benfica").await;
    let match_id = fixture["id"].as_str().unwrap();

    let response = update_match(&app, match_id, json!({
        "home_team": "Porto",
        "away_team": "Benfica",
        "scheduled_at": "2026-05-01T18:00:00Z",
        "status": "closed",
    })).await;
    assert_eq!(200, response.status().as_u16());

    let body = set_true_score(&app, &fixture, Some("2-1")).await;
    assert_eq!(body["data"]["match"]["status"], "closed");
    assert_eq!(body["data"]["match"]["true_score"], "2-1");
    assert!(!body["data"]["match"]["scheduled_at"].is_null());

    let late = submit_prediction(&app, 9, "late", match_id, "2-1").await;
    assert_eq!(400, late.status().as_u16());

    let response = update_match(&app, match_id, json!({
        "home_team": "Porto",
        "away_team": "Benfica",
        "scheduled_at": null,
    })).await;
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["match"]["scheduled_at"].is_null());
    assert_eq!(body["data"]["match"]["status"], "closed");
    assert_eq!(body["data"]["match"]["true_score"], "2-1");
}

#[tokio::test]
async fn admin_update_rejects_malformed_true_score() {
    let app = spawn_app().await;
    let fixture = create_match(&app, "Ajax", "PSV").await;

    let response = update_match(&app, fixture["id"].as_str().unwrap(), json!({
        "home_team": "Ajax",
        "away_team": "PSV",
        "true_score": "two-one",
    })).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn admin_get_unknown_match_returns_404() {
    let app = spawn_app().await;
    let client = Client::new();

    let response = make_admin_request(
        &client,
        Method::GET,
        &format!("{}/admin/matches/{}", app.address, Uuid::new_v4()),
        &app.admin_token,
        None,
    ).await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn admin_match_list_includes_prediction_counts() {
    let app = spawn_app().await;
    let client = Client::new();
    let busy = create_match(&app, "Busy", "Match").await;
    let _quiet = create_match(&app, "Quiet", "Match").await;
    submit_prediction(&app, 1, "a", busy["id"].as_str().unwrap(), "1-0").await;
    submit_prediction(&app, 2, "b", busy["id"].as_str().unwrap(), "2-0").await;

    let response = make_admin_request(
        &client,
        Method::GET,
        &format!("{}/admin/matches", app.address),
        &app.admin_token,
        None,
    ).await;

    let body: Value = response.json().await.unwrap();
    let matches = body["data"].as_array().unwrap();
    let count_of = |name: &str| {
        matches
            .iter()
            .find(|m| m["name"] == name)
            .map(|m| m["prediction_count"].as_i64().unwrap())
            .unwrap()
    };
    assert_eq!(count_of("Busy-Match"), 2);
    assert_eq!(count_of("Quiet-Match"), 0);
}

#[tokio::test]
async fn deleting_a_match_removes_its_predictions_and_winners() {
    // Arrange
    let app = spawn_app().await;
    let client = Client::new();
    let fixture = create_match(&app, "Porto", "Benfica").await;
    let other = create_match(&app, "Sporting", "Braga").await;
    let match_id = fixture["id"].as_str().unwrap();
    submit_prediction(&app, 1, "a", match_id, "1-0").await;
    submit_prediction(&app, 2, "b", match_id, "1-0").await;
    submit_prediction(&app, 3, "c", match_id, "0-0").await;
    submit_prediction(&app, 1, "a", other["id"].as_str().unwrap(), "1-0").await;
    set_true_score(&app, &fixture, Some("1-0")).await;

    // Act
    let response = make_admin_request(
        &client,
        Method::DELETE,
        &format!("{}/admin/matches/{}", app.address, match_id),
        &app.admin_token,
        None,
    ).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["predictions_deleted"], 3);
    assert_eq!(body["data"]["winners_deleted"], 2);

    let gone = make_admin_request(
        &client,
        Method::GET,
        &format!("{}/admin/matches/{}", app.address, match_id),
        &app.admin_token,
        None,
    ).await;
    assert_eq!(404, gone.status().as_u16());

    let stats = make_admin_request(
        &client,
        Method::GET,
        &format!("{}/admin/stats", app.address),
        &app.admin_token,
        None,
    ).await;
    let stats: Value = stats.json().await.unwrap();
    assert_eq!(stats["data"]["total_predictions"], 1);
    assert_eq!(stats["data"]["total_winners"], 0);
    assert_eq!(stats["data"]["active_matches"], 1);
}

#[tokio::test]
async fn deleting_unknown_match_returns_404() {
    let app = spawn_app().await;
    let client = Client::new();

    let response = make_admin_request(
        &client,
        Method::DELETE,
        &format!("{}/admin/matches/{}", app.address, Uuid::new_v4()),
        &app.admin_token,
        None,
    ).await;

    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn legacy_predictions_are_found_by_previous_name_and_linked() {
    // Arrange
    let app = spawn_app().await;
    let fixture = create_match(&app, "Eski", "Takim").await;
    let match_id = fixture["id"].as_str().unwrap();

    let mut tx = app.store.begin().await.expect("Failed to begin");
    for (user_id, score) in [(300, "1-0"), (301, "0-1")] {
        tx.insert_prediction(NewPrediction {
            user_id,
            username: format!("legacy{}", user_id),
            match_id: None,
            match_name: "Eski-Takim".to_string(),
            score: Score::parse(score).unwrap(),
        })
        .await
        .expect("Failed to insert legacy prediction");
    }
    tx.commit().await.expect("Failed to commit");
    submit_prediction(&app, 302, "modern", match_id, "1-0").await;

    // Act: rename and resolve in one edit
    let response = update_match(&app, match_id, json!({
        "home_team": "Yeni",
        "away_team": "Takim",
        "true_score": "1-0",
    })).await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["match"]["name"], "Yeni-Takim");
    assert_eq!(body["data"]["resolution"]["winners_created"], 2);
    assert_eq!(body["data"]["resolution"]["legacy_links"], 2);

    let mut winners: Vec<String> = get_match_winners(&app, match_id)
        .await
        .iter()
        .map(|w| w["username"].as_str().unwrap().to_string())
        .collect();
    winners.sort();
    assert_eq!(winners, vec!["legacy300", "modern"]);

    // Linked rows now count as predictions of the match
    let client = Client::new();
    let response = make_admin_request(
        &client,
        Method::GET,
        &format!("{}/admin/matches/{}/predictions", app.address, match_id),
        &app.admin_token,
        None,
    ).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["predictions"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["correct"].as_array().unwrap().len(), 2);
    assert!(body["data"]["predictions"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["match_id"] == match_id));

    // A linked legacy user can no longer predict the match again
    let again = submit_prediction(&app, 301, "legacy301", match_id, "2-2").await;
    assert_eq!(409, again.status().as_u16());
}

#[tokio::test]
async fn prediction_browser_filters_and_paginates() {
    let app = spawn_app().await;
    let client = Client::new();
    let fixture = create_match(&app, "Lyon", "Nice").await;
    let other = create_match(&app, "Lille", "Lens").await;
    let match_id = fixture["id"].as_str().unwrap();
    for user_id in 0..55 {
        let score = if user_id % 5 == 0 { "2-2" } else { "1-0" };
        submit_prediction(&app, user_id, &format!("player{}", user_id), match_id, score).await;
    }
    submit_prediction(&app, 1000, "outsider", other["id"].as_str().unwrap(), "3-3").await;
    set_true_score(&app, &fixture, Some("2-2")).await;

    let browse = |query: &str| {
        let client = client.clone();
        let url = format!("{}/admin/predictions{}", app.address, query);
        let token = app.admin_token.clone();
        async move {
            let response = make_admin_request(&client, Method::GET, &url, &token, None).await;
            assert_eq!(200, response.status().as_u16());
            response.json::<Value>().await.unwrap()
        }
    };

    let first_page = browse("").await;
    assert_eq!(first_page["data"]["predictions"].as_array().unwrap().len(), 50);
    assert_eq!(first_page["data"]["pagination"]["total"], 56);
    assert_eq!(first_page["data"]["pagination"]["has_next"], true);
    assert_eq!(first_page["data"]["stats"]["total"], 56);
    assert_eq!(first_page["data"]["stats"]["correct"], 11);
    assert_eq!(first_page["data"]["stats"]["wrong"], 44);
    assert_eq!(first_page["data"]["stats"]["pending"], 1);

    let second_page = browse("?page=2").await;
    assert_eq!(second_page["data"]["predictions"].as_array().unwrap().len(), 6);
    assert_eq!(second_page["data"]["pagination"]["has_prev"], true);
    assert_eq!(second_page["data"]["pagination"]["has_next"], false);

    let correct = browse("?outcome=correct").await;
    assert_eq!(correct["data"]["pagination"]["total"], 11);

    let by_match = browse("?match=lille").await;
    assert_eq!(by_match["data"]["pagination"]["total"], 1);
    assert_eq!(by_match["data"]["predictions"][0]["outcome"], "pending");

    let by_user = browse("?username=PLAYER5").await;
    // player5 and player50..54
    assert_eq!(by_user["data"]["pagination"]["total"], 6);
}

#[tokio::test]
async fn prediction_browser_rejects_out_of_range_pages() {
    let app = spawn_app().await;
    let client = Client::new();

    let response = make_admin_request(
        &client,
        Method::GET,
        &format!("{}/admin/predictions?page={}", app.address, i64::MAX),
        &app.admin_token,
        None,
    ).await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "validation_error");

    let last_addressable = make_admin_request(
        &client,
        Method::GET,
        &format!("{}/admin/predictions?page={}", app.address, i64::MAX / 50),
        &app.admin_token,
        None,
    ).await;
    assert_eq!(200, last_addressable.status().as_u16());
}

#[tokio::test]
async fn admin_routes_require_the_token() {
    let app = spawn_app().await;
    let client = Client::new();
    let url = format!("{}/admin/matches", app.address);

    let missing = client.get(&url).send().await.unwrap();
    assert_eq!(401, missing.status().as_u16());

    let wrong = make_admin_request(&client, Method::GET, &url, "not-the-token", None).await;
    assert_eq!(403, wrong.status().as_u16());
}

#[tokio::test]
async fn bot_routes_only_serve_the_allowed_group() {
    let app = spawn_app().await;
    let client = Client::new();
    let url = format!("{}/bot/matches", app.address);

    let missing = client.get(&url).send().await.unwrap();
    assert_eq!(400, missing.status().as_u16());

    let private = client
        .get(&url)
        .header("X-Chat-Id", "12345")
        .header("X-Chat-Type", "private")
        .send()
        .await
        .unwrap();
    assert_eq!(403, private.status().as_u16());

    let other_group = client
        .get(&url)
        .header("X-Chat-Id", "-100999")
        .header("X-Chat-Type", "group")
        .send()
        .await
        .unwrap();
    assert_eq!(403, other_group.status().as_u16());

    let allowed = client
        .get(&url)
        .header("X-Chat-Id", TEST_CHAT_ID.to_string())
        .header("X-Chat-Type", "supergroup")
        .send()
        .await
        .unwrap();
    assert_eq!(200, allowed.status().as_u16());
}
