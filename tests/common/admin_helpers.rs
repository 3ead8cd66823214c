use reqwest::{Client, Method, Response};
use serde_json::{json, Value};

use crate::common::utils::{TestApp, TEST_CHAT_ID};

/// Send a request to the admin API with the app's bearer token
pub async fn make_admin_request(
    client: &Client,
    method: Method,
    url: &str,
    token: &str,
    body: Option<Value>,
) -> Response {
    let mut request = client
        .request(method, url)
        .header("Authorization", format!("Bearer {}", token));

    if let Some(body) = body {
        request = request.json(&body);
    }

    request.send().await.expect("Failed to execute admin request")
}

/// Send a request to the bot API as if relayed from the allowed group chat
pub async fn make_bot_request(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Response {
    let mut request = client
        .request(method, url)
        .header("X-Chat-Id", TEST_CHAT_ID.to_string())
        .header("X-Chat-Type", "supergroup");

    if let Some(body) = body {
        request = request.json(&body);
    }

    request.send().await.expect("Failed to execute bot request")
}

pub async fn create_match(app: &TestApp, home: &str, away: &str) -> Value {
    let client = Client::new();
    let response = make_admin_request(
        &client,
        Method::POST,
        &format!("{}/admin/matches", app.address),
        &app.admin_token,
        Some(json!({ "home_team": home, "away_team": away })),
    ).await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"].clone()
}

pub async fn update_match(app: &TestApp, match_id: &str, body: Value) -> Response {
    let client = Client::new();
    make_admin_request(
        &client,
        Method::PUT,
        &format!("{}/admin/matches/{}", app.address, match_id),
        &app.admin_token,
        Some(body),
    ).await
}

/// Record the true score of a match, keeping its teams
pub async fn set_true_score(app: &TestApp, fixture: &Value, score: Option<&str>) -> Value {
    let response = update_match(
        app,
        fixture["id"].as_str().expect("Match has no id"),
        json!({
            "home_team": fixture["home_team"],
            "away_team": fixture["away_team"],
            "true_score": score,
        }),
    ).await;

    assert_eq!(200, response.status().as_u16());
    response.json().await.expect("Failed to parse response")
}

pub async fn submit_prediction(app: &TestApp, user_id: i64, username: &str, match_id: &str, score: &str) -> Response {
    let client = Client::new();
    make_bot_request(
        &client,
        Method::POST,
        &format!("{}/bot/predictions", app.address),
        Some(json!({
            "user_id": user_id,
            "username": username,
            "match_id": match_id,
            "score": score,
        })),
    ).await
}

pub async fn get_match_winners(app: &TestApp, match_id: &str) -> Vec<Value> {
    let client = Client::new();
    let response = make_admin_request(
        &client,
        Method::GET,
        &format!("{}/admin/matches/{}/winners", app.address, match_id),
        &app.admin_token,
        None,
    ).await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"].as_array().cloned().unwrap_or_default()
}

pub async fn draw(app: &TestApp, match_id: Option<&str>, count: i64) -> Response {
    let client = Client::new();
    let url = match match_id {
        Some(id) => format!("{}/admin/matches/{}/draw", app.address, id),
        None => format!("{}/admin/draw", app.address),
    };
    make_admin_request(&client, Method::POST, &url, &app.admin_token, Some(json!({ "count": count }))).await
}
