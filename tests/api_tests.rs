// tests/api_tests.rs

use std::sync::Arc;

use inkwell::{config::Config, routes, state::AppState, store::MemStore};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
///
/// Tests run against the in-memory store, so no database is needed.
async fn spawn_app() -> String {
    let config = Config {
        database_url: "unused-in-tests".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
    };

    let state = AppState {
        store: Arc::new(MemStore::new()),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_email() -> String {
    format!("u{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn signup_returns_session_payload() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Ada Lovelace",
            "email": "ada@example.com",
            "password": "Secret1x"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["access_token"].as_str().unwrap().len() > 0);
    assert_eq!(body["fullname"], "Ada Lovelace");
    // Username is derived from the email local part
    assert_eq!(body["username"], "ada");
    assert!(body["profile_img"].as_str().unwrap().starts_with("https://"));
}

#[tokio::test]
async fn signup_validation_messages() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Short fullname
    let response = client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Al",
            "email": "al@example.com",
            "password": "Secret1x"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Fullname must be at least 3 letters long");

    // Missing email
    let response = client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Alan Turing",
            "email": "",
            "password": "Secret1x"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email is required");

    // Malformed email
    let response = client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Alan Turing",
            "email": "not-an-email",
            "password": "Secret1x"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email is invalid");

    // Weak password (no uppercase, no digit)
    let response = client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Alan Turing",
            "email": "alan@example.com",
            "password": "weakpass"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Password must be between 6 to 20 characters long and contain at least one numeric digit, one uppercase and one lowercase letter"
    );
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let payload = serde_json::json!({
        "fullname": "Grace Hopper",
        "email": "grace@example.com",
        "password": "Secret1x"
    });

    let first = client
        .post(&format!("{}/signup", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 200);

    let second = client
        .post(&format!("{}/signup", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["error"], "Email already exists");
}

#[tokio::test]
async fn signup_username_collision_gets_suffix() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Same local part under two domains
    for email in ["sam@one.com", "sam@two.org"] {
        let response = client
            .post(&format!("{}/signup", address))
            .json(&serde_json::json!({
                "fullname": "Sam Smith",
                "email": email,
                "password": "Secret1x"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let search: serde_json::Value = client
        .get(&format!("{}/search-users?query=sam", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let usernames: Vec<&str> = search["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["personal_info"]["username"].as_str().unwrap())
        .collect();

    assert_eq!(usernames.len(), 2);
    assert!(usernames.contains(&"sam"));
    // The second one kept the prefix but picked up a random suffix
    let suffixed = usernames.iter().find(|u| **u != "sam").unwrap();
    assert!(suffixed.starts_with("sam"));
    assert_eq!(suffixed.len(), "sam".len() + 5);
}

#[tokio::test]
async fn signin_round_trip() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Mary Shelley",
            "email": email,
            "password": "Secret1x"
        }))
        .send()
        .await
        .unwrap();

    // Correct credentials
    let response = client
        .post(&format!("{}/signin", address))
        .json(&serde_json::json!({ "email": email, "password": "Secret1x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["access_token"].as_str().unwrap().len() > 0);
    assert_eq!(body["fullname"], "Mary Shelley");

    // Wrong password
    let response = client
        .post(&format!("{}/signin", address))
        .json(&serde_json::json!({ "email": email, "password": "Wrong1xx" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Password is incorrect");

    // Unknown email
    let response = client
        .post(&format!("{}/signin", address))
        .json(&serde_json::json!({ "email": "nobody@example.com", "password": "Secret1x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email not found");
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // No Authorization header at all
    let response = client
        .get(&format!("{}/notifications", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Access token required");

    // Garbage token
    let response = client
        .get(&format!("{}/notifications", address))
        .header("Authorization", "Bearer not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn change_password_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    let signup: serde_json::Value = client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Edgar Poe",
            "email": email,
            "password": "Secret1x"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = signup["access_token"].as_str().unwrap();

    // 1. Weak new password is rejected up front
    let response = client
        .post(&format!("{}/change-password", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "currentPassword": "Secret1x",
            "newPassword": "short"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Password should be 6 to 20 characters long with a numeric, 1 lowercase and 1 uppercase letters"
    );

    // 2. Wrong current password
    let response = client
        .post(&format!("{}/change-password", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "currentPassword": "Wrong1xx",
            "newPassword": "Fresh2yz"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Current password is incorrect");

    // 3. Correct change
    let response = client
        .post(&format!("{}/change-password", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "currentPassword": "Secret1x",
            "newPassword": "Fresh2yz"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "Password changed");

    // 4. Old password stops working, new one signs in
    let old = client
        .post(&format!("{}/signin", address))
        .json(&serde_json::json!({ "email": email, "password": "Secret1x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(old.status().as_u16(), 403);

    let fresh = client
        .post(&format!("{}/signin", address))
        .json(&serde_json::json!({ "email": email, "password": "Fresh2yz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(fresh.status().as_u16(), 200);
}

#[tokio::test]
async fn profile_update_and_visibility() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let signup: serde_json::Value = client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Jules Verne",
            "email": "jules@example.com",
            "password": "Secret1x"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = signup["access_token"].as_str().unwrap();

    // 1. Social link without a scheme is rejected
    let response = client
        .post(&format!("{}/update-profile", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "username": "verne",
            "bio": "Novelist",
            "social_links": { "twitter": "twitter.com/verne" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["error"],
        "twitter link is invalid. You must enter a full link"
    );

    // 2. Valid update
    let response = client
        .post(&format!("{}/update-profile", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "username": "verne",
            "bio": "Novelist",
            "social_links": { "twitter": "https://twitter.com/verne" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], "verne");

    // 3. Own profile carries social links
    let own: serde_json::Value = client
        .get(&format!("{}/get-user", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(own["user"]["personal_info"]["username"], "verne");
    assert_eq!(own["user"]["personal_info"]["bio"], "Novelist");
    assert_eq!(
        own["user"]["social_links"]["twitter"],
        "https://twitter.com/verne"
    );

    // 4. The public view hides them
    let public: serde_json::Value = client
        .get(&format!("{}/get-user/1", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public["user"]["personal_info"]["username"], "verne");
    assert_eq!(public["user"]["account_info"]["total_posts"], 0);
    assert!(public["user"].get("social_links").is_none());
}

#[tokio::test]
async fn update_profile_rejects_taken_username() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // First user claims "kafka"
    client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Franz Kafka",
            "email": "kafka@example.com",
            "password": "Secret1x"
        }))
        .send()
        .await
        .unwrap();

    let signup: serde_json::Value = client
        .post(&format!("{}/signup", address))
        .json(&serde_json::json!({
            "fullname": "Other Person",
            "email": "other@example.com",
            "password": "Secret1x"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = signup["access_token"].as_str().unwrap();

    let response = client
        .post(&format!("{}/update-profile", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "username": "kafka",
            "bio": "",
            "social_links": {}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Username is already taken");
}

#[tokio::test]
async fn get_user_unknown_id_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/get-user/424242", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "User not found");
}
