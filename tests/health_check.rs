//! Integration tests for the chirpy server

mod helpers;

use helpers::spawn_app;

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .get(&format!("{}/api/healthz", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn reset_is_forbidden_outside_dev() {
    let app = helpers::spawn_app_on_platform("production").await;

    let response = reqwest::Client::new()
        .post(&format!("{}/admin/reset", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(403, response.status().as_u16());
}
