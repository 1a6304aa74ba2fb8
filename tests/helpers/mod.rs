#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use chirpy::configuration::{get_configuration, ApplicationSettings, AuthSettings, DatabaseSettings};
use chirpy::startup::{run, Storage};
use chirpy::storage::{
    InMemoryRefreshTokenRepository, InMemoryUserRepository, PgRefreshTokenRepository,
    PgUserRepository,
};
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub async fn spawn_app() -> TestApp {
    spawn_app_on_platform("dev").await
}

pub async fn spawn_app_on_platform(platform: &str) -> TestApp {
    let storage = Storage {
        users: Arc::new(InMemoryUserRepository::new()),
        refresh_tokens: Arc::new(InMemoryRefreshTokenRepository::new()),
    };
    spawn_app_with_storage(storage, platform)
}

/// Spawn the server against a fresh, migrated Postgres database
pub async fn spawn_app_with_postgres() -> (TestApp, PgPool) {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();
    let db_pool = configure_database(&configuration.database).await;

    let storage = Storage {
        users: Arc::new(PgUserRepository::new(db_pool.clone())),
        refresh_tokens: Arc::new(PgRefreshTokenRepository::new(db_pool.clone())),
    };
    (spawn_app_with_storage(storage, "dev"), db_pool)
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");
    // Migrate database
    let db_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to migrate the database.");
    db_pool
}

fn spawn_app_with_storage(storage: Storage, platform: &str) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let application = ApplicationSettings {
        port,
        platform: platform.to_string(),
    };
    let auth = AuthSettings {
        secret: TEST_SECRET.to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry_days: 60,
    };

    let server = run(listener, storage, application, auth).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/users", self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/login", self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register and log in, returning the login response body
    pub async fn signed_in_user(&self, email: &str, password: &str) -> Value {
        assert_eq!(201, self.create_user(email, password).await.status().as_u16());

        let response = self.login(email, password).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_me(&self, token: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}/api/me", self.address))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
