use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
    /// Only `dev` unlocks the administrative reset endpoint.
    pub platform: String,
}

impl ApplicationSettings {
    pub fn is_dev(&self) -> bool {
        self.platform == "dev"
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Signing secret and token lifetimes
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub access_token_expiry: i64,      // seconds
    pub refresh_token_expiry_days: i64,
}

impl AuthSettings {
    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_token_expiry)
    }

    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_token_expiry_days)
    }
}

/// Load settings from `configuration.yaml` (optional) and `APP__*` environment variables,
/// e.g. `APP__AUTH__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.platform", "production")?
        .set_default("auth.access_token_expiry", 3600)?
        .set_default("auth.refresh_token_expiry_days", 60)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lifetimes() {
        let auth = AuthSettings {
            secret: "secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry_days: 60,
        };

        assert_eq!(auth.access_token_ttl(), chrono::Duration::hours(1));
        assert_eq!(auth.refresh_token_ttl(), chrono::Duration::days(60));
    }

    #[test]
    fn test_only_dev_platform_is_dev() {
        let mut application = ApplicationSettings {
            port: 8080,
            platform: "dev".to_string(),
        };
        assert!(application.is_dev());

        application.platform = "production".to_string();
        assert!(!application.is_dev());
    }

    #[test]
    fn test_repository_configuration_is_not_dev() {
        if std::env::var("APP__APPLICATION__PLATFORM").is_ok() {
            return;
        }

        let settings = get_configuration().expect("Failed to read configuration.");

        assert_eq!(settings.application.platform, "production");
        assert!(!settings.application.is_dev());
    }
}
