use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub recruitment: RecruitmentSettings,
    pub reconcile: ReconcileSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecruitmentSettings {
    /// Days until a pending invitation lapses. Join requests carry no TTL.
    pub invite_ttl_days: i64,
    pub default_max_team_size: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReconcileSettings {
    /// Retry budget for the secondary write of a cross-aggregate operation
    /// before the record is flagged for reconciliation.
    pub max_retries: u32,
    /// Retry budget for the best-effort profile membership-pointer sync.
    pub pointer_sync_retries: u32,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("TEAMFORGE"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "teamforge")?
            .set_default("recruitment.invite_ttl_days", 7)?
            .set_default("recruitment.default_max_team_size", 7)?
            .set_default("reconcile.max_retries", 3)?
            .set_default("reconcile.pointer_sync_retries", 3)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
