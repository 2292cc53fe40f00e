use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub relationship: Relationship,
    pub store: Store,
}

#[derive(Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "jwt"
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub audience: String,
    /// Read from the environment variable of this name when set there.
    #[serde(default = "default_signing_key_env")]
    pub signing_key_env: String,
    #[serde(default)]
    pub signing_key: Option<String>,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("backend", &self.backend)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("signing_key_env", &self.signing_key_env)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    /// TLS is enabled when both paths are set.
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Relationship {
    #[serde(default = "default_tx_timeout_ms")]
    pub tx_timeout_ms: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u16,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    #[serde(default)]
    pub mysql_dsn: Option<String>,
    #[serde(default)]
    pub run_migrations: bool,
    /// Usernames created at startup; ids follow the fake-token scheme.
    #[serde(default)]
    pub seed_users: Vec<String>,
}

fn default_signing_key_env() -> String {
    "JWT_SIGNING_KEY".to_string()
}

fn default_tx_timeout_ms() -> u64 {
    5_000
}

fn default_max_page_size() -> u16 {
    100
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let raw = r#"
[auth]
backend = "fake"
signing_key = "s3cret"

[http]
address = "127.0.0.1:8080"

[log]
filter = "info"

[relationship]

[store]
backend = "memory"
seed_users = ["alice", "bob"]
"#;
        let settings: Settings = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.relationship.tx_timeout_ms, 5_000);
        assert_eq!(settings.relationship.max_page_size, 100);
        assert_eq!(settings.auth.signing_key_env, "JWT_SIGNING_KEY");
        assert!(settings.http.cert_path.is_none());
        assert_eq!(settings.store.seed_users, vec!["alice", "bob"]);
        assert!(!settings.store.run_migrations);
        assert!(!format!("{:?}", settings.auth).contains("s3cret"));
    }
}
