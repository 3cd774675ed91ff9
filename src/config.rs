use anyhow::{ Context, Result };
use serde::{ Deserialize, Serialize };
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub email: String,
    pub password: String,
    /// Realtime database root, used for support/payment writes
    pub database_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub status_interval_secs: u64,
    /// Full dashboard refresh happens on wall-clock minutes divisible by this
    pub dashboard_minute_mark: u32,
    pub token_refresh_minutes: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: 30,
            dashboard_minute_mark: 5,
            token_refresh_minutes: 50,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "https://api.ezyago.com".to_string(),
                request_timeout_secs: default_timeout_secs(),
            },
            firebase: FirebaseConfig {
                api_key: String::new(),
                email: String::new(),
                password: String::new(),
                database_url: "https://ezyago-default-rtdb.firebaseio.com".to_string(),
            },
            polling: PollingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            let default_config = Self::default();
            default_config.save(path)?;
            anyhow::bail!(
                "Config file not found - wrote a template to {}. Fill in firebase credentials and restart.",
                path
            );
        }

        let content = fs
            ::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Self = serde_json
            ::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        // Validate required fields
        if config.firebase.api_key.is_empty() {
            return Err(anyhow::anyhow!("firebase.api_key is required in config"));
        }
        if config.firebase.email.is_empty() || config.firebase.password.is_empty() {
            return Err(anyhow::anyhow!("firebase.email and firebase.password are required in config"));
        }
        if config.backend.base_url.is_empty() {
            return Err(anyhow::anyhow!("backend.base_url is required in config"));
        }

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = serde_json
            ::to_string_pretty(self)
            .with_context(|| "Failed to serialize config")?;

        fs::write(path, content).with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_config() -> Config {
        let mut config = Config::default();
        config.firebase.api_key = "AIzaTestKey".to_string();
        config.firebase.email = "trader@ezyago.com".to_string();
        config.firebase.password = "hunter2".to_string();
        config
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let path = path.to_str().unwrap();

        let config = filled_config();
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded.firebase.email, "trader@ezyago.com");
        assert_eq!(loaded.backend.base_url, "https://api.ezyago.com");
        assert_eq!(loaded.polling.status_interval_secs, 30);
        assert_eq!(loaded.polling.dashboard_minute_mark, 5);
        assert_eq!(loaded.polling.token_refresh_minutes, 50);
    }

    #[test]
    fn test_missing_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let path = path.to_str().unwrap();

        // First load writes the template and errors out
        assert!(Config::load(path).is_err());
        assert!(Path::new(path).exists());

        // Template is still rejected until credentials are filled in
        assert!(Config::load(path).is_err());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let path = path.to_str().unwrap();

        let mut config = filled_config();
        config.firebase.password = String::new();
        config.save(path).unwrap();

        assert!(Config::load(path).is_err());
    }
}
