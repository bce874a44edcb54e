use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

/// Premium Imgflip account. Only POST endpoints use it.
#[derive(Clone, Debug)]
pub struct ImgflipCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)] // Clone needed if passed around, Debug for logging
pub struct Config {
    pub bind_address: SocketAddr,
    pub imgflip_api_url: String,
    // Both username and password must be present to enable premium endpoints
    pub imgflip_credentials: Option<ImgflipCredentials>,
    // Directory standing in for browser local storage
    pub storage_dir: PathBuf,
    pub upload_delay: Duration,
    pub ai_caption_delay: Duration,
}

pub const DEFAULT_IMGFLIP_API_URL: &str = "https://api.imgflip.com";

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();

        let bind_address_str =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = SocketAddr::from_str(&bind_address_str)
            .map_err(|e| ConfigError::InvalidVar("BIND_ADDRESS".into(), e.to_string()))?;

        let imgflip_api_url = env::var("IMGFLIP_API_URL")
            .unwrap_or_else(|_| DEFAULT_IMGFLIP_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let username = env::var("IMGFLIP_USERNAME").ok();
        let password = env::var("IMGFLIP_PASSWORD").ok();
        let imgflip_credentials = match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Some(ImgflipCredentials { username, password })
            }
            (Some(_), None) => return Err(ConfigError::MissingVar("IMGFLIP_PASSWORD".into())),
            _ => None,
        };

        let storage_dir = env::var("MEMEVERSE_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".memeverse"));

        let upload_delay = delay_from_env("UPLOAD_DELAY_MS", 1000)?;
        let ai_caption_delay = delay_from_env("AI_CAPTION_DELAY_MS", 1500)?;

        Ok(Config {
            bind_address,
            imgflip_api_url,
            imgflip_credentials,
            storage_dir,
            upload_delay,
            ai_caption_delay,
        })
    }

    pub fn premium_enabled(&self) -> bool {
        self.imgflip_credentials.is_some()
    }
}

fn delay_from_env(var: &str, default_ms: u64) -> Result<Duration, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidVar(var.into(), e.to_string())),
        Err(_) => Ok(Duration::from_millis(default_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_falls_back_to_default_when_unset() {
        let delay = delay_from_env("MEMEVERSE_TEST_DELAY_UNSET", 250).unwrap();
        assert_eq!(delay, Duration::from_millis(250));
    }

    #[test]
    fn premium_is_enabled_only_with_credentials() {
        let mut config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            imgflip_api_url: DEFAULT_IMGFLIP_API_URL.to_string(),
            imgflip_credentials: None,
            storage_dir: PathBuf::from("unused"),
            upload_delay: Duration::ZERO,
            ai_caption_delay: Duration::ZERO,
        };
        assert!(!config.premium_enabled());

        config.imgflip_credentials = Some(ImgflipCredentials {
            username: "alice".into(),
            password: "hunter2".into(),
        });
        assert!(config.premium_enabled());
    }
}
