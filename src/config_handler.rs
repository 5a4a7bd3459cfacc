use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

use crate::rate_limiter::RateLimit;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default="default_port")]
    pub port: u16,

    #[serde(default="default_data_path")]
    pub data_path: String,

    #[serde(default="default_api_keys")]
    pub api_keys: Vec<String>,

    #[serde(default="default_limits")]
    pub default_limits: Vec<RateLimit>,

    /// Route name -> limit, overrides the built-in per-route limit.
    #[serde(default)]
    pub route_limits: HashMap<String, RateLimit>,

    #[serde(default="default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default="default_security_log_path")]
    pub security_log_path: String,
}

fn default_port() -> u16 {
    8080
}

fn default_data_path() -> String {
    "./data".to_string()
}

fn default_api_keys() -> Vec<String> {
    vec!["dev-api-key-12345".to_string(), "test-api-key".to_string()]
}

fn default_limits() -> Vec<RateLimit> {
    vec![RateLimit::per_day(200), RateLimit::per_hour(50)]
}

fn default_cors_origins() -> Vec<String> {
    ["http://localhost:3000", "http://127.0.0.1:3000", "http://localhost:3001", "http://127.0.0.1:3001"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

fn default_security_log_path() -> String {
    "./security.log".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: default_port(),
            data_path: default_data_path(),
            api_keys: default_api_keys(),
            default_limits: default_limits(),
            route_limits: HashMap::new(),
            cors_origins: default_cors_origins(),
            security_log_path: default_security_log_path(),
        }
    }
}

impl Config {
    pub fn route_limit(&self, route: &str, fallback: RateLimit) -> RateLimit {
        self.route_limits.get(route).copied().unwrap_or(fallback)
    }

    pub fn is_allowed_key(&self, key: &str) -> bool {
        self.api_keys.iter().any(|e| e == key)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(port) = var("PORT") {
            self.port = port.parse().with_context(|| format!("PORT is not a valid port: {port}"))?;
        }
        if let Some(data_path) = var("DATA_PATH") {
            self.data_path = data_path;
        }
        if let Some(keys) = var("API_KEYS") {
            self.api_keys = keys.split(',').map(|e| e.trim().to_string()).filter(|e| !e.is_empty()).collect();
        }
        if let Some(key) = var("API_KEY").filter(|e| !e.is_empty()) {
            if !self.is_allowed_key(&key) {
                self.api_keys.insert(0, key);
            }
        }
        if let Some(path) = var("SECURITY_LOG_PATH") {
            self.security_log_path = path;
        }
        Ok(())
    }
}

pub fn get_config() -> anyhow::Result<Config> {
    let path = std::env::var("CONFIG_PATH").ok()
        .unwrap_or_else(|| "./deployment/config.json".to_string());
    let mut result: Config = match fs::read_to_string(&path) {
        Ok(data) => serde_json::from_str(&data)
            .with_context(|| format!("Could not parse JSON at {path}!"))?,
        Err(_) => {
            println!("[CONFIG] No config at {path}, using defaults");
            Config::default()
        }
    };
    result.apply_env(|key| std::env::var(key).ok())?;
    println!("[CONFIG] port={} data_path={} api_keys={} default_limits={:?}",
        result.port, result.data_path, result.api_keys.len(), result.default_limits);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::rate_limiter::RateLimit;

    use super::Config;

    #[test]
    fn empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, "./data");
        assert!(config.is_allowed_key("dev-api-key-12345"));
        assert!(config.is_allowed_key("test-api-key"));
        assert!(!config.is_allowed_key("invalid-key"));
        assert_eq!(config.default_limits, vec![RateLimit::per_day(200), RateLimit::per_hour(50)]);
        assert_eq!(config.cors_origins.len(), 4);
    }

    #[test]
    fn route_limits_override_fallback() {
        let config: Config = serde_json::from_str(r#"{ "route_limits": { "create_player": "2 per minute" } }"#).unwrap();

        assert_eq!(config.route_limit("create_player", RateLimit::per_minute(10)), RateLimit::per_minute(2));
        assert_eq!(config.route_limit("create_coach", RateLimit::per_minute(5)), RateLimit::per_minute(5));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9090"),
            ("DATA_PATH", "/tmp/nba"),
            ("API_KEYS", "one, two,,"),
            ("API_KEY", "three"),
        ]);
        let mut config = Config::default();

        config.apply_env(|key| env.get(key).map(|e| e.to_string())).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.data_path, "/tmp/nba");
        assert_eq!(config.api_keys, vec!["three", "one", "two"]);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut config = Config::default();
        assert!(config.apply_env(|key| (key == "PORT").then(|| "http".to_string())).is_err());
    }
}
