use std::collections::HashMap;
use std::process::{Child, Command};

use assert_cmd::prelude::CommandCargoExt;
use nba_api_rs::{config_handler::Config, rate_limiter::RateLimit};
use predicates::{function::FnPredicate, Predicate};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

pub const API_KEY: &str = "integration-key";

pub struct NbaServer {
    port: u16,
    child_process: Option<Child>,
}

impl Drop for NbaServer {
    fn drop(&mut self) {
        if let Some(child) = self.child_process.as_mut() {
            child.kill().expect("Should kill");
        }
    }
}

impl NbaServer {
    pub fn new(port: u16) -> NbaServer {
        NbaServer { port, child_process: None }
    }

    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    pub fn start(&mut self, path: &str, route_limits: HashMap<String, RateLimit>) {
        let config = Config {
            port: self.port,
            data_path: format!("{path}/data"),
            api_keys: vec![API_KEY.to_string()],
            security_log_path: format!("{path}/security.log"),
            route_limits,
            ..Default::default()
        };

        let config_str = serde_json::to_string(&config).unwrap();
        let config_path = format!("{path}/config.json");
        std::fs::write(config_path.clone(), config_str).unwrap();
        let child_process = Command::cargo_bin("nba-api-rs")
            .unwrap()
            .env("CONFIG_PATH", config_path)
            .env_remove("PORT")
            .env_remove("DATA_PATH")
            .env_remove("API_KEY")
            .env_remove("API_KEYS")
            .env_remove("SECURITY_LOG_PATH")
            .spawn()
            .expect("should start");

        self.child_process = Some(child_process);
    }

    pub fn seed(path: &str) {
        let data = format!("{path}/data");
        std::fs::create_dir_all(&data).unwrap();
        let files = [
            ("teams.json", json!([
                { "id": 1, "name": "Celtics", "city": "Boston", "conference": "Eastern" },
                { "id": 2, "name": "Nuggets", "city": "Denver", "conference": "Western" },
            ])),
            ("stadiums.json", json!([
                { "id": 1, "name": "Ball Arena", "team": "Nuggets", "location": "Denver, CO", "capacity": 19520, "opened": 1999 },
            ])),
            ("player-stats.json", json!([
                { "id": 1, "name": "Nikola Jokić", "team": "Nuggets", "position": "C", "points": 26.4, "rebounds": 12.4, "assists": 9.0, "games": 79 },
                { "id": 2, "name": "Jaylen Brown", "team": "Celtics", "position": "G", "points": 23.0, "rebounds": 5.5, "assists": 3.6, "games": 70 },
            ])),
            ("nba-games.json", json!([
                { "id": 1, "homeTeam": "Nuggets", "awayTeam": "Celtics", "score": "102-101" },
            ])),
            ("coaches.json", json!([])),
        ];
        for (name, value) in files {
            std::fs::write(format!("{data}/{name}"), serde_json::to_string(&value).unwrap()).unwrap();
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response, Box<dyn std::error::Error>> {
        Ok(reqwest::get(format!("{}{path}", self.url())).await?)
    }

    pub async fn send(&self, method: reqwest::Method, path: &str, api_key: Option<&str>, body: Option<Value>) -> Result<Response, Box<dyn std::error::Error>> {
        let mut req = reqwest::Client::builder()
            .build()?
            .request(method, format!("{}{path}", self.url()));
        if let Some(key) = api_key {
            req = req.header("x-api-key", key);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        Ok(req.send().await?)
    }

    pub async fn wait_until_healthy(&self) {
        let predicate = predicates::function::function(|e: &StatusCode| e.is_success());
        self.retry_until("/api/health", predicate, 100).await;
    }

    pub async fn retry_until<F>(&self, path: &str, predicate: FnPredicate<F, StatusCode>, retry_ms: u64)
    where
        F: Fn(&StatusCode) -> bool,
    {
        let mut nr_loops = 0;
        loop {
            if let Ok(rsp) = self.get(path).await {
                if predicate.eval(&rsp.status()) {
                    return;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(retry_ms)).await;
            nr_loops += 1;
            if nr_loops > 100 {
                panic!("retry failed");
            }
        }
    }
}
