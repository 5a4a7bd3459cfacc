use std::time::{Duration, Instant};

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::log;

use crate::error::ErrorRsp;
use crate::models_api::{
    coach::ApiCoach,
    game::GamesRsp,
    game::ApiGame,
    player::{ApiPlayer, ApiPlayerInfo, NewPlayer},
    player_stats::{ApiPlayerStat, PlayerStatsRsp},
    stadium::{ApiStadium, StadiumsPayload},
    team::{ApiTeam, TeamsRsp},
};
use crate::request_guard::API_KEY_HEADER;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not reach the api: {0}")]
    Network(#[source] reqwest::Error),

    #[error("api answered {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response body: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Typed access to the dashboard api, one call per page.
#[derive(Clone)]
pub struct DashboardClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl DashboardClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> DashboardClient {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        DashboardClient { base_url: base_url.trim_end_matches('/').to_string(), api_key, http }
    }

    /// `DASHBOARD_API_URL` (default `http://localhost:8080`) and the optional `DASHBOARD_API_KEY`.
    pub fn from_env() -> DashboardClient {
        DashboardClient::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> DashboardClient {
        let base_url = var("DASHBOARD_API_URL").unwrap_or_else(|| "http://localhost:8080".to_string());
        let api_key = var("DASHBOARD_API_KEY").filter(|e| !e.is_empty());
        DashboardClient::new(&base_url, api_key)
    }

    pub async fn get_games(&self) -> Result<Vec<ApiGame>, ClientError> {
        let rsp: GamesRsp = self.get_call("/api/nba-results").await?;
        Ok(rsp.result)
    }

    pub async fn get_teams(&self) -> Result<Vec<ApiTeam>, ClientError> {
        let rsp: TeamsRsp = self.get_call("/api/teams").await?;
        Ok(rsp.teams)
    }

    pub async fn get_stadiums(&self) -> Result<Vec<ApiStadium>, ClientError> {
        let rsp: StadiumsPayload = self.get_call("/api/stadiums").await?;
        Ok(rsp.into())
    }

    pub async fn get_player_stats(&self) -> Result<Vec<ApiPlayerStat>, ClientError> {
        let rsp: PlayerStatsRsp = self.get_call("/api/player-stats").await?;
        Ok(rsp.player_stats)
    }

    pub async fn get_player_info(&self) -> Result<Vec<ApiPlayerInfo>, ClientError> {
        self.get_call("/api/player-info").await
    }

    pub async fn get_coaches(&self) -> Result<Vec<ApiCoach>, ClientError> {
        self.get_call("/api/coaches").await
    }

    pub async fn create_player(&self, player: &NewPlayer) -> Result<ApiPlayer, ClientError> {
        let mut req = self.http.post(format!("{}/api/players", self.base_url)).json(player);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        let rsp = req.send().await.map_err(ClientError::Network)?;
        DashboardClient::read_response(rsp).await
    }

    async fn get_call<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let before = Instant::now();
        let url = format!("{}{path}", self.base_url);
        let rsp = self.http.get(&url).send().await.map_err(|e| {
            log::error!("[REST] Call failed {url} {e}");
            ClientError::Network(e)
        })?;
        let res = DashboardClient::read_response(rsp).await;
        log::info!("[REST] Call {url} {:.2?}", before.elapsed());
        res
    }

    async fn read_response<T: DeserializeOwned>(rsp: Response) -> Result<T, ClientError> {
        let status = rsp.status();
        if !status.is_success() {
            let message = rsp.json::<ErrorRsp>().await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(ClientError::Status { status, message });
        }
        rsp.json().await.map_err(ClientError::Parse)
    }
}
