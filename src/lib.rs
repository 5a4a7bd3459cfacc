use std::fmt::Display;

use tracing::log;

pub mod config_handler;
pub mod db;
pub mod error;
pub mod models;
pub mod models_api;
pub mod rate_limiter;
pub mod sanitize;
pub mod request_guard;
pub mod api;
pub mod api_teams_service;
pub mod stadium_service;
pub mod game_service;
pub mod player_service;
pub mod player_stats_service;
pub mod coach_service;
pub mod rest_client;
pub mod stats_table;
pub mod page_loader;

pub trait LogResult<T, E: Display> {
    fn ok_log(self, msg: &str) -> Option<T>;
}

impl<T, E: Display> LogResult<T, E> for Result<T, E> {
    fn ok_log(self, msg: &str) -> Option<T> {
        match self {
            Ok(o) => Some(o),
            Err(e) => {
                log::error!("{}: {}", msg, e);
                None
            }
        }
    }
}
