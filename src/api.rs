use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    async_trait,
    body::Bytes,
    extract::{ConnectInfo, FromRequestParts, Path, State},
    http::{header::{AUTHORIZATION, CONTENT_TYPE}, request::Parts, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::{AllowOrigin, CorsLayer}, trace::TraceLayer};
use tracing::log;

use crate::{
    api_teams_service::ApiTeamsService,
    coach_service::{CoachService, SafeCoachService},
    config_handler::Config,
    db::DbError,
    error::ApiError,
    game_service::GameService,
    models_api::{
        coach::{ApiCoach, CoachUpdate, NewCoach},
        game::GamesRsp,
        player::{ApiPlayer, ApiPlayerInfo, NewPlayer},
        player_stats::PlayerStatsRsp,
        stadium::StadiumsRsp,
        team::TeamsRsp,
    },
    player_service::{PlayerService, SafePlayerService},
    player_stats_service::PlayerStatsService,
    rate_limiter::{CounterStore, InMemCounterStore, RateLimit, RateLimiter},
    request_guard::{log_security_event, RequestGuard, RouteSpec, Schema, API_KEY_HEADER},
    stadium_service::StadiumService,
    LogResult,
};

const fn per_minute(count: u32) -> RateLimit {
    RateLimit { count, period: Duration::from_secs(60) }
}

const PLAYER_SCHEMA: Schema = Schema {
    required: &["name", "position", "team"],
    max_length: &[("name", 100), ("position", 50), ("team", 100), ("height", 20), ("weight", 20), ("birthDate", 50)],
};

const NEW_COACH_SCHEMA: Schema = Schema {
    required: &["name"],
    max_length: &[("name", 100), ("team", 100)],
};

const COACH_UPDATE_SCHEMA: Schema = Schema {
    required: &[],
    max_length: &[("name", 100), ("team", 100)],
};

const fn read_route(name: &'static str, limit: u32) -> RouteSpec {
    RouteSpec { name, requires_key: false, default_limit: per_minute(limit), schema: None }
}

const fn write_route(name: &'static str, limit: u32, schema: Option<&'static Schema>) -> RouteSpec {
    RouteSpec { name, requires_key: true, default_limit: per_minute(limit), schema }
}

pub const GAMES: RouteSpec = read_route("nba_results", 30);
pub const TEAMS: RouteSpec = read_route("teams", 30);
pub const STADIUMS: RouteSpec = read_route("stadiums", 20);
pub const PLAYER_INFO: RouteSpec = read_route("player_info", 30);
pub const PLAYER_STATS: RouteSpec = read_route("player_stats", 30);
pub const CREATE_PLAYER: RouteSpec = write_route("create_player", 10, Some(&PLAYER_SCHEMA));
pub const LIST_COACHES: RouteSpec = read_route("list_coaches", 20);
pub const GET_COACH: RouteSpec = read_route("get_coach", 30);
pub const CREATE_COACH: RouteSpec = write_route("create_coach", 5, Some(&NEW_COACH_SCHEMA));
pub const UPDATE_COACH: RouteSpec = write_route("update_coach", 10, Some(&COACH_UPDATE_SCHEMA));
pub const DELETE_COACH: RouteSpec = write_route("delete_coach", 5, None);

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub guard: RequestGuard,
    pub games: Arc<GameService>,
    pub teams: Arc<ApiTeamsService>,
    pub stadiums: Arc<StadiumService>,
    pub player_stats: Arc<PlayerStatsService>,
    pub players: SafePlayerService,
    pub coaches: SafeCoachService,
}

impl ApiState {
    pub fn new(config: Config) -> ApiState {
        ApiState::with_counter_store(config, Arc::new(InMemCounterStore::new()))
    }

    pub fn with_counter_store(config: Config, store: Arc<dyn CounterStore>) -> ApiState {
        let config = Arc::new(config);
        let limiter = RateLimiter::new(store, config.default_limits.clone());
        let root = config.data_path.clone();
        ApiState {
            guard: RequestGuard::new(config.clone(), limiter),
            games: Arc::new(GameService::new(&root)),
            teams: Arc::new(ApiTeamsService::new(&root)),
            stadiums: Arc::new(StadiumService::new(&root)),
            player_stats: Arc::new(PlayerStatsService::new(&root)),
            players: PlayerService::new(&root),
            coaches: CoachService::new(&root),
            config,
        }
    }
}

/// Remote address of the connection, `unknown` when the server runs without connect info.
pub struct ClientIp(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts.extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|e| e.0.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(ip))
    }
}

fn load<T>(result: Result<Option<T>, DbError>, message: &str) -> Result<T, ApiError> {
    match result {
        Ok(Some(data)) => Ok(data),
        Ok(None) => Err(ApiError::internal(message, "collection file is missing")),
        Err(e) => Err(ApiError::internal(message, e)),
    }
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound("Coach not found".to_string()))
}

pub struct Api;
impl Api {
    pub fn router(state: ApiState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list(state.config.cors_origins.iter().filter_map(|e| e.parse::<HeaderValue>().ok())))
            .allow_methods(vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers(vec![CONTENT_TYPE, AUTHORIZATION, HeaderName::from_static(API_KEY_HEADER)]);

        Router::new()
            .route("/api/health", get(Api::health))
            .route("/api/nba-results", get(Api::get_games))
            .route("/api/teams", get(Api::get_teams))
            .route("/api/stadiums", get(Api::get_stadiums))
            .route("/api/player-info", get(Api::get_player_info))
            .route("/api/player-stats", get(Api::get_player_stats))
            .route("/api/players", post(Api::create_player))
            .route("/api/coaches", get(Api::get_coaches).post(Api::create_coach))
            .route("/api/coaches/:id", get(Api::get_coach).put(Api::update_coach).delete(Api::delete_coach))
            .fallback(Api::not_found)
            .with_state(state)
            .layer(ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
            )
    }

    pub async fn serve(state: ApiState, addr: SocketAddr) -> anyhow::Result<()> {
        let server = axum::Server::try_bind(&addr)?
            .serve(Api::router(state).into_make_service_with_connect_info::<SocketAddr>());
        log::info!("[API] Listening on {}", server.local_addr());
        server.await?;
        Ok(())
    }

    /// Binds and serves in the background, returning the bound address.
    pub fn spawn(state: ApiState, addr: SocketAddr) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
        let server = axum::Server::try_bind(&addr)?
            .serve(Api::router(state).into_make_service_with_connect_info::<SocketAddr>());
        let local_addr = server.local_addr();
        log::info!("[API] Listening on {}", local_addr);
        let handle = tokio::spawn(async move {
            server.await.ok_log("[API] Server stopped");
        });
        Ok((local_addr, handle))
    }

    async fn health() -> Json<Value> {
        Json(json!({ "status": "healthy", "service": "NBA Backend API" }))
    }

    async fn get_games(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap) -> Result<Json<GamesRsp>, ApiError> {
        state.guard.admit(&GAMES, &ip, &headers)?;
        let result = load(state.games.read(), "Failed to load NBA data")?;
        Ok(Json(GamesRsp { result }))
    }

    async fn get_teams(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap) -> Result<Json<TeamsRsp>, ApiError> {
        state.guard.admit(&TEAMS, &ip, &headers)?;
        let teams = load(state.teams.read(), "Failed to load teams data")?;
        Ok(Json(TeamsRsp { teams }))
    }

    async fn get_stadiums(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap) -> Result<Json<StadiumsRsp>, ApiError> {
        state.guard.admit(&STADIUMS, &ip, &headers)?;
        let stadiums = load(state.stadiums.read(), "Failed to load stadiums data")?;
        Ok(Json(StadiumsRsp { stadiums }))
    }

    async fn get_player_stats(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap) -> Result<Json<PlayerStatsRsp>, ApiError> {
        state.guard.admit(&PLAYER_STATS, &ip, &headers)?;
        let player_stats = load(state.player_stats.read(), "Failed to load player stats data")?;
        Ok(Json(PlayerStatsRsp { player_stats }))
    }

    async fn get_player_info(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap) -> Result<Json<Vec<ApiPlayerInfo>>, ApiError> {
        state.guard.admit(&PLAYER_INFO, &ip, &headers)?;
        let players = state.players.read().await.read_info()
            .map_err(|e| ApiError::internal("Failed to fetch player information", e))?;
        if players.is_empty() {
            return Err(ApiError::NotFound("No player data available".to_string()));
        }
        Ok(Json(players))
    }

    async fn create_player(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap, body: Bytes) -> Result<(StatusCode, Json<ApiPlayer>), ApiError> {
        let new_player: NewPlayer = state.guard.admit_payload(&CREATE_PLAYER, &ip, &headers, &body)?;
        let player = state.players.write().await.create(new_player).map_err(|e| {
            log_security_event("PLAYER_CREATE_ERROR", &ip, CREATE_PLAYER.name, &e.to_string());
            ApiError::internal("Failed to create player", e)
        })?;
        log::info!("[API] Player created - ID: {}, Name: {} by {ip}", player.id, player.name);
        Ok((StatusCode::CREATED, Json(player)))
    }

    async fn get_coaches(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap) -> Result<Json<Vec<ApiCoach>>, ApiError> {
        state.guard.admit(&LIST_COACHES, &ip, &headers)?;
        let coaches = load(state.coaches.read().await.read_all(), "Failed to load coaches data")?;
        Ok(Json(coaches))
    }

    async fn get_coach(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<ApiCoach>, ApiError> {
        let id = parse_id(&id)?;
        state.guard.admit(&GET_COACH, &ip, &headers)?;
        let coach = state.coaches.read().await.read(id)
            .map_err(|e| ApiError::internal("Failed to fetch coach", e))?;
        coach.map(Json).ok_or_else(|| ApiError::NotFound("Coach not found".to_string()))
    }

    async fn create_coach(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap, body: Bytes) -> Result<(StatusCode, Json<ApiCoach>), ApiError> {
        let new_coach: NewCoach = state.guard.admit_payload(&CREATE_COACH, &ip, &headers, &body)?;
        let coach = state.coaches.write().await.create(new_coach).map_err(|e| {
            log_security_event("COACH_CREATE_ERROR", &ip, CREATE_COACH.name, &e.to_string());
            ApiError::internal("Failed to create coach", e)
        })?;
        log::info!("[API] Coach created - ID: {}, Name: {} by {ip}", coach.id, coach.name);
        Ok((StatusCode::CREATED, Json(coach)))
    }

    async fn update_coach(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap, Path(id): Path<String>, body: Bytes) -> Result<Json<ApiCoach>, ApiError> {
        let id = parse_id(&id)?;
        let update: CoachUpdate = state.guard.admit_payload(&UPDATE_COACH, &ip, &headers, &body)?;
        let updated = state.coaches.write().await.update(id, update).map_err(|e| {
            log_security_event("COACH_UPDATE_ERROR", &ip, UPDATE_COACH.name, &e.to_string());
            ApiError::internal("Failed to update coach", e)
        })?;
        let coach = updated.ok_or_else(|| ApiError::NotFound("Coach not found".to_string()))?;
        log::info!("[API] Coach updated - ID: {id} by {ip}");
        Ok(Json(coach))
    }

    async fn delete_coach(State(state): State<ApiState>, ClientIp(ip): ClientIp, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
        let id = parse_id(&id)?;
        state.guard.admit(&DELETE_COACH, &ip, &headers)?;
        let deleted = state.coaches.write().await.delete(id).map_err(|e| {
            log_security_event("COACH_DELETE_ERROR", &ip, DELETE_COACH.name, &e.to_string());
            ApiError::internal("Failed to delete coach", e)
        })?;
        if !deleted {
            return Err(ApiError::NotFound("Coach not found".to_string()));
        }
        log::info!("[API] Coach deleted - ID: {id} by {ip}");
        Ok(Json(json!({ "result": true })))
    }

    async fn not_found(ClientIp(ip): ClientIp, uri: Uri) -> ApiError {
        log_security_event("404_ERROR", &ip, uri.path(), "unknown route");
        ApiError::NotFound("Resource not found".to_string())
    }
}
