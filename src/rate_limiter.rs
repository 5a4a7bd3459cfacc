use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::log;

/// `count` requests per `period`, written as `"10 per minute"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RateLimit {
    pub count: u32,
    pub period: Duration,
}

impl RateLimit {
    pub fn per_second(count: u32) -> RateLimit {
        RateLimit { count, period: Duration::from_secs(1) }
    }
    pub fn per_minute(count: u32) -> RateLimit {
        RateLimit { count, period: Duration::from_secs(60) }
    }
    pub fn per_hour(count: u32) -> RateLimit {
        RateLimit { count, period: Duration::from_secs(60 * 60) }
    }
    pub fn per_day(count: u32) -> RateLimit {
        RateLimit { count, period: Duration::from_secs(24 * 60 * 60) }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid rate limit '{0}', expected '<n> per <second|minute|hour|day>'")]
pub struct ParseRateLimitError(String);

impl FromStr for RateLimit {
    type Err = ParseRateLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRateLimitError(s.to_string());
        let normalized = s.trim().to_lowercase();
        let (count, unit) = normalized
            .split_once(" per ")
            .or_else(|| normalized.split_once('/'))
            .ok_or_else(err)?;
        let count: u32 = count.trim().parse().map_err(|_| err())?;
        match unit.trim().trim_end_matches('s') {
            "second" => Ok(RateLimit::per_second(count)),
            "minute" => Ok(RateLimit::per_minute(count)),
            "hour" => Ok(RateLimit::per_hour(count)),
            "day" => Ok(RateLimit::per_day(count)),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for RateLimit {
    type Error = ParseRateLimitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RateLimit> for String {
    fn from(v: RateLimit) -> Self {
        v.to_string()
    }
}

impl Display for RateLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.period.as_secs() {
            1 => write!(f, "{} per second", self.count),
            60 => write!(f, "{} per minute", self.count),
            3600 => write!(f, "{} per hour", self.count),
            86400 => write!(f, "{} per day", self.count),
            s => write!(f, "{} per {s} seconds", self.count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub count: u32,
    pub reset_in: Duration,
}

/// Shared counter backend. `hit` must increment and read in one atomic step,
/// a multi-worker deployment plugs an external store in here.
pub trait CounterStore: Send + Sync {
    fn hit(&self, key: &str, period: Duration, now: Instant) -> WindowCount;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    period: Duration,
    count: u32,
}

impl Window {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.period
    }
}

const PRUNE_THRESHOLD: usize = 1024;

struct Windows {
    map: HashMap<String, Window>,
    /// Size that triggers the next sweep. Doubles the live size after each sweep,
    /// so a map full of unexpired windows is not rescanned on every hit.
    prune_at: usize,
}

/// Fixed windows kept in process memory. A window opens on the first hit for a key.
pub struct InMemCounterStore {
    windows: Mutex<Windows>,
}

impl InMemCounterStore {
    pub fn new() -> InMemCounterStore {
        InMemCounterStore {
            windows: Mutex::new(Windows { map: HashMap::new(), prune_at: PRUNE_THRESHOLD }),
        }
    }
}

impl Default for InMemCounterStore {
    fn default() -> Self {
        InMemCounterStore::new()
    }
}

impl CounterStore for InMemCounterStore {
    fn hit(&self, key: &str, period: Duration, now: Instant) -> WindowCount {
        let mut guard = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let Windows { map: windows, prune_at } = &mut *guard;

        if windows.len() > *prune_at {
            let before = windows.len();
            windows.retain(|_, w| !w.is_expired(now));
            *prune_at = PRUNE_THRESHOLD.max(windows.len() * 2);
            log::debug!("[LIMIT] Pruned {} expired windows, next sweep at {}", before - windows.len(), prune_at);
        }

        let window = windows
            .entry(key.to_string())
            .or_insert(Window { started: now, period, count: 0 });
        if window.is_expired(now) {
            *window = Window { started: now, period, count: 0 };
        }
        window.count = window.count.saturating_add(1);

        WindowCount {
            count: window.count,
            reset_in: (window.started + window.period).saturating_duration_since(now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub limit: RateLimit,
    pub retry_after: Duration,
}

impl RateLimited {
    /// Whole seconds, never zero.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);
        secs.max(1)
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    global_limits: Vec<RateLimit>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, global_limits: Vec<RateLimit>) -> RateLimiter {
        RateLimiter { store, global_limits }
    }

    pub fn check(&self, route: &str, source: &str, limit: &RateLimit) -> Result<(), RateLimited> {
        self.check_at(route, source, limit, Instant::now())
    }

    /// Counts one request from `source` against the route limit, then against
    /// every global limit shared by all routes.
    pub fn check_at(&self, route: &str, source: &str, limit: &RateLimit, now: Instant) -> Result<(), RateLimited> {
        let route_key = format!("route:{route}:{source}:{}", limit.period.as_secs());
        RateLimiter::enforce(self.store.hit(&route_key, limit.period, now), limit)?;

        for global in &self.global_limits {
            let global_key = format!("global:{source}:{}", global.period.as_secs());
            RateLimiter::enforce(self.store.hit(&global_key, global.period, now), global)?;
        }
        Ok(())
    }

    fn enforce(window: WindowCount, limit: &RateLimit) -> Result<(), RateLimited> {
        if window.count > limit.count {
            Err(RateLimited { limit: *limit, retry_after: window.reset_in })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::{CounterStore, InMemCounterStore, RateLimit, RateLimiter};

    fn limiter(global: Vec<RateLimit>) -> RateLimiter {
        RateLimiter::new(Arc::new(InMemCounterStore::new()), global)
    }

    #[test]
    fn parses_limit_strings() {
        assert_eq!("10 per minute".parse(), Ok(RateLimit::per_minute(10)));
        assert_eq!("200 per day".parse(), Ok(RateLimit::per_day(200)));
        assert_eq!(" 50 Per Hour ".parse(), Ok(RateLimit::per_hour(50)));
        assert_eq!("5/second".parse(), Ok(RateLimit::per_second(5)));
        assert_eq!("3 per minutes".parse(), Ok(RateLimit::per_minute(3)));
        assert!("ten per minute".parse::<RateLimit>().is_err());
        assert!("10 per fortnight".parse::<RateLimit>().is_err());
        assert!("10".parse::<RateLimit>().is_err());
    }

    #[test]
    fn limit_round_trips_through_config_json() {
        let limits: Vec<RateLimit> = serde_json::from_str(r#"["200 per day", "50 per hour"]"#).unwrap();
        assert_eq!(limits, vec![RateLimit::per_day(200), RateLimit::per_hour(50)]);
        assert_eq!(serde_json::to_string(&RateLimit::per_minute(10)).unwrap(), "\"10 per minute\"");
        assert!(serde_json::from_str::<RateLimit>("\"lots\"").is_err());
    }

    #[test]
    fn rejects_after_limit_and_recovers_next_window() {
        let limiter = limiter(vec![]);
        let limit = RateLimit::per_minute(10);
        let start = Instant::now();

        for i in 0..10 {
            let now = start + Duration::from_secs(i);
            assert!(limiter.check_at("create_player", "10.0.0.1", &limit, now).is_ok());
        }
        let rejected = limiter
            .check_at("create_player", "10.0.0.1", &limit, start + Duration::from_secs(15))
            .unwrap_err();
        assert_eq!(rejected.limit, limit);
        assert_eq!(rejected.retry_after, Duration::from_secs(45));
        assert_eq!(rejected.retry_after_secs(), 45);

        let next_window = start + Duration::from_secs(60);
        assert!(limiter.check_at("create_player", "10.0.0.1", &limit, next_window).is_ok());
    }

    #[test]
    fn counters_are_per_route_and_per_source() {
        let limiter = limiter(vec![]);
        let limit = RateLimit::per_minute(1);
        let now = Instant::now();

        assert!(limiter.check_at("create_player", "10.0.0.1", &limit, now).is_ok());
        assert!(limiter.check_at("create_player", "10.0.0.1", &limit, now).is_err());
        assert!(limiter.check_at("create_player", "10.0.0.2", &limit, now).is_ok());
        assert!(limiter.check_at("create_coach", "10.0.0.1", &limit, now).is_ok());
    }

    #[test]
    fn global_limit_spans_routes() {
        let limiter = limiter(vec![RateLimit::per_hour(3)]);
        let route_limit = RateLimit::per_minute(100);
        let now = Instant::now();

        assert!(limiter.check_at("teams", "10.0.0.1", &route_limit, now).is_ok());
        assert!(limiter.check_at("stadiums", "10.0.0.1", &route_limit, now).is_ok());
        assert!(limiter.check_at("coaches", "10.0.0.1", &route_limit, now).is_ok());

        let rejected = limiter.check_at("player_info", "10.0.0.1", &route_limit, now).unwrap_err();
        assert_eq!(rejected.limit, RateLimit::per_hour(3));
        assert!(limiter.check_at("player_info", "10.0.0.2", &route_limit, now).is_ok());
    }

    #[test]
    fn concurrent_hits_are_never_lost() {
        let store = InMemCounterStore::new();
        let now = Instant::now();

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..250 {
                        store.hit("shared", Duration::from_secs(60), now);
                    }
                });
            }
        });

        assert_eq!(store.hit("shared", Duration::from_secs(60), now).count, 2001);
    }

    #[test]
    fn live_windows_are_not_rescanned_on_every_hit() {
        let store = InMemCounterStore::new();
        let now = Instant::now();

        for i in 0..1100 {
            store.hit(&format!("route:teams:10.0.{}.{}:60", i / 256, i % 256), Duration::from_secs(60), now);
        }

        let windows = store.windows.lock().unwrap();
        assert_eq!(windows.map.len(), 1100);
        // one sweep at 1025 entries freed nothing, the next one waits for the map to double
        assert_eq!(windows.prune_at, 2050);
    }

    #[test]
    fn expired_windows_are_swept() {
        let store = InMemCounterStore::new();
        let now = Instant::now();

        for i in 0..1025 {
            store.hit(&format!("key-{i}"), Duration::from_secs(1), now);
        }
        store.hit("fresh", Duration::from_secs(1), now + Duration::from_secs(2));

        let windows = store.windows.lock().unwrap();
        assert_eq!(windows.map.len(), 1);
        assert_eq!(windows.prune_at, 1024);
    }

    #[test]
    fn counter_saturates() {
        let store = InMemCounterStore::new();
        let now = Instant::now();
        store.hit("busy", Duration::from_secs(60), now);
        store.windows.lock().unwrap().map.get_mut("busy").unwrap().count = u32::MAX;

        assert_eq!(store.hit("busy", Duration::from_secs(60), now).count, u32::MAX);
    }

    #[test]
    fn retry_after_rounds_up() {
        let limiter = limiter(vec![]);
        let limit = RateLimit::per_second(1);
        let now = Instant::now();
        limiter.check_at("r", "s", &limit, now).unwrap();

        let rejected = limiter.check_at("r", "s", &limit, now + Duration::from_millis(900)).unwrap_err();

        assert_eq!(rejected.retry_after, Duration::from_millis(100));
        assert_eq!(rejected.retry_after_secs(), 1);
    }
}
