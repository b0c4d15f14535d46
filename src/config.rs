use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

/// Timing knobs for the session coordinator and its scheduled tasks
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Delay between "everyone is ready" and the automatic game start
    pub auto_start_delay: Duration,
    /// Length of the timed discussion phase of a game
    pub game_duration_secs: u32,
    /// How far in the future `ends_at` is moved when the master ends early
    pub master_end_grace: Duration,
    /// Time allowed for voting after `ends_at` before the game is archived
    pub voting_window: Duration,
    /// Period of the word-reveal sweep
    pub reveal_sweep_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            auto_start_delay: Duration::from_secs(5),
            game_duration_secs: 423,
            master_end_grace: Duration::from_secs(3),
            voting_window: Duration::from_secs(30),
            reveal_sweep_interval: Duration::from_millis(1000),
        }
    }
}

impl CoordinatorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            auto_start_delay: Duration::from_secs(env_or(
                "AUTO_START_DELAY_SECS",
                defaults.auto_start_delay.as_secs(),
            )),
            game_duration_secs: env_or("GAME_DURATION_SECS", defaults.game_duration_secs),
            master_end_grace: Duration::from_secs(env_or(
                "MASTER_END_GRACE_SECS",
                defaults.master_end_grace.as_secs(),
            )),
            voting_window: Duration::from_secs(env_or(
                "VOTING_WINDOW_SECS",
                defaults.voting_window.as_secs(),
            )),
            reveal_sweep_interval: Duration::from_millis(env_or(
                "REVEAL_SWEEP_INTERVAL_MS",
                defaults.reveal_sweep_interval.as_millis() as u64,
            )),
        }
    }
}

const DEV_JWT_SECRET: &str = "insider-dev-secret";

/// Process-wide configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub jwt_secret: String,
    pub token_lifetime_days: i64,
    pub coordinator: CoordinatorConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }),
            token_lifetime_days: env_or("SESSION_EXPIRATION_DAYS", 365),
            coordinator: CoordinatorConfig::from_env(),
        };

        debug!(
            bind_address = %config.bind_address,
            token_lifetime_days = config.token_lifetime_days,
            auto_start_delay_secs = config.coordinator.auto_start_delay.as_secs(),
            game_duration_secs = config.coordinator.game_duration_secs,
            voting_window_secs = config.coordinator.voting_window.as_secs(),
            "Loaded configuration"
        );

        config
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key = key, value = %raw, "Ignoring unparsable environment value");
            default
        }),
        Err(_) => default,
    }
}
