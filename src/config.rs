use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;

use crate::floor::FloorPolicy;
use crate::gate::GateConfig;
use crate::matchup::current_season_year;
use crate::ranking::{BetProfile, DEFAULT_PER_PLAYER_CAP};

const DEFAULT_API_BASE: &str = "https://v1.nba.api-sports.io";
const DEFAULT_LEGS: usize = 4;
const DEFAULT_PLAYERS_PER_TEAM: usize = 18;
pub const PLAYERS_PER_TEAM_MIN: usize = 8;
pub const PLAYERS_PER_TEAM_MAX: usize = 30;

/// Knobs for the pure selection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    pub gate: GateConfig,
    pub floor_policy: FloorPolicy,
    pub per_player_cap: usize,
    pub legs: usize,
    pub profile: BetProfile,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            floor_policy: FloorPolicy::Skip,
            per_player_cap: DEFAULT_PER_PLAYER_CAP,
            legs: DEFAULT_LEGS,
            profile: BetProfile::Safe,
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        let gate = GateConfig {
            all_games_min: env_parse("SGP_GATE_ALL_MIN").unwrap_or(d.gate.all_games_min),
            heavy_minutes: env_parse("SGP_GATE_OVER_MIN").unwrap_or(d.gate.heavy_minutes),
            heavy_games: env_parse::<usize>("SGP_GATE_OVER_COUNT")
                .unwrap_or(d.gate.heavy_games)
                .clamp(1, 5),
        };
        let floor_policy = env::var("SGP_FLOOR_POLICY")
            .ok()
            .and_then(|v| FloorPolicy::from_label(&v))
            .unwrap_or(d.floor_policy);
        let profile = env::var("SGP_PROFILE")
            .ok()
            .and_then(|v| BetProfile::from_label(&v))
            .unwrap_or(d.profile);

        Self {
            gate,
            floor_policy,
            per_player_cap: env_parse::<usize>("SGP_PER_PLAYER_CAP")
                .unwrap_or(d.per_player_cap)
                .clamp(1, 4),
            legs: env_parse::<usize>("SGP_LEGS").unwrap_or(d.legs).clamp(3, 5),
            profile,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retries: u32,
    /// Overrides the response cache location (`SGP_CACHE_DIR`).
    pub cache_dir: Option<PathBuf>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let base_url = env::var("API_SPORTS_BASE")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_key = env::var("API_SPORTS_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let timeout_secs = env_parse::<u64>("API_TIMEOUT_SECS").unwrap_or(45).clamp(5, 120);
        let retries = env_parse::<u32>("API_RETRIES").unwrap_or(5).clamp(1, 10);
        let cache_dir = env::var("SGP_CACHE_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            retries,
            cache_dir,
        }
    }
}

/// Full runtime configuration for the live builders.
#[derive(Debug, Clone)]
pub struct SgpConfig {
    pub api: ApiConfig,
    pub model: ModelConfig,
    pub season: i32,
    pub players_per_team: usize,
    pub fetch_parallelism: usize,
}

impl SgpConfig {
    pub fn from_env() -> Self {
        let season = env_parse::<i32>("SGP_SEASON")
            .unwrap_or_else(|| current_season_year(Local::now().date_naive()));
        Self {
            api: ApiConfig::from_env(),
            model: ModelConfig::from_env(),
            season,
            players_per_team: players_per_team_from_env(),
            fetch_parallelism: env_parse::<usize>("FETCH_PARALLELISM")
                .unwrap_or(6)
                .clamp(2, 32),
        }
    }
}

/// Roster entries checked per team, from `SGP_PLAYERS_PER_TEAM` (default 18, 8..=30).
pub fn players_per_team_from_env() -> usize {
    players_per_team_or_default(env_parse("SGP_PLAYERS_PER_TEAM"))
}

fn players_per_team_or_default(raw: Option<usize>) -> usize {
    raw.unwrap_or(DEFAULT_PLAYERS_PER_TEAM)
        .clamp(PLAYERS_PER_TEAM_MIN, PLAYERS_PER_TEAM_MAX)
}

/// Loads `.env.local` then `.env` if present. Already-set variables win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
