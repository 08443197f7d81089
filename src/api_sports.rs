use std::cmp::Reverse;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http_cache::{fetch_json_cached, use_cache_dir};
use crate::http_client::http_client;
use crate::model::GameLog;

const KEY_HEADER: &str = "x-apisports-key";

const TEAMS_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 3600);
const ROSTER_MAX_AGE: Duration = Duration::from_secs(24 * 3600);
const STATS_MAX_AGE: Duration = Duration::from_secs(10 * 60);

const BACKOFF_START_SECS: f64 = 1.0;
const BACKOFF_FACTOR: f64 = 1.7;
const BACKOFF_CAP_SECS: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRef {
    pub id: u32,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterPlayer {
    pub id: u32,
    pub name: String,
}

/// Blocking client for API-NBA on api-sports.io.
pub struct ApiSports {
    client: &'static Client,
    cfg: ApiConfig,
    api_key: String,
}

impl ApiSports {
    pub fn new(cfg: ApiConfig) -> Result<Self> {
        let api_key = cfg.api_key.clone().ok_or(ApiError::MissingKey)?;
        let client = http_client(cfg.timeout)?;
        if let Some(dir) = cfg.cache_dir.clone()
            && !use_cache_dir(dir)
        {
            debug!("response cache directory already chosen");
        }
        Ok(Self {
            client,
            cfg,
            api_key,
        })
    }

    pub fn teams(&self) -> Result<HashMap<String, TeamRef>> {
        let body = self.get("teams", &[], TEAMS_MAX_AGE)?;
        parse_teams_json(&body)
    }

    pub fn team_players(&self, team_id: u32, season: i32) -> Result<Vec<RosterPlayer>> {
        let params = [("team", team_id.to_string()), ("season", season.to_string())];
        let body = self.get("players", &params, ROSTER_MAX_AGE)?;
        parse_roster_json(&body).with_context(|| format!("roster for team {team_id}"))
    }

    /// Most-recent-first game logs for one player, at most `last_n`.
    pub fn player_games(&self, player_id: u32, season: i32, last_n: usize) -> Result<Vec<GameLog>> {
        let params = [("id", player_id.to_string()), ("season", season.to_string())];
        let body = self.get("players/statistics", &params, STATS_MAX_AGE)?;
        parse_player_games_json(&body, last_n)
            .with_context(|| format!("statistics for player {player_id}"))
    }

    fn get(&self, endpoint: &str, params: &[(&str, String)], max_age: Duration) -> Result<String> {
        let url = Url::parse_with_params(&format!("{}/{endpoint}", self.cfg.base_url), params)
            .with_context(|| format!("invalid url for {endpoint}"))?;
        let headers = [(KEY_HEADER, self.api_key.as_str())];

        let mut last_err = String::new();
        for (attempt, pause) in backoff_schedule(self.cfg.retries).into_iter().enumerate() {
            match fetch_json_cached(self.client, url.as_str(), &headers, max_age, &check_envelope) {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() => {
                    warn!(endpoint, attempt = attempt + 1, "stats api request failed: {err}");
                    last_err = err.to_string();
                    if let Some(pause) = pause {
                        thread::sleep(pause);
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(ApiError::Unavailable {
            attempts: self.cfg.retries,
            last: last_err,
        }
        .into())
    }
}

/// Pause after each attempt; the last attempt has none.
fn backoff_schedule(attempts: u32) -> Vec<Option<Duration>> {
    let mut out = Vec::with_capacity(attempts as usize);
    let mut secs = BACKOFF_START_SECS;
    for i in 0..attempts {
        if i + 1 == attempts {
            out.push(None);
        } else {
            out.push(Some(Duration::from_secs_f64(secs)));
            secs = (secs * BACKOFF_FACTOR).min(BACKOFF_CAP_SECS);
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    errors: Value,
    #[serde(default)]
    response: Vec<Value>,
}

fn parse_envelope(raw: &str) -> Result<Envelope> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Envelope {
            errors: Value::Null,
            response: Vec::new(),
        });
    }
    let env: Envelope = serde_json::from_str(trimmed).context("invalid api-sports json")?;
    if let Some(err) = envelope_error(&env.errors) {
        return Err(err.into());
    }
    Ok(env)
}

/// Rejects bodies that must not be cached: unparseable JSON and `errors` payloads.
/// The API answers 200 with an `errors` object for bad keys, quota exhaustion and
/// rate limiting.
pub fn check_envelope(raw: &str) -> Result<(), ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(());
    }
    let env: Envelope = serde_json::from_str(trimmed).map_err(|err| ApiError::Envelope {
        message: format!("invalid json: {err}"),
        throttled: false,
    })?;
    match envelope_error(&env.errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn envelope_error(errors: &Value) -> Option<ApiError> {
    let throttled = match errors {
        Value::Object(map) if !map.is_empty() => map.keys().any(|k| is_throttle_key(k)),
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .any(|v| v.as_str().is_some_and(mentions_limit)),
        Value::String(s) if !s.trim().is_empty() => mentions_limit(s),
        _ => return None,
    };
    Some(ApiError::Envelope {
        message: errors.to_string(),
        throttled,
    })
}

fn is_throttle_key(key: &str) -> bool {
    matches!(key.to_ascii_lowercase().as_str(), "ratelimit" | "requests")
}

fn mentions_limit(text: &str) -> bool {
    text.to_ascii_lowercase().contains("limit")
}

pub fn parse_teams_json(raw: &str) -> Result<HashMap<String, TeamRef>> {
    let env = parse_envelope(raw)?;
    let mut teams: HashMap<String, (TeamRef, bool)> = HashMap::new();
    for item in &env.response {
        let code = item
            .get("code")
            .and_then(Value::as_str)
            .map(|c| c.trim().to_ascii_uppercase())
            .unwrap_or_default();
        let Some(id) = item.get("id").and_then(parse_count) else {
            continue;
        };
        if code.is_empty() {
            continue;
        }
        let franchise = item
            .get("nbaFranchise")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let name = item
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        // Exhibition sides can reuse a code; real franchises win.
        if let Some((_, existing_franchise)) = teams.get(&code)
            && (*existing_franchise || !franchise)
        {
            continue;
        }
        teams.insert(code.clone(), (TeamRef { id, code, name }, franchise));
    }
    Ok(teams.into_iter().map(|(k, (t, _))| (k, t)).collect())
}

pub fn parse_roster_json(raw: &str) -> Result<Vec<RosterPlayer>> {
    let env = parse_envelope(raw)?;
    let players = env
        .response
        .iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(parse_count)?;
            Some(RosterPlayer {
                id,
                name: display_name(item),
            })
        })
        .collect();
    Ok(players)
}

fn display_name(item: &Value) -> String {
    let first = item.get("firstname").and_then(Value::as_str).unwrap_or_default();
    let last = item.get("lastname").and_then(Value::as_str).unwrap_or_default();
    let joined = collapse_whitespace(&format!("{first} {last}"));
    if !joined.is_empty() {
        return joined;
    }
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .map(collapse_whitespace)
        .unwrap_or_default();
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes a `players/statistics` response into game logs, newest first.
/// Rows missing minutes, points, rebounds or assists are dropped.
pub fn parse_player_games_json(raw: &str, last_n: usize) -> Result<Vec<GameLog>> {
    let env = parse_envelope(raw)?;
    let mut rows: Vec<&Value> = env.response.iter().collect();
    rows.sort_by_key(|row| Reverse((game_date(row).unwrap_or_default(), game_id(row))));

    let mut out = Vec::with_capacity(last_n);
    for row in rows {
        if out.len() == last_n {
            break;
        }
        match normalize_row(row) {
            Some(log) => out.push(log),
            None => debug!(game = game_id(row), "dropping incomplete stat line"),
        }
    }
    Ok(out)
}

fn normalize_row(row: &Value) -> Option<GameLog> {
    let minutes = row.get("min").and_then(parse_minutes)?;
    let points = pick(row, &["points", "pts"]).and_then(parse_count)?;
    let rebounds = pick(row, &["totReb", "rebounds", "reb"]).and_then(parse_count)?;
    let assists = pick(row, &["assists", "ast"]).and_then(parse_count)?;
    Some(GameLog::new(minutes, points, rebounds, assists))
}

fn pick<'a>(row: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|v| !v.is_null())
}

fn game_date(row: &Value) -> Option<String> {
    let game = row.get("game");
    let candidates = [
        game.and_then(|g| g.get("date")).and_then(|d| d.get("start")),
        game.and_then(|g| g.get("date")),
        row.get("date"),
        row.get("gameDate"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(|s| s.to_string()))
}

fn game_id(row: &Value) -> u64 {
    row.get("game")
        .and_then(|g| g.get("id"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Accepts numbers, `"34"`, `"34.5"` and `"34:12"`; whole minutes are kept.
fn parse_minutes(v: &Value) -> Option<u32> {
    match v {
        Value::String(s) => {
            let s = s.trim();
            let head = s.split(':').next().unwrap_or(s);
            to_whole(head.parse::<f64>().ok()?)
        }
        other => parse_count(other),
    }
}

fn parse_count(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => to_whole(n.as_f64()?),
        Value::String(s) => to_whole(s.trim().parse::<f64>().ok()?),
        _ => None,
    }
}

fn to_whole(x: f64) -> Option<u32> {
    if x.is_finite() && x >= 0.0 && x < u32::MAX as f64 {
        Some(x.trunc() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minutes_accept_clock_and_decimal_forms() {
        assert_eq!(parse_minutes(&json!("34:12")), Some(34));
        assert_eq!(parse_minutes(&json!("34.9")), Some(34));
        assert_eq!(parse_minutes(&json!(31)), Some(31));
        assert_eq!(parse_minutes(&json!("")), None);
        assert_eq!(parse_minutes(&json!("-")), None);
        assert_eq!(parse_minutes(&Value::Null), None);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let schedule = backoff_schedule(5);
        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule[0], Some(Duration::from_secs_f64(1.0)));
        assert_eq!(schedule[1], Some(Duration::from_secs_f64(1.7)));
        assert!(schedule[3].unwrap() <= Duration::from_secs(6));
        assert_eq!(schedule[4], None);
        assert_eq!(backoff_schedule(1), vec![None]);
    }

    #[test]
    fn throttling_envelopes_are_transient() {
        let quota = r#"{"errors":{"requests":"You have reached the request limit for the day"},"response":[]}"#;
        let per_minute = r#"{"errors":{"rateLimit":"Too many requests"},"response":[]}"#;
        let bad_key = r#"{"errors":{"token":"Error/Missing application key."},"response":[]}"#;
        assert!(check_envelope(quota).unwrap_err().is_transient());
        assert!(check_envelope(per_minute).unwrap_err().is_transient());
        assert!(!check_envelope(bad_key).unwrap_err().is_transient());
        assert!(!check_envelope("<html>").unwrap_err().is_transient());
        assert!(check_envelope(r#"{"errors":[],"response":[]}"#).is_ok());
        assert!(check_envelope("").is_ok());
    }

    #[test]
    fn error_envelope_is_rejected() {
        let raw = r#"{"errors":{"token":"Error/Missing application key."},"response":[]}"#;
        assert!(parse_teams_json(raw).is_err());
        let ok = r#"{"errors":[],"response":[]}"#;
        assert!(parse_teams_json(ok).unwrap().is_empty());
    }

    #[test]
    fn display_name_falls_back() {
        assert_eq!(
            display_name(&json!({"firstname": " LeBron ", "lastname": "James"})),
            "LeBron James"
        );
        assert_eq!(display_name(&json!({"name": "Nene"})), "Nene");
        assert_eq!(display_name(&json!({})), "Unknown");
    }
}
