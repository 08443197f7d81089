use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api_sports::{ApiSports, RosterPlayer, TeamRef};
use crate::error::MatchupError;
use crate::model::{GameLog, WINDOW_LEN};

/// Where raw per-game player lines come from. Implementations only hand back
/// completed, fully populated games, newest first.
pub trait StatsSource: Send + Sync {
    fn resolve_team(&self, code: &str) -> Result<TeamRef>;
    fn roster(&self, team: &TeamRef) -> Result<Vec<RosterPlayer>>;
    fn recent_games(&self, team: &TeamRef, player: &RosterPlayer) -> Result<Vec<GameLog>>;
}

/// Live source backed by API-NBA for one season.
pub struct ApiSportsSource {
    api: ApiSports,
    season: i32,
    teams: HashMap<String, TeamRef>,
}

impl ApiSportsSource {
    pub fn new(api: ApiSports, season: i32) -> Result<Self> {
        let teams = api.teams().context("loading team list")?;
        Ok(Self { api, season, teams })
    }
}

impl StatsSource for ApiSportsSource {
    fn resolve_team(&self, code: &str) -> Result<TeamRef> {
        self.teams
            .get(&code.to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| MatchupError::UnknownTeam(code.to_string()).into())
    }

    fn roster(&self, team: &TeamRef) -> Result<Vec<RosterPlayer>> {
        self.api.team_players(team.id, self.season)
    }

    fn recent_games(&self, _team: &TeamRef, player: &RosterPlayer) -> Result<Vec<GameLog>> {
        self.api.player_games(player.id, self.season, WINDOW_LEN)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFile {
    pub teams: Vec<FixtureTeam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureTeam {
    pub id: u32,
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub players: Vec<FixturePlayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturePlayer {
    pub id: u32,
    pub name: String,
    /// Newest first.
    #[serde(default)]
    pub games: Vec<GameLog>,
}

/// Offline source that serves a recorded matchup from JSON.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    teams: Vec<FixtureTeam>,
}

impl FixtureSource {
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(raw).context("invalid matchup fixture json")?;
        Ok(Self { teams: file.teams })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read fixture {}", path.display()))?;
        Self::from_json(&raw)
    }

    fn team(&self, id: u32) -> Option<&FixtureTeam> {
        self.teams.iter().find(|t| t.id == id)
    }
}

impl StatsSource for FixtureSource {
    fn resolve_team(&self, code: &str) -> Result<TeamRef> {
        self.teams
            .iter()
            .find(|t| t.code.eq_ignore_ascii_case(code))
            .map(|t| TeamRef {
                id: t.id,
                code: t.code.to_ascii_uppercase(),
                name: t.name.clone(),
            })
            .ok_or_else(|| MatchupError::UnknownTeam(code.to_string()).into())
    }

    fn roster(&self, team: &TeamRef) -> Result<Vec<RosterPlayer>> {
        let players = self
            .team(team.id)
            .map(|t| {
                t.players
                    .iter()
                    .map(|p| RosterPlayer {
                        id: p.id,
                        name: p.name.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(players)
    }

    fn recent_games(&self, team: &TeamRef, player: &RosterPlayer) -> Result<Vec<GameLog>> {
        let games = self
            .team(team.id)
            .and_then(|t| t.players.iter().find(|p| p.id == player.id))
            .map(|p| p.games.iter().take(WINDOW_LEN).copied().collect())
            .unwrap_or_default();
        Ok(games)
    }
}
