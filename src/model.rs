use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of games a window must hold before it can be modeled.
pub const WINDOW_LEN: usize = 5;
pub const MIN_SLIP_LEGS: usize = 3;
pub const MAX_SLIP_LEGS: usize = 5;

/// One player's box-score line for a single completed game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLog {
    pub minutes: u32,
    pub points: u32,
    pub rebounds: u32,
    pub assists: u32,
}

impl GameLog {
    pub fn new(minutes: u32, points: u32, rebounds: u32, assists: u32) -> Self {
        Self {
            minutes,
            points,
            rebounds,
            assists,
        }
    }

    pub fn pra(&self) -> u32 {
        self.points
            .saturating_add(self.rebounds)
            .saturating_add(self.assists)
    }

    pub fn value(&self, stat: StatCategory) -> u32 {
        match stat {
            StatCategory::Reb => self.rebounds,
            StatCategory::Ast => self.assists,
            StatCategory::Pra => self.pra(),
            StatCategory::Pts => self.points,
        }
    }
}

/// The most recent games for one player, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerWindow {
    pub player_name: String,
    pub team_code: String,
    games: Vec<GameLog>,
}

impl PlayerWindow {
    /// Builds a window from games ordered most-recent-first. Anything past the fifth game is dropped.
    pub fn new(
        player_name: impl Into<String>,
        team_code: impl Into<String>,
        mut games: Vec<GameLog>,
    ) -> Self {
        games.truncate(WINDOW_LEN);
        Self {
            player_name: player_name.into(),
            team_code: team_code.into(),
            games,
        }
    }

    pub fn games(&self) -> &[GameLog] {
        &self.games
    }

    pub fn is_complete(&self) -> bool {
        self.games.len() == WINDOW_LEN
    }

    pub fn minutes(&self) -> Vec<u32> {
        self.games.iter().map(|g| g.minutes).collect()
    }

    pub fn values(&self, stat: StatCategory) -> Vec<u32> {
        self.games.iter().map(|g| g.value(stat)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatCategory {
    #[serde(rename = "REB")]
    Reb,
    #[serde(rename = "AST")]
    Ast,
    #[serde(rename = "PRA")]
    Pra,
    #[serde(rename = "PTS")]
    Pts,
}

impl StatCategory {
    /// Preference order; points props are the last resort.
    pub const ALL: [StatCategory; 4] = [
        StatCategory::Reb,
        StatCategory::Ast,
        StatCategory::Pra,
        StatCategory::Pts,
    ];

    pub const fn preference_rank(self) -> u8 {
        match self {
            StatCategory::Reb => 0,
            StatCategory::Ast => 1,
            StatCategory::Pra => 2,
            StatCategory::Pts => 3,
        }
    }

    /// Lower is steadier.
    pub const fn variance_rank(self) -> u8 {
        match self {
            StatCategory::Reb | StatCategory::Ast => 1,
            StatCategory::Pra => 2,
            StatCategory::Pts => 3,
        }
    }

    pub fn is_points(self) -> bool {
        self == StatCategory::Pts
    }

    pub fn label(self) -> &'static str {
        match self {
            StatCategory::Reb => "REB",
            StatCategory::Ast => "AST",
            StatCategory::Pra => "PRA",
            StatCategory::Pts => "PTS",
        }
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single over-the-floor proposition for one player and one stat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLeg {
    pub player_name: String,
    pub team_code: String,
    pub stat: StatCategory,
    pub line: u32,
    pub preference_rank: u8,
    pub variance_rank: u8,
}

impl CandidateLeg {
    pub fn new(
        player_name: impl Into<String>,
        team_code: impl Into<String>,
        stat: StatCategory,
        line: u32,
    ) -> Self {
        Self {
            player_name: player_name.into(),
            team_code: team_code.into(),
            stat,
            line,
            preference_rank: stat.preference_rank(),
            variance_rank: stat.variance_rank(),
        }
    }

    pub fn same_prop(&self, other: &CandidateLeg) -> bool {
        self.player_name == other.player_name && self.stat == other.stat
    }
}

impl fmt::Display for CandidateLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} >= {} ({})",
            self.player_name, self.stat, self.line, self.team_code
        )
    }
}

/// An ordered parlay of 3 to 5 legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slip {
    legs: Vec<CandidateLeg>,
}

impl Slip {
    /// Returns `None` when the leg count is outside `MIN_SLIP_LEGS..=MAX_SLIP_LEGS`.
    pub fn new(legs: Vec<CandidateLeg>) -> Option<Self> {
        if (MIN_SLIP_LEGS..=MAX_SLIP_LEGS).contains(&legs.len()) {
            Some(Self { legs })
        } else {
            None
        }
    }

    pub fn legs(&self) -> &[CandidateLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidateLeg> {
        self.legs.iter()
    }
}

impl<'a> IntoIterator for &'a Slip {
    type Item = &'a CandidateLeg;
    type IntoIter = std::slice::Iter<'a, CandidateLeg>;

    fn into_iter(self) -> Self::IntoIter {
        self.legs.iter()
    }
}
