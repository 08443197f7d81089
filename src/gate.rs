use serde::{Deserialize, Serialize};

use crate::model::{PlayerWindow, WINDOW_LEN};

/// Minutes-consistency thresholds. The every-game floor is 28 by default and can be
/// lowered to 27 from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Every game must reach at least this many minutes.
    pub all_games_min: u32,
    /// Strict threshold for the "most games" clause.
    pub heavy_minutes: u32,
    /// Games that must exceed `heavy_minutes`.
    pub heavy_games: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            all_games_min: 28,
            heavy_minutes: 30,
            heavy_games: 4,
        }
    }
}

/// True when the window holds exactly five games and either every game reached
/// `all_games_min` or at least `heavy_games` went over `heavy_minutes`.
pub fn is_eligible(window: &PlayerWindow, cfg: &GateConfig) -> bool {
    minutes_pass(&window.minutes(), cfg)
}

pub fn minutes_pass(minutes: &[u32], cfg: &GateConfig) -> bool {
    if minutes.len() != WINDOW_LEN {
        return false;
    }
    let all_steady = minutes.iter().all(|&m| m >= cfg.all_games_min);
    let heavy = minutes.iter().filter(|&&m| m > cfg.heavy_minutes).count();
    all_steady || heavy >= cfg.heavy_games
}
