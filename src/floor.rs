use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{CandidateLeg, PlayerWindow, StatCategory};

/// What to do with a stat whose floor comes out at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FloorPolicy {
    #[default]
    Skip,
    ClampToOne,
}

impl FloorPolicy {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "skip" | "drop" => Some(FloorPolicy::Skip),
            "clamp" | "clamp1" | "clamp_to_one" => Some(FloorPolicy::ClampToOne),
            _ => None,
        }
    }

    fn apply(self, line: u32) -> Option<u32> {
        match (self, line) {
            (FloorPolicy::Skip, 0) => None,
            (FloorPolicy::ClampToOne, 0) => Some(1),
            (_, line) => Some(line),
        }
    }
}

/// Worst game in the window discounted by 10%, truncated. Empty input gives 0.
pub fn compute_floor(values: &[u32]) -> u32 {
    // min * 0.9 floored, kept in integers so 10 -> 9 and 19 -> 17 exactly.
    values
        .iter()
        .min()
        .map(|&m| (u64::from(m) * 9 / 10) as u32)
        .unwrap_or(0)
}

/// One leg per stat category for an eligible window, in preference order.
/// Categories with a degenerate floor are handled per `policy`.
pub fn floor_legs(window: &PlayerWindow, policy: FloorPolicy) -> Vec<CandidateLeg> {
    let mut legs = Vec::with_capacity(StatCategory::ALL.len());
    for stat in StatCategory::ALL {
        let raw = compute_floor(&window.values(stat));
        let Some(line) = policy.apply(raw) else {
            debug!(
                player = %window.player_name,
                stat = %stat,
                "skipping degenerate floor"
            );
            continue;
        };
        legs.push(CandidateLeg::new(
            window.player_name.clone(),
            window.team_code.clone(),
            stat,
            line,
        ));
    }
    legs
}
