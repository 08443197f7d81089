use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::{CandidateLeg, StatCategory};

pub const DEFAULT_PER_PLAYER_CAP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BetProfile {
    #[default]
    Safe,
    Ideal,
    /// Promotes PRA ahead of REB/AST. PTS stays last.
    HigherRisk,
}

impl BetProfile {
    pub const ALL: [BetProfile; 3] = [BetProfile::Safe, BetProfile::Ideal, BetProfile::HigherRisk];

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "SAFE" => Some(BetProfile::Safe),
            "IDEAL" => Some(BetProfile::Ideal),
            "HIGHER-RISK" | "HIGHERRISK" | "RISK" => Some(BetProfile::HigherRisk),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BetProfile::Safe => "SAFE",
            BetProfile::Ideal => "IDEAL",
            BetProfile::HigherRisk => "HIGHER-RISK",
        }
    }

    pub fn next(self) -> Self {
        match self {
            BetProfile::Safe => BetProfile::Ideal,
            BetProfile::Ideal => BetProfile::HigherRisk,
            BetProfile::HigherRisk => BetProfile::Safe,
        }
    }

    fn preference(self, leg: &CandidateLeg) -> u8 {
        match self {
            BetProfile::Safe | BetProfile::Ideal => leg.preference_rank,
            BetProfile::HigherRisk => match leg.stat {
                StatCategory::Pra => 1,
                StatCategory::Reb | StatCategory::Ast => 2,
                StatCategory::Pts => 3,
            },
        }
    }

    /// Ascending order over `(preference, variance, player name)`.
    pub fn compare(self, a: &CandidateLeg, b: &CandidateLeg) -> Ordering {
        self.preference(a)
            .cmp(&self.preference(b))
            .then(a.variance_rank.cmp(&b.variance_rank))
            .then_with(|| a.player_name.cmp(&b.player_name))
    }
}

/// Keeps at most `cap` of one player's legs. Non-PTS legs are taken first, in the
/// order given; PTS only fills whatever room is left.
pub fn cap_player_legs(legs: Vec<CandidateLeg>, cap: usize) -> Vec<CandidateLeg> {
    let (points, mut kept): (Vec<_>, Vec<_>) = legs.into_iter().partition(|l| l.stat.is_points());
    kept.truncate(cap);
    let room = cap.saturating_sub(kept.len());
    kept.extend(points.into_iter().take(room));
    kept
}

/// Sorts the pooled candidates from both teams. The sort is stable, so identical keys
/// keep their pooling order.
pub fn rank_candidates(mut pool: Vec<CandidateLeg>, profile: BetProfile) -> Vec<CandidateLeg> {
    pool.sort_by(|a, b| profile.compare(a, b));
    pool
}
