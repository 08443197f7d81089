use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::floor::floor_legs;
use crate::gate::is_eligible;
use crate::model::{CandidateLeg, MAX_SLIP_LEGS, MIN_SLIP_LEGS, PlayerWindow, Slip};
use crate::ranking::{BetProfile, cap_player_legs, rank_candidates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlipStatus {
    Built,
    NoQualifyingSlip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlipOutcome {
    Built { final_slip: Slip, safe_slip: Slip },
    NoQualifyingSlip,
}

impl SlipOutcome {
    pub fn status(&self) -> SlipStatus {
        match self {
            SlipOutcome::Built { .. } => SlipStatus::Built,
            SlipOutcome::NoQualifyingSlip => SlipStatus::NoQualifyingSlip,
        }
    }
}

/// Everything the presentation layer needs to explain one matchup build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipReport {
    pub team_a: String,
    pub team_b: String,
    pub primary_team: String,
    pub opponent_team: String,
    pub eligible_a: usize,
    pub eligible_b: usize,
    pub candidate_pool: usize,
    pub profile: BetProfile,
    pub outcome: SlipOutcome,
}

impl SlipReport {
    pub fn status(&self) -> SlipStatus {
        self.outcome.status()
    }
}

/// The side with more gate-passing players is primary. Ties go to team A.
pub fn infer_primary_team<'a>(
    team_a: &'a str,
    team_b: &'a str,
    eligible_a: usize,
    eligible_b: usize,
) -> (&'a str, &'a str) {
    if eligible_a >= eligible_b {
        (team_a, team_b)
    } else {
        (team_b, team_a)
    }
}

/// Greedy walk over a ranked pool. At most one leg may come from outside the primary
/// team and a `(player, stat)` pair is never taken twice. Returns `None` when fewer
/// than three legs can be assembled.
pub fn build_slip(ranked: &[CandidateLeg], primary_team: &str, n_legs: usize) -> Option<Slip> {
    let target = n_legs.clamp(MIN_SLIP_LEGS, MAX_SLIP_LEGS);
    let mut chosen: Vec<CandidateLeg> = Vec::with_capacity(target);
    let mut used_opponent = false;

    for leg in ranked {
        if chosen.len() >= target {
            break;
        }
        let from_opponent = leg.team_code != primary_team;
        if from_opponent && used_opponent {
            continue;
        }
        if chosen.iter().any(|c| c.same_prop(leg)) {
            continue;
        }
        used_opponent |= from_opponent;
        chosen.push(leg.clone());
    }

    Slip::new(chosen)
}

/// Drops the single leg with the highest `(variance rank, is PTS)`; the first such
/// leg wins ties. Slips already at the minimum size come back unchanged.
pub fn reduce_to_safe(slip: &Slip) -> Slip {
    if slip.len() <= MIN_SLIP_LEGS {
        return slip.clone();
    }

    let mut worst = 0;
    let mut worst_key = (0u8, false);
    for (idx, leg) in slip.iter().enumerate() {
        let key = (leg.variance_rank, leg.stat.is_points());
        if idx == 0 || key > worst_key {
            worst = idx;
            worst_key = key;
        }
    }

    let legs = slip
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != worst)
        .map(|(_, leg)| leg.clone())
        .collect();
    // Removing one leg from 4 or 5 always stays within bounds.
    Slip::new(legs).unwrap_or_else(|| slip.clone())
}

/// Runs the whole pipeline over already-collected windows for one matchup.
pub fn build_matchup_report(
    team_a: &str,
    team_b: &str,
    windows: &[PlayerWindow],
    cfg: &ModelConfig,
) -> SlipReport {
    let mut eligible_a = 0usize;
    let mut eligible_b = 0usize;
    let mut pool: Vec<CandidateLeg> = Vec::new();

    for window in windows {
        let is_a = window.team_code == team_a;
        if !is_a && window.team_code != team_b {
            debug!(player = %window.player_name, team = %window.team_code, "window outside matchup");
            continue;
        }
        if !window.is_complete() {
            debug!(
                player = %window.player_name,
                games = window.games().len(),
                "insufficient history"
            );
            continue;
        }
        if !is_eligible(window, &cfg.gate) {
            debug!(player = %window.player_name, minutes = ?window.minutes(), "minutes gate failed");
            continue;
        }
        if is_a {
            eligible_a += 1;
        } else {
            eligible_b += 1;
        }
        let legs = cap_player_legs(floor_legs(window, cfg.floor_policy), cfg.per_player_cap);
        pool.extend(legs);
    }

    let ranked = rank_candidates(pool, cfg.profile);
    let (primary, opponent) = infer_primary_team(team_a, team_b, eligible_a, eligible_b);
    info!(
        primary,
        opponent,
        eligible_a,
        eligible_b,
        candidates = ranked.len(),
        "ranked candidate pool"
    );

    let outcome = match build_slip(&ranked, primary, cfg.legs) {
        Some(final_slip) => {
            let safe_slip = reduce_to_safe(&final_slip);
            info!(legs = final_slip.len(), safe_legs = safe_slip.len(), "slip built");
            SlipOutcome::Built {
                final_slip,
                safe_slip,
            }
        }
        None => {
            info!("no qualifying slip");
            SlipOutcome::NoQualifyingSlip
        }
    };

    SlipReport {
        team_a: team_a.to_string(),
        team_b: team_b.to_string(),
        primary_team: primary.to_string(),
        opponent_team: opponent.to_string(),
        eligible_a,
        eligible_b,
        candidate_pool: ranked.len(),
        profile: cfg.profile,
        outcome,
    }
}
