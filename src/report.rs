use rand::Rng;
use rand::seq::SliceRandom;

use crate::model::Slip;
use crate::ranking::BetProfile;
use crate::slip::{SlipOutcome, SlipReport};

pub const NO_BET_MESSAGES: &[&str] = &[
    "No bets here, move to the next matchup",
    "Cold game, zero edge",
    "Nothing clean here, pass it",
    "Variance too high, bankroll protection engaged",
    "This matchup ain't it",
];

pub fn pick_no_bet_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    NO_BET_MESSAGES
        .choose(rng)
        .copied()
        .unwrap_or("No qualifying slip")
}

pub fn slip_lines(slip: &Slip) -> Vec<String> {
    slip.iter().map(|leg| leg.to_string()).collect()
}

pub fn headline(report: &SlipReport) -> String {
    match &report.outcome {
        SlipOutcome::Built { final_slip, .. } => format!(
            "Built {} legs | Main side: {} | Max 1 opp from {}",
            final_slip.len(),
            report.primary_team,
            report.opponent_team
        ),
        SlipOutcome::NoQualifyingSlip => format!(
            "No qualifying slip | {} eligible {} / {} eligible {} | {} candidates",
            report.team_a, report.eligible_a, report.team_b, report.eligible_b, report.candidate_pool
        ),
    }
}

/// Plain-text rendering used by the one-shot binaries.
pub fn report_lines(report: &SlipReport, no_bet: &str) -> Vec<String> {
    let mut out = vec![headline(report)];
    match &report.outcome {
        SlipOutcome::Built {
            final_slip,
            safe_slip,
        } => {
            out.push(String::new());
            out.push("Final Slip".to_string());
            out.extend(slip_lines(final_slip).into_iter().map(|l| format!("  {l}")));
            out.push(String::new());
            out.push("SAFE Slip".to_string());
            out.extend(slip_lines(safe_slip).into_iter().map(|l| format!("  {l}")));
            if report.profile == BetProfile::HigherRisk {
                out.push(String::new());
                out.push(
                    "Higher-risk profile: candidate ordering is more aggressive (still within model constraints)."
                        .to_string(),
                );
            }
        }
        SlipOutcome::NoQualifyingSlip => out.push(no_bet.to_string()),
    }
    out
}
