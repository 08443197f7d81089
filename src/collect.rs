use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::api_sports::{RosterPlayer, TeamRef};
use crate::config::ModelConfig;
use crate::error::PlayerFetchError;
use crate::matchup::parse_matchup;
use crate::model::PlayerWindow;
use crate::slip::{SlipReport, build_matchup_report};
use crate::source::StatsSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStage {
    LoadingRoster { team: String },
    Player { team: String, player: String, done: usize, total: usize },
    BuildingSlip,
}

impl BuildStage {
    /// Rough completion percentage for a progress bar.
    pub fn percent(&self) -> u16 {
        match self {
            BuildStage::LoadingRoster { .. } => 15,
            BuildStage::Player { done, total, .. } => {
                let frac = *done as f64 / (*total).max(1) as f64;
                (25.0 + frac * 60.0).min(85.0) as u16
            }
            BuildStage::BuildingSlip => 92,
        }
    }

    pub fn message(&self) -> String {
        match self {
            BuildStage::LoadingRoster { team } => format!("Loading roster: {team}"),
            BuildStage::Player { team, player, .. } => format!("Crunching: {team} | {player}"),
            BuildStage::BuildingSlip => "Building final slip under constraints".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectedMatchup {
    pub team_a: TeamRef,
    pub team_b: TeamRef,
    pub windows: Vec<PlayerWindow>,
    /// Players whose games could not be fetched.
    pub failures: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub report: SlipReport,
    pub failures: Vec<String>,
}

/// Fetches the first `players_per_team` roster entries of both teams and assembles
/// their windows. Player fetches run on `pool` when given; window order follows
/// roster order regardless. Isolated failures are reported in `failures`; when more
/// than half of the fetches fail the whole build fails with [`PlayerFetchError`].
pub fn collect_matchup<S>(
    source: &S,
    team_a: TeamRef,
    team_b: TeamRef,
    players_per_team: usize,
    pool: Option<&rayon::ThreadPool>,
    progress: &(dyn Fn(BuildStage) + Sync),
) -> Result<CollectedMatchup>
where
    S: StatsSource + ?Sized,
{
    let mut rosters: Vec<(TeamRef, Vec<RosterPlayer>)> = Vec::with_capacity(2);
    for team in [&team_a, &team_b] {
        progress(BuildStage::LoadingRoster {
            team: team.code.clone(),
        });
        let mut roster = source
            .roster(team)
            .with_context(|| format!("loading roster for {}", team.code))?;
        roster.truncate(players_per_team);
        rosters.push((team.clone(), roster));
    }

    let jobs: Vec<(&TeamRef, &RosterPlayer)> = rosters
        .iter()
        .flat_map(|(team, roster)| roster.iter().map(move |p| (team, p)))
        .collect();
    let total = jobs.len();
    let done = AtomicUsize::new(0);

    let fetch_all = || {
        jobs.par_iter()
            .map(|(team, player)| {
                let result = source.recent_games(team, player);
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                progress(BuildStage::Player {
                    team: team.code.clone(),
                    player: player.name.clone(),
                    done: n,
                    total,
                });
                match result {
                    Ok(games) => Ok(PlayerWindow::new(player.name.clone(), team.code.clone(), games)),
                    Err(err) => {
                        warn!(player = %player.name, team = %team.code, "game log fetch failed: {err:#}");
                        Err(format!("{} ({}): {err:#}", player.name, team.code))
                    }
                }
            })
            .collect::<Vec<_>>()
    };
    let results = match pool {
        Some(pool) => pool.install(fetch_all),
        None => fetch_all(),
    };

    let mut windows = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(window) => windows.push(window),
            Err(msg) => failures.push(msg),
        }
    }
    if failures.len() * 2 > total {
        return Err(PlayerFetchError {
            failed: failures.len(),
            total,
            first: failures.first().cloned().unwrap_or_default(),
        }
        .into());
    }
    info!(
        team_a = %team_a.code,
        team_b = %team_b.code,
        windows = windows.len(),
        failures = failures.len(),
        "collected player windows"
    );

    Ok(CollectedMatchup {
        team_a,
        team_b,
        windows,
        failures,
    })
}

/// Parses the matchup text, collects both sides and runs the selection pipeline.
pub fn run_matchup_build<S>(
    source: &S,
    matchup: &str,
    model: &ModelConfig,
    players_per_team: usize,
    pool: Option<&rayon::ThreadPool>,
    progress: &(dyn Fn(BuildStage) + Sync),
) -> Result<BuildResult>
where
    S: StatsSource + ?Sized,
{
    let (code_a, code_b) = parse_matchup(matchup)?;
    let team_a = source.resolve_team(&code_a)?;
    let team_b = source.resolve_team(&code_b)?;

    let collected = collect_matchup(source, team_a, team_b, players_per_team, pool, progress)?;
    progress(BuildStage::BuildingSlip);
    let report = build_matchup_report(
        &collected.team_a.code,
        &collected.team_b.code,
        &collected.windows,
        model,
    );
    Ok(BuildResult {
        report,
        failures: collected.failures,
    })
}

pub fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}
