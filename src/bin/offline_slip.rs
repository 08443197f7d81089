use std::path::PathBuf;

use anyhow::Result;

use nba_sgp::collect::{BuildStage, run_matchup_build};
use nba_sgp::config::{ModelConfig, load_dotenv, players_per_team_from_env};
use nba_sgp::logging::init_stderr_logging;
use nba_sgp::report::{NO_BET_MESSAGES, report_lines};
use nba_sgp::source::FixtureSource;

// Runs the selection pipeline over a recorded matchup file. No network.
fn main() -> Result<()> {
    load_dotenv();
    init_stderr_logging();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/matchup_lal_dal.json"));
    let matchup = args.collect::<Vec<_>>().join(" ");
    let matchup = if matchup.trim().is_empty() {
        "LAL vs DAL".to_string()
    } else {
        matchup
    };

    let source = FixtureSource::from_path(&path)?;
    let model = ModelConfig::from_env();
    let players_per_team = players_per_team_from_env();
    let quiet = |_: BuildStage| {};

    let result = run_matchup_build(&source, &matchup, &model, players_per_team, None, &quiet)?;
    let report = &result.report;
    println!(
        "{} vs {} | eligible {} / {} | pool {} | profile {}",
        report.team_a,
        report.team_b,
        report.eligible_a,
        report.eligible_b,
        report.candidate_pool,
        report.profile.label()
    );
    for line in report_lines(report, NO_BET_MESSAGES[0]) {
        println!("{line}");
    }
    Ok(())
}
