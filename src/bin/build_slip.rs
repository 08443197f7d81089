use anyhow::{Context, Result};

use nba_sgp::collect::{BuildStage, build_fetch_pool, run_matchup_build};
use nba_sgp::config::{SgpConfig, load_dotenv};
use nba_sgp::logging::init_stderr_logging;
use nba_sgp::provider::{SourceKind, open_source};
use nba_sgp::report::{pick_no_bet_message, report_lines};

fn main() -> Result<()> {
    load_dotenv();
    init_stderr_logging();

    let matchup = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let matchup = if matchup.trim().is_empty() {
        "LAL vs DAL".to_string()
    } else {
        matchup
    };

    let cfg = SgpConfig::from_env();
    let kind = SourceKind::from_env();
    eprintln!("Source: {} | matchup: {matchup}", kind.label(cfg.season));

    let source = open_source(&kind, &cfg).context("open stats source")?;
    let pool = build_fetch_pool(cfg.fetch_parallelism);
    let progress = |stage: BuildStage| {
        if !matches!(stage, BuildStage::Player { .. }) {
            eprintln!("[{:>3}%] {}", stage.percent(), stage.message());
        }
    };

    let result = run_matchup_build(
        source.as_ref(),
        &matchup,
        &cfg.model,
        cfg.players_per_team,
        pool.as_ref(),
        &progress,
    )?;

    for failure in &result.failures {
        eprintln!("skipped {failure}");
    }
    let no_bet = pick_no_bet_message(&mut rand::thread_rng());
    for line in report_lines(&result.report, no_bet) {
        println!("{line}");
    }
    Ok(())
}
