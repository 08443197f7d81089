use std::path::PathBuf;
use std::sync::Mutex;

use nba_sgp::api_sports::RosterPlayer;
use nba_sgp::collect::{BuildStage, build_fetch_pool, collect_matchup, run_matchup_build};
use nba_sgp::config::ModelConfig;
use nba_sgp::error::{MatchupError, PlayerFetchError};
use nba_sgp::floor::FloorPolicy;
use nba_sgp::model::{CandidateLeg, StatCategory};
use nba_sgp::ranking::BetProfile;
use nba_sgp::report::{NO_BET_MESSAGES, report_lines};
use nba_sgp::slip::{SlipOutcome, SlipStatus};
use nba_sgp::source::{FixtureSource, StatsSource};

fn fixture_source() -> FixtureSource {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("matchup_lal_dal.json");
    FixtureSource::from_path(&path).expect("fixture should load")
}

fn no_progress(_: BuildStage) {}

fn props(legs: &[CandidateLeg]) -> Vec<(String, StatCategory, u32)> {
    legs.iter()
        .map(|l| (l.player_name.clone(), l.stat, l.line))
        .collect()
}

fn prop(name: &str, stat: StatCategory, line: u32) -> (String, StatCategory, u32) {
    (name.to_string(), stat, line)
}

#[test]
fn lal_dal_safe_four_legs() {
    let source = fixture_source();
    let model = ModelConfig::default();
    let result = run_matchup_build(&source, "LAL vs DAL", &model, 18, None, &no_progress)
        .expect("build should succeed");
    let report = result.report;

    assert!(result.failures.is_empty());
    assert_eq!(report.eligible_a, 4);
    assert_eq!(report.eligible_b, 1);
    assert_eq!(report.primary_team, "LAL");
    assert_eq!(report.opponent_team, "DAL");
    assert_eq!(report.candidate_pool, 15);
    assert_eq!(report.status(), SlipStatus::Built);

    let SlipOutcome::Built {
        final_slip,
        safe_slip,
    } = &report.outcome
    else {
        panic!("expected a built slip");
    };
    assert_eq!(
        props(final_slip.legs()),
        vec![
            prop("Anthony Davis", StatCategory::Reb, 8),
            prop("Austin Reaves", StatCategory::Reb, 2),
            prop("LeBron James", StatCategory::Reb, 5),
            prop("Luka Doncic", StatCategory::Reb, 6),
        ]
    );
    assert_eq!(
        props(safe_slip.legs()),
        vec![
            prop("Austin Reaves", StatCategory::Reb, 2),
            prop("LeBron James", StatCategory::Reb, 5),
            prop("Luka Doncic", StatCategory::Reb, 6),
        ]
    );
    assert_eq!(final_slip.iter().filter(|l| l.team_code == "DAL").count(), 1);
}

#[test]
fn lal_dal_five_legs_reaches_the_next_reb_line() {
    let source = fixture_source();
    let model = ModelConfig {
        legs: 5,
        ..ModelConfig::default()
    };
    let result = run_matchup_build(&source, "lal @ dal", &model, 18, None, &no_progress)
        .expect("build should succeed");
    let SlipOutcome::Built { final_slip, safe_slip } = &result.report.outcome else {
        panic!("expected a built slip");
    };
    assert_eq!(final_slip.len(), 5);
    assert_eq!(
        final_slip.legs()[4].player_name,
        "Rui Hachimura"
    );
    assert_eq!(final_slip.legs()[4].line, 1);
    assert_eq!(safe_slip.len(), 4);
}

#[test]
fn higher_risk_profile_prefers_pra() {
    let source = fixture_source();
    let model = ModelConfig {
        profile: BetProfile::HigherRisk,
        ..ModelConfig::default()
    };
    let result = run_matchup_build(&source, "LAL vs DAL", &model, 18, None, &no_progress)
        .expect("build should succeed");
    let SlipOutcome::Built { final_slip, .. } = &result.report.outcome else {
        panic!("expected a built slip");
    };
    assert_eq!(
        props(final_slip.legs()),
        vec![
            prop("Anthony Davis", StatCategory::Pra, 34),
            prop("Austin Reaves", StatCategory::Pra, 17),
            prop("LeBron James", StatCategory::Pra, 30),
            prop("Luka Doncic", StatCategory::Pra, 40),
        ]
    );

    let lines = report_lines(&result.report, NO_BET_MESSAGES[0]);
    assert!(lines.iter().any(|l| l.starts_with("Higher-risk profile")));
}

#[test]
fn clamp_policy_keeps_zero_floor_assists() {
    let source = fixture_source();
    let skip = run_matchup_build(&source, "LAL vs DAL", &ModelConfig::default(), 18, None, &no_progress)
        .expect("build should succeed");
    let clamp_model = ModelConfig {
        floor_policy: FloorPolicy::ClampToOne,
        ..ModelConfig::default()
    };
    let clamped = run_matchup_build(&source, "LAL vs DAL", &clamp_model, 18, None, &no_progress)
        .expect("build should succeed");
    // Rui's AST floor of 0 becomes a 1; his PTS leg then falls outside the cap.
    assert_eq!(clamped.report.candidate_pool, skip.report.candidate_pool);
    assert_eq!(clamped.report.status(), SlipStatus::Built);
}

#[test]
fn single_leg_cap_shrinks_the_pool() {
    let source = fixture_source();
    let model = ModelConfig {
        per_player_cap: 1,
        ..ModelConfig::default()
    };
    let result = run_matchup_build(&source, "LAL vs DAL", &model, 18, None, &no_progress)
        .expect("build should succeed");
    assert_eq!(result.report.candidate_pool, 5);
    assert_eq!(result.report.status(), SlipStatus::Built);
}

#[test]
fn roster_sampling_limits_players() {
    let source = fixture_source();
    let team_a = source.resolve_team("lal").expect("LAL in fixture");
    let team_b = source.resolve_team("DAL").expect("DAL in fixture");
    let collected = collect_matchup(&source, team_a, team_b, 2, None, &no_progress)
        .expect("collect should succeed");
    assert_eq!(collected.windows.len(), 4);
    assert_eq!(collected.windows[0].player_name, "Anthony Davis");
    assert_eq!(collected.windows[2].team_code, "DAL");
}

#[test]
fn pooled_collection_keeps_roster_order_and_reports_progress() {
    let source = fixture_source();
    let pool = build_fetch_pool(3).expect("pool should build");
    let stages = Mutex::new(Vec::new());
    let record = |stage: BuildStage| {
        stages.lock().expect("stage lock").push(stage);
    };
    let result = run_matchup_build(
        &source,
        "LAL vs DAL",
        &ModelConfig::default(),
        18,
        Some(&pool),
        &record,
    )
    .expect("build should succeed");
    assert_eq!(result.report.eligible_a, 4);

    let stages = stages.into_inner().expect("stage lock");
    assert!(matches!(stages.first(), Some(BuildStage::LoadingRoster { .. })));
    assert_eq!(stages.last(), Some(&BuildStage::BuildingSlip));
    let player_stages = stages
        .iter()
        .filter(|s| matches!(s, BuildStage::Player { .. }))
        .count();
    assert_eq!(player_stages, 8);
    assert!(stages.iter().all(|s| s.percent() <= 92));
}

#[test]
fn unknown_team_is_reported() {
    let source = fixture_source();
    let err = run_matchup_build(&source, "LAL vs XYZ", &ModelConfig::default(), 18, None, &no_progress)
        .expect_err("unknown team must fail");
    assert_eq!(
        err.downcast_ref::<MatchupError>(),
        Some(&MatchupError::UnknownTeam("XYZ".to_string()))
    );
}

#[test]
fn malformed_matchup_is_reported() {
    let source = fixture_source();
    let err = run_matchup_build(&source, "Lakers", &ModelConfig::default(), 18, None, &no_progress)
        .expect_err("malformed input must fail");
    assert!(matches!(
        err.downcast_ref::<MatchupError>(),
        Some(MatchupError::Malformed(_))
    ));
}

const THIN_MATCHUP: &str = r#"{
  "teams": [
    {"id": 1, "code": "AAA", "players": [
      {"id": 10, "name": "Solo Guard", "games": [
        {"minutes": 34, "points": 0, "rebounds": 0, "assists": 6},
        {"minutes": 35, "points": 2, "rebounds": 1, "assists": 7},
        {"minutes": 33, "points": 4, "rebounds": 0, "assists": 5},
        {"minutes": 36, "points": 0, "rebounds": 2, "assists": 8},
        {"minutes": 32, "points": 1, "rebounds": 0, "assists": 6}
      ]},
      {"id": 11, "name": "Bench Big", "games": [
        {"minutes": 12, "points": 8, "rebounds": 6, "assists": 1},
        {"minutes": 14, "points": 9, "rebounds": 7, "assists": 1},
        {"minutes": 10, "points": 6, "rebounds": 5, "assists": 0},
        {"minutes": 11, "points": 7, "rebounds": 4, "assists": 2},
        {"minutes": 13, "points": 8, "rebounds": 6, "assists": 1}
      ]}
    ]},
    {"id": 2, "code": "BBB", "players": []}
  ]
}"#;

#[test]
fn thin_pool_yields_no_qualifying_slip() {
    let source = FixtureSource::from_json(THIN_MATCHUP).expect("inline fixture");
    let result = run_matchup_build(&source, "AAA vs BBB", &ModelConfig::default(), 18, None, &no_progress)
        .expect("build should succeed");
    let report = result.report;
    // Only AST (floor 4) and PRA (floor 5) survive for the one eligible player.
    assert_eq!(report.eligible_a, 1);
    assert_eq!(report.eligible_b, 0);
    assert_eq!(report.candidate_pool, 2);
    assert_eq!(report.outcome, SlipOutcome::NoQualifyingSlip);

    let lines = report_lines(&report, NO_BET_MESSAGES[1]);
    assert!(lines[0].starts_with("No qualifying slip"));
    assert_eq!(lines.last().map(String::as_str), Some(NO_BET_MESSAGES[1]));
}

struct FailingSource {
    inner: FixtureSource,
}

impl StatsSource for FailingSource {
    fn resolve_team(&self, code: &str) -> anyhow::Result<nba_sgp::api_sports::TeamRef> {
        self.inner.resolve_team(code)
    }

    fn roster(&self, team: &nba_sgp::api_sports::TeamRef) -> anyhow::Result<Vec<RosterPlayer>> {
        self.inner.roster(team)
    }

    fn recent_games(
        &self,
        team: &nba_sgp::api_sports::TeamRef,
        player: &RosterPlayer,
    ) -> anyhow::Result<Vec<nba_sgp::model::GameLog>> {
        if player.name == "Luka Doncic" {
            anyhow::bail!("upstream timed out");
        }
        self.inner.recent_games(team, player)
    }
}

#[test]
fn failed_player_fetches_are_left_out() {
    let source = FailingSource {
        inner: fixture_source(),
    };
    let result = run_matchup_build(&source, "LAL vs DAL", &ModelConfig::default(), 18, None, &no_progress)
        .expect("build should succeed");
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].contains("Luka Doncic"));
    assert_eq!(result.report.eligible_b, 0);
    let SlipOutcome::Built { final_slip, .. } = &result.report.outcome else {
        panic!("expected a built slip");
    };
    assert!(final_slip.iter().all(|l| l.team_code == "LAL"));
}

struct OutageSource {
    inner: FixtureSource,
}

impl StatsSource for OutageSource {
    fn resolve_team(&self, code: &str) -> anyhow::Result<nba_sgp::api_sports::TeamRef> {
        self.inner.resolve_team(code)
    }

    fn roster(&self, team: &nba_sgp::api_sports::TeamRef) -> anyhow::Result<Vec<RosterPlayer>> {
        self.inner.roster(team)
    }

    fn recent_games(
        &self,
        _team: &nba_sgp::api_sports::TeamRef,
        _player: &RosterPlayer,
    ) -> anyhow::Result<Vec<nba_sgp::model::GameLog>> {
        anyhow::bail!("api-sports error: request limit reached")
    }
}

#[test]
fn total_fetch_outage_fails_the_build_instead_of_no_bet() {
    let source = OutageSource {
        inner: fixture_source(),
    };
    let err = run_matchup_build(&source, "LAL vs DAL", &ModelConfig::default(), 18, None, &no_progress)
        .expect_err("an outage must not look like a cold matchup");
    let fetch_err = err
        .downcast_ref::<PlayerFetchError>()
        .expect("player fetch error");
    assert_eq!(fetch_err.failed, 8);
    assert_eq!(fetch_err.total, 8);
    assert!(fetch_err.first.contains("request limit"));
}
