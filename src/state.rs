use std::collections::VecDeque;

use crate::config::{ModelConfig, PLAYERS_PER_TEAM_MAX, PLAYERS_PER_TEAM_MIN, SgpConfig};
use crate::model::{MAX_SLIP_LEGS, MIN_SLIP_LEGS};
use crate::report::{headline, pick_no_bet_message};
use crate::slip::{SlipOutcome, SlipReport};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Matchup,
    Legs,
    PlayersPerTeam,
    Profile,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Matchup => FormField::Legs,
            FormField::Legs => FormField::PlayersPerTeam,
            FormField::PlayersPerTeam => FormField::Profile,
            FormField::Profile => FormField::Matchup,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Matchup => FormField::Profile,
            FormField::Legs => FormField::Matchup,
            FormField::PlayersPerTeam => FormField::Legs,
            FormField::Profile => FormField::PlayersPerTeam,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub matchup: String,
    pub focus: FormField,
    pub model: ModelConfig,
    pub players_per_team: usize,
    pub season: i32,
    pub source_label: String,
    pub running: bool,
    pub progress: u16,
    pub status: String,
    pub report: Option<SlipReport>,
    pub no_bet_message: Option<String>,
    pub fetch_failures: Vec<String>,
    pub error: Option<String>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(cfg: &SgpConfig, source_label: impl Into<String>) -> Self {
        Self {
            matchup: "LAL vs DAL".to_string(),
            focus: FormField::Matchup,
            model: cfg.model,
            players_per_team: cfg
                .players_per_team
                .clamp(PLAYERS_PER_TEAM_MIN, PLAYERS_PER_TEAM_MAX),
            season: cfg.season,
            source_label: source_label.into(),
            running: false,
            progress: 0,
            status: String::new(),
            report: None,
            no_bet_message: None,
            fetch_failures: Vec::new(),
            error: None,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Nudges the focused numeric/choice field. The matchup text is untouched.
    pub fn adjust_focused(&mut self, step: i32) {
        match self.focus {
            FormField::Matchup => {}
            FormField::Legs => {
                self.model.legs = step_clamped(self.model.legs, step, MIN_SLIP_LEGS, MAX_SLIP_LEGS);
            }
            FormField::PlayersPerTeam => {
                self.players_per_team = step_clamped(
                    self.players_per_team,
                    step,
                    PLAYERS_PER_TEAM_MIN,
                    PLAYERS_PER_TEAM_MAX,
                );
            }
            FormField::Profile => {
                let mut profile = self.model.profile;
                let turns = if step >= 0 { 1 } else { 2 };
                for _ in 0..turns {
                    profile = profile.next();
                }
                self.model.profile = profile;
            }
        }
    }

    pub fn input_char(&mut self, c: char) {
        const MAX_INPUT: usize = 24;
        if self.focus == FormField::Matchup && self.matchup.chars().count() < MAX_INPUT {
            self.matchup.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.focus == FormField::Matchup {
            self.matchup.pop();
        }
    }

    /// Returns the request to send, or `None` while a build is already running.
    pub fn begin_build(&mut self) -> Option<BuildRequest> {
        if self.running {
            return None;
        }
        self.running = true;
        self.progress = 0;
        self.status = "Loading teams".to_string();
        self.report = None;
        self.no_bet_message = None;
        self.fetch_failures.clear();
        self.error = None;
        Some(BuildRequest {
            matchup: self.matchup.trim().to_string(),
            model: self.model,
            players_per_team: self.players_per_team,
        })
    }
}

fn step_clamped(value: usize, step: i32, min: usize, max: usize) -> usize {
    let next = value as i64 + step as i64;
    next.clamp(min as i64, max as i64) as usize
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub matchup: String,
    pub model: ModelConfig,
    pub players_per_team: usize,
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Build(BuildRequest),
}

#[derive(Debug, Clone)]
pub enum Delta {
    Progress { percent: u16, message: String },
    SlipReady {
        report: SlipReport,
        failures: Vec<String>,
    },
    BuildFailed(String),
    Log(String),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Progress { percent, message } => {
            state.progress = state.progress.max(percent.min(100));
            state.status = message;
        }
        Delta::SlipReady { report, failures } => {
            state.running = false;
            state.progress = 100;
            state.status.clear();
            if report.outcome == SlipOutcome::NoQualifyingSlip {
                let mut rng = rand::thread_rng();
                state.no_bet_message = Some(pick_no_bet_message(&mut rng).to_string());
            }
            if !failures.is_empty() {
                state.push_log(format!(
                    "[WARN] {} player fetches failed; they were left out",
                    failures.len()
                ));
            }
            state.push_log(format!("[INFO] {}", headline(&report)));
            state.fetch_failures = failures;
            state.report = Some(report);
        }
        Delta::BuildFailed(msg) => {
            state.running = false;
            state.progress = 0;
            state.status.clear();
            state.push_log(format!("[WARN] Build failed: {msg}"));
            state.error = Some(msg);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
