use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use anyhow::Result;
use tracing::{info, warn};

use crate::api_sports::ApiSports;
use crate::collect::{BuildStage, build_fetch_pool, run_matchup_build};
use crate::config::SgpConfig;
use crate::source::{ApiSportsSource, FixtureSource, StatsSource};
use crate::state::{BuildRequest, Delta, ProviderCommand};

/// Which upstream the worker should talk to.
#[derive(Debug, Clone)]
pub enum SourceKind {
    Live,
    Fixture(PathBuf),
}

impl SourceKind {
    /// `SGP_FIXTURE` switches the app to an offline matchup file.
    pub fn from_env() -> Self {
        match std::env::var("SGP_FIXTURE") {
            Ok(path) if !path.trim().is_empty() => SourceKind::Fixture(PathBuf::from(path.trim())),
            _ => SourceKind::Live,
        }
    }

    pub fn label(&self, season: i32) -> String {
        match self {
            SourceKind::Live => format!("API-NBA {season}"),
            SourceKind::Fixture(path) => format!("fixture {}", path.display()),
        }
    }
}

pub fn open_source(kind: &SourceKind, cfg: &SgpConfig) -> Result<Box<dyn StatsSource>> {
    match kind {
        SourceKind::Live => {
            let api = ApiSports::new(cfg.api.clone())?;
            Ok(Box::new(ApiSportsSource::new(api, cfg.season)?))
        }
        SourceKind::Fixture(path) => Ok(Box::new(FixtureSource::from_path(path)?)),
    }
}

pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    kind: SourceKind,
    cfg: SgpConfig,
) {
    thread::spawn(move || {
        let pool = build_fetch_pool(cfg.fetch_parallelism);
        let mut source: Option<Box<dyn StatsSource>> = None;

        for cmd in cmd_rx {
            match cmd {
                ProviderCommand::Build(req) => {
                    if source.is_none() {
                        let _ = tx.send(Delta::Progress {
                            percent: 10,
                            message: "Loading teams".to_string(),
                        });
                        match open_source(&kind, &cfg) {
                            Ok(opened) => {
                                info!(source = %kind.label(cfg.season), "stats source ready");
                                let _ = tx.send(Delta::Log(format!(
                                    "[INFO] Source ready: {}",
                                    kind.label(cfg.season)
                                )));
                                source = Some(opened);
                            }
                            Err(err) => {
                                warn!("source unavailable: {err:#}");
                                let _ = tx.send(Delta::BuildFailed(format!("{err:#}")));
                                continue;
                            }
                        }
                    }
                    if let Some(src) = source.as_deref() {
                        run_request(src, &req, pool.as_ref(), &tx);
                    }
                }
            }
        }
    });
}

fn run_request(
    source: &dyn StatsSource,
    req: &BuildRequest,
    pool: Option<&rayon::ThreadPool>,
    tx: &Sender<Delta>,
) {
    info!(matchup = %req.matchup, legs = req.model.legs, "build requested");
    let progress_tx = tx.clone();
    let progress = move |stage: BuildStage| {
        let _ = progress_tx.send(Delta::Progress {
            percent: stage.percent(),
            message: stage.message(),
        });
    };

    match run_matchup_build(
        source,
        &req.matchup,
        &req.model,
        req.players_per_team,
        pool,
        &progress,
    ) {
        Ok(result) => {
            let _ = tx.send(Delta::SlipReady {
                report: result.report,
                failures: result.failures,
            });
        }
        Err(err) => {
            warn!("build failed: {err:#}");
            let _ = tx.send(Delta::BuildFailed(format!("{err:#}")));
        }
    }
}
