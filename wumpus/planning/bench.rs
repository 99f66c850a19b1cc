use serde::{Deserialize, Serialize};
use tracing::info;
use wumpus_world::{Cave, Episode, EpisodeConfig, WorldError, WorldTelemetry};

use crate::{
    explorer::Explorer,
    runner::{EpisodeReport, EpisodeRunner},
};

/// Aggregate over a batch of randomized episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Episodes run.
    pub trials: usize,
    /// Episodes that ended with the gold carried out.
    pub successes: usize,
    /// `successes / trials`.
    pub success_rate: f64,
    /// Mean actions per episode.
    pub average_steps: f64,
    /// Mean hazards never entered per episode.
    pub average_hazards_avoided: f64,
    /// Every final knowledge base was free of contradicting units.
    pub consistent: bool,
}

impl BenchmarkSummary {
    /// Folds per-episode reports into a summary.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_reports(reports: &[EpisodeReport]) -> Self {
        let trials = reports.len();
        let successes = reports.iter().filter(|report| report.succeeded()).count();
        let mean = |total: usize| {
            if trials == 0 {
                0.0
            } else {
                total as f64 / trials as f64
            }
        };
        Self {
            trials,
            successes,
            success_rate: mean(successes),
            average_steps: mean(reports.iter().map(|report| report.steps).sum()),
            average_hazards_avoided: mean(
                reports.iter().map(|report| report.hazards_avoided).sum(),
            ),
            consistent: reports.iter().all(|report| report.consistent),
        }
    }
}

/// Runs `trials` stepwise episodes on randomized caves. Trial `i` uses seed
/// `base + i`, where `base` is the configured seed or zero.
pub fn run_benchmark(
    config: &EpisodeConfig,
    trials: usize,
    telemetry: Option<&WorldTelemetry>,
) -> Result<BenchmarkSummary, WorldError> {
    let base = config.seed.unwrap_or(0);
    let mut reports = Vec::with_capacity(trials);
    for trial in 0..trials {
        let trial_config = config.clone().with_seed(base.wrapping_add(trial as u64));
        let cave = Cave::seeded(&trial_config)?;
        let mut episode = Episode::new(trial_config.clone())?;
        if let Some(telemetry) = telemetry {
            episode = episode.with_telemetry(telemetry.clone());
        }
        let mut runner = EpisodeRunner::new(Explorer::from_config(&trial_config));
        let report = runner.run(&mut episode, &cave)?;
        info!(trial, outcome = ?report.outcome, steps = report.steps, "trial finished");
        reports.push(report);
    }
    Ok(BenchmarkSummary::from_reports(&reports))
}
