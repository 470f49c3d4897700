//! Sample-size sweep
//!
//! Runs the harness once per sample size and regroups the aggregated results
//! into one ordered series per estimator.

use std::collections::BTreeMap;

use covbench_estimators::EstimatorKind;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::harness::{AggregatedResult, SimulationConfig, SimulationError, run_simulation};
use crate::process::ProcessConfig;

/// Sample sizes swept by default
pub const DEFAULT_SAMPLE_SIZES: [usize; 6] = [5, 10, 20, 50, 100, 120];

/// One estimator's metrics at one sample size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    /// Sample size n
    pub n: usize,
    /// Mean squared Frobenius error
    pub mse: f64,
    /// Mean shrinkage intensity, if reported
    pub shrinkage: Option<f64>,
}

/// Result of sweeping one process over several sample sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Process the ground truth was drawn from
    pub process: ProcessConfig,
    /// Number of variables p
    pub dimension: usize,
    /// Trials per sample size
    pub trial_count: usize,
    /// Sample sizes in sweep order
    pub sample_sizes: Vec<usize>,
    /// Per-estimator series, one point per sample size in sweep order
    pub series: BTreeMap<EstimatorKind, Vec<SweepPoint>>,
}

impl SweepResult {
    /// Series of one estimator
    pub fn series(&self, kind: EstimatorKind) -> Option<&[SweepPoint]> {
        self.series.get(&kind).map(Vec::as_slice)
    }

    /// Point of one estimator at sample size `n`
    pub fn point(&self, kind: EstimatorKind, n: usize) -> Option<&SweepPoint> {
        self.series(kind)?.iter().find(|point| point.n == n)
    }

    fn push(&mut self, n: usize, result: &AggregatedResult) {
        self.sample_sizes.push(n);
        for (kind, metrics) in &result.metrics {
            self.series.entry(*kind).or_default().push(SweepPoint {
                n,
                mse: metrics.mse,
                shrinkage: metrics.shrinkage,
            });
        }
    }
}

/// Run the harness at each sample size
///
/// # Errors
/// Returns [`SimulationError::InvalidConfig`] for an empty size list and
/// propagates the first failing run.
pub fn sweep(
    process: &ProcessConfig,
    config: &SimulationConfig,
    sample_sizes: &[usize],
) -> Result<SweepResult, SimulationError> {
    sweep_with_callback(process, config, sample_sizes, |_, _| {})
}

/// Same as [`sweep`], calling `on_point` after each sample size completes
pub fn sweep_with_callback<F>(
    process: &ProcessConfig,
    config: &SimulationConfig,
    sample_sizes: &[usize],
    mut on_point: F,
) -> Result<SweepResult, SimulationError>
where
    F: FnMut(usize, &AggregatedResult),
{
    if sample_sizes.is_empty() {
        return Err(SimulationError::InvalidConfig(
            "sample size list is empty".to_string(),
        ));
    }

    let mut result = SweepResult {
        process: *process,
        dimension: config.dimension,
        trial_count: config.trial_count,
        sample_sizes: Vec::with_capacity(sample_sizes.len()),
        series: BTreeMap::new(),
    };

    for &n in sample_sizes {
        let aggregated = run_simulation(process, config, n)?;
        if let Some((best, metrics)) = aggregated.best() {
            info!(%process, n, best = %best, mse = metrics.mse, "Sweep point complete");
        }
        result.push(n, &aggregated);
        on_point(n, &aggregated);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            dimension: 5,
            trial_count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_sizes_rejected() {
        let err = sweep(&ProcessConfig::ar1(0.5), &small_config(), &[]).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfig(_)));
    }

    #[test]
    fn test_series_follow_sweep_order() {
        let sizes = [20, 5, 10];
        let result = sweep(&ProcessConfig::fbm(0.75), &small_config(), &sizes).unwrap();

        assert_eq!(result.sample_sizes, sizes);
        assert_eq!(result.series.len(), EstimatorKind::ALL.len());
        for points in result.series.values() {
            let ns: Vec<usize> = points.iter().map(|point| point.n).collect();
            assert_eq!(ns, sizes);
        }
        assert!(result.point(EstimatorKind::Oracle, 10).is_some());
    }

    #[test]
    fn test_callback_sees_every_size() {
        let mut seen = Vec::new();
        sweep_with_callback(
            &ProcessConfig::ar1(0.2),
            &small_config(),
            &[4, 8],
            |n, aggregated| {
                assert_eq!(aggregated.trial_count, 3);
                seen.push(n);
            },
        )
        .unwrap();
        assert_eq!(seen, vec![4, 8]);
    }

    #[test]
    fn test_failing_size_aborts_sweep() {
        let err = sweep(&ProcessConfig::ar1(0.5), &small_config(), &[5, 1]).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
