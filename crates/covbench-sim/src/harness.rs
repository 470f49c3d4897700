//! Monte Carlo harness
//!
//! A trial generates a ground-truth Σ, draws an n x p zero-mean normal sample
//! from it, fits every estimator and scores the squared Frobenius error
//! ‖Σ̂ - Σ‖²_F. A run averages the trial metrics with a plain arithmetic mean.
//!
//! Every trial owns a ChaCha8 stream derived from `(seed, n, trial)`, so the
//! result of a run does not depend on how trials are scheduled.

use std::collections::BTreeMap;

use covbench_estimators::covariance::squared_frobenius_distance;
use covbench_estimators::{CovarianceError, CovarianceEstimator, EstimatorKind, ShrinkageConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::process::{ProcessConfig, generate_covariance};
use crate::sampler::MultivariateNormal;

/// Multiplier used to spread sample sizes across seeds
const SAMPLE_SIZE_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Errors from running a simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Estimation, generation or sampling failed
    #[error("Covariance error: {0}")]
    Covariance(#[from] CovarianceError),

    /// The run configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SimulationError {
    /// Whether the error was caused by caller input rather than numerics
    pub const fn is_invalid_input(&self) -> bool {
        match self {
            Self::Covariance(err) => err.is_invalid_input(),
            Self::InvalidConfig(_) => true,
        }
    }
}

/// Configuration for a Monte Carlo run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of variables p (default: 100)
    pub dimension: usize,

    /// Number of independent trials (default: 100)
    pub trial_count: usize,

    /// Base seed for the per-trial random streams (default: 2024)
    pub seed: u64,

    /// Run trials on the rayon thread pool (default: true)
    pub parallel: bool,

    /// Intensities for the fixed-shrinkage estimators
    pub shrinkage: ShrinkageConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dimension: 100,
            trial_count: 100,
            seed: 2024,
            parallel: true,
            shrinkage: ShrinkageConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Check the configuration before any trial runs
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.dimension < 1 {
            return Err(CovarianceError::EmptyDimension.into());
        }
        if self.trial_count == 0 {
            return Err(SimulationError::InvalidConfig(
                "trial_count must be at least 1".to_string(),
            ));
        }
        self.shrinkage.validate()?;
        Ok(())
    }
}

/// Error and shrinkage of one estimator in one trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorMetrics {
    /// ‖Σ̂ - Σ‖²_F
    pub squared_error: f64,
    /// Reported shrinkage intensity, if any
    pub shrinkage: Option<f64>,
}

/// Metrics of every estimator in one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialMetrics {
    /// Trial index within the run
    pub trial: usize,
    /// Per-estimator metrics
    pub estimators: BTreeMap<EstimatorKind, EstimatorMetrics>,
}

/// Trial-averaged metrics of one estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    /// Mean squared Frobenius error
    pub mse: f64,
    /// Mean shrinkage over the trials that reported one
    pub shrinkage: Option<f64>,
}

/// Result of a Monte Carlo run at one sample size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Number of trials averaged
    pub trial_count: usize,
    /// Per-estimator averages
    pub metrics: BTreeMap<EstimatorKind, AggregatedMetrics>,
}

impl AggregatedResult {
    /// Average trial metrics
    ///
    /// Sums are taken in slice order and divided once at the end. An
    /// estimator missing from some trials is averaged over the trials that
    /// contain it.
    ///
    /// # Errors
    /// Returns [`SimulationError::InvalidConfig`] for an empty slice.
    pub fn from_trials(trials: &[TrialMetrics]) -> Result<Self, SimulationError> {
        if trials.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "cannot aggregate zero trials".to_string(),
            ));
        }

        #[derive(Default)]
        struct Accumulator {
            error_sum: f64,
            error_count: usize,
            shrinkage_sum: f64,
            shrinkage_count: usize,
        }

        let mut accumulators: BTreeMap<EstimatorKind, Accumulator> = BTreeMap::new();
        for trial in trials {
            for (kind, metrics) in &trial.estimators {
                let acc = accumulators.entry(*kind).or_default();
                acc.error_sum += metrics.squared_error;
                acc.error_count += 1;
                if let Some(shrinkage) = metrics.shrinkage {
                    acc.shrinkage_sum += shrinkage;
                    acc.shrinkage_count += 1;
                }
            }
        }

        let metrics = accumulators
            .into_iter()
            .map(|(kind, acc)| {
                let shrinkage = (acc.shrinkage_count > 0)
                    .then(|| acc.shrinkage_sum / acc.shrinkage_count as f64);
                let aggregated = AggregatedMetrics {
                    mse: acc.error_sum / acc.error_count as f64,
                    shrinkage,
                };
                (kind, aggregated)
            })
            .collect();

        Ok(Self {
            trial_count: trials.len(),
            metrics,
        })
    }

    /// Metrics of one estimator
    pub fn get(&self, kind: EstimatorKind) -> Option<&AggregatedMetrics> {
        self.metrics.get(&kind)
    }

    /// Estimator with the lowest mean squared error
    pub fn best(&self) -> Option<(EstimatorKind, &AggregatedMetrics)> {
        self.metrics
            .iter()
            .min_by(|a, b| a.1.mse.total_cmp(&b.1.mse))
            .map(|(kind, metrics)| (*kind, metrics))
    }
}

/// Deterministic random stream of one trial
pub fn trial_rng(seed: u64, sample_size: usize, trial: usize) -> ChaCha8Rng {
    let mut rng =
        ChaCha8Rng::seed_from_u64(seed ^ (sample_size as u64).wrapping_mul(SAMPLE_SIZE_MIX));
    rng.set_stream(trial as u64);
    rng
}

/// Run a single trial
///
/// # Arguments
/// * `process` - Ground-truth process
/// * `estimators` - Estimators to score
/// * `config` - Run configuration (dimension and seed)
/// * `sample_size` - Number of observations n
/// * `trial` - Trial index selecting the random stream
pub fn run_trial(
    process: &ProcessConfig,
    estimators: &[CovarianceEstimator],
    config: &SimulationConfig,
    sample_size: usize,
    trial: usize,
) -> Result<TrialMetrics, SimulationError> {
    let mut rng = trial_rng(config.seed, sample_size, trial);

    let sigma = generate_covariance(process, config.dimension, sample_size, &mut rng)?;
    let sample = MultivariateNormal::new(&sigma)?.sample(sample_size, &mut rng);

    let mut metrics = BTreeMap::new();
    for estimator in estimators {
        let estimate = estimator.fit(&sample)?;
        let squared_error = squared_frobenius_distance(&estimate.covariance, &sigma)?;
        metrics.insert(
            estimator.kind(),
            EstimatorMetrics {
                squared_error,
                shrinkage: estimate.shrinkage,
            },
        );
    }

    debug!(trial, sample_size, "Trial complete");

    Ok(TrialMetrics {
        trial,
        estimators: metrics,
    })
}

/// Run `config.trial_count` trials at sample size `sample_size` and average them
///
/// # Errors
/// * Invalid process parameters, configuration or `sample_size < 2`
/// * Numerical failures from generation or sampling
pub fn run_simulation(
    process: &ProcessConfig,
    config: &SimulationConfig,
    sample_size: usize,
) -> Result<AggregatedResult, SimulationError> {
    config.validate()?;
    process.validate()?;
    if sample_size < 2 {
        return Err(CovarianceError::InsufficientData {
            required: 2,
            actual: sample_size,
        }
        .into());
    }

    let estimators = CovarianceEstimator::all(&config.shrinkage)?;

    info!(
        %process,
        dimension = config.dimension,
        sample_size,
        trials = config.trial_count,
        parallel = config.parallel,
        "Running simulation"
    );

    let trials = if config.parallel {
        (0..config.trial_count)
            .into_par_iter()
            .map(|trial| run_trial(process, &estimators, config, sample_size, trial))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        (0..config.trial_count)
            .map(|trial| run_trial(process, &estimators, config, sample_size, trial))
            .collect::<Result<Vec<_>, _>>()?
    };

    AggregatedResult::from_trials(&trials)
}
