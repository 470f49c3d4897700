//! Flat result tables.
//!
//! Sweep and run results are nested maps keyed by estimator. The tables here
//! flatten them into rows so they can be written as CSV or rendered as text.

use covbench_sim::{AggregatedResult, ProcessConfig, SweepResult};
use serde::{Deserialize, Serialize};

/// One row of a sweep table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepRecord {
    /// Process family name ("AR(1)" or "FBM").
    pub process: String,

    /// Process parameter (ρ or H).
    pub parameter: f64,

    /// Number of variables p.
    pub dimension: usize,

    /// Estimator name.
    pub estimator: String,

    /// Sample size n.
    pub n: usize,

    /// Mean squared Frobenius error.
    pub mse: f64,

    /// Mean shrinkage intensity, empty for the sample estimator.
    pub shrinkage: Option<f64>,
}

/// Sweep results as flat rows, ordered by estimator then sample size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepTable {
    /// Process label, e.g. "AR(1) rho=0.5".
    pub title: String,

    /// Number of variables p.
    pub dimension: usize,

    /// Trials per sample size.
    pub trial_count: usize,

    /// Sample sizes in sweep order.
    pub sample_sizes: Vec<usize>,

    /// Table rows.
    pub records: Vec<SweepRecord>,
}

impl SweepTable {
    /// Flatten a sweep result.
    pub fn from_sweep(result: &SweepResult) -> Self {
        let family = result.process.family().to_string();
        let parameter = result.process.parameter();

        let records = result
            .series
            .iter()
            .flat_map(|(kind, points)| {
                let family = family.clone();
                points.iter().map(move |point| SweepRecord {
                    process: family.clone(),
                    parameter,
                    dimension: result.dimension,
                    estimator: kind.name().to_string(),
                    n: point.n,
                    mse: point.mse,
                    shrinkage: point.shrinkage,
                })
            })
            .collect();

        Self {
            title: result.process.to_string(),
            dimension: result.dimension,
            trial_count: result.trial_count,
            sample_sizes: result.sample_sizes.clone(),
            records,
        }
    }

    /// Estimator names in table order.
    pub fn estimators(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for record in &self.records {
            if !names.contains(&record.estimator.as_str()) {
                names.push(&record.estimator);
            }
        }
        names
    }

    /// Row for an estimator at sample size `n`.
    pub fn get(&self, estimator: &str, n: usize) -> Option<&SweepRecord> {
        self.records
            .iter()
            .find(|record| record.estimator == estimator && record.n == n)
    }

    /// Name and error of the best estimator at sample size `n`.
    pub fn best_at(&self, n: usize) -> Option<(&str, f64)> {
        self.records
            .iter()
            .filter(|record| record.n == n)
            .min_by(|a, b| a.mse.total_cmp(&b.mse))
            .map(|record| (record.estimator.as_str(), record.mse))
    }
}

/// One row of a single-run table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateRecord {
    /// Estimator name.
    pub estimator: String,

    /// Mean squared Frobenius error.
    pub mse: f64,

    /// Mean shrinkage intensity, empty for the sample estimator.
    pub shrinkage: Option<f64>,
}

/// Results of one run at a fixed sample size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateTable {
    /// Process label, e.g. "FBM H=0.75".
    pub title: String,

    /// Number of variables p.
    pub dimension: usize,

    /// Sample size n.
    pub n: usize,

    /// Number of trials averaged.
    pub trial_count: usize,

    /// Table rows in estimator order.
    pub records: Vec<AggregateRecord>,
}

impl AggregateTable {
    /// Flatten a run result.
    pub fn from_result(
        process: &ProcessConfig,
        dimension: usize,
        n: usize,
        result: &AggregatedResult,
    ) -> Self {
        let records = result
            .metrics
            .iter()
            .map(|(kind, metrics)| AggregateRecord {
                estimator: kind.name().to_string(),
                mse: metrics.mse,
                shrinkage: metrics.shrinkage,
            })
            .collect();

        Self {
            title: process.to_string(),
            dimension,
            n,
            trial_count: result.trial_count,
            records,
        }
    }
}
