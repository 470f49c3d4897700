#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/covbench/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod harness;
pub mod process;
pub mod sampler;
pub mod sweep;

pub use harness::{
    AggregatedMetrics, AggregatedResult, EstimatorMetrics, SimulationConfig, SimulationError,
    TrialMetrics, run_simulation, run_trial,
};
pub use process::{ProcessConfig, ProcessFamily, generate_covariance};
pub use sampler::MultivariateNormal;
pub use sweep::{DEFAULT_SAMPLE_SIZES, SweepPoint, SweepResult, sweep, sweep_with_callback};
