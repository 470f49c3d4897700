#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/covbench/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;

// Re-export main types
pub use covariance::{
    CovarianceError, CovarianceEstimator, Estimate, EstimatorKind, ShrinkageConfig,
};
