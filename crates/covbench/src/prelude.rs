//! Commonly used types, for glob import.

pub use covbench_estimators::{
    CovarianceError, CovarianceEstimator, Estimate, EstimatorKind, ShrinkageConfig,
};
pub use covbench_output::{AggregateTable, ExportFormat, Exporter, SweepTable};
pub use covbench_sim::{
    AggregatedResult, DEFAULT_SAMPLE_SIZES, ProcessConfig, SimulationConfig, SimulationError,
    SweepResult, run_simulation, sweep,
};
