#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/covbench/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod summary;
pub mod table;

pub use export::{ExportError, ExportFormat, Exporter};
pub use table::{AggregateRecord, AggregateTable, SweepRecord, SweepTable};
