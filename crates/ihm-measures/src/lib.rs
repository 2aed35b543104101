//! ihm-measures: instance hardness measures for labelled tabular data.
//!
//! Given a feature matrix and class labels, the crate scores how hard each
//! instance is to classify with six measures (kDN, N2, CLD, DCP, TD_P and
//! TD_U). Higher values mean harder instances.
//!
//! The [`registry::MeasureRegistry`] is the entry point: it resolves which
//! measures to run, builds the shared distance matrix and calibrated
//! classifier on demand, and returns a [`registry::HardnessTable`] with one
//! `feature_`-prefixed column per measure.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod execution;
pub mod io;
pub mod math;
pub mod measures;
pub mod model_selection;
pub mod models;
pub mod precompute;
pub mod preprocessing;
pub mod registry;
pub mod stats;

pub use config::HardnessConfig;
pub use data_handling::Dataset;
pub use error::{HardnessError, Result};
pub use execution::CancelToken;
pub use measures::Measure;
pub use registry::{HardnessTable, MeasureRegistry};
