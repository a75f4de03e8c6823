//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and cleaned observation rows (`RawObservation`, `Observation`)
//! - the metric and chart enumerations (`Metric`, `SeriesKind`)
//! - run configuration and latest-standing summaries (`AnalysisConfig`, `EntityRate`)

pub mod types;

pub use types::*;
