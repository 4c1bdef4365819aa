//! Screen Impact - rule-based engine for a child's screen-time diagnostic
//!
//! Turns a parent's questionnaire answers into six dimension severities, an
//! inverse-impact total, a trajectory against the national average and a
//! short list of tailored recommendations through a deterministic pipeline:
//! normalization → dimension scoring → aggregation → projection → selection.
//!
//! ## Modules
//!
//! - **Engine**: `ImpactEngine` and the one-shot `calculate_impact` helpers
//! - **Reference data**: average curve and French copy, replaceable at runtime
//! - **Report**: envelope with producer metadata and a share message

pub mod aggregator;
pub mod config;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod recommendations;
pub mod reference;
pub mod scorers;
pub mod trajectory;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{DimensionWeights, EngineConfig, TrajectoryConfig};
pub use encoder::{ImpactReport, ReportEncoder, ShareMessage};
pub use error::{ImpactError, ValidationError};
pub use pipeline::{
    calculate_impact, parse_submission, simulation_to_impact_json, split_submissions, ImpactEngine,
};
pub use reference::ReferenceData;

// Contract exports
pub use types::{
    BedtimeAnswer, BedtimeFrequency, ComparisonData, Dimension, DimensionImpact, DimensionImpacts,
    ImpactLabel, ImpactResult, SignalLevel, SimulationData,
};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "screen-impact";
