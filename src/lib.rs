//! # Jumplab
//!
//! A force-plate jump trial analysis engine that segments continuous
//! bilateral force signals into discrete jump events and re-expresses each
//! jump on a fixed-length normalized time axis.
//!
//! ## Overview
//!
//! Recorded trials arrive as one CSV per participant and condition (two
//! real-world and two VR repetitions). The segmenter finds flight phases by
//! threshold crossing on the summed force signal, pairs takeoff and landing
//! edges, and carves a buffered analysis window around each accepted jump.
//! The normalizer later slices the raw series between a jump's window
//! bounds and resamples every channel onto a canonical axis so jumps of
//! different durations can be averaged sample-for-sample.
//!
//! ## Quick Start
//!
//! ```no_run
//! use jumplab::segmentation::{detect_jumps, SegmenterConfig};
//! use jumplab::normalize::{NormalizeConfig, TimeNormalizer};
//! use jumplab::series::{Condition, TimeSeries};
//!
//! # fn example(series: TimeSeries) -> jumplab::Result<()> {
//! // Segment one trial into jump records
//! let config = SegmenterConfig::default();
//! let jumps = detect_jumps(&series, Condition::Real1, &config)?;
//!
//! // Resample each jump onto 100 normalized time points
//! let normalizer = TimeNormalizer::new(NormalizeConfig::default());
//! for jump in &jumps {
//!     if let Some(normalized) = normalizer.normalize(&series, jump)? {
//!         println!("{}: {} points", normalized.key, normalized.points());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`series`]: time-series model, condition enum, and CSV ingestion
//! - [`segmentation`]: jump detection (threshold crossing / peak pairing)
//! - [`table`]: per-participant jump table persistence
//! - [`normalize`]: piecewise-linear resampling onto the canonical axis
//! - [`report`]: ensemble statistics and chart rendering
//! - [`batch`]: participant × condition orchestration
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌────────────┐
//! │ Trial CSV │──▶│ Segmenter │──▶│ Jump Table │──▶│ Normalizer │
//! │ (loader)  │   │           │   │ (CSV rows) │   │            │
//! └───────────┘   └───────────┘   └────────────┘   └────────────┘
//!                                                        │
//!                 ┌───────────┐   ┌────────────┐         ▼
//!                 │  Charts   │◀──│  Ensemble  │◀── normalized jumps
//!                 │ (plotters)│   │  mean ± SD │
//!                 └───────────┘   └────────────┘
//! ```

pub mod series;
pub mod segmentation;
pub mod table;
pub mod normalize;
pub mod report;
pub mod batch;
pub mod app;

// Re-export commonly used types
pub use normalize::{NormalizeConfig, NormalizedJump, TimeNormalizer};
pub use segmentation::{DetectionPolicy, JumpRecord, SegmenterConfig};
pub use series::{Condition, TimeSeries};
pub use table::JumpTable;

/// Result type alias for the analysis engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the analysis engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Series error: {0}")]
    Series(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Segmentation error: {0}")]
    Segmentation(String),

    #[error("Normalization error: {0}")]
    Normalization(String),

    #[error("Jump table error: {0}")]
    Table(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
