//! Time-series model and trial ingestion
//!
//! A trial is one continuous force-plate/kinematic recording for one
//! participant under one experimental condition. This module defines the
//! schema-checked [`TimeSeries`] container, the closed [`Condition`] enum,
//! and the CSV loader that turns raw trial exports into series.

pub mod loader;
pub mod types;

pub use loader::{load_participant_dir, load_trial_csv};
pub use types::{ChannelSchema, Condition, TimeSeries};
pub use types::{LEFT_FORCE_CHANNEL, RIGHT_FORCE_CHANNEL, TIME_CHANNEL};
