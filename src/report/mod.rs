//! Ensemble statistics and chart rendering
//!
//! Consumes normalized-jump collections and jump-record lists purely for
//! display: per-channel mean ± SD across the jumps of one condition, an
//! annotated raw-force overview, and an overlaid ensemble chart.

pub mod charts;
pub mod ensemble;

pub use charts::{render_ensemble_chart, render_force_overview};
pub use ensemble::{channel_ensemble, ChannelEnsemble};
