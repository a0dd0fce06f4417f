//! `tofsight-perception` – per-frame signal processing.
//!
//! Turns raw multizone depth frames into the normalized foreground signal the
//! inference engine and the centroid both consume.
//!
//! # Modules
//!
//! - [`kalman`] – [`ScalarKalman`][kalman::ScalarKalman]: a scalar
//!   predict/update recursive estimator for one zone.
//! - [`filter_bank`] – [`TemporalFilterBank`][filter_bank::TemporalFilterBank]:
//!   64 independent estimators, one per zone, plus the optional raw envelope
//!   clamp applied before filtering.
//! - [`preprocess`] – [`FramePreprocessor`][preprocess::FramePreprocessor]:
//!   background subtraction, envelope normalization and column energy
//!   accumulation.
//! - [`centroid`] – [`estimate_position`][centroid::estimate_position]: the
//!   validity-gated, energy-weighted column centroid.

pub mod centroid;
pub mod filter_bank;
pub mod kalman;
pub mod preprocess;

pub use centroid::estimate_position;
pub use filter_bank::{FilterBankConfig, TemporalFilterBank};
pub use kalman::{KalmanParams, ScalarKalman};
pub use preprocess::FramePreprocessor;
