//! `tofsight-runtime` – per-frame orchestration.
//!
//! Wires the filter bank, preprocessor, inference engine and centroid
//! estimator into one cycle, and drives that cycle from a polled sensor.
//!
//! # Modules
//!
//! - [`pipeline`] – [`Pipeline`][pipeline::Pipeline]: owns every per-cycle
//!   buffer plus the filter state and the engine, and turns one raw frame
//!   into a [`CycleReport`][tofsight_types::CycleReport]. Falls back to
//!   degraded mode when the engine cannot be brought up.
//! - [`process_loop`] – [`run_loop`][process_loop::run_loop]: the blocking
//!   poll / read / process loop with a shutdown flag and frame limit.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging plus optional OTLP span export.

pub mod pipeline;
pub mod process_loop;
pub mod telemetry;

pub use pipeline::{Pipeline, PipelineConfig};
pub use process_loop::{DEFAULT_POLL_INTERVAL, LoopConfig, run_loop};
pub use telemetry::{TracerProviderGuard, init_tracing};
