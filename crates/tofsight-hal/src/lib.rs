//! `tofsight-hal` – sensor boundary.
//!
//! The core never talks to a bus directly; it only sees the
//! [`RangingSensor`][sensor::RangingSensor] trait.
//!
//! # Modules
//!
//! - [`sensor`] – [`RangingSensor`][sensor::RangingSensor]: the polled
//!   `frame_ready` / `read_frame` contract a multizone ToF driver exposes.
//! - [`sim`] – [`SimSensor`][sim::SimSensor]: a scripted sensor with a
//!   configurable background, a sweeping target and deterministic noise, for
//!   headless runs and tests.

pub mod sensor;
pub mod sim;

pub use sensor::RangingSensor;
pub use sim::{SimSensor, TargetSweep};
