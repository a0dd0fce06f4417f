//! Generic `RangingSensor` trait for multizone time-of-flight devices.

use tofsight_types::{DepthFrame, TofError};

/// An 8×8 multizone ranging sensor.
///
/// Bus setup, resolution and ranging-mode configuration happen inside the
/// driver before it is handed to the pipeline; the core only polls for data.
pub trait RangingSensor {
    /// Stable identifier for this sensor, e.g. `"vl53l5cx"`.
    fn id(&self) -> &str;

    /// Return `true` when a new frame can be read.
    ///
    /// # Errors
    ///
    /// Returns [`TofError::SensorFault`] if the device cannot be queried.
    fn frame_ready(&mut self) -> Result<bool, TofError>;

    /// Read the most recent frame (first target per zone, millimetres).
    ///
    /// # Errors
    ///
    /// Returns [`TofError::SensorFault`] if the transfer fails.
    fn read_frame(&mut self) -> Result<DepthFrame, TofError>;
}
