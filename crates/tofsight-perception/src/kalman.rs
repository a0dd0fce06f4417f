//! Scalar Kalman filter for a single ranging zone.
//!
//! The state model is a constant: each step predicts `x` unchanged and grows
//! the uncertainty by the process noise, then corrects toward the
//! measurement:
//!
//! ```text
//! p = p + q
//! k = p / (p + r)
//! x = x + k * (z - x)
//! p = (1 - k) * p
//! ```
//!
//! Because `0 < k < 1`, every new estimate lies between the previous estimate
//! and the measurement, so a step input is approached without overshoot.

use serde::{Deserialize, Serialize};

/// Tuning constants shared by every zone's filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KalmanParams {
    /// Starting estimate (mm).
    pub initial_value: f32,
    /// Starting error covariance (mm²).
    pub initial_uncertainty: f32,
    /// Process noise `q` (mm²) added on every predict step.
    pub process_noise: f32,
    /// Measurement noise `r` (mm²).
    pub measurement_noise: f32,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            initial_value: 400.0,
            initial_uncertainty: 100.0,
            process_noise: 4.0,
            measurement_noise: 64.0,
        }
    }
}

/// Recursive estimator state for one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarKalman {
    estimate: f32,
    uncertainty: f32,
    initial_uncertainty: f32,
    process_noise: f32,
    measurement_noise: f32,
}

impl ScalarKalman {
    pub fn new(params: &KalmanParams) -> Self {
        Self {
            estimate: params.initial_value,
            uncertainty: params.initial_uncertainty.max(0.0),
            initial_uncertainty: params.initial_uncertainty.max(0.0),
            process_noise: params.process_noise.max(0.0),
            measurement_noise: params.measurement_noise.max(f32::EPSILON),
        }
    }

    /// Reset the estimate to `initial_value` with the initial uncertainty.
    pub fn initialize(&mut self, initial_value: f32) {
        self.estimate = initial_value;
        self.uncertainty = self.initial_uncertainty;
    }

    /// Fold in one measurement and return the new estimate.
    pub fn update(&mut self, measurement: f32) -> f32 {
        self.uncertainty += self.process_noise;
        let gain = self.uncertainty / (self.uncertainty + self.measurement_noise);
        self.estimate += gain * (measurement - self.estimate);
        self.uncertainty *= 1.0 - gain;
        self.estimate
    }

    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    pub fn uncertainty(&self) -> f32 {
        self.uncertainty
    }
}
