//! Temporal Filter Bank.
//!
//! Holds one [`ScalarKalman`] per zone. Zones never interact, so the update
//! order within a frame does not matter.
//!
//! Before filtering, raw samples can be clamped to a raw envelope: a ranging
//! zone with no target returns long or invalid distances, and letting those
//! into the estimator would drag a zone far from the working range.
//!
//! # Example
//!
//! ```rust
//! use tofsight_perception::filter_bank::{FilterBankConfig, TemporalFilterBank};
//! use tofsight_types::DepthFrame;
//!
//! let mut bank = TemporalFilterBank::new(FilterBankConfig::default());
//! let smoothed = bank.update_frame(&DepthFrame::uniform(400));
//! assert_eq!(smoothed.get(0, 0), 400);
//! ```

use serde::{Deserialize, Serialize};
use tofsight_types::{DepthFrame, GRID_SIDE, PIXEL_COUNT};
use tracing::debug;

use crate::kalman::{KalmanParams, ScalarKalman};

/// Configuration for [`TemporalFilterBank`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterBankConfig {
    /// When `false`, samples pass through unfiltered.
    pub enabled: bool,
    pub params: KalmanParams,
    /// Clamp raw samples to this distance (mm) before filtering.
    pub raw_envelope_mm: Option<u16>,
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            params: KalmanParams::default(),
            raw_envelope_mm: Some(400),
        }
    }
}

/// One independent estimator per zone.
#[derive(Debug, Clone)]
pub struct TemporalFilterBank {
    config: FilterBankConfig,
    filters: [ScalarKalman; PIXEL_COUNT],
}

impl TemporalFilterBank {
    /// Create the bank with every zone initialised to
    /// `config.params.initial_value`.
    pub fn new(config: FilterBankConfig) -> Self {
        let mut bank = Self {
            config,
            filters: [ScalarKalman::new(&config.params); PIXEL_COUNT],
        };
        bank.initialize_all(config.params.initial_value);
        debug!(
            enabled = config.enabled,
            q = config.params.process_noise,
            r = config.params.measurement_noise,
            raw_envelope_mm = ?config.raw_envelope_mm,
            "filter bank initialised"
        );
        bank
    }

    /// Reset every zone's estimator to `initial_value`.
    pub fn initialize_all(&mut self, initial_value: f32) {
        for filter in &mut self.filters {
            filter.initialize(initial_value);
        }
    }

    /// Update a single zone and return its smoothed estimate (mm).
    pub fn update_zone(&mut self, index: usize, raw_mm: u16) -> f32 {
        let clamped = match self.config.raw_envelope_mm {
            Some(envelope) => raw_mm.min(envelope),
            None => raw_mm,
        };
        if self.config.enabled {
            self.filters[index].update(f32::from(clamped))
        } else {
            f32::from(clamped)
        }
    }

    /// Update all 64 zones with `raw` and return the smoothed frame.
    ///
    /// Estimates are truncated toward zero into whole millimetres,
    /// saturating at the `u16` range.
    pub fn update_frame(&mut self, raw: &DepthFrame) -> DepthFrame {
        let mut smoothed = DepthFrame::default();
        for index in 0..PIXEL_COUNT {
            let estimate = self.update_zone(index, raw.zone(index));
            smoothed.set(index / GRID_SIDE, index % GRID_SIDE, estimate as u16);
        }
        smoothed
    }

    /// Current estimate of a zone without updating it.
    pub fn estimate(&self, index: usize) -> f32 {
        self.filters[index].estimate()
    }

    pub fn config(&self) -> &FilterBankConfig {
        &self.config
    }
}
