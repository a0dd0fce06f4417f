//! Shared data model for the tofsight depth pipeline.
//!
//! Every buffer here is fixed-size and `Copy` so that a processing cycle can
//! run without touching the heap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side length of the sensor's zone grid.
pub const GRID_SIDE: usize = 8;
/// Number of ranging zones (pixels) per frame.
pub const PIXEL_COUNT: usize = GRID_SIDE * GRID_SIDE;
/// Foreground depth (mm) that maps to a normalized energy of 1.0.
pub const DEFAULT_ENVELOPE_MAX_MM: u16 = 400;
/// Position reported when no reliable presence is detected.
pub const DEFAULT_POSITION: f32 = 0.5;
/// Validity scores strictly above this value gate the centroid.
pub const VALIDITY_THRESHOLD: f32 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Frames
// ────────────────────────────────────────────────────────────────────────────

/// An 8×8 grid of distance samples in millimetres, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthFrame {
    zones: [[u16; GRID_SIDE]; GRID_SIDE],
}

impl DepthFrame {
    pub fn new(zones: [[u16; GRID_SIDE]; GRID_SIDE]) -> Self {
        Self { zones }
    }

    /// A frame where every zone reads `mm`.
    pub fn uniform(mm: u16) -> Self {
        Self {
            zones: [[mm; GRID_SIDE]; GRID_SIDE],
        }
    }

    /// Build a frame by evaluating `f(row, col)` for every zone.
    pub fn from_fn(mut f: impl FnMut(usize, usize) -> u16) -> Self {
        let mut zones = [[0u16; GRID_SIDE]; GRID_SIDE];
        for (row, line) in zones.iter_mut().enumerate() {
            for (col, zone) in line.iter_mut().enumerate() {
                *zone = f(row, col);
            }
        }
        Self { zones }
    }

    /// Build a frame from zones in sensor order (`index = row * 8 + col`).
    pub fn from_zones(zones: &[u16; PIXEL_COUNT]) -> Self {
        Self::from_fn(|row, col| zones[row * GRID_SIDE + col])
    }

    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.zones[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, mm: u16) {
        self.zones[row][col] = mm;
    }

    /// Sample at a flat zone index.
    pub fn zone(&self, index: usize) -> u16 {
        self.zones[index / GRID_SIDE][index % GRID_SIDE]
    }

    pub fn rows(&self) -> &[[u16; GRID_SIDE]; GRID_SIDE] {
        &self.zones
    }
}

impl Default for DepthFrame {
    fn default() -> Self {
        Self::uniform(0)
    }
}

/// Static per-zone baseline of the idle scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundReference(DepthFrame);

impl BackgroundReference {
    pub fn new(frame: DepthFrame) -> Self {
        Self(frame)
    }

    pub fn uniform(mm: u16) -> Self {
        Self(DepthFrame::uniform(mm))
    }

    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.0.get(row, col)
    }

    pub fn frame(&self) -> &DepthFrame {
        &self.0
    }
}

impl Default for BackgroundReference {
    fn default() -> Self {
        Self::uniform(DEFAULT_ENVELOPE_MAX_MM)
    }
}

/// Normalized foreground energy of one cycle, plus its per-column sums.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForegroundEnergy {
    /// Per-zone energy in `[0, 1]`.
    pub pixels: [[f32; GRID_SIDE]; GRID_SIDE],
    /// Column Energy Vector: `columns[c]` is the sum of `pixels[..][c]`.
    pub columns: [f32; GRID_SIDE],
}

impl ForegroundEnergy {
    pub fn total(&self) -> f32 {
        self.columns.iter().sum()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Inference input
// ────────────────────────────────────────────────────────────────────────────

/// Numeric encoding of the inference input/output slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// 8-bit signed integers with an affine `(scale, zero_point)` mapping.
    #[default]
    Int8,
    Float32,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::Int8 => write!(f, "int8"),
            Encoding::Float32 => write!(f, "float32"),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = TofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int8" | "i8" => Ok(Encoding::Int8),
            "float32" | "float" | "f32" => Ok(Encoding::Float32),
            other => Err(TofError::Config(format!("unknown encoding '{other}'"))),
        }
    }
}

/// Affine quantization parameters: `real = (q - zero_point) * scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: i32,
}

/// The 64-element buffer handed to the inference engine each cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputBuffer {
    Int8([i8; PIXEL_COUNT]),
    Float32([f32; PIXEL_COUNT]),
}

impl InputBuffer {
    /// A zeroed buffer in the given encoding.
    pub fn zeroed(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Int8 => InputBuffer::Int8([0; PIXEL_COUNT]),
            Encoding::Float32 => InputBuffer::Float32([0.0; PIXEL_COUNT]),
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            InputBuffer::Int8(_) => Encoding::Int8,
            InputBuffer::Float32(_) => Encoding::Float32,
        }
    }
}

/// Destination for normalized per-zone energy written by the preprocessor.
///
/// Implementors decide how `norm` is stored (plain float, quantized, …).
pub trait InputSink {
    fn write(&mut self, index: usize, norm: f32);
}

impl InputSink for [f32; PIXEL_COUNT] {
    fn write(&mut self, index: usize, norm: f32) {
        self[index] = norm;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cycle output
// ────────────────────────────────────────────────────────────────────────────

/// What the inference half of a cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Estimate {
        /// Probability that a foreground object is present, `[0, 1]`.
        validity: f32,
        /// Normalized horizontal position, `[0, 1]`.
        position: f32,
        /// Forward-pass wall time in microseconds.
        inference_us: u64,
    },
    /// The engine never initialised; filtering and preprocessing still ran.
    InferenceUnavailable,
    /// This cycle's forward pass failed. Later cycles are unaffected.
    InferenceFailed { reason: String },
}

/// Everything reported for a single processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp: DateTime<Utc>,
    /// Frame after temporal filtering.
    pub smoothed: DepthFrame,
    pub columns: [f32; GRID_SIDE],
    pub outcome: CycleOutcome,
}

impl CycleReport {
    /// `(validity, position)` when this cycle produced an estimate.
    pub fn estimate(&self) -> Option<(f32, f32)> {
        match self.outcome {
            CycleOutcome::Estimate {
                validity, position, ..
            } => Some((validity, position)),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Pipeline-level error type spanning sensor faults and configuration.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TofError {
    #[error("Sensor Fault on {sensor}: {details}")]
    SensorFault { sensor: String, details: String },

    #[error("Inference unavailable: {0}")]
    InferenceUnavailable(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_zones_is_row_major() {
        let mut zones = [0u16; PIXEL_COUNT];
        zones[11] = 123; // row 1, col 3
        let frame = DepthFrame::from_zones(&zones);
        assert_eq!(frame.get(1, 3), 123);
        assert_eq!(frame.zone(11), 123);
        assert_eq!(frame.get(3, 1), 0);
    }

    #[test]
    fn default_background_is_envelope() {
        let bg = BackgroundReference::default();
        assert_eq!(bg.get(0, 0), DEFAULT_ENVELOPE_MAX_MM);
        assert_eq!(bg.get(7, 7), DEFAULT_ENVELOPE_MAX_MM);
    }

    #[test]
    fn encoding_parses_aliases() {
        assert_eq!("INT8".parse::<Encoding>().unwrap(), Encoding::Int8);
        assert_eq!("float".parse::<Encoding>().unwrap(), Encoding::Float32);
        assert!("int4".parse::<Encoding>().is_err());
    }

    #[test]
    fn zeroed_buffer_matches_encoding() {
        assert_eq!(InputBuffer::zeroed(Encoding::Int8).encoding(), Encoding::Int8);
        assert_eq!(
            InputBuffer::zeroed(Encoding::Float32).encoding(),
            Encoding::Float32
        );
    }

    #[test]
    fn float_array_is_an_input_sink() {
        let mut buf = [0.0f32; PIXEL_COUNT];
        buf.write(63, 0.75);
        assert!((buf[63] - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn cycle_report_roundtrip() {
        let report = CycleReport {
            cycle: 7,
            timestamp: Utc::now(),
            smoothed: DepthFrame::uniform(400),
            columns: [0.0; GRID_SIDE],
            outcome: CycleOutcome::Estimate {
                validity: 0.9,
                position: 0.25,
                inference_us: 812,
            },
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"status\":\"estimate\""));
        let back: CycleReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cycle, 7);
        assert_eq!(back.estimate(), Some((0.9, 0.25)));
    }

    #[test]
    fn unavailable_outcome_has_no_estimate() {
        let report = CycleReport {
            cycle: 0,
            timestamp: Utc::now(),
            smoothed: DepthFrame::default(),
            columns: [0.0; GRID_SIDE],
            outcome: CycleOutcome::InferenceUnavailable,
        };
        assert!(report.estimate().is_none());
    }

    #[test]
    fn tof_error_display() {
        let err = TofError::SensorFault {
            sensor: "vl53l5cx".to_string(),
            details: "not alive".to_string(),
        };
        assert!(err.to_string().contains("vl53l5cx"));
        assert!(TofError::Config("x".into()).to_string().contains("Configuration"));
    }
}
