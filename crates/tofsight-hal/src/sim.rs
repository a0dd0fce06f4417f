//! Scripted ranging sensor for running the pipeline without hardware.
//!
//! [`SimSensor`] renders a static background, optionally a target that
//! sweeps left and right across the grid, and adds bounded uniform noise
//! from a seeded [`StdRng`] so runs are reproducible.
//!
//! # Example
//!
//! ```rust
//! use tofsight_hal::sim::{SimSensor, TargetSweep};
//! use tofsight_hal::RangingSensor;
//!
//! let mut sensor = SimSensor::new("sim_tof")
//!     .with_target(TargetSweep { depth_mm: 150, width: 2, frames_per_column: 4 })
//!     .with_cadence(1);
//!
//! assert!(sensor.frame_ready().unwrap());
//! let frame = sensor.read_frame().unwrap();
//! assert_eq!(frame.get(0, 0), 150);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tofsight_types::{DepthFrame, GRID_SIDE, TofError};
use tracing::trace;

const DEFAULT_SEED: u64 = 0x1234_5678;

/// A target filling whole columns that sweeps across the field of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSweep {
    /// Distance of the target surface (mm).
    pub depth_mm: u16,
    /// Number of columns the target covers.
    pub width: usize,
    /// Frames spent at each column before stepping.
    pub frames_per_column: u32,
}

impl TargetSweep {
    /// Leftmost covered column for frame `n`, bouncing between the edges.
    pub fn column_at(&self, n: u64) -> usize {
        let width = self.width.clamp(1, GRID_SIDE);
        let span = (GRID_SIDE - width) as u64;
        if span == 0 {
            return 0;
        }
        let step = n / u64::from(self.frames_per_column.max(1));
        let phase = step % (2 * span);
        let col = if phase <= span { phase } else { 2 * span - phase };
        col as usize
    }
}

/// Simulated multizone sensor. Always succeeds unless a fault is scripted.
pub struct SimSensor {
    id: String,
    background: DepthFrame,
    target: Option<TargetSweep>,
    noise_mm: u16,
    rng: StdRng,
    polls_per_frame: u32,
    polls_since_read: u32,
    frames_read: u64,
    fail_after: Option<u64>,
}

impl SimSensor {
    /// Create a sensor looking at an empty scene 400 mm away, ready on every
    /// poll, without noise.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            background: DepthFrame::uniform(400),
            target: None,
            noise_mm: 0,
            rng: StdRng::seed_from_u64(DEFAULT_SEED),
            polls_per_frame: 1,
            polls_since_read: 0,
            frames_read: 0,
            fail_after: None,
        }
    }

    pub fn with_background(mut self, background: DepthFrame) -> Self {
        self.background = background;
        self
    }

    pub fn with_target(mut self, target: TargetSweep) -> Self {
        self.target = Some(target);
        self
    }

    /// Add uniform noise in `[-amplitude_mm, amplitude_mm]`.
    pub fn with_noise(mut self, amplitude_mm: u16, seed: u64) -> Self {
        self.noise_mm = amplitude_mm;
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of `frame_ready` polls before a frame becomes available.
    pub fn with_cadence(mut self, polls_per_frame: u32) -> Self {
        self.polls_per_frame = polls_per_frame.max(1);
        self
    }

    /// Derive the cadence from a ranging frequency and the caller's poll
    /// interval, e.g. 5 Hz polled every 5 ms is one frame per 40 polls.
    pub fn with_ranging_frequency(self, hz: u32, poll_interval_ms: u64) -> Self {
        let period_ms = 1000 / u64::from(hz.max(1));
        let polls = (period_ms / poll_interval_ms.max(1)).max(1);
        self.with_cadence(u32::try_from(polls).unwrap_or(u32::MAX))
    }

    /// Make every `read_frame` after the first `frames` reads fail.
    pub fn with_fault_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    fn next_noise(&mut self) -> i32 {
        if self.noise_mm == 0 {
            return 0;
        }
        let amp = i32::from(self.noise_mm);
        self.rng.gen_range(-amp..=amp)
    }

    fn render(&mut self) -> DepthFrame {
        let covered = self.target.map(|t| {
            let start = t.column_at(self.frames_read);
            (start, start + t.width.clamp(1, GRID_SIDE), t.depth_mm)
        });
        let mut frame = self.background;
        for row in 0..GRID_SIDE {
            for col in 0..GRID_SIDE {
                let base = match covered {
                    Some((start, end, depth)) if (start..end).contains(&col) => depth,
                    _ => self.background.get(row, col),
                };
                let noisy = i32::from(base) + self.next_noise();
                frame.set(row, col, noisy.clamp(0, i32::from(u16::MAX)) as u16);
            }
        }
        frame
    }
}

impl crate::sensor::RangingSensor for SimSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn frame_ready(&mut self) -> Result<bool, TofError> {
        self.polls_since_read = self.polls_since_read.saturating_add(1);
        Ok(self.polls_since_read >= self.polls_per_frame)
    }

    fn read_frame(&mut self) -> Result<DepthFrame, TofError> {
        if let Some(limit) = self.fail_after
            && self.frames_read >= limit
        {
            return Err(TofError::SensorFault {
                sensor: self.id.clone(),
                details: format!("scripted fault after {limit} frames"),
            });
        }
        let frame = self.render();
        trace!(sensor = %self.id, frame = self.frames_read, "sim frame rendered");
        self.polls_since_read = 0;
        self.frames_read += 1;
        Ok(frame)
    }
}
