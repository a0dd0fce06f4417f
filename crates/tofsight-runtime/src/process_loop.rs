//! Blocking sensor polling loop.
//!
//! [`run_loop`] polls [`RangingSensor::frame_ready`], reads each ready frame,
//! pushes it through the [`Pipeline`] and hands the report to a callback.
//! Between polls it sleeps for the configured poll interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tofsight_hal::RangingSensor;
use tofsight_types::{CycleReport, TofError};
use tracing::{debug, info};

use crate::pipeline::Pipeline;

/// Default pause between `frame_ready` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Loop limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub poll_interval: Duration,
    /// Stop after this many processed frames. `None` runs until shutdown.
    pub max_frames: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_frames: None,
        }
    }
}

/// Drive `pipeline` from `sensor` until `shutdown` is set or
/// `config.max_frames` frames have been processed.
///
/// Returns the number of frames processed.
///
/// # Errors
///
/// Any [`TofError`] from the sensor stops the loop and is returned as is.
pub fn run_loop(
    sensor: &mut dyn RangingSensor,
    pipeline: &mut Pipeline,
    shutdown: &AtomicBool,
    config: &LoopConfig,
    mut on_report: impl FnMut(&CycleReport),
) -> Result<u64, TofError> {
    info!(sensor = sensor.id(), max_frames = ?config.max_frames, "process loop started");
    let mut processed = 0u64;

    while !shutdown.load(Ordering::SeqCst) {
        if config.max_frames.is_some_and(|max| processed >= max) {
            break;
        }
        if sensor.frame_ready()? {
            let frame = sensor.read_frame()?;
            let report = pipeline.process_frame(&frame);
            processed += 1;
            on_report(&report);
        } else if !config.poll_interval.is_zero() {
            std::thread::sleep(config.poll_interval);
        }
    }

    if shutdown.load(Ordering::SeqCst) {
        debug!("shutdown requested");
    }
    info!(sensor = sensor.id(), processed, "process loop stopped");
    Ok(processed)
}
