//! Frame Preprocessor.
//!
//! For every zone:
//!
//! ```text
//! diff = clamp(background - depth, 0, envelope_max)
//! norm = diff / envelope_max
//! ```
//!
//! `norm` is written to the caller's [`InputSink`] (which encodes it for the
//! inference engine) and summed into the column energy vector. A zone that
//! reads farther than its background simply has no foreground energy.

use tofsight_types::{
    BackgroundReference, DEFAULT_ENVELOPE_MAX_MM, DepthFrame, ForegroundEnergy, GRID_SIDE,
    InputSink,
};

/// Background subtraction and envelope normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePreprocessor {
    envelope_max_mm: u16,
}

impl FramePreprocessor {
    /// `envelope_max_mm` is the foreground depth that saturates to 1.0; a
    /// value of zero is raised to 1 mm.
    pub fn new(envelope_max_mm: u16) -> Self {
        Self {
            envelope_max_mm: envelope_max_mm.max(1),
        }
    }

    pub fn envelope_max_mm(&self) -> u16 {
        self.envelope_max_mm
    }

    /// Normalized foreground energy of one zone.
    pub fn normalize(&self, background_mm: u16, depth_mm: u16) -> f32 {
        let envelope = i32::from(self.envelope_max_mm);
        let diff = (i32::from(background_mm) - i32::from(depth_mm)).clamp(0, envelope);
        diff as f32 / envelope as f32
    }

    /// Process all 64 zones of `depth`, writing every normalized value into
    /// `sink` before returning.
    pub fn process<S: InputSink + ?Sized>(
        &self,
        depth: &DepthFrame,
        background: &BackgroundReference,
        sink: &mut S,
    ) -> ForegroundEnergy {
        let mut energy = ForegroundEnergy::default();
        for row in 0..GRID_SIDE {
            for col in 0..GRID_SIDE {
                let norm = self.normalize(background.get(row, col), depth.get(row, col));
                energy.pixels[row][col] = norm;
                energy.columns[col] += norm;
                sink.write(row * GRID_SIDE + col, norm);
            }
        }
        energy
    }
}

impl Default for FramePreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_ENVELOPE_MAX_MM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tofsight_types::PIXEL_COUNT;

    #[test]
    fn farther_than_background_is_zero() {
        let pre = FramePreprocessor::default();
        assert_eq!(pre.normalize(400, 400), 0.0);
        assert_eq!(pre.normalize(400, 650), 0.0);
        assert_eq!(pre.normalize(0, 10), 0.0);
    }

    #[test]
    fn envelope_saturates_at_one() {
        let pre = FramePreprocessor::default();
        assert_eq!(pre.normalize(400, 0), 1.0);
        assert_eq!(pre.normalize(900, 100), 1.0);
        assert_eq!(pre.normalize(u16::MAX, 0), 1.0);
    }

    #[test]
    fn intermediate_depth_is_linear() {
        let pre = FramePreprocessor::default();
        assert!((pre.normalize(400, 300) - 0.25).abs() < 1e-6);
        assert!((pre.normalize(400, 100) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn empty_scene_has_no_energy() {
        let pre = FramePreprocessor::default();
        let mut sink = [1.0f32; PIXEL_COUNT];
        let energy = pre.process(
            &DepthFrame::uniform(400),
            &BackgroundReference::uniform(400),
            &mut sink,
        );
        assert_eq!(energy.total(), 0.0);
        assert!(sink.iter().all(|&v| v == 0.0), "every zone must be overwritten");
    }

    #[test]
    fn column_energy_accumulates_per_column() {
        let pre = FramePreprocessor::default();
        let depth = DepthFrame::from_fn(|_, col| if col == 3 { 0 } else { 400 });
        let mut sink = [0.0f32; PIXEL_COUNT];
        let energy = pre.process(&depth, &BackgroundReference::uniform(400), &mut sink);
        assert_eq!(energy.columns[3], 8.0);
        assert_eq!(energy.total(), 8.0);
        assert_eq!(sink[3], 1.0);
        assert_eq!(sink[GRID_SIDE + 3], 1.0);
        assert_eq!(sink[4], 0.0);
    }

    #[test]
    fn per_zone_background_is_respected() {
        let pre = FramePreprocessor::default();
        let background = BackgroundReference::new(DepthFrame::from_fn(|row, _| {
            if row < 4 { 200 } else { 400 }
        }));
        let mut sink = [0.0f32; PIXEL_COUNT];
        let energy = pre.process(&DepthFrame::uniform(200), &background, &mut sink);
        assert_eq!(energy.pixels[0][0], 0.0);
        assert!((energy.pixels[7][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_envelope_is_raised() {
        assert_eq!(FramePreprocessor::new(0).envelope_max_mm(), 1);
    }
}
