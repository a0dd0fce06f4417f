//! [`Pipeline`] – the per-frame orchestrator.
//!
//! Each call to [`Pipeline::process_frame`] runs one full cycle:
//!
//! 1. **Filter** – clamp raw samples to the raw envelope and update the
//!    [`TemporalFilterBank`].
//! 2. **Preprocess** – subtract the smoothed frame from the background,
//!    normalize into the input buffer and accumulate column energy.
//! 3. **Infer** – run the [`InferenceEngine`] on the input buffer to get a
//!    validity score (skipped in degraded mode).
//! 4. **Locate** – gate the column centroid on validity.
//!
//! The pipeline owns every buffer it touches, so a cycle needs nothing but
//! `&mut self` and performs no heap allocation on the success path.
//!
//! # Degraded mode
//!
//! If the engine cannot be initialised, [`Pipeline::new`] logs the reason
//! once and keeps going. Filtering and preprocessing still run every cycle;
//! the report carries [`CycleOutcome::InferenceUnavailable`].
//!
//! # Example
//!
//! ```rust
//! use tofsight_inference::reference_model;
//! use tofsight_runtime::pipeline::{Pipeline, PipelineConfig};
//! use tofsight_types::{DepthFrame, Encoding};
//!
//! let asset = reference_model::presence_model(Encoding::Int8).unwrap();
//! let mut pipeline = Pipeline::new(PipelineConfig::default(), Some(&asset));
//! assert!(pipeline.inference_available());
//!
//! let report = pipeline.process_frame(&DepthFrame::uniform(400));
//! let (validity, position) = report.estimate().unwrap();
//! assert!(validity < 0.5);
//! assert_eq!(position, 0.5);
//! ```

use chrono::Utc;
use tofsight_inference::{EngineConfig, InferenceEngine};
use tofsight_perception::{
    FilterBankConfig, FramePreprocessor, TemporalFilterBank, estimate_position,
};
use tofsight_types::{
    BackgroundReference, CycleOutcome, CycleReport, DEFAULT_ENVELOPE_MAX_MM, DEFAULT_POSITION,
    DepthFrame, InputBuffer, PIXEL_COUNT,
};
use tracing::{debug, info, instrument, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`Pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub filter: FilterBankConfig,
    /// Foreground depth (mm) that normalizes to 1.0.
    pub envelope_max_mm: u16,
    pub background: BackgroundReference,
    pub engine: EngineConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter: FilterBankConfig::default(),
            envelope_max_mm: DEFAULT_ENVELOPE_MAX_MM,
            background: BackgroundReference::default(),
            engine: EngineConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

pub struct Pipeline {
    filters: TemporalFilterBank,
    preprocessor: FramePreprocessor,
    background: BackgroundReference,
    engine: Option<InferenceEngine>,
    /// Encoded input for the engine; reused every cycle.
    input: InputBuffer,
    /// Sink for normalized energy when no engine is loaded.
    scratch: [f32; PIXEL_COUNT],
    cycle: u64,
}

impl Pipeline {
    /// Build the pipeline and try to bring up the inference engine from
    /// `asset`.
    ///
    /// Never fails. Without an asset, or if engine initialisation fails, the
    /// pipeline runs in degraded mode.
    pub fn new(config: PipelineConfig, asset: Option<&[u8]>) -> Self {
        let engine = match asset {
            Some(bytes) => match InferenceEngine::initialize(bytes, &config.engine) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    warn!(error = %e, "engine initialisation failed; running without inference");
                    None
                }
            },
            None => {
                warn!("no model asset supplied; running without inference");
                None
            }
        };

        let input = match &engine {
            Some(engine) => engine.input_buffer(),
            None => InputBuffer::zeroed(config.engine.encoding.unwrap_or_default()),
        };

        info!(
            inference = engine.is_some(),
            filtering = config.filter.enabled,
            envelope_max_mm = config.envelope_max_mm,
            "pipeline ready"
        );

        Self {
            filters: TemporalFilterBank::new(config.filter),
            preprocessor: FramePreprocessor::new(config.envelope_max_mm),
            background: config.background,
            engine,
            input,
            scratch: [0.0; PIXEL_COUNT],
            cycle: 0,
        }
    }

    /// `true` when the engine initialised and validity is being computed.
    pub fn inference_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&InferenceEngine> {
        self.engine.as_ref()
    }

    /// Number of frames processed so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Run one full cycle over `raw` and report the result.
    ///
    /// A failed forward pass is reported in this cycle's outcome and logged;
    /// it does not affect later cycles.
    #[instrument(skip(self, raw), fields(cycle = self.cycle))]
    pub fn process_frame(&mut self, raw: &DepthFrame) -> CycleReport {
        let smoothed = self.filters.update_frame(raw);

        let (columns, outcome) = match self.engine.as_mut() {
            None => {
                let energy = self
                    .preprocessor
                    .process(&smoothed, &self.background, &mut self.scratch);
                (energy.columns, CycleOutcome::InferenceUnavailable)
            }
            Some(engine) => {
                let energy = {
                    let mut sink = engine.input_writer(&mut self.input);
                    self.preprocessor
                        .process(&smoothed, &self.background, &mut sink)
                };
                let outcome = match engine.run(&self.input) {
                    Ok(inference) => {
                        let position = estimate_position(&energy.columns, inference.validity);
                        let inference_us =
                            u64::try_from(inference.elapsed.as_micros()).unwrap_or(u64::MAX);
                        debug!(
                            validity = inference.validity,
                            position, inference_us, "cycle estimate"
                        );
                        CycleOutcome::Estimate {
                            validity: inference.validity,
                            position,
                            inference_us,
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, position = DEFAULT_POSITION, "forward pass failed");
                        CycleOutcome::InferenceFailed {
                            reason: e.to_string(),
                        }
                    }
                };
                (energy.columns, outcome)
            }
        };

        self.cycle += 1;
        CycleReport {
            cycle: self.cycle,
            timestamp: Utc::now(),
            smoothed,
            columns,
            outcome,
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("cycle", &self.cycle)
            .field("engine", &self.engine)
            .field("preprocessor", &self.preprocessor)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tofsight_inference::reference_model;
    use tofsight_perception::KalmanParams;
    use tofsight_types::{Encoding, GRID_SIDE};

    fn pipeline(encoding: Encoding) -> Pipeline {
        let asset = reference_model::presence_model(encoding).unwrap();
        Pipeline::new(PipelineConfig::default(), Some(&asset))
    }

    fn column_frame(col: usize) -> DepthFrame {
        DepthFrame::from_fn(|_, c| if c == col { 0 } else { 400 })
    }

    /// Feed `frame` enough times for the filters to settle.
    fn settle(p: &mut Pipeline, frame: &DepthFrame) -> CycleReport {
        let mut last = p.process_frame(frame);
        for _ in 0..40 {
            last = p.process_frame(frame);
        }
        last
    }

    #[test]
    fn empty_scene_is_invalid_and_centred() {
        for encoding in [Encoding::Int8, Encoding::Float32] {
            let mut p = pipeline(encoding);
            let report = settle(&mut p, &DepthFrame::uniform(400));
            let (validity, position) = report.estimate().unwrap();
            assert!(validity < 0.5, "{encoding}: {validity}");
            assert_eq!(position, 0.5);
            assert_eq!(report.columns, [0.0; GRID_SIDE]);
        }
    }

    #[test]
    fn column_three_target_is_located() {
        for encoding in [Encoding::Int8, Encoding::Float32] {
            let mut p = pipeline(encoding);
            let report = settle(&mut p, &column_frame(3));
            let (validity, position) = report.estimate().unwrap();
            assert!(validity > 0.5, "{encoding}: {validity}");
            assert!((position - 3.0 / 7.0).abs() < 1e-5, "{encoding}: {position}");
        }
    }

    #[test]
    fn edge_columns_map_to_edges() {
        let mut p = pipeline(Encoding::Float32);
        let (_, left) = settle(&mut p, &column_frame(0)).estimate().unwrap();
        assert!(left.abs() < 1e-5, "{left}");

        let mut p = pipeline(Encoding::Float32);
        let (_, right) = settle(&mut p, &column_frame(7)).estimate().unwrap();
        assert!((right - 1.0).abs() < 1e-5, "{right}");
    }

    #[test]
    fn first_frame_is_smoothed_not_raw() {
        let mut p = pipeline(Encoding::Int8);
        let report = p.process_frame(&column_frame(3));
        let z = report.smoothed.get(0, 3);
        assert!(z > 0 && z < 400, "smoothed {z}");
        assert_eq!(report.smoothed.get(0, 0), 400);
        assert_eq!(report.cycle, 1);
    }

    #[test]
    fn far_readings_are_clamped_before_filtering() {
        let mut p = pipeline(Encoding::Float32);
        let report = p.process_frame(&DepthFrame::uniform(4000));
        assert_eq!(report.smoothed, DepthFrame::uniform(400));
    }

    #[test]
    fn undersized_arena_degrades() {
        let asset = reference_model::presence_model(Encoding::Int8).unwrap();
        let config = PipelineConfig {
            engine: EngineConfig {
                arena_bytes: 64,
                encoding: None,
            },
            ..PipelineConfig::default()
        };
        let mut p = Pipeline::new(config, Some(&asset));
        assert!(!p.inference_available());

        let report = settle(&mut p, &column_frame(3));
        assert_eq!(report.outcome, CycleOutcome::InferenceUnavailable);
        assert_eq!(report.estimate(), None);
        // Preprocessing still ran.
        assert!(report.columns[3] > 7.9);
    }

    #[test]
    fn missing_asset_degrades() {
        let mut p = Pipeline::new(PipelineConfig::default(), None);
        assert!(!p.inference_available());
        let report = p.process_frame(&DepthFrame::uniform(400));
        assert_eq!(report.outcome, CycleOutcome::InferenceUnavailable);
    }

    #[test]
    fn encoding_mismatch_degrades() {
        let asset = reference_model::presence_model(Encoding::Float32).unwrap();
        let config = PipelineConfig {
            engine: EngineConfig {
                encoding: Some(Encoding::Int8),
                ..EngineConfig::default()
            },
            ..PipelineConfig::default()
        };
        let p = Pipeline::new(config, Some(&asset));
        assert!(!p.inference_available());
    }

    #[test]
    fn disabled_filter_passes_samples_through() {
        let asset = reference_model::presence_model(Encoding::Float32).unwrap();
        let config = PipelineConfig {
            filter: FilterBankConfig {
                enabled: false,
                ..FilterBankConfig::default()
            },
            ..PipelineConfig::default()
        };
        let mut p = Pipeline::new(config, Some(&asset));
        let report = p.process_frame(&column_frame(3));
        assert_eq!(report.smoothed, column_frame(3));
        let (validity, position) = report.estimate().unwrap();
        assert!(validity > 0.5);
        assert!((position - 3.0 / 7.0).abs() < 1e-5);
    }

    /// A float32 presence graph whose logit overflows for any lit scene.
    fn overflowing_asset() -> Vec<u8> {
        let mut graph = reference_model::presence_graph(Encoding::Float32).unwrap();
        let weights = graph
            .tensors
            .iter_mut()
            .find(|t| t.name == "presence/weights")
            .unwrap();
        let len = weights.element_count();
        weights.data = Some(vec![1e38; len]);
        graph.to_bytes().unwrap()
    }

    #[test]
    fn failed_forward_pass_affects_only_its_cycle() {
        let asset = overflowing_asset();
        // Near-zero measurement noise so the filters follow the raw frames.
        let config = PipelineConfig {
            filter: FilterBankConfig {
                params: KalmanParams {
                    measurement_noise: 0.01,
                    ..KalmanParams::default()
                },
                ..FilterBankConfig::default()
            },
            ..PipelineConfig::default()
        };
        let mut p = Pipeline::new(config, Some(&asset));
        assert!(p.inference_available());

        let failed = p.process_frame(&DepthFrame::uniform(0));
        assert!(
            matches!(failed.outcome, CycleOutcome::InferenceFailed { .. }),
            "{:?}",
            failed.outcome
        );
        assert_eq!(failed.estimate(), None);
        assert!(failed.smoothed.get(0, 0) < 400);
        assert!(failed.columns.iter().all(|&c| c > 0.0));

        let recovered = p.process_frame(&DepthFrame::uniform(400));
        assert!(
            matches!(recovered.outcome, CycleOutcome::Estimate { .. }),
            "{:?}",
            recovered.outcome
        );
        assert_eq!(recovered.cycle, 2);
        assert!(p.inference_available());
    }

    #[test]
    fn cycle_counter_advances() {
        let mut p = Pipeline::new(PipelineConfig::default(), None);
        for expected in 1..=3 {
            assert_eq!(p.process_frame(&DepthFrame::uniform(400)).cycle, expected);
        }
        assert_eq!(p.cycles(), 3);
    }
}
