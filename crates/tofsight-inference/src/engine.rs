//! [`InferenceEngine`] – the validity classifier.
//!
//! # Example
//!
//! ```rust
//! use tofsight_inference::engine::{EngineConfig, InferenceEngine};
//! use tofsight_inference::reference_model;
//! use tofsight_types::Encoding;
//!
//! let asset = reference_model::presence_model(Encoding::Int8).unwrap();
//! let mut engine = InferenceEngine::initialize(&asset, &EngineConfig::default()).unwrap();
//!
//! let input = engine.input_buffer(); // all zeros: empty scene
//! let result = engine.run(&input).unwrap();
//! assert!(result.validity < 0.5);
//! ```

use std::time::{Duration, Instant};

use tofsight_types::{Encoding, InputBuffer};
use tracing::{debug, info};

use crate::arena::DEFAULT_ARENA_BYTES;
use crate::codec::{CodecSink, TensorCodec, codec_for, write_slot};
use crate::error::InferenceError;
use crate::graph::Graph;
use crate::interpreter::Interpreter;
use crate::resolver::OpResolver;

/// Initialisation parameters for [`InferenceEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Size of the compute arena in bytes.
    pub arena_bytes: usize,
    /// Encoding the caller expects. `None` accepts whatever the asset uses.
    pub encoding: Option<Encoding>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            arena_bytes: DEFAULT_ARENA_BYTES,
            encoding: None,
        }
    }
}

/// Result of one forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inference {
    /// Decoded output, clamped to `[0, 1]`.
    pub validity: f32,
    /// Wall time of the forward pass. Informational only.
    pub elapsed: Duration,
}

/// A loaded graph, its arena, and the codec for its slots.
pub struct InferenceEngine {
    interpreter: Interpreter,
    codec: Box<dyn TensorCodec>,
}

impl InferenceEngine {
    /// Load `asset`, register the presence operator set, carve the arena and
    /// cache the input/output slots.
    ///
    /// # Errors
    ///
    /// [`InferenceError::SchemaMismatch`], [`InferenceError::UnsupportedOp`],
    /// [`InferenceError::ArenaExhausted`], [`InferenceError::EncodingMismatch`]
    /// or [`InferenceError::MalformedGraph`]. Any of them leaves the caller
    /// without an engine.
    pub fn initialize(asset: &[u8], config: &EngineConfig) -> Result<Self, InferenceError> {
        let graph = Graph::from_bytes(asset)?;
        let resolver = OpResolver::presence_ops()?;
        let interpreter = Interpreter::new(graph, &resolver, config.arena_bytes)?;
        let codec = codec_for(interpreter.input(), interpreter.output())?;

        if let Some(expected) = config.encoding
            && expected != codec.encoding()
        {
            return Err(InferenceError::EncodingMismatch {
                expected,
                found: codec.encoding(),
            });
        }
        if interpreter.input().element_count() != tofsight_types::PIXEL_COUNT {
            return Err(InferenceError::MalformedGraph(format!(
                "input slot has {} elements, expected {}",
                interpreter.input().element_count(),
                tofsight_types::PIXEL_COUNT
            )));
        }

        info!(
            encoding = %codec.encoding(),
            arena_used = interpreter.arena_used_bytes(),
            arena_capacity = interpreter.arena_capacity(),
            operators = interpreter.graph().operators.len(),
            "inference engine initialized"
        );
        Ok(Self { interpreter, codec })
    }

    pub fn encoding(&self) -> Encoding {
        self.codec.encoding()
    }

    pub fn codec(&self) -> &dyn TensorCodec {
        self.codec.as_ref()
    }

    /// A zeroed input buffer in this engine's encoding.
    pub fn input_buffer(&self) -> InputBuffer {
        InputBuffer::zeroed(self.encoding())
    }

    /// An [`InputSink`][tofsight_types::InputSink] that encodes into
    /// `buffer` with this engine's codec.
    pub fn input_writer<'a>(&'a self, buffer: &'a mut InputBuffer) -> CodecSink<'a> {
        CodecSink::new(self.codec.as_ref(), buffer)
    }

    /// Copy `input` into the input slot, run one forward pass and decode the
    /// validity score.
    ///
    /// # Errors
    ///
    /// [`InferenceError::InferenceFailed`] if `input` uses another encoding
    /// or a kernel reports an error. The engine stays usable.
    pub fn run(&mut self, input: &InputBuffer) -> Result<Inference, InferenceError> {
        if input.encoding() != self.encoding() {
            return Err(InferenceError::InferenceFailed(format!(
                "{} buffer given to a {} engine",
                input.encoding(),
                self.encoding()
            )));
        }
        write_slot(input, self.interpreter.input_bytes_mut()?)?;

        let started = Instant::now();
        self.interpreter.invoke()?;
        let elapsed = started.elapsed();

        let raw = self.codec.decode(self.interpreter.output_bytes()?);
        let validity = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
        debug!(
            inference_us = elapsed.as_micros() as u64,
            validity, "forward pass complete"
        );
        Ok(Inference { validity, elapsed })
    }

    pub fn arena_used_bytes(&self) -> usize {
        self.interpreter.arena_used_bytes()
    }
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("codec", &self.codec)
            .field("arena_used", &self.interpreter.arena_used_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Activation, DType, GraphBuilder, Operator};
    use crate::reference_model::{self, presence_graph};
    use tofsight_types::{InputSink, PIXEL_COUNT};

    fn engine(encoding: Encoding) -> InferenceEngine {
        let asset = reference_model::presence_model(encoding).unwrap();
        InferenceEngine::initialize(&asset, &EngineConfig::default()).unwrap()
    }

    fn column_input(engine: &InferenceEngine, col: usize) -> InputBuffer {
        let mut buffer = engine.input_buffer();
        let mut sink = engine.input_writer(&mut buffer);
        for i in 0..PIXEL_COUNT {
            sink.write(i, if i % 8 == col { 1.0 } else { 0.0 });
        }
        buffer
    }

    #[test]
    fn both_encodings_reject_empty_scene() {
        for encoding in [Encoding::Int8, Encoding::Float32] {
            let mut e = engine(encoding);
            let input = e.input_buffer();
            let out = e.run(&input).unwrap();
            assert!(out.validity < 0.1, "{encoding}: {}", out.validity);
        }
    }

    #[test]
    fn both_encodings_accept_full_column() {
        for encoding in [Encoding::Int8, Encoding::Float32] {
            let mut e = engine(encoding);
            for col in [0, 3, 7] {
                let input = column_input(&e, col);
                let out = e.run(&input).unwrap();
                assert!(out.validity > 0.5, "{encoding} col {col}: {}", out.validity);
                assert!(out.validity <= 1.0);
            }
        }
    }

    #[test]
    fn encodings_agree_within_quantization_error() {
        let mut q = engine(Encoding::Int8);
        let mut f = engine(Encoding::Float32);
        let vq = q.run(&column_input(&q, 3)).unwrap().validity;
        let vf = f.run(&column_input(&f, 3)).unwrap().validity;
        assert!((vq - vf).abs() < 2.0 / 256.0, "int8 {vq} vs float {vf}");
    }

    #[test]
    fn schema_mismatch_is_reported() {
        let asset = presence_graph(Encoding::Int8)
            .unwrap()
            .to_bytes_with_version(crate::graph::GRAPH_SCHEMA_VERSION - 1)
            .unwrap();
        let err = InferenceEngine::initialize(&asset, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, InferenceError::SchemaMismatch { .. }));
    }

    #[test]
    fn undersized_arena_is_exhausted() {
        let asset = reference_model::presence_model(Encoding::Int8).unwrap();
        let config = EngineConfig {
            arena_bytes: 256,
            encoding: None,
        };
        let err = InferenceEngine::initialize(&asset, &config).unwrap_err();
        assert!(matches!(err, InferenceError::ArenaExhausted { capacity: 256, .. }));
    }

    #[test]
    fn unregistered_operator_is_unsupported() {
        let mut b = GraphBuilder::new();
        let x = b.activation("x", &[1, 64], DType::Float32, None);
        let w = b.constant("w", &[2, 64], vec![0.0; 128]);
        let bias = b.constant("b", &[2], vec![0.0; 2]);
        let h = b.activation("h", &[1, 2], DType::Float32, None);
        let y = b.activation("y", &[1, 2], DType::Float32, None);
        b.op(Operator::FullyConnected {
            input: x,
            weights: w,
            bias,
            output: h,
            activation: Activation::None,
        });
        b.op(Operator::Softmax { input: h, output: y });
        let asset = b.build(x, y).unwrap().to_bytes().unwrap();
        let err = InferenceEngine::initialize(&asset, &EngineConfig::default()).unwrap_err();
        assert_eq!(err, InferenceError::UnsupportedOp(crate::graph::OpKind::Softmax));
    }

    #[test]
    fn out_of_range_zero_point_fails_initialisation() {
        let mut graph = presence_graph(Encoding::Int8).unwrap();
        let input = graph.input;
        if let Some(q) = graph.tensors[input].quant.as_mut() {
            q.zero_point = i32::MAX;
        }
        let asset = graph.to_bytes().unwrap();
        let err = InferenceEngine::initialize(&asset, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedGraph(_)), "{err:?}");
    }

    #[test]
    fn overflowing_tensor_shape_fails_initialisation() {
        let mut graph = presence_graph(Encoding::Float32).unwrap();
        graph.tensors.push(crate::graph::Tensor {
            name: "huge".to_string(),
            shape: vec![usize::MAX, 2],
            dtype: DType::Float32,
            quant: None,
            data: None,
        });
        let asset = graph.to_bytes().unwrap();
        let err = InferenceEngine::initialize(&asset, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, InferenceError::MalformedGraph(_)), "{err:?}");
    }

    #[test]
    fn configured_encoding_must_match_asset() {
        let asset = reference_model::presence_model(Encoding::Float32).unwrap();
        let config = EngineConfig {
            encoding: Some(Encoding::Int8),
            ..EngineConfig::default()
        };
        let err = InferenceEngine::initialize(&asset, &config).unwrap_err();
        assert_eq!(
            err,
            InferenceError::EncodingMismatch {
                expected: Encoding::Int8,
                found: Encoding::Float32
            }
        );
    }

    #[test]
    fn wrong_buffer_encoding_fails_only_that_run() {
        let mut e = engine(Encoding::Int8);
        let err = e.run(&InputBuffer::zeroed(Encoding::Float32)).unwrap_err();
        assert!(matches!(err, InferenceError::InferenceFailed(_)));
        assert!(e.run(&e.input_buffer()).is_ok());
    }

    #[test]
    fn reports_arena_usage() {
        let e = engine(Encoding::Int8);
        assert!(e.arena_used_bytes() > 0);
        assert!(e.arena_used_bytes() <= DEFAULT_ARENA_BYTES);
    }
}
