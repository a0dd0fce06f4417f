//! `tofsight-inference` – fixed-budget neural network runtime.
//!
//! Runs a small pre-compiled classification graph over the 64-zone input
//! buffer and reports a single validity score. All working memory comes from
//! one compute arena sized at initialisation; nothing is allocated per frame.
//!
//! # Modules
//!
//! - [`graph`] – [`Graph`][graph::Graph]: the compiled graph asset format
//!   (magic, format-version tag, `bincode` body) and its validation rules.
//! - [`resolver`] – [`OpResolver`][resolver::OpResolver]: the fixed-capacity
//!   table of registered operator kernels.
//! - [`arena`] – [`Arena`][arena::Arena]: the single byte buffer every
//!   activation tensor is carved from.
//! - [`kernels`] – reference NHWC kernels (Conv2D, pooling, fully-connected,
//!   reshape, quantize/dequantize, logistic, softmax).
//! - [`interpreter`] – [`Interpreter`][interpreter::Interpreter]: plans the
//!   arena, resolves kernels and executes forward passes.
//! - [`codec`] – [`TensorCodec`][codec::TensorCodec]: the int8 and float32
//!   encodings of the input and output slots.
//! - [`engine`] – [`InferenceEngine`][engine::InferenceEngine]: the
//!   `initialize` / `run` surface used by the pipeline.
//! - [`reference_model`] – builder for the bundled presence graph in both
//!   encodings.

pub mod arena;
pub mod codec;
pub mod engine;
pub mod error;
pub mod graph;
pub mod interpreter;
pub mod kernels;
pub mod reference_model;
pub mod resolver;

pub use arena::{Arena, DEFAULT_ARENA_BYTES};
pub use codec::{CodecSink, FloatCodec, QuantizedCodec, TensorCodec};
pub use engine::{EngineConfig, Inference, InferenceEngine};
pub use error::InferenceError;
pub use graph::{GRAPH_SCHEMA_VERSION, Graph, GraphBuilder, OpKind, Operator};
pub use interpreter::Interpreter;
pub use resolver::OpResolver;
