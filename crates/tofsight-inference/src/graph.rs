//! Compiled graph asset format.
//!
//! # Binary layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     Magic b"TOFG"
//! 4       4     Format version (u32, little-endian)
//! 8       N     bincode-encoded `Graph` body
//! ```
//!
//! The version tag is checked before the body is decoded, so an asset built
//! for a different runtime fails with
//! [`InferenceError::SchemaMismatch`] instead of a decode error.
//!
//! Tensors are NHWC with an implicit batch of 1. Constant tensors (weights,
//! biases) carry their data as `f32`; every other tensor is an activation and
//! lives in the compute arena.

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use tofsight_types::{Encoding, QuantParams};

use crate::error::InferenceError;

/// Asset magic.
pub const GRAPH_MAGIC: [u8; 4] = *b"TOFG";

/// Format version this runtime understands.
pub const GRAPH_SCHEMA_VERSION: u32 = 3;

const HEADER_LEN: usize = 8;

// ────────────────────────────────────────────────────────────────────────────
// Tensors
// ────────────────────────────────────────────────────────────────────────────

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    Int8,
    Float32,
}

impl DType {
    /// Bytes per element.
    pub fn size(self) -> usize {
        match self {
            DType::Int8 => 1,
            DType::Float32 => 4,
        }
    }

    pub fn encoding(self) -> Encoding {
        match self {
            DType::Int8 => Encoding::Int8,
            DType::Float32 => Encoding::Float32,
        }
    }
}

/// A tensor descriptor, optionally carrying constant data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: DType,
    /// Present on int8 tensors.
    pub quant: Option<QuantParams>,
    /// Constant payload; `None` for activations.
    pub data: Option<Vec<f32>>,
}

impl Tensor {
    /// Product of the shape, saturating at `usize::MAX`.
    pub fn element_count(&self) -> usize {
        self.shape.iter().fold(1, |acc: usize, &d| acc.saturating_mul(d))
    }

    /// Size in bytes, saturating at `usize::MAX`.
    pub fn byte_len(&self) -> usize {
        self.element_count().saturating_mul(self.dtype.size())
    }

    /// Size in bytes, or `None` if the shape does not fit in `usize`.
    pub fn checked_byte_len(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(self.dtype.size(), |acc, &d| acc.checked_mul(d))
    }

    pub fn is_constant(&self) -> bool {
        self.data.is_some()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Operators
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Padding {
    /// Zero-pad so the output spatial size is `ceil(input / stride)`.
    Same,
    Valid,
}

/// Activation fused into the producing operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    None,
    Relu,
}

/// Operator kinds the asset format can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Conv2D,
    MaxPool2D,
    FullyConnected,
    Reshape,
    Quantize,
    Dequantize,
    Logistic,
    Softmax,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OpKind::Conv2D => "CONV_2D",
            OpKind::MaxPool2D => "MAX_POOL_2D",
            OpKind::FullyConnected => "FULLY_CONNECTED",
            OpKind::Reshape => "RESHAPE",
            OpKind::Quantize => "QUANTIZE",
            OpKind::Dequantize => "DEQUANTIZE",
            OpKind::Logistic => "LOGISTIC",
            OpKind::Softmax => "SOFTMAX",
        };
        write!(f, "{name}")
    }
}

/// One node of the graph. Indices refer to [`Graph::tensors`].
///
/// Every operator reads exactly one activation tensor and writes exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operator {
    Conv2D {
        input: usize,
        /// `[out_channels, kh, kw, in_channels]`
        filter: usize,
        /// `[out_channels]`
        bias: usize,
        output: usize,
        stride: usize,
        padding: Padding,
        activation: Activation,
    },
    MaxPool2D {
        input: usize,
        output: usize,
        filter_h: usize,
        filter_w: usize,
        stride: usize,
    },
    FullyConnected {
        input: usize,
        /// `[out_features, in_features]`
        weights: usize,
        /// `[out_features]`
        bias: usize,
        output: usize,
        activation: Activation,
    },
    Reshape { input: usize, output: usize },
    Quantize { input: usize, output: usize },
    Dequantize { input: usize, output: usize },
    Logistic { input: usize, output: usize },
    Softmax { input: usize, output: usize },
}

impl Operator {
    pub fn kind(&self) -> OpKind {
        match self {
            Operator::Conv2D { .. } => OpKind::Conv2D,
            Operator::MaxPool2D { .. } => OpKind::MaxPool2D,
            Operator::FullyConnected { .. } => OpKind::FullyConnected,
            Operator::Reshape { .. } => OpKind::Reshape,
            Operator::Quantize { .. } => OpKind::Quantize,
            Operator::Dequantize { .. } => OpKind::Dequantize,
            Operator::Logistic { .. } => OpKind::Logistic,
            Operator::Softmax { .. } => OpKind::Softmax,
        }
    }

    /// The activation tensor this operator reads.
    pub fn input(&self) -> usize {
        match *self {
            Operator::Conv2D { input, .. }
            | Operator::MaxPool2D { input, .. }
            | Operator::FullyConnected { input, .. }
            | Operator::Reshape { input, .. }
            | Operator::Quantize { input, .. }
            | Operator::Dequantize { input, .. }
            | Operator::Logistic { input, .. }
            | Operator::Softmax { input, .. } => input,
        }
    }

    /// The activation tensor this operator writes.
    pub fn output(&self) -> usize {
        match *self {
            Operator::Conv2D { output, .. }
            | Operator::MaxPool2D { output, .. }
            | Operator::FullyConnected { output, .. }
            | Operator::Reshape { output, .. }
            | Operator::Quantize { output, .. }
            | Operator::Dequantize { output, .. }
            | Operator::Logistic { output, .. }
            | Operator::Softmax { output, .. } => output,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Graph
// ────────────────────────────────────────────────────────────────────────────

/// A compiled, single-input single-output graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub tensors: Vec<Tensor>,
    /// Execution order.
    pub operators: Vec<Operator>,
    pub input: usize,
    pub output: usize,
}

impl Graph {
    /// Read only the format-version tag of an asset.
    pub fn schema_version(bytes: &[u8]) -> Result<u32, InferenceError> {
        if bytes.len() < HEADER_LEN {
            return Err(InferenceError::MalformedGraph(format!(
                "asset is {} bytes, header needs {HEADER_LEN}",
                bytes.len()
            )));
        }
        if bytes[..4] != GRAPH_MAGIC {
            return Err(InferenceError::MalformedGraph(
                "missing TOFG magic".to_string(),
            ));
        }
        let mut cursor = Cursor::new(&bytes[4..HEADER_LEN]);
        cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| InferenceError::MalformedGraph(format!("version tag: {e}")))
    }

    /// Decode an asset, rejecting any format version other than
    /// [`GRAPH_SCHEMA_VERSION`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InferenceError> {
        let found = Self::schema_version(bytes)?;
        if found != GRAPH_SCHEMA_VERSION {
            return Err(InferenceError::SchemaMismatch {
                expected: GRAPH_SCHEMA_VERSION,
                found,
            });
        }
        bincode::deserialize(&bytes[HEADER_LEN..])
            .map_err(|e| InferenceError::MalformedGraph(format!("graph body: {e}")))
    }

    /// Encode with the current format version.
    pub fn to_bytes(&self) -> Result<Vec<u8>, InferenceError> {
        self.to_bytes_with_version(GRAPH_SCHEMA_VERSION)
    }

    /// Encode with an explicit version tag.
    pub fn to_bytes_with_version(&self, version: u32) -> Result<Vec<u8>, InferenceError> {
        let body = bincode::serialize(self)
            .map_err(|e| InferenceError::MalformedGraph(format!("graph body: {e}")))?;
        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&GRAPH_MAGIC);
        out.write_u32::<LittleEndian>(version)
            .map_err(|e| InferenceError::MalformedGraph(format!("version tag: {e}")))?;
        out.extend_from_slice(&body);
        Ok(out)
    }

    pub fn input_tensor(&self) -> &Tensor {
        &self.tensors[self.input]
    }

    pub fn output_tensor(&self) -> &Tensor {
        &self.tensors[self.output]
    }

    /// Check indices, dtypes and shapes of every operator.
    pub fn validate(&self) -> Result<(), InferenceError> {
        self.activation(self.input, "graph input")?;
        self.activation(self.output, "graph output")?;
        if self.input == self.output {
            return Err(malformed("graph input and output are the same tensor"));
        }
        for (i, t) in self.tensors.iter().enumerate() {
            if t.shape.is_empty() || t.element_count() == 0 {
                return Err(malformed(format!("tensor {i} '{}' has an empty shape", t.name)));
            }
            if t.checked_byte_len().is_none() {
                return Err(malformed(format!(
                    "tensor {i} '{}' shape {:?} overflows",
                    t.name, t.shape
                )));
            }
            if let Some(data) = &t.data
                && data.len() != t.element_count()
            {
                return Err(malformed(format!(
                    "constant '{}' holds {} values for shape {:?}",
                    t.name,
                    data.len(),
                    t.shape
                )));
            }
            if t.dtype == DType::Int8 && !t.is_constant() {
                match t.quant {
                    Some(q)
                        if q.scale > 0.0
                            && q.scale.is_finite()
                            && (i32::from(i8::MIN)..=i32::from(i8::MAX)).contains(&q.zero_point) => {}
                    _ => {
                        return Err(malformed(format!(
                            "int8 tensor '{}' needs a positive scale and an int8 zero point",
                            t.name
                        )));
                    }
                }
            }
        }
        for op in &self.operators {
            self.validate_op(op)?;
        }
        Ok(())
    }

    fn validate_op(&self, op: &Operator) -> Result<(), InferenceError> {
        let kind = op.kind();
        let input = self.activation(op.input(), "operator input")?;
        let output = self.activation(op.output(), "operator output")?;
        if op.input() == op.output() {
            return Err(malformed(format!("{kind} reads and writes the same tensor")));
        }

        match *op {
            Operator::Conv2D {
                filter,
                bias,
                stride,
                padding,
                ..
            } => {
                let [h, w, c] = nhwc(input, kind)?;
                let filter = self.constant(filter, kind)?;
                let bias = self.constant(bias, kind)?;
                let &[oc, kh, kw, fc] = filter.shape.as_slice() else {
                    return Err(malformed(format!("{kind} filter must be 4-D")));
                };
                if fc != c || bias.element_count() != oc || stride == 0 || kh == 0 || kw == 0 {
                    return Err(malformed(format!("{kind} filter/bias/stride mismatch")));
                }
                let (oh, ow) = conv_output_hw(h, w, kh, kw, stride, padding)
                    .ok_or_else(|| malformed(format!("{kind} kernel larger than input")))?;
                expect_shape(output, &[1, oh, ow, oc], kind)?;
                expect_dtypes(input, output, DType::Float32, DType::Float32, kind)
            }
            Operator::MaxPool2D {
                filter_h,
                filter_w,
                stride,
                ..
            } => {
                let [h, w, c] = nhwc(input, kind)?;
                if stride == 0 || filter_h == 0 || filter_w == 0 || filter_h > h || filter_w > w {
                    return Err(malformed(format!("{kind} window does not fit input")));
                }
                let oh = (h - filter_h) / stride + 1;
                let ow = (w - filter_w) / stride + 1;
                expect_shape(output, &[1, oh, ow, c], kind)?;
                expect_dtypes(input, output, DType::Float32, DType::Float32, kind)
            }
            Operator::FullyConnected { weights, bias, .. } => {
                let weights = self.constant(weights, kind)?;
                let bias = self.constant(bias, kind)?;
                let &[out_features, in_features] = weights.shape.as_slice() else {
                    return Err(malformed(format!("{kind} weights must be 2-D")));
                };
                if in_features != input.element_count()
                    || out_features != output.element_count()
                    || bias.element_count() != out_features
                {
                    return Err(malformed(format!("{kind} weights/bias mismatch")));
                }
                expect_dtypes(input, output, DType::Float32, DType::Float32, kind)
            }
            Operator::Reshape { .. } => {
                if input.element_count() != output.element_count() || input.dtype != output.dtype {
                    return Err(malformed(format!("{kind} changes element count or dtype")));
                }
                Ok(())
            }
            Operator::Quantize { .. } => {
                same_count(input, output, kind)?;
                expect_dtypes(input, output, DType::Float32, DType::Int8, kind)
            }
            Operator::Dequantize { .. } => {
                same_count(input, output, kind)?;
                expect_dtypes(input, output, DType::Int8, DType::Float32, kind)
            }
            Operator::Logistic { .. } | Operator::Softmax { .. } => {
                if input.shape != output.shape {
                    return Err(malformed(format!("{kind} changes shape")));
                }
                expect_dtypes(input, output, DType::Float32, DType::Float32, kind)
            }
        }
    }

    fn tensor(&self, index: usize, role: &str) -> Result<&Tensor, InferenceError> {
        self.tensors
            .get(index)
            .ok_or_else(|| malformed(format!("{role} refers to missing tensor {index}")))
    }

    fn activation(&self, index: usize, role: &str) -> Result<&Tensor, InferenceError> {
        let t = self.tensor(index, role)?;
        if t.is_constant() {
            return Err(malformed(format!("{role} '{}' must not be constant", t.name)));
        }
        Ok(t)
    }

    fn constant(&self, index: usize, kind: OpKind) -> Result<&Tensor, InferenceError> {
        let t = self.tensor(index, "operator parameter")?;
        if !t.is_constant() || t.dtype != DType::Float32 {
            return Err(malformed(format!(
                "{kind} parameter '{}' must be a float32 constant",
                t.name
            )));
        }
        Ok(t)
    }
}

/// Output `(height, width)` of a convolution, `None` if the kernel does not
/// fit under `Valid` padding.
pub fn conv_output_hw(
    h: usize,
    w: usize,
    kh: usize,
    kw: usize,
    stride: usize,
    padding: Padding,
) -> Option<(usize, usize)> {
    match padding {
        Padding::Same => Some((h.div_ceil(stride), w.div_ceil(stride))),
        Padding::Valid => {
            if kh > h || kw > w {
                return None;
            }
            Some(((h - kh) / stride + 1, (w - kw) / stride + 1))
        }
    }
}

fn malformed(msg: impl Into<String>) -> InferenceError {
    InferenceError::MalformedGraph(msg.into())
}

fn nhwc(t: &Tensor, kind: OpKind) -> Result<[usize; 3], InferenceError> {
    match t.shape.as_slice() {
        &[1, h, w, c] => Ok([h, w, c]),
        other => Err(malformed(format!(
            "{kind} expects a [1, H, W, C] input, got {other:?}"
        ))),
    }
}

fn expect_shape(t: &Tensor, shape: &[usize], kind: OpKind) -> Result<(), InferenceError> {
    if t.shape != shape {
        return Err(malformed(format!(
            "{kind} output '{}' has shape {:?}, expected {shape:?}",
            t.name, t.shape
        )));
    }
    Ok(())
}

fn same_count(input: &Tensor, output: &Tensor, kind: OpKind) -> Result<(), InferenceError> {
    if input.element_count() != output.element_count() {
        return Err(malformed(format!("{kind} changes element count")));
    }
    Ok(())
}

fn expect_dtypes(
    input: &Tensor,
    output: &Tensor,
    want_in: DType,
    want_out: DType,
    kind: OpKind,
) -> Result<(), InferenceError> {
    if input.dtype != want_in || output.dtype != want_out {
        return Err(malformed(format!(
            "{kind} expects {want_in:?} -> {want_out:?}, got {:?} -> {:?}",
            input.dtype, output.dtype
        )));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Incremental graph construction.
///
/// # Example
///
/// ```rust
/// use tofsight_inference::graph::{DType, GraphBuilder, Operator};
///
/// let mut b = GraphBuilder::new();
/// let x = b.activation("x", &[1, 4], DType::Float32, None);
/// let y = b.activation("y", &[1, 4], DType::Float32, None);
/// b.op(Operator::Logistic { input: x, output: y });
/// let graph = b.build(x, y).unwrap();
/// assert_eq!(graph.operators.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct GraphBuilder {
    tensors: Vec<Tensor>,
    operators: Vec<Operator>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an activation tensor and return its index.
    pub fn activation(
        &mut self,
        name: &str,
        shape: &[usize],
        dtype: DType,
        quant: Option<QuantParams>,
    ) -> usize {
        self.push(Tensor {
            name: name.to_string(),
            shape: shape.to_vec(),
            dtype,
            quant,
            data: None,
        })
    }

    /// Add a float32 constant and return its index.
    pub fn constant(&mut self, name: &str, shape: &[usize], data: Vec<f32>) -> usize {
        self.push(Tensor {
            name: name.to_string(),
            shape: shape.to_vec(),
            dtype: DType::Float32,
            quant: None,
            data: Some(data),
        })
    }

    pub fn op(&mut self, op: Operator) -> &mut Self {
        self.operators.push(op);
        self
    }

    /// Finish the graph and validate it.
    pub fn build(self, input: usize, output: usize) -> Result<Graph, InferenceError> {
        let graph = Graph {
            tensors: self.tensors,
            operators: self.operators,
            input,
            output,
        };
        graph.validate()?;
        Ok(graph)
    }

    fn push(&mut self, t: Tensor) -> usize {
        self.tensors.push(t);
        self.tensors.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logistic_graph() -> Graph {
        let mut b = GraphBuilder::new();
        let x = b.activation("x", &[1, 4], DType::Float32, None);
        let y = b.activation("y", &[1, 4], DType::Float32, None);
        b.op(Operator::Logistic { input: x, output: y });
        b.build(x, y).unwrap()
    }

    #[test]
    fn asset_roundtrip() {
        let graph = logistic_graph();
        let bytes = graph.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"TOFG");
        assert_eq!(Graph::schema_version(&bytes).unwrap(), GRAPH_SCHEMA_VERSION);
        assert_eq!(Graph::from_bytes(&bytes).unwrap(), graph);
    }

    #[test]
    fn version_tag_is_little_endian() {
        let bytes = logistic_graph().to_bytes_with_version(0x0102_0304).unwrap();
        assert_eq!(&bytes[4..8], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn other_version_is_schema_mismatch() {
        let bytes = logistic_graph()
            .to_bytes_with_version(GRAPH_SCHEMA_VERSION + 1)
            .unwrap();
        assert_eq!(
            Graph::from_bytes(&bytes).unwrap_err(),
            InferenceError::SchemaMismatch {
                expected: GRAPH_SCHEMA_VERSION,
                found: GRAPH_SCHEMA_VERSION + 1,
            }
        );
    }

    #[test]
    fn bad_magic_and_truncation_are_malformed() {
        let mut bytes = logistic_graph().to_bytes().unwrap();
        assert!(matches!(
            Graph::from_bytes(&bytes[..6]),
            Err(InferenceError::MalformedGraph(_))
        ));
        bytes[0] = b'X';
        assert!(matches!(
            Graph::from_bytes(&bytes),
            Err(InferenceError::MalformedGraph(_))
        ));
    }

    #[test]
    fn truncated_body_is_malformed() {
        let bytes = logistic_graph().to_bytes().unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(
            Graph::from_bytes(cut),
            Err(InferenceError::MalformedGraph(_))
        ));
    }

    #[test]
    fn same_conv_output_rounds_up() {
        assert_eq!(conv_output_hw(8, 8, 3, 3, 1, Padding::Same), Some((8, 8)));
        assert_eq!(conv_output_hw(7, 7, 3, 3, 2, Padding::Same), Some((4, 4)));
        assert_eq!(conv_output_hw(8, 8, 3, 3, 1, Padding::Valid), Some((6, 6)));
        assert_eq!(conv_output_hw(2, 2, 3, 3, 1, Padding::Valid), None);
    }

    #[test]
    fn conv_with_wrong_output_shape_is_rejected() {
        let mut b = GraphBuilder::new();
        let x = b.activation("x", &[1, 8, 8, 1], DType::Float32, None);
        let f = b.constant("f", &[1, 3, 3, 1], vec![0.0; 9]);
        let bias = b.constant("b", &[1], vec![0.0]);
        let y = b.activation("y", &[1, 6, 6, 1], DType::Float32, None);
        b.op(Operator::Conv2D {
            input: x,
            filter: f,
            bias,
            output: y,
            stride: 1,
            padding: Padding::Same,
            activation: Activation::None,
        });
        assert!(matches!(b.build(x, y), Err(InferenceError::MalformedGraph(_))));
    }

    #[test]
    fn int8_activation_requires_quant_params() {
        let mut b = GraphBuilder::new();
        let x = b.activation("x", &[1, 4], DType::Int8, None);
        let y = b.activation("y", &[1, 4], DType::Float32, None);
        b.op(Operator::Dequantize { input: x, output: y });
        assert!(matches!(b.build(x, y), Err(InferenceError::MalformedGraph(_))));
    }

    #[test]
    fn int8_zero_point_must_fit_int8() {
        for zero_point in [i32::MAX, 128, -129, i32::MIN] {
            let mut b = GraphBuilder::new();
            let q = QuantParams {
                scale: 1.0 / 255.0,
                zero_point,
            };
            let x = b.activation("x", &[1, 4], DType::Int8, Some(q));
            let y = b.activation("y", &[1, 4], DType::Float32, None);
            b.op(Operator::Dequantize { input: x, output: y });
            assert!(
                matches!(b.build(x, y), Err(InferenceError::MalformedGraph(_))),
                "zero point {zero_point} accepted"
            );
        }
    }

    #[test]
    fn overflowing_shape_is_malformed() {
        let mut graph = logistic_graph();
        graph.tensors.push(Tensor {
            name: "huge".to_string(),
            shape: vec![usize::MAX, 2],
            dtype: DType::Float32,
            quant: None,
            data: None,
        });
        assert!(matches!(graph.validate(), Err(InferenceError::MalformedGraph(_))));
        assert_eq!(graph.tensors[2].element_count(), usize::MAX);
        assert_eq!(graph.tensors[2].checked_byte_len(), None);
    }

    #[test]
    fn constant_length_must_match_shape() {
        let mut b = GraphBuilder::new();
        let x = b.activation("x", &[1, 2], DType::Float32, None);
        let w = b.constant("w", &[1, 2], vec![1.0]);
        let bias = b.constant("b", &[1], vec![0.0]);
        let y = b.activation("y", &[1, 1], DType::Float32, None);
        b.op(Operator::FullyConnected {
            input: x,
            weights: w,
            bias,
            output: y,
            activation: Activation::None,
        });
        assert!(matches!(b.build(x, y), Err(InferenceError::MalformedGraph(_))));
    }

    #[test]
    fn op_kind_display_uses_builtin_names() {
        assert_eq!(OpKind::FullyConnected.to_string(), "FULLY_CONNECTED");
        assert_eq!(OpKind::MaxPool2D.to_string(), "MAX_POOL_2D");
    }
}
