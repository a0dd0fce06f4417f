//! Reference kernels.
//!
//! Each kernel reads one activation buffer and writes another, both raw
//! little-endian bytes carved from the arena. Constants are read straight
//! from the graph. No kernel allocates.
//!
//! Tensor shapes have already been checked by [`Graph::validate`], so kernels
//! index without re-checking; they only fail when a value stops being finite.

use byteorder::{ByteOrder, LittleEndian};
use tofsight_types::QuantParams;

use crate::error::InferenceError;
use crate::graph::{Activation, Graph, OpKind, Operator, Padding, Tensor, conv_output_hw};

/// Signature shared by every registered kernel.
pub type KernelFn = fn(&Operator, &Graph, &[u8], &mut [u8]) -> Result<(), InferenceError>;

/// The kernel implementing `kind`, if this runtime ships one.
pub fn kernel_for(kind: OpKind) -> Option<KernelFn> {
    let kernel: KernelFn = match kind {
        OpKind::Conv2D => conv2d,
        OpKind::MaxPool2D => max_pool2d,
        OpKind::FullyConnected => fully_connected,
        OpKind::Reshape => reshape,
        OpKind::Quantize => quantize,
        OpKind::Dequantize => dequantize,
        OpKind::Logistic => logistic,
        OpKind::Softmax => return None,
    };
    Some(kernel)
}

// ────────────────────────────────────────────────────────────────────────────
// Element access
// ────────────────────────────────────────────────────────────────────────────

fn read_f32(buf: &[u8], i: usize) -> f32 {
    LittleEndian::read_f32(&buf[i * 4..i * 4 + 4])
}

fn write_f32(buf: &mut [u8], i: usize, v: f32) {
    LittleEndian::write_f32(&mut buf[i * 4..i * 4 + 4], v);
}

fn constant(graph: &Graph, index: usize) -> &[f32] {
    graph.tensors[index].data.as_deref().unwrap_or(&[])
}

fn dims(t: &Tensor) -> (usize, usize, usize) {
    (t.shape[1], t.shape[2], t.shape[3])
}

fn activate(v: f32, activation: Activation) -> f32 {
    match activation {
        Activation::None => v,
        Activation::Relu => v.max(0.0),
    }
}

fn finite(v: f32, kind: OpKind) -> Result<f32, InferenceError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(InferenceError::InferenceFailed(format!(
            "{kind} produced a non-finite value"
        )))
    }
}

/// `round(x / scale) + zero_point`, clamped to the int8 range.
pub fn quantize_value(x: f32, q: QuantParams) -> i8 {
    let v = ((x / q.scale).round() as i64).saturating_add(i64::from(q.zero_point));
    v.clamp(i64::from(i8::MIN), i64::from(i8::MAX)) as i8
}

/// `(q - zero_point) * scale`.
pub fn dequantize_value(v: i8, q: QuantParams) -> f32 {
    (i64::from(v) - i64::from(q.zero_point)) as f32 * q.scale
}

// ────────────────────────────────────────────────────────────────────────────
// Kernels
// ────────────────────────────────────────────────────────────────────────────

fn conv2d(op: &Operator, graph: &Graph, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
    let Operator::Conv2D {
        input: in_idx,
        filter,
        bias,
        output: out_idx,
        stride,
        padding,
        activation,
    } = *op
    else {
        return Err(wrong_op(op, OpKind::Conv2D));
    };
    let (h, w, c) = dims(&graph.tensors[in_idx]);
    let (oh, ow, oc) = dims(&graph.tensors[out_idx]);
    let filter_t = &graph.tensors[filter];
    let (kh, kw) = (filter_t.shape[1], filter_t.shape[2]);
    let weights = constant(graph, filter);
    let bias = constant(graph, bias);

    let (pad_top, pad_left) = match padding {
        Padding::Valid => (0, 0),
        Padding::Same => {
            let (sh, sw) = conv_output_hw(h, w, kh, kw, stride, padding).unwrap_or((oh, ow));
            let pad_h = ((sh - 1) * stride + kh).saturating_sub(h);
            let pad_w = ((sw - 1) * stride + kw).saturating_sub(w);
            (pad_h / 2, pad_w / 2)
        }
    };

    for oy in 0..oh {
        for ox in 0..ow {
            for o in 0..oc {
                let mut acc = bias[o];
                for ky in 0..kh {
                    let Some(iy) = (oy * stride + ky).checked_sub(pad_top) else {
                        continue;
                    };
                    if iy >= h {
                        continue;
                    }
                    for kx in 0..kw {
                        let Some(ix) = (ox * stride + kx).checked_sub(pad_left) else {
                            continue;
                        };
                        if ix >= w {
                            continue;
                        }
                        for ic in 0..c {
                            let x = read_f32(input, (iy * w + ix) * c + ic);
                            let k = weights[((o * kh + ky) * kw + kx) * c + ic];
                            acc += x * k;
                        }
                    }
                }
                let v = finite(activate(acc, activation), OpKind::Conv2D)?;
                write_f32(output, (oy * ow + ox) * oc + o, v);
            }
        }
    }
    Ok(())
}

fn max_pool2d(op: &Operator, graph: &Graph, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
    let Operator::MaxPool2D {
        input: in_idx,
        output: out_idx,
        filter_h,
        filter_w,
        stride,
    } = *op
    else {
        return Err(wrong_op(op, OpKind::MaxPool2D));
    };
    let (_, w, c) = dims(&graph.tensors[in_idx]);
    let (oh, ow, _) = dims(&graph.tensors[out_idx]);

    for oy in 0..oh {
        for ox in 0..ow {
            for ch in 0..c {
                let mut max = f32::NEG_INFINITY;
                for ky in 0..filter_h {
                    for kx in 0..filter_w {
                        let iy = oy * stride + ky;
                        let ix = ox * stride + kx;
                        max = max.max(read_f32(input, (iy * w + ix) * c + ch));
                    }
                }
                write_f32(output, (oy * ow + ox) * c + ch, finite(max, OpKind::MaxPool2D)?);
            }
        }
    }
    Ok(())
}

fn fully_connected(op: &Operator, graph: &Graph, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
    let Operator::FullyConnected {
        weights,
        bias,
        activation,
        ..
    } = *op
    else {
        return Err(wrong_op(op, OpKind::FullyConnected));
    };
    let shape = &graph.tensors[weights].shape;
    let (out_features, in_features) = (shape[0], shape[1]);
    let weights = constant(graph, weights);
    let bias = constant(graph, bias);

    for o in 0..out_features {
        let row = &weights[o * in_features..(o + 1) * in_features];
        let acc = row
            .iter()
            .enumerate()
            .fold(bias[o], |acc, (i, &k)| acc + k * read_f32(input, i));
        write_f32(output, o, finite(activate(acc, activation), OpKind::FullyConnected)?);
    }
    Ok(())
}

fn reshape(_op: &Operator, _graph: &Graph, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
    output.copy_from_slice(input);
    Ok(())
}

fn quantize(op: &Operator, graph: &Graph, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
    let params = quant_of(&graph.tensors[op.output()], OpKind::Quantize)?;
    for (i, byte) in output.iter_mut().enumerate() {
        let x = finite(read_f32(input, i), OpKind::Quantize)?;
        *byte = quantize_value(x, params) as u8;
    }
    Ok(())
}

fn dequantize(op: &Operator, graph: &Graph, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
    let params = quant_of(&graph.tensors[op.input()], OpKind::Dequantize)?;
    for (i, &byte) in input.iter().enumerate() {
        write_f32(output, i, dequantize_value(byte as i8, params));
    }
    Ok(())
}

fn logistic(_op: &Operator, _graph: &Graph, input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
    for i in 0..input.len() / 4 {
        let x = finite(read_f32(input, i), OpKind::Logistic)?;
        write_f32(output, i, 1.0 / (1.0 + (-x).exp()));
    }
    Ok(())
}

fn quant_of(t: &Tensor, kind: OpKind) -> Result<QuantParams, InferenceError> {
    t.quant.ok_or_else(|| {
        InferenceError::InferenceFailed(format!("{kind} tensor '{}' has no quantization", t.name))
    })
}

fn wrong_op(op: &Operator, expected: OpKind) -> InferenceError {
    InferenceError::InferenceFailed(format!(
        "{} dispatched to the {expected} kernel",
        op.kind()
    ))
}
