//! Tensor codecs: how normalized energy enters the input slot and how the
//! output slot becomes a validity score.
//!
//! The codec is picked once, from the graph's input slot, when the engine is
//! initialised. Code above the engine only ever sees `[0, 1]` values.

use byteorder::{ByteOrder, LittleEndian};
use tofsight_types::{Encoding, InputBuffer, InputSink, QuantParams};

use crate::error::InferenceError;
use crate::graph::{DType, Tensor};
use crate::kernels::{dequantize_value, quantize_value};

/// Encode-input / decode-output strategy of one engine.
pub trait TensorCodec: Send + Sync + std::fmt::Debug {
    fn encoding(&self) -> Encoding;

    /// Store `norm` at `index` of `buffer`. `buffer` must already use this
    /// codec's encoding; other buffers are left untouched.
    fn encode(&self, norm: f32, index: usize, buffer: &mut InputBuffer);

    /// Decode the first element of the raw output slot.
    fn decode(&self, raw: &[u8]) -> f32;
}

/// int8 with the input and output slots' `(scale, zero_point)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizedCodec {
    pub input: QuantParams,
    pub output: QuantParams,
}

impl QuantizedCodec {
    pub fn quantize(&self, norm: f32) -> i8 {
        quantize_value(norm, self.input)
    }
}

impl TensorCodec for QuantizedCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Int8
    }

    fn encode(&self, norm: f32, index: usize, buffer: &mut InputBuffer) {
        if let InputBuffer::Int8(values) = buffer {
            values[index] = self.quantize(norm);
        }
    }

    fn decode(&self, raw: &[u8]) -> f32 {
        raw.first()
            .map(|&q| dequantize_value(q as i8, self.output))
            .unwrap_or(0.0)
    }
}

/// float32 passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FloatCodec;

impl TensorCodec for FloatCodec {
    fn encoding(&self) -> Encoding {
        Encoding::Float32
    }

    fn encode(&self, norm: f32, index: usize, buffer: &mut InputBuffer) {
        if let InputBuffer::Float32(values) = buffer {
            values[index] = norm;
        }
    }

    fn decode(&self, raw: &[u8]) -> f32 {
        if raw.len() < 4 {
            return 0.0;
        }
        LittleEndian::read_f32(&raw[..4])
    }
}

/// Pick the codec matching the graph's input and output slots.
pub fn codec_for(input: &Tensor, output: &Tensor) -> Result<Box<dyn TensorCodec>, InferenceError> {
    match (input.dtype, output.dtype) {
        (DType::Int8, DType::Int8) => match (input.quant, output.quant) {
            (Some(input), Some(output)) => Ok(Box::new(QuantizedCodec { input, output })),
            _ => Err(InferenceError::MalformedGraph(
                "int8 slots need quantization parameters".to_string(),
            )),
        },
        (DType::Float32, DType::Float32) => Ok(Box::new(FloatCodec)),
        (i, o) => Err(InferenceError::MalformedGraph(format!(
            "input slot is {i:?} but output slot is {o:?}"
        ))),
    }
}

/// Copy an encoded buffer into the engine's raw input slot.
pub fn write_slot(buffer: &InputBuffer, slot: &mut [u8]) -> Result<(), InferenceError> {
    match buffer {
        InputBuffer::Int8(values) => {
            if slot.len() != values.len() {
                return Err(slot_size(slot.len(), values.len()));
            }
            for (byte, &v) in slot.iter_mut().zip(values.iter()) {
                *byte = v as u8;
            }
        }
        InputBuffer::Float32(values) => {
            if slot.len() != values.len() * 4 {
                return Err(slot_size(slot.len(), values.len() * 4));
            }
            LittleEndian::write_f32_into(values, slot);
        }
    }
    Ok(())
}

fn slot_size(slot: usize, needed: usize) -> InferenceError {
    InferenceError::InferenceFailed(format!(
        "input slot holds {slot} bytes, buffer needs {needed}"
    ))
}

/// [`InputSink`] that encodes straight into an [`InputBuffer`].
pub struct CodecSink<'a> {
    codec: &'a dyn TensorCodec,
    buffer: &'a mut InputBuffer,
}

impl<'a> CodecSink<'a> {
    /// Wrap `buffer`, resetting it first if it uses another encoding.
    pub fn new(codec: &'a dyn TensorCodec, buffer: &'a mut InputBuffer) -> Self {
        if buffer.encoding() != codec.encoding() {
            *buffer = InputBuffer::zeroed(codec.encoding());
        }
        Self { codec, buffer }
    }
}

impl InputSink for CodecSink<'_> {
    fn write(&mut self, index: usize, norm: f32) {
        self.codec.encode(norm, index, self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tofsight_types::PIXEL_COUNT;

    const INPUT_PARAMS: QuantParams = QuantParams {
        scale: 1.0 / 255.0,
        zero_point: -128,
    };

    #[test]
    fn quantized_roundtrip_within_one_step() {
        let codec = QuantizedCodec {
            input: INPUT_PARAMS,
            output: INPUT_PARAMS,
        };
        for i in 0..=20 {
            let norm = i as f32 / 20.0;
            let q = codec.quantize(norm);
            let back = codec.decode(&[q as u8]);
            assert!(
                (back - norm).abs() <= INPUT_PARAMS.scale,
                "norm {norm} decoded as {back}"
            );
        }
    }

    #[test]
    fn quantized_encode_clamps_out_of_range() {
        let codec = QuantizedCodec {
            input: INPUT_PARAMS,
            output: INPUT_PARAMS,
        };
        assert_eq!(codec.quantize(1.7), 127);
        assert_eq!(codec.quantize(-0.2), -128);
    }

    #[test]
    fn float_codec_passes_through() {
        let mut buffer = InputBuffer::zeroed(Encoding::Float32);
        FloatCodec.encode(0.375, 9, &mut buffer);
        let InputBuffer::Float32(values) = buffer else {
            panic!("encoding changed");
        };
        assert_eq!(values[9], 0.375);
        assert_eq!(FloatCodec.decode(&0.8f32.to_le_bytes()), 0.8);
    }

    #[test]
    fn sink_resets_mismatched_buffer() {
        let codec = QuantizedCodec {
            input: INPUT_PARAMS,
            output: INPUT_PARAMS,
        };
        let mut buffer = InputBuffer::zeroed(Encoding::Float32);
        let mut sink = CodecSink::new(&codec, &mut buffer);
        sink.write(0, 1.0);
        assert_eq!(buffer.encoding(), Encoding::Int8);
        let InputBuffer::Int8(values) = buffer else {
            panic!("expected int8 buffer");
        };
        assert_eq!(values[0], 127);
    }

    #[test]
    fn write_slot_checks_size() {
        let buffer = InputBuffer::zeroed(Encoding::Float32);
        let mut slot = vec![0u8; PIXEL_COUNT * 4];
        assert!(write_slot(&buffer, &mut slot).is_ok());
        let mut short = vec![0u8; PIXEL_COUNT];
        assert!(write_slot(&buffer, &mut short).is_err());
    }

    #[test]
    fn int8_slot_stores_twos_complement() {
        let mut values = [0i8; PIXEL_COUNT];
        values[0] = -128;
        values[1] = 127;
        let mut slot = vec![0u8; PIXEL_COUNT];
        write_slot(&InputBuffer::Int8(values), &mut slot).unwrap();
        assert_eq!(slot[0], 0x80);
        assert_eq!(slot[1], 0x7f);
    }
}
