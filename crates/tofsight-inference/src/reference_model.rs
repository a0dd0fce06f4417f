//! The bundled presence graph.
//!
//! A deliberately small network: a 3×3 box blur spreads each lit zone over
//! its neighbours, a 2×2 max pool keeps the strongest response per quadrant
//! cell, and a single logistic unit turns the pooled energy into a validity
//! score. A full-height column lights eight pooled cells and scores well
//! above 0.5; an empty scene scores under 0.02.
//!
//! The int8 variant runs the same float chain between a Dequantize and a
//! Quantize, so both encodings agree to within one output step.

use tofsight_types::{Encoding, GRID_SIDE, QuantParams};

use crate::error::InferenceError;
use crate::graph::{Activation, DType, Graph, GraphBuilder, Operator, Padding};

/// Input slot parameters of the int8 variant: `[0, 1]` onto the full range.
pub const INPUT_QUANT: QuantParams = QuantParams {
    scale: 1.0 / 255.0,
    zero_point: -128,
};

/// Output slot parameters of the int8 variant.
pub const OUTPUT_QUANT: QuantParams = QuantParams {
    scale: 1.0 / 256.0,
    zero_point: -128,
};

const POOLED_SIDE: usize = GRID_SIDE / 2;
const POOLED_CELLS: usize = POOLED_SIDE * POOLED_SIDE;
const FC_WEIGHT: f32 = 4.0;
const FC_BIAS: f32 = -4.0;

/// Build the presence graph for `encoding`.
pub fn presence_graph(encoding: Encoding) -> Result<Graph, InferenceError> {
    let side = GRID_SIDE;
    let mut b = GraphBuilder::new();

    let (input, frame) = match encoding {
        Encoding::Float32 => {
            let input = b.activation("depth_energy", &[1, side, side], DType::Float32, None);
            (input, input)
        }
        Encoding::Int8 => {
            let input = b.activation("depth_energy", &[1, side, side], DType::Int8, Some(INPUT_QUANT));
            let frame = b.activation("depth_energy_f32", &[1, side, side], DType::Float32, None);
            b.op(Operator::Dequantize { input, output: frame });
            (input, frame)
        }
    };

    let image = b.activation("image", &[1, side, side, 1], DType::Float32, None);
    let blur_filter = b.constant("blur/filter", &[1, 3, 3, 1], vec![1.0 / 9.0; 9]);
    let blur_bias = b.constant("blur/bias", &[1], vec![0.0]);
    let blurred = b.activation("blur", &[1, side, side, 1], DType::Float32, None);
    let pooled = b.activation("pool", &[1, POOLED_SIDE, POOLED_SIDE, 1], DType::Float32, None);
    let flat = b.activation("flatten", &[1, POOLED_CELLS], DType::Float32, None);
    let fc_weights = b.constant("presence/weights", &[1, POOLED_CELLS], vec![FC_WEIGHT; POOLED_CELLS]);
    let fc_bias = b.constant("presence/bias", &[1], vec![FC_BIAS]);
    let logit = b.activation("presence/logit", &[1, 1], DType::Float32, None);
    let score = b.activation("validity", &[1, 1], DType::Float32, None);

    b.op(Operator::Reshape {
        input: frame,
        output: image,
    })
    .op(Operator::Conv2D {
        input: image,
        filter: blur_filter,
        bias: blur_bias,
        output: blurred,
        stride: 1,
        padding: Padding::Same,
        activation: Activation::Relu,
    })
    .op(Operator::MaxPool2D {
        input: blurred,
        output: pooled,
        filter_h: 2,
        filter_w: 2,
        stride: 2,
    })
    .op(Operator::Reshape {
        input: pooled,
        output: flat,
    })
    .op(Operator::FullyConnected {
        input: flat,
        weights: fc_weights,
        bias: fc_bias,
        output: logit,
        activation: Activation::None,
    })
    .op(Operator::Logistic {
        input: logit,
        output: score,
    });

    let output = match encoding {
        Encoding::Float32 => score,
        Encoding::Int8 => {
            let output = b.activation("validity_q", &[1, 1], DType::Int8, Some(OUTPUT_QUANT));
            b.op(Operator::Quantize {
                input: score,
                output,
            });
            output
        }
    };

    b.build(input, output)
}

/// Serialized asset bytes of [`presence_graph`].
pub fn presence_model(encoding: Encoding) -> Result<Vec<u8>, InferenceError> {
    presence_graph(encoding)?.to_bytes()
}
