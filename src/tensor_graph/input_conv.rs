use std::fmt::{Display, Formatter, Result as FmtResult};

use tracing::debug;

use crate::{
    initialiser::generate_weights,
    instruction,
    tensor::{NumericPrecision, Tensor, TensorDesc, TensorShape},
    tensor_graph::TensorGraph,
    utils::error::HarnessError,
};

pub const OUT_CHANNELS: usize = 4;
pub const KERNEL_SHAPE: [usize; 2] = [1, 9];
pub const CONV_STRIDES: [usize; 2] = [1, 1];
pub const CONV_DILATIONS: [usize; 2] = [1, 1];
pub const CONV_PADS: [usize; 4] = [0, 0, 0, 0];
pub const RESHAPE_TARGET: [i64; 2] = [1, (OUT_CHANNELS * 8) as i64];
pub const PERMUTE_ORDER: [usize; 4] = [0, 3, 1, 2];

/// What sits between the convolution and the final reshape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PostConvTransform {
    /// Conv output flattened directly.
    #[default]
    Reshape,
    /// Conv output permuted NCHW -> NWCH before flattening. Changes element order of
    /// the result; the expected values come from the reference evaluator.
    PermuteThenReshape,
}

impl PostConvTransform {
    pub fn all() -> Vec<PostConvTransform> {
        vec![
            PostConvTransform::Reshape,
            PostConvTransform::PermuteThenReshape,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PostConvTransform::Reshape => "reshape",
            PostConvTransform::PermuteThenReshape => "permute",
        }
    }
}

impl Display for PostConvTransform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

/// N×W, N×C×W and N×C×H×W inputs all become N×C×H×W.
pub fn lift_to_nchw(shape: &TensorShape) -> Result<[usize; 4], HarnessError> {
    match *shape.dims() {
        [n, w] => Ok([n, 1, 1, w]),
        [n, c, w] => Ok([n, c, 1, w]),
        [n, c, h, w] => Ok([n, c, h, w]),
        _ => Err(HarnessError::GraphConstruction(format!(
            "Input shape {:?} must have rank 2, 3 or 4",
            shape.dims()
        ))),
    }
}

/// Lift `shape` to N×C×H×W and check the kernel fits and the convolution output
/// matches the reshape target, with every count computed without overflow.
pub fn check_input_shape(shape: &TensorShape) -> Result<[usize; 4], HarnessError> {
    let [n, c, h, w] = lift_to_nchw(shape)?;
    let [kh, kw] = KERNEL_SHAPE;

    if h < kh || w < kw {
        return Err(HarnessError::GraphConstruction(format!(
            "Input {} is smaller than the {}x{} kernel, VALID convolution output would be empty",
            shape, kh, kw
        )));
    }

    let reshape_elements: i64 = RESHAPE_TARGET.iter().product();
    let conv_elements = [n, OUT_CHANNELS, h - kh + 1, w - kw + 1]
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d));
    match conv_elements {
        Some(count) if count as i64 == reshape_elements => Ok([n, c, h, w]),
        Some(count) => Err(HarnessError::GraphConstruction(format!(
            "Convolution of {} yields {} elements, reshape target {:?} needs {}",
            shape, count, RESHAPE_TARGET, reshape_elements
        ))),
        None => Err(HarnessError::GraphConstruction(format!(
            "Convolution of {} yields more elements than fit in usize, reshape target {:?} needs {}",
            shape, RESHAPE_TARGET, reshape_elements
        ))),
    }
}

/// First-tap weights for every output channel over `in_channels` input channels.
pub fn default_weights(in_channels: usize) -> Vec<f32> {
    generate_weights(OUT_CHANNELS, in_channels * KERNEL_SHAPE[0] * KERNEL_SHAPE[1])
}

/// Builds input -> Convolution(1x9, VALID, 4 channels) -> [Transpose] -> Reshape(1x32) -> output.
///
/// Every shape problem is reported here as a graph construction error, before any
/// backend is involved.
pub fn build_input_conv_graph(
    precision: NumericPrecision,
    input_shape: &TensorShape,
    weights: &[f32],
    transform: PostConvTransform,
) -> Result<TensorGraph, HarnessError> {
    let [n, c, h, w] = check_input_shape(input_shape)?;
    let [kh, kw] = KERNEL_SHAPE;

    let weight_count = [OUT_CHANNELS, c, kh, kw]
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d));
    if weight_count != Some(weights.len()) {
        return Err(HarnessError::GraphConstruction(format!(
            "Expected {:?} weights for {} input channels, got {}",
            weight_count,
            c,
            weights.len()
        )));
    }

    let mut graph = TensorGraph::new(format!("input_conv_{}", transform.name()));

    let input = graph.add_input(TensorDesc::new(input_shape.clone(), precision));

    let weight_values: Vec<f64> = weights.iter().map(|&v| f64::from(v)).collect();
    let weight_desc = TensorDesc::from_dims(vec![OUT_CHANNELS, c, kh, kw], precision)?;
    let weights_id = graph.add_constant(Tensor::from_values(weight_desc, &weight_values)?);

    let src_view = (input_shape.ndim() != 4).then(|| vec![n, c, h, w]);
    let conv_out = graph.next_tensor_id();
    graph.push_operation(instruction::conv(
        input,
        weights_id,
        conv_out,
        src_view,
        CONV_DILATIONS.to_vec(),
        KERNEL_SHAPE.to_vec(),
        CONV_PADS.to_vec(),
        CONV_STRIDES.to_vec(),
    ))?;

    let reshape_src = match transform {
        PostConvTransform::Reshape => conv_out,
        PostConvTransform::PermuteThenReshape => {
            let permuted = graph.next_tensor_id();
            graph.push_operation(instruction::transpose(
                conv_out,
                permuted,
                PERMUTE_ORDER.to_vec(),
            ))?;
            permuted
        }
    };

    let output = graph.next_tensor_id();
    graph.push_operation(instruction::reshape(
        reshape_src,
        output,
        RESHAPE_TARGET.to_vec(),
        false,
    ))?;
    graph.mark_output(output)?;

    debug!(
        graph = %graph.name,
        input = %input_shape,
        %precision,
        ops = graph.operations.len(),
        bytes = graph.memory_requirements(),
        "built input conv graph"
    );
    Ok(graph)
}
