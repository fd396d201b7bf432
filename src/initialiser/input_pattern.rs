use half::{bf16, f16};

use crate::{
    tensor::{NumericPrecision, Tensor, TensorDesc, TensorShape},
    utils::error::HarnessError,
};

/// Counter values cycle through `0..INPUT_PATTERN_PERIOD`.
pub const INPUT_PATTERN_PERIOD: u16 = 16;

/// Fill a tensor of `shape` with the repeating counter 0, 1, .., 15, 0, 1, ..
///
/// FP16 and BF16 elements hold the raw bit pattern of the half encoding of the
/// counter. Every other precision holds the counter in its own element type.
pub fn generate_input(shape: &TensorShape, precision: NumericPrecision) -> Tensor {
    let count = shape.num_elements();
    let mut buffer = Vec::with_capacity(count * precision.size_in_bytes());

    let mut counter: u16 = 0;
    for _ in 0..count {
        match precision {
            NumericPrecision::FP16 => {
                buffer.extend_from_slice(&f16::from_f32(counter as f32).to_bits().to_le_bytes())
            }
            NumericPrecision::BF16 => {
                buffer.extend_from_slice(&bf16::from_f32(counter as f32).to_bits().to_le_bytes())
            }
            NumericPrecision::FP32 => buffer.extend_from_slice(&(counter as f32).to_le_bytes()),
            NumericPrecision::I16 => buffer.extend_from_slice(&(counter as i16).to_le_bytes()),
            NumericPrecision::I32 => buffer.extend_from_slice(&(counter as i32).to_le_bytes()),
        }

        counter = if counter == INPUT_PATTERN_PERIOD - 1 {
            0
        } else {
            counter + 1
        };
    }

    Tensor::from_exact(TensorDesc::new(shape.clone(), precision), buffer)
}

/// Same as [`generate_input`] for raw, unvalidated dimensions.
pub fn generate_input_for_dims(
    dims: &[usize],
    precision: NumericPrecision,
) -> Result<Tensor, HarnessError> {
    let shape = TensorShape::try_from(dims)?;
    Ok(generate_input(&shape, precision))
}
