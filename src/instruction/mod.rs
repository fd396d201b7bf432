use crate::{
    instruction::{
        conv::ConvInstruction, instruction::Instruction, reshape::ReshapeInstruction,
        transpose::TransposeInstruction,
    },
    tensor_graph::TensorId,
};

pub mod conv;
pub mod instruction;
pub mod reshape;
pub mod transpose;

#[allow(clippy::too_many_arguments)]
pub fn conv(
    src: TensorId,
    weights: TensorId,
    dst: TensorId,
    src_view: Option<Vec<usize>>,
    dilations: Vec<usize>,
    kernel_shape: Vec<usize>,
    pads: Vec<usize>,
    strides: Vec<usize>,
) -> Box<dyn Instruction> {
    Box::new(ConvInstruction {
        src,
        weights,
        dst,
        src_view,
        dilations,
        kernel_shape,
        pads,
        strides,
    })
}

pub fn reshape(
    src: TensorId,
    dst: TensorId,
    shape_values: Vec<i64>,
    special_zero: bool,
) -> Box<dyn Instruction> {
    Box::new(ReshapeInstruction {
        src,
        dst,
        shape_values,
        special_zero,
    })
}

pub fn transpose(src: TensorId, dst: TensorId, perm: Vec<usize>) -> Box<dyn Instruction> {
    Box::new(TransposeInstruction { src, dst, perm })
}
