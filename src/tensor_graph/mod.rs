pub mod input_conv;
#[allow(clippy::module_inception)]
pub mod tensor_graph;

pub use input_conv::{
    PostConvTransform, build_input_conv_graph, check_input_shape, default_weights, lift_to_nchw,
};
pub use tensor_graph::{OperationId, TensorGraph, TensorId};
