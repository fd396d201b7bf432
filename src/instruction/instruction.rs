use std::fmt::Debug;

use crate::{
    compute::{reference::HostTensor, store::TensorStore},
    tensor::{Accumulation, Tensor, TensorDesc},
    tensor_graph::{TensorGraph, TensorId},
    utils::error::HarnessError,
};

pub trait Instruction: Debug + Send + Sync {
    // Short operator name used in logs and summaries
    fn name(&self) -> &'static str;

    // Get all input tensor IDs used by this instruction
    fn get_input_tensor_ids(&self) -> Vec<TensorId>;

    // Get all output tensor IDs for this instruction
    fn get_output_tensor_ids(&self) -> Vec<TensorId>;

    // Shape inference at graph construction time, one desc per output
    fn output_descs(&self, inputs: &[&TensorDesc]) -> Result<Vec<TensorDesc>, HarnessError>;

    // Execute on raw tensors in the graph's precision
    fn execute_cpu(
        &self,
        graph: &TensorGraph,
        store: &mut TensorStore<Tensor>,
        accumulation: Accumulation,
    ) -> Result<(), HarnessError>;

    // Execute on exact f64 values
    fn execute_reference(
        &self,
        graph: &TensorGraph,
        store: &mut TensorStore<HostTensor>,
    ) -> Result<(), HarnessError>;

    fn clone_box(&self) -> Box<dyn Instruction>;
}

impl Clone for Box<dyn Instruction> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
