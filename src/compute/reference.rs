use std::collections::HashMap;

use tracing::debug;

use crate::{
    compute::store::TensorStore,
    tensor::Tensor,
    tensor_graph::{TensorGraph, TensorId},
    utils::error::HarnessError,
};

/// Exact values of one tensor, in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct HostTensor {
    pub dims: Vec<usize>,
    pub values: Vec<f64>,
}

impl From<&Tensor> for HostTensor {
    fn from(tensor: &Tensor) -> Self {
        Self {
            dims: tensor.dims().to_vec(),
            values: tensor.values(),
        }
    }
}

/// Ground truth: every instruction evaluated in f64 on the decoded input values.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceEvaluator;

impl ReferenceEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        graph: &TensorGraph,
        inputs: &HashMap<TensorId, Tensor>,
    ) -> Result<HashMap<TensorId, HostTensor>, HarnessError> {
        let mut store = TensorStore::new(graph.tensors.len());

        for &id in &graph.input_tensors {
            let tensor = bound_input(graph, inputs, id)?;
            store.insert(id, HostTensor::from(tensor))?;
        }
        for (&id, tensor) in &graph.constants {
            store.insert(id, HostTensor::from(tensor))?;
        }

        for stage in graph.create_execution_plan()? {
            for op_id in stage {
                let op = &graph.operations[op_id];
                debug!(op = op.name(), op_id, "reference");
                op.execute_reference(graph, &mut store)?;
            }
        }

        graph
            .output_tensors
            .iter()
            .map(|&id| Ok((id, store.take(id)?)))
            .collect()
    }
}

/// The tensor bound to graph input `id`, checked against the graph's descriptor.
pub fn bound_input<'a>(
    graph: &TensorGraph,
    inputs: &'a HashMap<TensorId, Tensor>,
    id: TensorId,
) -> Result<&'a Tensor, HarnessError> {
    let tensor = inputs
        .get(&id)
        .ok_or_else(|| HarnessError::Execution(format!("No tensor bound to input {}", id)))?;
    let expected = graph.desc(id)?;
    if &tensor.desc != expected {
        return Err(HarnessError::Execution(format!(
            "Input {} is {:?} {}, graph expects {:?} {}",
            id,
            tensor.dims(),
            tensor.precision(),
            expected.dims(),
            expected.precision()
        )));
    }
    Ok(tensor)
}
