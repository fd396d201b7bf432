use std::collections::{BTreeMap, HashMap};

use crate::{
    tensor::Tensor,
    tensor_graph::{TensorGraph, TensorId},
    utils::error::HarnessError,
};

/// Backend option name -> value. Ordered so names and cache keys are deterministic.
pub type ConfigurationOptions = BTreeMap<String, String>;

/// An execution engine under test.
pub trait Backend: Send {
    fn target(&self) -> &str;

    /// Run `graph` with `inputs` bound to its input tensors, returning every graph output.
    fn execute(
        &mut self,
        graph: &TensorGraph,
        inputs: &HashMap<TensorId, Tensor>,
    ) -> Result<HashMap<TensorId, Tensor>, HarnessError>;

    /// Free device resources. Called exactly once per created backend.
    fn release(&mut self) {}
}

/// Creates backends for one target id.
pub trait BackendFactory: Send + Sync {
    fn create(
        &self,
        target: &str,
        options: &ConfigurationOptions,
    ) -> Result<Box<dyn Backend>, HarnessError>;
}

impl<F> BackendFactory for F
where
    F: Fn(&str, &ConfigurationOptions) -> Result<Box<dyn Backend>, HarnessError> + Send + Sync,
{
    fn create(
        &self,
        target: &str,
        options: &ConfigurationOptions,
    ) -> Result<Box<dyn Backend>, HarnessError> {
        self(target, options)
    }
}
