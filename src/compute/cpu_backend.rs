use std::collections::HashMap;

use tracing::debug;

use crate::{
    compute::{
        backend::{Backend, BackendFactory, ConfigurationOptions},
        reference::bound_input,
        store::TensorStore,
    },
    tensor::{Accumulation, Tensor},
    tensor_graph::{TensorGraph, TensorId},
    utils::error::HarnessError,
};

pub const CPU_TARGET: &str = "CPU";
pub const MODE_OPTION: &str = "mode";

/// Single-threaded host backend executing each instruction in the graph's own precision.
#[derive(Debug)]
pub struct CpuBackend {
    accumulation: Accumulation,
    executions: usize,
}

impl CpuBackend {
    /// Accepts only the `mode` option: `default` (wide accumulation) or `native`.
    pub fn new(options: &ConfigurationOptions) -> Result<Self, HarnessError> {
        let mut accumulation = Accumulation::Wide;

        for (key, value) in options {
            if key != MODE_OPTION {
                return Err(acquisition_error(format!("unknown option '{}'", key)));
            }
            accumulation = match value.as_str() {
                "default" => Accumulation::Wide,
                "native" => Accumulation::Native,
                other => {
                    return Err(acquisition_error(format!(
                        "unsupported mode '{}', expected 'default' or 'native'",
                        other
                    )));
                }
            };
        }

        Ok(Self {
            accumulation,
            executions: 0,
        })
    }

    pub fn accumulation(&self) -> Accumulation {
        self.accumulation
    }

    pub fn executions(&self) -> usize {
        self.executions
    }
}

fn acquisition_error(message: String) -> HarnessError {
    HarnessError::BackendAcquisition {
        target: CPU_TARGET.to_string(),
        message,
    }
}

impl Backend for CpuBackend {
    fn target(&self) -> &str {
        CPU_TARGET
    }

    fn execute(
        &mut self,
        graph: &TensorGraph,
        inputs: &HashMap<TensorId, Tensor>,
    ) -> Result<HashMap<TensorId, Tensor>, HarnessError> {
        let mut store = TensorStore::new(graph.tensors.len());

        for &id in &graph.input_tensors {
            store.insert(id, bound_input(graph, inputs, id)?.clone())?;
        }
        for (&id, tensor) in &graph.constants {
            store.insert(id, tensor.clone())?;
        }

        let plan = graph.create_execution_plan()?;
        debug!(graph = %graph.name, stages = plan.len(), accumulation = ?self.accumulation, "cpu execute");

        for stage in plan {
            for op_id in stage {
                let op = &graph.operations[op_id];
                debug!(op = op.name(), op_id, "cpu op");
                op.execute_cpu(graph, &mut store, self.accumulation)?;
            }
        }

        self.executions += 1;
        graph
            .output_tensors
            .iter()
            .map(|&id| Ok((id, store.take(id)?)))
            .collect()
    }

    fn release(&mut self) {
        debug!(executions = self.executions, "cpu backend released");
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBackendFactory;

impl BackendFactory for CpuBackendFactory {
    fn create(
        &self,
        _target: &str,
        options: &ConfigurationOptions,
    ) -> Result<Box<dyn Backend>, HarnessError> {
        Ok(Box::new(CpuBackend::new(options)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        initialiser::generate_input,
        tensor::{NumericPrecision, TensorShape},
        tensor_graph::{PostConvTransform, build_input_conv_graph, default_weights},
    };

    fn options(pairs: &[(&str, &str)]) -> ConfigurationOptions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn mode_option_selects_accumulation() {
        assert_eq!(
            CpuBackend::new(&options(&[])).unwrap().accumulation(),
            Accumulation::Wide
        );
        assert_eq!(
            CpuBackend::new(&options(&[("mode", "native")]))
                .unwrap()
                .accumulation(),
            Accumulation::Native
        );
    }

    #[test]
    fn bad_options_fail_acquisition() {
        for opts in [options(&[("mode", "turbo")]), options(&[("threads", "4")])] {
            assert!(matches!(
                CpuBackend::new(&opts),
                Err(HarnessError::BackendAcquisition { .. })
            ));
        }
    }

    #[test]
    fn executes_graph_in_each_precision() {
        let shape = TensorShape::new(vec![2, 12]).unwrap();
        for precision in NumericPrecision::all() {
            let graph = build_input_conv_graph(
                precision,
                &shape,
                &default_weights(1),
                PostConvTransform::Reshape,
            )
            .unwrap();
            let input = generate_input(&shape, precision);
            let inputs = HashMap::from([(graph.input_tensors[0], input)]);

            let mut backend = CpuBackend::new(&options(&[("mode", "default")])).unwrap();
            let out = backend.execute(&graph, &inputs).unwrap();
            let result = &out[&graph.single_output().unwrap()];

            assert_eq!(result.dims(), &[1, 32]);
            assert_eq!(result.precision(), precision);
            // batch 0 channel 0 window starts read 0..4, batch 1 reads 12..16 -> 12,13,14,15
            assert_eq!(&result.values()[..4], &[0.0, 1.0, 2.0, 3.0]);
            assert_eq!(&result.values()[16..20], &[12.0, 13.0, 14.0, 15.0]);
            assert_eq!(backend.executions(), 1);
        }
    }
}
