use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::{
    compute::{ConfigurationOptions, DeviceCache, ReferenceEvaluator},
    harness::{
        compare::{ComparisonReport, compare},
        descriptor::TestCaseDescriptor,
        tolerance::ToleranceSpec,
    },
    tensor::{NumericPrecision, Tensor},
    tensor_graph::TensorGraph,
    utils::error::HarnessError,
};

/// Runs a graph on a leased backend and on the reference, then compares the outputs.
#[derive(Debug)]
pub struct ExecutionDriver<'a> {
    cache: &'a DeviceCache,
    reference: ReferenceEvaluator,
    tolerances: BTreeMap<NumericPrecision, ToleranceSpec>,
    max_reported: Option<usize>,
}

impl<'a> ExecutionDriver<'a> {
    pub fn new(cache: &'a DeviceCache) -> Self {
        Self {
            cache,
            reference: ReferenceEvaluator::new(),
            tolerances: BTreeMap::new(),
            max_reported: None,
        }
    }

    pub fn with_tolerance(mut self, precision: NumericPrecision, tolerance: ToleranceSpec) -> Self {
        self.tolerances.insert(precision, tolerance);
        self
    }

    pub fn with_max_reported(mut self, max_reported: Option<usize>) -> Self {
        self.max_reported = max_reported;
        self
    }

    pub fn tolerance(&self, precision: NumericPrecision) -> ToleranceSpec {
        self.tolerances
            .get(&precision)
            .copied()
            .unwrap_or_else(|| ToleranceSpec::for_precision(precision))
    }

    /// Graph and input are produced before any backend is acquired, so shape errors
    /// never touch a device.
    pub fn run_case(&self, case: &TestCaseDescriptor) -> Result<ComparisonReport, HarnessError> {
        let graph = case.build_graph()?;
        let input = case.generate_input();
        self.execute_and_compare(case.target(), case.options(), &graph, input)
    }

    pub fn execute_and_compare(
        &self,
        target: &str,
        options: &ConfigurationOptions,
        graph: &TensorGraph,
        input: Tensor,
    ) -> Result<ComparisonReport, HarnessError> {
        let precision = graph.precision().ok_or_else(|| {
            HarnessError::Execution(format!("Graph '{}' has no input tensor", graph.name))
        })?;
        let output_id = graph.single_output()?;
        let inputs = HashMap::from([(graph.input_tensors[0], input)]);

        let mut actual = {
            let lease = self.cache.acquire(target, options)?;
            debug!(target, graph = %graph.name, "executing on backend");
            lease.execute(graph, &inputs)?
        };

        let mut expected = self.reference.evaluate(graph, &inputs)?;

        let actual = actual.remove(&output_id).ok_or_else(|| {
            HarnessError::Execution(format!("Backend '{}' produced no output {}", target, output_id))
        })?;
        let expected = expected.remove(&output_id).ok_or_else(|| {
            HarnessError::Execution(format!("Reference produced no output {}", output_id))
        })?;

        let report = compare(&expected, &actual, self.tolerance(precision), self.max_reported)?;

        if report.passed() {
            info!(
                target,
                %precision,
                compared = report.compared,
                max_deviation = report.max_deviation,
                "outputs match reference"
            );
        } else {
            warn!(
                target,
                %precision,
                violations = report.total_violations,
                compared = report.compared,
                max_deviation = report.max_deviation,
                "outputs differ from reference"
            );
        }
        Ok(report)
    }
}
