//! Driver behaviour against misbehaving backends.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use convcheck::{
    Backend, ConfigurationOptions, CpuBackend, DeviceCache, ExecutionDriver, HarnessError,
    NumericPrecision, SuiteConfig, Tensor, TensorGraph, TensorId, TensorShape, TestCaseDescriptor,
    Verdict, run_suite,
};

#[derive(Clone, Copy)]
enum Fault {
    // Adds one to the output element at this index
    Perturb(usize),
    Fail,
}

/// Wraps the CPU backend and injects one fault.
struct FaultyBackend {
    inner: CpuBackend,
    fault: Fault,
    released: Arc<AtomicUsize>,
}

impl Backend for FaultyBackend {
    fn target(&self) -> &str {
        "FAULTY"
    }

    fn execute(
        &mut self,
        graph: &TensorGraph,
        inputs: &HashMap<TensorId, Tensor>,
    ) -> Result<HashMap<TensorId, Tensor>, HarnessError> {
        let index = match self.fault {
            Fault::Fail => return Err(HarnessError::Execution("device lost".to_string())),
            Fault::Perturb(index) => index,
        };

        let mut outputs = self.inner.execute(graph, inputs)?;
        for tensor in outputs.values_mut() {
            let mut values = tensor.values();
            values[index] += 1.0;
            *tensor = Tensor::from_values(tensor.desc.clone(), &values)?;
        }
        Ok(outputs)
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

fn faulty_cache(fault: Fault, reuse: bool) -> (DeviceCache, Arc<AtomicUsize>) {
    let released = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&released);
    let mut cache = DeviceCache::new(reuse);
    cache.register(
        "FAULTY",
        move |_: &str, options: &ConfigurationOptions| -> Result<Box<dyn Backend>, HarnessError> {
            Ok(Box::new(FaultyBackend {
                inner: CpuBackend::new(options)?,
                fault,
                released: Arc::clone(&counter),
            }))
        },
    );
    (cache, released)
}

fn case(precision: NumericPrecision) -> TestCaseDescriptor {
    TestCaseDescriptor::new(
        precision,
        "FAULTY",
        ConfigurationOptions::new(),
        TensorShape::new(vec![1, 16]).unwrap(),
    )
}

#[test]
fn perturbed_output_is_a_tolerance_violation() {
    let (cache, released) = faulty_cache(Fault::Perturb(5), false);
    let report = ExecutionDriver::new(&cache)
        .run_case(&case(NumericPrecision::I32))
        .unwrap();

    assert!(!report.passed());
    assert_eq!(report.total_violations, 1);
    let m = &report.mismatches[0];
    assert_eq!((m.index, m.expected, m.actual, m.deviation), (5, 5.0, 6.0, 1.0));
    assert!(matches!(
        report.into_result(),
        Err(HarnessError::ToleranceViolation { violations: 1, compared: 32, .. })
    ));
    assert_eq!(released.load(Ordering::SeqCst), 1);
    cache.teardown();
}

#[test]
fn backend_released_when_execution_fails() {
    let (cache, released) = faulty_cache(Fault::Fail, false);
    let err = ExecutionDriver::new(&cache)
        .run_case(&case(NumericPrecision::FP32))
        .unwrap_err();

    assert!(matches!(err, HarnessError::Execution(_)));
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(cache.active_leases(), 0);
    cache.teardown();
}

#[test]
fn graph_error_acquires_nothing() {
    let (cache, released) = faulty_cache(Fault::Fail, false);
    let narrow = TestCaseDescriptor::new(
        NumericPrecision::FP32,
        "FAULTY",
        ConfigurationOptions::new(),
        TensorShape::new(vec![1, 4]).unwrap(),
    );
    let err = ExecutionDriver::new(&cache).run_case(&narrow).unwrap_err();
    assert!(matches!(err, HarnessError::GraphConstruction(_)));
    assert_eq!(cache.backends_created(), 0);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    cache.teardown();
}

#[test]
fn bad_options_fail_acquisition() {
    let (cache, _) = faulty_cache(Fault::Perturb(0), false);
    let case = TestCaseDescriptor::new(
        NumericPrecision::FP32,
        "FAULTY",
        ConfigurationOptions::from([("mode".to_string(), "warp".to_string())]),
        TensorShape::new(vec![1, 16]).unwrap(),
    );
    assert!(matches!(
        ExecutionDriver::new(&cache).run_case(&case),
        Err(HarnessError::BackendAcquisition { .. })
    ));
    cache.teardown();
}

#[test]
fn suite_records_failures_and_caps_reports() {
    let (cache, released) = faulty_cache(Fault::Perturb(3), true);
    let config = SuiteConfig {
        max_reported_mismatches: Some(0),
        reuse_backends: true,
        ..Default::default()
    }
    .build();

    let cases: Vec<TestCaseDescriptor> = NumericPrecision::all().into_iter().map(case).collect();
    let report = run_suite(&cases, &cache, &config);

    assert_eq!(report.failed(), cases.len());
    for outcome in &report.outcomes {
        assert_eq!(outcome.verdict(), Verdict::Fail);
        let comparison = outcome.result.as_ref().unwrap();
        assert!(comparison.mismatches.is_empty());
        assert!(comparison.is_truncated());
        assert!(matches!(
            outcome.as_result(),
            Err(HarnessError::ToleranceViolation { .. })
        ));
    }

    // one cached backend, released at teardown only
    assert_eq!(released.load(Ordering::SeqCst), 0);
    cache.teardown();
    assert_eq!(released.load(Ordering::SeqCst), 1);
}
