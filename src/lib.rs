//! convcheck - conformance harness for an input convolution graph
//!
//! Builds a fixed convolution -> reshape graph for every combination of precision,
//! backend, backend options and input shape, runs it on the backend under test and on an
//! exact reference, and compares the two outputs under a per-precision tolerance.

mod compute;

mod harness;

mod initialiser;

mod instruction;

mod tensor;

mod tensor_graph;

mod utils;

pub use compute::{
    Backend, BackendFactory, BackendLease, CPU_TARGET, ConfigurationOptions, CpuBackend,
    CpuBackendFactory, DeviceCache, HostTensor, ReferenceEvaluator,
};
pub use harness::{
    CaseMatrix, CaseOutcome, ComparisonReport, ExecutionDriver, Mismatch, SuiteConfig,
    SuiteReport, TestCaseDescriptor, ToleranceSpec, Verdict, compare, run_suite,
};
pub use initialiser::{
    INPUT_PATTERN_PERIOD, generate_input, generate_input_for_dims, generate_weights,
};
pub use tensor::{Accumulation, NumericPrecision, Tensor, TensorDesc, TensorShape};
pub use tensor_graph::{
    OperationId, PostConvTransform, TensorGraph, TensorId, build_input_conv_graph,
    default_weights, lift_to_nchw,
};
pub use utils::error::HarnessError;
