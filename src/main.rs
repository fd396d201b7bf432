use std::process::ExitCode;

use convcheck::{
    CPU_TARGET, CaseMatrix, HarnessError, NumericPrecision, PostConvTransform, SuiteConfig,
    TensorShape, TestCaseDescriptor, run_suite,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_SHAPES: [&[usize]; 3] = [&[1, 16], &[1, 1, 1, 16], &[2, 12]];

fn default_cases() -> Result<Vec<TestCaseDescriptor>, HarnessError> {
    let shapes = DEFAULT_SHAPES
        .iter()
        .map(|dims| TensorShape::new(dims.to_vec()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut cases = CaseMatrix::new()
        .precisions(NumericPrecision::all())
        .target(CPU_TARGET)
        .option_values("mode", ["default", "native"])
        .shapes(shapes.clone())
        .build();

    // The permuted layout only on the plain 2D input
    cases.extend(
        CaseMatrix::new()
            .precisions(NumericPrecision::all())
            .target(CPU_TARGET)
            .option_values("mode", ["default"])
            .shape(shapes[0].clone())
            .transform(PostConvTransform::PermuteThenReshape)
            .build(),
    );
    Ok(cases)
}

// RUST_LOG when it is set and parses, info otherwise
fn with_default_level<E>(from_env: Result<EnvFilter, E>) -> EnvFilter {
    from_env.unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(with_default_level(EnvFilter::try_from_default_env()))
        .init();

    let cases = match default_cases() {
        Ok(cases) => cases,
        Err(e) => {
            error!(error = %e, "could not build case matrix");
            return ExitCode::FAILURE;
        }
    };

    let config = SuiteConfig {
        reuse_backends: true,
        max_reported_mismatches: Some(8),
        ..Default::default()
    }
    .build();

    info!(cases = cases.len(), "running input convolution suite");
    let cache = config.device_cache();
    let report = run_suite(&cases, &cache, &config);
    cache.teardown();

    report.print_summary();

    if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
