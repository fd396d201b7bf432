use convcheck::{
    CPU_TARGET, CaseMatrix, ConfigurationOptions, DeviceCache, ExecutionDriver, NumericPrecision,
    PostConvTransform, SuiteConfig, TensorShape, TestCaseDescriptor, Verdict, run_suite,
};

fn mode(value: &str) -> ConfigurationOptions {
    ConfigurationOptions::from([("mode".to_string(), value.to_string())])
}

#[test]
fn fp32_1x16_default_mode_passes_bit_exact() {
    let case = TestCaseDescriptor::new(
        NumericPrecision::FP32,
        CPU_TARGET,
        mode("default"),
        TensorShape::new(vec![1, 16]).unwrap(),
    );

    let name = case.case_name();
    assert!(name.contains("IS=1_16"), "{}", name);
    assert!(name.contains("netPRC=FP32"), "{}", name);
    assert!(name.contains("mode_default"), "{}", name);

    let graph = case.build_graph().unwrap();
    assert_eq!(graph.operations.len(), 2);

    let input = case.generate_input();
    let expected: Vec<f64> = (0..16).map(f64::from).collect();
    assert_eq!(input.values(), expected);
    assert_eq!(input.typed::<f32>(), (0..16).map(|v| v as f32).collect::<Vec<_>>());

    let cache = DeviceCache::with_cpu(false);
    let report = ExecutionDriver::new(&cache).run_case(&case).unwrap();
    assert!(report.passed());
    assert_eq!(report.total_violations, 0);
    assert!(report.mismatches.is_empty());
    assert_eq!(report.max_deviation, 0.0);
    assert_eq!(report.compared, 32);
    assert_eq!(cache.active_leases(), 0);
    cache.teardown();
}

#[test]
fn fp16_input_holds_raw_half_bits() {
    let shape = TensorShape::new(vec![1, 16]).unwrap();
    let input = convcheck::generate_input(&shape, NumericPrecision::FP16);
    let bits = input.typed::<u16>();
    assert_eq!(bits[0], 0x0000);
    assert_eq!(bits[1], 0x3C00);
    assert_eq!(bits[15], half::f16::from_f32(15.0).to_bits());
}

#[test]
fn full_default_matrix_passes_on_cpu() {
    let shapes = [vec![1, 16], vec![1, 1, 1, 16], vec![2, 12], vec![1, 2, 16]]
        .into_iter()
        .map(|dims| TensorShape::new(dims).unwrap());

    let cases = CaseMatrix::new()
        .precisions(NumericPrecision::all())
        .target(CPU_TARGET)
        .option_values("mode", ["default", "native"])
        .shapes(shapes)
        .transform(PostConvTransform::Reshape)
        .transform(PostConvTransform::PermuteThenReshape)
        .build();
    assert_eq!(cases.len(), 5 * 2 * 4 * 2);

    let config = SuiteConfig {
        reuse_backends: true,
        shuffle: true,
        ..Default::default()
    }
    .build();
    let cache = config.device_cache();
    let report = run_suite(&cases, &cache, &config);

    for outcome in &report.outcomes {
        assert_eq!(outcome.verdict(), Verdict::Pass, "{}: {:?}", outcome.name, outcome.result);
    }
    assert!(report.all_passed());
    assert!(report.shuffle_seed.is_some());
    // one backend per mode
    assert_eq!(cache.backends_created(), 2);
    cache.teardown();
}

#[test]
fn unknown_target_is_recorded_not_fatal() {
    let shape = TensorShape::new(vec![1, 16]).unwrap();
    let cases = CaseMatrix::new()
        .precisions([NumericPrecision::I32])
        .target("GPU")
        .target(CPU_TARGET)
        .shape(shape)
        .build();

    let config = SuiteConfig::default().build();
    let cache = config.device_cache();
    let report = run_suite(&cases, &cache, &config);

    assert_eq!(report.total(), 2);
    assert_eq!(report.errored(), 1);
    assert_eq!(report.passed(), 1);
    let gpu = &report.outcomes[0];
    assert_eq!(gpu.verdict(), Verdict::Error);
    assert_eq!(
        gpu.result.as_ref().unwrap_err().kind(),
        "BackendAcquisitionError"
    );
    cache.teardown();
}
