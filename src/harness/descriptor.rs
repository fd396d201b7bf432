use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    compute::ConfigurationOptions,
    initialiser::generate_input,
    tensor::{NumericPrecision, Tensor, TensorShape},
    tensor_graph::{
        PostConvTransform, TensorGraph, build_input_conv_graph, check_input_shape, default_weights,
    },
    utils::error::HarnessError,
};

/// One point of the parameter space. Fully determines the graph, the input and the name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TestCaseDescriptor {
    precision: NumericPrecision,
    target: String,
    options: ConfigurationOptions,
    shape: TensorShape,
    transform: PostConvTransform,
}

impl TestCaseDescriptor {
    pub fn new(
        precision: NumericPrecision,
        target: impl Into<String>,
        options: ConfigurationOptions,
        shape: TensorShape,
    ) -> Self {
        Self {
            precision,
            target: target.into(),
            options,
            shape,
            transform: PostConvTransform::default(),
        }
    }

    pub fn with_transform(mut self, transform: PostConvTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn precision(&self) -> NumericPrecision {
        self.precision
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn options(&self) -> &ConfigurationOptions {
        &self.options
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn transform(&self) -> PostConvTransform {
        self.transform
    }

    /// `IS=<dims>_netPRC=<precision>_targetDevice=<target>[_configItem=<k>_<v>..][_postConv=<t>]`
    ///
    /// Options appear in key order. The transform only appears when it is not the default,
    /// so plain cases keep their historical names.
    pub fn case_name(&self) -> String {
        let mut name = format!(
            "IS={}_netPRC={}_targetDevice={}",
            self.shape, self.precision, self.target
        );
        for (key, value) in &self.options {
            name.push_str(&format!("_configItem={}_{}", key, value));
        }
        if self.transform != PostConvTransform::default() {
            name.push_str(&format!("_postConv={}", self.transform));
        }
        name
    }

    pub fn build_graph(&self) -> Result<TensorGraph, HarnessError> {
        // shape first, so rejected shapes never size a weight buffer
        let [_, channels, _, _] = check_input_shape(&self.shape)?;
        build_input_conv_graph(
            self.precision,
            &self.shape,
            &default_weights(channels),
            self.transform,
        )
    }

    pub fn generate_input(&self) -> Tensor {
        generate_input(&self.shape, self.precision)
    }
}

impl Display for TestCaseDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.case_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(options: &[(&str, &str)]) -> TestCaseDescriptor {
        TestCaseDescriptor::new(
            NumericPrecision::FP32,
            "CPU",
            options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            TensorShape::new(vec![1, 16]).unwrap(),
        )
    }

    #[test]
    fn name_layout() {
        assert_eq!(
            descriptor(&[("mode", "default")]).case_name(),
            "IS=1_16_netPRC=FP32_targetDevice=CPU_configItem=mode_default"
        );
        assert_eq!(
            descriptor(&[]).case_name(),
            "IS=1_16_netPRC=FP32_targetDevice=CPU"
        );
    }

    #[test]
    fn options_are_named_in_key_order() {
        let name = descriptor(&[("zeta", "1"), ("alpha", "2")]).case_name();
        assert!(name.ends_with("_configItem=alpha_2_configItem=zeta_1"));
    }

    #[test]
    fn transform_only_named_when_not_default() {
        let d = descriptor(&[]).with_transform(PostConvTransform::PermuteThenReshape);
        assert!(d.case_name().ends_with("_postConv=permute"));
        assert_eq!(d.to_string(), d.case_name());
    }

    #[test]
    fn descriptor_builds_graph_and_input() {
        let d = descriptor(&[("mode", "default")]);
        let graph = d.build_graph().unwrap();
        assert_eq!(graph.precision(), Some(NumericPrecision::FP32));
        assert_eq!(d.generate_input().dims(), &[1, 16]);
    }

    #[test]
    fn huge_shape_fails_before_weights_are_built() {
        let d = TestCaseDescriptor::new(
            NumericPrecision::FP16,
            "CPU",
            ConfigurationOptions::new(),
            TensorShape::new(vec![1 << 20, 1 << 30, 16]).unwrap(),
        );
        assert!(matches!(d.build_graph(), Err(HarnessError::GraphConstruction(_))));
    }
}
