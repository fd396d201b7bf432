use std::collections::HashSet;

use crate::{
    compute::ConfigurationOptions,
    harness::descriptor::TestCaseDescriptor,
    tensor::{NumericPrecision, TensorShape},
    tensor_graph::PostConvTransform,
};

/// Builder for the cartesian product precision × target × options × shape × transform.
///
/// `build` materialises every descriptor up front, precision-major, without duplicates.
/// An axis left empty yields no cases, except options (one empty set) and transforms
/// (the default transform).
#[derive(Clone, Debug, Default)]
pub struct CaseMatrix {
    precisions: Vec<NumericPrecision>,
    targets: Vec<String>,
    option_sets: Vec<ConfigurationOptions>,
    shapes: Vec<TensorShape>,
    transforms: Vec<PostConvTransform>,
}

impl CaseMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn precisions(mut self, precisions: impl IntoIterator<Item = NumericPrecision>) -> Self {
        self.precisions.extend(precisions);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn options(mut self, options: ConfigurationOptions) -> Self {
        self.option_sets.push(options);
        self
    }

    /// Adds one option set per value of a single key.
    pub fn option_values<'a>(mut self, key: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        for value in values {
            self.option_sets
                .push(ConfigurationOptions::from([(key.to_string(), value.to_string())]));
        }
        self
    }

    pub fn shape(mut self, shape: TensorShape) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn shapes(mut self, shapes: impl IntoIterator<Item = TensorShape>) -> Self {
        self.shapes.extend(shapes);
        self
    }

    pub fn transform(mut self, transform: PostConvTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn build(&self) -> Vec<TestCaseDescriptor> {
        let option_sets = if self.option_sets.is_empty() {
            vec![ConfigurationOptions::new()]
        } else {
            self.option_sets.clone()
        };
        let transforms = if self.transforms.is_empty() {
            vec![PostConvTransform::default()]
        } else {
            self.transforms.clone()
        };

        let mut seen = HashSet::new();
        let mut cases = Vec::new();
        for &precision in &self.precisions {
            for target in &self.targets {
                for options in &option_sets {
                    for shape in &self.shapes {
                        for &transform in &transforms {
                            let case = TestCaseDescriptor::new(
                                precision,
                                target.clone(),
                                options.clone(),
                                shape.clone(),
                            )
                            .with_transform(transform);
                            if seen.insert(case.clone()) {
                                cases.push(case);
                            }
                        }
                    }
                }
            }
        }
        cases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(dims: &[usize]) -> TensorShape {
        TensorShape::new(dims.to_vec()).unwrap()
    }

    #[test]
    fn full_product_precision_major() {
        let cases = CaseMatrix::new()
            .precisions([NumericPrecision::FP32, NumericPrecision::I16])
            .target("CPU")
            .option_values("mode", ["default", "native"])
            .shapes([shape(&[1, 16]), shape(&[2, 12])])
            .build();

        assert_eq!(cases.len(), 8);
        assert!(cases[..4].iter().all(|c| c.precision() == NumericPrecision::FP32));
        assert_eq!(cases[0].options()["mode"], "default");
        assert_eq!(cases[1].shape(), &shape(&[2, 12]));
    }

    #[test]
    fn duplicates_are_dropped() {
        let cases = CaseMatrix::new()
            .precisions([NumericPrecision::FP32, NumericPrecision::FP32])
            .target("CPU")
            .shape(shape(&[1, 16]))
            .shape(shape(&[1, 16]))
            .build();
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn empty_axis_means_no_cases() {
        let cases = CaseMatrix::new()
            .precisions(NumericPrecision::all())
            .shape(shape(&[1, 16]))
            .build();
        assert!(cases.is_empty());
    }

    #[test]
    fn names_are_unique_across_matrix() {
        let cases = CaseMatrix::new()
            .precisions(NumericPrecision::all())
            .target("CPU")
            .option_values("mode", ["default", "native"])
            .shapes([shape(&[1, 16]), shape(&[1, 1, 1, 16]), shape(&[2, 12])])
            .transform(PostConvTransform::Reshape)
            .transform(PostConvTransform::PermuteThenReshape)
            .build();
        let names: HashSet<String> = cases.iter().map(|c| c.case_name()).collect();
        assert_eq!(names.len(), cases.len());
        assert_eq!(cases.len(), 5 * 2 * 3 * 2);
    }
}
