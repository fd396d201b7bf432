use crate::{
    compute::HostTensor,
    harness::tolerance::ToleranceSpec,
    tensor::Tensor,
    utils::error::HarnessError,
};

/// One element outside tolerance.
#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: f64,
    pub actual: f64,
    pub deviation: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComparisonReport {
    // Violations in ascending index order, possibly capped
    pub mismatches: Vec<Mismatch>,
    // Violations found, reported or not
    pub total_violations: usize,
    pub compared: usize,
    pub max_deviation: f64,
    pub tolerance: ToleranceSpec,
}

impl ComparisonReport {
    pub fn passed(&self) -> bool {
        self.total_violations == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.mismatches.len() < self.total_violations
    }

    pub fn first_mismatch(&self) -> Option<&Mismatch> {
        self.mismatches.first()
    }

    pub fn violation(&self) -> Option<HarnessError> {
        (!self.passed()).then(|| HarnessError::ToleranceViolation {
            violations: self.total_violations,
            compared: self.compared,
            max_deviation: self.max_deviation,
        })
    }

    /// The report itself on pass, a `ToleranceViolation` otherwise.
    pub fn into_result(self) -> Result<Self, HarnessError> {
        match self.violation() {
            Some(violation) => Err(violation),
            None => Ok(self),
        }
    }
}

/// Element-wise comparison of a backend output against the reference.
///
/// Shapes must agree exactly; a shape or length mismatch is an execution error, not a
/// tolerance violation. `max_reported` caps the recorded mismatches, `None` keeps all.
pub fn compare(
    expected: &HostTensor,
    actual: &Tensor,
    tolerance: ToleranceSpec,
    max_reported: Option<usize>,
) -> Result<ComparisonReport, HarnessError> {
    if expected.dims != actual.dims() || expected.values.len() != actual.len() {
        return Err(HarnessError::Execution(format!(
            "Output shape {:?} does not match reference shape {:?}",
            actual.dims(),
            expected.dims
        )));
    }

    let limit = max_reported.unwrap_or(usize::MAX);
    let mut mismatches = Vec::new();
    let mut total_violations = 0;
    let mut max_deviation: f64 = 0.0;

    for (index, (&exp, act)) in expected.values.iter().zip(actual.values()).enumerate() {
        let deviation = ToleranceSpec::deviation(exp, act);
        max_deviation = max_deviation.max(deviation);

        if !tolerance.allows(exp, act) {
            total_violations += 1;
            if mismatches.len() < limit {
                mismatches.push(Mismatch {
                    index,
                    expected: exp,
                    actual: act,
                    deviation,
                });
            }
        }
    }

    Ok(ComparisonReport {
        mismatches,
        total_violations,
        compared: expected.values.len(),
        max_deviation,
        tolerance,
    })
}
