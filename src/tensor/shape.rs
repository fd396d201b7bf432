use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::utils::error::HarnessError;

// Largest element count whose byte size fits one allocation at the widest (4 byte) precision
const MAX_ELEMENTS: usize = isize::MAX as usize / 4;

/// Ordered, non-empty list of strictly positive dimensions.
///
/// The element count is checked at construction, so `num_elements` and byte
/// sizes derived from it cannot overflow.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorShape {
    dims: Vec<usize>,
}

impl TensorShape {
    pub fn new(dims: Vec<usize>) -> Result<Self, HarnessError> {
        if dims.is_empty() {
            return Err(HarnessError::InvalidShape(
                "Tensor dimensions cannot be empty".to_string(),
            ));
        }

        if let Some(pos) = dims.iter().position(|&d| d == 0) {
            return Err(HarnessError::InvalidShape(format!(
                "Dimension {} of {:?} is not positive",
                pos, dims
            )));
        }

        let count = dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if !matches!(count, Some(n) if n <= MAX_ELEMENTS) {
            return Err(HarnessError::InvalidShape(format!(
                "Element count of {:?} exceeds {}",
                dims, MAX_ELEMENTS
            )));
        }

        Ok(Self { dims })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }
}

impl TryFrom<Vec<usize>> for TensorShape {
    type Error = HarnessError;

    fn try_from(dims: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(dims)
    }
}

impl TryFrom<&[usize]> for TensorShape {
    type Error = HarnessError;

    fn try_from(dims: &[usize]) -> Result<Self, Self::Error> {
        Self::new(dims.to_vec())
    }
}

// Rendered as `1_16`, the form used inside case names
impl Display for TensorShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let rendered = self
            .dims
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join("_");
        f.write_str(&rendered)
    }
}
