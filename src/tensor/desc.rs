use crate::{
    tensor::{precision::NumericPrecision, shape::TensorShape},
    utils::error::HarnessError,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TensorDesc {
    shape: TensorShape,
    precision: NumericPrecision,
}

impl TensorDesc {
    pub fn new(shape: TensorShape, precision: NumericPrecision) -> Self {
        Self { shape, precision }
    }

    pub fn from_dims(dims: Vec<usize>, precision: NumericPrecision) -> Result<Self, HarnessError> {
        Ok(Self::new(TensorShape::new(dims)?, precision))
    }

    pub fn precision(&self) -> NumericPrecision {
        self.precision
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    // Size in bytes for the tensor given its precision
    pub fn size_in_bytes(&self) -> usize {
        self.num_elements() * self.precision.size_in_bytes()
    }

    // Check if this shape can be reshaped to another
    pub fn is_reshapable_to(&self, other: &Self) -> bool {
        self.num_elements() == other.num_elements()
    }

    // Calculate strides for row-major memory layout
    pub fn strides(&self) -> Vec<usize> {
        Self::compute_strides(self.dims())
    }

    pub fn compute_strides(dims: &[usize]) -> Vec<usize> {
        let mut s = vec![1; dims.len()];
        for i in (0..dims.len().saturating_sub(1)).rev() {
            s[i] = s[i + 1] * dims[i + 1];
        }
        s
    }

    pub fn unravel(idx: usize, dims: &[usize]) -> Vec<usize> {
        let mut rem = idx;
        Self::compute_strides(dims)
            .iter()
            .map(|&stride| {
                let c = rem / stride;
                rem %= stride;
                c
            })
            .collect()
    }

    pub fn offset(idxs: &[usize], strides: &[usize]) -> usize {
        idxs.iter().zip(strides.iter()).map(|(i, s)| i * s).sum()
    }
}
