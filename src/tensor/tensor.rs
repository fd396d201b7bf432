use bytemuck::Pod;

use crate::{
    tensor::{desc::TensorDesc, precision::NumericPrecision},
    utils::error::HarnessError,
};

/// Host tensor: a descriptor plus the raw little-endian element bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub desc: TensorDesc,
    buffer: Box<[u8]>,
}

impl Tensor {
    pub fn new(desc: TensorDesc, buffer: Vec<u8>) -> Result<Self, HarnessError> {
        if buffer.len() != desc.size_in_bytes() {
            return Err(HarnessError::BufferSize {
                expected: desc.size_in_bytes(),
                actual: buffer.len(),
            });
        }

        Ok(Self {
            desc,
            buffer: buffer.into_boxed_slice(),
        })
    }

    /// For buffers whose length follows from the descriptor by construction.
    pub(crate) fn from_exact(desc: TensorDesc, buffer: Vec<u8>) -> Self {
        debug_assert_eq!(buffer.len(), desc.size_in_bytes());
        Self {
            desc,
            buffer: buffer.into_boxed_slice(),
        }
    }

    pub fn zeros(desc: TensorDesc) -> Self {
        let buffer = vec![0u8; desc.size_in_bytes()].into_boxed_slice();
        Self { desc, buffer }
    }

    /// Encode `values` in the descriptor's precision.
    pub fn from_values(desc: TensorDesc, values: &[f64]) -> Result<Self, HarnessError> {
        let precision = desc.precision();
        let mut buffer = Vec::with_capacity(values.len() * precision.size_in_bytes());
        for &v in values {
            precision.encode_into(v, &mut buffer);
        }
        Self::new(desc, buffer)
    }

    /// Build from typed elements. `T` must match the descriptor's element width.
    pub fn from_typed<T: Pod>(desc: TensorDesc, elements: &[T]) -> Result<Self, HarnessError> {
        Self::new(desc, bytemuck::cast_slice::<T, u8>(elements).to_vec())
    }

    pub fn precision(&self) -> NumericPrecision {
        self.desc.precision()
    }

    pub fn dims(&self) -> &[usize] {
        self.desc.dims()
    }

    pub fn len(&self) -> usize {
        self.desc.num_elements()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Copy the buffer out as typed elements, independent of buffer alignment.
    pub fn typed<T: Pod>(&self) -> Vec<T> {
        self.buffer
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned::<T>)
            .collect()
    }

    pub fn values(&self) -> Vec<f64> {
        let precision = self.precision();
        self.buffer
            .chunks_exact(precision.size_in_bytes())
            .map(|chunk| precision.decode(chunk))
            .collect()
    }

    /// Same bytes under a different descriptor with an equal element count and precision.
    pub fn reinterpret(self, desc: TensorDesc) -> Result<Self, HarnessError> {
        if desc.precision() != self.precision() || !self.desc.is_reshapable_to(&desc) {
            return Err(HarnessError::Execution(format!(
                "Cannot view {:?} {} as {:?} {}",
                self.dims(),
                self.precision(),
                desc.dims(),
                desc.precision()
            )));
        }

        Ok(Self {
            desc,
            buffer: self.buffer,
        })
    }
}
