use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::{
    compute::{reference::HostTensor, store::TensorStore},
    instruction::instruction::Instruction,
    tensor::{Accumulation, Tensor, TensorDesc},
    tensor_graph::{TensorGraph, TensorId},
    utils::error::HarnessError,
};

/// Axis permutation: output axis `i` is input axis `perm[i]`.
#[derive(Clone, PartialEq)]
pub struct TransposeInstruction {
    pub src: TensorId,
    pub dst: TensorId,
    pub perm: Vec<usize>,
}

impl Debug for TransposeInstruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Transpose(src={}, dst={}, perm={:?})",
            self.src, self.dst, self.perm
        )
    }
}

impl TransposeInstruction {
    fn permuted_dims(&self, src_dims: &[usize]) -> Result<Vec<usize>, HarnessError> {
        let mut seen = vec![false; src_dims.len()];
        let valid = self.perm.len() == src_dims.len()
            && self
                .perm
                .iter()
                .all(|&axis| axis < seen.len() && !std::mem::replace(&mut seen[axis], true));
        if !valid {
            return Err(HarnessError::GraphConstruction(format!(
                "Transpose: {:?} is not a permutation of {} axes",
                self.perm,
                src_dims.len()
            )));
        }

        Ok(self.perm.iter().map(|&axis| src_dims[axis]).collect())
    }
}

impl Instruction for TransposeInstruction {
    fn name(&self) -> &'static str {
        "Transpose"
    }

    fn get_input_tensor_ids(&self) -> Vec<TensorId> {
        vec![self.src]
    }

    fn get_output_tensor_ids(&self) -> Vec<TensorId> {
        vec![self.dst]
    }

    fn output_descs(&self, inputs: &[&TensorDesc]) -> Result<Vec<TensorDesc>, HarnessError> {
        let [src_desc] = inputs else {
            return Err(HarnessError::GraphConstruction(format!(
                "Transpose expects 1 input, got {}",
                inputs.len()
            )));
        };

        let dims = self.permuted_dims(src_desc.dims())?;
        Ok(vec![TensorDesc::from_dims(dims, src_desc.precision())?])
    }

    fn execute_cpu(
        &self,
        graph: &TensorGraph,
        store: &mut TensorStore<Tensor>,
        _accumulation: Accumulation,
    ) -> Result<(), HarnessError> {
        let src = store.get(self.src)?;
        let dst_desc = graph.desc(self.dst)?.clone();
        let elem = src.precision().size_in_bytes();

        let src_strides = src.desc.strides();
        let src_bytes = src.bytes();
        let mut bytes = Vec::with_capacity(dst_desc.size_in_bytes());

        // walk the output in order and gather each element from its source position
        for dst_idx in 0..dst_desc.num_elements() {
            let out = TensorDesc::unravel(dst_idx, dst_desc.dims());
            let src_off: usize = out
                .iter()
                .zip(&self.perm)
                .map(|(&o, &axis)| o * src_strides[axis])
                .sum();
            bytes.extend_from_slice(&src_bytes[src_off * elem..(src_off + 1) * elem]);
        }

        store.insert(self.dst, Tensor::new(dst_desc, bytes)?)
    }

    fn execute_reference(
        &self,
        _graph: &TensorGraph,
        store: &mut TensorStore<HostTensor>,
    ) -> Result<(), HarnessError> {
        let src = store.get(self.src)?;
        let dims = self.permuted_dims(&src.dims)?;
        let dst_strides = TensorDesc::compute_strides(&dims);

        // scatter each input element to its output position
        let mut values = vec![0.0; src.values.len()];
        for (src_idx, &v) in src.values.iter().enumerate() {
            let pos = TensorDesc::unravel(src_idx, &src.dims);
            let dst_off: usize = self
                .perm
                .iter()
                .enumerate()
                .map(|(out_axis, &in_axis)| pos[in_axis] * dst_strides[out_axis])
                .sum();
            values[dst_off] = v;
        }

        store.insert(self.dst, HostTensor { dims, values })
    }

    fn clone_box(&self) -> Box<dyn Instruction> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::NumericPrecision;

    #[test]
    fn nchw_to_nwch_dims() {
        let t = TransposeInstruction {
            src: 0,
            dst: 1,
            perm: vec![0, 3, 1, 2],
        };
        let src = TensorDesc::from_dims(vec![1, 4, 1, 8], NumericPrecision::FP32).unwrap();
        assert_eq!(t.output_descs(&[&src]).unwrap()[0].dims(), &[1, 8, 4, 1]);
    }

    #[test]
    fn rejects_repeated_axes() {
        let t = TransposeInstruction {
            src: 0,
            dst: 1,
            perm: vec![0, 0, 1],
        };
        let src = TensorDesc::from_dims(vec![1, 2, 3], NumericPrecision::FP32).unwrap();
        assert!(matches!(
            t.output_descs(&[&src]),
            Err(HarnessError::GraphConstruction(_))
        ));
    }
}
