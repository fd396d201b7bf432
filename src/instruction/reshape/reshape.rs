use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::{
    compute::{reference::HostTensor, store::TensorStore},
    instruction::instruction::Instruction,
    tensor::{Accumulation, Tensor, TensorDesc},
    tensor_graph::{TensorGraph, TensorId},
    utils::error::HarnessError,
};

#[derive(Clone, PartialEq)]
pub struct ReshapeInstruction {
    pub src: TensorId,
    pub dst: TensorId,
    // Target shape values. -1 infers one dimension.
    pub shape_values: Vec<i64>,
    // When set, a 0 copies the matching input dimension; otherwise 0 is literal
    pub special_zero: bool,
}

impl Debug for ReshapeInstruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Reshape(src={}, dst={}, shape={:?}, special_zero={})",
            self.src, self.dst, self.shape_values, self.special_zero
        )
    }
}

impl ReshapeInstruction {
    pub fn resolve_dims(&self, src_dims: &[usize]) -> Result<Vec<usize>, HarnessError> {
        let src_num: usize = src_dims.iter().product();
        let mut new_dims = self.shape_values.clone();

        if self.special_zero {
            for (i, val) in new_dims.iter_mut().enumerate() {
                if *val == 0 {
                    *val = *src_dims.get(i).ok_or_else(|| {
                        HarnessError::GraphConstruction(format!(
                            "Reshape: zero at axis {} has no input dimension to copy",
                            i
                        ))
                    })? as i64;
                }
            }
        }

        if new_dims.iter().any(|&d| d < -1) {
            return Err(HarnessError::GraphConstruction(format!(
                "Reshape: negative dimensions other than -1 not allowed in {:?}",
                self.shape_values
            )));
        }

        let neg1_count = new_dims.iter().filter(|&&d| d == -1).count();
        if neg1_count > 1 {
            return Err(HarnessError::GraphConstruction(
                "Reshape: more than one -1 in shape is not allowed".to_string(),
            ));
        }

        if neg1_count == 1 {
            let prod: usize = new_dims
                .iter()
                .filter(|&&d| d != -1)
                .map(|&d| d as usize)
                .product();
            if prod == 0 || src_num % prod != 0 {
                return Err(HarnessError::GraphConstruction(format!(
                    "Reshape: cannot infer -1 dimension for {} elements from {:?}",
                    src_num, self.shape_values
                )));
            }
            let inferred = (src_num / prod) as i64;
            for v in new_dims.iter_mut() {
                if *v == -1 {
                    *v = inferred;
                }
            }
        }

        let resolved: Vec<usize> = new_dims.iter().map(|&d| d as usize).collect();
        let prod: usize = resolved.iter().product();
        if prod != src_num {
            return Err(HarnessError::GraphConstruction(format!(
                "Reshape: cannot reshape {} elements ({:?}) into {:?}",
                src_num, src_dims, resolved
            )));
        }

        Ok(resolved)
    }
}

impl Instruction for ReshapeInstruction {
    fn name(&self) -> &'static str {
        "Reshape"
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
                "Reshape expects 1 input, got {}",
                inputs.len()
            )));
        };

        let dims = self.resolve_dims(src_desc.dims())?;
        Ok(vec![
            TensorDesc::from_dims(dims, src_desc.precision())
                .map_err(|e| HarnessError::GraphConstruction(e.to_string()))?,
        ])
    }

    fn execute_cpu(
        &self,
        graph: &TensorGraph,
        store: &mut TensorStore<Tensor>,
        _accumulation: Accumulation,
    ) -> Result<(), HarnessError> {
        // Reshape is logical, the bytes are copied unchanged
        let src = store.get(self.src)?.clone();
        let dst_desc = graph.desc(self.dst)?.clone();
        store.insert(self.dst, src.reinterpret(dst_desc)?)
    }

    fn execute_reference(
        &self,
        graph: &TensorGraph,
        store: &mut TensorStore<HostTensor>,
    ) -> Result<(), HarnessError> {
        let src = store.get(self.src)?;
        let dims = self.resolve_dims(&src.dims)?;
        if dims != graph.desc(self.dst)?.dims() {
            return Err(HarnessError::Execution(format!(
                "Reshape: resolved {:?} disagrees with graph shape {:?}",
                dims,
                graph.desc(self.dst)?.dims()
            )));
        }

        let values = src.values.clone();
        store.insert(self.dst, HostTensor { dims, values })
    }

    fn clone_box(&self) -> Box<dyn Instruction> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reshape(shape: Vec<i64>, special_zero: bool) -> ReshapeInstruction {
        ReshapeInstruction {
            src: 0,
            dst: 1,
            shape_values: shape,
            special_zero,
        }
    }

    #[test]
    fn flattens_conv_output() {
        assert_eq!(
            reshape(vec![1, 32], false).resolve_dims(&[1, 4, 1, 8]).unwrap(),
            vec![1, 32]
        );
    }

    #[test]
    fn infers_single_minus_one() {
        assert_eq!(
            reshape(vec![2, -1], false).resolve_dims(&[2, 4, 1, 4]).unwrap(),
            vec![2, 16]
        );
        assert!(reshape(vec![-1, -1], false).resolve_dims(&[4]).is_err());
    }

    #[test]
    fn zero_is_literal_unless_special() {
        assert_eq!(
            reshape(vec![0, 32], true).resolve_dims(&[1, 4, 1, 8]).unwrap(),
            vec![1, 32]
        );
        assert!(matches!(
            reshape(vec![0, 32], false).resolve_dims(&[1, 4, 1, 8]),
            Err(HarnessError::GraphConstruction(_))
        ));
    }

    #[test]
    fn element_count_mismatch_is_rejected() {
        assert!(reshape(vec![1, 32], false).resolve_dims(&[2, 4, 1, 8]).is_err());
    }
}
