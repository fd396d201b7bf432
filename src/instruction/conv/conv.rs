use std::fmt::{Debug, Formatter, Result as FmtResult};

use half::{bf16, f16};
use tracing::debug;

use crate::{
    compute::{reference::HostTensor, store::TensorStore},
    instruction::{
        conv::{cpu::conv_cpu, reference::conv_reference},
        instruction::Instruction,
    },
    tensor::{Accumulation, Element, NumericPrecision, Tensor, TensorDesc},
    tensor_graph::{TensorGraph, TensorId},
    utils::{
        error::HarnessError,
        padding::{begin_and_end_pads, conv_output_size},
    },
};

#[derive(Clone, PartialEq)]
pub struct ConvInstruction {
    pub src: TensorId,
    pub weights: TensorId,
    pub dst: TensorId,

    // NC[spatial..] view of src when its own rank is lower; same element order
    pub src_view: Option<Vec<usize>>,

    pub dilations: Vec<usize>,
    pub kernel_shape: Vec<usize>,
    pub pads: Vec<usize>,
    pub strides: Vec<usize>,
}

/// Resolved dimensions and per-axis parameters shared by both kernels.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvGeometry {
    pub src_dims: Vec<usize>,
    pub weight_dims: Vec<usize>,
    pub dst_dims: Vec<usize>,
    pub strides: Vec<usize>,
    pub dilations: Vec<usize>,
    pub pads_begin: Vec<usize>,
}

impl Debug for ConvInstruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Conv(src={}, weights={}, dst={}, src_view={:?}, dilations={:?}, kernel_shape={:?}, pads={:?}, strides={:?})",
            self.src,
            self.weights,
            self.dst,
            self.src_view,
            self.dilations,
            self.kernel_shape,
            self.pads,
            self.strides
        )
    }
}

impl ConvInstruction {
    pub fn geometry(
        &self,
        src_desc: &TensorDesc,
        weight_desc: &TensorDesc,
    ) -> Result<ConvGeometry, HarnessError> {
        let src_dims = match &self.src_view {
            Some(view) => {
                let count = view.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
                if count != Some(src_desc.num_elements()) {
                    return Err(HarnessError::GraphConstruction(format!(
                        "Conv view {:?} does not match input shape {:?}",
                        view,
                        src_desc.dims()
                    )));
                }
                view.clone()
            }
            None => src_desc.dims().to_vec(),
        };
        let weight_dims = weight_desc.dims().to_vec();

        if src_dims.len() < 3 {
            return Err(HarnessError::GraphConstruction(format!(
                "Conv input must have at least one spatial axis, got {:?}",
                src_dims
            )));
        }
        if weight_dims.len() != src_dims.len() {
            return Err(HarnessError::GraphConstruction(format!(
                "Conv weight rank {} does not match input rank {}",
                weight_dims.len(),
                src_dims.len()
            )));
        }
        if weight_dims[1] != src_dims[1] {
            return Err(HarnessError::GraphConstruction(format!(
                "Conv weights expect {} input channels, input has {}",
                weight_dims[1], src_dims[1]
            )));
        }

        let spatial_rank = src_dims.len() - 2;
        let kernel_spatial = &weight_dims[2..];
        if !self.kernel_shape.is_empty() && self.kernel_shape != kernel_spatial {
            return Err(HarnessError::GraphConstruction(format!(
                "Conv kernel_shape {:?} does not match weight dims {:?}",
                self.kernel_shape, weight_dims
            )));
        }

        let strides: Vec<usize> = (0..spatial_rank)
            .map(|i| self.strides.get(i).copied().unwrap_or(1))
            .collect();
        let dilations: Vec<usize> = (0..spatial_rank)
            .map(|i| self.dilations.get(i).copied().unwrap_or(1))
            .collect();
        let input_spatial = &src_dims[2..];

        let (pads_begin, pads_end) = begin_and_end_pads(&self.pads, spatial_rank).ok_or_else(|| {
            HarnessError::GraphConstruction(format!(
                "Conv pads {:?} must be empty or give begin and end for {} spatial axes",
                self.pads, spatial_rank
            ))
        })?;

        let mut dst_dims = vec![src_dims[0], weight_dims[0]];
        for i in 0..spatial_rank {
            let out = conv_output_size(
                input_spatial[i],
                kernel_spatial[i],
                strides[i],
                dilations[i],
                pads_begin[i],
                pads_end[i],
            )
            .ok_or_else(|| {
                HarnessError::GraphConstruction(format!(
                    "Conv spatial axis {} of size {} is smaller than kernel {} with pads {:?}",
                    i, input_spatial[i], kernel_spatial[i], self.pads
                ))
            })?;
            dst_dims.push(out);
        }

        Ok(ConvGeometry {
            src_dims,
            weight_dims,
            dst_dims,
            strides,
            dilations,
            pads_begin,
        })
    }

    fn run_cpu<T: Element>(
        geometry: &ConvGeometry,
        src: &Tensor,
        weights: &Tensor,
        accumulation: Accumulation,
    ) -> Vec<u8> {
        let dst = conv_cpu::<T>(geometry, &src.typed::<T>(), &weights.typed::<T>(), accumulation);
        bytemuck::cast_slice::<T, u8>(&dst).to_vec()
    }
}

impl Instruction for ConvInstruction {
    fn name(&self) -> &'static str {
        "Convolution"
    }

    fn get_input_tensor_ids(&self) -> Vec<TensorId> {
        vec![self.src, self.weights]
    }

    fn get_output_tensor_ids(&self) -> Vec<TensorId> {
        vec![self.dst]
    }

    fn output_descs(&self, inputs: &[&TensorDesc]) -> Result<Vec<TensorDesc>, HarnessError> {
        let (src_desc, weight_desc) = match inputs {
            [src, weights] => (*src, *weights),
            _ => {
                return Err(HarnessError::GraphConstruction(format!(
                    "Conv expects 2 inputs, got {}",
                    inputs.len()
                )));
            }
        };

        let precision = src_desc.precision();
        if weight_desc.precision() != precision {
            return Err(HarnessError::GraphConstruction(
                "Conv inputs must share one precision".to_string(),
            ));
        }

        let geometry = self.geometry(src_desc, weight_desc)?;
        Ok(vec![TensorDesc::from_dims(geometry.dst_dims, precision)?])
    }

    fn execute_cpu(
        &self,
        graph: &TensorGraph,
        store: &mut TensorStore<Tensor>,
        accumulation: Accumulation,
    ) -> Result<(), HarnessError> {
        let src = store.get(self.src)?;
        let weights = store.get(self.weights)?;

        let geometry = self.geometry(&src.desc, &weights.desc)?;
        let dst_desc = graph.desc(self.dst)?.clone();
        debug!(src = ?geometry.src_dims, dst = ?geometry.dst_dims, "conv cpu");

        let bytes = match dst_desc.precision() {
            NumericPrecision::FP32 => Self::run_cpu::<f32>(&geometry, src, weights, accumulation),
            NumericPrecision::FP16 => Self::run_cpu::<f16>(&geometry, src, weights, accumulation),
            NumericPrecision::BF16 => Self::run_cpu::<bf16>(&geometry, src, weights, accumulation),
            NumericPrecision::I16 => Self::run_cpu::<i16>(&geometry, src, weights, accumulation),
            NumericPrecision::I32 => Self::run_cpu::<i32>(&geometry, src, weights, accumulation),
        };

        store.insert(self.dst, Tensor::new(dst_desc, bytes)?)
    }

    fn execute_reference(
        &self,
        graph: &TensorGraph,
        store: &mut TensorStore<HostTensor>,
    ) -> Result<(), HarnessError> {
        let geometry = self.geometry(graph.desc(self.src)?, graph.desc(self.weights)?)?;
        let src = store.get(self.src)?;
        let weights = store.get(self.weights)?;

        let values = conv_reference(&geometry, &src.values, &weights.values);
        store.insert(
            self.dst,
            HostTensor {
                dims: geometry.dst_dims,
                values,
            },
        )
    }

    fn clone_box(&self) -> Box<dyn Instruction> {
        Box::new(self.clone())
    }
}
