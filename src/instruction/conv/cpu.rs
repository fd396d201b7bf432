use crate::{
    instruction::conv::conv::ConvGeometry,
    tensor::{Accumulation, Element, TensorDesc},
};

/// A simple single-threaded N-D convolution over any [`Element`] type.
///
/// Layouts: src `[N, C, D1..]`, weights `[M, C, k1..]`, dst `[N, M, O1..]`.
pub fn conv_cpu<T: Element>(
    geometry: &ConvGeometry,
    src: &[T],
    weights: &[T],
    accumulation: Accumulation,
) -> Vec<T> {
    let src_dims = &geometry.src_dims;
    let weight_dims = &geometry.weight_dims;
    let dst_dims = &geometry.dst_dims;

    let n = src_dims[0];
    let c = src_dims[1];
    let m = weight_dims[0];
    let spatial_rank = src_dims.len() - 2;

    let src_strides = TensorDesc::compute_strides(src_dims);
    let dst_strides = TensorDesc::compute_strides(dst_dims);
    let weight_strides = TensorDesc::compute_strides(weight_dims);

    let kernel_spatial = &weight_dims[2..];
    let kernel_elems: usize = kernel_spatial.iter().product();
    let out_spatial_counts = &dst_dims[2..];

    let mut dst = vec![T::finish(T::acc_zero()); dst_dims.iter().product()];

    for ni in 0..n {
        for mi in 0..m {
            let mut out_index = vec![0usize; spatial_rank];
            loop {
                let mut dst_idxs = vec![ni, mi];
                dst_idxs.extend_from_slice(&out_index);
                let dst_off = TensorDesc::offset(&dst_idxs, &dst_strides);

                let mut acc = T::acc_zero();

                for ci in 0..c {
                    for k_idx in 0..kernel_elems {
                        // k_idx -> multi-index over the kernel window
                        let mut rem = k_idx;
                        let mut k_multi = vec![0usize; spatial_rank];
                        for d in (0..spatial_rank).rev() {
                            k_multi[d] = rem % kernel_spatial[d];
                            rem /= kernel_spatial[d];
                        }

                        // in_pos = out_pos * stride - pad_begin + k * dilation
                        let mut src_idxs = vec![ni, ci];
                        let mut in_bounds = true;
                        for (i, &out_v) in out_index.iter().enumerate() {
                            let in_pos = (out_v * geometry.strides[i] + k_multi[i] * geometry.dilations[i])
                                as isize
                                - geometry.pads_begin[i] as isize;
                            if in_pos < 0 || in_pos >= src_dims[2 + i] as isize {
                                in_bounds = false;
                                break;
                            }
                            src_idxs.push(in_pos as usize);
                        }

                        if !in_bounds {
                            continue;
                        }

                        let src_off = TensorDesc::offset(&src_idxs, &src_strides);
                        let mut w_idxs = vec![mi, ci];
                        w_idxs.extend_from_slice(&k_multi);
                        let w_off = TensorDesc::offset(&w_idxs, &weight_strides);

                        acc = T::mul_add(acc, src[src_off], weights[w_off], accumulation);
                    }
                }

                dst[dst_off] = T::finish(acc);

                // increment out_index
                let mut carry = true;
                for i in (0..spatial_rank).rev() {
                    out_index[i] += 1;
                    if out_index[i] >= out_spatial_counts[i] {
                        out_index[i] = 0;
                    } else {
                        carry = false;
                        break;
                    }
                }
                if carry {
                    break;
                }
            }
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    fn geometry_1d(width: usize, kernel: usize, out_channels: usize) -> ConvGeometry {
        ConvGeometry {
            src_dims: vec![1, 1, width],
            weight_dims: vec![out_channels, 1, kernel],
            dst_dims: vec![1, out_channels, width - kernel + 1],
            strides: vec![1],
            dilations: vec![1],
            pads_begin: vec![0],
        }
    }

    #[test]
    fn first_tap_kernel_copies_leading_window() {
        let geometry = geometry_1d(6, 3, 2);
        let src: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let weights = vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let dst = conv_cpu(&geometry, &src, &weights, Accumulation::Wide);
        assert_eq!(dst, vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn sums_window() {
        let geometry = geometry_1d(4, 2, 1);
        let src = vec![1i16, 2, 3, 4];
        let weights = vec![1i16, 1];
        let dst = conv_cpu(&geometry, &src, &weights, Accumulation::Wide);
        assert_eq!(dst, vec![3, 5, 7]);
    }

    #[test]
    fn half_kernel_matches_f32_on_small_integers() {
        let geometry = geometry_1d(5, 2, 1);
        let src: Vec<f16> = (0..5).map(|v| f16::from_f32(v as f32)).collect();
        let weights = vec![f16::from_f32(2.0), f16::from_f32(-1.0)];
        let dst = conv_cpu(&geometry, &src, &weights, Accumulation::Native);
        let as_f32: Vec<f32> = dst.iter().map(|v| v.to_f32()).collect();
        assert_eq!(as_f32, vec![-1.0, 0.0, 1.0, 2.0]);
    }
}
