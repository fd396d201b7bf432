use crate::{instruction::conv::conv::ConvGeometry, tensor::TensorDesc};

/// Direct convolution in f64, one output element at a time.
pub fn conv_reference(geometry: &ConvGeometry, src: &[f64], weights: &[f64]) -> Vec<f64> {
    let dst_count: usize = geometry.dst_dims.iter().product();
    let src_strides = TensorDesc::compute_strides(&geometry.src_dims);
    let weight_strides = TensorDesc::compute_strides(&geometry.weight_dims);

    // weight slice for one output channel: [C, k1..]
    let per_channel_dims = &geometry.weight_dims[1..];
    let per_channel_count: usize = per_channel_dims.iter().product();

    (0..dst_count)
        .map(|dst_idx| {
            let out = TensorDesc::unravel(dst_idx, &geometry.dst_dims);
            let (n, m, out_pos) = (out[0], out[1], &out[2..]);

            let mut sum = 0.0;
            for w_rel in 0..per_channel_count {
                let tap = TensorDesc::unravel(w_rel, per_channel_dims);
                let (c, k_pos) = (tap[0], &tap[1..]);

                let src_pos: Option<Vec<usize>> = out_pos
                    .iter()
                    .zip(k_pos)
                    .enumerate()
                    .map(|(axis, (&o, &k))| {
                        let p = (o * geometry.strides[axis] + k * geometry.dilations[axis]) as i64
                            - geometry.pads_begin[axis] as i64;
                        (p >= 0 && (p as usize) < geometry.src_dims[axis + 2]).then_some(p as usize)
                    })
                    .collect();

                if let Some(pos) = src_pos {
                    let mut src_idx = vec![n, c];
                    src_idx.extend(pos);
                    let w_off = m * weight_strides[0] + w_rel;
                    sum += src[TensorDesc::offset(&src_idx, &src_strides)] * weights[w_off];
                }
            }
            sum
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_dimensional_kernel() {
        // 3x3 input, 2x2 all-ones kernel, valid padding
        let geometry = ConvGeometry {
            src_dims: vec![1, 1, 3, 3],
            weight_dims: vec![1, 1, 2, 2],
            dst_dims: vec![1, 1, 2, 2],
            strides: vec![1, 1],
            dilations: vec![1, 1],
            pads_begin: vec![0, 0],
        };
        let src: Vec<f64> = (1..=9).map(|v| v as f64).collect();
        let dst = conv_reference(&geometry, &src, &[1.0; 4]);
        assert_eq!(dst, vec![12.0, 16.0, 24.0, 28.0]);
    }

    #[test]
    fn padding_skips_out_of_bounds_taps() {
        let geometry = ConvGeometry {
            src_dims: vec![1, 1, 2],
            weight_dims: vec![1, 1, 3],
            dst_dims: vec![1, 1, 2],
            strides: vec![1],
            dilations: vec![1],
            pads_begin: vec![1],
        };
        let dst = conv_reference(&geometry, &[5.0, 7.0], &[1.0, 1.0, 1.0]);
        assert_eq!(dst, vec![12.0, 12.0]);
    }
}
