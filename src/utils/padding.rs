/// Split explicit pads `[b1..bn, e1..en]` into begin and end pads.
///
/// An empty list means no padding on any axis. Any other length that does not
/// cover every spatial axis twice is rejected.
pub fn begin_and_end_pads(pads: &[usize], spatial_rank: usize) -> Option<(Vec<usize>, Vec<usize>)> {
    if pads.is_empty() {
        return Some((vec![0; spatial_rank], vec![0; spatial_rank]));
    }
    if pads.len() != spatial_rank * 2 {
        return None;
    }
    let (begin, end) = pads.split_at(spatial_rank);
    Some((begin.to_vec(), end.to_vec()))
}

/// Output size of one convolved axis, `None` when the window does not fit.
pub fn conv_output_size(
    input: usize,
    kernel: usize,
    stride: usize,
    dilation: usize,
    pad_begin: usize,
    pad_end: usize,
) -> Option<usize> {
    let padded = input.checked_add(pad_begin)?.checked_add(pad_end)?;
    let window = dilation.checked_mul(kernel.max(1) - 1)? + 1;
    if padded < window || stride == 0 {
        return None;
    }
    Some((padded - window) / stride + 1)
}
