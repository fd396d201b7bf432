/// Per output channel, a kernel that picks only its first tap.
///
/// Returns `out_channels * kernel_size` values laid out channel-major; the first
/// value of each channel block is 1, the rest are 0.
pub fn generate_weights(out_channels: usize, kernel_size: usize) -> Vec<f32> {
    let mut res = Vec::with_capacity(out_channels * kernel_size);
    for _ in 0..out_channels {
        for j in 0..kernel_size {
            res.push(if j == 0 { 1.0 } else { 0.0 });
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_by_nine_block_pattern() {
        let w = generate_weights(4, 9);
        assert_eq!(w.len(), 36);
        for block in w.chunks(9) {
            assert_eq!(block[0], 1.0);
            assert!(block[1..].iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn empty_when_no_channels() {
        assert!(generate_weights(0, 9).is_empty());
    }
}
