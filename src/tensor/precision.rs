use std::fmt::{Display, Formatter, Result as FmtResult};

use half::{bf16, f16};

/// Element type of every tensor the harness builds.
///
/// The half precision variants are stored as their raw 16-bit encodings,
/// never as a host f32.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericPrecision {
    FP32,
    FP16,
    BF16,
    I16,
    I32,
}

impl NumericPrecision {
    pub fn all() -> Vec<NumericPrecision> {
        vec![
            NumericPrecision::FP32,
            NumericPrecision::FP16,
            NumericPrecision::BF16,
            NumericPrecision::I16,
            NumericPrecision::I32,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            NumericPrecision::FP32 => "FP32",
            NumericPrecision::FP16 => "FP16",
            NumericPrecision::BF16 => "BF16",
            NumericPrecision::I16 => "I16",
            NumericPrecision::I32 => "I32",
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            NumericPrecision::FP32 | NumericPrecision::I32 => 4,
            NumericPrecision::FP16 | NumericPrecision::BF16 | NumericPrecision::I16 => 2,
        }
    }

    /// Append the little-endian encoding of `value` to `out`.
    ///
    /// Integer precisions round to nearest and saturate at the type bounds.
    pub fn encode_into(&self, value: f64, out: &mut Vec<u8>) {
        match self {
            NumericPrecision::FP32 => out.extend_from_slice(&(value as f32).to_le_bytes()),
            NumericPrecision::FP16 => {
                out.extend_from_slice(&f16::from_f64(value).to_bits().to_le_bytes())
            }
            NumericPrecision::BF16 => {
                out.extend_from_slice(&bf16::from_f64(value).to_bits().to_le_bytes())
            }
            NumericPrecision::I16 => out.extend_from_slice(&(value.round() as i16).to_le_bytes()),
            NumericPrecision::I32 => out.extend_from_slice(&(value.round() as i32).to_le_bytes()),
        }
    }

    /// Decode one element. `bytes` must be exactly `size_in_bytes()` long.
    pub fn decode(&self, bytes: &[u8]) -> f64 {
        match self {
            NumericPrecision::FP32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            NumericPrecision::FP16 => f16::from_bits(u16::from_le_bytes([bytes[0], bytes[1]])).to_f64(),
            NumericPrecision::BF16 => bf16::from_bits(u16::from_le_bytes([bytes[0], bytes[1]])).to_f64(),
            NumericPrecision::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as f64,
            NumericPrecision::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
        }
    }
}

impl Display for NumericPrecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fp16_is_stored_as_raw_bits() {
        let mut out = Vec::new();
        NumericPrecision::FP16.encode_into(3.0, &mut out);
        assert_eq!(out, 0x4200u16.to_le_bytes().to_vec());
        assert_eq!(NumericPrecision::FP16.decode(&out), 3.0);
    }

    #[test]
    fn integer_encoding_saturates() {
        let mut out = Vec::new();
        NumericPrecision::I16.encode_into(1.0e9, &mut out);
        assert_eq!(NumericPrecision::I16.decode(&out), i16::MAX as f64);
    }

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = NumericPrecision::all().iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), NumericPrecision::all().len());
    }
}
