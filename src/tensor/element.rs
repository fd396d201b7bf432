use bytemuck::Pod;
use half::{bf16, f16};

/// How the CPU kernels accumulate products for narrow element types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Accumulation {
    /// Accumulate in a wider type, round once when storing.
    Wide,
    /// Round to the element type after every multiply-accumulate.
    Native,
}

/// Element types the CPU kernels are instantiated for.
pub trait Element: Pod + Send + Sync {
    type Acc: Copy;

    fn acc_zero() -> Self::Acc;

    fn mul_add(acc: Self::Acc, a: Self, b: Self, accumulation: Accumulation) -> Self::Acc;

    fn finish(acc: Self::Acc) -> Self;
}

impl Element for f32 {
    type Acc = f32;

    fn acc_zero() -> f32 {
        0.0
    }

    fn mul_add(acc: f32, a: f32, b: f32, _accumulation: Accumulation) -> f32 {
        acc + a * b
    }

    fn finish(acc: f32) -> f32 {
        acc
    }
}

macro_rules! impl_half_element {
    ($t:ty) => {
        impl Element for $t {
            type Acc = f32;

            fn acc_zero() -> f32 {
                0.0
            }

            fn mul_add(acc: f32, a: $t, b: $t, accumulation: Accumulation) -> f32 {
                let sum = acc + a.to_f32() * b.to_f32();
                match accumulation {
                    Accumulation::Wide => sum,
                    Accumulation::Native => <$t>::from_f32(sum).to_f32(),
                }
            }

            fn finish(acc: f32) -> $t {
                <$t>::from_f32(acc)
            }
        }
    };
}

impl_half_element!(f16);
impl_half_element!(bf16);

macro_rules! impl_int_element {
    ($t:ty) => {
        impl Element for $t {
            type Acc = i64;

            fn acc_zero() -> i64 {
                0
            }

            fn mul_add(acc: i64, a: $t, b: $t, accumulation: Accumulation) -> i64 {
                let sum = acc.saturating_add(a as i64 * b as i64);
                match accumulation {
                    Accumulation::Wide => sum,
                    Accumulation::Native => sum.clamp(<$t>::MIN as i64, <$t>::MAX as i64),
                }
            }

            fn finish(acc: i64) -> $t {
                acc.clamp(<$t>::MIN as i64, <$t>::MAX as i64) as $t
            }
        }
    };
}

impl_int_element!(i16);
impl_int_element!(i32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_half_accumulation_rounds_each_step() {
        // 2048 + 1 is not representable in f16, so native accumulation loses the 1
        let big = f16::from_f32(2048.0);
        let one = f16::from_f32(1.0);

        let wide = <f16 as Element>::mul_add(
            <f16 as Element>::mul_add(0.0, big, one, Accumulation::Wide),
            one,
            one,
            Accumulation::Wide,
        );
        let native = <f16 as Element>::mul_add(
            <f16 as Element>::mul_add(0.0, big, one, Accumulation::Native),
            one,
            one,
            Accumulation::Native,
        );

        assert_eq!(wide, 2049.0);
        assert_eq!(native, 2048.0);
    }

    #[test]
    fn integer_finish_saturates() {
        let acc = <i16 as Element>::mul_add(0, i16::MAX, 4, Accumulation::Wide);
        assert_eq!(<i16 as Element>::finish(acc), i16::MAX);
        assert_eq!(<i32 as Element>::finish(-5), -5);
    }
}
