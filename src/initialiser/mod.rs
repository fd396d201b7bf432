pub mod input_pattern;
pub mod weight_pattern;

pub use input_pattern::{INPUT_PATTERN_PERIOD, generate_input, generate_input_for_dims};
pub use weight_pattern::generate_weights;
