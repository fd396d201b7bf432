#[allow(clippy::module_inception)]
pub mod conv;
pub mod cpu;
pub mod reference;

pub use conv::ConvInstruction;
