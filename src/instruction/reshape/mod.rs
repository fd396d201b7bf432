#[allow(clippy::module_inception)]
pub mod reshape;

pub use reshape::ReshapeInstruction;
