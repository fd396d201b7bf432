#[allow(clippy::module_inception)]
pub mod transpose;

pub use transpose::TransposeInstruction;
