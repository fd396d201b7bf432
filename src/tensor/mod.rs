mod desc;
pub mod element;
mod precision;
mod shape;
mod tensor;

pub use desc::TensorDesc;
pub use element::{Accumulation, Element};
pub use precision::NumericPrecision;
pub use shape::TensorShape;
pub use tensor::Tensor;
