pub mod error;
pub mod padding;
