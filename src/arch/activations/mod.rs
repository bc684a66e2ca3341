mod dropout;
mod relu;

pub use dropout::Dropout;
pub use relu::Relu;
