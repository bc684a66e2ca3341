mod builder;
mod normalize;
mod sparse;

pub use builder::build_adjacency;
pub use normalize::normalize;
pub use sparse::SparseMatrix;
