//! Graph convolutional vertex classification for triangulated surface meshes.
//!
//! A mesh is turned into a symmetric-normalized adjacency, a stack of graph convolution layers
//! is trained on labeled vertices with a hand-written backward pass and Adam, and the trained
//! weights are persisted to label the vertices of unseen meshes.

pub mod arch;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod graph;
pub mod inference;
pub mod initialization;
pub mod mesh;
pub mod optimization;
pub mod training;

pub use arch::GcnModel;
pub use config::GcnConfig;
pub use error::{GcnErr, Result};
pub use inference::{Prediction, Predictor};
pub use mesh::{ClassNames, Mesh, MeshData};
pub use training::{EpochStats, Trainer};
