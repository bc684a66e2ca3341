pub mod activations;
mod backward;
mod forward;
pub mod loss;
mod model;

pub use backward::backward;
pub use forward::{ForwardPass, LayerRecord, forward, logits};
pub use model::GcnModel;
