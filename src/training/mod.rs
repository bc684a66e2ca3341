mod stats;
mod trainer;

pub use stats::{EpochStats, accuracy};
pub use trainer::Trainer;
