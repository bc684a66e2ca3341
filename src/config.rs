use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{GcnErr, Result};

/// Every option recognized by a training run. There are no defaults: a config file missing any
/// of these fields, or carrying an unknown one, is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GcnConfig {
    pub hidden_size: usize,
    pub gnn_depth: usize,
    pub dropout: f32,
    pub learning_rate: f32,
    pub epochs: usize,
    pub random_seed: u64,
}

impl GcnConfig {
    /// Creates a new validated `GcnConfig`.
    ///
    /// # Arguments
    /// * `hidden_size` - The width of every hidden layer.
    /// * `gnn_depth` - The amount of graph convolution layers, at least 2.
    /// * `dropout` - The drop probability of hidden activations, in `[0, 1)`.
    /// * `learning_rate` - The step size of the optimizer.
    /// * `epochs` - The amount of full passes over the mesh.
    /// * `random_seed` - Seed for weight initialization and dropout masks.
    ///
    /// # Returns
    /// The config or an `InvalidConfig` error naming the offending option.
    pub fn new(
        hidden_size: usize,
        gnn_depth: usize,
        dropout: f32,
        learning_rate: f32,
        epochs: usize,
        random_seed: u64,
    ) -> Result<Self> {
        let config = Self {
            hidden_size,
            gnn_depth,
            dropout,
            learning_rate,
            epochs,
            random_seed,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a `GcnConfig` from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every option against its allowed range.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(GcnErr::InvalidConfig(msg));

        if self.hidden_size == 0 {
            return invalid("hidden_size must be positive".into());
        }
        if self.gnn_depth < 2 {
            return invalid(format!("gnn_depth must be at least 2, got {}", self.gnn_depth));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid(format!("dropout must be in [0, 1), got {}", self.dropout));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid(format!(
                "learning_rate must be finite and positive, got {}",
                self.learning_rate
            ));
        }
        if self.epochs == 0 {
            return invalid("epochs must be positive".into());
        }

        Ok(())
    }
}
