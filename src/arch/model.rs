use ndarray::Array2;
use rand::Rng;

use crate::{GcnErr, Result, initialization::RandWeightGen};

/// The trainable parameters of a graph convolutional network: one weight matrix per layer,
/// chaining `input → hidden → ... → hidden → output`.
#[derive(Debug, Clone, PartialEq)]
pub struct GcnModel {
    weights: Vec<Array2<f32>>,
}

impl GcnModel {
    /// Creates a new `GcnModel` with Xavier uniform initialized weights.
    ///
    /// # Arguments
    /// * `input_size` - The width of the feature matrix.
    /// * `hidden_size` - The width of every hidden layer.
    /// * `output_size` - The amount of classes.
    /// * `depth` - The amount of layers, at least 2.
    /// * `rng` - The random number generator the weights are sampled with.
    ///
    /// # Returns
    /// The model, or an `InvalidConfig` error for a degenerate architecture.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        depth: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let dims = Self::layer_dims(input_size, hidden_size, output_size, depth)?;
        let mut weights = Vec::with_capacity(depth);

        for dim in dims {
            let weight_gen = RandWeightGen::xavier_uniform(dim)?;
            weights.push(weight_gen.sample(rng));
        }

        Ok(Self { weights })
    }

    /// Creates a `GcnModel` from already existing weights.
    ///
    /// # Returns
    /// The model, or an error if there are less than 2 matrices or their dimensions don't chain.
    pub fn from_weights(weights: Vec<Array2<f32>>) -> Result<Self> {
        if weights.len() < 2 {
            return Err(GcnErr::InvalidConfig(format!(
                "a model needs at least 2 layers, got {}",
                weights.len()
            )));
        }

        for pair in weights.windows(2) {
            if pair[0].ncols() != pair[1].nrows() {
                return Err(GcnErr::SizeMismatch {
                    what: "chained layer rows",
                    got: pair[1].nrows(),
                    expected: pair[0].ncols(),
                });
            }
        }

        Ok(Self { weights })
    }

    /// Returns the `(rows, cols)` of every layer of the given architecture.
    pub fn layer_dims(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        depth: usize,
    ) -> Result<Vec<(usize, usize)>> {
        if depth < 2 {
            return Err(GcnErr::InvalidConfig(format!(
                "gnn_depth must be at least 2, got {depth}"
            )));
        }
        if input_size == 0 || hidden_size == 0 || output_size == 0 {
            return Err(GcnErr::InvalidConfig(format!(
                "layer widths must be positive, got {input_size}/{hidden_size}/{output_size}"
            )));
        }

        let mut dims = Vec::with_capacity(depth);
        dims.push((input_size, hidden_size));
        dims.extend((0..depth - 2).map(|_| (hidden_size, hidden_size)));
        dims.push((hidden_size, output_size));
        Ok(dims)
    }

    /// Returns the amount of layers.
    pub fn depth(&self) -> usize {
        self.weights.len()
    }

    /// Returns the expected width of the feature matrix.
    pub fn input_size(&self) -> usize {
        self.weights[0].nrows()
    }

    /// Returns the amount of classes.
    pub fn output_size(&self) -> usize {
        self.weights[self.weights.len() - 1].ncols()
    }

    pub fn weights(&self) -> &[Array2<f32>] {
        &self.weights
    }

    /// The matrices can be modified in place but never added or removed.
    pub fn weights_mut(&mut self) -> &mut [Array2<f32>] {
        &mut self.weights
    }
}
