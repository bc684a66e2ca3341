use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::Result;

/// A weight generator that samples every entry of a matrix from a probabilistic distribution.
pub struct RandWeightGen<D: Distribution<f32>> {
    shape: (usize, usize),
    distribution: D,
}

impl<D: Distribution<f32>> RandWeightGen<D> {
    /// Creates a new `RandWeightGen` weight generator.
    ///
    /// # Arguments
    /// * `shape` - The `(rows, cols)` of the generated matrices.
    /// * `distribution` - The distribution to sample the entries from.
    pub fn new(shape: (usize, usize), distribution: D) -> Self {
        Self {
            shape,
            distribution,
        }
    }

    /// Samples a new matrix, entries are drawn in row-major order.
    ///
    /// # Arguments
    /// * `rng` - The random number generator driving the samples.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array2<f32> {
        Array2::from_shape_simple_fn(self.shape, || self.distribution.sample(rng))
    }
}

impl RandWeightGen<Uniform<f32>> {
    /// Creates a new `RandWeightGen` using Xavier uniform initialization, entries are drawn
    /// from `U(-sqrt(6 / (rows + cols)), sqrt(6 / (rows + cols)))`.
    ///
    /// # Arguments
    /// * `shape` - The `(fan_in, fan_out)` of the weight matrix.
    ///
    /// # Returns
    /// An error if the calculated range is invalid (an empty shape).
    pub fn xavier_uniform(shape: (usize, usize)) -> Result<Self> {
        let (fan_in, fan_out) = shape;
        let range = (6. / (fan_in + fan_out) as f32).sqrt();
        Ok(Self::new(shape, Uniform::new(-range, range)?))
    }
}
