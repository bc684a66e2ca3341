use ndarray::Array2;

use crate::Result;

pub trait Optimizer {
    /// Updates every weight matrix in place with its gradient, one call per epoch.
    ///
    /// # Arguments
    /// * `grads` - One gradient per weight matrix, same shapes and order as `params`.
    /// * `params` - The weight matrices to update.
    fn update_params(&mut self, grads: &[Array2<f32>], params: &mut [Array2<f32>])
    -> Result<()>;
}
