use ndarray::{Array2, ArrayView2};

/// A loss over per-vertex logits and integer class labels.
pub trait LossFn {
    /// Returns the mean loss over every row of `logits`.
    fn loss(&self, logits: ArrayView2<f32>, labels: &[usize]) -> f32;

    /// Returns the gradient of `loss` with respect to `logits`.
    fn loss_prime(&self, logits: ArrayView2<f32>, labels: &[usize]) -> Array2<f32>;
}
