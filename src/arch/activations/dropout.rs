use ndarray::{Array2, ArrayViewMut2};
use rand::Rng;

use crate::{GcnErr, Result};

/// Inverted dropout: zeroes each activation with probability `p` and scales the survivors by
/// `1 / (1 - p)`, leaving the expected value unchanged.
#[derive(Clone, Copy, Debug)]
pub struct Dropout {
    p: f32,
}

impl Dropout {
    /// Creates a new `Dropout`.
    ///
    /// # Returns
    /// An error if `p` is not in `[0, 1)`.
    pub fn new(p: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&p) {
            return Err(GcnErr::InvalidConfig(format!(
                "dropout must be in [0, 1), got {p}"
            )));
        }

        Ok(Self { p })
    }

    /// A dropout that never drops anything.
    pub fn disabled() -> Self {
        Self { p: 0. }
    }

    pub fn p(&self) -> f32 {
        self.p
    }

    /// Applies dropout to `h` in place.
    ///
    /// # Arguments
    /// * `h` - The activations.
    /// * `rng` - Decides which entries are dropped.
    ///
    /// # Returns
    /// The keep mask (`1.0` kept, `0.0` dropped), or `None` when dropout is disabled, in which
    /// case `rng` is not touched.
    pub fn forward<R: Rng + ?Sized>(
        &self,
        mut h: ArrayViewMut2<f32>,
        rng: &mut R,
    ) -> Option<Array2<f32>> {
        if self.p == 0. {
            return None;
        }

        let mask = Array2::from_shape_simple_fn(h.dim(), || {
            if rng.random::<f32>() < self.p { 0. } else { 1. }
        });

        let scale = 1. / (1. - self.p);
        h.zip_mut_with(&mask, |h, &m| *h *= m * scale);
        Some(mask)
    }

    /// Zeroes the gradient wherever `mask` dropped the activation.
    ///
    /// Surviving entries are left as they are and not multiplied by `1 / (1 - p)`, so past every
    /// dropout layer the result is the exact derivative scaled down by `1 - p`. Adam's update is
    /// invariant to that constant factor.
    pub fn backward(mut d: ArrayViewMut2<f32>, mask: &Array2<f32>) {
        d.zip_mut_with(mask, |d, &m| {
            if m == 0. {
                *d = 0.;
            }
        });
    }
}
