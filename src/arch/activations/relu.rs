use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// Rectified linear unit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Relu;

impl Relu {
    pub fn f(&self, z: f32) -> f32 {
        z.max(0.)
    }

    /// Applies the activation to every entry of `z`.
    pub fn forward(&self, z: Array2<f32>) -> Array2<f32> {
        z.mapv_into(|z| self.f(z))
    }

    /// Zeroes the gradient wherever the stored activation output was not positive.
    ///
    /// # Arguments
    /// * `d` - The gradient with respect to the activation output, gated in place.
    /// * `a` - The activation output of the forward pass.
    pub fn backward(&self, mut d: ArrayViewMut2<f32>, a: ArrayView2<f32>) {
        d.zip_mut_with(&a, |d, &a| {
            if a <= 0. {
                *d = 0.;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn clamps_negatives() {
        let a = Relu.forward(array![[-1.0, 0.0, 2.5]]);
        assert_eq!(a, array![[0.0, 0.0, 2.5]]);
    }

    #[test]
    fn gates_gradient_on_non_positive_outputs() {
        let a = array![[0.0, 1.0, 3.0]];
        let mut d = array![[5.0, 5.0, -2.0]];
        Relu.backward(d.view_mut(), a.view());
        assert_eq!(d, array![[0.0, 5.0, -2.0]]);
    }
}
