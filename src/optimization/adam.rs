use ndarray::{Array2, Zip};

use super::Optimizer;
use crate::{GcnErr, Result};

const BETA1: f32 = 0.9;
const BETA2: f32 = 0.999;
const EPSILON: f32 = 1e-8;

/// Adaptive moment estimation with bias correction. Keeps a first and second moment
/// accumulator per weight matrix and a shared step counter.
#[derive(Debug)]
pub struct Adam {
    learning_rate: f32,
    beta1_t: f32,
    beta2_t: f32,
    step: usize,
    m: Vec<Array2<f32>>,
    v: Vec<Array2<f32>>,
}

impl Adam {
    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `shapes` - The shape of every weight matrix this instance will update.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    ///
    /// # Returns
    /// A new `Adam` instance.
    pub fn new<I>(shapes: I, learning_rate: f32) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let m: Vec<_> = shapes.into_iter().map(Array2::zeros).collect();
        let v = m.clone();

        Self {
            learning_rate,
            beta1_t: 1.,
            beta2_t: 1.,
            step: 0,
            m,
            v,
        }
    }

    /// Returns the amount of updates made so far.
    pub fn step(&self) -> usize {
        self.step
    }
}

impl Optimizer for Adam {
    fn update_params(
        &mut self,
        grads: &[Array2<f32>],
        params: &mut [Array2<f32>],
    ) -> Result<()> {
        if grads.len() != params.len() || params.len() != self.m.len() {
            return Err(GcnErr::SizeMismatch {
                what: "optimized matrices",
                got: grads.len(),
                expected: self.m.len(),
            });
        }

        for ((g, p), m) in grads.iter().zip(params.iter()).zip(&self.m) {
            if g.dim() != p.dim() || p.dim() != m.dim() {
                return Err(GcnErr::SizeMismatch {
                    what: "optimized matrix entries",
                    got: g.len(),
                    expected: m.len(),
                });
            }
        }

        self.step += 1;
        self.beta1_t *= BETA1;
        self.beta2_t *= BETA2;

        let lr = self.learning_rate;
        let bc1 = 1. - self.beta1_t;
        let bc2 = 1. - self.beta2_t;

        for (((g, p), m), v) in grads
            .iter()
            .zip(params.iter_mut())
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
        {
            Zip::from(p).and(g).and(m).and(v).for_each(|p, &g, m, v| {
                *m = BETA1 * *m + (1. - BETA1) * g;
                *v = BETA2 * *v + (1. - BETA2) * g * g;
                let m_hat = *m / bc1;
                let v_hat = *v / bc2;
                *p -= lr * m_hat / (v_hat.sqrt() + EPSILON);
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn first_step_moves_by_learning_rate() {
        let mut params = vec![array![[1.0, -1.0]], array![[0.5]]];
        let grads = vec![array![[2.0, -0.5]], array![[0.0]]];
        let mut adam = Adam::new(params.iter().map(|p| p.dim()), 0.1);

        adam.update_params(&grads, &mut params).unwrap();

        // With bias correction the first step is lr * sign(g).
        assert!((params[0][[0, 0]] - 0.9).abs() < 1e-5);
        assert!((params[0][[0, 1]] + 0.9).abs() < 1e-5);
        assert_eq!(params[1][[0, 0]], 0.5);
        assert_eq!(adam.step(), 1);
    }

    #[test]
    fn matches_reference_update() {
        let mut params = vec![array![[0.0]]];
        let mut adam = Adam::new([(1, 1)], 0.01);
        let gs = [1.0f32, -2.0, 0.5];

        let (mut m, mut v, mut w) = (0f32, 0f32, 0f32);
        for (t, g) in gs.iter().enumerate() {
            adam.update_params(&[array![[*g]]], &mut params).unwrap();

            let t = t as i32 + 1;
            m = 0.9 * m + 0.1 * g;
            v = 0.999 * v + 0.001 * g * g;
            let m_hat = m / (1. - 0.9f32.powi(t));
            let v_hat = v / (1. - 0.999f32.powi(t));
            w -= 0.01 * m_hat / (v_hat.sqrt() + 1e-8);
        }

        assert!((params[0][[0, 0]] - w).abs() < 1e-6);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let mut params = vec![array![[0.0, 0.0]]];
        let mut adam = Adam::new([(1, 2)], 0.01);

        assert!(adam.update_params(&[array![[1.0]]], &mut params).is_err());
        assert!(adam.update_params(&[], &mut params).is_err());
        assert_eq!(adam.step(), 0);
    }
}
