use ndarray::{Array2, ArrayView2, Axis};

use super::LossFn;

/// Multi-class cross entropy over a softmax of the logits.
#[derive(Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }

    /// Row-wise softmax, each row's max is subtracted before exponentiating.
    pub fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
        let mut probs = logits.to_owned();

        for mut row in probs.axis_iter_mut(Axis(0)) {
            let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
            row.mapv_inplace(|x| (x - max).exp());
            let sum = row.sum();
            row /= sum;
        }

        probs
    }
}

impl LossFn for CrossEntropy {
    fn loss(&self, logits: ArrayView2<f32>, labels: &[usize]) -> f32 {
        let n = logits.nrows();
        if n == 0 {
            return 0.;
        }

        let total: f32 = logits
            .axis_iter(Axis(0))
            .zip(labels)
            .map(|(row, &label)| {
                let max = row.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
                let log_sum = row.iter().map(|&x| (x - max).exp()).sum::<f32>().ln();
                log_sum - (row[label] - max)
            })
            .sum();

        total / n as f32
    }

    fn loss_prime(&self, logits: ArrayView2<f32>, labels: &[usize]) -> Array2<f32> {
        let n = logits.nrows().max(1) as f32;
        let mut d = Self::softmax(logits);

        for (mut row, &label) in d.axis_iter_mut(Axis(0)).zip(labels) {
            row[label] -= 1.;
        }

        d /= n;
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn softmax_rows_sum_to_one() {
        let probs = CrossEntropy::softmax(array![[1.0, 2.0, 3.0], [1000.0, 1000.0, 0.0]].view());

        for row in probs.axis_iter(Axis(0)) {
            assert!((row.sum() - 1.0).abs() < 1e-6);
        }
        assert!((probs[[1, 0]] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn uniform_logits_loss_is_log_classes() {
        let logits = Array2::zeros((4, 3));
        let loss = CrossEntropy.loss(logits.view(), &[0, 1, 2, 0]);
        assert!((loss - 3f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn large_logits_stay_finite() {
        let logits = array![[1e4, -1e4], [-1e4, 1e4]];
        let loss = CrossEntropy.loss(logits.view(), &[0, 0]);
        assert!(loss.is_finite());
        assert!((loss - 1e4).abs() < 1.0);
    }

    #[test]
    fn gradient_is_softmax_minus_one_hot_over_n() {
        let logits = array![[0.0, 0.0], [2.0, 0.0]];
        let d = CrossEntropy.loss_prime(logits.view(), &[1, 0]);
        let probs = CrossEntropy::softmax(logits.view());

        assert!((d[[0, 0]] - 0.25).abs() < 1e-6);
        assert!((d[[0, 1]] + 0.25).abs() < 1e-6);
        assert!((d[[1, 0]] - (probs[[1, 0]] - 1.0) / 2.0).abs() < 1e-6);
        assert!(d.sum().abs() < 1e-6);
    }
}
