use ndarray::ArrayView2;

use crate::inference::argmax_rows;

/// The outcome of one training epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    /// 1-indexed.
    pub epoch: usize,
    pub loss: f32,
    /// Fraction of vertices whose highest logit is their label.
    pub accuracy: f32,
}

/// Returns the fraction of rows of `logits` whose argmax equals the label.
pub fn accuracy(logits: ArrayView2<f32>, labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.;
    }

    let hits = argmax_rows(logits)
        .into_iter()
        .zip(labels)
        .filter(|(pred, label)| pred == *label)
        .count();

    hits as f32 / labels.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn counts_hits() {
        let logits = array![[1.0, 0.0], [0.0, 1.0], [2.0, 3.0], [5.0, -1.0]];
        assert_eq!(accuracy(logits.view(), &[0, 1, 0, 1]), 0.5);
    }
}
