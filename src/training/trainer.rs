use log::{debug, info};
use ndarray::ArrayView2;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{EpochStats, accuracy};
use crate::{
    GcnErr, GcnModel, Result,
    arch::{
        activations::Dropout,
        backward, forward, logits,
        loss::{CrossEntropy, LossFn},
    },
    config::GcnConfig,
    graph::SparseMatrix,
    optimization::{Adam, Optimizer},
};

/// A model `Trainer`. Owns the model, its optimizer state and the random number generator for
/// the whole run.
pub struct Trainer<O, L, R>
where
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    model: GcnModel,
    optimizer: O,
    loss_fn: L,
    dropout: Dropout,
    epochs: usize,
    rng: R,
}

impl Trainer<Adam, CrossEntropy, StdRng> {
    /// Builds a `Trainer` following a config: a Xavier initialized model and an Adam optimizer,
    /// both seeded from `random_seed`.
    ///
    /// # Arguments
    /// * `config` - The training options.
    /// * `input_size` - The width of the feature matrix.
    /// * `num_classes` - The amount of classes to predict.
    pub fn from_config(config: &GcnConfig, input_size: usize, num_classes: usize) -> Result<Self> {
        config.validate()?;

        let mut rng = StdRng::seed_from_u64(config.random_seed);
        let model = GcnModel::new(
            input_size,
            config.hidden_size,
            num_classes,
            config.gnn_depth,
            &mut rng,
        )?;

        let optimizer = Adam::new(
            model.weights().iter().map(|w| w.dim()),
            config.learning_rate,
        );

        info!(
            "model: {input_size} → {} × {} → {num_classes}, dropout {}, lr {}",
            config.hidden_size,
            config.gnn_depth - 1,
            config.dropout,
            config.learning_rate
        );

        Ok(Self::new(
            model,
            optimizer,
            CrossEntropy::new(),
            Dropout::new(config.dropout)?,
            config.epochs,
            rng,
        ))
    }
}

impl<O, L, R> Trainer<O, L, R>
where
    O: Optimizer,
    L: LossFn,
    R: Rng,
{
    /// Returns a new `Trainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - Updates the model's weights after every epoch.
    /// * `loss_fn` - Measures the difference between the model's output and the labels.
    /// * `dropout` - Applied to every hidden layer while training.
    /// * `epochs` - The amount of full passes over the mesh.
    /// * `rng` - Decides the dropout masks.
    pub fn new(
        model: GcnModel,
        optimizer: O,
        loss_fn: L,
        dropout: Dropout,
        epochs: usize,
        rng: R,
    ) -> Self {
        Self {
            model,
            optimizer,
            loss_fn,
            dropout,
            epochs,
            rng,
        }
    }

    /// Runs every epoch: forward, loss, backward and one optimizer step.
    ///
    /// # Arguments
    /// * `adjacency` - The normalized adjacency of the training mesh.
    /// * `features` - One row per vertex.
    /// * `labels` - One class id per vertex.
    ///
    /// # Returns
    /// The stats of every epoch, or an error if the inputs don't fit each other or the model.
    pub fn train(
        &mut self,
        adjacency: &SparseMatrix,
        features: ArrayView2<f32>,
        labels: &[usize],
    ) -> Result<Vec<EpochStats>> {
        self.check_labels(adjacency, labels)?;

        let log_every = (self.epochs / 10).max(1);
        let mut history = Vec::with_capacity(self.epochs);

        for epoch in 1..=self.epochs {
            let pass = forward(
                &self.model,
                adjacency,
                features,
                Some((&self.dropout, &mut self.rng)),
            )?;

            let loss = self.loss_fn.loss(pass.logits.view(), labels);
            let acc = accuracy(pass.logits.view(), labels);
            let d_logits = self.loss_fn.loss_prime(pass.logits.view(), labels);

            let grads = backward(&self.model, adjacency, &pass, d_logits)?;
            self.optimizer
                .update_params(&grads, self.model.weights_mut())?;

            let stats = EpochStats {
                epoch,
                loss,
                accuracy: acc,
            };

            if epoch % log_every == 0 || epoch == self.epochs {
                info!("epoch {epoch}/{}: loss {loss:.5}, accuracy {acc:.4}", self.epochs);
            } else {
                debug!("epoch {epoch}/{}: loss {loss:.5}, accuracy {acc:.4}", self.epochs);
            }

            history.push(stats);
        }

        Ok(history)
    }

    /// Returns the accuracy of a dropout-free pass over the mesh.
    pub fn evaluate(
        &self,
        adjacency: &SparseMatrix,
        features: ArrayView2<f32>,
        labels: &[usize],
    ) -> Result<f32> {
        self.check_labels(adjacency, labels)?;
        let out = logits(&self.model, adjacency, features)?;
        Ok(accuracy(out.view(), labels))
    }

    pub fn model(&self) -> &GcnModel {
        &self.model
    }

    /// Ends the run, dropping the optimizer state.
    pub fn into_model(self) -> GcnModel {
        self.model
    }

    fn check_labels(&self, adjacency: &SparseMatrix, labels: &[usize]) -> Result<()> {
        if labels.len() != adjacency.nrows() {
            return Err(GcnErr::SizeMismatch {
                what: "labels",
                got: labels.len(),
                expected: adjacency.nrows(),
            });
        }

        let classes = self.model.output_size();
        if let Some((vertex, &label)) = labels.iter().enumerate().find(|(_, l)| **l >= classes) {
            return Err(GcnErr::LabelOutOfRange {
                vertex,
                label,
                classes,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_adjacency, normalize};
    use ndarray::{Array2, array};

    fn config(depth: usize, dropout: f32) -> GcnConfig {
        GcnConfig::new(8, depth, dropout, 0.05, 150, 3).unwrap()
    }

    #[test]
    fn two_disconnected_triangles_are_separated() {
        let adj = normalize(&build_adjacency(&[[0, 1, 2], [3, 4, 5]], 6).unwrap());
        let x = array![
            [1.0, 0.0],
            [1.0, 0.1],
            [0.9, 0.0],
            [0.0, 1.0],
            [0.1, 1.0],
            [0.0, 0.9],
        ];
        let y = [0, 0, 0, 1, 1, 1];

        let mut trainer = Trainer::from_config(&config(2, 0.0), 2, 2).unwrap();
        let history = trainer.train(&adj, x.view(), &y).unwrap();

        assert_eq!(history.len(), 150);
        assert!(history.last().unwrap().loss < history[0].loss);
        assert_eq!(trainer.evaluate(&adj, x.view(), &y).unwrap(), 1.0);
    }

    #[test]
    fn deep_model_with_dropout_still_learns() {
        let adj = normalize(&build_adjacency(&[[0, 1, 2], [3, 4, 5]], 6).unwrap());
        let x = array![
            [1.0, 0.0],
            [1.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.0, 1.0],
            [0.0, 1.0],
        ];
        let y = [1, 1, 1, 0, 0, 0];

        let mut trainer = Trainer::from_config(&config(3, 0.2), 2, 2).unwrap();
        let history = trainer.train(&adj, x.view(), &y).unwrap();

        let early: f32 = history[..10].iter().map(|s| s.loss).sum::<f32>() / 10.;
        let late: f32 = history[140..].iter().map(|s| s.loss).sum::<f32>() / 10.;
        assert!(late < early);
        assert_eq!(trainer.evaluate(&adj, x.view(), &y).unwrap(), 1.0);
    }

    #[test]
    fn same_seed_same_weights() {
        let adj = normalize(&build_adjacency(&[[0, 1, 2], [1, 2, 3]], 4).unwrap());
        let x = array![[1.0, 0.0], [0.5, 0.5], [0.2, 0.8], [0.0, 1.0]];
        let y = [0, 0, 1, 1];

        let run = || {
            let mut trainer = Trainer::from_config(&config(3, 0.3), 2, 2).unwrap();
            trainer.train(&adj, x.view(), &y).unwrap();
            trainer.into_model()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn rejects_out_of_range_labels() {
        let adj = normalize(&build_adjacency(&[[0, 1, 2]], 3).unwrap());
        let x = Array2::zeros((3, 2));
        let mut trainer = Trainer::from_config(&config(2, 0.0), 2, 2).unwrap();

        assert!(matches!(
            trainer.train(&adj, x.view(), &[0, 2, 1]),
            Err(GcnErr::LabelOutOfRange {
                vertex: 1,
                label: 2,
                classes: 2
            })
        ));
        assert!(trainer.train(&adj, x.view(), &[0, 1]).is_err());
    }
}
