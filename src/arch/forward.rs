use ndarray::{Array2, ArrayView2};
use rand::{Rng, rngs::StdRng};

use super::{
    GcnModel,
    activations::{Dropout, Relu},
};
use crate::{GcnErr, Result, graph::SparseMatrix};

/// What the forward pass remembers about one layer for the backward pass.
#[derive(Debug, Clone)]
pub enum LayerRecord {
    Hidden {
        /// `Â · H_(i-1)`, the layer input after neighbour aggregation.
        propagated: Array2<f32>,
        /// `ReLU(Z_i)`, before dropout.
        activation: Array2<f32>,
        /// `None` when dropout was disabled.
        mask: Option<Array2<f32>>,
    },
    Output {
        propagated: Array2<f32>,
    },
}

impl LayerRecord {
    pub fn propagated(&self) -> &Array2<f32> {
        match self {
            LayerRecord::Hidden { propagated, .. } | LayerRecord::Output { propagated } => {
                propagated
            }
        }
    }
}

/// The result of a forward pass: the final logits and one record per layer, in layer order.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    pub records: Vec<LayerRecord>,
    pub logits: Array2<f32>,
}

/// Makes a forward pass through the network.
///
/// Hidden layers compute `ReLU(Â · H · W)` followed by dropout, the last layer computes the
/// raw logits `Â · H · W`.
///
/// # Arguments
/// * `model` - The weights.
/// * `adjacency` - The normalized adjacency of the mesh.
/// * `features` - One row per vertex.
/// * `dropout` - The dropout of the hidden layers with the rng deciding the masks, `None`
///   disables it.
///
/// # Returns
/// The pass, or a `SizeMismatch` if the inputs don't fit the model or each other.
pub fn forward<R: Rng + ?Sized>(
    model: &GcnModel,
    adjacency: &SparseMatrix,
    features: ArrayView2<f32>,
    mut dropout: Option<(&Dropout, &mut R)>,
) -> Result<ForwardPass> {
    if features.nrows() != adjacency.nrows() {
        return Err(GcnErr::SizeMismatch {
            what: "feature rows",
            got: features.nrows(),
            expected: adjacency.nrows(),
        });
    }
    if features.ncols() != model.input_size() {
        return Err(GcnErr::SizeMismatch {
            what: "feature width",
            got: features.ncols(),
            expected: model.input_size(),
        });
    }

    let Some((w_out, hidden)) = model.weights().split_last() else {
        return Err(GcnErr::InvalidConfig("a model needs an output layer".into()));
    };

    let mut records = Vec::with_capacity(model.depth());
    let mut h = features.to_owned();

    for w in hidden {
        let propagated = adjacency.dot(h.view())?;
        let activation = Relu.forward(propagated.dot(w));
        h = activation.clone();

        let mask = match dropout.as_mut() {
            Some((dropout, rng)) => dropout.forward(h.view_mut(), &mut **rng),
            None => None,
        };

        records.push(LayerRecord::Hidden {
            propagated,
            activation,
            mask,
        });
    }

    let propagated = adjacency.dot(h.view())?;
    let logits = propagated.dot(w_out);
    records.push(LayerRecord::Output { propagated });

    Ok(ForwardPass { records, logits })
}

/// Makes a dropout-free forward pass and returns only the logits.
pub fn logits(
    model: &GcnModel,
    adjacency: &SparseMatrix,
    features: ArrayView2<f32>,
) -> Result<Array2<f32>> {
    let pass = forward::<StdRng>(model, adjacency, features, None)?;
    Ok(pass.logits)
}
