use ndarray::Array2;

use super::{
    ForwardPass, GcnModel, LayerRecord,
    activations::{Dropout, Relu},
};
use crate::{GcnErr, Result, graph::SparseMatrix};

/// Back-propagates the gradient of the loss with respect to the logits through every layer.
///
/// Walking from the last layer down, layer `i` yields `dW_i = (Â · H_(i-1))ᵗ · dZ_i`, and the
/// gradient handed to the layer below is `Â · (dZ_i · W_iᵗ)`, gated first by that layer's
/// dropout mask and then by its ReLU output. No gradient is computed for the input features.
/// The mask gating does not rescale survivors, see [`Dropout::backward`].
///
/// # Arguments
/// * `model` - The weights the pass was made with.
/// * `adjacency` - The same normalized adjacency the pass was made with.
/// * `pass` - The forward pass records.
/// * `d_logits` - The gradient of the loss with respect to `pass.logits`.
///
/// # Returns
/// One gradient per weight matrix, in layer order.
pub fn backward(
    model: &GcnModel,
    adjacency: &SparseMatrix,
    pass: &ForwardPass,
    d_logits: Array2<f32>,
) -> Result<Vec<Array2<f32>>> {
    let depth = model.depth();
    if pass.records.len() != depth {
        return Err(GcnErr::SizeMismatch {
            what: "layer records",
            got: pass.records.len(),
            expected: depth,
        });
    }
    if d_logits.dim() != pass.logits.dim() {
        return Err(GcnErr::SizeMismatch {
            what: "logits gradient rows",
            got: d_logits.nrows(),
            expected: pass.logits.nrows(),
        });
    }

    let mut grads = Vec::with_capacity(depth);
    let mut d = d_logits;

    for i in (0..depth).rev() {
        let w = &model.weights()[i];
        grads.push(pass.records[i].propagated().t().dot(&d));

        if i == 0 {
            break;
        }

        let mut back = adjacency.dot(d.dot(&w.t()).view())?;

        match &pass.records[i - 1] {
            LayerRecord::Hidden {
                activation, mask, ..
            } => {
                if let Some(mask) = mask {
                    Dropout::backward(back.view_mut(), mask);
                }
                Relu.backward(back.view_mut(), activation.view());
            }
            LayerRecord::Output { .. } => {
                return Err(GcnErr::InvalidConfig(format!(
                    "layer {} is recorded as an output layer",
                    i - 1
                )));
            }
        }

        d = back;
    }

    grads.reverse();
    Ok(grads)
}
