use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use ndarray::Array2;
use safetensors::{Dtype, SafeTensors, tensor::TensorView};
use serde::{Deserialize, Serialize};

use crate::{GcnErr, GcnModel, Result};

pub const DEPTH_FILE: &str = "depth.json";
pub const WEIGHT_TENSOR: &str = "weight";

/// The record stating how many weight artifacts make up a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthDescriptor {
    pub num_layers: usize,
}

/// Returns the artifact file name of the `i`-th layer.
pub fn layer_file(i: usize) -> String {
    format!("layer_{i}.safetensors")
}

/// Persists a model as one safetensors file per layer plus a depth descriptor.
///
/// Everything is first written to a sibling staging directory which then replaces `dir`, so a
/// failure midway never leaves a partial set behind at `dir`.
pub fn save<P: AsRef<Path>>(model: &GcnModel, dir: P) -> Result<()> {
    let dir = dir.as_ref();
    let staging = sibling(dir, "partial")?;
    let previous = sibling(dir, "old")?;

    if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    if let Err(e) = write_artifacts(model, &staging) {
        warn!("failed to write checkpoint, discarding {}", staging.display());
        let _ = fs::remove_dir_all(&staging);
        return Err(e);
    }

    if dir.exists() {
        if previous.exists() {
            fs::remove_dir_all(&previous)?;
        }
        fs::rename(dir, &previous)?;
        fs::rename(&staging, dir)?;
        fs::remove_dir_all(&previous)?;
    } else {
        fs::rename(&staging, dir)?;
    }

    info!("saved {} layers to {}", model.depth(), dir.display());
    Ok(())
}

/// Loads a model saved with [`save`]. The depth descriptor is read first and the amount of
/// weight artifacts present must match it exactly.
pub fn load<P: AsRef<Path>>(dir: P) -> Result<GcnModel> {
    let dir = dir.as_ref();
    let depth_path = dir.join(DEPTH_FILE);
    if !depth_path.exists() {
        return Err(GcnErr::MissingArtifact(depth_path));
    }

    let descriptor: DepthDescriptor = serde_json::from_str(&fs::read_to_string(&depth_path)?)?;
    let declared = descriptor.num_layers;

    let found = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| is_layer_file(&entry.file_name().to_string_lossy()))
        .count();

    if found != declared {
        return Err(GcnErr::DepthMismatch { declared, found });
    }

    let mut weights = Vec::with_capacity(declared);
    for i in 0..declared {
        let path = dir.join(layer_file(i));
        if !path.exists() {
            return Err(GcnErr::MissingArtifact(path));
        }
        weights.push(read_weight(&path)?);
    }

    let model = GcnModel::from_weights(weights)?;
    info!("loaded {} layers from {}", model.depth(), dir.display());
    Ok(model)
}

fn write_artifacts(model: &GcnModel, dir: &Path) -> Result<()> {
    for (i, w) in model.weights().iter().enumerate() {
        let data: Vec<f32> = w.iter().copied().collect();
        let bytes: &[u8] = bytemuck::cast_slice(&data);
        let view = TensorView::new(Dtype::F32, vec![w.nrows(), w.ncols()], bytes)?;
        let tensors = HashMap::from([(WEIGHT_TENSOR.to_string(), view)]);

        fs::write(dir.join(layer_file(i)), safetensors::serialize(&tensors, &None)?)?;
    }

    let descriptor = DepthDescriptor {
        num_layers: model.depth(),
    };
    fs::write(dir.join(DEPTH_FILE), serde_json::to_string_pretty(&descriptor)?)?;

    Ok(())
}

fn read_weight(path: &Path) -> Result<Array2<f32>> {
    let bytes = fs::read(path)?;
    let tensors = SafeTensors::deserialize(&bytes)?;
    let view = tensors.tensor(WEIGHT_TENSOR)?;

    let shape = view.shape();
    if view.dtype() != Dtype::F32 || shape.len() != 2 {
        return Err(GcnErr::TensorFormat {
            path: path.to_path_buf(),
            msg: format!("expected a 2D F32 tensor, got {:?} {shape:?}", view.dtype()),
        });
    }

    let data: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());

    Ok(Array2::from_shape_vec((shape[0], shape[1]), data)?)
}

fn is_layer_file(name: &str) -> bool {
    name.strip_prefix("layer_")
        .and_then(|rest| rest.strip_suffix(".safetensors"))
        .is_some_and(|i| i.parse::<usize>().is_ok())
}

fn sibling(dir: &Path, suffix: &str) -> Result<PathBuf> {
    let name = dir.file_name().ok_or_else(|| {
        GcnErr::InvalidConfig(format!("{} is not a checkpoint directory", dir.display()))
    })?;

    let mut name = name.to_os_string();
    name.push(format!(".{suffix}"));
    Ok(dir.with_file_name(name))
}
