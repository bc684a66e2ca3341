use std::{env, path::Path};

use anyhow::{Context, bail};
use log::info;

use mesh_gcn::{
    GcnConfig, MeshData, Predictor, Trainer, checkpoint,
    graph::{build_adjacency, normalize},
};

const USAGE: &str = "usage:
    mesh_gcn train <config.json> <data_dir> <checkpoint_dir>
    mesh_gcn infer <checkpoint_dir> <data_dir> <output.json>";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["train", config, data, ckpt] => train(config, data, ckpt),
        ["infer", ckpt, data, output] => infer(ckpt, data, output),
        _ => bail!("{USAGE}"),
    }
}

fn train(config_path: &str, data_dir: &str, checkpoint_dir: &str) -> anyhow::Result<()> {
    let config = GcnConfig::from_file(config_path)
        .with_context(|| format!("reading config {config_path}"))?;
    let data = MeshData::load(data_dir).with_context(|| format!("loading {data_dir}"))?;
    let labels = data.require_labels()?;

    let adjacency = normalize(&build_adjacency(
        data.mesh.faces(),
        data.mesh.num_vertices(),
    )?);
    info!(
        "graph: {} vertices, {} stored entries",
        adjacency.nrows(),
        adjacency.nnz()
    );

    let mut trainer = Trainer::from_config(&config, data.features.ncols(), data.num_classes())?;
    let history = trainer.train(&adjacency, data.features.view(), labels)?;

    let accuracy = trainer.evaluate(&adjacency, data.features.view(), labels)?;
    if let Some(last) = history.last() {
        info!(
            "finished {} epochs: loss {:.5}, training accuracy {accuracy:.4}",
            last.epoch, last.loss
        );
    }

    checkpoint::save(trainer.model(), checkpoint_dir)
        .with_context(|| format!("saving checkpoint to {checkpoint_dir}"))?;
    Ok(())
}

fn infer(checkpoint_dir: &str, data_dir: &str, output: &str) -> anyhow::Result<()> {
    let predictor = Predictor::load(checkpoint_dir)
        .with_context(|| format!("loading checkpoint {checkpoint_dir}"))?;
    let data = MeshData::load(data_dir).with_context(|| format!("loading {data_dir}"))?;

    let prediction = predictor.predict(&data.mesh, data.features.view())?;
    for (class, vertices) in prediction.regions() {
        let name = data.class_names.get(*class).unwrap_or("-");
        info!("class {class} ({name}): {} vertices", vertices.len());
    }

    prediction.write_json(Path::new(output), &data.class_names)?;
    info!("wrote {output}");
    Ok(())
}
