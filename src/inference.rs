use std::{collections::BTreeMap, fs, path::Path};

use log::info;
use ndarray::{ArrayView2, Axis};
use serde::Serialize;

use crate::{
    GcnErr, GcnModel, Result,
    arch::logits,
    checkpoint,
    graph::{build_adjacency, normalize},
    mesh::{ClassNames, Mesh},
};

/// Returns the index of the highest value of every row, the first one on ties.
pub fn argmax_rows(logits: ArrayView2<f32>) -> Vec<usize> {
    logits
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |(best, max), (i, &x)| {
                    if x > max { (i, x) } else { (best, max) }
                })
                .0
        })
        .collect()
}

/// The predicted class of every vertex of a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    labels: Vec<usize>,
    regions: BTreeMap<usize, Vec<usize>>,
}

#[derive(Serialize)]
struct RegionRecord<'a> {
    class: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    vertices: &'a [usize],
}

impl Prediction {
    /// Groups per-vertex labels by class, vertices stay in ascending order.
    pub fn from_labels(labels: Vec<usize>) -> Self {
        let mut regions: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (vertex, &class) in labels.iter().enumerate() {
            regions.entry(class).or_default().push(vertex);
        }

        Self { labels, regions }
    }

    /// One class id per vertex.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// The vertices assigned to each class. Classes no vertex was assigned to are absent.
    pub fn regions(&self) -> &BTreeMap<usize, Vec<usize>> {
        &self.regions
    }

    /// Writes the regions as a JSON array, naming every class found in `names`.
    pub fn write_json<P: AsRef<Path>>(&self, path: P, names: &ClassNames) -> Result<()> {
        let records: Vec<_> = self
            .regions
            .iter()
            .map(|(&class, vertices)| RegionRecord {
                class,
                name: names.get(class),
                vertices,
            })
            .collect();

        fs::write(path, serde_json::to_string_pretty(&records)?)?;
        Ok(())
    }
}

/// Labels the vertices of new meshes with a trained model.
#[derive(Debug, Clone)]
pub struct Predictor {
    model: GcnModel,
}

impl Predictor {
    pub fn new(model: GcnModel) -> Self {
        Self { model }
    }

    /// Loads the model from a checkpoint directory.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self::new(checkpoint::load(dir)?))
    }

    pub fn model(&self) -> &GcnModel {
        &self.model
    }

    /// Builds the mesh graph, runs a dropout-free forward pass and picks the class with the
    /// highest logit for every vertex.
    ///
    /// # Arguments
    /// * `mesh` - The surface to label.
    /// * `features` - One row per vertex of `mesh`.
    pub fn predict(&self, mesh: &Mesh, features: ArrayView2<f32>) -> Result<Prediction> {
        if features.nrows() != mesh.num_vertices() {
            return Err(GcnErr::SizeMismatch {
                what: "feature rows",
                got: features.nrows(),
                expected: mesh.num_vertices(),
            });
        }

        let adjacency = normalize(&build_adjacency(mesh.faces(), mesh.num_vertices())?);
        let out = logits(&self.model, &adjacency, features)?;
        let prediction = Prediction::from_labels(argmax_rows(out.view()));

        info!(
            "labeled {} vertices into {} regions",
            prediction.labels.len(),
            prediction.regions.len()
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn argmax_takes_first_on_ties() {
        let logits = array![[1.0, 3.0, 3.0], [0.0, 0.0, 0.0], [-1.0, -5.0, -0.5]];
        assert_eq!(argmax_rows(logits.view()), vec![1, 0, 2]);
    }

    #[test]
    fn argmax_survives_nan() {
        let logits = array![[f32::NAN, f32::NAN], [f32::NAN, 1.0]];
        assert_eq!(argmax_rows(logits.view()), vec![0, 1]);
    }

    #[test]
    fn groups_vertices_by_class() {
        let prediction = Prediction::from_labels(vec![2, 0, 2, 2, 0]);

        assert_eq!(prediction.regions()[&0], vec![1, 4]);
        assert_eq!(prediction.regions()[&2], vec![0, 2, 3]);
        assert!(!prediction.regions().contains_key(&1));
    }

    #[test]
    fn every_vertex_gets_a_valid_class() {
        let mut rng = StdRng::seed_from_u64(4);
        let model = GcnModel::new(3, 6, 5, 3, &mut rng).unwrap();
        let mesh = Mesh::new(vec![[0.0; 3]; 6], vec![[0, 1, 2], [2, 3, 4]]);
        let features = Array2::from_shape_fn((6, 3), |(i, j)| (i * 3 + j) as f32 / 10.);

        let prediction = Predictor::new(model).predict(&mesh, features.view()).unwrap();

        assert_eq!(prediction.labels().len(), 6);
        assert!(prediction.labels().iter().all(|&c| c < 5));
        let grouped: usize = prediction.regions().values().map(Vec::len).sum();
        assert_eq!(grouped, 6);
    }

    #[test]
    fn invalid_face_is_fatal() {
        let mut rng = StdRng::seed_from_u64(4);
        let model = GcnModel::new(3, 6, 2, 2, &mut rng).unwrap();
        let mesh = Mesh::new(vec![[0.0; 3]; 3], vec![[0, 1, 3]]);
        let features = Array2::zeros((3, 3));

        assert!(matches!(
            Predictor::new(model).predict(&mesh, features.view()),
            Err(GcnErr::FaceIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn writes_named_regions() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("predictions.json");
        let names = ClassNames::new(BTreeMap::from([(1, "temporal".to_string())]));

        Prediction::from_labels(vec![1, 0, 1])
            .write_json(&path, &names)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["class"], 0);
        assert!(value[0].get("name").is_none());
        assert_eq!(value[1]["name"], "temporal");
        assert_eq!(value[1]["vertices"], serde_json::json!([0, 2]));
    }
}
