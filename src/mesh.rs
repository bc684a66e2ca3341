use std::{
    collections::BTreeMap,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::info;
use ndarray::Array2;

use crate::{GcnErr, Result};

pub const VERTICES_FILE: &str = "vertices.csv";
pub const FACES_FILE: &str = "faces.csv";
pub const FEATURES_FILE: &str = "features.csv";
pub const LABELS_FILE: &str = "labels.csv";
pub const CLASSES_FILE: &str = "classes.json";

/// A triangulated surface. Face indices are only checked when the graph is built.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<[f32; 3]>,
    faces: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new(vertices: Vec<[f32; 3]>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }
}

/// Human-readable region names, keyed by class id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNames(BTreeMap<usize, String>);

impl ClassNames {
    pub fn new(names: BTreeMap<usize, String>) -> Self {
        Self(names)
    }

    /// Reads a `{ "<id>": "<name>" }` JSON object.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let raw: BTreeMap<String, String> = serde_json::from_str(&content)?;

        let names = raw
            .into_iter()
            .map(|(id, name)| {
                let id = id.trim().parse::<usize>().map_err(|e| GcnErr::Parse {
                    path: path.to_path_buf(),
                    line: 0,
                    msg: format!("class id '{id}': {e}"),
                })?;
                Ok((id, name))
            })
            .collect::<Result<_>>()?;

        Ok(Self(names))
    }

    pub fn get(&self, class: usize) -> Option<&str> {
        self.0.get(&class).map(String::as_str)
    }

    /// Returns one more than the highest named class id, zero when empty.
    pub fn num_classes(&self) -> usize {
        self.0.keys().next_back().map_or(0, |&id| id + 1)
    }
}

/// Everything the engine consumes about one mesh: its surface, the per-vertex features and,
/// for training, the per-vertex labels.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub mesh: Mesh,
    pub features: Array2<f32>,
    pub labels: Option<Vec<usize>>,
    pub class_names: ClassNames,
}

impl MeshData {
    /// Creates a new `MeshData`.
    ///
    /// # Returns
    /// The data, or a `SizeMismatch` if the features or labels don't have one row per vertex.
    pub fn new(
        mesh: Mesh,
        features: Array2<f32>,
        labels: Option<Vec<usize>>,
        class_names: ClassNames,
    ) -> Result<Self> {
        let n = mesh.num_vertices();

        if features.nrows() != n {
            return Err(GcnErr::SizeMismatch {
                what: "feature rows",
                got: features.nrows(),
                expected: n,
            });
        }
        if let Some(got) = labels.as_ref().map(Vec::len).filter(|&len| len != n) {
            return Err(GcnErr::SizeMismatch {
                what: "labels",
                got,
                expected: n,
            });
        }

        Ok(Self {
            mesh,
            features,
            labels,
            class_names,
        })
    }

    /// Loads a mesh directory. `labels.csv` and `classes.json` are optional.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let vertices = read_rows::<f32>(&dir.join(VERTICES_FILE), Some(3))?
            .into_iter()
            .map(|v| [v[0], v[1], v[2]])
            .collect();

        let faces = read_rows::<usize>(&dir.join(FACES_FILE), Some(3))?
            .into_iter()
            .map(|f| [f[0], f[1], f[2]])
            .collect();

        let features = read_matrix(&dir.join(FEATURES_FILE))?;

        let labels_path = dir.join(LABELS_FILE);
        let labels = if labels_path.exists() {
            let rows = read_rows::<usize>(&labels_path, Some(1))?;
            Some(rows.into_iter().map(|r| r[0]).collect())
        } else {
            None
        };

        let classes_path = dir.join(CLASSES_FILE);
        let class_names = if classes_path.exists() {
            ClassNames::from_file(&classes_path)?
        } else {
            ClassNames::default()
        };

        let data = Self::new(Mesh::new(vertices, faces), features, labels, class_names)?;
        info!(
            "loaded {}: {} vertices, {} faces, {} features per vertex, labels {}",
            dir.display(),
            data.mesh.num_vertices(),
            data.mesh.faces().len(),
            data.features.ncols(),
            if data.labels.is_some() { "present" } else { "absent" },
        );

        Ok(data)
    }

    /// Returns the labels, failing when the directory had none.
    pub fn require_labels(&self) -> Result<&[usize]> {
        self.labels
            .as_deref()
            .ok_or_else(|| GcnErr::MissingArtifact(PathBuf::from(LABELS_FILE)))
    }

    /// Returns the amount of classes: one more than the highest label, or the amount of named
    /// classes if that is larger.
    pub fn num_classes(&self) -> usize {
        let from_labels = self
            .labels
            .as_ref()
            .and_then(|l| l.iter().max())
            .map_or(0, |&max| max + 1);

        from_labels.max(self.class_names.num_classes())
    }
}

/// Reads a comma separated file, skipping blank lines.
///
/// # Arguments
/// * `path` - The file to read.
/// * `width` - The amount of values every row must have, `None` only requires all rows to be
///   equally wide.
fn read_rows<T>(path: &Path, width: Option<usize>) -> Result<Vec<Vec<T>>>
where
    T: FromStr,
    T::Err: Display,
{
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => GcnErr::MissingArtifact(path.to_path_buf()),
        _ => GcnErr::Io(e),
    })?;

    let mut rows = Vec::new();
    let mut expected = width;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parse_err = |msg: String| GcnErr::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            msg,
        };

        let values = line
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<T>()
                    .map_err(|e| parse_err(format!("cannot parse '{}': {e}", v.trim())))
            })
            .collect::<Result<Vec<_>>>()?;

        match expected {
            Some(w) if w != values.len() => {
                return Err(parse_err(format!(
                    "expected {w} values, got {}",
                    values.len()
                )));
            }
            None => expected = Some(values.len()),
            _ => {}
        }

        rows.push(values);
    }

    Ok(rows)
}

fn read_matrix(path: &Path) -> Result<Array2<f32>> {
    let rows = read_rows::<f32>(path, None)?;
    let ncols = rows.first().map_or(0, Vec::len);
    let nrows = rows.len();
    let data = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((nrows, ncols), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn quad_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), VERTICES_FILE, "0,0,0\n1,0,0\n1,1,0\n0,1,0\n");
        write(dir.path(), FACES_FILE, "0,1,2\n0,2,3\n");
        write(dir.path(), FEATURES_FILE, "1,0\n1,0\n\n0,1\n0,1\n");
        dir
    }

    #[test]
    fn loads_a_directory() {
        let dir = quad_dir();
        write(dir.path(), LABELS_FILE, "0\n0\n1\n1\n");
        write(dir.path(), CLASSES_FILE, r#"{ "0": "frontal", "1": "parietal" }"#);

        let data = MeshData::load(dir.path()).unwrap();

        assert_eq!(data.mesh.num_vertices(), 4);
        assert_eq!(data.mesh.faces(), &[[0, 1, 2], [0, 2, 3]]);
        assert_eq!(data.features.dim(), (4, 2));
        assert_eq!(data.labels.as_deref(), Some(&[0, 0, 1, 1][..]));
        assert_eq!(data.class_names.get(1), Some("parietal"));
        assert_eq!(data.num_classes(), 2);
    }

    #[test]
    fn labels_are_optional() {
        let dir = quad_dir();
        let data = MeshData::load(dir.path()).unwrap();

        assert!(data.labels.is_none());
        assert!(matches!(
            data.require_labels(),
            Err(GcnErr::MissingArtifact(_))
        ));
    }

    #[test]
    fn feature_rows_must_match_vertices() {
        let dir = quad_dir();
        write(dir.path(), FEATURES_FILE, "1,0\n1,0\n0,1\n");

        assert!(matches!(
            MeshData::load(dir.path()),
            Err(GcnErr::SizeMismatch {
                what: "feature rows",
                got: 3,
                expected: 4
            })
        ));
    }

    #[test]
    fn label_rows_must_match_vertices() {
        let dir = quad_dir();
        write(dir.path(), LABELS_FILE, "0\n1\n");

        assert!(matches!(
            MeshData::load(dir.path()),
            Err(GcnErr::SizeMismatch { what: "labels", .. })
        ));
    }

    #[test]
    fn malformed_values_name_the_line() {
        let dir = quad_dir();
        write(dir.path(), FACES_FILE, "0,1,2\n0,two,3\n");

        let err = MeshData::load(dir.path()).unwrap_err();
        assert!(matches!(err, GcnErr::Parse { line: 2, .. }));
    }

    #[test]
    fn ragged_features_are_rejected() {
        let dir = quad_dir();
        write(dir.path(), FEATURES_FILE, "1,0\n1,0\n0,1,5\n0,1\n");

        assert!(matches!(
            MeshData::load(dir.path()),
            Err(GcnErr::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn missing_faces_file() {
        let dir = quad_dir();
        fs::remove_file(dir.path().join(FACES_FILE)).unwrap();

        assert!(matches!(
            MeshData::load(dir.path()),
            Err(GcnErr::MissingArtifact(_))
        ));
    }

    #[test]
    fn named_classes_can_exceed_labels() {
        let names = ClassNames::new(BTreeMap::from([(0, "a".into()), (4, "e".into())]));
        assert_eq!(names.num_classes(), 5);
    }
}
