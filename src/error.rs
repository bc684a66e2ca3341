use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use rand_distr::uniform::Error as UniformError;

/// The result type used across the whole crate.
pub type Result<T> = std::result::Result<T, GcnErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum GcnErr {
    Io(io::Error),
    Json(serde_json::Error),
    Tensor(safetensors::SafeTensorError),
    Shape(ndarray::ShapeError),
    /// A configuration option was rejected, caught before any computation starts.
    InvalidConfig(String),
    FaceIndexOutOfRange {
        face: usize,
        index: usize,
        vertices: usize,
    },
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    LabelOutOfRange {
        vertex: usize,
        label: usize,
        classes: usize,
    },
    Parse {
        path: PathBuf,
        line: usize,
        msg: String,
    },
    /// A weight artifact holds something other than a 2D `F32` tensor.
    TensorFormat {
        path: PathBuf,
        msg: String,
    },
    /// A sparse row lists the same column twice.
    DuplicateEntry {
        row: usize,
        column: usize,
    },
    MissingArtifact(PathBuf),
    DepthMismatch {
        declared: usize,
        found: usize,
    },
    Init(String),
}

impl Display for GcnErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GcnErr::Io(e) => write!(f, "io error: {e}"),
            GcnErr::Json(e) => write!(f, "json error: {e}"),
            GcnErr::Tensor(e) => write!(f, "tensor file error: {e}"),
            GcnErr::Shape(e) => write!(f, "shape error: {e}"),
            GcnErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            GcnErr::FaceIndexOutOfRange {
                face,
                index,
                vertices,
            } => write!(
                f,
                "face {face} references vertex {index}, but the mesh only has {vertices} vertices"
            ),
            GcnErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "size mismatch for {what}: got {got}, expected {expected}"),
            GcnErr::LabelOutOfRange {
                vertex,
                label,
                classes,
            } => write!(
                f,
                "vertex {vertex} has label {label}, outside of the {classes} known classes"
            ),
            GcnErr::Parse { path, line, msg } => {
                write!(f, "{}:{line}: {msg}", path.display())
            }
            GcnErr::TensorFormat { path, msg } => write!(f, "{}: {msg}", path.display()),
            GcnErr::DuplicateEntry { row, column } => {
                write!(f, "sparse row {row} lists column {column} more than once")
            }
            GcnErr::MissingArtifact(path) => write!(f, "missing artifact {}", path.display()),
            GcnErr::DepthMismatch { declared, found } => write!(
                f,
                "checkpoint declares {declared} layers but {found} weight artifacts are present"
            ),
            GcnErr::Init(msg) => write!(f, "weight initialization failed: {msg}"),
        }
    }
}

impl Error for GcnErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GcnErr::Io(e) => Some(e),
            GcnErr::Json(e) => Some(e),
            GcnErr::Tensor(e) => Some(e),
            GcnErr::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GcnErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for GcnErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<safetensors::SafeTensorError> for GcnErr {
    fn from(value: safetensors::SafeTensorError) -> Self {
        Self::Tensor(value)
    }
}

impl From<ndarray::ShapeError> for GcnErr {
    fn from(value: ndarray::ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<UniformError> for GcnErr {
    fn from(value: UniformError) -> Self {
        Self::Init(value.to_string())
    }
}
