//! Errors that abort an export.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// A mesh object has nothing in its first material slot
    #[error("Mesh object \"{object}\" has no material slots")]
    MissingMaterialSlot { object: String },

    /// An object was classified as smoke but its modifier has no domain settings
    #[error("Smoke object \"{object}\" has no smoke domain settings")]
    MissingModifier { object: String },

    /// A mesh object points at a model that is not in the scene
    #[error("Mesh object \"{object}\" refers to a missing model")]
    MissingGeometry { object: String },

    /// A face refers to a vertex the model does not have
    #[error("Model \"{model}\" has a face referencing vertex {index} of {vertex_count}")]
    InvalidGeometry {
        model: String,
        index: u32,
        vertex_count: usize,
    },

    /// Per-vertex normals do not line up with the positions
    #[error("Model \"{model}\" has {normal_count} normals for {vertex_count} vertices")]
    MismatchedNormals {
        model: String,
        normal_count: usize,
        vertex_count: usize,
    },

    #[error("Failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Attaches the file being written to an I/O error.
pub(crate) trait IoResultExt<T> {
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
