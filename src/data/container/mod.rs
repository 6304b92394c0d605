//! Read-only access to hierarchical, named-dataset model containers.
//!
//! Every backend exposes the same small surface: test whether a path exists
//! and read numeric or string datasets. The loader never sees the backend's
//! binary layout.

mod json;
#[cfg(feature = "hdf5")]
mod h5;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::Array2;

use crate::error::{ModelError, Result};

pub use json::JsonContainer;
#[cfg(feature = "hdf5")]
pub use h5::Hdf5Container;

/// First eight bytes of every HDF5 file without a user block.
const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1a, b'\n'];

/// UTF-8 byte order mark, written by some editors and Windows tools.
pub(crate) const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

// ---------------------------------------------------------------------------
// Container trait
// ---------------------------------------------------------------------------

/// A hierarchical container of named datasets.
///
/// Paths are `/`-separated and relative to the root. Missing paths and
/// datasets of the wrong kind are reported as [`ModelError::Schema`].
pub trait Container: std::fmt::Debug {
    /// Short format name used in messages.
    fn format(&self) -> &'static str;

    /// Whether a group or dataset exists at `path`.
    fn contains(&self, path: &str) -> bool;

    /// Whether `path` is a dataset (as opposed to a group).
    fn is_dataset(&self, path: &str) -> bool;

    /// Read a numeric dataset of any rank, row-major.
    fn read_numeric(&self, path: &str) -> Result<NumericDataset>;

    /// Read a 1-D string dataset.
    fn read_strings(&self, path: &str) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// NumericDataset – shape + flat values
// ---------------------------------------------------------------------------

/// A numeric dataset as read from a container (row-major values).
#[derive(Debug, Clone, PartialEq)]
pub struct NumericDataset {
    pub path: String,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

impl NumericDataset {
    /// Interpret as a 1-D vector.
    pub fn into_vector(self) -> Result<Vec<f64>> {
        if self.shape.len() != 1 {
            return Err(ModelError::schema(
                self.path,
                format!("expected a 1-D dataset, found shape {:?}", self.shape),
            ));
        }
        Ok(self.values)
    }

    /// Interpret as a 2-D matrix.
    pub fn into_matrix(self) -> Result<Array2<f64>> {
        if self.shape.len() != 2 {
            return Err(ModelError::schema(
                self.path,
                format!("expected a 2-D dataset, found shape {:?}", self.shape),
            ));
        }
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let path = self.path;
        Array2::from_shape_vec((rows, cols), self.values)
            .map_err(|e| ModelError::schema(path, format!("inconsistent dataset shape: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Opening files
// ---------------------------------------------------------------------------

/// Open a model container, choosing the backend from the file's first bytes.
///
/// * HDF5 signature → [`Hdf5Container`] (requires the `hdf5` feature)
/// * a JSON document → [`JsonContainer`]
pub fn open(path: &Path) -> Result<Box<dyn Container>> {
    let mut head = Vec::with_capacity(HDF5_SIGNATURE.len());
    File::open(path)?
        .take(HDF5_SIGNATURE.len() as u64)
        .read_to_end(&mut head)?;

    if head.as_slice() == HDF5_SIGNATURE {
        return open_hdf5(path);
    }

    // all-whitespace head: let the JSON parser decide
    let text = head.strip_prefix(UTF8_BOM.as_slice()).unwrap_or(head.as_slice());
    let first = text.iter().find(|b| !b.is_ascii_whitespace());
    if matches!(first, Some(b'{') | None) {
        return Ok(Box::new(JsonContainer::open(path)?));
    }

    Err(ModelError::Format {
        format: "model",
        reason: format!(
            "{} is neither an HDF5 file nor a JSON document",
            path.display()
        ),
    })
}

#[cfg(feature = "hdf5")]
fn open_hdf5(path: &Path) -> Result<Box<dyn Container>> {
    Ok(Box::new(Hdf5Container::open(path)?))
}

#[cfg(not(feature = "hdf5"))]
fn open_hdf5(path: &Path) -> Result<Box<dyn Container>> {
    Err(ModelError::Format {
        format: "HDF5",
        reason: format!(
            "{} is an HDF5 file but this build has no HDF5 support (enable the `hdf5` feature)",
            path.display()
        ),
    })
}
