use std::path::Path;

use hdf5::types::{FixedAscii, FixedUnicode, TypeDescriptor, VarLenAscii, VarLenUnicode};

use super::{Container, NumericDataset};
use crate::error::{ModelError, Result};

/// Longest fixed-length string read from a model file.
const MAX_FIXED_STRING: usize = 1024;

// ---------------------------------------------------------------------------
// HDF5 container
// ---------------------------------------------------------------------------

/// A model file in native HDF5 form, as written by mofapy2.
#[derive(Debug)]
pub struct Hdf5Container {
    file: hdf5::File,
}

impl Hdf5Container {
    pub fn open(path: &Path) -> Result<Self> {
        let file = hdf5::File::open(path).map_err(|e| ModelError::Format {
            format: "HDF5",
            reason: e.to_string(),
        })?;
        log::debug!("Opened HDF5 container {}", path.display());
        Ok(Self { file })
    }

    fn dataset(&self, path: &str) -> Result<hdf5::Dataset> {
        if !self.contains(path) {
            return Err(ModelError::schema(path, "section is missing"));
        }
        self.file
            .dataset(path)
            .map_err(|e| ModelError::schema(path, format!("expected a dataset: {e}")))
    }
}

impl Container for Hdf5Container {
    fn format(&self) -> &'static str {
        "HDF5"
    }

    fn contains(&self, path: &str) -> bool {
        // link_exists fails on missing intermediate groups, so walk the prefixes.
        let mut prefix = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            if !self.file.link_exists(&prefix) {
                return false;
            }
        }
        !prefix.is_empty()
    }

    fn is_dataset(&self, path: &str) -> bool {
        self.contains(path) && self.file.dataset(path).is_ok()
    }

    fn read_numeric(&self, path: &str) -> Result<NumericDataset> {
        let ds = self.dataset(path)?;
        let shape = ds.shape();
        let values = ds
            .read_raw::<f64>()
            .map_err(|e| ModelError::schema(path, format!("not a numeric dataset: {e}")))?;
        Ok(NumericDataset {
            path: path.to_string(),
            shape,
            values,
        })
    }

    fn read_strings(&self, path: &str) -> Result<Vec<String>> {
        let ds = self.dataset(path)?;
        let descriptor = ds
            .dtype()
            .and_then(|dt| dt.to_descriptor())
            .map_err(|e| ModelError::schema(path, e.to_string()))?;

        let read_err = |e: hdf5::Error| ModelError::schema(path, e.to_string());
        let strings = match descriptor {
            TypeDescriptor::VarLenUnicode => ds
                .read_raw::<VarLenUnicode>()
                .map_err(read_err)?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            TypeDescriptor::VarLenAscii => ds
                .read_raw::<VarLenAscii>()
                .map_err(read_err)?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            // numpy bytes arrays (`|S`) land here
            TypeDescriptor::FixedAscii(_) => ds
                .read_raw::<FixedAscii<MAX_FIXED_STRING>>()
                .map_err(read_err)?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            TypeDescriptor::FixedUnicode(_) => ds
                .read_raw::<FixedUnicode<MAX_FIXED_STRING>>()
                .map_err(read_err)?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            other => {
                return Err(ModelError::schema(
                    path,
                    format!("expected a string dataset, found {other:?}"),
                ));
            }
        };
        Ok(strings)
    }
}
