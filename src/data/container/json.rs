use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value as JsonValue;

use super::{Container, NumericDataset, UTF8_BOM};
use crate::error::{ModelError, Result};

// ---------------------------------------------------------------------------
// JSON container
// ---------------------------------------------------------------------------

/// The container hierarchy written out as a JSON document.
///
/// Objects are groups, arrays are datasets. A 1-D dataset is an array of
/// numbers or strings; a 2-D dataset is an array of equal-length number rows.
/// `null` entries in numeric datasets read as NaN.
///
/// ```json
/// {
///   "views": { "views": ["RNA", "ATAC"] },
///   "expectations": { "W": { "RNA": [[0.1, -0.4], [0.0, 1.2]] } }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JsonContainer {
    root: JsonValue,
}

impl JsonContainer {
    /// Parse a JSON container file. A leading UTF-8 byte order mark is skipped.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        if reader.fill_buf()?.starts_with(&UTF8_BOM) {
            reader.consume(UTF8_BOM.len());
        }
        let root: JsonValue =
            serde_json::from_reader(reader).map_err(|e| ModelError::Format {
                format: "JSON",
                reason: e.to_string(),
            })?;
        Self::from_value(root)
    }

    /// Wrap an in-memory JSON tree. The root must be an object.
    pub fn from_value(root: JsonValue) -> Result<Self> {
        if !root.is_object() {
            return Err(ModelError::Format {
                format: "JSON",
                reason: "top-level value must be an object".to_string(),
            });
        }
        Ok(Self { root })
    }

    fn lookup(&self, path: &str) -> Option<&JsonValue> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(&self.root, |node, part| node.as_object()?.get(part))
    }

    fn dataset(&self, path: &str) -> Result<&[JsonValue]> {
        match self.lookup(path) {
            Some(JsonValue::Array(items)) => Ok(items),
            Some(_) => Err(ModelError::schema(path, "expected a dataset, found a group")),
            None => Err(ModelError::schema(path, "section is missing")),
        }
    }
}

impl Container for JsonContainer {
    fn format(&self) -> &'static str {
        "JSON"
    }

    fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn is_dataset(&self, path: &str) -> bool {
        matches!(self.lookup(path), Some(JsonValue::Array(_)))
    }

    fn read_numeric(&self, path: &str) -> Result<NumericDataset> {
        let items = self.dataset(path)?;

        // 2-D when every entry is itself an array.
        if !items.is_empty() && items.iter().all(JsonValue::is_array) {
            let mut values = Vec::new();
            let mut cols = None;
            for (i, row) in items.iter().enumerate() {
                let row = row.as_array().map(Vec::as_slice).unwrap_or_default();
                match cols {
                    None => cols = Some(row.len()),
                    Some(n) if n != row.len() => {
                        return Err(ModelError::schema(
                            path,
                            format!("row {i} has {} values, expected {n}", row.len()),
                        ));
                    }
                    Some(_) => {}
                }
                for (j, v) in row.iter().enumerate() {
                    values.push(json_number(v).ok_or_else(|| {
                        ModelError::schema(path, format!("[{i}][{j}] is not a number"))
                    })?);
                }
            }
            return Ok(NumericDataset {
                path: path.to_string(),
                shape: vec![items.len(), cols.unwrap_or(0)],
                values,
            });
        }

        let values = items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                json_number(v)
                    .ok_or_else(|| ModelError::schema(path, format!("[{i}] is not a number")))
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(NumericDataset {
            path: path.to_string(),
            shape: vec![values.len()],
            values,
        })
    }

    fn read_strings(&self, path: &str) -> Result<Vec<String>> {
        self.dataset(path)?
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ModelError::schema(path, format!("[{i}] is not a string")))
            })
            .collect()
    }
}

fn json_number(val: &JsonValue) -> Option<f64> {
    match val {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::Null => Some(f64::NAN),
        _ => None,
    }
}
