//! CSV and Parquet export of derived tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::data::{FeatureWeight, VarianceRow};
use crate::error::{ModelError, Result};

const WEIGHTS_HEADER: [&str; 2] = ["feature", "weight"];

// ---------------------------------------------------------------------------
// Output format dispatch
// ---------------------------------------------------------------------------

/// Table file format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "parquet" | "pq" => Ok(ExportFormat::Parquet),
            other => Err(ModelError::validation(format!(
                "unsupported export extension '.{other}' (use .csv or .parquet)"
            ))),
        }
    }
}

/// Write a weights table to `path` (`.csv` or `.parquet`).
pub fn save_weights(path: &Path, rows: &[FeatureWeight]) -> Result<()> {
    let format = ExportFormat::from_path(path)?;
    let file = File::create(path)?;
    match format {
        ExportFormat::Csv => write_weights_csv(file, rows)?,
        ExportFormat::Parquet => write_weights_parquet(file, rows)?,
    }
    log::info!("Exported {} weights to {}", rows.len(), path.display());
    Ok(())
}

/// Write a variance-explained table to `path` (`.csv` or `.parquet`).
pub fn save_variance(path: &Path, rows: &[VarianceRow]) -> Result<()> {
    let format = ExportFormat::from_path(path)?;
    let file = File::create(path)?;
    match format {
        ExportFormat::Csv => write_variance_csv(file, rows)?,
        ExportFormat::Parquet => write_variance_parquet(file, rows)?,
    }
    log::info!(
        "Exported {} variance-explained rows to {}",
        rows.len(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// `feature,weight` rows. Weights use the shortest exact decimal form, so a
/// re-read reproduces the same values.
pub fn write_weights_csv<W: Write>(writer: W, rows: &[FeatureWeight]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(WEIGHTS_HEADER)?;
    for row in rows {
        let weight = row.weight.to_string();
        wtr.write_record([row.feature.as_str(), weight.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parse a `feature,weight` CSV back into rows.
pub fn read_weights_csv<R: Read>(reader: R) -> Result<Vec<FeatureWeight>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.iter().ne(WEIGHTS_HEADER) {
        return Err(ModelError::Format {
            format: "weights CSV",
            reason: format!(
                "expected header 'feature,weight', found '{}'",
                headers.iter().collect::<Vec<_>>().join(",")
            ),
        });
    }
    rdr.deserialize()
        .map(|record| record.map_err(ModelError::from))
        .collect()
}

/// `view,factor,group,variance_explained` rows; the `group` column is only
/// written when at least one row carries a group.
pub fn write_variance_csv<W: Write>(writer: W, rows: &[VarianceRow]) -> Result<()> {
    let with_group = rows.iter().any(|r| r.group.is_some());
    let mut wtr = csv::Writer::from_writer(writer);

    if with_group {
        wtr.write_record(["view", "factor", "group", "variance_explained"])?;
    } else {
        wtr.write_record(["view", "factor", "variance_explained"])?;
    }
    for row in rows {
        let value = row.value.to_string();
        if with_group {
            let group = row.group.as_deref().unwrap_or("");
            wtr.write_record([row.view.as_str(), row.factor.as_str(), group, value.as_str()])?;
        } else {
            wtr.write_record([row.view.as_str(), row.factor.as_str(), value.as_str()])?;
        }
    }
    wtr.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

pub fn write_weights_parquet<W: Write + Send>(writer: W, rows: &[FeatureWeight]) -> Result<()> {
    let schema = Arc::new(ArrowSchema::new(vec![
        Field::new("feature", DataType::Utf8, false),
        Field::new("weight", DataType::Float64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.feature.as_str()))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.weight))),
    ];
    write_batch(writer, schema, columns)
}

pub fn write_variance_parquet<W: Write + Send>(writer: W, rows: &[VarianceRow]) -> Result<()> {
    let schema = Arc::new(ArrowSchema::new(vec![
        Field::new("view", DataType::Utf8, false),
        Field::new("factor", DataType::Utf8, false),
        Field::new("factor_index", DataType::UInt32, false),
        Field::new("group", DataType::Utf8, true),
        Field::new("variance_explained", DataType::Float64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.view.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.factor.as_str()))),
        Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.factor_index as u32))),
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.group.as_deref()).collect::<Vec<Option<&str>>>(),
        )),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.value))),
    ];
    write_batch(writer, schema, columns)
}

fn write_batch<W: Write + Send>(
    writer: W,
    schema: Arc<ArrowSchema>,
    columns: Vec<ArrayRef>,
) -> Result<()> {
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let mut writer = ArrowWriter::try_new(writer, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn weights() -> Vec<FeatureWeight> {
        vec![
            FeatureWeight { feature: "ENSG0001".into(), weight: -0.1234567890123 },
            FeatureWeight { feature: "chr1:100-600".into(), weight: 2.5e-9 },
            FeatureWeight { feature: "gene,with,commas".into(), weight: 0.0 },
        ]
    }

    fn variance_rows(grouped: bool) -> Vec<VarianceRow> {
        ["RNA", "ATAC"]
            .iter()
            .enumerate()
            .map(|(i, view)| VarianceRow {
                view: view.to_string(),
                factor_index: 1,
                factor: "Factor1".to_string(),
                group: grouped.then(|| "G1".to_string()),
                value: 10.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn test_weights_csv_round_trip() {
        let rows = weights();
        let mut buf = Vec::new();
        write_weights_csv(&mut buf, &rows).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("feature,weight\n"));

        let parsed = read_weights_csv(buf.as_slice()).unwrap();
        let expected: HashMap<String, f64> =
            rows.into_iter().map(|r| (r.feature, r.weight)).collect();
        let got: HashMap<String, f64> =
            parsed.into_iter().map(|r| (r.feature, r.weight)).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_read_weights_rejects_other_headers() {
        let err = read_weights_csv("gene,loading\ng1,0.5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ModelError::Format { .. }));
    }

    #[test]
    fn test_variance_csv_columns() {
        let mut buf = Vec::new();
        write_variance_csv(&mut buf, &variance_rows(true)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("view,factor,group,variance_explained"));
        assert_eq!(lines.next(), Some("RNA,Factor1,G1,10"));

        let mut buf = Vec::new();
        write_variance_csv(&mut buf, &variance_rows(false)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().next(), Some("view,factor,variance_explained"));
        assert_eq!(text.lines().nth(2), Some("ATAC,Factor1,11"));
    }

    #[test]
    fn test_weights_parquet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.parquet");
        save_weights(&path, &weights()).unwrap();

        let file = File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 3);

        let features = batches[0]
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(features.value(1), "chr1:100-600");
    }

    #[test]
    fn test_variance_parquet_nullable_group() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r2.pq");
        save_variance(&path, &variance_rows(false)).unwrap();

        let file = File::open(&path).unwrap();
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let batch = reader.next().unwrap().unwrap();
        assert_eq!(batch.num_columns(), 5);
        assert_eq!(batch.column(3).null_count(), 2);
    }

    #[test]
    fn test_save_csv_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weights.CSV");
        save_weights(&path, &weights()).unwrap();

        let parsed = read_weights_csv(File::open(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let err = save_weights(&dir.path().join("weights.xlsx"), &weights()).unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
        assert!(!dir.path().join("weights.xlsx").exists());
    }
}
