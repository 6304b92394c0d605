use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

// ---------------------------------------------------------------------------
// Axis layouts and value conventions
// ---------------------------------------------------------------------------

/// Axis order of a per-view weight or per-group score dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixLayout {
    /// Rows are factors, columns are features/samples (MOFA+ on disk).
    FactorsByEntities,
    /// Rows are features/samples, columns are factors.
    EntitiesByFactors,
}

/// Normalisation convention for variance-explained values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceScale {
    /// Values in `[0, 100]`.
    Percent,
    /// Values in `[0, 1]`.
    Fraction,
}

impl VarianceScale {
    /// Inclusive upper bound for a single value.
    pub fn max(self) -> f64 {
        match self {
            VarianceScale::Percent => 100.0,
            VarianceScale::Fraction => 1.0,
        }
    }

    /// Unit suffix used in labels.
    pub fn unit(self) -> &'static str {
        match self {
            VarianceScale::Percent => "%",
            VarianceScale::Fraction => "",
        }
    }
}

// ---------------------------------------------------------------------------
// Schema – where each section lives inside the container
// ---------------------------------------------------------------------------

/// On-disk layout of a model container.
///
/// Paths are `/`-separated, relative to the container root. Defaults match
/// the files written by mofapy2. Missing TOML fields fall back to defaults, so
/// a config file only needs to name what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    /// 1-D string dataset with the ordered group names.
    pub group_names: String,
    /// 1-D string dataset with the ordered view names.
    pub view_names: String,
    /// Container group holding one sample-name dataset per group.
    pub samples: String,
    /// Container group holding one feature-name dataset per view.
    pub features: String,
    /// Container group holding one weight matrix per view.
    pub weights: String,
    /// Container group holding one score matrix per group.
    pub scores: String,
    /// Per-group views × factors tables, or a single views × factors dataset.
    pub variance_explained: String,
    /// Optional per-group 1-D per-view totals.
    pub variance_totals: Option<String>,
    /// Optional 1-D string dataset with factor labels.
    pub factor_names: Option<String>,
    pub weights_layout: MatrixLayout,
    pub scores_layout: MatrixLayout,
    pub variance_scale: VarianceScale,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            group_names: "groups/groups".to_string(),
            view_names: "views/views".to_string(),
            samples: "samples".to_string(),
            features: "features".to_string(),
            weights: "expectations/W".to_string(),
            scores: "expectations/Z".to_string(),
            variance_explained: "variance_explained/r2_per_factor".to_string(),
            variance_totals: Some("variance_explained/r2_total".to_string()),
            factor_names: Some("factors/factors".to_string()),
            weights_layout: MatrixLayout::FactorsByEntities,
            scores_layout: MatrixLayout::FactorsByEntities,
            variance_scale: VarianceScale::Percent,
        }
    }
}

impl Schema {
    /// Load a schema from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let schema: Schema = toml::from_str(&content).map_err(|e| ModelError::Config {
            reason: e.to_string(),
        })?;
        schema.check()?;
        Ok(schema)
    }

    /// Save the schema to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ModelError::Config {
            reason: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject empty section paths.
    pub fn check(&self) -> Result<()> {
        let required = [
            ("group_names", &self.group_names),
            ("view_names", &self.view_names),
            ("samples", &self.samples),
            ("features", &self.features),
            ("weights", &self.weights),
            ("scores", &self.scores),
            ("variance_explained", &self.variance_explained),
        ];
        for (field, value) in required {
            if value.trim_matches('/').is_empty() {
                return Err(ModelError::Config {
                    reason: format!("'{field}' must name a container path"),
                });
            }
        }
        Ok(())
    }
}

/// Join a container group path with a member name.
pub(crate) fn join(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_round_trips_through_toml() {
        let schema = Schema::default();
        let text = toml::to_string_pretty(&schema).unwrap();
        let parsed: Schema = toml::from_str(&text).unwrap();
        assert_eq!(schema, parsed);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: Schema = toml::from_str(
            "variance_scale = \"fraction\"\nweights_layout = \"entities_by_factors\"\n",
        )
        .unwrap();
        assert_eq!(parsed.variance_scale, VarianceScale::Fraction);
        assert_eq!(parsed.weights_layout, MatrixLayout::EntitiesByFactors);
        assert_eq!(parsed.weights, "expectations/W");
        assert_eq!(parsed.group_names, "groups/groups");
    }

    #[test]
    fn test_load_and_save_file() {
        let file = NamedTempFile::new().unwrap();
        let mut schema = Schema::default();
        schema.factor_names = Some("meta/factor_labels".to_string());
        schema.variance_scale = VarianceScale::Fraction;
        schema.save(file.path()).unwrap();

        let loaded = Schema::load(file.path()).unwrap();
        assert_eq!(loaded, schema);
    }

    #[test]
    fn test_empty_path_is_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "weights = \"/\"\n").unwrap();
        let err = Schema::load(file.path()).unwrap_err();
        assert!(matches!(err, ModelError::Config { .. }));
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join("samples", "G1"), "samples/G1");
        assert_eq!(join("expectations/W/", "RNA"), "expectations/W/RNA");
        assert_eq!(join("", "views"), "views");
    }
}
