use std::collections::HashSet;
use std::path::Path;

use ndarray::Array2;

use super::container::{self, Container};
use super::model::{Factor, Group, MofaModel, VarianceTable, View};
use super::schema::{join, MatrixLayout, Schema};
use crate::error::{ModelError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Open a model file and validate it against `schema`.
///
/// The container format is detected from the file's first bytes (see
/// [`container::open`]).
pub fn load_file(path: &Path, schema: &Schema) -> Result<MofaModel> {
    let container = container::open(path)?;
    let model = load(container.as_ref(), schema)?;
    log::info!(
        "Loaded {} model {}: {} groups, {} views, {} factors, {} samples, {} features",
        container.format(),
        path.display(),
        model.groups().len(),
        model.views().len(),
        model.n_factors(),
        model.n_samples(),
        model.n_features()
    );
    Ok(model)
}

/// Validate an open container and materialise the model snapshot.
///
/// Every required section must exist before anything is read, so a missing
/// section is reported by name rather than as a failed read further down.
pub fn load(c: &dyn Container, schema: &Schema) -> Result<MofaModel> {
    let required = [
        &schema.group_names,
        &schema.view_names,
        &schema.samples,
        &schema.features,
        &schema.weights,
        &schema.scores,
        &schema.variance_explained,
    ];
    for section in required {
        if !c.contains(section) {
            return Err(ModelError::schema(section.as_str(), "required section is missing"));
        }
    }

    // ---- metadata ----
    let group_names = read_names(c, &schema.group_names)?;
    let view_names = read_names(c, &schema.view_names)?;

    let mut seen_samples = HashSet::new();
    let mut groups = Vec::with_capacity(group_names.len());
    for name in group_names {
        let path = join(&schema.samples, &name);
        let samples = read_names(c, &path)?;
        if let Some(dup) = samples.iter().find(|s| !seen_samples.insert((*s).clone())) {
            return Err(ModelError::schema(
                path,
                format!("sample '{dup}' appears in more than one group"),
            ));
        }
        groups.push(Group { name, samples });
    }

    let views = view_names
        .into_iter()
        .map(|name| {
            let features = read_names(c, &join(&schema.features, &name))?;
            Ok(View { name, features })
        })
        .collect::<Result<Vec<View>>>()?;

    // ---- weights: the first view fixes the factor count ----
    let mut n_factors = None;
    let mut weights = Vec::with_capacity(views.len());
    for view in &views {
        let path = join(&schema.weights, &view.name);
        let w = read_oriented(c, &path, schema.weights_layout, view.n_features(), "feature")?;
        check_factor_count(&path, w.ncols(), &mut n_factors)?;
        weights.push(w);
    }
    let n_factors = n_factors.unwrap_or(0);
    if n_factors == 0 {
        return Err(ModelError::schema(schema.weights.as_str(), "model has no factors"));
    }

    // ---- scores ----
    let mut scores = Vec::with_capacity(groups.len());
    for group in &groups {
        let path = join(&schema.scores, &group.name);
        let z = read_oriented(c, &path, schema.scores_layout, group.n_samples(), "sample")?;
        check_factor_count(&path, z.ncols(), &mut Some(n_factors))?;
        scores.push(z);
    }

    // ---- variance explained ----
    let max = schema.variance_scale.max();
    let variance = if c.is_dataset(&schema.variance_explained) {
        log::debug!("Variance explained at {} has no group axis", schema.variance_explained);
        VarianceTable::Ungrouped(read_variance(c, &schema.variance_explained, views.len(), n_factors, max)?)
    } else {
        let tables = groups
            .iter()
            .map(|g| {
                let path = join(&schema.variance_explained, &g.name);
                read_variance(c, &path, views.len(), n_factors, max)
            })
            .collect::<Result<Vec<_>>>()?;
        VarianceTable::Grouped(tables)
    };

    let totals = read_totals(c, schema, &groups, views.len())?;
    let factors = read_factors(c, schema, n_factors)?;

    Ok(MofaModel {
        groups,
        views,
        factors,
        weights,
        scores,
        variance,
        totals,
        scale: schema.variance_scale,
    })
}

// ---------------------------------------------------------------------------
// Section readers
// ---------------------------------------------------------------------------

/// Non-empty list of unique names.
fn read_names(c: &dyn Container, path: &str) -> Result<Vec<String>> {
    let names = c.read_strings(path)?;
    if names.is_empty() {
        return Err(ModelError::schema(path, "name list is empty"));
    }
    {
        let mut seen = HashSet::with_capacity(names.len());
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(ModelError::schema(path, format!("duplicate name '{dup}'")));
        }
    }
    log::debug!("{path}: {} names", names.len());
    Ok(names)
}

/// Read a 2-D dataset and return it as entities × factors.
fn read_oriented(
    c: &dyn Container,
    path: &str,
    layout: MatrixLayout,
    n_entities: usize,
    entity: &str,
) -> Result<Array2<f64>> {
    let raw = c.read_numeric(path)?.into_matrix()?;
    let m = match layout {
        MatrixLayout::FactorsByEntities => raw.reversed_axes(),
        MatrixLayout::EntitiesByFactors => raw,
    };
    if m.nrows() != n_entities {
        return Err(ModelError::schema(
            path,
            format!("has {} {entity} entries, expected {n_entities}", m.nrows()),
        ));
    }
    if let Some(((i, j), v)) = m.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(ModelError::schema(
            path,
            format!("non-finite value {v} at {entity} {}, factor {}", i + 1, j + 1),
        ));
    }
    Ok(m)
}

fn check_factor_count(path: &str, found: usize, expected: &mut Option<usize>) -> Result<()> {
    match *expected {
        None => {
            *expected = Some(found);
            Ok(())
        }
        Some(n) if n == found => Ok(()),
        Some(n) => Err(ModelError::schema(
            path,
            format!("has {found} factors, expected {n}"),
        )),
    }
}

/// Views × factors table with every value in `[0, max]`.
fn read_variance(
    c: &dyn Container,
    path: &str,
    n_views: usize,
    n_factors: usize,
    max: f64,
) -> Result<Array2<f64>> {
    let m = c.read_numeric(path)?.into_matrix()?;
    if m.dim() != (n_views, n_factors) {
        return Err(ModelError::schema(
            path,
            format!(
                "shape {:?} does not match {n_views} views x {n_factors} factors",
                m.dim()
            ),
        ));
    }
    if let Some(((v, f), value)) = m
        .indexed_iter()
        .find(|(_, x)| !(x.is_finite() && **x >= 0.0 && **x <= max))
    {
        return Err(ModelError::schema(
            path,
            format!(
                "value {value} for view {}, factor {} is outside [0, {max}]",
                v + 1,
                f + 1
            ),
        ));
    }
    Ok(m)
}

/// Optional per-group totals; absent for any group means absent overall.
fn read_totals(
    c: &dyn Container,
    schema: &Schema,
    groups: &[Group],
    n_views: usize,
) -> Result<Option<Vec<Vec<f64>>>> {
    let Some(base) = schema.variance_totals.as_deref() else {
        return Ok(None);
    };
    let mut totals = Vec::with_capacity(groups.len());
    for g in groups {
        let path = join(base, &g.name);
        if !c.contains(&path) {
            log::warn!("No total variance explained at {path}; totals disabled");
            return Ok(None);
        }
        let values = c.read_numeric(&path)?.into_vector()?;
        if values.len() != n_views {
            return Err(ModelError::schema(
                path,
                format!("has {} totals, expected one per view ({n_views})", values.len()),
            ));
        }
        totals.push(values);
    }
    Ok(Some(totals))
}

/// Factors 1..=n, labelled when the container carries factor names.
fn read_factors(c: &dyn Container, schema: &Schema, n_factors: usize) -> Result<Vec<Factor>> {
    let labels = match schema.factor_names.as_deref() {
        Some(path) if c.contains(path) => {
            let labels = read_names(c, path)?;
            if labels.len() != n_factors {
                return Err(ModelError::schema(
                    path,
                    format!("has {} labels for {n_factors} factors", labels.len()),
                ));
            }
            labels.into_iter().map(Some).collect()
        }
        _ => vec![None; n_factors],
    };
    Ok(labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| Factor { index: i + 1, label })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::container::JsonContainer;
    use crate::data::synthetic::{synthetic_model, SyntheticConfig};
    use crate::data::RankBy;
    use crate::error::ErrorKind;
    use serde_json::{json, Value as JsonValue};
    use std::collections::BTreeSet;

    fn scenario() -> JsonValue {
        synthetic_model(&SyntheticConfig::default())
    }

    fn load_value(value: JsonValue) -> Result<MofaModel> {
        let c = JsonContainer::from_value(value).unwrap();
        load(&c, &Schema::default())
    }

    fn remove(value: &mut JsonValue, path: &str) {
        let parts: Vec<&str> = path.split('/').collect();
        let (last, parents) = parts.split_last().unwrap();
        let mut node = value;
        for p in parents {
            node = node.get_mut(*p).unwrap();
        }
        node.as_object_mut().unwrap().remove(*last);
    }

    fn set(value: &mut JsonValue, path: &str, new: JsonValue) {
        let mut node = value;
        for p in path.split('/') {
            node = match p.parse::<usize>() {
                Ok(i) => node.get_mut(i).unwrap(),
                Err(_) => node.get_mut(p).unwrap(),
            };
        }
        *node = new;
    }

    #[test]
    fn test_scenario_listings() {
        let m = load_value(scenario()).unwrap();
        let groups: Vec<(&str, usize)> =
            m.groups().iter().map(|g| (g.name.as_str(), g.n_samples())).collect();
        assert_eq!(groups, vec![("G1", 50), ("G2", 70)]);

        let views: Vec<(&str, usize)> =
            m.views().iter().map(|v| (v.name.as_str(), v.n_features())).collect();
        assert_eq!(views, vec![("RNA", 100), ("ATAC", 200)]);

        let indices: Vec<usize> = m.factors().iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_scenario_top_weights() {
        let m = load_value(scenario()).unwrap();
        let top = m.top_weights("RNA", 3, 5, RankBy::Magnitude).unwrap();
        assert_eq!(top.len(), 5);
        for pair in top.windows(2) {
            assert!(pair[0].weight.abs() >= pair[1].weight.abs());
        }

        let all = m.weights("RNA", 3).unwrap();
        for t in &top {
            assert!(all.contains(t));
        }
        let everything = m.top_weights("RNA", 3, 1000, RankBy::Magnitude).unwrap();
        assert_eq!(everything.len(), 100);
    }

    #[test]
    fn test_weights_key_sets_match_features() {
        let m = load_value(scenario()).unwrap();
        for view in m.views() {
            let expected: BTreeSet<&str> = view.features.iter().map(String::as_str).collect();
            for factor in m.factors() {
                let w = m.weights(&view.name, factor.index).unwrap();
                let keys: BTreeSet<&str> = w.iter().map(|fw| fw.feature.as_str()).collect();
                assert_eq!(keys, expected);
                assert_eq!(w.len(), view.n_features());
            }
        }
    }

    #[test]
    fn test_scenario_correlation() {
        let m = load_value(scenario()).unwrap();
        let corr = m
            .factor_correlation(crate::data::CorrelationMethod::Pearson)
            .unwrap();
        assert_eq!(corr.len(), 5);
        for a in 0..5 {
            assert_eq!(corr.get(a, a), 1.0);
            for b in 0..5 {
                assert_eq!(corr.get(a, b), corr.get(b, a));
                assert!(corr.get(a, b).abs() <= 1.0);
            }
        }
    }

    #[test]
    fn test_missing_variance_section() {
        let mut value = scenario();
        remove(&mut value, "variance_explained");

        let err = load_value(value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        match err {
            ModelError::Schema { path, .. } => assert_eq!(path, "variance_explained/r2_per_factor"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_weights_for_one_view() {
        let mut value = scenario();
        remove(&mut value, "expectations/W/ATAC");

        let err = load_value(value).unwrap_err();
        match err {
            ModelError::Schema { path, reason } => {
                assert_eq!(path, "expectations/W/ATAC");
                assert!(reason.contains("missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_weight_shape_mismatch() {
        let mut value = scenario();
        // 5 factors x 3 features instead of 5 x 100
        let small: Vec<Vec<f64>> = vec![vec![0.1, 0.2, 0.3]; 5];
        set(&mut value, "expectations/W/RNA", json!(small));

        let err = load_value(value).unwrap_err();
        assert!(matches!(err, ModelError::Schema { ref path, .. } if path == "expectations/W/RNA"));
    }

    #[test]
    fn test_factor_count_disagreement() {
        let mut value = scenario();
        let four_factors: Vec<Vec<f64>> = vec![vec![0.5; 200]; 4];
        set(&mut value, "expectations/W/ATAC", json!(four_factors));

        let err = load_value(value).unwrap_err();
        match err {
            ModelError::Schema { reason, .. } => assert!(reason.contains("4 factors")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_variance_out_of_range() {
        let mut value = scenario();
        let mut bad = vec![vec![1.0; 5]; 2];
        bad[1][2] = 140.0;
        set(&mut value, "variance_explained/r2_per_factor/G2", json!(bad));

        let err = load_value(value).unwrap_err();
        match err {
            ModelError::Schema { path, reason } => {
                assert_eq!(path, "variance_explained/r2_per_factor/G2");
                assert!(reason.contains("140"));
                assert!(reason.contains("view 2, factor 3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fraction_scale_rejects_percentages() {
        let c = JsonContainer::from_value(scenario()).unwrap();
        let schema = Schema {
            variance_scale: crate::data::VarianceScale::Fraction,
            ..Schema::default()
        };
        // synthetic values are percentages well above 1
        assert!(matches!(load(&c, &schema), Err(ModelError::Schema { .. })));
    }

    #[test]
    fn test_duplicate_features_rejected() {
        let mut value = scenario();
        set(&mut value, "features/ATAC/0", json!("ATAC_f2"));

        let err = load_value(value).unwrap_err();
        match err {
            ModelError::Schema { reason, .. } => assert!(reason.contains("ATAC_f2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_samples_shared_between_groups_rejected() {
        let mut value = scenario();
        set(&mut value, "samples/G2/0", json!("G1_s1"));
        assert!(matches!(load_value(value), Err(ModelError::Schema { .. })));
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let mut value = scenario();
        set(&mut value, "expectations/W/RNA/2/7", JsonValue::Null);

        let err = load_value(value).unwrap_err();
        match err {
            // 1-based on both axes: W/RNA row 2 is factor 3, column 7 is feature 8
            ModelError::Schema { reason, .. } => assert!(reason.contains("feature 8, factor 3")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_optional_sections() {
        let mut value = scenario();
        remove(&mut value, "variance_explained/r2_total");
        remove(&mut value, "factors");
        let m = load_value(value).unwrap();
        assert!(m.variance_totals("G1").unwrap().is_none());
        assert_eq!(m.factors()[0].name(), "Factor1");

        let m = load_value(scenario()).unwrap();
        assert_eq!(m.variance_totals("G2").unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_factor_labels_length_checked() {
        let mut value = scenario();
        set(&mut value, "factors/factors", json!(["A", "B"]));
        assert!(matches!(load_value(value), Err(ModelError::Schema { .. })));
    }

    #[test]
    fn test_ungrouped_variance_dataset() {
        let mut value = scenario();
        set(
            &mut value,
            "variance_explained/r2_per_factor",
            json!([[1.0, 2.0, 3.0, 4.0, 5.0], [0.5, 0.5, 0.5, 0.5, 0.5]]),
        );
        let m = load_value(value).unwrap();
        assert!(!m.variance_is_grouped());
        let rows = m
            .variance_explained(&crate::data::VarianceQuery::default())
            .unwrap();
        assert_eq!(rows.len(), 10);
    }

    #[test]
    fn test_entities_by_factors_layout() {
        let value = json!({
            "groups": { "groups": ["g"] },
            "views": { "views": ["v"] },
            "samples": { "g": ["s1", "s2", "s3"] },
            "features": { "v": ["f1", "f2"] },
            "expectations": {
                "W": { "v": [[1.0, -1.0], [2.0, 0.5]] },
                "Z": { "g": [[0.1, 0.2], [0.3, 0.1], [0.5, 0.9]] }
            },
            "variance_explained": { "r2_per_factor": { "g": [[0.2, 0.1]] } }
        });
        let c = JsonContainer::from_value(value).unwrap();
        let schema = Schema {
            weights_layout: MatrixLayout::EntitiesByFactors,
            scores_layout: MatrixLayout::EntitiesByFactors,
            variance_scale: crate::data::VarianceScale::Fraction,
            ..Schema::default()
        };
        let m = load(&c, &schema).unwrap();
        let w = m.weights("v", 2).unwrap();
        assert_eq!(w[0].weight, -1.0);
        assert_eq!(w[1].weight, 0.5);
    }

    #[test]
    fn test_load_file_round_trip() {
        let file = tempfile::NamedTempFile::new().unwrap();
        serde_json::to_writer(std::fs::File::create(file.path()).unwrap(), &scenario()).unwrap();

        let m = load_file(file.path(), &Schema::default()).unwrap();
        assert_eq!(m.n_samples(), 120);
        assert_eq!(m.n_features(), 300);
    }

    #[test]
    fn test_load_file_with_byte_order_mark() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        serde_json::to_writer(&mut bytes, &scenario()).unwrap();
        std::fs::write(file.path(), bytes).unwrap();

        let m = load_file(file.path(), &Schema::default()).unwrap();
        assert_eq!(m.groups().len(), 2);
        assert_eq!(m.n_factors(), 5);
    }

    #[test]
    fn test_load_file_corrupt_json_is_io_kind() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{\"groups\": [").unwrap();

        let err = load_file(file.path(), &Schema::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
