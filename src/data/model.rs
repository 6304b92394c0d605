use std::fmt;

use ndarray::{concatenate, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::schema::VarianceScale;
use super::stats::{column_correlation, CorrelationMethod};
use crate::error::{ModelError, Result};

// ---------------------------------------------------------------------------
// Group / View / Factor – metadata entities
// ---------------------------------------------------------------------------

/// A partition of samples (e.g. an experimental condition).
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    /// Sample names in stored order.
    pub samples: Vec<String>,
}

impl Group {
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }
}

/// A partition of features (one omics layer).
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub name: String,
    /// Feature names in stored order; unique within the view.
    pub features: Vec<String>,
}

impl View {
    pub fn n_features(&self) -> usize {
        self.features.len()
    }
}

/// A latent dimension of the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factor {
    /// 1-based position in the model.
    pub index: usize,
    pub label: Option<String>,
}

impl Factor {
    /// Label if the file provides one, otherwise `Factor{index}`.
    pub fn name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("Factor{}", self.index),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Query and result types
// ---------------------------------------------------------------------------

/// Ranking used by [`MofaModel::top_weights`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// Largest |weight| first.
    #[default]
    Magnitude,
    /// Largest signed weight first.
    Signed,
}

impl RankBy {
    pub const ALL: [RankBy; 2] = [RankBy::Magnitude, RankBy::Signed];

    pub fn label(self) -> &'static str {
        match self {
            RankBy::Magnitude => "|weight|",
            RankBy::Signed => "weight",
        }
    }
}

/// One feature's loading on one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub weight: f64,
}

/// One cell of the variance-explained table.
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceRow {
    pub view: String,
    pub factor_index: usize,
    pub factor: String,
    /// `None` when the table has no group axis.
    pub group: Option<String>,
    pub value: f64,
}

/// Slice of the variance-explained table; `None` means every entry on that axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarianceQuery<'a> {
    pub view: Option<&'a str>,
    /// 1-based factor index.
    pub factor: Option<usize>,
    pub group: Option<&'a str>,
}

/// Square factor × factor correlation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    /// Factor names, in factor order.
    pub labels: Vec<String>,
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.values[[a, b]]
    }
}

/// Labelled rows × columns table for heatmaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

/// Headline numbers for the summary panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub n_samples: usize,
    pub n_features: usize,
    pub n_factors: usize,
    pub groups: Vec<String>,
    pub views: Vec<String>,
}

/// Variance explained, views × factors, optionally per group.
#[derive(Debug, Clone, PartialEq)]
pub enum VarianceTable {
    /// One matrix per group, in group order.
    Grouped(Vec<Array2<f64>>),
    Ungrouped(Array2<f64>),
}

// ---------------------------------------------------------------------------
// MofaModel – the loaded snapshot
// ---------------------------------------------------------------------------

/// An immutable, validated snapshot of one model file.
///
/// Built by [`crate::data::loader`]; every dimension has been checked there,
/// so accessors only validate caller-supplied names and parameters.
#[derive(Debug, Clone)]
pub struct MofaModel {
    pub(crate) groups: Vec<Group>,
    pub(crate) views: Vec<View>,
    pub(crate) factors: Vec<Factor>,
    /// Per view: features × factors.
    pub(crate) weights: Vec<Array2<f64>>,
    /// Per group: samples × factors.
    pub(crate) scores: Vec<Array2<f64>>,
    pub(crate) variance: VarianceTable,
    /// Per group: one total per view.
    pub(crate) totals: Option<Vec<Vec<f64>>>,
    pub(crate) scale: VarianceScale,
}

impl MofaModel {
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    /// Factors in ascending index order, starting at 1.
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn n_factors(&self) -> usize {
        self.factors.len()
    }

    pub fn n_samples(&self) -> usize {
        self.groups.iter().map(Group::n_samples).sum()
    }

    pub fn n_features(&self) -> usize {
        self.views.iter().map(View::n_features).sum()
    }

    pub fn scale(&self) -> VarianceScale {
        self.scale
    }

    pub fn variance_is_grouped(&self) -> bool {
        matches!(self.variance, VarianceTable::Grouped(_))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            n_samples: self.n_samples(),
            n_features: self.n_features(),
            n_factors: self.n_factors(),
            groups: self.groups.iter().map(|g| g.name.clone()).collect(),
            views: self.views.iter().map(|v| v.name.clone()).collect(),
        }
    }

    // -- lookups --

    fn view_index(&self, name: &str) -> Result<usize> {
        self.views
            .iter()
            .position(|v| v.name == name)
            .ok_or_else(|| ModelError::not_found("view", name))
    }

    fn group_index(&self, name: &str) -> Result<usize> {
        self.groups
            .iter()
            .position(|g| g.name == name)
            .ok_or_else(|| ModelError::not_found("group", name))
    }

    /// Column of a 1-based factor index.
    fn factor_column(&self, index: usize) -> Result<usize> {
        if index == 0 || index > self.factors.len() {
            return Err(ModelError::not_found("factor", index.to_string()));
        }
        Ok(index - 1)
    }

    pub fn view(&self, name: &str) -> Result<&View> {
        Ok(&self.views[self.view_index(name)?])
    }

    pub fn group(&self, name: &str) -> Result<&Group> {
        Ok(&self.groups[self.group_index(name)?])
    }

    pub fn factor(&self, index: usize) -> Result<&Factor> {
        Ok(&self.factors[self.factor_column(index)?])
    }

    /// Find a factor by its display name (`Factor3` or the stored label).
    pub fn factor_by_name(&self, name: &str) -> Result<&Factor> {
        self.factors
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| ModelError::not_found("factor", name))
    }

    // -- weights --

    /// Features × factors weight matrix of a view.
    pub fn weight_matrix(&self, view: &str) -> Result<ArrayView2<'_, f64>> {
        Ok(self.weights[self.view_index(view)?].view())
    }

    /// Every feature's weight on `factor` (1-based), in stored feature order.
    pub fn weights(&self, view: &str, factor: usize) -> Result<Vec<FeatureWeight>> {
        let v = self.view_index(view)?;
        let col = self.factor_column(factor)?;
        let column = self.weights[v].column(col);
        Ok(self.views[v]
            .features
            .iter()
            .zip(column.iter())
            .map(|(feature, &weight)| FeatureWeight {
                feature: feature.clone(),
                weight,
            })
            .collect())
    }

    /// The `n` highest-ranked features of a view on one factor.
    ///
    /// The sort is stable, so equal keys keep stored feature order. Asking for
    /// more features than the view has returns all of them.
    pub fn top_weights(
        &self,
        view: &str,
        factor: usize,
        n: usize,
        by: RankBy,
    ) -> Result<Vec<FeatureWeight>> {
        if n == 0 {
            return Err(ModelError::validation("number of top features must be positive"));
        }
        let mut ranked = self.weights(view, factor)?;
        match by {
            RankBy::Magnitude => {
                ranked.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));
            }
            RankBy::Signed => ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight)),
        }
        ranked.truncate(n);
        Ok(ranked)
    }

    /// Top-`n` features per factor, as a features × factors table.
    ///
    /// Features are ranked by |weight| within each requested factor and the
    /// union is kept in first-seen order. `view = None` ranks across all views;
    /// an empty `factors` slice means every factor. With `absolute` the cells
    /// hold |weight|.
    pub fn top_features_heatmap(
        &self,
        view: Option<&str>,
        n: usize,
        factors: &[usize],
        absolute: bool,
    ) -> Result<Heatmap> {
        if n == 0 {
            return Err(ModelError::validation("number of top features must be positive"));
        }
        let view_indices: Vec<usize> = match view {
            Some(name) => vec![self.view_index(name)?],
            None => (0..self.views.len()).collect(),
        };
        let columns: Vec<usize> = if factors.is_empty() {
            (0..self.factors.len()).collect()
        } else {
            factors
                .iter()
                .map(|&f| self.factor_column(f))
                .collect::<Result<_>>()?
        };

        // (view, feature) pairs in first-seen order
        let mut selected: Vec<(usize, usize)> = Vec::new();
        for &col in &columns {
            let mut candidates: Vec<(usize, usize, f64)> = view_indices
                .iter()
                .flat_map(|&v| {
                    self.weights[v]
                        .column(col)
                        .iter()
                        .enumerate()
                        .map(move |(i, &w)| (v, i, w.abs()))
                        .collect::<Vec<_>>()
                })
                .collect();
            candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
            for &(v, i, _) in candidates.iter().take(n) {
                if !selected.contains(&(v, i)) {
                    selected.push((v, i));
                }
            }
        }

        let mut values = Array2::zeros((selected.len(), columns.len()));
        for (r, &(v, i)) in selected.iter().enumerate() {
            for (c, &col) in columns.iter().enumerate() {
                let w = self.weights[v][[i, col]];
                values[[r, c]] = if absolute { w.abs() } else { w };
            }
        }

        Ok(Heatmap {
            rows: selected
                .iter()
                .map(|&(v, i)| self.views[v].features[i].clone())
                .collect(),
            columns: columns.iter().map(|&c| self.factors[c].name()).collect(),
            values,
        })
    }

    // -- variance explained --

    /// Slice of the variance-explained table.
    ///
    /// Rows come out group-major, then view, then factor. Naming a group on a
    /// table without a group axis is a validation error.
    pub fn variance_explained(&self, query: &VarianceQuery<'_>) -> Result<Vec<VarianceRow>> {
        let views: Vec<usize> = match query.view {
            Some(name) => vec![self.view_index(name)?],
            None => (0..self.views.len()).collect(),
        };
        let factors: Vec<usize> = match query.factor {
            Some(index) => vec![self.factor_column(index)?],
            None => (0..self.factors.len()).collect(),
        };

        let tables: Vec<(Option<&str>, &Array2<f64>)> = match (&self.variance, query.group) {
            (VarianceTable::Grouped(per_group), Some(name)) => {
                let g = self.group_index(name)?;
                vec![(Some(self.groups[g].name.as_str()), &per_group[g])]
            }
            (VarianceTable::Grouped(per_group), None) => self
                .groups
                .iter()
                .zip(per_group.iter())
                .map(|(g, m)| (Some(g.name.as_str()), m))
                .collect(),
            (VarianceTable::Ungrouped(_), Some(name)) => {
                self.group_index(name)?;
                return Err(ModelError::validation(
                    "variance explained is not broken down by group in this model",
                ));
            }
            (VarianceTable::Ungrouped(m), None) => vec![(None, m)],
        };

        let mut rows = Vec::with_capacity(tables.len() * views.len() * factors.len());
        for (group, table) in tables {
            for &v in &views {
                for &f in &factors {
                    rows.push(VarianceRow {
                        view: self.views[v].name.clone(),
                        factor_index: self.factors[f].index,
                        factor: self.factors[f].name(),
                        group: group.map(str::to_string),
                        value: table[[v, f]],
                    });
                }
            }
        }
        Ok(rows)
    }

    /// Views × factors variance table of one group (or of an ungrouped table).
    pub fn variance_heatmap(&self, group: Option<&str>) -> Result<Heatmap> {
        let table = match (&self.variance, group) {
            (VarianceTable::Grouped(per_group), Some(name)) => &per_group[self.group_index(name)?],
            (VarianceTable::Grouped(_), None) => {
                return Err(ModelError::validation(
                    "variance explained is stored per group; choose a group",
                ));
            }
            (VarianceTable::Ungrouped(_), Some(name)) => {
                self.group_index(name)?;
                return Err(ModelError::validation(
                    "variance explained is not broken down by group in this model",
                ));
            }
            (VarianceTable::Ungrouped(m), None) => m,
        };
        Ok(Heatmap {
            rows: self.views.iter().map(|v| v.name.clone()).collect(),
            columns: self.factors.iter().map(Factor::name).collect(),
            values: table.clone(),
        })
    }

    /// Per-view total variance explained for a group, if the file stores it.
    pub fn variance_totals(&self, group: &str) -> Result<Option<Vec<(String, f64)>>> {
        let g = self.group_index(group)?;
        Ok(self.totals.as_ref().map(|totals| {
            self.views
                .iter()
                .zip(totals[g].iter())
                .map(|(v, &t)| (v.name.clone(), t))
                .collect()
        }))
    }

    // -- correlation --

    /// Correlation between factor score vectors across all samples.
    ///
    /// Needs at least two factors and two samples. Zero-variance factors
    /// yield NaN off-diagonal entries.
    pub fn factor_correlation(&self, method: CorrelationMethod) -> Result<CorrelationMatrix> {
        if self.factors.len() < 2 {
            return Err(ModelError::validation(format!(
                "factor correlation needs at least 2 factors, model has {}",
                self.factors.len()
            )));
        }
        if self.n_samples() < 2 {
            return Err(ModelError::validation(format!(
                "factor correlation needs at least 2 samples, model has {}",
                self.n_samples()
            )));
        }
        let stacked = stack_rows(&self.scores, self.factors.len());
        Ok(self.correlation_matrix(stacked.view(), method))
    }

    /// Correlation between factors computed over feature weights.
    ///
    /// `view = None` stacks every view's features.
    pub fn weights_correlation(
        &self,
        view: Option<&str>,
        method: CorrelationMethod,
    ) -> Result<CorrelationMatrix> {
        if self.factors.len() < 2 {
            return Err(ModelError::validation(format!(
                "weights correlation needs at least 2 factors, model has {}",
                self.factors.len()
            )));
        }
        let stacked = match view {
            Some(name) => self.weights[self.view_index(name)?].clone(),
            None => stack_rows(&self.weights, self.factors.len()),
        };
        if stacked.nrows() < 2 {
            return Err(ModelError::validation(
                "weights correlation needs at least 2 features",
            ));
        }
        Ok(self.correlation_matrix(stacked.view(), method))
    }

    fn correlation_matrix(&self, data: ArrayView2<f64>, method: CorrelationMethod) -> CorrelationMatrix {
        CorrelationMatrix {
            method,
            labels: self.factors.iter().map(Factor::name).collect(),
            values: column_correlation(data, method),
        }
    }
}

/// Concatenate matrices with the same column count along rows.
fn stack_rows(blocks: &[Array2<f64>], ncols: usize) -> Array2<f64> {
    let views: Vec<ArrayView2<f64>> = blocks.iter().map(|b| b.view()).collect();
    concatenate(Axis(0), &views).unwrap_or_else(|_| Array2::zeros((0, ncols)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::HashMap;

    /// 2 groups (3 + 2 samples), 2 views, 3 factors, hand-written numbers.
    fn tiny_model() -> MofaModel {
        MofaModel {
            groups: vec![
                Group {
                    name: "ctrl".to_string(),
                    samples: vec!["c1".into(), "c2".into(), "c3".into()],
                },
                Group {
                    name: "treated".to_string(),
                    samples: vec!["t1".into(), "t2".into()],
                },
            ],
            views: vec![
                View {
                    name: "RNA".to_string(),
                    features: vec!["g1".into(), "g2".into(), "g3".into(), "g4".into()],
                },
                View {
                    name: "ATAC".to_string(),
                    features: vec!["p1".into(), "p2".into()],
                },
            ],
            factors: vec![
                Factor { index: 1, label: None },
                Factor { index: 2, label: None },
                Factor { index: 3, label: Some("Cell cycle".to_string()) },
            ],
            weights: vec![
                array![[0.5, -2.0, 0.1], [-0.5, 1.0, 0.2], [3.0, 0.0, -0.3], [0.5, 2.0, 0.4]],
                array![[1.5, 0.3, -0.9], [-4.0, 0.6, 0.0]],
            ],
            scores: vec![
                array![[1.0, 2.0, 0.5], [2.0, 4.1, -0.5], [3.0, 5.9, 1.5]],
                array![[4.0, 8.0, -1.0], [5.0, 10.2, 0.0]],
            ],
            variance: VarianceTable::Grouped(vec![
                array![[10.0, 5.0, 1.0], [2.0, 0.5, 0.0]],
                array![[8.0, 6.0, 2.5], [3.0, 1.0, 0.25]],
            ]),
            totals: Some(vec![vec![16.0, 2.5], vec![16.5, 4.25]]),
            scale: VarianceScale::Percent,
        }
    }

    #[test]
    fn test_listings() {
        let m = tiny_model();
        let groups: Vec<(&str, usize)> =
            m.groups().iter().map(|g| (g.name.as_str(), g.n_samples())).collect();
        assert_eq!(groups, vec![("ctrl", 3), ("treated", 2)]);
        assert_eq!(m.views()[1].n_features(), 2);

        let indices: Vec<usize> = m.factors().iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(m.factors()[0].name(), "Factor1");
        assert_eq!(m.factors()[2].to_string(), "Cell cycle");

        let summary = m.summary();
        assert_eq!(summary.n_samples, 5);
        assert_eq!(summary.n_features, 6);
        assert_eq!(summary.views, vec!["RNA", "ATAC"]);
    }

    #[test]
    fn test_lookups() {
        let m = tiny_model();
        assert_eq!(m.factor_by_name("Cell cycle").unwrap().index, 3);
        assert_eq!(m.factor_by_name("Factor2").unwrap().index, 2);
        assert!(matches!(m.factor(0), Err(ModelError::NotFound { kind: "factor", .. })));
        assert!(matches!(m.factor(4), Err(ModelError::NotFound { .. })));
        assert!(matches!(m.group("nope"), Err(ModelError::NotFound { kind: "group", .. })));
        assert_eq!(m.weight_matrix("ATAC").unwrap().dim(), (2, 3));
    }

    #[test]
    fn test_weights_cover_view_features() {
        let m = tiny_model();
        let w = m.weights("RNA", 2).unwrap();
        let map: HashMap<&str, f64> = w.iter().map(|fw| (fw.feature.as_str(), fw.weight)).collect();
        assert_eq!(map.len(), 4);
        assert_eq!(map["g1"], -2.0);
        assert_eq!(map["g4"], 2.0);
    }

    #[test]
    fn test_weights_unknown_names() {
        let m = tiny_model();
        assert!(matches!(
            m.weights("Proteomics", 1),
            Err(ModelError::NotFound { kind: "view", .. })
        ));
        assert!(matches!(
            m.weights("RNA", 9),
            Err(ModelError::NotFound { kind: "factor", .. })
        ));
    }

    #[test]
    fn test_top_weights_ties_keep_feature_order() {
        let m = tiny_model();
        // factor 2 on RNA: g1=-2, g2=1, g3=0, g4=2  -> |g1| == |g4|
        let top = m.top_weights("RNA", 2, 3, RankBy::Magnitude).unwrap();
        let names: Vec<&str> = top.iter().map(|t| t.feature.as_str()).collect();
        assert_eq!(names, vec!["g1", "g4", "g2"]);

        let signed = m.top_weights("RNA", 2, 2, RankBy::Signed).unwrap();
        let names: Vec<&str> = signed.iter().map(|t| t.feature.as_str()).collect();
        assert_eq!(names, vec!["g4", "g2"]);
    }

    #[test]
    fn test_top_weights_bounds() {
        let m = tiny_model();
        let all = m.top_weights("ATAC", 1, 50, RankBy::Magnitude).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].feature, "p2");

        let err = m.top_weights("ATAC", 1, 0, RankBy::Magnitude).unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
    }

    #[test]
    fn test_top_features_heatmap() {
        let m = tiny_model();
        let hm = m.top_features_heatmap(Some("RNA"), 1, &[1, 2], true).unwrap();
        // factor 1 -> g3 (3.0); factor 2 -> g1 (|-2.0|, first of the tie)
        assert_eq!(hm.rows, vec!["g3", "g1"]);
        assert_eq!(hm.columns, vec!["Factor1", "Factor2"]);
        assert_eq!(hm.values[[1, 1]], 2.0);

        let across = m.top_features_heatmap(None, 1, &[], false).unwrap();
        assert_eq!(across.columns.len(), 3);
        assert_eq!(across.rows[0], "p2");
        assert_eq!(across.values[[0, 0]], -4.0);
    }

    #[test]
    fn test_variance_slices() {
        let m = tiny_model();
        let all = m.variance_explained(&VarianceQuery::default()).unwrap();
        assert_eq!(all.len(), 2 * 2 * 3);
        assert_eq!(all[0].group.as_deref(), Some("ctrl"));

        let one = m
            .variance_explained(&VarianceQuery {
                view: Some("ATAC"),
                factor: Some(3),
                group: Some("treated"),
            })
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].value, 0.25);
        assert_eq!(one[0].factor, "Cell cycle");

        let per_view = m
            .variance_explained(&VarianceQuery {
                view: Some("RNA"),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(per_view.len(), 6);
        assert!(per_view.iter().all(|r| r.view == "RNA"));

        let err = m
            .variance_explained(&VarianceQuery {
                group: Some("other"),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound { kind: "group", .. }));
    }

    #[test]
    fn test_ungrouped_variance() {
        let mut m = tiny_model();
        m.variance = VarianceTable::Ungrouped(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let rows = m.variance_explained(&VarianceQuery::default()).unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.group.is_none()));

        let err = m
            .variance_explained(&VarianceQuery {
                group: Some("ctrl"),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
        assert!(m.variance_heatmap(None).is_ok());
    }

    #[test]
    fn test_variance_heatmap_and_totals() {
        let m = tiny_model();
        let hm = m.variance_heatmap(Some("treated")).unwrap();
        assert_eq!(hm.rows, vec!["RNA", "ATAC"]);
        assert_eq!(hm.values[[0, 1]], 6.0);
        assert!(matches!(m.variance_heatmap(None), Err(ModelError::Validation { .. })));

        let totals = m.variance_totals("ctrl").unwrap().unwrap();
        assert_eq!(totals, vec![("RNA".to_string(), 16.0), ("ATAC".to_string(), 2.5)]);
    }

    #[test]
    fn test_factor_correlation() {
        let m = tiny_model();
        let corr = m.factor_correlation(CorrelationMethod::Pearson).unwrap();
        assert_eq!(corr.len(), 3);
        assert_eq!(corr.labels[2], "Cell cycle");
        for a in 0..3 {
            assert_eq!(corr.get(a, a), 1.0);
            for b in 0..3 {
                assert_eq!(corr.get(a, b), corr.get(b, a));
            }
        }
        // factors 1 and 2 are almost collinear across the 5 samples
        assert!(corr.get(0, 1) > 0.99);
    }

    #[test]
    fn test_factor_correlation_needs_two_factors_and_samples() {
        let mut m = tiny_model();
        m.factors.truncate(1);
        assert!(matches!(
            m.factor_correlation(CorrelationMethod::Pearson),
            Err(ModelError::Validation { .. })
        ));

        let mut m = tiny_model();
        m.groups = vec![Group { name: "solo".into(), samples: vec!["s1".into()] }];
        m.scores = vec![array![[1.0, 2.0, 3.0]]];
        assert!(matches!(
            m.factor_correlation(CorrelationMethod::Spearman),
            Err(ModelError::Validation { .. })
        ));
    }

    #[test]
    fn test_weights_correlation() {
        let m = tiny_model();
        let corr = m.weights_correlation(None, CorrelationMethod::Pearson).unwrap();
        assert_eq!(corr.values.dim(), (3, 3));
        assert_eq!(corr.get(1, 1), 1.0);

        let atac = m.weights_correlation(Some("ATAC"), CorrelationMethod::Pearson).unwrap();
        // two points always correlate perfectly (or not at all)
        assert!((atac.get(0, 1).abs() - 1.0).abs() < 1e-12);
    }
}
