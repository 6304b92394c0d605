use std::path::{Path, PathBuf};

use crate::data::{
    load_file, CorrelationMatrix, CorrelationMethod, FeatureWeight, Heatmap, MofaModel, RankBy,
    Schema, VarianceQuery, VarianceRow,
};
use crate::error::{ModelError, Result};
use crate::export;

/// Upper bound of the top-N selector.
pub const MAX_TOP_N: usize = 20;

// ---------------------------------------------------------------------------
// Plot toggles
// ---------------------------------------------------------------------------

/// Which result sections are shown in the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotToggles {
    pub top_weights: bool,
    pub loadings: bool,
    pub weights_heatmap: bool,
    pub weights_correlation: bool,
    pub factor_correlation: bool,
    pub variance: bool,
    pub weights_table: bool,
}

impl Default for PlotToggles {
    fn default() -> Self {
        Self {
            top_weights: true,
            loadings: false,
            weights_heatmap: false,
            weights_correlation: false,
            factor_correlation: true,
            variance: true,
            weights_table: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full session state, independent of rendering.
///
/// Derived tables are cached and rebuilt by [`AppState::refresh`] whenever
/// the model or a selection changes; a failed computation is cached as its
/// error message so the UI can show it in place of the plot.
pub struct AppState {
    /// Container layout used for every load.
    pub schema: Schema,

    /// Loaded model (None until a file loads successfully).
    pub model: Option<MofaModel>,

    /// Path of the loaded model file.
    pub source: Option<PathBuf>,

    pub selected_view: Option<String>,

    /// 1-based factor index.
    pub selected_factor: usize,

    /// `None` = all groups.
    pub selected_group: Option<String>,

    pub top_n: usize,
    pub rank_by: RankBy,
    pub correlation_method: CorrelationMethod,
    pub toggles: PlotToggles,

    pub top_weights: std::result::Result<Vec<FeatureWeight>, String>,
    pub factor_correlation: Option<std::result::Result<CorrelationMatrix, String>>,
    pub weights_correlation: Option<std::result::Result<CorrelationMatrix, String>>,
    pub weights_heatmap: Option<std::result::Result<Heatmap, String>>,
    pub variance_heatmap: Option<std::result::Result<Heatmap, String>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_schema(Schema::default())
    }
}

impl AppState {
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            model: None,
            source: None,
            selected_view: None,
            selected_factor: 1,
            selected_group: None,
            top_n: 5,
            rank_by: RankBy::default(),
            correlation_method: CorrelationMethod::default(),
            toggles: PlotToggles::default(),
            top_weights: Ok(Vec::new()),
            factor_correlation: None,
            weights_correlation: None,
            weights_heatmap: None,
            variance_heatmap: None,
            status_message: None,
        }
    }

    /// Load a model file, replacing whatever was loaded before.
    ///
    /// On failure the previous model is discarded as well and the error is
    /// kept in `status_message`.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        self.clear_model();
        match load_file(path, &self.schema) {
            Ok(model) => {
                self.set_model(model, Some(path.to_path_buf()));
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("{}: {e}", e.kind()));
                Err(e)
            }
        }
    }

    /// Ingest a newly loaded model and reset every selection.
    pub fn set_model(&mut self, model: MofaModel, source: Option<PathBuf>) {
        self.selected_view = model.views().first().map(|v| v.name.clone());
        self.selected_factor = 1;
        self.selected_group = None;
        self.model = Some(model);
        self.source = source;
        self.status_message = None;
        self.refresh();
    }

    fn clear_model(&mut self) {
        self.model = None;
        self.source = None;
        self.selected_view = None;
        self.selected_factor = 1;
        self.selected_group = None;
        self.refresh();
    }

    pub fn select_view(&mut self, view: &str) -> Result<()> {
        self.require_model()?.view(view)?;
        self.selected_view = Some(view.to_string());
        self.refresh();
        Ok(())
    }

    pub fn select_factor(&mut self, index: usize) -> Result<()> {
        self.require_model()?.factor(index)?;
        self.selected_factor = index;
        self.refresh();
        Ok(())
    }

    /// `None` selects all groups.
    pub fn select_group(&mut self, group: Option<&str>) -> Result<()> {
        if let Some(name) = group {
            self.require_model()?.group(name)?;
        }
        self.selected_group = group.map(str::to_string);
        self.refresh();
        Ok(())
    }

    pub fn set_top_n(&mut self, n: usize) -> Result<()> {
        if n == 0 || n > MAX_TOP_N {
            return Err(ModelError::validation(format!(
                "number of top features must be between 1 and {MAX_TOP_N}"
            )));
        }
        self.top_n = n;
        self.refresh();
        Ok(())
    }

    pub fn set_rank_by(&mut self, by: RankBy) {
        self.rank_by = by;
        self.refresh();
    }

    pub fn set_correlation_method(&mut self, method: CorrelationMethod) {
        self.correlation_method = method;
        self.refresh();
    }

    /// Recompute every cached table from the model and current selections.
    pub fn refresh(&mut self) {
        let Some(model) = &self.model else {
            self.top_weights = Ok(Vec::new());
            self.factor_correlation = None;
            self.weights_correlation = None;
            self.weights_heatmap = None;
            self.variance_heatmap = None;
            return;
        };
        let view = self.selected_view.as_deref();

        self.top_weights = match view {
            Some(v) => model.top_weights(v, self.selected_factor, self.top_n, self.rank_by),
            None => Err(ModelError::validation("no view selected")),
        }
        .map_err(|e| e.to_string());

        self.factor_correlation = Some(
            model
                .factor_correlation(self.correlation_method)
                .map_err(|e| e.to_string()),
        );
        self.weights_correlation = Some(
            model
                .weights_correlation(view, self.correlation_method)
                .map_err(|e| e.to_string()),
        );
        self.weights_heatmap = Some(
            model
                .top_features_heatmap(view, self.top_n, &[], true)
                .map_err(|e| e.to_string()),
        );

        // Grouped tables need a group; fall back to the first one.
        let heatmap_group = if model.variance_is_grouped() {
            self.selected_group
                .clone()
                .or_else(|| model.groups().first().map(|g| g.name.clone()))
        } else {
            None
        };
        self.variance_heatmap = Some(
            model
                .variance_heatmap(heatmap_group.as_deref())
                .map_err(|e| e.to_string()),
        );
    }

    fn require_model(&self) -> Result<&MofaModel> {
        self.model
            .as_ref()
            .ok_or_else(|| ModelError::validation("no model loaded"))
    }

    // -- export --

    /// Every weight of the selected (view, factor).
    pub fn selected_weights(&self) -> Result<Vec<FeatureWeight>> {
        let model = self.require_model()?;
        let view = self
            .selected_view
            .as_deref()
            .ok_or_else(|| ModelError::validation("no view selected"))?;
        model.weights(view, self.selected_factor)
    }

    /// Variance-explained rows for the selected group (or all groups).
    pub fn selected_variance(&self) -> Result<Vec<VarianceRow>> {
        let model = self.require_model()?;
        let group = if model.variance_is_grouped() {
            self.selected_group.as_deref()
        } else {
            None
        };
        model.variance_explained(&VarianceQuery {
            group,
            ..Default::default()
        })
    }

    pub fn export_weights(&mut self, path: &Path) -> Result<()> {
        let result = self
            .selected_weights()
            .and_then(|rows| export::save_weights(path, &rows));
        self.report_export(path, result)
    }

    /// Only the cached top-N rows of the selected (view, factor).
    pub fn export_top_weights(&mut self, path: &Path) -> Result<()> {
        let result = match (&self.model, &self.top_weights) {
            (None, _) => Err(ModelError::validation("no model loaded")),
            (Some(_), Err(reason)) => Err(ModelError::validation(reason.clone())),
            (Some(_), Ok(rows)) => export::save_weights(path, rows),
        };
        self.report_export(path, result)
    }

    pub fn export_variance(&mut self, path: &Path) -> Result<()> {
        let result = self
            .selected_variance()
            .and_then(|rows| export::save_variance(path, &rows));
        self.report_export(path, result)
    }

    fn report_export(&mut self, path: &Path, result: Result<()>) -> Result<()> {
        match &result {
            Ok(()) => self.status_message = Some(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("Export to {} failed: {e}", path.display());
                self.status_message = Some(format!("{}: {e}", e.kind()));
            }
        }
        result
    }
}
