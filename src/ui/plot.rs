use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot};
use ndarray::Array2;

use crate::color;
use crate::data::{CorrelationMatrix, FeatureWeight, Heatmap, MofaModel};
use crate::state::AppState;
use crate::ui::table;

const POSITIVE: Color32 = Color32::from_rgb(178, 24, 43);
const NEGATIVE: Color32 = Color32::from_rgb(33, 102, 172);

// ---------------------------------------------------------------------------
// Central panel – result sections
// ---------------------------------------------------------------------------

/// Render every enabled result section in the central panel.
pub fn results(ui: &mut Ui, state: &AppState) {
    let model = match &state.model {
        Some(m) => m,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a model file to explore factors  (File → Open…)");
            });
            return;
        }
    };

    let view = state.selected_view.as_deref().unwrap_or("-");
    let factor = model
        .factor(state.selected_factor)
        .map(|f| f.name())
        .unwrap_or_default();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let toggles = state.toggles;

            if toggles.top_weights {
                let title = format!("Top {} weights – {view}, {factor}", state.top_n);
                section(ui, Section::TopWeights, title, |ui| {
                    match &state.top_weights {
                        Ok(rows) => top_weights_chart(ui, rows),
                        Err(e) => error_label(ui, e),
                    }
                });
            }

            if toggles.loadings {
                section(ui, Section::Loadings, format!("Loadings – {view}, {factor}"), |ui| {
                    match state.selected_weights() {
                        Ok(rows) => loadings_chart(ui, rows),
                        Err(e) => error_label(ui, &e.to_string()),
                    }
                });
            }

            if toggles.weights_heatmap {
                let title = format!("Top {} features per factor – {view}", state.top_n);
                section(ui, Section::WeightsHeatmap, title, |ui| {
                    if let Some(result) = &state.weights_heatmap {
                        match result {
                            Ok(h) => {
                                let max = max_finite(&h.values);
                                labelled_heatmap(ui, "weights_heatmap", h, |v| {
                                    color::sequential(v, 0.0, max)
                                });
                            }
                            Err(e) => error_label(ui, e),
                        }
                    }
                });
            }

            if toggles.factor_correlation {
                let title = format!("Factor correlation ({})", state.correlation_method.label());
                section(ui, Section::FactorCorrelation, title, |ui| {
                    if let Some(result) = &state.factor_correlation {
                        correlation_section(ui, "factor_corr", result);
                    }
                });
            }

            if toggles.weights_correlation {
                let title = format!(
                    "Weights correlation – {view} ({})",
                    state.correlation_method.label()
                );
                section(ui, Section::WeightsCorrelation, title, |ui| {
                    if let Some(result) = &state.weights_correlation {
                        correlation_section(ui, "weights_corr", result);
                    }
                });
            }

            if toggles.variance {
                section(ui, Section::Variance, variance_title(model, state), |ui| {
                    if let Some(result) = &state.variance_heatmap {
                        match result {
                            Ok(h) => {
                                let max = model.scale().max();
                                labelled_heatmap(ui, "variance_heatmap", h, |v| {
                                    color::sequential(v, 0.0, max)
                                });
                            }
                            Err(e) => error_label(ui, e),
                        }
                    }
                    variance_totals(ui, model, state);
                });
            }

            if toggles.weights_table {
                section(ui, Section::WeightsTable, format!("Weights – {view}, {factor}"), |ui| {
                    match state.selected_weights() {
                        Ok(rows) => table::weights_table(ui, &rows),
                        Err(e) => error_label(ui, &e.to_string()),
                    }
                });
            }
        });
}

/// Result sections of the central panel.
///
/// Titles carry the current selection; the id does not, so a section keeps
/// its open/closed state when the selection changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    TopWeights,
    Loadings,
    WeightsHeatmap,
    FactorCorrelation,
    WeightsCorrelation,
    Variance,
    WeightsTable,
}

impl Section {
    fn id(self) -> &'static str {
        match self {
            Section::TopWeights => "section_top_weights",
            Section::Loadings => "section_loadings",
            Section::WeightsHeatmap => "section_weights_heatmap",
            Section::FactorCorrelation => "section_factor_correlation",
            Section::WeightsCorrelation => "section_weights_correlation",
            Section::Variance => "section_variance",
            Section::WeightsTable => "section_weights_table",
        }
    }
}

fn section(ui: &mut Ui, kind: Section, title: String, add_contents: impl FnOnce(&mut Ui)) {
    egui::CollapsingHeader::new(RichText::new(title).strong())
        .id_salt(kind.id())
        .default_open(true)
        .show(ui, add_contents);
    ui.add_space(6.0);
}

fn error_label(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).color(Color32::RED));
}

fn variance_title(model: &MofaModel, state: &AppState) -> String {
    let unit = model.scale().unit();
    if !model.variance_is_grouped() {
        return format!("Variance explained ({unit})");
    }
    let group = state
        .selected_group
        .clone()
        .or_else(|| model.groups().first().map(|g| g.name.clone()))
        .unwrap_or_default();
    format!("Variance explained – {group} ({unit})")
}

fn variance_totals(ui: &mut Ui, model: &MofaModel, state: &AppState) {
    if !model.variance_is_grouped() {
        return;
    }
    let Some(group) = state
        .selected_group
        .as_deref()
        .or_else(|| model.groups().first().map(|g| g.name.as_str()))
    else {
        return;
    };
    if let Ok(Some(totals)) = model.variance_totals(group) {
        let unit = model.scale().unit();
        let text = totals
            .iter()
            .map(|(view, t)| format!("{view}: {t:.2}{unit}"))
            .collect::<Vec<_>>()
            .join("   ");
        ui.label(format!("Total: {text}"));
    }
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

fn weight_color(w: f64) -> Color32 {
    if w < 0.0 {
        NEGATIVE
    } else {
        POSITIVE
    }
}

/// Horizontal bars, strongest feature on top.
fn top_weights_chart(ui: &mut Ui, rows: &[FeatureWeight]) {
    let n = rows.len();
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, fw)| {
            Bar::new((n - i) as f64, fw.weight)
                .name(&fw.feature)
                .fill(weight_color(fw.weight))
        })
        .collect();

    Plot::new("top_weights_plot")
        .height(40.0 + 22.0 * n as f32)
        .x_axis_label("Weight")
        .show_y(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().name("weight"));
        });
}

/// Every weight of one factor, sorted ascending.
fn loadings_chart(ui: &mut Ui, mut rows: Vec<FeatureWeight>) {
    rows.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(rank, fw)| {
            Bar::new(rank as f64, fw.weight)
                .name(&fw.feature)
                .width(1.0)
                .fill(weight_color(fw.weight))
        })
        .collect();

    Plot::new("loadings_plot")
        .height(260.0)
        .legend(Legend::default())
        .x_axis_label("Feature rank")
        .y_axis_label("Weight")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("weights"));
        });
}

// ---------------------------------------------------------------------------
// Heatmaps
// ---------------------------------------------------------------------------

fn max_finite(values: &Array2<f64>) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max)
}

fn correlation_section(ui: &mut Ui, id: &str, result: &Result<CorrelationMatrix, String>) {
    match result {
        Ok(m) => {
            let heatmap = Heatmap {
                rows: m.labels.clone(),
                columns: m.labels.clone(),
                values: m.values.clone(),
            };
            labelled_heatmap(ui, id, &heatmap, color::diverging);
        }
        Err(e) => error_label(ui, e),
    }
}

/// Grid of coloured cells with row and column labels and a value tooltip.
fn labelled_heatmap(ui: &mut Ui, id: &str, heatmap: &Heatmap, color_of: impl Fn(f64) -> Color32) {
    let n_rows = heatmap.rows.len();
    let n_cols = heatmap.columns.len();
    if n_rows == 0 || n_cols == 0 {
        ui.label("Nothing to show.");
        return;
    }

    let label_width = heatmap
        .rows
        .iter()
        .map(|r| r.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(4, 28) as f32
        * 7.0
        + 10.0;
    let header_height = 20.0;
    let cell_w = 58.0;
    let cell_h = if n_rows > 30 { 14.0 } else { 22.0 };
    let show_values = cell_h >= 20.0;

    let total_width = label_width + n_cols as f32 * cell_w;
    let total_height = header_height + n_rows as f32 * cell_h;

    egui::ScrollArea::horizontal().id_salt(id).show(ui, |ui: &mut Ui| {
        let (response, painter) =
            ui.allocate_painter(egui::vec2(total_width, total_height), egui::Sense::hover());
        let origin = response.rect.min;

        for (col, name) in heatmap.columns.iter().enumerate() {
            let x = origin.x + label_width + col as f32 * cell_w + cell_w / 2.0;
            painter.text(
                egui::pos2(x, origin.y + header_height / 2.0),
                egui::Align2::CENTER_CENTER,
                name,
                egui::FontId::proportional(10.0),
                Color32::LIGHT_GRAY,
            );
        }

        let grid_y = origin.y + header_height;
        let mut hovered: Option<(usize, usize)> = None;

        for (row, name) in heatmap.rows.iter().enumerate() {
            let y = grid_y + row as f32 * cell_h;
            painter.text(
                egui::pos2(origin.x + label_width - 5.0, y + cell_h / 2.0),
                egui::Align2::RIGHT_CENTER,
                name,
                egui::FontId::proportional(11.0),
                Color32::LIGHT_GRAY,
            );

            for col in 0..n_cols {
                let value = heatmap.values[[row, col]];
                let cell_rect = egui::Rect::from_min_size(
                    egui::pos2(origin.x + label_width + col as f32 * cell_w, y),
                    egui::vec2(cell_w - 1.0, cell_h - 1.0),
                );
                let fill = color_of(value);
                painter.rect_filled(cell_rect, 1.0, fill);

                if show_values {
                    painter.text(
                        cell_rect.center(),
                        egui::Align2::CENTER_CENTER,
                        format_value(value),
                        egui::FontId::monospace(10.0),
                        color::text_on(fill),
                    );
                }

                if let Some(pointer) = response.hover_pos() {
                    if cell_rect.contains(pointer) {
                        hovered = Some((row, col));
                    }
                }
            }
        }

        if let Some((row, col)) = hovered {
            response.on_hover_text(format!(
                "{} × {}\n{}",
                heatmap.rows[row],
                heatmap.columns[col],
                format_value(heatmap.values[[row, col]])
            ));
        }
    });
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.2}")
    }
}
