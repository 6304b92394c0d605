use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color;
use crate::data::{CorrelationMethod, RankBy};
use crate::state::{AppState, MAX_TOP_N};

// ---------------------------------------------------------------------------
// Left side panel – summary and selectors
// ---------------------------------------------------------------------------

/// Render the left panel: model summary, selectors and section toggles.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Model");
    ui.separator();

    let Some(model) = &state.model else {
        ui.label("No model loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the widgets.
    let summary = model.summary();
    let views = summary.views.clone();
    let groups: Vec<(String, usize)> = model
        .groups()
        .iter()
        .map(|g| (g.name.clone(), g.n_samples()))
        .collect();
    let factors: Vec<(usize, String)> = model.factors().iter().map(|f| (f.index, f.name())).collect();
    let grouped = model.variance_is_grouped();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Summary ----
            egui::Grid::new("summary_grid").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("Samples");
                ui.strong(summary.n_samples.to_string());
                ui.end_row();
                ui.label("Features");
                ui.strong(summary.n_features.to_string());
                ui.end_row();
                ui.label("Factors");
                ui.strong(summary.n_factors.to_string());
                ui.end_row();
            });

            egui::CollapsingHeader::new(RichText::new(format!("Groups ({})", groups.len())).strong())
                .id_salt("groups_list")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    let colors = color::generate_palette(groups.len());
                    for ((name, n), c) in groups.iter().zip(colors) {
                        ui.horizontal(|ui: &mut Ui| {
                            ui.label(RichText::new("■").color(c));
                            ui.label(format!("{name}  ({n} samples)"));
                        });
                    }
                });
            ui.separator();

            // ---- View ----
            ui.strong("View");
            let current_view = state.selected_view.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("view_select")
                .selected_text(&current_view)
                .show_ui(ui, |ui: &mut Ui| {
                    for view in &views {
                        if ui.selectable_label(current_view == *view, view).clicked() {
                            report(state, |s| s.select_view(view));
                        }
                    }
                });

            // ---- Factor ----
            ui.strong("Factor");
            let current_factor = state.selected_factor;
            let factor_text = factors
                .iter()
                .find(|(i, _)| *i == current_factor)
                .map(|(_, name)| name.clone())
                .unwrap_or_default();
            egui::ComboBox::from_id_salt("factor_select")
                .selected_text(factor_text)
                .show_ui(ui, |ui: &mut Ui| {
                    for (index, name) in &factors {
                        if ui.selectable_label(current_factor == *index, name).clicked() {
                            report(state, |s| s.select_factor(*index));
                        }
                    }
                });

            // ---- Group ----
            if grouped {
                ui.strong("Group");
                let current_group = state.selected_group.clone();
                egui::ComboBox::from_id_salt("group_select")
                    .selected_text(current_group.as_deref().unwrap_or("All groups"))
                    .show_ui(ui, |ui: &mut Ui| {
                        if ui.selectable_label(current_group.is_none(), "All groups").clicked() {
                            report(state, |s| s.select_group(None));
                        }
                        for (name, _) in &groups {
                            let selected = current_group.as_deref() == Some(name.as_str());
                            if ui.selectable_label(selected, name).clicked() {
                                report(state, |s| s.select_group(Some(name)));
                            }
                        }
                    });
            }
            ui.separator();

            // ---- Top-N / ranking ----
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Top features");
                let mut n = state.top_n;
                if ui
                    .add(egui::DragValue::new(&mut n).range(1..=MAX_TOP_N))
                    .changed()
                {
                    report(state, |s| s.set_top_n(n));
                }
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Rank by");
                for by in RankBy::ALL {
                    if ui.selectable_label(state.rank_by == by, by.label()).clicked() {
                        state.set_rank_by(by);
                    }
                }
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Correlation");
                for method in CorrelationMethod::ALL {
                    if ui
                        .selectable_label(state.correlation_method == method, method.label())
                        .clicked()
                    {
                        state.set_correlation_method(method);
                    }
                }
            });
            ui.separator();

            // ---- Section toggles ----
            ui.strong("Show");
            let t = &mut state.toggles;
            ui.checkbox(&mut t.top_weights, "Top weights");
            ui.checkbox(&mut t.loadings, "Factor loadings");
            ui.checkbox(&mut t.weights_heatmap, "Weights heatmap");
            ui.checkbox(&mut t.factor_correlation, "Factor correlation");
            ui.checkbox(&mut t.weights_correlation, "Weights correlation");
            ui.checkbox(&mut t.variance, "Variance explained");
            ui.checkbox(&mut t.weights_table, "Weights table");
        });
}

/// Run a fallible state update; failures end up in the status line.
fn report(state: &mut AppState, f: impl FnOnce(&mut AppState) -> crate::error::Result<()>) {
    if let Err(e) = f(state) {
        log::error!("{e}");
        state.status_message = Some(format!("{}: {e}", e.kind()));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }

            let loaded = state.model.is_some();
            ui.add_enabled_ui(loaded, |ui: &mut Ui| {
                ui.menu_button("Export", |ui: &mut Ui| {
                    if ui.button("All weights of factor…").clicked() {
                        if let Some(path) = save_file_dialog("Export weights", "weights") {
                            let _ = state.export_weights(&path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Top weights…").clicked() {
                        if let Some(path) = save_file_dialog("Export top weights", "top_weights") {
                            let _ = state.export_top_weights(&path);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Variance explained…").clicked() {
                        if let Some(path) =
                            save_file_dialog("Export variance explained", "variance_explained")
                        {
                            let _ = state.export_variance(&path);
                        }
                        ui.close_menu();
                    }
                });
            });
        });

        ui.separator();

        if let (Some(model), Some(source)) = (&state.model, &state.source) {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{name}: {} groups, {} views, {} factors",
                model.groups().len(),
                model.views().len(),
                model.n_factors()
            ));
            ui.separator();
        }

        if let Some(msg) = &state.status_message {
            let color = if msg.starts_with("Saved") {
                Color32::LIGHT_GREEN
            } else {
                Color32::RED
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open MOFA+ model")
        .add_filter("Model files", &["hdf5", "h5", "json"])
        .add_filter("HDF5", &["hdf5", "h5"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        // errors are logged and kept in the status line
        let _ = state.open(&path);
    }
}

fn save_file_dialog(title: &str, stem: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .set_file_name(format!("{stem}.csv"))
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .save_file()
}
