use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::FeatureWeight;

/// Rows shown before the preview is cut off.
const PREVIEW_ROWS: usize = 500;

/// Scrollable feature / weight table for the selected factor.
pub fn weights_table(ui: &mut Ui, rows: &[FeatureWeight]) {
    let shown = rows.len().min(PREVIEW_ROWS);

    TableBuilder::new(ui)
        .id_salt("weights_table")
        .striped(true)
        .max_scroll_height(320.0)
        .column(Column::auto().at_least(40.0))
        .column(Column::remainder().at_least(140.0))
        .column(Column::auto().at_least(90.0))
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong("Feature");
            });
            header.col(|ui| {
                ui.strong("Weight");
            });
        })
        .body(|body| {
            body.rows(18.0, shown, |mut row| {
                let i = row.index();
                let fw = &rows[i];
                row.col(|ui| {
                    ui.label((i + 1).to_string());
                });
                row.col(|ui| {
                    ui.label(&fw.feature);
                });
                row.col(|ui| {
                    ui.monospace(format!("{:+.4}", fw.weight));
                });
            });
        });

    if rows.len() > shown {
        ui.label(RichText::new(format!("… {} more rows (export to see all)", rows.len() - shown)).weak());
    }
}
