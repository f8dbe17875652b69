use crate::app::CrossOxide;
use crate::constants::layout::{TABLE_HEADER_HEIGHT, TABLE_ROW_HEIGHT};
use egui_extras::{Column, TableBuilder};

/// Read-only table of the first rows of the dataset
pub fn render_data_preview(app: &mut CrossOxide, ui: &mut eframe::egui::Ui) {
    profiling::scope!("render_data_preview");

    let Some(preview) = app.state.data_preview() else {
        ui.label("No data loaded");
        return;
    };
    if let Some(count) = app.state.data_count() {
        ui.label(format!(
            "Showing the first {} of {} rows",
            preview.rows.len(),
            count.total
        ));
    }

    TableBuilder::new(ui)
        .id_salt("data_preview")
        .striped(true)
        .resizable(true)
        .columns(Column::auto().at_least(60.0), preview.headers.len())
        .header(TABLE_HEADER_HEIGHT, |mut header| {
            for title in &preview.headers {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(TABLE_ROW_HEIGHT, preview.rows.len(), |mut row| {
                for cell in &preview.rows[row.index()] {
                    row.col(|ui| {
                        ui.label(cell);
                    });
                }
            });
        });
}
