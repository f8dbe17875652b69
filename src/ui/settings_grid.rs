use crate::app::CrossOxide;
use crate::constants::layout::{TABLE_HEADER_HEIGHT, TABLE_ROW_HEIGHT};
use crate::settings::SettingsGrid;
use crate::state::ActivePanel;
use egui_extras::{Column, TableBuilder};

/// Side panel tabs: the settings grid and the data preview
pub fn render_settings_tabs(app: &mut CrossOxide, ui: &mut eframe::egui::Ui) {
    ui.horizontal(|ui| {
        ui.selectable_value(&mut app.state.ui.active_panel, ActivePanel::Settings, "⚙ Variable Settings");
        ui.selectable_value(&mut app.state.ui.active_panel, ActivePanel::Preview, "📋 Data Preview");
    });
    ui.separator();

    match app.state.ui.active_panel {
        ActivePanel::Settings => render_settings_grid(app, ui),
        ActivePanel::Preview => super::render_data_preview(app, ui),
    }
}

/// Editable variable settings; edits take effect on "Apply Settings"
pub fn render_settings_grid(app: &mut CrossOxide, ui: &mut eframe::egui::Ui) {
    profiling::scope!("render_settings_grid");

    if !app.state.has_data() {
        ui.label("Load a bundle or import a CSV file to edit variable settings.");
        return;
    }

    ui.horizontal(|ui| {
        let label = if app.state.ui.settings_dirty {
            "✔ Apply Settings *"
        } else {
            "✔ Apply Settings"
        };
        if ui.button(label).on_hover_text("Rebuild the charts from these settings").clicked() {
            app.apply_settings();
        }
        if app.state.ui.settings_dirty && ui.small_button("Discard").clicked() {
            let saved = app.state.bundle().map(|b| b.settings.var_settings.to_grid());
            if let Some(grid) = saved {
                app.state.ui.settings_grid = grid;
                app.state.ui.settings_dirty = false;
            }
        }
    });

    let row_count = app.state.ui.settings_grid.rows.len();
    let mut changed = false;
    TableBuilder::new(ui)
        .id_salt("settings_grid")
        .striped(true)
        .resizable(true)
        .column(Column::auto().at_least(120.0))
        .columns(Column::remainder().at_least(80.0), 3)
        .header(TABLE_HEADER_HEIGHT, |mut header| {
            for title in SettingsGrid::headers() {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|body| {
            body.rows(TABLE_ROW_HEIGHT, row_count, |mut row| {
                let cells = &mut app.state.ui.settings_grid.rows[row.index()];
                let [name, rest @ ..] = cells;
                // The column name identifies the row and is not editable
                row.col(|ui| {
                    ui.label(name.as_str());
                });
                for cell in rest {
                    row.col(|ui| {
                        let edit = eframe::egui::TextEdit::singleline(cell).hint_text("NaN");
                        changed |= ui.add(edit).changed();
                    });
                }
            });
        });

    if changed {
        app.state.ui.settings_dirty = true;
    }
}
