use crate::app::CrossOxide;
use crate::constants::VERSION;
use crate::widgets::CountReadout;

/// Render the top toolbar: file actions, filter reset and the record count
pub fn render_toolbar(app: &mut CrossOxide, ctx: &eframe::egui::Context, ui: &mut eframe::egui::Ui) {
    ui.horizontal(|ui| {
        if ui.button("📂 Load Bundle").on_hover_text("Open a saved .zip or .json bundle").clicked() {
            app.load_bundle_dialog();
        }
        if ui.button("📥 Import CSV").on_hover_text("Start over from a CSV file").clicked() {
            app.import_csv_dialog();
        }

        let has_data = app.state.has_data();
        ui.add_enabled_ui(has_data, |ui| {
            if ui
                .button("✔ Apply Settings")
                .on_hover_text("Rebuild the charts from the settings grid")
                .clicked()
            {
                app.apply_settings();
            }
            if ui.button("💾 Save Bundle").clicked() {
                app.save_bundle_dialog();
            }
            if ui
                .button("⬇ Download Selection")
                .on_hover_text("Export the currently selected records as CSV")
                .clicked()
            {
                app.save_selection_dialog();
            }
            if ui.button("↺ Reset All").on_hover_text("Clear every chart filter").clicked() {
                app.reset_all_filters();
            }
        });

        ui.separator();
        CountReadout::new(app.state.data_count()).show(ui);

        ui.with_layout(eframe::egui::Layout::right_to_left(eframe::egui::Align::Center), |ui| {
            ui.label(format!("v{}", VERSION));
            let theme = if app.state.config.dark_mode { "☀" } else { "🌙" };
            if ui.button(theme).on_hover_text("Toggle theme (T)").clicked() {
                app.toggle_theme();
            }
        });
    });

    if let Some(status) = &app.state.ui.status {
        ui.label(eframe::egui::RichText::new(status).small().weak());
    }

    // Drag and drop opens the first dropped file
    let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
    if let Some(file) = dropped {
        let result = app.open_dropped(&file);
        app.report(result);
    }
}
