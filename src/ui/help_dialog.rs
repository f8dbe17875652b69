use crate::app::CrossOxide;

pub fn render_help_dialog(app: &mut CrossOxide, ctx: &eframe::egui::Context) {
    if app.state.ui.show_help {
        eframe::egui::Window::new("⌨ Keyboard Shortcuts")
            .anchor(eframe::egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .collapsible(false)
            .show(ctx, |ui| {
                ui.heading("General");
                ui.label("T - Toggle dark/light theme");
                ui.label("B - Show/hide the bivariate view");
                ui.label("Ctrl + R - Reset all filters");
                ui.label("H / F1 - Toggle help");
                ui.label("ESC - Close dialogs");

                ui.separator();
                ui.heading("Charts");
                ui.label("Drag on a bar chart - Filter to the brushed range");
                ui.label("Click a bar chart - Clear its filter");
                ui.label("Click a pie slice or row - Toggle that value");
                ui.label("reset - Clear one chart's filter");

                ui.separator();
                ui.heading("Files");
                ui.label("Drop a .csv, .zip or .json file onto the window to open it");

                ui.separator();
                if ui.button("Close").clicked() {
                    app.state.ui.show_help = false;
                }
            });
    }
}
