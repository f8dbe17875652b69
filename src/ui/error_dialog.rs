use crate::app::CrossOxide;

/// Blocking dialog for the last error
pub fn render_error_dialog(app: &mut CrossOxide, ctx: &eframe::egui::Context) {
    let Some(dialog) = app.state.ui.error_dialog.clone() else {
        return;
    };
    eframe::egui::Window::new(format!("⚠ {}", dialog.title))
        .anchor(eframe::egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(&dialog.message);
            ui.separator();
            if ui.button("OK").clicked() {
                app.state.ui.clear_error();
            }
        });
}
