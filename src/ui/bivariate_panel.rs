use crate::app::CrossOxide;
use crate::state::{BivariateMode, BivariatePlot};
use eframe::egui::{self, Color32, ComboBox, Stroke};
use egui_plot::{Plot, PlotPoints, Points, Polygon};

/// Heatmap colour for a cell holding `count` of at most `max` records
pub fn heat_color(count: u32, max: u32) -> Color32 {
    let t = if max == 0 { 0.0 } else { count as f32 / max as f32 };
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    // #deebf7 -> #08306b
    Color32::from_rgb(lerp(0xde, 0x08), lerp(0xeb, 0x30), lerp(0xf7, 0x6b))
}

/// Render the bivariate panel: controls, then the scatter or heatmap
pub fn render_bivariate_panel(app: &mut CrossOxide, ui: &mut egui::Ui) {
    profiling::scope!("render_bivariate_panel");

    let mut visible = app.state.bivariate.visible;
    ui.horizontal(|ui| {
        ui.checkbox(&mut visible, "Bivariate view");
        if !visible || !app.state.has_data() {
            return;
        }
        ui.separator();

        let variables = app.state.variable_names();
        let mut x = app.state.bivariate.x.clone().unwrap_or_default();
        let mut y = app.state.bivariate.y.clone().unwrap_or_default();
        ComboBox::from_label("X")
            .selected_text(&x)
            .show_ui(ui, |ui| {
                for name in &variables {
                    ui.selectable_value(&mut x, name.clone(), name);
                }
            });
        ComboBox::from_label("Y")
            .selected_text(&y)
            .show_ui(ui, |ui| {
                for name in &variables {
                    ui.selectable_value(&mut y, name.clone(), name);
                }
            });
        if app.state.bivariate.x.as_deref() != Some(x.as_str())
            || app.state.bivariate.y.as_deref() != Some(y.as_str())
        {
            let result = app.state.set_bivariate_axes(x, y);
            app.report(result);
        }

        ui.separator();
        let mut mode = app.state.bivariate.mode;
        for option in [BivariateMode::Scatter, BivariateMode::Heatmap] {
            ui.radio_value(&mut mode, option, option.label());
        }
        if mode != app.state.bivariate.mode {
            let result = app.state.set_bivariate_mode(mode);
            app.report(result);
        }
    });

    if visible != app.state.bivariate.visible {
        let result = app.state.set_bivariate_visible(visible);
        app.report(result);
    }
    if !app.state.bivariate.visible {
        return;
    }

    let x_label = app.state.bivariate.x.clone().unwrap_or_default();
    let y_label = app.state.bivariate.y.clone().unwrap_or_default();
    let Some(plot) = app.state.bivariate.plot() else {
        ui.label("Nothing to plot");
        return;
    };

    let mut view = Plot::new("bivariate")
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .height(ui.available_height().max(160.0));

    match plot {
        BivariatePlot::Scatter {
            points,
            x_range,
            y_range,
        } => {
            view = view
                .include_x(x_range.0)
                .include_x(x_range.1)
                .include_y(y_range.0)
                .include_y(y_range.1);
            let points = points.clone();
            view.show(ui, |plot_ui| {
                plot_ui.points(
                    Points::new("records", points)
                        .radius(2.0)
                        .color(Color32::from_rgb(0x1f, 0x77, 0xb4)),
                );
            });
        }
        BivariatePlot::Heatmap {
            x_edges,
            y_edges,
            counts,
            max,
        } => {
            view.show(ui, |plot_ui| {
                for (row, cells) in counts.iter().enumerate() {
                    for (col, &count) in cells.iter().enumerate() {
                        if count == 0 {
                            continue;
                        }
                        let (x0, x1) = (x_edges[col], x_edges[col + 1]);
                        let (y0, y1) = (y_edges[row], y_edges[row + 1]);
                        let cell = PlotPoints::from(vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]);
                        plot_ui.polygon(
                            Polygon::new(format!("{} records", count), cell)
                                .fill_color(heat_color(count, *max))
                                .stroke(Stroke::NONE),
                        );
                    }
                }
            });
        }
    }
}
