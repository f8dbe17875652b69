//! Chart grid: one chart per binding of the current generation
//!
//! Charts are drawn from a snapshot of the generation. Interactions are
//! collected as [`ChartAction`]s and applied after drawing, so the filter
//! index only changes between frames.

use std::f32::consts::{FRAC_PI_2, TAU};
use std::time::Instant;

use crate::app::CrossOxide;
use crate::data::dataset::from_millis;
use crate::error::Result;
use crate::filter::DimensionFilter;
use crate::settings::chart::{BarConfig, PieConfig, RowConfig, XScale};
use crate::settings::{ChartKind, ChartSettings};
use crate::state::{AppState, Brush, ChartHandle};
use crate::widgets::ChartHeader;
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2, pos2, vec2};
use egui_plot::{Bar, BarChart, GridMark, Plot, VLine};

/// d3 category10
const PALETTE: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

/// Fill of bars, slices and rows outside the active filter
const DESELECTED: Color32 = Color32::from_gray(160);

const BRUSH_COLOR: Color32 = Color32::from_rgb(0xff, 0x7f, 0x0e);

/// Arc segment used to tessellate pie slices
const PIE_SEGMENT_ANGLE: f32 = 0.1;

/// An interaction with one chart
#[derive(Debug, Clone, PartialEq)]
pub enum ChartAction {
    /// Filter to `[lo, hi)`
    Brush { handle: ChartHandle, lo: f64, hi: f64 },
    /// Add or remove one key of a pie or row chart
    Toggle { handle: ChartHandle, key: f64 },
    Reset(ChartHandle),
}

impl ChartAction {
    /// Action for a finished drag; an empty span clears the filter
    pub fn from_brush(brush: Brush) -> Self {
        let (lo, hi) = brush.span();
        if hi > lo {
            ChartAction::Brush {
                handle: brush.handle,
                lo,
                hi,
            }
        } else {
            ChartAction::Reset(brush.handle)
        }
    }
}

/// Route an action to its state entry point
pub fn apply_chart_action(state: &mut AppState, action: ChartAction, now: Instant) -> Result<()> {
    match action {
        ChartAction::Brush { handle, lo, hi } => {
            state.filter_chart(handle, Some(DimensionFilter::Range { lo, hi }), now)
        }
        ChartAction::Toggle { handle, key } => state.toggle_chart_key(handle, key, now),
        ChartAction::Reset(handle) => state.reset_chart(handle, now),
    }
}

/// Everything needed to draw one chart, detached from the generation
#[derive(Debug, Clone)]
struct ChartView {
    handle: ChartHandle,
    settings: ChartSettings,
    values: Vec<(f64, usize)>,
    filter: Option<DimensionFilter>,
}

impl ChartView {
    fn selects(&self, key: f64) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(key))
    }
}

/// Integral keys without a trailing ".0"
pub fn format_key(key: f64) -> String {
    if key.fract() == 0.0 && key.abs() < 1e15 {
        format!("{:.0}", key)
    } else {
        format!("{}", key)
    }
}

fn format_bound(scale: &XScale, value: f64) -> String {
    match scale {
        XScale::Time { .. } => from_millis(value as i64)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format_key(value)),
        XScale::Linear { .. } => format!("{:.2}", value),
    }
}

/// Text describing a chart's filter, or its domain when it asks for one
pub fn filter_readout(settings: &ChartSettings, filter: Option<&DimensionFilter>) -> Option<String> {
    match (&settings.kind, filter) {
        (ChartKind::Bar(bar), Some(DimensionFilter::Range { lo, hi })) => Some(format!(
            "[{} → {})",
            format_bound(&bar.x_scale, *lo),
            format_bound(&bar.x_scale, *hi)
        )),
        (ChartKind::Bar(bar), None) if bar.show_range => {
            let (lo, hi) = bar.x_scale.bounds();
            Some(format!(
                "all: {} → {}",
                format_bound(&bar.x_scale, lo),
                format_bound(&bar.x_scale, hi)
            ))
        }
        (kind, Some(DimensionFilter::Keys(keys))) => {
            let labels: Vec<String> = keys
                .iter()
                .map(|k| match kind {
                    ChartKind::Row(row) => row.label_for(k.0),
                    _ => format_key(k.0),
                })
                .collect();
            Some(labels.join(", "))
        }
        (_, Some(DimensionFilter::Exact(v))) => Some(format_key(*v)),
        _ => None,
    }
}

/// A pie slice as angles clockwise from 12 o'clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieSlice {
    pub key: f64,
    pub count: usize,
    pub start: f32,
    pub end: f32,
}

/// Lay out non-empty groups around the circle
pub fn pie_slices(values: &[(f64, usize)]) -> Vec<PieSlice> {
    let total: usize = values.iter().map(|v| v.1).sum();
    if total == 0 {
        return Vec::new();
    }
    let mut angle = 0.0;
    values
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|&(key, count)| {
            let sweep = TAU * count as f32 / total as f32;
            let slice = PieSlice {
                key,
                count,
                start: angle,
                end: angle + sweep,
            };
            angle += sweep;
            slice
        })
        .collect()
}

/// Slice under an offset from the pie's centre
pub fn slice_at(slices: &[PieSlice], offset: Vec2, inner: f32, outer: f32) -> Option<f64> {
    let distance = offset.length();
    if distance < inner || distance > outer {
        return None;
    }
    let mut angle = offset.y.atan2(offset.x) + FRAC_PI_2;
    if angle < 0.0 {
        angle += TAU;
    }
    slices
        .iter()
        .find(|s| s.start <= angle && angle < s.end)
        .map(|s| s.key)
}

fn polar(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    let theta = angle - FRAC_PI_2;
    pos2(center.x + radius * theta.cos(), center.y + radius * theta.sin())
}

/// Render every chart of the current generation
pub fn render_chart_grid(app: &mut CrossOxide, ui: &mut egui::Ui) {
    profiling::scope!("render_chart_grid");

    let Some(generation) = app.state.generation() else {
        ui.vertical_centered(|ui| {
            ui.heading("No data loaded");
            ui.label("Load a bundle, import a CSV file, or drop one onto the window");
        });
        return;
    };

    let views: Vec<ChartView> = generation
        .charts()
        .iter()
        .filter_map(|chart| {
            Some(ChartView {
                handle: chart.handle,
                settings: chart.settings.clone(),
                values: generation.chart_values(chart.handle).ok()?,
                filter: generation.chart_filter(chart.handle).ok()?.cloned(),
            })
        })
        .collect();

    let mut actions = Vec::new();
    egui::ScrollArea::vertical().id_salt("chart_grid").show(ui, |ui| {
        ui.horizontal_wrapped(|ui| {
            for view in &views {
                ui.group(|ui| {
                    ui.vertical(|ui| {
                        ui.set_width(view.settings.width);
                        render_chart(&mut app.state.ui.brush, ui, view, &mut actions);
                    });
                });
            }
        });
    });

    let now = Instant::now();
    for action in actions {
        let result = apply_chart_action(&mut app.state, action, now);
        app.report(result);
    }
}

fn render_chart(brush: &mut Option<Brush>, ui: &mut egui::Ui, view: &ChartView, actions: &mut Vec<ChartAction>) {
    let header = ChartHeader::new(&view.settings.title)
        .readout(filter_readout(&view.settings, view.filter.as_ref()))
        .filtered(view.filter.is_some())
        .show(ui);
    if header.clicked() {
        actions.push(ChartAction::Reset(view.handle));
    }

    match &view.settings.kind {
        ChartKind::Bar(bar) => render_bar_chart(brush, ui, view, bar, actions),
        ChartKind::Pie(pie) => render_pie_chart(ui, view, pie, actions),
        ChartKind::Row(row) => render_row_chart(ui, view, row, actions),
    }
}

fn render_bar_chart(
    brush: &mut Option<Brush>,
    ui: &mut egui::Ui,
    view: &ChartView,
    bar: &BarConfig,
    actions: &mut Vec<ChartAction>,
) {
    let handle = view.handle;
    let (lo, hi) = bar.x_scale.bounds();
    let offset = if bar.center_bar { 0.0 } else { bar.bar_width / 2.0 };
    let width = if bar.gap > 0.0 { bar.bar_width * 0.9 } else { bar.bar_width };

    let bars: Vec<Bar> = view
        .values
        .iter()
        .map(|&(key, count)| {
            let fill = if view.selects(key) { PALETTE[0] } else { DESELECTED };
            Bar::new(key + offset, count as f64).width(width).fill(fill)
        })
        .collect();

    let mut plot = Plot::new(("chart", handle.generation.0, handle.dimension.0))
        .width(view.settings.width)
        .height(view.settings.height)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .show_x(false)
        .include_x(lo)
        .include_x(hi)
        .include_y(0.0);

    if matches!(bar.x_scale, XScale::Time { .. }) {
        plot = plot.x_axis_formatter(|mark, _range| {
            from_millis(mark.value as i64)
                .map(|d| d.format("%b %Y").to_string())
                .unwrap_or_default()
        });
    }
    if let Some(ticks) = bar.x_tick_values.clone() {
        let step = match ticks.as_slice() {
            [a, b, ..] => b - a,
            _ => 1.0,
        };
        plot = plot.x_grid_spacer(move |_input| {
            ticks
                .iter()
                .map(|&value| GridMark { value, step_size: step })
                .collect()
        });
    }

    let live = brush.filter(|b| b.handle == handle).map(|b| b.span());
    let marked = live.or(match &view.filter {
        Some(DimensionFilter::Range { lo, hi }) => Some((*lo, *hi)),
        _ => None,
    });

    let shown = plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(BarChart::new(view.settings.title.clone(), bars));
        if let Some((a, b)) = marked {
            plot_ui.vline(VLine::new("", a).color(BRUSH_COLOR));
            plot_ui.vline(VLine::new("", b).color(BRUSH_COLOR));
        }
    });

    let response = &shown.response;
    let to_x = |pos: Pos2| shown.transform.value_from_position(pos).x;
    if response.drag_started() {
        let origin = ui.input(|i| i.pointer.press_origin()).or(response.interact_pointer_pos());
        if let Some(x) = origin.map(to_x) {
            *brush = Some(Brush {
                handle,
                start: x,
                current: x,
            });
        }
    } else if response.dragged() {
        if let (Some(b), Some(pos)) = (brush.as_mut(), response.interact_pointer_pos()) {
            if b.handle == handle {
                b.current = to_x(pos);
            }
        }
    }

    if response.drag_stopped() {
        if let Some(b) = brush.filter(|b| b.handle == handle) {
            *brush = None;
            actions.push(ChartAction::from_brush(b));
        }
    } else if response.clicked() {
        actions.push(ChartAction::Reset(handle));
    }
}

fn paint_slice(painter: &egui::Painter, center: Pos2, inner: f32, outer: f32, slice: &PieSlice, fill: Color32) {
    let sweep = slice.end - slice.start;
    let segments = ((sweep / PIE_SEGMENT_ANGLE).ceil() as usize).max(1);
    let step = sweep / segments as f32;
    for i in 0..segments {
        let a0 = slice.start + step * i as f32;
        let a1 = a0 + step;
        let quad = vec![
            polar(center, inner, a0),
            polar(center, outer, a0),
            polar(center, outer, a1),
            polar(center, inner, a1),
        ];
        painter.add(Shape::convex_polygon(quad, fill, Stroke::NONE));
    }
}

fn render_pie_chart(ui: &mut egui::Ui, view: &ChartView, pie: &PieConfig, actions: &mut Vec<ChartAction>) {
    let side = pie.radius * 2.0 + 4.0;
    let (rect, response) = ui.allocate_exact_size(vec2(side, side), Sense::click());
    let center = rect.center();
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().strong_text_color();

    let slices = pie_slices(&view.values);
    if slices.is_empty() {
        painter.circle_stroke(center, pie.radius, Stroke::new(1.0, DESELECTED));
        return;
    }

    for (i, slice) in slices.iter().enumerate() {
        let fill = if view.selects(slice.key) {
            PALETTE[i % PALETTE.len()]
        } else {
            DESELECTED
        };
        paint_slice(&painter, center, pie.inner_radius, pie.radius, slice, fill);
        if slice.end - slice.start >= pie.min_angle_for_label {
            let mid = (slice.start + slice.end) / 2.0;
            let at = polar(center, (pie.inner_radius + pie.radius) / 2.0, mid);
            painter.text(at, Align2::CENTER_CENTER, format_key(slice.key), FontId::proportional(11.0), text_color);
        }
    }

    let hovered = response
        .hover_pos()
        .and_then(|pos| slice_at(&slices, pos - center, pie.inner_radius, pie.radius))
        .and_then(|key| slices.iter().find(|s| s.key == key).copied());
    if response.clicked() {
        if let Some(key) = response
            .interact_pointer_pos()
            .and_then(|pos| slice_at(&slices, pos - center, pie.inner_radius, pie.radius))
        {
            actions.push(ChartAction::Toggle { handle: view.handle, key });
        }
    }
    if let Some(slice) = hovered {
        response.on_hover_text(format!("{}: {}", format_key(slice.key), slice.count));
    }
}

fn render_row_chart(ui: &mut egui::Ui, view: &ChartView, row: &RowConfig, actions: &mut Vec<ChartAction>) {
    let max = view.values.iter().map(|v| v.1).max().unwrap_or(0).max(1);
    let row_height = ((view.settings.height - 4.0) / view.values.len().max(1) as f32).min(28.0);
    let text_color = ui.visuals().strong_text_color();

    for (i, &(key, count)) in view.values.iter().enumerate() {
        let (rect, response) = ui.allocate_exact_size(vec2(view.settings.width, row_height), Sense::click());
        let fill = if !view.selects(key) {
            DESELECTED
        } else if row.colors.is_empty() {
            PALETTE[i % PALETTE.len()]
        } else {
            let (r, g, b) = row.colors[i % row.colors.len()];
            Color32::from_rgb(r, g, b)
        };

        let bar_width = rect.width() * count as f32 / max as f32;
        let bar = Rect::from_min_size(rect.min, vec2(bar_width, (row_height - 2.0).max(1.0)));
        let painter = ui.painter();
        painter.rect_filled(bar, 0.0, fill);

        let label = row.label_for(key);
        let label_y = rect.top() + row.label_offset_y.min(rect.height() / 2.0);
        painter.text(
            pos2(rect.left() + 6.0, label_y),
            Align2::LEFT_CENTER,
            &label,
            FontId::proportional(11.0),
            text_color,
        );

        if response.clicked() {
            actions.push(ChartAction::Toggle { handle: view.handle, key });
        }
        response.on_hover_text(format!("{}: {}", label, count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Bucketing, DimensionId, GroupKey};
    use crate::state::GenerationId;
    use std::collections::BTreeSet;

    fn handle() -> ChartHandle {
        ChartHandle {
            generation: GenerationId(1),
            dimension: DimensionId(0),
        }
    }

    fn bar_settings(x_scale: XScale, show_range: bool) -> ChartSettings {
        ChartSettings {
            title: "A".to_string(),
            width: 200.0,
            height: 100.0,
            kind: ChartKind::Bar(BarConfig {
                x_scale,
                gap: -1.0,
                center_bar: true,
                show_range,
                y_ticks: 5,
                x_tick_values: None,
                bar_width: 1.0,
            }),
            bucketing: Bucketing::Exact,
        }
    }

    #[test]
    fn test_brush_action() {
        let brush = Brush {
            handle: handle(),
            start: 4.0,
            current: 2.0,
        };
        assert_eq!(
            ChartAction::from_brush(brush),
            ChartAction::Brush { handle: handle(), lo: 2.0, hi: 4.0 }
        );

        let click = Brush { current: 4.0, ..brush };
        assert_eq!(ChartAction::from_brush(click), ChartAction::Reset(handle()));
    }

    #[test]
    fn test_readout_for_linear_range() {
        let settings = bar_settings(XScale::Linear { range: (0.0, 10.0) }, false);
        let filter = DimensionFilter::Range { lo: 2.0, hi: 4.5 };
        assert_eq!(
            filter_readout(&settings, Some(&filter)).as_deref(),
            Some("[2.00 → 4.50)")
        );
        assert_eq!(filter_readout(&settings, None), None);
    }

    #[test]
    fn test_readout_for_time_domain() {
        let settings = bar_settings(
            XScale::Time {
                range: (1_577_836_800_000, 1_580_515_200_000),
            },
            true,
        );
        assert_eq!(
            filter_readout(&settings, None).as_deref(),
            Some("all: 2020-01-01 → 2020-02-01")
        );
    }

    #[test]
    fn test_readout_for_row_keys_uses_labels() {
        let settings = ChartSettings {
            title: "Weekday".to_string(),
            width: 200.0,
            height: 100.0,
            kind: ChartKind::Row(RowConfig {
                labels: Some(vec!["Sun".to_string(), "Mon".to_string()]),
                colors: Vec::new(),
                label_offset_y: 12.0,
            }),
            bucketing: Bucketing::Exact,
        };
        let keys = DimensionFilter::Keys(BTreeSet::from([GroupKey(1.0), GroupKey(0.0)]));
        assert_eq!(filter_readout(&settings, Some(&keys)).as_deref(), Some("Sun, Mon"));
    }

    #[test]
    fn test_pie_slices_skip_empty_groups() {
        let slices = pie_slices(&[(2019.0, 1), (2020.0, 0), (2021.0, 3)]);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].start, 0.0);
        assert!((slices[0].end - TAU / 4.0).abs() < 1e-6);
        assert!((slices[1].end - TAU).abs() < 1e-5);
        assert!(pie_slices(&[(1.0, 0)]).is_empty());
    }

    #[test]
    fn test_slice_at() {
        let slices = pie_slices(&[(1.0, 1), (2.0, 1)]);
        // Right of centre is a quarter turn clockwise from 12 o'clock
        assert_eq!(slice_at(&slices, vec2(50.0, 0.0), 25.0, 98.0), Some(1.0));
        assert_eq!(slice_at(&slices, vec2(-50.0, 0.0), 25.0, 98.0), Some(2.0));
        assert_eq!(slice_at(&slices, vec2(10.0, 0.0), 25.0, 98.0), None);
        assert_eq!(slice_at(&slices, vec2(120.0, 0.0), 25.0, 98.0), None);
    }

    #[test]
    fn test_format_key() {
        assert_eq!(format_key(2020.0), "2020");
        assert_eq!(format_key(2.5), "2.5");
    }

    #[test]
    fn test_actions_reach_state() {
        let mut state = AppState::default();
        state.import_csv_str("Date,A\n1/5/2020,1\n1/6/2020,2\n1/7/2020,3\n").unwrap();
        let a = state.generation().unwrap().chart_for_column("A").unwrap().handle;
        let now = Instant::now();

        apply_chart_action(&mut state, ChartAction::Brush { handle: a, lo: 1.5, hi: 3.0 }, now).unwrap();
        assert_eq!(state.data_count().unwrap().selected, 1);

        apply_chart_action(&mut state, ChartAction::Reset(a), now).unwrap();
        assert_eq!(state.data_count().unwrap().selected, 3);

        let weekday = state.generation().unwrap().chart_for_column("Weekday").unwrap().handle;
        apply_chart_action(&mut state, ChartAction::Toggle { handle: weekday, key: 1.0 }, now).unwrap();
        assert_eq!(state.data_count().unwrap().selected, 1);
    }
}
