//! Scatter / heatmap view of two variables over the current selection

use super::generation::Generation;
use crate::error::Result;
use crate::filter::{Selection, SelectionScope};
use crate::settings::{ChartKind, ChartSettings};

/// Upper bound on heatmap bins per axis
const MAX_HEATMAP_BINS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BivariateMode {
    #[default]
    Scatter,
    Heatmap,
}

impl BivariateMode {
    pub fn label(&self) -> &'static str {
        match self {
            BivariateMode::Scatter => "Scatter",
            BivariateMode::Heatmap => "Heatmap",
        }
    }
}

/// Display range of one axis with its bucket interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub lo: f64,
    pub hi: f64,
    pub interval: f64,
}

impl AxisRange {
    /// Axis range of a chart's x scale
    pub fn from_settings(settings: &ChartSettings) -> Option<Self> {
        match &settings.kind {
            ChartKind::Bar(bar) => {
                let (lo, hi) = bar.x_scale.bounds();
                Some(Self {
                    lo,
                    hi,
                    interval: bar.bar_width,
                })
            }
            ChartKind::Pie(_) | ChartKind::Row(_) => None,
        }
    }

    /// Bin edges, at most `MAX_HEATMAP_BINS` bins
    fn edges(&self) -> Vec<f64> {
        let span = self.hi - self.lo;
        if !(span > 0.0) || !(self.interval > 0.0) {
            return vec![self.lo, self.lo + 1.0];
        }
        let bins = ((span / self.interval).round() as usize).clamp(1, MAX_HEATMAP_BINS);
        let width = span / bins as f64;
        (0..=bins).map(|i| self.lo + width * i as f64).collect()
    }
}

/// Which bin `value` falls into; the upper edge belongs to the last bin
fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let (&lo, &hi) = (edges.first()?, edges.last()?);
    let bins = edges.len() - 1;
    if !value.is_finite() || value < lo || value > hi {
        return None;
    }
    let idx = ((value - lo) / (hi - lo) * bins as f64).floor() as usize;
    Some(idx.min(bins - 1))
}

/// Plot data ready to draw
#[derive(Debug, Clone, PartialEq)]
pub enum BivariatePlot {
    Scatter {
        points: Vec<[f64; 2]>,
        x_range: (f64, f64),
        y_range: (f64, f64),
    },
    Heatmap {
        x_edges: Vec<f64>,
        y_edges: Vec<f64>,
        /// `counts[y][x]`
        counts: Vec<Vec<u32>>,
        max: u32,
    },
}

/// Project two fields of the selection into a plot
pub fn compute_plot(
    selection: &Selection,
    x: &str,
    y: &str,
    x_range: AxisRange,
    y_range: AxisRange,
    mode: BivariateMode,
) -> Option<BivariatePlot> {
    profiling::scope!("bivariate::compute_plot");

    let xs = selection.field(x)?;
    let ys = selection.field(y)?;
    let pairs = xs
        .into_iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite());

    let plot = match mode {
        BivariateMode::Scatter => BivariatePlot::Scatter {
            points: pairs.map(|(x, y)| [x, y]).collect(),
            x_range: (x_range.lo, x_range.hi),
            y_range: (y_range.lo, y_range.hi),
        },
        BivariateMode::Heatmap => {
            let x_edges = x_range.edges();
            let y_edges = y_range.edges();
            let mut counts = vec![vec![0u32; x_edges.len() - 1]; y_edges.len() - 1];
            for (x, y) in pairs {
                if let (Some(col), Some(row)) = (bin_index(&x_edges, x), bin_index(&y_edges, y)) {
                    counts[row][col] += 1;
                }
            }
            let max = counts.iter().flatten().copied().max().unwrap_or(0);
            BivariatePlot::Heatmap {
                x_edges,
                y_edges,
                counts,
                max,
            }
        }
    };
    Some(plot)
}

/// The bivariate view's configuration and last rendered plot
#[derive(Debug, Clone, Default)]
pub struct BivariateView {
    pub x: Option<String>,
    pub y: Option<String>,
    pub mode: BivariateMode,
    pub visible: bool,
    plot: Option<BivariatePlot>,
    /// A filter change happened while hidden
    stale: bool,
    refreshes: u64,
}

impl BivariateView {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            ..Self::default()
        }
    }

    pub fn plot(&self) -> Option<&BivariatePlot> {
        self.plot.as_ref()
    }

    /// Number of refreshes performed so far
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Keep the axes when they still name variables, otherwise pick the
    /// first two
    pub fn reconcile_axes(&mut self, variables: &[String]) {
        let valid = |axis: &Option<String>| axis.as_ref().is_some_and(|a| variables.contains(a));
        if !valid(&self.x) {
            self.x = variables.first().cloned();
        }
        if !valid(&self.y) {
            self.y = variables.get(1).or(variables.first()).cloned();
        }
    }

    /// Recompute the plot from the generation's current selection
    pub fn refresh(&mut self, generation: &Generation) -> Result<()> {
        self.refreshes += 1;
        self.stale = false;

        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            self.plot = None;
            return Ok(());
        };
        let display = generation.display_settings();
        let ranges = display
            .get(x)
            .and_then(AxisRange::from_settings)
            .zip(display.get(y).and_then(AxisRange::from_settings));
        let Some((x_range, y_range)) = ranges else {
            self.plot = None;
            return Ok(());
        };

        let selection = generation.selection(SelectionScope::All)?;
        self.plot = compute_plot(&selection, x, y, x_range, y_range, self.mode);
        tracing::debug!(
            "Bivariate refresh ({} vs {}, {}) over {} records",
            y,
            x,
            self.mode.label(),
            selection.len()
        );
        Ok(())
    }

    pub fn clear(&mut self) {
        self.plot = None;
    }
}
