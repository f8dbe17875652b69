//! Chart title row with the active filter readout and a reset link

use egui::{Response, RichText, Ui};

/// Title line shown above every chart
pub struct ChartHeader<'a> {
    title: &'a str,
    readout: Option<String>,
    filtered: bool,
}

impl<'a> ChartHeader<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            readout: None,
            filtered: false,
        }
    }

    /// Text describing the current filter, e.g. `[2.0, 4.0)`
    pub fn readout(mut self, readout: Option<String>) -> Self {
        self.readout = readout;
        self
    }

    /// Whether the chart currently filters; only then is "reset" offered
    pub fn filtered(mut self, filtered: bool) -> Self {
        self.filtered = filtered;
        self
    }

    /// Show the header. The returned response is the reset link's when
    /// present, so `clicked()` means reset was requested.
    pub fn show(self, ui: &mut Ui) -> Response {
        let row = ui.horizontal(|ui| {
            ui.label(RichText::new(self.title).strong());
            if let Some(readout) = &self.readout {
                ui.label(RichText::new(readout).small().weak());
            }
            self.filtered.then(|| ui.small_button("reset"))
        });
        row.inner.unwrap_or(row.response)
    }
}
