//! "selected out of total records" readout

use crate::state::DataCount;
use egui::{Response, RichText, Ui};

pub struct CountReadout {
    count: Option<DataCount>,
}

impl CountReadout {
    pub fn new(count: Option<DataCount>) -> Self {
        Self { count }
    }

    pub fn show(self, ui: &mut Ui) -> Response {
        match self.count {
            Some(DataCount { selected, total }) => {
                let text = RichText::new(format!("{} selected out of {} records", selected, total));
                let text = if selected < total { text.strong() } else { text };
                ui.label(text)
            }
            None => ui.label(RichText::new("No data loaded").weak()),
        }
    }
}
