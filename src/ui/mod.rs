mod bivariate_panel;
mod charts;
mod data_preview;
mod error_dialog;
mod help_dialog;
mod settings_grid;
mod toolbar;

pub use bivariate_panel::render_bivariate_panel;
pub use charts::render_chart_grid;
pub use data_preview::render_data_preview;
pub use error_dialog::render_error_dialog;
pub use help_dialog::render_help_dialog;
pub use settings_grid::render_settings_tabs;
pub use toolbar::render_toolbar;
