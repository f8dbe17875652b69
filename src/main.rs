#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use eframe::App;
use eframe::egui::{self, CentralPanel, SidePanel, TopBottomPanel};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod constants;
mod data;
mod error;
mod filter;
mod settings;
mod state;
mod ui;
mod widgets;

use app::CrossOxide;
use config::AppConfig;
use constants::layout;

impl App for CrossOxide {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        profiling::finish_frame!();

        // Set theme
        if self.state.config.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        // Fire a due debounced refresh before drawing
        self.tick(ctx);

        // Handle keyboard shortcuts, unless a text field has focus
        if !ctx.wants_keyboard_input() {
            let (theme, bivariate, help, escape, reset) = ctx.input(|i| {
                (
                    i.key_pressed(egui::Key::T),
                    i.key_pressed(egui::Key::B),
                    i.key_pressed(egui::Key::H) || i.key_pressed(egui::Key::F1),
                    i.key_pressed(egui::Key::Escape),
                    i.modifiers.command && i.key_pressed(egui::Key::R),
                )
            });
            if theme {
                self.toggle_theme();
            }
            if bivariate {
                let visible = !self.state.bivariate.visible;
                let result = self.state.set_bivariate_visible(visible);
                self.report(result);
            }
            if help {
                self.state.ui.show_help = !self.state.ui.show_help;
            }
            if escape {
                self.state.ui.show_help = false;
                self.state.ui.clear_error();
            }
            if reset && self.state.has_data() {
                self.reset_all_filters();
            }
        }

        TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::render_toolbar(self, ctx, ui);
        });

        TopBottomPanel::bottom("bivariate")
            .resizable(true)
            .default_height(layout::BIVARIATE_PANEL_HEIGHT)
            .show(ctx, |ui| {
                ui::render_bivariate_panel(self, ui);
            });

        SidePanel::right("settings")
            .resizable(true)
            .default_width(layout::SIDE_PANEL_WIDTH)
            .show(ctx, |ui| {
                ui::render_settings_tabs(self, ui);
            });

        CentralPanel::default().show(ctx, |ui| {
            ui::render_chart_grid(self, ui);
        });

        ui::render_error_dialog(self, ctx);
        ui::render_help_dialog(self, ctx);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(feature = "profile-with-puffin")]
fn start_profiler() -> Option<puffin_http::Server> {
    puffin::set_scopes_on(true);
    match puffin_http::Server::new("127.0.0.1:8585") {
        Ok(server) => {
            tracing::info!("Puffin server listening on 127.0.0.1:8585");
            Some(server)
        }
        Err(e) => {
            tracing::warn!("Could not start puffin server: {}", e);
            None
        }
    }
}

fn main() -> eframe::Result<()> {
    init_logging();

    #[cfg(feature = "profile-with-puffin")]
    let _profiler = start_profiler();

    let config_path = Path::new(constants::config::CONFIG_FILE);
    let config = AppConfig::load_or_default(config_path);
    let mut app = CrossOxide::new(config).with_config_path(config_path);

    // Optional file to open on startup
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        let started = Instant::now();
        let result = app.open_path(&path);
        if app.report(result).is_some() {
            tracing::info!("Opened {} in {:?}", path.display(), started.elapsed());
        }
    }

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "CrossOxide - Linked Data Explorer",
        options,
        Box::new(|_| Ok(Box::new(app))),
    )
}
