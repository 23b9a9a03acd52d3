mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{config::normalize_server_url, load_settings, WorkflowModel};
use crossbeam_channel::bounded;
use eframe::egui;
use shared::domain::TargetFormat;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::events::UiEvent;
use crate::ui::{app::EmbconvApp, i18n::detect_language};

#[derive(Parser, Debug)]
#[command(name = "embconv-gui", about = "Desktop embroidery design converter")]
struct Args {
    /// Conversion service base URL; overrides embconv.toml and environment.
    #[arg(long)]
    server_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = normalize_server_url(&server_url);
    }
    tracing::info!(server = %settings.server_url, "starting desktop client");

    let language = detect_language();
    let model = WorkflowModel::new(
        TargetFormat::new(settings.default_format.clone()),
        language.digit_grouping(),
    );
    let surface_size = egui::vec2(settings.surface_width, settings.surface_height);

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Embroidery Converter")
            .with_inner_size([560.0, 760.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Embroidery Converter",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(EmbconvApp::new(
                cmd_tx,
                ui_rx,
                model,
                surface_size,
                language,
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to start desktop ui: {err}"))
}
