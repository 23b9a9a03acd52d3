use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::normalize_server_url,
    controller::StatusMessage,
    filename::sanitize_for_disk,
    load_settings, perform_remote,
    render::{render, DrawSurface, PathRecorder},
    stats::FormattedStats,
    update, Command, ConversionClient, Effect, Settings, WorkflowModel, WorkflowState,
};
use shared::domain::{SelectedFile, TargetFormat};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "embconv", about = "Preview and convert embroidery designs")]
struct Args {
    /// Conversion service base URL; overrides embconv.toml and environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Fetch the preview and print design statistics.
    Preview {
        file: PathBuf,
        #[arg(long)]
        imperial: bool,
    },
    /// Convert a design and write the result next to `--out-dir`.
    Convert {
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

struct Session {
    client: ConversionClient,
    model: WorkflowModel,
    surface: PathRecorder,
    surface_size: (f64, f64),
}

impl Session {
    fn new(settings: &Settings) -> Result<Self> {
        let client = ConversionClient::from_settings(settings)
            .context("failed to configure conversion client")?;
        Ok(Self {
            client,
            model: WorkflowModel::new(
                TargetFormat::new(settings.default_format.clone()),
                Default::default(),
            ),
            surface: PathRecorder::new(),
            surface_size: (
                f64::from(settings.surface_width),
                f64::from(settings.surface_height),
            ),
        })
    }

    /// Feeds `command` and every response it triggers through the controller
    /// until no request is outstanding.
    async fn dispatch(&mut self, command: Command) {
        let mut queue = VecDeque::from([command]);
        while let Some(command) = queue.pop_front() {
            tracing::debug!(command = command.name(), "dispatching");
            let (model, effects) = update(std::mem::take(&mut self.model), command);
            self.model = model;

            for effect in effects {
                match &effect {
                    Effect::ClearSurface => self.surface.clear(),
                    Effect::DrawPattern(preview) => {
                        let (width, height) = self.surface_size;
                        render(
                            &preview.pattern,
                            preview.bounds.as_ref(),
                            width,
                            height,
                            &mut self.surface,
                        );
                    }
                    Effect::ShowStats(stats) => print_stats(stats),
                    Effect::HidePreview => eprintln!("Preview unavailable for this design."),
                    Effect::FetchPreview { .. } | Effect::FetchConvert { .. } => {
                        if let Some(response) = perform_remote(&self.client, &effect).await {
                            queue.push_back(response);
                        }
                    }
                }
            }
        }
    }
}

fn print_stats(stats: &FormattedStats) {
    println!("Stitches: {}", stats.stitches);
    println!("Colors:   {}", stats.colors);
    if let Some(changes) = &stats.changes {
        println!("Changes:  {changes}");
    }
    println!("Width:    {}", stats.width);
    println!("Height:   {}", stats.height);
}

async fn read_design(path: &Path) -> Result<SelectedFile> {
    let payload = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read design '{}'", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile::new(name, payload))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = normalize_server_url(&server_url);
    }
    let mut session = Session::new(&settings)?;

    match args.command {
        CliCommand::Preview { file, imperial } => {
            let design = read_design(&file).await?;
            session.dispatch(Command::SelectFile(design)).await;
            if session.model.state() == WorkflowState::PreviewFailed {
                bail!("the conversion service could not preview '{}'", file.display());
            }
            if imperial {
                session.dispatch(Command::ToggleUnit).await;
            }
            let blocks = session.surface.strokes().len();
            if blocks > 0 {
                let (width, height) = session.surface_size;
                println!("Rendered {blocks} color blocks onto a {width}x{height} surface");
            }
        }
        CliCommand::Convert {
            file,
            format,
            out_dir,
        } => {
            let format = TargetFormat::new(format.unwrap_or(settings.default_format.clone()));
            session.dispatch(Command::FormatChanged(format.clone())).await;
            if session.model.show_format_caveat() {
                eprintln!(
                    "Note: {format} stores stitches exactly, but machines apply their own default palette, so colors may differ."
                );
            }

            let design = read_design(&file).await?;
            session.dispatch(Command::SelectFile(design)).await;
            if !session.model.can_convert() {
                bail!("the conversion service could not read '{}'", file.display());
            }
            session.dispatch(Command::RequestConvert(format)).await;

            match (session.model.state(), session.model.status()) {
                (WorkflowState::ConvertSucceeded, _) => {
                    let Some(artifact) = session.model.artifact() else {
                        bail!("conversion finished without an artifact");
                    };
                    let name = sanitize_for_disk(&artifact.file_name)
                        .context("service suggested an unusable file name")?;
                    let target = out_dir.join(name);
                    tokio::fs::write(&target, &artifact.bytes)
                        .await
                        .with_context(|| format!("failed to write '{}'", target.display()))?;
                    println!("Wrote {}", target.display());
                }
                (_, Some(StatusMessage::Error(message))) => bail!("{message}"),
                (state, _) => bail!("conversion did not complete (state: {state:?})"),
            }
        }
    }

    Ok(())
}
