//! Runtime bridge between UI command queue and backend event intake.

use std::{path::Path, sync::Arc, thread};

use client_core::{Command, ConversionClient, ConversionService, Settings};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use shared::domain::SelectedFile;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: Settings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let client = match ConversionClient::from_settings(&settings) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: {err}"),
                )));
                tracing::error!("failed to build conversion client: {err}");
                return;
            }
        };
        tracing::info!(server = %client.base_url(), "backend worker ready");
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

        let max_upload_bytes = settings.max_upload_bytes;
        while let Ok(cmd) = cmd_rx.recv() {
            tracing::debug!(command = cmd.name(), "backend received command");
            let client = Arc::clone(&client);
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                if let Some(event) = handle_command(client.as_ref(), cmd, max_upload_bytes).await {
                    deliver(&ui_tx, event);
                }
            });
        }
        tracing::info!("backend command queue closed; worker stopping");
    });
}

/// Hands `event` to the UI. Events that must not be lost wait for queue space
/// on a blocking section; the rest are dropped when the queue is full.
fn deliver(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    match ui_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) if event.must_deliver() => {
            let name = event.name();
            if tokio::task::block_in_place(|| ui_tx.send(event)).is_err() {
                tracing::debug!(event = name, "ui closed before backend event was delivered");
            }
        }
        Err(TrySendError::Full(event)) => {
            tracing::warn!(event = event.name(), "ui event queue full; dropping backend event");
        }
        Err(TrySendError::Disconnected(event)) => {
            tracing::debug!(event = event.name(), "ui event queue closed");
        }
    }
}

async fn handle_command<S>(
    service: &S,
    cmd: BackendCommand,
    max_upload_bytes: usize,
) -> Option<UiEvent>
where
    S: ConversionService + ?Sized,
{
    match cmd {
        BackendCommand::LoadDesign { tag, path } => Some(
            match load_design(&path, max_upload_bytes).await {
                Ok(file) => UiEvent::DesignLoaded { tag, file },
                Err(message) => {
                    UiEvent::Error(UiError::from_message(UiErrorContext::LoadDesign, message))
                }
            },
        ),
        BackendCommand::FetchPreview { tag, file } => {
            let result = service.request_preview(&file).await;
            Some(UiEvent::Workflow(Command::PreviewResponse { tag, result }))
        }
        BackendCommand::Convert { tag, file, format } => {
            let result = service.request_convert(&file, &format).await;
            Some(UiEvent::Workflow(Command::ConvertResponse { tag, result }))
        }
        BackendCommand::SaveArtifact { artifact, path } => {
            Some(match tokio::fs::write(&path, &artifact.bytes).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "saved converted design");
                    UiEvent::ArtifactSaved(path)
                }
                Err(err) => UiEvent::Error(UiError::from_message(
                    UiErrorContext::SaveArtifact,
                    format!("failed to write {}: {err}", path.display()),
                )),
            })
        }
    }
}

async fn load_design(path: &Path, max_upload_bytes: usize) -> Result<SelectedFile, String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("invalid design path: {}", path.display()))?
        .to_string();

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    if metadata.len() > max_upload_bytes as u64 {
        return Err(format!(
            "{name} is too large ({} bytes exceeds the {max_upload_bytes} byte upload limit)",
            metadata.len()
        ));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    tracing::info!(file = %name, bytes = bytes.len(), "loaded design");
    Ok(SelectedFile::new(name, bytes))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use shared::{
        domain::{
            ConvertedArtifact, PreviewMode, PreviewResult, RequestTag, Stats, TargetFormat,
        },
        error::{ConvertFailure, PreviewFailure},
    };

    use super::*;

    struct CannedService;

    #[async_trait]
    impl ConversionService for CannedService {
        async fn request_preview(
            &self,
            _file: &SelectedFile,
        ) -> Result<PreviewResult, PreviewFailure> {
            Ok(PreviewResult {
                mode: PreviewMode::Vector,
                pattern: Vec::new(),
                bounds: None,
                stats: Stats {
                    stitches: 0,
                    colors: 0,
                    width: 0.0,
                    height: 0.0,
                    changes: None,
                },
                image: None,
            })
        }

        async fn request_convert(
            &self,
            _file: &SelectedFile,
            _format: &TargetFormat,
        ) -> Result<ConvertedArtifact, ConvertFailure> {
            Err(ConvertFailure::Unspecified { status: 500 })
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("embconv-gui-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn load_design_reads_file_and_keeps_its_name() {
        let path = temp_path("rose.pes");
        tokio::fs::write(&path, b"design-bytes").await.expect("write fixture");

        let event = handle_command(
            &CannedService,
            BackendCommand::LoadDesign {
                tag: RequestTag(7),
                path: path.clone(),
            },
            1024,
        )
        .await;
        let _ = tokio::fs::remove_file(&path).await;

        match event {
            Some(UiEvent::DesignLoaded { tag, file }) => {
                assert_eq!(tag, RequestTag(7));
                assert!(file.name().ends_with("rose.pes"));
                assert_eq!(file.payload(), b"design-bytes");
            }
            _ => panic!("expected DesignLoaded"),
        }
    }

    #[tokio::test]
    async fn load_design_rejects_files_over_the_upload_limit() {
        let path = temp_path("huge.dst");
        tokio::fs::write(&path, vec![0_u8; 32]).await.expect("write fixture");

        let event = handle_command(
            &CannedService,
            BackendCommand::LoadDesign {
                tag: RequestTag(1),
                path: path.clone(),
            },
            16,
        )
        .await;
        let _ = tokio::fs::remove_file(&path).await;

        match event {
            Some(UiEvent::Error(err)) => {
                assert_eq!(err.context(), UiErrorContext::LoadDesign);
                assert!(err.message().contains("too large"));
            }
            _ => panic!("expected load error"),
        }
    }

    #[tokio::test]
    async fn remote_results_come_back_as_workflow_commands() {
        let file = SelectedFile::new("rose.pes", b"x".to_vec());

        let preview = handle_command(
            &CannedService,
            BackendCommand::FetchPreview {
                tag: RequestTag(3),
                file: file.clone(),
            },
            1024,
        )
        .await;
        assert!(matches!(
            preview,
            Some(UiEvent::Workflow(Command::PreviewResponse { tag: RequestTag(3), result: Ok(_) }))
        ));

        let convert = handle_command(
            &CannedService,
            BackendCommand::Convert {
                tag: RequestTag(4),
                file,
                format: TargetFormat::new("dst"),
            },
            1024,
        )
        .await;
        assert!(matches!(
            convert,
            Some(UiEvent::Workflow(Command::ConvertResponse { tag: RequestTag(4), result: Err(_) }))
        ));
    }

    #[tokio::test]
    async fn save_artifact_writes_bytes_to_disk() {
        let path = temp_path("rose.dst");
        let artifact = Arc::new(ConvertedArtifact {
            file_name: "rose.dst".into(),
            bytes: b"converted".to_vec(),
        });

        let event = handle_command(
            &CannedService,
            BackendCommand::SaveArtifact {
                artifact,
                path: path.clone(),
            },
            1024,
        )
        .await;
        let written = tokio::fs::read(&path).await.expect("read back");
        let _ = tokio::fs::remove_file(&path).await;

        assert!(matches!(event, Some(UiEvent::ArtifactSaved(ref saved)) if saved == &path));
        assert_eq!(written, b"converted");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn workflow_responses_wait_for_a_full_ui_queue() {
        let (ui_tx, ui_rx) = crossbeam_channel::bounded(1);
        ui_tx
            .try_send(UiEvent::Info("busy".into()))
            .expect("fill queue");

        let sender = tokio::spawn(async move {
            deliver(&ui_tx, UiEvent::Workflow(Command::ToggleUnit));
        });

        let timeout = std::time::Duration::from_secs(5);
        assert!(matches!(ui_rx.recv_timeout(timeout), Ok(UiEvent::Info(_))));
        assert!(matches!(
            ui_rx.recv_timeout(timeout),
            Ok(UiEvent::Workflow(Command::ToggleUnit))
        ));
        sender.await.expect("delivery task");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn informational_events_are_dropped_when_ui_queue_is_full() {
        let (ui_tx, ui_rx) = crossbeam_channel::bounded(1);
        ui_tx
            .try_send(UiEvent::Info("busy".into()))
            .expect("fill queue");

        deliver(&ui_tx, UiEvent::Info("progress".into()));
        assert_eq!(ui_rx.len(), 1);
        assert!(matches!(ui_rx.try_recv(), Ok(UiEvent::Info(message)) if message == "busy"));
    }
}
