//! Command orchestration helpers from controller effects to the backend
//! command queue and the preview pane.

use client_core::Effect;
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::ui::canvas::PreviewPane;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    notice: &mut Option<String>,
) {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *notice = Some("UI command queue is full; please retry".to_string());
        }
        Err(TrySendError::Disconnected(_)) => {
            *notice = Some(
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string(),
            );
        }
    }
}

pub fn backend_command_for(effect: &Effect) -> Option<BackendCommand> {
    match effect {
        Effect::FetchPreview { tag, file } => Some(BackendCommand::FetchPreview {
            tag: *tag,
            file: file.clone(),
        }),
        Effect::FetchConvert { tag, file, format } => Some(BackendCommand::Convert {
            tag: *tag,
            file: file.clone(),
            format: format.clone(),
        }),
        _ => None,
    }
}

/// Carries out the effects of one controller transition.
pub fn apply_effects(
    effects: Vec<Effect>,
    pane: &mut PreviewPane,
    cmd_tx: &Sender<BackendCommand>,
    notice: &mut Option<String>,
) {
    for effect in effects {
        if let Some(cmd) = backend_command_for(&effect) {
            dispatch_backend_command(cmd_tx, cmd, notice);
            continue;
        }
        match effect {
            Effect::ClearSurface => pane.reset(),
            Effect::DrawPattern(preview) => pane.draw(&preview),
            Effect::ShowStats(stats) => pane.show_stats(stats),
            Effect::HidePreview => pane.hide(),
            Effect::FetchPreview { .. } | Effect::FetchConvert { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use client_core::{stats::format_stats_default, update, Command, WorkflowModel};
    use crossbeam_channel::bounded;
    use eframe::egui;
    use shared::{
        domain::{
            Bounds, ColorBlock, PreviewMode, PreviewResult, RequestTag, SelectedFile, StitchPoint,
            Stats, UnitPreference,
        },
        error::PreviewFailure,
    };

    use super::*;

    fn sample_preview() -> PreviewResult {
        PreviewResult {
            mode: PreviewMode::Vector,
            pattern: vec![ColorBlock {
                color: "#000".into(),
                stitches: vec![StitchPoint(0.0, 0.0), StitchPoint(1.0, 1.0)],
            }],
            bounds: Some(Bounds::from([0.0, 0.0, 1.0, 1.0])),
            stats: Stats {
                stitches: 2,
                colors: 1,
                width: 0.1,
                height: 0.1,
                changes: None,
            },
            image: None,
        }
    }

    #[test]
    fn remote_effects_are_queued_for_the_backend() {
        let (cmd_tx, cmd_rx) = bounded(4);
        let mut pane = PreviewPane::new(egui::vec2(100.0, 100.0));
        let mut notice = None;

        let (_, effects) = update(
            WorkflowModel::default(),
            Command::SelectFile(SelectedFile::new("rose.pes", b"x".to_vec())),
        );
        apply_effects(effects, &mut pane, &cmd_tx, &mut notice);

        let queued = cmd_rx.try_recv().expect("queued command");
        assert!(matches!(
            queued,
            BackendCommand::FetchPreview { ref file, .. } if file.name() == "rose.pes"
        ));
        assert!(notice.is_none());
    }

    #[test]
    fn local_effects_update_the_preview_pane() {
        let (cmd_tx, _cmd_rx) = bounded(4);
        let mut pane = PreviewPane::new(egui::vec2(100.0, 100.0));
        let mut notice = None;
        let preview = sample_preview();

        apply_effects(
            vec![
                Effect::ClearSurface,
                Effect::DrawPattern(Arc::new(preview.clone())),
                Effect::ShowStats(format_stats_default(&preview.stats, UnitPreference::Metric)),
            ],
            &mut pane,
            &cmd_tx,
            &mut notice,
        );

        assert_eq!(pane.recorder().strokes().len(), 1);
        assert_eq!(pane.stats().map(|s| s.width.as_str()), Some("0.1 mm"));

        apply_effects(vec![Effect::HidePreview], &mut pane, &cmd_tx, &mut notice);
        assert!(!pane.is_visible());
    }

    #[test]
    fn failed_preview_hides_pane_through_controller() {
        let (cmd_tx, cmd_rx) = bounded(4);
        let mut pane = PreviewPane::new(egui::vec2(100.0, 100.0));
        let mut notice = None;

        let (model, effects) = update(
            WorkflowModel::default(),
            Command::SelectFile(SelectedFile::new("rose.pes", b"x".to_vec())),
        );
        apply_effects(effects, &mut pane, &cmd_tx, &mut notice);
        let BackendCommand::FetchPreview { tag, .. } = cmd_rx.try_recv().expect("queued") else {
            panic!("expected preview request");
        };

        let (_, effects) = update(
            model,
            Command::PreviewResponse {
                tag,
                result: Err(PreviewFailure::Transport("connection refused".into())),
            },
        );
        apply_effects(effects, &mut pane, &cmd_tx, &mut notice);
        assert!(!pane.is_visible());
        assert!(notice.is_none());
    }

    #[test]
    fn disconnected_queue_sets_notice() {
        let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(1);
        drop(cmd_rx);
        let mut notice = None;

        dispatch_backend_command(
            &cmd_tx,
            BackendCommand::LoadDesign {
                tag: RequestTag(1),
                path: "rose.pes".into(),
            },
            &mut notice,
        );
        assert!(notice.expect("notice").contains("disconnected"));
    }
}
