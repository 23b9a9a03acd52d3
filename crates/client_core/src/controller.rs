//! Upload/preview/convert state machine.
//!
//! All workflow state lives in one [`WorkflowModel`] value that is moved into
//! [`update`] together with a [`Command`] and handed back with the [`Effect`]s
//! the host must carry out. Remote responses are tagged with the generation
//! that issued them; anything from an older generation is dropped.

use std::sync::Arc;

use shared::{
    domain::{
        ConvertedArtifact, PreviewResult, RequestTag, SelectedFile, Stats, TargetFormat,
        UnitPreference,
    },
    error::{ConvertFailure, PreviewFailure},
};
use tracing::debug;

use crate::stats::{format_stats, DigitGrouping, FormattedStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    FileSelected,
    PreviewPending,
    PreviewReady,
    PreviewFailed,
    ConvertPending,
    ConvertSucceeded,
    ConvertFailed,
}

impl WorkflowState {
    fn has_preview(self) -> bool {
        matches!(
            self,
            Self::PreviewReady | Self::ConvertPending | Self::ConvertSucceeded | Self::ConvertFailed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertLabel {
    Convert,
    Converting,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    Success,
    Error(String),
}

#[derive(Debug, Clone)]
pub enum Command {
    SelectFile(SelectedFile),
    RemoveFile,
    PreviewResponse {
        tag: RequestTag,
        result: Result<PreviewResult, PreviewFailure>,
    },
    RequestConvert(TargetFormat),
    ConvertResponse {
        tag: RequestTag,
        result: Result<ConvertedArtifact, ConvertFailure>,
    },
    ToggleUnit,
    FormatChanged(TargetFormat),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectFile(_) => "select_file",
            Self::RemoveFile => "remove_file",
            Self::PreviewResponse { .. } => "preview_response",
            Self::RequestConvert(_) => "request_convert",
            Self::ConvertResponse { .. } => "convert_response",
            Self::ToggleUnit => "toggle_unit",
            Self::FormatChanged(_) => "format_changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchPreview {
        tag: RequestTag,
        file: SelectedFile,
    },
    FetchConvert {
        tag: RequestTag,
        file: SelectedFile,
        format: TargetFormat,
    },
    ClearSurface,
    DrawPattern(Arc<PreviewResult>),
    ShowStats(FormattedStats),
    HidePreview,
}

impl Effect {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::FetchPreview { .. } | Self::FetchConvert { .. })
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowModel {
    state: WorkflowState,
    file: Option<SelectedFile>,
    preview: Option<Arc<PreviewResult>>,
    artifact: Option<Arc<ConvertedArtifact>>,
    unit: UnitPreference,
    grouping: DigitGrouping,
    target_format: TargetFormat,
    status: Option<StatusMessage>,
    convert_label: ConvertLabel,
    generation: RequestTag,
}

impl Default for WorkflowModel {
    fn default() -> Self {
        Self::new(TargetFormat::default(), DigitGrouping::default())
    }
}

impl WorkflowModel {
    pub fn new(target_format: TargetFormat, grouping: DigitGrouping) -> Self {
        Self {
            state: WorkflowState::Idle,
            file: None,
            preview: None,
            artifact: None,
            unit: UnitPreference::default(),
            grouping,
            target_format,
            status: None,
            convert_label: ConvertLabel::Convert,
            generation: RequestTag::default(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&Arc<PreviewResult>> {
        self.preview.as_ref()
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.preview.as_ref().map(|preview| &preview.stats)
    }

    pub fn artifact(&self) -> Option<&Arc<ConvertedArtifact>> {
        self.artifact.as_ref()
    }

    pub fn unit(&self) -> UnitPreference {
        self.unit
    }

    pub fn target_format(&self) -> &TargetFormat {
        &self.target_format
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn convert_label(&self) -> ConvertLabel {
        self.convert_label
    }

    pub fn generation(&self) -> RequestTag {
        self.generation
    }

    pub fn show_format_caveat(&self) -> bool {
        self.target_format.needs_color_caveat()
    }

    pub fn formatted_stats(&self) -> Option<FormattedStats> {
        self.stats()
            .map(|stats| format_stats(stats, self.unit, self.grouping))
    }

    pub fn can_convert(&self) -> bool {
        self.file.is_some()
            && matches!(
                self.state,
                WorkflowState::PreviewReady
                    | WorkflowState::ConvertSucceeded
                    | WorkflowState::ConvertFailed
            )
    }

    pub fn can_download(&self) -> bool {
        self.state == WorkflowState::ConvertSucceeded && self.artifact.is_some()
    }

    pub fn preview_visible(&self) -> bool {
        !matches!(self.state, WorkflowState::Idle | WorkflowState::PreviewFailed)
    }

    /// Preview/stats present iff a preview has been accepted for the current
    /// file, and a file is present iff the workflow is not idle.
    pub fn invariants_hold(&self) -> bool {
        self.preview.is_some() == self.state.has_preview()
            && self.file.is_some() == (self.state != WorkflowState::Idle)
    }

    fn reset_for(&mut self, file: Option<SelectedFile>) {
        self.generation = self.generation.next();
        self.file = file;
        self.preview = None;
        self.artifact = None;
        self.status = None;
        self.convert_label = ConvertLabel::Convert;
    }

    fn stats_effect(&self) -> Option<Effect> {
        self.formatted_stats().map(Effect::ShowStats)
    }
}

pub fn update(mut model: WorkflowModel, command: Command) -> (WorkflowModel, Vec<Effect>) {
    let mut effects = Vec::new();

    match command {
        Command::SelectFile(file) => {
            model.reset_for(Some(file.clone()));
            model.state = WorkflowState::FileSelected;
            effects.push(Effect::ClearSurface);

            model.state = WorkflowState::PreviewPending;
            effects.push(Effect::FetchPreview {
                tag: model.generation,
                file,
            });
        }
        Command::RemoveFile => {
            model.reset_for(None);
            model.state = WorkflowState::Idle;
            effects.push(Effect::ClearSurface);
        }
        Command::PreviewResponse { tag, result } => {
            if tag != model.generation || model.state != WorkflowState::PreviewPending {
                debug!(
                    response_tag = tag.0,
                    current_tag = model.generation.0,
                    "dropping stale preview response"
                );
                return (model, effects);
            }

            match result {
                Ok(preview) => {
                    let preview = Arc::new(preview);
                    model.preview = Some(Arc::clone(&preview));
                    model.state = WorkflowState::PreviewReady;
                    if preview.is_vector() {
                        effects.push(Effect::DrawPattern(preview));
                    }
                    effects.extend(model.stats_effect());
                }
                Err(err) => {
                    debug!("preview unavailable: {err}");
                    model.state = WorkflowState::PreviewFailed;
                    effects.push(Effect::HidePreview);
                }
            }
        }
        Command::RequestConvert(format) => {
            if !model.can_convert() {
                debug!(state = ?model.state, "ignoring convert request");
                return (model, effects);
            }
            let Some(file) = model.file.clone() else {
                return (model, effects);
            };

            model.target_format = format.clone();
            model.artifact = None;
            model.status = None;
            model.convert_label = ConvertLabel::Converting;
            model.state = WorkflowState::ConvertPending;
            effects.push(Effect::FetchConvert {
                tag: model.generation,
                file,
                format,
            });
        }
        Command::ConvertResponse { tag, result } => {
            if tag != model.generation || model.state != WorkflowState::ConvertPending {
                debug!(
                    response_tag = tag.0,
                    current_tag = model.generation.0,
                    "dropping stale convert response"
                );
                return (model, effects);
            }

            match result {
                Ok(artifact) => {
                    model.artifact = Some(Arc::new(artifact));
                    model.status = Some(StatusMessage::Success);
                    model.convert_label = ConvertLabel::Convert;
                    model.state = WorkflowState::ConvertSucceeded;
                }
                Err(err) => {
                    model.status = Some(StatusMessage::Error(err.to_string()));
                    model.convert_label = ConvertLabel::Retry;
                    model.state = WorkflowState::ConvertFailed;
                }
            }
        }
        Command::ToggleUnit => {
            if model.preview.is_none() {
                return (model, effects);
            }
            model.unit = model.unit.toggled();
            effects.extend(model.stats_effect());
        }
        Command::FormatChanged(format) => {
            model.target_format = format;
        }
    }

    (model, effects)
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
