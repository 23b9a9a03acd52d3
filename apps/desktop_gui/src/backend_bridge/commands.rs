//! Backend commands queued from UI to backend worker.

use std::{path::PathBuf, sync::Arc};

use shared::domain::{ConvertedArtifact, RequestTag, SelectedFile, TargetFormat};

pub enum BackendCommand {
    /// `tag` identifies the pick; only the newest load is applied.
    LoadDesign {
        tag: RequestTag,
        path: PathBuf,
    },
    FetchPreview {
        tag: RequestTag,
        file: SelectedFile,
    },
    Convert {
        tag: RequestTag,
        file: SelectedFile,
        format: TargetFormat,
    },
    SaveArtifact {
        artifact: Arc<ConvertedArtifact>,
        path: PathBuf,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadDesign { .. } => "load_design",
            Self::FetchPreview { .. } => "fetch_preview",
            Self::Convert { .. } => "convert",
            Self::SaveArtifact { .. } => "save_artifact",
        }
    }
}
