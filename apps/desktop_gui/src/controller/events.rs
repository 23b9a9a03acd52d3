//! UI/backend events and error modeling for desktop GUI controller.

use std::path::PathBuf;

use client_core::Command;
use shared::domain::{RequestTag, SelectedFile};

pub enum UiEvent {
    Info(String),
    DesignLoaded {
        tag: RequestTag,
        file: SelectedFile,
    },
    /// A remote response to feed back into the workflow controller.
    Workflow(Command),
    ArtifactSaved(PathBuf),
    Error(UiError),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Info(_) => "info",
            Self::DesignLoaded { .. } => "design_loaded",
            Self::Workflow(_) => "workflow",
            Self::ArtifactSaved(_) => "artifact_saved",
            Self::Error(_) => "error",
        }
    }

    /// Events the UI cannot recover without: a lost workflow response leaves
    /// the controller pending forever.
    pub fn must_deliver(&self) -> bool {
        matches!(self, Self::DesignLoaded { .. } | Self::Workflow(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Io,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadDesign,
    SaveArtifact,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("too large")
            || message_lower.contains("exceeds")
            || message_lower.contains("invalid")
            || message_lower.contains("empty")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("permission denied")
            || message_lower.contains("no such file")
            || message_lower.contains("read-only")
            || message_lower.contains("disk")
        {
            UiErrorCategory::Io
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("dns")
            || message_lower.contains("unreachable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// One-line text for the notice area.
    pub fn display_text(&self) -> String {
        let prefix = match self.context {
            UiErrorContext::BackendStartup => "Startup failed",
            UiErrorContext::LoadDesign => "Could not open design",
            UiErrorContext::SaveArtifact => "Could not save file",
            UiErrorContext::General => "Error",
        };
        format!("{prefix}: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_size_limit_as_validation() {
        let err = UiError::from_message(
            UiErrorContext::LoadDesign,
            "file of 20000000 bytes exceeds the 16777216 byte upload limit",
        );
        assert_eq!(err.category(), UiErrorCategory::Validation);
        assert_eq!(err.context(), UiErrorContext::LoadDesign);
    }

    #[test]
    fn classifies_missing_file_as_io() {
        let err = UiError::from_message(
            UiErrorContext::LoadDesign,
            "No such file or directory (os error 2)",
        );
        assert_eq!(err.category(), UiErrorCategory::Io);
    }

    #[test]
    fn classifies_queue_disconnect_as_transport() {
        let err = UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(
            err.display_text(),
            "Error: Backend command processor disconnected"
        );
    }
}
