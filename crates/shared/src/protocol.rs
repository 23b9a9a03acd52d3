use serde::{Deserialize, Serialize};

use crate::domain::{Bounds, ColorBlock, Stats};

pub const PREVIEW_PATH: &str = "preview";
pub const CONVERT_PATH: &str = "convert";

/// Multipart field carrying the design bytes on both endpoints.
pub const FILE_FIELD: &str = "file";
/// Multipart field carrying the target format token on `/convert`.
pub const FORMAT_FIELD: &str = "format";

/// Body of a successful `POST /preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub pattern: Option<Vec<ColorBlock>>,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    pub stats: Stats,
    /// `data:<mime>;base64,<payload>` thumbnail for non-vector previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Body of a failed request, `{ "error": "..." }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The server's message exactly as sent, if it is not blank.
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }
}
