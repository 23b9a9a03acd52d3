use thiserror::Error;

pub const GENERIC_CONVERT_FAILURE: &str = "Conversion failed";

/// Why a preview could not be produced. Never shown to the user; the preview
/// region is simply hidden.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewFailure {
    #[error("preview transport error: {0}")]
    Transport(String),
    #[error("preview rejected with status {status}")]
    Rejected { status: u16 },
    #[error("malformed preview payload: {0}")]
    Malformed(String),
    #[error("file of {size} bytes exceeds the {limit} byte upload limit")]
    TooLarge { size: usize, limit: usize },
}

/// Why a conversion failed. `Display` is the user-facing status text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertFailure {
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Conversion failed")]
    Unspecified { status: u16 },
    #[error("Conversion failed ({0})")]
    Transport(String),
    #[error("File is too large to upload ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },
}

impl ConvertFailure {
    pub fn from_status(status: u16, message: Option<&str>) -> Self {
        match message {
            Some(message) => Self::Rejected {
                status,
                message: message.to_string(),
            },
            None => Self::Unspecified { status },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_failure_displays_server_message_verbatim() {
        let failure = ConvertFailure::from_status(400, Some("unsupported stitch count"));
        assert_eq!(failure.to_string(), "unsupported stitch count");
    }

    #[test]
    fn missing_message_falls_back_to_generic_text() {
        let failure = ConvertFailure::from_status(500, None);
        assert_eq!(failure.to_string(), GENERIC_CONVERT_FAILURE);
    }
}
