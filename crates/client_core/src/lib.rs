use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{
    header::CONTENT_DISPOSITION,
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::{
        ConvertedArtifact, PreviewMode, PreviewResult, RasterPreview, SelectedFile, TargetFormat,
    },
    error::{ConvertFailure, PreviewFailure},
    protocol::{ErrorBody, PreviewResponse, CONVERT_PATH, FILE_FIELD, FORMAT_FIELD, PREVIEW_PATH},
};
use tracing::{info, warn};
use url::Url;

pub mod config;
pub mod controller;
pub mod filename;
pub mod render;
pub mod stats;

pub use config::{load_settings, Settings, SettingsError};
pub use controller::{update, Command, Effect, WorkflowModel, WorkflowState};

/// The two remote operations of the conversion service. Failures are values;
/// nothing here retries on its own.
#[async_trait]
pub trait ConversionService: Send + Sync {
    async fn request_preview(&self, file: &SelectedFile) -> Result<PreviewResult, PreviewFailure>;
    async fn request_convert(
        &self,
        file: &SelectedFile,
        format: &TargetFormat,
    ) -> Result<ConvertedArtifact, ConvertFailure>;
}

/// Carries out a remote effect and returns the response command for the
/// controller. Local effects yield `None`.
pub async fn perform_remote<S>(service: &S, effect: &Effect) -> Option<Command>
where
    S: ConversionService + ?Sized,
{
    match effect {
        Effect::FetchPreview { tag, file } => Some(Command::PreviewResponse {
            tag: *tag,
            result: service.request_preview(file).await,
        }),
        Effect::FetchConvert { tag, file, format } => Some(Command::ConvertResponse {
            tag: *tag,
            result: service.request_convert(file, format).await,
        }),
        _ => None,
    }
}

pub struct ConversionClient {
    http: Client,
    base_url: Url,
    max_upload_bytes: usize,
}

impl ConversionClient {
    /// `base_url` should end with `/` when it carries a path prefix.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
            max_upload_bytes: Settings::default().max_upload_bytes,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url()?,
            max_upload_bytes: settings.max_upload_bytes,
        })
    }

    pub fn with_upload_limit(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }

    fn exceeds_limit(&self, file: &SelectedFile) -> bool {
        file.len() > self.max_upload_bytes
    }

    async fn post_upload(&self, path: &str, form: Form) -> Result<Response, String> {
        let url = self.endpoint(path).map_err(|e| e.to_string())?;
        self.http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| e.to_string())
    }
}

fn file_part(file: &SelectedFile) -> Part {
    Part::bytes(file.payload().to_vec()).file_name(file.name().to_string())
}

#[async_trait]
impl ConversionService for ConversionClient {
    async fn request_preview(&self, file: &SelectedFile) -> Result<PreviewResult, PreviewFailure> {
        if self.exceeds_limit(file) {
            return Err(PreviewFailure::TooLarge {
                size: file.len(),
                limit: self.max_upload_bytes,
            });
        }

        let form = Form::new().part(FILE_FIELD, file_part(file));
        let response = self
            .post_upload(PREVIEW_PATH, form)
            .await
            .map_err(PreviewFailure::Transport)?;

        let status = response.status();
        if !status.is_success() {
            warn!(file = file.name(), %status, "preview request rejected");
            return Err(PreviewFailure::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PreviewFailure::Transport(e.to_string()))?;
        let decoded: PreviewResponse = serde_json::from_slice(&body)
            .map_err(|e| PreviewFailure::Malformed(e.to_string()))?;

        info!(file = file.name(), stitches = decoded.stats.stitches, "preview loaded");
        Ok(preview_from_response(decoded))
    }

    async fn request_convert(
        &self,
        file: &SelectedFile,
        format: &TargetFormat,
    ) -> Result<ConvertedArtifact, ConvertFailure> {
        if self.exceeds_limit(file) {
            return Err(ConvertFailure::TooLarge {
                size: file.len(),
                limit: self.max_upload_bytes,
            });
        }

        let form = Form::new()
            .part(FILE_FIELD, file_part(file))
            .text(FORMAT_FIELD, format.as_str().to_string());
        let response = self
            .post_upload(CONVERT_PATH, form)
            .await
            .map_err(ConvertFailure::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let error_body = serde_json::from_slice::<ErrorBody>(&body).ok();
            let failure = ConvertFailure::from_status(
                status.as_u16(),
                error_body.as_ref().and_then(ErrorBody::message),
            );
            warn!(file = file.name(), %format, %status, "conversion failed: {failure}");
            return Err(failure);
        }

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConvertFailure::Transport(e.to_string()))?;
        let file_name = filename::resolve_download_name(disposition.as_deref(), file, format);

        info!(file = file.name(), %format, size = bytes.len(), "conversion complete");
        Ok(ConvertedArtifact {
            file_name,
            bytes: bytes.to_vec(),
        })
    }
}

fn preview_from_response(response: PreviewResponse) -> PreviewResult {
    let image = response.image.as_deref().and_then(|data_url| {
        let decoded = decode_data_url(data_url);
        if decoded.is_none() {
            warn!("ignoring undecodable preview image");
        }
        decoded
    });

    PreviewResult {
        mode: PreviewMode::from_token(response.mode.as_deref()),
        pattern: response.pattern.unwrap_or_default(),
        bounds: response.bounds,
        stats: response.stats,
        image,
    }
}

/// Decodes `data:<mime>;base64,<payload>`.
fn decode_data_url(data_url: &str) -> Option<RasterPreview> {
    let (meta, payload) = data_url.strip_prefix("data:")?.split_once(',')?;
    let mime_type = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some(RasterPreview {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
