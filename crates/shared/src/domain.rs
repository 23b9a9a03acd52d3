use std::{fmt, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize};

/// Formats the converter service is known to write. The selector offers these,
/// but any token is accepted and forwarded verbatim.
pub const KNOWN_TARGET_FORMATS: &[&str] = &["pes", "dst", "exp", "jef", "vp3", "xxx", "u01", "pec"];

pub const MM_PER_INCH: f64 = 25.4;

/// Generation stamp attached to every in-flight remote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RequestTag(pub u64);

impl RequestTag {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A design file chosen by the user. Never mutated after construction.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    payload: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Portion of the file name before its first `.`.
    pub fn base_name(&self) -> &str {
        self.name.split('.').next().unwrap_or_default()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("bytes", &self.payload.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetFormat(String);

impl TargetFormat {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// DST and EXP carry no thread palette, so colors shown on the machine may
    /// differ from the preview.
    pub fn needs_color_caveat(&self) -> bool {
        matches!(self.0.as_str(), "dst" | "exp")
    }
}

impl Default for TargetFormat {
    fn default() -> Self {
        Self::new(KNOWN_TARGET_FORMATS[0])
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPreference {
    #[default]
    Metric,
    Imperial,
}

impl UnitPreference {
    pub fn toggled(self) -> Self {
        match self {
            Self::Metric => Self::Imperial,
            Self::Imperial => Self::Metric,
        }
    }
}

/// Design-space `(x, y)` stitch coordinate, `[x, y]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StitchPoint(pub f64, pub f64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBlock {
    #[serde(default)]
    pub color: String,
    #[serde(default, deserialize_with = "lenient_stitches")]
    pub stitches: Vec<StitchPoint>,
}

/// A block whose stitch list is missing or contains any malformed point is
/// kept with no stitches so the rest of the pattern still renders.
fn lenient_stitches<'de, D>(deserializer: D) -> Result<Vec<StitchPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::Array(items)) = raw else {
        return Ok(Vec::new());
    };

    let points: Option<Vec<StitchPoint>> = items.iter().map(parse_point).collect();
    Ok(points.unwrap_or_default())
}

fn parse_point(value: &serde_json::Value) -> Option<StitchPoint> {
    let pair = value.as_array()?;
    let x = pair.first()?.as_f64()?;
    let y = pair.get(1)?.as_f64()?;
    (x.is_finite() && y.is_finite()).then_some(StitchPoint(x, y))
}

/// Axis-aligned bounding box in design-space units, `[minX, minY, maxX, maxY]`
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl From<[f64; 4]> for Bounds {
    fn from([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

impl From<Bounds> for [f64; 4] {
    fn from(b: Bounds) -> Self {
        [b.min_x, b.min_y, b.max_x, b.max_y]
    }
}

/// Summary numbers for a design. Width and height are millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub stitches: u64,
    pub colors: u32,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewMode {
    Vector,
    Other(String),
}

impl PreviewMode {
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("vector") => Self::Vector,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Other(String::new()),
        }
    }
}

/// Rendered thumbnail returned by servers that answer with an image instead of
/// a stitch pattern.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterPreview {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for RasterPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterPreview")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewResult {
    pub mode: PreviewMode,
    pub pattern: Vec<ColorBlock>,
    pub bounds: Option<Bounds>,
    pub stats: Stats,
    pub image: Option<RasterPreview>,
}

impl PreviewResult {
    pub fn is_vector(&self) -> bool {
        self.mode == PreviewMode::Vector
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ConvertedArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ConvertedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertedArtifact")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
