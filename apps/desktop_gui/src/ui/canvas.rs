//! Preview surface: the recorded stitch display list plus the stats shown
//! beneath it.

use client_core::{
    render::{render, DrawSurface, PathRecorder},
    stats::FormattedStats,
};
use egui::TextureHandle;
use shared::domain::{PreviewResult, RasterPreview, RequestTag};

pub struct PreviewPane {
    recorder: PathRecorder,
    stats: Option<FormattedStats>,
    visible: bool,
    surface_size: egui::Vec2,
    raster: Option<(RequestTag, TextureHandle)>,
}

impl PreviewPane {
    pub fn new(surface_size: egui::Vec2) -> Self {
        Self {
            recorder: PathRecorder::new(),
            stats: None,
            visible: true,
            surface_size,
            raster: None,
        }
    }

    pub fn reset(&mut self) {
        self.recorder.clear();
        self.stats = None;
        self.raster = None;
        self.visible = true;
    }

    pub fn draw(&mut self, preview: &PreviewResult) {
        render(
            &preview.pattern,
            preview.bounds.as_ref(),
            f64::from(self.surface_size.x),
            f64::from(self.surface_size.y),
            &mut self.recorder,
        );
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn show_stats(&mut self, stats: FormattedStats) {
        self.stats = Some(stats);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn stats(&self) -> Option<&FormattedStats> {
        self.stats.as_ref()
    }

    pub fn recorder(&self) -> &PathRecorder {
        &self.recorder
    }

    pub fn paint_pattern(&self, ui: &mut egui::Ui) {
        let (response, painter) = ui.allocate_painter(self.surface_size, egui::Sense::hover());
        let origin = response.rect.min;
        painter.rect_filled(response.rect, 6.0, egui::Color32::WHITE);

        for stroke in self.recorder.strokes() {
            if stroke.points.len() < 2 {
                continue;
            }
            let points = stroke
                .points
                .iter()
                .map(|&(x, y)| origin + egui::vec2(x as f32, y as f32))
                .collect::<Vec<_>>();
            painter.add(egui::Shape::line(
                points,
                egui::Stroke::new(1.0, parse_hex_color(&stroke.color)),
            ));
        }
    }

    /// Shows a server-rendered thumbnail, decoding it once per preview.
    pub fn paint_raster(&mut self, ui: &mut egui::Ui, tag: RequestTag, image: &RasterPreview) {
        let cached = matches!(&self.raster, Some((cached_tag, _)) if *cached_tag == tag);
        if !cached {
            match decode_raster(image) {
                Ok(color_image) => {
                    let texture = ui.ctx().load_texture(
                        format!("design-preview-{}", tag.0),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.raster = Some((tag, texture));
                }
                Err(err) => {
                    tracing::warn!("failed to decode {} preview: {err}", image.mime_type);
                    self.raster = None;
                }
            }
        }

        match &self.raster {
            Some((_, texture)) => {
                ui.add(egui::Image::new(texture).max_size(self.surface_size));
            }
            None => {
                ui.allocate_space(self.surface_size);
            }
        }
    }
}

fn decode_raster(image: &RasterPreview) -> Result<egui::ColorImage, image::ImageError> {
    let decoded = image::load_from_memory(&image.bytes)?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// `#rgb` or `#rrggbb`; anything else paints black.
pub fn parse_hex_color(color: &str) -> egui::Color32 {
    let hex = color.trim().trim_start_matches('#');
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    let rgb = match hex.len() {
        3 => hex
            .chars()
            .map(|c| channel(&c.to_string()).map(|v| v * 17))
            .collect::<Option<Vec<_>>>(),
        6 => (0..3)
            .map(|i| hex.get(i * 2..i * 2 + 2).and_then(channel))
            .collect::<Option<Vec<_>>>(),
        _ => None,
    };

    match rgb.as_deref() {
        Some(&[r, g, b]) => egui::Color32::from_rgb(r, g, b),
        _ => egui::Color32::BLACK,
    }
}
