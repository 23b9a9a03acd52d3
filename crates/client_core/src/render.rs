//! Fits a stitch pattern onto a fixed-size drawing surface.
//!
//! The surface abstraction mirrors a 2D canvas context so the same renderer
//! drives the egui preview and the display list used in tests.

use shared::domain::{Bounds, ColorBlock};

/// Fraction of each surface axis the pattern may occupy.
pub const FIT_RATIO: f64 = 0.9;

pub trait DrawSurface {
    fn clear(&mut self);
    fn set_stroke_color(&mut self, color: &str);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke(&mut self);
}

/// Uniform scale plus translation mapping design space onto the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl FitTransform {
    pub fn for_bounds(bounds: &Bounds, surface_width: f64, surface_height: f64) -> Option<Self> {
        let pattern_width = bounds.width();
        let pattern_height = bounds.height();
        // Inverted and NaN extents are collapsed too.
        if !(pattern_width > 0.0 && pattern_height > 0.0) {
            return None;
        }

        let scale = (surface_width * FIT_RATIO / pattern_width)
            .min(surface_height * FIT_RATIO / pattern_height);
        let (center_x, center_y) = bounds.center();

        Some(Self {
            scale,
            offset_x: surface_width / 2.0 - center_x * scale,
            offset_y: surface_height / 2.0 - center_y * scale,
        })
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }
}

/// Draws `pattern` onto `surface`. Absent or collapsed bounds leave the surface
/// untouched and return `None`.
pub fn render<S: DrawSurface + ?Sized>(
    pattern: &[ColorBlock],
    bounds: Option<&Bounds>,
    surface_width: f64,
    surface_height: f64,
    surface: &mut S,
) -> Option<FitTransform> {
    let transform = FitTransform::for_bounds(bounds?, surface_width, surface_height)?;

    surface.clear();
    for block in pattern {
        surface.set_stroke_color(&block.color);
        surface.begin_path();

        let mut points = block.stitches.iter();
        if let Some(first) = points.next() {
            let (x, y) = transform.apply(first.0, first.1);
            surface.move_to(x, y);
            for point in points {
                let (x, y) = transform.apply(point.0, point.1);
                surface.line_to(x, y);
            }
        }

        surface.stroke();
    }

    Some(transform)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStroke {
    pub color: String,
    pub points: Vec<(f64, f64)>,
}

/// Display list of committed strokes. Strokes with fewer than two points are
/// kept so block order is preserved, but paint nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathRecorder {
    strokes: Vec<RecordedStroke>,
    color: String,
    current: Vec<(f64, f64)>,
    clears: usize,
}

impl PathRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &[RecordedStroke] {
        &self.strokes
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }

    pub fn is_blank(&self) -> bool {
        self.strokes.iter().all(|stroke| stroke.points.len() < 2)
    }

    /// Extent of every recorded point as `(min_x, min_y, max_x, max_y)`.
    pub fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.strokes.iter().flat_map(|stroke| stroke.points.iter());
        let &(x, y) = points.next()?;
        Some(points.fold((x, y, x, y), |(min_x, min_y, max_x, max_y), &(x, y)| {
            (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
        }))
    }
}

impl DrawSurface for PathRecorder {
    fn clear(&mut self) {
        self.strokes.clear();
        self.current.clear();
        self.clears += 1;
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.color = color.to_string();
    }

    fn begin_path(&mut self) {
        self.current.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.current.clear();
        self.current.push((x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.current.push((x, y));
    }

    fn stroke(&mut self) {
        self.strokes.push(RecordedStroke {
            color: self.color.clone(),
            points: std::mem::take(&mut self.current),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::StitchPoint;

    const EPS: f64 = 1e-9;

    fn block(color: &str, stitches: &[(f64, f64)]) -> ColorBlock {
        ColorBlock {
            color: color.to_string(),
            stitches: stitches.iter().map(|&(x, y)| StitchPoint(x, y)).collect(),
        }
    }

    #[test]
    fn fitted_pattern_is_inscribed_and_centered() {
        let pattern = vec![block("#f00", &[(-20.0, 10.0), (80.0, 10.0), (80.0, 60.0)])];
        let bounds = Bounds::from([-20.0, 10.0, 80.0, 60.0]);
        let mut surface = PathRecorder::new();

        let transform =
            render(&pattern, Some(&bounds), 400.0, 300.0, &mut surface).expect("rendered");
        assert!(transform.scale > 0.0);

        let (min_x, min_y, max_x, max_y) = surface.extent().expect("points");
        assert!(max_x - min_x <= 400.0 * FIT_RATIO + EPS);
        assert!(max_y - min_y <= 300.0 * FIT_RATIO + EPS);
        assert!(((min_x + max_x) / 2.0 - 200.0).abs() < EPS);
        assert!(((min_y + max_y) / 2.0 - 150.0).abs() < EPS);
        // Width is the limiting axis here.
        assert!((max_x - min_x - 360.0).abs() < EPS);
    }

    #[test]
    fn zero_width_or_height_leaves_surface_untouched() {
        let mut surface = PathRecorder::new();
        surface.set_stroke_color("#000");
        surface.move_to(1.0, 1.0);
        surface.line_to(2.0, 2.0);
        surface.stroke();
        let before = surface.clone();

        let pattern = vec![block("#f00", &[(5.0, 0.0), (5.0, 10.0)])];
        assert!(render(
            &pattern,
            Some(&Bounds::from([5.0, 0.0, 5.0, 10.0])),
            100.0,
            100.0,
            &mut surface
        )
        .is_none());
        assert!(render(
            &pattern,
            Some(&Bounds::from([0.0, 3.0, 10.0, 3.0])),
            100.0,
            100.0,
            &mut surface
        )
        .is_none());
        assert!(render(&pattern, None, 100.0, 100.0, &mut surface).is_none());
        assert_eq!(surface, before);
    }

    #[test]
    fn inverted_bounds_are_treated_as_collapsed() {
        let pattern = vec![block("#f00", &[(0.0, 0.0), (100.0, 50.0)])];
        let mut surface = PathRecorder::new();

        assert!(render(
            &pattern,
            Some(&Bounds::from([100.0, 50.0, 0.0, 0.0])),
            400.0,
            400.0,
            &mut surface
        )
        .is_none());
        assert!(FitTransform::for_bounds(&Bounds::from([0.0, 10.0, 10.0, 0.0]), 400.0, 400.0)
            .is_none());
        assert!(surface.is_blank());
        assert_eq!(surface.clear_count(), 0);
    }

    #[test]
    fn blocks_render_in_input_order_with_shared_frame() {
        let pattern = vec![
            block("#a", &[(0.0, 0.0), (10.0, 10.0)]),
            block("#b", &[]),
            block("#c", &[(10.0, 0.0), (0.0, 10.0), (0.0, 10.0)]),
        ];
        let bounds = Bounds::from([0.0, 0.0, 10.0, 10.0]);
        let mut surface = PathRecorder::new();

        let transform =
            render(&pattern, Some(&bounds), 200.0, 200.0, &mut surface).expect("rendered");

        let colors: Vec<_> = surface.strokes().iter().map(|s| s.color.as_str()).collect();
        assert_eq!(colors, ["#a", "#b", "#c"]);
        assert!(surface.strokes()[1].points.is_empty());
        assert_eq!(surface.strokes()[2].points.len(), 3);
        assert_eq!(surface.strokes()[0].points[0], transform.apply(0.0, 0.0));
        assert_eq!(surface.strokes()[2].points[0], transform.apply(10.0, 0.0));
        assert_eq!(surface.clear_count(), 1);
    }

    #[test]
    fn height_limited_pattern_uses_vertical_scale() {
        let bounds = Bounds::from([0.0, 0.0, 10.0, 100.0]);
        let transform = FitTransform::for_bounds(&bounds, 400.0, 400.0).expect("fit");
        assert!((transform.scale - 3.6).abs() < EPS);
        let (x, y) = transform.apply(5.0, 50.0);
        assert!((x - 200.0).abs() < EPS);
        assert!((y - 200.0).abs() < EPS);
    }
}
