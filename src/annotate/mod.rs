//! Screenshot annotation.
//!
//! Turns a captured screenshot plus the step's annotation list into a new image
//! with arrows, boxes, highlights, blurs, labels, numbered markers and circles
//! drawn on it. The source image is never modified.
//!
//! # Coordinates
//!
//! | Input | Space | Conversion |
//! |-------|-------|------------|
//! | `Annotation::region` | logical | scaled by [`DisplayScale`] |
//! | `Annotation::position` | logical | scaled by [`DisplayScale`] |
//! | `Step::element_bounds` | physical | used as-is |
//!
//! # Example
//!
//! ```no_run
//! use wallet_guide::annotate::AnnotationEngine;
//! use wallet_guide::geometry::DisplayScale;
//! # fn demo(steps: &mut [wallet_guide::workflow::Step]) {
//! let engine = AnnotationEngine::new(DisplayScale::new(2.0));
//! let written = engine.batch_annotate(steps, "output/staging/screenshots".as_ref());
//! println!("{} annotated screenshots", written.len());
//! # }
//! ```

pub mod draw;
pub mod palette;

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info, warn};

use crate::config;
use crate::geometry::{Bounds, DisplayScale, Point};
use crate::workflow::{Annotation, AnnotationKind, Step};

/// Offset of the arrow tail from the element center, physical pixels
pub const ARROW_OFFSET: i32 = 100;

/// Arrowhead stroke length relative to the shaft
pub const ARROW_TIP_RATIO: f64 = 0.3;

/// Opacity of highlight overlays, out of 255
pub const HIGHLIGHT_ALPHA: u8 = 100;

/// Gaussian sigma used for redaction
pub const BLUR_SIGMA: f32 = 15.0;

/// Padding around text labels
pub const TEXT_PADDING: i32 = 5;

/// Number markers have a fixed radius regardless of display scale
pub const NUMBER_RADIUS: i32 = 20;

pub const DEFAULT_CIRCLE_RADIUS: i32 = 30;

/// Glyph magnification for arrow and number labels
const LABEL_SCALE: u32 = 2;

/// Errors while loading or saving an annotated screenshot
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Screenshot has no file name: {0}")]
    InvalidPath(PathBuf),
}

/// Draws step annotations onto screenshots
#[derive(Debug, Clone, Copy)]
pub struct AnnotationEngine {
    scale: DisplayScale,
    text_scale: u32,
}

impl AnnotationEngine {
    /// Create an engine for screenshots captured at `scale`
    pub fn new(scale: DisplayScale) -> Self {
        Self {
            scale,
            text_scale: config::get().text_scale,
        }
    }

    /// Set the glyph magnification for text annotations
    pub fn with_text_scale(mut self, text_scale: u32) -> Self {
        self.text_scale = text_scale.max(1);
        self
    }

    pub fn scale(&self) -> DisplayScale {
        self.scale
    }

    /// Physical rectangle an area annotation applies to.
    ///
    /// An explicit `region` wins over the driver-reported element bounds.
    pub fn resolve_region(&self, annotation: &Annotation, step: &Step) -> Option<Bounds> {
        annotation
            .region
            .map(|region| self.scale.region(region))
            .or(step.element_bounds)
    }

    /// Annotate one step's screenshot into `output_dir`.
    ///
    /// Returns `Ok(None)` when the step has no screenshot on disk.
    pub fn annotate_step(
        &self,
        step: &mut Step,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>, AnnotateError> {
        let Some(source) = step.screenshot_path.clone().filter(|p| p.exists()) else {
            warn!(step = %step.name, "no screenshot to annotate");
            return Ok(None);
        };

        if step.annotations.is_empty() {
            step.annotated_screenshot_path = Some(source.clone());
            return Ok(Some(source));
        }

        let original = image::open(&source)?;
        let keep_alpha = original.color().has_alpha();
        let mut canvas = original.to_rgba8();
        let applied = self.render(&mut canvas, step);

        let output = annotated_path(&source, output_dir)?;
        let format = ImageFormat::from_path(&source)?;
        let rendered = DynamicImage::ImageRgba8(canvas);
        if keep_alpha {
            rendered.save_with_format(&output, format)?;
        } else {
            DynamicImage::ImageRgb8(rendered.to_rgb8()).save_with_format(&output, format)?;
        }

        debug!(
            step = %step.name,
            applied,
            total = step.annotations.len(),
            path = %output.display(),
            "annotated screenshot"
        );
        step.annotated_screenshot_path = Some(output.clone());
        Ok(Some(output))
    }

    /// Annotate every step in order, skipping the ones that fail
    pub fn batch_annotate(&self, steps: &mut [Step], output_dir: &Path) -> Vec<PathBuf> {
        if let Err(e) = fs::create_dir_all(output_dir) {
            warn!(dir = %output_dir.display(), error = %e, "cannot create annotation directory");
            return Vec::new();
        }

        let mut written = Vec::new();
        for step in steps.iter_mut() {
            match self.annotate_step(step, output_dir) {
                Ok(Some(path)) => written.push(path),
                Ok(None) => {}
                Err(e) => warn!(step = %step.name, error = %e, "annotation failed"),
            }
        }
        info!(count = written.len(), "annotated screenshots");
        written
    }

    /// Apply the step's annotations in order; returns how many were drawn
    pub fn render(&self, image: &mut RgbaImage, step: &Step) -> usize {
        step.annotations
            .iter()
            .filter(|annotation| self.apply(image, annotation, step))
            .count()
    }

    fn apply(&self, image: &mut RgbaImage, annotation: &Annotation, step: &Step) -> bool {
        let color = palette::resolve(annotation.color.as_deref().unwrap_or(""), annotation.kind);
        match annotation.kind {
            AnnotationKind::Arrow => self.arrow(image, annotation, step, color),
            AnnotationKind::Box => self.outline(image, annotation, step, color),
            AnnotationKind::Highlight => self.highlight(image, annotation, step, color),
            AnnotationKind::Blur => self.blur(image, annotation, step),
            AnnotationKind::Text => self.text(image, annotation, color),
            AnnotationKind::Number => self.number(image, annotation, step, color),
            AnnotationKind::Circle => self.circle(image, annotation, color),
        }
    }

    fn area(&self, annotation: &Annotation, step: &Step) -> Option<Bounds> {
        let area = self.resolve_region(annotation, step);
        if area.is_none() {
            warn!(
                step = %step.name,
                kind = %annotation.kind,
                "annotation has neither region nor element bounds"
            );
        }
        area
    }

    fn arrow(&self, image: &mut RgbaImage, a: &Annotation, step: &Step, color: [u8; 3]) -> bool {
        let Some(bounds) = step.element_bounds else {
            debug!(step = %step.name, "arrow skipped: no element bounds");
            return false;
        };
        let tip = bounds.center();
        let tail = tip.offset(-ARROW_OFFSET, -ARROW_OFFSET);
        draw::draw_arrow(image, tail, tip, a.thickness, ARROW_TIP_RATIO, color);

        if let Some(label) = &a.label {
            let (_, h) = draw::text_size(label, LABEL_SCALE);
            let origin = Point::new(tail.x - 20, tail.y - 10 - h);
            draw::draw_text(image, origin, label, LABEL_SCALE, color);
        }
        true
    }

    fn outline(&self, image: &mut RgbaImage, a: &Annotation, step: &Step, color: [u8; 3]) -> bool {
        let Some(area) = self.area(a, step) else {
            return false;
        };
        draw::stroke_rect(
            image,
            area.x,
            area.y,
            area.right(),
            area.bottom(),
            a.thickness,
            color,
        );
        true
    }

    fn highlight(
        &self,
        image: &mut RgbaImage,
        a: &Annotation,
        step: &Step,
        color: [u8; 3],
    ) -> bool {
        let Some(area) = self.area(a, step) else {
            return false;
        };
        draw::blend_rect(image, area, color, HIGHLIGHT_ALPHA);
        true
    }

    fn blur(&self, image: &mut RgbaImage, a: &Annotation, step: &Step) -> bool {
        let Some(area) = self.area(a, step) else {
            return false;
        };
        let Some(clamped) = area.clamp_to(image.width(), image.height()) else {
            warn!(step = %step.name, ?area, "blur region lies outside the screenshot");
            return false;
        };
        draw::blur_rect(image, clamped, BLUR_SIGMA);
        true
    }

    fn text(&self, image: &mut RgbaImage, a: &Annotation, color: [u8; 3]) -> bool {
        let (Some(position), Some(label)) = (a.position, a.label.as_deref()) else {
            warn!(kind = %a.kind, "text annotation needs position and label");
            return false;
        };
        let p = self.scale.point(position);
        let (w, h) = draw::text_size(label, self.text_scale);
        let (x0, y0) = (p.x.saturating_sub(TEXT_PADDING), p.y.saturating_sub(TEXT_PADDING));
        let x1 = p.x.saturating_add(w).saturating_add(TEXT_PADDING);
        let y1 = p.y.saturating_add(h).saturating_add(TEXT_PADDING);

        draw::fill_rect(image, x0, y0, x1, y1, palette::WHITE);
        draw::stroke_rect_inner(image, x0, y0, x1, y1, 2, color);
        draw::draw_text(image, p, label, self.text_scale, color);
        true
    }

    fn number(&self, image: &mut RgbaImage, a: &Annotation, step: &Step, color: [u8; 3]) -> bool {
        let Some(bounds) = step.element_bounds else {
            debug!(step = %step.name, "number skipped: no element bounds");
            return false;
        };
        let center = bounds.center();
        draw::fill_circle(image, center, NUMBER_RADIUS, color);
        draw::stroke_circle(image, center, NUMBER_RADIUS, 2, palette::WHITE);

        if let Some(label) = a.label.as_deref() {
            let (w, h) = draw::text_size(label, LABEL_SCALE);
            draw::draw_text(
                image,
                center.offset(-w / 2, -h / 2),
                label,
                LABEL_SCALE,
                palette::WHITE,
            );
        }
        true
    }

    fn circle(&self, image: &mut RgbaImage, a: &Annotation, color: [u8; 3]) -> bool {
        let Some(position) = a.position else {
            warn!(kind = %a.kind, "circle annotation needs a position");
            return false;
        };
        let center = self.scale.point(position);
        let radius = self.scale.length(a.radius.unwrap_or(DEFAULT_CIRCLE_RADIUS));
        let thickness = self.scale.length(a.thickness).max(1);
        draw::stroke_circle(image, center, radius, thickness, color);
        true
    }
}

impl Default for AnnotationEngine {
    fn default() -> Self {
        Self::new(DisplayScale::IDENTITY)
    }
}

/// `<output_dir>/<stem>_annotated.<ext>`
pub fn annotated_path(source: &Path, output_dir: &Path) -> Result<PathBuf, AnnotateError> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| AnnotateError::InvalidPath(source.to_path_buf()))?;
    let name = match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_annotated.{ext}"),
        None => format!("{stem}_annotated"),
    };
    Ok(output_dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Region;
    use crate::workflow::Action;
    use image::Rgba;

    fn canvas(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
    }

    fn rgb(img: &RgbaImage, x: u32, y: u32) -> [u8; 3] {
        let p = img.get_pixel(x, y);
        [p[0], p[1], p[2]]
    }

    fn step_with(annotation: Annotation) -> Step {
        Step::new("Receive", Action::Screenshot).annotate(annotation)
    }

    #[test]
    fn test_region_wins_over_element_bounds() {
        let engine = AnnotationEngine::new(DisplayScale::new(2.0));
        let mut step = step_with(Annotation::boxed(Region::new(10, 10, 20, 20)));
        step.element_bounds = Some(Bounds::new(300, 300, 10, 10));
        assert_eq!(
            engine.resolve_region(&step.annotations[0], &step),
            Some(Bounds::new(20, 20, 40, 40))
        );

        let mut bare = step_with(Annotation::new(AnnotationKind::Box));
        assert_eq!(engine.resolve_region(&bare.annotations[0], &bare), None);
        bare.element_bounds = Some(Bounds::new(300, 300, 10, 10));
        assert_eq!(
            engine.resolve_region(&bare.annotations[0], &bare),
            Some(Bounds::new(300, 300, 10, 10))
        );
    }

    #[test]
    fn test_missing_geometry_skips_only_that_annotation() {
        let engine = AnnotationEngine::default();
        let step = step_with(Annotation::new(AnnotationKind::Box))
            .annotate(Annotation::boxed(Region::new(5, 5, 10, 10)));
        let mut img = canvas(50, 50);
        assert_eq!(engine.render(&mut img, &step), 1);
        assert_eq!(rgb(&img, 5, 5), [0, 0, 255]);
    }

    #[test]
    fn test_box_default_color_and_corners() {
        let engine = AnnotationEngine::default();
        let step = step_with(
            Annotation::new(AnnotationKind::Box)
                .region(Region::new(10, 10, 20, 20))
                .thickness(1),
        );
        let mut img = canvas(50, 50);
        engine.render(&mut img, &step);
        assert_eq!(rgb(&img, 10, 10), [0, 0, 255]);
        assert_eq!(rgb(&img, 30, 30), [0, 0, 255]);
        assert_eq!(rgb(&img, 20, 20), [0, 0, 0]);
    }

    #[test]
    fn test_highlight_blends_over_pixels() {
        let engine = AnnotationEngine::default();
        let step = step_with(Annotation::highlight(Region::new(0, 0, 10, 10)));
        let mut img = canvas(20, 20);
        engine.render(&mut img, &step);
        assert_eq!(rgb(&img, 5, 5), [100, 100, 0]);
        assert_eq!(rgb(&img, 15, 15), [0, 0, 0]);
    }

    #[test]
    fn test_box_after_highlight_stays_visible() {
        let engine = AnnotationEngine::default();
        let region = Region::new(10, 10, 20, 20);
        let step = step_with(Annotation::highlight(region))
            .annotate(Annotation::boxed(region).color("red"));
        let mut img = canvas(50, 50);
        engine.render(&mut img, &step);
        assert_eq!(rgb(&img, 10, 10), [255, 0, 0]);
        assert_eq!(rgb(&img, 20, 20), [100, 100, 0]);
    }

    #[test]
    fn test_blur_outside_image_is_skipped() {
        let engine = AnnotationEngine::default();
        let step = step_with(Annotation::blur(Region::new(600, 600, 50, 50)));
        let mut img = canvas(100, 100);
        img.put_pixel(50, 50, Rgba([255, 255, 255, 255]));
        let before = img.clone();
        assert_eq!(engine.render(&mut img, &step), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn test_text_background_is_padded() {
        let engine = AnnotationEngine::default().with_text_scale(3);
        let step = step_with(Annotation::text("Hi", Point::new(20, 20)));
        let mut img = canvas(200, 100);
        engine.render(&mut img, &step);
        // "Hi" at scale 3 measures 48x24, background spans (15,15)..=(73,49)
        assert_eq!(rgb(&img, 14, 14), [0, 0, 0]);
        assert_eq!(rgb(&img, 15, 15), [0, 0, 0]); // black outline
        assert_eq!(rgb(&img, 17, 17), [255, 255, 255]);
        assert_eq!(rgb(&img, 73, 49), [0, 0, 0]);
        assert_eq!(rgb(&img, 74, 50), [0, 0, 0]);
        assert_eq!(rgb(&img, 70, 45), [255, 255, 255]);
    }

    #[test]
    fn test_text_outline_uses_annotation_color() {
        let engine = AnnotationEngine::default();
        let step = step_with(Annotation::text("Hi", Point::new(20, 20)).color("green"));
        let mut img = canvas(200, 100);
        engine.render(&mut img, &step);
        assert_eq!(rgb(&img, 15, 15), [0, 255, 0]);
        assert_eq!(rgb(&img, 16, 40), [0, 255, 0]);
    }

    #[test]
    fn test_number_radius_ignores_scale() {
        let engine = AnnotationEngine::new(DisplayScale::new(2.0));
        let mut step = step_with(Annotation::number(3));
        step.element_bounds = Some(Bounds::new(80, 80, 40, 40));
        let mut img = canvas(200, 200);
        assert_eq!(engine.render(&mut img, &step), 1);
        // disc spans 100 +/- 20 horizontally, ring drawn white at its edge
        assert_eq!(rgb(&img, 119, 100), [255, 255, 255]);
        assert_eq!(rgb(&img, 85, 100), [0, 0, 255]);
        assert_eq!(rgb(&img, 125, 100), [0, 0, 0]);
    }

    #[test]
    fn test_unlabeled_number_is_a_plain_disc() {
        let engine = AnnotationEngine::default();
        let mut step = step_with(Annotation::new(AnnotationKind::Number));
        step.element_bounds = Some(Bounds::new(80, 80, 40, 40));
        let mut img = canvas(200, 200);
        assert_eq!(engine.render(&mut img, &step), 1);
        // no glyph pixels anywhere inside the disc
        for y in 90..=110 {
            for x in 90..=110 {
                assert_eq!(rgb(&img, x, y), [0, 0, 255], "({x}, {y})");
            }
        }

        let mut labeled = step_with(Annotation::number(1));
        labeled.element_bounds = step.element_bounds;
        let mut img = canvas(200, 200);
        engine.render(&mut img, &labeled);
        let white = (90..=110)
            .flat_map(|y| (90..=110).map(move |x| (x, y)))
            .filter(|&(x, y)| rgb(&img, x, y) == [255, 255, 255])
            .count();
        assert!(white > 0);
    }

    #[test]
    fn test_far_away_geometry_is_skipped() {
        let engine = AnnotationEngine::default();
        let step = step_with(Annotation::blur(Region::new(i32::MAX - 10, 0, 1000, 10)))
            .annotate(Annotation::highlight(Region::new(i32::MAX - 10, 0, 1000, 10)))
            .annotate(Annotation::boxed(Region::new(i32::MAX - 10, i32::MAX - 10, 1000, 1000)))
            .annotate(Annotation::text("Far", Point::new(i32::MAX - 2, i32::MAX - 2)))
            .annotate(Annotation::circle(Point::new(i32::MAX, i32::MAX)).radius(i32::MAX));
        let mut img = canvas(50, 50);
        let before = img.clone();
        // blur is skipped; the others draw nothing visible
        assert_eq!(engine.render(&mut img, &step), 4);
        assert_eq!(img, before);
    }

    #[test]
    fn test_number_and_arrow_need_element_bounds() {
        let engine = AnnotationEngine::default();
        let step = step_with(Annotation::number(1)).annotate(Annotation::arrow(Some("Tap")));
        let mut img = canvas(100, 100);
        let before = img.clone();
        assert_eq!(engine.render(&mut img, &step), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn test_arrow_points_at_element_center() {
        let engine = AnnotationEngine::default();
        let mut step = step_with(Annotation::arrow(None));
        step.element_bounds = Some(Bounds::new(140, 140, 20, 20));
        let mut img = canvas(200, 200);
        engine.render(&mut img, &step);
        assert_eq!(rgb(&img, 150, 150), [255, 0, 0]);
        assert_eq!(rgb(&img, 50, 50), [255, 0, 0]);
        assert_eq!(rgb(&img, 100, 100), [255, 0, 0]);
        assert_eq!(rgb(&img, 150, 50), [0, 0, 0]);
    }

    #[test]
    fn test_circle_radius_scales() {
        let engine = AnnotationEngine::new(DisplayScale::new(2.0));
        let step = step_with(Annotation::circle(Point::new(50, 50)).radius(20));
        let mut img = canvas(200, 200);
        engine.render(&mut img, &step);
        // center (100,100), radius 40
        assert_eq!(rgb(&img, 140, 100), [255, 0, 0]);
        assert_eq!(rgb(&img, 100, 100), [0, 0, 0]);
        assert_eq!(rgb(&img, 120, 100), [0, 0, 0]);
    }

    #[test]
    fn test_annotated_path_keeps_extension() {
        let out =
            annotated_path(Path::new("/tmp/shots/setup_open.jpg"), Path::new("/out")).unwrap();
        assert_eq!(out, PathBuf::from("/out/setup_open_annotated.jpg"));
    }
}
