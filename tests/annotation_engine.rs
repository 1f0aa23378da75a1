//! Integration tests for annotating screenshots on disk

use std::fs;
use std::path::{Path, PathBuf};

use image::{GenericImageView, Rgb, RgbImage};
use pretty_assertions::assert_eq;

use wallet_guide::annotate::AnnotationEngine;
use wallet_guide::geometry::{Bounds, DisplayScale, Point, Region};
use wallet_guide::workflow::{Action, Annotation, Step};

/// Deterministic non-uniform source so a blur visibly changes pixels
fn write_pattern(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        if (x / 5 + y / 5) % 2 == 0 {
            Rgb([250, 250, 250])
        } else {
            Rgb([10, 40, 90])
        }
    });
    img.save(path).unwrap();
}

fn captured_step(path: PathBuf) -> Step {
    let mut step = Step::new("Seed words", Action::Screenshot)
        .with_screenshot()
        .section("setup");
    step.screenshot_path = Some(path);
    step
}

#[test]
fn test_blur_only_touches_scaled_region() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("setup_seed_words.png");
    write_pattern(&source, 500, 500);

    let mut step = captured_step(source.clone()).annotate(Annotation::blur(Region::new(10, 10, 50, 50)));
    let engine = AnnotationEngine::new(DisplayScale::new(2.0));
    let out_dir = tmp.path().join("annotated");
    fs::create_dir_all(&out_dir).unwrap();

    let output = engine.annotate_step(&mut step, &out_dir).unwrap().unwrap();
    assert_eq!(output, out_dir.join("setup_seed_words_annotated.png"));
    assert_eq!(step.annotated_screenshot_path.as_ref(), Some(&output));

    let before = image::open(&source).unwrap().to_rgb8();
    let after = image::open(&output).unwrap().to_rgb8();
    assert_eq!(after.dimensions(), (500, 500));

    let inside = |x: u32, y: u32| (20..120).contains(&x) && (20..120).contains(&y);
    let mut changed_inside = 0;
    for (x, y, px) in after.enumerate_pixels() {
        if inside(x, y) {
            if px != before.get_pixel(x, y) {
                changed_inside += 1;
            }
        } else {
            assert_eq!(px, before.get_pixel(x, y), "pixel ({x}, {y}) outside blur changed");
        }
    }
    assert!(changed_inside > 0);
}

#[test]
fn test_text_background_corner() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("home.png");
    RgbImage::from_pixel(300, 120, Rgb([30, 30, 30])).save(&source).unwrap();

    let mut step = captured_step(source).annotate(Annotation::text("Click here", Point::new(20, 20)));
    let engine = AnnotationEngine::new(DisplayScale::IDENTITY).with_text_scale(2);
    let output = engine.annotate_step(&mut step, tmp.path()).unwrap().unwrap();

    let img = image::open(output).unwrap();
    assert_eq!(img.dimensions(), (300, 120));
    let rgb = img.to_rgb8();
    // 2px black outline starts at (15,15), white fill right inside it
    assert_eq!(rgb.get_pixel(14, 14), &Rgb([30, 30, 30]));
    assert_eq!(rgb.get_pixel(15, 15), &Rgb([0, 0, 0]));
    assert_eq!(rgb.get_pixel(17, 17), &Rgb([255, 255, 255]));
}

#[test]
fn test_empty_annotations_reuse_original() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("home.png");
    write_pattern(&source, 64, 64);
    let original_bytes = fs::read(&source).unwrap();

    let mut step = captured_step(source.clone());
    let out_dir = tmp.path().join("annotated");
    let engine = AnnotationEngine::default();
    let written = engine.batch_annotate(std::slice::from_mut(&mut step), &out_dir);

    assert_eq!(written, vec![source.clone()]);
    assert_eq!(step.annotated_screenshot_path, Some(source.clone()));
    assert_eq!(fs::read(&source).unwrap(), original_bytes);
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 0);
}

#[test]
fn test_missing_screenshot_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let mut missing = captured_step(tmp.path().join("gone.png"))
        .annotate(Annotation::boxed(Region::new(0, 0, 10, 10)));
    let mut uncaptured = Step::new("Wait", Action::Wait);

    let engine = AnnotationEngine::default();
    assert_eq!(engine.annotate_step(&mut missing, tmp.path()).unwrap(), None);
    assert_eq!(engine.annotate_step(&mut uncaptured, tmp.path()).unwrap(), None);
    assert!(missing.annotated_screenshot_path.is_none());
}

#[test]
fn test_undecodable_screenshot_fails_only_that_step() {
    let tmp = tempfile::tempdir().unwrap();
    let broken = tmp.path().join("broken.png");
    fs::write(&broken, b"not an image").unwrap();
    let good = tmp.path().join("good.png");
    write_pattern(&good, 40, 40);

    let mut steps = vec![
        captured_step(broken).annotate(Annotation::boxed(Region::new(0, 0, 10, 10))),
        captured_step(good).annotate(Annotation::boxed(Region::new(0, 0, 10, 10))),
    ];
    let out_dir = tmp.path().join("out");
    let written = AnnotationEngine::default().batch_annotate(&mut steps, &out_dir);

    assert_eq!(written, vec![out_dir.join("good_annotated.png")]);
    assert!(steps[0].annotated_screenshot_path.is_none());
    assert!(steps[1].annotated_screenshot_path.is_some());
}

#[test]
fn test_rgba_source_keeps_alpha_channel() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("translucent.png");
    image::RgbaImage::from_pixel(32, 32, image::Rgba([0, 0, 0, 128]))
        .save(&source)
        .unwrap();

    let mut step = captured_step(source).annotate(Annotation::boxed(Region::new(4, 4, 10, 10)));
    let output = AnnotationEngine::default()
        .annotate_step(&mut step, tmp.path())
        .unwrap()
        .unwrap();
    let img = image::open(output).unwrap();
    assert!(img.color().has_alpha());
    assert_eq!(img.to_rgba8().get_pixel(20, 20)[3], 128);
}

#[test]
fn test_element_bounds_used_without_region() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("send.png");
    RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])).save(&source).unwrap();

    let mut step = captured_step(source).annotate(Annotation::new(
        wallet_guide::workflow::AnnotationKind::Highlight,
    ));
    step.element_bounds = Some(Bounds::new(10, 10, 20, 20));
    let output = AnnotationEngine::new(DisplayScale::new(2.0))
        .annotate_step(&mut step, tmp.path())
        .unwrap()
        .unwrap();
    let rgb = image::open(output).unwrap().to_rgb8();
    // element bounds are physical: no scaling applied
    assert_eq!(rgb.get_pixel(15, 15), &Rgb([100, 100, 0]));
    assert_eq!(rgb.get_pixel(35, 35), &Rgb([0, 0, 0]));
}
