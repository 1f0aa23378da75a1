use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use wallet_guide::{
    annotate::AnnotationEngine,
    geometry::{Bounds, DisplayScale, Point, Region},
    workflow::{Action, Annotation, Step},
};

fn annotated_step() -> Step {
    let mut step = Step::new("Send screen", Action::Screenshot)
        .with_screenshot()
        .annotate(Annotation::arrow(Some("Send")))
        .annotate(Annotation::highlight(Region::new(40, 40, 300, 120)))
        .annotate(Annotation::boxed(Region::new(40, 40, 300, 120)))
        .annotate(Annotation::text("Paste the address here", Point::new(60, 400)))
        .annotate(Annotation::number(1))
        .annotate(Annotation::circle(Point::new(700, 300)));
    step.element_bounds = Some(Bounds::new(500, 200, 160, 48));
    step
}

fn benchmark_render(c: &mut Criterion) {
    let engine = AnnotationEngine::new(DisplayScale::new(2.0)).with_text_scale(3);
    let step = annotated_step();
    let base = RgbaImage::from_pixel(2880, 1800, Rgba([240, 240, 240, 255]));

    c.bench_function("render_overlays", |b| {
        b.iter(|| {
            let mut canvas = base.clone();
            let applied = engine.render(black_box(&mut canvas), black_box(&step));
            assert_eq!(applied, 6);
        })
    });

    let blur = Step::new("Seed words", Action::Screenshot)
        .annotate(Annotation::blur(Region::new(100, 100, 400, 200)));
    c.bench_function("render_blur", |b| {
        b.iter(|| {
            let mut canvas = base.clone();
            engine.render(black_box(&mut canvas), black_box(&blur));
        })
    });
}

criterion_group!(benches, benchmark_render);
criterion_main!(benches);
