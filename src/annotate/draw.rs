//! Raster primitives for annotations.
//!
//! All coordinates are physical pixels. Anything that falls outside the image is
//! clipped, so callers may pass shapes that hang off the edges.

use font8x8::{BASIC_FONTS, LATIN_FONTS, MISC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage, imageops};
use std::ops::RangeInclusive;

use crate::geometry::{Bounds, Point};

/// Glyph cell size of the bitmap font before magnification
pub const GLYPH_SIZE: u32 = 8;

fn opaque(color: [u8; 3]) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}

/// Set one pixel if it lies inside the image
pub fn put(img: &mut RgbaImage, x: i32, y: i32, color: [u8; 3]) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, opaque(color));
    }
}

/// Fill the rectangle spanning `(x0, y0)` to `(x1, y1)`, both corners inclusive
pub fn fill_rect(img: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: [u8; 3]) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    for y in y0.max(0)..=y1.min(h - 1) {
        for x in x0.max(0)..=x1.min(w - 1) {
            img.put_pixel(x as u32, y as u32, opaque(color));
        }
    }
}

/// Rectangle outline with the stroke centered on each edge.
///
/// Corners are inclusive, matching how box annotations span `x..=x+width`.
pub fn stroke_rect(
    img: &mut RgbaImage,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    thickness: i32,
    color: [u8; 3],
) {
    let t = thickness.max(1);
    let lo = |c: i32| c.saturating_sub(t / 2);
    let hi = |c: i32| lo(c).saturating_add(t - 1);

    fill_rect(img, lo(x0), lo(y0), hi(x1), hi(y0), color);
    fill_rect(img, lo(x0), lo(y1), hi(x1), hi(y1), color);
    fill_rect(img, lo(x0), lo(y0), hi(x0), hi(y1), color);
    fill_rect(img, lo(x1), lo(y0), hi(x1), hi(y1), color);
}

/// Rectangle outline drawn entirely inside the corners
pub fn stroke_rect_inner(
    img: &mut RgbaImage,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    width: i32,
    color: [u8; 3],
) {
    let w = width.max(1) - 1;
    fill_rect(img, x0, y0, x1, y0.saturating_add(w), color);
    fill_rect(img, x0, y1.saturating_sub(w), x1, y1, color);
    fill_rect(img, x0, y0, x0.saturating_add(w), y1, color);
    fill_rect(img, x1.saturating_sub(w), y0, x1, y1, color);
}

/// Alpha-over a flat color onto the pixels covered by `area`.
///
/// Source alpha is `alpha / 255`; underlying pixels always remain partly visible
/// for `alpha < 255`.
pub fn blend_rect(img: &mut RgbaImage, area: Bounds, color: [u8; 3], alpha: u8) {
    let Some(area) = area.clamp_to(img.width(), img.height()) else {
        return;
    };
    let inv = 255 - u16::from(alpha);
    for y in area.y..area.bottom() {
        for x in area.x..area.right() {
            let px = img.get_pixel_mut(x as u32, y as u32);
            for (channel, src) in px.0.iter_mut().take(3).zip(color) {
                let s = mul_div255(u16::from(src), u16::from(alpha));
                let d = mul_div255(u16::from(*channel), inv);
                *channel = s.saturating_add(d);
            }
            let a = px.0[3];
            px.0[3] = alpha.saturating_add(mul_div255(u16::from(a), inv));
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

/// Stamp a square brush of side `thickness` centered on `(x, y)`
fn stamp(img: &mut RgbaImage, x: i32, y: i32, thickness: i32, color: [u8; 3]) {
    let t = thickness.max(1);
    let lo = -(t / 2);
    let hi = lo + t - 1;
    for dy in lo..=hi {
        for dx in lo..=hi {
            put(img, x.saturating_add(dx), y.saturating_add(dy), color);
        }
    }
}

/// Straight line between two points, endpoints included
pub fn draw_line(img: &mut RgbaImage, from: Point, to: Point, thickness: i32, color: [u8; 3]) {
    let dx = f64::from(to.x) - f64::from(from.x);
    let dy = f64::from(to.y) - f64::from(from.y);
    let steps = dx.abs().max(dy.abs()).ceil() as i32;
    if steps == 0 {
        stamp(img, from.x, from.y, thickness, color);
        return;
    }
    for i in 0..=steps {
        let t = f64::from(i) / f64::from(steps);
        let x = (f64::from(from.x) + dx * t).round() as i32;
        let y = (f64::from(from.y) + dy * t).round() as i32;
        stamp(img, x, y, thickness, color);
    }
}

/// Line from `tail` to `tip` with two head strokes at the tip.
///
/// Head strokes are `tip_ratio` times the shaft length and leave the tip at 45
/// degrees either side of the shaft.
pub fn draw_arrow(
    img: &mut RgbaImage,
    tail: Point,
    tip: Point,
    thickness: i32,
    tip_ratio: f64,
    color: [u8; 3],
) {
    draw_line(img, tail, tip, thickness, color);

    let back_x = f64::from(tail.x) - f64::from(tip.x);
    let back_y = f64::from(tail.y - tip.y);
    let head = back_x.hypot(back_y) * tip_ratio;
    let angle = back_y.atan2(back_x);
    for side in [std::f64::consts::FRAC_PI_4, -std::f64::consts::FRAC_PI_4] {
        let end = Point::new(
            (f64::from(tip.x) + head * (angle + side).cos()).round() as i32,
            (f64::from(tip.y) + head * (angle + side).sin()).round() as i32,
        );
        draw_line(img, end, tip, thickness, color);
    }
}

/// Offsets from `center` within `reach` that land on a raster of extent `limit`
fn on_image(center: i32, reach: i32, limit: u32) -> RangeInclusive<i64> {
    let c = i64::from(center);
    let lo = (-i64::from(reach)).max(-c);
    let hi = i64::from(reach).min(i64::from(limit) - 1 - c);
    lo..=hi
}

/// Solid disc
pub fn fill_circle(img: &mut RgbaImage, center: Point, radius: i32, color: [u8; 3]) {
    let r = radius.max(0);
    let r2 = i64::from(r) * i64::from(r);
    let (w, h) = img.dimensions();
    for dy in on_image(center.y, r, h) {
        for dx in on_image(center.x, r, w) {
            if (dx * dx).saturating_add(dy * dy) <= r2 {
                let (x, y) = (i64::from(center.x) + dx, i64::from(center.y) + dy);
                img.put_pixel(x as u32, y as u32, opaque(color));
            }
        }
    }
}

/// Ring of width `thickness` centered on `radius`
pub fn stroke_circle(
    img: &mut RgbaImage,
    center: Point,
    radius: i32,
    thickness: i32,
    color: [u8; 3],
) {
    let half = f64::from(thickness.max(1)) / 2.0;
    let inner = f64::from(radius) - half;
    let outer = f64::from(radius) + half;
    let reach = outer.ceil() as i32;
    let (w, h) = img.dimensions();
    for dy in on_image(center.y, reach, h) {
        for dx in on_image(center.x, reach, w) {
            let d = (dx as f64).hypot(dy as f64);
            if d >= inner && d < outer {
                let (x, y) = (i64::from(center.x) + dx, i64::from(center.y) + dy);
                img.put_pixel(x as u32, y as u32, opaque(color));
            }
        }
    }
}

fn glyph(ch: char) -> Option<[u8; 8]> {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| MISC_FONTS.get(ch))
}

/// Pixel size of `text` at the given glyph magnification
pub fn text_size(text: &str, scale: u32) -> (i32, i32) {
    let cell = (GLYPH_SIZE * scale.max(1)) as i32;
    let chars = i32::try_from(text.chars().count()).unwrap_or(i32::MAX);
    (chars.saturating_mul(cell), cell)
}

/// Draw `text` with its top-left corner at `origin`. Only glyph pixels are painted.
pub fn draw_text(img: &mut RgbaImage, origin: Point, text: &str, scale: u32, color: [u8; 3]) {
    let scale = scale.max(1) as i32;
    let cell = GLYPH_SIZE as i32 * scale;
    for (index, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else {
            continue;
        };
        let cell_x = origin.x.saturating_add((index as i32).saturating_mul(cell));
        for (row_idx, row) in rows.iter().enumerate() {
            for bit in 0..GLYPH_SIZE as i32 {
                // font8x8 stores the leftmost pixel in the least significant bit
                if (row >> bit) & 1 == 0 {
                    continue;
                }
                let px = cell_x.saturating_add(bit * scale);
                let py = origin.y.saturating_add(row_idx as i32 * scale);
                for sy in 0..scale {
                    for sx in 0..scale {
                        put(img, px.saturating_add(sx), py.saturating_add(sy), color);
                    }
                }
            }
        }
    }
}

/// Gaussian-blur the pixels inside `area` in place; the rest of the image is untouched
pub fn blur_rect(img: &mut RgbaImage, area: Bounds, sigma: f32) {
    let region = imageops::crop_imm(
        &*img,
        area.x as u32,
        area.y as u32,
        area.width as u32,
        area.height as u32,
    )
    .to_image();
    let blurred = imageops::blur(&region, sigma);
    imageops::replace(img, &blurred, i64::from(area.x), i64::from(area.y));
}
