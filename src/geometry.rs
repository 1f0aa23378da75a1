//! Logical and physical pixel geometry.
//!
//! Configuration and annotation records speak in *logical* pixels (the space the
//! user recorded clicks in). Captured rasters are addressed in *physical* pixels.
//! [`DisplayScale`] is the only conversion between the two.

use serde::{Deserialize, Serialize};

/// A point, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by an offset
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// A logical-pixel rectangle, serialized as `[x, y, width, height]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<[i32; 4]> for Region {
    fn from([x, y, width, height]: [i32; 4]) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<Region> for [i32; 4] {
    fn from(r: Region) -> Self {
        [r.x, r.y, r.width, r.height]
    }
}

/// A physical-pixel rectangle.
///
/// Drivers report element and window bounds in this form, serialized as
/// `{"x": .., "y": .., "width": .., "height": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Midpoint, using integer halving of the extent
    pub const fn center(&self) -> Point {
        Point {
            x: self.x.saturating_add(self.width / 2),
            y: self.y.saturating_add(self.height / 2),
        }
    }

    /// Exclusive right edge
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Intersect with a `width` x `height` raster anchored at the origin.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the raster.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Bounds> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.right().min(i32::try_from(width).unwrap_or(i32::MAX));
        let y2 = self.bottom().min(i32::try_from(height).unwrap_or(i32::MAX));
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some(Bounds::new(x1, y1, x2 - x1, y2 - y1))
    }
}

/// Multiplier from logical to physical pixels (1.0 regular, 2.0 retina).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct DisplayScale(f64);

impl DisplayScale {
    pub const IDENTITY: DisplayScale = DisplayScale(1.0);

    /// Non-finite or non-positive factors fall back to 1.0.
    pub fn new(factor: f64) -> Self {
        if factor.is_finite() && factor > 0.0 {
            Self(factor)
        } else {
            Self::IDENTITY
        }
    }

    pub fn factor(&self) -> f64 {
        self.0
    }

    /// Scale a single quantity, truncating toward zero
    pub fn length(&self, logical: i32) -> i32 {
        (f64::from(logical) * self.0) as i32
    }

    pub fn point(&self, logical: Point) -> Point {
        Point::new(self.length(logical.x), self.length(logical.y))
    }

    /// Convert a logical region into physical bounds, component by component.
    pub fn region(&self, logical: Region) -> Bounds {
        Bounds::new(
            self.length(logical.x),
            self.length(logical.y),
            self.length(logical.width),
            self.length(logical.height),
        )
    }
}

impl From<f64> for DisplayScale {
    fn from(factor: f64) -> Self {
        Self::new(factor)
    }
}

impl From<DisplayScale> for f64 {
    fn from(scale: DisplayScale) -> Self {
        scale.0
    }
}

impl Default for DisplayScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_scaling_truncates() {
        let region = Region::new(0, 0, 101, 33);
        assert_eq!(
            DisplayScale::new(1.0).region(region),
            Bounds::new(0, 0, 101, 33)
        );
        assert_eq!(
            DisplayScale::new(2.0).region(region),
            Bounds::new(0, 0, 202, 66)
        );
        // 101 * 1.5 = 151.5, 33 * 1.5 = 49.5
        assert_eq!(
            DisplayScale::new(1.5).region(region),
            Bounds::new(0, 0, 151, 49)
        );
        assert_eq!(
            DisplayScale::new(1.5).region(Region::new(7, 9, 3, 5)),
            Bounds::new(10, 13, 4, 7)
        );
    }

    #[test]
    fn test_invalid_scale_falls_back_to_identity() {
        assert_eq!(DisplayScale::new(0.0), DisplayScale::IDENTITY);
        assert_eq!(DisplayScale::new(-2.0), DisplayScale::IDENTITY);
        assert_eq!(DisplayScale::new(f64::NAN), DisplayScale::IDENTITY);
    }

    #[test]
    fn test_bounds_center() {
        assert_eq!(Bounds::new(10, 20, 31, 11).center(), Point::new(25, 25));
    }

    #[test]
    fn test_clamp_to_image() {
        let b = Bounds::new(-10, 480, 50, 50);
        assert_eq!(b.clamp_to(500, 500), Some(Bounds::new(0, 480, 40, 20)));
        assert_eq!(Bounds::new(600, 0, 10, 10).clamp_to(500, 500), None);
        assert_eq!(Bounds::new(10, 10, 0, 10).clamp_to(500, 500), None);
    }

    #[test]
    fn test_edges_saturate_near_i32_max() {
        let far = DisplayScale::IDENTITY.region(Region::new(i32::MAX - 10, 0, 1000, 10));
        assert_eq!(far.right(), i32::MAX);
        assert_eq!(far.clamp_to(50, 50), None);
        assert_eq!(Point::new(i32::MAX, 0).offset(5, -5), Point::new(i32::MAX, -5));
    }

    #[test]
    fn test_yaml_tuples() {
        let region: Region = serde_yaml::from_str("[100, 100, 400, 300]").unwrap();
        assert_eq!(region, Region::new(100, 100, 400, 300));
        let point: Point = serde_yaml::from_str("[12, 34]").unwrap();
        assert_eq!(point, Point::new(12, 34));
        assert!(serde_yaml::from_str::<Region>("[1, 2]").is_err());
    }
}
