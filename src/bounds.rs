//! Axis-aligned extent in map coordinates.

use serde::{Deserialize, Serialize};

/// Extent ordered like the tuples callers pass around: `(xmin, xmax, ymin, ymax)`.
///
/// For geographic data x is longitude and y is latitude, both in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Bounds {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Point lies strictly inside (edges excluded).
    pub fn contains_strict(&self, x: f64, y: f64) -> bool {
        x > self.xmin && x < self.xmax && y > self.ymin && y < self.ymax
    }

    /// Point lies inside or on an edge.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// `other` lies entirely inside this extent, allowing `tol` of slack on every edge.
    pub fn contains_bounds(&self, other: &Bounds, tol: f64) -> bool {
        other.xmin >= self.xmin - tol
            && other.xmax <= self.xmax + tol
            && other.ymin >= self.ymin - tol
            && other.ymax <= self.ymax + tol
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.xmin <= other.xmax
            && self.xmax >= other.xmin
            && self.ymin <= other.ymax
            && self.ymax >= other.ymin
    }
}

impl From<(f64, f64, f64, f64)> for Bounds {
    fn from((xmin, xmax, ymin, ymax): (f64, f64, f64, f64)) -> Self {
        Self::new(xmin, xmax, ymin, ymax)
    }
}

impl From<Bounds> for (f64, f64, f64, f64) {
    fn from(b: Bounds) -> Self {
        (b.xmin, b.xmax, b.ymin, b.ymax)
    }
}
