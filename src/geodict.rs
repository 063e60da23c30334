//! Geospatial metadata for regular grids.
//!
//! Extents are expressed as the coordinates of the outermost *cell centers*,
//! not the outer cell edges. A 4x4 grid of unit cells covering `[0, 4]` in both
//! directions is therefore described by `xmin = 0.5, xmax = 3.5`.
//! Row 0 is the northern edge (`ymax`), column 0 the western edge (`xmin`).

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::{DataSetError, Result};

/// Fraction of a cell tolerated when checking extent/dimension consistency.
const CONSISTENCY_TOL: f64 = 0.01;

/// Fraction of a cell tolerated when snapping coordinates onto cell centers.
const SNAP_TOL: f64 = 1e-6;

/// Extent, resolution and dimensions of a regular grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoDict")]
pub struct GeoDict {
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
    dx: f64,
    dy: f64,
    nx: usize,
    ny: usize,
}

/// Unvalidated dictionary form, as deserialized.
#[derive(Deserialize)]
struct RawGeoDict {
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
    dx: f64,
    dy: f64,
    nx: usize,
    ny: usize,
}

impl TryFrom<RawGeoDict> for GeoDict {
    type Error = DataSetError;

    fn try_from(raw: RawGeoDict) -> Result<Self> {
        GeoDict::new(
            raw.xmin, raw.xmax, raw.ymin, raw.ymax, raw.dx, raw.dy, raw.nx, raw.ny,
        )
    }
}

/// Inclusive range of rows and columns inside a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl CellWindow {
    pub fn nrows(&self) -> usize {
        self.row_end - self.row_start + 1
    }

    pub fn ncols(&self) -> usize {
        self.col_end - self.col_start + 1
    }
}

impl GeoDict {
    /// Build a geodict, checking that the extent agrees with cell size and dimensions.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        xmin: f64,
        xmax: f64,
        ymin: f64,
        ymax: f64,
        dx: f64,
        dy: f64,
        nx: usize,
        ny: usize,
    ) -> Result<Self> {
        let geodict = Self {
            xmin,
            xmax,
            ymin,
            ymax,
            dx,
            dy,
            nx,
            ny,
        };
        geodict.validate()?;
        Ok(geodict)
    }

    /// Build the smallest geodict anchored at the upper-left center `(xmin, ymax)`
    /// that covers the given box at the given resolution.
    ///
    /// `xmax` and `ymin` are pushed outward when the box is not a whole number of cells.
    pub fn from_box(xmin: f64, xmax: f64, ymin: f64, ymax: f64, dx: f64, dy: f64) -> Result<Self> {
        if !(dx > 0.0 && dy > 0.0) {
            return Err(DataSetError::InvalidGeoDict(format!(
                "cell size must be positive (dx={dx}, dy={dy})"
            )));
        }
        if xmax < xmin || ymax < ymin {
            return Err(DataSetError::InvalidGeoDict(format!(
                "box is inverted: ({xmin}, {xmax}, {ymin}, {ymax})"
            )));
        }

        let nx = cell_count(xmax - xmin, dx, "x")?;
        let ny = cell_count(ymax - ymin, dy, "y")?;

        Self::new(
            xmin,
            xmin + (nx - 1) as f64 * dx,
            ymax - (ny - 1) as f64 * dy,
            ymax,
            dx,
            dy,
            nx,
            ny,
        )
    }

    fn validate(&self) -> Result<()> {
        let values = [self.xmin, self.xmax, self.ymin, self.ymax, self.dx, self.dy];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DataSetError::InvalidGeoDict(format!(
                "non-finite value in {:?}",
                self
            )));
        }
        if self.dx <= 0.0 || self.dy <= 0.0 {
            return Err(DataSetError::InvalidGeoDict(format!(
                "cell size must be positive (dx={}, dy={})",
                self.dx, self.dy
            )));
        }
        if self.nx == 0 || self.ny == 0 {
            return Err(DataSetError::InvalidGeoDict(format!(
                "dimensions must be at least 1 (nx={}, ny={})",
                self.nx, self.ny
            )));
        }
        if self.xmax < self.xmin || self.ymax < self.ymin {
            return Err(DataSetError::InvalidGeoDict(format!(
                "extent is inverted: ({}, {}, {}, {})",
                self.xmin, self.xmax, self.ymin, self.ymax
            )));
        }

        let expected_xmax = self.xmin + (self.nx - 1) as f64 * self.dx;
        if (expected_xmax - self.xmax).abs() > CONSISTENCY_TOL * self.dx {
            return Err(DataSetError::InvalidGeoDict(format!(
                "xmin={} + (nx-1)*dx = {} does not match xmax={}",
                self.xmin, expected_xmax, self.xmax
            )));
        }
        let expected_ymax = self.ymin + (self.ny - 1) as f64 * self.dy;
        if (expected_ymax - self.ymax).abs() > CONSISTENCY_TOL * self.dy {
            return Err(DataSetError::InvalidGeoDict(format!(
                "ymin={} + (ny-1)*dy = {} does not match ymax={}",
                self.ymin, expected_ymax, self.ymax
            )));
        }

        Ok(())
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// `(rows, cols)`, the shape data arrays on this geodict must have.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.xmin, self.xmax, self.ymin, self.ymax)
    }

    /// Whether every cell center of `other` lies inside this geodict's extent.
    pub fn contains(&self, other: &GeoDict) -> bool {
        let tol = SNAP_TOL * self.dx.min(self.dy);
        self.bounds().contains_bounds(&other.bounds(), tol)
    }

    /// Center coordinates of a cell. Indices outside the grid are extrapolated.
    pub fn lat_lon(&self, row: f64, col: f64) -> (f64, f64) {
        (self.ymax - row * self.dy, self.xmin + col * self.dx)
    }

    /// Fractional `(row, col)` of a coordinate; cell centers map to whole numbers.
    pub fn row_col_f(&self, lat: f64, lon: f64) -> (f64, f64) {
        ((self.ymax - lat) / self.dy, (lon - self.xmin) / self.dx)
    }

    /// Rows and columns whose cell centers fall inside `bounds` (edges included).
    pub fn window(&self, bounds: &Bounds) -> Result<CellWindow> {
        // NaN の範囲はどのセル中心も含まない (無限大は有効)
        let edges = [bounds.xmin, bounds.xmax, bounds.ymin, bounds.ymax];
        if edges.iter().any(|v| v.is_nan()) {
            tracing::warn!("Bounds {:?} contain NaN", bounds);
            return Err(DataSetError::EmptyIntersection);
        }

        let col_start = ((bounds.xmin - self.xmin) / self.dx - SNAP_TOL).ceil().max(0.0);
        let col_end = ((bounds.xmax - self.xmin) / self.dx + SNAP_TOL)
            .floor()
            .min((self.nx - 1) as f64);
        let row_start = ((self.ymax - bounds.ymax) / self.dy - SNAP_TOL).ceil().max(0.0);
        let row_end = ((self.ymax - bounds.ymin) / self.dy + SNAP_TOL)
            .floor()
            .min((self.ny - 1) as f64);

        if col_start > col_end || row_start > row_end {
            tracing::warn!(
                "Bounds {:?} contain no cell centers of {:?}",
                bounds,
                self.bounds()
            );
            return Err(DataSetError::EmptyIntersection);
        }

        let window = CellWindow {
            row_start: row_start as usize,
            row_end: row_end as usize,
            col_start: col_start as usize,
            col_end: col_end as usize,
        };
        tracing::debug!("Resolved {:?} to cell window {:?}", bounds, window);
        Ok(window)
    }

    /// Geodict describing a window of this grid.
    pub fn subset(&self, window: &CellWindow) -> GeoDict {
        let (ymax, xmin) = self.lat_lon(window.row_start as f64, window.col_start as f64);
        let (ymin, xmax) = self.lat_lon(window.row_end as f64, window.col_end as f64);
        GeoDict {
            xmin,
            xmax,
            ymin,
            ymax,
            dx: self.dx,
            dy: self.dy,
            nx: window.ncols(),
            ny: window.nrows(),
        }
    }

    /// The part of this grid, aligned to its own cell centers, that lies inside `other`.
    pub fn bounds_within(&self, other: &GeoDict) -> Result<GeoDict> {
        let window = self.window(&other.bounds())?;
        Ok(self.subset(&window))
    }
}

/// Number of cell centers needed to span `extent` at spacing `step`, both ends included.
fn cell_count(extent: f64, step: f64, axis: &str) -> Result<usize> {
    let gaps = (extent / step - SNAP_TOL).ceil().max(0.0);
    if !gaps.is_finite() || gaps >= usize::MAX as f64 {
        return Err(DataSetError::InvalidGeoDict(format!(
            "{axis} extent {extent} is too large for cell size {step}"
        )));
    }
    (gaps as usize).checked_add(1).ok_or_else(|| {
        DataSetError::InvalidGeoDict(format!(
            "{axis} extent {extent} is too large for cell size {step}"
        ))
    })
}
