//! Resampling a grid onto another regular grid.
//!
//! Target cell centers are mapped to fractional row/column positions on the
//! source grid; linear and cubic values are then computed by `interpn` on the
//! unit-spaced index grid, so the library never sees map coordinates (which
//! run north to south along rows).

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{DataSetError, Result};
use crate::geodict::GeoDict;

/// Interpolation used when sampling a data set at new coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    Nearest,
    #[default]
    Linear,
    Cubic,
}

impl InterpolationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpolationMethod::Nearest => "nearest",
            InterpolationMethod::Linear => "linear",
            InterpolationMethod::Cubic => "cubic",
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMethod {
    type Err = DataSetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nearest" => Ok(InterpolationMethod::Nearest),
            "linear" => Ok(InterpolationMethod::Linear),
            "cubic" => Ok(InterpolationMethod::Cubic),
            other => Err(DataSetError::NotImplemented(format!(
                "interpolation method '{}'",
                other
            ))),
        }
    }
}

/// Sample `data` (laid out on `source`) at every cell center of `target`.
pub(crate) fn resample(
    data: &Array2<f64>,
    source: &GeoDict,
    target: &GeoDict,
    method: InterpolationMethod,
) -> Result<Array2<f64>> {
    if !source.contains(target) {
        let (lat, lon) = outside_corner(source, target);
        tracing::warn!(
            "Target extent {:?} is not inside source extent {:?}",
            target.bounds(),
            source.bounds()
        );
        return Err(DataSetError::OutOfBounds { lat, lon });
    }

    let (src_rows, src_cols) = source.shape();
    let (ny, nx) = target.shape();

    // 出力セル中心をソースの行列インデックスに変換
    let mut rows = Vec::with_capacity(ny * nx);
    let mut cols = Vec::with_capacity(ny * nx);
    for i in 0..ny {
        for j in 0..nx {
            let (lat, lon) = target.lat_lon(i as f64, j as f64);
            let (row, col) = source.row_col_f(lat, lon);
            rows.push(row.clamp(0.0, (src_rows - 1) as f64));
            cols.push(col.clamp(0.0, (src_cols - 1) as f64));
        }
    }

    let mut out = vec![0.0; ny * nx];
    match method {
        InterpolationMethod::Nearest => {
            for (k, value) in out.iter_mut().enumerate() {
                let row = snap_nearest(rows[k], src_rows);
                let col = snap_nearest(cols[k], src_cols);
                *value = data[[row, col]];
            }
        }
        InterpolationMethod::Linear | InterpolationMethod::Cubic => {
            let dims = [src_rows, src_cols];
            let starts = [0.0, 0.0];
            let steps = [1.0, 1.0];
            let vals: Vec<f64> = data.iter().copied().collect();
            let obs = [&rows[..], &cols[..]];

            let result = if method == InterpolationMethod::Linear {
                interpn::multilinear::regular::interpn(
                    &dims, &starts, &steps, &vals, &obs, &mut out,
                )
            } else {
                interpn::multicubic::regular::interpn(
                    &dims, &starts, &steps, &vals, false, &obs, &mut out,
                )
            };
            result.map_err(|e| DataSetError::Interpolation(e.to_string()))?;
        }
    }

    tracing::info!(
        "Resampled {}x{} grid to {}x{} using {} interpolation",
        src_rows,
        src_cols,
        ny,
        nx,
        method
    );

    Array2::from_shape_vec((ny, nx), out).map_err(|e| DataSetError::Interpolation(e.to_string()))
}

/// Nearest index to a fractional position; exact half-way positions go to the lower index.
fn snap_nearest(position: f64, len: usize) -> usize {
    ((position - 0.5).ceil().max(0.0) as usize).min(len - 1)
}

fn outside_corner(source: &GeoDict, target: &GeoDict) -> (f64, f64) {
    let bounds = source.bounds();
    let corners = [
        (target.ymax(), target.xmin()),
        (target.ymax(), target.xmax()),
        (target.ymin(), target.xmin()),
        (target.ymin(), target.xmax()),
    ];
    corners
        .into_iter()
        .find(|&(lat, lon)| !bounds.contains(lon, lat))
        .unwrap_or(corners[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn ramp(ny: usize, nx: usize) -> Array2<f64> {
        Array::from_shape_fn((ny, nx), |(r, c)| (r * nx + c) as f64)
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("nearest".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Nearest);
        assert_eq!("linear".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Linear);
        assert_eq!("cubic".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Cubic);

        let err = "quintic".parse::<InterpolationMethod>().unwrap_err();
        assert!(matches!(err, DataSetError::NotImplemented(_)));
    }

    #[test]
    fn test_method_display_round_trips() {
        for method in [
            InterpolationMethod::Nearest,
            InterpolationMethod::Linear,
            InterpolationMethod::Cubic,
        ] {
            assert_eq!(method.to_string().parse::<InterpolationMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_snap_nearest_ties_go_low() {
        assert_eq!(snap_nearest(2.5, 10), 2);
        assert_eq!(snap_nearest(2.51, 10), 3);
        assert_eq!(snap_nearest(2.49, 10), 2);
        assert_eq!(snap_nearest(0.0, 10), 0);
        assert_eq!(snap_nearest(9.0, 10), 9);
    }

    #[test]
    fn test_identity_resample() {
        let gd = GeoDict::new(0.5, 4.5, 0.5, 4.5, 1.0, 1.0, 5, 5).unwrap();
        let data = ramp(5, 5);
        for method in [
            InterpolationMethod::Nearest,
            InterpolationMethod::Linear,
            InterpolationMethod::Cubic,
        ] {
            let out = resample(&data, &gd, &gd, method).unwrap();
            for (a, b) in out.iter().zip(data.iter()) {
                assert!((a - b).abs() < 1e-9, "{} resample changed {} to {}", method, b, a);
            }
        }
    }

    #[test]
    fn test_target_outside_source_fails() {
        let source = GeoDict::new(0.5, 3.5, 0.5, 3.5, 1.0, 1.0, 4, 4).unwrap();
        let target = GeoDict::new(3.0, 5.0, 1.0, 2.0, 1.0, 1.0, 3, 2).unwrap();
        let err = resample(&ramp(4, 4), &source, &target, InterpolationMethod::Linear).unwrap_err();
        assert_eq!(err, DataSetError::OutOfBounds { lat: 2.0, lon: 5.0 });
    }

    #[test]
    fn test_cubic_needs_four_rows() {
        let gd = GeoDict::new(0.5, 2.5, 0.5, 2.5, 1.0, 1.0, 3, 3).unwrap();
        let err = resample(&ramp(3, 3), &gd, &gd, InterpolationMethod::Cubic).unwrap_err();
        assert!(matches!(err, DataSetError::Interpolation(_)));
    }

    #[test]
    fn test_linear_between_rows() {
        // 行方向は北から南へ進む
        let source = GeoDict::new(0.0, 1.0, 0.0, 1.0, 1.0, 1.0, 2, 2).unwrap();
        let data = ndarray::array![[10.0, 10.0], [20.0, 20.0]];
        let target = GeoDict::new(0.5, 0.5, 0.25, 0.25, 1.0, 1.0, 1, 1).unwrap();
        let out = resample(&data, &source, &target, InterpolationMethod::Linear).unwrap();
        assert!((out[[0, 0]] - 17.5).abs() < 1e-9);
    }
}
