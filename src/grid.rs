use ndarray::{s, Array1, Array2, ArrayView1};

use crate::bounds::Bounds;
use crate::dataset::DataSet;
use crate::error::{DataSetError, Result};
use crate::geodict::GeoDict;
use crate::rasterize::{rasterize, RasterizeConfig, Shape};
use crate::resample::{resample, InterpolationMethod};

/// Regular 2D raster: a `(ny, nx)` array of samples on a [`GeoDict`].
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D {
    data: Array2<f64>,
    geodict: GeoDict,
}

impl Grid2D {
    pub fn new(data: Array2<f64>, geodict: GeoDict) -> Result<Self> {
        check_shape("Grid2D::new", &data, &geodict)?;
        Ok(Self { data, geodict })
    }

    /// Burn polygon shapes into a new grid laid out on `geodict`.
    pub fn rasterize_from_geometry(
        shapes: &[Shape],
        geodict: &GeoDict,
        config: &RasterizeConfig,
    ) -> Result<Self> {
        let data = rasterize(shapes, geodict, config)?;
        Self::new(data, *geodict)
    }

    pub fn geodict(&self) -> &GeoDict {
        &self.geodict
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// `(lat, lon)` of a cell center.
    pub fn lat_lon(&self, row: usize, col: usize) -> (f64, f64) {
        self.geodict.lat_lon(row as f64, col as f64)
    }

    /// Fractional `(row, col)` of a coordinate.
    pub fn row_col_f(&self, lat: f64, lon: f64) -> (f64, f64) {
        self.geodict.row_col_f(lat, lon)
    }

    /// Whole `(row, col)` of a coordinate, flooring the fractional position.
    ///
    /// Coordinates off the grid give indices that are negative or past the last row/column.
    pub fn row_col(&self, lat: f64, lon: f64) -> (isize, isize) {
        let (row, col) = self.row_col_f(lat, lon);
        (row.floor() as isize, col.floor() as isize)
    }

    fn cell_index(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let (row_f, col_f) = self.row_col_f(lat, lon);
        // NaN は floor しても 0 になるので先に弾く
        if !row_f.is_finite() || !col_f.is_finite() {
            return None;
        }
        let (row, col) = (row_f.floor() as isize, col_f.floor() as isize);
        let (nrows, ncols) = self.shape();
        if row < 0 || col < 0 || row as usize >= nrows || col as usize >= ncols {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// Vectorised [`DataSet::get_value`].
    ///
    /// Points outside the grid take `default` when one is given; otherwise the call fails.
    pub fn get_values(
        &self,
        lats: ArrayView1<f64>,
        lons: ArrayView1<f64>,
        default: Option<f64>,
    ) -> Result<Array1<f64>> {
        if lats.len() != lons.len() {
            return Err(DataSetError::shape_mismatch(
                "Grid2D::get_values",
                lats.shape(),
                lons.shape(),
            ));
        }

        lats.iter()
            .zip(lons.iter())
            .map(|(&lat, &lon)| match (self.cell_index(lat, lon), default) {
                (Some(idx), _) => Ok(self.data[idx]),
                (None, Some(value)) => Ok(value),
                (None, None) => Err(DataSetError::OutOfBounds { lat, lon }),
            })
            .collect()
    }

    /// Extract the cells whose centers lie inside the box, edges included.
    pub fn cut(&self, xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Result<Grid2D> {
        self.cut_bounds(&Bounds::new(xmin, xmax, ymin, ymax))
    }

    fn cut_bounds(&self, bounds: &Bounds) -> Result<Grid2D> {
        let window = self.geodict.window(bounds)?;
        let data = self
            .data
            .slice(s![
                window.row_start..=window.row_end,
                window.col_start..=window.col_end
            ])
            .to_owned();

        tracing::debug!(
            "Cut {}x{} grid down to {}x{}",
            self.geodict.ny(),
            self.geodict.nx(),
            window.nrows(),
            window.ncols()
        );

        Ok(Grid2D {
            data,
            geodict: self.geodict.subset(&window),
        })
    }
}

fn check_shape(context: &'static str, data: &Array2<f64>, geodict: &GeoDict) -> Result<()> {
    let (ny, nx) = geodict.shape();
    if data.dim() != (ny, nx) {
        tracing::warn!(
            "Rejecting grid data of shape {:?}; geodict expects ({}, {})",
            data.shape(),
            ny,
            nx
        );
        return Err(DataSetError::shape_mismatch(
            context,
            &[ny, nx],
            data.shape(),
        ));
    }
    Ok(())
}

impl DataSet for Grid2D {
    type Data = Array2<f64>;

    fn data(&self) -> &Array2<f64> {
        &self.data
    }

    fn set_data(&mut self, data: Array2<f64>) -> Result<()> {
        check_shape("Grid2D::set_data", &data, &self.geodict)?;
        self.data = data;
        Ok(())
    }

    fn bounds(&self) -> Result<Bounds> {
        Ok(self.geodict.bounds())
    }

    /// Crop in place to the cells whose centers lie inside `bounds`.
    fn trim(&mut self, bounds: &Bounds) -> Result<()> {
        *self = self.cut_bounds(bounds)?;
        Ok(())
    }

    /// Value of the cell containing the coordinate (see [`Grid2D::row_col`]).
    fn get_value(&self, lat: f64, lon: f64) -> Result<f64> {
        self.cell_index(lat, lon)
            .map(|idx| self.data[idx])
            .ok_or(DataSetError::OutOfBounds { lat, lon })
    }

    fn interpolate_to_grid(&self, geodict: &GeoDict, method: InterpolationMethod) -> Result<Grid2D> {
        let data = resample(&self.data, &self.geodict, geodict, method)?;
        Grid2D::new(data, *geodict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    fn create_test_grid() -> Grid2D {
        let geodict = GeoDict::new(0.5, 3.5, 0.5, 3.5, 1.0, 1.0, 4, 4).unwrap();
        let data = Array::range(0.0, 16.0, 1.0).into_shape_with_order((4, 4)).unwrap();
        Grid2D::new(data, geodict).unwrap()
    }

    #[test]
    fn test_new_checks_shape() {
        let geodict = GeoDict::new(0.5, 3.5, 0.5, 3.5, 1.0, 1.0, 4, 4).unwrap();
        let err = Grid2D::new(Array2::zeros((4, 5)), geodict).unwrap_err();
        assert_eq!(
            err,
            DataSetError::ShapeMismatch {
                context: "Grid2D::new",
                expected: vec![4, 4],
                found: vec![4, 5],
            }
        );
    }

    #[test]
    fn test_coordinate_mapping() {
        let grid = create_test_grid();
        assert_eq!(grid.lat_lon(0, 0), (3.5, 0.5));
        assert_eq!(grid.row_col(3.5, 0.5), (0, 0));
        assert_eq!(grid.row_col_f(1.0, 3.0), (2.5, 2.5));
        assert_eq!(grid.row_col(1.0, 3.0), (2, 2));
        assert_eq!(grid.row_col(4.0, 0.0), (-1, -1));
    }

    #[test]
    fn test_get_value_out_of_bounds() {
        let grid = create_test_grid();
        assert_eq!(grid.get_value(3.5, 0.5).unwrap(), 0.0);
        assert_eq!(grid.get_value(0.5, 3.5).unwrap(), 15.0);
        assert_eq!(
            grid.get_value(-1.0, 2.0).unwrap_err(),
            DataSetError::OutOfBounds { lat: -1.0, lon: 2.0 }
        );
    }

    #[test]
    fn test_non_finite_coordinates_are_out_of_bounds() {
        let grid = create_test_grid();
        let err = grid.get_value(f64::NAN, 1.5).unwrap_err();
        assert!(matches!(err, DataSetError::OutOfBounds { .. }));
        let err = grid.get_value(1.5, f64::INFINITY).unwrap_err();
        assert!(matches!(err, DataSetError::OutOfBounds { .. }));

        let lats = array![f64::NAN, 2.5, 1.5];
        let lons = array![f64::NAN, f64::NEG_INFINITY, 1.5];
        let values = grid.get_values(lats.view(), lons.view(), Some(-1.0)).unwrap();
        assert_eq!(values, array![-1.0, -1.0, 9.0]);
    }

    #[test]
    fn test_get_values_without_default_fails_outside() {
        let grid = create_test_grid();
        let lats = array![0.5, 4.0];
        let lons = array![0.5, 4.0];
        assert!(grid.get_values(lats.view(), lons.view(), None).is_err());

        let err = grid
            .get_values(array![0.5].view(), array![0.5, 1.5].view(), None)
            .unwrap_err();
        assert!(matches!(err, DataSetError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_set_data() {
        let mut grid = create_test_grid();
        grid.set_data(Array2::ones((4, 4))).unwrap();
        assert!(grid.data().iter().all(|&v| v == 1.0));

        assert!(grid.set_data(Array2::ones((5, 5))).is_err());
        assert_eq!(grid.shape(), (4, 4));
    }

    #[test]
    fn test_trim_in_place() {
        let mut grid = create_test_grid();
        grid.trim(&Bounds::new(1.5, 2.5, 1.5, 2.5)).unwrap();
        assert_eq!(grid.data(), &array![[5.0, 6.0], [9.0, 10.0]]);
        assert_eq!(grid.bounds().unwrap(), Bounds::new(1.5, 2.5, 1.5, 2.5));
    }

    #[test]
    fn test_cut_outside_grid_fails() {
        let grid = create_test_grid();
        assert_eq!(
            grid.cut(10.0, 12.0, 10.0, 12.0).unwrap_err(),
            DataSetError::EmptyIntersection
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let grid1 = create_test_grid();
        let mut grid2 = grid1.clone();
        let mut data = grid2.data().clone();
        data[[0, 0]] = f64::NAN;
        grid2.set_data(data).unwrap();

        assert_eq!(grid1.data()[[0, 0]], 0.0);
        assert!(grid2.data()[[0, 0]].is_nan());
        assert_eq!(grid1.geodict(), grid2.geodict());
    }
}
