use crate::bounds::Bounds;
use crate::error::Result;
use crate::geodict::GeoDict;
use crate::grid::Grid2D;
use crate::resample::InterpolationMethod;

/// Operations shared by gridded and scattered data sets.
pub trait DataSet {
    /// Array type holding the sample values.
    type Data;

    fn data(&self) -> &Self::Data;

    /// Replace the sample values. The new array must have the same shape as the current one.
    fn set_data(&mut self, data: Self::Data) -> Result<()>;

    /// `(xmin, xmax, ymin, ymax)` of the samples.
    fn bounds(&self) -> Result<Bounds>;

    /// Drop every sample outside `bounds`.
    fn trim(&mut self, bounds: &Bounds) -> Result<()>;

    /// Value of the data set at a coordinate.
    fn get_value(&self, lat: f64, lon: f64) -> Result<f64>;

    /// Sample the data set onto a regular grid.
    fn interpolate_to_grid(&self, geodict: &GeoDict, method: InterpolationMethod)
        -> Result<Grid2D>;
}
