//! In-memory geospatial grids and point clouds.
//!
//! [`Grid2D`] pairs a 2D array with a [`GeoDict`] and handles the
//! row/column <-> lat/lon bookkeeping needed to crop, resample and rasterize
//! it. [`Cloud`] holds scattered `(lon, lat, value)` samples. Both implement
//! [`DataSet`].

pub mod bounds;
pub mod cloud;
pub mod dataset;
pub mod error;
pub mod geodict;
pub mod grid;
pub mod rasterize;
pub mod resample;

pub use bounds::Bounds;
pub use cloud::Cloud;
pub use dataset::DataSet;
pub use error::{DataSetError, Result};
pub use geodict::{CellWindow, GeoDict};
pub use grid::Grid2D;
pub use rasterize::{RasterizeConfig, Shape};
pub use resample::InterpolationMethod;
