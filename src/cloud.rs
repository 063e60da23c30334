use geo::{GeodesicDistance, Point};
use ndarray::{Array1, Axis};

use crate::bounds::Bounds;
use crate::dataset::DataSet;
use crate::error::{DataSetError, Result};
use crate::geodict::GeoDict;
use crate::grid::Grid2D;
use crate::resample::InterpolationMethod;

/// Unstructured set of `(lon, lat, value)` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    lon: Array1<f64>,
    lat: Array1<f64>,
    data: Array1<f64>,
}

impl Cloud {
    pub fn new(lon: Array1<f64>, lat: Array1<f64>, data: Array1<f64>) -> Result<Self> {
        if lon.shape() != lat.shape() {
            return Err(DataSetError::shape_mismatch(
                "Cloud::new lat",
                lon.shape(),
                lat.shape(),
            ));
        }
        if lon.shape() != data.shape() {
            return Err(DataSetError::shape_mismatch(
                "Cloud::new data",
                lon.shape(),
                data.shape(),
            ));
        }

        Ok(Self { lon, lat, data })
    }

    pub fn lon(&self) -> &Array1<f64> {
        &self.lon
    }

    pub fn lat(&self) -> &Array1<f64> {
        &self.lat
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value lookup with an explicit method. Only nearest-neighbour is available for clouds.
    pub fn get_value_with(&self, lat: f64, lon: f64, method: InterpolationMethod) -> Result<f64> {
        match method {
            InterpolationMethod::Nearest => self.nearest_value(lat, lon),
            other => Err(DataSetError::NotImplemented(format!(
                "{} lookup on a Cloud; only nearest neighbour is available",
                other
            ))),
        }
    }

    fn nearest_value(&self, lat: f64, lon: f64) -> Result<f64> {
        if !lat.is_finite() || !lon.is_finite() {
            tracing::warn!("Rejecting non-finite query ({}, {})", lat, lon);
            return Err(DataSetError::OutOfBounds { lat, lon });
        }
        let query = Point::new(lon, lat);

        let mut best: Option<(usize, f64)> = None;
        for (i, (&x, &y)) in self.lon.iter().zip(self.lat.iter()).enumerate() {
            let distance = query.geodesic_distance(&Point::new(x, y));
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((i, distance)),
            }
        }

        let (imin, distance) = best.ok_or(DataSetError::EmptyDataSet)?;
        tracing::debug!(
            "Nearest sample to ({}, {}) is #{} at {:.1} m",
            lat,
            lon,
            imin,
            distance
        );
        Ok(self.data[imin])
    }
}

impl DataSet for Cloud {
    type Data = Array1<f64>;

    fn data(&self) -> &Array1<f64> {
        &self.data
    }

    fn set_data(&mut self, data: Array1<f64>) -> Result<()> {
        if data.shape() != self.lon.shape() {
            tracing::warn!(
                "Rejecting cloud data of shape {:?}; coordinates have shape {:?}",
                data.shape(),
                self.lon.shape()
            );
            return Err(DataSetError::shape_mismatch(
                "Cloud::set_data",
                self.lon.shape(),
                data.shape(),
            ));
        }
        self.data = data;
        Ok(())
    }

    fn bounds(&self) -> Result<Bounds> {
        if self.is_empty() {
            return Err(DataSetError::EmptyDataSet);
        }

        let (lon_min, lon_max) = min_max(&self.lon);
        let (lat_min, lat_max) = min_max(&self.lat);
        Ok(Bounds::new(lon_min, lon_max, lat_min, lat_max))
    }

    /// Keep only points strictly inside `bounds`; points on an edge are dropped.
    fn trim(&mut self, bounds: &Bounds) -> Result<()> {
        let inside: Vec<usize> = self
            .lon
            .iter()
            .zip(self.lat.iter())
            .enumerate()
            .filter(|(_, (x, y))| bounds.contains_strict(**x, **y))
            .map(|(i, _)| i)
            .collect();

        tracing::debug!(
            "Trimming cloud to {:?}: keeping {} of {} points",
            bounds,
            inside.len(),
            self.len()
        );

        self.lon = self.lon.select(Axis(0), &inside);
        self.lat = self.lat.select(Axis(0), &inside);
        self.data = self.data.select(Axis(0), &inside);
        Ok(())
    }

    /// Nearest-neighbour value by geodesic distance on the WGS84 ellipsoid.
    fn get_value(&self, lat: f64, lon: f64) -> Result<f64> {
        self.nearest_value(lat, lon)
    }

    fn interpolate_to_grid(
        &self,
        _geodict: &GeoDict,
        _method: InterpolationMethod,
    ) -> Result<Grid2D> {
        Err(DataSetError::NotImplemented(
            "interpolate_to_grid for Cloud".to_string(),
        ))
    }
}

fn min_max(values: &Array1<f64>) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
