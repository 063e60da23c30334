//! Burning polygon geometries into raster cells.

use std::collections::HashMap;

use geo::{BoundingRect, Geometry, Intersects, MultiPolygon, Point, Rect};
use ndarray::Array2;
use rayon::prelude::*;

use crate::error::{DataSetError, Result};
use crate::geodict::GeoDict;

/// A geometry with numeric attributes, e.g. one feature of a vector layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub geometry: Geometry<f64>,
    pub properties: HashMap<String, f64>,
}

impl Shape {
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: f64) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterizeConfig {
    /// Value of cells no shape touches.
    pub fill_value: f64,
    /// Property whose value is burned into the cells.
    pub attribute: String,
    /// Burn a cell only when the shape covers its center; otherwise any overlap counts.
    pub must_contain_center: bool,
}

impl Default for RasterizeConfig {
    fn default() -> Self {
        Self {
            fill_value: 0.0,
            attribute: "value".to_string(),
            must_contain_center: true,
        }
    }
}

struct Burn {
    polygons: MultiPolygon<f64>,
    bbox: Rect<f64>,
    value: f64,
}

impl Burn {
    fn hits_center(&self, lat: f64, lon: f64) -> bool {
        let (min, max) = (self.bbox.min(), self.bbox.max());
        if lon < min.x || lon > max.x || lat < min.y || lat > max.y {
            return false;
        }
        let center = Point::new(lon, lat);
        self.polygons.0.iter().any(|poly| poly.intersects(&center))
    }

    fn hits_cell(&self, cell: &Rect<f64>) -> bool {
        let (min, max) = (self.bbox.min(), self.bbox.max());
        if cell.max().x < min.x || cell.min().x > max.x || cell.max().y < min.y || cell.min().y > max.y
        {
            return false;
        }
        self.polygons.0.iter().any(|poly| poly.intersects(cell))
    }
}

/// Rasterize `shapes` onto `geodict`. Shapes are burned in order, so later shapes win.
pub fn rasterize(shapes: &[Shape], geodict: &GeoDict, config: &RasterizeConfig) -> Result<Array2<f64>> {
    let mut burns = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let value = *shape
            .properties
            .get(&config.attribute)
            .ok_or_else(|| DataSetError::MissingAttribute(config.attribute.clone()))?;
        let polygons = to_multipolygon(&shape.geometry)?;
        // 空のポリゴンはスキップ
        let Some(bbox) = polygons.bounding_rect() else {
            tracing::debug!("Skipping empty geometry");
            continue;
        };
        burns.push(Burn {
            polygons,
            bbox,
            value,
        });
    }

    let (ny, nx) = geodict.shape();
    let (half_dx, half_dy) = (geodict.dx() / 2.0, geodict.dy() / 2.0);
    let mut values = vec![config.fill_value; ny * nx];

    // 行単位で並列処理
    values
        .par_chunks_mut(nx)
        .enumerate()
        .for_each(|(row, cells)| {
            for (col, cell) in cells.iter_mut().enumerate() {
                let (lat, lon) = geodict.lat_lon(row as f64, col as f64);
                let hit = if config.must_contain_center {
                    burns.iter().rev().find(|b| b.hits_center(lat, lon))
                } else {
                    let rect = Rect::new(
                        (lon - half_dx, lat - half_dy),
                        (lon + half_dx, lat + half_dy),
                    );
                    burns.iter().rev().find(|b| b.hits_cell(&rect))
                };
                if let Some(burn) = hit {
                    *cell = burn.value;
                }
            }
        });

    tracing::info!(
        "Rasterized {} shapes onto {}x{} grid (must_contain_center={})",
        burns.len(),
        ny,
        nx,
        config.must_contain_center
    );

    Array2::from_shape_vec((ny, nx), values)
        .map_err(|_| DataSetError::shape_mismatch("rasterize", &[ny, nx], &[ny * nx]))
}

fn to_multipolygon(geometry: &Geometry<f64>) -> Result<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Ok(mp.clone()),
        Geometry::Rect(r) => Ok(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Ok(MultiPolygon::new(vec![t.to_polygon()])),
        other => {
            tracing::warn!("Cannot rasterize {} geometry", geometry_kind(other));
            Err(DataSetError::UnsupportedGeometry(
                geometry_kind(other).to_string(),
            ))
        }
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
