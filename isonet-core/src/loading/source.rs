//! Network data source seam and an in-memory implementation

use std::path::Path;

use geo::{BoundingRect, Geometry, LineString, MultiLineString, Rect};
use geojson::GeoJson;
use log::{debug, warn};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

use crate::Error;

/// Provides road network edges, in geographic coordinates, for a region
pub trait NetworkSource {
    /// Returns every edge whose envelope intersects `region`
    fn edges_in_region(&self, region: &Rect<f64>) -> Result<Vec<MultiLineString<f64>>, Error>;
}

type IndexedEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

pub(crate) fn envelope_of(rect: &Rect<f64>) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

pub(crate) fn aabb_of(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Network held in memory with an envelope index for region queries
#[derive(Debug, Clone)]
pub struct InMemoryNetwork {
    features: Vec<MultiLineString<f64>>,
    rtree: RTree<IndexedEnvelope>,
}

impl InMemoryNetwork {
    /// Builds the network, features without coordinates are ignored
    pub fn new(features: Vec<MultiLineString<f64>>) -> Self {
        let features: Vec<_> = features
            .into_iter()
            .filter(|feature| feature.bounding_rect().is_some())
            .collect();

        let envelopes = features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                feature
                    .bounding_rect()
                    .map(|rect| IndexedEnvelope::new(envelope_of(&rect), index))
            })
            .collect();

        Self {
            features,
            rtree: RTree::bulk_load(envelopes),
        }
    }

    pub fn from_lines(lines: Vec<LineString<f64>>) -> Self {
        Self::new(
            lines
                .into_iter()
                .map(|line| MultiLineString::new(vec![line]))
                .collect(),
        )
    }

    /// Loads LineString and MultiLineString features from a `GeoJSON` document
    pub fn from_geojson_str(source: &str) -> Result<Self, Error> {
        let geojson: GeoJson = source
            .parse()
            .map_err(|e: geojson::Error| Error::GeoJson(e.to_string()))?;
        let collection = geojson::quick_collection::<f64>(&geojson)
            .map_err(|e| Error::GeoJson(e.to_string()))?;

        let mut features = Vec::with_capacity(collection.0.len());
        let mut skipped = 0usize;
        for geometry in collection {
            match geometry {
                Geometry::LineString(line) => features.push(MultiLineString::new(vec![line])),
                Geometry::MultiLineString(lines) => features.push(lines),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("Skipped {skipped} non-linear geometries while loading the network");
        }
        debug!("Loaded {} network features", features.len());

        Ok(Self::new(features))
    }

    pub fn from_geojson_file(path: &Path) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&source)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl NetworkSource for InMemoryNetwork {
    fn edges_in_region(&self, region: &Rect<f64>) -> Result<Vec<MultiLineString<f64>>, Error> {
        let mut hits: Vec<usize> = self
            .rtree
            .locate_in_envelope_intersecting(&aabb_of(region))
            .map(|indexed| indexed.data)
            .collect();
        hits.sort_unstable();

        Ok(hits
            .into_iter()
            .map(|index| self.features[index].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, line_string};

    use super::*;

    #[test]
    fn region_query_filters_by_envelope() {
        let network = InMemoryNetwork::from_lines(vec![
            line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)],
            line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 6.0)],
            LineString::new(vec![]),
        ]);
        assert_eq!(network.len(), 2);

        let region = Rect::new(coord! { x: -1.0, y: -1.0 }, coord! { x: 2.0, y: 2.0 });
        let edges = network.edges_in_region(&region).unwrap();
        assert_eq!(edges.len(), 1);

        let far = Rect::new(coord! { x: 50.0, y: 50.0 }, coord! { x: 60.0, y: 60.0 });
        assert!(network.edges_in_region(&far).unwrap().is_empty());
    }

    #[test]
    fn loads_linear_geojson_features() {
        let source = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiLineString", "coordinates": [[[2.0, 2.0], [3.0, 3.0]], [[3.0, 3.0], [4.0, 3.0]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [9.0, 9.0]}}
            ]
        }"#;

        let network = InMemoryNetwork::from_geojson_str(source).unwrap();
        assert_eq!(network.len(), 2);
    }

    #[test]
    fn malformed_geojson_is_an_error() {
        assert!(matches!(
            InMemoryNetwork::from_geojson_str("{not json"),
            Err(Error::GeoJson(_))
        ));
    }
}
