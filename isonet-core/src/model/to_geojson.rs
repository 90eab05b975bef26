use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use super::result::{IsochroneLine, IsochroneResult, IsochroneVertex};
use crate::Error;

impl IsochroneResult {
    /// Converts the service area polygon to a `GeoJSON` Feature.
    pub fn polygon_feature(&self) -> Result<Feature, Error> {
        let geometry = Geometry::new(GeoJsonValue::from(&self.polygon));

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "id": self.id,
                "radius": self.reach_distance,
                "bufsize": self.buffer_size,
                "seedcoord": self.seed_coord(),
                "calcstatus": self.status,
                "roadarea": self.road_area,
                "error": self.failure.as_ref().map(|f| &f.message),
            }
        });

        serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJson(e.to_string()))
    }

    pub fn line_features(&self) -> Result<Vec<Feature>, Error> {
        self.lines
            .iter()
            .map(|line| self.line_feature(line))
            .collect()
    }

    pub fn node_features(&self) -> Result<Vec<Feature>, Error> {
        self.nodes
            .iter()
            .map(|node| self.node_feature(node))
            .collect()
    }

    /// Converts the complete result (polygon, lines and nodes) to a
    /// `GeoJSON` `FeatureCollection`.
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let mut features = vec![self.polygon_feature()?];
        features.extend(self.line_features()?);
        features.extend(self.node_features()?);

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::GeoJson(e.to_string()))
    }

    fn line_feature(&self, line: &IsochroneLine) -> Result<Feature, Error> {
        let geometry = Geometry::new(GeoJsonValue::from(&line.geometry));

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "seedcoord": self.seed_coord(),
                "ischopped": line.is_chopped,
                "isleaf": line.is_leaf,
                "len": line.length,
                "travdist": line.traverse_distance,
                "radius": self.reach_distance,
                "bufsize": self.buffer_size,
            }
        });

        serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJson(e.to_string()))
    }

    fn node_feature(&self, node: &IsochroneVertex) -> Result<Feature, Error> {
        let geometry = Geometry::new(GeoJsonValue::from(&node.geometry));

        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "seedcoord": self.seed_coord(),
                "nodeid": node.node_id,
                "isleaf": node.is_leaf,
                "travdist": node.traverse_distance,
                "radius": self.reach_distance,
                "bufsize": self.buffer_size,
            }
        });

        serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJson(e.to_string()))
    }
}
