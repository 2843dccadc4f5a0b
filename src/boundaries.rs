use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::BoundaryError;

/// A `(longitude, latitude)` pair in degrees.
pub type LngLat = (f64, f64);
pub type Ring = Vec<LngLat>;
/// Outer ring first, holes after it.
pub type Polygon = Vec<Ring>;

/// One country's geometry plus its descriptive properties.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    /// ISO 3166-1 numeric id, when the dataset carries one.
    pub id: Option<u16>,
    pub name: String,
    pub polygons: Vec<Polygon>,
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl Extent {
    /// Bounding-box center as `(lat, lng)`, longitude folded back into range.
    pub fn centroid(&self) -> (f64, f64) {
        let lng = (self.min_lng + self.max_lng) / 2.0;
        (
            (self.min_lat + self.max_lat) / 2.0,
            if lng > 180.0 { lng - 360.0 } else { lng },
        )
    }

    fn around(mut points: impl Iterator<Item = LngLat>) -> Option<Extent> {
        let (lng, lat) = points.next()?;
        let mut extent = Extent {
            min_lng: lng,
            max_lng: lng,
            min_lat: lat,
            max_lat: lat,
        };
        for (lng, lat) in points {
            extent.min_lng = extent.min_lng.min(lng);
            extent.max_lng = extent.max_lng.max(lng);
            extent.min_lat = extent.min_lat.min(lat);
            extent.max_lat = extent.max_lat.max(lat);
        }
        Some(extent)
    }

    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    fn contains(&self, lat: f64, lng: f64) -> bool {
        lng >= self.min_lng && lng <= self.max_lng && lat >= self.min_lat && lat <= self.max_lat
    }
}

impl BoundaryFeature {
    fn points(&self) -> impl Iterator<Item = LngLat> + '_ {
        self.polygons.iter().flatten().flatten().copied()
    }

    pub fn extent(&self) -> Option<Extent> {
        Extent::around(self.points())
    }

    /// Extent for aiming the camera. Features split at the antimeridian are
    /// measured across it, so `max_lng` may exceed 180 there.
    pub fn view_extent(&self) -> Option<Extent> {
        let extent = self.extent()?;
        if extent.width() <= 180.0 {
            return Some(extent);
        }
        let shifted = Extent::around(
            self.points()
                .map(|(lng, lat)| (if lng < 0.0 { lng + 360.0 } else { lng }, lat)),
        )?;
        Some(if shifted.width() < extent.width() {
            shifted
        } else {
            extent
        })
    }

    /// Even-odd containment test; holes fall out of the rule naturally.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        match self.extent() {
            Some(extent) if extent.contains(lat, lng) => {}
            _ => return false,
        }
        self.polygons.iter().any(|polygon| {
            polygon
                .iter()
                .filter(|ring| ring_contains(ring, lat, lng))
                .count()
                % 2
                == 1
        })
    }
}

fn ring_contains(ring: &[LngLat], lat: f64, lng: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lng < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Index of the first feature whose polygons contain the point.
pub fn feature_at(features: &[BoundaryFeature], lat: f64, lng: f64) -> Option<usize> {
    features.iter().position(|f| f.contains(lat, lng))
}

pub async fn fetch_boundaries(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<BoundaryFeature>, BoundaryError> {
    log::info!("Fetching country boundaries from {}", url);
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(BoundaryError::Status(response.status()));
    }
    let text = response.text().await?;
    let features = parse_boundaries(&text)?;
    log::info!("Loaded {} country boundaries", features.len());
    Ok(features)
}

/// Decodes either a TopoJSON topology or a GeoJSON feature collection.
pub fn parse_boundaries(text: &str) -> Result<Vec<BoundaryFeature>, BoundaryError> {
    let document: Value = serde_json::from_str(text)?;
    let kind = document
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match kind.as_str() {
        "Topology" => {
            let topology: Topology = serde_json::from_value(document)?;
            topology.into_features()
        }
        "FeatureCollection" => {
            let collection: FeatureCollection = serde_json::from_value(document)?;
            Ok(collection.into_features())
        }
        _ => Err(BoundaryError::UnsupportedDocument(kind)),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(transparent)]
struct Properties(serde_json::Map<String, Value>);

impl Properties {
    fn name(&self) -> String {
        ["name", "NAME", "ADMIN"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    }
}

fn feature_name(properties: Option<Properties>) -> String {
    properties.map(|p| p.name()).unwrap_or_default()
}

fn parse_id(id: Option<&Value>) -> Option<u16> {
    match id? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        _ => None,
    }
}

// --- TopoJSON -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    objects: HashMap<String, TopoGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<TopoGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Properties>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Properties>,
    },
    #[serde(other)]
    Other,
}

impl Topology {
    fn into_features(self) -> Result<Vec<BoundaryFeature>, BoundaryError> {
        let arcs = decode_arcs(&self.arcs, self.transform.as_ref());
        let mut objects = self.objects;
        let root = match objects.remove("countries") {
            Some(root) => root,
            None => {
                let name = objects
                    .keys()
                    .min()
                    .cloned()
                    .ok_or_else(|| BoundaryError::MissingObject("countries".to_string()))?;
                objects
                    .remove(&name)
                    .ok_or(BoundaryError::MissingObject(name))?
            }
        };

        let mut features = Vec::new();
        collect_topo_features(root, &arcs, &mut features)?;
        Ok(features)
    }
}

fn collect_topo_features(
    geometry: TopoGeometry,
    arcs: &[Ring],
    out: &mut Vec<BoundaryFeature>,
) -> Result<(), BoundaryError> {
    match geometry {
        TopoGeometry::GeometryCollection { geometries } => {
            for geometry in geometries {
                collect_topo_features(geometry, arcs, out)?;
            }
        }
        TopoGeometry::Polygon { arcs: rings, id, properties } => {
            let polygon = stitch_polygon(arcs, &rings)?;
            push_feature(out, parse_id(id.as_ref()), feature_name(properties), vec![polygon]);
        }
        TopoGeometry::MultiPolygon { arcs: polygons, id, properties } => {
            let polygons = polygons
                .iter()
                .map(|rings| stitch_polygon(arcs, rings))
                .collect::<Result<Vec<_>, _>>()?;
            push_feature(out, parse_id(id.as_ref()), feature_name(properties), polygons);
        }
        TopoGeometry::Other => {}
    }
    Ok(())
}

/// Quantized topologies store delta-encoded integer positions.
fn decode_arcs(raw: &[Vec<Vec<f64>>], transform: Option<&Transform>) -> Vec<Ring> {
    raw.iter()
        .map(|arc| {
            let (mut x, mut y) = (0.0, 0.0);
            arc.iter()
                .filter(|position| position.len() >= 2)
                .map(|position| match transform {
                    Some(t) => {
                        x += position[0];
                        y += position[1];
                        (x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1])
                    }
                    None => (position[0], position[1]),
                })
                .collect()
        })
        .collect()
}

fn stitch_polygon(arcs: &[Ring], rings: &[Vec<i64>]) -> Result<Polygon, BoundaryError> {
    rings.iter().map(|indices| stitch_ring(arcs, indices)).collect()
}

/// Joins arcs end to start; a negative index `!i` means arc `i` reversed.
fn stitch_ring(arcs: &[Ring], indices: &[i64]) -> Result<Ring, BoundaryError> {
    let mut ring: Ring = Vec::new();
    for &index in indices {
        let (arc_index, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(arc_index)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(BoundaryError::ArcOutOfRange(index))?;

        // consecutive arcs share their joining point
        let skip = usize::from(!ring.is_empty());
        if reversed {
            ring.extend(arc.iter().rev().skip(skip).copied());
        } else {
            ring.extend(arc.iter().skip(skip).copied());
        }
    }
    Ok(ring)
}

// --- GeoJSON --------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<GeoFeature>,
}

#[derive(Debug, Deserialize)]
struct GeoFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Properties>,
    geometry: Option<GeoGeometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Other,
}

fn to_ring(positions: &[Vec<f64>]) -> Ring {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| (p[0], p[1]))
        .collect()
}

impl FeatureCollection {
    fn into_features(self) -> Vec<BoundaryFeature> {
        let mut out = Vec::new();
        for feature in self.features {
            let polygons: Vec<Polygon> = match feature.geometry {
                Some(GeoGeometry::Polygon { coordinates }) => {
                    vec![coordinates.iter().map(|r| to_ring(r)).collect()]
                }
                Some(GeoGeometry::MultiPolygon { coordinates }) => coordinates
                    .iter()
                    .map(|polygon| polygon.iter().map(|r| to_ring(r)).collect())
                    .collect(),
                _ => continue,
            };
            let name = feature_name(feature.properties);
            push_feature(&mut out, parse_id(feature.id.as_ref()), name, polygons);
        }
        out
    }
}

fn push_feature(out: &mut Vec<BoundaryFeature>, id: Option<u16>, name: String, polygons: Vec<Polygon>) {
    if polygons.iter().flatten().all(|ring| ring.is_empty()) {
        log::debug!("Skipping boundary `{}` without coordinates", name);
        return;
    }
    out.push(BoundaryFeature { id, name, polygons });
}

#[cfg(test)]
mod tests {
    use super::*;

    // A 10x10 square, quantized and delta-encoded.
    const SQUARE_TOPOLOGY: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [1, 1], "translate": [0, 0] },
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "arcs": [[0]], "id": "840", "properties": { "name": "Square" } },
                    { "type": "Point", "coordinates": [1, 1] }
                ]
            }
        },
        "arcs": [[[0, 0], [10, 0], [0, 10], [-10, 0], [0, -10]]]
    }"#;

    #[test]
    fn decodes_quantized_topology() {
        let features = parse_boundaries(SQUARE_TOPOLOGY).unwrap();
        assert_eq!(features.len(), 1);
        let square = &features[0];
        assert_eq!(square.id, Some(840));
        assert_eq!(square.name, "Square");
        assert_eq!(
            square.polygons[0][0],
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]
        );
    }

    #[test]
    fn stitches_reversed_arcs_without_duplicating_joints() {
        let doc = r#"{
            "type": "Topology",
            "objects": {
                "land": { "type": "MultiPolygon", "arcs": [[[0, -2]]], "properties": { "name": "Joined" } }
            },
            "arcs": [
                [[0, 0], [10, 0], [10, 10]],
                [[0, 0], [0, 10], [10, 10]]
            ]
        }"#;
        let features = parse_boundaries(doc).unwrap();
        assert_eq!(features[0].id, None);
        assert_eq!(
            features[0].polygons[0][0],
            vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]
        );
    }

    #[test]
    fn rejects_out_of_range_arcs() {
        let doc = r#"{
            "type": "Topology",
            "objects": { "countries": { "type": "Polygon", "arcs": [[3]] } },
            "arcs": []
        }"#;
        assert!(matches!(parse_boundaries(doc), Err(BoundaryError::ArcOutOfRange(3))));
    }

    #[test]
    fn rejects_unknown_documents() {
        assert!(matches!(
            parse_boundaries(r#"{ "type": "Feature" }"#),
            Err(BoundaryError::UnsupportedDocument(kind)) if kind == "Feature"
        ));
    }

    #[test]
    fn decodes_geojson_collections() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "id": 250,
                    "properties": { "NAME": "Ring" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [
                            [[0, 0], [20, 0], [20, 20], [0, 20], [0, 0]],
                            [[5, 5], [15, 5], [15, 15], [5, 15], [5, 5]]
                        ]
                    }
                },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        }"#;
        let features = parse_boundaries(doc).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id, Some(250));
        assert_eq!(features[0].name, "Ring");

        // inside the outer ring but also inside the hole
        assert!(!features[0].contains(10.0, 10.0));
        assert!(features[0].contains(2.0, 2.0));
    }

    #[test]
    fn extent_reports_centroid_and_size() {
        let features = parse_boundaries(SQUARE_TOPOLOGY).unwrap();
        let extent = features[0].extent().unwrap();
        assert_eq!(extent.centroid(), (5.0, 5.0));
        assert_eq!(extent.width(), 10.0);
        assert_eq!(extent.height(), 10.0);
    }

    #[test]
    fn view_extent_spans_the_antimeridian() {
        let fiji = BoundaryFeature {
            id: Some(242),
            name: "Fiji".to_string(),
            polygons: vec![
                vec![vec![(177.0, -18.0), (180.0, -18.0), (180.0, -16.0), (177.0, -16.0), (177.0, -18.0)]],
                vec![vec![(-180.0, -17.0), (-179.0, -17.0), (-179.0, -16.0), (-180.0, -16.0), (-180.0, -17.0)]],
            ],
        };
        assert_eq!(fiji.extent().unwrap().width(), 360.0);

        let extent = fiji.view_extent().unwrap();
        assert_eq!(extent.width(), 4.0);
        assert_eq!(extent.centroid(), (-17.0, 179.0));

        // hit testing still works on the raw coordinates
        assert!(fiji.contains(-16.5, -179.5));
        assert!(fiji.contains(-17.0, 178.0));
    }

    #[test]
    fn view_extent_matches_extent_elsewhere() {
        let features = parse_boundaries(SQUARE_TOPOLOGY).unwrap();
        assert_eq!(features[0].view_extent(), features[0].extent());
    }

    #[test]
    fn hit_test_finds_containing_feature() {
        let features = parse_boundaries(SQUARE_TOPOLOGY).unwrap();
        assert_eq!(feature_at(&features, 5.0, 5.0), Some(0));
        assert_eq!(feature_at(&features, 5.0, 15.0), None);
        assert_eq!(feature_at(&features, -1.0, 5.0), None);
    }
}
