use foundation::math::LonLat;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::geometry::{Feature, FeatureCollection, GeoShape};

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("topology JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a TopoJSON Topology")]
    NotATopology,
    #[error("topology has no object named {0:?}")]
    MissingObject(String),
    #[error("arc index {0} out of range")]
    ArcIndex(i64),
    #[error("invalid {context}: {reason}")]
    Invalid {
        context: &'static str,
        reason: String,
    },
}

fn invalid(context: &'static str, reason: impl Into<String>) -> TopologyError {
    TopologyError::Invalid {
        context,
        reason: reason.into(),
    }
}

/// Quantization transform: `position = delta-decoded * scale + translate`.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> LonLat {
        LonLat::new(
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

/// A decoded TopoJSON topology.
///
/// Arcs are decoded to absolute positions once on load; objects stay as JSON
/// until a feature collection is requested.
#[derive(Debug, Clone)]
pub struct Topology {
    transform: Option<Transform>,
    arcs: Vec<Vec<LonLat>>,
    objects: Map<String, Value>,
}

impl Topology {
    pub fn parse(payload: &str) -> Result<Self, TopologyError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, TopologyError> {
        let Value::Object(mut root) = value else {
            return Err(TopologyError::NotATopology);
        };
        if root.get("type").and_then(Value::as_str) != Some("Topology") {
            return Err(TopologyError::NotATopology);
        }

        let transform = match root.get("transform") {
            None | Some(Value::Null) => None,
            Some(t) => Some(parse_transform(t)?),
        };

        let arcs = match root.get("arcs") {
            Some(Value::Array(arcs)) => arcs
                .iter()
                .map(|arc| decode_arc(arc, transform.as_ref()))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
            Some(_) => return Err(invalid("arcs", "must be an array")),
        };

        let objects = match root.remove("objects") {
            Some(Value::Object(objects)) => objects,
            _ => return Err(invalid("objects", "must be an object")),
        };

        Ok(Self {
            transform,
            arcs,
            objects,
        })
    }

    pub fn object_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.objects.keys().map(String::as_str)
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Converts the named object to features.
    ///
    /// A `GeometryCollection` yields one feature per member geometry; any
    /// other object yields a single feature. Null geometries are skipped.
    pub fn feature_collection(&self, object_name: &str) -> Result<FeatureCollection, TopologyError> {
        let object = self
            .objects
            .get(object_name)
            .ok_or_else(|| TopologyError::MissingObject(object_name.to_string()))?;

        let members: Vec<&Value> = match object.get("type").and_then(Value::as_str) {
            Some("GeometryCollection") => object
                .get("geometries")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("GeometryCollection", "missing geometries"))?
                .iter()
                .collect(),
            _ => vec![object],
        };

        let mut features = Vec::with_capacity(members.len());
        for member in members {
            let Some(geometry) = self.geometry(member)? else {
                continue;
            };
            let id = match member.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            let properties = member
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            features.push(Feature {
                id,
                properties,
                geometry,
            });
        }
        Ok(FeatureCollection { features })
    }

    fn geometry(&self, value: &Value) -> Result<Option<GeoShape>, TopologyError> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("geometry", "must be an object"))?;
        let ty = match obj.get("type") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(ty)) => ty.as_str(),
            Some(_) => return Err(invalid("geometry", "type must be a string")),
        };
        let coords = || {
            obj.get("coordinates")
                .ok_or_else(|| invalid("geometry", format!("{ty} missing coordinates")))
        };
        let arcs = || {
            obj.get("arcs")
                .ok_or_else(|| invalid("geometry", format!("{ty} missing arcs")))
        };

        let shape = match ty {
            "Point" => GeoShape::Point(self.point(coords()?)?),
            "MultiPoint" => GeoShape::MultiPoint(
                as_array(coords()?, "MultiPoint")?
                    .iter()
                    .map(|p| self.point(p))
                    .collect::<Result<_, _>>()?,
            ),
            "LineString" => GeoShape::LineString(self.line(arcs()?)?),
            "MultiLineString" => GeoShape::MultiLineString(
                as_array(arcs()?, "MultiLineString")?
                    .iter()
                    .map(|l| self.line(l))
                    .collect::<Result<_, _>>()?,
            ),
            "Polygon" => GeoShape::Polygon(self.polygon(arcs()?)?),
            "MultiPolygon" => GeoShape::MultiPolygon(
                as_array(arcs()?, "MultiPolygon")?
                    .iter()
                    .map(|p| self.polygon(p))
                    .collect::<Result<_, _>>()?,
            ),
            "GeometryCollection" => {
                let members = obj
                    .get("geometries")
                    .and_then(Value::as_array)
                    .ok_or_else(|| invalid("GeometryCollection", "missing geometries"))?;
                let mut shapes = Vec::with_capacity(members.len());
                for member in members {
                    if let Some(shape) = self.geometry(member)? {
                        shapes.push(shape);
                    }
                }
                GeoShape::Collection(shapes)
            }
            other => return Err(invalid("geometry", format!("unsupported type {other}"))),
        };
        Ok(Some(shape))
    }

    /// Point coordinates are quantized but never delta-encoded.
    fn point(&self, value: &Value) -> Result<LonLat, TopologyError> {
        let [x, y] = pair(value, "position")?;
        Ok(match &self.transform {
            Some(t) => t.apply(x, y),
            None => LonLat::new(x, y),
        })
    }

    /// Stitches arcs end to end; consecutive arcs share their joining vertex.
    fn stitch(&self, refs: &Value) -> Result<Vec<LonLat>, TopologyError> {
        let mut points: Vec<LonLat> = Vec::new();
        for r in as_array(refs, "arc list")? {
            let i = r
                .as_i64()
                .ok_or_else(|| invalid("arc list", "arc reference must be an integer"))?;
            let (index, reversed) = if i < 0 { (!i, true) } else { (i, false) };
            let arc = usize::try_from(index)
                .ok()
                .and_then(|idx| self.arcs.get(idx))
                .ok_or(TopologyError::ArcIndex(i))?;
            if !points.is_empty() {
                points.pop();
            }
            if reversed {
                points.extend(arc.iter().rev().copied());
            } else {
                points.extend(arc.iter().copied());
            }
        }
        Ok(points)
    }

    fn line(&self, refs: &Value) -> Result<Vec<LonLat>, TopologyError> {
        let mut points = self.stitch(refs)?;
        if points.len() == 1 {
            points.push(points[0]);
        }
        Ok(points)
    }

    fn ring(&self, refs: &Value) -> Result<Vec<LonLat>, TopologyError> {
        let mut points = self.stitch(refs)?;
        if let Some(&first) = points.first() {
            while points.len() < 4 {
                points.push(first);
            }
        }
        Ok(points)
    }

    fn polygon(&self, rings: &Value) -> Result<Vec<Vec<LonLat>>, TopologyError> {
        as_array(rings, "Polygon")?
            .iter()
            .map(|r| self.ring(r))
            .collect()
    }
}

fn as_array<'a>(value: &'a Value, context: &'static str) -> Result<&'a Vec<Value>, TopologyError> {
    value
        .as_array()
        .ok_or_else(|| invalid(context, "must be an array"))
}

fn pair(value: &Value, context: &'static str) -> Result<[f64; 2], TopologyError> {
    let arr = as_array(value, context)?;
    if arr.len() < 2 {
        return Err(invalid(context, "needs two components"));
    }
    let x = arr[0]
        .as_f64()
        .ok_or_else(|| invalid(context, "component must be a number"))?;
    let y = arr[1]
        .as_f64()
        .ok_or_else(|| invalid(context, "component must be a number"))?;
    Ok([x, y])
}

fn parse_transform(value: &Value) -> Result<Transform, TopologyError> {
    let scale = value
        .get("scale")
        .ok_or_else(|| invalid("transform", "missing scale"))?;
    let translate = value
        .get("translate")
        .ok_or_else(|| invalid("transform", "missing translate"))?;
    Ok(Transform {
        scale: pair(scale, "transform scale")?,
        translate: pair(translate, "transform translate")?,
    })
}

/// Quantized arcs are delta-encoded: each position is relative to the
/// previous one.
fn decode_arc(value: &Value, transform: Option<&Transform>) -> Result<Vec<LonLat>, TopologyError> {
    let positions = as_array(value, "arc")?;
    let mut out = Vec::with_capacity(positions.len());
    let (mut x, mut y) = (0.0, 0.0);
    for p in positions {
        let [px, py] = pair(p, "arc position")?;
        match transform {
            Some(t) => {
                x += px;
                y += py;
                out.push(t.apply(x, y));
            }
            None => out.push(LonLat::new(px, py)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{Topology, TopologyError};
    use crate::geometry::GeoShape;
    use foundation::math::LonLat;
    use pretty_assertions::assert_eq;

    // Two squares sharing the edge x = 1, quantized on an integer grid.
    const TOWNS: &str = r#"{
        "type": "Topology",
        "transform": { "scale": [0.5, 0.25], "translate": [-73.0, 41.0] },
        "arcs": [
            [[1, 0], [0, 1]],
            [[1, 1], [-1, 0], [0, -1], [1, 0]],
            [[1, 0], [1, 0], [0, 1], [-1, 0]]
        ],
        "objects": {
            "CTTowns": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "arcs": [[0, 1]], "id": 1, "properties": { "TOWN": "Lyme" } },
                    { "type": "Polygon", "arcs": [[2, -1]], "properties": { "TOWN": "Salem" } },
                    { "type": null }
                ]
            }
        }
    }"#;

    fn q(x: f64, y: f64) -> LonLat {
        LonLat::new(-73.0 + x * 0.5, 41.0 + y * 0.25)
    }

    #[test]
    fn decodes_quantized_polygons_and_skips_null_geometries() {
        let topo = Topology::parse(TOWNS).unwrap();
        assert_eq!(topo.arc_count(), 3);

        let towns = topo.feature_collection("CTTowns").unwrap();
        assert_eq!(towns.len(), 2);
        assert_eq!(towns.features[0].id.as_deref(), Some("1"));
        assert_eq!(towns.features[1].property_str("TOWN"), Some("Salem"));

        let GeoShape::Polygon(rings) = &towns.features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![q(1.0, 0.0), q(1.0, 1.0), q(0.0, 1.0), q(0.0, 0.0), q(1.0, 0.0)]
        );
    }

    #[test]
    fn negative_arc_reference_walks_the_arc_backwards() {
        let topo = Topology::parse(TOWNS).unwrap();
        let towns = topo.feature_collection("CTTowns").unwrap();
        let GeoShape::Polygon(rings) = &towns.features[1].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![q(1.0, 0.0), q(2.0, 0.0), q(2.0, 1.0), q(1.0, 1.0), q(1.0, 0.0)]
        );
    }

    #[test]
    fn untransformed_lines_and_points() {
        let payload = r#"{
            "type": "Topology",
            "arcs": [[[-72.0, 41.5], [-71.9, 41.6]], [[-71.9, 41.6], [-71.8, 41.4]]],
            "objects": {
                "StateWaterbodyLine": {
                    "type": "GeometryCollection",
                    "geometries": [
                        { "type": "LineString", "arcs": [0, 1] },
                        { "type": "Point", "coordinates": [-72.2, 41.3] }
                    ]
                }
            }
        }"#;
        let topo = Topology::parse(payload).unwrap();
        let lines = topo.feature_collection("StateWaterbodyLine").unwrap();
        assert_eq!(
            lines.features[0].geometry,
            GeoShape::LineString(vec![
                LonLat::new(-72.0, 41.5),
                LonLat::new(-71.9, 41.6),
                LonLat::new(-71.8, 41.4),
            ])
        );
        assert_eq!(
            lines.features[1].geometry,
            GeoShape::Point(LonLat::new(-72.2, 41.3))
        );
    }

    #[test]
    fn reports_missing_objects_and_bad_arcs() {
        let topo = Topology::parse(TOWNS).unwrap();
        assert!(matches!(
            topo.feature_collection("Nope"),
            Err(TopologyError::MissingObject(name)) if name == "Nope"
        ));

        let bad = r#"{"type":"Topology","arcs":[],"objects":{"o":{"type":"LineString","arcs":[3]}}}"#;
        let topo = Topology::parse(bad).unwrap();
        assert!(matches!(
            topo.feature_collection("o"),
            Err(TopologyError::ArcIndex(3))
        ));

        assert!(matches!(
            Topology::parse(r#"{"type":"FeatureCollection","features":[]}"#),
            Err(TopologyError::NotATopology)
        ));
    }
}
