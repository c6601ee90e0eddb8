use foundation::bounds::Aabb2;
use foundation::math::LonLat;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum GeoShape {
    Point(LonLat),
    MultiPoint(Vec<LonLat>),
    LineString(Vec<LonLat>),
    MultiLineString(Vec<Vec<LonLat>>),
    Polygon(Vec<Vec<LonLat>>),
    MultiPolygon(Vec<Vec<Vec<LonLat>>>),
    Collection(Vec<GeoShape>),
}

impl GeoShape {
    pub fn kind(&self) -> &'static str {
        match self {
            GeoShape::Point(_) => "Point",
            GeoShape::MultiPoint(_) => "MultiPoint",
            GeoShape::LineString(_) => "LineString",
            GeoShape::MultiLineString(_) => "MultiLineString",
            GeoShape::Polygon(_) => "Polygon",
            GeoShape::MultiPolygon(_) => "MultiPolygon",
            GeoShape::Collection(_) => "GeometryCollection",
        }
    }

    /// Visits every vertex in document order.
    pub fn for_each_position(&self, f: &mut impl FnMut(LonLat)) {
        match self {
            GeoShape::Point(p) => f(*p),
            GeoShape::MultiPoint(ps) | GeoShape::LineString(ps) => ps.iter().copied().for_each(f),
            GeoShape::MultiLineString(lines) | GeoShape::Polygon(lines) => lines
                .iter()
                .flat_map(|l| l.iter().copied())
                .for_each(f),
            GeoShape::MultiPolygon(polys) => polys
                .iter()
                .flatten()
                .flat_map(|ring| ring.iter().copied())
                .for_each(f),
            GeoShape::Collection(shapes) => {
                for shape in shapes {
                    shape.for_each_position(f);
                }
            }
        }
    }

    /// Longitude/latitude bounds (x = lon, y = lat).
    pub fn bounds(&self) -> Aabb2 {
        let mut b = Aabb2::empty();
        self.for_each_position(&mut |p| b.extend(p.lon_deg, p.lat_deg));
        b
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: GeoShape,
}

impl Feature {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Union of the feature bounds; empty when there are no vertices.
    pub fn bounds(&self) -> Aabb2 {
        self.features
            .iter()
            .map(|f| f.geometry.bounds())
            .fold(Aabb2::empty(), |acc, b| acc.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::{Feature, FeatureCollection, GeoShape};
    use foundation::math::LonLat;

    fn feature(geometry: GeoShape) -> Feature {
        Feature {
            id: None,
            properties: Default::default(),
            geometry,
        }
    }

    #[test]
    fn bounds_cover_nested_rings() {
        let poly = GeoShape::MultiPolygon(vec![vec![vec![
            LonLat::new(-73.0, 41.0),
            LonLat::new(-72.0, 41.0),
            LonLat::new(-72.0, 42.0),
            LonLat::new(-73.0, 41.0),
        ]]]);
        let b = poly.bounds();
        assert_eq!(b.min, [-73.0, 41.0]);
        assert_eq!(b.max, [-72.0, 42.0]);
    }

    #[test]
    fn collection_bounds_union_features() {
        let fc = FeatureCollection {
            features: vec![
                feature(GeoShape::Point(LonLat::new(-71.8, 41.3))),
                feature(GeoShape::LineString(vec![
                    LonLat::new(-73.7, 41.9),
                    LonLat::new(-72.5, 42.05),
                ])),
            ],
        };
        let b = fc.bounds();
        assert_eq!(b.min, [-73.7, 41.3]);
        assert_eq!(b.max, [-71.8, 42.05]);
        assert!(FeatureCollection::default().bounds().is_empty());
    }
}
