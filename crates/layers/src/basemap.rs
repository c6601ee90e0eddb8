use canvas::{DrawCommand, Group, Node, Shape, Style, fmt_num};
use formats::{FeatureCollection, GeoShape};
use foundation::math::{LonLat, Projection};

use crate::layer::{Layer, LayerId};

/// Radius of the circle drawn for point geometries.
const POINT_RADIUS: f64 = 4.5;

/// One reference geometry layer (towns, waterbody polygons or lines).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BasemapLayer {
    id: LayerId,
    group: Group,
    class: &'static str,
}

impl BasemapLayer {
    pub fn new(id: u64, group: Group, class: &'static str) -> Self {
        Self {
            id: LayerId(id),
            group,
            class,
        }
    }

    pub fn towns() -> Self {
        Self::new(1, Group::Towns, "town")
    }

    pub fn water_polygons() -> Self {
        Self::new(2, Group::WaterPolygons, "riverPoly")
    }

    pub fn water_lines() -> Self {
        Self::new(3, Group::WaterLines, "riverLine")
    }

    pub fn class(&self) -> &'static str {
        self.class
    }

    /// One path per feature; features with no drawable vertices are skipped.
    pub fn draw(&self, features: &FeatureCollection, projection: &dyn Projection) -> Vec<DrawCommand> {
        features
            .features
            .iter()
            .filter_map(|feature| {
                let d = path_data(&feature.geometry, projection);
                (!d.is_empty()).then(|| DrawCommand::Append {
                    group: self.group,
                    node: Node::new(Shape::Path { d }, Style::class(self.class)),
                })
            })
            .collect()
    }
}

impl Layer for BasemapLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn group(&self) -> Group {
        self.group
    }
}

/// SVG path data for a shape in screen space.
pub fn path_data(shape: &GeoShape, projection: &dyn Projection) -> String {
    let mut d = String::new();
    write_shape(&mut d, shape, projection);
    d
}

fn write_shape(d: &mut String, shape: &GeoShape, projection: &dyn Projection) {
    match shape {
        GeoShape::Point(p) => write_point(d, *p, projection),
        GeoShape::MultiPoint(ps) => ps.iter().for_each(|p| write_point(d, *p, projection)),
        GeoShape::LineString(line) => write_run(d, line, false, projection),
        GeoShape::MultiLineString(lines) => lines
            .iter()
            .for_each(|l| write_run(d, l, false, projection)),
        GeoShape::Polygon(rings) => rings
            .iter()
            .for_each(|r| write_run(d, r, true, projection)),
        GeoShape::MultiPolygon(polys) => polys
            .iter()
            .flatten()
            .for_each(|r| write_run(d, r, true, projection)),
        GeoShape::Collection(shapes) => shapes
            .iter()
            .for_each(|s| write_shape(d, s, projection)),
    }
}

fn write_run(d: &mut String, positions: &[LonLat], closed: bool, projection: &dyn Projection) {
    // A closed ring repeats its first vertex; `Z` closes it instead.
    let open = match positions {
        [first, .., last] if closed && first == last => &positions[..positions.len() - 1],
        _ => positions,
    };
    let points: Vec<_> = open
        .iter()
        .map(|p| projection.project(*p))
        .filter(|p| p.is_finite())
        .collect();
    if points.len() < 2 {
        return;
    }
    for (i, p) in points.iter().enumerate() {
        d.push(if i == 0 { 'M' } else { 'L' });
        d.push_str(&fmt_num(p.x));
        d.push(',');
        d.push_str(&fmt_num(p.y));
    }
    if closed {
        d.push('Z');
    }
}

fn write_point(d: &mut String, position: LonLat, projection: &dyn Projection) {
    let p = projection.project(position);
    if !p.is_finite() {
        return;
    }
    let r = fmt_num(POINT_RADIUS);
    let r2 = fmt_num(2.0 * POINT_RADIUS);
    d.push_str(&format!(
        "M{},{}m0,{r}a{r},{r} 0 1,1 0,-{r2}a{r},{r} 0 1,1 0,{r2}z",
        fmt_num(p.x),
        fmt_num(p.y)
    ));
}
