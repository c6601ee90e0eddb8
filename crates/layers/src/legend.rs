use canvas::{DrawCommand, Group, Node, Shape, Style, TextAnchor};
use foundation::math::Vec2;

use crate::layer::{Layer, LayerId};
use crate::symbology::{RadiusScale, format_percent};

/// Offset of the legend anchor from the bottom-right corner.
const ANCHOR_INSET: Vec2 = Vec2 { x: 40.0, y: 20.0 };
const CAPTION_OFFSET_Y: f64 = 16.0;

/// Reference circles for a few ratios, stacked on a common baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    scale: RadiusScale,
    ratios: Vec<f64>,
    caption: String,
}

impl Legend {
    pub fn new(scale: RadiusScale, ratios: Vec<f64>, caption: impl Into<String>) -> Self {
        Self {
            scale,
            ratios,
            caption: caption.into(),
        }
    }

    pub fn draw(&self, viewport: Vec2) -> Vec<DrawCommand> {
        let anchor = viewport - ANCHOR_INSET;
        let mut out = Vec::with_capacity(self.ratios.len() * 2 + 1);
        let mut push = |shape: Shape, class: &str| {
            out.push(DrawCommand::Append {
                group: Group::Legend,
                node: Node::new(shape, Style::class(class)),
            });
        };

        for &ratio in &self.ratios {
            let r = self.scale.scale(ratio);
            push(
                Shape::circle(Vec2::new(anchor.x, anchor.y - r), r),
                "legend-circle",
            );
            push(
                Shape::Text {
                    at: Vec2::new(anchor.x, anchor.y + r),
                    text: format_percent(ratio),
                    anchor: TextAnchor::Middle,
                    dy_em: 1.5,
                },
                "legend-label",
            );
        }
        push(
            Shape::Text {
                at: Vec2::new(anchor.x, anchor.y + CAPTION_OFFSET_Y),
                text: self.caption.clone(),
                anchor: TextAnchor::Middle,
                dy_em: 0.0,
            },
            "legend-caption",
        );
        out
    }
}

impl Layer for Legend {
    fn id(&self) -> LayerId {
        LayerId(20)
    }

    fn group(&self) -> Group {
        Group::Legend
    }
}

#[cfg(test)]
mod tests {
    use super::Legend;
    use crate::symbology::RadiusScale;
    use canvas::{DrawCommand, Shape};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn shapes(cmds: &[DrawCommand]) -> Vec<Shape> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCommand::Append { node, .. } => Some(node.shape.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn circles_sit_on_the_anchor_baseline() {
        let legend = Legend::new(RadiusScale::new([0.0, 40.0]), vec![0.0, 1.0], "relative abundance");
        let shapes = shapes(&legend.draw(Vec2::new(500.0, 400.0)));
        assert_eq!(shapes.len(), 5);
        assert_eq!(shapes[0], Shape::circle(Vec2::new(460.0, 380.0), 0.0));
        assert_eq!(shapes[2], Shape::circle(Vec2::new(460.0, 340.0), 40.0));
        let Shape::Text { text, .. } = &shapes[3] else {
            panic!("expected label");
        };
        assert_eq!(text, "100%");
        let Shape::Text { text, at, .. } = &shapes[4] else {
            panic!("expected caption");
        };
        assert_eq!(text, "relative abundance");
        assert_eq!(*at, Vec2::new(460.0, 396.0));
    }
}
