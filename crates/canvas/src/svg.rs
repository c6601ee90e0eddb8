use std::collections::BTreeMap;
use std::fmt::Write;

use crate::command::{DrawCommand, Group, Node, Shape, escape_text, fmt_num};
use crate::surface::Canvas;

/// Retained SVG document.
///
/// Nodes keep their append order within a group; `Raise` moves a node to
/// the end of its group so it paints last.
#[derive(Debug, Default, Clone)]
pub struct SvgCanvas {
    groups: BTreeMap<Group, Vec<Node>>,
}

impl SvgCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self, group: Group) -> &[Node] {
        self.groups.get(&group).map_or(&[], Vec::as_slice)
    }

    pub fn node_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.groups
            .values()
            .flatten()
            .find(|n| n.id.as_deref() == Some(id))
    }

    fn locate(&self, id: &str) -> Option<(Group, usize)> {
        self.groups.iter().find_map(|(group, nodes)| {
            nodes
                .iter()
                .position(|n| n.id.as_deref() == Some(id))
                .map(|i| (*group, i))
        })
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.groups
            .values_mut()
            .flatten()
            .find(|n| n.id.as_deref() == Some(id))
    }

    pub fn to_svg_string(&self, width: f64, height: f64) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = fmt_num(width),
            h = fmt_num(height),
        );
        for (group, nodes) in &self.groups {
            if nodes.is_empty() {
                continue;
            }
            let _ = writeln!(out, r#"  <g class="{}">"#, group.name());
            for node in nodes {
                out.push_str("    ");
                write_node(&mut out, node);
                out.push('\n');
            }
            out.push_str("  </g>\n");
        }
        out.push_str("</svg>\n");
        out
    }
}

impl Canvas for SvgCanvas {
    fn apply(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Clear => self.groups.clear(),
            DrawCommand::ClearGroup(group) => {
                self.groups.remove(group);
            }
            DrawCommand::Append { group, node } => {
                self.groups.entry(*group).or_default().push(node.clone());
            }
            DrawCommand::SetRadius { id, radius } => {
                if let Some(Node {
                    shape: Shape::Circle { radius: r, .. },
                    ..
                }) = self.find_mut(id)
                {
                    *r = *radius;
                }
            }
            DrawCommand::SetVisible { id, visible } => {
                if let Some(node) = self.find_mut(id) {
                    node.visible = *visible;
                }
            }
            DrawCommand::SetClass { id, class } => {
                if let Some(node) = self.find_mut(id) {
                    node.style.class = Some(class.clone());
                }
            }
            DrawCommand::Raise { id } => {
                if let Some((group, i)) = self.locate(id)
                    && let Some(nodes) = self.groups.get_mut(&group)
                {
                    let node = nodes.remove(i);
                    nodes.push(node);
                }
            }
            DrawCommand::Remove { id } => {
                if let Some((group, i)) = self.locate(id)
                    && let Some(nodes) = self.groups.get_mut(&group)
                {
                    nodes.remove(i);
                }
            }
        }
    }
}

fn write_node(out: &mut String, node: &Node) {
    let mut attrs = String::new();
    if let Some(id) = &node.id {
        let _ = write!(attrs, r#" id="{}""#, escape_text(id));
    }
    if let Some(class) = &node.style.class {
        let _ = write!(attrs, r#" class="{}""#, escape_text(class));
    }
    if let Some(fill) = &node.style.fill {
        let _ = write!(attrs, r#" fill="{}""#, escape_text(fill));
    }
    if let Some(stroke) = &node.style.stroke {
        let _ = write!(attrs, r#" stroke="{}""#, escape_text(stroke));
    }
    if let Some(w) = node.style.stroke_width {
        let _ = write!(attrs, r#" stroke-width="{}""#, fmt_num(w));
    }
    if !node.visible {
        attrs.push_str(r#" display="none""#);
    }

    let _ = match &node.shape {
        Shape::Circle { center, radius } => write!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}"{attrs}/>"#,
            fmt_num(center.x),
            fmt_num(center.y),
            fmt_num(*radius)
        ),
        Shape::Path { d } => write!(out, r#"<path d="{d}"{attrs}/>"#),
        Shape::Line { from, to } => write!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{attrs}/>"#,
            fmt_num(from.x),
            fmt_num(from.y),
            fmt_num(to.x),
            fmt_num(to.y)
        ),
        Shape::Polyline { points } => {
            let pts = points
                .iter()
                .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
                .collect::<Vec<_>>()
                .join(" ");
            write!(out, r#"<polyline points="{pts}" fill="none"{attrs}/>"#)
        }
        Shape::Text {
            at,
            text,
            anchor,
            dy_em,
        } => {
            let dy = if *dy_em != 0.0 {
                format!(r#" dy="{}em""#, fmt_num(*dy_em))
            } else {
                String::new()
            };
            write!(
                out,
                r#"<text x="{}" y="{}" text-anchor="{}"{dy}{attrs}>{}</text>"#,
                fmt_num(at.x),
                fmt_num(at.y),
                anchor.as_str(),
                escape_text(text)
            )
        }
    };
}

#[cfg(test)]
mod tests {
    use super::SvgCanvas;
    use crate::command::{DrawCommand, Group, Node, Shape, Style};
    use crate::surface::Canvas;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn marker(id: &str) -> DrawCommand {
        DrawCommand::Append {
            group: Group::Markers,
            node: Node::new(Shape::circle(Vec2::new(10.0, 20.0), 0.0), Style::class("Taxa"))
                .with_id(id),
        }
    }

    #[test]
    fn applies_marker_mutations() {
        let mut svg = SvgCanvas::new();
        svg.apply_all(&[
            marker("a"),
            marker("b"),
            DrawCommand::SetRadius {
                id: "a".into(),
                radius: 32.0,
            },
            DrawCommand::SetVisible {
                id: "b".into(),
                visible: false,
            },
            DrawCommand::SetClass {
                id: "a".into(),
                class: "hover".into(),
            },
            DrawCommand::Raise { id: "a".into() },
        ]);

        let ids: Vec<_> = svg
            .nodes(Group::Markers)
            .iter()
            .map(|n| n.id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
        let a = svg.find("a").unwrap();
        assert_eq!(a.shape, Shape::circle(Vec2::new(10.0, 20.0), 32.0));
        assert_eq!(a.style.class.as_deref(), Some("hover"));
        assert!(!svg.find("b").unwrap().visible);

        svg.apply(&DrawCommand::Remove { id: "b".into() });
        assert_eq!(svg.node_count(), 1);
        svg.apply(&DrawCommand::Clear);
        assert_eq!(svg.node_count(), 0);
    }

    #[test]
    fn serializes_groups_in_paint_order() {
        let mut svg = SvgCanvas::new();
        svg.apply(&marker("m"));
        svg.apply(&DrawCommand::Append {
            group: Group::Towns,
            node: Node::new(Shape::Path { d: "M0,0L1,1Z".into() }, Style::class("town")),
        });
        let doc = svg.to_svg_string(100.0, 50.0);
        let towns = doc.find(r#"<g class="towns">"#).unwrap();
        let markers = doc.find(r#"<g class="markers">"#).unwrap();
        assert!(towns < markers);
        assert!(doc.contains(r#"<circle cx="10" cy="20" r="0" id="m" class="Taxa"/>"#));
        assert!(doc.contains(r#"<path d="M0,0L1,1Z" class="town"/>"#));
    }
}
