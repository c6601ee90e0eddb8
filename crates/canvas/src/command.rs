use foundation::math::Vec2;

/// Draw-order groups of a map document, bottom to top.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    Towns,
    WaterPolygons,
    WaterLines,
    Markers,
    Legend,
    /// The trend plot lives on its own surface.
    Plot,
}

impl Group {
    pub const ALL: [Group; 6] = [
        Group::Towns,
        Group::WaterPolygons,
        Group::WaterLines,
        Group::Markers,
        Group::Legend,
        Group::Plot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Group::Towns => "towns",
            Group::WaterPolygons => "water-polygons",
            Group::WaterLines => "water-lines",
            Group::Markers => "markers",
            Group::Legend => "legend",
            Group::Plot => "plot",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { center: Vec2, radius: f64 },
    /// SVG path data.
    Path { d: String },
    Line { from: Vec2, to: Vec2 },
    Polyline { points: Vec<Vec2> },
    Text {
        at: Vec2,
        text: String,
        anchor: TextAnchor,
        /// Baseline shift in em.
        dy_em: f64,
    },
}

impl Shape {
    pub fn circle(center: Vec2, radius: f64) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn text(at: Vec2, text: impl Into<String>) -> Self {
        Shape::Text {
            at,
            text: text.into(),
            anchor: TextAnchor::Start,
            dy_em: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub class: Option<String>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
}

impl Style {
    pub fn class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::default()
        }
    }

    pub fn with_fill(mut self, fill: impl Into<String>) -> Self {
        self.fill = Some(fill.into());
        self
    }

    pub fn with_stroke(mut self, stroke: impl Into<String>, width: f64) -> Self {
        self.stroke = Some(stroke.into());
        self.stroke_width = Some(width);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Element id; only nodes that are later addressed need one.
    pub id: Option<String>,
    pub shape: Shape,
    pub style: Style,
    pub visible: bool,
}

impl Node {
    pub fn new(shape: Shape, style: Style) -> Self {
        Self {
            id: None,
            shape,
            style,
            visible: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A retained-mode mutation of a drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Removes every node from every group.
    Clear,
    /// Removes every node of one group.
    ClearGroup(Group),
    Append { group: Group, node: Node },
    SetRadius { id: String, radius: f64 },
    SetVisible { id: String, visible: bool },
    SetClass { id: String, class: String },
    /// Moves the node to the top of its group.
    Raise { id: String },
    Remove { id: String },
}

impl DrawCommand {
    pub fn target(&self) -> Option<&str> {
        match self {
            DrawCommand::SetRadius { id, .. }
            | DrawCommand::SetVisible { id, .. }
            | DrawCommand::SetClass { id, .. }
            | DrawCommand::Raise { id }
            | DrawCommand::Remove { id } => Some(id),
            DrawCommand::Append { node, .. } => node.id.as_deref(),
            DrawCommand::Clear | DrawCommand::ClearGroup(_) => None,
        }
    }
}

/// Formats a coordinate with at most two decimals and no trailing zeros.
pub fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Escapes text for SVG/HTML content and attribute values.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
