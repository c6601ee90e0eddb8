use std::collections::BTreeMap;

use canvas::{Canvas, DrawCommand, Group, Node, Shape, TooltipSurface, fmt_num};
use foundation::math::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const TOOLTIP_CLASSES: &str =
    "my-tooltip bg-secondary text-white py-1 px-2 rounded position-absolute invisible";
const HIDDEN_CLASS: &str = "invisible";

fn log_error(context: &str, err: &JsValue) {
    web_sys::console::error_1(&JsValue::from_str(&format!("{context}: {err:?}")));
}

/// An `<svg>` element driven by [`DrawCommand`]s.
///
/// Each [`Group`] is a `<g>` child created on first use and kept in draw
/// order.
pub struct DomCanvas {
    document: Document,
    root: Element,
    groups: BTreeMap<Group, Element>,
}

impl DomCanvas {
    pub fn mount(document: &Document, container: &Element) -> Result<Self, JsValue> {
        let root = document.create_element_ns(Some(SVG_NS), "svg")?;
        container.append_child(&root)?;
        Ok(Self {
            document: document.clone(),
            root,
            groups: BTreeMap::new(),
        })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn set_size(&self, size: Vec2) -> Result<(), JsValue> {
        self.root.set_attribute("width", &fmt_num(size.x))?;
        self.root.set_attribute("height", &fmt_num(size.y))
    }

    fn svg_element(&self, tag: &str) -> Result<Element, JsValue> {
        self.document.create_element_ns(Some(SVG_NS), tag)
    }

    fn group(&mut self, group: Group) -> Result<Element, JsValue> {
        if let Some(g) = self.groups.get(&group) {
            return Ok(g.clone());
        }
        let g = self.svg_element("g")?;
        g.set_attribute("class", group.name())?;
        let before = self.groups.range(group..).next().map(|(_, e)| e.clone());
        self.root.insert_before(&g, before.as_ref().map(|e| &**e))?;
        self.groups.insert(group, g.clone());
        Ok(g)
    }

    fn create(&self, node: &Node) -> Result<Element, JsValue> {
        let el = match &node.shape {
            Shape::Circle { center, radius } => {
                let el = self.svg_element("circle")?;
                el.set_attribute("cx", &fmt_num(center.x))?;
                el.set_attribute("cy", &fmt_num(center.y))?;
                el.set_attribute("r", &fmt_num(*radius))?;
                el
            }
            Shape::Path { d } => {
                let el = self.svg_element("path")?;
                el.set_attribute("d", d)?;
                el
            }
            Shape::Line { from, to } => {
                let el = self.svg_element("line")?;
                el.set_attribute("x1", &fmt_num(from.x))?;
                el.set_attribute("y1", &fmt_num(from.y))?;
                el.set_attribute("x2", &fmt_num(to.x))?;
                el.set_attribute("y2", &fmt_num(to.y))?;
                el
            }
            Shape::Polyline { points } => {
                let el = self.svg_element("polyline")?;
                let points = points
                    .iter()
                    .map(|p| format!("{},{}", fmt_num(p.x), fmt_num(p.y)))
                    .collect::<Vec<_>>()
                    .join(" ");
                el.set_attribute("points", &points)?;
                el.set_attribute("fill", "none")?;
                el
            }
            Shape::Text {
                at,
                text,
                anchor,
                dy_em,
            } => {
                let el = self.svg_element("text")?;
                el.set_attribute("x", &fmt_num(at.x))?;
                el.set_attribute("y", &fmt_num(at.y))?;
                el.set_attribute("text-anchor", anchor.as_str())?;
                if *dy_em != 0.0 {
                    el.set_attribute("dy", &format!("{}em", fmt_num(*dy_em)))?;
                }
                el.set_text_content(Some(text.as_str()));
                el
            }
        };

        if let Some(id) = &node.id {
            el.set_id(id);
        }
        let style = &node.style;
        if let Some(class) = &style.class {
            el.set_attribute("class", class)?;
        }
        if let Some(fill) = &style.fill {
            el.set_attribute("fill", fill)?;
        }
        if let Some(stroke) = &style.stroke {
            el.set_attribute("stroke", stroke)?;
        }
        if let Some(w) = style.stroke_width {
            el.set_attribute("stroke-width", &fmt_num(w))?;
        }
        if !node.visible {
            el.set_attribute("display", "none")?;
        }
        Ok(el)
    }

    fn try_apply(&mut self, command: &DrawCommand) -> Result<(), JsValue> {
        match command {
            DrawCommand::Clear => {
                self.root.set_inner_html("");
                self.groups.clear();
            }
            DrawCommand::ClearGroup(group) => {
                if let Some(g) = self.groups.remove(group) {
                    g.remove();
                }
            }
            DrawCommand::Append { group, node } => {
                let el = self.create(node)?;
                self.group(*group)?.append_child(&el)?;
            }
            DrawCommand::SetRadius { id, radius } => {
                if let Some(el) = self.document.get_element_by_id(id) {
                    el.set_attribute("r", &fmt_num(*radius))?;
                }
            }
            DrawCommand::SetVisible { id, visible } => {
                if let Some(el) = self.document.get_element_by_id(id) {
                    if *visible {
                        el.remove_attribute("display")?;
                    } else {
                        el.set_attribute("display", "none")?;
                    }
                }
            }
            DrawCommand::SetClass { id, class } => {
                if let Some(el) = self.document.get_element_by_id(id) {
                    el.set_attribute("class", class)?;
                }
            }
            DrawCommand::Raise { id } => {
                if let Some(el) = self.document.get_element_by_id(id)
                    && let Some(parent) = el.parent_node()
                {
                    parent.append_child(&el)?;
                }
            }
            DrawCommand::Remove { id } => {
                if let Some(el) = self.document.get_element_by_id(id) {
                    el.remove();
                }
            }
        }
        Ok(())
    }
}

impl Canvas for DomCanvas {
    fn apply(&mut self, command: &DrawCommand) {
        if let Err(err) = self.try_apply(command) {
            log_error("draw command failed", &err);
        }
    }
}

/// The floating detail box, shown by dropping its `invisible` class.
pub struct DomTooltip {
    element: HtmlElement,
}

impl DomTooltip {
    pub fn mount(document: &Document, container: &Element) -> Result<Self, JsValue> {
        let element: HtmlElement = document.create_element("div")?.dyn_into()?;
        element.set_class_name(TOOLTIP_CLASSES);
        container.append_child(&element)?;
        Ok(Self { element })
    }
}

impl TooltipSurface for DomTooltip {
    fn show(&mut self, html: &str) {
        self.element.set_inner_html(html);
        if let Err(err) = self.element.class_list().remove_1(HIDDEN_CLASS) {
            log_error("tooltip show failed", &err);
        }
    }

    fn hide(&mut self) {
        if let Err(err) = self.element.class_list().add_1(HIDDEN_CLASS) {
            log_error("tooltip hide failed", &err);
        }
    }

    fn move_to(&mut self, position: Vec2) {
        let style = self.element.style();
        let result = style
            .set_property("left", &format!("{}px", fmt_num(position.x)))
            .and_then(|()| style.set_property("top", &format!("{}px", fmt_num(position.y))));
        if let Err(err) = result {
            log_error("tooltip move failed", &err);
        }
    }
}
