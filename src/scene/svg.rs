use std::fmt::Write as _;

use kurbo::ParamCurveArclen;

use crate::{
    foundation::core::BezPath,
    render::theme::Theme,
    scene::model::{LABEL_COLUMN_WIDTH, Node, NodeId, Scene, Shape},
    selectors::registry::class,
};

/// Below this the "draw" property counts as still drawing; arrowheads stay hidden.
const DRAWN: f64 = 0.999;

/// State inherited from ancestors while serializing.
#[derive(Clone, Copy, Debug)]
struct Inherited {
    draw: f64,
    grow: f64,
    grey: bool,
    bp_active: bool,
    green: Option<bool>,
    active: bool,
}

impl Inherited {
    const ROOT: Self = Self {
        draw: 1.0,
        grow: 1.0,
        grey: false,
        bp_active: false,
        green: None,
        active: false,
    };

    fn enter(self, node: &Node) -> Self {
        let t = &node.tags;
        let green = if t.contains(class::BP_CONNECTION_GREEN) {
            Some(true)
        } else if t.contains(class::BP_CONNECTION_RED) {
            Some(false)
        } else {
            self.green
        };
        Self {
            draw: self.draw * node.props.draw,
            grow: self.grow * node.props.grow,
            grey: self.grey || t.contains(class::BP_GREY),
            bp_active: self.bp_active || t.contains(class::BP_ACTIVE),
            green,
            active: self.active || t.contains(class::ACTIVE),
        }
    }
}

/// Number formatting for attributes: at most two decimals, no trailing zeros.
fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_owned();
    }
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" || s.is_empty() {
        "0".to_owned()
    } else {
        s.to_owned()
    }
}

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Arc length of a path, used for stroke dashing.
pub fn path_length(path: &BezPath) -> f64 {
    path.segments().map(|s| s.arclen(1e-3)).sum()
}

/// Fill and stroke after applying tag-driven overrides.
fn effective_paint<'a>(
    node: &'a Node,
    inh: Inherited,
    theme: &'a Theme,
) -> (Option<&'a str>, Option<&'a str>) {
    let mut fill = node.paint.fill.as_deref();
    let mut stroke = node.paint.stroke.as_deref();
    let is_text = matches!(node.shape, Shape::Text { .. });

    if inh.bp_active && inh.green.is_some() {
        let c = if inh.green == Some(true) {
            "--bp-green"
        } else {
            "--bp-red"
        };
        stroke = stroke.map(|_| c);
        if !is_text {
            fill = fill.map(|_| c);
        }
    } else if inh.grey {
        stroke = stroke.map(|_| "--bp-grey-color");
        fill = fill.map(|f| match f {
            "--background-color" | "--cell-fill" => f,
            _ if is_text => "--muted-text-color",
            _ => "--bp-grey-color",
        });
    }
    if inh.active && node.tags.contains(class::STAGE_LABEL_BG) {
        fill = Some("--label-active-bg");
    }
    (
        fill.map(|f| theme.resolve(f)),
        stroke.map(|s| theme.resolve(s)),
    )
}

fn common_attrs(out: &mut String, node: &Node) {
    if !node.tags.is_empty() {
        let _ = write!(out, r#" class="{}""#, escape_xml(&node.tags.class_attr()));
    }
    if node.props.opacity < 1.0 {
        let _ = write!(out, r#" opacity="{}""#, num(node.props.opacity));
    }
    if node.props.offset_x != 0.0 || node.props.offset_y != 0.0 {
        let _ = write!(
            out,
            r#" transform="translate({} {})""#,
            num(node.props.offset_x),
            num(node.props.offset_y)
        );
    }
    for (k, v) in &node.data {
        let _ = write!(out, r#" data-{}="{}""#, escape_xml(k), escape_xml(v));
    }
}

fn paint_attrs(out: &mut String, fill: Option<&str>, stroke: Option<&str>, width: f64) {
    let _ = write!(out, r#" fill="{}""#, escape_xml(fill.unwrap_or("none")));
    if let Some(s) = stroke {
        let _ = write!(
            out,
            r#" stroke="{}" stroke-width="{}""#,
            escape_xml(s),
            num(width)
        );
    }
}

fn write_node(out: &mut String, scene: &Scene, id: NodeId, parent: Inherited, theme: &Theme) {
    let Some(node) = scene.node(id) else {
        return;
    };
    let inh = parent.enter(node);
    let (fill, stroke) = effective_paint(node, inh, theme);
    match &node.shape {
        Shape::Group => {
            out.push_str("<g");
            common_attrs(out, node);
            out.push('>');
            for c in &node.children {
                write_node(out, scene, *c, inh, theme);
            }
            out.push_str("</g>");
            return;
        }
        Shape::Rect { rect, radius } => {
            let h = rect.height() * inh.grow.clamp(0.0, 1.0);
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}""#,
                num(rect.x0),
                num(rect.y1 - h),
                num(rect.width()),
                num(h)
            );
            if *radius > 0.0 {
                let _ = write!(out, r#" rx="{}""#, num(*radius));
            }
            paint_attrs(out, fill, stroke, node.paint.stroke_width);
            common_attrs(out, node);
        }
        Shape::Text {
            pos,
            text,
            size,
            anchor,
            bold,
        } => {
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" font-size="{}" text-anchor="{}""#,
                num(pos.x),
                num(pos.y),
                num(*size),
                anchor.as_svg()
            );
            if *bold {
                out.push_str(r#" font-weight="bold""#);
            }
            paint_attrs(out, fill, stroke, node.paint.stroke_width);
            common_attrs(out, node);
            let _ = write!(out, ">{}</text>", escape_xml(text));
            return;
        }
        Shape::Path { path } => {
            let _ = write!(out, r#"<path d="{}""#, path.to_svg());
            paint_attrs(out, fill, stroke, node.paint.stroke_width);
            if stroke.is_some() {
                out.push_str(r#" stroke-linecap="round" stroke-linejoin="round""#);
            }
            let draw = inh.draw.clamp(0.0, 1.0);
            if draw < DRAWN {
                if fill.is_some() && stroke.is_none() {
                    out.push_str(r#" fill-opacity="0""#);
                } else {
                    let len = path_length(path);
                    let _ = write!(
                        out,
                        r#" stroke-dasharray="{} {}" stroke-dashoffset="{}""#,
                        num(len),
                        num(len),
                        num(len * (1.0 - draw))
                    );
                }
            }
            common_attrs(out, node);
        }
        Shape::Circle { center, radius } => {
            let _ = write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}""#,
                num(center.x),
                num(center.y),
                num(*radius)
            );
            paint_attrs(out, fill, stroke, node.paint.stroke_width);
            common_attrs(out, node);
        }
    }
    out.push_str("/>");
}

fn write_scene(out: &mut String, scene: &Scene, theme: &Theme) {
    write_node(out, scene, scene.root(), Inherited::ROOT, theme);
}

fn header(out: &mut String, width: f64, height: f64, theme: &Theme) {
    let (w, h) = (num(width.max(1.0)), num(height.max(1.0)));
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{}">"#,
        escape_xml(theme.resolve("--font-family"))
    );
    let _ = write!(
        out,
        r#"<rect width="{w}" height="{h}" fill="{}"/>"#,
        escape_xml(theme.resolve("--background-color"))
    );
}

impl Scene {
    /// Standalone SVG document of this scene.
    pub fn to_svg(&self, theme: &Theme) -> String {
        let mut out = String::new();
        header(&mut out, self.size.width, self.size.height, theme);
        write_scene(&mut out, self, theme);
        out.push_str("</svg>");
        out
    }
}

/// One SVG document with the label column (when mounted) to the left of the main scene.
pub fn roots_to_svg(roots: &crate::scene::model::SceneRoots, theme: &Theme) -> String {
    let Some(labels) = roots.labels.as_ref() else {
        return roots.main.to_svg(theme);
    };
    let width = LABEL_COLUMN_WIDTH + roots.main.size.width;
    let height = roots.main.size.height.max(labels.size.height);
    let mut out = String::new();
    header(&mut out, width, height, theme);
    out.push_str(r#"<g data-root="labels">"#);
    write_scene(&mut out, labels, theme);
    let _ = write!(
        out,
        r#"</g><g data-root="main" transform="translate({} 0)">"#,
        num(LABEL_COLUMN_WIDTH)
    );
    write_scene(&mut out, &roots.main, theme);
    out.push_str("</g></svg>");
    out
}

#[cfg(test)]
#[path = "../../tests/unit/scene/svg.rs"]
mod tests;
