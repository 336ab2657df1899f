use kurbo::{ParamCurve, PathSeg};

use crate::{
    foundation::core::{BezPath, Point, Rect, Vec2},
    render::theme::StyleBag,
    scene::model::{Node, NodeId, Scene, Shape},
    selectors::registry::class,
    vectors::generator::unit_hash,
};

/// Straight segment.
pub fn straight(from: Point, to: Point) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(from);
    p.line_to(to);
    p
}

/// Horizontal leg first, then vertical, with a rounded corner.
pub fn right_angle_rounded(from: Point, to: Point, radius: f64) -> BezPath {
    let corner = Point::new(to.x, from.y);
    one_corner(from, corner, to, radius)
}

/// Vertical leg first, then horizontal, with a rounded corner.
pub fn vertical_then_horizontal_rounded(from: Point, to: Point, radius: f64) -> BezPath {
    let corner = Point::new(from.x, to.y);
    one_corner(from, corner, to, radius)
}

/// Leaves `from` horizontally, runs vertically at `from.x + out` (negative `out` goes left) and
/// comes back horizontally into `to`.
pub fn u_feedback(from: Point, to: Point, out: f64, radius: f64) -> BezPath {
    let x = if out >= 0.0 {
        from.x.max(to.x) + out
    } else {
        from.x.min(to.x) + out
    };
    let c1 = Point::new(x, from.y);
    let c2 = Point::new(x, to.y);
    let mut p = BezPath::new();
    p.move_to(from);
    rounded_corner(&mut p, from, c1, c2, radius);
    rounded_corner(&mut p, c1, c2, to, radius);
    p.line_to(to);
    p
}

/// Attention-style S curve between two points stacked vertically.
pub fn s_curve(from: Point, to: Point) -> BezPath {
    let mid = (from.y + to.y) / 2.0;
    let mut p = BezPath::new();
    p.move_to(from);
    p.curve_to(Point::new(from.x, mid), Point::new(to.x, mid), to);
    p
}

fn one_corner(from: Point, corner: Point, to: Point, radius: f64) -> BezPath {
    let mut p = BezPath::new();
    p.move_to(from);
    rounded_corner(&mut p, from, corner, to, radius);
    p.line_to(to);
    p
}

/// Line towards `corner`, stopping short by the radius, and round into the next leg.
fn rounded_corner(p: &mut BezPath, prev: Point, corner: Point, next: Point, radius: f64) {
    let a = prev - corner;
    let b = next - corner;
    let (la, lb) = (a.hypot(), b.hypot());
    if la <= f64::EPSILON || lb <= f64::EPSILON {
        p.line_to(corner);
        return;
    }
    let r = radius.max(0.0).min(la / 2.0).min(lb / 2.0);
    p.line_to(corner + a * (r / la));
    p.quad_to(corner, corner + b * (r / lb));
}

/// Unit direction of the path at its end point.
pub fn end_direction(path: &BezPath) -> Option<Vec2> {
    let seg = path.segments().last()?;
    let end = seg.eval(1.0);
    let before = match seg {
        PathSeg::Line(l) => l.p0,
        PathSeg::Quad(q) => {
            if q.p1 != q.p2 {
                q.p1
            } else {
                q.p0
            }
        }
        PathSeg::Cubic(c) => {
            if c.p2 != c.p3 {
                c.p2
            } else {
                c.p1
            }
        }
    };
    let d = end - before;
    let len = d.hypot();
    (len > f64::EPSILON).then(|| d / len)
}

/// Closed triangle with its tip at the end of `path`.
pub fn arrow_head(path: &BezPath, size: f64) -> Option<BezPath> {
    let dir = end_direction(path)?;
    let tip = path.segments().last()?.eval(1.0);
    let normal = Vec2::new(-dir.y, dir.x);
    let base = tip - dir * size;
    let mut head = BezPath::new();
    head.move_to(tip);
    head.line_to(base + normal * (size * 0.55));
    head.line_to(base - normal * (size * 0.55));
    head.close_path();
    Some(head)
}

/// Backprop polarity of a connector, derived from its identity.
pub fn polarity_tag(identity: &str) -> &'static str {
    if unit_hash(&format!("connector|{identity}")) < 0.5 {
        class::BP_CONNECTION_GREEN
    } else {
        class::BP_CONNECTION_RED
    }
}

/// Arrow group: the stroked path plus an arrowhead, tagged with `tags`.
pub fn draw_arrow(
    scene: &mut Scene,
    parent: NodeId,
    path: BezPath,
    tags: &[&str],
    color: &str,
    style: &StyleBag,
) -> (NodeId, Rect) {
    let group = scene.append(parent, Node::group().tagged(tags.iter().copied()));
    let head = arrow_head(&path, style.arrow_head);
    scene.append(
        group,
        Node::new(Shape::Path { path }).stroke(color, style.stroke_width),
    );
    if let Some(head) = head {
        scene.append(
            group,
            Node::new(Shape::Path { path: head })
                .tagged([class::ARROW_HEAD])
                .fill(color),
        );
    }
    let bounds = scene.bounds(group).unwrap_or_default();
    (group, bounds)
}

/// Plain connector line without a head.
pub fn draw_connector(
    scene: &mut Scene,
    parent: NodeId,
    path: BezPath,
    tags: &[&str],
    color: &str,
    style: &StyleBag,
) -> (NodeId, Rect) {
    let id = scene.append(
        parent,
        Node::new(Shape::Path { path })
            .tagged(tags.iter().copied())
            .stroke(color, style.connector_width),
    );
    (id, scene.bounds(id).unwrap_or_default())
}

#[cfg(test)]
#[path = "../../tests/unit/render/arrows.rs"]
mod tests;
