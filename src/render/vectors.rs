use crate::{
    foundation::core::{Point, Rect, Size, centered_rect, union_all},
    render::theme::StyleBag,
    scene::model::{Node, NodeId, Scene, Shape, TextAnchor},
    selectors::registry::class,
};

/// One decimal, with negative zero printed as `0.0`.
pub fn format_value(v: f64) -> String {
    if !v.is_finite() {
        return "–".to_owned();
    }
    let s = format!("{v:.1}");
    if s == "-0.0" { "0.0".to_owned() } else { s }
}

/// Appearance of a horizontal vector row.
#[derive(Clone, Copy, Debug)]
pub struct RowStyle<'a> {
    pub cell: Size,
    pub fill: &'a str,
    pub stroke: &'a str,
    /// Append a trailing `…` cell after the values.
    pub ellipsis: bool,
}

/// Draw `values` as a row of cells centered on `centers` at height `y`.
///
/// Extra centers beyond the values receive the ellipsis cell when enabled.
pub fn draw_vector_row(
    scene: &mut Scene,
    parent: NodeId,
    centers: &[f64],
    y: f64,
    values: &[f64],
    row: &RowStyle<'_>,
    style: &StyleBag,
) -> Rect {
    let mut drawn = Vec::with_capacity(centers.len());
    for (i, x) in centers.iter().enumerate() {
        let r = centered_rect(Point::new(*x, y), row.cell.width, row.cell.height);
        let label = match values.get(i) {
            Some(v) => format_value(*v),
            None if row.ellipsis && i == values.len() => "…".to_owned(),
            None => continue,
        };
        let cell = scene.append(
            parent,
            Node::group()
                .tagged([class::VECTOR_CELL])
                .with_data("index", i),
        );
        scene.append(
            cell,
            Node::new(Shape::Rect {
                rect: r,
                radius: 3.0,
            })
            .fill(row.fill)
            .stroke(row.stroke, 1.0),
        );
        scene.append(
            cell,
            Node::new(Shape::Text {
                pos: Point::new(*x, y + style.cell_font_size * 0.35),
                text: label,
                size: style.cell_font_size,
                anchor: TextAnchor::Middle,
                bold: false,
            })
            .fill("--text-color"),
        );
        drawn.push(r);
    }
    union_all(drawn).unwrap_or_else(|| Rect::from_origin_size(Point::new(0.0, y), (0.0, 0.0)))
}

/// Centers to use for `values` plus the optional ellipsis cell, taken from `positions`.
pub fn row_centers(positions: &[f64], values: usize, ellipsis: bool) -> Vec<f64> {
    let n = values + usize::from(ellipsis);
    positions.iter().copied().take(n).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/vectors.rs"]
mod tests;
