use crate::{
    foundation::core::{Point, Rect, Size, centered_rect, union_all},
    layout::context::LayoutContext,
    model::step::Step,
    render::{
        arrows::{draw_arrow, polarity_tag, straight},
        theme::StyleBag,
        tokens::is_new_token,
        vectors::format_value,
    },
    scene::model::{Node, NodeId, Scene, Shape, TextAnchor},
    selectors::registry::class,
    vectors::embeddings::{EmbeddingSet, TokenEmbedding},
};

/// Appearance of a vertical value column.
#[derive(Clone, Copy, Debug)]
pub struct ColumnStyle<'a> {
    pub cell: Size,
    pub accent: &'a str,
    /// Summarize as first / `⋮` / last.
    pub compact: bool,
}

/// Draw a vertical stack of value cells whose top edge is centered on `origin`.
pub fn draw_column(
    scene: &mut Scene,
    parent: NodeId,
    origin: Point,
    values: &[f64],
    column: &ColumnStyle<'_>,
    style: &StyleBag,
) -> Rect {
    let labels: Vec<String> = if column.compact && values.len() > 3 {
        vec![
            format_value(values[0]),
            "⋮".to_owned(),
            format_value(values[values.len() - 1]),
        ]
    } else {
        values.iter().map(|v| format_value(*v)).collect()
    };

    let mut drawn = Vec::with_capacity(labels.len());
    for (i, label) in labels.into_iter().enumerate() {
        let cy = origin.y + column.cell.height * (i as f64 + 0.5);
        let r = centered_rect(
            Point::new(origin.x, cy),
            column.cell.width,
            column.cell.height,
        );
        let cell = scene.append(parent, Node::group().tagged([class::VECTOR_CELL]));
        scene.append(
            cell,
            Node::new(Shape::Rect {
                rect: r,
                radius: 2.0,
            })
            .fill("--cell-fill")
            .stroke(column.accent, 1.0),
        );
        scene.append(
            cell,
            Node::new(Shape::Text {
                pos: Point::new(origin.x, cy + style.cell_font_size * 0.35),
                text: label,
                size: style.cell_font_size,
                anchor: TextAnchor::Middle,
                bold: false,
            })
            .fill("--text-color"),
        );
        drawn.push(r);
    }
    union_all(drawn).unwrap_or_else(|| Rect::from_points(origin, origin))
}

/// Column style for the current layout and an accent color.
pub fn column_style<'a>(ctx: &LayoutContext, accent: &'a str) -> ColumnStyle<'a> {
    ColumnStyle {
        cell: Size::new(ctx.geometry.cell_width, ctx.geometry.cell_height),
        accent,
        compact: ctx.compact,
    }
}

/// Draw one column per visible token, each in a group tagged `tags` plus the token's new/prev
/// class, and return the group ids by slot.
#[allow(clippy::too_many_arguments)]
pub fn draw_stage_columns(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    ctx: &LayoutContext,
    top: f64,
    pick: impl Fn(&TokenEmbedding) -> &[f64],
    set: &EmbeddingSet,
    column: &ColumnStyle<'_>,
    tags: &[&str],
    style: &StyleBag,
) -> (Vec<(usize, NodeId)>, Rect) {
    let mut groups = Vec::new();
    let mut drawn = Vec::new();
    for (slot, idx, x) in ctx.meta.token_slots() {
        let Some(emb) = set.get(idx) else {
            continue;
        };
        let age = if is_new_token(step, idx) {
            class::NEW_TOKEN
        } else {
            class::PREV_TOKEN
        };
        let g = scene.append(
            parent,
            Node::group()
                .tagged(tags.iter().copied().chain([age]))
                .with_data("index", idx),
        );
        drawn.push(draw_column(
            scene,
            g,
            Point::new(x, top),
            pick(emb),
            column,
            style,
        ));
        groups.push((slot, g));
    }
    (groups, union_all(drawn).unwrap_or_default())
}

/// Outer embedding columns under the tokens, each with its token-to-embedding arrow.
pub fn draw_embeddings(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    set: &EmbeddingSet,
    ctx: &LayoutContext,
    style: &StyleBag,
) -> Rect {
    let column = column_style(ctx, "--embedding-color");
    let (groups, mut bounds) = draw_stage_columns(
        scene,
        parent,
        step,
        ctx,
        ctx.stages.embed_top,
        |e| &e.outer,
        set,
        &column,
        &[class::EMBEDDING_GROUP],
        style,
    );
    for (slot, group) in groups {
        let x = ctx.meta.positions[slot];
        let idx = ctx.meta.visible[slot];
        let path = straight(
            Point::new(x, ctx.stages.token_bottom + 4.0),
            Point::new(x, ctx.stages.embed_top - 4.0),
        );
        let polarity = polarity_tag(&format!("embed|{}", i64::from(idx)));
        let (_, r) = draw_arrow(
            scene,
            group,
            path,
            &[class::EMBEDDING_ARROW, polarity],
            "--arrow-color",
            style,
        );
        bounds = bounds.union(r);
    }
    bounds
}

#[cfg(test)]
#[path = "../../tests/unit/render/embeddings.rs"]
mod tests;
