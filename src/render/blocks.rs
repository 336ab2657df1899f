use crate::{
    foundation::core::{Point, Rect, Vec2, centered_rect, union_all},
    layout::context::LayoutContext,
    model::step::Step,
    render::{
        arrows::{draw_connector, polarity_tag, s_curve},
        attention::{AttentionPattern, draw_attention},
        embeddings::{column_style, draw_stage_columns},
        theme::StyleBag,
    },
    scene::model::{Node, NodeId, Scene, Shape, TextAnchor},
    selectors::registry::class,
    vectors::embeddings::EmbeddingSet,
};

/// Shadow layers drawn behind the block: one per extra layer, capped.
pub fn shadow_layers(num_layers: u32, max: u32) -> u32 {
    num_layers.saturating_sub(1).min(max)
}

/// Transformer block: stacked shadows, the box, inside-top columns, the attention mesh,
/// inside-bottom columns and the feed-forward stage.
pub fn draw_block(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    set: &EmbeddingSet,
    ctx: &LayoutContext,
    style: &StyleBag,
) -> Rect {
    let Some(block) = ctx.block_bounds() else {
        return Rect::ZERO;
    };
    let g = &ctx.geometry;
    let mut drawn = vec![block];

    let layers = shadow_layers(ctx.num_layers, g.max_shadow_layers);
    for i in (1..=layers).rev() {
        let off = g.shadow_offset * f64::from(i);
        let r = block + Vec2::new(off, -off);
        scene.append(
            parent,
            Node::new(Shape::Rect {
                rect: r,
                radius: g.corner_radius,
            })
            .tagged([class::TRANSFORMER_SHADOW])
            .with_data("layer", i)
            .fill("--shadow-fill")
            .stroke("--border-color", 1.0),
        );
        drawn.push(r);
    }

    let bx = scene.append(parent, Node::group().tagged([class::TRANSFORMER_BOX]));
    scene.append(
        bx,
        Node::new(Shape::Rect {
            rect: block,
            radius: g.corner_radius,
        })
        .fill("--block-fill")
        .stroke("--border-color", style.stroke_width),
    );
    if ctx.num_layers > 1 {
        scene.append(
            bx,
            Node::new(Shape::Text {
                pos: Point::new(block.x1 - 8.0, block.y0 + style.small_font_size + 4.0),
                text: format!("× {}", ctx.num_layers),
                size: style.small_font_size,
                anchor: TextAnchor::End,
                bold: false,
            })
            .fill("--muted-text-color"),
        );
    }

    let column = column_style(ctx, "--embedding-color");
    draw_stage_columns(
        scene,
        parent,
        step,
        ctx,
        ctx.stages.inside_top_y,
        |e| &e.inside_top,
        set,
        &column,
        &[class::INSIDE_TOP],
        style,
    );

    let last = step.tokens.len().saturating_sub(1);
    draw_attention(
        scene,
        parent,
        ctx,
        AttentionPattern::for_step(step.is_initial(), last),
        style,
    );

    let column = column_style(ctx, "--attention-color");
    draw_stage_columns(
        scene,
        parent,
        step,
        ctx,
        ctx.stages.inside_bottom_y,
        |e| &e.inside_bottom,
        set,
        &column,
        &[class::INSIDE_BOTTOM],
        style,
    );

    drawn.push(draw_feed_forward(scene, parent, step, set, ctx, style));
    union_all(drawn).unwrap_or(block)
}

/// FFN projection box, its connectors and the FFN output columns.
pub fn draw_feed_forward(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    set: &EmbeddingSet,
    ctx: &LayoutContext,
    style: &StyleBag,
) -> Rect {
    let (Some(center), Some(block)) = (ctx.ffn_center(), ctx.block_bounds()) else {
        return Rect::ZERO;
    };
    let g = &ctx.geometry;
    let width = (block.width() * 0.5).clamp(g.cell_width * 2.0, 220.0);
    let ffn_box = centered_rect(center, width, g.ffn_band * 0.4);

    let out_top = ctx.stages.inside_bottom_y + ctx.stages.column_height;
    let mut drawn = vec![ffn_box];
    for (_, idx, x) in ctx.meta.token_slots() {
        let entry = x.clamp(ffn_box.x0 + 4.0, ffn_box.x1 - 4.0);
        let legs = [
            (
                "in",
                Point::new(x, out_top + 2.0),
                Point::new(entry, ffn_box.y0),
            ),
            (
                "out",
                Point::new(entry, ffn_box.y1),
                Point::new(x, ctx.stages.ffn_y - 2.0),
            ),
        ];
        for (leg, a, b) in legs {
            let polarity = polarity_tag(&format!("ffn|{leg}|{idx}"));
            let (_, r) = draw_connector(
                scene,
                parent,
                s_curve(a, b),
                &[class::FFN_CONNECTOR, polarity],
                "--ffn-color",
                style,
            );
            drawn.push(r);
        }
    }

    let fb = scene.append(parent, Node::group().tagged([class::FFN_BOX]));
    scene.append(
        fb,
        Node::new(Shape::Rect {
            rect: ffn_box,
            radius: 4.0,
        })
        .fill("--background-color")
        .stroke("--ffn-color", style.stroke_width),
    );
    scene.append(
        fb,
        Node::new(Shape::Text {
            pos: Point::new(center.x, center.y + style.small_font_size * 0.35),
            text: "FFN".to_owned(),
            size: style.small_font_size,
            anchor: TextAnchor::Middle,
            bold: true,
        })
        .fill("--ffn-color"),
    );

    let column = column_style(ctx, "--ffn-color");
    let (_, cols) = draw_stage_columns(
        scene,
        parent,
        step,
        ctx,
        ctx.stages.ffn_y,
        |e| &e.ffn,
        set,
        &column,
        &[class::FFN_COLUMN],
        style,
    );
    drawn.push(cols);
    union_all(drawn).unwrap_or(ffn_box)
}

#[cfg(test)]
#[path = "../../tests/unit/render/blocks.rs"]
mod tests;
