use crate::{
    foundation::core::{Point, Rect, centered_rect, union_all},
    layout::{context::LayoutContext, tokens::display_token},
    model::step::Step,
    render::{arrows::straight, theme::StyleBag},
    scene::model::{Node, NodeId, Scene, Shape, TextAnchor},
    selectors::registry::class,
};

/// Whether token `idx` is new in this step: every token on the first step, otherwise the last.
pub fn is_new_token(step: &Step, idx: usize) -> bool {
    step.is_initial() || idx + 1 == step.tokens.len()
}

/// Token boxes with underline and inline id, plus the ellipsis for a collapsed gap.
pub fn draw_tokens(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    ctx: &LayoutContext,
    style: &StyleBag,
) -> Rect {
    let y = ctx.stages.tokens_y;
    let h = ctx.geometry.token_box_height;
    let mut drawn = Vec::new();

    for (slot, idx, x) in ctx.meta.token_slots() {
        let Some(text) = step.tokens.get(idx) else {
            continue;
        };
        let new = is_new_token(step, idx);
        let special = ctx.meta.special.get(slot).copied().unwrap_or(false);
        let w = ctx.meta.widths[slot];
        let accent = if new {
            "--new-token-color"
        } else {
            "--token-color"
        };

        let mut node = Node::group()
            .tagged([
                class::TOKEN,
                if new {
                    class::NEW_TOKEN
                } else {
                    class::PREV_TOKEN
                },
            ])
            .with_data("index", idx);
        if let Some(id) = step.token_id(idx) {
            node = node.with_data("token-id", id);
        }
        let group = scene.append(parent, node);

        let bx = centered_rect(Point::new(x, y), w, h);
        scene.append(
            group,
            Node::new(Shape::Rect {
                rect: bx,
                radius: ctx.geometry.corner_radius,
            })
            .fill("--background-color")
            .stroke("--border-color", 1.0),
        );
        let underline = straight(
            Point::new(bx.x0 + 4.0, bx.y1 - 2.0),
            Point::new(bx.x1 - 4.0, bx.y1 - 2.0),
        );
        scene.append(
            group,
            Node::new(Shape::Path { path: underline }).stroke(accent, 3.0),
        );
        let size = if special {
            style.small_font_size
        } else {
            style.font_size
        };
        scene.append(
            group,
            Node::new(Shape::Text {
                pos: Point::new(x, y + size * 0.35 - 4.0),
                text: display_token(text),
                size,
                anchor: TextAnchor::Middle,
                bold: new,
            })
            .fill("--text-color"),
        );
        if let Some(id) = step.token_id(idx) {
            scene.append(
                group,
                Node::new(Shape::Text {
                    pos: Point::new(x, y + h / 2.0 - 6.0),
                    text: id.to_string(),
                    size: style.cell_font_size - 2.0,
                    anchor: TextAnchor::Middle,
                    bold: false,
                })
                .tagged([class::TOKEN_ID])
                .fill("--muted-text-color"),
            );
        }
        drawn.push(bx);
    }

    if let Some(slot) = ctx.meta.gap_slot() {
        let x = ctx.meta.positions[slot];
        let g = scene.append(parent, Node::group().tagged([class::TOKEN_GAP]));
        scene.append(
            g,
            Node::new(Shape::Text {
                pos: Point::new(x, y + style.font_size * 0.35),
                text: "…".to_owned(),
                size: style.font_size,
                anchor: TextAnchor::Middle,
                bold: true,
            })
            .fill("--muted-text-color"),
        );
        if let Some(b) = scene.bounds(g) {
            drawn.push(b);
        }
    }

    union_all(drawn).unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/render/tokens.rs"]
mod tests;
