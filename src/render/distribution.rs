use crate::{
    foundation::core::{Point, Rect, centered_rect, union_all},
    layout::{context::LayoutContext, tokens::display_token},
    model::step::Step,
    render::theme::StyleBag,
    scene::model::{Node, NodeId, Scene, Shape, TextAnchor},
    selectors::registry::class,
};

/// Smallest drawn bar, so zero-probability candidates stay visible.
const MIN_BAR_HEIGHT: f64 = 2.0;

/// Probability bars of the top candidates under the last token column.
///
/// The candidate matching the step's target token is tagged `selected`.
pub fn draw_distribution(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    ctx: &LayoutContext,
    style: &StyleBag,
) -> Rect {
    let candidates = step.candidates();
    let xs = ctx.bar_positions(candidates.len());
    if xs.is_empty() {
        return Rect::ZERO;
    }
    let g = &ctx.geometry;
    let base = ctx.stages.distribution_base_y;
    let target = step.target_token();
    let group = scene.append(parent, Node::group().tagged([class::DISTRIBUTION]));

    let mut drawn = Vec::with_capacity(xs.len());
    for (i, (c, x)) in candidates.iter().zip(&xs).enumerate() {
        let h = (c.prob.clamp(0.0, 1.0) * g.bar_max_height).max(MIN_BAR_HEIGHT);
        let rect = Rect::new(x - g.bar_width / 2.0, base - h, x + g.bar_width / 2.0, base);
        let selected = target == Some(c.token.as_str());
        let mut bar = Node::new(Shape::Rect { rect, radius: 2.0 })
            .tagged([class::DISTRIBUTION_BAR])
            .with_data("index", i)
            .with_data("prob", format!("{:.4}", c.prob))
            .fill(if selected {
                "--selected-color"
            } else {
                "--bar-color"
            });
        if selected {
            bar = bar.tagged([class::SELECTED]);
        }
        scene.append(group, bar);
        scene.append(
            group,
            Node::new(Shape::Text {
                pos: Point::new(*x, base - h - 4.0),
                text: format!("{:.0}%", c.prob * 100.0),
                size: style.cell_font_size,
                anchor: TextAnchor::Middle,
                bold: selected,
            })
            .fill("--muted-text-color"),
        );
        scene.append(
            group,
            Node::new(Shape::Text {
                pos: Point::new(*x, base + style.small_font_size + 2.0),
                text: display_token(&c.token),
                size: style.small_font_size,
                anchor: TextAnchor::Middle,
                bold: selected,
            })
            .fill("--text-color"),
        );
        drawn.push(rect);
    }
    let bounds = scene.bounds(group);
    union_all(drawn.into_iter().chain(bounds)).unwrap_or(Rect::ZERO)
}

/// Box showing the chosen next token below the distribution.
pub fn draw_selected_token(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    ctx: &LayoutContext,
    style: &StyleBag,
) -> Rect {
    let Some(token) = step.target_token() else {
        return Rect::ZERO;
    };
    let xs = ctx.bar_positions(step.candidates().len());
    let x = step
        .candidates()
        .iter()
        .position(|c| c.token == token)
        .and_then(|i| xs.get(i).copied())
        .or_else(|| ctx.last_token_x());
    let Some(x) = x else {
        return Rect::ZERO;
    };
    let text = display_token(token);
    let w = ctx.tokens.box_width(token, false);
    let rect = centered_rect(
        Point::new(x, ctx.stages.selected_y),
        w,
        ctx.geometry.token_box_height,
    );
    let mut node = Node::group().tagged([class::SELECTED_TOKEN]);
    if let Some(id) = step.selected_token.as_ref().and_then(|s| s.token_id) {
        node = node.with_data("token-id", id);
    }
    let g = scene.append(parent, node);
    scene.append(
        g,
        Node::new(Shape::Rect {
            rect,
            radius: ctx.geometry.corner_radius,
        })
        .fill("--background-color")
        .stroke("--selected-color", style.stroke_width * 1.5),
    );
    scene.append(
        g,
        Node::new(Shape::Text {
            pos: Point::new(x, ctx.stages.selected_y + style.font_size * 0.35),
            text,
            size: style.font_size,
            anchor: TextAnchor::Middle,
            bold: true,
        })
        .fill("--text-color"),
    );
    rect
}

#[cfg(test)]
#[path = "../../tests/unit/render/distribution.rs"]
mod tests;
