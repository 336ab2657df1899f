use crate::{
    foundation::core::{Point, Rect, union_all},
    layout::context::LayoutContext,
    render::theme::StyleBag,
    scene::model::{Node, NodeId, Scene, Shape, TextAnchor},
    selectors::registry::class,
    timeline::stages::{LabelKey, View},
};

const LABEL_HEIGHT: f64 = 24.0;

/// Fixed Y of each stage label, aligned with the stage it names.
pub fn label_y(key: LabelKey, ctx: &LayoutContext) -> f64 {
    let s = &ctx.stages;
    let g = &ctx.geometry;
    match key {
        LabelKey::Tokens => s.tokens_y,
        LabelKey::Embeddings => s.embed_top + s.column_height / 2.0,
        LabelKey::Transformer => s.block_top + g.block_padding / 2.0 + 4.0,
        LabelKey::Attention => {
            let (a, b) = s.attention_span();
            (a + b) / 2.0
        }
        LabelKey::FeedForward => s.ffn_y + s.column_height / 2.0,
        LabelKey::Output => s.logits_y,
        LabelKey::Distribution => s.distribution_base_y - g.bar_max_height / 2.0,
        LabelKey::Selection | LabelKey::Target => s.selected_y,
        LabelKey::Loss => (s.distribution_base_y + s.selected_y) / 2.0,
        LabelKey::Backprop => (s.block_top + s.block_bottom) / 2.0,
    }
}

/// Draw one label: a background (highlighted while the group is `active`) and its text.
pub fn draw_stage_label(
    scene: &mut Scene,
    parent: NodeId,
    key: LabelKey,
    text: &str,
    origin: Point,
    width: f64,
    style: &StyleBag,
) -> Rect {
    let phase = if key == LabelKey::Backprop {
        class::STAGE_LABEL_BACKPROP
    } else {
        class::STAGE_LABEL_FORWARD
    };
    let g = scene.append(
        parent,
        Node::group()
            .tagged([class::STAGE_LABEL, phase, key.class()])
            .with_data("stage", key.as_str()),
    );
    let bg = Rect::new(
        origin.x,
        origin.y - LABEL_HEIGHT / 2.0,
        origin.x + width,
        origin.y + LABEL_HEIGHT / 2.0,
    );
    scene.append(
        g,
        Node::new(Shape::Rect {
            rect: bg,
            radius: LABEL_HEIGHT / 2.0,
        })
        .tagged([class::STAGE_LABEL_BG])
        .fill("--label-bg"),
    );
    scene.append(
        g,
        Node::new(Shape::Text {
            pos: Point::new(origin.x + 10.0, origin.y + style.label_font_size * 0.35),
            text: text.to_owned(),
            size: style.label_font_size,
            anchor: TextAnchor::Start,
            bold: false,
        })
        .fill("--text-color"),
    );
    bg
}

/// Title of `key`, with the step's loss appended to the loss label when recorded.
pub fn label_text(key: LabelKey, loss: Option<f64>) -> String {
    match (key, loss) {
        (LabelKey::Loss, Some(loss)) => format!("{} {loss:.3}", key.title()),
        _ => key.title().to_owned(),
    }
}

/// Every label of `view`, stacked at their stage heights starting at `x`.
#[allow(clippy::too_many_arguments)]
pub fn draw_stage_labels(
    scene: &mut Scene,
    parent: NodeId,
    view: View,
    ctx: &LayoutContext,
    x: f64,
    width: f64,
    loss: Option<f64>,
    style: &StyleBag,
) -> Rect {
    let drawn: Vec<Rect> = LabelKey::for_view(view)
        .iter()
        .map(|key| {
            let origin = Point::new(x, label_y(*key, ctx));
            let text = label_text(*key, loss);
            draw_stage_label(scene, parent, *key, &text, origin, width, style)
        })
        .collect();
    union_all(drawn).unwrap_or(Rect::ZERO)
}
