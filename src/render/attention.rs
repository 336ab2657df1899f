use crate::{
    foundation::core::{Point, Rect, union_all},
    layout::context::LayoutContext,
    render::{
        arrows::{draw_connector, polarity_tag, s_curve},
        theme::StyleBag,
    },
    scene::model::{NodeId, Scene},
    selectors::registry::class,
};

/// Which attention connections to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttentionPattern {
    /// Every visible pair `(i, j)` with `i <= j`.
    Causal,
    /// Every visible source into the one target token.
    FanIn { target: usize },
}

impl AttentionPattern {
    /// Causal on the first generation step, otherwise fan-in to the last token.
    pub fn for_step(is_initial: bool, last_token: usize) -> Self {
        if is_initial {
            Self::Causal
        } else {
            Self::FanIn { target: last_token }
        }
    }
}

/// `(source, target)` token index pairs among the visible `tokens` (ascending).
pub fn attention_pairs(tokens: &[usize], pattern: AttentionPattern) -> Vec<(usize, usize)> {
    match pattern {
        AttentionPattern::Causal => tokens
            .iter()
            .flat_map(move |&i| {
                tokens
                    .iter()
                    .filter(move |&&j| i <= j)
                    .map(move |&j| (i, j))
            })
            .collect(),
        AttentionPattern::FanIn { target } => {
            if !tokens.contains(&target) {
                return Vec::new();
            }
            tokens.iter().map(|&i| (i, target)).collect()
        }
    }
}

/// Connections from the bottom of the inside-top columns to the top of the inside-bottom ones.
pub fn draw_attention(
    scene: &mut Scene,
    parent: NodeId,
    ctx: &LayoutContext,
    pattern: AttentionPattern,
    style: &StyleBag,
) -> Rect {
    let (y0, y1) = ctx.stages.attention_span();
    let visible: Vec<usize> = ctx.meta.token_slots().map(|(_, idx, _)| idx).collect();
    let mut drawn = Vec::new();
    for (src, dst) in attention_pairs(&visible, pattern) {
        let (Some(x0), Some(x1)) = (ctx.meta.x_of(src), ctx.meta.x_of(dst)) else {
            continue;
        };
        let path = s_curve(Point::new(x0, y0 + 2.0), Point::new(x1, y1 - 2.0));
        let polarity = polarity_tag(&format!("attn|{src}|{dst}"));
        let (id, r) = draw_connector(
            scene,
            parent,
            path,
            &[class::ATTENTION_CONNECTION, polarity],
            "--attention-color",
            style,
        );
        if let Some(n) = scene.node_mut(id) {
            n.data.insert("src".to_owned(), src.to_string());
            n.data.insert("dst".to_owned(), dst.to_string());
        }
        drawn.push(r);
    }
    union_all(drawn).unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/render/attention.rs"]
mod tests;
