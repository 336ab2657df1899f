//! Static `(view, sub_step) -> [OpSpec]` tables.
//!
//! Times are fractions of the substep duration so one table serves every animation speed.

use crate::{
    animation::{ease::Ease, tween::Span},
    scene::model::Prop,
    selectors::registry::{Selector, class},
    timeline::{
        script::{AnimOp, AnimationScript, OpKind, PropTarget},
        stages::{LabelKey, TextGenStage, TrainingStage, View},
    },
};

/// Which kind of step an op applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum When {
    Always,
    /// Only on the first generation step, where every token is new.
    Initial,
    /// Only on later steps, where only the last token is new.
    Continuation,
}

impl When {
    fn matches(self, is_initial: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Initial => is_initial,
            Self::Continuation => !is_initial,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpecKind {
    Tween {
        props: &'static [PropTarget],
        ease: Ease,
        /// Fraction of the duration between consecutive targets.
        stagger: f64,
    },
    Tags {
        add: &'static [&'static str],
        remove: &'static [&'static str],
    },
}

/// Unscaled op description.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpSpec {
    pub target: Selector,
    pub kind: SpecKind,
    /// Start, as a fraction of the duration.
    pub at: f64,
    /// Length, as a fraction of the duration.
    pub len: f64,
    pub when: When,
}

impl OpSpec {
    pub fn to_op(&self, duration: f64) -> AnimOp {
        let d = duration.max(0.0);
        let kind = match self.kind {
            SpecKind::Tween {
                props,
                ease,
                stagger,
            } => OpKind::Tween {
                props: props.to_vec(),
                ease,
                stagger: stagger * d,
            },
            SpecKind::Tags { add, remove } => OpKind::Tags {
                add: add.to_vec(),
                remove: remove.to_vec(),
            },
        };
        AnimOp {
            targets: self.target,
            kind,
            span: Span::new(self.at * d, self.len * d),
        }
    }

    const fn only(mut self, when: When) -> Self {
        self.when = when;
        self
    }

    const fn staggered(mut self, stagger: f64) -> Self {
        if let SpecKind::Tween { props, ease, .. } = self.kind {
            self.kind = SpecKind::Tween {
                props,
                ease,
                stagger,
            };
        }
        self
    }
}

const SHOW: &[PropTarget] = &[PropTarget::to(Prop::Opacity, 1.0)];
const HIDE: &[PropTarget] = &[PropTarget::to(Prop::Opacity, 0.0)];
const FADE_IN: &[PropTarget] = &[PropTarget::from_to(Prop::Opacity, 0.0, 1.0)];
const DRAW_IN: &[PropTarget] = &[
    PropTarget::from_to(Prop::Opacity, 0.0, 1.0),
    PropTarget::from_to(Prop::Draw, 0.0, 1.0),
];
const GROW_IN: &[PropTarget] = &[
    PropTarget::from_to(Prop::Opacity, 0.0, 1.0),
    PropTarget::from_to(Prop::Grow, 0.0, 1.0),
];
const DROP_IN: &[PropTarget] = &[
    PropTarget::from_to(Prop::Opacity, 0.0, 1.0),
    PropTarget::from_to(Prop::OffsetY, -16.0, 0.0),
];
const SLIDE_IN: &[PropTarget] = &[
    PropTarget::from_to(Prop::Opacity, 0.0, 1.0),
    PropTarget::from_to(Prop::OffsetX, -12.0, 0.0),
];

const fn tween(target: Selector, props: &'static [PropTarget], at: f64, len: f64) -> OpSpec {
    OpSpec {
        target,
        kind: SpecKind::Tween {
            props,
            ease: Ease::InOutQuad,
            stagger: 0.0,
        },
        at,
        len,
        when: When::Always,
    }
}

const fn set(target: Selector, props: &'static [PropTarget]) -> OpSpec {
    tween(target, props, 0.0, 0.0)
}

const fn tags(
    target: Selector,
    add: &'static [&'static str],
    remove: &'static [&'static str],
    at: f64,
) -> OpSpec {
    OpSpec {
        target,
        kind: SpecKind::Tags { add, remove },
        at,
        len: 0.0,
        when: When::Always,
    }
}

const ACTIVE: &[&str] = &[class::ACTIVE];
const NONE: &[&str] = &[];

macro_rules! activate_label {
    ($key:expr) => {
        [
            tags(Selector::StageLabelAll, NONE, ACTIVE, 0.0),
            tags(Selector::StageLabel($key), ACTIVE, NONE, 0.0),
            tween(Selector::StageLabel($key), SHOW, 0.0, 0.25),
        ]
    };
}

/// Hidden-until-animated elements, shared by every view's baseline.
const HIDDEN_AT_START: &[Selector] = &[
    Selector::Token,
    Selector::TokenGap,
    Selector::EmbeddingGroupAll,
    Selector::TransformerBox,
    Selector::TransformerShadow,
    Selector::InsideTopAll,
    Selector::InsideBottomAll,
    Selector::AttentionMeshAll,
    Selector::FfnConnectors,
    Selector::FfnBox,
    Selector::FfnColumns,
    Selector::ExtractArrow,
    Selector::ExtractedVector,
    Selector::LogprobArrow,
    Selector::LogprobVector,
    Selector::DistributionAll,
    Selector::SelectedToken,
    Selector::TargetVector,
    Selector::DiffArrow,
    Selector::BackpropFeedback,
    Selector::BpOutputConnections,
    Selector::StageLabelAll,
];

/// Ops that bring a scene from "as rendered" to the state before substep 0.
///
/// Training always replays the whole sequence, so `is_initial` only matters for text generation.
pub fn baseline(view: View, is_initial: bool) -> Vec<OpSpec> {
    if view == View::Decoding {
        return Vec::new();
    }
    let mut out: Vec<OpSpec> = HIDDEN_AT_START.iter().map(|s| set(*s, HIDE)).collect();
    if view == View::TextGeneration && !is_initial {
        // Earlier tokens carry over from the previous step; only the new one animates in.
        out.extend([
            set(Selector::Token, SHOW),
            set(Selector::TokenGap, SHOW),
            set(Selector::NewToken, HIDE),
            set(Selector::EmbeddingGroupAll, SHOW),
            set(Selector::EmbeddingNew, HIDE),
        ]);
    }
    out
}

fn text_generation(stage: TextGenStage) -> Vec<OpSpec> {
    use TextGenStage as S;
    let mut ops: Vec<OpSpec> = match stage {
        S::Token => vec![
            tween(Selector::Token, FADE_IN, 0.0, 0.4)
                .staggered(0.06)
                .only(When::Initial),
            tween(Selector::TokenGap, FADE_IN, 0.2, 0.4).only(When::Initial),
            tween(Selector::NewToken, DROP_IN, 0.0, 0.6).only(When::Continuation),
        ],
        S::Embedding => vec![
            tween(Selector::EmbeddingGroupAll, FADE_IN, 0.0, 0.5)
                .staggered(0.05)
                .only(When::Initial),
            tween(Selector::EmbeddingArrows, DRAW_IN, 0.0, 0.5).only(When::Initial),
            tween(Selector::EmbeddingNew, DROP_IN, 0.0, 0.6).only(When::Continuation),
        ],
        S::BlockInputFirst => vec![
            tween(Selector::TransformerBox, FADE_IN, 0.0, 0.4),
            tween(Selector::InsideTopAll, DROP_IN, 0.3, 0.5).staggered(0.03),
        ],
        S::Attention => vec![tween(Selector::AttentionMeshAll, DRAW_IN, 0.0, 0.6).staggered(0.01)],
        S::BlockInsideBottom => {
            vec![tween(Selector::InsideBottomAll, DROP_IN, 0.0, 0.6).staggered(0.03)]
        }
        S::FeedForward => vec![
            tween(Selector::FfnConnectors, DRAW_IN, 0.0, 0.5).staggered(0.02),
            tween(Selector::FfnBox, FADE_IN, 0.2, 0.4),
            tween(Selector::FfnColumns, DROP_IN, 0.5, 0.5).staggered(0.03),
        ],
        S::LayerStack => vec![tween(Selector::TransformerShadow, SLIDE_IN, 0.0, 0.6).staggered(0.08)],
        S::ExtractLast => vec![
            tween(Selector::ExtractArrow, DRAW_IN, 0.0, 0.5),
            tween(Selector::ExtractedVector, FADE_IN, 0.4, 0.6),
        ],
        S::Logits => vec![
            tween(Selector::LogprobArrow, DRAW_IN, 0.0, 0.5),
            tween(Selector::LogprobVector, FADE_IN, 0.4, 0.6),
        ],
        S::Distribution => vec![
            tween(Selector::DistributionAll, SHOW, 0.0, 0.2),
            tween(Selector::DistributionBars, GROW_IN, 0.1, 0.6).staggered(0.04),
        ],
        S::SelectToken => vec![tween(Selector::SelectedToken, DROP_IN, 0.0, 0.7)],
    };
    let label = match stage {
        S::Token => LabelKey::Tokens,
        S::Embedding => LabelKey::Embeddings,
        S::BlockInputFirst | S::LayerStack => LabelKey::Transformer,
        S::Attention | S::BlockInsideBottom => LabelKey::Attention,
        S::FeedForward => LabelKey::FeedForward,
        S::ExtractLast | S::Logits => LabelKey::Output,
        S::Distribution => LabelKey::Distribution,
        S::SelectToken => LabelKey::Selection,
    };
    ops.extend(activate_label!(label));
    ops
}

/// Members of the backprop grey set.
pub const BACKPROP_GREY_SET: &[Selector] = &[
    Selector::InsideTopAll,
    Selector::InsideBottomAll,
    Selector::FfnColumns,
    Selector::AttentionMeshAll,
    Selector::ExtractedVector,
    Selector::LogprobVector,
    Selector::DistributionAll,
];

const GREY: &[&str] = &[class::BP_GREY];
const BP_ACTIVE: &[&str] = &[class::BP_ACTIVE];

fn training(stage: TrainingStage) -> Vec<OpSpec> {
    use TrainingStage as S;
    let forward_label = |key| activate_label!(key).to_vec();
    match stage {
        S::Token => {
            let mut ops = vec![
                tween(Selector::Token, FADE_IN, 0.0, 0.4).staggered(0.06),
                tween(Selector::TokenGap, FADE_IN, 0.2, 0.4),
            ];
            ops.extend(forward_label(LabelKey::Tokens));
            ops
        }
        S::Embedding => {
            let mut ops = vec![
                tween(Selector::EmbeddingGroupAll, FADE_IN, 0.0, 0.5).staggered(0.05),
                tween(Selector::EmbeddingArrows, DRAW_IN, 0.0, 0.5),
            ];
            ops.extend(forward_label(LabelKey::Embeddings));
            ops
        }
        S::BlockInput => {
            let mut ops = vec![
                tween(Selector::TransformerBox, FADE_IN, 0.0, 0.4),
                tween(Selector::TransformerShadow, SLIDE_IN, 0.0, 0.4).staggered(0.05),
                tween(Selector::InsideTopAll, DROP_IN, 0.3, 0.5).staggered(0.03),
            ];
            ops.extend(forward_label(LabelKey::Transformer));
            ops
        }
        S::Attention => {
            let mut ops =
                vec![tween(Selector::AttentionMeshAll, DRAW_IN, 0.0, 0.6).staggered(0.01)];
            ops.extend(forward_label(LabelKey::Attention));
            ops
        }
        S::BlockInsideBottom => {
            vec![tween(Selector::InsideBottomAll, DROP_IN, 0.0, 0.6).staggered(0.03)]
        }
        S::FeedForward => {
            let mut ops = vec![
                tween(Selector::FfnConnectors, DRAW_IN, 0.0, 0.5).staggered(0.02),
                tween(Selector::FfnBox, FADE_IN, 0.2, 0.4),
                tween(Selector::FfnColumns, DROP_IN, 0.5, 0.5).staggered(0.03),
            ];
            ops.extend(forward_label(LabelKey::FeedForward));
            ops
        }
        S::Logits => {
            let mut ops = vec![
                tween(Selector::LogprobArrow, DRAW_IN, 0.0, 0.5),
                tween(Selector::LogprobVector, FADE_IN, 0.4, 0.6),
            ];
            ops.extend(forward_label(LabelKey::Output));
            ops
        }
        S::Distribution => {
            let mut ops = vec![
                tween(Selector::DistributionAll, SHOW, 0.0, 0.2),
                tween(Selector::DistributionBars, GROW_IN, 0.1, 0.6).staggered(0.04),
            ];
            ops.extend(forward_label(LabelKey::Distribution));
            ops
        }
        S::TargetVector => {
            let mut ops = vec![tween(Selector::TargetVector, DROP_IN, 0.0, 0.6)];
            ops.extend(forward_label(LabelKey::Target));
            ops
        }
        S::DiffArrow => {
            let mut ops = vec![tween(Selector::DiffArrow, DRAW_IN, 0.0, 0.7)];
            ops.extend(forward_label(LabelKey::Loss));
            ops
        }
        S::BackpropStart => {
            let mut ops: Vec<OpSpec> = BACKPROP_GREY_SET
                .iter()
                .map(|s| tags(*s, GREY, NONE, 0.0))
                .collect();
            ops.extend([
                tags(Selector::ForwardLabels, NONE, ACTIVE, 0.0),
                tween(Selector::ForwardLabels, HIDE, 0.0, 0.4),
                tags(Selector::BackpropLabel, ACTIVE, NONE, 0.0),
                tween(Selector::BackpropLabel, SHOW, 0.3, 0.4),
                tween(Selector::BackpropFeedback, DRAW_IN, 0.2, 0.7),
            ]);
            ops
        }
        S::BackpropOutput => vec![
            tween(Selector::BpOutputConnections, DRAW_IN, 0.0, 0.6).staggered(0.02),
            tags(Selector::BpOutputConnections, BP_ACTIVE, NONE, 0.0),
        ],
        S::BackpropFfn => vec![tags(Selector::BpFfnConnections, BP_ACTIVE, NONE, 0.0)],
        S::BackpropAttention => {
            vec![tags(Selector::BpAttentionConnections, BP_ACTIVE, NONE, 0.0)]
        }
        S::BackpropEmbedding => {
            vec![tags(Selector::BpEmbeddingConnections, BP_ACTIVE, NONE, 0.0)]
        }
    }
}

/// Unscaled ops of `(view, sub_step)`. Unknown substeps yield nothing.
pub fn specs(view: View, sub_step: u32, is_initial: bool) -> Vec<OpSpec> {
    let all = match view {
        View::TextGeneration => TextGenStage::from_u32(sub_step)
            .map(text_generation)
            .unwrap_or_default(),
        View::Training => TrainingStage::from_u32(sub_step)
            .map(training)
            .unwrap_or_default(),
        View::Decoding => Vec::new(),
    };
    all.into_iter()
        .filter(|s| s.when.matches(is_initial))
        .collect()
}

/// Scaled script of `(view, sub_step)`.
pub fn script(view: View, sub_step: u32, is_initial: bool, duration: f64) -> AnimationScript {
    AnimationScript {
        view,
        sub_step,
        duration,
        ops: specs(view, sub_step, is_initial)
            .iter()
            .map(|s| s.to_op(duration))
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/table.rs"]
mod tests;
