use crate::{
    scene::model::{NodeRef, RootId, SceneRoots},
    timeline::stages::LabelKey,
};

/// Class names carried by scene nodes. Nothing else in the crate spells these strings.
pub mod class {
    pub const TOKEN: &str = "token";
    pub const NEW_TOKEN: &str = "new-token";
    pub const PREV_TOKEN: &str = "prev-token";
    pub const TOKEN_GAP: &str = "token-gap";
    pub const TOKEN_ID: &str = "token-id";

    pub const EMBEDDING_GROUP: &str = "embedding-group";
    pub const EMBEDDING_ARROW: &str = "embedding-arrow";

    pub const TRANSFORMER_BOX: &str = "transformer-box";
    pub const TRANSFORMER_SHADOW: &str = "transformer-shadow";
    pub const INSIDE_TOP: &str = "inside-top";
    pub const INSIDE_BOTTOM: &str = "inside-bottom";
    pub const ATTENTION_CONNECTION: &str = "attention-connection";
    pub const FFN_CONNECTOR: &str = "ffn-connector";
    pub const FFN_BOX: &str = "ffn-box";
    pub const FFN_COLUMN: &str = "ffn-column";

    pub const EXTRACT_ARROW: &str = "extract-arrow";
    pub const EXTRACTED_VECTOR: &str = "extracted-vector";
    pub const LOGPROB_ARROW: &str = "logprob-arrow";
    pub const LOGPROB_VECTOR: &str = "logprob-vector";
    pub const DISTRIBUTION: &str = "distribution";
    pub const DISTRIBUTION_BAR: &str = "distribution-bar";
    pub const SELECTED: &str = "selected";
    pub const SELECTED_TOKEN: &str = "selected-token";
    pub const TARGET_VECTOR: &str = "target-vector";
    pub const DIFF_ARROW: &str = "diff-arrow";

    pub const BP_FEEDBACK: &str = "bp-feedback";
    pub const BP_OUTPUT: &str = "bp-output";
    pub const BP_CONNECTION_GREEN: &str = "bp-connection-green";
    pub const BP_CONNECTION_RED: &str = "bp-connection-red";
    pub const BP_GREY: &str = "bp-grey";
    pub const BP_ACTIVE: &str = "bp-active";

    pub const ACTIVE: &str = "active";
    pub const STAGE_LABEL: &str = "stage-label";
    pub const STAGE_LABEL_BG: &str = "stage-label-bg";
    pub const STAGE_LABEL_FORWARD: &str = "stage-label-forward";
    pub const STAGE_LABEL_BACKPROP: &str = "stage-label-backprop";

    pub const VECTOR_CELL: &str = "vector-cell";
    pub const ARROW_HEAD: &str = "arrow-head";
}

/// Tags toggled by timelines; cleared before every initial-state snap.
pub const DYNAMIC_TAGS: &[&str] = &[class::ACTIVE, class::BP_GREY, class::BP_ACTIVE];

/// Which scene a query searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootHint {
    Main,
    /// The label scene when one is mounted, the main scene otherwise.
    Labels,
}

/// Conjunction of class names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Query {
    pub all_of: &'static [&'static str],
    pub root: RootHint,
}

const fn main(all_of: &'static [&'static str]) -> Query {
    Query {
        all_of,
        root: RootHint::Main,
    }
}

const fn labels(all_of: &'static [&'static str]) -> Query {
    Query {
        all_of,
        root: RootHint::Labels,
    }
}

/// Logical element names used by the timelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Selector {
    Token,
    NewToken,
    PrevToken,
    TokenGap,
    EmbeddingGroupAll,
    EmbeddingNew,
    EmbeddingArrows,
    TransformerBox,
    TransformerShadow,
    InsideTopAll,
    InsideBottomAll,
    AttentionMeshAll,
    FfnConnectors,
    FfnBox,
    FfnColumns,
    ExtractArrow,
    ExtractedVector,
    LogprobArrow,
    LogprobVector,
    DistributionAll,
    DistributionBars,
    SelectedBar,
    SelectedToken,
    TargetVector,
    DiffArrow,
    BackpropFeedback,
    BpOutputConnections,
    BpFfnConnections,
    BpAttentionConnections,
    BpEmbeddingConnections,
    StageLabelAll,
    StageLabel(LabelKey),
    ForwardLabels,
    BackpropLabel,
}

impl Selector {
    /// Every selector, one per label key for [`Selector::StageLabel`].
    pub fn all() -> Vec<Self> {
        let mut out = vec![
            Self::Token,
            Self::NewToken,
            Self::PrevToken,
            Self::TokenGap,
            Self::EmbeddingGroupAll,
            Self::EmbeddingNew,
            Self::EmbeddingArrows,
            Self::TransformerBox,
            Self::TransformerShadow,
            Self::InsideTopAll,
            Self::InsideBottomAll,
            Self::AttentionMeshAll,
            Self::FfnConnectors,
            Self::FfnBox,
            Self::FfnColumns,
            Self::ExtractArrow,
            Self::ExtractedVector,
            Self::LogprobArrow,
            Self::LogprobVector,
            Self::DistributionAll,
            Self::DistributionBars,
            Self::SelectedBar,
            Self::SelectedToken,
            Self::TargetVector,
            Self::DiffArrow,
            Self::BackpropFeedback,
            Self::BpOutputConnections,
            Self::BpFfnConnections,
            Self::BpAttentionConnections,
            Self::BpEmbeddingConnections,
            Self::StageLabelAll,
            Self::ForwardLabels,
            Self::BackpropLabel,
        ];
        out.extend(LabelKey::ALL.iter().map(|k| Self::StageLabel(*k)));
        out
    }

    /// Stable logical name.
    pub fn name(self) -> String {
        match self {
            Self::StageLabel(k) => format!("stageLabel:{}", k.as_str()),
            other => serde_json::to_value(other)
                .ok()
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = name.strip_prefix("stageLabel:") {
            return LabelKey::from_str_opt(key).map(Self::StageLabel);
        }
        // Older scripts used the misspelled mesh name.
        if name == "attentionMashAll" {
            return Some(Self::AttentionMeshAll);
        }
        serde_json::from_value(serde_json::Value::String(name.to_owned())).ok()
    }

    pub fn queries(self) -> &'static [Query] {
        use class::*;
        match self {
            Self::Token => &const { [main(&[TOKEN])] },
            Self::NewToken => &const { [main(&[TOKEN, NEW_TOKEN])] },
            Self::PrevToken => &const { [main(&[TOKEN, PREV_TOKEN])] },
            Self::TokenGap => &const { [main(&[TOKEN_GAP])] },
            Self::EmbeddingGroupAll => &const { [main(&[EMBEDDING_GROUP])] },
            Self::EmbeddingNew => &const { [main(&[EMBEDDING_GROUP, NEW_TOKEN])] },
            Self::EmbeddingArrows => &const { [main(&[EMBEDDING_ARROW])] },
            Self::TransformerBox => &const { [main(&[TRANSFORMER_BOX])] },
            Self::TransformerShadow => &const { [main(&[TRANSFORMER_SHADOW])] },
            Self::InsideTopAll => &const { [main(&[INSIDE_TOP])] },
            Self::InsideBottomAll => &const { [main(&[INSIDE_BOTTOM])] },
            Self::AttentionMeshAll => &const { [main(&[ATTENTION_CONNECTION])] },
            Self::FfnConnectors => &const { [main(&[FFN_CONNECTOR])] },
            Self::FfnBox => &const { [main(&[FFN_BOX])] },
            Self::FfnColumns => &const { [main(&[FFN_COLUMN])] },
            Self::ExtractArrow => &const { [main(&[EXTRACT_ARROW])] },
            Self::ExtractedVector => &const { [main(&[EXTRACTED_VECTOR])] },
            Self::LogprobArrow => &const { [main(&[LOGPROB_ARROW])] },
            Self::LogprobVector => &const { [main(&[LOGPROB_VECTOR])] },
            Self::DistributionAll => &const { [main(&[DISTRIBUTION])] },
            Self::DistributionBars => &const { [main(&[DISTRIBUTION_BAR])] },
            Self::SelectedBar => &const { [main(&[DISTRIBUTION_BAR, SELECTED])] },
            Self::SelectedToken => &const { [main(&[SELECTED_TOKEN])] },
            Self::TargetVector => &const { [main(&[TARGET_VECTOR])] },
            Self::DiffArrow => &const { [main(&[DIFF_ARROW])] },
            Self::BackpropFeedback => &const { [main(&[BP_FEEDBACK])] },
            Self::BpOutputConnections => &const { [main(&[BP_OUTPUT])] },
            Self::BpFfnConnections => &const { [main(&[FFN_CONNECTOR])] },
            Self::BpAttentionConnections => &const { [main(&[ATTENTION_CONNECTION])] },
            Self::BpEmbeddingConnections => &const { [main(&[EMBEDDING_ARROW])] },
            Self::StageLabelAll => &const { [labels(&[STAGE_LABEL])] },
            Self::StageLabel(key) => key.queries(),
            Self::ForwardLabels => &const { [labels(&[STAGE_LABEL_FORWARD])] },
            Self::BackpropLabel => &const { [labels(&[STAGE_LABEL_BACKPROP])] },
        }
    }
}

impl LabelKey {
    fn queries(self) -> &'static [Query] {
        use class::*;
        match self {
            Self::Tokens => &const { [labels(&[STAGE_LABEL, "stage-label-tokens"])] },
            Self::Embeddings => &const { [labels(&[STAGE_LABEL, "stage-label-embeddings"])] },
            Self::Transformer => &const { [labels(&[STAGE_LABEL, "stage-label-transformer"])] },
            Self::Attention => &const { [labels(&[STAGE_LABEL, "stage-label-attention"])] },
            Self::FeedForward => &const { [labels(&[STAGE_LABEL, "stage-label-feed-forward"])] },
            Self::Output => &const { [labels(&[STAGE_LABEL, "stage-label-output"])] },
            Self::Distribution => &const { [labels(&[STAGE_LABEL, "stage-label-distribution"])] },
            Self::Selection => &const { [labels(&[STAGE_LABEL, "stage-label-selection"])] },
            Self::Target => &const { [labels(&[STAGE_LABEL, "stage-label-target"])] },
            Self::Loss => &const { [labels(&[STAGE_LABEL, "stage-label-loss"])] },
            Self::Backprop => &const { [labels(&[STAGE_LABEL, STAGE_LABEL_BACKPROP])] },
        }
    }

    /// Class carried by this label's group.
    pub fn class(self) -> &'static str {
        self.queries()[0].all_of[1]
    }
}

fn target_root(roots: &SceneRoots, hint: RootHint) -> RootId {
    match hint {
        RootHint::Main => RootId::Main,
        RootHint::Labels if roots.labels.is_some() => RootId::Labels,
        RootHint::Labels => RootId::Main,
    }
}

/// Live nodes matched by `selector`, in document order (main scene first), without duplicates.
///
/// An empty result is normal: callers skip the operation.
pub fn resolve(roots: &SceneRoots, selector: Selector) -> Vec<NodeRef> {
    let queries = selector.queries();
    let mut out = Vec::new();
    for root in [RootId::Main, RootId::Labels] {
        let Some(scene) = roots.get(root) else {
            continue;
        };
        let active: Vec<&Query> = queries
            .iter()
            .filter(|q| target_root(roots, q.root) == root)
            .collect();
        if active.is_empty() {
            continue;
        }
        for id in scene.walk() {
            let Some(node) = scene.node(id) else {
                continue;
            };
            if active.iter().any(|q| node.tags.contains_all(q.all_of)) {
                out.push(NodeRef { root, id });
            }
        }
    }
    if out.is_empty() {
        tracing::trace!(selector = %selector.name(), "selector resolved to no nodes");
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/selectors/registry.rs"]
mod tests;
