/// Diagram variants, each with its own stage enumeration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    TextGeneration,
    Training,
    Decoding,
}

impl View {
    pub fn max_substep(self) -> u32 {
        match self {
            Self::TextGeneration => TextGenStage::SelectToken as u32,
            Self::Training => TrainingStage::BackpropEmbedding as u32,
            Self::Decoding => DecodingStage::Token as u32,
        }
    }

    pub fn contains(self, sub_step: u32) -> bool {
        sub_step <= self.max_substep()
    }

    /// Whether this view draws its stage labels into a separate label scene.
    pub fn has_label_root(self) -> bool {
        matches!(self, Self::Training)
    }

    pub fn stage_name(self, sub_step: u32) -> Option<&'static str> {
        match self {
            Self::TextGeneration => TextGenStage::from_u32(sub_step).map(TextGenStage::name),
            Self::Training => TrainingStage::from_u32(sub_step).map(TrainingStage::name),
            Self::Decoding => (sub_step == 0).then_some("token"),
        }
    }
}

impl std::str::FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text_generation" | "text-generation" | "generation" => Ok(Self::TextGeneration),
            "training" => Ok(Self::Training),
            "decoding" => Ok(Self::Decoding),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

macro_rules! stage_enum {
    ($(#[$m:meta])* $name:ident { $($variant:ident = $v:literal => $label:literal),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant = $v),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn from_u32(v: u32) -> Option<Self> {
                match v {
                    $($v => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }
    };
}

stage_enum! {
    /// Text generation: one forward pass per generated token.
    TextGenStage {
        Token = 0 => "token",
        Embedding = 1 => "embedding",
        BlockInputFirst = 2 => "block_input_first",
        Attention = 3 => "attention",
        BlockInsideBottom = 4 => "block_inside_bottom",
        FeedForward = 5 => "feed_forward",
        LayerStack = 6 => "layer_stack",
        ExtractLast = 7 => "extract_last",
        Logits = 8 => "logits",
        Distribution = 9 => "distribution",
        SelectToken = 10 => "select_token",
    }
}

stage_enum! {
    /// Training: a forward pass followed by the loss and a backprop sweep.
    TrainingStage {
        Token = 0 => "token",
        Embedding = 1 => "embedding",
        BlockInput = 2 => "block_input",
        Attention = 3 => "attention",
        BlockInsideBottom = 4 => "block_inside_bottom",
        FeedForward = 5 => "feed_forward",
        Logits = 6 => "logits",
        Distribution = 7 => "distribution",
        TargetVector = 8 => "target_vector",
        DiffArrow = 9 => "diff_arrow",
        BackpropStart = 10 => "backprop_start",
        BackpropOutput = 11 => "backprop_output",
        BackpropFfn = 12 => "backprop_ffn",
        BackpropAttention = 13 => "backprop_attention",
        BackpropEmbedding = 14 => "backprop_embedding",
    }
}

stage_enum! {
    /// Decoding placeholder.
    DecodingStage {
        Token = 0 => "token",
    }
}

/// First substep of the training backprop phase.
pub const BACKPROP_START: u32 = TrainingStage::BackpropStart as u32;

/// Stage labels shown next to the diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKey {
    Tokens,
    Embeddings,
    Transformer,
    Attention,
    FeedForward,
    Output,
    Distribution,
    Selection,
    Target,
    Loss,
    Backprop,
}

impl LabelKey {
    pub const ALL: &'static [Self] = &[
        Self::Tokens,
        Self::Embeddings,
        Self::Transformer,
        Self::Attention,
        Self::FeedForward,
        Self::Output,
        Self::Distribution,
        Self::Selection,
        Self::Target,
        Self::Loss,
        Self::Backprop,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::Embeddings => "embeddings",
            Self::Transformer => "transformer",
            Self::Attention => "attention",
            Self::FeedForward => "feed_forward",
            Self::Output => "output",
            Self::Distribution => "distribution",
            Self::Selection => "selection",
            Self::Target => "target",
            Self::Loss => "loss",
            Self::Backprop => "backprop",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Text shown in the label.
    pub fn title(self) -> &'static str {
        match self {
            Self::Tokens => "Tokens",
            Self::Embeddings => "Embeddings",
            Self::Transformer => "Transformer block",
            Self::Attention => "Attention",
            Self::FeedForward => "Feed-forward",
            Self::Output => "Output",
            Self::Distribution => "Probabilities",
            Self::Selection => "Next token",
            Self::Target => "Target",
            Self::Loss => "Loss",
            Self::Backprop => "Backpropagation",
        }
    }

    /// Labels drawn for a view, in top-to-bottom order.
    pub fn for_view(view: View) -> &'static [Self] {
        match view {
            View::TextGeneration => &[
                Self::Tokens,
                Self::Embeddings,
                Self::Transformer,
                Self::Attention,
                Self::FeedForward,
                Self::Output,
                Self::Distribution,
                Self::Selection,
            ],
            View::Training => &[
                Self::Tokens,
                Self::Embeddings,
                Self::Transformer,
                Self::Attention,
                Self::FeedForward,
                Self::Output,
                Self::Distribution,
                Self::Target,
                Self::Loss,
                Self::Backprop,
            ],
            View::Decoding => &[],
        }
    }
}
