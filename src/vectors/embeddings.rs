use crate::{
    foundation::error::{FlowError, FlowResult},
    model::step::Step,
    vectors::generator::{outer_seed, stage_seed, vector},
};

pub const INSIDE_TOP_VARIANT: &str = "insideTop";
pub const INSIDE_BOTTOM_VARIANT: &str = "insideBottom";
pub const FFN_VARIANT: &str = "ffn";
pub const LOGITS_VARIANT: &str = "logits";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Values per embedding column.
    pub dims: usize,
    /// Cells of the horizontal output rows (extracted vector, logprobs, target).
    pub row_cells: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dims: 5,
            row_cells: 6,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> FlowResult<()> {
        if self.dims < 2 {
            return Err(FlowError::validation("embedding dims must be >= 2"));
        }
        if self.row_cells < 2 {
            return Err(FlowError::validation("row cells must be >= 2"));
        }
        Ok(())
    }
}

/// Display vectors of a single token at each conceptual stage.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenEmbedding {
    pub outer: Vec<f64>,
    pub inside_top: Vec<f64>,
    pub inside_bottom: Vec<f64>,
    pub ffn: Vec<f64>,
}

/// Per-token display vectors for one step.
///
/// Never stored: re-deriving from the same step id and token texts gives identical values,
/// which keeps re-renders flicker-free.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingSet {
    pub per_token: Vec<TokenEmbedding>,
}

impl EmbeddingSet {
    pub fn derive(step_id: u64, tokens: &[String], dims: usize) -> Self {
        let per_token = tokens
            .iter()
            .map(|t| TokenEmbedding {
                outer: vector(&outer_seed(t), dims),
                inside_top: vector(&stage_seed(INSIDE_TOP_VARIANT, step_id, t), dims),
                inside_bottom: vector(&stage_seed(INSIDE_BOTTOM_VARIANT, step_id, t), dims),
                ffn: vector(&stage_seed(FFN_VARIANT, step_id, t), dims),
            })
            .collect();
        Self { per_token }
    }

    pub fn for_step(step: &Step, cfg: &EmbeddingConfig) -> Self {
        Self::derive(step.step, &step.tokens, cfg.dims)
    }

    pub fn get(&self, idx: usize) -> Option<&TokenEmbedding> {
        self.per_token.get(idx)
    }

    pub fn len(&self) -> usize {
        self.per_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_token.is_empty()
    }

    pub fn last(&self) -> Option<&TokenEmbedding> {
        self.per_token.last()
    }
}

/// Final hidden state of the last token, shown as the extracted row.
pub fn extracted_vector(step: &Step, len: usize) -> Vec<f64> {
    let Some(last) = step.tokens.last() else {
        return Vec::new();
    };
    vector(&stage_seed(FFN_VARIANT, step.step, last), len)
}

/// Log-probabilities of the displayed candidates, or generated stand-ins when the step has no
/// distribution.
pub fn logprob_vector(step: &Step, len: usize) -> Vec<f64> {
    let candidates = step.candidates();
    if !candidates.is_empty() {
        return candidates.iter().take(len).map(|c| c.logprob()).collect();
    }
    let Some(last) = step.tokens.last() else {
        return Vec::new();
    };
    // Map [-1, 1) onto a plausible logprob band.
    vector(&stage_seed(LOGITS_VARIANT, step.step, last), len)
        .into_iter()
        .map(|v| v * 2.0 - 3.0)
        .collect()
}

/// One-hot training target aligned with the displayed candidates.
pub fn target_vector(step: &Step, len: usize) -> Vec<f64> {
    let mut out = vec![0.0; len];
    if len == 0 {
        return out;
    }
    let hot = step
        .target_token()
        .and_then(|t| step.candidates().iter().take(len).position(|c| c.token == t))
        .unwrap_or(0);
    out[hot] = 1.0;
    out
}

#[cfg(test)]
#[path = "../../tests/unit/vectors/embeddings.rs"]
mod tests;
