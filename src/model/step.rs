use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{FlowError, FlowResult};

/// One discrete point of the simulated forward/backward pass.
///
/// Steps are produced by the host (or loaded from an [`ExampleFile`]) and are immutable once
/// handed to a [`crate::SceneMount`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Step {
    /// Generation step ordinal; `0` is the first generation step.
    #[serde(default)]
    pub step: u64,
    /// Full input text for this step, if the producer recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_text: Option<String>,
    /// Token pieces, in order.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Vocabulary ids aligned with `tokens` (may be empty).
    #[serde(default)]
    pub token_ids: Vec<i64>,
    /// Next-token distribution, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_distribution: Option<OutputDistribution>,
    /// Token chosen from the distribution, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_token: Option<SelectedToken>,
    /// Forward-only or forward + backprop visualization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viz_mode: Option<VizMode>,
    /// Cross-entropy of the target token, recorded by training examples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutputDistribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candidate {
    pub token: String,
    pub prob: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprob: Option<f64>,
}

impl Candidate {
    /// Log-probability, derived from `prob` when the producer did not record it.
    pub fn logprob(&self) -> f64 {
        self.logprob.unwrap_or_else(|| self.prob.max(1e-10).ln())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SelectedToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_method: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VizMode {
    #[default]
    Forward,
    Backprop,
}

impl Step {
    /// Minimal step with the given tokens and no distribution.
    pub fn from_tokens<S: Into<String>>(step: u64, tokens: impl IntoIterator<Item = S>) -> Self {
        Self {
            step,
            tokens: tokens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// First generation step: every token is part of the prompt and attention is drawn causally.
    pub fn is_initial(&self) -> bool {
        self.step == 0
    }

    pub fn token_id(&self, idx: usize) -> Option<i64> {
        self.token_ids.get(idx).copied()
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.output_distribution
            .as_ref()
            .map(|d| d.candidates.as_slice())
            .unwrap_or(&[])
    }

    /// Token the output is compared against: the selected token, else the top candidate.
    pub fn target_token(&self) -> Option<&str> {
        if let Some(sel) = &self.selected_token {
            return Some(sel.token.as_str());
        }
        self.candidates()
            .iter()
            .max_by(|a, b| a.prob.total_cmp(&b.prob))
            .map(|c| c.token.as_str())
    }

    pub fn viz_mode(&self) -> VizMode {
        self.viz_mode.unwrap_or_default()
    }

    pub fn validate(&self) -> FlowResult<()> {
        // A step without tokens renders nothing, whatever ids it carries.
        let ids_misaligned = !self.tokens.is_empty()
            && !self.token_ids.is_empty()
            && self.token_ids.len() != self.tokens.len();
        if ids_misaligned {
            return Err(FlowError::validation(format!(
                "step {}: {} token ids for {} tokens",
                self.step,
                self.token_ids.len(),
                self.tokens.len()
            )));
        }
        for c in self.candidates() {
            if !c.prob.is_finite() || c.prob < 0.0 {
                return Err(FlowError::validation(format!(
                    "step {}: candidate {:?} has invalid probability {}",
                    self.step, c.token, c.prob
                )));
            }
        }
        if let Some(loss) = self.loss
            && !loss.is_finite()
        {
            return Err(FlowError::validation(format!(
                "step {}: loss must be finite",
                self.step
            )));
        }
        Ok(())
    }
}

/// One position of a training example: the context before it and the token it should predict.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingStep {
    #[serde(default)]
    pub step: u64,
    #[serde(default)]
    pub input_tokens: Vec<String>,
    #[serde(default)]
    pub input_token_ids: Vec<i64>,
    #[serde(default)]
    pub target_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_token_id: Option<i64>,
    /// Top-k predictions made from the context.
    #[serde(default)]
    pub predictions: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_logprob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
}

impl TrainingStep {
    /// Backprop step whose token row is the context and whose selected token is the target.
    pub fn to_step(&self) -> Step {
        let output_distribution = (!self.predictions.is_empty()).then(|| OutputDistribution {
            top_k: u32::try_from(self.predictions.len()).ok(),
            candidates: self.predictions.clone(),
        });
        Step {
            step: self.step,
            input_text: None,
            tokens: self.input_tokens.clone(),
            token_ids: self.input_token_ids.clone(),
            output_distribution,
            selected_token: Some(SelectedToken {
                token: self.target_token.clone(),
                token_id: self.target_token_id,
                selection_method: Some("target".to_owned()),
            }),
            viz_mode: Some(VizMode::Backprop),
            loss: self.loss,
        }
    }
}

/// Metadata about the model that produced an example.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_layers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_attention_heads: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab_size: Option<u32>,
}

/// A precomputed example as written by the data generators.
///
/// Inference examples carry `generation_steps`; training examples carry `training_steps` (one
/// per predicted position) plus the full tokenized `text`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExampleFile {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
    #[serde(default)]
    pub generation_steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub training_steps: Vec<TrainingStep>,
}

impl ExampleFile {
    pub fn from_json_str(s: &str) -> FlowResult<Self> {
        let ex: Self = serde_json::from_str(s)?;
        ex.validate()?;
        Ok(ex)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read example '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> FlowResult<()> {
        for s in &self.generation_steps {
            s.validate()?;
        }
        for s in &self.training_steps {
            s.to_step().validate()?;
        }
        Ok(())
    }

    pub fn is_training(&self) -> bool {
        !self.training_steps.is_empty() || self.kind.as_deref() == Some("training")
    }

    /// Every step in playback order: generation steps, then converted training steps.
    pub fn into_steps(self) -> Vec<Step> {
        let mut steps = self.generation_steps;
        steps.extend(self.training_steps.iter().map(TrainingStep::to_step));
        steps
    }

    pub fn num_layers(&self) -> Option<u32> {
        self.model_info.as_ref().and_then(|m| m.num_layers)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/step.rs"]
mod tests;
