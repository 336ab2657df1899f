use super::*;
use crate::model::step::{Candidate, OutputDistribution, SelectedToken};

fn toks(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn outer_embedding_is_step_independent() {
    let a = EmbeddingSet::derive(0, &toks(&["The", " cat"]), 5);
    let b = EmbeddingSet::derive(9, &toks(&["A", " dog", " cat"]), 5);
    assert_eq!(a.per_token[1].outer, b.per_token[2].outer);
    assert_ne!(a.per_token[1].inside_top, b.per_token[2].inside_top);
}

#[test]
fn rederiving_is_identical() {
    let tokens = toks(&["x", "y", "z"]);
    assert_eq!(
        EmbeddingSet::derive(4, &tokens, 6),
        EmbeddingSet::derive(4, &tokens, 6)
    );
}

#[test]
fn stages_use_distinct_seeds() {
    let set = EmbeddingSet::derive(1, &toks(&["q"]), 5);
    let t = &set.per_token[0];
    assert_ne!(t.inside_top, t.inside_bottom);
    assert_ne!(t.inside_bottom, t.ffn);
    assert_eq!(t.outer.len(), 5);
}

#[test]
fn empty_tokens_give_empty_set() {
    let set = EmbeddingSet::derive(0, &[], 5);
    assert!(set.is_empty());
    assert!(set.last().is_none());
    assert!(extracted_vector(&Step::default(), 4).is_empty());
    assert!(logprob_vector(&Step::default(), 4).is_empty());
}

fn step_with_distribution() -> Step {
    let mut step = Step::from_tokens(1, ["a", " b"]);
    step.output_distribution = Some(OutputDistribution {
        top_k: Some(3),
        candidates: ["x", "y", "z"]
            .iter()
            .zip([0.6, 0.3, 0.1])
            .map(|(t, p)| Candidate {
                token: t.to_string(),
                prob: p,
                token_id: None,
                logprob: None,
            })
            .collect(),
    });
    step.selected_token = Some(SelectedToken {
        token: "y".into(),
        token_id: None,
        selection_method: None,
    });
    step
}

#[test]
fn logprobs_come_from_candidates() {
    let step = step_with_distribution();
    let lp = logprob_vector(&step, 6);
    assert_eq!(lp.len(), 3);
    assert!((lp[0] - 0.6f64.ln()).abs() < 1e-12);
}

#[test]
fn target_is_one_hot_on_selected_token() {
    let step = step_with_distribution();
    assert_eq!(target_vector(&step, 3), vec![0.0, 1.0, 0.0]);
    assert_eq!(target_vector(&Step::from_tokens(0, ["a"]), 2), vec![1.0, 0.0]);
}

#[test]
fn config_validation_rejects_tiny_columns() {
    let cfg = EmbeddingConfig {
        dims: 1,
        ..EmbeddingConfig::default()
    };
    assert!(cfg.validate().is_err());
    assert!(EmbeddingConfig::default().validate().is_ok());
}
