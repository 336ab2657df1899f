use super::*;
use crate::{
    layout::{
        context::GeometryConfig,
        tokens::{MarkerClassifier, TokenLayoutConfig},
    },
    model::step::{Candidate, OutputDistribution, SelectedToken},
};

fn sample_step(step: u64) -> Step {
    let mut s = Step::from_tokens(step, ["The", " cat", " sat"]);
    s.token_ids = vec![464, 3797, 3332];
    s.output_distribution = Some(OutputDistribution {
        top_k: Some(3),
        candidates: [(" on", 0.6), (" down", 0.3), (" there", 0.1)]
            .iter()
            .map(|(t, p)| Candidate {
                token: (*t).to_owned(),
                prob: *p,
                token_id: None,
                logprob: None,
            })
            .collect(),
    });
    s.selected_token = Some(SelectedToken {
        token: " on".to_owned(),
        token_id: Some(319),
        selection_method: None,
    });
    s
}

fn build(view: View, step: &Step) -> SceneRoots {
    let ctx = LayoutContext::compute(
        &step.tokens,
        1000.0,
        false,
        &TokenLayoutConfig::default(),
        &GeometryConfig::default(),
        5,
        3,
        &MarkerClassifier,
    );
    build_scene(view, step, &ctx, &EmbeddingConfig::default(), &StyleBag::default())
}

fn count(s: &Scene, tag: &str) -> usize {
    s.query_all(&[tag]).len()
}

#[test]
fn text_generation_draws_every_layer() {
    let roots = build(View::TextGeneration, &sample_step(0));
    assert!(roots.labels.is_none());
    let s = &roots.main;
    assert_eq!(count(s, class::TOKEN), 3);
    assert_eq!(count(s, class::NEW_TOKEN), 3 * 5);
    assert_eq!(count(s, class::EMBEDDING_GROUP), 3);
    assert_eq!(count(s, class::TRANSFORMER_SHADOW), 2);
    assert_eq!(count(s, class::ATTENTION_CONNECTION), 6);
    assert_eq!(count(s, class::EXTRACT_ARROW), 1);
    assert_eq!(count(s, class::EXTRACTED_VECTOR), 1);
    assert_eq!(count(s, class::LOGPROB_VECTOR), 1);
    assert_eq!(count(s, class::DISTRIBUTION_BAR), 3);
    assert_eq!(count(s, class::SELECTED), 1);
    assert_eq!(count(s, class::SELECTED_TOKEN), 1);
    assert_eq!(count(s, class::TARGET_VECTOR), 0);
    assert_eq!(count(s, class::STAGE_LABEL), 8);
}

#[test]
fn later_steps_mark_only_the_last_token_new() {
    let roots = build(View::TextGeneration, &sample_step(2));
    let s = &roots.main;
    let new_tokens = s.query_all(&[class::TOKEN, class::NEW_TOKEN]);
    assert_eq!(new_tokens.len(), 1);
    assert_eq!(s.node(new_tokens[0]).unwrap().data["index"], "2");
    assert_eq!(count(s, class::PREV_TOKEN), 2 * 5);
    assert_eq!(count(s, class::ATTENTION_CONNECTION), 3);
}

#[test]
fn training_draws_loss_and_backprop_elements() {
    let roots = build(View::Training, &sample_step(0));
    let s = &roots.main;
    assert_eq!(count(s, class::TARGET_VECTOR), 1);
    assert_eq!(count(s, class::DIFF_ARROW), 1);
    assert_eq!(count(s, class::BP_FEEDBACK), 1);
    assert_eq!(count(s, class::BP_OUTPUT), 3);
    assert_eq!(count(s, class::EXTRACTED_VECTOR), 0);
    assert_eq!(count(s, class::SELECTED_TOKEN), 0);
    assert_eq!(count(s, class::STAGE_LABEL), 0);

    let labels = roots.labels.as_ref().unwrap();
    assert_eq!(count(labels, class::STAGE_LABEL), 10);
    assert_eq!(labels.size.width, LABEL_COLUMN_WIDTH);
}

#[test]
fn decoding_draws_tokens_only() {
    let roots = build(View::Decoding, &sample_step(0));
    assert_eq!(count(&roots.main, class::TOKEN), 3);
    assert_eq!(count(&roots.main, class::EMBEDDING_GROUP), 0);
}

#[test]
fn empty_step_renders_nothing() {
    let roots = build(View::Training, &Step::default());
    assert!(roots.main.is_empty());
    assert!(roots.labels.as_ref().unwrap().is_empty());
}

#[test]
fn rendering_is_deterministic() {
    let step = sample_step(1);
    assert_eq!(build(View::Training, &step), build(View::Training, &step));
}
