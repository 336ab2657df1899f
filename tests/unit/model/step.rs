use super::*;

const EXAMPLE: &str = r#"
{
  "id": "example_003",
  "prompt": "What is the capital of France?",
  "language": "en",
  "model_info": { "name": "meta-llama/Llama-3-8B", "num_layers": 4, "hidden_size": 4096 },
  "generation_steps": [
    {
      "step": 0,
      "input_text": "What is",
      "tokens": ["What", " is"],
      "token_ids": [3923, 374],
      "output_distribution": {
        "top_k": 10,
        "candidates": [
          { "token": " the", "token_id": 279, "logprob": -0.2231, "prob": 0.8 },
          { "token": " a", "token_id": 264, "prob": 0.15 }
        ]
      },
      "selected_token": { "token": " the", "token_id": 279, "selection_method": "greedy" }
    }
  ]
}
"#;

#[test]
fn parses_generator_output() {
    let ex = ExampleFile::from_json_str(EXAMPLE).unwrap();
    assert_eq!(ex.id, "example_003");
    assert_eq!(ex.num_layers(), Some(4));
    let step = &ex.generation_steps[0];
    assert!(step.is_initial());
    assert_eq!(step.tokens, vec!["What", " is"]);
    assert_eq!(step.token_id(1), Some(374));
    assert_eq!(step.candidates().len(), 2);
    assert_eq!(step.target_token(), Some(" the"));
    assert_eq!(step.viz_mode(), VizMode::Forward);
}

#[test]
fn missing_logprob_is_derived_from_prob() {
    let ex = ExampleFile::from_json_str(EXAMPLE).unwrap();
    let c = &ex.generation_steps[0].candidates()[1];
    assert!((c.logprob() - 0.15f64.ln()).abs() < 1e-12);
}

#[test]
fn target_falls_back_to_top_candidate() {
    let mut step = Step::from_tokens(2, ["a", "b"]);
    step.output_distribution = Some(OutputDistribution {
        top_k: None,
        candidates: vec![
            Candidate {
                token: "x".into(),
                prob: 0.1,
                token_id: None,
                logprob: None,
            },
            Candidate {
                token: "y".into(),
                prob: 0.7,
                token_id: None,
                logprob: None,
            },
        ],
    });
    assert_eq!(step.target_token(), Some("y"));
    assert!(!step.is_initial());
}

#[test]
fn mismatched_ids_fail_validation() {
    let mut step = Step::from_tokens(0, ["a", "b"]);
    step.token_ids = vec![1];
    assert!(matches!(step.validate(), Err(FlowError::Validation(_))));
}

#[test]
fn viz_mode_is_lowercase_on_the_wire() {
    let step: Step = serde_json::from_str(r#"{ "tokens": ["a"], "viz_mode": "backprop" }"#).unwrap();
    assert_eq!(step.viz_mode(), VizMode::Backprop);
    assert!(step.token_ids.is_empty());
}

#[test]
fn ids_without_tokens_are_an_empty_step() {
    let step: Step = serde_json::from_str(r#"{"step":0,"token_ids":[5,6]}"#).unwrap();
    assert!(step.is_empty());
    assert!(step.validate().is_ok());
}

#[test]
fn non_finite_loss_fails_validation() {
    let mut step = Step::from_tokens(0, ["a"]);
    step.loss = Some(f64::INFINITY);
    assert!(matches!(step.validate(), Err(FlowError::Validation(_))));
}

const TRAINING: &str = r#"
{
  "id": "training_001",
  "type": "training",
  "text": "The cat sat",
  "source": "manual",
  "tokens": ["The", " cat", " sat"],
  "token_ids": [464, 3797, 3332],
  "num_tokens": 3,
  "model_info": { "name": "gpt2", "num_layers": 6 },
  "training_steps": [
    {
      "step": 0,
      "input_tokens": [],
      "input_token_ids": [],
      "target_token": "The",
      "target_token_id": 464,
      "predictions": [{ "token": "\n", "token_id": 198, "logprob": -2.1, "prob": 0.1225 }],
      "target_prob": 0.02,
      "target_logprob": -3.9,
      "loss": 3.912
    },
    {
      "step": 1,
      "input_tokens": ["The"],
      "input_token_ids": [464],
      "target_token": " cat",
      "target_token_id": 3797,
      "predictions": [
        { "token": " first", "token_id": 717, "logprob": -3.2, "prob": 0.0408 },
        { "token": " cat", "token_id": 3797, "logprob": -5.0, "prob": 0.0067 }
      ],
      "target_token_prediction": { "token": " cat", "token_id": 3797, "logprob": -5.0, "prob": 0.0067 },
      "loss": 5.0
    }
  ]
}
"#;

#[test]
fn parses_training_generator_output() {
    let ex = ExampleFile::from_json_str(TRAINING).unwrap();
    assert!(ex.is_training());
    assert_eq!(ex.kind.as_deref(), Some("training"));
    assert_eq!(ex.num_layers(), Some(6));
    assert_eq!(ex.training_steps.len(), 2);
    assert!(ex.generation_steps.is_empty());

    let steps = ex.into_steps();
    assert_eq!(steps.len(), 2);
    assert!(steps[0].is_empty());

    let s = &steps[1];
    assert_eq!(s.tokens, vec!["The"]);
    assert_eq!(s.token_id(0), Some(464));
    assert_eq!(s.candidates().len(), 2);
    assert_eq!(s.target_token(), Some(" cat"));
    assert_eq!(s.viz_mode(), VizMode::Backprop);
    assert_eq!(s.loss, Some(5.0));
    assert!(s.validate().is_ok());
}

#[test]
fn inference_examples_are_not_training() {
    let ex = ExampleFile::from_json_str(EXAMPLE).unwrap();
    assert!(!ex.is_training());
    assert_eq!(ex.into_steps().len(), 1);
}
