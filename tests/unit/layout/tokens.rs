use super::*;

fn toks(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("t{i}")).collect()
}

fn cfg(spacing: f64) -> TokenLayoutConfig {
    TokenLayoutConfig {
        token_spacing: spacing,
        min_margin: 0.0,
        ..TokenLayoutConfig::default()
    }
}

fn assert_collapsed_shape(meta: &LayoutMeta, n: usize) {
    let idx = meta.visible_indices();
    let gap = idx.iter().position(|&v| v == -1).expect("gap slot");
    assert_eq!(idx.iter().filter(|&&v| v == -1).count(), 1);
    let head = &idx[..gap];
    let tail = &idx[gap + 1..];
    assert!(!head.is_empty() && !tail.is_empty());
    for (i, v) in head.iter().enumerate() {
        assert_eq!(*v, i as i64);
    }
    assert_eq!(*tail.last().unwrap(), n as i64 - 1);
    assert!(tail.windows(2).all(|w| w[1] == w[0] + 1));
    assert!(head.last().unwrap() < tail.first().unwrap());
}

#[test]
fn reference_example_collapses_to_head_gap_tail() {
    let meta = calculate_token_layout(&toks(3), 300.0, false, &cfg(140.0), &MarkerClassifier);
    assert_eq!(max_visible_tokens(300.0, 140.0), 1);
    assert!(meta.should_collapse);
    assert_eq!(meta.visible_indices(), vec![0, -1, 2]);
    assert_eq!(meta.positions.len(), 3);
    assert_eq!(meta.widths.len(), 3);
}

#[test]
fn collapse_iff_more_tokens_than_fit() {
    let spacing = 100.0;
    let width = 800.0; // max_visible = 7
    for n in 1..20 {
        let meta = calculate_token_layout(&toks(n), width, false, &cfg(spacing), &MarkerClassifier);
        assert_eq!(meta.should_collapse, n > 7, "n={n}");
        if meta.should_collapse {
            assert_eq!(meta.visible.len(), 7 + 1, "n={n}");
            assert_collapsed_shape(&meta, n);
        } else {
            assert_eq!(meta.visible_indices(), (0..n as i64).collect::<Vec<_>>());
            assert_eq!(meta.gap, 0.0);
        }
    }
}

#[test]
fn head_takes_the_larger_half() {
    // max_visible = 4 -> head 2, tail 2; max_visible = 5 -> head 3, tail 2
    let m4 = calculate_token_layout(&toks(10), 500.0, false, &cfg(100.0), &MarkerClassifier);
    assert_eq!(m4.visible_indices(), vec![0, 1, -1, 8, 9]);
    let m5 = calculate_token_layout(&toks(10), 600.0, false, &cfg(100.0), &MarkerClassifier);
    assert_eq!(m5.visible_indices(), vec![0, 1, 2, -1, 8, 9]);
}

#[test]
fn expanded_never_collapses() {
    let meta = calculate_token_layout(&toks(30), 300.0, true, &cfg(140.0), &MarkerClassifier);
    assert!(!meta.should_collapse);
    assert_eq!(meta.visible.len(), 30);
    assert!(meta.gap_slot().is_none());
}

#[test]
fn empty_tokens_give_empty_layout() {
    let meta = calculate_token_layout(&[], 800.0, false, &cfg(100.0), &MarkerClassifier);
    assert!(meta.is_empty());
    assert!(!meta.should_collapse);
    assert!(meta.last_token_x().is_none());
    assert!(meta.extent().is_none());
}

#[test]
fn degenerate_widths_stay_total() {
    for w in [0.0, -50.0, f64::NAN, f64::INFINITY] {
        let meta = calculate_token_layout(&toks(4), w, false, &cfg(100.0), &MarkerClassifier);
        assert_eq!(meta.positions.len(), meta.visible.len());
        assert!(meta.positions.iter().all(|x| x.is_finite()));
    }
}

#[test]
fn single_token_never_collapses() {
    let meta = calculate_token_layout(&toks(1), 10.0, false, &cfg(140.0), &MarkerClassifier);
    assert!(!meta.should_collapse);
    assert_eq!(meta.visible_indices(), vec![0]);
}

#[test]
fn content_is_centered_with_uniform_spacing() {
    let meta = calculate_token_layout(&toks(3), 1000.0, false, &cfg(100.0), &MarkerClassifier);
    assert_eq!(meta.positions, vec![400.0, 500.0, 600.0]);
}

#[test]
fn margin_clamps_start() {
    let c = TokenLayoutConfig {
        token_spacing: 100.0,
        min_margin: 150.0,
        ..TokenLayoutConfig::default()
    };
    let meta = calculate_token_layout(&toks(5), 600.0, true, &c, &MarkerClassifier);
    assert_eq!(meta.positions[0], 200.0);
}

#[test]
fn gap_slot_uses_fixed_width() {
    let c = cfg(100.0);
    let meta = calculate_token_layout(&toks(12), 500.0, false, &c, &MarkerClassifier);
    let g = meta.gap_slot().unwrap();
    assert_eq!(meta.widths[g], c.gap_width);
    assert_eq!(meta.gap, c.gap_width);
    let step = meta.positions[g + 1] - meta.positions[g - 1];
    assert!((step - (c.token_spacing + c.gap_width)).abs() < 1e-9);
}

#[test]
fn box_width_has_floor_and_ceiling() {
    let c = TokenLayoutConfig::default();
    assert_eq!(c.box_width("a", false), c.min_box_width);
    let long = "x".repeat(200);
    assert_eq!(c.box_width(&long, false), c.token_spacing - c.box_gutter);
    assert!(c.box_width("<|endoftext|>", true) < c.box_width("<|endoftext|>", false));
}

#[test]
fn marker_pieces_are_merged() {
    let tokens: Vec<String> = ["<|", "im_start", "|>", "user", "<s>", " hi"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let meta = calculate_token_layout(&tokens, 2000.0, true, &cfg(100.0), &MarkerClassifier);
    assert_eq!(meta.special, vec![true, true, true, false, true, false]);
}

#[test]
fn classifier_is_pluggable() {
    let tokens: Vec<String> = vec!["<s>".into(), "x".into()];
    let meta = calculate_token_layout(&tokens, 2000.0, true, &cfg(100.0), &NoSpecialTokens);
    assert_eq!(meta.special, vec![false, false]);
}

#[test]
fn display_token_makes_whitespace_visible() {
    assert_eq!(display_token("\n"), "↵");
    assert_eq!(display_token("  "), "␣␣");
    assert_eq!(display_token(" cat"), " cat");
}

#[test]
fn visible_slots_serialize_with_sentinel() {
    let meta = calculate_token_layout(&toks(3), 300.0, false, &cfg(140.0), &MarkerClassifier);
    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["visible"], serde_json::json!([0, -1, 2]));
    let back: LayoutMeta = serde_json::from_value(json).unwrap();
    assert_eq!(back, meta);
}

#[test]
fn config_validation() {
    assert!(TokenLayoutConfig::default().validate().is_ok());
    assert!(cfg(0.0).validate().is_err());
    assert!(cfg(f64::NAN).validate().is_err());
}
