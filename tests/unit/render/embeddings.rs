use super::*;
use crate::{
    layout::{
        context::GeometryConfig,
        tokens::{MarkerClassifier, TokenLayoutConfig},
    },
    vectors::embeddings::EmbeddingConfig,
};

fn ctx_for(step: &Step, width: f64) -> LayoutContext {
    LayoutContext::compute(
        &step.tokens,
        width,
        false,
        &TokenLayoutConfig::default(),
        &GeometryConfig::default(),
        EmbeddingConfig::default().dims,
        2,
        &MarkerClassifier,
    )
}

fn texts(s: &Scene, root: NodeId) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let n = s.node(id).unwrap();
        if let Shape::Text { text, .. } = &n.shape {
            out.push(text.clone());
        }
        stack.extend(n.children.iter().rev().copied());
    }
    out
}

#[test]
fn full_column_shows_every_value() {
    let mut s = Scene::new(Size::new(200.0, 200.0));
    let root = s.root();
    let col = ColumnStyle {
        cell: Size::new(40.0, 20.0),
        accent: "--embedding-color",
        compact: false,
    };
    let r = draw_column(
        &mut s,
        root,
        Point::new(100.0, 10.0),
        &[0.1, 0.2, 0.3, 0.4, 0.5],
        &col,
        &StyleBag::default(),
    );
    assert_eq!(r, Rect::new(80.0, 10.0, 120.0, 110.0));
    assert_eq!(texts(&s, root), vec!["0.1", "0.2", "0.3", "0.4", "0.5"]);
}

#[test]
fn compact_column_summarizes() {
    let mut s = Scene::new(Size::new(200.0, 200.0));
    let root = s.root();
    let col = ColumnStyle {
        cell: Size::new(40.0, 20.0),
        accent: "--embedding-color",
        compact: true,
    };
    let r = draw_column(
        &mut s,
        root,
        Point::new(100.0, 10.0),
        &[0.1, 0.2, 0.3, 0.4, -0.5],
        &col,
        &StyleBag::default(),
    );
    assert_eq!(r.height(), 60.0);
    assert_eq!(texts(&s, root), vec!["0.1", "⋮", "-0.5"]);
}

#[test]
fn one_group_and_arrow_per_visible_token() {
    let step = Step::from_tokens(1, ["The", " cat", " sat"]);
    let set = EmbeddingSet::for_step(&step, &EmbeddingConfig::default());
    let ctx = ctx_for(&step, 1200.0);
    let mut s = Scene::new(Size::new(1200.0, 800.0));
    let root = s.root();
    draw_embeddings(&mut s, root, &step, &set, &ctx, &StyleBag::default());

    let groups = s.query_all(&[class::EMBEDDING_GROUP]);
    assert_eq!(groups.len(), 3);
    assert_eq!(s.query_all(&[class::EMBEDDING_GROUP, class::NEW_TOKEN]).len(), 1);
    let arrows = s.query_all(&[class::EMBEDDING_ARROW]);
    assert_eq!(arrows.len(), 3);
    for a in arrows {
        let tags = &s.node(a).unwrap().tags;
        assert!(
            tags.contains(class::BP_CONNECTION_GREEN) ^ tags.contains(class::BP_CONNECTION_RED)
        );
    }
}

#[test]
fn collapsed_layout_skips_hidden_tokens() {
    let step = Step::from_tokens(0, (0..30).map(|i| format!("t{i}")));
    let set = EmbeddingSet::for_step(&step, &EmbeddingConfig::default());
    let ctx = ctx_for(&step, 700.0);
    assert!(ctx.compact);
    let mut s = Scene::new(Size::new(700.0, 800.0));
    let root = s.root();
    draw_embeddings(&mut s, root, &step, &set, &ctx, &StyleBag::default());
    let visible_tokens = ctx.meta.token_slots().count();
    assert_eq!(s.query_all(&[class::EMBEDDING_GROUP]).len(), visible_tokens);
    assert_eq!(s.query_all(&[class::EMBEDDING_GROUP, class::NEW_TOKEN]).len(), visible_tokens);
}
