use super::*;
use crate::{
    foundation::core::Size,
    scene::model::{Node, Scene},
};

fn roots(with_labels: bool) -> SceneRoots {
    let mut r = SceneRoots::new(Size::new(400.0, 400.0), with_labels);
    let m = &mut r.main;
    let g = m.append(m.root(), Node::group().tagged([class::TOKEN, class::PREV_TOKEN]));
    m.append(g, Node::group().tagged([class::TOKEN_ID]));
    m.append(m.root(), Node::group().tagged([class::TOKEN, class::NEW_TOKEN]));
    m.append(
        m.root(),
        Node::group().tagged([class::EMBEDDING_GROUP, class::NEW_TOKEN]),
    );
    m.append(m.root(), Node::group().tagged([class::ATTENTION_CONNECTION]));
    let label_scene = r.labels.as_mut().map_or(&mut r.main, |l| l);
    let root = label_scene.root();
    label_scene.append(
        root,
        Node::group().tagged([
            class::STAGE_LABEL,
            class::STAGE_LABEL_FORWARD,
            LabelKey::Tokens.class(),
        ]),
    );
    label_scene.append(
        root,
        Node::group().tagged([class::STAGE_LABEL, LabelKey::Backprop.class()]),
    );
    r
}

#[test]
fn resolves_conjunctions_in_document_order() {
    let r = roots(false);
    let tokens = resolve(&r, Selector::Token);
    assert_eq!(tokens.len(), 2);
    assert!(tokens[0].id < tokens[1].id);

    let new = resolve(&r, Selector::NewToken);
    assert_eq!(new.len(), 1);
    assert!(r.has_tag(new[0], class::TOKEN));

    let emb = resolve(&r, Selector::EmbeddingNew);
    assert_eq!(emb.len(), 1);
    assert!(r.has_tag(emb[0], class::EMBEDDING_GROUP));
}

#[test]
fn attention_mesh_and_backprop_group_share_nodes() {
    let r = roots(false);
    assert_eq!(
        resolve(&r, Selector::AttentionMeshAll),
        resolve(&r, Selector::BpAttentionConnections)
    );
}

#[test]
fn label_queries_prefer_the_label_root() {
    let with = roots(true);
    let labels = resolve(&with, Selector::StageLabelAll);
    assert_eq!(labels.len(), 2);
    assert!(labels.iter().all(|n| n.root == RootId::Labels));
    assert_eq!(resolve(&with, Selector::ForwardLabels).len(), 1);
    assert_eq!(resolve(&with, Selector::BackpropLabel).len(), 1);
    assert_eq!(
        resolve(&with, Selector::StageLabel(LabelKey::Tokens)),
        resolve(&with, Selector::ForwardLabels)
    );

    let without = roots(false);
    let labels = resolve(&without, Selector::StageLabelAll);
    assert_eq!(labels.len(), 2);
    assert!(labels.iter().all(|n| n.root == RootId::Main));
}

#[test]
fn missing_elements_resolve_to_empty() {
    let r = SceneRoots {
        main: Scene::new(Size::new(1.0, 1.0)),
        labels: None,
    };
    for s in Selector::all() {
        assert!(resolve(&r, s).is_empty(), "{}", s.name());
    }
}

#[test]
fn names_round_trip() {
    for s in Selector::all() {
        assert_eq!(Selector::from_name(&s.name()), Some(s), "{}", s.name());
    }
    assert_eq!(Selector::Token.name(), "token");
    assert_eq!(Selector::EmbeddingGroupAll.name(), "embeddingGroupAll");
    assert_eq!(
        Selector::from_name("attentionMashAll"),
        Some(Selector::AttentionMeshAll)
    );
    assert_eq!(Selector::from_name("nope"), None);
}

#[test]
fn every_selector_has_a_query() {
    for s in Selector::all() {
        let qs = s.queries();
        assert!(!qs.is_empty());
        assert!(qs.iter().all(|q| !q.all_of.is_empty()));
    }
}

#[test]
fn query_tables_are_static_and_label_classes_distinct() {
    let tables: Vec<&'static [Query]> = Selector::all().into_iter().map(Selector::queries).collect();
    assert_eq!(tables.len(), Selector::all().len());
    assert_eq!(Selector::SelectedBar.queries()[0].all_of.len(), 2);

    let classes: std::collections::HashSet<&'static str> =
        LabelKey::ALL.iter().map(|k| k.class()).collect();
    assert_eq!(classes.len(), LabelKey::ALL.len());
    assert_eq!(LabelKey::Loss.class(), "stage-label-loss");
}
