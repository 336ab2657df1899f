use std::{cell::Cell, rc::Rc};

use super::*;
use crate::{
    animation::ease::Ease,
    foundation::core::Size,
    scene::model::{Node, Prop},
    selectors::registry::{Selector, class},
    timeline::{
        script::PropTarget,
        stages::View,
    },
};

fn roots_with_tokens(n: usize) -> SceneRoots {
    let mut r = SceneRoots::new(Size::new(400.0, 200.0), false);
    for _ in 0..n {
        let root = r.main.root();
        r.main.append(root, Node::group().tagged([class::TOKEN]));
    }
    r
}

fn fade(stagger: f64) -> AnimationScript {
    AnimationScript {
        view: View::TextGeneration,
        sub_step: 0,
        duration: 1.0,
        ops: vec![
            AnimOp {
                targets: Selector::Token,
                kind: OpKind::Tween {
                    props: vec![PropTarget::from_to(Prop::Opacity, 0.0, 1.0)],
                    ease: Ease::Linear,
                    stagger,
                },
                span: Span::new(0.0, 1.0),
            },
            AnimOp {
                targets: Selector::Token,
                kind: OpKind::Tags {
                    add: vec![class::ACTIVE],
                    remove: vec![],
                },
                span: Span::new(0.5, 0.0),
            },
        ],
    }
}

fn counter() -> (Rc<Cell<u32>>, OnComplete) {
    let c = Rc::new(Cell::new(0));
    let c2 = Rc::clone(&c);
    (c, Box::new(move || c2.set(c2.get() + 1)))
}

fn opacities(r: &SceneRoots) -> Vec<f64> {
    resolve(r, Selector::Token)
        .into_iter()
        .map(|n| r.prop(n, Prop::Opacity).unwrap())
        .collect()
}

#[test]
fn completes_exactly_once() {
    let mut r = roots_with_tokens(2);
    let mut ex = TimelineExecutor::new();
    let (count, cb) = counter();
    ex.start(&mut r, fade(0.0), Some(cb));
    assert_eq!(opacities(&r), vec![0.0, 0.0]);

    assert!(!ex.advance(&mut r, 0.5));
    assert_eq!(opacities(&r), vec![0.5, 0.5]);
    let first = resolve(&r, Selector::Token)[0];
    assert!(r.has_tag(first, class::ACTIVE));

    assert!(ex.advance(&mut r, 0.5));
    assert_eq!(opacities(&r), vec![1.0, 1.0]);
    assert_eq!(count.get(), 1);
    assert!(!ex.is_running());

    assert!(!ex.advance(&mut r, 1.0));
    assert_eq!(count.get(), 1);
}

#[test]
fn killed_script_never_completes() {
    let mut r = roots_with_tokens(2);
    let mut ex = TimelineExecutor::new();
    let (count, cb) = counter();
    ex.start(&mut r, fade(0.0), Some(cb));
    ex.advance(&mut r, 0.3);
    ex.kill();
    assert!(!ex.advance(&mut r, 5.0));
    assert_eq!(count.get(), 0);
    assert!((opacities(&r)[0] - 0.3).abs() < 1e-9);
}

#[test]
fn starting_a_new_script_kills_the_previous_one() {
    let mut r = roots_with_tokens(1);
    let mut ex = TimelineExecutor::new();
    let (first, cb1) = counter();
    let (second, cb2) = counter();
    ex.start(&mut r, fade(0.0), Some(cb1));
    ex.advance(&mut r, 0.2);
    ex.start(&mut r, fade(0.0), Some(cb2));
    assert!(ex.finish(&mut r));
    assert_eq!(first.get(), 0);
    assert_eq!(second.get(), 1);
}

#[test]
fn stagger_delays_later_targets() {
    let mut r = roots_with_tokens(3);
    let mut ex = TimelineExecutor::new();
    ex.start(&mut r, fade(0.25), None);
    assert_eq!(ex.end(), Some(1.5));
    ex.advance(&mut r, 0.5);
    let o = opacities(&r);
    assert!((o[0] - 0.5).abs() < 1e-9);
    assert!((o[1] - 0.25).abs() < 1e-9);
    assert_eq!(o[2], 0.0);
    assert!(!ex.advance(&mut r, 0.75));
    assert!(ex.advance(&mut r, 0.25));
    assert_eq!(opacities(&r), vec![1.0, 1.0, 1.0]);
}

#[test]
fn empty_script_completes_on_first_advance() {
    let mut r = roots_with_tokens(0);
    let mut ex = TimelineExecutor::new();
    let (count, cb) = counter();
    ex.start(&mut r, fade(0.0), Some(cb));
    assert!(ex.advance(&mut r, 0.0) || ex.advance(&mut r, 1.0));
    assert_eq!(count.get(), 1);
}

#[test]
fn implicit_from_uses_value_at_start() {
    let mut r = roots_with_tokens(1);
    let node = resolve(&r, Selector::Token)[0];
    r.set_prop(node, Prop::OffsetY, 10.0);
    let script = AnimationScript {
        ops: vec![AnimOp {
            targets: Selector::Token,
            kind: OpKind::Tween {
                props: vec![PropTarget::to(Prop::OffsetY, 0.0)],
                ease: Ease::Linear,
                stagger: 0.0,
            },
            span: Span::new(0.0, 2.0),
        }],
        ..AnimationScript::default()
    };
    let mut ex = TimelineExecutor::new();
    ex.start(&mut r, script, None);
    ex.advance(&mut r, 1.0);
    assert!((r.prop(node, Prop::OffsetY).unwrap() - 5.0).abs() < 1e-9);
}
