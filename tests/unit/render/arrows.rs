use super::*;
use crate::foundation::core::Size;
use kurbo::Shape as _;

fn end_point(p: &BezPath) -> Point {
    p.segments().last().unwrap().eval(1.0)
}

fn start_point(p: &BezPath) -> Point {
    p.segments().next().unwrap().eval(0.0)
}

#[test]
fn paths_connect_their_endpoints() {
    let a = Point::new(10.0, 10.0);
    let b = Point::new(110.0, 80.0);
    for p in [
        straight(a, b),
        right_angle_rounded(a, b, 8.0),
        vertical_then_horizontal_rounded(a, b, 8.0),
        u_feedback(a, b, 30.0, 8.0),
        s_curve(a, b),
    ] {
        assert_eq!(start_point(&p), a);
        assert!((end_point(&p) - b).hypot() < 1e-9);
    }
}

#[test]
fn right_angle_turns_at_the_expected_corner() {
    let p = right_angle_rounded(Point::new(0.0, 0.0), Point::new(100.0, 50.0), 8.0);
    let bb = p.bounding_box();
    assert_eq!(bb, Rect::new(0.0, 0.0, 100.0, 50.0));
    let dir = end_direction(&p).unwrap();
    assert!((dir.y - 1.0).abs() < 1e-9, "ends going down: {dir:?}");

    let v = vertical_then_horizontal_rounded(Point::new(0.0, 0.0), Point::new(100.0, 50.0), 8.0);
    let dir = end_direction(&v).unwrap();
    assert!((dir.x - 1.0).abs() < 1e-9, "ends going right: {dir:?}");
}

#[test]
fn u_feedback_bulges_outward() {
    let p = u_feedback(Point::new(100.0, 200.0), Point::new(100.0, 50.0), -40.0, 8.0);
    let bb = p.bounding_box();
    assert!((bb.x0 - 60.0).abs() < 1e-9);
    let dir = end_direction(&p).unwrap();
    assert!((dir.x - 1.0).abs() < 1e-9);
}

#[test]
fn arrow_head_tip_sits_on_path_end() {
    let p = straight(Point::new(0.0, 0.0), Point::new(0.0, 40.0));
    let head = arrow_head(&p, 6.0).unwrap();
    let bb = head.bounding_box();
    assert!((bb.y1 - 40.0).abs() < 1e-9);
    assert!((bb.y0 - 34.0).abs() < 1e-9);
    assert!(arrow_head(&straight(Point::ZERO, Point::ZERO), 6.0).is_none());
}

#[test]
fn polarity_is_stable_and_mixed() {
    assert_eq!(polarity_tag("attn|0|2"), polarity_tag("attn|0|2"));
    let tags: std::collections::BTreeSet<_> =
        (0..32).map(|i| polarity_tag(&format!("ffn|{i}"))).collect();
    assert_eq!(tags.len(), 2);
}

#[test]
fn draw_arrow_groups_path_and_head() {
    let mut s = Scene::new(Size::new(100.0, 100.0));
    let root = s.root();
    let (g, bounds) = draw_arrow(
        &mut s,
        root,
        straight(Point::new(10.0, 10.0), Point::new(10.0, 60.0)),
        &[class::EMBEDDING_ARROW],
        "--arrow-color",
        &StyleBag::default(),
    );
    assert_eq!(s.node(g).unwrap().children.len(), 2);
    assert_eq!(s.query_all(&[class::EMBEDDING_ARROW]), vec![g]);
    assert!(bounds.y1 >= 60.0 - 1e-9);
}
