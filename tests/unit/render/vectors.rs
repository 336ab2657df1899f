use super::*;

#[test]
fn formats_one_decimal_without_negative_zero() {
    assert_eq!(format_value(0.24), "0.2");
    assert_eq!(format_value(-0.04), "0.0");
    assert_eq!(format_value(-0.0), "0.0");
    assert_eq!(format_value(-1.26), "-1.3");
    assert_eq!(format_value(3.0), "3.0");
    assert_eq!(format_value(f64::NAN), "–");
}

#[test]
fn row_draws_one_cell_per_value_plus_ellipsis() {
    let mut s = Scene::new(Size::new(400.0, 100.0));
    let root = s.root();
    let row = RowStyle {
        cell: Size::new(40.0, 20.0),
        fill: "--cell-fill",
        stroke: "--border-color",
        ellipsis: true,
    };
    let centers = row_centers(&[50.0, 100.0, 150.0, 200.0, 250.0], 3, true);
    assert_eq!(centers.len(), 4);
    let bounds = draw_vector_row(
        &mut s,
        root,
        &centers,
        40.0,
        &[0.1, -0.0, 2.0],
        &row,
        &StyleBag::default(),
    );
    let cells = s.query_all(&[class::VECTOR_CELL]);
    assert_eq!(cells.len(), 4);
    assert_eq!(bounds, Rect::new(30.0, 30.0, 220.0, 50.0));

    let texts: Vec<String> = s
        .walk()
        .into_iter()
        .filter_map(|id| match &s.node(id)?.shape {
            Shape::Text { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["0.1", "0.0", "2.0", "…"]);
}

#[test]
fn empty_row_has_zero_width_bounds() {
    let mut s = Scene::new(Size::new(100.0, 100.0));
    let root = s.root();
    let row = RowStyle {
        cell: Size::new(40.0, 20.0),
        fill: "--cell-fill",
        stroke: "--border-color",
        ellipsis: false,
    };
    let b = draw_vector_row(&mut s, root, &[], 10.0, &[], &row, &StyleBag::default());
    assert_eq!(b.width(), 0.0);
    assert!(s.is_empty());
}
