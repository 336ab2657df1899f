use super::*;

const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2"><rect width="4" height="2" fill="#ff0000"/></svg>"##;

#[test]
fn rasterizes_at_scale() {
    let frame = rasterize(SQUARE, 2.0).unwrap();
    assert_eq!((frame.width, frame.height), (8, 4));
    assert_eq!(frame.data.len(), 8 * 4 * 4);
    assert_eq!(&frame.data[..4], &[255, 0, 0, 255]);
}

#[test]
fn rejects_bad_input() {
    assert!(rasterize("<nope", 1.0).is_err());
    assert!(matches!(
        rasterize(SQUARE, 0.0),
        Err(FlowError::Validation(_))
    ));
    assert!(matches!(
        rasterize(SQUARE, 10_000.0),
        Err(FlowError::Render(_))
    ));
}

#[test]
fn demultiply_restores_straight_alpha() {
    let mut px = [64u8, 0, 128, 128, 10, 20, 30, 0];
    demultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[128, 0, 255, 128]);
    assert_eq!(&px[4..], &[10, 20, 30, 0]);
}

#[test]
fn png_round_trips_dimensions() {
    let frame = rasterize(SQUARE, 1.0).unwrap();
    let png = encode_png(&frame).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 2));
}
