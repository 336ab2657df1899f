pub use kurbo::{BezPath, Point, Rect, Size, Vec2};

/// Union of all rectangles, `None` for an empty iterator.
pub fn union_all(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Rectangle centered on `center` with the given size.
pub fn centered_rect(center: Point, width: f64, height: f64) -> Rect {
    Rect::from_center_size(center, Size::new(width.max(0.0), height.max(0.0)))
}
