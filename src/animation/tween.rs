use crate::animation::ease::Ease;

/// Time window of a single tween, in seconds relative to the start of its script.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: f64,
    pub duration: f64,
}

impl Span {
    pub fn new(start: f64, duration: f64) -> Self {
        Self {
            start: start.max(0.0),
            duration: duration.max(0.0),
        }
    }

    pub fn end(self) -> f64 {
        self.start + self.duration
    }

    pub fn shifted(self, by: f64) -> Self {
        Self::new(self.start + by, self.duration)
    }

    /// Linear progress in `[0, 1]` at script time `t`. Zero-length spans jump at `start`.
    pub fn progress(self, t: f64) -> f64 {
        if t < self.start {
            return 0.0;
        }
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((t - self.start) / self.duration).clamp(0.0, 1.0)
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Value of a `from -> to` tween over `span` at script time `t`.
pub fn sample(from: f64, to: f64, span: Span, ease: Ease, t: f64) -> f64 {
    let p = span.progress(t);
    if p >= 1.0 {
        return to;
    }
    lerp(from, to, ease.apply(p))
}
