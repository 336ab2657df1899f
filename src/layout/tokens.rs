use crate::foundation::error::{FlowError, FlowResult};

/// Horizontal token layout parameters, in pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TokenLayoutConfig {
    /// Advance of one token slot.
    pub token_spacing: f64,
    /// Advance of the collapsed ellipsis slot.
    pub gap_width: f64,
    /// Minimum distance from the container's left edge to the first slot.
    pub min_margin: f64,
    /// Approximate glyph advance of regular token text.
    pub char_width: f64,
    /// Horizontal padding inside a regular token box.
    pub box_padding: f64,
    /// Floor of every box width.
    pub min_box_width: f64,
    /// Glyph advance of special marker tokens (smaller font).
    pub special_char_width: f64,
    /// Horizontal padding inside a special token box.
    pub special_box_padding: f64,
    /// Minimum clearance kept between neighbouring boxes.
    pub box_gutter: f64,
}

impl Default for TokenLayoutConfig {
    fn default() -> Self {
        Self {
            token_spacing: 110.0,
            gap_width: 60.0,
            min_margin: 120.0,
            char_width: 8.0,
            box_padding: 18.0,
            min_box_width: 36.0,
            special_char_width: 6.0,
            special_box_padding: 10.0,
            box_gutter: 10.0,
        }
    }
}

impl TokenLayoutConfig {
    pub fn validate(&self) -> FlowResult<()> {
        if !self.token_spacing.is_finite() || self.token_spacing <= 0.0 {
            return Err(FlowError::validation("token_spacing must be finite and > 0"));
        }
        if !self.gap_width.is_finite() || self.gap_width < 0.0 {
            return Err(FlowError::validation("gap_width must be finite and >= 0"));
        }
        if self.box_gutter < 0.0 || self.box_gutter >= self.token_spacing {
            return Err(FlowError::validation(
                "box_gutter must be in [0, token_spacing)",
            ));
        }
        if self.min_box_width <= 0.0 {
            return Err(FlowError::validation("min_box_width must be > 0"));
        }
        Ok(())
    }

    /// Box width for a token given its special classification.
    pub fn box_width(&self, token: &str, special: bool) -> f64 {
        let chars = display_token(token).chars().count() as f64;
        let (cw, pad) = if special {
            (self.special_char_width, self.special_box_padding)
        } else {
            (self.char_width, self.box_padding)
        };
        let max = (self.token_spacing - self.box_gutter).max(self.min_box_width);
        (chars * cw + pad).clamp(self.min_box_width, max)
    }
}

/// Text shown inside a token box: control characters become visible glyphs and
/// whitespace-only pieces become open-box markers.
pub fn display_token(token: &str) -> String {
    let text = token.replace('\n', "↵").replace('\t', "⇥");
    if !text.is_empty() && text.trim().is_empty() {
        return "␣".repeat(text.chars().count());
    }
    text
}

/// One visible slot of the token row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum VisibleSlot {
    Token(usize),
    Gap,
}

/// Sentinel used for the gap slot in the flat index form.
pub const GAP_SENTINEL: i64 = -1;

impl From<VisibleSlot> for i64 {
    fn from(slot: VisibleSlot) -> Self {
        match slot {
            VisibleSlot::Token(i) => i64::try_from(i).unwrap_or(i64::MAX),
            VisibleSlot::Gap => GAP_SENTINEL,
        }
    }
}

impl TryFrom<i64> for VisibleSlot {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        if v == GAP_SENTINEL {
            return Ok(Self::Gap);
        }
        usize::try_from(v)
            .map(Self::Token)
            .map_err(|_| format!("invalid visible index {v}"))
    }
}

/// Horizontal layout of one step's token row.
///
/// `positions`, `widths` and `special` have one entry per visible slot. Every downstream
/// layer is aligned to `positions`.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayoutMeta {
    pub positions: Vec<f64>,
    pub widths: Vec<f64>,
    pub visible: Vec<VisibleSlot>,
    pub special: Vec<bool>,
    /// Width of the ellipsis slot, `0.0` when not collapsed.
    pub gap: f64,
    pub should_collapse: bool,
}

impl LayoutMeta {
    /// Visible indices with `-1` standing for the gap slot.
    pub fn visible_indices(&self) -> Vec<i64> {
        self.visible.iter().copied().map(i64::from).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Visible token slots as `(slot, token_index, center_x)`.
    pub fn token_slots(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.visible
            .iter()
            .enumerate()
            .filter_map(|(slot, v)| match v {
                VisibleSlot::Token(idx) => Some((slot, *idx, self.positions[slot])),
                VisibleSlot::Gap => None,
            })
    }

    pub fn gap_slot(&self) -> Option<usize> {
        self.visible.iter().position(|v| *v == VisibleSlot::Gap)
    }

    pub fn slot_of(&self, token_idx: usize) -> Option<usize> {
        self.visible
            .iter()
            .position(|v| *v == VisibleSlot::Token(token_idx))
    }

    pub fn x_of(&self, token_idx: usize) -> Option<f64> {
        self.slot_of(token_idx).map(|s| self.positions[s])
    }

    /// Center of the right-most visible token.
    pub fn last_token_x(&self) -> Option<f64> {
        self.token_slots().last().map(|(_, _, x)| x)
    }

    /// Leftmost and rightmost box edges.
    pub fn extent(&self) -> Option<(f64, f64)> {
        let left = self
            .positions
            .iter()
            .zip(&self.widths)
            .map(|(x, w)| x - w / 2.0)
            .reduce(f64::min)?;
        let right = self
            .positions
            .iter()
            .zip(&self.widths)
            .map(|(x, w)| x + w / 2.0)
            .reduce(f64::max)?;
        Some((left, right))
    }
}

/// The previous visible token as seen by a [`SpecialTokenClassifier`].
#[derive(Clone, Copy, Debug)]
pub struct PrevToken<'a> {
    pub text: &'a str,
    pub special: bool,
}

/// Decides whether a token is rendered as a "special" marker (smaller font, less padding).
///
/// The decision may depend on the previous visible token so that markers split across several
/// pieces (`"<|"`, `"im_start"`, `"|>"`) are classified together.
pub trait SpecialTokenClassifier {
    fn is_special(&self, token: &str, prev: Option<PrevToken<'_>>) -> bool;
}

/// Default classifier for `<...>`, `<|...|>` and `[UPPER]` markers.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerClassifier;

impl SpecialTokenClassifier for MarkerClassifier {
    fn is_special(&self, token: &str, prev: Option<PrevToken<'_>>) -> bool {
        let t = token.trim();
        if t.is_empty() {
            return false;
        }
        if opens_marker(t) {
            return true;
        }
        matches!(prev, Some(p) if p.special && !closes_marker(p.text.trim()))
    }
}

fn opens_marker(t: &str) -> bool {
    if t.starts_with("<|") || t.starts_with("</") {
        return true;
    }
    if t.starts_with('<') && t.ends_with('>') && t.chars().count() >= 3 {
        return true;
    }
    t.len() > 2
        && t.starts_with('[')
        && t.ends_with(']')
        && t[1..t.len() - 1]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '_')
}

fn closes_marker(t: &str) -> bool {
    t.ends_with('>') || t.ends_with(']')
}

/// Never classifies anything as special.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSpecialTokens;

impl SpecialTokenClassifier for NoSpecialTokens {
    fn is_special(&self, _token: &str, _prev: Option<PrevToken<'_>>) -> bool {
        false
    }
}

/// Number of token slots that fit: `floor(width / spacing) - 1`, at least one.
pub fn max_visible_tokens(container_width: f64, token_spacing: f64) -> usize {
    let raw = (container_width / token_spacing).floor() - 1.0;
    if raw.is_finite() && raw > 1.0 {
        raw as usize
    } else {
        1
    }
}

fn collapsed_slots(n: usize, max_visible: usize) -> Vec<VisibleSlot> {
    let head = max_visible.div_ceil(2).max(1);
    let tail = max_visible.saturating_sub(head).max(1);
    let mut out = Vec::with_capacity(head + tail + 1);
    out.extend((0..head).map(VisibleSlot::Token));
    out.push(VisibleSlot::Gap);
    out.extend((n - tail..n).map(VisibleSlot::Token));
    out
}

/// Compute the token row layout.
///
/// Tokens that do not fit are collapsed behind a single gap slot unless `is_expanded` is set.
/// Content is centered in the container and never starts left of `min_margin`.
#[tracing::instrument(skip(tokens, config, classifier), fields(tokens = tokens.len()))]
pub fn calculate_token_layout(
    tokens: &[String],
    container_width: f64,
    is_expanded: bool,
    config: &TokenLayoutConfig,
    classifier: &dyn SpecialTokenClassifier,
) -> LayoutMeta {
    let n = tokens.len();
    if n == 0 {
        return LayoutMeta::default();
    }

    let max_visible = max_visible_tokens(container_width, config.token_spacing);
    let should_collapse = !is_expanded && n > max_visible;
    let visible = if should_collapse {
        collapsed_slots(n, max_visible)
    } else {
        (0..n).map(VisibleSlot::Token).collect()
    };

    let advance = |slot: &VisibleSlot| match slot {
        VisibleSlot::Token(_) => config.token_spacing,
        VisibleSlot::Gap => config.gap_width,
    };
    let total: f64 = visible.iter().map(advance).sum();
    let width = if container_width.is_finite() {
        container_width
    } else {
        0.0
    };
    let mut x = ((width - total) / 2.0).max(config.min_margin);

    let mut positions = Vec::with_capacity(visible.len());
    let mut widths = Vec::with_capacity(visible.len());
    let mut special = Vec::with_capacity(visible.len());
    let mut prev: Option<PrevToken<'_>> = None;
    for slot in &visible {
        let adv = advance(slot);
        positions.push(x + adv / 2.0);
        x += adv;
        match *slot {
            VisibleSlot::Token(idx) => {
                let text = tokens[idx].as_str();
                let is_special = classifier.is_special(text, prev);
                widths.push(config.box_width(text, is_special));
                special.push(is_special);
                prev = Some(PrevToken {
                    text,
                    special: is_special,
                });
            }
            VisibleSlot::Gap => {
                widths.push(config.gap_width);
                special.push(false);
                prev = None;
            }
        }
    }

    LayoutMeta {
        positions,
        widths,
        visible,
        special,
        gap: if should_collapse { config.gap_width } else { 0.0 },
        should_collapse,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/tokens.rs"]
mod tests;
