use crate::{
    foundation::core::{Point, Rect, Size},
    foundation::error::{FlowError, FlowResult},
    layout::tokens::{LayoutMeta, SpecialTokenClassifier, TokenLayoutConfig, calculate_token_layout},
};

/// Vertical rhythm and block sizes of the diagram, in pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Center line of the token boxes.
    pub tokens_y: f64,
    pub token_box_height: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    /// Vertical gap between stacked sections.
    pub section_gap: f64,
    /// Height of the band the attention mesh is drawn in.
    pub attention_band: f64,
    /// Height of the band between the attention output and the FFN columns.
    pub ffn_band: f64,
    pub block_padding: f64,
    pub row_cell_width: f64,
    /// Distance between the output rows.
    pub row_gap: f64,
    pub bar_width: f64,
    pub bar_spacing: f64,
    pub bar_max_height: f64,
    pub max_candidates: usize,
    /// Offset of each stacked shadow layer behind the transformer block.
    pub shadow_offset: f64,
    pub max_shadow_layers: u32,
    /// Left edge of the stage labels.
    pub label_x: f64,
    pub corner_radius: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            tokens_y: 56.0,
            token_box_height: 40.0,
            cell_width: 46.0,
            cell_height: 20.0,
            section_gap: 44.0,
            attention_band: 90.0,
            ffn_band: 64.0,
            block_padding: 22.0,
            row_cell_width: 52.0,
            row_gap: 70.0,
            bar_width: 34.0,
            bar_spacing: 46.0,
            bar_max_height: 80.0,
            max_candidates: 6,
            shadow_offset: 7.0,
            max_shadow_layers: 4,
            label_x: 16.0,
            corner_radius: 6.0,
        }
    }
}

impl GeometryConfig {
    pub fn validate(&self) -> FlowResult<()> {
        let positive = [
            ("token_box_height", self.token_box_height),
            ("cell_width", self.cell_width),
            ("cell_height", self.cell_height),
            ("row_cell_width", self.row_cell_width),
            ("bar_width", self.bar_width),
            ("bar_spacing", self.bar_spacing),
            ("bar_max_height", self.bar_max_height),
        ];
        for (name, v) in positive {
            if !v.is_finite() || v <= 0.0 {
                return Err(FlowError::validation(format!("{name} must be finite and > 0")));
            }
        }
        if self.max_candidates == 0 {
            return Err(FlowError::validation("max_candidates must be > 0"));
        }
        Ok(())
    }
}

/// Resolved Y coordinates of every stage, derived once per layout.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct StageGeometry {
    pub tokens_y: f64,
    pub token_bottom: f64,
    pub embed_top: f64,
    pub column_height: f64,
    pub block_top: f64,
    pub inside_top_y: f64,
    pub inside_bottom_y: f64,
    pub ffn_y: f64,
    pub block_bottom: f64,
    pub extract_y: f64,
    pub logits_y: f64,
    /// Baseline the distribution bars grow up from.
    pub distribution_base_y: f64,
    /// Center line of the selected-token box (and the training target row).
    pub selected_y: f64,
    pub height: f64,
}

impl StageGeometry {
    pub fn new(g: &GeometryConfig, column_cells: usize) -> Self {
        let column_height = column_cells as f64 * g.cell_height;
        let token_bottom = g.tokens_y + g.token_box_height / 2.0;
        let embed_top = token_bottom + g.section_gap;
        let block_top = embed_top + column_height + g.section_gap;
        let inside_top_y = block_top + g.block_padding;
        let inside_bottom_y = inside_top_y + column_height + g.attention_band;
        let ffn_y = inside_bottom_y + column_height + g.ffn_band;
        let block_bottom = ffn_y + column_height + g.block_padding;
        let extract_y = block_bottom + g.row_gap;
        let logits_y = extract_y + g.row_gap;
        let distribution_base_y = logits_y + g.row_gap / 2.0 + g.bar_max_height + 20.0;
        let selected_y = distribution_base_y + 44.0;
        Self {
            tokens_y: g.tokens_y,
            token_bottom,
            embed_top,
            column_height,
            block_top,
            inside_top_y,
            inside_bottom_y,
            ffn_y,
            block_bottom,
            extract_y,
            logits_y,
            distribution_base_y,
            selected_y,
            height: selected_y + 60.0,
        }
    }

    /// Vertical band of the attention mesh: (bottom of inside-top, top of inside-bottom).
    pub fn attention_span(&self) -> (f64, f64) {
        (self.inside_top_y + self.column_height, self.inside_bottom_y)
    }
}

/// Everything a renderer needs to place elements, threaded explicitly through each draw call.
///
/// Built once per (step, container width, expansion) by the owning mount and only ever
/// borrowed immutably afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutContext {
    pub meta: LayoutMeta,
    pub tokens: TokenLayoutConfig,
    pub geometry: GeometryConfig,
    pub container_width: f64,
    pub num_layers: u32,
    pub dims: usize,
    /// Columns shrink to a first / ellipsis / last summary when the row is collapsed.
    pub compact: bool,
    pub stages: StageGeometry,
}

impl LayoutContext {
    pub fn new(
        meta: LayoutMeta,
        container_width: f64,
        tokens: TokenLayoutConfig,
        geometry: GeometryConfig,
        dims: usize,
        num_layers: u32,
    ) -> Self {
        let compact = meta.should_collapse;
        let column_cells = if compact { 3 } else { dims.max(1) };
        let stages = StageGeometry::new(&geometry, column_cells);
        Self {
            meta,
            tokens,
            geometry,
            container_width,
            num_layers: num_layers.max(1),
            dims,
            compact,
            stages,
        }
    }

    /// Run the token layout and derive the stage geometry in one go.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        tokens: &[String],
        container_width: f64,
        is_expanded: bool,
        token_cfg: &TokenLayoutConfig,
        geometry: &GeometryConfig,
        dims: usize,
        num_layers: u32,
        classifier: &dyn SpecialTokenClassifier,
    ) -> Self {
        let meta =
            calculate_token_layout(tokens, container_width, is_expanded, token_cfg, classifier);
        Self::new(
            meta,
            container_width,
            token_cfg.clone(),
            geometry.clone(),
            dims,
            num_layers,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    pub fn column_cells(&self) -> usize {
        if self.compact { 3 } else { self.dims.max(1) }
    }

    /// Horizontal extent of the token columns (boxes or cells, whichever is wider).
    pub fn content_extent(&self) -> Option<(f64, f64)> {
        let (l, r) = self.meta.extent()?;
        let first = *self.meta.positions.first()?;
        let last = *self.meta.positions.last()?;
        let half = self.geometry.cell_width / 2.0;
        Some((l.min(first - half), r.max(last + half)))
    }

    /// Bounds of the transformer block, spanning every visible column.
    pub fn block_bounds(&self) -> Option<Rect> {
        let (l, r) = self.content_extent()?;
        let pad = self.geometry.block_padding;
        Some(Rect::new(
            l - pad,
            self.stages.block_top,
            r + pad,
            self.stages.block_bottom,
        ))
    }

    /// Center of the FFN projection box between the attention output and the FFN columns.
    pub fn ffn_center(&self) -> Option<Point> {
        let b = self.block_bounds()?;
        let y = self.stages.inside_bottom_y + self.stages.column_height + self.geometry.ffn_band / 2.0;
        Some(Point::new(b.center().x, y))
    }

    pub fn last_token_x(&self) -> Option<f64> {
        self.meta.last_token_x()
    }

    /// `count` centers spaced by `spacing`, centered under the last token and kept inside the
    /// container margins.
    pub fn centered_under_last(&self, count: usize, spacing: f64) -> Vec<f64> {
        let Some(anchor) = self.last_token_x() else {
            return Vec::new();
        };
        if count == 0 {
            return Vec::new();
        }
        let span = spacing * (count.saturating_sub(1)) as f64;
        let mut first = anchor - span / 2.0;
        let right_limit = self.container_width.max(0.0) - self.tokens.min_margin / 2.0;
        if first + span > right_limit {
            first = right_limit - span;
        }
        first = first.max(self.tokens.min_margin / 2.0);
        (0..count).map(|i| first + spacing * i as f64).collect()
    }

    /// X centers of the output distribution bars.
    pub fn bar_positions(&self, candidates: usize) -> Vec<f64> {
        let n = candidates.min(self.geometry.max_candidates);
        self.centered_under_last(n, self.geometry.bar_spacing)
    }

    /// X centers of a horizontal vector row of `cells` cells.
    pub fn row_positions(&self, cells: usize) -> Vec<f64> {
        self.centered_under_last(cells, self.geometry.row_cell_width)
    }

    /// Overall scene size: the container width (or more, when expanded content overflows).
    pub fn scene_size(&self) -> Size {
        let right = self
            .content_extent()
            .map(|(_, r)| r + self.geometry.block_padding + self.tokens.min_margin / 2.0)
            .unwrap_or(0.0);
        Size::new(self.container_width.max(right).max(1.0), self.stages.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/context.rs"]
mod tests;
