use crate::{
    foundation::core::{Point, Rect, Size},
    layout::context::LayoutContext,
    model::step::Step,
    render::{
        arrows::{
            draw_arrow, draw_connector, polarity_tag, right_angle_rounded, straight, u_feedback,
            vertical_then_horizontal_rounded,
        },
        blocks::draw_block,
        distribution::{draw_distribution, draw_selected_token},
        embeddings::draw_embeddings,
        labels::draw_stage_labels,
        theme::StyleBag,
        tokens::draw_tokens,
        vectors::{RowStyle, draw_vector_row, row_centers},
    },
    scene::model::{LABEL_COLUMN_WIDTH, Node, NodeId, Scene, SceneRoots},
    selectors::registry::class,
    timeline::stages::View,
    vectors::embeddings::{
        EmbeddingConfig, EmbeddingSet, extracted_vector, logprob_vector, target_vector,
    },
};

/// Draw the full target-state scene of `step` for `view`.
///
/// Everything any substep will show is drawn here once; the view timelines only toggle props
/// and tags afterwards. An empty step yields empty scenes.
#[tracing::instrument(skip(step, ctx, embeddings, style), fields(tokens = step.tokens.len()))]
pub fn build_scene(
    view: View,
    step: &Step,
    ctx: &LayoutContext,
    embeddings: &EmbeddingConfig,
    style: &StyleBag,
) -> SceneRoots {
    let size = ctx.scene_size();
    let mut roots = SceneRoots::new(size, view.has_label_root());
    if step.is_empty() || ctx.is_empty() {
        return roots;
    }
    let scene = &mut roots.main;
    let root = scene.root();

    let layer = scene.append(root, Node::group().with_data("layer", "tokens"));
    draw_tokens(scene, layer, step, ctx, style);
    if view == View::Decoding {
        return roots;
    }

    let set = EmbeddingSet::for_step(step, embeddings);
    let layer = scene.append(root, Node::group().with_data("layer", "embeddings"));
    draw_embeddings(scene, layer, step, &set, ctx, style);

    let layer = scene.append(root, Node::group().with_data("layer", "block"));
    let block = draw_block(scene, layer, step, &set, ctx, style);

    let layer = scene.append(root, Node::group().with_data("layer", "output"));
    match view {
        View::TextGeneration => {
            draw_generation_output(scene, layer, step, ctx, embeddings, block, style)
        }
        View::Training => {
            draw_training_output(scene, layer, step, ctx, embeddings, block, style)
        }
        View::Decoding => {}
    }

    match roots.labels.as_mut() {
        Some(labels) => {
            let root = labels.root();
            let width = LABEL_COLUMN_WIDTH - 16.0;
            draw_stage_labels(labels, root, view, ctx, 8.0, width, step.loss, style);
        }
        None => {
            let scene = &mut roots.main;
            let root = scene.root();
            let layer = scene.append(root, Node::group().with_data("layer", "labels"));
            let width = (ctx.tokens.min_margin - ctx.geometry.label_x - 8.0).max(60.0);
            let x = ctx.geometry.label_x;
            draw_stage_labels(scene, layer, view, ctx, x, width, step.loss, style);
        }
    }
    roots
}

fn row_style(ctx: &LayoutContext, ellipsis: bool) -> RowStyle<'static> {
    RowStyle {
        cell: Size::new(ctx.geometry.row_cell_width - 6.0, ctx.geometry.cell_height + 4.0),
        fill: "--cell-fill",
        stroke: "--border-color",
        ellipsis,
    }
}

/// Logprob values and whether an ellipsis cell follows them.
fn logprob_values(step: &Step, cells: usize) -> (Vec<f64>, bool) {
    let n = step.candidates().len();
    if n == 0 || n > cells {
        return (logprob_vector(step, cells.saturating_sub(1)), true);
    }
    (logprob_vector(step, n), false)
}

#[allow(clippy::too_many_arguments)]
fn draw_row_group(
    scene: &mut Scene,
    parent: NodeId,
    tag: &str,
    ctx: &LayoutContext,
    y: f64,
    values: &[f64],
    ellipsis: bool,
    style: &StyleBag,
) -> Rect {
    let g = scene.append(parent, Node::group().tagged([tag]));
    let centers = row_centers(
        &ctx.row_positions(values.len() + usize::from(ellipsis)),
        values.len(),
        ellipsis,
    );
    draw_vector_row(scene, g, &centers, y, values, &row_style(ctx, ellipsis), style)
}

fn down_arrow(
    scene: &mut Scene,
    parent: NodeId,
    from: Point,
    to: Point,
    tags: &[&str],
    style: &StyleBag,
) -> Rect {
    let path = if (from.x - to.x).abs() < 0.5 {
        straight(from, to)
    } else {
        vertical_then_horizontal_rounded(from, to, style.bend_radius)
    };
    draw_arrow(scene, parent, path, tags, "--arrow-color", style).1
}

#[allow(clippy::too_many_arguments)]
fn draw_generation_output(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    ctx: &LayoutContext,
    embeddings: &EmbeddingConfig,
    block: Rect,
    style: &StyleBag,
) {
    let Some(last_x) = ctx.last_token_x() else {
        return;
    };
    let cells = embeddings.row_cells;
    let half = (ctx.geometry.cell_height + 4.0) / 2.0;

    let extracted = extracted_vector(step, cells.saturating_sub(1));
    let ex = draw_row_group(
        scene,
        parent,
        class::EXTRACTED_VECTOR,
        ctx,
        ctx.stages.extract_y,
        &extracted,
        true,
        style,
    );
    down_arrow(
        scene,
        parent,
        Point::new(last_x, block.y1 + 2.0),
        Point::new(last_x, ex.y0 - 3.0),
        &[class::EXTRACT_ARROW],
        style,
    );

    let (values, ellipsis) = logprob_values(step, cells);
    draw_row_group(
        scene,
        parent,
        class::LOGPROB_VECTOR,
        ctx,
        ctx.stages.logits_y,
        &values,
        ellipsis,
        style,
    );
    down_arrow(
        scene,
        parent,
        Point::new(ex.center().x, ex.y1 + 2.0),
        Point::new(ex.center().x, ctx.stages.logits_y - half - 3.0),
        &[class::LOGPROB_ARROW],
        style,
    );

    draw_distribution(scene, parent, step, ctx, style);
    draw_selected_token(scene, parent, step, ctx, style);
}

#[allow(clippy::too_many_arguments)]
fn draw_training_output(
    scene: &mut Scene,
    parent: NodeId,
    step: &Step,
    ctx: &LayoutContext,
    embeddings: &EmbeddingConfig,
    block: Rect,
    style: &StyleBag,
) {
    let Some(last_x) = ctx.last_token_x() else {
        return;
    };
    let cells = embeddings.row_cells;
    let (values, ellipsis) = logprob_values(step, cells);
    let logits = draw_row_group(
        scene,
        parent,
        class::LOGPROB_VECTOR,
        ctx,
        ctx.stages.logits_y,
        &values,
        ellipsis,
        style,
    );
    down_arrow(
        scene,
        parent,
        Point::new(last_x, block.y1 + 2.0),
        Point::new(last_x, logits.y0 - 3.0),
        &[class::LOGPROB_ARROW],
        style,
    );

    draw_distribution(scene, parent, step, ctx, style);

    let target = target_vector(step, values.len());
    let target_row = draw_row_group(
        scene,
        parent,
        class::TARGET_VECTOR,
        ctx,
        ctx.stages.selected_y,
        &target,
        ellipsis,
        style,
    );

    let diff = right_angle_rounded(
        Point::new(target_row.x1 + 4.0, target_row.center().y),
        Point::new(logits.x1.max(target_row.x1) + 24.0, logits.y1 + 4.0),
        style.bend_radius,
    );
    draw_arrow(scene, parent, diff, &[class::DIFF_ARROW], "--diff-color", style);

    let feedback = u_feedback(
        Point::new(logits.x0 - 4.0, logits.center().y),
        Point::new(block.x0 - 2.0, ctx.stages.ffn_y + ctx.stages.column_height / 2.0),
        -28.0,
        style.bend_radius,
    );
    draw_arrow(scene, parent, feedback, &[class::BP_FEEDBACK], "--diff-color", style);

    let cell_top = logits.y0 - 2.0;
    let centers = ctx.row_positions(values.len() + usize::from(ellipsis));
    for (i, x) in centers.iter().take(values.len()).enumerate() {
        let path = vertical_then_horizontal_rounded(
            Point::new(*x, cell_top),
            Point::new(last_x, block.y1 + 12.0),
            style.bend_radius,
        );
        draw_connector(
            scene,
            parent,
            path,
            &[class::BP_OUTPUT, polarity_tag(&format!("out|{i}"))],
            "--arrow-color",
            style,
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/builder.rs"]
mod tests;
