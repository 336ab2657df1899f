use crate::{
    scene::model::{NodeProps, SceneRoots},
    selectors::registry::DYNAMIC_TAGS,
    timeline::{
        script::AnimationScript,
        stages::View,
        table::{baseline, script, specs},
    },
};

/// Per-view substep contract: snap to the state before `sub_step`, then animate into it.
pub trait ViewTimeline {
    fn view(&self) -> View;

    /// Put every animatable property where it stands once `sub_step - 1` has finished.
    ///
    /// Repeated calls with the same arguments leave the scene unchanged.
    fn set_initial_states(&self, roots: &mut SceneRoots, sub_step: u32, is_initial_step: bool);

    /// Script animating from the `sub_step - 1` snapshot into `sub_step`.
    fn build_timeline(&self, sub_step: u32, is_initial_step: bool, duration: f64)
    -> AnimationScript;
}

fn reset_scene(roots: &mut SceneRoots) {
    let scenes = std::iter::once(&mut roots.main).chain(roots.labels.as_mut());
    for scene in scenes {
        for id in scene.walk() {
            if let Some(node) = scene.node_mut(id) {
                node.props = NodeProps::default();
                for t in DYNAMIC_TAGS {
                    node.tags.remove(t);
                }
            }
        }
    }
}

/// Snapshot shared by the table-driven views.
fn snap_to(view: View, roots: &mut SceneRoots, sub_step: u32, is_initial_step: bool) {
    // `max_substep + 1` is the completed state of the last substep.
    if sub_step > view.max_substep() + 1 {
        tracing::debug!(?view, sub_step, "substep out of range, snapping to the final state");
    }
    reset_scene(roots);
    for spec in baseline(view, is_initial_step) {
        spec.to_op(0.0).apply_instant(roots);
    }
    for s in 0..sub_step.min(view.max_substep() + 1) {
        for spec in specs(view, s, is_initial_step) {
            spec.to_op(0.0).apply_instant(roots);
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TextGenerationView;

impl ViewTimeline for TextGenerationView {
    fn view(&self) -> View {
        View::TextGeneration
    }

    fn set_initial_states(&self, roots: &mut SceneRoots, sub_step: u32, is_initial_step: bool) {
        snap_to(View::TextGeneration, roots, sub_step, is_initial_step);
    }

    fn build_timeline(
        &self,
        sub_step: u32,
        is_initial_step: bool,
        duration: f64,
    ) -> AnimationScript {
        script(View::TextGeneration, sub_step, is_initial_step, duration)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TrainingView;

impl ViewTimeline for TrainingView {
    fn view(&self) -> View {
        View::Training
    }

    fn set_initial_states(&self, roots: &mut SceneRoots, sub_step: u32, is_initial_step: bool) {
        snap_to(View::Training, roots, sub_step, is_initial_step);
    }

    fn build_timeline(
        &self,
        sub_step: u32,
        is_initial_step: bool,
        duration: f64,
    ) -> AnimationScript {
        script(View::Training, sub_step, is_initial_step, duration)
    }
}

/// Placeholder view: both halves of the contract exist and do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodingView;

impl ViewTimeline for DecodingView {
    fn view(&self) -> View {
        View::Decoding
    }

    fn set_initial_states(&self, _roots: &mut SceneRoots, _sub_step: u32, _is_initial: bool) {}

    fn build_timeline(&self, sub_step: u32, _is_initial: bool, duration: f64) -> AnimationScript {
        AnimationScript {
            view: View::Decoding,
            sub_step,
            duration,
            ops: Vec::new(),
        }
    }
}

/// The timeline implementation for `view`.
pub fn timeline_for(view: View) -> Box<dyn ViewTimeline> {
    match view {
        View::TextGeneration => Box::new(TextGenerationView),
        View::Training => Box::new(TrainingView),
        View::Decoding => Box::new(DecodingView),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/views.rs"]
mod tests;
