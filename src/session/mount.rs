use crate::{
    foundation::error::{FlowError, FlowResult},
    layout::{
        context::{GeometryConfig, LayoutContext},
        tokens::{MarkerClassifier, TokenLayoutConfig},
    },
    model::step::{Step, VizMode},
    render::{
        builder::build_scene,
        theme::{StyleBag, Theme},
    },
    scene::{model::SceneRoots, svg::roots_to_svg},
    timeline::{
        executor::{OnComplete, TimelineExecutor},
        script::AnimationScript,
        stages::{BACKPROP_START, View},
        views::{ViewTimeline, timeline_for},
    },
    vectors::embeddings::EmbeddingConfig,
};

/// Options for a [`SceneMount`]. Every field has a default, so partial JSON is accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MountOpts {
    pub view: View,
    /// Width the token row has to fit into, in scene units.
    pub container_width: f64,
    /// Seconds per substep animation.
    pub anim_duration: f64,
    /// Layer count hint; controls the shadow layers behind the transformer box.
    pub num_layers: u32,
    /// Show every token instead of collapsing the middle of long rows.
    pub expanded: bool,
    pub tokens: TokenLayoutConfig,
    pub geometry: GeometryConfig,
    pub embeddings: EmbeddingConfig,
    pub theme: Theme,
    pub style: StyleBag,
}

impl Default for MountOpts {
    fn default() -> Self {
        Self {
            view: View::default(),
            container_width: 1000.0,
            anim_duration: 0.8,
            num_layers: 12,
            expanded: false,
            tokens: TokenLayoutConfig::default(),
            geometry: GeometryConfig::default(),
            embeddings: EmbeddingConfig::default(),
            theme: Theme::default(),
            style: StyleBag::default(),
        }
    }
}

impl MountOpts {
    pub fn validate(&self) -> FlowResult<()> {
        if !self.container_width.is_finite() || self.container_width <= 0.0 {
            return Err(FlowError::validation(
                "container_width must be finite and > 0",
            ));
        }
        if !self.anim_duration.is_finite() || self.anim_duration < 0.0 {
            return Err(FlowError::validation(
                "anim_duration must be finite and >= 0",
            ));
        }
        if self.num_layers == 0 {
            return Err(FlowError::validation("num_layers must be >= 1"));
        }
        self.tokens.validate()?;
        self.geometry.validate()?;
        self.embeddings.validate()?;
        self.theme.validate()?;
        Ok(())
    }
}

/// A mounted diagram: one step's scene plus the script animating its current substep.
///
/// The mount exclusively owns the [`LayoutContext`]; it is rebuilt on step, width or
/// expansion changes and lent to the renderers. Any change that redraws the scene kills the
/// running script first, so at most one script ever touches the scene.
pub struct SceneMount {
    opts: MountOpts,
    timeline: Box<dyn ViewTimeline>,
    step: Step,
    ctx: LayoutContext,
    roots: SceneRoots,
    sub_step: u32,
    executor: TimelineExecutor,
}

impl std::fmt::Debug for SceneMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneMount")
            .field("view", &self.opts.view)
            .field("step", &self.step.step)
            .field("sub_step", &self.sub_step)
            .field("nodes", &self.roots.main.len())
            .field("executor", &self.executor)
            .finish()
    }
}

impl SceneMount {
    /// Create an empty mount. Nothing is drawn until [`SceneMount::set_step`].
    pub fn new(opts: MountOpts) -> FlowResult<Self> {
        opts.validate()?;
        let timeline = timeline_for(opts.view);
        let step = Step::default();
        let ctx = layout(&opts, &step);
        let roots = SceneRoots::new(ctx.scene_size(), opts.view.has_label_root());
        Ok(Self {
            opts,
            timeline,
            step,
            ctx,
            roots,
            sub_step: 0,
            executor: TimelineExecutor::new(),
        })
    }

    pub fn opts(&self) -> &MountOpts {
        &self.opts
    }

    pub fn view(&self) -> View {
        self.opts.view
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn sub_step(&self) -> u32 {
        self.sub_step
    }

    pub fn layout(&self) -> &LayoutContext {
        &self.ctx
    }

    pub fn roots(&self) -> &SceneRoots {
        &self.roots
    }

    /// Last substep playback visits. Training steps marked forward-only stop before backprop.
    pub fn last_substep(&self) -> u32 {
        let forward_only = self.step.viz_mode == Some(VizMode::Forward);
        if self.opts.view == View::Training && forward_only {
            BACKPROP_START - 1
        } else {
            self.opts.view.max_substep()
        }
    }

    pub fn is_animating(&self) -> bool {
        self.executor.is_running()
    }

    /// Training replays the whole sequence for every step; text generation only animates the
    /// full prompt on its first step.
    fn is_initial_step(&self) -> bool {
        self.opts.view == View::Training || self.step.is_initial()
    }

    /// Replace the mounted step, redraw, and snap to the state before substep 0.
    #[tracing::instrument(skip(self, step), fields(view = ?self.opts.view, step = step.step, tokens = step.tokens.len()))]
    pub fn set_step(&mut self, step: Step) -> FlowResult<()> {
        step.validate()?;
        self.executor.kill();
        self.step = step;
        self.sub_step = 0;
        self.redraw();
        let initial = self.is_initial_step();
        self.timeline.set_initial_states(&mut self.roots, 0, initial);
        tracing::debug!(nodes = self.roots.main.len(), "step mounted");
        Ok(())
    }

    /// Change the container width. The current substep is shown completed.
    pub fn resize(&mut self, container_width: f64) -> FlowResult<()> {
        if !container_width.is_finite() || container_width <= 0.0 {
            return Err(FlowError::validation(
                "container_width must be finite and > 0",
            ));
        }
        self.opts.container_width = container_width;
        self.relayout();
        Ok(())
    }

    /// Expand or collapse the token row. The current substep is shown completed.
    pub fn set_expanded(&mut self, expanded: bool) {
        if self.opts.expanded != expanded {
            self.opts.expanded = expanded;
            self.relayout();
        }
    }

    fn relayout(&mut self) {
        self.executor.kill();
        self.redraw();
        let initial = self.is_initial_step();
        self.timeline
            .set_initial_states(&mut self.roots, self.sub_step.saturating_add(1), initial);
    }

    fn redraw(&mut self) {
        self.ctx = layout(&self.opts, &self.step);
        self.roots = build_scene(
            self.opts.view,
            &self.step,
            &self.ctx,
            &self.opts.embeddings,
            &self.opts.style,
        );
    }

    /// Script that would animate `sub_step` of the mounted step.
    pub fn script(&self, sub_step: u32) -> AnimationScript {
        self.timeline
            .build_timeline(sub_step, self.is_initial_step(), self.opts.anim_duration)
    }

    /// Snap to the state before `sub_step` and start animating into it.
    ///
    /// `on_complete` runs once if the animation finishes; it is dropped if the animation is
    /// killed by a later call.
    pub fn go_to_substep(&mut self, sub_step: u32, on_complete: Option<OnComplete>) {
        self.executor.kill();
        self.sub_step = sub_step;
        let initial = self.is_initial_step();
        self.timeline
            .set_initial_states(&mut self.roots, sub_step, initial);
        let script = self.script(sub_step);
        self.executor.start(&mut self.roots, script, on_complete);
    }

    /// Show `sub_step` completed, without animating.
    pub fn jump_to_substep(&mut self, sub_step: u32) {
        self.executor.kill();
        self.sub_step = sub_step;
        let initial = self.is_initial_step();
        self.timeline
            .set_initial_states(&mut self.roots, sub_step.saturating_add(1), initial);
    }

    /// Advance the running animation by `dt` seconds. Returns `true` when it completed.
    pub fn tick(&mut self, dt: f64) -> bool {
        self.executor.advance(&mut self.roots, dt)
    }

    /// Run the current animation to its end.
    pub fn finish(&mut self) -> bool {
        self.executor.finish(&mut self.roots)
    }

    /// Kill any running animation and drop the scene.
    pub fn unmount(&mut self) {
        self.executor.kill();
        self.step = Step::default();
        self.sub_step = 0;
        self.redraw();
    }

    pub fn to_svg(&self) -> String {
        roots_to_svg(&self.roots, &self.opts.theme)
    }
}

fn layout(opts: &MountOpts, step: &Step) -> LayoutContext {
    LayoutContext::compute(
        &step.tokens,
        opts.container_width,
        opts.expanded,
        &opts.tokens,
        &opts.geometry,
        opts.embeddings.dims,
        opts.num_layers,
        &MarkerClassifier,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/session/mount.rs"]
mod tests;
