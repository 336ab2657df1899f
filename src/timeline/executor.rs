use crate::{
    animation::tween::{Span, sample},
    scene::model::{NodeRef, SceneRoots},
    selectors::registry::resolve,
    timeline::script::{AnimOp, AnimationScript, OpKind},
};

/// Tolerance for comparing accumulated time against span ends.
const TIME_EPS: f64 = 1e-9;

/// Callback fired once when a script runs to its end.
pub type OnComplete = Box<dyn FnOnce()>;

#[derive(Clone, Copy, Debug, PartialEq)]
enum TargetState {
    Pending,
    Running,
    Done,
}

struct BoundTarget {
    node: NodeRef,
    span: Span,
    from: Vec<f64>,
    state: TargetState,
}

struct BoundOp {
    op: AnimOp,
    targets: Vec<BoundTarget>,
}

struct Running {
    ops: Vec<BoundOp>,
    time: f64,
    end: f64,
    on_complete: Option<OnComplete>,
}

/// Runs at most one [`AnimationScript`] against a scene.
///
/// Time is injected through [`TimelineExecutor::advance`]. Starting a script kills the one in
/// flight first; a killed script never reports completion.
#[derive(Default)]
pub struct TimelineExecutor {
    running: Option<Running>,
}

impl std::fmt::Debug for TimelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimelineExecutor")
            .field("running", &self.running.is_some())
            .field("time", &self.time())
            .finish()
    }
}

impl TimelineExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Elapsed time of the running script.
    pub fn time(&self) -> Option<f64> {
        self.running.as_ref().map(|r| r.time)
    }

    /// Total length of the running script once staggers are expanded.
    pub fn end(&self) -> Option<f64> {
        self.running.as_ref().map(|r| r.end)
    }

    /// Bind `script` to the current scene and start it at time zero.
    ///
    /// Targets are resolved once, here. Explicit `from` values are applied immediately so
    /// staggered targets do not flash their final state before their own start.
    pub fn start(
        &mut self,
        roots: &mut SceneRoots,
        script: AnimationScript,
        on_complete: Option<OnComplete>,
    ) {
        self.kill();
        let mut ops = Vec::with_capacity(script.ops.len());
        let mut end: f64 = 0.0;
        for op in script.ops {
            let nodes = resolve(roots, op.targets);
            end = end.max(op.end_for(nodes.len()));
            let stagger = match &op.kind {
                OpKind::Tween { stagger, .. } => *stagger,
                OpKind::Tags { .. } => 0.0,
            };
            let targets = nodes
                .into_iter()
                .enumerate()
                .map(|(i, node)| BoundTarget {
                    node,
                    span: op.span.shifted(stagger * i as f64),
                    from: Vec::new(),
                    state: TargetState::Pending,
                })
                .collect::<Vec<_>>();
            if let OpKind::Tween { props, .. } = &op.kind {
                for t in &targets {
                    for p in props {
                        if let Some(v) = p.from {
                            roots.set_prop(t.node, p.prop, v);
                        }
                    }
                }
            }
            ops.push(BoundOp { op, targets });
        }
        tracing::trace!(
            view = ?script.view,
            sub_step = script.sub_step,
            ops = ops.len(),
            end,
            "timeline started"
        );
        self.running = Some(Running {
            ops,
            time: 0.0,
            end,
            on_complete,
        });
    }

    /// Stop the running script where it is. Its completion callback is dropped uncalled.
    pub fn kill(&mut self) {
        if let Some(r) = self.running.take() {
            tracing::debug!(time = r.time, end = r.end, "timeline killed");
        }
    }

    /// Advance the running script by `dt` seconds.
    ///
    /// Returns `true` when this call completed the script.
    pub fn advance(&mut self, roots: &mut SceneRoots, dt: f64) -> bool {
        let Some(run) = self.running.as_mut() else {
            return false;
        };
        run.time += dt.max(0.0);
        let t = run.time;
        let mut all_done = true;
        for bound in &mut run.ops {
            step_op(roots, bound, t);
            all_done &= bound.targets.iter().all(|x| x.state == TargetState::Done);
        }
        if !all_done || t + TIME_EPS < run.end {
            return false;
        }
        let callback = self.running.take().and_then(|r| r.on_complete);
        if let Some(cb) = callback {
            cb();
        }
        true
    }

    /// Run the remaining script to its end in one jump.
    pub fn finish(&mut self, roots: &mut SceneRoots) -> bool {
        let Some(remaining) = self.running.as_ref().map(|r| (r.end - r.time).max(0.0)) else {
            return false;
        };
        self.advance(roots, remaining + TIME_EPS)
    }
}

fn step_op(roots: &mut SceneRoots, bound: &mut BoundOp, t: f64) {
    for target in &mut bound.targets {
        if target.state == TargetState::Done || t < target.span.start {
            continue;
        }
        match &bound.op.kind {
            OpKind::Tags { add, remove } => {
                for tag in add {
                    roots.tag(target.node, tag);
                }
                for tag in remove {
                    roots.untag(target.node, tag);
                }
                target.state = TargetState::Done;
            }
            OpKind::Tween { props, ease, .. } => {
                if target.state == TargetState::Pending {
                    target.from = props
                        .iter()
                        .map(|p| {
                            p.from
                                .or_else(|| roots.prop(target.node, p.prop))
                                .unwrap_or(p.to)
                        })
                        .collect();
                    target.state = TargetState::Running;
                }
                let done = t + TIME_EPS >= target.span.end();
                for (p, from) in props.iter().zip(&target.from) {
                    let v = if done {
                        p.to
                    } else {
                        sample(*from, p.to, target.span, *ease, t)
                    };
                    roots.set_prop(target.node, p.prop, v);
                }
                if done {
                    target.state = TargetState::Done;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/executor.rs"]
mod tests;
