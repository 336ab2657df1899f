use crate::{
    animation::{ease::Ease, tween::Span},
    scene::model::{Prop, SceneRoots},
    selectors::registry::{Selector, resolve},
    timeline::stages::View,
};

/// One property moved by a tween. `from: None` starts from the value the node has when its
/// tween begins.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PropTarget {
    pub prop: Prop,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    pub to: f64,
}

impl PropTarget {
    pub const fn to(prop: Prop, to: f64) -> Self {
        Self {
            prop,
            from: None,
            to,
        }
    }

    pub const fn from_to(prop: Prop, from: f64, to: f64) -> Self {
        Self {
            prop,
            from: Some(from),
            to,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpKind {
    /// Interpolates props. Target `i` (document order) starts `i * stagger` seconds late.
    Tween {
        props: Vec<PropTarget>,
        ease: Ease,
        stagger: f64,
    },
    /// Adds then removes tags, atomically, at the op's start.
    Tags {
        add: Vec<&'static str>,
        remove: Vec<&'static str>,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AnimOp {
    pub targets: Selector,
    #[serde(flatten)]
    pub kind: OpKind,
    #[serde(flatten)]
    pub span: Span,
}

impl AnimOp {
    /// End time for `count` resolved targets.
    pub fn end_for(&self, count: usize) -> f64 {
        match &self.kind {
            OpKind::Tween { stagger, .. } => {
                self.span.end() + stagger * count.saturating_sub(1) as f64
            }
            OpKind::Tags { .. } => self.span.start,
        }
    }

    /// Jump every target straight to the op's final state.
    pub fn apply_instant(&self, roots: &mut SceneRoots) {
        let targets = resolve(roots, self.targets);
        match &self.kind {
            OpKind::Tween { props, .. } => {
                for r in targets {
                    for p in props {
                        roots.set_prop(r, p.prop, p.to);
                    }
                }
            }
            OpKind::Tags { add, remove } => {
                for r in targets {
                    for t in add {
                        roots.tag(r, t);
                    }
                    for t in remove {
                        roots.untag(r, t);
                    }
                }
            }
        }
    }
}

/// The ordered operations animating one substep, built fresh per (view, substep).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct AnimationScript {
    pub view: View,
    pub sub_step: u32,
    pub duration: f64,
    pub ops: Vec<AnimOp>,
}

impl AnimationScript {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// End time assuming one target per op (stagger not expanded).
    pub fn nominal_end(&self) -> f64 {
        self.ops.iter().map(|op| op.end_for(1)).fold(0.0, f64::max)
    }

    pub fn apply_instant(&self, roots: &mut SceneRoots) {
        for op in &self.ops {
            op.apply_instant(roots);
        }
    }

    pub fn to_json_pretty(&self) -> crate::foundation::error::FlowResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/script.rs"]
mod tests;
