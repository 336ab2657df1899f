//! tokenflow renders step-by-step diagrams of a transformer's forward and backward pass.
//!
//! A [`Step`] (tokens plus the model's output distribution) is laid out deterministically,
//! drawn once into an in-memory [`Scene`], and then animated substep by substep:
//!
//! - [`SceneMount`] owns the layout, the scene and the running animation
//! - each [`View`] snaps the scene to the state before a substep and builds the
//!   [`AnimationScript`] that animates into it
//! - [`StepPlayer`] walks a whole example with an injected-time auto-play timer
//!
//! Scenes serialize to SVG and can be rasterized to PNG.
#![forbid(unsafe_code)]

pub mod animation;
pub mod foundation;
pub mod layout;
pub mod model;
pub mod render;
pub mod scene;
pub mod selectors;
pub mod session;
pub mod timeline;
pub mod vectors;

pub use crate::foundation::core::{BezPath, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{FlowError, FlowResult};
pub use crate::layout::context::{GeometryConfig, LayoutContext};
pub use crate::layout::tokens::{LayoutMeta, TokenLayoutConfig, calculate_token_layout};
pub use crate::model::step::{ExampleFile, Step};
pub use crate::render::theme::{StyleBag, Theme};
pub use crate::scene::model::{Scene, SceneRoots};
pub use crate::selectors::registry::Selector;
pub use crate::session::mount::{MountOpts, SceneMount};
pub use crate::session::player::StepPlayer;
pub use crate::timeline::executor::TimelineExecutor;
pub use crate::timeline::script::AnimationScript;
pub use crate::timeline::stages::View;
pub use crate::timeline::views::{ViewTimeline, timeline_for};
pub use crate::vectors::embeddings::EmbeddingConfig;
