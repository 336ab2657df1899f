//! Drawing functions that materialize a step into scene nodes.
//!
//! Every `draw_*` function takes the scene, a parent node, the geometry it anchors to and the
//! shared [`theme::StyleBag`], and returns the bounds of what it drew.

pub mod arrows;
pub mod attention;
pub mod blocks;
pub mod builder;
pub mod distribution;
pub mod embeddings;
pub mod labels;
pub mod theme;
pub mod tokens;
pub mod vectors;
