use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::{BezPath, Point, Rect, Size, union_all};

/// Index of a node inside one [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct NodeId(pub u32);

/// Which of the mounted scene roots a node lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum RootId {
    Main,
    Labels,
}

/// A node addressed across the mounted roots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct NodeRef {
    pub root: RootId,
    pub id: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
            Self::End => "end",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Group,
    Rect {
        rect: Rect,
        radius: f64,
    },
    Text {
        pos: Point,
        text: String,
        size: f64,
        anchor: TextAnchor,
        bold: bool,
    },
    Path {
        path: BezPath,
    },
    Circle {
        center: Point,
        radius: f64,
    },
}

impl Shape {
    /// Untransformed bounds. Text is approximated from its character count.
    pub fn bounds(&self) -> Option<Rect> {
        use kurbo::Shape as _;
        match self {
            Self::Group => None,
            Self::Rect { rect, .. } => Some(*rect),
            Self::Text {
                pos,
                text,
                size,
                anchor,
                ..
            } => {
                let w = text.chars().count() as f64 * size * 0.6;
                let x0 = match anchor {
                    TextAnchor::Start => pos.x,
                    TextAnchor::Middle => pos.x - w / 2.0,
                    TextAnchor::End => pos.x - w,
                };
                Some(Rect::new(x0, pos.y - size * 0.8, x0 + w, pos.y + size * 0.2))
            }
            Self::Path { path } => Some(path.bounding_box()),
            Self::Circle { center, radius } => Some(Rect::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            )),
        }
    }
}

/// Set of class names carried by a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn insert(&mut self, tag: &str) -> bool {
        self.0.insert(tag.to_owned())
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        self.0.remove(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn contains_all(&self, tags: &[&str]) -> bool {
        tags.iter().all(|t| self.contains(t))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Space-separated form used for the SVG `class` attribute.
    pub fn class_attr(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }
}

/// Animatable scalar properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prop {
    Opacity,
    OffsetX,
    OffsetY,
    /// Fraction of a stroke's length that is drawn.
    Draw,
    /// Vertical growth of a rect from its bottom edge.
    Grow,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct NodeProps {
    pub opacity: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub draw: f64,
    pub grow: f64,
}

impl Default for NodeProps {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            draw: 1.0,
            grow: 1.0,
        }
    }
}

impl NodeProps {
    pub fn get(&self, prop: Prop) -> f64 {
        match prop {
            Prop::Opacity => self.opacity,
            Prop::OffsetX => self.offset_x,
            Prop::OffsetY => self.offset_y,
            Prop::Draw => self.draw,
            Prop::Grow => self.grow,
        }
    }

    pub fn set(&mut self, prop: Prop, v: f64) {
        let v = match prop {
            Prop::Opacity | Prop::Draw | Prop::Grow => v.clamp(0.0, 1.0),
            Prop::OffsetX | Prop::OffsetY => v,
        };
        match prop {
            Prop::Opacity => self.opacity = v,
            Prop::OffsetX => self.offset_x = v,
            Prop::OffsetY => self.offset_y = v,
            Prop::Draw => self.draw = v,
            Prop::Grow => self.grow = v,
        }
    }
}

/// Fill and stroke. Values starting with `--` are theme variables resolved at serialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paint {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub shape: Shape,
    pub tags: TagSet,
    pub props: NodeProps,
    pub paint: Paint,
    /// Extra `data-*` attributes.
    pub data: BTreeMap<String, String>,
}

impl Node {
    pub fn new(shape: Shape) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            shape,
            tags: TagSet::default(),
            props: NodeProps::default(),
            paint: Paint::default(),
            data: BTreeMap::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(Shape::Group)
    }

    pub fn tagged<'a>(mut self, tags: impl IntoIterator<Item = &'a str>) -> Self {
        for t in tags {
            self.tags.insert(t);
        }
        self
    }

    pub fn fill(mut self, color: &str) -> Self {
        self.paint.fill = Some(color.to_owned());
        self
    }

    pub fn stroke(mut self, color: &str, width: f64) -> Self {
        self.paint.stroke = Some(color.to_owned());
        self.paint.stroke_width = width;
        self
    }

    pub fn with_data(mut self, key: &str, value: impl ToString) -> Self {
        self.data.insert(key.to_owned(), value.to_string());
        self
    }
}

/// Per-node animatable state, used to compare snapshots.
pub type NodeState = (NodeProps, TagSet);

/// An in-memory SVG-like scene graph. Node `0` is the root group.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    nodes: Vec<Node>,
    pub size: Size,
}

impl Scene {
    pub fn new(size: Size) -> Self {
        Self {
            nodes: vec![Node::group()],
            size,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Append `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        if let Some(p) = self.nodes.get_mut(parent.0 as usize) {
            p.children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Drop every node except an empty root.
    pub fn clear(&mut self, size: Size) {
        self.nodes.truncate(1);
        self.nodes[0] = Node::group();
        self.size = size;
    }

    /// Node ids in document (pre-order) order, root included.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(n) = self.node(id) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Nodes carrying every tag in `tags`, in document order.
    pub fn query_all(&self, tags: &[&str]) -> Vec<NodeId> {
        self.walk()
            .into_iter()
            .filter(|id| {
                self.node(*id)
                    .is_some_and(|n| !tags.is_empty() && n.tags.contains_all(tags))
            })
            .collect()
    }

    pub fn query_one(&self, tags: &[&str]) -> Option<NodeId> {
        self.query_all(tags).into_iter().next()
    }

    /// Bounds of a node's subtree, ignoring animatable offsets.
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        let node = self.node(id)?;
        let own = node.shape.bounds();
        let children = node.children.iter().filter_map(|c| self.bounds(*c));
        union_all(own.into_iter().chain(children))
    }

    pub fn tag(&mut self, id: NodeId, tag: &str) {
        if let Some(n) = self.node_mut(id) {
            n.tags.insert(tag);
        }
    }

    pub fn untag(&mut self, id: NodeId, tag: &str) {
        if let Some(n) = self.node_mut(id) {
            n.tags.remove(tag);
        }
    }

    pub fn set_prop(&mut self, id: NodeId, prop: Prop, v: f64) {
        if let Some(n) = self.node_mut(id) {
            n.props.set(prop, v);
        }
    }

    pub fn prop(&self, id: NodeId, prop: Prop) -> Option<f64> {
        self.node(id).map(|n| n.props.get(prop))
    }

    /// Whether the node and all of its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(n) = self.node(c) else {
                return false;
            };
            if n.props.opacity <= 0.0 {
                return false;
            }
            cur = n.parent;
        }
        true
    }

    /// Animatable state of every node, in id order.
    pub fn state(&self) -> Vec<NodeState> {
        self.nodes
            .iter()
            .map(|n| (n.props, n.tags.clone()))
            .collect()
    }
}

/// The scenes a view draws into: the main diagram and, for training, a separate label column.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneRoots {
    pub main: Scene,
    pub labels: Option<Scene>,
}

impl SceneRoots {
    pub fn new(size: Size, with_labels: bool) -> Self {
        Self {
            main: Scene::new(size),
            labels: with_labels.then(|| Scene::new(Size::new(LABEL_COLUMN_WIDTH, size.height))),
        }
    }

    pub fn get(&self, root: RootId) -> Option<&Scene> {
        match root {
            RootId::Main => Some(&self.main),
            RootId::Labels => self.labels.as_ref(),
        }
    }

    pub fn get_mut(&mut self, root: RootId) -> Option<&mut Scene> {
        match root {
            RootId::Main => Some(&mut self.main),
            RootId::Labels => self.labels.as_mut(),
        }
    }

    pub fn node(&self, r: NodeRef) -> Option<&Node> {
        self.get(r.root)?.node(r.id)
    }

    pub fn tag(&mut self, r: NodeRef, tag: &str) {
        if let Some(s) = self.get_mut(r.root) {
            s.tag(r.id, tag);
        }
    }

    pub fn untag(&mut self, r: NodeRef, tag: &str) {
        if let Some(s) = self.get_mut(r.root) {
            s.untag(r.id, tag);
        }
    }

    pub fn set_prop(&mut self, r: NodeRef, prop: Prop, v: f64) {
        if let Some(s) = self.get_mut(r.root) {
            s.set_prop(r.id, prop, v);
        }
    }

    pub fn prop(&self, r: NodeRef, prop: Prop) -> Option<f64> {
        self.get(r.root)?.prop(r.id, prop)
    }

    pub fn has_tag(&self, r: NodeRef, tag: &str) -> bool {
        self.node(r).is_some_and(|n| n.tags.contains(tag))
    }

    pub fn state(&self) -> (Vec<NodeState>, Option<Vec<NodeState>>) {
        (self.main.state(), self.labels.as_ref().map(Scene::state))
    }
}

/// Width of the separate stage-label column.
pub const LABEL_COLUMN_WIDTH: f64 = 180.0;

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
