use crate::{BoxShadow, Color, CornerRadius, Rect, Transform};

/// Opaque handle to a bitmap the platform captured or decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u64);

/// Which way a painted triangle points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Top,
    Right,
    Bottom,
}

/// Renderable scene
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub clear_color: Color,
    pub nodes: Vec<SceneNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SceneNode {
    Rect {
        rect: Rect,
        color: Color,
        radius: CornerRadius,
    },
    BoxShadow {
        rect: Rect,
        shadow: BoxShadow,
        radius: CornerRadius,
    },
    /// Isosceles triangle filling `rect`, apex on the `pointing` side.
    Arrow {
        rect: Rect,
        pointing: Side,
        color: Color,
    },
    Image {
        rect: Rect,
        image: ImageHandle,
    },
    PushOpacity {
        alpha: f32,
    },
    PopOpacity,
    PushTransform {
        transform: Transform,
    },
    PopTransform,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: SceneNode) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Wraps whatever `f` pushes in a transform group.
    pub fn with_transform(&mut self, transform: Transform, f: impl FnOnce(&mut Scene)) {
        self.push(SceneNode::PushTransform { transform });
        f(self);
        self.push(SceneNode::PopTransform);
    }

    pub fn with_opacity(&mut self, alpha: f32, f: impl FnOnce(&mut Scene)) {
        self.push(SceneNode::PushOpacity { alpha });
        f(self);
        self.push(SceneNode::PopOpacity);
    }

    pub fn shadows(&self) -> impl Iterator<Item = &BoxShadow> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::BoxShadow { shadow, .. } => Some(shadow),
            _ => None,
        })
    }

    pub fn arrows(&self) -> impl Iterator<Item = (&Rect, Side)> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Arrow { rect, pointing, .. } => Some((rect, *pointing)),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = (&Rect, ImageHandle)> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Image { rect, image } => Some((rect, *image)),
            _ => None,
        })
    }
}
