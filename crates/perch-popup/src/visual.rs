//! # Visual tree adapter
//!
//! The smallest visual tree placement needs: nodes with a parent, a local
//! transform and a size. Adorner nodes are the one twist. They are rendered
//! in an overlay layer but positioned relative to the element they adorn, so
//! walking up from an adorner continues at the adorned element, not at the
//! overlay layer. That is what keeps anchor rectangles correct for popups
//! opened from inside adorners.

use perch_core::{FlowDirection, Rect, Size, Transform, Vec2, flow_direction};
use slotmap::{SlotMap, new_key_type};

use crate::error::{PopupError, Result};
use crate::placement::{
    ConstraintAdjustment, PlacementMode, PopupAnchor, PopupGravity, ResolvedPlacement,
    margin_to_anchor_offset, resolve_placement,
};

new_key_type! {
    pub struct VisualId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Link {
    /// Top of a tree: a window or popup root.
    Root,
    /// Positioned inside `parent`'s coordinate space.
    Parent(VisualId),
    /// Positioned inside the adorned element's coordinate space.
    Adorns(VisualId),
    Detached,
}

#[derive(Clone, Debug)]
struct VisualNode {
    link: Link,
    transform: Transform,
    size: Size,
}

#[derive(Default)]
pub struct VisualTree {
    nodes: SlotMap<VisualId, VisualNode>,
}

impl VisualTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, size: Size) -> VisualId {
        self.insert(Link::Root, Transform::identity(), size)
    }

    pub fn add_child(&mut self, parent: VisualId, offset: Vec2, size: Size) -> Result<VisualId> {
        self.node(parent)?;
        Ok(self.insert(
            Link::Parent(parent),
            Transform::translate(offset.x, offset.y),
            size,
        ))
    }

    /// Adorner placed at `offset` within `adorned`.
    pub fn add_adorner(&mut self, adorned: VisualId, offset: Vec2, size: Size) -> Result<VisualId> {
        self.node(adorned)?;
        Ok(self.insert(
            Link::Adorns(adorned),
            Transform::translate(offset.x, offset.y),
            size,
        ))
    }

    pub fn add_detached(&mut self, size: Size) -> VisualId {
        self.insert(Link::Detached, Transform::identity(), size)
    }

    pub fn set_transform(&mut self, id: VisualId, transform: Transform) -> Result<()> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    pub fn set_size(&mut self, id: VisualId, size: Size) -> Result<()> {
        self.node_mut(id)?.size = size;
        Ok(())
    }

    /// Cuts `id` (and so its subtree) loose from any root.
    pub fn detach(&mut self, id: VisualId) -> Result<()> {
        self.node_mut(id)?.link = Link::Detached;
        Ok(())
    }

    pub fn remove(&mut self, id: VisualId) -> Result<()> {
        self.nodes.remove(id).map(|_| ()).ok_or(PopupError::UnknownVisual)
    }

    pub fn contains(&self, id: VisualId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Bounds in the node's own coordinate space.
    pub fn bounds(&self, id: VisualId) -> Result<Rect> {
        let n = self.node(id)?;
        Ok(Rect::from_origin_size(Vec2::ZERO, n.size))
    }

    /// Root the node is attached to, following adorners to their targets.
    pub fn root_of(&self, id: VisualId) -> Result<VisualId> {
        let mut cur = id;
        for _ in 0..=self.nodes.len() {
            match self.node(cur)?.link {
                Link::Root => return Ok(cur),
                Link::Parent(p) | Link::Adorns(p) => cur = p,
                Link::Detached => return Err(PopupError::NotAttachedToVisualRoot),
            }
        }
        // A cycle never reaches a root.
        Err(PopupError::NotAttachedToVisualRoot)
    }

    /// Transform from `from`'s space into `ancestor`'s space.
    pub fn transform_to(&self, from: VisualId, ancestor: VisualId) -> Result<Transform> {
        self.node(ancestor)?;
        self.root_of(from)?;

        let mut acc = Transform::identity();
        let mut cur = from;
        loop {
            if cur == ancestor {
                return Ok(acc);
            }
            let n = self.node(cur)?;
            acc = acc.then(&n.transform);
            cur = match n.link {
                Link::Parent(p) | Link::Adorns(p) => p,
                Link::Root => return Err(PopupError::HostNotInChain),
                Link::Detached => return Err(PopupError::NotAttachedToVisualRoot),
            };
        }
    }

    /// Anchor rectangle for `target` in `host` space.
    ///
    /// `sub_rect`, in target space, narrows the anchor to part of the target.
    /// `host` defaults to the target's root.
    pub fn anchor_rect(
        &self,
        target: VisualId,
        sub_rect: Option<Rect>,
        host: Option<VisualId>,
    ) -> Result<Rect> {
        let host = match host {
            Some(h) => h,
            None => self.root_of(target)?,
        };
        let bounds = self.bounds(target)?;
        let local = match sub_rect {
            Some(r) => bounds.intersect(&r),
            None => bounds,
        };
        Ok(self.transform_to(target, host)?.apply_to_rect(local))
    }

    fn insert(&mut self, link: Link, transform: Transform, size: Size) -> VisualId {
        self.nodes.insert(VisualNode {
            link,
            transform,
            size,
        })
    }

    fn node(&self, id: VisualId) -> Result<&VisualNode> {
        self.nodes.get(id).ok_or(PopupError::UnknownVisual)
    }

    fn node_mut(&mut self, id: VisualId) -> Result<&mut VisualNode> {
        self.nodes.get_mut(id).ok_or(PopupError::UnknownVisual)
    }
}

/// A placement request against a live visual tree.
///
/// Flow direction comes from the composition locals unless set explicitly.
#[derive(Clone, Debug)]
pub struct PlacementRequest {
    pub mode: PlacementMode,
    pub target: VisualId,
    pub host: Option<VisualId>,
    pub sub_rect: Option<Rect>,
    pub offset: Vec2,
    /// Gap kept between the popup body and its anchor.
    pub margin: f32,
    pub anchor_gravity: Option<(PopupAnchor, PopupGravity)>,
    pub constraint_adjustment: ConstraintAdjustment,
    pub flow: Option<FlowDirection>,
    /// Last known pointer position in host space.
    pub pointer: Option<Vec2>,
}

impl PlacementRequest {
    pub fn new(mode: PlacementMode, target: VisualId) -> Self {
        Self {
            mode,
            target,
            host: None,
            sub_rect: None,
            offset: Vec2::ZERO,
            margin: 0.0,
            anchor_gravity: None,
            constraint_adjustment: ConstraintAdjustment::default(),
            flow: None,
            pointer: None,
        }
    }

    pub fn host(mut self, host: VisualId) -> Self {
        self.host = Some(host);
        self
    }

    pub fn sub_rect(mut self, r: Rect) -> Self {
        self.sub_rect = Some(r);
        self
    }

    pub fn offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn anchor_gravity(mut self, anchor: PopupAnchor, gravity: PopupGravity) -> Self {
        self.anchor_gravity = Some((anchor, gravity));
        self
    }

    pub fn constraint_adjustment(mut self, c: ConstraintAdjustment) -> Self {
        self.constraint_adjustment = c;
        self
    }

    pub fn flow(mut self, flow: FlowDirection) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn pointer(mut self, p: Vec2) -> Self {
        self.pointer = Some(p);
        self
    }

    pub fn resolve(&self, tree: &VisualTree) -> Result<ResolvedPlacement> {
        let anchor_rect = if self.mode == PlacementMode::Pointer {
            // The target must still be attached for a pointer popup.
            tree.root_of(self.target)?;
            let p = self.pointer.ok_or(PopupError::MissingPointerPosition)?;
            Rect::new(p.x, p.y, 1.0, 1.0)
        } else {
            tree.anchor_rect(self.target, self.sub_rect, self.host)?
        };

        let flow = self.flow.unwrap_or_else(flow_direction);
        let mut r = resolve_placement(
            self.mode,
            anchor_rect,
            self.offset,
            self.anchor_gravity,
            flow,
        )?;
        r.offset = r.offset + margin_to_anchor_offset(self.mode, self.margin, r.anchor, r.gravity);
        r.constraint_adjustment = self.constraint_adjustment;
        log::trace!(
            "resolved {} -> {:?}/{:?} offset {:?}",
            self.mode,
            r.anchor,
            r.gravity,
            r.offset
        );
        Ok(r)
    }
}
