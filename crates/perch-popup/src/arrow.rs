//! Where the decorative arrow goes for a placement.
//!
//! The arrow always points back at the anchor, so it sits on the side of the
//! popup body opposite to the direction the body grows in.

use perch_core::{Size, Vec2};

use crate::placement::{Direction, PlacementMode, PopupAnchor, PopupGravity};

const ARROW_TABLE: [(PopupAnchor, PopupGravity, ArrowPosition); 12] = [
    (PopupAnchor::BOTTOM, PopupGravity::BOTTOM, ArrowPosition::Top),
    (PopupAnchor::RIGHT, PopupGravity::RIGHT, ArrowPosition::Left),
    (PopupAnchor::LEFT, PopupGravity::LEFT, ArrowPosition::Right),
    (PopupAnchor::TOP, PopupGravity::TOP, ArrowPosition::Bottom),
    (PopupAnchor::TOP_RIGHT, PopupGravity::TOP_LEFT, ArrowPosition::BottomEdgeAlignedRight),
    (PopupAnchor::TOP_LEFT, PopupGravity::TOP_RIGHT, ArrowPosition::BottomEdgeAlignedLeft),
    (PopupAnchor::BOTTOM_LEFT, PopupGravity::BOTTOM_RIGHT, ArrowPosition::TopEdgeAlignedLeft),
    (PopupAnchor::BOTTOM_RIGHT, PopupGravity::BOTTOM_LEFT, ArrowPosition::TopEdgeAlignedRight),
    (PopupAnchor::TOP_LEFT, PopupGravity::BOTTOM_LEFT, ArrowPosition::RightEdgeAlignedTop),
    (PopupAnchor::BOTTOM_LEFT, PopupGravity::TOP_LEFT, ArrowPosition::RightEdgeAlignedBottom),
    (PopupAnchor::TOP_RIGHT, PopupGravity::BOTTOM_RIGHT, ArrowPosition::LeftEdgeAlignedTop),
    (PopupAnchor::BOTTOM_RIGHT, PopupGravity::TOP_RIGHT, ArrowPosition::LeftEdgeAlignedBottom),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrowPosition {
    Top,
    Bottom,
    Left,
    Right,
    TopEdgeAlignedLeft,
    TopEdgeAlignedRight,
    BottomEdgeAlignedLeft,
    BottomEdgeAlignedRight,
    LeftEdgeAlignedTop,
    LeftEdgeAlignedBottom,
    RightEdgeAlignedTop,
    RightEdgeAlignedBottom,
}

impl ArrowPosition {
    pub const ALL: [ArrowPosition; 12] = [
        ArrowPosition::Top,
        ArrowPosition::Bottom,
        ArrowPosition::Left,
        ArrowPosition::Right,
        ArrowPosition::TopEdgeAlignedLeft,
        ArrowPosition::TopEdgeAlignedRight,
        ArrowPosition::BottomEdgeAlignedLeft,
        ArrowPosition::BottomEdgeAlignedRight,
        ArrowPosition::LeftEdgeAlignedTop,
        ArrowPosition::LeftEdgeAlignedBottom,
        ArrowPosition::RightEdgeAlignedTop,
        ArrowPosition::RightEdgeAlignedBottom,
    ];

    /// Arrow for a canonical anchor/gravity pair.
    pub fn from_pair(anchor: PopupAnchor, gravity: PopupGravity) -> Option<ArrowPosition> {
        ARROW_TABLE
            .iter()
            .find(|(a, g, _)| *a == anchor && *g == gravity)
            .map(|(_, _, pos)| *pos)
    }

    /// Side of the popup body the arrow is drawn on.
    pub fn direction(self) -> Direction {
        use ArrowPosition::*;
        match self {
            Top | TopEdgeAlignedLeft | TopEdgeAlignedRight => Direction::Top,
            Bottom | BottomEdgeAlignedLeft | BottomEdgeAlignedRight => Direction::Bottom,
            Left | LeftEdgeAlignedTop | LeftEdgeAlignedBottom => Direction::Left,
            Right | RightEdgeAlignedTop | RightEdgeAlignedBottom => Direction::Right,
        }
    }

    /// Indicator box for an arrow whose base is `arrow_size` long. The base
    /// runs along the edge; the tip sticks out half as far.
    pub fn indicator_size(self, arrow_size: f32) -> Size {
        if self.direction().is_vertical() {
            Size::new(arrow_size, arrow_size / 2.0)
        } else {
            Size::new(arrow_size / 2.0, arrow_size)
        }
    }

    /// Mirror onto the opposite side, keeping the aligned end. Used when the
    /// positioner flipped the popup to the other side of its anchor.
    pub fn flipped(self) -> ArrowPosition {
        use ArrowPosition::*;
        match self {
            Top => Bottom,
            Bottom => Top,
            Left => Right,
            Right => Left,
            TopEdgeAlignedLeft => BottomEdgeAlignedLeft,
            TopEdgeAlignedRight => BottomEdgeAlignedRight,
            BottomEdgeAlignedLeft => TopEdgeAlignedLeft,
            BottomEdgeAlignedRight => TopEdgeAlignedRight,
            LeftEdgeAlignedTop => RightEdgeAlignedTop,
            LeftEdgeAlignedBottom => RightEdgeAlignedBottom,
            RightEdgeAlignedTop => LeftEdgeAlignedTop,
            RightEdgeAlignedBottom => LeftEdgeAlignedBottom,
        }
    }
}

/// Whether `(anchor, gravity)` is one of the pairs an arrow is defined for.
pub fn is_canonical(anchor: PopupAnchor, gravity: PopupGravity) -> bool {
    ArrowPosition::from_pair(anchor, gravity).is_some()
}

/// Whether a popup placed this way can carry an arrow at all.
pub fn can_enable_arrow(
    mode: PlacementMode,
    anchor: Option<PopupAnchor>,
    gravity: Option<PopupGravity>,
) -> bool {
    match mode {
        PlacementMode::Center | PlacementMode::Pointer => false,
        PlacementMode::AnchorAndGravity => match (anchor, gravity) {
            (Some(a), Some(g)) => is_canonical(a, g),
            _ => false,
        },
        _ => true,
    }
}

/// Arrow position for a placement, or `None` where no arrow is meaningful.
///
/// `anchor`/`gravity` are read only for `AnchorAndGravity`; a non-canonical
/// pair there yields `None` rather than a guess.
pub fn derive_arrow_position(
    mode: PlacementMode,
    anchor: Option<PopupAnchor>,
    gravity: Option<PopupGravity>,
) -> Option<ArrowPosition> {
    if !can_enable_arrow(mode, anchor, gravity) {
        return None;
    }
    let (anchor, gravity) = match mode.anchor_and_gravity() {
        Some(pair) => pair,
        None => (anchor?, gravity?),
    };
    ArrowPosition::from_pair(anchor, gravity)
}

/// Shift that moves an edge-aligned popup so its arrow tip points at the
/// centre of the anchor control.
///
/// `vertex` is the distance of the arrow tip from the popup's leading edge
/// and from its trailing edge along the aligned axis.
pub fn point_at_center_offset(mode: PlacementMode, anchor_size: Size, vertex: (f32, f32)) -> Vec2 {
    let cx = anchor_size.width / 2.0;
    let cy = anchor_size.height / 2.0;
    match mode {
        PlacementMode::TopEdgeAlignedLeft | PlacementMode::BottomEdgeAlignedLeft => {
            Vec2::new(cx - vertex.0, 0.0)
        }
        PlacementMode::TopEdgeAlignedRight | PlacementMode::BottomEdgeAlignedRight => {
            Vec2::new(vertex.1 - cx, 0.0)
        }
        PlacementMode::LeftEdgeAlignedTop | PlacementMode::RightEdgeAlignedTop => {
            Vec2::new(0.0, cy - vertex.0)
        }
        PlacementMode::LeftEdgeAlignedBottom | PlacementMode::RightEdgeAlignedBottom => {
            Vec2::new(0.0, vertex.1 - cy)
        }
        _ => Vec2::ZERO,
    }
}
