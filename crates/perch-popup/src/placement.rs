//! # Placement
//!
//! Turns a high-level placement intent ("below, left-aligned") and an anchor
//! rectangle into the anchor edge, gravity and offset a platform positioner
//! consumes. Sliding and flipping the popup to keep it on screen is the
//! positioner's job; this module only says where it *wants* to go.
//!
//! ```rust
//! use perch_core::{FlowDirection, Rect, Vec2};
//! use perch_popup::*;
//!
//! let r = resolve_placement(
//!     PlacementMode::TopEdgeAlignedRight,
//!     Rect::new(100.0, 100.0, 50.0, 20.0),
//!     Vec2::ZERO,
//!     None,
//!     FlowDirection::RightToLeft,
//! )
//! .unwrap();
//! assert_eq!(r.anchor, PopupAnchor::TOP_LEFT);
//! assert_eq!(r.gravity, PopupGravity::TOP_RIGHT);
//! assert_eq!(r.arrow_position(), Some(ArrowPosition::BottomEdgeAlignedLeft));
//! ```

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use perch_core::{FlowDirection, Rect, Side, Size, Vec2};

use crate::arrow::{ArrowPosition, derive_arrow_position};
use crate::error::{PopupError, Result};

bitflags! {
    /// Edge or corner of the anchor rectangle the popup pivots on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PopupAnchor: u8 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;
        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
        const VERTICAL_MASK = Self::TOP.bits() | Self::BOTTOM.bits();
        const HORIZONTAL_MASK = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

bitflags! {
    /// Direction the popup body grows away from the anchor point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PopupGravity: u8 {
        const TOP = 1;
        const BOTTOM = 2;
        const LEFT = 4;
        const RIGHT = 8;
        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
        const VERTICAL_MASK = Self::TOP.bits() | Self::BOTTOM.bits();
        const HORIZONTAL_MASK = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

macro_rules! edge_ops {
    ($ty:ident, $which:literal) => {
        impl $ty {
            /// Centre of the rectangle on both axes.
            pub const NONE: Self = Self::empty();

            /// Rejects a set naming both opposite edges on either axis.
            pub fn validate(self) -> Result<Self> {
                if self.contains(Self::HORIZONTAL_MASK) || self.contains(Self::VERTICAL_MASK) {
                    return Err(PopupError::OppositeEdges {
                        which: $which,
                        bits: self.bits(),
                    });
                }
                Ok(self)
            }

            pub fn flip_x(self) -> Self {
                if self.intersects(Self::HORIZONTAL_MASK) {
                    self ^ Self::HORIZONTAL_MASK
                } else {
                    self
                }
            }

            pub fn flip_y(self) -> Self {
                if self.intersects(Self::VERTICAL_MASK) {
                    self ^ Self::VERTICAL_MASK
                } else {
                    self
                }
            }

            pub fn flip(self) -> Self {
                self.flip_x().flip_y()
            }
        }
    };
}

edge_ops!(PopupAnchor, "anchor");
edge_ops!(PopupGravity, "gravity");

bitflags! {
    /// What the platform positioner may do to keep a popup on screen.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConstraintAdjustment: u8 {
        const SLIDE_X = 1;
        const SLIDE_Y = 2;
        const FLIP_X = 4;
        const FLIP_Y = 8;
        const RESIZE_X = 16;
        const RESIZE_Y = 32;
        const SLIDE = Self::SLIDE_X.bits() | Self::SLIDE_Y.bits();
        const FLIP = Self::FLIP_X.bits() | Self::FLIP_Y.bits();
        const RESIZE = Self::RESIZE_X.bits() | Self::RESIZE_Y.bits();
    }
}

impl Default for ConstraintAdjustment {
    fn default() -> Self {
        Self::all()
    }
}

/// Side of the anchor the popup body sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Top | Direction::Bottom)
    }

    pub fn side(self) -> Side {
        match self {
            Direction::Top => Side::Top,
            Direction::Bottom => Side::Bottom,
            Direction::Left => Side::Left,
            Direction::Right => Side::Right,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PlacementMode {
    /// At the last known pointer position.
    Pointer = 0,
    #[default]
    Bottom = 1,
    Right = 2,
    Left = 3,
    Top = 4,
    /// Centred over the anchor; no arrow, no margin.
    Center = 5,
    /// Caller supplies the anchor/gravity pair.
    AnchorAndGravity = 6,
    TopEdgeAlignedLeft = 7,
    TopEdgeAlignedRight = 8,
    BottomEdgeAlignedLeft = 9,
    BottomEdgeAlignedRight = 10,
    LeftEdgeAlignedTop = 11,
    LeftEdgeAlignedBottom = 12,
    RightEdgeAlignedTop = 13,
    RightEdgeAlignedBottom = 14,
}

impl PlacementMode {
    pub const ALL: [PlacementMode; 15] = [
        PlacementMode::Pointer,
        PlacementMode::Bottom,
        PlacementMode::Right,
        PlacementMode::Left,
        PlacementMode::Top,
        PlacementMode::Center,
        PlacementMode::AnchorAndGravity,
        PlacementMode::TopEdgeAlignedLeft,
        PlacementMode::TopEdgeAlignedRight,
        PlacementMode::BottomEdgeAlignedLeft,
        PlacementMode::BottomEdgeAlignedRight,
        PlacementMode::LeftEdgeAlignedTop,
        PlacementMode::LeftEdgeAlignedBottom,
        PlacementMode::RightEdgeAlignedTop,
        PlacementMode::RightEdgeAlignedBottom,
    ];

    /// The twelve placements with a fixed edge.
    pub const EDGES: [PlacementMode; 12] = [
        PlacementMode::Bottom,
        PlacementMode::Right,
        PlacementMode::Left,
        PlacementMode::Top,
        PlacementMode::TopEdgeAlignedLeft,
        PlacementMode::TopEdgeAlignedRight,
        PlacementMode::BottomEdgeAlignedLeft,
        PlacementMode::BottomEdgeAlignedRight,
        PlacementMode::LeftEdgeAlignedTop,
        PlacementMode::LeftEdgeAlignedBottom,
        PlacementMode::RightEdgeAlignedTop,
        PlacementMode::RightEdgeAlignedBottom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PlacementMode::Pointer => "Pointer",
            PlacementMode::Bottom => "Bottom",
            PlacementMode::Right => "Right",
            PlacementMode::Left => "Left",
            PlacementMode::Top => "Top",
            PlacementMode::Center => "Center",
            PlacementMode::AnchorAndGravity => "AnchorAndGravity",
            PlacementMode::TopEdgeAlignedLeft => "TopEdgeAlignedLeft",
            PlacementMode::TopEdgeAlignedRight => "TopEdgeAlignedRight",
            PlacementMode::BottomEdgeAlignedLeft => "BottomEdgeAlignedLeft",
            PlacementMode::BottomEdgeAlignedRight => "BottomEdgeAlignedRight",
            PlacementMode::LeftEdgeAlignedTop => "LeftEdgeAlignedTop",
            PlacementMode::LeftEdgeAlignedBottom => "LeftEdgeAlignedBottom",
            PlacementMode::RightEdgeAlignedTop => "RightEdgeAlignedTop",
            PlacementMode::RightEdgeAlignedBottom => "RightEdgeAlignedBottom",
        }
    }

    /// Fixed anchor/gravity pair for this placement.
    ///
    /// `None` for `AnchorAndGravity`, whose pair comes from the caller.
    pub fn anchor_and_gravity(self) -> Option<(PopupAnchor, PopupGravity)> {
        use PlacementMode::*;
        let pair = match self {
            Pointer => (PopupAnchor::TOP_LEFT, PopupGravity::BOTTOM_RIGHT),
            Center => (PopupAnchor::NONE, PopupGravity::NONE),
            AnchorAndGravity => return None,
            Bottom => (PopupAnchor::BOTTOM, PopupGravity::BOTTOM),
            Right => (PopupAnchor::RIGHT, PopupGravity::RIGHT),
            Left => (PopupAnchor::LEFT, PopupGravity::LEFT),
            Top => (PopupAnchor::TOP, PopupGravity::TOP),
            TopEdgeAlignedRight => (PopupAnchor::TOP_RIGHT, PopupGravity::TOP_LEFT),
            TopEdgeAlignedLeft => (PopupAnchor::TOP_LEFT, PopupGravity::TOP_RIGHT),
            BottomEdgeAlignedLeft => (PopupAnchor::BOTTOM_LEFT, PopupGravity::BOTTOM_RIGHT),
            BottomEdgeAlignedRight => (PopupAnchor::BOTTOM_RIGHT, PopupGravity::BOTTOM_LEFT),
            LeftEdgeAlignedTop => (PopupAnchor::TOP_LEFT, PopupGravity::BOTTOM_LEFT),
            LeftEdgeAlignedBottom => (PopupAnchor::BOTTOM_LEFT, PopupGravity::TOP_LEFT),
            RightEdgeAlignedTop => (PopupAnchor::TOP_RIGHT, PopupGravity::BOTTOM_RIGHT),
            RightEdgeAlignedBottom => (PopupAnchor::BOTTOM_RIGHT, PopupGravity::TOP_RIGHT),
        };
        Some(pair)
    }

    /// Edge placement whose fixed pair is `(anchor, gravity)`, if any.
    pub fn from_anchor_gravity(anchor: PopupAnchor, gravity: PopupGravity) -> Option<Self> {
        Self::EDGES
            .into_iter()
            .find(|m| m.anchor_and_gravity() == Some((anchor, gravity)))
    }

    pub fn direction(self) -> Option<Direction> {
        use PlacementMode::*;
        match self {
            Left | LeftEdgeAlignedTop | LeftEdgeAlignedBottom => Some(Direction::Left),
            Top | TopEdgeAlignedLeft | TopEdgeAlignedRight => Some(Direction::Top),
            Right | RightEdgeAlignedTop | RightEdgeAlignedBottom => Some(Direction::Right),
            Bottom | BottomEdgeAlignedLeft | BottomEdgeAlignedRight => Some(Direction::Bottom),
            Pointer | Center | AnchorAndGravity => None,
        }
    }

    pub fn is_edge_aligned(self) -> bool {
        self.direction().is_some()
            && !matches!(
                self,
                PlacementMode::Top | PlacementMode::Bottom | PlacementMode::Left | PlacementMode::Right
            )
    }
}

impl TryFrom<u8> for PlacementMode {
    type Error = PopupError;

    fn try_from(v: u8) -> Result<Self> {
        Self::ALL
            .get(v as usize)
            .copied()
            .ok_or(PopupError::PlacementOutOfRange(v))
    }
}

impl FromStr for PlacementMode {
    type Err = PopupError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| PopupError::UnknownPlacement(s.to_string()))
    }
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a platform positioner needs to place one popup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedPlacement {
    pub mode: PlacementMode,
    /// In host coordinates.
    pub anchor_rect: Rect,
    pub anchor: PopupAnchor,
    pub gravity: PopupGravity,
    pub offset: Vec2,
    pub constraint_adjustment: ConstraintAdjustment,
    /// Side of the anchor the body sits on, after any RTL flip.
    pub direction: Option<Direction>,
}

impl ResolvedPlacement {
    /// Arrow for the pair actually handed to the positioner.
    pub fn arrow_position(&self) -> Option<ArrowPosition> {
        match self.mode {
            PlacementMode::Center | PlacementMode::Pointer => None,
            _ => derive_arrow_position(
                PlacementMode::AnchorAndGravity,
                Some(self.anchor),
                Some(self.gravity),
            ),
        }
    }

    /// Unconstrained popup rectangle for a body of `size`.
    pub fn popup_rect(&self, size: Size) -> Rect {
        let p = gravitate(anchor_point(self.anchor_rect, self.anchor), size, self.gravity);
        Rect::from_origin_size(p + self.offset, size)
    }
}

/// Resolves `mode` against `anchor_rect`.
///
/// `anchor_rect` is already in host space. For `Pointer` its origin is the
/// pointer position and it collapses to a 1×1 box there. `explicit` is read
/// only for `AnchorAndGravity`; a missing pair there means centred.
pub fn resolve_placement(
    mode: PlacementMode,
    anchor_rect: Rect,
    offset: Vec2,
    explicit: Option<(PopupAnchor, PopupGravity)>,
    flow: FlowDirection,
) -> Result<ResolvedPlacement> {
    let (anchor, gravity) = match mode.anchor_and_gravity() {
        Some(pair) => pair,
        None => explicit.unwrap_or((PopupAnchor::NONE, PopupGravity::NONE)),
    };
    anchor.validate()?;
    gravity.validate()?;

    let anchor_rect = if mode == PlacementMode::Pointer {
        Rect::new(anchor_rect.x, anchor_rect.y, 1.0, 1.0)
    } else {
        anchor_rect
    };

    let (anchor, gravity) = match flow {
        FlowDirection::LeftToRight => (anchor, gravity),
        FlowDirection::RightToLeft => (anchor.flip_x(), gravity.flip_x()),
    };

    Ok(ResolvedPlacement {
        mode,
        anchor_rect,
        anchor,
        gravity,
        offset,
        constraint_adjustment: ConstraintAdjustment::default(),
        direction: effective_direction(mode, anchor, gravity),
    })
}

fn effective_direction(
    mode: PlacementMode,
    anchor: PopupAnchor,
    gravity: PopupGravity,
) -> Option<Direction> {
    match mode {
        PlacementMode::Center | PlacementMode::Pointer => None,
        _ => PlacementMode::from_anchor_gravity(anchor, gravity).and_then(PlacementMode::direction),
    }
}

/// Offset that keeps `margin` between the popup body and its anchor.
///
/// Edge placements push along their direction. `Pointer` pushes on both
/// axes, away from the pointer in the direction of `gravity`. Centred and
/// non-canonical pairs get no margin.
pub fn margin_to_anchor_offset(
    mode: PlacementMode,
    margin: f32,
    anchor: PopupAnchor,
    gravity: PopupGravity,
) -> Vec2 {
    if mode == PlacementMode::Pointer {
        let x = if gravity.contains(PopupGravity::LEFT) { -margin } else { margin };
        let y = if gravity.contains(PopupGravity::TOP) { -margin } else { margin };
        return Vec2::new(x, y);
    }
    match effective_direction(mode, anchor, gravity) {
        Some(Direction::Bottom) => Vec2::new(0.0, margin),
        Some(Direction::Top) => Vec2::new(0.0, -margin),
        Some(Direction::Left) => Vec2::new(-margin, 0.0),
        Some(Direction::Right) => Vec2::new(margin, 0.0),
        None => Vec2::ZERO,
    }
}

/// Point on `rect` named by `edge`; the centre on any axis it leaves open.
pub fn anchor_point(rect: Rect, edge: PopupAnchor) -> Vec2 {
    let x = if edge.contains(PopupAnchor::LEFT) {
        rect.x
    } else if edge.contains(PopupAnchor::RIGHT) {
        rect.right()
    } else {
        rect.x + rect.w / 2.0
    };
    let y = if edge.contains(PopupAnchor::TOP) {
        rect.y
    } else if edge.contains(PopupAnchor::BOTTOM) {
        rect.bottom()
    } else {
        rect.y + rect.h / 2.0
    };
    Vec2::new(x, y)
}

/// Top-left corner of a `size` body growing from `anchor` towards `gravity`.
pub fn gravitate(anchor: Vec2, size: Size, gravity: PopupGravity) -> Vec2 {
    let x = if gravity.contains(PopupGravity::LEFT) {
        -size.width
    } else if gravity.contains(PopupGravity::RIGHT) {
        0.0
    } else {
        -size.width / 2.0
    };
    let y = if gravity.contains(PopupGravity::TOP) {
        -size.height
    } else if gravity.contains(PopupGravity::BOTTOM) {
        0.0
    } else {
        -size.height / 2.0
    };
    anchor + Vec2::new(x, y)
}
