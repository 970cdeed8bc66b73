//! Box-shadow values as they come out of the design tokens.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Color, Thickness};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxShadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub spread: f32,
    pub color: Color,
    #[cfg_attr(feature = "serde", serde(default))]
    pub inset: bool,
}

impl BoxShadow {
    pub fn new(offset_x: f32, offset_y: f32, blur: f32, spread: f32, color: Color) -> Self {
        Self {
            offset_x,
            offset_y,
            blur,
            spread,
            color,
            inset: false,
        }
    }

    /// How far this shadow paints outside the box on each edge.
    ///
    /// Inset shadows paint inside and contribute nothing.
    pub fn thickness(&self) -> Thickness {
        if self.inset {
            return Thickness::default();
        }
        let extent = self.blur + self.spread;
        Thickness {
            left: (extent - self.offset_x).max(0.0),
            top: (extent - self.offset_y).max(0.0),
            right: (extent + self.offset_x).max(0.0),
            bottom: (extent + self.offset_y).max(0.0),
        }
    }
}

/// Ordered shadow list. Most token sets carry three or fewer.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxShadows(pub SmallVec<[BoxShadow; 3]>);

impl BoxShadows {
    pub fn new(shadows: impl IntoIterator<Item = BoxShadow>) -> Self {
        Self(shadows.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxShadow> {
        self.0.iter()
    }

    /// Edge-wise maximum extent over every shadow in the list.
    pub fn thickness(&self) -> Thickness {
        self.0
            .iter()
            .fold(Thickness::default(), |acc, s| acc.max(s.thickness()))
    }
}

impl From<BoxShadow> for BoxShadows {
    fn from(s: BoxShadow) -> Self {
        BoxShadows::new([s])
    }
}
