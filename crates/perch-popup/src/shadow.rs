//! Shadow layers for the companion surface.
//!
//! Several offset shadows composited into one bitmap at a fractional scale
//! come out misaligned on some backends, so by default every shadow gets its
//! own layer. Backends that composite correctly can ask for one combined
//! layer instead.

use perch_core::{BoxShadows, CornerRadius, Rect, Scene, SceneNode, Thickness};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShadowRenderMode {
    #[default]
    PerLayer,
    Combined,
}

/// One drawable shadow layer. Every layer carries the content's radius.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowLayer {
    pub shadows: BoxShadows,
    pub corner_radius: CornerRadius,
}

impl ShadowLayer {
    /// Pushes this layer's shadows around `content`.
    pub fn paint(&self, scene: &mut Scene, content: Rect) {
        for shadow in self.shadows.iter() {
            scene.push(SceneNode::BoxShadow {
                rect: content,
                shadow: *shadow,
                radius: self.corner_radius,
            });
        }
    }
}

pub type ShadowLayers = SmallVec<[ShadowLayer; 3]>;

pub fn build_shadow_layers(
    shadows: &BoxShadows,
    corner_radius: CornerRadius,
    mode: ShadowRenderMode,
) -> ShadowLayers {
    if shadows.is_empty() {
        return ShadowLayers::new();
    }
    match mode {
        ShadowRenderMode::PerLayer => shadows
            .iter()
            .map(|s| ShadowLayer {
                shadows: BoxShadows::from(*s),
                corner_radius,
            })
            .collect(),
        ShadowRenderMode::Combined => smallvec::smallvec![ShadowLayer {
            shadows: shadows.clone(),
            corner_radius,
        }],
    }
}

/// Outward padding the companion needs so no layer is clipped.
pub fn shadow_padding(layers: &[ShadowLayer]) -> Thickness {
    layers
        .iter()
        .fold(Thickness::default(), |acc, l| acc.max(l.shadows.thickness()))
}
