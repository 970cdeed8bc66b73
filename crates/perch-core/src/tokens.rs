//! # Design tokens
//!
//! The popup engine never owns styling. It asks a [`TokenResolver`] for a
//! handful of typed values (the shadow list, the corner radius, the motion
//! duration, the arrow fill) and re-asks when the application says the theme
//! changed.
//!
//! [`DesignTokens`] is the stock table. Applications with their own style
//! system implement [`TokenResolver`] over it instead.
//!
//! ```rust
//! use perch_core::*;
//!
//! let tokens = DesignTokens::default();
//! let radius = tokens.corner_radius(ThemeVariant::Light);
//! assert_eq!(radius, CornerRadius::uniform(6.0));
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::{BoxShadow, BoxShadows, Color, CornerRadius, ThemeVariant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKey {
    /// Elevation shadow under floating surfaces.
    BoxShadowsSecondary,
    BorderRadius,
    MotionDurationMid,
    /// Fill of the popup body, and so of its arrow.
    ColorBgElevated,
    ArrowSize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    Shadows(BoxShadows),
    Radius(CornerRadius),
    Duration(Duration),
    Color(Color),
    Length(f32),
}

pub trait TokenResolver {
    fn lookup(&self, key: TokenKey, variant: ThemeVariant) -> Option<TokenValue>;

    fn box_shadows(&self, variant: ThemeVariant) -> BoxShadows {
        match self.lookup(TokenKey::BoxShadowsSecondary, variant) {
            Some(TokenValue::Shadows(s)) => s,
            other => fallback(TokenKey::BoxShadowsSecondary, other, BoxShadows::default()),
        }
    }

    fn corner_radius(&self, variant: ThemeVariant) -> CornerRadius {
        match self.lookup(TokenKey::BorderRadius, variant) {
            Some(TokenValue::Radius(r)) => r,
            Some(TokenValue::Length(l)) => CornerRadius::uniform(l),
            other => fallback(TokenKey::BorderRadius, other, CornerRadius::default()),
        }
    }

    fn motion_duration(&self, variant: ThemeVariant) -> Duration {
        match self.lookup(TokenKey::MotionDurationMid, variant) {
            Some(TokenValue::Duration(d)) => d,
            other => fallback(TokenKey::MotionDurationMid, other, Duration::ZERO),
        }
    }

    /// Base length of the arrow indicator along the edge it sits on.
    fn arrow_size(&self, variant: ThemeVariant) -> f32 {
        match self.lookup(TokenKey::ArrowSize, variant) {
            Some(TokenValue::Length(l)) => l,
            other => fallback(TokenKey::ArrowSize, other, 16.0),
        }
    }

    fn arrow_fill(&self, variant: ThemeVariant) -> Color {
        match self.lookup(TokenKey::ColorBgElevated, variant) {
            Some(TokenValue::Color(c)) => c,
            other => fallback(TokenKey::ColorBgElevated, other, Color::WHITE),
        }
    }
}

fn fallback<T>(key: TokenKey, got: Option<TokenValue>, default: T) -> T {
    if let Some(v) = got {
        log::warn!("token {key:?} resolved to a value of the wrong type: {v:?}");
    }
    default
}

/// One theme variant's worth of token values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TokenSet {
    pub box_shadows_secondary: BoxShadows,
    pub border_radius: f32,
    pub motion_duration_mid_ms: u64,
    pub color_bg_elevated: Color,
    pub arrow_size: f32,
}

impl TokenSet {
    pub fn light() -> Self {
        Self {
            box_shadows_secondary: BoxShadows::new([
                BoxShadow::new(0.0, 6.0, 16.0, 0.0, Color::black_alpha(0.08)),
                BoxShadow::new(0.0, 3.0, 6.0, -4.0, Color::black_alpha(0.12)),
                BoxShadow::new(0.0, 9.0, 28.0, 8.0, Color::black_alpha(0.05)),
            ]),
            border_radius: 6.0,
            motion_duration_mid_ms: 200,
            color_bg_elevated: Color::WHITE,
            arrow_size: 16.0,
        }
    }

    pub fn dark() -> Self {
        Self {
            box_shadows_secondary: BoxShadows::new([
                BoxShadow::new(0.0, 6.0, 16.0, 0.0, Color::black_alpha(0.32)),
                BoxShadow::new(0.0, 3.0, 6.0, -4.0, Color::black_alpha(0.48)),
                BoxShadow::new(0.0, 9.0, 28.0, 8.0, Color::black_alpha(0.2)),
            ]),
            color_bg_elevated: Color::from_hex("#1f1f1f"),
            ..Self::light()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignTokens {
    pub light: TokenSet,
    pub dark: TokenSet,
}

impl Default for DesignTokens {
    fn default() -> Self {
        Self {
            light: TokenSet::light(),
            dark: TokenSet::dark(),
        }
    }
}

impl DesignTokens {
    pub fn set(&self, variant: ThemeVariant) -> &TokenSet {
        match variant {
            ThemeVariant::Light => &self.light,
            ThemeVariant::Dark => &self.dark,
        }
    }
}

impl TokenResolver for DesignTokens {
    fn lookup(&self, key: TokenKey, variant: ThemeVariant) -> Option<TokenValue> {
        let set = self.set(variant);
        Some(match key {
            TokenKey::BoxShadowsSecondary => TokenValue::Shadows(set.box_shadows_secondary.clone()),
            TokenKey::BorderRadius => TokenValue::Radius(CornerRadius::uniform(set.border_radius)),
            TokenKey::MotionDurationMid => {
                TokenValue::Duration(Duration::from_millis(set.motion_duration_mid_ms))
            }
            TokenKey::ColorBgElevated => TokenValue::Color(set.color_bg_elevated),
            TokenKey::ArrowSize => TokenValue::Length(set.arrow_size),
        })
    }
}
