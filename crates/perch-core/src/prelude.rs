pub use crate::animation::{
    AnimatedValue, AnimationSpec, Clock, Easing, Interpolate, ManualClock, SystemClock,
};
pub use crate::color::Color;
pub use crate::effects::{Dispose, effect};
pub use crate::geometry::{CornerRadius, Rect, Size, Thickness, Transform, Vec2};
pub use crate::locals::{
    Density, FlowDirection, ThemeVariant, density, flow_direction, theme_variant, with_density,
    with_flow_direction, with_theme_variant,
};
pub use crate::runtime::Dispatcher;
pub use crate::scope::{Scope, current_scope};
pub use crate::shadow::{BoxShadow, BoxShadows};
pub use crate::signal::{Signal, signal};
pub use crate::tokens::{DesignTokens, TokenKey, TokenResolver, TokenSet, TokenValue};
pub use crate::view::{ImageHandle, Scene, SceneNode, Side};
