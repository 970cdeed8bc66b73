//! Collaborator seams.
//!
//! The companion layer only talks to the windowing system through these
//! traits. Anything a platform exposes only through private hooks belongs
//! behind [`OverlaySurface`] and nowhere else.
//!
//! Positions are physical screen pixels; sizes are logical. Multiply by
//! [`OverlaySurface::scaling`] to go from one to the other.

use std::rc::Rc;

use perch_core::{CornerRadius, ImageHandle, Rect, Signal, Size, Vec2, density};

use crate::arrow::ArrowPosition;

/// The popup the companion decorates.
pub trait PrimarySurface {
    /// Fires when the popup gains or loses its platform host. The host may
    /// not exist yet when the companion attaches.
    fn host_assigned(&self) -> &Signal<Option<Rc<dyn PopupHost>>>;

    fn host(&self) -> Option<Rc<dyn PopupHost>> {
        self.host_assigned().get()
    }
}

/// Platform window hosting a popup.
pub trait PopupHost {
    /// `None` until the platform window exists.
    fn position(&self) -> Option<Vec2>;
    fn client_size(&self) -> Size;
    /// Whether the positioner flipped the popup to the far side of its anchor.
    fn is_flipped(&self) -> bool {
        false
    }
    fn size_changed(&self) -> &Signal<Size>;
    fn position_changed(&self) -> &Signal<Vec2>;
    fn presenter(&self) -> Option<Rc<dyn PopupPresenter>>;
}

/// Content root of a popup host.
pub trait PopupPresenter {
    /// Still image of what the presenter shows right now.
    fn capture_current_bitmap(&self) -> Option<ImageHandle>;
    fn desired_size(&self) -> Size;
    fn opacity(&self) -> f32;
    fn set_opacity(&self, opacity: f32);
    fn corner_radius(&self) -> CornerRadius {
        CornerRadius::default()
    }
    /// Content that draws an arrow towards its anchor, if any.
    fn arrow_decorated(&self) -> Option<Rc<dyn ArrowDecorated>> {
        None
    }
}

pub trait ArrowDecorated {
    fn is_show_arrow(&self) -> bool;
    fn arrow_position(&self) -> ArrowPosition;
    /// Size of the arrow indicator, already oriented for its side.
    fn arrow_indicator_bounds(&self) -> Rect;
    /// Where the indicator sits inside the content.
    fn arrow_indicator_layout_bounds(&self) -> Rect;
    fn corner_radius(&self) -> CornerRadius;
    fn set_arrow_opacity(&self, opacity: f32);
}

/// The companion's own always-on-top window.
pub trait OverlaySurface {
    fn move_and_resize(&self, position: Vec2, size: Size);
    fn show(&self);
    fn hide(&self);
    /// Gives the platform window back. The surface is not reused after this.
    fn release(&self);
    fn scaling(&self) -> f32 {
        density().scale
    }
}

/// Render-time correction for backends that clamp window origins.
pub trait VerticalCorrection {
    fn render_offset(&self, layer_origin: Vec2) -> Vec2;
}

pub struct NoCorrection;

impl VerticalCorrection for NoCorrection {
    fn render_offset(&self, _: Vec2) -> Vec2 {
        Vec2::ZERO
    }
}

/// Compensates a backend that refuses to put a window above the top of the
/// usable screen area: the window lands lower than asked, so its content is
/// drawn shifted up by the difference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkingAreaClamp {
    pub working_area_top: f32,
}

impl WorkingAreaClamp {
    /// Uses the lowest working-area top across all screens.
    pub fn from_screens(working_areas: impl IntoIterator<Item = Rect>) -> Self {
        let top = working_areas.into_iter().fold(0.0f32, |acc, r| acc.max(r.y));
        Self {
            working_area_top: top,
        }
    }
}

impl VerticalCorrection for WorkingAreaClamp {
    fn render_offset(&self, layer_origin: Vec2) -> Vec2 {
        let delta = layer_origin.y - self.working_area_top;
        if delta < 0.0 {
            Vec2::new(0.0, delta)
        } else {
            Vec2::ZERO
        }
    }
}

/// The correction the current desktop backend needs.
pub fn platform_correction(working_areas: impl IntoIterator<Item = Rect>) -> Box<dyn VerticalCorrection> {
    if cfg!(target_os = "macos") {
        Box::new(WorkingAreaClamp::from_screens(working_areas))
    } else {
        Box::new(NoCorrection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_only_corrects_above_the_working_area() {
        let c = WorkingAreaClamp::from_screens([
            Rect::new(0.0, 25.0, 1440.0, 875.0),
            Rect::new(1440.0, 0.0, 1920.0, 1080.0),
        ]);
        assert_eq!(c.working_area_top, 25.0);
        assert_eq!(c.render_offset(Vec2::new(10.0, 5.0)), Vec2::new(0.0, -20.0));
        assert_eq!(c.render_offset(Vec2::new(10.0, 25.0)), Vec2::ZERO);
        assert_eq!(c.render_offset(Vec2::new(10.0, 300.0)), Vec2::ZERO);
        assert_eq!(NoCorrection.render_offset(Vec2::new(0.0, -50.0)), Vec2::ZERO);
    }
}
