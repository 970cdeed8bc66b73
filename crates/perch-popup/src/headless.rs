//! In-memory implementations of every collaborator seam.
//!
//! Used by the tests and the demo; also a reference for what a platform
//! backend has to provide. Nothing here touches a real window.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use perch_core::{CornerRadius, ImageHandle, Rect, Signal, Size, ThemeVariant, TokenResolver, Vec2};

use crate::arrow::ArrowPosition;
use crate::placement::{ConstraintAdjustment, ResolvedPlacement};
use crate::surface::{ArrowDecorated, OverlaySurface, PopupHost, PopupPresenter, PrimarySurface};

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    MoveAndResize { position: Vec2, size: Size },
    Show,
    Hide,
    Release,
}

/// Overlay surface that records what it was asked to do.
pub struct HeadlessSurface {
    calls: RefCell<Vec<SurfaceCall>>,
    scaling: Cell<f32>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            scaling: Cell::new(1.0),
        }
    }

    pub fn with_scaling(scaling: f32) -> Self {
        let s = Self::new();
        s.scaling.set(scaling);
        s
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Last position and size the surface was moved to.
    pub fn bounds(&self) -> Option<(Vec2, Size)> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            SurfaceCall::MoveAndResize { position, size } => Some((*position, *size)),
            _ => None,
        })
    }

    pub fn move_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::MoveAndResize { .. }))
            .count()
    }

    pub fn is_visible(&self) -> bool {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find_map(|c| match c {
                SurfaceCall::Show => Some(true),
                SurfaceCall::Hide | SurfaceCall::Release => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn is_released(&self) -> bool {
        self.calls.borrow().contains(&SurfaceCall::Release)
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl OverlaySurface for HeadlessSurface {
    fn move_and_resize(&self, position: Vec2, size: Size) {
        self.record(SurfaceCall::MoveAndResize { position, size });
    }
    fn show(&self) {
        self.record(SurfaceCall::Show);
    }
    fn hide(&self) {
        self.record(SurfaceCall::Hide);
    }
    fn release(&self) {
        self.record(SurfaceCall::Release);
    }
    fn scaling(&self) -> f32 {
        self.scaling.get()
    }
}

/// Arrow-drawing content.
pub struct HeadlessArrow {
    pub show: Cell<bool>,
    pub position: Cell<ArrowPosition>,
    /// Indicator size, oriented for its side.
    pub bounds: Cell<Rect>,
    pub layout: Cell<Rect>,
    pub radius: Cell<CornerRadius>,
    pub opacity: Cell<f32>,
}

impl HeadlessArrow {
    pub fn new(position: ArrowPosition, size: Size, layout_origin: Vec2) -> Self {
        let bounds = Rect::from_origin_size(Vec2::ZERO, size);
        Self {
            show: Cell::new(true),
            position: Cell::new(position),
            bounds: Cell::new(bounds),
            layout: Cell::new(Rect::from_origin_size(layout_origin, size)),
            radius: Cell::new(CornerRadius::default()),
            opacity: Cell::new(1.0),
        }
    }

    /// Arrow sized from the theme's `ArrowSize` token.
    pub fn from_tokens(
        position: ArrowPosition,
        tokens: &dyn TokenResolver,
        variant: ThemeVariant,
        layout_origin: Vec2,
    ) -> Self {
        let size = position.indicator_size(tokens.arrow_size(variant));
        Self::new(position, size, layout_origin)
    }
}

impl ArrowDecorated for HeadlessArrow {
    fn is_show_arrow(&self) -> bool {
        self.show.get()
    }
    fn arrow_position(&self) -> ArrowPosition {
        self.position.get()
    }
    fn arrow_indicator_bounds(&self) -> Rect {
        self.bounds.get()
    }
    fn arrow_indicator_layout_bounds(&self) -> Rect {
        self.layout.get()
    }
    fn corner_radius(&self) -> CornerRadius {
        self.radius.get()
    }
    fn set_arrow_opacity(&self, opacity: f32) {
        self.opacity.set(opacity);
    }
}

pub struct HeadlessPresenter {
    pub desired_size: Cell<Size>,
    pub opacity: Cell<f32>,
    pub radius: Cell<CornerRadius>,
    pub arrow: Option<Rc<HeadlessArrow>>,
    captures: Cell<u64>,
}

impl HeadlessPresenter {
    pub fn new(desired_size: Size) -> Self {
        Self {
            desired_size: Cell::new(desired_size),
            opacity: Cell::new(1.0),
            radius: Cell::new(CornerRadius::default()),
            arrow: None,
            captures: Cell::new(0),
        }
    }

    pub fn with_arrow(mut self, arrow: Rc<HeadlessArrow>) -> Self {
        self.arrow = Some(arrow);
        self
    }

    pub fn capture_count(&self) -> u64 {
        self.captures.get()
    }
}

impl PopupPresenter for HeadlessPresenter {
    fn capture_current_bitmap(&self) -> Option<ImageHandle> {
        let n = self.captures.get() + 1;
        self.captures.set(n);
        Some(ImageHandle(n))
    }
    fn desired_size(&self) -> Size {
        self.desired_size.get()
    }
    fn opacity(&self) -> f32 {
        self.opacity.get()
    }
    fn set_opacity(&self, opacity: f32) {
        self.opacity.set(opacity);
    }
    fn corner_radius(&self) -> CornerRadius {
        self.radius.get()
    }
    fn arrow_decorated(&self) -> Option<Rc<dyn ArrowDecorated>> {
        self.arrow.clone().map(|a| a as Rc<dyn ArrowDecorated>)
    }
}

/// Popup host window. It has no position until first moved.
pub struct HeadlessHost {
    position: Signal<Vec2>,
    size: Signal<Size>,
    realized: Cell<bool>,
    flipped: Cell<bool>,
    presenter: Rc<HeadlessPresenter>,
}

impl HeadlessHost {
    pub fn new(presenter: Rc<HeadlessPresenter>) -> Self {
        Self {
            position: Signal::new(Vec2::ZERO),
            size: Signal::new(presenter.desired_size()),
            realized: Cell::new(false),
            flipped: Cell::new(false),
            presenter,
        }
    }

    pub fn headless_presenter(&self) -> &Rc<HeadlessPresenter> {
        &self.presenter
    }

    pub fn set_position(&self, p: Vec2) {
        self.realized.set(true);
        self.position.set(p);
    }

    pub fn set_size(&self, s: Size) {
        self.size.set(s);
    }

    pub fn set_flipped(&self, flipped: bool) {
        self.flipped.set(flipped);
    }

    /// Positions the host the way a platform positioner would: flips
    /// vertically when the body would leave `screen` and flipping is
    /// allowed, then slides horizontally back inside.
    pub fn place(&self, resolved: &ResolvedPlacement, screen: Rect) -> Rect {
        let size = self.size.get();
        let mut rect = resolved.popup_rect(size);
        let mut flipped = false;

        let overflows_y = |r: &Rect| r.y < screen.y || r.bottom() > screen.bottom();
        if overflows_y(&rect)
            && resolved.constraint_adjustment.contains(ConstraintAdjustment::FLIP_Y)
        {
            let alt = ResolvedPlacement {
                anchor: resolved.anchor.flip_y(),
                gravity: resolved.gravity.flip_y(),
                offset: Vec2::new(resolved.offset.x, -resolved.offset.y),
                ..*resolved
            };
            let alt_rect = alt.popup_rect(size);
            if !overflows_y(&alt_rect) {
                rect = alt_rect;
                flipped = true;
            }
        }

        if resolved.constraint_adjustment.contains(ConstraintAdjustment::SLIDE_X) {
            if rect.right() > screen.right() {
                rect.x = screen.right() - rect.w;
            }
            if rect.x < screen.x {
                rect.x = screen.x;
            }
        }

        log::trace!("headless positioner placed popup at {rect:?} (flipped: {flipped})");
        self.flipped.set(flipped);
        self.set_position(rect.origin());
        rect
    }
}

impl PopupHost for HeadlessHost {
    fn position(&self) -> Option<Vec2> {
        self.realized.get().then(|| self.position.get())
    }
    fn client_size(&self) -> Size {
        self.size.get()
    }
    fn is_flipped(&self) -> bool {
        self.flipped.get()
    }
    fn size_changed(&self) -> &Signal<Size> {
        &self.size
    }
    fn position_changed(&self) -> &Signal<Vec2> {
        &self.position
    }
    fn presenter(&self) -> Option<Rc<dyn PopupPresenter>> {
        Some(self.presenter.clone() as Rc<dyn PopupPresenter>)
    }
}

pub struct HeadlessPrimary {
    host: Signal<Option<Rc<dyn PopupHost>>>,
}

impl Default for HeadlessPrimary {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPrimary {
    pub fn new() -> Self {
        Self {
            host: Signal::new(None),
        }
    }

    pub fn assign(&self, host: Rc<HeadlessHost>) {
        self.host.set(Some(host as Rc<dyn PopupHost>));
    }

    pub fn unassign(&self) {
        self.host.set(None);
    }
}

impl PrimarySurface for HeadlessPrimary {
    fn host_assigned(&self) -> &Signal<Option<Rc<dyn PopupHost>>> {
        &self.host
    }
}
