//! # Companion layer
//!
//! A popup's own platform surface cannot host its drop shadow or arrow
//! without clipping them, so a second always-on-top surface (the companion
//! layer) sits behind it and draws both. The companion has to track the
//! popup exactly:
//!
//! - Its bounds are the popup host's bounds grown by the shadow padding.
//!   Every size or position change of the host is reflected before the
//!   signal that carried it returns.
//! - When the popup content draws an arrow, the companion draws it instead
//!   and the content's own arrow is kept at opacity 0.
//! - Open and close motions run on the companion; a captured still of the
//!   popup content (the ghost) stands in for the live content while the
//!   layer scales and fades.
//!
//! ```rust
//! use std::rc::Rc;
//! use perch_core::*;
//! use perch_popup::*;
//!
//! let surface = Rc::new(HeadlessSurface::new());
//! let layer = CompanionLayer::new(
//!     surface.clone(),
//!     Rc::new(DesignTokens::default()),
//!     Dispatcher::system(),
//! );
//!
//! let primary = Rc::new(HeadlessPrimary::new());
//! layer.attach(primary.clone());
//!
//! let host = Rc::new(HeadlessHost::new(Rc::new(HeadlessPresenter::new(Size::new(200.0, 100.0)))));
//! primary.assign(host.clone());
//! host.set_position(Vec2::new(300.0, 200.0));
//!
//! let (pos, size) = surface.bounds().unwrap();
//! let pad = layer.state().unwrap().shadow_padding;
//! assert_eq!(pos, Vec2::new(300.0 - pad.left, 200.0 - pad.top));
//! assert_eq!(size, Size::new(200.0, 100.0).inflate(pad));
//!
//! layer.detach();
//! assert!(surface.is_released());
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use perch_core::{
    AnimatedValue, AnimationSpec, BoxShadows, Color, CornerRadius, Dispatcher, Dispose,
    ImageHandle, Rect, Scene, SceneNode, Scope, Size, ThemeVariant, Thickness, TokenResolver,
    Transform, Vec2, effect, theme_variant,
};
use web_time::Duration;

use crate::arrow::ArrowPosition;
use crate::motion::{
    Motion, MotionActor, MotionDriver, MotionFrame, MotionPhase, MotionSequencer, MotionTarget,
};
use crate::placement::Direction;
use crate::shadow::{ShadowLayers, ShadowRenderMode, build_shadow_layers, shadow_padding};
use crate::surface::{
    ArrowDecorated, NoCorrection, OverlaySurface, PopupHost, PopupPresenter, PrimarySurface,
    VerticalCorrection,
};

/// Gap kept between the arrow indicator and the shadow edge.
const ARROW_GAP: f32 = 0.5;

/// Geometry of the companion surface after the last sync.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompanionLayerState {
    /// Physical screen position of the layer's top-left corner.
    pub position: Vec2,
    pub size: Size,
    pub shadow_padding: Thickness,
    /// Shadow padding plus the room the arrow takes on its side. The
    /// popup body is the layer deflated by this.
    pub content_padding: Thickness,
    pub corner_radius: CornerRadius,
    /// In layer coordinates.
    pub arrow_bounds: Option<Rect>,
    pub arrow_direction: Option<Direction>,
    pub is_flipped: bool,
    /// Render-time shift from the platform's vertical correction.
    pub render_offset: Vec2,
}

impl CompanionLayerState {
    pub fn bounds(&self) -> (Vec2, Size) {
        (self.position, self.size)
    }

    /// Popup body in layer coordinates.
    pub fn body(&self) -> Rect {
        Rect::from_origin_size(Vec2::ZERO, self.size).deflate(self.content_padding)
    }
}

/// Everything a sync reads. Equal inputs mean nothing to do.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SyncInputs {
    position: Vec2,
    size: Size,
    shadow: Thickness,
    corner_radius: CornerRadius,
    arrow: Option<(ArrowPosition, Rect, Rect)>,
    flipped: bool,
    scaling: f32,
}

fn layout_state(i: &SyncInputs, correction: &dyn VerticalCorrection) -> CompanionLayerState {
    let shadow = i.shadow;
    let position = Vec2::new(
        i.position.x - shadow.left * i.scaling,
        i.position.y - shadow.top * i.scaling,
    );
    let size = i.size.inflate(shadow);

    let mut content_padding = shadow;
    let mut arrow_bounds = None;
    let mut arrow_direction = None;
    if let Some((arrow, bounds, layout)) = i.arrow {
        let arrow = if i.flipped { arrow.flipped() } else { arrow };
        let dir = arrow.direction();
        match dir {
            Direction::Top => content_padding.top += bounds.h + ARROW_GAP,
            Direction::Bottom => content_padding.bottom += bounds.h + ARROW_GAP,
            Direction::Left => content_padding.left += bounds.w + ARROW_GAP,
            Direction::Right => content_padding.right += bounds.w + ARROW_GAP,
        }
        let body = Rect::from_origin_size(Vec2::ZERO, size).deflate(content_padding);
        let origin = match dir {
            Direction::Top => Vec2::new(shadow.left + layout.x, body.y - bounds.h),
            Direction::Bottom => Vec2::new(shadow.left + layout.x, body.bottom()),
            Direction::Left => Vec2::new(body.x - bounds.w, shadow.top + layout.y),
            Direction::Right => Vec2::new(body.right(), shadow.top + layout.y),
        };
        arrow_bounds = Some(Rect::new(origin.x, origin.y, bounds.w, bounds.h));
        arrow_direction = Some(dir);
    }

    CompanionLayerState {
        position,
        size,
        shadow_padding: shadow,
        content_padding,
        corner_radius: i.corner_radius,
        arrow_bounds,
        arrow_direction,
        is_flipped: i.flipped,
        render_offset: correction.render_offset(position),
    }
}

/// Token-derived styling, re-read on attach and on token change.
#[derive(Clone, Debug, Default)]
struct Styling {
    shadows: BoxShadows,
    token_radius: CornerRadius,
    corner_radius: CornerRadius,
    layers: ShadowLayers,
    padding: Thickness,
    motion_duration: Duration,
    arrow_fill: Color,
}

struct Ghost {
    image: ImageHandle,
    size: Size,
}

struct CompanionInner {
    surface: Rc<dyn OverlaySurface>,
    tokens: Rc<dyn TokenResolver>,
    dispatcher: Dispatcher,
    correction: RefCell<Box<dyn VerticalCorrection>>,
    sequencer: RefCell<MotionSequencer>,
    shadow_mode: Cell<ShadowRenderMode>,
    open_motion: RefCell<Option<Motion>>,
    close_motion: RefCell<Option<Motion>>,
    theme: Cell<Option<ThemeVariant>>,

    attached: Cell<bool>,
    released: Cell<bool>,
    binding: RefCell<Option<Scope>>,
    host_binding: RefCell<Option<Scope>>,
    host: RefCell<Option<Rc<dyn PopupHost>>>,
    presenter: RefCell<Option<Rc<dyn PopupPresenter>>>,
    arrow: RefCell<Option<Rc<dyn ArrowDecorated>>>,
    content_radius: Cell<Option<CornerRadius>>,
    styling: RefCell<Styling>,
    last: RefCell<Option<SyncInputs>>,
    state: RefCell<Option<CompanionLayerState>>,

    actor: MotionActor,
    ghost: RefCell<Option<Ghost>>,
    ghost_opacity: Cell<f32>,
    arrow_visible: Cell<bool>,
    arrow_opacity: Cell<f32>,
    arrow_fade: RefCell<Option<Dispose>>,
}

/// Shadow and arrow overlay for one popup. Dropping it detaches.
pub struct CompanionLayer {
    inner: Rc<CompanionInner>,
}

impl CompanionLayer {
    pub fn new(
        surface: Rc<dyn OverlaySurface>,
        tokens: Rc<dyn TokenResolver>,
        dispatcher: Dispatcher,
    ) -> Self {
        let sequencer = MotionSequencer::on_frames(dispatcher.clone());
        Self {
            inner: Rc::new(CompanionInner {
                surface,
                tokens,
                dispatcher,
                correction: RefCell::new(Box::new(NoCorrection)),
                sequencer: RefCell::new(sequencer),
                shadow_mode: Cell::new(ShadowRenderMode::default()),
                open_motion: RefCell::new(None),
                close_motion: RefCell::new(None),
                theme: Cell::new(None),
                attached: Cell::new(false),
                released: Cell::new(false),
                binding: RefCell::new(None),
                host_binding: RefCell::new(None),
                host: RefCell::new(None),
                presenter: RefCell::new(None),
                arrow: RefCell::new(None),
                content_radius: Cell::new(None),
                styling: RefCell::new(Styling::default()),
                last: RefCell::new(None),
                state: RefCell::new(None),
                actor: MotionActor::new(),
                ghost: RefCell::new(None),
                ghost_opacity: Cell::new(0.0),
                arrow_visible: Cell::new(false),
                arrow_opacity: Cell::new(1.0),
                arrow_fade: RefCell::new(None),
            }),
        }
    }

    /// Replaces the motion driver. Any motion in flight is settled first.
    pub fn set_motion_driver(&self, driver: Rc<dyn MotionDriver>) {
        let old = self.inner.sequencer.replace(MotionSequencer::new(
            self.inner.dispatcher.clone(),
            driver,
        ));
        old.cancel();
    }

    pub fn set_vertical_correction(&self, correction: Box<dyn VerticalCorrection>) {
        *self.inner.correction.borrow_mut() = correction;
        self.inner.resync();
    }

    pub fn set_shadow_render_mode(&self, mode: ShadowRenderMode) {
        self.inner.shadow_mode.set(mode);
        self.inner.rebuild_layers();
        self.inner.resync();
    }

    /// `None` restores the zoom-big-in preset.
    pub fn set_open_motion(&self, motion: Option<Motion>) {
        *self.inner.open_motion.borrow_mut() = motion;
    }

    /// `None` restores the zoom-big-out preset.
    pub fn set_close_motion(&self, motion: Option<Motion>) {
        *self.inner.close_motion.borrow_mut() = motion;
    }

    /// Pins the theme variant tokens are read for. `None` follows the
    /// `theme_variant()` local at attach time.
    pub fn set_theme(&self, theme: Option<ThemeVariant>) {
        self.inner.theme.set(theme);
        if self.inner.attached.get() {
            self.notify_tokens_changed();
        }
    }

    /// Binds to `primary`. Attaching again first unbinds from the previous
    /// primary and settles any motion in flight.
    pub fn attach(&self, primary: Rc<dyn PrimarySurface>) {
        let inner = &self.inner;
        if inner.released.get() {
            log::warn!("attach on a released companion layer ignored");
            return;
        }
        if inner.attached.get() {
            inner.unbind();
        }
        log::debug!("companion layer attached");
        inner.attached.set(true);
        inner.reload_styling();

        let binding = Scope::new();
        let assigned = primary.host_assigned().clone();
        let weak = Rc::downgrade(inner);
        binding.run(|| {
            effect(move || {
                assigned.watch(move |host| {
                    if let Some(inner) = weak.upgrade() {
                        inner.setup_host(host.clone());
                    }
                })
            });
        });
        *inner.binding.borrow_mut() = Some(binding);

        if let Some(host) = primary.host() {
            inner.setup_host(Some(host));
        }
    }

    /// Unbinds, hides and releases the surface. Safe to call repeatedly.
    pub fn detach(&self) {
        let inner = &self.inner;
        if inner.released.replace(true) {
            return;
        }
        inner.unbind();
        inner.surface.hide();
        inner.surface.release();
        log::debug!("companion layer detached and released");
    }

    /// Re-reads shadows, radius, motion duration and arrow fill, then
    /// re-syncs geometry.
    pub fn notify_tokens_changed(&self) {
        self.inner.reload_styling();
        self.inner.resync();
    }

    pub fn show(&self) {
        self.inner.surface.show();
    }

    pub fn hide(&self) {
        self.inner.surface.hide();
    }

    pub fn run_open_motion(
        &self,
        about_to_start: Option<Box<dyn FnOnce()>>,
        completed: Option<Box<dyn FnOnce()>>,
    ) {
        let motion = self.inner.open_motion();
        let sequencer = self.inner.sequencer.borrow().clone();
        sequencer.run_open(self.motion_target(), motion, about_to_start, completed);
    }

    pub fn run_close_motion(
        &self,
        about_to_start: Option<Box<dyn FnOnce()>>,
        completed: Option<Box<dyn FnOnce()>>,
    ) {
        let motion = self.inner.close_motion();
        let sequencer = self.inner.sequencer.borrow().clone();
        sequencer.run_close(self.motion_target(), motion, about_to_start, completed);
    }

    pub fn motion_phase(&self) -> MotionPhase {
        self.inner.sequencer.borrow().phase()
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached.get()
    }

    /// `None` until the host has a position.
    pub fn state(&self) -> Option<CompanionLayerState> {
        *self.inner.state.borrow()
    }

    pub fn motion_frame(&self) -> MotionFrame {
        self.inner.actor.get()
    }

    pub fn has_ghost(&self) -> bool {
        self.inner.ghost.borrow().is_some()
    }

    /// Opacity the companion's arrow is drawn at; 0 while hidden.
    pub fn arrow_opacity(&self) -> f32 {
        if self.inner.arrow_visible.get() {
            self.inner.arrow_opacity.get()
        } else {
            0.0
        }
    }

    /// Draw list for the layer in its own coordinates.
    pub fn render(&self) -> Scene {
        let inner = &self.inner;
        let mut scene = Scene::new();
        let Some(state) = *inner.state.borrow() else {
            return scene;
        };
        let styling = inner.styling.borrow();
        let frame = inner.actor.get();
        let body = state.body();
        let arrow_opacity = self.arrow_opacity();
        let ghost = inner.ghost.borrow();
        let ghost_opacity = inner.ghost_opacity.get();
        let offset = state.render_offset;

        scene.with_transform(Transform::translate(offset.x, offset.y), |s| {
            s.with_opacity(frame.opacity, |s| {
                s.with_transform(Transform::scale_about(frame.scale, body.center()), |s| {
                    for layer in styling.layers.iter() {
                        layer.paint(s, body);
                    }
                    if let (Some(rect), Some(dir)) = (state.arrow_bounds, state.arrow_direction)
                        && arrow_opacity > 0.0
                    {
                        s.with_opacity(arrow_opacity, |s| {
                            s.push(SceneNode::Arrow {
                                rect,
                                pointing: dir.side(),
                                color: styling.arrow_fill,
                            })
                        });
                    }
                    if let Some(ghost) = ghost.as_ref()
                        && ghost_opacity > 0.0
                    {
                        let pad = state.shadow_padding;
                        s.with_opacity(ghost_opacity, |s| {
                            s.push(SceneNode::Image {
                                rect: Rect::from_origin_size(Vec2::new(pad.left, pad.top), ghost.size),
                                image: ghost.image,
                            })
                        });
                    }
                });
            });
        });
        scene
    }

    fn motion_target(&self) -> Rc<dyn MotionTarget> {
        Rc::new(LayerMotionTarget(Rc::downgrade(&self.inner)))
    }
}

impl Drop for CompanionLayer {
    fn drop(&mut self) {
        self.detach();
    }
}

impl CompanionInner {
    fn unbind(&self) {
        // Completion hooks run against the current host, so settle first.
        let sequencer = self.sequencer.borrow().clone();
        sequencer.cancel();
        self.stop_arrow_fade();

        if let Some(b) = self.binding.borrow_mut().take() {
            b.dispose();
        }
        if let Some(b) = self.host_binding.borrow_mut().take() {
            b.dispose();
        }
        if let Some(arrow) = self.arrow.borrow_mut().take() {
            arrow.set_arrow_opacity(1.0);
        }
        self.host.borrow_mut().take();
        self.presenter.borrow_mut().take();
        self.content_radius.set(None);
        self.last.borrow_mut().take();
        self.state.borrow_mut().take();
        self.ghost.borrow_mut().take();
        self.ghost_opacity.set(0.0);
        self.arrow_visible.set(false);
        self.attached.set(false);
    }

    fn setup_host(self: &Rc<Self>, host: Option<Rc<dyn PopupHost>>) {
        if let Some(b) = self.host_binding.borrow_mut().take() {
            b.dispose();
        }
        self.last.borrow_mut().take();
        if let Some(arrow) = self.arrow.borrow_mut().take() {
            arrow.set_arrow_opacity(1.0);
        }

        let Some(host) = host else {
            log::debug!("popup host went away");
            self.host.borrow_mut().take();
            self.presenter.borrow_mut().take();
            self.state.borrow_mut().take();
            self.arrow_visible.set(false);
            self.surface.hide();
            return;
        };
        log::debug!("popup host assigned");

        let binding = Scope::new();
        binding.run(|| {
            let size = host.size_changed().clone();
            let weak = Rc::downgrade(self);
            effect(move || {
                size.watch(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.sync_geometry();
                    }
                })
            });
            let position = host.position_changed().clone();
            let weak = Rc::downgrade(self);
            effect(move || {
                position.watch(move |_| {
                    if let Some(inner) = weak.upgrade() {
                        inner.sync_geometry();
                    }
                })
            });
        });
        *self.host_binding.borrow_mut() = Some(binding);

        let presenter = host.presenter();
        let arrow = presenter
            .as_ref()
            .and_then(|p| p.arrow_decorated())
            .filter(|a| a.is_show_arrow());
        let content_radius = match (&arrow, &presenter) {
            (Some(a), _) => Some(a.corner_radius()),
            (None, Some(p)) => Some(p.corner_radius()),
            (None, None) => None,
        };
        if let Some(a) = &arrow {
            a.set_arrow_opacity(0.0);
        }
        self.arrow_visible.set(arrow.is_some());
        self.arrow_opacity.set(1.0);

        *self.host.borrow_mut() = Some(host);
        *self.presenter.borrow_mut() = presenter;
        *self.arrow.borrow_mut() = arrow;
        self.content_radius.set(content_radius);
        self.rebuild_layers();
        self.sync_geometry();
    }

    fn reload_styling(&self) {
        let theme = self.theme.get().unwrap_or_else(theme_variant);
        let tokens = &self.tokens;
        {
            let mut s = self.styling.borrow_mut();
            s.shadows = tokens.box_shadows(theme);
            s.token_radius = tokens.corner_radius(theme);
            s.motion_duration = tokens.motion_duration(theme);
            s.arrow_fill = tokens.arrow_fill(theme);
        }
        log::trace!("companion styling loaded for {theme:?}");
        self.rebuild_layers();
    }

    /// Content radius wins over the token radius unless it is zero.
    fn rebuild_layers(&self) {
        let mode = self.shadow_mode.get();
        let content = self
            .content_radius
            .get()
            .filter(|r| *r != CornerRadius::default());
        let mut s = self.styling.borrow_mut();
        let radius = content.unwrap_or(s.token_radius);
        s.corner_radius = radius;
        s.layers = build_shadow_layers(&s.shadows, radius, mode);
        s.padding = shadow_padding(&s.layers);
    }

    fn resync(&self) {
        self.last.borrow_mut().take();
        self.sync_geometry();
    }

    fn sync_geometry(&self) {
        let Some(host) = self.host.borrow().clone() else {
            return;
        };
        let Some(position) = host.position() else {
            log::trace!("popup host has no position yet; companion sync deferred");
            return;
        };
        let arrow = self.arrow.borrow().clone();
        let (shadow, corner_radius) = {
            let s = self.styling.borrow();
            (s.padding, s.corner_radius)
        };
        let inputs = SyncInputs {
            position,
            size: host.client_size(),
            shadow,
            corner_radius,
            arrow: arrow.map(|a| {
                (
                    a.arrow_position(),
                    a.arrow_indicator_bounds(),
                    a.arrow_indicator_layout_bounds(),
                )
            }),
            flipped: host.is_flipped(),
            scaling: self.surface.scaling(),
        };
        if self.last.borrow().as_ref() == Some(&inputs) {
            log::trace!("companion geometry unchanged; skipping resize");
            return;
        }

        let state = layout_state(&inputs, &**self.correction.borrow());
        *self.last.borrow_mut() = Some(inputs);
        *self.state.borrow_mut() = Some(state);
        self.surface.move_and_resize(state.position, state.size);
    }

    fn open_motion(&self) -> Motion {
        let motion = self
            .open_motion
            .borrow()
            .clone()
            .unwrap_or_else(Motion::zoom_big_in);
        self.with_token_duration(motion)
    }

    fn close_motion(&self) -> Motion {
        let motion = self
            .close_motion
            .borrow()
            .clone()
            .unwrap_or_else(Motion::zoom_big_out);
        self.with_token_duration(motion)
    }

    fn with_token_duration(&self, motion: Motion) -> Motion {
        let d = self.styling.borrow().motion_duration;
        if d.is_zero() { motion } else { motion.with_duration(d) }
    }

    fn start_arrow_fade(self: &Rc<Self>) {
        self.stop_arrow_fade();
        self.arrow_opacity.set(0.0);
        let mut value = AnimatedValue::new(0.0f32, AnimationSpec::fast());
        value.set_target(1.0, self.dispatcher.now());
        let weak: Weak<CompanionInner> = Rc::downgrade(self);
        let fade = self.dispatcher.on_frame(move |now| {
            let Some(inner) = weak.upgrade() else {
                return false;
            };
            let running = value.update(now);
            inner.arrow_opacity.set(*value.get());
            running
        });
        *self.arrow_fade.borrow_mut() = Some(fade);
    }

    fn stop_arrow_fade(&self) {
        if let Some(fade) = self.arrow_fade.borrow_mut().take() {
            fade.run();
        }
    }
}

/// Motion hooks for one companion layer. Holds the layer weakly so a motion
/// outliving it completes without touching anything.
struct LayerMotionTarget(Weak<CompanionInner>);

impl MotionTarget for LayerMotionTarget {
    fn motion_actor(&self) -> Option<MotionActor> {
        let inner = self.0.upgrade()?;
        if inner.host.borrow().is_none() {
            return None;
        }
        Some(inner.actor.clone())
    }

    fn open_about_to_start(&self) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        inner.stop_arrow_fade();
        inner.arrow_visible.set(false);
        if let Some(arrow) = inner.arrow.borrow().clone() {
            arrow.set_arrow_opacity(1.0);
        }
        let presenter = inner.presenter.borrow().clone();
        if let Some(p) = presenter {
            p.set_opacity(1.0);
            let size = inner
                .host
                .borrow()
                .as_ref()
                .map_or_else(|| p.desired_size(), |h| h.client_size());
            *inner.ghost.borrow_mut() = p
                .capture_current_bitmap()
                .map(|image| Ghost { image, size });
            inner.ghost_opacity.set(1.0);
            p.set_opacity(0.0);
        }
        inner.surface.show();
    }

    fn open_completed(&self) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        if let Some(p) = inner.presenter.borrow().clone() {
            p.set_opacity(1.0);
        }
        if let Some(arrow) = inner.arrow.borrow().clone() {
            arrow.set_arrow_opacity(0.0);
            inner.arrow_visible.set(true);
            inner.start_arrow_fade();
        }
        inner.ghost.borrow_mut().take();
        inner.ghost_opacity.set(0.0);
    }

    fn close_about_to_start(&self) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        inner.stop_arrow_fade();
        if inner.arrow_visible.get() {
            inner.arrow_opacity.set(1.0);
        }
    }

    fn close_completed(&self) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        inner.ghost.borrow_mut().take();
        inner.ghost_opacity.set(0.0);
        inner.surface.hide();
    }
}
