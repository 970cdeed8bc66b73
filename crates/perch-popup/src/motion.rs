//! # Open/close motions
//!
//! A [`MotionSequencer`] runs one motion at a time for one companion layer
//! and guarantees that the caller's `completed` callback runs exactly once
//! per request. Two things race to complete a motion:
//!
//! - the [`MotionDriver`] reporting that the animation finished;
//! - a fallback timer at 1.2× the motion's length, for drivers that never
//!   report (the target went away mid-flight, the frame loop stalled).
//!
//! Whichever comes first runs the completion; a latch drops the other.
//!
//! Starting a motion while another is in flight settles the old one first:
//! its pending driver and timer are cancelled, its completion runs at once,
//! and the phase passes through `Idle` before the new motion starts.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use perch_core::{
    AnimatedValue, AnimationSpec, Dispatcher, Dispose, Easing, Interpolate, Vec2,
};
use web_time::Duration;

/// The part of a companion layer a motion animates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionFrame {
    pub opacity: f32,
    pub scale: f32,
}

impl MotionFrame {
    pub const IDENTITY: MotionFrame = MotionFrame {
        opacity: 1.0,
        scale: 1.0,
    };

    pub fn new(opacity: f32, scale: f32) -> Self {
        Self { opacity, scale }
    }
}

impl Default for MotionFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Interpolate for MotionFrame {
    fn interpolate(&self, other: &Self, t: f32) -> Self {
        MotionFrame {
            opacity: self.opacity.interpolate(&other.opacity, t),
            scale: self.scale.interpolate(&other.scale, t),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    pub from: MotionFrame,
    pub to: MotionFrame,
    pub spec: AnimationSpec,
    /// Scale origin as a fraction of the layer size.
    pub origin: Vec2,
    /// Frame left on the layer once the motion is over, if not `to`.
    pub settle: Option<MotionFrame>,
}

impl Motion {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);

    /// Fade in while growing from 35% to full size.
    pub fn zoom_big_in() -> Self {
        Self {
            from: MotionFrame::new(0.01, 0.35),
            to: MotionFrame::IDENTITY,
            spec: AnimationSpec::tween(Self::DEFAULT_DURATION, Easing::CircularEaseOut),
            origin: Vec2::new(0.5, 0.5),
            settle: None,
        }
    }

    /// Fade out while shrinking to 85%; the layer is reset afterwards so a
    /// reopen starts clean.
    pub fn zoom_big_out() -> Self {
        Self {
            from: MotionFrame::IDENTITY,
            to: MotionFrame::new(0.01, 0.85),
            spec: AnimationSpec::tween(Self::DEFAULT_DURATION, Easing::CircularEaseOut),
            origin: Vec2::new(0.5, 0.5),
            settle: Some(MotionFrame::IDENTITY),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.spec.duration = duration;
        self
    }

    pub fn final_frame(&self) -> MotionFrame {
        self.settle.unwrap_or(self.to)
    }

    /// How long the driver gets before completion is forced.
    pub fn fallback_delay(&self) -> Duration {
        self.spec
            .total()
            .checked_mul(6)
            .map_or(Duration::MAX, |d| d / 5)
    }
}

/// Shared cell a driver writes frames into and the layer paints from.
#[derive(Clone, Debug, Default)]
pub struct MotionActor(Rc<Cell<MotionFrame>>);

impl MotionActor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> MotionFrame {
        self.0.get()
    }

    pub fn set(&self, frame: MotionFrame) {
        self.0.set(frame)
    }
}

pub trait MotionDriver {
    /// Starts `motion` on `actor` and calls `finished` when it ends.
    ///
    /// Running the returned guard stops the motion; `finished` must not be
    /// called after that.
    fn run(&self, motion: &Motion, actor: &MotionActor, finished: Box<dyn FnOnce()>) -> Dispose;
}

/// Steps motions from the dispatcher's frame callbacks.
pub struct FrameMotionDriver {
    dispatcher: Dispatcher,
}

impl FrameMotionDriver {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

impl MotionDriver for FrameMotionDriver {
    fn run(&self, motion: &Motion, actor: &MotionActor, finished: Box<dyn FnOnce()>) -> Dispose {
        actor.set(motion.from);
        let mut value = AnimatedValue::new(motion.from, motion.spec);
        value.set_target(motion.to, self.dispatcher.now());

        let actor = actor.clone();
        let mut finished = Some(finished);
        self.dispatcher.on_frame(move |now| {
            let running = value.update(now);
            actor.set(*value.get());
            if !running && let Some(f) = finished.take() {
                f();
            }
            running
        })
    }
}

/// Hooks the sequencer calls around each motion.
pub trait MotionTarget {
    /// `None` when there is nothing to animate; the motion then completes
    /// immediately.
    fn motion_actor(&self) -> Option<MotionActor>;
    fn open_about_to_start(&self);
    fn open_completed(&self);
    fn close_about_to_start(&self);
    fn close_completed(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MotionPhase {
    #[default]
    Idle,
    Opening,
    Closing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MotionKind {
    Open,
    Close,
}

/// Run-once completion shared by the driver callback and the fallback timer.
struct Completion {
    id: u64,
    fired: Cell<bool>,
    action: RefCell<Option<Box<dyn FnOnce()>>>,
    cancels: RefCell<Vec<Dispose>>,
}

impl Completion {
    fn new(id: u64, action: Box<dyn FnOnce()>) -> Self {
        Self {
            id,
            fired: Cell::new(false),
            action: RefCell::new(Some(action)),
            cancels: RefCell::new(Vec::new()),
        }
    }

    /// Returns whether this call was the one that completed.
    fn fire(&self) -> bool {
        if self.fired.replace(true) {
            return false;
        }
        let cancels = std::mem::take(&mut *self.cancels.borrow_mut());
        for d in cancels {
            d.run();
        }
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
        true
    }

    /// Keeps `d` to cancel on completion; runs it now if already complete.
    fn guard(&self, d: Dispose) {
        if self.fired.get() {
            d.run();
        } else {
            self.cancels.borrow_mut().push(d);
        }
    }
}

struct SequencerInner {
    dispatcher: Dispatcher,
    driver: Rc<dyn MotionDriver>,
    phase: Cell<MotionPhase>,
    active: RefCell<Option<Rc<Completion>>>,
    next_id: Cell<u64>,
}

#[derive(Clone)]
pub struct MotionSequencer {
    inner: Rc<SequencerInner>,
}

impl MotionSequencer {
    pub fn new(dispatcher: Dispatcher, driver: Rc<dyn MotionDriver>) -> Self {
        Self {
            inner: Rc::new(SequencerInner {
                dispatcher,
                driver,
                phase: Cell::new(MotionPhase::Idle),
                active: RefCell::new(None),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Sequencer stepping motions on `dispatcher` frames.
    pub fn on_frames(dispatcher: Dispatcher) -> Self {
        let driver = Rc::new(FrameMotionDriver::new(dispatcher.clone()));
        Self::new(dispatcher, driver)
    }

    pub fn phase(&self) -> MotionPhase {
        self.inner.phase.get()
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == MotionPhase::Idle
    }

    pub fn run_open(
        &self,
        target: Rc<dyn MotionTarget>,
        motion: Motion,
        about_to_start: Option<Box<dyn FnOnce()>>,
        completed: Option<Box<dyn FnOnce()>>,
    ) {
        self.run(MotionKind::Open, target, motion, about_to_start, completed);
    }

    pub fn run_close(
        &self,
        target: Rc<dyn MotionTarget>,
        motion: Motion,
        about_to_start: Option<Box<dyn FnOnce()>>,
        completed: Option<Box<dyn FnOnce()>>,
    ) {
        self.run(MotionKind::Close, target, motion, about_to_start, completed);
    }

    /// Settles the in-flight motion, if any: its completion runs now. A
    /// completion may start another motion; that one is settled too, until
    /// nothing is left in flight.
    pub fn cancel(&self) -> bool {
        let mut settled = false;
        loop {
            let active = self.inner.active.borrow_mut().take();
            let Some(c) = active else {
                return settled;
            };
            settled |= c.fire();
        }
    }

    fn settle_in_flight(&self, kind: MotionKind) {
        if self.cancel() {
            log::debug!("{kind:?} motion preempted the one in flight");
        }
    }

    fn run(
        &self,
        kind: MotionKind,
        target: Rc<dyn MotionTarget>,
        motion: Motion,
        about_to_start: Option<Box<dyn FnOnce()>>,
        completed: Option<Box<dyn FnOnce()>>,
    ) {
        self.settle_in_flight(kind);

        let Some(actor) = target.motion_actor() else {
            log::trace!("{kind:?} motion has no actor; completing immediately");
            if let Some(completed) = completed {
                completed();
            }
            return;
        };

        match kind {
            MotionKind::Open => target.open_about_to_start(),
            MotionKind::Close => target.close_about_to_start(),
        }
        self.settle_in_flight(kind);

        let inner = &self.inner;
        let id = inner.next_id.get();
        inner.next_id.set(id + 1);
        inner.phase.set(match kind {
            MotionKind::Open => MotionPhase::Opening,
            MotionKind::Close => MotionPhase::Closing,
        });

        let action = {
            let weak: Weak<SequencerInner> = Rc::downgrade(inner);
            let actor = actor.clone();
            let final_frame = motion.final_frame();
            Box::new(move || {
                actor.set(final_frame);
                match kind {
                    MotionKind::Open => target.open_completed(),
                    MotionKind::Close => target.close_completed(),
                }
                if let Some(inner) = weak.upgrade() {
                    let mine = inner.active.borrow().as_ref().is_some_and(|c| c.id == id);
                    if mine {
                        inner.active.borrow_mut().take();
                    }
                    if mine || inner.active.borrow().is_none() {
                        inner.phase.set(MotionPhase::Idle);
                    }
                }
                if let Some(completed) = completed {
                    completed();
                }
            })
        };
        let completion = Rc::new(Completion::new(id, action));
        *inner.active.borrow_mut() = Some(completion.clone());

        // Strong: `active` may already point at another motion when this fires.
        let fallback = {
            let c = completion.clone();
            inner.dispatcher.run_once(motion.fallback_delay(), move || {
                if c.fire() {
                    log::debug!("{kind:?} motion never reported back; fallback timer completed it");
                }
            })
        };
        completion.guard(fallback);

        if let Some(f) = about_to_start {
            f();
        }
        if completion.fired.get() {
            log::trace!("{kind:?} motion was settled from its own about-to-start hook");
            return;
        }

        let finished = {
            let weak = Rc::downgrade(&completion);
            Box::new(move || {
                if let Some(c) = weak.upgrade() {
                    c.fire();
                }
            })
        };
        let running = inner.driver.run(&motion, &actor, finished);
        completion.guard(running);
    }
}
