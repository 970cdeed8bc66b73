//! UI-thread dispatcher: one-shot timers and per-frame callbacks.
//!
//! Nothing here blocks. The platform loop (or a test) calls [`Dispatcher::pump`]
//! once per frame; due timers fire in deadline order, then every live frame
//! callback is stepped with the same timestamp. Callbacks run with no
//! dispatcher borrow held, so they may schedule or cancel freely.

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};
use web_time::{Duration, Instant};

use crate::animation::{Clock, SystemClock};
use crate::Dispose;

new_key_type! {
    pub struct TimerKey;
    pub struct FrameKey;
}

type FrameFn = Rc<RefCell<dyn FnMut(Instant) -> bool>>;

struct Timer {
    /// `None` when the deadline is past what `Instant` can represent.
    deadline: Option<Instant>,
    seq: u64,
    run: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct Queues {
    timers: SlotMap<TimerKey, Timer>,
    frames: SlotMap<FrameKey, FrameFn>,
    next_seq: u64,
}

#[derive(Clone)]
pub struct Dispatcher {
    clock: Rc<dyn Clock>,
    queues: Rc<RefCell<Queues>>,
}

impl Dispatcher {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            queues: Rc::new(RefCell::new(Queues::default())),
        }
    }

    pub fn system() -> Self {
        Self::new(Rc::new(SystemClock))
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Fires `f` once, `delay` from now. Running the returned guard cancels it.
    pub fn run_once(&self, delay: Duration, f: impl FnOnce() + 'static) -> Dispose {
        let deadline = self.now().checked_add(delay);
        let key = {
            let mut q = self.queues.borrow_mut();
            let seq = q.next_seq;
            q.next_seq += 1;
            q.timers.insert(Timer {
                deadline,
                seq,
                run: Box::new(f),
            })
        };
        let queues = Rc::downgrade(&self.queues);
        Dispose::new(move || {
            if let Some(q) = queues.upgrade() {
                q.borrow_mut().timers.remove(key);
            }
        })
    }

    /// Calls `f` on every pump until it returns `false` or the guard runs.
    pub fn on_frame(&self, f: impl FnMut(Instant) -> bool + 'static) -> Dispose {
        let key = self
            .queues
            .borrow_mut()
            .frames
            .insert(Rc::new(RefCell::new(f)));
        let queues = Rc::downgrade(&self.queues);
        Dispose::new(move || {
            if let Some(q) = queues.upgrade() {
                q.borrow_mut().frames.remove(key);
            }
        })
    }

    pub fn pending_timers(&self) -> usize {
        self.queues.borrow().timers.len()
    }

    pub fn active_frames(&self) -> usize {
        self.queues.borrow().frames.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending_timers() == 0 && self.active_frames() == 0
    }

    /// Runs everything due at the clock's current time.
    pub fn pump(&self) {
        let now = self.now();

        while let Some(timer) = self.take_due_timer(now) {
            (timer.run)();
        }

        let frames: Vec<(FrameKey, FrameFn)> = self
            .queues
            .borrow()
            .frames
            .iter()
            .map(|(k, f)| (k, f.clone()))
            .collect();
        for (key, f) in frames {
            // Cancelled by an earlier callback in this pass.
            if !self.queues.borrow().frames.contains_key(key) {
                continue;
            }
            let keep = (f.borrow_mut())(now);
            if !keep {
                self.queues.borrow_mut().frames.remove(key);
            }
        }
    }

    fn take_due_timer(&self, now: Instant) -> Option<Timer> {
        let mut q = self.queues.borrow_mut();
        let key = q
            .timers
            .iter()
            .filter(|(_, t)| t.deadline.is_some_and(|d| d <= now))
            .min_by_key(|(_, t)| (t.deadline, t.seq))
            .map(|(k, _)| k)?;
        q.timers.remove(key)
    }
}
