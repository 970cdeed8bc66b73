use std::cell::{Cell, RefCell};
use std::rc::Rc;

use perch_core::*;
use perch_popup::*;
use web_time::Duration;

/// Driver that never reports back on its own; tests finish runs by hand.
#[derive(Default)]
struct HeldDriver {
    pending: RefCell<Vec<Box<dyn FnOnce()>>>,
    started: Cell<usize>,
}

impl HeldDriver {
    fn finish(&self, index: usize) {
        let f = {
            let mut pending = self.pending.borrow_mut();
            std::mem::replace(&mut pending[index], Box::new(|| {}) as Box<dyn FnOnce()>)
        };
        f();
    }
}

impl MotionDriver for HeldDriver {
    fn run(&self, motion: &Motion, actor: &MotionActor, finished: Box<dyn FnOnce()>) -> Dispose {
        actor.set(motion.from);
        self.started.set(self.started.get() + 1);
        self.pending.borrow_mut().push(finished);
        Dispose::noop()
    }
}

struct Rig {
    clock: Rc<ManualClock>,
    dispatcher: Dispatcher,
    surface: Rc<HeadlessSurface>,
    primary: Rc<HeadlessPrimary>,
    host: Rc<HeadlessHost>,
    arrow: Rc<HeadlessArrow>,
    layer: Rc<CompanionLayer>,
}

impl Rig {
    fn new() -> Self {
        let clock = Rc::new(ManualClock::new());
        let dispatcher = Dispatcher::new(clock.clone());
        let surface = Rc::new(HeadlessSurface::new());
        let layer = Rc::new(CompanionLayer::new(
            surface.clone(),
            Rc::new(DesignTokens::default()),
            dispatcher.clone(),
        ));
        let arrow = Rc::new(HeadlessArrow::new(
            ArrowPosition::Top,
            Size::new(16.0, 8.0),
            Vec2::new(40.0, 0.0),
        ));
        let presenter = HeadlessPresenter::new(Size::new(200.0, 120.0)).with_arrow(arrow.clone());
        let host = Rc::new(HeadlessHost::new(Rc::new(presenter)));
        let primary = Rc::new(HeadlessPrimary::new());
        layer.attach(primary.clone());
        primary.assign(host.clone());
        host.set_position(Vec2::new(300.0, 200.0));
        Self {
            clock,
            dispatcher,
            surface,
            primary,
            host,
            arrow,
            layer,
        }
    }

    fn advance(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
        self.dispatcher.pump();
    }

    fn presenter_opacity(&self) -> f32 {
        self.host.headless_presenter().opacity()
    }
}

fn counter() -> (Rc<Cell<u32>>, Option<Box<dyn FnOnce()>>) {
    let n = Rc::new(Cell::new(0));
    let c = n.clone();
    let f: Box<dyn FnOnce()> = Box::new(move || c.set(c.get() + 1));
    (n, Some(f))
}

#[test]
fn open_swaps_in_a_ghost_and_restores_live_content_once() {
    let r = Rig::new();
    let (started, about) = counter();
    let (done, completed) = counter();

    r.layer.run_open_motion(about, completed);
    assert_eq!(started.get(), 1);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Opening);
    assert!(r.surface.is_visible());
    assert!(r.layer.has_ghost());
    assert_eq!(r.host.headless_presenter().capture_count(), 1);
    assert_eq!(r.presenter_opacity(), 0.0);
    assert_eq!(r.arrow.opacity.get(), 1.0);
    assert_eq!(r.layer.arrow_opacity(), 0.0);
    assert_eq!(r.layer.render().images().count(), 1);

    r.advance(100);
    let mid = r.layer.motion_frame();
    assert!(mid.scale > 0.35 && mid.scale < 1.0);
    assert_eq!(done.get(), 0);

    // Token motion duration is 200ms.
    r.advance(100);
    assert_eq!(done.get(), 1);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Idle);
    assert_eq!(r.layer.motion_frame(), MotionFrame::IDENTITY);
    assert!(!r.layer.has_ghost());
    assert_eq!(r.presenter_opacity(), 1.0);
    assert_eq!(r.arrow.opacity.get(), 0.0);
    assert_eq!(r.layer.render().images().count(), 0);

    // The companion's arrow settles in after the open.
    assert!(r.layer.arrow_opacity() < 1.0);
    r.advance(150);
    assert_eq!(r.layer.arrow_opacity(), 1.0);

    r.advance(1000);
    assert_eq!(done.get(), 1);
    assert!(r.dispatcher.is_idle());
}

#[test]
fn close_hides_the_layer_and_resets_the_frame() {
    let r = Rig::new();
    r.layer.run_open_motion(None, None);
    r.advance(200);

    let (done, completed) = counter();
    r.layer.run_close_motion(None, completed);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Closing);
    r.advance(100);
    assert!(r.layer.motion_frame().opacity < 1.0);
    r.advance(100);
    assert_eq!(done.get(), 1);
    assert!(!r.surface.is_visible());
    assert_eq!(r.layer.motion_frame(), MotionFrame::IDENTITY);
}

#[test]
fn fallback_timer_completes_a_stalled_motion() {
    let r = Rig::new();
    let driver = Rc::new(HeldDriver::default());
    r.layer.set_motion_driver(driver.clone());

    let (done, completed) = counter();
    r.layer.run_open_motion(None, completed);
    assert_eq!(driver.started.get(), 1);

    r.advance(230);
    assert_eq!(done.get(), 0);
    assert_eq!(r.presenter_opacity(), 0.0);

    // 1.2 × 200ms.
    r.advance(10);
    assert_eq!(done.get(), 1);
    assert_eq!(r.presenter_opacity(), 1.0);
    assert!(!r.layer.has_ghost());

    // A driver that reports late changes nothing.
    driver.finish(0);
    assert_eq!(done.get(), 1);
}

#[test]
fn preempting_motion_settles_the_old_one_exactly_once() {
    let r = Rig::new();
    let driver = Rc::new(HeldDriver::default());
    r.layer.set_motion_driver(driver.clone());

    let (opened, open_done) = counter();
    let (closed, close_done) = counter();

    r.layer.run_open_motion(None, open_done);
    r.advance(50);
    r.layer.run_close_motion(None, close_done);

    assert_eq!(opened.get(), 1);
    assert_eq!(closed.get(), 0);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Closing);
    // Live content came back when the open settled.
    assert_eq!(r.presenter_opacity(), 1.0);

    // The open's own finish and fallback both arrive late and are ignored.
    driver.finish(0);
    r.advance(200);
    assert_eq!(opened.get(), 1);
    assert_eq!(closed.get(), 0);

    driver.finish(1);
    assert_eq!(closed.get(), 1);
    r.advance(1000);
    assert_eq!(opened.get(), 1);
    assert_eq!(closed.get(), 1);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Idle);
    assert!(r.dispatcher.is_idle());
}

#[test]
fn motion_started_by_a_preempted_completion_is_not_lost() {
    let r = Rig::new();
    let driver = Rc::new(HeldDriver::default());
    r.layer.set_motion_driver(driver.clone());

    let reopened = Rc::new(Cell::new(0));
    let reopen: Box<dyn FnOnce()> = {
        let layer = r.layer.clone();
        let reopened = reopened.clone();
        Box::new(move || {
            let reopened = reopened.clone();
            layer.run_open_motion(None, Some(Box::new(move || reopened.set(reopened.get() + 1))));
        })
    };
    r.layer.run_open_motion(None, Some(reopen));
    let (closed, close_done) = counter();
    r.layer.run_close_motion(None, close_done);

    // The reopen was settled in turn, so only the close is in flight.
    assert_eq!(reopened.get(), 1);
    assert_eq!(r.dispatcher.pending_timers(), 1);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Closing);
    assert_eq!(r.presenter_opacity(), 1.0);
    assert!(!r.layer.has_ghost());

    r.advance(1000);
    assert_eq!(reopened.get(), 1);
    assert_eq!(closed.get(), 1);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Idle);
    assert!(!r.surface.is_visible());
    assert_eq!(r.presenter_opacity(), 1.0);
    assert!(r.dispatcher.is_idle());
}

#[test]
fn no_host_means_immediate_completion() {
    let clock = Rc::new(ManualClock::new());
    let dispatcher = Dispatcher::new(clock);
    let layer = CompanionLayer::new(
        Rc::new(HeadlessSurface::new()),
        Rc::new(DesignTokens::default()),
        dispatcher.clone(),
    );
    let (started, about) = counter();
    let (done, completed) = counter();
    layer.run_open_motion(about, completed);
    assert_eq!(done.get(), 1);
    assert_eq!(started.get(), 0);
    assert_eq!(layer.motion_phase(), MotionPhase::Idle);
    assert!(dispatcher.is_idle());
}

#[test]
fn completion_may_start_the_next_motion() {
    let r = Rig::new();
    let closed = Rc::new(Cell::new(0));
    let chained: Box<dyn FnOnce()> = {
        let layer = r.layer.clone();
        let closed = closed.clone();
        Box::new(move || {
            let closed = closed.clone();
            layer.run_close_motion(None, Some(Box::new(move || closed.set(closed.get() + 1))));
        })
    };
    r.layer.run_open_motion(None, Some(chained));
    r.advance(200);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Closing);
    r.advance(200);
    assert_eq!(closed.get(), 1);
    assert_eq!(r.layer.motion_phase(), MotionPhase::Idle);
}

#[test]
fn detach_mid_motion_still_completes_once() {
    let r = Rig::new();
    let (done, completed) = counter();
    r.layer.run_open_motion(None, completed);
    r.advance(50);
    r.layer.detach();
    assert_eq!(done.get(), 1);
    assert_eq!(r.presenter_opacity(), 1.0);
    r.advance(1000);
    assert_eq!(done.get(), 1);
    assert!(r.dispatcher.is_idle());
    assert!(r.surface.is_released());
    assert_eq!(r.primary.host_assigned().subscriber_count(), 0);
}

#[test]
fn custom_motion_without_token_duration_keeps_its_own_length() {
    struct NoDuration(DesignTokens);
    impl TokenResolver for NoDuration {
        fn lookup(&self, key: TokenKey, variant: ThemeVariant) -> Option<TokenValue> {
            match key {
                TokenKey::MotionDurationMid => None,
                _ => self.0.lookup(key, variant),
            }
        }
    }

    let clock = Rc::new(ManualClock::new());
    let dispatcher = Dispatcher::new(clock.clone());
    let layer = CompanionLayer::new(
        Rc::new(HeadlessSurface::new()),
        Rc::new(NoDuration(DesignTokens::default())),
        dispatcher.clone(),
    );
    let primary = Rc::new(HeadlessPrimary::new());
    let host = Rc::new(HeadlessHost::new(Rc::new(HeadlessPresenter::new(Size::new(80.0, 40.0)))));
    layer.attach(primary.clone());
    primary.assign(host.clone());
    host.set_position(Vec2::new(0.0, 0.0));
    layer.set_open_motion(Some(Motion::zoom_big_in().with_duration(Duration::from_millis(500))));

    let (done, completed) = counter();
    layer.run_open_motion(None, completed);
    clock.advance(Duration::from_millis(400));
    dispatcher.pump();
    assert_eq!(done.get(), 0);
    clock.advance(Duration::from_millis(100));
    dispatcher.pump();
    assert_eq!(done.get(), 1);
}
