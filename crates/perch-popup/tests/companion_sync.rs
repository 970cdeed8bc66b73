use std::cell::RefCell;
use std::rc::Rc;

use perch_core::*;
use perch_popup::*;

/// Token table whose shadows can be swapped at runtime.
struct LiveTokens {
    base: DesignTokens,
    shadows: RefCell<Option<BoxShadows>>,
}

impl LiveTokens {
    fn new() -> Self {
        Self {
            base: DesignTokens::default(),
            shadows: RefCell::new(None),
        }
    }
}

impl TokenResolver for LiveTokens {
    fn lookup(&self, key: TokenKey, variant: ThemeVariant) -> Option<TokenValue> {
        if key == TokenKey::BoxShadowsSecondary
            && let Some(s) = self.shadows.borrow().clone()
        {
            return Some(TokenValue::Shadows(s));
        }
        self.base.lookup(key, variant)
    }
}

struct Rig {
    surface: Rc<HeadlessSurface>,
    primary: Rc<HeadlessPrimary>,
    host: Rc<HeadlessHost>,
    tokens: Rc<LiveTokens>,
    layer: CompanionLayer,
}

fn rig_with(surface: HeadlessSurface, presenter: HeadlessPresenter) -> Rig {
    let surface = Rc::new(surface);
    let tokens = Rc::new(LiveTokens::new());
    let layer = CompanionLayer::new(
        surface.clone(),
        tokens.clone(),
        Dispatcher::new(Rc::new(ManualClock::new())),
    );
    let primary = Rc::new(HeadlessPrimary::new());
    let host = Rc::new(HeadlessHost::new(Rc::new(presenter)));
    Rig {
        surface,
        primary,
        host,
        tokens,
        layer,
    }
}

fn rig() -> Rig {
    rig_with(
        HeadlessSurface::new(),
        HeadlessPresenter::new(Size::new(200.0, 120.0)),
    )
}

fn light_padding() -> Thickness {
    DesignTokens::default()
        .box_shadows(ThemeVariant::Light)
        .thickness()
}

fn expected(pos: Vec2, size: Size, pad: Thickness, scale: f32) -> (Vec2, Size) {
    (
        Vec2::new(pos.x - pad.left * scale, pos.y - pad.top * scale),
        size.inflate(pad),
    )
}

#[test]
fn bounds_follow_every_interleaving_of_moves_and_resizes() {
    let r = rig();
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    let pad = light_padding();

    let steps: [(Option<Vec2>, Option<Size>); 6] = [
        (Some(Vec2::new(300.0, 200.0)), None),
        (None, Some(Size::new(240.0, 90.0))),
        (Some(Vec2::new(310.0, 180.0)), Some(Size::new(120.0, 300.0))),
        (None, Some(Size::new(120.0, 310.0))),
        (Some(Vec2::new(0.0, 0.0)), None),
        (Some(Vec2::new(42.0, 7.0)), Some(Size::new(64.0, 32.0))),
    ];
    for (pos, size) in steps {
        if let Some(s) = size {
            r.host.set_size(s);
        }
        if let Some(p) = pos {
            r.host.set_position(p);
        }
        let want = expected(
            r.host.position().unwrap(),
            r.host.client_size(),
            pad,
            1.0,
        );
        assert_eq!(r.surface.bounds(), Some(want));
        assert_eq!(r.layer.state().map(|s| s.bounds()), Some(want));
    }
}

#[test]
fn nothing_moves_until_the_host_has_a_position() {
    let r = rig();
    r.layer.attach(r.primary.clone());
    assert_eq!(r.surface.move_count(), 0);

    r.primary.assign(r.host.clone());
    r.host.set_size(Size::new(220.0, 120.0));
    assert_eq!(r.surface.move_count(), 0);
    assert!(r.layer.state().is_none());

    r.host.set_position(Vec2::new(50.0, 60.0));
    assert_eq!(r.surface.move_count(), 1);
    assert_eq!(
        r.surface.bounds(),
        Some(expected(Vec2::new(50.0, 60.0), Size::new(220.0, 120.0), light_padding(), 1.0))
    );
}

#[test]
fn host_assigned_before_attach_is_picked_up() {
    let r = rig();
    r.host.set_position(Vec2::new(10.0, 20.0));
    r.primary.assign(r.host.clone());
    r.layer.attach(r.primary.clone());
    assert_eq!(r.surface.move_count(), 1);
}

#[test]
fn unchanged_geometry_is_skipped() {
    let r = rig();
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    r.host.set_position(Vec2::new(300.0, 200.0));
    assert_eq!(r.surface.move_count(), 1);

    r.host.set_position(Vec2::new(300.0, 200.0));
    r.host.set_size(Size::new(200.0, 120.0));
    assert_eq!(r.surface.move_count(), 1);

    r.host.set_position(Vec2::new(301.0, 200.0));
    assert_eq!(r.surface.move_count(), 2);
}

#[test]
fn token_change_resizes_with_the_new_padding() {
    let r = rig();
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    r.host.set_position(Vec2::new(300.0, 200.0));

    let shadows = BoxShadows::new([BoxShadow::new(0.0, 2.0, 4.0, 0.0, Color::black_alpha(0.1))]);
    let pad = shadows.thickness();
    *r.tokens.shadows.borrow_mut() = Some(shadows);

    // Not re-read until told.
    r.host.set_size(Size::new(100.0, 50.0));
    assert_eq!(
        r.surface.bounds(),
        Some(expected(Vec2::new(300.0, 200.0), Size::new(100.0, 50.0), light_padding(), 1.0))
    );

    r.layer.notify_tokens_changed();
    assert_eq!(
        r.surface.bounds(),
        Some(expected(Vec2::new(300.0, 200.0), Size::new(100.0, 50.0), pad, 1.0))
    );
    assert_eq!(r.layer.state().unwrap().shadow_padding, pad);
}

#[test]
fn physical_position_accounts_for_scaling() {
    let r = rig_with(
        HeadlessSurface::with_scaling(1.5),
        HeadlessPresenter::new(Size::new(200.0, 120.0)),
    );
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    r.host.set_position(Vec2::new(400.0, 300.0));
    assert_eq!(
        r.surface.bounds(),
        Some(expected(Vec2::new(400.0, 300.0), Size::new(200.0, 120.0), light_padding(), 1.5))
    );
}

#[test]
fn arrow_content_moves_the_body_not_the_layer() {
    let arrow = Rc::new(HeadlessArrow::new(
        ArrowPosition::Top,
        Size::new(16.0, 8.0),
        Vec2::new(92.0, 0.0),
    ));
    let r = rig_with(
        HeadlessSurface::new(),
        HeadlessPresenter::new(Size::new(200.0, 120.0)).with_arrow(arrow.clone()),
    );
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    r.host.set_position(Vec2::new(300.0, 200.0));

    let pad = light_padding();
    let state = r.layer.state().unwrap();
    assert_eq!(
        state.bounds(),
        expected(Vec2::new(300.0, 200.0), Size::new(200.0, 120.0), pad, 1.0)
    );
    assert_eq!(state.arrow_direction, Some(Direction::Top));
    assert_eq!(state.content_padding.top, pad.top + 8.5);
    assert_eq!(state.content_padding.bottom, pad.bottom);
    assert_eq!(state.arrow_bounds.map(|a| a.x), Some(pad.left + 92.0));
    // The companion draws the arrow; the content's own one is hidden.
    assert_eq!(arrow.opacity.get(), 0.0);
    assert_eq!(r.layer.arrow_opacity(), 1.0);

    let scene = r.layer.render();
    let arrows: Vec<_> = scene.arrows().collect();
    assert_eq!(arrows.len(), 1);
    assert_eq!(arrows[0].1, Side::Top);
    assert_eq!(scene.shadows().count(), 3);
}

#[test]
fn flipped_popup_draws_the_arrow_on_the_other_side() {
    let arrow = Rc::new(HeadlessArrow::new(
        ArrowPosition::Top,
        Size::new(16.0, 8.0),
        Vec2::new(92.0, 0.0),
    ));
    let r = rig_with(
        HeadlessSurface::new(),
        HeadlessPresenter::new(Size::new(200.0, 120.0)).with_arrow(arrow),
    );
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());

    let resolved = resolve_placement(
        PlacementMode::Bottom,
        Rect::new(300.0, 500.0, 60.0, 24.0),
        Vec2::new(0.0, 4.0),
        None,
        FlowDirection::LeftToRight,
    )
    .unwrap();
    r.host.place(&resolved, Rect::new(0.0, 0.0, 800.0, 600.0));

    let state = r.layer.state().unwrap();
    assert!(state.is_flipped);
    assert_eq!(state.arrow_direction, Some(Direction::Bottom));
    assert_eq!(r.layer.render().arrows().next().map(|a| a.1), Some(Side::Bottom));
}

#[test]
fn reassigned_host_replaces_the_old_one() {
    let r = rig();
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    r.host.set_position(Vec2::new(300.0, 200.0));

    r.primary.unassign();
    assert!(!r.surface.is_visible());
    assert!(r.layer.state().is_none());

    let other = Rc::new(HeadlessHost::new(Rc::new(HeadlessPresenter::new(Size::new(50.0, 50.0)))));
    r.primary.assign(other.clone());
    other.set_position(Vec2::new(10.0, 10.0));
    let moves = r.surface.move_count();

    r.host.set_position(Vec2::new(999.0, 999.0));
    assert_eq!(r.surface.move_count(), moves);
    assert_eq!(
        r.surface.bounds(),
        Some(expected(Vec2::new(10.0, 10.0), Size::new(50.0, 50.0), light_padding(), 1.0))
    );
}

#[test]
fn detach_is_idempotent_and_stops_tracking() {
    let r = rig();
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    r.host.set_position(Vec2::new(300.0, 200.0));
    r.layer.show();
    assert!(r.surface.is_visible());

    r.layer.detach();
    r.layer.detach();
    let releases = r
        .surface
        .calls()
        .iter()
        .filter(|c| **c == SurfaceCall::Release)
        .count();
    assert_eq!(releases, 1);
    assert!(!r.surface.is_visible());
    assert!(!r.layer.is_attached());

    let moves = r.surface.move_count();
    r.host.set_position(Vec2::new(0.0, 0.0));
    assert_eq!(r.surface.move_count(), moves);
    assert_eq!(r.host.size_changed().subscriber_count(), 0);
    assert_eq!(r.primary.host_assigned().subscriber_count(), 0);
}

#[test]
fn bindings_belong_to_the_layer_not_the_enclosing_scope() {
    let r = rig();
    let outer = Scope::new();
    outer.run(|| {
        r.layer.attach(r.primary.clone());
        r.primary.assign(r.host.clone());
    });
    assert!(outer.is_empty());
    outer.dispose();

    assert_eq!(r.primary.host_assigned().subscriber_count(), 1);
    assert_eq!(r.host.position_changed().subscriber_count(), 1);
    r.host.set_position(Vec2::new(300.0, 200.0));
    assert_eq!(
        r.surface.bounds(),
        Some(expected(Vec2::new(300.0, 200.0), r.host.client_size(), light_padding(), 1.0))
    );

    r.layer.detach();
    assert_eq!(r.primary.host_assigned().subscriber_count(), 0);
    assert_eq!(r.host.position_changed().subscriber_count(), 0);
}

#[test]
fn detach_gives_the_content_its_arrow_back() {
    let arrow = Rc::new(HeadlessArrow::new(
        ArrowPosition::Left,
        Size::new(8.0, 16.0),
        Vec2::new(0.0, 20.0),
    ));
    let r = rig_with(
        HeadlessSurface::new(),
        HeadlessPresenter::new(Size::new(200.0, 120.0)).with_arrow(arrow.clone()),
    );
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    assert_eq!(arrow.opacity.get(), 0.0);
    r.layer.detach();
    assert_eq!(arrow.opacity.get(), 1.0);
}

#[test]
fn dropping_the_layer_releases_the_surface() {
    let r = rig();
    let surface = r.surface.clone();
    r.layer.attach(r.primary.clone());
    drop(r);
    assert!(surface.is_released());
}

#[test]
fn combined_shadow_mode_keeps_the_invariant() {
    let r = rig();
    r.layer.set_shadow_render_mode(ShadowRenderMode::Combined);
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    r.host.set_position(Vec2::new(120.0, 80.0));
    assert_eq!(
        r.surface.bounds(),
        Some(expected(Vec2::new(120.0, 80.0), Size::new(200.0, 120.0), light_padding(), 1.0))
    );
    assert_eq!(r.layer.render().shadows().count(), 3);
}

#[test]
fn vertical_correction_is_a_render_offset_not_a_move() {
    let r = rig();
    r.layer
        .set_vertical_correction(Box::new(WorkingAreaClamp::from_screens([Rect::new(
            0.0, 25.0, 1440.0, 875.0,
        )])));
    r.layer.attach(r.primary.clone());
    r.primary.assign(r.host.clone());
    r.host.set_position(Vec2::new(100.0, 10.0));

    let pad = light_padding();
    let (pos, _) = r.surface.bounds().unwrap();
    assert_eq!(pos.y, 10.0 - pad.top);
    let state = r.layer.state().unwrap();
    assert_eq!(state.render_offset, Vec2::new(0.0, pos.y - 25.0));
    assert_eq!(
        r.layer.render().nodes.first(),
        Some(&SceneNode::PushTransform {
            transform: Transform::translate(0.0, pos.y - 25.0)
        })
    );
}
