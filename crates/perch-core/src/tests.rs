#[cfg(test)]
mod tests {
    use crate::animation::*;
    use crate::effects::*;
    use crate::geometry::*;
    use crate::locals::*;
    use crate::runtime::*;
    use crate::scope::*;
    use crate::shadow::*;
    use crate::signal::*;
    use crate::tokens::*;
    use crate::view::*;
    use crate::Color;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use web_time::Duration;

    #[test]
    fn test_signal_basic() {
        let sig = signal(42);
        assert_eq!(sig.get(), 42);

        sig.set(100);
        assert_eq!(sig.get(), 100);

        sig.update(|v| *v += 1);
        assert_eq!(sig.get(), 101);
    }

    #[test]
    fn test_signal_subscription() {
        let sig = signal(0);
        let called = Rc::new(RefCell::new(false));

        let called_clone = called.clone();
        sig.subscribe(move |_| {
            *called_clone.borrow_mut() = true;
        });

        sig.set(42);
        assert!(*called.borrow());
    }

    #[test]
    fn test_signal_subscriber_may_read_and_unsubscribe() {
        let sig = signal(1);
        let seen = Rc::new(Cell::new(0));
        let guard: Rc<RefCell<Option<Dispose>>> = Rc::new(RefCell::new(None));

        let d = {
            let sig2 = sig.clone();
            let seen = seen.clone();
            let guard = guard.clone();
            sig.watch(move |_| {
                seen.set(sig2.get());
                if let Some(g) = guard.borrow().as_ref() {
                    g.run();
                }
            })
        };
        *guard.borrow_mut() = Some(d);

        sig.set(7);
        assert_eq!(seen.get(), 7);
        assert_eq!(sig.subscriber_count(), 0);

        sig.set(9);
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn test_dispose_runs_once() {
        let count = Rc::new(Cell::new(0));
        let d = {
            let count = count.clone();
            Dispose::new(move || count.set(count.get() + 1))
        };
        let d2 = d.clone();
        d.run();
        d2.run();
        assert_eq!(count.get(), 1);
        assert!(d.is_disposed());
        assert!(Dispose::noop().is_disposed());
    }

    #[test]
    fn test_scope_explicit_dispose() {
        let cleaned_up = Rc::new(RefCell::new(false));

        let scope = Scope::new();
        let cleaned_up_clone = cleaned_up.clone();
        scope.add_disposer(move || {
            *cleaned_up_clone.borrow_mut() = true;
        });

        assert!(!*cleaned_up.borrow());
        scope.dispose();
        assert!(*cleaned_up.borrow());
    }

    #[test]
    fn test_scope_drop_runs_disposers() {
        let cleaned_up = Rc::new(Cell::new(false));
        {
            let scope = Scope::new();
            let c = cleaned_up.clone();
            scope.add_disposer(move || c.set(true));
        }
        assert!(cleaned_up.get());
    }

    #[test]
    fn test_effect_registers_with_current_scope() {
        let sig = signal(0);
        let parent = Scope::new();
        let child = parent.child();

        child.run(|| {
            let s = sig.clone();
            effect(move || s.watch(|_| {}));
            assert!(current_scope().is_some());
        });
        assert!(current_scope().is_none());
        assert_eq!(sig.subscriber_count(), 1);

        parent.dispose();
        assert_eq!(sig.subscriber_count(), 0);
    }

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#FF5733");
        assert_eq!(c, Color(255, 87, 51, 255));

        let c_alpha = Color::from_hex("#FF5733AA");
        assert_eq!(c_alpha, Color(255, 87, 51, 170));
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect {
            x: 10.0,
            y: 10.0,
            w: 100.0,
            h: 50.0,
        };

        assert!(rect.contains(Vec2 { x: 50.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 5.0, y: 30.0 }));
        assert!(!rect.contains(Vec2 { x: 50.0, y: 70.0 }));
    }

    #[test]
    fn test_rect_intersect_and_inflate() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(80.0, 40.0, 50.0, 50.0);
        assert_eq!(a.intersect(&b), Rect::new(80.0, 40.0, 20.0, 10.0));

        let apart = Rect::new(200.0, 200.0, 10.0, 10.0);
        let none = a.intersect(&apart);
        assert_eq!(none.w, 0.0);
        assert_eq!(none.h, 0.0);

        let t = Thickness::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(a.inflate(t), Rect::new(-1.0, -2.0, 104.0, 56.0));
        assert_eq!(a.inflate(t).deflate(t), a);
        assert_eq!(a.size().inflate(t), Size::new(104.0, 56.0));
    }

    #[test]
    fn test_transform_composition() {
        let move_then_scale = Transform::translate(10.0, 5.0).then(&Transform::scale(2.0, 2.0));
        assert_eq!(
            move_then_scale.apply_to_point(Vec2::new(1.0, 1.0)),
            Vec2::new(22.0, 12.0)
        );

        let about = Transform::scale_about(0.5, Vec2::new(50.0, 20.0));
        assert_eq!(about.apply_to_point(Vec2::new(50.0, 20.0)), Vec2::new(50.0, 20.0));
        assert_eq!(
            about.apply_to_rect(Rect::new(0.0, 0.0, 100.0, 40.0)),
            Rect::new(25.0, 10.0, 50.0, 20.0)
        );
    }

    #[test]
    fn test_shadow_thickness() {
        let s = BoxShadow::new(0.0, 6.0, 16.0, 0.0, Color::black_alpha(0.08));
        assert_eq!(s.thickness(), Thickness::new(16.0, 10.0, 16.0, 22.0));

        let mut inset = s;
        inset.inset = true;
        assert!(inset.thickness().is_zero());

        let list = BoxShadows::new([s, BoxShadow::new(4.0, 0.0, 2.0, 0.0, Color::BLACK)]);
        assert_eq!(list.thickness(), Thickness::new(16.0, 10.0, 16.0, 22.0));
        assert!(BoxShadows::default().thickness().is_zero());
    }

    #[test]
    fn test_animation_deterministic() {
        let clock = ManualClock::new();

        let mut a = AnimatedValue::new(
            0.0f32,
            AnimationSpec::tween(Duration::from_millis(1000), Easing::Linear),
        );
        a.set_target(10.0, clock.now());
        clock.advance(Duration::from_millis(250));
        assert!(a.update(clock.now()));
        assert!((*a.get() - 2.5).abs() < 0.01);

        clock.advance(Duration::from_millis(750));
        let cont = a.update(clock.now());
        assert!(!cont);
        assert!((*a.get() - 10.0).abs() < 0.001);
        assert!(!a.is_animating());
    }

    #[test]
    fn test_easing_endpoints() {
        for e in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::CircularEaseOut,
            Easing::CircularEaseInOut,
        ] {
            assert!(e.interpolate(0.0).abs() < 1e-6, "{e:?} at 0");
            assert!((e.interpolate(1.0) - 1.0).abs() < 1e-6, "{e:?} at 1");
        }
        assert!(Easing::CircularEaseOut.interpolate(0.5) > 0.5);
    }

    #[test]
    fn test_dispatcher_timers_fire_in_deadline_order() {
        let clock = Rc::new(ManualClock::new());
        let d = Dispatcher::new(clock.clone());
        let log = Rc::new(RefCell::new(Vec::new()));

        let _a = {
            let log = log.clone();
            d.run_once(Duration::from_millis(20), move || log.borrow_mut().push("b"))
        };
        let _b = {
            let log = log.clone();
            d.run_once(Duration::from_millis(10), move || log.borrow_mut().push("a"))
        };
        let c = {
            let log = log.clone();
            d.run_once(Duration::from_millis(15), move || log.borrow_mut().push("never"))
        };
        c.run();
        assert_eq!(d.pending_timers(), 2);

        clock.advance(Duration::from_millis(30));
        d.pump();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(d.is_idle());
    }

    #[test]
    fn test_dispatcher_timer_may_cancel_another() {
        let clock = Rc::new(ManualClock::new());
        let d = Dispatcher::new(clock.clone());
        let fired = Rc::new(Cell::new(false));

        let late = {
            let fired = fired.clone();
            d.run_once(Duration::from_millis(10), move || fired.set(true))
        };
        let _early = d.run_once(Duration::from_millis(5), move || late.run());

        clock.advance(Duration::from_millis(10));
        d.pump();
        assert!(!fired.get());
    }

    #[test]
    fn test_dispatcher_frames_until_false() {
        let clock = Rc::new(ManualClock::new());
        let d = Dispatcher::new(clock.clone());
        let ticks = Rc::new(Cell::new(0));

        let _f = {
            let ticks = ticks.clone();
            d.on_frame(move |_| {
                ticks.set(ticks.get() + 1);
                ticks.get() < 3
            })
        };
        for _ in 0..5 {
            clock.advance(Duration::from_millis(16));
            d.pump();
        }
        assert_eq!(ticks.get(), 3);
        assert_eq!(d.active_frames(), 0);
    }

    #[test]
    fn test_locals_nest_and_restore() {
        assert_eq!(flow_direction(), FlowDirection::LeftToRight);
        with_flow_direction(FlowDirection::RightToLeft, || {
            with_density(Density { scale: 2.0 }, || {
                assert_eq!(flow_direction(), FlowDirection::RightToLeft);
                assert_eq!(density().scale, 2.0);
                with_flow_direction(FlowDirection::LeftToRight, || {
                    assert_eq!(flow_direction(), FlowDirection::LeftToRight);
                });
                assert_eq!(flow_direction(), FlowDirection::RightToLeft);
            });
            assert_eq!(density().scale, 1.0);
        });
        assert_eq!(theme_variant(), ThemeVariant::Light);
    }

    #[test]
    fn test_tokens_typed_lookup() {
        let tokens = DesignTokens::default();
        assert_eq!(tokens.box_shadows(ThemeVariant::Light).len(), 3);
        assert_eq!(
            tokens.motion_duration(ThemeVariant::Dark),
            Duration::from_millis(200)
        );
        assert_eq!(tokens.arrow_fill(ThemeVariant::Dark), Color::from_hex("#1f1f1f"));
    }

    struct Mistyped;
    impl TokenResolver for Mistyped {
        fn lookup(&self, key: TokenKey, _: ThemeVariant) -> Option<TokenValue> {
            match key {
                TokenKey::BorderRadius => Some(TokenValue::Color(Color::BLACK)),
                TokenKey::ArrowSize => Some(TokenValue::Length(8.0)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_tokens_wrong_type_falls_back() {
        let r = Mistyped;
        assert_eq!(r.corner_radius(ThemeVariant::Light), CornerRadius::default());
        assert!(r.box_shadows(ThemeVariant::Light).is_empty());
        assert_eq!(r.motion_duration(ThemeVariant::Light), Duration::ZERO);
        assert_eq!(r.arrow_size(ThemeVariant::Light), 8.0);
        assert_eq!(DesignTokens::default().arrow_size(ThemeVariant::Dark), 16.0);
    }

    #[test]
    fn test_scene_groups() {
        let mut scene = Scene::new();
        scene.with_opacity(0.5, |s| {
            s.with_transform(Transform::scale(0.9, 0.9), |s| {
                s.push(SceneNode::Arrow {
                    rect: Rect::new(0.0, 0.0, 16.0, 8.0),
                    pointing: Side::Top,
                    color: Color::WHITE,
                });
            });
        });
        assert_eq!(scene.len(), 5);
        assert_eq!(scene.arrows().count(), 1);
        assert!(matches!(scene.nodes[0], SceneNode::PushOpacity { .. }));
        assert!(matches!(scene.nodes[4], SceneNode::PopOpacity));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_tokens_from_json() {
        let mut tokens = DesignTokens::default();
        tokens.dark.border_radius = 10.0;
        let json = serde_json::to_string(&tokens).unwrap();
        let back: DesignTokens = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tokens);
        assert_eq!(
            back.corner_radius(ThemeVariant::Dark),
            CornerRadius::uniform(10.0)
        );
    }
}
