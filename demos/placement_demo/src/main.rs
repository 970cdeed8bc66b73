use std::cell::Cell;
use std::rc::Rc;

use perch_core::*;
use perch_popup::*;
use web_time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let focus: PlacementMode = match std::env::args().nth(1) {
        Some(name) => name.parse()?,
        None => PlacementMode::BottomEdgeAlignedLeft,
    };

    let mut tree = VisualTree::new();
    let window = tree.add_root(Size::new(800.0, 600.0));
    let toolbar = tree.add_child(window, Vec2::new(0.0, 60.0), Size::new(800.0, 48.0))?;
    let button = tree.add_child(toolbar, Vec2::new(100.0, 40.0), Size::new(50.0, 20.0))?;

    println!("anchor control at {:?}", tree.anchor_rect(button, None, None)?);
    println!("{:<24} {:<14} {:<14} {:<8} {:<24} offset", "placement", "anchor", "gravity", "dir", "arrow");
    for mode in PlacementMode::ALL {
        let mut request = PlacementRequest::new(mode, button).margin(4.0);
        match mode {
            PlacementMode::Pointer => request = request.pointer(Vec2::new(120.0, 110.0)),
            PlacementMode::AnchorAndGravity => {
                request = request.anchor_gravity(PopupAnchor::BOTTOM_RIGHT, PopupGravity::BOTTOM_LEFT)
            }
            _ => {}
        }
        let r = request.resolve(&tree)?;
        println!(
            "{:<24} {:<14} {:<14} {:<8} {:<24} ({}, {})",
            mode.name(),
            format!("{:?}", r.anchor),
            format!("{:?}", r.gravity),
            r.direction.map_or("-".to_string(), |d| format!("{d:?}")),
            r.arrow_position().map_or("-".to_string(), |a| format!("{a:?}")),
            r.offset.x,
            r.offset.y,
        );
    }

    let rtl = with_flow_direction(FlowDirection::RightToLeft, || {
        PlacementRequest::new(focus, button).margin(4.0).resolve(&tree)
    })?;
    println!("\n{focus} under RTL: {:?}/{:?}, arrow {:?}", rtl.anchor, rtl.gravity, rtl.arrow_position());

    let clock = Rc::new(ManualClock::new());
    let dispatcher = Dispatcher::new(clock.clone());
    let surface = Rc::new(HeadlessSurface::new());
    let tokens = Rc::new(DesignTokens::default());
    let layer = CompanionLayer::new(surface.clone(), tokens.clone(), dispatcher.clone());

    let resolved = PlacementRequest::new(focus, button).margin(4.0).resolve(&tree)?;
    let arrow = resolved.arrow_position().map(|pos| {
        Rc::new(HeadlessArrow::from_tokens(
            pos,
            &*tokens,
            theme_variant(),
            Vec2::new(12.0, 12.0),
        ))
    });
    let mut presenter = HeadlessPresenter::new(Size::new(180.0, 96.0));
    if let Some(arrow) = arrow {
        presenter = presenter.with_arrow(arrow);
    }
    let host = Rc::new(HeadlessHost::new(Rc::new(presenter)));
    let primary = Rc::new(HeadlessPrimary::new());

    layer.attach(primary.clone());
    primary.assign(host.clone());
    let placed = host.place(&resolved, Rect::new(0.0, 0.0, 800.0, 600.0));
    println!("\npopup placed at {placed:?} (flipped: {})", host.is_flipped());
    if let Some(state) = layer.state() {
        println!("companion bounds {:?}", state.bounds());
        println!("shadow padding {:?}", state.shadow_padding);
        println!("arrow {:?} at {:?}", state.arrow_direction, state.arrow_bounds);
    }

    let opened = Rc::new(Cell::new(false));
    let flag = opened.clone();
    layer.run_open_motion(None, Some(Box::new(move || flag.set(true))));
    let frames = run_until(&clock, &dispatcher, || opened.get());
    println!("open motion finished after {frames} frames");

    let closed = Rc::new(Cell::new(false));
    let flag = closed.clone();
    layer.run_close_motion(None, Some(Box::new(move || flag.set(true))));
    let frames = run_until(&clock, &dispatcher, || closed.get());
    println!("close motion finished after {frames} frames");

    let scene = layer.render();
    println!("last scene: {} nodes, {} shadows", scene.len(), scene.shadows().count());

    layer.detach();
    println!("surface calls: {}", surface.calls().len());
    Ok(())
}

fn run_until(clock: &ManualClock, dispatcher: &Dispatcher, done: impl Fn() -> bool) -> u32 {
    let mut frames = 0;
    while !done() && frames < 600 {
        clock.advance(FRAME);
        dispatcher.pump();
        frames += 1;
    }
    if !done() {
        log::warn!("motion still running after {frames} frames");
    }
    frames
}
