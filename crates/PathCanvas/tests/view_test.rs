use glam::DVec2;
use path_canvas::CanvasConfig;
use path_canvas::view::{View, Viewport, canvas_to_screen, screen_to_canvas};

const EPS: f64 = 1e-9;

fn assert_close(a: DVec2, b: DVec2) {
    assert!(a.distance(b) < EPS, "{a:?} != {b:?}");
}

#[test]
fn test_transform_round_trip() {
    let viewport = Viewport {
        x: -37.5,
        y: 120.0,
        scale: 2.75,
    };
    for p in [DVec2::ZERO, DVec2::new(13.0, -8.5), DVec2::new(1e4, 3e3)] {
        assert_close(screen_to_canvas(canvas_to_screen(p, &viewport), &viewport), p);
    }
    assert_eq!(
        canvas_to_screen(DVec2::new(10.0, 10.0), &viewport),
        DVec2::new(-37.5 + 27.5, 120.0 + 27.5)
    );
}

#[test]
fn test_zoom_keeps_anchor_fixed() {
    let mut view = View::default();
    view.set_viewport(Viewport {
        x: 40.0,
        y: -10.0,
        scale: 1.3,
    });
    let anchor = DVec2::new(320.0, 240.0);
    let under = view.screen_to_canvas(anchor);

    assert!(view.zoom_at(anchor, 1));
    assert!((view.viewport().scale - 1.43).abs() < EPS);
    assert_close(view.screen_to_canvas(anchor), under);

    assert!(view.zoom_at(anchor, -3));
    assert_close(view.screen_to_canvas(anchor), under);
}

#[test]
fn test_zoom_is_clamped() {
    let mut view = View::from_config(&CanvasConfig {
        min_scale: 0.5,
        max_scale: 2.0,
        ..Default::default()
    });
    for _ in 0..50 {
        view.zoom_at(DVec2::new(10.0, 10.0), 1);
    }
    assert_eq!(view.viewport().scale, 2.0);
    assert!(!view.zoom_at(DVec2::new(10.0, 10.0), 1), "already at the bound");

    for _ in 0..50 {
        view.zoom_at(DVec2::ZERO, -1);
    }
    assert_eq!(view.viewport().scale, 0.5);

    view.set_viewport(Viewport {
        x: 0.0,
        y: 0.0,
        scale: 100.0,
    });
    assert_eq!(view.viewport().scale, 2.0);
}

#[test]
fn test_pan_zoom_pan_matches_direct_computation() {
    let mut view = View::default();
    let anchor = DVec2::new(200.0, 100.0);

    view.pan_by(DVec2::new(30.0, -20.0));
    view.zoom_at(anchor, 2);
    view.pan_by(DVec2::new(-5.0, 12.0));

    // Direct: after the first pan the translation is (30, -20); zooming by s' keeps the
    // anchor fixed, so t' = anchor - (anchor - t) * s' / s.
    let s = 1.1_f64 * 1.1;
    let t1 = DVec2::new(30.0, -20.0);
    let t2 = anchor - (anchor - t1) * s;
    let expected = t2 + DVec2::new(-5.0, 12.0);

    let vp = view.viewport();
    assert!((vp.scale - s).abs() < EPS);
    assert_close(vp.translation(), expected);
}

#[test]
fn test_reset_returns_to_identity() {
    let mut view = View::default();
    view.pan_by(DVec2::new(10.0, 10.0));
    view.zoom_at(DVec2::ZERO, 3);
    view.reset();
    assert_eq!(view.viewport(), Viewport::default());
}
