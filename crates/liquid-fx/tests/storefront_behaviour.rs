//! End-to-end behaviour of the effects against the mock page

#![allow(clippy::unwrap_used)]

use liquid_fx::effects::{ripple, text_reveal};
use liquid_fx::host::{EventKind, Rect};
use liquid_fx::motion::HOVER_QUERY;
use liquid_fx::prelude::*;
use liquid_fx::{BlobOptions, CursorOptions, RippleOptions, TextRevealOptions, WaveOptions};
use std::rc::Rc;

fn context() -> (Rc<MockHost>, EffectContext<MockHost>) {
    let host = Rc::new(MockHost::new());
    let ctx = EffectContext::new(Rc::clone(&host));
    (host, ctx)
}

#[test]
fn blob_count_matches_options_until_destroyed() {
    let (host, ctx) = context();
    let hero = host.add_to_body("section", &[("data-liquid-blob", "")]);
    let options = BlobOptions {
        count: 7,
        ..BlobOptions::default()
    };
    let mut blob = BlobAnimation::new(&ctx, Target::Node(hero), options);
    blob.start();
    host.advance_frames(3);
    assert_eq!(host.query_selector_all(".liquid-blob").len(), 7);

    assert_eq!(blob.particle_count(), 7);

    blob.destroy();
    assert_eq!(blob.particle_count(), 0);
    assert!(host.query_selector_all(".liquid-blob").is_empty());
    assert_eq!(host.pending_frames(), 0);
}

#[test]
fn wave_layers_keep_closed_outline_while_running() {
    let (host, ctx) = context();
    let band = host.add_to_body("section", &[("data-liquid-wave", "")]);
    let mut wave = WaveAnimation::new(&ctx, Target::Node(band), WaveOptions::default());
    wave.start();
    host.advance_frames(10);
    for path in wave.paths() {
        let d = host.attribute(&path, "d").unwrap();
        assert!(d.starts_with("M0,160"));
        assert!(d.ends_with(" L1440,320 L0,320 Z"));
    }
}

#[test]
fn ripple_lands_at_click_offset_and_expires() {
    let (host, ctx) = context();
    let button = host.add_to_body("button", &[("data-ripple", "")]);
    host.set_rect(button, Rect::new(100.0, 200.0, 100.0, 50.0));
    let mut ripples = RippleEffect::new(&ctx, ripple::DEFAULT_SELECTOR, RippleOptions::default());
    ripples.start();

    host.click(button, 130.0, 210.0);
    let live = ripples.live_nodes();
    assert_eq!(live.len(), 1);
    assert_eq!(host.style(&live[0], "left").as_deref(), Some("30px"));
    assert_eq!(host.style(&live[0], "top").as_deref(), Some("10px"));

    host.advance_time(799.0);
    assert_eq!(host.children(button).len(), 1);
    host.advance_time(1.0);
    assert!(host.children(button).is_empty());
}

#[test]
fn text_reveal_staggers_and_fires_once() {
    let (host, ctx) = context();
    let heading = host.add_to_body("h2", &[("data-liquid-text", "")]);
    host.set_fixture_text(heading, "Hi there");
    let options = TextRevealOptions {
        stagger: 50,
        ..TextRevealOptions::default()
    };
    let mut reveal = LiquidTextReveal::new(&ctx, text_reveal::DEFAULT_SELECTOR, options);
    reveal.start();

    let chars = reveal.chars(0);
    assert_eq!(chars.len(), 8);
    for (i, span) in chars.iter().enumerate() {
        let expected = format!("{}ms", i * 50);
        assert_eq!(host.style(span, "transition-delay").as_deref(), Some(expected.as_str()));
    }

    host.set_intersection(heading, 1.0);
    let after_first = host.mutation_count();
    host.set_intersection(heading, 1.0);
    assert_eq!(host.mutation_count(), after_first);
    assert_eq!(reveal.revealed_count(), 1);
}

#[test]
fn cursor_trail_converges_then_hides_on_touch() {
    let (host, ctx) = context();
    host.set_media(HOVER_QUERY, true);
    host.add_to_body("main", &[("data-liquid-cursor", "")]);
    let mut cursor = LiquidCursor::new(&ctx, CursorOptions::default());
    cursor.start();

    let body = host.body().unwrap();
    host.mouse_move(body, 100.0, 100.0);
    let gap = |p: &(f64, f64)| (100.0 - p.0).hypot(100.0 - p.1);
    let mut previous: Vec<f64> = cursor.positions().iter().map(gap).collect();
    for _ in 0..10 {
        host.advance_frame();
        let current: Vec<f64> = cursor.positions().iter().map(gap).collect();
        assert!(current.iter().zip(&previous).all(|(now, before)| now < before));
        previous = current;
    }

    host.touch_start(body);
    host.advance_frames(10);
    let mut nodes = cursor.trail();
    nodes.push(cursor.head().unwrap());
    for node in nodes {
        assert_eq!(host.style(&node, "display").as_deref(), Some("none"));
    }
    assert_eq!(host.listener_count_of(EventKind::TouchStart), 0);
}

#[test]
fn reduced_motion_page_stays_still() {
    let host = Rc::new(MockHost::new());
    host.set_media("(prefers-reduced-motion: reduce)", true);
    host.set_media(HOVER_QUERY, true);
    host.add_to_body("section", &[("data-liquid-blob", "")]);
    let band = host.add_to_body("section", &[("data-liquid-wave", "")]);
    host.add_to_body("footer", &[("data-liquid-bubbles", "")]);
    host.add_to_body("button", &[("data-ripple", "")]);
    let heading = host.add_to_body("h2", &[("data-liquid-text", "")]);
    host.set_fixture_text(heading, "Still");
    host.add_to_body("main", &[("data-liquid-cursor", "")]);

    let effects = Bootstrapper::new(Rc::clone(&host), EffectsConfig::default()).boot();
    assert_eq!(effects.len(), 1);
    assert_eq!(effects.count_of(EffectFamily::Wave), 1);
    assert_eq!(host.pending_frames(), 0);
    assert_eq!(host.pending_timers(), 0);
    assert_eq!(host.observer_count(), 0);
    assert_eq!(host.text_content(&heading), "Still");

    // only the static wave was mounted
    assert_eq!(host.children(band).len(), 1);
    let before = host.mutation_count();
    host.advance_frames(5);
    assert_eq!(host.mutation_count(), before);
}

#[test]
fn failing_instance_does_not_stop_others() {
    let (host, ctx) = context();
    let hero = host.add_to_body("section", &[]);
    let mut healthy = BlobAnimation::new(&ctx, Target::Node(hero), BlobOptions::default());
    let mut missing = BlobAnimation::new(&ctx, Target::from("#gone"), BlobOptions::default());
    missing.start();
    healthy.start();
    assert!(missing.state().is_inert());
    host.advance_frames(4);
    assert_eq!(healthy.state(), EffectState::Running);
    assert!(healthy.time() > 0.0);
}

#[test]
fn droplet_loader_round_trip() {
    let (host, ctx) = context();
    let slot = host.add_to_body("div", &[("id", "checkout-status")]);
    let mut loader = DropletLoader::new(&ctx, Target::from("#checkout-status"));
    loader.start();
    loader.hide();
    let element = loader.element().unwrap();
    assert_eq!(host.style(&element, "display").as_deref(), Some("none"));
    loader.destroy();
    assert!(host.children(slot).is_empty());
}
