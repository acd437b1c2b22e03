use super::*;
use crate::foundation::core::Canvas;

fn plan() -> FramePlan {
    FramePlan::new(Canvas::new(64, 36).unwrap(), Rgb::BLACK)
}

#[test]
fn burn_background_steps_through_phases() {
    let at = |p| background_system_for_time("burn", p);
    assert_eq!(at(0.1), "haze");
    assert_eq!(at(0.4), "burn");
    assert_eq!(at(0.6), "haze");
    assert_eq!(at(0.9), "ember");
    assert_eq!(at(1.0), "ember");
}

#[test]
fn rain_and_breath_share_a_cycle() {
    for base in ["rain", "breath"] {
        let seq: Vec<_> = [0.1, 0.3, 0.6, 0.9]
            .iter()
            .map(|&p| background_system_for_time(base, p))
            .collect();
        assert_eq!(seq, ["mist", "rain", "downpour", "mist"]);
    }
}

#[test]
fn frost_and_winter_pass_through_blizzard() {
    assert_eq!(background_system_for_time("winter", 0.0), "frost");
    assert_eq!(background_system_for_time("frost", 0.5), "blizzard");
    assert_eq!(background_system_for_time("frost", 0.7), "frost");
}

#[test]
fn other_bases_pass_through_for_every_progress() {
    for i in 0..=20 {
        let p = f64::from(i) / 20.0;
        assert_eq!(background_system_for_time("void", p), "void");
        assert_eq!(background_system_for_time("neon", p), "neon");
    }
}

#[test]
fn out_of_range_progress_is_clamped() {
    assert_eq!(background_system_for_time("burn", -3.0), "haze");
    assert_eq!(background_system_for_time("burn", 7.0), "ember");
    assert_eq!(background_system_for_time("burn", f64::NAN), "haze");
}

#[test]
fn fire_arc_peaks_mid_song() {
    assert!((fire_arc(0.0) - 0.35).abs() < 1e-12);
    assert!((fire_arc(0.5) - 1.0).abs() < 1e-12);
    assert!(fire_arc(0.5) > fire_arc(0.2));
}

#[test]
fn cold_phases() {
    assert_eq!(cold_phase(0.2), ColdPhase::Overcast);
    assert_eq!(cold_phase(0.4), ColdPhase::Storm);
    assert_eq!(cold_phase(0.8), ColdPhase::Clearing);
}

#[test]
fn light_keywords_and_aliases() {
    assert_eq!(LightSource::from_keyword("left"), LightSource::FlickeringLeft);
    assert_eq!(
        LightSource::from_keyword("Flickering Left"),
        LightSource::FlickeringLeft
    );
    assert_eq!(LightSource::from_keyword("strobe"), LightSource::None);
}

#[test]
fn unknown_light_paints_nothing() {
    let mut p = plan();
    draw_lighting(&mut p, "laser grid", 0.5, 1.0);
    assert!(p.ops.is_empty());
}

#[test]
fn golden_light_is_one_additive_gradient() {
    let mut p = plan();
    draw_lighting(&mut p, "golden", 0.5, 0.0);
    assert_eq!(p.kinds(), ["gradient"]);
    let DrawOp::Gradient(g) = &p.ops[0] else {
        panic!("expected gradient");
    };
    assert_eq!(g.blend, BlendMode::Additive);
    assert!((g.stops[0].alpha - 0.22).abs() < 1e-12);
}

#[test]
fn storm_flash_only_on_strong_beats() {
    let mut quiet = plan();
    draw_lighting(&mut quiet, "cold overcast", 0.45, 0.8);
    assert_eq!(quiet.kinds(), ["gradient"]);

    let mut loud = plan();
    draw_lighting(&mut loud, "cold overcast", 0.45, 0.9);
    assert_eq!(loud.kinds(), ["gradient", "fill"]);
    let DrawOp::Fill { color, blend, .. } = &loud.ops[1] else {
        panic!("expected fill");
    };
    assert_eq!(*color, Rgb::WHITE);
    assert_eq!(*blend, BlendMode::Additive);
}

#[test]
fn clearing_lift_grows_toward_the_end() {
    let lift = |progress| {
        let mut p = plan();
        draw_lighting(&mut p, "winter daylight", progress, 0.0);
        p.ops.iter().find_map(|op| match op {
            DrawOp::Fill { alpha, .. } => Some(*alpha),
            _ => None,
        })
    };
    assert_eq!(lift(0.6), None);
    let mid = lift(0.8).unwrap();
    assert!((mid - 0.06).abs() < 1e-9);
    assert!((lift(1.0).unwrap() - 0.12).abs() < 1e-9);
}

#[test]
fn text_shadow_uses_first_palette_color() {
    let palette = ["#AABBCC".to_owned(), "#000000".to_owned()];
    let s = get_text_shadow("moonlight", &palette, 0.0);
    assert_eq!(s.color, "#aabbccaa");
    assert_eq!((s.offset_x, s.offset_y, s.blur), (3.0, 4.0, 6.0));

    let spec = s.to_spec();
    assert_eq!(spec.color, Rgb::new(0xaa, 0xbb, 0xcc));
    assert!((spec.alpha - 170.0 / 255.0).abs() < 1e-12);
}

#[test]
fn text_shadow_falls_back_to_black() {
    let s = get_text_shadow("golden", &[], 0.0);
    assert_eq!(s.color, "#000000aa");
    let s = get_text_shadow("golden", &["not a color".to_owned()], 0.0);
    assert_eq!(s.color, "#000000aa");
}

#[test]
fn flicker_shadow_moves_with_the_beat() {
    let calm = get_text_shadow("flickering left", &[], 0.0);
    let loud = get_text_shadow("flickering left", &[], 1.0);
    assert_eq!(calm.offset_x, 4.0);
    assert_eq!(loud.offset_x, 7.0);
}

#[test]
fn background_starts_with_opaque_base_gradient() {
    let state = FrameRenderState::default();
    let mut p = plan();
    draw_background(&mut p, "burn", &state, 0.0);
    assert_eq!(p.kinds(), ["gradient", "gradient", "gradient"]);
    let DrawOp::Gradient(base) = &p.ops[0] else {
        panic!("expected gradient");
    };
    assert_eq!(base.blend, BlendMode::Normal);
    assert_eq!(base.stops[0].alpha, 1.0);
    assert_eq!(base.stops[0].color, state.palette_rgb(0));
}
