use super::*;
use serde_json::json;

fn line(start: f64, end: f64, text: &str) -> LyricLine {
    LyricLine {
        start,
        end,
        text: text.to_owned(),
    }
}

fn direction(extra: serde_json::Value) -> CinematicDirection {
    let mut raw = json!({
        "sceneTone": "dark",
        "atmosphere": "haze",
        "sections": [
            { "sectionIndex": 0, "description": "verse", "mood": "melancholy" },
            { "sectionIndex": 1, "description": "chorus", "mood": "euphoric" }
        ],
        "wordDirectives": [
            { "word": "Fire", "emphasisLevel": 2, "ghostTrail": true }
        ],
        "storyboard": [
            { "lineIndex": 1, "heroWord": "walk" }
        ]
    });
    if let (Some(obj), Some(more)) = (raw.as_object_mut(), extra.as_object()) {
        obj.extend(more.clone());
    }
    CinematicDirection::load(&raw).unwrap()
}

fn scene() -> SceneContext {
    SceneContext::new(
        Canvas::new(640, 360).unwrap(),
        direction(json!({})),
        vec![
            line(4.0, 6.0, "walk into fire"),
            line(1.0, 3.0, "walk into fire"),
            line(7.0, 9.0, "hold the light"),
        ],
        10.0,
    )
}

fn main_ops(plan: &FramePlan) -> Vec<&TextOp> {
    plan.text_ops().filter(|t| t.shadow.is_some()).collect()
}

#[test]
fn lines_are_sorted_and_boundaries_precomputed() {
    let s = scene();
    assert_eq!(s.lines()[0].start, 1.0);
    assert_eq!(s.lines()[2].start, 7.0);
    assert!(!s.boundaries().chapters.is_empty());
    assert_eq!(s.words().len(), 1);
    assert_eq!(s.duration_sec(), 10.0);
}

#[test]
fn plan_order_is_background_grade_text() {
    let plan = compose_frame(&scene(), 2.0, 0.3, &ComposeOpts::default());
    let kinds = plan.kinds();
    assert_eq!(kinds[0], "gradient");
    let grade = kinds.iter().position(|k| *k == "grade").unwrap();
    let first_text = kinds.iter().position(|k| *k == "text").unwrap();
    assert!(grade < first_text);
    assert_eq!(kinds.iter().filter(|k| **k == "grade").count(), 1);
    assert!(kinds[first_text..].iter().all(|k| *k == "text"));
}

#[test]
fn composing_is_pure() {
    let s = scene();
    let opts = ComposeOpts::default();
    for (t, beat) in [(0.5, 0.0), (2.0, 0.8), (4.5, 0.4), (9.9, 1.0)] {
        assert_eq!(compose_frame(&s, t, beat, &opts), compose_frame(&s, t, beat, &opts));
    }
}

#[test]
fn no_text_between_lines() {
    let s = scene();
    let opts = ComposeOpts::default();
    assert_eq!(compose_frame(&s, 0.5, 0.0, &opts).text_ops().count(), 0);
    assert_eq!(compose_frame(&s, 3.5, 0.0, &opts).text_ops().count(), 0);
    assert!(compose_frame(&s, 2.0, 0.0, &opts).text_ops().count() > 0);
}

#[test]
fn grade_pass_can_be_disabled() {
    let opts = ComposeOpts {
        grade_pass: false,
        ..ComposeOpts::default()
    };
    let plan = compose_frame(&scene(), 2.0, 0.5, &opts);
    assert!(!plan.kinds().contains(&"grade"));
    assert_eq!(plan.clear, Rgb::BLACK);
}

#[test]
fn ghost_trail_word_gets_two_ghosts() {
    let plan = compose_frame(&scene(), 2.0, 0.0, &ComposeOpts::default());
    let all: Vec<&TextOp> = plan.text_ops().collect();
    assert_eq!(main_ops(&plan).len(), 3);
    assert_eq!(all.len(), 5);
    let ghosts: Vec<&&TextOp> = all.iter().filter(|t| t.shadow.is_none()).collect();
    assert!(ghosts.iter().all(|g| g.text.eq_ignore_ascii_case("fire")));
    assert!(ghosts.iter().all(|g| g.opacity < 0.5));
}

#[test]
fn emphasis_enlarges_the_directed_word() {
    let plan = compose_frame(&scene(), 2.0, 0.0, &ComposeOpts::default());
    let mains = main_ops(&plan);
    let fire = mains
        .iter()
        .find(|t| t.text.eq_ignore_ascii_case("fire"))
        .unwrap();
    let walk = mains
        .iter()
        .find(|t| t.text.eq_ignore_ascii_case("walk"))
        .unwrap();
    assert!(fire.font_size > walk.font_size);
}

#[test]
fn hook_line_opens_white_and_hero_glows() {
    let s = scene();
    let first = compose_frame(&s, 2.0, 0.0, &ComposeOpts::default());
    let walk = main_ops(&first)[0];
    assert!(walk.text.eq_ignore_ascii_case("walk"));
    assert_eq!(walk.color, Rgb::WHITE);
    assert!(walk.glow.is_none());

    // Second occurrence carries the storyboard hero.
    let second = compose_frame(&s, 5.0, 0.5, &ComposeOpts::default());
    let hero = main_ops(&second)[0];
    let glow = hero.glow.unwrap();
    assert!((glow.radius_px - 8.0).abs() < 1e-9);
    assert_eq!(glow.strength, 0.45);
}

#[test]
fn line_opacity_ramps_at_both_edges() {
    let l = line(1.0, 3.0, "x");
    assert_eq!(line_opacity(&l, 1.0), 0.0);
    assert!((line_opacity(&l, 1.0 + LINE_FADE_SEC / 2.0) - 0.5).abs() < 1e-9);
    assert_eq!(line_opacity(&l, 2.0), 1.0);
    assert!((line_opacity(&l, 3.0 - LINE_FADE_SEC / 2.0) - 0.5).abs() < 1e-9);
    assert_eq!(line_opacity(&l, 3.0), 0.0);
}

#[test]
fn closing_fade_follows_the_ending_style() {
    let dir = direction(json!({}));
    assert_eq!(ending_fade_alpha(&dir, 5.0, 10.0), 0.0);
    assert!((ending_fade_alpha(&dir, 9.0, 10.0) - 0.5).abs() < 1e-9);
    assert_eq!(ending_fade_alpha(&dir, 10.0, 10.0), 1.0);
    assert_eq!(ending_fade_alpha(&dir, 9.0, 0.0), 0.0);

    let snap = direction(json!({ "emotionalArc": "surge" }));
    assert_eq!(ending_fade_alpha(&snap, 9.9, 10.0), 0.0);
    assert_eq!(ending_fade_alpha(&CinematicDirection::default(), 9.9, 10.0), 0.0);
}

#[test]
fn closing_fade_is_the_last_op() {
    let plan = compose_frame(&scene(), 9.5, 0.0, &ComposeOpts::default());
    match plan.ops.last() {
        Some(DrawOp::Fill { color, alpha, .. }) => {
            assert_eq!(*color, Rgb::BLACK);
            assert!((alpha - 0.75).abs() < 1e-9);
        }
        other => panic!("expected closing fade, got {other:?}"),
    }
}

#[test]
fn resize_moves_layout_to_the_new_canvas() {
    let mut s = scene();
    let small = compose_frame(&s, 2.0, 0.0, &ComposeOpts::default());
    s.set_canvas(Canvas::new(1280, 720).unwrap());
    let large = compose_frame(&s, 2.0, 0.0, &ComposeOpts::default());
    assert_eq!(large.canvas, s.canvas());
    assert!(main_ops(&large)[0].font_size > main_ops(&small)[0].font_size);
}
