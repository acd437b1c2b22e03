use super::*;

#[test]
fn unknown_mood_is_the_default_object() {
    let unknown = get_mood_grade(Some("not-a-real-mood"));
    let missing = get_mood_grade(None);
    assert!(std::ptr::eq(unknown, missing));
    assert!(std::ptr::eq(missing, get_mood_grade(Some(DEFAULT_MOOD))));
    assert!(std::ptr::eq(
        get_mood_grade(Some("  Euphoric ")),
        get_mood_grade(Some("euphoric"))
    ));
    assert_eq!(mood_keywords().count(), 14);
}

#[test]
fn filter_brightness_never_exceeds_cap() {
    for mood in mood_keywords() {
        let g = get_mood_grade(Some(mood));
        for (i, b) in [(0.0, 0.0), (1.0, 1.0), (5.0, 9.0), (f64::NAN, -3.0)] {
            assert!(build_grade_filter(g, i, b).brightness <= MAX_FILTER_BRIGHTNESS);
        }
    }
    let mut hot = *get_mood_grade(Some("euphoric"));
    hot.brightness = 3.0;
    assert_eq!(build_grade_filter(&hot, 1.0, 1.0).brightness, 0.90);
}

#[test]
fn temperature_selects_sepia_or_hue_rotate() {
    let warm = build_grade_filter(get_mood_grade(Some("nostalgic")), 0.0, 0.0);
    assert!((warm.sepia.unwrap() - 0.22 * 0.3).abs() < 1e-12);
    assert_eq!(warm.hue_rotate_deg, None);

    let cool = build_grade_filter(get_mood_grade(Some("eerie")), 0.0, 0.0);
    assert_eq!(cool.sepia, None);
    assert_eq!(cool.hue_rotate_deg, Some(-6));

    let neutral = build_grade_filter(get_mood_grade(Some("defiant")), 0.0, 0.0);
    assert_eq!((neutral.sepia, neutral.hue_rotate_deg), (None, None));
}

#[test]
fn hue_rotate_rounds_halves_up() {
    let half = MoodGrade {
        temperature: -0.25,
        ..*get_mood_grade(None)
    };
    assert_eq!(build_grade_filter(&half, 0.0, 0.0).hue_rotate_deg, Some(-7));
    assert_eq!(
        build_grade_filter(get_mood_grade(Some("melancholy")), 0.0, 0.0).hue_rotate_deg,
        Some(-4)
    );
}

#[test]
fn blur_term_appears_only_above_threshold() {
    let dreamy = get_mood_grade(Some("dreamy"));
    let f = build_grade_filter(dreamy, 0.0, 0.0);
    assert_eq!(f.blur_px, Some(1.6));
    assert!(f.to_string().contains("blur(1.60px)"));
    assert_eq!(build_grade_filter(dreamy, 0.0, 1.0).blur_px, Some(0.8));

    let mut faint = *dreamy;
    faint.blur.radius_px = 0.3;
    assert_eq!(build_grade_filter(&faint, 0.0, 1.0).blur_px, None);
    assert_eq!(
        build_grade_filter(get_mood_grade(Some("anthemic")), 0.0, 0.0).blur_px,
        None
    );
}

#[test]
fn filter_display_is_css_like() {
    let f = GradeFilter {
        brightness: 0.5,
        saturate: 1.0,
        contrast: 1.25,
        sepia: None,
        hue_rotate_deg: Some(-4),
        blur_px: None,
    };
    assert_eq!(
        f.to_string(),
        "brightness(0.500) saturate(1.000) contrast(1.250) hue-rotate(-4deg)"
    );
}

#[test]
fn text_mode_threshold() {
    let mut g = *get_mood_grade(None);
    g.brightness = 0.52;
    assert_eq!(text_mode(&g, 0.0), TextMode::Light);
    assert_eq!(text_mode(&g, 0.1), TextMode::Dark);
    assert_eq!(text_mode(get_mood_grade(Some("eerie")), 0.0), TextMode::Light);
}

#[test]
fn lerp_grade_endpoints_and_snap() {
    let a = get_mood_grade(Some("melancholy"));
    let b = get_mood_grade(Some("euphoric"));
    assert_eq!(lerp_grade(a, b, 0.0), *a);
    assert_eq!(lerp_grade(a, b, 1.0), *b);
    assert_eq!(lerp_grade(a, b, 0.49).motion_intent, a.motion_intent);
    assert_eq!(lerp_grade(a, b, 0.5).motion_intent, b.motion_intent);
    assert_eq!(lerp_grade(a, b, 0.49).layout_mode, a.layout_mode);
    assert_eq!(lerp_grade(a, b, 0.5).blur.kind, b.blur.kind);

    let mid = lerp_grade(a, b, 0.5);
    assert!((mid.brightness - (a.brightness + b.brightness) / 2.0).abs() < 1e-12);
}
