use super::*;
use serde_json::json;

fn direction() -> CinematicDirection {
    CinematicDirection::load(&json!({
        "sceneTone": "mixed-dawn",
        "atmosphere": "wildfire",
        "motion": "drift",
        "emotionalArc": "surge",
        "sections": [
            { "sectionIndex": 0, "description": "low", "mood": "melancholy" },
            { "sectionIndex": 1, "description": "high", "mood": "Euphoric", "typography": "bold-impact" }
        ]
    }))
    .unwrap()
}

#[test]
fn derivation_is_pure_and_fully_populated() {
    let dir = direction();
    for p in [0.0, 0.2, 0.5, 0.77, 1.0] {
        let a = derive_frame_state(&dir, TimePosition::Progress(p));
        let b = derive_frame_state(&dir, TimePosition::Progress(p));
        assert_eq!(a, b);
        assert!(!a.background_system.is_empty());
        assert!(!a.light_source.is_empty());
        assert!(a.palette.iter().all(|c| Rgb::parse_hex(c).is_some()));
        assert!((0.0..=1.0).contains(&a.intensity));
    }
}

#[test]
fn empty_direction_falls_back_to_defaults() {
    let s = derive_frame_state(&CinematicDirection::default(), TimePosition::Progress(0.3));
    assert_eq!(s.mood, DEFAULT_MOOD);
    assert_eq!(s.background_system, tables::DEFAULT_BACKGROUND_SYSTEM);
    assert_eq!(s.palette, FrameRenderState::default().palette);
}

#[test]
fn elapsed_and_progress_agree() {
    let dir = direction();
    let a = derive_frame_state(
        &dir,
        TimePosition::Elapsed {
            elapsed_sec: 30.0,
            duration_sec: 120.0,
        },
    );
    let b = derive_frame_state(&dir, TimePosition::Progress(0.25));
    assert_eq!(a, b);
    assert_eq!(
        TimePosition::Elapsed {
            elapsed_sec: 5.0,
            duration_sec: 0.0
        }
        .progress(),
        0.0
    );
    assert_eq!(TimePosition::Progress(7.0).progress(), 1.0);
}

#[test]
fn chapter_keywords_override_world() {
    let dir = direction();
    let early = derive_frame_state(&dir, TimePosition::Progress(0.1));
    assert_eq!(early.chapter_index, 0);
    assert_eq!(early.mood, "melancholy");
    assert_eq!(early.background_system, "burn");
    assert_eq!(early.light_source, "flickering left");
    assert_eq!(early.palette[0], "#2b1d3a");

    let late = derive_frame_state(&dir, TimePosition::Progress(0.9));
    assert_eq!(late.chapter_index, 1);
    assert_eq!(late.mood, "euphoric");
    assert_eq!(late.typography_profile.font_family, "Oswald");
    assert_eq!(late.grade, *get_mood_grade(Some("euphoric")));
}

#[test]
fn grade_cross_fades_around_boundary() {
    let dir = direction();
    let a = get_mood_grade(Some("melancholy"));
    let b = get_mood_grade(Some("euphoric"));
    let at = |p| derive_frame_state(&dir, TimePosition::Progress(p)).grade;

    assert_eq!(at(0.5 - GRADE_BLEND_WINDOW - 0.01), *a);
    assert_eq!(at(0.5 + GRADE_BLEND_WINDOW + 0.01), *b);
    let mid = at(0.5);
    assert!(mid.brightness > a.brightness && mid.brightness < b.brightness);
    assert_eq!(mid.motion_intent, b.motion_intent);
    assert_eq!(at(0.49).motion_intent, a.motion_intent);
}

#[test]
fn boundary_grade_agrees_with_the_chapter() {
    let dir = direction();
    let s = derive_frame_state(&dir, TimePosition::Progress(0.5));
    let euphoric = get_mood_grade(Some("euphoric"));
    assert_eq!(s.mood, "euphoric");
    assert_eq!(s.chapter_index, 1);
    assert_eq!(s.grade.motion_intent, euphoric.motion_intent);
    assert_eq!(s.grade.layout_mode, euphoric.layout_mode);
    assert_eq!(s.grade.blur.kind, euphoric.blur.kind);
}

#[test]
fn climax_raises_intensity() {
    let dir = direction();
    let climax = dir.climax_ratio();
    let near = derive_frame_state(&dir, TimePosition::Progress(climax)).intensity;
    let far = derive_frame_state(&dir, TimePosition::Progress(climax - 0.1)).intensity;
    assert!(near > far);
}

#[test]
fn safe_manifest_copies_known_fields_only() {
    let merged = safe_manifest(&json!({
        "backgroundSystem": "rain",
        "palette": ["#111111", "#222222", "#333333"],
        "decay": "fast",
        "lightSource": null,
        "somethingElse": 4,
        "intensity": 3.5
    }));
    let s = &merged.state;
    assert_eq!(s.background_system, "rain");
    assert_eq!(s.palette[2], "#333333");
    assert_eq!(s.decay, zero_time_state().decay);
    assert_eq!(s.light_source, zero_time_state().light_source);
    assert_eq!(s.intensity, 1.0);
    assert_eq!(merged.warnings.len(), 2);
    assert!(merged.warnings.iter().any(|w| w.contains("somethingElse")));
    assert!(merged.warnings.iter().any(|w| w.contains("decay")));
}

#[test]
fn safe_manifest_never_fails() {
    let merged = safe_manifest(&json!("garbage"));
    assert_eq!(merged.state, zero_time_state());
    assert_eq!(merged.warnings.len(), 1);

    let merged = safe_manifest(&json!({ "palette": ["#fff", "nope", "#000"] }));
    assert_eq!(merged.state.palette[1], zero_time_state().palette[1]);
    assert_eq!(merged.state.palette[0], "#fff");
}

#[test]
fn build_prefers_persisted_state() {
    let merged = build_from_direction(&json!({
        "frame_state": { "mood": "eerie" },
        "cinematic_direction": { "atmosphere": "rain" }
    }));
    assert_eq!(merged.state.mood, "eerie");
    assert_eq!(merged.state.background_system, zero_time_state().background_system);
}

#[test]
fn build_carries_visual_world_forward() {
    let merged = build_from_direction(&json!({
        "cinematic_direction": {
            "atmosphere": "rain",
            "visualWorld": {
                "palette": ["#010203", "#040506", "#070809"],
                "lightSource": "moonlight",
                "backgroundSystem": "frost"
            }
        }
    }));
    assert!(merged.warnings.is_empty());
    assert_eq!(merged.state.palette[1], "#040506");
    assert_eq!(merged.state.light_source, "moonlight");
    assert_eq!(merged.state.background_system, "frost");

    let fresh = build_from_direction(&json!({ "cinematic_direction": { "atmosphere": "rain" } }));
    assert_eq!(fresh.state.background_system, "rain");
    assert_eq!(fresh.state.light_source, "cold overcast");

    let broken = build_from_direction(&json!({ "cinematic_direction": [1] }));
    assert_eq!(broken.warnings.len(), 1);
}

#[test]
fn empty_manifest_is_the_zero_time_state() {
    let zero = derive_frame_state(&CinematicDirection::default(), TimePosition::Progress(0.0));
    let merged = safe_manifest(&json!({}));
    assert!(merged.warnings.is_empty());
    assert_eq!(merged.state, zero);
    assert_eq!(safe_manifest(&json!(null)).state, zero);
    assert_eq!(build_from_direction(&json!({})).state, zero);
}

#[test]
fn every_legacy_field_is_accepted() {
    let zero = zero_time_state();
    let full = serde_json::to_value(&zero).unwrap();
    for field in LEGACY_FIELDS {
        let merged = safe_manifest(&json!({ field: full[field].clone() }));
        assert!(merged.warnings.is_empty(), "{field}: {:?}", merged.warnings);
        assert_eq!(merged.state, zero);
    }
    let merged = safe_manifest(&json!({ "decay": 0.25, "lyricExit": "drift" }));
    assert_eq!(merged.state.decay, 0.25);
    assert_eq!(merged.state.lyric_exit, "drift");
}
