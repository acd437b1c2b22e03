use super::*;

fn input(t: f64, beat: f64) -> KineticInput {
    KineticInput {
        current_time: t,
        beat_intensity: beat,
        word_index: 2,
        appearance_count: 0,
        font_size: 40.0,
        word_width: 120.0,
        speed_multiplier: 1.0,
    }
}

#[test]
fn tags_parse_case_insensitively_with_aliases() {
    assert_eq!(KineticClass::from_tag(Some("falling")), KineticClass::Falling);
    assert_eq!(KineticClass::from_tag(Some("SINKING")), KineticClass::Falling);
    assert_eq!(KineticClass::from_tag(Some("Drifting")), KineticClass::Floating);
    assert_eq!(KineticClass::from_tag(Some(" shaking ")), KineticClass::Shaking);
    assert_eq!(KineticClass::from_tag(Some("TELEPORTING")), KineticClass::None);
    assert_eq!(KineticClass::from_tag(None), KineticClass::None);
}

#[test]
fn unknown_class_is_identity() {
    let fx = apply_kinetic(KineticClass::None, &input(3.2, 1.0));
    assert_eq!(fx, KineticEffect::default());
    assert_eq!(fx.transform_about(Point::new(50.0, 50.0)), Affine::IDENTITY);
}

#[test]
fn effects_are_pure_functions_of_their_input() {
    let all = [
        KineticClass::Falling,
        KineticClass::Running,
        KineticClass::Floating,
        KineticClass::Submerging,
        KineticClass::Enveloping,
        KineticClass::Shaking,
        KineticClass::Rising,
        KineticClass::Hiding,
        KineticClass::Static,
    ];
    for class in all {
        let a = apply_kinetic(class, &input(1.37, 0.8));
        let b = apply_kinetic(class, &input(1.37, 0.8));
        assert_eq!(a, b, "{class:?}");
        assert!((0.0..=1.0).contains(&a.opacity), "{class:?}");
    }
}

#[test]
fn shaking_jitter_scales_with_beat() {
    let calm = apply_kinetic(KineticClass::Shaking, &input(2.0, 0.0));
    let loud = apply_kinetic(KineticClass::Shaking, &input(2.0, 1.0));
    // Same tick and word: identical random draws, different magnitude.
    assert!((loud.offset.x - calm.offset.x * 4.0).abs() < 1e-9);
    assert!(calm.offset.x.abs() <= 2.0 && calm.offset.y.abs() <= 2.0);
    assert_eq!(calm.channel_split, None);
    assert_eq!(loud.channel_split, Some(6.0));
}

#[test]
fn shaking_changes_between_ticks() {
    let a = apply_kinetic(KineticClass::Shaking, &input(2.0, 0.5));
    let b = apply_kinetic(KineticClass::Shaking, &input(2.0 + 1.0 / 30.0 + 1e-6, 0.5));
    assert_ne!(a.offset, b.offset);
}

#[test]
fn running_leaves_fading_ghosts_behind() {
    let fx = apply_kinetic(KineticClass::Running, &input(0.5, 0.0));
    assert_eq!(fx.ghosts.len(), 3);
    assert!(fx.ghosts.windows(2).all(|w| w[0].opacity > w[1].opacity));
    assert!(fx.ghosts.iter().all(|g| g.offset.x < 0.0));
    assert!(fx.scale.x > 1.0 && fx.scale.y < 1.0);
}

#[test]
fn falling_cycles_downward() {
    let fx = apply_kinetic(KineticClass::Falling, &input(0.9, 0.0));
    assert!(fx.offset.y >= 0.0 && fx.offset.y < 40.0 * 0.8);
    assert!(!fx.ghosts.is_empty());
}

#[test]
fn hiding_fades_with_repeat_appearances() {
    let first = apply_kinetic(KineticClass::Hiding, &input(1.0, 0.0));
    let later = apply_kinetic(
        KineticClass::Hiding,
        &KineticInput {
            appearance_count: 4,
            ..input(1.0, 0.0)
        },
    );
    assert!(later.opacity < first.opacity);
    assert!(later.opacity >= 0.15);
}

#[test]
fn speed_multiplier_zero_freezes_oscillation() {
    let frozen = |t| {
        apply_kinetic(
            KineticClass::Floating,
            &KineticInput {
                speed_multiplier: 0.0,
                ..input(t, 0.0)
            },
        )
    };
    assert_eq!(frozen(0.0), frozen(10.0));
}

#[test]
fn transform_about_keeps_center_fixed_without_offset() {
    let fx = KineticEffect {
        scale: Vec2::new(2.0, 2.0),
        rotation: 0.3,
        ..KineticEffect::default()
    };
    let c = Point::new(100.0, 60.0);
    let mapped = fx.transform_about(c) * c;
    assert!((mapped - c).hypot() < 1e-9);
}
