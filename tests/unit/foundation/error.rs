use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LyricDanceError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        LyricDanceError::analysis("x")
            .to_string()
            .contains("analysis error:")
    );
    assert!(
        LyricDanceError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        LyricDanceError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LyricDanceError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let err: LyricDanceError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, LyricDanceError::Serde(_)));
}
