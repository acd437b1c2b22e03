use super::*;

fn line(start: f64, end: f64, text: &str) -> LyricLine {
    LyricLine {
        start,
        end,
        text: text.to_owned(),
    }
}

fn canvas() -> Canvas {
    Canvas::new(640, 360).unwrap()
}

#[test]
fn active_line_is_half_open() {
    let lines = [line(1.0, 2.0, "a"), line(2.0, 3.5, "b"), line(5.0, 6.0, "c")];
    assert_eq!(active_line(&lines, 0.5), None);
    assert_eq!(active_line(&lines, 1.0).map(|(i, _)| i), Some(0));
    assert_eq!(active_line(&lines, 2.0).map(|(i, _)| i), Some(1));
    assert_eq!(active_line(&lines, 4.0), None);
    assert_eq!(active_line(&lines, 5.5).map(|(_, l)| l.text.as_str()), Some("c"));
    assert_eq!(active_line(&lines, 6.0), None);
    assert_eq!(active_line(&[], 1.0), None);
}

#[test]
fn hooks_ignore_case_and_punctuation() {
    let lines = [
        line(0.0, 1.0, "Hold on, hold on"),
        line(1.0, 2.0, "something else"),
        line(2.0, 3.0, "hold ON hold on!"),
        line(3.0, 4.0, "..."),
        line(4.0, 5.0, "!!!"),
    ];
    assert_eq!(hook_lines(&lines), [true, false, true, false, false]);
}

#[test]
fn appearances_count_earlier_occurrences() {
    let lines = [line(0.0, 1.0, "Fire fire"), line(1.0, 2.0, "walk into FIRE")];
    assert_eq!(word_appearances(&lines), [vec![0u32, 1], vec![0u32, 0, 2]]);
}

#[test]
fn emphasis_grows_font_and_caps() {
    assert_eq!(emphasis_font_size(40.0, 0), 40.0);
    assert!((emphasis_font_size(40.0, 2) - 52.0).abs() < 1e-9);
    assert_eq!(emphasis_font_size(40.0, 9), emphasis_font_size(40.0, 4));
    assert_eq!(emphasis_font_size(40.0, -3), 40.0);
}

#[test]
fn centered_row_is_horizontally_centered() {
    let words = [("one", 20.0), ("two", 20.0)];
    let boxes = layout_words(&words, canvas(), LayoutMode::Centered, 0);
    assert_eq!(boxes.len(), 2);
    let left = boxes[0].origin.x;
    let right = boxes[1].origin.x + boxes[1].width;
    assert!(((left + right) / 2.0 - 320.0).abs() < 1e-9);
    assert_eq!(boxes[0].origin.y, boxes[1].origin.y);
}

#[test]
fn stacked_puts_each_word_on_its_own_row() {
    let words = [("a", 20.0), ("b", 20.0), ("c", 20.0)];
    let boxes = layout_words(&words, canvas(), LayoutMode::Stacked, 0);
    assert!(boxes.windows(2).all(|w| w[1].origin.y > w[0].origin.y));
    let mid = boxes[1].center();
    assert!((mid.y - 180.0).abs() < 1e-9);
}

#[test]
fn long_centered_lines_wrap() {
    let words: Vec<(&str, f64)> = std::iter::repeat_n(("wonderful", 40.0), 8).collect();
    let boxes = layout_words(&words, canvas(), LayoutMode::Centered, 0);
    let rows: std::collections::BTreeSet<i64> =
        boxes.iter().map(|b| b.origin.y.round() as i64).collect();
    assert!(rows.len() > 1);
    assert!(boxes.iter().all(|b| b.origin.x >= 0.0));
}

#[test]
fn scattered_is_stable_and_on_canvas() {
    let words = [("stay", 30.0), ("here", 30.0), ("now", 30.0)];
    let a = layout_words(&words, canvas(), LayoutMode::Scattered, 7);
    let b = layout_words(&words, canvas(), LayoutMode::Scattered, 7);
    assert_eq!(a, b);
    for w in &a {
        assert!(w.origin.x >= 0.0 && w.origin.x + w.width <= 640.0);
        assert!(w.origin.y >= 0.0 && w.origin.y + w.font_size * LINE_HEIGHT <= 360.0);
    }
}
