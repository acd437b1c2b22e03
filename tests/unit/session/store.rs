use super::*;
use crate::foundation::error::LyricDanceError;

fn sig(bpm: f64) -> SongSignature {
    SongSignature {
        bpm,
        ..SongSignature::default()
    }
}

#[test]
fn computes_once_per_key() {
    let mut store = AnalysisStore::default();
    let mut calls = 0;
    for _ in 0..3 {
        let s = store
            .get_or_compute("song.mp3", || {
                calls += 1;
                Ok(sig(120.0))
            })
            .unwrap();
        assert_eq!(s.bpm, 120.0);
    }
    assert_eq!(calls, 1);
    assert_eq!(store.stats(), (2, 1));
}

#[test]
fn errors_are_not_cached() {
    let mut store = AnalysisStore::default();
    let err = store.get_or_compute("bad", || Err(LyricDanceError::analysis("empty signal")));
    assert!(err.is_err());
    assert!(!store.contains("bad"));
    let ok = store.get_or_compute("bad", || Ok(sig(90.0))).unwrap();
    assert_eq!(ok.bpm, 90.0);
}

#[test]
fn least_recently_used_entry_is_evicted() {
    let mut store = AnalysisStore::new(2);
    store.insert("a", sig(1.0));
    store.insert("b", sig(2.0));
    assert!(store.get("a").is_some());
    store.insert("c", sig(3.0));
    assert!(store.contains("a"));
    assert!(!store.contains("b"));
    assert!(store.contains("c"));
    assert_eq!(store.len(), 2);
}

#[test]
fn clear_empties_the_store() {
    let mut store = AnalysisStore::new(0);
    store.insert("a", sig(1.0));
    store.insert("b", sig(2.0));
    assert_eq!(store.len(), 1);
    store.get_or_compute("b", || Ok(sig(0.0))).unwrap();
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.stats(), (0, 0));
    assert!(store.get("b").is_none());
}
