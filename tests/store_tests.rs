// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Critique store persistence tests.
//!
//! Covers the round-trip contract, legacy bare-string normalization, and the
//! malformed-file failure modes.

use strava_roast::error::AppError;
use strava_roast::store::CritiqueStore;

#[test]
fn test_missing_file_yields_empty_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("activity_critiques.json");

    let store = CritiqueStore::load(&path).expect("load");
    assert!(store.is_empty());
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("activity_critiques.json");

    let mut store = CritiqueStore::default();
    store.upsert("1001", "跑这么慢还好意思开自动点评？");
    store.upsert("1002", "骑行功率不错，就是爬升约等于平地。");
    store.mark_uploaded(
        "1002",
        "骑行功率不错，就是爬升约等于平地。".to_string(),
        "2026-08-06T10:00:00Z".to_string(),
    );
    store.save(&path).expect("save");

    let loaded = CritiqueStore::load(&path).expect("load");
    assert_eq!(loaded, store);

    let entry = loaded.get("1002").expect("entry");
    assert!(entry.uploaded);
    assert_eq!(entry.uploaded_at.as_deref(), Some("2026-08-06T10:00:00Z"));
}

#[test]
fn test_legacy_bare_string_entries_normalize() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("activity_critiques.json");
    std::fs::write(
        &path,
        r#"{
  "2001": "老格式的点评文本",
  "2002": {"critique": "新格式", "uploaded": true}
}"#,
    )
    .expect("write");

    let store = CritiqueStore::load(&path).expect("load");

    let legacy = store.get("2001").expect("legacy entry");
    assert_eq!(legacy.critique, "老格式的点评文本");
    assert!(!legacy.uploaded);

    let modern = store.get("2002").expect("modern entry");
    assert!(modern.uploaded);

    // Normalized form must survive its own round trip.
    store.save(&path).expect("save");
    assert_eq!(CritiqueStore::load(&path).expect("reload"), store);
}

#[test]
fn test_parse_error_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("activity_critiques.json");
    std::fs::write(&path, "{not json").expect("write");

    let err = CritiqueStore::load(&path).expect_err("should fail");
    assert!(matches!(err, AppError::MalformedStore(_)));
}

#[test]
fn test_wrong_top_level_shape_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("activity_critiques.json");
    std::fs::write(&path, r#"["not", "an", "object"]"#).expect("write");

    let err = CritiqueStore::load(&path).expect_err("should fail");
    assert!(matches!(err, AppError::MalformedStore(_)));
}

#[test]
fn test_pending_iterates_in_store_order() {
    let mut store = CritiqueStore::default();
    store.upsert("30", "c");
    store.upsert("10", "a");
    store.upsert("20", "b");
    store.mark_uploaded("20", "b".to_string(), "ts".to_string());

    let pending: Vec<&str> = store.pending().map(|(id, _)| id.as_str()).collect();
    assert_eq!(pending, vec!["10", "30"]);
}
