use super::*;

#[test]
fn parses_partial_map_and_keeps_extra_fields() {
    let json = r#"{
      "frame_000.png": {"center_x": 510, "center_y": 520, "feet_y": 935, "head_y": 80,
                        "note": "torso", "confidence": 0.9},
      "frame_002.png": {"center_x": 512.5, "center_y": 518, "feet_y": 930, "head_y": 84}
    }"#;
    let map = AnchorMap::from_json_str(json).unwrap();
    assert_eq!(map.len(), 2);

    let a = map.get("frame_000.png").unwrap();
    assert_eq!((a.center_x, a.center_y), (510.0, 520.0));
    assert_eq!(a.extra.get("note"), Some(&serde_json::json!("torso")));
    assert!(map.get("frame_001.png").is_none());
    assert_eq!(map.get("frame_002.png").unwrap().center_x, 512.5);
}

#[test]
fn rejects_missing_required_coordinate() {
    let json = r#"{"frame_000.png": {"center_x": 1, "center_y": 2, "feet_y": 3}}"#;
    let err = AnchorMap::from_json_str(json).unwrap_err();
    assert!(matches!(err, StickerError::Serde(_)));
}

#[test]
fn missing_file_is_an_error() {
    let err = AnchorMap::from_path(Path::new("definitely/not/here.json")).unwrap_err();
    assert!(err.to_string().contains("read anchor file"));
}
