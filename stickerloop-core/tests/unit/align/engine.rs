use super::*;
use crate::align::strategy::{
    AlignRequest, AnchorFileStrategy, BboxStrategy, BottomAnchorStrategy, VerticalAnchor,
    resolve_strategy,
};
use crate::model::anchor::{AnchorMap, AnchorPoint};
use image::Rgba;

fn geom(index: usize, bbox: BoundingBox) -> FrameGeometry {
    let (cx, cy) = bbox.center();
    FrameGeometry {
        index,
        key: format!("frame_{index:03}.png"),
        width: 128,
        height: 128,
        bbox,
        centroid: (cx, cy),
        pixel_anchor: AnchorPoint::new(cx, cy, f64::from(bbox.y2), f64::from(bbox.y1)),
    }
}

fn bbox(x1: u32, y1: u32, x2: u32, y2: u32) -> BoundingBox {
    BoundingBox::new(x1, y1, x2, y2).unwrap()
}

fn assert_fits(plan: &AlignPlan) {
    for p in &plan.placements {
        let (x1, y1, x2, y2) = p.bbox.translated(p.offset);
        assert!(x1 >= 0 && y1 >= 0, "{p}");
        assert!(x2 <= i64::from(plan.canvas.width), "{p}");
        assert!(y2 <= i64::from(plan.canvas.height), "{p}");
        assert!(!p.clipped);
    }
}

#[test]
fn bbox_mode_canvas_is_max_extent_and_centers_match() {
    let geoms = vec![
        geom(0, bbox(10, 10, 50, 70)),
        geom(1, bbox(33, 5, 64, 80)),
        geom(2, bbox(0, 40, 45, 91)),
    ];
    let plan = plan_alignment(&geoms, &BboxStrategy, &AlignOptions::default()).unwrap();
    assert_eq!(plan.mode, AlignMode::Bbox);
    assert_eq!(plan.canvas.width, 45);
    assert_eq!(plan.canvas.height, 75);
    assert_fits(&plan);

    for p in &plan.placements {
        let (x1, y1, x2, y2) = p.bbox.translated(p.offset);
        let cx = (x1 + x2) as f64 / 2.0;
        let cy = (y1 + y2) as f64 / 2.0;
        assert!((cx - plan.canvas.center_x).abs() <= 1.0, "{p}");
        assert!((cy - plan.canvas.center_y).abs() <= 1.0, "{p}");
    }
}

#[test]
fn anchor_mode_equal_center_y_gives_equal_dy() {
    let geoms = vec![
        geom(0, bbox(20, 10, 60, 90)),
        geom(1, bbox(25, 30, 55, 50)),
        geom(2, bbox(18, 12, 70, 60)),
    ];
    let mut map = AnchorMap::new();
    for g in &geoms {
        map.insert(g.key.clone(), AnchorPoint::new(40.0, 44.0, 90.0, 10.0));
    }
    let strategy = AnchorFileStrategy {
        anchors: &map,
        vertical: VerticalAnchor::Center,
    };
    let plan = plan_alignment(&geoms, &strategy, &AlignOptions::default()).unwrap();
    let dy = plan.placements[0].offset.dy;
    assert!(plan.placements.iter().all(|p| p.offset.dy == dy));
    assert!(plan.placements.iter().all(|p| p.mode == AlignMode::AnchorFile));
    assert_fits(&plan);
}

#[test]
fn anchor_miss_degrades_only_that_frame() {
    let geoms = vec![geom(0, bbox(20, 10, 60, 90)), geom(1, bbox(25, 30, 55, 50))];
    let mut map = AnchorMap::new();
    map.insert("frame_000.png", AnchorPoint::new(40.0, 30.0, 90.0, 10.0));
    let strategy = AnchorFileStrategy {
        anchors: &map,
        vertical: VerticalAnchor::Center,
    };
    let plan = plan_alignment(&geoms, &strategy, &AlignOptions::default()).unwrap();
    assert_eq!(plan.mode, AlignMode::AnchorFile);
    assert_eq!(plan.placements[0].mode, AlignMode::AnchorFile);
    assert_eq!(plan.placements[1].mode, AlignMode::Bbox);
    assert_fits(&plan);
}

#[test]
fn bottom_mode_lands_every_bbox_bottom_on_the_same_row() {
    let geoms = vec![
        geom(0, bbox(10, 40, 30, 60)),
        geom(1, bbox(12, 10, 40, 70)),
        geom(2, bbox(8, 55, 28, 100)),
    ];
    let plan = plan_alignment(&geoms, &BottomAnchorStrategy, &AlignOptions::default()).unwrap();
    assert_eq!(plan.canvas.height, 60);
    assert_eq!(plan.canvas.pin_y, Some(60.0));
    for p in &plan.placements {
        let (_, _, _, y2) = p.bbox.translated(p.offset);
        assert_eq!(y2, 60);
    }
    assert_fits(&plan);
}

#[test]
fn forced_canvas_clips_oversized_frames() {
    let geoms = vec![geom(0, bbox(0, 0, 80, 40)), geom(1, bbox(0, 0, 20, 20))];
    let opts = AlignOptions {
        canvas_width: Some(50),
        canvas_height: Some(50),
        ..AlignOptions::default()
    };
    let plan = plan_alignment(&geoms, &BboxStrategy, &opts).unwrap();
    assert_eq!((plan.canvas.width, plan.canvas.height), (50, 50));
    assert!(plan.placements[0].clipped);
    assert!(!plan.placements[1].clipped);
}

#[test]
fn empty_and_zero_sized_inputs_are_rejected() {
    assert!(plan_alignment(&[], &BboxStrategy, &AlignOptions::default()).is_err());
    let opts = AlignOptions {
        canvas_width: Some(0),
        ..AlignOptions::default()
    };
    assert!(plan_alignment(&[geom(0, bbox(0, 0, 4, 4))], &BboxStrategy, &opts).is_err());
}

#[test]
fn align_frames_composites_onto_shared_canvas() {
    let mut frames = Vec::new();
    for (i, (x, y, w, h)) in [(2u32, 3u32, 10u32, 12u32), (20, 8, 14, 6)].into_iter().enumerate() {
        let mut img = RgbaImage::new(48, 32);
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, Rgba([10, 200, 30, 255]));
            }
        }
        // Sub-threshold noise outside the subject.
        img.put_pixel(47, 31, Rgba([255, 255, 255, 4]));
        frames.push(Frame::new(i, format!("frame_{i:03}.png"), img));
    }

    let out = align_frames(&frames, &AlignOptions::default()).unwrap();
    assert_eq!((out.plan.canvas.width, out.plan.canvas.height), (14, 12));
    assert_eq!(out.frames.len(), 2);
    for (frame, placement) in out.frames.iter().zip(&out.plan.placements) {
        assert_eq!(frame.image.dimensions(), (14, 12));
        assert_eq!(frame.key, placement.key);
        let opaque = frame.image.pixels().filter(|p| p[3] == 255).count() as u32;
        let expected = placement.bbox.width() * placement.bbox.height();
        assert_eq!(opaque, expected);
        assert!(frame.image.pixels().all(|p| p[3] == 0 || p[3] == 255));
    }
}

#[test]
fn placement_display_is_a_diagnostic_line() {
    let geoms = vec![geom(0, bbox(1, 2, 5, 6))];
    let plan = plan_alignment(&geoms, &BboxStrategy, &AlignOptions::default()).unwrap();
    let line = plan.placements[0].to_string();
    assert!(line.starts_with("frame_000.png: mode=bbox bbox=(1,2,5,6) paste="));
}

#[test]
fn bbox_mode_vertical_anchor_pins_shared_edge() {
    let geoms = vec![
        geom(0, bbox(10, 10, 40, 50)),
        geom(1, bbox(10, 20, 40, 80)),
        geom(2, bbox(10, 5, 40, 25)),
    ];

    let bottom = AlignRequest {
        vertical: VerticalAnchor::Bottom,
        ..AlignRequest::default()
    };
    let plan =
        plan_alignment(&geoms, resolve_strategy(&bottom).as_ref(), &AlignOptions::default())
            .unwrap();
    assert_eq!(plan.mode, AlignMode::Bottom);
    assert_fits(&plan);
    let bottoms: Vec<i64> = plan
        .placements
        .iter()
        .map(|p| p.bbox.translated(p.offset).3)
        .collect();
    assert_eq!(bottoms, [60, 60, 60]);

    let top = AlignRequest {
        vertical: VerticalAnchor::Top,
        ..AlignRequest::default()
    };
    let plan =
        plan_alignment(&geoms, resolve_strategy(&top).as_ref(), &AlignOptions::default()).unwrap();
    assert_eq!(plan.mode, AlignMode::Bbox);
    assert_fits(&plan);
    let tops: Vec<i64> = plan
        .placements
        .iter()
        .map(|p| p.bbox.translated(p.offset).1)
        .collect();
    assert_eq!(tops, [0, 0, 0]);
    assert_eq!(plan.canvas.height, 60);
}
