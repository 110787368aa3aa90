mod common;

use common::{solid, textured_scene};
use locate_cli::{LocateOutcome, Locator, LocatorConfig};

#[test]
fn test_identical_images_locate_themselves() {
    let scene = textured_scene(200, 160, 7);
    let (mut object, mut scene) = (scene.clone(), scene);
    let locator = Locator::from_config(LocatorConfig::default()).unwrap();

    let outcome = locator.locate(&mut object, &mut scene).unwrap();
    let LocateOutcome::Located { report, result } = outcome else {
        panic!("expected a localization, got {:?}", outcome.report());
    };

    assert!(report.accepted > 10, "only {} accepted", report.accepted);
    assert!(report.accepted <= 21);
    assert_eq!(report.object_keypoints, report.scene_keypoints);
    assert_eq!(report.distance_range.min, 0.0);

    let expected = [(0.0, 0.0), (200.0, 0.0), (200.0, 160.0), (0.0, 160.0)];
    for (c, (ex, ey)) in result.localization.scene_corners.iter().zip(expected) {
        assert!((c.x - ex).abs() < 1.0 && (c.y - ey).abs() < 1.0, "corner {:?} vs ({}, {})", c, ex, ey);
    }
    let h = result.localization.homography.to_array();
    for (i, row) in h.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            let ident = if i == j { 1.0 } else { 0.0 };
            let tol = if j == 2 && i < 2 { 0.5 } else { 1e-2 };
            assert!((v - ident).abs() < tol, "h[{}][{}] = {}", i, j, v);
        }
    }
}

#[test]
fn test_cropped_object_found_at_its_offset() {
    let scene = textured_scene(320, 240, 11);
    let (ox, oy, ow, oh) = (60u32, 45u32, 200u32, 150u32);
    let mut object = image::imageops::crop_imm(&scene, ox, oy, ow, oh).to_image();
    let mut scene = scene;

    let locator = Locator::from_config(LocatorConfig::default()).unwrap();
    let outcome = locator.locate(&mut object, &mut scene).unwrap();
    let LocateOutcome::Located { result, .. } = outcome else {
        panic!("expected a localization, got {:?}", outcome.report());
    };

    let (ox, oy, ow, oh) = (ox as f64, oy as f64, ow as f64, oh as f64);
    let expected = [(ox, oy), (ox + ow, oy), (ox + ow, oy + oh), (ox, oy + oh)];
    for (c, (ex, ey)) in result.localization.scene_corners.iter().zip(expected) {
        assert!((c.x - ex).abs() < 3.0 && (c.y - ey).abs() < 3.0, "corner {:?} vs ({}, {})", c, ex, ey);
    }
}

#[test]
fn test_unrelated_solid_images_exit_softly() {
    let mut object = solid(64, 48, [255, 0, 0]);
    let mut scene = solid(320, 240, [0, 0, 255]);
    let locator = Locator::from_config(LocatorConfig::default()).unwrap();

    let mut stages = Vec::new();
    let outcome = locator
        .locate_with_progress(&mut object, &mut scene, |s| stages.push(s))
        .unwrap();
    assert!(matches!(outcome, LocateOutcome::NotEnoughMatches { .. }));
    assert!(outcome.report().accepted <= 10);
    assert!(stages.is_empty());
}
