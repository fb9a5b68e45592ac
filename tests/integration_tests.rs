// Integration tests for geoscene-core using test fixtures
use futures::executor::block_on;
use geoscene_core::ast::{CameraKind, Projection};
use geoscene_core::error::{FormatError, GeoError, ParseWarning};
use geoscene_core::projection::{GlProjection, ProjectionBuilder};
use geoscene_core::resolver::FsFetcher;
use geoscene_core::{load_scene, parse_cast, parse_scene};
use std::fs;
use std::path::PathBuf;

fn get_test_file_path(subdir: &str, filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(subdir)
        .join(filename)
}

fn read_test_file(subdir: &str, filename: &str) -> String {
    let path = get_test_file_path(subdir, filename);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read test file: {:?}", path))
}

// Documents that should parse successfully
mod ok_tests {
    use super::*;

    #[test]
    fn test_oldest_revision_cast() {
        let source = read_test_file("ok", "cams/left0002.geocast");
        let parsed = parse_cast(&source, "left0002.geocast").unwrap();
        assert!(parsed.warnings.is_empty());
        let camera = parsed.value;
        assert_eq!(camera.format_version, "1.0");
        assert_eq!(camera.camera_kind, CameraKind::Dynamic);
        assert_eq!(camera.position, [2.0, 0.0, 10.0]);
        assert_eq!(camera.modelview_matrix[3], -2.0);
        assert_eq!(camera.depth_range, Some([0.1, 500.0]));
        assert!(!camera.world_space_depth);
        assert!(camera.lens_distortion.is_none());
    }

    #[test]
    fn test_newest_revision_cast() {
        let source = read_test_file("ok", "cams/right.geocast");
        let camera = parse_cast(&source, "right.geocast").unwrap().value;
        assert_eq!(camera.camera_kind, CameraKind::Static);
        assert_eq!(camera.position, [-4.0, 0.0, 10.0]);
        assert!(camera.world_space_depth);
        assert_eq!(camera.depth_range, Some([0.1, 500.0]));
        let lens = camera.lens_distortion.expect("ImageWarp should be read");
        assert_eq!(lens.k1, -0.12);
        assert_eq!(lens.focal, 1400.0);
        let expected = GlProjection.perspective(50f64.to_radians(), 1.7777, 0.1, 500.0);
        assert_eq!(camera.projection.matrix(), Some(&expected));
    }

    #[test]
    fn test_middle_revision_cast_keeps_unknown_lines_as_warnings() {
        let source = read_test_file("ok", "cams/floor.geocast");
        let parsed = parse_cast(&source, "floor.geocast").unwrap();
        assert_eq!(parsed.warnings.len(), 1);
        assert!(matches!(
            &parsed.warnings[0],
            ParseWarning::UnrecognizedLine { text, .. } if text == "SensorTemperature 21.5"
        ));
        match parsed.value.projection {
            Projection::Ortho { matrix, .. } => {
                assert_eq!(matrix, GlProjection.ortho(-10.0, 10.0, -10.0, 10.0, 0.0, 40.0));
            }
            other => panic!("expected an ortho projection, got {other:?}"),
        }
    }

    #[test]
    fn test_rig_scene_skeleton() {
        let source = read_test_file("ok", "rig.geoscene");
        let parsed = parse_scene(&source, "ok/rig.geoscene").unwrap();
        assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);
        let scene = parsed.value;
        assert_eq!(scene.format_version, "2.1");
        assert_eq!(scene.frame_range, (1, 3));
        assert_eq!(scene.data_format, "png");
        assert_eq!(scene.cast_collection.len(), 2);
        assert_eq!(scene.depth_cast_collection.len(), 1);
        assert_eq!(scene.match_groups.len(), 2);
        for entry in scene.cast_collection.iter().chain(&scene.depth_cast_collection) {
            assert_eq!(entry.image_paths.len(), 3);
            assert_eq!(entry.camera_slots.len(), 3);
        }
        assert_eq!(
            scene.cast_collection[0].camera_slots[2].path(),
            "ok/cams/left0003.geocast"
        );
        assert!(scene.to_json().is_ok());
    }

    #[test]
    fn test_rig_scene_loads_from_disk() {
        let path = get_test_file_path("ok", "rig.geoscene");
        let loaded = block_on(load_scene(path.to_str().unwrap(), FsFetcher)).unwrap();
        assert!(loaded.report.is_clean(), "{:?}", loaded.report.failures);
        assert_eq!(loaded.report.resolved(), 9);
        assert!(loaded.scene.is_complete());
        // floor.geocast carries one unknown line and is read once for all frames
        assert_eq!(loaded.report.warnings.len(), 1);
        assert!(loaded.report.warnings[0].0.ends_with("cams/floor.geocast"));

        let scene = &loaded.scene;
        for frame in 1..=3 {
            let left = scene.camera_at("left", frame).unwrap();
            assert_eq!(left.position[0], frame as f64);
            let right = scene.camera_at("right", frame).unwrap();
            assert_eq!(right.position, [-4.0, 0.0, 10.0]);
        }
        let group = &scene.match_groups[0];
        assert_eq!(group.cameras(scene).count(), 2);
        assert_eq!(group.surfaces(scene).count(), 1);
    }
}

// Documents that should be rejected
mod err_tests {
    use super::*;

    fn cast_err(filename: &str) -> FormatError {
        let source = read_test_file("err", filename);
        match parse_cast(&source, filename) {
            Err(GeoError::Format(err)) => err,
            other => panic!("expected a format error for {filename}, got {other:?}"),
        }
    }

    fn scene_err(filename: &str) -> FormatError {
        let source = read_test_file("err", filename);
        match parse_scene(&source, filename) {
            Err(GeoError::Format(err)) => err,
            other => panic!("expected a format error for {filename}, got {other:?}"),
        }
    }

    #[test]
    fn test_not_a_geocast() {
        assert!(matches!(
            cast_err("not_a_geocast.geocast"),
            FormatError::BadSignature { line: 1, .. }
        ));
    }

    #[test]
    fn test_missing_version() {
        assert!(matches!(
            cast_err("missing_version.geocast"),
            FormatError::BadSignature { .. }
        ));
    }

    #[test]
    fn test_bad_view_slice() {
        assert!(matches!(
            cast_err("bad_view_slice.geocast"),
            FormatError::UnrecognizedTag { ref found, .. } if found == "FieldOfDepth"
        ));
    }

    #[test]
    fn test_truncated_matrix() {
        assert!(matches!(
            cast_err("truncated_matrix.geocast"),
            FormatError::UnexpectedEof { .. }
        ));
    }

    #[test]
    fn test_reversed_sequence() {
        assert!(matches!(
            scene_err("reversed_sequence.geoscene"),
            FormatError::InvalidSequence { start: 10, end: 2, line: 2, .. }
        ));
    }

    #[test]
    fn test_bad_cast_size() {
        assert!(matches!(
            scene_err("bad_cast_size.geoscene"),
            FormatError::InvalidNumber { ref found, .. } if found == "wide"
        ));
    }
}
