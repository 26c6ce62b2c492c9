// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the reconstruction pipeline

use depth_cloud::reconstruction::{
    ColorDepthLookup, NormalParams, assemble_point_cloud, back_project, estimate_normals,
};
use depth_cloud::{
    Calibration, ColorCalibration, Colorizer, Config, DepthRaster, Extrinsics, Intrinsics,
    Reconstructor, TexCoord,
};

fn calibration_4x4() -> Calibration {
    Calibration::depth_only(Intrinsics::new(4, 4, 500.0, 500.0, 2.0, 2.0))
}

#[test]
fn test_constant_raster_point_cloud() {
    let depth = [1000u16; 16];
    let raster = DepthRaster::new(&depth, 4, 4, 1.0).unwrap();
    let cloud = Reconstructor::new(Config::default(), calibration_4x4())
        .point_cloud(&raster)
        .unwrap();

    assert_eq!(cloud.size(), 16);
    assert_eq!(cloud.valid_count(), 16);

    // Pixel (u=2, v=2)
    let center = cloud.points[2 * 4 + 2];
    assert!(center.x.abs() < 1e-4);
    assert!(center.y.abs() < 1e-4);
    assert!((center.z - 1000.0).abs() < 1e-4);
}

#[test]
fn test_back_projection_round_trip() {
    let depth: Vec<u16> = (0..48).map(|i| 800 + (i * 37 % 400) as u16).collect();
    let raster = DepthRaster::new(&depth, 8, 6, 1.0).unwrap();
    let k = Intrinsics::new(8, 6, 520.0, 515.0, 3.7, 2.9);
    let points = back_project(&raster, &k);

    for (i, p) in points.iter().enumerate() {
        let (u, v) = k.project(*p).unwrap();
        assert!((u - (i % 8) as f32).abs() < 1e-3);
        assert!((v - (i / 8) as f32).abs() < 1e-3);
    }
}

#[test]
fn test_valid_count_never_exceeds_size() {
    let mut depth = [1200u16; 36];
    for i in [0, 7, 14, 21, 35] {
        depth[i] = 0;
    }
    let raster = DepthRaster::new(&depth, 6, 6, 1.0).unwrap();

    for remove_invalid in [false, true] {
        let config = Config {
            remove_invalid,
            ..Config::default()
        };
        let calibration = Calibration::depth_only(Intrinsics::new(6, 6, 500.0, 500.0, 3.0, 3.0));
        let cloud = Reconstructor::new(config, calibration)
            .point_cloud(&raster)
            .unwrap();
        assert!(cloud.valid_count() <= cloud.size());
        assert_eq!(cloud.valid_count(), 31);
        if remove_invalid {
            assert_eq!(cloud.size(), 31);
        } else {
            assert_eq!(cloud.size(), 36);
        }
    }
}

#[test]
fn test_normals_unit_or_zero() {
    let mut depth = [1000u16; 64];
    depth[27] = 0;
    // Depth step on the right edge
    for row in 0..8 {
        depth[row * 8 + 7] = 1400;
    }
    let raster = DepthRaster::new(&depth, 8, 8, 1.0).unwrap();
    let k = Intrinsics::new(8, 8, 500.0, 500.0, 4.0, 4.0);
    let points = back_project(&raster, &k);
    let normals = estimate_normals(&points, 8, 8, &NormalParams::default());

    for (p, n) in points.iter().zip(&normals) {
        let len = n.length();
        assert!(
            len == 0.0 || (len - 1.0).abs() < 1e-4,
            "normal length {} at {:?}",
            len,
            p
        );
        if p.z <= 0.1 {
            assert!(n.is_zero());
        }
    }
}

#[test]
fn test_mesh_faces_respect_threshold() {
    let depth: Vec<u16> = (0..100)
        .map(|i| if (i % 10) < 5 { 1000 } else { 1100 })
        .collect();
    let raster = DepthRaster::new(&depth, 10, 10, 1.0).unwrap();
    let calibration = Calibration::depth_only(Intrinsics::new(10, 10, 500.0, 500.0, 5.0, 5.0));
    let mesh = Reconstructor::new(Config::default(), calibration)
        .mesh(&raster)
        .unwrap();

    assert!(mesh.face_count() > 0);
    for face in &mesh.faces {
        let z: Vec<f32> = face
            .iter()
            .map(|&i| mesh.cloud.points[i as usize].z)
            .collect();
        assert!((z[0] - z[1]).abs() <= 10.0);
        assert!((z[1] - z[2]).abs() <= 10.0);
        assert!((z[0] - z[2]).abs() <= 10.0);
    }
}

#[test]
fn test_color_lookup_resolves_depth_pixels() {
    let depth = [1000u16; 16];
    let raster = DepthRaster::new(&depth, 4, 4, 1.0).unwrap();
    let k = Intrinsics::new(4, 4, 500.0, 500.0, 2.0, 2.0);
    let points = back_project(&raster, &k);
    let normals = estimate_normals(&points, 4, 4, &NormalParams::default());

    // Color camera identical to the depth camera at twice the resolution
    let color = ColorCalibration {
        intrinsics: Intrinsics::new(8, 8, 1000.0, 1000.0, 4.0, 4.0),
        extrinsics: Extrinsics::identity(),
    };
    let cloud = assemble_point_cloud(&points, &normals, 4, 4, Some(&color), false);
    let lookup = ColorDepthLookup::build(&cloud, 4, 4).unwrap();

    // Color pixel (4,4) sees depth pixel (2,2)
    assert_eq!(lookup.resolve(4.0, 4.0, 8, 8), Some((2, 2)));
    assert_eq!(lookup.resolve(-5000.0, -5000.0, 8, 8), None);
    assert_eq!(lookup.resolve(8.0, 8.0, 8, 8), None);

    // Depth pixel (0,0) lands on color pixel (0,0); only the calibrated
    // lookup can index it, the other falls back to a neighbor
    assert_eq!(cloud.tex_coords[0], TexCoord::ZERO);
    assert_eq!(lookup.resolve(0.0, 0.0, 8, 8), Some((1, 0)));
    let calibrated = ColorDepthLookup::build_with_calibration(&cloud, &color, 4, 4).unwrap();
    assert_eq!(calibrated.resolve(0.0, 0.0, 8, 8), Some((0, 0)));
    assert_eq!(calibrated.resolve(4.0, 4.0, 8, 8), Some((2, 2)));
}

#[test]
fn test_lookup_rejects_compacted_cloud() {
    let depth = [0u16, 1000, 1000, 0];
    let raster = DepthRaster::new(&depth, 2, 2, 1.0).unwrap();
    let k = Intrinsics::new(2, 2, 500.0, 500.0, 1.0, 1.0);
    let points = back_project(&raster, &k);
    let normals = estimate_normals(&points, 2, 2, &NormalParams::default());
    let cloud = assemble_point_cloud(&points, &normals, 2, 2, None, true);

    assert!(ColorDepthLookup::build(&cloud, 2, 2).is_err());
}

#[test]
fn test_colorizer_reference_values() {
    let colorizer = Colorizer::default();
    let out = colorizer.process(&[0u16, 2500, 5000], 1.0);
    assert_eq!(out[0], [0, 0, 0]);
    assert_eq!(out[1], [255, 255, 0]);
    assert_eq!(out[2], [50, 0, 0]);
}
