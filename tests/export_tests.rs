// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for geometry export

use depth_cloud::export::{
    ExportOptions, Geometry, OwnedGeometry, Texture, export_to_file, export_to_file_async,
};
use depth_cloud::reconstruction::{
    Mesh, NormalParams, PointCloud, assemble_mesh_default, back_project, estimate_normals,
};
use depth_cloud::{DepthRaster, ExportError, Intrinsics, Point3, TexCoord};
use std::path::PathBuf;

fn temp_path(ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("depth_cloud_export_{}.{}", uuid::Uuid::new_v4(), ext))
}

/// One valid point (1,2,3) and one invalid point
fn two_point_cloud() -> PointCloud {
    let mut cloud = PointCloud::with_capacity(2, 1, 2);
    cloud.push(
        Point3::new(1.0, 2.0, 3.0),
        Point3::new(0.0, 0.0, -1.0),
        TexCoord::new(0.25, 0.5),
    );
    cloud.push(Point3::ZERO, Point3::ZERO, TexCoord::ZERO);
    cloud
}

fn flat_mesh() -> Mesh {
    let depth = [1000u16; 9];
    let raster = DepthRaster::new(&depth, 3, 3, 1.0).unwrap();
    let k = Intrinsics::new(3, 3, 500.0, 500.0, 1.5, 1.5);
    let points = back_project(&raster, &k);
    let normals = estimate_normals(&points, 3, 3, &NormalParams::default());
    assemble_mesh_default(&points, &normals, 3, 3, None, false)
}

fn gray_texture() -> Texture {
    Texture::new(vec![128; 4 * 4 * 3], 4, 4).unwrap()
}

fn header_lines(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .take_while(|l| *l != "end_header")
        .collect()
}

#[test]
fn test_csv_skips_invalid_points() {
    let path = temp_path("csv");
    export_to_file(&path, &two_point_cloud(), None, &ExportOptions::default()).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(contents, "1.000000,2.000000,3.000000\n");
}

#[test]
fn test_ascii_ply_emits_all_vertices() {
    let path = temp_path("ply");
    export_to_file(&path, &two_point_cloud(), None, &ExportOptions::default()).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let header = header_lines(&contents);
    assert_eq!(header[0], "ply");
    assert_eq!(header[1], "format ascii 1.0");
    assert!(header.contains(&"element vertex 2"));
    assert!(header.contains(&"property float nz"));
    assert!(!header.iter().any(|l| l.contains("red")));
    assert!(!header.iter().any(|l| l.starts_with("element face")));

    let body: Vec<&str> = contents
        .lines()
        .skip_while(|l| *l != "end_header")
        .skip(1)
        .collect();
    assert_eq!(body, vec!["1 2 3 0 0 -1", "0 0 0 0 0 0"]);
}

#[test]
fn test_ply_vertex_color_from_texture() {
    let path = temp_path("ply");
    let texture = gray_texture();
    export_to_file(&path, &two_point_cloud(), Some(&texture), &ExportOptions::default()).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let header = header_lines(&contents);
    assert!(header.contains(&"property uchar red"));
    assert!(header.contains(&"property uchar blue"));
    let first_vertex = contents
        .lines()
        .skip_while(|l| *l != "end_header")
        .nth(1)
        .unwrap();
    assert!(first_vertex.ends_with(" 128 128 128"));
}

#[test]
fn test_vertex_color_can_be_disabled() {
    let path = temp_path("ply");
    let options = ExportOptions {
        vertex_color: false,
        ..ExportOptions::default()
    };
    export_to_file(&path, &two_point_cloud(), Some(&gray_texture()), &options).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(!contents.contains("property uchar red"));
}

#[test]
fn test_binary_ply_layout() {
    let path = temp_path("ply");
    let options = ExportOptions {
        binary: true,
        ..ExportOptions::default()
    };
    export_to_file(&path, &two_point_cloud(), None, &options).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let marker = b"end_header\n";
    let header_end = bytes
        .windows(marker.len())
        .position(|w| w == marker)
        .unwrap()
        + marker.len();
    let header = std::str::from_utf8(&bytes[..header_end]).unwrap();
    assert!(header.contains("format binary_little_endian 1.0"));

    // Two vertices of six little-endian floats
    let body = &bytes[header_end..];
    assert_eq!(body.len(), 2 * 6 * 4);
    let z = f32::from_le_bytes([body[8], body[9], body[10], body[11]]);
    assert_eq!(z, 3.0);
}

#[test]
fn test_mesh_extension_writes_ply_and_bmp() {
    let path = temp_path("mesh");
    let mesh = flat_mesh();
    export_to_file(&path, &mesh, Some(&gray_texture()), &ExportOptions::default()).unwrap();

    let ply_path = path.with_extension("ply");
    let bmp_path = path.with_extension("bmp");
    let contents = std::fs::read_to_string(&ply_path).unwrap();

    // The header names the sibling texture that was actually written
    let texture_name = contents
        .lines()
        .find_map(|l| l.strip_prefix("comment TextureFile "))
        .unwrap();
    let referenced = ply_path.with_file_name(texture_name);
    assert!(referenced.exists(), "{} missing", referenced.display());
    assert_eq!(referenced, bmp_path);

    let bmp = image::open(&bmp_path).unwrap();
    std::fs::remove_file(&ply_path).ok();
    std::fs::remove_file(&bmp_path).ok();

    assert!(!path.exists(), "Only siblings are written for .mesh");
    let header = header_lines(&contents);
    assert!(header.contains(&"element vertex 9"));
    assert!(header.contains(&"element face 8"));
    assert!(header.contains(&"property list uchar uint vertex_indices"));
    assert!(header.contains(&"property list uchar float texcoord"));
    assert_eq!((bmp.width(), bmp.height()), (4, 4));

    let faces: Vec<&str> = contents.lines().filter(|l| l.starts_with("3 ")).collect();
    assert_eq!(faces.len(), 8);
    assert!(faces[0].starts_with("3 0 3 4 6 "));
}

#[test]
fn test_mesh_without_texture_has_no_bmp() {
    let path = temp_path("mesh");
    export_to_file(&path, &flat_mesh(), None, &ExportOptions::default()).unwrap();

    let ply_path = path.with_extension("ply");
    let contents = std::fs::read_to_string(&ply_path).unwrap();
    std::fs::remove_file(&ply_path).ok();

    assert!(!path.with_extension("bmp").exists());
    assert!(!contents.contains("comment TextureFile"));
    assert!(!contents.contains("property list uchar float texcoord"));
    assert!(contents.contains("element face 8"));
}

#[test]
fn test_positional_export_with_map() {
    let path = temp_path("xyz");
    export_to_file(&path, &two_point_cloud(), None, &ExportOptions::default()).unwrap();

    let map_path = path.with_extension("map");
    let contents = std::fs::read_to_string(&path).unwrap();
    let map = std::fs::read_to_string(&map_path).unwrap();
    std::fs::remove_file(&path).ok();
    std::fs::remove_file(&map_path).ok();

    assert_eq!(contents, "v 1 2 3\nvn 0 0 -1\n");
    // (0.25, 0.5) in the 2x1 depth grid
    assert_eq!(map, "0 0\n");
}

#[test]
fn test_positional_map_uses_texture_size() {
    let path = temp_path("txt");
    export_to_file(&path, &two_point_cloud(), Some(&gray_texture()), &ExportOptions::default())
        .unwrap();

    let map_path = path.with_extension("map");
    let map = std::fs::read_to_string(&map_path).unwrap();
    std::fs::remove_file(&path).ok();
    std::fs::remove_file(&map_path).ok();

    assert_eq!(map, "1 2\n");
}

#[test]
fn test_positional_mesh_faces_are_one_based() {
    let path = temp_path("obj");
    export_to_file(&path, &flat_mesh(), None, &ExportOptions::default()).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).ok();
    std::fs::remove_file(path.with_extension("map")).ok();

    assert_eq!(contents.lines().filter(|l| l.starts_with("v ")).count(), 9);
    let faces: Vec<&str> = contents.lines().filter(|l| l.starts_with("f ")).collect();
    assert_eq!(faces.len(), 8);
    assert_eq!(faces[0], "f 1 4 5");
}

#[test]
fn test_las_export() {
    let path = temp_path("las");
    export_to_file(&path, &flat_mesh().cloud, Some(&gray_texture()), &ExportOptions::default())
        .unwrap();

    let reader = las::Reader::from_path(&path).unwrap();
    let count = reader.header().number_of_points();
    std::fs::remove_file(&path).ok();

    assert_eq!(count, 9);
}

#[test]
fn test_las_rejects_empty_cloud() {
    let path = temp_path("las");
    let mut cloud = PointCloud::with_capacity(1, 1, 1);
    cloud.push(Point3::ZERO, Point3::ZERO, TexCoord::ZERO);

    let result = export_to_file(&path, &cloud, None, &ExportOptions::default());
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(ExportError::EmptyGeometry)));
}

#[test]
fn test_glb_container() {
    let path = temp_path("glb");
    export_to_file(&path, &flat_mesh(), Some(&gray_texture()), &ExportOptions::default()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(&bytes[0..4], b"glTF");
    assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 2);
    let total = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    assert_eq!(total, bytes.len());
    assert_eq!(total % 4, 0);

    let json_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
    let json: serde_json::Value = serde_json::from_slice(&bytes[20..20 + json_len]).unwrap();
    assert_eq!(json["meshes"][0]["primitives"][0]["mode"], 4);
    assert_eq!(json["accessors"][3]["count"], 24);
    assert_eq!(json["images"][0]["mimeType"], "image/jpeg");
}

#[test]
fn test_glb_point_cloud_mode() {
    let path = temp_path("glb");
    export_to_file(&path, Geometry::Cloud(&two_point_cloud()), None, &ExportOptions::default())
        .unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let json_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
    let json: serde_json::Value = serde_json::from_slice(&bytes[20..20 + json_len]).unwrap();
    assert_eq!(json["meshes"][0]["primitives"][0]["mode"], 0);
    assert_eq!(json["accessors"][0]["count"], 1);
    assert!(json.get("images").is_none());
}

#[test]
fn test_unwritable_path_is_reported() {
    let path = std::env::temp_dir()
        .join(uuid::Uuid::new_v4().to_string())
        .join("missing")
        .join("out.ply");
    let result = export_to_file(&path, &two_point_cloud(), None, &ExportOptions::default());
    assert!(matches!(result, Err(ExportError::Io(_))));
}

#[tokio::test]
async fn test_async_export() {
    let path = temp_path("csv");
    export_to_file_async(
        path.clone(),
        OwnedGeometry::Cloud(two_point_cloud()),
        None,
        ExportOptions::default(),
    )
    .await
    .unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.ok();

    assert_eq!(contents.lines().count(), 1);
}
