// SPDX-License-Identifier: GPL-3.0-only

//! Binary glTF export
//!
//! Valid vertices only, converted to meters in glTF's Y-up, camera-facing
//! -Z frame. Meshes become an indexed triangle primitive, clouds a point
//! primitive. A texture, when present, is embedded as JPEG.

use super::{Geometry, Texture, valid_vertex_remap};
use crate::errors::ExportError;
use std::path::Path;
use tracing::{debug, info};

const JPEG_QUALITY: u8 = 92;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

const COMPONENT_FLOAT: u32 = 5126;
const COMPONENT_UNSIGNED_INT: u32 = 5125;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

const MODE_POINTS: u32 = 0;
const MODE_TRIANGLES: u32 = 4;

/// Vertex streams laid out for the binary chunk
struct GlbBuffers {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

fn collect_buffers(geometry: Geometry<'_>) -> GlbBuffers {
    let cloud = geometry.cloud();
    let (remap, valid) = valid_vertex_remap(cloud);

    let mut buffers = GlbBuffers {
        positions: Vec::with_capacity(valid),
        normals: Vec::with_capacity(valid),
        uvs: Vec::with_capacity(valid),
        indices: Vec::new(),
    };

    for (i, slot) in remap.iter().enumerate() {
        if slot.is_none() {
            continue;
        }
        let p = cloud.points[i];
        let n = cloud.normals[i];
        let tc = cloud.tex_coords[i];
        buffers
            .positions
            .push([p.x / 1000.0, -p.y / 1000.0, -p.z / 1000.0]);
        buffers.normals.push([n.x, -n.y, -n.z]);
        buffers.uvs.push([tc.u, tc.v]);
    }

    if let Some(faces) = geometry.faces() {
        buffers.indices = faces
            .iter()
            .filter_map(|face| {
                let [a, b, c] = face.map(|i| remap.get(i as usize).copied().flatten());
                Some([a?, b?, c?])
            })
            .flatten()
            .collect();
    }

    buffers
}

fn encode_texture_jpeg(texture: &Texture) -> Result<Vec<u8>, ExportError> {
    let image = texture.to_image();
    let mut jpeg_data = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_data, JPEG_QUALITY);
    encoder
        .encode_image(&image)
        .map_err(|e| ExportError::Encoding(format!("Failed to encode JPEG: {}", e)))?;

    debug!(
        jpeg_size = jpeg_data.len(),
        width = texture.width(),
        height = texture.height(),
        "Encoded texture as JPEG"
    );
    Ok(jpeg_data)
}

/// Append `bytes` to the binary chunk at a 4-byte aligned offset
fn push_view(bin: &mut Vec<u8>, bytes: &[u8]) -> (usize, usize) {
    bin.resize(bin.len().next_multiple_of(4), 0);
    let offset = bin.len();
    bin.extend_from_slice(bytes);
    (offset, bytes.len())
}

fn position_bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    positions.iter().fold(
        ([f32::MAX; 3], [f32::MIN; 3]),
        |(mut min, mut max), p| {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
            (min, max)
        },
    )
}

pub(super) fn write_glb(
    path: &Path,
    geometry: Geometry<'_>,
    texture: Option<&Texture>,
) -> Result<(), ExportError> {
    let buffers = collect_buffers(geometry);
    if buffers.positions.is_empty() {
        return Err(ExportError::EmptyGeometry);
    }

    let is_mesh = geometry.faces().is_some();
    info!(
        vertex_count = buffers.positions.len(),
        triangle_count = buffers.indices.len() / 3,
        textured = texture.is_some(),
        path = %path.display(),
        "Exporting GLB"
    );

    let texture_data = texture.map(encode_texture_jpeg).transpose()?;

    let mut bin = Vec::new();
    let (pos_offset, pos_len) = push_view(&mut bin, bytemuck::cast_slice(&buffers.positions));
    let (nrm_offset, nrm_len) = push_view(&mut bin, bytemuck::cast_slice(&buffers.normals));
    let (uv_offset, uv_len) = push_view(&mut bin, bytemuck::cast_slice(&buffers.uvs));

    let count = buffers.positions.len();
    let (min_pos, max_pos) = position_bounds(&buffers.positions);

    let mut accessors = vec![
        serde_json::json!({
            "bufferView": 0,
            "componentType": COMPONENT_FLOAT,
            "count": count,
            "type": "VEC3",
            "min": min_pos,
            "max": max_pos
        }),
        serde_json::json!({
            "bufferView": 1,
            "componentType": COMPONENT_FLOAT,
            "count": count,
            "type": "VEC3"
        }),
        serde_json::json!({
            "bufferView": 2,
            "componentType": COMPONENT_FLOAT,
            "count": count,
            "type": "VEC2"
        }),
    ];
    let mut views = vec![
        serde_json::json!({
            "buffer": 0, "byteOffset": pos_offset, "byteLength": pos_len,
            "byteStride": 12, "target": TARGET_ARRAY_BUFFER
        }),
        serde_json::json!({
            "buffer": 0, "byteOffset": nrm_offset, "byteLength": nrm_len,
            "byteStride": 12, "target": TARGET_ARRAY_BUFFER
        }),
        serde_json::json!({
            "buffer": 0, "byteOffset": uv_offset, "byteLength": uv_len,
            "byteStride": 8, "target": TARGET_ARRAY_BUFFER
        }),
    ];

    let mut primitive = serde_json::json!({
        "attributes": {
            "POSITION": 0,
            "NORMAL": 1,
            "TEXCOORD_0": 2
        },
        "mode": if is_mesh { MODE_TRIANGLES } else { MODE_POINTS }
    });

    if is_mesh {
        let (idx_offset, idx_len) = push_view(&mut bin, bytemuck::cast_slice(&buffers.indices));
        primitive["indices"] = accessors.len().into();
        accessors.push(serde_json::json!({
            "bufferView": views.len(),
            "componentType": COMPONENT_UNSIGNED_INT,
            "count": buffers.indices.len(),
            "type": "SCALAR"
        }));
        views.push(serde_json::json!({
            "buffer": 0, "byteOffset": idx_offset, "byteLength": idx_len,
            "target": TARGET_ELEMENT_ARRAY_BUFFER
        }));
    }

    let mut gltf_json = serde_json::json!({
        "asset": {
            "generator": concat!("depth-cloud ", env!("CARGO_PKG_VERSION")),
            "version": "2.0"
        },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0 }],
    });

    if let Some(jpeg) = &texture_data {
        let (tex_offset, tex_len) = push_view(&mut bin, jpeg);
        primitive["material"] = 0.into();
        gltf_json["materials"] = serde_json::json!([{
            "pbrMetallicRoughness": {
                "baseColorTexture": { "index": 0 },
                "metallicFactor": 0.0,
                "roughnessFactor": 1.0
            },
            "doubleSided": true
        }]);
        gltf_json["textures"] = serde_json::json!([{ "sampler": 0, "source": 0 }]);
        // LINEAR / LINEAR_MIPMAP_LINEAR, CLAMP_TO_EDGE
        gltf_json["samplers"] = serde_json::json!([{
            "magFilter": 9729,
            "minFilter": 9987,
            "wrapS": 33071,
            "wrapT": 33071
        }]);
        gltf_json["images"] = serde_json::json!([{
            "bufferView": views.len(),
            "mimeType": "image/jpeg"
        }]);
        views.push(serde_json::json!({
            "buffer": 0, "byteOffset": tex_offset, "byteLength": tex_len
        }));
    }

    bin.resize(bin.len().next_multiple_of(4), 0);

    gltf_json["meshes"] = serde_json::json!([{ "primitives": [primitive] }]);
    gltf_json["accessors"] = accessors.into();
    gltf_json["bufferViews"] = views.into();
    gltf_json["buffers"] = serde_json::json!([{ "byteLength": bin.len() }]);

    let mut json_bytes = serde_json::to_vec(&gltf_json)
        .map_err(|e| ExportError::Encoding(format!("Failed to serialize glTF: {}", e)))?;
    json_bytes.resize(json_bytes.len().next_multiple_of(4), b' ');

    let total_length = 12 + 8 + json_bytes.len() + 8 + bin.len();
    let mut glb_data: Vec<u8> = Vec::with_capacity(total_length);

    glb_data.extend_from_slice(GLB_MAGIC);
    glb_data.extend_from_slice(&2u32.to_le_bytes());
    glb_data.extend_from_slice(&(total_length as u32).to_le_bytes());

    glb_data.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    glb_data.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb_data.extend_from_slice(&json_bytes);

    glb_data.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb_data.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb_data.extend_from_slice(&bin);

    std::fs::write(path, glb_data)?;

    debug!(path = %path.display(), "GLB export complete");
    Ok(())
}
