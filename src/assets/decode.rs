// SPDX-License-Identifier: MPL-2.0

use std::{io::Cursor, path::Path};

use super::{Asset, AssetKind, AssetRequest, AssetSource};
use crate::{
    error::{Error, Result},
    linear::Vec3,
    Mesh, MeshTriangle, MeshVertex,
};

/// Cube face file stems, in the order faces are stored.
pub const CUBE_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// Six square images of equal size.
#[derive(Clone, Debug)]
pub struct CubeTexture {
    /// In [`CUBE_FACES`] order.
    pub faces: Vec<image::RgbaImage>,
}

impl CubeTexture {
    pub fn size(&self) -> u32 {
        self.faces[0].width()
    }
}

/// One object of a loaded model.
#[derive(Clone, Debug)]
pub struct ModelMesh {
    pub name: String,
    pub mesh: Mesh,
}

/// Fetches and decodes a single request.
pub(super) fn load(request: &AssetRequest, source: &mut dyn AssetSource) -> Result<Asset> {
    match request.kind {
        AssetKind::Json => Ok(Asset::Json(serde_json::from_slice(&source.fetch(&request.path)?)?)),
        AssetKind::Text => Ok(Asset::Text(String::from_utf8(source.fetch(&request.path)?)?)),
        AssetKind::Texture => Ok(Asset::Texture(decode_image(&source.fetch(&request.path)?)?)),
        AssetKind::CubeTexture => load_cube_texture(&request.path, source).map(Asset::CubeTexture),
        AssetKind::Model => decode_obj(&source.fetch(&request.path)?).map(Asset::Model),
    }
}

fn decode_image(bytes: &[u8]) -> Result<image::RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

fn cube_face_path(path: &str, face: &str) -> String {
    if path.contains("{face}") {
        path.replace("{face}", face)
    } else {
        format!("{}/{face}.jpg", path.trim_end_matches('/'))
    }
}

fn load_cube_texture(path: &str, source: &mut dyn AssetSource) -> Result<CubeTexture> {
    let mut faces: Vec<image::RgbaImage> = Vec::with_capacity(CUBE_FACES.len());
    for face in CUBE_FACES {
        let image = decode_image(&source.fetch(&cube_face_path(path, face))?)?;
        if image.width() != image.height() {
            return Err(Error::CubeFace {
                face,
                message: format!("{}x{} is not square", image.width(), image.height()),
            });
        }
        if let Some(first) = faces.first() {
            if first.dimensions() != image.dimensions() {
                return Err(Error::CubeFace {
                    face,
                    message: format!(
                        "{}x{} does not match the {}x{} of the first face",
                        image.width(),
                        image.height(),
                        first.width(),
                        first.height(),
                    ),
                });
            }
        }
        faces.push(image);
    }

    Ok(CubeTexture { faces })
}

/// Decodes a Wavefront OBJ file into one mesh per object.
///
/// Material libraries are not loaded. Objects without normals get smooth normals computed from
/// their faces.
pub(crate) fn decode_obj(bytes: &[u8]) -> Result<Vec<ModelMesh>> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj_buf(&mut Cursor::new(bytes), &options, |_: &Path| {
        Err(tobj::LoadError::GenericFailure)
    })?;

    Ok(models
        .into_iter()
        .map(|model| {
            let mesh = convert_mesh(&model.mesh);
            tracing::debug!(
                name = %model.name,
                vertices = mesh.vertex_pool.len(),
                triangles = mesh.triangles.len(),
                "decoded model mesh"
            );

            ModelMesh {
                name: model.name,
                mesh,
            }
        })
        .collect())
}

fn convert_mesh(source: &tobj::Mesh) -> Mesh {
    let has_normals = source.normals.len() == source.positions.len();
    let vertex_pool = source
        .positions
        .chunks_exact(3)
        .enumerate()
        .map(|(i, p)| {
            let normal = if has_normals {
                Vec3::from_slice(&source.normals[3 * i..3 * i + 3])
            } else {
                Vec3::ZERO
            };

            MeshVertex::new(Vec3::from_slice(p), normal)
        })
        .collect();
    let triangles = source
        .indices
        .chunks_exact(3)
        .map(|t| MeshTriangle::new([t[0], t[1], t[2]]))
        .collect();

    let mut mesh = Mesh {
        vertex_pool,
        triangles,
    };
    if !has_normals {
        mesh.recompute_normals();
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::source::MemorySource;

    const QUAD: &str = "\
o floor
v 0 0 0
v 1 0 0
v 1 0 -1
v 0 0 -1
f 1 2 3 4
";

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn obj_quads_are_triangulated_with_normals() {
        let meshes = decode_obj(QUAD.as_bytes()).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].name, "floor");

        let mesh = &meshes[0].mesh;
        assert_eq!(mesh.vertex_pool.len(), 4);
        assert_eq!(mesh.triangles.len(), 2);
        assert!(mesh.is_valid());
        for vertex in &mesh.vertex_pool {
            assert!((Vec3::from(vertex.normal) - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn cube_faces_are_loaded_in_order() {
        let mut source = MemorySource::default();
        for face in CUBE_FACES {
            source.files.insert(format!("sky/{face}.png"), png(4, 4));
        }

        let cube = load_cube_texture("sky/{face}.png", &mut source).unwrap();
        assert_eq!(cube.faces.len(), 6);
        assert_eq!(cube.size(), 4);
        assert_eq!(
            source.requests,
            CUBE_FACES.map(|face| format!("sky/{face}.png")).to_vec()
        );
    }

    #[test]
    fn mismatched_cube_face_is_rejected() {
        let mut source = MemorySource::default();
        for face in CUBE_FACES {
            let size = if face == "nz" { 8 } else { 4 };
            source.files.insert(format!("sky/{face}.png"), png(size, size));
        }

        assert!(matches!(
            load_cube_texture("sky/{face}.png", &mut source),
            Err(Error::CubeFace { face: "nz", .. })
        ));
    }

    #[test]
    fn directory_cube_paths_default_to_jpg() {
        assert_eq!(cube_face_path("env/", "py"), "env/py.jpg");
    }
}
