// SPDX-License-Identifier: MPL-2.0

//! Camera rides and low-poly scenes.
//!
//! This crate drives a camera along a recorded track (see [`track`]), pausing at points of interest
//! and riding between them with eased transitions, and renders simple scenes built from primitive
//! meshes (see [`primitives`] and [`rocket`]) with a small [wgpu](wgpu) renderer.
//!
//! # Coordinate Spaces
//!
//! There are four coordinate spaces: **mesh** space, **world** space, **camera** space, and
//! **clip** space.
//!
//! ## Mesh Space
//!
//! Each mesh has an associated mesh space where the origin is considered the 'center' of the mesh.
//! Meshes are scaled and rotated about this origin.
//!
//! ## World Space
//!
//! Each object hangs off a [transform node](tree::Node). The global transformation matrix of that
//! node, the product of its own local transform and those of all its ancestors, rebases mesh
//! vertices into world space.
//!
//! ## Camera Space
//!
//! Once all objects are in world space, the world itself is transformed so that the camera sits at
//! the origin looking down -Z with +Y up. The camera is positioned arbitrarily in world space, most
//! often by a [`TrackController`](track::TrackController) or
//! [`OrbitControls`](orbit::OrbitControls).
//!
//! ## Clip Space
//!
//! A perspective projection maps camera space into clip space, which the GPU compresses into the
//! 2D viewport during rasterization.

use std::rc::Rc;

pub mod assets;
pub mod config;
pub mod error;
pub mod host;
pub mod linear;
pub mod orbit;
pub mod primitives;
pub mod renderer;
pub mod ride;
pub mod rocket;
pub mod theme;
pub mod track;
pub mod tree;
pub mod tween;
pub mod uniforms;

pub use error::{Error, Result};
pub use linear::{Mat4, Quat, Vec3};
pub use renderer::Renderer;
pub use tree::Node;
pub use uniforms::{UniformMap, UniformValue};

/// The integral type for indexing a mesh's [vertex pool](Mesh::vertex_pool).
pub type MeshVertexIndex = u32;

/// A set of objects and a camera that observes them.
///
/// A scene may be rendered with [`Renderer::render`].
#[derive(Clone, Debug)]
pub struct Scene {
    /// The camera through which objects are observed.
    pub camera: Camera,
    /// The objects.
    pub objects: Vec<Object>,
    /// The color the frame is cleared to and that fog fades into.
    pub background: Vec3,
    /// Fog, as `(near, far)` distances from the camera.
    ///
    /// Beyond `far`, objects are entirely the background color.
    pub fog: Option<(f32, f32)>,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            objects: Vec::new(),
            background: Vec3::ZERO,
            fog: None,
        }
    }

    /// Splits object indices into an opaque and a translucent draw list.
    ///
    /// Opaque objects keep scene order. Translucent objects are sorted farthest from the camera
    /// first, so each blends over whatever lies behind it.
    pub fn draw_order(&self) -> (Vec<usize>, Vec<usize>) {
        let (mut translucent, opaque): (Vec<_>, Vec<_>) =
            (0..self.objects.len()).partition(|&i| self.objects[i].material.is_translucent());
        let distance = |i: usize| {
            self.objects[i]
                .node
                .world_position()
                .distance_squared(self.camera.position)
        };
        translucent.sort_by(|&a, &b| distance(b).total_cmp(&distance(a)));

        (opaque, translucent)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// The location of this camera in world space.
    pub position: Vec3,
    /// A point, in world space, that this camera is 'looking at'.
    ///
    /// This point must not be equivalent to [the position](Self::position).
    pub target: Vec3,
    /// The direction, in world space, that is 'up' on screen.
    pub up: Vec3,
    /// The vertical field of view in radians.
    pub fov_y: f32,
    /// The distance to the near clipping plane.
    pub near: f32,
    /// The distance to the far clipping plane.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0., 0., 5.),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            near: 0.1,
            far: 2_000.,
        }
    }
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect_ratio, self.near, self.far)
    }

    /// The combined world-to-clip matrix.
    pub fn view_projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        self.projection_matrix(aspect_ratio) * self.view_matrix()
    }
}

impl From<Vec3> for Point {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Point> for Vec3 {
    fn from(p: Point) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// Three packed floats as they sit in a vertex buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Point {
    /// The X coordinate.
    pub x: f32,
    /// The Y coordinate.
    pub y: f32,
    /// The Z coordinate.
    pub z: f32,
}

unsafe impl bytemuck::Pod for Point {}
unsafe impl bytemuck::Zeroable for Point {}

impl Point {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A [mesh](Mesh), with a [material](Material) applied, within a scene.
#[derive(Clone, Debug)]
pub struct Object {
    /// The transform node that places [the mesh](Self::mesh) in world space.
    pub node: Rc<Node>,
    /// The mesh, which may be shared between objects.
    pub mesh: Rc<Mesh>,
    /// The material applied to [the mesh](Self::mesh).
    pub material: Material,
}

impl Object {
    pub fn new(node: Rc<Node>, mesh: Rc<Mesh>, material: Material) -> Self {
        Self { node, mesh, material }
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangles.len()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    /// The vertices that make up this mesh.
    pub vertex_pool: Vec<MeshVertex>,
    /// Triads of vertices from [`Self::vertex_pool`] that define the triangle primitives of this
    /// mesh.
    pub triangles: Vec<MeshTriangle>,
}

impl Mesh {
    /// Replaces every vertex normal with the normalized sum of the normals of the triangles that
    /// use it.
    pub fn recompute_normals(&mut self) {
        let mut sums = vec![Vec3::ZERO; self.vertex_pool.len()];
        for triangle in &self.triangles {
            let [a, b, c] = triangle.indices().map(|i| i as usize);
            let (pa, pb, pc) = (
                Vec3::from(self.vertex_pool[a].point),
                Vec3::from(self.vertex_pool[b].point),
                Vec3::from(self.vertex_pool[c].point),
            );
            // Not normalized, so larger triangles weigh more.
            let face = (pb - pa).cross(pc - pa);
            for i in [a, b, c] {
                sums[i] += face;
            }
        }

        for (vertex, sum) in self.vertex_pool.iter_mut().zip(sums) {
            vertex.normal = sum.normalize_or_zero().into();
        }
    }

    /// Whether every triangle references a vertex within the vertex pool.
    pub fn is_valid(&self) -> bool {
        let len = self.vertex_pool.len() as MeshVertexIndex;

        self.triangles
            .iter()
            .all(|triangle| triangle.indices().iter().all(|&i| i < len))
    }
}

impl MeshTriangle {
    /// Creates a new `MeshTriangle` from a triad of vertex indices.
    pub fn new(indices: [MeshVertexIndex; 3]) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> [MeshVertexIndex; 3] {
        self.0
    }
}

/// A triangle within a [mesh](Mesh).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct MeshTriangle([MeshVertexIndex; 3]);

unsafe impl bytemuck::Pod for MeshTriangle {}
unsafe impl bytemuck::Zeroable for MeshTriangle {}

/// A vertex within a [mesh](Mesh).
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct MeshVertex {
    /// The location of this vertex in mesh space.
    pub point: Point,
    /// The surface normal at this vertex in mesh space.
    pub normal: Point,
}

unsafe impl bytemuck::Pod for MeshVertex {}
unsafe impl bytemuck::Zeroable for MeshVertex {}

impl MeshVertex {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point: point.into(),
            normal: normal.into(),
        }
    }
}

/// The appearance of an object, expressed as named shader inputs.
///
/// The renderer reads [`COLOR`](Self::COLOR), [`OPACITY`](Self::OPACITY), and
/// [`EMISSIVE`](Self::EMISSIVE); other entries are free for animations to use.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub uniforms: UniformMap,
}

impl Material {
    pub const COLOR: &'static str = "color";
    pub const OPACITY: &'static str = "opacity";
    pub const EMISSIVE: &'static str = "emissive";

    /// An opaque material of a single color.
    pub fn basic(color: Vec3) -> Self {
        let mut uniforms = UniformMap::new();
        uniforms.set(Self::COLOR, UniformValue::Vec3(color));
        uniforms.set(Self::OPACITY, UniformValue::Float(1.));
        uniforms.set(Self::EMISSIVE, UniformValue::Float(0.));

        Self { uniforms }
    }

    /// A material that ignores lighting.
    pub fn unlit(color: Vec3) -> Self {
        let mut material = Self::basic(color);
        material.uniforms.set(Self::EMISSIVE, UniformValue::Float(1.));

        material
    }

    pub fn color(&self) -> Vec3 {
        self.uniforms.vec3(Self::COLOR).unwrap_or(Vec3::ONE)
    }

    pub fn opacity(&self) -> f32 {
        self.uniforms.float(Self::OPACITY).unwrap_or(1.)
    }

    pub fn is_translucent(&self) -> bool {
        self.opacity() < 1.
    }

    pub fn emissive(&self) -> f32 {
        self.uniforms.float(Self::EMISSIVE).unwrap_or(0.)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh {
            vertex_pool: [
                Vec3::new(0., 0., 0.),
                Vec3::new(1., 0., 0.),
                Vec3::new(1., 0., -1.),
                Vec3::new(0., 0., -1.),
            ]
            .into_iter()
            .map(|p| MeshVertex::new(p, Vec3::ZERO))
            .collect(),
            triangles: vec![MeshTriangle::new([0, 1, 2]), MeshTriangle::new([0, 2, 3])],
        }
    }

    #[test]
    fn recomputed_normals_face_up_for_ccw_floor() {
        let mut mesh = quad();
        mesh.recompute_normals();
        for vertex in &mesh.vertex_pool {
            assert!((Vec3::from(vertex.normal) - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn out_of_range_index_is_invalid() {
        let mut mesh = quad();
        assert!(mesh.is_valid());
        mesh.triangles.push(MeshTriangle::new([0, 1, 4]));
        assert!(!mesh.is_valid());
    }

    #[test]
    fn basic_material_defaults() {
        let material = Material::basic(Vec3::new(1., 0., 0.));
        assert_eq!(material.color(), Vec3::new(1., 0., 0.));
        assert_eq!(material.opacity(), 1.);
        assert_eq!(material.emissive(), 0.);
        assert_eq!(Material::unlit(Vec3::ONE).emissive(), 1.);
    }

    #[test]
    fn camera_looks_down_negative_z_by_default() {
        let camera = Camera {
            position: Vec3::ZERO,
            target: Vec3::new(0., 0., -1.),
            ..Default::default()
        };
        let in_view = camera.view_matrix().transform_point3(Vec3::new(0., 0., -3.));
        assert!((in_view - Vec3::new(0., 0., -3.)).length() < 1e-5);
    }

    #[test]
    fn translucent_objects_draw_last_from_far_to_near() {
        let mesh = Rc::new(quad());
        let at = |z: f32, opacity: f32| {
            let node = Node::root();
            node.set_position(Vec3::new(0., 0., z));
            let mut material = Material::basic(Vec3::ONE);
            material.uniforms.set(Material::OPACITY, UniformValue::Float(opacity));
            Object::new(node, mesh.clone(), material)
        };

        let mut scene = Scene::new(Camera::default());
        scene.camera.position = Vec3::ZERO;
        scene.objects = vec![
            at(-2., 0.5),
            at(-5., 1.),
            at(-8., 0.5),
            at(-1., 1.),
            at(-4., 0.2),
        ];

        assert_eq!(scene.draw_order(), (vec![1, 3], vec![2, 4, 0]));
    }
}
