// SPDX-License-Identifier: MPL-2.0

//! Low-poly mesh builders.
//!
//! Every builder produces flat-shaded geometry: each face gets its own vertices so that normals
//! are not smoothed across edges. Triangles wind counter-clockwise when seen from outside.

use std::f32::consts::{PI, TAU};

use crate::{linear::Vec3, Mesh, MeshTriangle, MeshVertex, MeshVertexIndex};

#[derive(Default)]
struct MeshBuilder {
    mesh: Mesh,
}

impl MeshBuilder {
    /// Adds a flat triangle; degenerate triangles are skipped.
    fn triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let cross = (b - a).cross(c - a);
        if cross.length_squared() <= f32::EPSILON * f32::EPSILON {
            return;
        }
        let normal = cross.normalize();

        let base = self.mesh.vertex_pool.len() as MeshVertexIndex;
        self.mesh
            .vertex_pool
            .extend([a, b, c].map(|p| MeshVertex::new(p, normal)));
        self.mesh
            .triangles
            .push(MeshTriangle::new([base, base + 1, base + 2]));
    }

    /// Adds a flat quad from four corners in counter-clockwise order.
    fn quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3) {
        self.triangle(a, b, c);
        self.triangle(a, c, d);
    }

    fn finish(self) -> Mesh {
        self.mesh
    }
}

/// An axis-aligned box centered on the origin.
pub fn cuboid(size: Vec3) -> Mesh {
    let h = size * 0.5;
    let corner = |x: f32, y: f32, z: f32| Vec3::new(x * h.x, y * h.y, z * h.z);
    let mut builder = MeshBuilder::default();

    // +X, -X
    builder.quad(corner(1., -1., 1.), corner(1., -1., -1.), corner(1., 1., -1.), corner(1., 1., 1.));
    builder.quad(corner(-1., -1., -1.), corner(-1., -1., 1.), corner(-1., 1., 1.), corner(-1., 1., -1.));
    // +Y, -Y
    builder.quad(corner(-1., 1., 1.), corner(1., 1., 1.), corner(1., 1., -1.), corner(-1., 1., -1.));
    builder.quad(corner(-1., -1., -1.), corner(1., -1., -1.), corner(1., -1., 1.), corner(-1., -1., 1.));
    // +Z, -Z
    builder.quad(corner(-1., -1., 1.), corner(1., -1., 1.), corner(1., 1., 1.), corner(-1., 1., 1.));
    builder.quad(corner(1., -1., -1.), corner(-1., -1., -1.), corner(-1., 1., -1.), corner(1., 1., -1.));

    builder.finish()
}

/// A Y-aligned frustum centered on the origin.
///
/// A zero radius at either end makes a cone; equal radii make a cylinder.
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> Mesh {
    cylinder_sector(radius_top, radius_bottom, height, segments, 0., TAU)
}

/// Part of a [`cylinder`], spanning `arc` radians counter-clockwise (seen from above) from
/// `start`, measured from +Z toward +X.
///
/// Partial sectors are open along their straight edges.
pub fn cylinder_sector(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    segments: u32,
    start: f32,
    arc: f32,
) -> Mesh {
    let segments = segments.max(3);
    let closed = arc >= TAU;
    let half = height * 0.5;
    let ring = |radius: f32, y: f32, i: u32| {
        // Wrap a closed ring exactly onto its first vertex.
        let i = if closed { i % segments } else { i };
        let angle = start + arc.min(TAU) * i as f32 / segments as f32;
        Vec3::new(radius * angle.sin(), y, radius * angle.cos())
    };
    let mut builder = MeshBuilder::default();

    for i in 0..segments {
        let (b0, b1) = (ring(radius_bottom, -half, i), ring(radius_bottom, -half, i + 1));
        let (t0, t1) = (ring(radius_top, half, i), ring(radius_top, half, i + 1));

        builder.quad(b0, b1, t1, t0);
        builder.triangle(Vec3::new(0., half, 0.), t0, t1);
        builder.triangle(Vec3::new(0., -half, 0.), b1, b0);
    }

    builder.finish()
}

/// An open-ended, Y-aligned cylinder whose faces point inward, for viewing from inside.
pub fn tube(radius: f32, height: f32, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let half = height * 0.5;
    let ring = |y: f32, i: u32| {
        let angle = TAU * (i % segments) as f32 / segments as f32;
        Vec3::new(radius * angle.sin(), y, radius * angle.cos())
    };
    let mut builder = MeshBuilder::default();

    for i in 0..segments {
        builder.quad(ring(-half, i + 1), ring(-half, i), ring(half, i), ring(half, i + 1));
    }

    builder.finish()
}

pub fn cone(radius: f32, height: f32, segments: u32) -> Mesh {
    cylinder(0., radius, height, segments)
}

/// A UV sphere centered on the origin.
pub fn sphere(radius: f32, segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let point = |ring: u32, segment: u32| {
        // Poles are exact so that their collapsed triangles are dropped.
        if ring == 0 || ring == rings {
            return Vec3::new(0., if ring == 0 { radius } else { -radius }, 0.);
        }
        let polar = PI * ring as f32 / rings as f32;
        let azimuth = TAU * (segment % segments) as f32 / segments as f32;
        Vec3::new(
            radius * polar.sin() * azimuth.sin(),
            radius * polar.cos(),
            radius * polar.sin() * azimuth.cos(),
        )
    };
    let mut builder = MeshBuilder::default();

    for ring in 0..rings {
        for segment in 0..segments {
            let (a, b) = (point(ring, segment), point(ring, segment + 1));
            let (c, d) = (point(ring + 1, segment + 1), point(ring + 1, segment));
            // At the poles one of the two triangles collapses and is skipped.
            builder.quad(d, c, b, a);
        }
    }

    builder.finish()
}

/// A flat rectangle in the XZ plane facing +Y.
pub fn plane(width: f32, depth: f32) -> Mesh {
    let (x, z) = (width * 0.5, depth * 0.5);
    let mut builder = MeshBuilder::default();
    builder.quad(
        Vec3::new(-x, 0., z),
        Vec3::new(x, 0., z),
        Vec3::new(x, 0., -z),
        Vec3::new(-x, 0., -z),
    );

    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every face normal must point away from the origin for a convex mesh around it.
    fn assert_outward(mesh: &Mesh) {
        for triangle in &mesh.triangles {
            let [a, b, c] = triangle.indices().map(|i| mesh.vertex_pool[i as usize]);
            let centroid = (Vec3::from(a.point) + Vec3::from(b.point) + Vec3::from(c.point)) / 3.;
            assert!(
                Vec3::from(a.normal).dot(centroid) > 0.,
                "inward face at {centroid:?}"
            );
        }
    }

    #[test]
    fn cuboid_has_twelve_outward_triangles() {
        let mesh = cuboid(Vec3::new(1., 2., 3.));
        assert_eq!(mesh.triangles.len(), 12);
        assert!(mesh.is_valid());
        assert_outward(&mesh);
    }

    #[test]
    fn cylinder_faces_point_outward() {
        let mesh = cylinder(1., 1., 2., 8);
        assert_eq!(mesh.triangles.len(), 8 * 4);
        assert!(mesh.is_valid());
        assert_outward(&mesh);
    }

    #[test]
    fn cone_skips_degenerate_tip_faces() {
        let mesh = cone(1., 2., 6);
        // Each segment: one side triangle and one base triangle.
        assert_eq!(mesh.triangles.len(), 6 * 2);
        assert_outward(&mesh);
    }

    #[test]
    fn half_sector_has_half_the_faces() {
        let mesh = cylinder_sector(1., 1., 1., 6, 0., PI);
        assert_eq!(mesh.triangles.len(), 6 * 4);
        assert_outward(&mesh);
        assert!(mesh.vertex_pool.iter().all(|v| v.point.x >= -1e-5));
    }

    #[test]
    fn tube_faces_point_inward() {
        let mesh = tube(2., 1., 6);
        assert_eq!(mesh.triangles.len(), 6 * 2);
        for triangle in &mesh.triangles {
            let [a, b, c] = triangle.indices().map(|i| mesh.vertex_pool[i as usize]);
            let centroid = (Vec3::from(a.point) + Vec3::from(b.point) + Vec3::from(c.point)) / 3.;
            let radial = Vec3::new(centroid.x, 0., centroid.z);
            assert!(Vec3::from(a.normal).dot(radial) < 0.);
        }
    }

    #[test]
    fn sphere_is_closed_and_outward() {
        let mesh = sphere(2., 8, 4);
        assert!(mesh.is_valid());
        assert_outward(&mesh);
        for vertex in &mesh.vertex_pool {
            assert!((Vec3::from(vertex.point).length() - 2.).abs() < 1e-4);
        }
    }

    #[test]
    fn plane_faces_up() {
        let mesh = plane(2., 2.);
        assert_eq!(mesh.triangles.len(), 2);
        assert!(mesh
            .vertex_pool
            .iter()
            .all(|v| (Vec3::from(v.normal) - Vec3::Y).length() < 1e-6));
    }
}
