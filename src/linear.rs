// SPDX-License-Identifier: MPL-2.0

//! Linear algebra helpers on top of [`glam`].

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

pub type Scalar = f32;

/// Creates a rotation from Euler angles, in radians, applied in intrinsic X, Y, Z order.
pub fn quat_from_euler_xyz(x: Scalar, y: Scalar, z: Scalar) -> Quat {
    // Intrinsic rotations compose left to right; the X rotation is outermost.
    Quat::from_rotation_x(x) * Quat::from_rotation_y(y) * Quat::from_rotation_z(z)
}

/// Like [`quat_from_euler_xyz`] but with angles in degrees.
pub fn quat_from_euler_degrees(x: Scalar, y: Scalar, z: Scalar) -> Quat {
    quat_from_euler_xyz(x.to_radians(), y.to_radians(), z.to_radians())
}

/// Spherically interpolates between two rotations along the shortest arc.
pub fn slerp_shortest(from: Quat, to: Quat, t: Scalar) -> Quat {
    // `q` and `-q` are the same rotation; pick the one on `from`'s hemisphere.
    let to = if from.dot(to) < 0. { -to } else { to };

    from.slerp(to, t).normalize()
}

/// The angle, in radians, of the rotation between two quaternions.
pub fn angle_between(a: Quat, b: Quat) -> Scalar {
    let dot = a.dot(b).abs().min(1.);

    2. * dot.acos()
}

/// A point in spherical coordinates around some origin, Y up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    /// Distance from the origin.
    pub radius: Scalar,
    /// Angle from the +Y axis, in `[0, π]`.
    pub polar: Scalar,
    /// Angle around the Y axis, measured from +Z toward +X.
    pub azimuth: Scalar,
}

impl Spherical {
    pub fn new(radius: Scalar, polar: Scalar, azimuth: Scalar) -> Self {
        Self { radius, polar, azimuth }
    }

    pub fn to_cartesian(self) -> Vec3 {
        let sin_polar = self.polar.sin();

        Vec3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        )
    }

    pub fn from_cartesian(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0. {
            return Self::new(0., 0., 0.);
        }

        Self {
            radius,
            polar: (v.y / radius).clamp(-1., 1.).acos(),
            azimuth: v.x.atan2(v.z),
        }
    }
}
