//! Mathematical types shared between generation and culling.
//!
//! Matrices are column-major `[[f32; 4]; 4]` (WGPU convention) and are
//! passed around as plain arrays so they upload to the GPU without any
//! conversion step.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Column-major 4x4 matrix, `m[column][row]`.
pub type Mat4 = [[f32; 4]; 4];

/// 3D Vector - position, direction
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit Y vector
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Creates from array
    #[must_use]
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Dot product
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Length squared (avoids sqrt)
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length
    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Distance squared to another point (avoids sqrt)
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Returns the normalized vector, or zero if degenerate.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// 2D Vector - planar facing directions, mask coordinates
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
}

impl Vec2 {
    /// Creates a new Vec2
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }

    /// Length of the vector
    #[must_use]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Returns the normalized vector, or (1, 0) if degenerate.
    ///
    /// Facing directions must never be zero, so the degenerate fallback is a
    /// valid unit vector rather than zero.
    #[must_use]
    pub fn normalized_or_x(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::new(1.0, 0.0)
        }
    }
}

/// A plane in 3D space (Ax + By + Cz + D = 0).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct Plane {
    /// Normal X component.
    pub a: f32,
    /// Normal Y component.
    pub b: f32,
    /// Normal Z component.
    pub c: f32,
    /// Distance from origin.
    pub d: f32,
}

impl Plane {
    /// Creates a new plane.
    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    /// Normalizes the plane.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = (self.a * self.a + self.b * self.b + self.c * self.c).sqrt();
        if len > 0.0 {
            Self {
                a: self.a / len,
                b: self.b / len,
                c: self.c / len,
                d: self.d / len,
            }
        } else {
            self
        }
    }

    /// Returns the signed distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        self.a * p.x + self.b * p.y + self.c * p.z + self.d
    }

    /// Converts to array format.
    #[must_use]
    pub const fn as_array(&self) -> [f32; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

/// View frustum for culling.
///
/// Planes are extracted once per frame on the host; the kernel only ever
/// evaluates signed distances.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts frustum planes from a view-projection matrix.
    ///
    /// The matrix must be in column-major order (WGPU convention).
    #[must_use]
    pub fn from_view_projection(m: &Mat4) -> Self {
        let mut planes = [Plane::default(); 6];

        // Left plane: row3 + row0
        planes[0] = Plane::new(
            m[0][3] + m[0][0],
            m[1][3] + m[1][0],
            m[2][3] + m[2][0],
            m[3][3] + m[3][0],
        )
        .normalized();

        // Right plane: row3 - row0
        planes[1] = Plane::new(
            m[0][3] - m[0][0],
            m[1][3] - m[1][0],
            m[2][3] - m[2][0],
            m[3][3] - m[3][0],
        )
        .normalized();

        // Bottom plane: row3 + row1
        planes[2] = Plane::new(
            m[0][3] + m[0][1],
            m[1][3] + m[1][1],
            m[2][3] + m[2][1],
            m[3][3] + m[3][1],
        )
        .normalized();

        // Top plane: row3 - row1
        planes[3] = Plane::new(
            m[0][3] - m[0][1],
            m[1][3] - m[1][1],
            m[2][3] - m[2][1],
            m[3][3] - m[3][1],
        )
        .normalized();

        // Near plane: row3 + row2
        planes[4] = Plane::new(
            m[0][3] + m[0][2],
            m[1][3] + m[1][2],
            m[2][3] + m[2][2],
            m[3][3] + m[3][2],
        )
        .normalized();

        // Far plane: row3 - row2
        planes[5] = Plane::new(
            m[0][3] - m[0][2],
            m[1][3] - m[1][2],
            m[2][3] - m[2][2],
            m[3][3] - m[3][2],
        )
        .normalized();

        Self { planes }
    }

    /// Tests if a sphere intersects the frustum.
    ///
    /// Returns `false` only if the sphere is fully outside at least one
    /// plane (`distance < -radius`), which is the conservative contract the
    /// kernel needs: spheres straddling a plane are kept.
    #[must_use]
    pub fn test_sphere(&self, sphere: BoundingSphere) -> bool {
        for plane in &self.planes {
            if plane.distance_to_point(sphere.center) < -sphere.radius {
                return false;
            }
        }
        true
    }

    /// Converts planes to array format for GPU upload.
    #[must_use]
    pub fn as_arrays(&self) -> [[f32; 4]; 6] {
        [
            self.planes[0].as_array(),
            self.planes[1].as_array(),
            self.planes[2].as_array(),
            self.planes[3].as_array(),
            self.planes[4].as_array(),
            self.planes[5].as_array(),
        ]
    }
}

/// Bounding sphere used by the frustum and occlusion tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundingSphere {
    /// Sphere center in world space.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere.
    #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Multiplies two column-major matrices (`a * b`).
#[must_use]
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0f32; 4]; 4];
    for (col, b_col) in b.iter().enumerate() {
        for row in 0..4 {
            out[col][row] = a[0][row] * b_col[0]
                + a[1][row] * b_col[1]
                + a[2][row] * b_col[2]
                + a[3][row] * b_col[3];
        }
    }
    out
}

/// Transforms a point by a column-major matrix, returning clip coordinates.
#[inline]
#[must_use]
pub fn mat4_transform_point(m: &Mat4, p: Vec3) -> [f32; 4] {
    [
        m[0][0] * p.x + m[1][0] * p.y + m[2][0] * p.z + m[3][0],
        m[0][1] * p.x + m[1][1] * p.y + m[2][1] * p.z + m[3][1],
        m[0][2] * p.x + m[1][2] * p.y + m[2][2] * p.z + m[3][2],
        m[0][3] * p.x + m[1][3] * p.y + m[2][3] * p.z + m[3][3],
    ]
}

/// Right-handed perspective projection with standard [0, 1] depth
/// (0 at the near plane).
#[must_use]
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y * 0.5).tan();
    let mut m = [[0.0f32; 4]; 4];
    m[0][0] = f / aspect;
    m[1][1] = f;
    m[2][2] = far / (near - far);
    m[2][3] = -1.0;
    m[3][2] = near * far / (near - far);
    m
}

/// Right-handed perspective projection with reversed [0, 1] depth
/// (1 at the near plane).
#[must_use]
pub fn perspective_reversed(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y * 0.5).tan();
    let mut m = [[0.0f32; 4]; 4];
    m[0][0] = f / aspect;
    m[1][1] = f;
    m[2][2] = near / (far - near);
    m[2][3] = -1.0;
    m[3][2] = near * far / (far - near);
    m
}

/// Right-handed look-at view matrix.
#[must_use]
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let fwd = (target - eye).normalized();
    let right = fwd.cross(up).normalized();
    let cam_up = right.cross(fwd);

    [
        [right.x, cam_up.x, -fwd.x, 0.0],
        [right.y, cam_up.y, -fwd.y, 0.0],
        [right.z, cam_up.z, -fwd.z, 0.0],
        [
            -right.dot(eye),
            -cam_up.dot(eye),
            fwd.dot(eye),
            1.0,
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_normalization() {
        let plane = Plane::new(3.0, 4.0, 0.0, 10.0);
        let normalized = plane.normalized();

        // 3-4-5 triangle, so length is 5
        assert!((normalized.a - 0.6).abs() < 0.001);
        assert!((normalized.b - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_vec3_bytemuck() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn test_frustum_sphere_in_front() {
        let view = look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = perspective(1.0, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_view_projection(&mat4_mul(&proj, &view));

        // Straight ahead of the camera
        assert!(frustum.test_sphere(BoundingSphere::new(Vec3::ZERO, 1.0)));
        // Behind the camera
        assert!(!frustum.test_sphere(BoundingSphere::new(Vec3::new(0.0, 0.0, 200.0), 1.0)));
        // Far off to the side
        assert!(!frustum.test_sphere(BoundingSphere::new(Vec3::new(500.0, 0.0, 0.0), 1.0)));
    }

    #[test]
    fn test_projection_depth_range() {
        let proj = perspective(1.0, 1.0, 0.5, 100.0);
        // A point on the near plane projects to depth 0
        let clip = mat4_transform_point(&proj, Vec3::new(0.0, 0.0, -0.5));
        assert!((clip[2] / clip[3]).abs() < 1e-5);
        // A point on the far plane projects to depth 1
        let clip = mat4_transform_point(&proj, Vec3::new(0.0, 0.0, -100.0));
        assert!((clip[2] / clip[3] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_reversed_projection_depth_range() {
        let proj = perspective_reversed(1.0, 1.0, 0.5, 100.0);
        let clip = mat4_transform_point(&proj, Vec3::new(0.0, 0.0, -0.5));
        assert!((clip[2] / clip[3] - 1.0).abs() < 1e-5);
        let clip = mat4_transform_point(&proj, Vec3::new(0.0, 0.0, -100.0));
        assert!((clip[2] / clip[3]).abs() < 1e-4);
    }

    #[test]
    fn test_facing_normalization_fallback() {
        assert_eq!(Vec2::ZERO.normalized_or_x(), Vec2::new(1.0, 0.0));
        let f = Vec2::new(3.0, 4.0).normalized_or_x();
        assert!((f.length() - 1.0).abs() < 1e-6);
    }
}
