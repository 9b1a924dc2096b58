//! Per-frame camera state consumed by the culling kernel.

use sward_shared::{DepthConvention, Frustum, Mat4, Vec3};

/// Everything the kernel needs to know about the camera, captured once per
/// frame on the host.
#[derive(Clone, Copy, Debug)]
pub struct CameraState {
    /// Column-major view-projection matrix.
    pub view_proj: Mat4,
    /// Camera position in world space.
    pub position: Vec3,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
    /// Vertical field of view in radians. Drives the screen-radius
    /// estimate used for occlusion mip selection.
    pub fov_y: f32,
    /// Which end of [0, 1] depth is near.
    pub convention: DepthConvention,
}

impl CameraState {
    /// Extracts the six frustum planes from the view-projection matrix.
    ///
    /// Done once per frame on the host so the kernel never re-derives
    /// plane coefficients per instance.
    #[must_use]
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_proj)
    }

    /// Projection scale factor: world-units-at-unit-depth to NDC.
    #[inline]
    #[must_use]
    pub fn proj_scale(&self) -> f32 {
        1.0 / (self.fov_y * 0.5).tan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sward_shared::math::{look_at, mat4_mul, perspective};

    #[test]
    fn test_frustum_matches_matrix() {
        let view = look_at(Vec3::new(0.0, 5.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = perspective(1.2, 16.0 / 9.0, 0.1, 200.0);
        let camera = CameraState {
            view_proj: mat4_mul(&proj, &view),
            position: Vec3::new(0.0, 5.0, 10.0),
            near: 0.1,
            far: 200.0,
            fov_y: 1.2,
            convention: DepthConvention::Standard,
        };

        let frustum = camera.frustum();
        // The camera position itself sits behind the near plane.
        assert!(frustum.planes[4].distance_to_point(camera.position) < 0.0);
    }
}
