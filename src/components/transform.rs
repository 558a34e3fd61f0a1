//! Scene-graph node holding an actor's local position, rotation and scale.
//!
//! Every actor entity carries exactly one [`Transform`]. Parent/child links are
//! entity handles: the parent tracks its children for dirty propagation and
//! matrix composition, but never owns them.
//!
//! The world matrices are memoized. A cache slot set to `None` means "must be
//! recomputed"; there is no way to observe a stale matrix. All mutation goes
//! through [`TransformOps`](crate::scene::transform_ops::TransformOps) so that
//! invalidation always reaches every descendant.

use bevy_ecs::prelude::*;
use smallvec::SmallVec;

use crate::math::{Mat4, Quat, Vec3};

/// Local transform plus hierarchy links and cached world matrices.
#[derive(Component, Debug)]
pub struct Transform {
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    pub(crate) scale: Vec3,
    pub(crate) parent: Option<Entity>,
    pub(crate) children: SmallVec<[Entity; 4]>,
    pub(crate) local_to_world: Option<Mat4>,
    pub(crate) world_to_local: Option<Mat4>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }
}

impl Transform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            parent: None,
            children: SmallVec::new(),
            local_to_world: None,
            world_to_local: None,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY, Vec3::ONE)
    }

    /// Local position, relative to the parent.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Local rotation, relative to the parent.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Local scale, relative to the parent.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    /// Children in attachment order.
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// True when the local-to-world matrix must be recomputed before use.
    pub fn is_dirty(&self) -> bool {
        self.local_to_world.is_none()
    }

    /// Local TRS matrix: scale, then rotate, then translate.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub(crate) fn invalidate(&mut self) {
        self.local_to_world = None;
        self.world_to_local = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity_and_dirty() {
        let t = Transform::default();
        assert_eq!(t.position(), Vec3::ZERO);
        assert_eq!(t.rotation(), Quat::IDENTITY);
        assert_eq!(t.scale(), Vec3::ONE);
        assert_eq!(t.local_matrix(), Mat4::IDENTITY);
        assert!(t.is_dirty());
        assert!(t.parent().is_none());
        assert!(t.children().is_empty());
    }

    #[test]
    fn local_matrix_applies_scale_rotation_translation() {
        let t = Transform::new(
            Vec3::new(5.0, 0.0, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(2.0, 1.0, 1.0),
        );
        // (1,0,0) scaled -> (2,0,0), rotated 90deg about Z -> (0,2,0), translated -> (5,2,0)
        let p = t.local_matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(5.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn invalidate_clears_both_caches() {
        let mut t = Transform::default();
        t.local_to_world = Some(Mat4::IDENTITY);
        t.world_to_local = Some(Mat4::IDENTITY);
        assert!(!t.is_dirty());
        t.invalidate();
        assert!(t.local_to_world.is_none());
        assert!(t.world_to_local.is_none());
    }
}
