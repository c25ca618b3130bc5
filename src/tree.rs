// SPDX-License-Identifier: MPL-2.0

//! A hierarchy of transforms.
//!
//! Nodes are shared through [`Rc`] so that several objects may hang off a common group, e.g. every
//! mesh of a rocket stage. Transform components use interior mutability; moving a group is a matter
//! of calling [`Node::set_position`] on the shared handle.

use std::{
    cell::Cell,
    rc::{Rc, Weak},
};

use crate::linear::{Mat4, Quat, Vec3};

impl Default for Node {
    fn default() -> Self {
        Self {
            parent: Weak::new(),
            position: Cell::new(Vec3::ZERO),
            rotation: Cell::new(Quat::IDENTITY),
            scale: Cell::new(Vec3::ONE),
            cached_local_matrix: Cell::new(None),
        }
    }
}

#[derive(Debug)]
pub struct Node {
    parent: Weak<Node>,
    /// The position of this node relative to its parent.
    position: Cell<Vec3>,
    /// The rotation of this node relative to the rotation of its parent.
    rotation: Cell<Quat>,
    /// The per-axis scale factor of this node's coordinates.
    scale: Cell<Vec3>,
    /// The local transformation matrix from a previous call to
    /// [`local_transformation_matrix`](Self::local_transformation_matrix), if still valid.
    ///
    /// Global matrices are not cached as a parent may move without its children knowing.
    cached_local_matrix: Cell<Option<Mat4>>,
}

impl Node {
    /// Creates a new root node.
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Creates a new node whose transform is relative to `parent`.
    pub fn child_of(parent: &Rc<Node>) -> Rc<Self> {
        Rc::new(Self {
            parent: Rc::downgrade(parent),
            ..Default::default()
        })
    }

    /// Creates a new node whose transform is relative to `parent`, placed at `position`.
    pub fn child_at(parent: &Rc<Node>, position: Vec3) -> Rc<Self> {
        let node = Self::child_of(parent);
        node.set_position(position);

        node
    }

    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.upgrade()
    }

    pub fn position(&self) -> Vec3 {
        self.position.get()
    }

    pub fn set_position(&self, position: Vec3) {
        self.position.set(position);
        self.invalidate_cache();
    }

    pub fn translate(&self, delta: Vec3) {
        self.set_position(self.position() + delta);
    }

    pub fn rotation(&self) -> Quat {
        self.rotation.get()
    }

    pub fn set_rotation(&self, rotation: Quat) {
        self.rotation.set(rotation);
        self.invalidate_cache();
    }

    /// Applies `delta` after the current rotation, in the node's local frame.
    pub fn rotate(&self, delta: Quat) {
        self.set_rotation((self.rotation() * delta).normalize());
    }

    pub fn scale(&self) -> Vec3 {
        self.scale.get()
    }

    pub fn set_scale(&self, scale: Vec3) {
        self.scale.set(scale);
        self.invalidate_cache();
    }

    pub fn invalidate_cache(&self) {
        self.cached_local_matrix.set(None);
    }

    /// The position of this node's origin in world space.
    pub fn world_position(&self) -> Vec3 {
        self.global_transformation_matrix().transform_point3(Vec3::ZERO)
    }

    /// The global transformation matrix for this node.
    ///
    /// This is the product of every ancestor's local matrix and this node's own.
    pub fn global_transformation_matrix(&self) -> Mat4 {
        let local = self.local_transformation_matrix();

        // With column vectors the parent's transform is applied last, so it goes on the left.
        match self.parent.upgrade() {
            Some(parent) => parent.global_transformation_matrix() * local,
            None => local,
        }
    }

    /// The local transformation matrix for this node.
    ///
    /// This will return a cached copy if one is available.
    pub fn local_transformation_matrix(&self) -> Mat4 {
        if let Some(matrix) = self.cached_local_matrix.get() {
            return matrix;
        }

        // Scale first, then rotate, then translate.
        let matrix = Mat4::from_scale_rotation_translation(
            self.scale(),
            self.rotation(),
            self.position(),
        );
        self.cached_local_matrix.set(Some(matrix));

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn child_inherits_parent_translation() {
        let root = Node::root();
        let child = Node::child_at(&root, Vec3::new(0., 1., 0.));
        root.set_position(Vec3::new(10., 0., 0.));

        assert!((child.world_position() - Vec3::new(10., 1., 0.)).length() < 1e-5);
    }

    #[test]
    fn parent_rotation_swings_child_offset() {
        let root = Node::root();
        let child = Node::child_at(&root, Vec3::new(1., 0., 0.));
        root.set_rotation(Quat::from_rotation_y(FRAC_PI_2));

        assert!((child.world_position() - Vec3::new(0., 0., -1.)).length() < 1e-5);
    }

    #[test]
    fn cache_is_refreshed_after_mutation() {
        let node = Node::root();
        let before = node.local_transformation_matrix();
        node.translate(Vec3::X);
        let after = node.local_transformation_matrix();

        assert_ne!(before, after);
        assert!((after.transform_point3(Vec3::ZERO) - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn orphaned_child_falls_back_to_local() {
        let child = {
            let root = Node::root();
            root.set_position(Vec3::splat(5.));
            Node::child_at(&root, Vec3::Y)
        };

        assert!(child.parent().is_none());
        assert!((child.world_position() - Vec3::Y).length() < 1e-6);
    }
}
