//! Camera anchors
//!
//! The anchor is the point the first-person camera hangs from: normally the character's head or
//! neck bone, otherwise the character root. The controller reads the anchor once per tick.
//!
//! Hosts with a real skeleton implement [`AnchorProvider`] over their bone transforms. The
//! [`BoneAnchor`] type is a shared, settable pose for hosts that push bone data each frame.

use std::cell::Cell;
use std::fmt;

use glam::{Quat, Vec3};

/// Source of the head/neck bone pose, relative to the character root.
pub trait AnchorProvider: fmt::Debug {
    /// Bone position in character-local space, `None` when the character has no such bone.
    fn local_offset(&self) -> Option<Vec3>;

    /// Bone rotation in character-local space.
    fn local_rotation(&self) -> Option<Quat> {
        None
    }
}

/// Pose of a bone relative to the character root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    pub offset: Vec3,
    pub rotation: Quat,
}

impl Default for BonePose {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 1.6, 0.0),
            rotation: Quat::IDENTITY,
        }
    }
}

/// A head bone whose pose is pushed by the host every frame.
///
/// Share it as `Rc<BoneAnchor>`: the host keeps one handle to call [`BoneAnchor::set_pose`], the
/// controller keeps another.
#[derive(Debug, Default)]
pub struct BoneAnchor {
    pose: Cell<BonePose>,
}

impl BoneAnchor {
    pub fn new(pose: BonePose) -> Self {
        Self { pose: Cell::new(pose) }
    }

    /// Bone at `offset` with no rotation.
    pub fn at(offset: Vec3) -> Self {
        Self::new(BonePose {
            offset,
            rotation: Quat::IDENTITY,
        })
    }

    #[inline]
    pub fn pose(&self) -> BonePose {
        self.pose.get()
    }

    #[inline]
    pub fn set_pose(&self, pose: BonePose) {
        self.pose.set(pose);
    }

    #[inline]
    pub fn set_offset(&self, offset: Vec3) {
        let mut pose = self.pose.get();
        pose.offset = offset;
        self.pose.set(pose);
    }

    #[inline]
    pub fn set_rotation(&self, rotation: Quat) {
        let mut pose = self.pose.get();
        pose.rotation = rotation;
        self.pose.set(pose);
    }
}

impl AnchorProvider for BoneAnchor {
    fn local_offset(&self) -> Option<Vec3> {
        Some(self.pose.get().offset)
    }

    fn local_rotation(&self) -> Option<Quat> {
        Some(self.pose.get().rotation)
    }
}

/// Fallback for characters without a head bone: the camera hangs from the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootAnchor;

impl AnchorProvider for RootAnchor {
    fn local_offset(&self) -> Option<Vec3> {
        None
    }
}
