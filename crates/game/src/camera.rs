//! Third-person camera rig.
//!
//! Two follow strategies share one rig: a mouse-orbited, smoothed follow
//! and a rigid chase locked behind the target. The rig outputs a position
//! and a look-at point; projection is the renderer's business.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::input::MOUSE_SENSITIVITY;

/// Pitch limit for the orbit camera, keeps it out of the ground and from
/// flipping over the target's head.
pub const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_3;

/// Per-frame position smoothing factor for the orbit camera.
pub const ORBIT_SMOOTHING: f32 = 0.1;

/// How a camera follows its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CameraStrategy {
    /// Mouse-orbited offset with lerped position. The smoothing factor is
    /// applied once per rendered frame, not per unit time, which gives the
    /// follow its weight and ties it to the display rate.
    OrbitFollow { offset: Vec3, look_offset: Vec3 },
    /// Offset rotated by the target's yaw, attached with no smoothing.
    RigidChase { offset: Vec3, look_offset: Vec3 },
}

impl CameraStrategy {
    /// Orbit follow with the standard over-the-shoulder framing.
    pub fn orbit() -> Self {
        CameraStrategy::OrbitFollow {
            offset: Vec3::new(0.0, 1.5, 4.0),
            look_offset: Vec3::new(0.0, 1.5, 0.0),
        }
    }

    /// Rigid chase, slightly higher and further back.
    pub fn chase() -> Self {
        CameraStrategy::RigidChase {
            offset: Vec3::new(0.0, 2.0, 5.0),
            look_offset: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

/// Pose of the followed entity for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPose {
    pub position: Vec3,
    pub yaw: f32,
}

/// The camera rig: orbit angles plus the smoothed position state.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub strategy: CameraStrategy,
    yaw: f32,
    pitch: f32,
    position: Vec3,
    look_at: Vec3,
}

impl CameraRig {
    pub fn new(strategy: CameraStrategy) -> Self {
        Self {
            strategy,
            yaw: 0.0,
            pitch: 0.0,
            position: Vec3::ZERO,
            look_at: Vec3::ZERO,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch is clamped on every mutation, so it can never leave the limit
    /// even across arbitrary event sequences.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Orbit from a mouse delta. Yaw is unbounded; pitch clamps immediately.
    pub fn apply_mouse(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * MOUSE_SENSITIVITY;
        self.pitch = (self.pitch - dy * MOUSE_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Advance the rig toward the target. `None` leaves the camera exactly
    /// where it is.
    pub fn update(&mut self, target: Option<TargetPose>) {
        let Some(target) = target else {
            return;
        };
        match self.strategy {
            CameraStrategy::OrbitFollow {
                offset,
                look_offset,
            } => {
                let orbit = Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0);
                let desired = target.position + orbit * offset;
                self.position = self.position.lerp(desired, ORBIT_SMOOTHING);
                self.look_at = target.position + look_offset;
            }
            CameraStrategy::RigidChase {
                offset,
                look_offset,
            } => {
                self.position = target.position + Quat::from_rotation_y(target.yaw) * offset;
                self.look_at = target.position + look_offset;
            }
        }
    }
}
