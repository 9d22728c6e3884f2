//! The on-foot player entity.
//!
//! A rotation-locked sphere body driven by writing its horizontal velocity
//! directly. Yaw is tracked here, never on the body: the collider is
//! symmetric so rotating it buys nothing, and the visual mesh just gets the
//! tracked yaw.

use freeroam_physics::{BodyDesc, BodyHandle, PhysicsWorld, Shape, Surface};
use glam::{Quat, Vec3};

use crate::input::{InputState, MOUSE_SENSITIVITY};
use crate::scene::VisualNode;

/// Walk speed, m/s.
pub const PLAYER_SPEED: f32 = 5.0;

pub const PLAYER_RADIUS: f32 = 0.5;
pub const PLAYER_MASS: f32 = 70.0;

/// The player: one body, one visual node, a view yaw.
#[derive(Debug)]
pub struct Player {
    body: Option<BodyHandle>,
    pub node: VisualNode,
    pub yaw: f32,
}

impl Player {
    /// Spawn the player body at the given position.
    pub fn spawn(world: &mut PhysicsWorld, position: Vec3) -> Self {
        let body = world.add_body(
            BodyDesc::dynamic(
                Shape::Ball {
                    radius: PLAYER_RADIUS,
                },
                position,
                PLAYER_MASS,
            )
            .with_fixed_rotation()
            .with_surface(Surface::Player),
        );
        log::info!("player spawned at {position}");
        Self {
            body: Some(body),
            node: VisualNode {
                position,
                rotation: Quat::IDENTITY,
            },
            yaw: 0.0,
        }
    }

    /// A player with no body yet; every update is a guarded no-op until one
    /// is spawned.
    pub fn detached() -> Self {
        Self {
            body: None,
            node: VisualNode::default(),
            yaw: 0.0,
        }
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    /// Horizontal velocity for the given movement intent, relative to `yaw`.
    ///
    /// Zero intent gives exactly zero velocity; the normalize is guarded so
    /// no NaN can reach the body.
    pub fn desired_velocity(input: &InputState, yaw: f32) -> Vec3 {
        let mut intent = Vec3::ZERO;
        if input.forward {
            intent.z -= 1.0;
        }
        if input.backward {
            intent.z += 1.0;
        }
        if input.strafe_left {
            intent.x -= 1.0;
        }
        if input.strafe_right {
            intent.x += 1.0;
        }
        let dir = intent.normalize_or_zero();
        Quat::from_rotation_y(yaw) * dir * PLAYER_SPEED
    }

    /// Apply one tick of control: mouse turns the view yaw, movement keys
    /// overwrite the horizontal velocity. Vertical velocity stays with
    /// gravity and collisions.
    pub fn apply_control(&mut self, world: &mut PhysicsWorld, input: &InputState) {
        let Some(body) = self.body else {
            return;
        };
        self.yaw -= input.mouse_delta.x * MOUSE_SENSITIVITY;
        let velocity = Self::desired_velocity(input, self.yaw);
        world.set_horizontal_velocity(body, velocity.x, velocity.z);
    }

    /// Copy the interpolated body position into the visual node. Orientation
    /// comes from the tracked yaw, not the body.
    pub fn sync_visual(&mut self, world: &PhysicsWorld) {
        let Some(body) = self.body else {
            return;
        };
        if let Some((position, _)) = world.render_pose(body) {
            self.node.set_position(position);
        }
        self.node.set_yaw(self.yaw);
    }

    /// Current body position, if spawned.
    pub fn position(&self, world: &PhysicsWorld) -> Option<Vec3> {
        self.body.and_then(|b| world.body_position(b))
    }
}
