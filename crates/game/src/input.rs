//! Input events and the per-tick control snapshot.
//!
//! The platform layer translates raw window events into [`InputEvent`]s and
//! queues them as they arrive. The frame driver drains the queue into an
//! [`InputState`] exactly once per tick, before any entity runs, so entities
//! only ever see an immutable snapshot for the frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Engine force written by the throttle keys, in newtons.
pub const ENGINE_FORCE: f32 = 2000.0;

/// Maximum steering angle, in radians.
pub const STEER_LIMIT: f32 = 0.5;

/// Brake force written by the brake key, in newtons.
pub const BRAKE_FORCE: f32 = 100.0;

/// Mouse-delta-to-radians scale.
pub const MOUSE_SENSITIVITY: f32 = 0.002;

/// Logical actions the prototype binds.
///
/// The platform owns the physical mapping: arrow keys drive the player
/// scheme, WASD plus Space drive the vehicle scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    // Player scheme.
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    // Vehicle scheme.
    Throttle,
    Reverse,
    SteerLeft,
    SteerRight,
    Brake,
}

/// A single input event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Key { action: Action, pressed: bool },
    MouseMoved { dx: f32, dy: f32 },
    PointerLock(bool),
}

/// Control snapshot for one tick.
///
/// Key state persists across ticks; the mouse delta is per-frame and reset
/// at the start of every drain. Opposing vehicle keys write one shared
/// signed slot, so releasing either key zeroes the slot even while the other
/// is still held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    /// Player movement keys.
    pub forward: bool,
    pub backward: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,

    /// Vehicle control scalars, already scaled to physical units.
    pub engine_force: f32,
    pub steering: f32,
    pub brake: f32,

    /// Mouse movement accumulated this frame, pixels.
    pub mouse_delta: Vec2,

    /// Whether the window has captured the mouse.
    pub pointer_locked: bool,
}

impl InputState {
    /// Drain queued events into the snapshot for the coming tick.
    ///
    /// Mouse deltas only count while the pointer is locked; everything else
    /// applies unconditionally, in arrival order.
    pub fn drain<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = InputEvent>,
    {
        self.mouse_delta = Vec2::ZERO;
        for event in events {
            match event {
                InputEvent::Key { action, pressed } => self.apply_key(action, pressed),
                InputEvent::MouseMoved { dx, dy } => {
                    if self.pointer_locked {
                        self.mouse_delta += Vec2::new(dx, dy);
                    }
                }
                InputEvent::PointerLock(locked) => self.pointer_locked = locked,
            }
        }
    }

    fn apply_key(&mut self, action: Action, pressed: bool) {
        let held = if pressed { 1.0 } else { 0.0 };
        match action {
            Action::Forward => self.forward = pressed,
            Action::Backward => self.backward = pressed,
            Action::StrafeLeft => self.strafe_left = pressed,
            Action::StrafeRight => self.strafe_right = pressed,
            // Shared slots: key-up writes zero regardless of the other key.
            Action::Throttle => self.engine_force = held * ENGINE_FORCE,
            Action::Reverse => self.engine_force = -held * ENGINE_FORCE,
            Action::SteerLeft => self.steering = held * STEER_LIMIT,
            Action::SteerRight => self.steering = -held * STEER_LIMIT,
            Action::Brake => self.brake = held * BRAKE_FORCE,
        }
    }

    /// Whether any player movement key is held.
    pub fn has_movement(&self) -> bool {
        self.forward || self.backward || self.strafe_left || self.strafe_right
    }
}
