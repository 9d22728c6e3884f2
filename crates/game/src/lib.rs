//! Game layer for the freeroam prototype.
//!
//! Entities (player, car), input snapshotting, the camera rig and the
//! per-frame driver that orders control writes, the physics step and
//! visual sync. Rendering stays outside: this crate emits poses, nothing
//! else.

pub mod camera;
pub mod input;
pub mod player;
pub mod scene;
pub mod simulation;
pub mod vehicle;

pub use camera::{CameraRig, CameraStrategy, TargetPose};
pub use input::{Action, InputEvent, InputState};
pub use player::Player;
pub use scene::{Building, Level, VisualNode};
pub use simulation::{FollowTarget, Simulation, FIXED_TIMESTEP};
pub use vehicle::{default_drivetrain, Car, WheelRole, WheelSlot};
