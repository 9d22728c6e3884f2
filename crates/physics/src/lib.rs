//! Rigid-body physics for the freeroam prototype.
//!
//! Wraps Rapier behind a small world API: body creation from descriptors,
//! guarded velocity writes, a fixed-step accumulator with render-pose
//! interpolation, pair-wise contact materials, and a raycast-suspension
//! vehicle. Consumers never touch rapier types directly.

pub mod material;
pub mod vehicle;
pub mod world;

pub use material::{ContactProperties, MaterialTable, Surface};
pub use vehicle::{RaycastVehicle, VehicleConfig, Wheel, WheelConfig, WheelDesc};
pub use world::{
    BodyDesc, BodyHandle, PhysicsWorld, Shape, VehicleHandle, GRAVITY, MAX_SUBSTEPS,
    SOLVER_ITERATIONS,
};
