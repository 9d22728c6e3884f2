//! Physics world management on top of Rapier3d.
//!
//! [`PhysicsWorld`] owns the full rapier component set and advances it with a
//! fixed integration interval, decoupling simulation determinism from the
//! rendering frame rate. Bodies are created from a [`BodyDesc`] and addressed
//! through opaque [`BodyHandle`]s; registered [`RaycastVehicle`]s get their
//! suspension forces applied inside every substep.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use glam::{Quat, Vec3};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use rapier3d::dynamics::{
    CCDSolver, ImpulseJointSet, IntegrationParameters, IslandManager, MultibodyJointSet,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
};
use rapier3d::geometry::{BroadPhaseMultiSap, ColliderBuilder, ColliderSet, NarrowPhase};
use rapier3d::pipeline::{ActiveHooks, PhysicsPipeline, QueryPipeline};

use crate::material::{ContactProperties, MaterialTable, Surface};
use crate::vehicle::{RaycastVehicle, VehicleConfig};

/// Earth-ish gravity, straight down.
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.82, 0.0);

/// Velocity-solver iterations per substep.
pub const SOLVER_ITERATIONS: usize = 10;

/// Upper bound on fixed substeps caught up in a single `step` call.
pub const MAX_SUBSTEPS: u32 = 10;

/// Opaque handle to a rigid body owned by a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) RigidBodyHandle);

/// Opaque handle to a registered vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleHandle(usize);

/// Collision shape descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

/// Everything needed to create a rigid body.
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: Vec3,
    /// Mass in kg; 0 makes the body static (immovable).
    pub mass: f32,
    /// Lock all rotation, e.g. for the player capsule.
    pub fixed_rotation: bool,
    pub surface: Surface,
}

impl BodyDesc {
    /// A static (mass 0) body.
    pub fn fixed(shape: Shape, position: Vec3) -> Self {
        Self {
            shape,
            position,
            mass: 0.0,
            fixed_rotation: false,
            surface: Surface::Ground,
        }
    }

    /// A dynamic body of the given mass.
    pub fn dynamic(shape: Shape, position: Vec3, mass: f32) -> Self {
        Self {
            shape,
            position,
            mass,
            fixed_rotation: false,
            surface: Surface::Ground,
        }
    }

    pub fn with_fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }
}

/// The rigid-body simulation world.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector3<f32>,
    integration_params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,

    materials: MaterialTable,
    vehicles: Vec<RaycastVehicle>,

    // Fixed-step bookkeeping for render interpolation.
    prev_poses: HashMap<RigidBodyHandle, (Vec3, Quat)>,
    accumulator: f32,
    alpha: f32,
    sim_time: f32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create an empty world with default gravity and solver settings.
    pub fn new() -> Self {
        let mut integration_params = IntegrationParameters::default();
        if let Some(iterations) = NonZeroUsize::new(SOLVER_ITERATIONS) {
            integration_params.num_solver_iterations = iterations;
        }

        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vec_to_na(GRAVITY),
            integration_params,
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            materials: MaterialTable::new(),
            vehicles: Vec::new(),
            prev_poses: HashMap::new(),
            accumulator: 0.0,
            alpha: 0.0,
            sim_time: 0.0,
        }
    }

    /// Register a friction/restitution override for a pair of surfaces.
    pub fn register_contact_pair(&mut self, a: Surface, b: Surface, props: ContactProperties) {
        log::debug!(
            "contact rule {:?}<->{:?}: friction {}, restitution {}",
            a,
            b,
            props.friction,
            props.restitution
        );
        self.materials.register_pair(a, b, props);
    }

    /// Resolve the contact properties for a pair of surfaces.
    pub fn contact_properties(&self, a: Surface, b: Surface) -> ContactProperties {
        self.materials.lookup(a, b)
    }

    /// Create a rigid body with an attached collider.
    pub fn add_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let is_static = desc.mass <= 0.0;
        let mut builder = if is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        }
        .translation(vec_to_na(desc.position));
        if desc.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let handle = self.bodies.insert(builder.build());

        let defaults = self.materials.default_properties();
        let mut collider = match desc.shape {
            Shape::Ball { radius } => ColliderBuilder::ball(radius),
            Shape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        }
        .friction(defaults.friction)
        .restitution(defaults.restitution)
        .user_data(desc.surface.to_user_data())
        .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS);
        if !is_static {
            collider = collider.mass(desc.mass);
        }
        self.colliders
            .insert_with_parent(collider.build(), handle, &mut self.bodies);

        BodyHandle(handle)
    }

    /// `createStaticBody`: mass 0, never moves.
    pub fn create_static_body(&mut self, shape: Shape, position: Vec3) -> BodyHandle {
        self.add_body(BodyDesc::fixed(shape, position))
    }

    /// `createDynamicBody`: simulated body of the given mass.
    pub fn create_dynamic_body(&mut self, shape: Shape, position: Vec3, mass: f32) -> BodyHandle {
        self.add_body(BodyDesc::dynamic(shape, position, mass))
    }

    /// Register a raycast vehicle; its chassis body is created here.
    pub fn add_vehicle(&mut self, config: VehicleConfig, position: Vec3) -> VehicleHandle {
        let chassis = self.add_body(
            BodyDesc::dynamic(
                Shape::Cuboid {
                    half_extents: config.chassis_half_extents,
                },
                position,
                config.mass,
            )
            .with_surface(Surface::Chassis),
        );
        log::debug!(
            "vehicle added at {position}: {} wheels, mass {}",
            config.wheels.len(),
            config.mass
        );
        self.vehicles.push(RaycastVehicle::new(chassis.0, config));
        VehicleHandle(self.vehicles.len() - 1)
    }

    pub fn vehicle(&self, handle: VehicleHandle) -> Option<&RaycastVehicle> {
        self.vehicles.get(handle.0)
    }

    pub fn vehicle_mut(&mut self, handle: VehicleHandle) -> Option<&mut RaycastVehicle> {
        self.vehicles.get_mut(handle.0)
    }

    /// Current body position, if the handle is live.
    pub fn body_position(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies
            .get(handle.0)
            .map(|b| na_to_vec(b.translation()))
    }

    /// Current body orientation, if the handle is live.
    pub fn body_rotation(&self, handle: BodyHandle) -> Option<Quat> {
        self.bodies.get(handle.0).map(|b| quat_to_glam(b.rotation()))
    }

    /// Current linear velocity, if the handle is live.
    pub fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec3> {
        self.bodies.get(handle.0).map(|b| na_to_vec(b.linvel()))
    }

    /// Set the linear velocity of a dynamic body.
    ///
    /// Static bodies never receive externally-set velocity; the write is a
    /// silent no-op for them.
    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            if body.is_dynamic() {
                body.set_linvel(vec_to_na(velocity), true);
            }
        }
    }

    /// Overwrite the horizontal velocity components, leaving the vertical
    /// component to gravity and collisions.
    pub fn set_horizontal_velocity(&mut self, handle: BodyHandle, x: f32, z: f32) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            if body.is_dynamic() {
                let y = body.linvel().y;
                body.set_linvel(Vector3::new(x, y, z), true);
            }
        }
    }

    /// Pose blended between the last two substeps for rendering.
    ///
    /// Falls back to the raw body pose when the body has not been stepped
    /// yet or the handle is dead.
    pub fn render_pose(&self, handle: BodyHandle) -> Option<(Vec3, Quat)> {
        let body = self.bodies.get(handle.0)?;
        let current = (na_to_vec(body.translation()), quat_to_glam(body.rotation()));
        let Some(&(prev_pos, prev_rot)) = self.prev_poses.get(&handle.0) else {
            return Some(current);
        };
        Some((
            prev_pos.lerp(current.0, self.alpha),
            prev_rot.slerp(current.1, self.alpha),
        ))
    }

    /// Simulated time advanced so far, in whole fixed increments.
    pub fn sim_time(&self) -> f32 {
        self.sim_time
    }

    /// Advance the simulation.
    ///
    /// `fixed_dt` is the integration interval; `real_dt` is the wall-clock
    /// time since the previous call. The world integrates as many fixed
    /// substeps as the accumulated real time covers (capped at
    /// [`MAX_SUBSTEPS`]) and keeps the remainder as the interpolation alpha
    /// used by [`render_pose`](Self::render_pose).
    pub fn step(&mut self, fixed_dt: f32, real_dt: f32) {
        self.accumulator += real_dt.max(0.0);
        self.integration_params.dt = fixed_dt;

        // Colliders added since the last step are not in the query pipeline
        // yet; refresh so the first substep's suspension rays can hit them.
        self.query_pipeline.update(&self.colliders);

        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < MAX_SUBSTEPS {
            self.snapshot_poses();

            // Control forces for this substep: suspension, traction, braking.
            for vehicle in &mut self.vehicles {
                vehicle.apply_wheel_forces(
                    &mut self.bodies,
                    &self.colliders,
                    &self.query_pipeline,
                    fixed_dt,
                );
            }

            self.pipeline.step(
                &self.gravity,
                &self.integration_params,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &self.materials,
                &(),
            );

            for vehicle in &mut self.vehicles {
                vehicle.clear_forces(&mut self.bodies);
                // Wheel transforms refresh every substep: compression shifts
                // with load even while the vehicle is stationary.
                vehicle.update_wheel_transforms(&self.bodies, fixed_dt);
            }

            self.accumulator -= fixed_dt;
            self.sim_time += fixed_dt;
            substeps += 1;
        }

        // If the frame rate collapses, drop time instead of spiraling.
        if substeps == MAX_SUBSTEPS && self.accumulator > fixed_dt {
            self.accumulator = fixed_dt;
        }
        self.alpha = (self.accumulator / fixed_dt).clamp(0.0, 1.0);
    }

    fn snapshot_poses(&mut self) {
        for (handle, body) in self.bodies.iter() {
            self.prev_poses.insert(
                handle,
                (na_to_vec(body.translation()), quat_to_glam(body.rotation())),
            );
        }
    }
}

pub(crate) fn vec_to_na(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn pt_to_na(v: Vec3) -> Point3<f32> {
    Point3::new(v.x, v.y, v.z)
}

pub(crate) fn na_to_vec(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn quat_to_glam(q: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_DT: f32 = 1.0 / 60.0;

    fn world_with_ground() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        world.create_static_body(
            Shape::Cuboid {
                half_extents: Vec3::new(500.0, 0.5, 500.0),
            },
            Vec3::new(0.0, -0.5, 0.0),
        );
        world
    }

    #[test]
    fn test_static_body_ignores_velocity_writes() {
        let mut world = PhysicsWorld::new();
        let ground = world.create_static_body(
            Shape::Cuboid {
                half_extents: Vec3::new(10.0, 0.5, 10.0),
            },
            Vec3::ZERO,
        );

        world.set_linear_velocity(ground, Vec3::new(3.0, 0.0, 0.0));
        world.step(FIXED_DT, FIXED_DT);

        assert_eq!(world.linear_velocity(ground).unwrap(), Vec3::ZERO);
        assert_eq!(world.body_position(ground).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_horizontal_velocity_preserves_vertical() {
        let mut world = PhysicsWorld::new();
        let ball = world.create_dynamic_body(
            Shape::Ball { radius: 0.5 },
            Vec3::new(0.0, 5.0, 0.0),
            70.0,
        );

        world.set_linear_velocity(ball, Vec3::new(0.0, -2.0, 0.0));
        world.set_horizontal_velocity(ball, 1.0, -5.0);

        let v = world.linear_velocity(ball).unwrap();
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, -2.0);
        assert_eq!(v.z, -5.0);
    }

    #[test]
    fn test_contact_properties_resolve_through_the_world() {
        let mut world = PhysicsWorld::new();
        world.register_contact_pair(
            Surface::Player,
            Surface::Ground,
            ContactProperties {
                friction: 0.5,
                restitution: 0.1,
            },
        );

        let props = world.contact_properties(Surface::Ground, Surface::Player);
        assert_eq!(props.friction, 0.5);
        assert_eq!(props.restitution, 0.1);

        let fallback = world.contact_properties(Surface::Chassis, Surface::Ground);
        assert_eq!(fallback.friction, 0.1);
    }

    #[test]
    fn test_gravity_pulls_dynamic_bodies_down() {
        let mut world = PhysicsWorld::new();
        let ball = world.create_dynamic_body(
            Shape::Ball { radius: 0.5 },
            Vec3::new(0.0, 10.0, 0.0),
            1.0,
        );

        for _ in 0..60 {
            world.step(FIXED_DT, FIXED_DT);
        }

        let pos = world.body_position(ball).unwrap();
        assert!(pos.y < 10.0, "ball should have fallen, y={}", pos.y);
        assert!(world.linear_velocity(ball).unwrap().y < 0.0);
    }

    #[test]
    fn test_ball_rests_on_ground() {
        let mut world = world_with_ground();
        let ball = world.create_dynamic_body(
            Shape::Ball { radius: 0.5 },
            Vec3::new(0.0, 5.0, 0.0),
            70.0,
        );

        for _ in 0..300 {
            world.step(FIXED_DT, FIXED_DT);
        }

        let pos = world.body_position(ball).unwrap();
        assert!(
            (pos.y - 0.5).abs() < 0.1,
            "ball should rest at its radius above the ground, y={}",
            pos.y
        );
    }

    #[test]
    fn test_fixed_step_accumulator() {
        let mut world = PhysicsWorld::new();
        world.create_dynamic_body(Shape::Ball { radius: 0.5 }, Vec3::new(0.0, 5.0, 0.0), 1.0);

        // Three fixed intervals of real time in one call: three substeps.
        world.step(FIXED_DT, 3.0 * FIXED_DT);
        assert!((world.sim_time() - 3.0 * FIXED_DT).abs() < 1e-5);

        // Less than one interval: no substep yet, time unchanged.
        world.step(FIXED_DT, 0.25 * FIXED_DT);
        assert!((world.sim_time() - 3.0 * FIXED_DT).abs() < 1e-5);
    }

    #[test]
    fn test_substep_cap_under_frame_collapse() {
        let mut world = PhysicsWorld::new();
        world.create_dynamic_body(Shape::Ball { radius: 0.5 }, Vec3::new(0.0, 5.0, 0.0), 1.0);

        // A two-second hitch must not integrate 120 substeps.
        world.step(FIXED_DT, 2.0);
        let expected_max = (MAX_SUBSTEPS as f32) * FIXED_DT;
        assert!(world.sim_time() <= expected_max + 1e-5);
    }

    #[test]
    fn test_render_pose_matches_body_before_stepping() {
        let mut world = PhysicsWorld::new();
        let ball = world.create_dynamic_body(
            Shape::Ball { radius: 0.5 },
            Vec3::new(1.0, 2.0, 3.0),
            1.0,
        );

        let (pos, rot) = world.render_pose(ball).unwrap();
        assert_eq!(pos, Vec3::new(1.0, 2.0, 3.0));
        assert!((rot.length() - 1.0).abs() < 1e-5);
    }
}
