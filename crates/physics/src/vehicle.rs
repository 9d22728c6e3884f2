//! Raycast vehicle: a dynamic chassis with spring-damper wheels.
//!
//! Wheels are not rigid bodies. Each one casts a ray from its chassis
//! attachment point along the suspension direction; a hit produces a
//! spring-damper force plus tire traction (engine, brake, lateral grip)
//! applied to the chassis at the contact point. The chassis itself is an
//! ordinary rigid body owned by the [`PhysicsWorld`](crate::PhysicsWorld).

use glam::{Quat, Vec3};
use rapier3d::dynamics::{RigidBodyHandle, RigidBodySet};
use rapier3d::geometry::{ColliderSet, Ray};
use rapier3d::pipeline::{QueryFilter, QueryPipeline};
use serde::{Deserialize, Serialize};

use crate::world::{na_to_vec, pt_to_na, quat_to_glam, vec_to_na, BodyHandle};

/// Tuning for a single wheel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WheelConfig {
    pub radius: f32,
    /// Suspension length with no load.
    pub suspension_rest: f32,
    /// Spring constant, scaled by the chassis mass.
    pub suspension_stiffness: f32,
    /// Damping while the spring is compressing.
    pub damping_compression: f32,
    /// Damping while the spring is extending.
    pub damping_relaxation: f32,
    /// Lateral grip limit as a fraction of suspension load.
    pub friction_slip: f32,
    /// 0 applies lateral force at chassis height (no body roll),
    /// 1 at the contact point (full roll).
    pub roll_influence: f32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            radius: 0.4,
            suspension_rest: 0.3,
            suspension_stiffness: 30.0,
            damping_compression: 4.4,
            damping_relaxation: 2.3,
            friction_slip: 1.4,
            roll_influence: 0.01,
        }
    }
}

/// A wheel's mounting point plus its tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WheelDesc {
    /// Attachment point in chassis-local space.
    pub attach_point: Vec3,
    pub config: WheelConfig,
}

/// Full vehicle tuning: chassis plus wheels, indexed by slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub chassis_half_extents: Vec3,
    pub mass: f32,
    /// Suspension direction in chassis-local space.
    pub suspension_direction: Vec3,
    /// Wheel spin axis in chassis-local space.
    pub axle: Vec3,
    pub wheels: Vec<WheelDesc>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        let wheel = WheelConfig::default();
        // Slots: 0 front-left, 1 front-right, 2 rear-left, 3 rear-right.
        let wheels = vec![
            WheelDesc {
                attach_point: Vec3::new(-0.9, 0.0, 1.5),
                config: wheel,
            },
            WheelDesc {
                attach_point: Vec3::new(0.9, 0.0, 1.5),
                config: wheel,
            },
            WheelDesc {
                attach_point: Vec3::new(-0.9, 0.0, -1.5),
                config: wheel,
            },
            WheelDesc {
                attach_point: Vec3::new(0.9, 0.0, -1.5),
                config: wheel,
            },
        ];
        Self {
            chassis_half_extents: Vec3::new(1.0, 0.5, 2.0),
            mass: 1500.0,
            suspension_direction: Vec3::new(0.0, -1.0, 0.0),
            axle: Vec3::new(-1.0, 0.0, 0.0),
            wheels,
        }
    }
}

impl VehicleConfig {
    /// Forward direction in chassis-local space, derived from the axle and
    /// suspension orientation.
    pub fn forward_local(&self) -> Vec3 {
        self.axle.cross(self.suspension_direction)
    }
}

/// Per-wheel runtime state.
#[derive(Debug, Clone, Copy)]
pub struct Wheel {
    desc: WheelDesc,
    /// Control inputs for this slot.
    pub engine_force: f32,
    pub steering: f32,
    pub brake: f32,
    /// Updated each substep from the suspension raycast.
    pub in_contact: bool,
    pub compression: f32,
    pub suspension_length: f32,
    /// Pose for rendering, in world space.
    pub world_position: Vec3,
    pub world_rotation: Quat,

    spin: f32,
    ground_speed: f32,
}

impl Wheel {
    fn new(desc: WheelDesc) -> Self {
        Self {
            desc,
            engine_force: 0.0,
            steering: 0.0,
            brake: 0.0,
            in_contact: false,
            compression: 0.0,
            suspension_length: desc.config.suspension_rest,
            world_position: Vec3::ZERO,
            world_rotation: Quat::IDENTITY,
            spin: 0.0,
            ground_speed: 0.0,
        }
    }

    pub fn radius(&self) -> f32 {
        self.desc.config.radius
    }

    pub fn attach_point(&self) -> Vec3 {
        self.desc.attach_point
    }
}

/// A chassis body with raycast wheels attached.
pub struct RaycastVehicle {
    chassis: RigidBodyHandle,
    config: VehicleConfig,
    wheels: Vec<Wheel>,
}

impl RaycastVehicle {
    pub(crate) fn new(chassis: RigidBodyHandle, config: VehicleConfig) -> Self {
        let wheels = config.wheels.iter().copied().map(Wheel::new).collect();
        Self {
            chassis,
            config,
            wheels,
        }
    }

    /// Handle of the chassis body, for pose and velocity queries through the
    /// owning world.
    pub fn chassis(&self) -> BodyHandle {
        BodyHandle(self.chassis)
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn wheel_count(&self) -> usize {
        self.wheels.len()
    }

    pub fn wheel(&self, slot: usize) -> Option<&Wheel> {
        self.wheels.get(slot)
    }

    pub fn wheels(&self) -> impl Iterator<Item = &Wheel> {
        self.wheels.iter()
    }

    /// Set the drive force for one wheel slot. Out-of-range slots are ignored.
    pub fn set_engine_force(&mut self, slot: usize, force: f32) {
        if let Some(wheel) = self.wheels.get_mut(slot) {
            wheel.engine_force = force;
        }
    }

    /// Set the steering angle (radians) for one wheel slot.
    pub fn set_steering(&mut self, slot: usize, angle: f32) {
        if let Some(wheel) = self.wheels.get_mut(slot) {
            wheel.steering = angle;
        }
    }

    /// Set the braking force for one wheel slot.
    pub fn set_brake(&mut self, slot: usize, force: f32) {
        if let Some(wheel) = self.wheels.get_mut(slot) {
            wheel.brake = force;
        }
    }

    /// Raycast every wheel and push the resulting suspension and tire forces
    /// onto the chassis. Runs once per fixed substep, before the solver.
    pub(crate) fn apply_wheel_forces(
        &mut self,
        bodies: &mut RigidBodySet,
        colliders: &ColliderSet,
        query_pipeline: &QueryPipeline,
        dt: f32,
    ) {
        let Some(chassis) = bodies.get(self.chassis) else {
            return;
        };
        let iso = *chassis.position();
        let linvel = na_to_vec(chassis.linvel());
        let angvel = na_to_vec(chassis.angvel());
        let com = na_to_vec(&chassis.center_of_mass().coords);
        let chassis_rot = quat_to_glam(&iso.rotation);
        let up_world = chassis_rot * -self.config.suspension_direction;
        let mass_share = self.config.mass / self.wheels.len().max(1) as f32;
        let forward_local = self.config.forward_local();

        let filter = QueryFilter::default().exclude_rigid_body(self.chassis);
        let mut forces: Vec<(Vec3, Vec3)> = Vec::with_capacity(self.wheels.len() * 3);

        for wheel in &mut self.wheels {
            let cfg = wheel.desc.config;
            let attach_world = na_to_vec(&(iso * pt_to_na(wheel.desc.attach_point)).coords);
            let dir_world = chassis_rot * self.config.suspension_direction;
            let ray_length = cfg.suspension_rest + cfg.radius;

            let ray = Ray::new(pt_to_na(attach_world), vec_to_na(dir_world));
            let hit = query_pipeline.cast_ray(bodies, colliders, &ray, ray_length, true, filter);

            let Some((_, toi)) = hit else {
                wheel.in_contact = false;
                wheel.compression = 0.0;
                wheel.suspension_length = cfg.suspension_rest;
                wheel.ground_speed = 0.0;
                continue;
            };

            wheel.in_contact = true;
            wheel.suspension_length = (toi - cfg.radius).clamp(0.0, cfg.suspension_rest);
            wheel.compression = cfg.suspension_rest - wheel.suspension_length;

            let contact = attach_world + dir_world * toi;
            let point_vel = linvel + angvel.cross(contact - com);

            // Spring-damper along the suspension axis, scaled by the full
            // chassis mass. Positive closing speed means the chassis is
            // moving toward the ground.
            let closing_speed = point_vel.dot(dir_world);
            let damping = if closing_speed > 0.0 {
                cfg.damping_compression
            } else {
                cfg.damping_relaxation
            };
            let load = (self.config.mass
                * (cfg.suspension_stiffness * wheel.compression + damping * closing_speed))
                .max(0.0);
            forces.push((-dir_world * load, contact));

            // Tire frame, steered about the chassis up axis.
            let steer_q = Quat::from_axis_angle(-self.config.suspension_direction, wheel.steering);
            let forward_world = chassis_rot * (steer_q * forward_local);
            let axle_world = chassis_rot * (steer_q * self.config.axle);

            let v_long = point_vel.dot(forward_world);
            let v_lat = point_vel.dot(axle_world);
            wheel.ground_speed = v_long;
            let grip_limit = cfg.friction_slip * load;

            // Drive and brake along the rolling direction, clamped by grip.
            // The brake is a force cap so it cannot reverse the wheel within
            // one substep.
            let mut f_long = wheel.engine_force;
            if wheel.brake > 0.0 && v_long.abs() > 1e-4 {
                let stopping = (v_long.abs() * mass_share / dt).min(wheel.brake);
                f_long -= stopping * v_long.signum();
            }
            let f_long = f_long.clamp(-grip_limit, grip_limit);
            if f_long.abs() > 0.0 {
                forces.push((forward_world * f_long, contact));
            }

            // Lateral grip, clamped by the load on this wheel. Applied at a
            // point raised toward the center of mass so a hard turn leans the
            // chassis instead of flipping it.
            let f_lat = (-v_lat * mass_share / dt).clamp(-grip_limit, grip_limit);
            if f_lat.abs() > 0.0 {
                let lift = (com - contact).dot(up_world) * (1.0 - cfg.roll_influence);
                let lat_point = contact + up_world * lift;
                forces.push((axle_world * f_lat, lat_point));
            }
        }

        if let Some(chassis) = bodies.get_mut(self.chassis) {
            for (force, point) in forces {
                chassis.add_force_at_point(vec_to_na(force), pt_to_na(point), true);
            }
        }
    }

    /// Drop the forces pushed by [`apply_wheel_forces`]; rapier accumulates
    /// them across steps otherwise.
    pub(crate) fn clear_forces(&mut self, bodies: &mut RigidBodySet) {
        if let Some(chassis) = bodies.get_mut(self.chassis) {
            chassis.reset_forces(true);
        }
    }

    /// Recompute each wheel's world pose from the chassis pose, suspension
    /// length, steering angle and accumulated spin.
    pub(crate) fn update_wheel_transforms(&mut self, bodies: &RigidBodySet, dt: f32) {
        let Some(chassis) = bodies.get(self.chassis) else {
            return;
        };
        let iso = *chassis.position();
        let chassis_rot = quat_to_glam(&iso.rotation);

        for wheel in &mut self.wheels {
            let center_local =
                wheel.desc.attach_point + self.config.suspension_direction * wheel.suspension_length;
            wheel.world_position = na_to_vec(&(iso * pt_to_na(center_local)).coords);

            if wheel.in_contact {
                // Rolling about the -x axle: forward travel spins negative.
                wheel.spin -= wheel.ground_speed / wheel.desc.config.radius * dt;
            }
            let steer_q = Quat::from_axis_angle(-self.config.suspension_direction, wheel.steering);
            let spin_q = Quat::from_axis_angle(self.config.axle, wheel.spin);
            wheel.world_rotation = chassis_rot * steer_q * spin_q;
        }
    }
}
