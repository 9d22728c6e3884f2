//! The drivable car entity.
//!
//! Owns a registered raycast vehicle plus the visual nodes for the chassis
//! and each wheel. Which wheel does what is data, not hard-coded indices: a
//! role table says per slot whether it is driven, steered, or braked. The
//! default drivetrain is rear-wheel drive with front steering and
//! front-only braking.

use freeroam_physics::{PhysicsWorld, VehicleConfig, VehicleHandle};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::input::InputState;
use crate::scene::VisualNode;

/// Named wheel positions, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelSlot {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl WheelSlot {
    pub const ALL: [WheelSlot; 4] = [
        WheelSlot::FrontLeft,
        WheelSlot::FrontRight,
        WheelSlot::RearLeft,
        WheelSlot::RearRight,
    ];

    pub fn index(self) -> usize {
        match self {
            WheelSlot::FrontLeft => 0,
            WheelSlot::FrontRight => 1,
            WheelSlot::RearLeft => 2,
            WheelSlot::RearRight => 3,
        }
    }
}

/// What one wheel slot does in the drivetrain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WheelRole {
    pub slot: WheelSlot,
    pub driven: bool,
    pub steers: bool,
    pub brakes: bool,
}

/// Rear-wheel drive, front steering, front-only braking.
pub fn default_drivetrain() -> Vec<WheelRole> {
    WheelSlot::ALL
        .into_iter()
        .map(|slot| {
            let front = matches!(slot, WheelSlot::FrontLeft | WheelSlot::FrontRight);
            WheelRole {
                slot,
                driven: !front,
                steers: front,
                brakes: front,
            }
        })
        .collect()
}

/// The car: a vehicle handle, its role table, and the visual nodes.
#[derive(Debug)]
pub struct Car {
    vehicle: VehicleHandle,
    roles: Vec<WheelRole>,
    pub chassis_node: VisualNode,
    pub wheel_nodes: [VisualNode; 4],
}

impl Car {
    /// Spawn the car with default tuning and drivetrain.
    pub fn spawn(world: &mut PhysicsWorld, position: Vec3) -> Self {
        Self::spawn_with(world, VehicleConfig::default(), default_drivetrain(), position)
    }

    pub fn spawn_with(
        world: &mut PhysicsWorld,
        config: VehicleConfig,
        roles: Vec<WheelRole>,
        position: Vec3,
    ) -> Self {
        let vehicle = world.add_vehicle(config, position);
        Self {
            vehicle,
            roles,
            chassis_node: VisualNode {
                position,
                ..Default::default()
            },
            wheel_nodes: [VisualNode::default(); 4],
        }
    }

    pub fn handle(&self) -> VehicleHandle {
        self.vehicle
    }

    pub fn roles(&self) -> &[WheelRole] {
        &self.roles
    }

    /// Push the input scalars to the slots named by the role table. Slots
    /// without a role for a control keep their previous value of zero.
    pub fn apply_control(&self, world: &mut PhysicsWorld, input: &InputState) {
        let Some(vehicle) = world.vehicle_mut(self.vehicle) else {
            return;
        };
        for role in &self.roles {
            let slot = role.slot.index();
            if role.driven {
                vehicle.set_engine_force(slot, input.engine_force);
            }
            if role.steers {
                vehicle.set_steering(slot, input.steering);
            }
            if role.brakes {
                vehicle.set_brake(slot, input.brake);
            }
        }
    }

    /// Copy the chassis and wheel poses into the visual nodes. The chassis
    /// uses the interpolated body pose; wheels use their derived transforms.
    pub fn sync_visual(&mut self, world: &PhysicsWorld) {
        let Some(vehicle) = world.vehicle(self.vehicle) else {
            return;
        };
        if let Some((position, rotation)) = world.render_pose(vehicle.chassis()) {
            self.chassis_node.set_position(position);
            self.chassis_node.set_orientation(rotation);
        }
        for (node, wheel) in self.wheel_nodes.iter_mut().zip(vehicle.wheels()) {
            node.set_position(wheel.world_position);
            node.set_orientation(wheel.world_rotation);
        }
    }

    /// Current chassis position, if the vehicle is live.
    pub fn position(&self, world: &PhysicsWorld) -> Option<Vec3> {
        world
            .vehicle(self.vehicle)
            .and_then(|v| world.body_position(v.chassis()))
    }

    /// Chassis yaw derived from the body orientation.
    pub fn yaw(&self, world: &PhysicsWorld) -> Option<f32> {
        let vehicle = world.vehicle(self.vehicle)?;
        let rotation = world.body_rotation(vehicle.chassis())?;
        let forward = rotation * Vec3::new(0.0, 0.0, 1.0);
        Some(forward.x.atan2(forward.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Action, InputEvent, BRAKE_FORCE, ENGINE_FORCE, STEER_LIMIT};
    use crate::scene::Level;

    fn pressed(action: Action) -> InputEvent {
        InputEvent::Key {
            action,
            pressed: true,
        }
    }

    fn spawn_on_ground() -> (PhysicsWorld, Car) {
        let mut world = PhysicsWorld::new();
        Level::empty().build(&mut world);
        let car = Car::spawn(&mut world, Vec3::new(0.0, 2.0, 0.0));
        (world, car)
    }

    #[test]
    fn test_default_drivetrain_roles() {
        let roles = default_drivetrain();
        assert_eq!(roles.len(), 4);
        for role in &roles {
            let front = matches!(role.slot, WheelSlot::FrontLeft | WheelSlot::FrontRight);
            assert_eq!(role.steers, front);
            assert_eq!(role.brakes, front);
            assert_eq!(role.driven, !front);
        }
    }

    #[test]
    fn test_controls_reach_only_their_slots() {
        let (mut world, car) = spawn_on_ground();

        let mut input = InputState::default();
        input.drain([
            pressed(Action::Throttle),
            pressed(Action::SteerLeft),
            pressed(Action::Brake),
        ]);
        car.apply_control(&mut world, &input);

        let vehicle = world.vehicle(car.handle()).unwrap();
        // Throttle: rear slots only.
        assert_eq!(vehicle.wheel(0).unwrap().engine_force, 0.0);
        assert_eq!(vehicle.wheel(1).unwrap().engine_force, 0.0);
        assert_eq!(vehicle.wheel(2).unwrap().engine_force, ENGINE_FORCE);
        assert_eq!(vehicle.wheel(3).unwrap().engine_force, ENGINE_FORCE);
        // Steering: front slots only.
        assert_eq!(vehicle.wheel(0).unwrap().steering, STEER_LIMIT);
        assert_eq!(vehicle.wheel(1).unwrap().steering, STEER_LIMIT);
        assert_eq!(vehicle.wheel(2).unwrap().steering, 0.0);
        assert_eq!(vehicle.wheel(3).unwrap().steering, 0.0);
        // Braking: front slots only, rears stay free.
        assert_eq!(vehicle.wheel(0).unwrap().brake, BRAKE_FORCE);
        assert_eq!(vehicle.wheel(1).unwrap().brake, BRAKE_FORCE);
        assert_eq!(vehicle.wheel(2).unwrap().brake, 0.0);
        assert_eq!(vehicle.wheel(3).unwrap().brake, 0.0);
    }

    #[test]
    fn test_throttle_accelerates_the_car() {
        let (mut world, car) = spawn_on_ground();
        for _ in 0..120 {
            world.step(1.0 / 60.0, 1.0 / 60.0);
        }
        let start = car.position(&world).unwrap();

        let mut input = InputState::default();
        input.drain([pressed(Action::Throttle)]);
        for _ in 0..180 {
            car.apply_control(&mut world, &input);
            world.step(1.0 / 60.0, 1.0 / 60.0);
        }
        let end = car.position(&world).unwrap();
        assert!(
            (end - start).length() > 1.0,
            "car should move under throttle, moved {}",
            (end - start).length()
        );
    }

    #[test]
    fn test_visual_sync_follows_chassis() {
        let (mut world, mut car) = spawn_on_ground();
        for _ in 0..120 {
            world.step(1.0 / 60.0, 1.0 / 60.0);
        }
        car.sync_visual(&world);

        let chassis_pos = car.position(&world).unwrap();
        assert!((car.chassis_node.position - chassis_pos).length() < 0.5);
        for node in &car.wheel_nodes {
            assert!((node.position - chassis_pos).length() < 3.0);
        }
    }
}
