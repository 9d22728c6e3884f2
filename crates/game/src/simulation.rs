//! The frame driver.
//!
//! One [`Simulation`] owns the physics world, the entities and the camera
//! rig, and advances them with a strict per-frame ordering: drain input,
//! apply all entity controls, step physics, sync all visuals, update the
//! camera. Control writes never interleave with the step, and visual reads
//! only happen after it.

use freeroam_physics::{ContactProperties, PhysicsWorld, Surface};

use crate::camera::{CameraRig, CameraStrategy, TargetPose};
use crate::input::{InputEvent, InputState};
use crate::player::Player;
use crate::scene::Level;
use crate::vehicle::Car;

/// Physics integration interval, seconds.
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Which entity the camera follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowTarget {
    Player,
    Vehicle,
}

/// All game state for one session.
pub struct Simulation {
    /// Rendered frames advanced so far.
    pub frame: u64,

    pub world: PhysicsWorld,
    pub level: Level,
    pub player: Player,
    pub car: Car,
    pub rig: CameraRig,
    pub follow: Option<FollowTarget>,

    input: InputState,
}

impl Simulation {
    /// Build a session from a level: contact rules, static geometry, player
    /// and car spawns, orbit camera on the player.
    pub fn new(level: Level) -> Self {
        let mut world = PhysicsWorld::new();
        world.register_contact_pair(
            Surface::Player,
            Surface::Ground,
            ContactProperties {
                friction: 0.5,
                restitution: 0.1,
            },
        );
        level.build(&mut world);

        let player = Player::spawn(&mut world, level.player_spawn);
        let car = Car::spawn(&mut world, level.vehicle_spawn);
        log::info!("simulation ready");

        Self {
            frame: 0,
            world,
            level,
            player,
            car,
            rig: CameraRig::new(CameraStrategy::orbit()),
            follow: Some(FollowTarget::Player),
            input: InputState::default(),
        }
    }

    /// A session on the standard test scene.
    pub fn city() -> Self {
        Self::new(Level::city_block())
    }

    /// The input snapshot used by the current frame.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Advance one rendered frame.
    ///
    /// `events` is everything the platform queued since the previous frame;
    /// `real_dt` is the wall-clock frame time, which the world converts into
    /// fixed substeps internally.
    pub fn tick(&mut self, events: &[InputEvent], real_dt: f32) {
        // 1. One snapshot per frame; entities never see the raw events.
        self.input.drain(events.iter().copied());

        // 2-3. All control writes complete before the step.
        self.player.apply_control(&mut self.world, &self.input);
        self.car.apply_control(&mut self.world, &self.input);

        // 4. Integrate.
        self.world.step(FIXED_TIMESTEP, real_dt);

        // 5-6. Visuals read only post-step state.
        self.player.sync_visual(&self.world);
        self.car.sync_visual(&self.world);

        // 7. Camera last, from the freshly synced poses.
        self.rig
            .apply_mouse(self.input.mouse_delta.x, self.input.mouse_delta.y);
        self.rig.update(self.follow_pose());

        self.frame += 1;
    }

    fn follow_pose(&self) -> Option<TargetPose> {
        match self.follow? {
            FollowTarget::Player => Some(TargetPose {
                position: self.player.node.position,
                yaw: self.player.yaw,
            }),
            FollowTarget::Vehicle => {
                let yaw = self.car.yaw(&self.world)?;
                Some(TargetPose {
                    position: self.car.chassis_node.position,
                    yaw,
                })
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Action;
    use glam::Vec3;

    fn pressed(action: Action) -> InputEvent {
        InputEvent::Key {
            action,
            pressed: true,
        }
    }

    fn released(action: Action) -> InputEvent {
        InputEvent::Key {
            action,
            pressed: false,
        }
    }

    fn run(sim: &mut Simulation, events: &[InputEvent], frames: u32) {
        sim.tick(events, FIXED_TIMESTEP);
        for _ in 1..frames {
            sim.tick(&[], FIXED_TIMESTEP);
        }
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::city();
        assert_eq!(sim.frame, 0);
        assert_eq!(sim.follow, Some(FollowTarget::Player));
    }

    #[test]
    fn test_tick_advances_frame() {
        let mut sim = Simulation::city();
        sim.tick(&[], FIXED_TIMESTEP);
        sim.tick(&[], FIXED_TIMESTEP);
        assert_eq!(sim.frame, 2);
    }

    #[test]
    fn test_player_falls_to_ground_and_walks() {
        let mut sim = Simulation::new(Level::empty());

        run(&mut sim, &[], 300);
        let landed = sim.player.position(&sim.world).unwrap();
        assert!(
            (landed.y - 0.5).abs() < 0.15,
            "player should land on the ground, y={}",
            landed.y
        );

        run(&mut sim, &[pressed(Action::Forward)], 60);
        let walked = sim.player.position(&sim.world).unwrap();
        assert!(
            landed.z - walked.z > 2.0,
            "player should walk forward, moved {}",
            landed.z - walked.z
        );
    }

    #[test]
    fn test_vehicle_drives_and_brakes() {
        let mut sim = Simulation::new(Level::empty());
        run(&mut sim, &[], 180);
        let start = sim.car.position(&sim.world).unwrap();

        run(&mut sim, &[pressed(Action::Throttle)], 180);
        let driven = sim.car.position(&sim.world).unwrap();
        assert!(
            (driven - start).length() > 1.0,
            "car should drive under throttle"
        );

        let chassis = sim.world.vehicle(sim.car.handle()).unwrap().chassis();
        let rolling = sim.world.linear_velocity(chassis).unwrap().length();

        // The prototype's brake force is gentle, so braking sheds speed
        // slowly rather than stopping the car outright.
        run(
            &mut sim,
            &[released(Action::Throttle), pressed(Action::Brake)],
            240,
        );
        let braked = sim.world.linear_velocity(chassis).unwrap().length();
        assert!(
            braked < rolling - 0.2,
            "braking should shed speed: {rolling} -> {braked}"
        );

        // Braking stays front-only the whole time.
        let vehicle = sim.world.vehicle(sim.car.handle()).unwrap();
        assert_eq!(vehicle.wheel(2).unwrap().brake, 0.0);
        assert_eq!(vehicle.wheel(3).unwrap().brake, 0.0);
    }

    #[test]
    fn test_visuals_track_physics() {
        let mut sim = Simulation::new(Level::empty());
        run(&mut sim, &[], 120);

        let body = sim.player.position(&sim.world).unwrap();
        assert!((sim.player.node.position - body).length() < 0.5);

        let chassis = sim.car.position(&sim.world).unwrap();
        assert!((sim.car.chassis_node.position - chassis).length() < 0.5);
    }

    #[test]
    fn test_camera_follows_player() {
        let mut sim = Simulation::new(Level::empty());
        run(&mut sim, &[], 300);

        let player = sim.player.node.position;
        let camera = sim.rig.position();
        let distance = (camera - (player + Vec3::new(0.0, 1.5, 4.0))).length();
        assert!(
            distance < 0.5,
            "camera should settle behind the player, off by {distance}"
        );
    }

    #[test]
    fn test_mouse_ignored_without_pointer_lock() {
        let mut sim = Simulation::new(Level::empty());
        let yaw_before = sim.player.yaw;
        sim.tick(
            &[InputEvent::MouseMoved { dx: 500.0, dy: 0.0 }],
            FIXED_TIMESTEP,
        );
        assert_eq!(sim.player.yaw, yaw_before);

        sim.tick(
            &[
                InputEvent::PointerLock(true),
                InputEvent::MouseMoved { dx: 500.0, dy: 0.0 },
            ],
            FIXED_TIMESTEP,
        );
        assert!(sim.player.yaw < yaw_before);
    }

    #[test]
    fn test_determinism() {
        let script: Vec<Vec<InputEvent>> = (0..120)
            .map(|i| {
                let mut events = Vec::new();
                if i == 10 {
                    events.push(pressed(Action::Forward));
                }
                if i == 50 {
                    events.push(released(Action::Forward));
                    events.push(pressed(Action::Throttle));
                }
                events
            })
            .collect();

        let mut a = Simulation::new(Level::empty());
        let mut b = Simulation::new(Level::empty());
        for events in &script {
            a.tick(events, FIXED_TIMESTEP);
            b.tick(events, FIXED_TIMESTEP);
        }

        let pa = a.player.position(&a.world).unwrap();
        let pb = b.player.position(&b.world).unwrap();
        assert!((pa - pb).length() < 1e-4, "{pa:?} vs {pb:?}");

        let ca = a.car.position(&a.world).unwrap();
        let cb = b.car.position(&b.world).unwrap();
        assert!((ca - cb).length() < 1e-4, "{ca:?} vs {cb:?}");
    }
}
