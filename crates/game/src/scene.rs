//! Visual nodes and level construction.
//!
//! A [`VisualNode`] is the render boundary: the simulation rewrites node
//! poses every frame from physics state, and the platform layer copies them
//! into whatever scene graph it renders with. Physics is the sole source of
//! truth; nodes are a derived projection.

use freeroam_physics::{PhysicsWorld, Shape};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Pose of one renderable object.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VisualNode {
    pub position: Vec3,
    pub rotation: Quat,
}

impl VisualNode {
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_orientation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// Orientation from a bare yaw angle, for bodies with locked rotation.
    pub fn set_yaw(&mut self, yaw: f32) {
        self.rotation = Quat::from_rotation_y(yaw);
    }
}

/// A static obstacle: position of its center and full size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Building {
    pub position: Vec3,
    pub size: Vec3,
}

/// Static level description: ground, obstacles, spawn points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub ground_half_extents: Vec3,
    pub buildings: Vec<Building>,
    pub player_spawn: Vec3,
    pub vehicle_spawn: Vec3,
}

impl Level {
    /// Flat asphalt slab with a few box buildings around the spawns.
    pub fn city_block() -> Self {
        let buildings = vec![
            Building {
                position: Vec3::new(15.0, 5.0, -10.0),
                size: Vec3::new(8.0, 10.0, 8.0),
            },
            Building {
                position: Vec3::new(-18.0, 7.5, 5.0),
                size: Vec3::new(10.0, 15.0, 10.0),
            },
            Building {
                position: Vec3::new(5.0, 4.0, 25.0),
                size: Vec3::new(12.0, 8.0, 6.0),
            },
            Building {
                position: Vec3::new(-10.0, 6.0, -25.0),
                size: Vec3::new(6.0, 12.0, 6.0),
            },
        ];
        Self {
            ground_half_extents: Vec3::new(500.0, 0.5, 500.0),
            buildings,
            player_spawn: Vec3::new(0.0, 5.0, 0.0),
            vehicle_spawn: Vec3::new(6.0, 2.0, 0.0),
        }
    }

    /// Empty ground plane, for tests that want no obstacles.
    pub fn empty() -> Self {
        Self {
            ground_half_extents: Vec3::new(500.0, 0.5, 500.0),
            buildings: Vec::new(),
            player_spawn: Vec3::new(0.0, 5.0, 0.0),
            vehicle_spawn: Vec3::new(6.0, 2.0, 0.0),
        }
    }

    /// Create the static collision bodies for this level. The ground slab is
    /// placed so its top surface sits at y = 0.
    pub fn build(&self, world: &mut PhysicsWorld) {
        world.create_static_body(
            Shape::Cuboid {
                half_extents: self.ground_half_extents,
            },
            Vec3::new(0.0, -self.ground_half_extents.y, 0.0),
        );
        for building in &self.buildings {
            world.create_static_body(
                Shape::Cuboid {
                    half_extents: building.size * 0.5,
                },
                building.position,
            );
        }
        log::info!(
            "level built: ground {}x{}, {} buildings",
            self.ground_half_extents.x * 2.0,
            self.ground_half_extents.z * 2.0,
            self.buildings.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_block_has_buildings() {
        let level = Level::city_block();
        assert!(!level.buildings.is_empty());
        assert!(level.player_spawn.y > 0.0);
    }

    #[test]
    fn test_build_creates_static_ground() {
        let mut world = PhysicsWorld::new();
        let level = Level::empty();
        level.build(&mut world);

        // A ball dropped on the ground should come to rest on the surface.
        let ball = world.create_dynamic_body(
            Shape::Ball { radius: 0.5 },
            Vec3::new(0.0, 3.0, 0.0),
            1.0,
        );
        for _ in 0..300 {
            world.step(1.0 / 60.0, 1.0 / 60.0);
        }
        let y = world.body_position(ball).unwrap().y;
        assert!((y - 0.5).abs() < 0.1, "ball rests at y={y}");
    }

    #[test]
    fn test_node_yaw_orientation() {
        let mut node = VisualNode::default();
        node.set_yaw(std::f32::consts::FRAC_PI_2);
        let forward = node.rotation * Vec3::new(0.0, 0.0, -1.0);
        assert!((forward - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
