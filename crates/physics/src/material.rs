//! Surface materials and pair-wise contact rules.
//!
//! Every collider carries a [`Surface`] tag in its user data. Friction and
//! restitution come from a world-wide default unless a specific pair of
//! surfaces has a registered override, in which case a contact-modification
//! hook rewrites the solver contacts for that pair.

use std::collections::HashMap;

use rapier3d::pipeline::{ContactModificationContext, PhysicsHooks};
use serde::{Deserialize, Serialize};

/// Identifies what kind of surface a collider represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Surface {
    /// Streets, terrain, buildings.
    Ground,
    /// The player capsule.
    Player,
    /// Ice, wet metal and similar low-grip surfaces.
    Slippery,
    /// Vehicle chassis.
    Chassis,
}

impl Surface {
    /// Encode for storage in a collider's `user_data`.
    pub(crate) fn to_user_data(self) -> u128 {
        match self {
            Surface::Ground => 1,
            Surface::Player => 2,
            Surface::Slippery => 3,
            Surface::Chassis => 4,
        }
    }

    pub(crate) fn from_user_data(data: u128) -> Option<Self> {
        match data {
            1 => Some(Surface::Ground),
            2 => Some(Surface::Player),
            3 => Some(Surface::Slippery),
            4 => Some(Surface::Chassis),
            _ => None,
        }
    }
}

/// Friction/restitution for a contact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ContactProperties {
    /// Coulomb friction coefficient.
    pub friction: f32,
    /// Bounciness, 0 = fully inelastic.
    pub restitution: f32,
}

impl Default for ContactProperties {
    fn default() -> Self {
        // Low default friction, no bounce.
        Self {
            friction: 0.1,
            restitution: 0.0,
        }
    }
}

/// Registry of per-surface-pair contact overrides.
///
/// Doubles as the rapier physics hook that applies the overrides during
/// contact solving.
#[derive(Debug, Default)]
pub struct MaterialTable {
    default: ContactProperties,
    overrides: HashMap<(Surface, Surface), ContactProperties>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The properties used when no override matches.
    pub fn default_properties(&self) -> ContactProperties {
        self.default
    }

    /// Register an override for contacts between two surfaces.
    ///
    /// The pair is symmetric: `(a, b)` and `(b, a)` resolve identically.
    pub fn register_pair(&mut self, a: Surface, b: Surface, props: ContactProperties) {
        self.overrides.insert(Self::key(a, b), props);
    }

    /// Resolve the contact properties for a pair of surfaces.
    pub fn lookup(&self, a: Surface, b: Surface) -> ContactProperties {
        self.overrides
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or(self.default)
    }

    fn key(a: Surface, b: Surface) -> (Surface, Surface) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl PhysicsHooks for MaterialTable {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let surface_of = |handle| {
            context
                .colliders
                .get(handle)
                .and_then(|c| Surface::from_user_data(c.user_data))
        };
        let (Some(a), Some(b)) = (surface_of(context.collider1), surface_of(context.collider2))
        else {
            return;
        };
        // Only rewrite contacts for pairs with an explicit rule; everything
        // else keeps the defaults baked into the colliders.
        let Some(props) = self.overrides.get(&Self::key(a, b)) else {
            return;
        };
        for contact in context.solver_contacts.iter_mut() {
            contact.friction = props.friction;
            contact.restitution = props.restitution;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_properties() {
        let table = MaterialTable::new();
        let props = table.lookup(Surface::Chassis, Surface::Ground);
        assert_eq!(props.friction, 0.1);
        assert_eq!(props.restitution, 0.0);
    }

    #[test]
    fn test_pair_override_is_symmetric() {
        let mut table = MaterialTable::new();
        table.register_pair(
            Surface::Player,
            Surface::Ground,
            ContactProperties {
                friction: 0.5,
                restitution: 0.1,
            },
        );

        let a = table.lookup(Surface::Player, Surface::Ground);
        let b = table.lookup(Surface::Ground, Surface::Player);
        assert_eq!(a.friction, 0.5);
        assert_eq!(b.friction, 0.5);
        assert_eq!(a.restitution, 0.1);
        assert_eq!(b.restitution, 0.1);
    }

    #[test]
    fn test_unregistered_pair_falls_back() {
        let mut table = MaterialTable::new();
        table.register_pair(
            Surface::Player,
            Surface::Ground,
            ContactProperties {
                friction: 0.5,
                restitution: 0.1,
            },
        );
        let props = table.lookup(Surface::Player, Surface::Slippery);
        assert_eq!(props.friction, table.default_properties().friction);
    }

    #[test]
    fn test_surface_user_data_round_trip() {
        for surface in [
            Surface::Ground,
            Surface::Player,
            Surface::Slippery,
            Surface::Chassis,
        ] {
            assert_eq!(Surface::from_user_data(surface.to_user_data()), Some(surface));
        }
        assert_eq!(Surface::from_user_data(0), None);
    }
}
