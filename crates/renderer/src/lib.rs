//! Render-side camera math for the freeroam prototype.
//!
//! The game layer outputs a camera position and look-at point; this crate
//! turns them into view/projection matrices for whatever renders the scene.

pub mod camera;

pub use camera::ThirdPersonCamera;
