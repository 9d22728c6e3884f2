//! Freeroam - Main Entry Point
//!
//! Third-person open-world prototype: walk around a city block or hop
//! between the on-foot camera and the car with C.

use freeroam_game::{Action, CameraStrategy, FollowTarget, InputEvent, Simulation};
use freeroam_renderer::ThirdPersonCamera;
use three_d::*;

/// Map a physical key to its logical action.
///
/// Arrow keys drive the on-foot player; WASD and Space drive the car.
fn map_key(key: Key) -> Option<Action> {
    match key {
        Key::ArrowUp => Some(Action::Forward),
        Key::ArrowDown => Some(Action::Backward),
        Key::ArrowLeft => Some(Action::StrafeLeft),
        Key::ArrowRight => Some(Action::StrafeRight),
        Key::W => Some(Action::Throttle),
        Key::S => Some(Action::Reverse),
        Key::A => Some(Action::SteerLeft),
        Key::D => Some(Action::SteerRight),
        Key::Space => Some(Action::Brake),
        _ => None,
    }
}

fn pose_transform(position: glam::Vec3, rotation: glam::Quat) -> Mat4 {
    Mat4::from_translation(vec3(position.x, position.y, position.z))
        * Mat4::from(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z))
}

fn main() {
    env_logger::init();

    // Create window
    let window = Window::new(WindowSettings {
        title: "Freeroam".to_string(),
        max_size: Some((1920, 1080)),
        ..Default::default()
    })
    .unwrap();

    let context = window.gl();

    // Create simulation
    let mut simulation = Simulation::city();

    // Create camera
    let mut render_camera = ThirdPersonCamera::default();

    let mut mouse_captured = false;

    // Ground
    let mut ground = Gm::new(
        Mesh::new(&context, &CpuMesh::square()),
        ColorMaterial {
            color: Srgba::new(51, 51, 51, 255),
            ..Default::default()
        },
    );
    ground.set_transformation(Mat4::from_scale(500.0) * Mat4::from_angle_x(degrees(-90.0)));

    // Buildings
    let mut buildings: Vec<Gm<Mesh, ColorMaterial>> = Vec::new();
    for building in &simulation.level.buildings {
        let mut mesh = Gm::new(
            Mesh::new(&context, &CpuMesh::cube()),
            ColorMaterial {
                color: Srgba::new(136, 136, 136, 255),
                ..Default::default()
            },
        );
        let half = building.size * 0.5;
        mesh.set_transformation(
            Mat4::from_translation(vec3(
                building.position.x,
                building.position.y,
                building.position.z,
            )) * Mat4::from_nonuniform_scale(half.x, half.y, half.z),
        );
        buildings.push(mesh);
    }

    // Player
    let mut player_mesh = Gm::new(
        Mesh::new(&context, &CpuMesh::sphere(16)),
        ColorMaterial {
            color: Srgba::new(0, 255, 0, 255),
            ..Default::default()
        },
    );

    // Car chassis
    let mut chassis_mesh = Gm::new(
        Mesh::new(&context, &CpuMesh::cube()),
        ColorMaterial {
            color: Srgba::new(255, 0, 0, 255),
            ..Default::default()
        },
    );

    // Wheels: cylinders along the axle (x) axis, centered on the hub.
    let mut wheel_meshes: Vec<Gm<Mesh, ColorMaterial>> = (0..4)
        .map(|_| {
            Gm::new(
                Mesh::new(&context, &CpuMesh::cylinder(20)),
                ColorMaterial {
                    color: Srgba::new(34, 34, 34, 255),
                    ..Default::default()
                },
            )
        })
        .collect();

    // Lights
    let ambient = AmbientLight::new(&context, 0.5, Srgba::WHITE);
    let sun = PointLight::new(
        &context,
        1.2,
        Srgba::WHITE,
        vec3(100.0, 100.0, 50.0),
        Attenuation::default(),
    );

    // Main loop
    window.render_loop(move |frame_input| {
        let mut events: Vec<InputEvent> = Vec::new();

        for event in frame_input.events.iter() {
            match event {
                Event::KeyPress { kind, handled, .. } if !*handled => {
                    if let Some(action) = map_key(*kind) {
                        events.push(InputEvent::Key {
                            action,
                            pressed: true,
                        });
                    }

                    // Toggle mouse capture with Escape
                    if *kind == Key::Escape {
                        mouse_captured = !mouse_captured;
                        events.push(InputEvent::PointerLock(mouse_captured));
                    }

                    // Swap between the on-foot orbit and the car chase camera
                    if *kind == Key::C {
                        if simulation.follow == Some(FollowTarget::Player) {
                            simulation.follow = Some(FollowTarget::Vehicle);
                            simulation.rig.strategy = CameraStrategy::chase();
                        } else {
                            simulation.follow = Some(FollowTarget::Player);
                            simulation.rig.strategy = CameraStrategy::orbit();
                        }
                    }

                    // Quit with Q
                    if *kind == Key::Q {
                        return FrameOutput {
                            exit: true,
                            ..Default::default()
                        };
                    }
                }
                Event::KeyRelease { kind, handled, .. } if !*handled => {
                    if let Some(action) = map_key(*kind) {
                        events.push(InputEvent::Key {
                            action,
                            pressed: false,
                        });
                    }
                }
                Event::MousePress { handled, .. } if !*handled => {
                    if !mouse_captured {
                        mouse_captured = true;
                        events.push(InputEvent::PointerLock(true));
                    }
                }
                Event::MouseMotion { delta, .. } => {
                    events.push(InputEvent::MouseMoved {
                        dx: delta.0,
                        dy: delta.1,
                    });
                }
                _ => {}
            }
        }

        // Update simulation
        let real_dt = (frame_input.elapsed_time / 1000.0) as f32;
        simulation.tick(&events, real_dt);

        // Copy visual node poses into the meshes
        player_mesh.set_transformation(
            pose_transform(
                simulation.player.node.position,
                simulation.player.node.rotation,
            ) * Mat4::from_scale(0.5),
        );
        chassis_mesh.set_transformation(
            pose_transform(
                simulation.car.chassis_node.position,
                simulation.car.chassis_node.rotation,
            ) * Mat4::from_nonuniform_scale(1.0, 0.5, 2.0),
        );
        for (mesh, node) in wheel_meshes.iter_mut().zip(&simulation.car.wheel_nodes) {
            mesh.set_transformation(
                pose_transform(node.position, node.rotation)
                    * Mat4::from_nonuniform_scale(0.3, 0.4, 0.4)
                    * Mat4::from_translation(vec3(-0.5, 0.0, 0.0)),
            );
        }

        // Create three-d camera from the rig
        render_camera.aspect = frame_input.viewport.aspect();
        render_camera.set_view(simulation.rig.position(), simulation.rig.look_at());
        let pos = render_camera.position;
        let target = render_camera.target;
        let camera = Camera::new_perspective(
            frame_input.viewport,
            vec3(pos.x, pos.y, pos.z),
            vec3(target.x, target.y, target.z),
            vec3(0.0, 1.0, 0.0),
            degrees(render_camera.fov),
            render_camera.near,
            render_camera.far,
        );

        // Render
        frame_input
            .screen()
            .clear(ClearState::color_and_depth(0.53, 0.81, 0.92, 1.0, 1.0))
            .render(&camera, &[&ground], &[&ambient, &sun])
            .render(
                &camera,
                buildings.iter().collect::<Vec<_>>().as_slice(),
                &[&ambient, &sun],
            )
            .render(&camera, &[&player_mesh, &chassis_mesh], &[&ambient, &sun])
            .render(
                &camera,
                wheel_meshes.iter().collect::<Vec<_>>().as_slice(),
                &[&ambient, &sun],
            );

        FrameOutput::default()
    });
}
