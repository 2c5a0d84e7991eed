//! # quickscene Quickstart
//!
//! Opens a window with a handful of boxes and spheres, orbit controls,
//! resize handling and click picking.
//!
//! ## Usage:
//! ```bash
//! cargo run --example quickstart
//! cargo run --example quickstart -- scene.toml
//! RUST_LOG=quickscene=debug cargo run --example quickstart
//! ```
//!
//! ## Controls:
//! - Left drag orbits, Shift + left drag pans, wheel zooms
//! - Shift + C resets the view
//! - Left click logs what is under the cursor
//! - Escape quits
//!
//! An options file may override any group, for example:
//! ```toml
//! [camera]
//! position = [0.0, 120.0, 260.0]
//!
//! [trackballControl]
//! enabled = true
//! minDistance = 50.0
//! ```

use anyhow::Context;
use quickscene::prelude::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => SceneOptions::from_path(&path)
            .with_context(|| format!("failed to load options from {path}"))?,
        None => SceneOptions::default()
            .with_trackball(100.0, 400.0)
            .with_resize()
            .with_raycast(),
    }
    .on_control_change(|change| {
        log::trace!("Camera at {:?}, distance {:.1}", change.position, change.distance);
    });

    let mut app = QuickSceneApp::new(options)?.with_title("quickscene quickstart");

    app.set_setup(|scene| {
        let floor = scene.add_geometry("floor", &generate_plane(300.0, 300.0, 4, 4));
        if let Some(floor) = scene.get_mut(floor) {
            floor.transform = cgmath::Matrix4::from_angle_x(Deg(-90.0)) * floor.transform;
        }

        for (i, x) in [-80.0, 0.0, 80.0].into_iter().enumerate() {
            let mut crate_box = Object3D::with_mesh(format!("box {i}"), Mesh::from(&generate_box(30.0, 30.0, 30.0)));
            crate_box.set_translation(Vector3::new(x, 15.0, -40.0));
            crate_box.rotate_y(Deg(20.0 * i as f32));
            scene.add(crate_box);
        }

        let orbit = scene.add(Object3D::group("orbit"));
        for (i, z) in [30.0, 70.0].into_iter().enumerate() {
            let mut ball = Object3D::with_mesh(format!("ball {i}"), Mesh::from(&generate_sphere(12.0, 32, 16)));
            ball.set_translation(Vector3::new(0.0, 12.0, z));
            scene.add_child(orbit, ball)?;
        }

        Ok(())
    });

    app.set_on_pick(|scene, hits| match hits.first() {
        Some(hit) => {
            let name = scene.get(hit.object).map_or("?", |object| object.name.as_str());
            log::info!(
                "Picked {} at ({:.1}, {:.1}, {:.1}), distance {:.1}, {} hits total",
                name,
                hit.point.x,
                hit.point.y,
                hit.point.z,
                hit.distance,
                hits.len()
            );
        }
        None => log::info!("Nothing under the cursor"),
    });

    app.run()?;
    Ok(())
}
