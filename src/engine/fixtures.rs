//! Shared scaffolding for viewer tests: a text "file format" of unit quads
//! and a camera looking at them.

use glam::{Mat4, Vec2, Vec3};

use super::Viewer;
use crate::camera::Camera;
use crate::loader::{DecodedModel, DecodedPart, ModelSource};
use crate::options::Options;
use crate::scene::{Appearance, Geometry};

/// Decodes `name@x,z;name@x,z` into one quad per entry, centered at `(x, 0, z)`
/// facing +z. Empty data is a decode failure.
pub(crate) fn decode_quads(source: &ModelSource) -> Result<DecodedModel, String> {
    let text = std::str::from_utf8(&source.data).map_err(|e| e.to_string())?;
    if text.is_empty() {
        return Err("no parts".to_owned());
    }
    let parts = text
        .split(';')
        .map(|entry| -> Result<DecodedPart, &'static str> {
            let (name, at) = entry.split_once('@').ok_or("missing '@'")?;
            let (x, z) = at.split_once(',').ok_or("missing ','")?;
            let x: f32 = x.parse().map_err(|_| "bad x")?;
            let z: f32 = z.parse().map_err(|_| "bad z")?;
            Ok(DecodedPart {
                name: name.to_owned(),
                geometry: unit_quad(),
                appearance: Appearance::new([120, 120, 120], 255),
                transform: Mat4::from_translation(Vec3::new(x, 0.0, z)),
            })
        })
        .collect::<Result<Vec<_>, &str>>()
        .map_err(str::to_owned)?;
    Ok(DecodedModel { parts })
}

/// Quad around the origin, off-center so the origin never sits on the
/// diagonal shared by its two triangles.
fn unit_quad() -> Geometry {
    Geometry::new(
        vec![
            Vec3::new(-0.5, -0.3, 0.0),
            Vec3::new(0.7, -0.3, 0.0),
            Vec3::new(0.7, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
}

/// Source with one quad per `(name, x)` at depth zero.
pub(crate) fn quad_source(model: &str, parts: &[(&str, f32)]) -> ModelSource {
    let placed: Vec<(&str, f32, f32)> = parts.iter().map(|&(n, x)| (n, x, 0.0)).collect();
    placed_source(model, &placed)
}

/// Source with one quad per `(name, x, z)`.
pub(crate) fn placed_source(model: &str, parts: &[(&str, f32, f32)]) -> ModelSource {
    let data = parts
        .iter()
        .map(|(name, x, z)| format!("{name}@{x},{z}"))
        .collect::<Vec<_>>()
        .join(";");
    ModelSource {
        guid: format!("guid-{model}"),
        name: model.to_owned(),
        data: data.into_bytes(),
    }
}

/// Viewer with the quad decoder and a camera looking down -z at the origin.
pub(crate) fn viewer(options: Options) -> Viewer {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut viewer = match Viewer::new(options, decode_quads) {
        Ok(viewer) => viewer,
        Err(e) => panic!("viewer: {e}"),
    };
    viewer.set_camera(Camera {
        eye: Vec3::new(0.0, 0.0, 20.0),
        viewport: (400, 400),
        ..Camera::default()
    });
    viewer
}

/// Normalized pointer position over the world point `(x, 0, 0)`.
pub(crate) fn pointer_at(viewer: &Viewer, x: f32) -> Vec2 {
    let camera = viewer.camera();
    let pixel = camera.project(Vec3::new(x, 0.0, 0.0)).unwrap_or(Vec2::ZERO);
    pixel / Vec2::new(camera.viewport.0 as f32, camera.viewport.1 as f32)
}
