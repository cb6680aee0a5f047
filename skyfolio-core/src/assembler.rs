/// One-shot construction of the decorative scene
use nalgebra::Point3;
use std::rc::Rc;

use crate::camera::{PerspectiveCamera, Viewport};
use crate::config::StageConfig;
use crate::geometry::{Geometry, LineSet, Mesh};
use crate::light::Light;
use crate::material::{Color, Material, StandardMaterial, TextureRef};
use crate::random::SeededRandom;
use crate::scene::{Background, ObjectId, Scene, SceneObject};
use crate::transform::Transform;

pub const TORUS: &str = "torus";
pub const LINE: &str = "line";
pub const AVATAR: &str = "jeff";
pub const MOON: &str = "moon";

/// The objects mutated by the update loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub torus: ObjectId,
    pub moon: ObjectId,
    pub jeff: ObjectId,
    pub line: ObjectId,
}

/// A populated scene and the camera that views it
#[derive(Debug, Clone)]
pub struct Assembly {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub handles: SceneHandles,
}

pub fn assemble(config: &StageConfig, viewport: Viewport) -> Assembly {
    let mut scene = Scene::new();
    let mut rng = SeededRandom::new(config.seed);

    let mut camera = PerspectiveCamera::new(
        config.camera_fov,
        viewport.aspect(),
        config.camera_near,
        config.camera_far,
    );
    camera.position.z = 30.0;
    camera.position.x = -3.0;

    let grid = LineSet::grid(200.0, 50, Color::from_hex(0x444444), Color::from_hex(0x888888));
    scene.add(SceneObject::new(
        "grid",
        Rc::new(grid.into()),
        Material::LineBasic { color: Color::WHITE },
    ));
    scene.add(SceneObject::new(
        "axes",
        Rc::new(LineSet::axes(5.0).into()),
        Material::LineBasic { color: Color::WHITE },
    ));

    let torus = scene.add(SceneObject::new(
        TORUS,
        Rc::new(Mesh::torus(10.0, 3.0, 16, 100).into()),
        StandardMaterial {
            color: Color::from_hex(0x0000ff),
            wireframe: true,
            metalness: 0.7,
            roughness: 0.2,
            ..StandardMaterial::default()
        },
    ));

    scene.add_light(Light::point(Color::WHITE, 1.0, 100.0, Point3::new(5.0, 5.0, 5.0)));
    scene.add_light(Light::ambient(Color::from_hex(0x404040), 2.0));

    // The line starts with no points; it still carries a spinning transform
    let line = scene.add(SceneObject::new(
        LINE,
        Rc::new(LineSet::strip(&[]).into()),
        Material::LineBasic { color: Color::WHITE },
    ));

    let star: Rc<Geometry> = Rc::new(Mesh::sphere(0.25, 24, 24).into());
    let star_material = StandardMaterial {
        color: Color::WHITE,
        emissive: Color::WHITE,
        ..StandardMaterial::default()
    };
    for i in 0..config.star_count {
        let x = rng.float_spread(config.star_spread);
        let y = rng.float_spread(config.star_spread);
        let z = rng.float_spread(config.star_spread);
        scene.add(
            SceneObject::new(format!("star-{}", i), Rc::clone(&star), star_material.clone())
                .with_transform(Transform::at(x, y, z)),
        );
    }

    scene.background = Some(Background::from_setting(&config.background));

    let avatar_texture = match &config.avatar_texture {
        Some(path) => TextureRef::load(path.as_str()),
        None => TextureRef::missing(),
    };
    if avatar_texture.is_missing() {
        log::warn!("avatar texture has no source path; the cube renders untextured");
    }
    let jeff = scene.add(
        SceneObject::new(
            AVATAR,
            Rc::new(Mesh::box_geometry(3.0, 3.0, 3.0).into()),
            StandardMaterial {
                map: Some(avatar_texture),
                metalness: 0.8,
                roughness: 0.3,
                ..StandardMaterial::default()
            },
        )
        .with_transform(Transform::at(2.0, 0.0, -5.0)),
    );

    let moon = scene.add(
        SceneObject::new(
            MOON,
            Rc::new(Mesh::sphere(3.0, 32, 32).into()),
            StandardMaterial {
                map: Some(TextureRef::load(config.moon_texture.as_str())),
                normal_map: Some(TextureRef::load(config.moon_normal_map.as_str())),
                metalness: 0.9,
                roughness: 0.2,
                ..StandardMaterial::default()
            },
        )
        .with_transform(Transform::at(-10.0, 0.0, 30.0)),
    );

    log::info!(
        "assembled scene: {} objects, {} lights, {} stars",
        scene.len(),
        scene.lights().len(),
        config.star_count
    );

    Assembly {
        scene,
        camera,
        handles: SceneHandles {
            torus,
            moon,
            jeff,
            line,
        },
    }
}
