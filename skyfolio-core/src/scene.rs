/// Flat scene graph: renderable objects, lights and a background
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use crate::geometry::Geometry;
use crate::light::Light;
use crate::material::{Color, Material, TextureRef};
use crate::transform::Transform;

/// Handle to an object in a [`Scene`]. Objects are never removed, so a
/// handle stays valid for as long as the scene that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub geometry: Rc<Geometry>,
    pub material: Material,
    pub transform: Transform,
    pub visible: bool,
}

impl SceneObject {
    pub fn new(
        name: impl Into<String>,
        geometry: Rc<Geometry>,
        material: impl Into<Material>,
    ) -> Self {
        Self {
            name: name.into(),
            geometry,
            material: material.into(),
            transform: Transform::identity(),
            visible: true,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Color(Color),
    Texture(TextureRef),
}

impl Background {
    /// `#rrggbb` selects a solid colour; anything else is a texture path
    pub fn from_setting(setting: &str) -> Self {
        let hex = setting
            .strip_prefix('#')
            .filter(|digits| digits.len() == 6)
            .and_then(|digits| u32::from_str_radix(digits, 16).ok());
        match hex {
            Some(hex) => Background::Color(Color::from_hex(hex)),
            None => Background::Texture(TextureRef::load(setting)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    lights: Vec<Light>,
    pub background: Option<Background>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    /// First object with the given name
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().position(|o| o.name == name).map(ObjectId)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Index<ObjectId> for Scene {
    type Output = SceneObject;

    fn index(&self, id: ObjectId) -> &SceneObject {
        &self.objects[id.0]
    }
}

impl IndexMut<ObjectId> for Scene {
    fn index_mut(&mut self, id: ObjectId) -> &mut SceneObject {
        &mut self.objects[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LineSet, Mesh};
    use crate::material::StandardMaterial;

    #[test]
    fn test_handles_address_added_objects() {
        let mut scene = Scene::new();
        let cube = scene.add(SceneObject::new(
            "cube",
            Rc::new(Mesh::cube(1.0).into()),
            StandardMaterial::default(),
        ));
        let line = scene.add(SceneObject::new(
            "line",
            Rc::new(LineSet::new().into()),
            Material::LineBasic { color: Color::WHITE },
        ));

        assert_eq!(scene.len(), 2);
        assert_eq!(scene[cube].name, "cube");
        assert_eq!(scene.find("line"), Some(line));
        assert!(scene.find("moon").is_none());

        scene[line].transform.rotation.x += 0.01;
        assert!((scene[line].transform.rotation.x - 0.01).abs() < 1e-7);
    }

    #[test]
    fn test_shared_geometry() {
        let mut scene = Scene::new();
        let sphere: Rc<Geometry> = Rc::new(Mesh::sphere(0.25, 24, 24).into());
        for i in 0..3 {
            let name = format!("star-{}", i);
            scene.add(SceneObject::new(name, Rc::clone(&sphere), StandardMaterial::default()));
        }
        assert_eq!(Rc::strong_count(&sphere), 4);
    }

    #[test]
    fn test_background_setting() {
        assert_eq!(
            Background::from_setting("#000010"),
            Background::Color(Color::from_hex(0x000010))
        );
        assert_eq!(
            Background::from_setting("space.jpg"),
            Background::Texture(TextureRef::load("space.jpg"))
        );
        // Not six hex digits, so treated as a path
        assert_eq!(
            Background::from_setting("#fff"),
            Background::Texture(TextureRef::load("#fff"))
        );
        assert_eq!(
            Background::from_setting("#zzzzzz"),
            Background::Texture(TextureRef::load("#zzzzzz"))
        );
    }
}
