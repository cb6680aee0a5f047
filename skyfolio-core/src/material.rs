/// Colors, texture references and surface materials

/// Linear RGB color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(&self) -> u32 {
        let [r, g, b] = self.to_rgb8();
        (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    pub fn scale(&self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn add(&self, other: &Color) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }

    /// Component-wise product
    pub fn modulate(&self, other: &Color) -> Self {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }

    /// Perceived brightness (Rec. 709 weights)
    pub fn luminance(&self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A named image asset. Textures are referenced, never decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRef {
    path: Option<String>,
}

impl TextureRef {
    pub fn load(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A texture requested without a source path
    pub fn missing() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn is_missing(&self) -> bool {
        self.path.is_none()
    }
}

/// Lit surface parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub color: Color,
    pub emissive: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub wireframe: bool,
    pub map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            emissive: Color::BLACK,
            metalness: 0.0,
            roughness: 1.0,
            wireframe: false,
            map: None,
            normal_map: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Standard(StandardMaterial),
    /// Unlit lines
    LineBasic { color: Color },
}

impl Material {
    pub fn is_wireframe(&self) -> bool {
        match self {
            Material::Standard(standard) => standard.wireframe,
            Material::LineBasic { .. } => true,
        }
    }

    /// Base color before lighting
    pub fn base_color(&self) -> Color {
        match self {
            Material::Standard(standard) => standard.color,
            Material::LineBasic { color } => *color,
        }
    }
}

impl From<StandardMaterial> for Material {
    fn from(material: StandardMaterial) -> Self {
        Material::Standard(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        for hex in [0x0000ff, 0x404040, 0xffffff, 0x123456] {
            assert_eq!(Color::from_hex(hex).to_hex(), hex);
        }
    }

    #[test]
    fn test_missing_texture_has_no_path() {
        let texture = TextureRef::missing();
        assert!(texture.is_missing());
        assert_eq!(texture.path(), None);
        assert_eq!(TextureRef::load("moon.jpg").path(), Some("moon.jpg"));
    }

    #[test]
    fn test_line_material_counts_as_wireframe() {
        let line = Material::LineBasic { color: Color::WHITE };
        assert!(line.is_wireframe());
        assert!(!Material::from(StandardMaterial::default()).is_wireframe());
    }
}
