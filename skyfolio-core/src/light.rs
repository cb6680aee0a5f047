/// Scene lights and a Lambert shading model shared by the rasterizers
use nalgebra::{Point3, Vector3};

use crate::material::{Color, StandardMaterial};

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Omnidirectional light. A `distance` of zero disables falloff.
    Point {
        color: Color,
        intensity: f32,
        distance: f32,
        position: Point3<f32>,
    },
    Ambient {
        color: Color,
        intensity: f32,
    },
}

impl Light {
    pub fn point(color: Color, intensity: f32, distance: f32, position: Point3<f32>) -> Self {
        Light::Point {
            color,
            intensity,
            distance,
            position,
        }
    }

    pub fn ambient(color: Color, intensity: f32) -> Self {
        Light::Ambient { color, intensity }
    }
}

/// Summed ambient contribution of `lights`
pub fn ambient_term(lights: &[Light]) -> Color {
    lights.iter().fold(Color::BLACK, |acc, light| match light {
        Light::Ambient { color, intensity } => acc.add(&color.scale(*intensity)),
        Light::Point { .. } => acc,
    })
}

/// Lambert diffuse plus emissive. Metalness and roughness do not take part.
pub fn shade(
    material: &StandardMaterial,
    position: &Point3<f32>,
    normal: &Vector3<f32>,
    lights: &[Light],
) -> Color {
    let normal = normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);

    let mut irradiance = ambient_term(lights);
    for light in lights {
        if let Light::Point {
            color,
            intensity,
            distance,
            position: light_position,
        } = light
        {
            let to_light = light_position - position;
            let reach = to_light.norm();
            if reach <= f32::EPSILON {
                continue;
            }

            let falloff = if *distance > 0.0 {
                (1.0 - reach / distance).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let lambert = normal.dot(&(to_light / reach)).max(0.0);
            irradiance = irradiance.add(&color.scale(intensity * lambert * falloff));
        }
    }

    material.color.modulate(&irradiance).add(&material.emissive)
}
