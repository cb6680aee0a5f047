/// Stage configuration and its `key = value` file format
///
/// ```text
/// # comments run to the end of the line
/// star_count = 200
/// background = "space.jpg"
/// avatar_texture = none
/// ```
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, space0},
    combinator::{all_consuming, map, opt, rest},
    sequence::{delimited, pair, preceded, separated_pair, terminated},
    IResult,
};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

/// Tunables for scene assembly and camera setup
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub seed: u32,
    pub star_count: usize,
    pub star_spread: f32,
    pub background: String,
    pub moon_texture: String,
    pub moon_normal_map: String,
    /// `None` keeps the avatar cube without a texture source
    pub avatar_texture: Option<String>,
    pub camera_fov: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_CAFE,
            star_count: 200,
            star_spread: 100.0,
            background: "space.jpg".to_string(),
            moon_texture: "moon.jpg".to_string(),
            moon_normal_map: "normal.jpg".to_string(),
            avatar_texture: None,
            camera_fov: 75.0,
            camera_near: 0.1,
            camera_far: 1000.0,
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RawValue<'a> {
    Quoted(&'a str),
    Bare(&'a str),
}

impl<'a> RawValue<'a> {
    fn text(&self) -> &'a str {
        match self {
            RawValue::Quoted(s) | RawValue::Bare(s) => s,
        }
    }
}

/// Smallest accepted distance between the near and far planes
const MIN_CLIP_RANGE: f32 = 1e-3;

impl StageConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = Self::parse(&text)?;
        log::info!("loaded stage config from {}", path.display());
        Ok(config)
    }

    /// Parse config text on top of the defaults. Later keys win.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (index, raw_line) in input.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw_line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (key, value) = match parse_entry(trimmed) {
                Ok((_, entry)) => entry,
                Err(_) => return Err(ConfigError::Syntax { line }),
            };
            config.apply(line, key, value)?;
        }

        if config.camera_far - config.camera_near < MIN_CLIP_RANGE {
            return Err(ConfigError::ClippingPlanes {
                near: config.camera_near,
                far: config.camera_far,
            });
        }

        Ok(config)
    }

    fn apply(&mut self, line: usize, key: &str, value: RawValue<'_>) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            line,
            key: key.to_string(),
            value: value.text().to_string(),
        };

        match key {
            "seed" => self.seed = parse_number(value).ok_or_else(invalid)?,
            "star_count" => self.star_count = parse_number(value).ok_or_else(invalid)?,
            "star_spread" => {
                self.star_spread = parse_float(value)
                    .filter(|spread: &f32| *spread >= 0.0)
                    .ok_or_else(invalid)?
            }
            "background" => self.background = value.text().to_string(),
            "moon_texture" => self.moon_texture = value.text().to_string(),
            "moon_normal_map" => self.moon_normal_map = value.text().to_string(),
            "avatar_texture" => {
                self.avatar_texture = match value {
                    RawValue::Bare("none") => None,
                    other => Some(other.text().to_string()),
                }
            }
            "camera_fov" => {
                self.camera_fov = parse_float(value)
                    .filter(|fov: &f32| *fov > 0.0 && *fov < 180.0)
                    .ok_or_else(invalid)?
            }
            "camera_near" => {
                self.camera_near = parse_float(value)
                    .filter(|near: &f32| *near > 0.0)
                    .ok_or_else(invalid)?
            }
            "camera_far" => {
                self.camera_far = parse_float(value)
                    .filter(|far: &f32| *far > 0.0)
                    .ok_or_else(invalid)?
            }
            "enable_damping" => self.enable_damping = parse_bool(value).ok_or_else(invalid)?,
            "damping_factor" => {
                self.damping_factor = parse_float(value)
                    .filter(|factor: &f32| *factor > 0.0 && *factor <= 1.0)
                    .ok_or_else(invalid)?
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    line,
                    key: key.to_string(),
                })
            }
        }

        Ok(())
    }
}

fn parse_number<T: FromStr>(value: RawValue<'_>) -> Option<T> {
    match value {
        RawValue::Bare(text) => text.parse().ok(),
        RawValue::Quoted(_) => None,
    }
}

/// Finite floats only; `inf` and `NaN` parse as `f32` but are not usable
fn parse_float(value: RawValue<'_>) -> Option<f32> {
    parse_number::<f32>(value).filter(|number| number.is_finite())
}

fn parse_bool(value: RawValue<'_>) -> Option<bool> {
    match value {
        RawValue::Bare("true") => Some(true),
        RawValue::Bare("false") => Some(false),
        _ => None,
    }
}

fn parse_key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn parse_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c: char| c != '"'), char('"'))(input)
}

fn parse_bare(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != '#' && c != '"')(input)
}

fn parse_value(input: &str) -> IResult<&str, RawValue<'_>> {
    alt((map(parse_quoted, RawValue::Quoted), map(parse_bare, RawValue::Bare)))(input)
}

fn parse_comment(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), rest)(input)
}

fn parse_entry(input: &str) -> IResult<&str, (&str, RawValue<'_>)> {
    all_consuming(terminated(
        separated_pair(parse_key, delimited(space0, char('='), space0), parse_value),
        pair(space0, opt(parse_comment)),
    ))(input)
}
