//! Material descriptions as authored in JSON
//!
//! ```json
//! { "diffuse_texture": "brick_diffuse", "normal_texture": "brick_normal",
//!   "roughness": 0.8, "metallic": 0.0 }
//! ```
//!
//! Every field is optional. Scalars outside their valid range are clamped by
//! [`MaterialDesc::sanitized`], which reports each correction as a
//! [`ValidationWarning`] instead of failing.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::AssetError;

/// A soft problem found while loading an asset
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// Offending field
    pub field: &'static str,
    /// What was wrong and what was done about it
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Surface description referencing textures by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    /// Albedo texture name
    pub diffuse_texture: Option<String>,
    /// Specular intensity texture name
    pub specular_texture: Option<String>,
    /// Tangent-space normal map name
    pub normal_texture: Option<String>,
    /// Albedo multiplier, used alone when there is no diffuse texture
    pub diffuse_color: [f32; 3],
    /// 0 = mirror, 1 = fully rough
    pub roughness: f32,
    /// 0 = dielectric, 1 = metal
    pub metallic: f32,
    /// Environment reflection strength
    pub reflectivity: f32,
    /// 0 = opaque, 1 = invisible
    pub transparency: f32,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            diffuse_texture: None,
            specular_texture: None,
            normal_texture: None,
            diffuse_color: [1.0, 1.0, 1.0],
            roughness: 0.5,
            metallic: 0.0,
            reflectivity: 0.0,
            transparency: 0.0,
        }
    }
}

impl MaterialDesc {
    /// Untextured material of one color
    pub fn from_color(color: [f32; 3]) -> Self {
        Self {
            diffuse_color: color,
            ..Self::default()
        }
    }

    /// Builder pattern: set the diffuse texture
    pub fn with_diffuse_texture(mut self, name: impl Into<String>) -> Self {
        self.diffuse_texture = Some(name.into());
        self
    }

    /// Builder pattern: set the specular texture
    pub fn with_specular_texture(mut self, name: impl Into<String>) -> Self {
        self.specular_texture = Some(name.into());
        self
    }

    /// Builder pattern: set the normal map
    pub fn with_normal_texture(mut self, name: impl Into<String>) -> Self {
        self.normal_texture = Some(name.into());
        self
    }

    /// Builder pattern: set roughness
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Builder pattern: set metallic
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic;
        self
    }

    /// Parse a JSON description
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        serde_json::from_str(json).map_err(|e| AssetError::Parse(format!("material: {}", e)))
    }

    /// Read and parse a JSON description file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| AssetError::Parse(format!("{}: {}", path.display(), e)))
    }

    /// Copy with every scalar clamped into range, plus one warning per clamp
    pub fn sanitized(&self) -> (Self, Vec<ValidationWarning>) {
        let mut clean = self.clone();
        let mut warnings = Vec::new();

        for (field, value) in [
            ("roughness", &mut clean.roughness),
            ("metallic", &mut clean.metallic),
            ("reflectivity", &mut clean.reflectivity),
            ("transparency", &mut clean.transparency),
        ] {
            clamp_unit(field, value, &mut warnings);
        }
        for value in clean.diffuse_color.iter_mut() {
            if !(value.is_finite() && *value >= 0.0) {
                warnings.push(ValidationWarning {
                    field: "diffuse_color",
                    message: format!("component {} replaced with 0", value),
                });
                *value = 0.0;
            }
        }

        (clean, warnings)
    }
}

fn clamp_unit(field: &'static str, value: &mut f32, warnings: &mut Vec<ValidationWarning>) {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    if clamped != *value || value.is_nan() {
        warnings.push(ValidationWarning {
            field,
            message: format!("{} clamped to {}", value, clamped),
        });
        *value = clamped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_fields_default() {
        let desc = MaterialDesc::from_json(r#"{ "diffuse_texture": "brick", "roughness": 0.9 }"#).unwrap();
        assert_eq!(desc.diffuse_texture.as_deref(), Some("brick"));
        assert_eq!(desc.roughness, 0.9);
        assert_eq!(desc.metallic, 0.0);
        assert_eq!(desc.diffuse_color, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_bad_json_is_a_parse_error() {
        assert!(matches!(MaterialDesc::from_json("{ roughness: }"), Err(AssetError::Parse(_))));
    }

    #[test]
    fn test_sanitize_clamps_and_warns() {
        let desc = MaterialDesc {
            roughness: 1.5,
            metallic: -0.2,
            transparency: f32::NAN,
            diffuse_color: [0.5, -1.0, 0.5],
            ..MaterialDesc::default()
        };
        let (clean, warnings) = desc.sanitized();

        assert_eq!(clean.roughness, 1.0);
        assert_eq!(clean.metallic, 0.0);
        assert_eq!(clean.transparency, 0.0);
        assert_eq!(clean.diffuse_color, [0.5, 0.0, 0.5]);
        let fields: Vec<_> = warnings.iter().map(|w| w.field).collect();
        assert_eq!(fields, vec!["roughness", "metallic", "transparency", "diffuse_color"]);
    }

    #[test]
    fn test_valid_desc_has_no_warnings() {
        let (_, warnings) = MaterialDesc::from_color([0.2, 0.4, 0.6]).with_roughness(0.3).sanitized();
        assert!(warnings.is_empty());
    }
}
