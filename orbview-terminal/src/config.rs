//! Viewer configuration with TOML file support.
//!
//! Every section uses `#[serde(default)]`, so a file that only overrides
//! `[camera]` still yields a complete configuration.

use nalgebra::{Matrix4, Point3, Vector3};
use orbview_core::{IndexPolicy, LoadOptions, OrbitalCamera, Projection, Transform};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::renderer::Lighting;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize configuration")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Base directory relative resource paths are resolved against.
    pub resources_dir: PathBuf,
    /// Model to show, relative to `resources_dir` unless absolute.
    pub model: Option<PathBuf>,
    pub loader: LoaderConfig,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub input: InputConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from("assets"),
            model: None,
            loader: LoaderConfig::default(),
            camera: CameraConfig::default(),
            projection: ProjectionConfig::default(),
            input: InputConfig::default(),
            render: RenderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Load a configuration file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Join `uri` onto the resources directory. Absolute paths pass through.
    pub fn resolve(&self, uri: impl AsRef<Path>) -> PathBuf {
        self.resources_dir.join(uri)
    }

    pub fn model_path(&self) -> Option<PathBuf> {
        self.model.as_ref().map(|m| self.resolve(m))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    pub generate_normals: bool,
    pub flip_v: bool,
    /// Reject faces that reference undeclared attributes.
    pub strict: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let options = LoadOptions::default();
        Self {
            generate_normals: options.generate_normals,
            flip_v: options.flip_v,
            strict: options.index_policy == IndexPolicy::Strict,
        }
    }
}

impl LoaderConfig {
    pub fn options(&self) -> LoadOptions {
        LoadOptions {
            generate_normals: self.generate_normals,
            flip_v: self.flip_v,
            index_policy: if self.strict {
                IndexPolicy::Strict
            } else {
                IndexPolicy::Skip
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub focus: [f32; 3],
    pub up: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.3, 0.4, 3.0],
            focus: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl CameraConfig {
    pub fn camera(&self) -> OrbitalCamera {
        OrbitalCamera::new(
            Point3::from(self.position),
            Point3::from(self.focus),
            Vector3::from(self.up),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectionConfig {
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let projection = Projection::default();
        Self {
            near: projection.near,
            far: projection.far,
        }
    }
}

/// Size of one terminal cell in pseudo-pixels.
///
/// Mouse sensitivities are tuned for pixel deltas, and cells are roughly
/// twice as tall as they are wide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub cell_width: f64,
    pub cell_height: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            cell_width: 8.0,
            cell_height: 16.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub target_fps: u32,
    /// Log the first frame's setup at debug level.
    pub diagnostics: bool,
    pub model_offset: [f32; 3],
    /// Direction the light travels.
    pub light_direction: [f32; 3],
    pub ambient: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let lighting = Lighting::default();
        Self {
            target_fps: 30,
            diagnostics: false,
            model_offset: [0.0, -0.4, 0.0],
            light_direction: [1.6, -1.8, -1.8],
            ambient: lighting.ambient,
        }
    }
}

impl RenderConfig {
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let [x, y, z] = self.model_offset;
        Transform::translation_matrix(x, y, z)
    }

    pub fn lighting(&self) -> Lighting {
        Lighting::new(Vector3::from(self.light_direction), self.ambient)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write log output here instead of stderr.
    pub file: Option<PathBuf>,
}
