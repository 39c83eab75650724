use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::scene::Axis;
use crate::tracking::SolverParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DemoMode {
    /// Clip playback with an orbit camera
    #[default]
    Viewer,
    /// Clip playback plus a head bone that follows the cursor
    Tracking,
    /// Slow spin, no clip
    Turntable,
}

/// sRGB colour written as `"#rrggbb"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u32);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xffffff);

    /// Linear-space components in [0, 1]
    pub fn to_linear(self) -> [f32; 3] {
        let channel = |shift: u32| srgb_to_linear(((self.0 >> shift) & 0xff) as f32 / 255.0);
        [channel(16), channel(8), channel(0)]
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return Err(format!("expected #rrggbb, got '{value}'"));
        }
        u32::from_str_radix(hex, 16)
            .map(Rgb)
            .map_err(|e| format!("invalid colour '{value}': {e}"))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        format!("#{:06x}", value.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "fishbones".to_string(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Translate the model so its rest-pose bounds are centred on the origin
    pub center: bool,
    /// Move the camera back to 1.5x the model's diagonal after loading
    pub frame_camera: bool,
    /// Rotation about Y applied to the model root, radians
    pub yaw: f32,
    pub scale: f32,
    /// Extra yaw added every frame, radians
    pub spin_per_frame: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/blue-fish.glb"),
            center: true,
            frame_camera: false,
            yaw: 0.0,
            scale: 1.0,
            spin_per_frame: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 500.0,
            position: [0.0, 0.0, 3.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub target: [f32; 3],
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            target: [0.0; 3],
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient_color: Rgb,
    pub ambient_intensity: f32,
    pub directional_color: Rgb,
    pub directional_intensity: f32,
    /// The directional light shines from here toward the origin
    pub directional_position: [f32; 3],
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_color: Rgb::WHITE,
            ambient_intensity: 1.0,
            directional_color: Rgb::WHITE,
            directional_intensity: 2.0,
            directional_position: [10.0, 10.0, 10.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Loop the first clip when the model has one
    pub play: bool,
    /// Upper bound on the per-frame playback step, seconds
    pub max_delta: Option<f32>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            play: true,
            max_delta: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub bone: String,
    /// Smoothing factor in [0, 1]
    pub alpha: f32,
    pub max_pitch_degrees: f32,
    /// Added to the driven angle to account for the bone's rest pose, radians
    pub offset: f32,
    /// `-1` or `1`; flips the vertical response
    pub sign: f32,
    pub driven_axis: Axis,
    pub locked_axis: Axis,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            bone: "Head".to_string(),
            alpha: crate::tracking::DEFAULT_ALPHA,
            max_pitch_degrees: 20.0,
            offset: 1.5,
            sign: -1.0,
            driven_axis: Axis::Z,
            locked_axis: Axis::X,
        }
    }
}

impl TrackingConfig {
    pub fn solver_params(&self) -> SolverParams {
        SolverParams {
            max_pitch: self.max_pitch_degrees.to_radians(),
            offset: self.offset,
            sign: self.sign,
            driven_axis: self.driven_axis,
            locked_axis: self.locked_axis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialOverride {
    /// Case-insensitive substring of the material name
    pub name_contains: String,
    pub color: Rgb,
    pub opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialsConfig {
    pub force_opaque: bool,
    pub overrides: Vec<MaterialOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub demo: DemoMode,
    pub ui: bool,
    pub window: WindowConfig,
    /// RGBA clear colour; alpha 0 for a transparent background
    pub background: [f32; 4],
    pub model: ModelConfig,
    pub camera: CameraConfig,
    pub orbit: Option<OrbitConfig>,
    pub lights: LightsConfig,
    pub animation: AnimationConfig,
    pub tracking: Option<TrackingConfig>,
    pub materials: MaterialsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::preset(DemoMode::Viewer)
    }
}

impl Config {
    /// Built-in settings for each demo
    pub fn preset(demo: DemoMode) -> Self {
        match demo {
            DemoMode::Viewer => {
                let sky = Rgb(0x87ceeb).to_linear();
                Self {
                    demo,
                    ui: true,
                    window: WindowConfig::default(),
                    background: [sky[0], sky[1], sky[2], 1.0],
                    model: ModelConfig {
                        frame_camera: true,
                        yaw: -1.5,
                        ..ModelConfig::default()
                    },
                    camera: CameraConfig::default(),
                    orbit: Some(OrbitConfig::default()),
                    lights: LightsConfig::default(),
                    animation: AnimationConfig::default(),
                    tracking: None,
                    materials: MaterialsConfig {
                        force_opaque: true,
                        overrides: Vec::new(),
                    },
                }
            }
            DemoMode::Tracking => Self {
                demo,
                ui: true,
                window: WindowConfig::default(),
                background: [0.0; 4],
                model: ModelConfig {
                    path: PathBuf::from("assets/Fish-Bone-Computer-refinedAnimation.glb"),
                    yaw: -1.5,
                    ..ModelConfig::default()
                },
                camera: CameraConfig {
                    fov_y_degrees: 35.0,
                    near: 1.0,
                    far: 500.0,
                    position: [0.0, 0.0, 5.0],
                },
                orbit: None,
                lights: LightsConfig {
                    ambient_color: Rgb(0xbefcfd),
                    ambient_intensity: 1.0,
                    directional_color: Rgb(0xfdfefb),
                    directional_intensity: 2.25,
                    directional_position: [10.0, 10.0, 10.0],
                },
                animation: AnimationConfig {
                    play: true,
                    max_delta: Some(1.0 / 30.0),
                },
                tracking: Some(TrackingConfig::default()),
                materials: MaterialsConfig {
                    force_opaque: false,
                    overrides: vec![MaterialOverride {
                        name_contains: "screen".to_string(),
                        color: Rgb(0xbefcfd),
                        opacity: 0.2,
                    }],
                },
            },
            DemoMode::Turntable => Self {
                demo,
                ui: true,
                window: WindowConfig::default(),
                background: [0.0, 0.0, 0.0, 1.0],
                model: ModelConfig {
                    path: PathBuf::from("assets/Fish-Bone.glb"),
                    center: false,
                    scale: 0.5,
                    spin_per_frame: 0.01,
                    ..ModelConfig::default()
                },
                camera: CameraConfig {
                    position: [0.0, 0.0, 20.0],
                    ..CameraConfig::default()
                },
                orbit: None,
                lights: LightsConfig {
                    directional_intensity: 3.0,
                    directional_position: [-1.0, 2.0, 4.0],
                    ..LightsConfig::default()
                },
                animation: AnimationConfig {
                    play: false,
                    max_delta: None,
                },
                tracking: None,
                materials: MaterialsConfig::default(),
            },
        }
    }

    /// Preset for `demo` with `overrides` merged on top
    ///
    /// Objects merge key by key; any other value, `null` included, replaces
    /// the preset's.
    pub fn layered(demo: DemoMode, overrides: Value) -> Result<Self> {
        let mut value = serde_json::to_value(Self::preset(demo)).context("Failed to encode preset")?;
        merge(&mut value, overrides);
        let mut config: Config = serde_json::from_value(value).context("Invalid configuration")?;
        config.demo = demo;
        Ok(config)
    }

    /// Build the effective configuration from command-line arguments
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => Some(read_json(path)?),
            None => None,
        };

        let file_demo = file
            .as_ref()
            .and_then(|v| v.get("demo"))
            .map(|d| serde_json::from_value::<DemoMode>(d.clone()))
            .transpose()
            .context("Invalid 'demo' in config file")?;
        let demo = cli.demo.or(file_demo).unwrap_or_default();

        let mut config = Self::layered(demo, file.unwrap_or(Value::Null))?;

        if let Some(model) = &cli.model {
            config.model.path = model.clone();
        }
        if let Some(bone) = &cli.bone {
            config
                .tracking
                .get_or_insert_with(TrackingConfig::default)
                .bone = bone.clone();
        }
        if cli.no_ui {
            config.ui = false;
        }

        log::debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) if slot.is_object() && value.is_object() => merge(slot, value),
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
