use glam::{Mat4, Vec2, Vec3};

use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::config::{Config, MaterialsConfig};
use crate::loaders::{LoadError, ModelAsset};
use crate::scene::{pose_bounds, AnimationMixer, Material};
use crate::tracking::{HeadTracker, PointerSampler};
use crate::types::{CameraUniform, LightUniform, MeshVertex};

/// What happened to the model this session was asked to show
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    /// Nothing requested yet
    Empty,
    Loaded { name: String, vertices: usize },
    Failed(String),
}

/// Vertices and triangle indices ready for upload
#[derive(Debug, Clone, Default)]
pub struct MeshBatch {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshBatch {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Posed geometry for one frame, split by blending
#[derive(Debug, Clone, Default)]
pub struct SceneGeometry {
    pub opaque: MeshBatch,
    pub translucent: MeshBatch,
}

struct LoadedModel {
    asset: ModelAsset,
    mixer: AnimationMixer,
    materials: Vec<Material>,
    center: Vec3,
    spin: f32,
}

impl LoadedModel {
    /// Scale, then yaw, then shift by the centring offset
    fn root_matrix(&self, config: &Config) -> Mat4 {
        Mat4::from_translation(-self.center)
            * Mat4::from_rotation_y(config.model.yaw + self.spin)
            * Mat4::from_scale(Vec3::splat(config.model.scale))
    }
}

/// Everything one running demo owns: camera, input state, head tracker,
/// model and mixer. Driven by the window loop through [`Session::tick`].
pub struct Session {
    config: Config,
    camera: PerspectiveCamera,
    orbit: Option<OrbitControls>,
    pointer: PointerSampler,
    tracker: Option<HeadTracker>,
    model: Option<LoadedModel>,
    status: ModelStatus,
    geometry: SceneGeometry,
    frame: u64,
}

impl Session {
    pub fn new(config: Config, width: u32, height: u32) -> Self {
        let aspect = if height > 0 { width as f32 / height as f32 } else { 1.0 };
        let mut camera = PerspectiveCamera::new(
            config.camera.fov_y_degrees,
            aspect,
            config.camera.near,
            config.camera.far,
        );
        camera.position = Vec3::from(config.camera.position);

        let orbit = config.orbit.as_ref().map(|orbit| {
            let mut controls = OrbitControls::new(Vec3::from(orbit.target)).with_damping(orbit.damping_factor);
            controls.rotate_speed = orbit.rotate_speed;
            controls.zoom_speed = orbit.zoom_speed;
            camera.look_at(controls.target);
            controls
        });

        let tracker = config
            .tracking
            .as_ref()
            .map(|t| HeadTracker::new(t.bone.clone(), t.alpha, t.solver_params()));

        Self {
            config,
            camera,
            orbit,
            pointer: PointerSampler::new(width, height),
            tracker,
            model: None,
            status: ModelStatus::Empty,
            geometry: SceneGeometry::default(),
            frame: 0,
        }
    }

    /// Consume a load result. Failures are logged once and leave the
    /// session running without a model.
    pub fn attach(&mut self, result: Result<ModelAsset, LoadError>) {
        match result {
            Ok(asset) => self.attach_model(asset),
            Err(err) => {
                log::error!("Failed to load model: {}", err);
                self.detach();
                self.status = ModelStatus::Failed(err.to_string());
            }
        }
    }

    pub fn attach_model(&mut self, mut asset: ModelAsset) {
        asset.graph.update_world(Mat4::IDENTITY);
        let bounds = pose_bounds(&asset.primitives, &asset.graph, &asset.skins);

        let center = match (self.config.model.center, bounds) {
            (true, Some(bounds)) => bounds.center(),
            _ => Vec3::ZERO,
        };

        if self.config.model.frame_camera {
            if let Some(bounds) = bounds {
                let distance = bounds.diagonal() * 1.5;
                if distance > 0.0 {
                    self.camera.position.z = distance;
                    let target = self.orbit.as_ref().map_or(Vec3::ZERO, |o| o.target);
                    self.camera.look_at(target);
                    log::debug!("Framed model at distance {:.3}", distance);
                }
            }
        }

        let mut mixer = AnimationMixer::new().with_max_delta(self.config.animation.max_delta);
        if self.config.animation.play {
            if let Some(clip) = asset.clips.first() {
                log::info!("Playing clip '{}' ({:.2}s)", clip.name, clip.duration);
                mixer.play(clip.clone());
            } else {
                log::info!("Model '{}' has no animation clips", asset.name);
            }
        }

        if let Some(tracker) = self.tracker.as_mut() {
            tracker.bind(&asset.graph);
        }

        let materials = resolve_materials(&asset.materials, &self.config.materials);

        log::info!(
            "Loaded model '{}': {} nodes, {} primitives, {} vertices",
            asset.name,
            asset.graph.len(),
            asset.primitives.len(),
            asset.vertex_count()
        );
        self.status = ModelStatus::Loaded {
            name: asset.name.clone(),
            vertices: asset.vertex_count(),
        };

        let model = LoadedModel {
            asset,
            mixer,
            materials,
            center,
            spin: 0.0,
        };
        let root = model.root_matrix(&self.config);
        self.model = Some(model);
        if let Some(model) = self.model.as_mut() {
            model.asset.graph.update_world(root);
        }
    }

    pub fn detach(&mut self) {
        self.model = None;
        self.geometry = SceneGeometry::default();
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.unbind();
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        self.pointer.set_viewport(width, height);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer.pointer_moved(x, y);
    }

    /// Orbit by a drag of `delta` pixels; ignored without orbit controls
    pub fn drag(&mut self, delta: Vec2) {
        let height = self.pointer.viewport().1;
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.rotate_by_pixels(delta, height);
        }
    }

    /// Positive steps zoom in
    pub fn zoom(&mut self, steps: f32) {
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.zoom(steps);
        }
    }

    /// Advance one frame of `delta` seconds
    pub fn tick(&mut self, delta: f32) {
        self.frame += 1;
        let config = &self.config;

        if let Some(model) = self.model.as_mut() {
            model.mixer.update(delta, &mut model.asset.graph);
            model.spin += config.model.spin_per_frame;
        }

        if let Some(orbit) = self.orbit.as_mut() {
            orbit.update(&mut self.camera);
        }

        let root = self.model.as_ref().map(|m| m.root_matrix(config));
        if let (Some(model), Some(root)) = (self.model.as_mut(), root) {
            model.asset.graph.update_world(root);
        }

        if let Some(tracker) = self.tracker.as_mut() {
            tracker.track(&self.camera, self.pointer.sample());
            if let (Some(model), Some(root)) = (self.model.as_mut(), root) {
                if tracker.orient(&mut model.asset.graph).is_some() {
                    model.asset.graph.update_world(root);
                }
            }
        }

        self.rebuild_geometry();
    }

    fn rebuild_geometry(&mut self) {
        self.geometry.opaque.clear();
        self.geometry.translucent.clear();

        let Some(model) = self.model.as_ref() else {
            return;
        };

        let fallback = Material::default();
        for primitive in &model.asset.primitives {
            let material = primitive
                .material
                .and_then(|m| model.materials.get(m))
                .unwrap_or(&fallback);
            let batch = if material.is_translucent() {
                &mut self.geometry.translucent
            } else {
                &mut self.geometry.opaque
            };

            let (positions, normals) = primitive.deform(&model.asset.graph, &model.asset.skins);
            let base = batch.vertices.len() as u32;
            batch.vertices.extend(positions.iter().zip(&normals).map(|(p, n)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
                color: material.base_color,
            }));
            batch.indices.extend(primitive.indices.iter().map(|i| base + i));
        }
    }

    pub fn geometry(&self) -> &SceneGeometry {
        &self.geometry
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        self.camera.to_uniform()
    }

    pub fn light_uniform(&self) -> LightUniform {
        let lights = &self.config.lights;
        let scaled = |rgb: [f32; 3], intensity: f32| rgb.map(|c| c * intensity);
        let direction = (-Vec3::from(lights.directional_position)).normalize_or(Vec3::NEG_Y);
        LightUniform::new(
            scaled(lights.ambient_color.to_linear(), lights.ambient_intensity),
            direction.to_array(),
            scaled(lights.directional_color.to_linear(), lights.directional_intensity),
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }

    pub fn tracker(&self) -> Option<&HeadTracker> {
        self.tracker.as_ref()
    }

    pub fn model(&self) -> Option<&ModelAsset> {
        self.model.as_ref().map(|m| &m.asset)
    }

    /// Frames ticked so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current playback time of the first clip, if any is playing
    pub fn clip_time(&self) -> Option<f32> {
        self.model
            .as_ref()
            .and_then(|m| m.mixer.actions().first())
            .map(|action| action.time)
    }
}

/// Apply `force_opaque` and name-based overrides to the asset's materials
pub fn resolve_materials(materials: &[Material], config: &MaterialsConfig) -> Vec<Material> {
    materials
        .iter()
        .map(|material| {
            let mut resolved = material.clone();
            if config.force_opaque {
                resolved.base_color[3] = 1.0;
            }

            let name = material.name.to_lowercase();
            if let Some(over) = config
                .overrides
                .iter()
                .find(|o| name.contains(&o.name_contains.to_lowercase()))
            {
                let [r, g, b] = over.color.to_linear();
                resolved.base_color = [r, g, b, over.opacity.clamp(0.0, 1.0)];
                log::debug!("Material '{}' overridden by '{}'", material.name, over.name_contains);
            }
            resolved
        })
        .collect()
}
