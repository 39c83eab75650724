use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::{Interpolation as GltfInterpolation, Property};
use std::path::Path;
use thiserror::Error;

use crate::math::AABB;
use crate::scene::{
    pose_bounds, Channel, Clip, Interpolation, Material, MeshPrimitive, Node, NodeId, SceneGraph,
    Skin, Track, Transform,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to import glTF '{source_name}'")]
    Import {
        source_name: String,
        #[source]
        source: gltf::Error,
    },
    #[error("glTF '{0}' contains no nodes")]
    EmptyScene(String),
    #[error("mesh '{mesh}' primitive {primitive} has no positions")]
    MissingPositions { mesh: String, primitive: usize },
    #[error("animation '{clip}' channel on node {node} has {times} times but {values} values")]
    ChannelMismatch {
        clip: String,
        node: usize,
        times: usize,
        values: usize,
    },
    #[error("animation '{clip}' channel on node {node} has a negative or non-finite key time")]
    InvalidKeyframe { clip: String, node: usize },
}

/// Everything the session needs from one glTF file
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub name: String,
    pub graph: SceneGraph,
    pub primitives: Vec<MeshPrimitive>,
    pub skins: Vec<Skin>,
    pub materials: Vec<Material>,
    pub clips: Vec<Clip>,
}

impl ModelAsset {
    /// Bounds of the model in its current pose
    pub fn bounds(&self) -> Option<AABB> {
        pose_bounds(&self.primitives, &self.graph, &self.skins)
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.positions.len()).sum()
    }
}

/// Loads a glTF/GLB file from disk
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelAsset, LoadError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    log::info!("Loading glTF file: {}", name);

    let (document, buffers, _images) = gltf::import(path).map_err(|source| LoadError::Import {
        source_name: name.clone(),
        source,
    })?;

    build_model(name, &document, &buffers)
}

/// Loads a glTF/GLB image already in memory (embedded buffers only)
pub fn load_model_from_slice(name: &str, bytes: &[u8]) -> Result<ModelAsset, LoadError> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).map_err(|source| LoadError::Import {
            source_name: name.to_string(),
            source,
        })?;

    build_model(name.to_string(), &document, &buffers)
}

fn build_model(
    name: String,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<ModelAsset, LoadError> {
    let graph = read_graph(document);
    if graph.is_empty() {
        return Err(LoadError::EmptyScene(name));
    }

    let materials: Vec<Material> = document.materials().map(read_material).collect();
    let skins: Vec<Skin> = document.skins().map(|s| read_skin(&s, buffers)).collect();

    let mut primitives = Vec::new();
    for node in document.nodes() {
        if let Some(mesh) = node.mesh() {
            read_mesh(&node, &mesh, buffers, &mut primitives)?;
        }
    }

    let mut clips = Vec::new();
    for (index, animation) in document.animations().enumerate() {
        if let Some(clip) = read_clip(index, &animation, buffers)? {
            clips.push(clip);
        }
    }

    log::info!(
        "glTF '{}' loaded: {} nodes, {} primitives, {} skins, {} clips",
        name,
        graph.len(),
        primitives.len(),
        skins.len(),
        clips.len()
    );

    Ok(ModelAsset {
        name,
        graph,
        primitives,
        skins,
        materials,
        clips,
    })
}

fn read_graph(document: &gltf::Document) -> SceneGraph {
    let mut nodes = Vec::with_capacity(document.nodes().count());
    let mut links = Vec::new();

    for node in document.nodes() {
        let (t, r, s) = node.transform().decomposed();
        let rotation = Quat::from_xyzw(r[0], r[1], r[2], r[3]);
        let local = Transform {
            translation: Vec3::from_array(t),
            rotation: if rotation.length_squared() > 0.0 {
                rotation.normalize()
            } else {
                Quat::IDENTITY
            },
            scale: Vec3::from_array(s),
        };
        nodes.push(Node::new(node.name().unwrap_or_default(), local));
        links.extend(node.children().map(|child| (node.index(), child.index())));
    }

    SceneGraph::new(nodes, &links)
}

fn read_material(material: gltf::Material) -> Material {
    let base_color = material.pbr_metallic_roughness().base_color_factor();
    let opaque = matches!(material.alpha_mode(), gltf::material::AlphaMode::Opaque);
    Material {
        name: material.name().unwrap_or_default().to_string(),
        base_color: if opaque {
            [base_color[0], base_color[1], base_color[2], 1.0]
        } else {
            base_color
        },
    }
}

fn read_skin(skin: &gltf::Skin, buffers: &[gltf::buffer::Data]) -> Skin {
    let joints: Vec<NodeId> = skin.joints().map(|j| NodeId(j.index())).collect();
    let mut inverse_bind = vec![Mat4::IDENTITY; joints.len()];

    let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
    if let Some(matrices) = reader.read_inverse_bind_matrices() {
        for (slot, matrix) in inverse_bind.iter_mut().zip(matrices) {
            *slot = Mat4::from_cols_array_2d(&matrix);
        }
    }

    Skin {
        joints,
        inverse_bind,
    }
}

fn read_mesh(
    node: &gltf::Node,
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshPrimitive>,
) -> Result<(), LoadError> {
    let mesh_name = mesh.name().unwrap_or("unnamed").to_string();

    for primitive in mesh.primitives() {
        if !matches!(primitive.mode(), gltf::mesh::Mode::Triangles) {
            log::warn!(
                "Mesh '{}' primitive {} uses {:?}; only triangles are drawn",
                mesh_name,
                primitive.index(),
                primitive.mode()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| LoadError::MissingPositions {
                mesh: mesh_name.clone(),
                primitive: primitive.index(),
            })?
            .map(Vec3::from_array)
            .collect();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let indices: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| (i as usize) < positions.len()))
            .flatten()
            .copied()
            .collect();

        let normals = match reader.read_normals() {
            Some(normals) => normals.map(Vec3::from_array).collect(),
            None => compute_normals(&positions, &indices),
        };

        let joints: Vec<[u16; 4]> = reader
            .read_joints(0)
            .map(|j| j.into_u16().collect())
            .unwrap_or_default();
        let weights: Vec<[f32; 4]> = reader
            .read_weights(0)
            .map(|w| w.into_f32().collect())
            .unwrap_or_default();
        let (joints, weights) = if joints.len() == positions.len() && weights.len() == positions.len() {
            (joints, weights)
        } else {
            if !joints.is_empty() || !weights.is_empty() {
                log::warn!(
                    "Mesh '{}' primitive {} has {} joints and {} weights for {} vertices; drawing it unskinned",
                    mesh_name,
                    primitive.index(),
                    joints.len(),
                    weights.len(),
                    positions.len()
                );
            }
            (Vec::new(), Vec::new())
        };

        out.push(MeshPrimitive {
            node: NodeId(node.index()),
            skin: node.skin().map(|s| s.index()),
            material: primitive.material().index(),
            positions,
            normals,
            joints,
            weights,
            indices,
        });
    }

    Ok(())
}

fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += normal;
        normals[i1] += normal;
        normals[i2] += normal;
    }
    for normal in &mut normals {
        *normal = normal.try_normalize().unwrap_or(Vec3::Y);
    }
    normals
}

fn read_clip(
    index: usize,
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
) -> Result<Option<Clip>, LoadError> {
    let clip_name = animation
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("animation_{index}"));

    let mut channels: Vec<Channel> = Vec::new();

    for channel in animation.channels() {
        let node = channel.target().node().index();
        let interpolation = match channel.sampler().interpolation() {
            GltfInterpolation::Linear => Interpolation::Linear,
            GltfInterpolation::Step => Interpolation::Step,
            GltfInterpolation::CubicSpline => {
                log::warn!(
                    "Animation '{}' uses CubicSpline on node {}; channel skipped",
                    clip_name,
                    node
                );
                continue;
            }
        };

        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(inputs) = reader.read_inputs() else {
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        if times.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(LoadError::InvalidKeyframe {
                clip: clip_name,
                node,
            });
        }
        let Some(outputs) = reader.read_outputs() else {
            continue;
        };

        let slot = match channels.iter().position(|c| c.node.0 == node) {
            Some(i) => i,
            None => {
                channels.push(Channel::new(NodeId(node)));
                channels.len() - 1
            }
        };
        let entry = &mut channels[slot];

        let mismatch = |values: usize| LoadError::ChannelMismatch {
            clip: clip_name.clone(),
            node,
            times: times.len(),
            values,
        };

        match (channel.target().property(), outputs) {
            (Property::Translation, ReadOutputs::Translations(values)) => {
                let values: Vec<Vec3> = values.map(Vec3::from_array).collect();
                if values.len() != times.len() {
                    return Err(mismatch(values.len()));
                }
                entry.translation = Some(Track::new(interpolation, times, values));
            }
            (Property::Rotation, ReadOutputs::Rotations(values)) => {
                let values: Vec<Quat> = values
                    .into_f32()
                    .map(|q| Quat::from_xyzw(q[0], q[1], q[2], q[3]).normalize())
                    .collect();
                if values.len() != times.len() {
                    return Err(mismatch(values.len()));
                }
                entry.rotation = Some(Track::new(interpolation, times, values));
            }
            (Property::Scale, ReadOutputs::Scales(values)) => {
                let values: Vec<Vec3> = values.map(Vec3::from_array).collect();
                if values.len() != times.len() {
                    return Err(mismatch(values.len()));
                }
                entry.scale = Some(Track::new(interpolation, times, values));
            }
            _ => {}
        }
    }

    channels.retain(|c| !c.is_empty());
    if channels.is_empty() {
        return Ok(None);
    }
    Ok(Some(Clip::new(clip_name, channels)))
}
