/// Camera uniform buffer data for GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _pad: f32,
}

/// Ambient + single directional light, colours pre-multiplied by intensity
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 4],
    /// Direction the light travels, world space
    pub direction: [f32; 4],
    pub color: [f32; 4],
}

impl LightUniform {
    pub fn new(ambient: [f32; 3], direction: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
            direction: [direction[0], direction[1], direction[2], 0.0],
            color: [color[0], color[1], color[2], 1.0],
        }
    }
}

/// Vertex of the deformed model, rebuilt every frame
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
