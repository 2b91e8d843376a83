use wgpu::{BindGroupLayout, Device, RenderPipeline, TextureFormat};

use super::Vertex;

const CANVAS_SHADER: &str = include_str!("../../shaders/canvas.wgsl");

/// The one pipeline the scene needs: flat-coloured triangles in pixel space,
/// alpha blended in draw order. Culling stays off since rotated shapes do
/// not keep a consistent winding.
pub fn canvas_pipeline(
    device: &Device,
    format: TextureFormat,
    uniform_layout: &BindGroupLayout,
) -> RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("canvas shader"),
        source: wgpu::ShaderSource::Wgsl(CANVAS_SHADER.into()),
    });

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("canvas pipeline layout"),
        bind_group_layouts: &[uniform_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("canvas pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: "vs_main",
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
