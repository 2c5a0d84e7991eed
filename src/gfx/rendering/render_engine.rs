//! WGPU-based renderer for windowed sessions
//!
//! Draws every visible scene mesh with a flat-shaded pipeline into a winit
//! window surface, with multisample antialiasing when requested and
//! supported by the adapter.

use std::{iter, sync::Arc};

use cgmath::{InnerSpace, Matrix3, Matrix4, Point3, Transform, Vector3};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::error::{Result, SessionError};
use crate::gfx::camera::{CameraUniform, PerspectiveCamera};
use crate::gfx::scene::{Scene, Vertex3D};
use crate::host::{SurfaceId, WindowContainer};

use super::renderer::{Renderer, RendererDescriptor};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MSAA_SAMPLES: u32 = 4;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};

/// Window renderer built on wgpu
pub struct RenderEngine {
    surface_id: SurfaceId,
    size: (u32, u32),
    gpu: Option<GpuState>,
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
}

impl RenderEngine {
    /// Creates a renderer presenting into `window`
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `descriptor` - Initial surface size and whether to antialias
    pub async fn new(window: Arc<Window>, descriptor: &RendererDescriptor) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| SessionError::Renderer(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| SessionError::Renderer(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Quickscene Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| SessionError::Renderer(e.to_string()))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| SessionError::Renderer("surface reports no formats".to_string()))?;

        let sample_count = if descriptor.antialias
            && adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(MSAA_SAMPLES)
        {
            MSAA_SAMPLES
        } else {
            if descriptor.antialias {
                log::warn!("{:?} does not support {}x MSAA, rendering without antialiasing", format, MSAA_SAMPLES);
            }
            1
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: descriptor.width.max(1),
            height: descriptor.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flat Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/flat.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flat Pipeline Layout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Flat Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        });

        let (msaa_view, depth_view) = create_attachments(&device, &config, sample_count);

        log::info!(
            "Created wgpu renderer {}x{} ({:?}, {}x MSAA)",
            config.width,
            config.height,
            format,
            sample_count
        );

        Ok(Self {
            surface_id: SurfaceId::next(),
            size: (descriptor.width, descriptor.height),
            gpu: Some(GpuState {
                surface,
                device,
                queue,
                config,
                sample_count,
                msaa_view,
                depth_view,
                pipeline,
                camera_buffer,
                camera_bind_group,
                vertex_buffer: None,
                index_buffer: None,
            }),
        })
    }

    pub fn sample_count(&self) -> Option<u32> {
        self.gpu.as_ref().map(|gpu| gpu.sample_count)
    }
}

impl Renderer for RenderEngine {
    type Target = WindowContainer;

    fn create(target: &WindowContainer, descriptor: &RendererDescriptor) -> Result<Self> {
        pollster::block_on(Self::new(target.window().clone(), descriptor))
    }

    fn surface(&self) -> SurfaceId {
        self.surface_id
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        gpu.config.width = width.max(1);
        gpu.config.height = height.max(1);
        gpu.surface.configure(&gpu.device, &gpu.config);

        let (msaa_view, depth_view) = create_attachments(&gpu.device, &gpu.config, gpu.sample_count);
        gpu.msaa_view = msaa_view;
        gpu.depth_view = depth_view;
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<()> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };

        let surface_texture = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(e) => return Err(SessionError::Renderer(e.to_string())),
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniform = {
            let mut camera = *camera;
            camera.update_view_proj();
            camera.uniform
        };
        gpu.queue
            .write_buffer(&gpu.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));

        let (vertices, indices) = flatten_scene(scene);
        if !indices.is_empty() {
            upload(&gpu.device, &gpu.queue, &mut gpu.vertex_buffer, bytemuck::cast_slice(&vertices), wgpu::BufferUsages::VERTEX);
            upload(&gpu.device, &gpu.queue, &mut gpu.index_buffer, bytemuck::cast_slice(&indices), wgpu::BufferUsages::INDEX);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let (view, resolve_target) = match &gpu.msaa_view {
                Some(msaa_view) => (msaa_view, Some(&surface_view)),
                None => (&surface_view, None),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let (false, Some(vertex_buffer), Some(index_buffer)) =
                (indices.is_empty(), &gpu.vertex_buffer, &gpu.index_buffer)
            {
                render_pass.set_pipeline(&gpu.pipeline);
                render_pass.set_bind_group(0, &gpu.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..indices.len() as u32, 0, 0..1);
            }
        }

        gpu.queue.submit(iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn dispose(&mut self) {
        if self.gpu.take().is_some() {
            log::debug!("Released wgpu renderer resources");
        }
    }
}

/// Multisample color target (when sampling) and depth buffer matching the surface
fn create_attachments(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> (Option<wgpu::TextureView>, wgpu::TextureView) {
    let size = wgpu::Extent3d {
        width: config.width,
        height: config.height,
        depth_or_array_layers: 1,
    };

    let texture = |label: &str, format: wgpu::TextureFormat| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    };

    let msaa_view = (sample_count > 1).then(|| texture("MSAA Color Texture", config.format));
    (msaa_view, texture("Depth Texture", DEPTH_FORMAT))
}

/// Writes `contents` into `buffer`, growing it when too small
fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &mut Option<wgpu::Buffer>,
    contents: &[u8],
    usage: wgpu::BufferUsages,
) {
    match buffer {
        Some(existing) if existing.size() >= contents.len() as wgpu::BufferAddress => {
            queue.write_buffer(existing, 0, contents);
        }
        _ => {
            *buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Scene Geometry Buffer"),
                contents,
                usage: usage | wgpu::BufferUsages::COPY_DST,
            }));
        }
    }
}

/// World-space vertices and rebased indices of every visible mesh
fn flatten_scene(scene: &Scene) -> (Vec<Vertex3D>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for (mesh, world) in scene.visible_meshes() {
        let base = vertices.len() as u32;
        let normal_matrix = normal_matrix(&world);

        vertices.extend(mesh.vertices().iter().map(|vertex| {
            let position = world.transform_point(Point3::from(vertex.position));
            let normal = (normal_matrix * Vector3::from(vertex.normal)).normalize();
            Vertex3D {
                position: position.into(),
                normal: normal.into(),
            }
        }));
        indices.extend(mesh.indices().iter().map(|index| index + base));
    }

    (vertices, indices)
}

fn normal_matrix(world: &Matrix4<f32>) -> Matrix3<f32> {
    use cgmath::{Matrix, SquareMatrix};

    let upper = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
    upper.invert().map(|inv| inv.transpose()).unwrap_or(upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_cube;
    use crate::gfx::scene::{Mesh, Object3D};

    #[test]
    fn test_flatten_scene_rebases_indices() {
        let mut scene = Scene::new();
        scene.add_geometry("a", &generate_cube());
        let mut b = Object3D::with_mesh("b", Mesh::from(&generate_cube()));
        b.set_translation(Vector3::new(10.0, 0.0, 0.0));
        scene.add(b);

        let (vertices, indices) = flatten_scene(&scene);
        assert_eq!(vertices.len(), 48);
        assert_eq!(indices.len(), 72);
        assert_eq!(indices[36], 24);
        assert_eq!(vertices[24].position[0], 9.5);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn test_normal_matrix_keeps_normals_perpendicular_under_scale() {
        let world = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let normal = (normal_matrix(&world) * Vector3::new(1.0, 1.0, 0.0)).normalize();
        // The surface tangent (1, -1, 0) becomes (2, -1, 0) after scaling
        assert!(normal.dot(Vector3::new(2.0, -1.0, 0.0)).abs() < 1e-5);
    }
}
