use crate::field::{FieldSlot, Release};
use crate::initialize::FieldBuffers;
use crate::mesh::uv_sphere;
use crate::texture::MaskImage;
use crate::{BodyInstance, Lighting, PointVertex};
use std::borrow::Cow;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const SPHERE_STACKS: u32 = 24;
const SPHERE_SLICES: u32 = 48;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
  size: f32,
  scale_points: u32,
  _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct LightingUniform {
  ambient: f32,
  sun: f32,
  _pad: [f32; 2],
}

impl From<&Lighting> for LightingUniform {
  fn from(lighting: &Lighting) -> Self {
    Self {
      ambient: lighting.ambient,
      sun: lighting.sun,
      _pad: [0.0; 2],
    }
  }
}

fn clear_color(lighting: &Lighting) -> wgpu::Color {
  wgpu::Color {
    r: f64::from(lighting.background.r),
    g: f64::from(lighting.background.g),
    b: f64::from(lighting.background.b),
    a: 1.0,
  }
}

/// GPU side of one particle field generation.
pub struct FieldGpu {
  instance_buffer: wgpu::Buffer,
  material_buffer: wgpu::Buffer,
  bind_group: wgpu::BindGroup,
  count: u32,
}

impl Release for FieldGpu {
  fn release(self) {
    self.instance_buffer.destroy();
    self.material_buffer.destroy();
  }
}

struct BodyBuffer {
  buffer: wgpu::Buffer,
  capacity: usize,
}

pub struct Render {
  point_pipeline: wgpu::RenderPipeline,
  body_pipeline: wgpu::RenderPipeline,
  quad_buffer: wgpu::Buffer,
  material_layout: wgpu::BindGroupLayout,
  mask_view: wgpu::TextureView,
  mask_sampler: wgpu::Sampler,
  field: FieldSlot<FieldGpu>,
  sphere_vertices: wgpu::Buffer,
  sphere_indices: wgpu::Buffer,
  sphere_index_count: u32,
  bodies: Option<BodyBuffer>,
  body_count: u32,
  lighting_buffer: wgpu::Buffer,
  lighting_bind_group: wgpu::BindGroup,
  background: wgpu::Color,
  depth_view: wgpu::TextureView,
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    mask: &MaskImage,
  ) -> Self {
    let point_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("points"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/points.wgsl"))),
    });
    let body_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("bodies"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/bodies.wgsl"))),
    });
    let target_format = config.view_formats[0];

    // ========================================================================
    // particle field
    // ========================================================================

    let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      entries: &[
        wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<MaterialUniform>() as _),
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 1,
          visibility: wgpu::ShaderStages::FRAGMENT,
          ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 2,
          visibility: wgpu::ShaderStages::FRAGMENT,
          ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
          count: None,
        },
      ],
      label: Some("point_material_layout"),
    });
    let point_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("points"),
      bind_group_layouts: &[camera_bind_group_layout, &material_layout],
      push_constant_ranges: &[],
    });
    let particle_buffer = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x3],
    };
    let corner_buffer = wgpu::VertexBufferLayout {
      array_stride: 2 * 4,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![3 => Float32x2],
    };
    let additive = wgpu::BlendComponent {
      src_factor: wgpu::BlendFactor::One,
      dst_factor: wgpu::BlendFactor::One,
      operation: wgpu::BlendOperation::Add,
    };
    let point_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Point Pipeline"),
      layout: Some(&point_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &point_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[particle_buffer, corner_buffer],
      },
      fragment: Some(wgpu::FragmentState {
        module: &point_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(wgpu::ColorTargetState {
          format: target_format,
          blend: Some(wgpu::BlendState {
            color: additive,
            alpha: additive,
          }),
          write_mask: wgpu::ColorWrites::ALL,
        })],
      }),
      primitive: wgpu::PrimitiveState::default(),
      // particles are occluded by planets but never by each other
      depth_stencil: Some(wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
      }),
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    #[rustfmt::skip]
    let quad: [f32; 12] = [
      -1.0, -1.0,
       1.0, -1.0,
       1.0,  1.0,
      -1.0, -1.0,
       1.0,  1.0,
      -1.0,  1.0,
    ];
    let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Quad Buffer"),
      contents: bytemuck::bytes_of(&quad),
      usage: wgpu::BufferUsages::VERTEX,
    });

    let mask_view = mask.create_view(device, queue);
    let mask_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
      label: Some("Mask Sampler"),
      address_mode_u: wgpu::AddressMode::ClampToEdge,
      address_mode_v: wgpu::AddressMode::ClampToEdge,
      address_mode_w: wgpu::AddressMode::ClampToEdge,
      mag_filter: wgpu::FilterMode::Linear,
      min_filter: wgpu::FilterMode::Linear,
      ..Default::default()
    });

    // ========================================================================
    // bodies
    // ========================================================================

    let lighting = Lighting::default();
    let lighting_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Lighting Buffer"),
      contents: bytemuck::bytes_of(&LightingUniform::from(&lighting)),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let lighting_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      entries: &[wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
          ty: wgpu::BufferBindingType::Uniform,
          has_dynamic_offset: false,
          min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<LightingUniform>() as _),
        },
        count: None,
      }],
      label: Some("lighting_layout"),
    });
    let lighting_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &lighting_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: lighting_buffer.as_entire_binding(),
      }],
      label: Some("lighting_bind_group"),
    });

    let body_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("bodies"),
      bind_group_layouts: &[camera_bind_group_layout, &lighting_layout],
      push_constant_ranges: &[],
    });
    let mesh_buffer = wgpu::VertexBufferLayout {
      array_stride: 6 * 4, // pos3 + normal3
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
    let instance_buffer = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<BodyInstance>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![
        2 => Float32x3, 3 => Float32, 4 => Float32x3, 5 => Float32, 6 => Float32
      ],
    };
    let body_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Body Pipeline"),
      layout: Some(&body_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &body_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[mesh_buffer, instance_buffer],
      },
      fragment: Some(wgpu::FragmentState {
        module: &body_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(target_format.into())],
      }),
      primitive: wgpu::PrimitiveState::default(),
      depth_stencil: Some(wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
      }),
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    let sphere = uv_sphere(SPHERE_STACKS, SPHERE_SLICES);
    let sphere_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Sphere Vertices"),
      contents: bytemuck::cast_slice(&sphere.vertices),
      usage: wgpu::BufferUsages::VERTEX,
    });
    let sphere_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Sphere Indices"),
      contents: bytemuck::cast_slice(&sphere.indices),
      usage: wgpu::BufferUsages::INDEX,
    });

    Render {
      point_pipeline,
      body_pipeline,
      quad_buffer,
      material_layout,
      mask_view,
      mask_sampler,
      field: FieldSlot::Absent,
      sphere_vertices,
      sphere_indices,
      sphere_index_count: sphere.indices.len() as u32,
      bodies: None,
      body_count: 0,
      lighting_buffer,
      lighting_bind_group,
      background: clear_color(&lighting),
      depth_view: create_depth_view(device, config),
    }
  }

  /// Swaps in a freshly generated field. The previous buffers are destroyed
  /// before the new ones are allocated.
  pub fn rebuild_field(&mut self, device: &wgpu::Device, field: &FieldBuffers) {
    let material_layout = &self.material_layout;
    let mask_view = &self.mask_view;
    let mask_sampler = &self.mask_sampler;
    self.field.rebuild(|| {
      let mut vertices = field.vertices();
      let count = vertices.len() as u32;
      if vertices.is_empty() {
        // zero-sized vertex buffers cannot be bound
        vertices.push(bytemuck::Zeroable::zeroed());
      }
      let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Particle Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
      });
      let material = MaterialUniform {
        size: field.material.size,
        scale_points: u32::from(field.material.scale_points),
        _pad: [0.0; 2],
      };
      let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Point Material Buffer"),
        contents: bytemuck::bytes_of(&material),
        usage: wgpu::BufferUsages::UNIFORM,
      });
      let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: material_layout,
        entries: &[
          wgpu::BindGroupEntry {
            binding: 0,
            resource: material_buffer.as_entire_binding(),
          },
          wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::TextureView(mask_view),
          },
          wgpu::BindGroupEntry {
            binding: 2,
            resource: wgpu::BindingResource::Sampler(mask_sampler),
          },
        ],
        label: Some("point_material_bind_group"),
      });
      FieldGpu {
        instance_buffer,
        material_buffer,
        bind_group,
        count,
      }
    });
  }

  /// Uploads this tick's body transforms.
  pub fn write_bodies(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[BodyInstance]) {
    self.body_count = instances.len() as u32;
    if instances.is_empty() {
      return;
    }
    let grow = self
      .bodies
      .as_ref()
      .map_or(true, |b| b.capacity < instances.len());
    if grow {
      if let Some(old) = self.bodies.take() {
        old.buffer.destroy();
      }
      self.bodies = Some(BodyBuffer {
        buffer: device.create_buffer(&wgpu::BufferDescriptor {
          label: Some("Body Instances"),
          size: std::mem::size_of_val(instances) as wgpu::BufferAddress,
          usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
          mapped_at_creation: false,
        }),
        capacity: instances.len(),
      });
    }
    if let Some(bodies) = &self.bodies {
      queue.write_buffer(&bodies.buffer, 0, bytemuck::cast_slice(instances));
    }
  }

  /// Uploads light intensities and picks up the clear colour for later frames.
  pub fn write_lighting(&mut self, queue: &wgpu::Queue, lighting: &Lighting) {
    queue.write_buffer(
      &self.lighting_buffer,
      0,
      bytemuck::bytes_of(&LightingUniform::from(lighting)),
    );
    self.background = clear_color(lighting);
  }

  pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
    self.depth_view = create_depth_view(device, config);
  }

  pub fn render(
    &mut self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_bind_group: &wgpu::BindGroup,
  ) {
    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(self.background),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
        view: &self.depth_view,
        depth_ops: Some(wgpu::Operations {
          load: wgpu::LoadOp::Clear(1.0),
          store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
      }),
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);

      // opaque bodies first so they occlude the additive field
      if let Some(bodies) = self.bodies.as_ref().filter(|_| self.body_count > 0) {
        rpass.set_pipeline(&self.body_pipeline);
        rpass.set_bind_group(0, camera_bind_group, &[]);
        rpass.set_bind_group(1, &self.lighting_bind_group, &[]);
        rpass.set_vertex_buffer(0, self.sphere_vertices.slice(..));
        rpass.set_vertex_buffer(1, bodies.buffer.slice(..));
        rpass.set_index_buffer(self.sphere_indices.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.sphere_index_count, 0, 0..self.body_count);
      }

      if let Some(field) = self.field.get().filter(|f| f.count > 0) {
        rpass.set_pipeline(&self.point_pipeline);
        rpass.set_bind_group(0, camera_bind_group, &[]);
        rpass.set_bind_group(1, &field.bind_group, &[]);
        rpass.set_vertex_buffer(0, field.instance_buffer.slice(..));
        rpass.set_vertex_buffer(1, self.quad_buffer.slice(..));
        rpass.draw(0..6, 0..field.count);
      }
    }
    queue.submit(Some(command_encoder.finish()));
  }
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
  let texture = device.create_texture(&wgpu::TextureDescriptor {
    label: Some("Depth Texture"),
    size: wgpu::Extent3d {
      width: config.width.max(1),
      height: config.height.max(1),
      depth_or_array_layers: 1,
    },
    mip_level_count: 1,
    sample_count: 1,
    dimension: wgpu::TextureDimension::D2,
    format: DEPTH_FORMAT,
    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
    view_formats: &[],
  });
  texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Rgb;

  #[test]
  fn lighting_uniform_matches_shader_layout() {
    assert_eq!(std::mem::size_of::<LightingUniform>(), 16);
    let uniform = LightingUniform::from(&Lighting {
      ambient: 0.5,
      sun: 2.0,
      ..Default::default()
    });
    assert_eq!((uniform.ambient, uniform.sun), (0.5, 2.0));
  }

  #[test]
  fn clear_color_follows_background() {
    let color = clear_color(&Lighting {
      background: Rgb::new(1.0, 0.5, 0.0),
      ..Default::default()
    });
    assert_eq!((color.r, color.g, color.b, color.a), (1.0, 0.5, 0.0, 1.0));
  }
}
