use crate::camera::{Camera, CameraController, CameraMode, CameraRig, CameraUniform};
use crate::controls::{control_for_key, Control};
use crate::error::GpuError;
use crate::initialize::generate_field;
use crate::orbit::{self, Body, OrbitModel};
use crate::render::Render;
use crate::scene::SceneLoader;
use crate::texture::MaskImage;
use crate::{BodyInstance, CameraParams, FieldParams, Tuning};
use rand::{rngs::SmallRng, SeedableRng};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wgpu::util::DeviceExt;
use winit::{
  dpi::PhysicalSize,
  event::{ElementState, Event, KeyEvent, MouseButton, StartCause, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  keyboard::{KeyCode, PhysicalKey},
  window::{Fullscreen, Window},
};

const DOUBLE_CLICK: Duration = Duration::from_millis(400);

/// Where the particle sprite mask comes from.
#[derive(Clone, Debug)]
pub enum MaskSource {
  SoftDisc,
  Solid,
  File(PathBuf),
}

impl MaskSource {
  fn load(&self) -> MaskImage {
    match self {
      MaskSource::SoftDisc => MaskImage::soft_disc(64),
      MaskSource::Solid => MaskImage::solid(),
      MaskSource::File(path) => MaskImage::from_file(path).unwrap_or_else(|e| {
        log::warn!("point mask {} unavailable, using soft disc: {e}", path.display());
        MaskImage::soft_disc(64)
      }),
    }
  }
}

#[derive(Clone, Debug)]
pub struct Options {
  pub params: FieldParams,
  pub seed: Option<u64>,
  pub scene: PathBuf,
  pub mask: MaskSource,
  /// Body to track as soon as the scene is available.
  pub track: Option<String>,
  pub frames: u32,
  pub fps: f32,
}

fn make_rng(seed: Option<u64>) -> SmallRng {
  match seed {
    Some(seed) => SmallRng::seed_from_u64(seed),
    None => SmallRng::from_entropy(),
  }
}

fn install_interrupt() -> Arc<AtomicBool> {
  let flag = Arc::new(AtomicBool::new(false));
  let handler_flag = flag.clone();
  if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
    log::warn!("could not install Ctrl-C handler: {e}");
  }
  flag
}

/// Two presses inside the double-click window count as one double click.
#[derive(Default)]
pub struct DoubleClick {
  last: Option<Instant>,
}

impl DoubleClick {
  pub fn click(&mut self, now: Instant) -> bool {
    match self.last.take() {
      Some(prev) if now.saturating_duration_since(prev) <= DOUBLE_CLICK => true,
      _ => {
        self.last = Some(now);
        false
      }
    }
  }
}

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  pub fn new(title: &str) -> Result<Self, GpuError> {
    let event_loop = EventLoop::new()?;
    let builder = winit::window::WindowBuilder::new()
      .with_title(title)
      .with_inner_size(PhysicalSize::new(1280, 800));
    let window = Arc::new(builder.build(&event_loop)?);

    Ok(Self { event_loop, window })
  }
}

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn configure(
    surface: wgpu::Surface<'static>,
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    size: PhysicalSize<u32>,
  ) -> Result<Self, GpuError> {
    let mut config = surface
      .get_default_config(adapter, size.width.max(1), size.height.max(1))
      .ok_or(GpuError::IncompatibleSurface)?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(device, &config);
    Ok(Self { surface, config })
  }

  fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
    self.config.width = size.width.max(1);
    self.config.height = size.height.max(1);
    self.surface.configure(device, &self.config);
  }

  fn acquire(&mut self, device: &wgpu::Device) -> Option<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Some(frame),
      Err(wgpu::SurfaceError::Timeout) => {
        log::debug!("surface timeout, skipping frame");
        None
      }
      Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
        self.surface.configure(device, &self.config);
        self.surface.get_current_texture().ok()
      }
      Err(e) => {
        log::error!("cannot acquire frame: {e}");
        None
      }
    }
  }
}

struct State {
  window: Arc<Window>,
  surface: SurfaceWrapper,
  device: wgpu::Device,
  queue: wgpu::Queue,
  camera: Camera,
  camera_uniform: CameraUniform,
  camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  camera_controller: CameraController,
  rig: CameraRig,
  render: Render,
  params: FieldParams,
  tuning: Tuning,
  model: OrbitModel,
  rng: SmallRng,
  bodies: Vec<Body>,
  loader: SceneLoader,
  track: Option<String>,
  clock: Instant,
  clicks: DoubleClick,
}

impl State {
  async fn init(window: Arc<Window>, options: &Options) -> Result<Self, GpuError> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    let surface = instance.create_surface(window.clone())?;

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
      })
      .await
      .ok_or(GpuError::NoAdapter)?;
    log::info!("using adapter {}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await?;

    let size = window.inner_size();
    let surface = SurfaceWrapper::configure(surface, &adapter, &device, size)?;

    let camera = Camera::new(size.width.max(1) as f32 / size.height.max(1) as f32);
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });
    let camera_params = CameraParams::default();
    let camera_controller = CameraController::init(camera_params.speed, camera_params.rotational_speed);

    let render = Render::init(
      &surface.config,
      &device,
      &queue,
      &camera_bind_group_layout,
      &options.mask.load(),
    );

    let mut state = Self {
      window,
      surface,
      device,
      queue,
      camera,
      camera_uniform,
      camera_buffer,
      camera_bind_group,
      camera_controller,
      rig: CameraRig::default(),
      render,
      params: options.params,
      tuning: Tuning::default(),
      model: OrbitModel::default(),
      rng: make_rng(options.seed),
      bodies: Vec::new(),
      loader: SceneLoader::spawn(options.scene.clone()),
      track: options.track.clone(),
      clock: Instant::now(),
      clicks: DoubleClick::default(),
    };
    state.rebuild_field();
    Ok(state)
  }

  fn rebuild_field(&mut self) {
    let field = generate_field(&self.params, &mut self.rng);
    self.render.rebuild_field(&self.device, &field);
    log::info!(
      "particle field rebuilt: {} points, size {:.3}, radii {}..{}",
      field.len(),
      self.params.size,
      self.params.min_radius,
      self.params.max_radius
    );
  }

  fn apply(&mut self, control: Control) {
    match control {
      Control::Select(name) => {
        self.rig.select(name, &self.bodies, &mut self.camera);
      }
      Control::Home => {
        log::info!("camera home");
        self.rig.home(&mut self.camera);
      }
      other => {
        if other.apply(&mut self.params, &mut self.tuning) {
          self.rebuild_field();
        } else {
          log::info!(
            "orbit rate {:.3}, rotation rate {:.3}, ambient {:.2}, sun {:.2}",
            self.tuning.orbit_rate,
            self.tuning.rotation_rate,
            self.tuning.lighting.ambient,
            self.tuning.lighting.sun
          );
        }
      }
    }
  }

  fn input(&mut self, event: &WindowEvent) -> bool {
    // the controller sees every key so releases are never lost while tracking
    if self.camera_controller.process_events(event) {
      return true;
    }
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state: ElementState::Pressed,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => match control_for_key(*keycode) {
        Some(control) => {
          self.apply(control);
          true
        }
        None => false,
      },
      WindowEvent::MouseInput {
        state: ElementState::Pressed,
        button: MouseButton::Left,
        ..
      } => {
        if self.clicks.click(Instant::now()) {
          self.toggle_fullscreen();
        }
        true
      }
      _ => false,
    }
  }

  fn toggle_fullscreen(&self) {
    if self.window.fullscreen().is_some() {
      self.window.set_fullscreen(None);
    } else {
      self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
    }
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    self.surface.resize(&self.device, size);
    self.camera.set_aspect(size.width, size.height);
    self.render.resize(&self.device, &self.surface.config);
  }

  fn update(&mut self) {
    if let Some(bodies) = self.loader.poll() {
      self.bodies = bodies;
      if let Some(name) = self.track.take() {
        self.rig.select(&name, &self.bodies, &mut self.camera);
      }
    }

    let elapsed = self.clock.elapsed().as_secs_f32();
    orbit::update(&mut self.bodies, elapsed, &self.tuning, &self.model);

    match self.rig.mode() {
      CameraMode::Free => self.camera_controller.update_camera(&mut self.camera),
      CameraMode::Tracking { .. } => self.rig.follow(&mut self.camera, &self.bodies),
    }
    self.camera_uniform.update_view_proj(&self.camera);
    self.queue.write_buffer(
      &self.camera_buffer,
      0,
      bytemuck::cast_slice(&[self.camera_uniform]),
    );

    let instances: Vec<BodyInstance> = self.bodies.iter().map(Body::to_instance).collect();
    self.render.write_bodies(&self.device, &self.queue, &instances);
    self.render.write_lighting(&self.queue, &self.tuning.lighting);
  }

  fn draw(&mut self) {
    let Some(frame) = self.surface.acquire(&self.device) else {
      return;
    };
    let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
      format: Some(self.surface.config.view_formats[0]),
      ..wgpu::TextureViewDescriptor::default()
    });
    self
      .render
      .render(&view, &self.device, &self.queue, &self.camera_bind_group);
    frame.present();
  }
}

async fn start(options: Options) -> Result<(), GpuError> {
  let interrupted = install_interrupt();
  let window_loop = EventLoopWrapper::new("Solar Sim")?;
  let mut context = State::init(window_loop.window.clone(), &options).await?;
  let window = window_loop.window;

  window_loop.event_loop.run(
    move |event, target: &EventLoopWindowTarget<()>| match event {
      Event::NewEvents(StartCause::Init) => {
        window.request_redraw();
      }
      Event::AboutToWait => {
        if interrupted.load(Ordering::SeqCst) {
          log::info!("interrupted, shutting down");
          target.exit();
        }
      }
      Event::WindowEvent { event, window_id } if window_id == window.id() => {
        if !context.input(&event) {
          match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
              event:
                KeyEvent {
                  state: ElementState::Pressed,
                  physical_key: PhysicalKey::Code(KeyCode::Escape),
                  ..
                },
              ..
            } => target.exit(),
            WindowEvent::Resized(size) => context.resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
              log::debug!("scale factor now {scale_factor}");
            }
            WindowEvent::RedrawRequested => {
              window.request_redraw();
              context.update();
              context.draw();
            }
            _ => {}
          }
        }
      }
      _ => {}
    },
  )?;
  Ok(())
}

/// Opens the window and runs until it is closed.
pub fn run(options: Options) -> Result<(), GpuError> {
  pollster::block_on(start(options))
}

/// Runs the core without a window: one field generation, then a fixed
/// number of ticks at a fixed timestep.
pub fn run_headless(options: Options) {
  let interrupted = install_interrupt();
  let mut rng = make_rng(options.seed);
  let field = generate_field(&options.params, &mut rng);
  log::info!("particle field: {} points", field.len());

  let mut loader = SceneLoader::spawn(options.scene.clone());
  let mut bodies = loader.wait().unwrap_or_default();

  let tuning = Tuning::default();
  let model = OrbitModel::default();
  let dt = 1.0 / options.fps.max(1.0);
  let mut rig = CameraRig::default();
  let mut camera = Camera::new(16.0 / 10.0);
  if let Some(name) = &options.track {
    if !rig.select(name, &bodies, &mut camera) {
      log::warn!("cannot track {name}: no such body");
    }
  }

  for frame in 0..options.frames {
    if interrupted.load(Ordering::SeqCst) {
      log::info!("interrupted after {frame} frames");
      break;
    }
    let elapsed = frame as f32 * dt;
    orbit::update(&mut bodies, elapsed, &tuning, &model);
    rig.follow(&mut camera, &bodies);
    if frame % options.fps.max(1.0) as u32 == 0 {
      log::debug!("t={elapsed:.2}s, {} bodies", bodies.len());
    }
  }

  for body in &bodies {
    log::info!(
      "{:<8} pos ({:>7.3}, {:>7.3}, {:>7.3}) spin {:>8.3}",
      body.name,
      body.position.x,
      body.position.y,
      body.position.z,
      body.rotation.y
    );
  }
  if let CameraMode::Tracking { .. } = rig.mode() {
    log::info!(
      "camera at ({:.3}, {:.3}, {:.3})",
      camera.eye.x,
      camera.eye.y,
      camera.eye.z
    );
  }
}
