use crate::orbit::{find_body, Body};
use cgmath::{EuclideanSpace, InnerSpace, Point3, Rad, Rotation, Rotation3, SquareMatrix, Vector3};
use winit::{
  event::{ElementState, KeyEvent, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Default framing the "home" control returns to.
pub const HOME_EYE: Point3<f32> = Point3 {
  x: 0.0,
  y: 8.0,
  z: 14.0,
};
pub const HOME_TARGET: Point3<f32> = Point3 {
  x: 0.0,
  y: 0.0,
  z: 0.0,
};
/// Camera offset from a tracked body.
pub const TRACKING_OFFSET: Vector3<f32> = Vector3 {
  x: 0.0,
  y: 0.6,
  z: 1.8,
};

pub struct Camera {
  pub eye: cgmath::Point3<f32>,
  pub target: cgmath::Point3<f32>,
  pub up: cgmath::Vector3<f32>,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  pub fn new(aspect: f32) -> Self {
    Self {
      eye: HOME_EYE,
      target: HOME_TARGET,
      up: Vector3::unit_y(),
      aspect,
      fovy: 75.0,
      znear: 0.1,
      zfar: 300.0,
    }
  }

  pub fn set_aspect(&mut self, width: u32, height: u32) {
    self.aspect = width.max(1) as f32 / height.max(1) as f32;
  }

  fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
  }

  /// Screen-aligned world axes, used to billboard particles.
  fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
    let forward = (self.target - self.eye).normalize();
    let right = forward.cross(self.up).normalize();
    let up = right.cross(forward);
    (right, up)
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
  right: [f32; 4],
  up: [f32; 4],
}

impl CameraUniform {
  pub fn new() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
      right: [1.0, 0.0, 0.0, 0.0],
      up: [0.0, 1.0, 0.0, 0.0],
    }
  }

  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
    let (right, up) = camera.basis();
    self.right = right.extend(0.0).into();
    self.up = up.extend(0.0).into();
  }
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self::new()
  }
}

pub struct CameraController {
  speed: f32,
  rotation_speed: f32,
  is_forward_pressed: bool,
  is_backward_pressed: bool,
  is_left_pressed: bool,
  is_right_pressed: bool,
  is_rotate_up_pressed: bool,
  is_rotate_down_pressed: bool,
}

impl CameraController {
  pub fn init(speed: f32, rotation_speed: f32) -> Self {
    Self {
      speed,
      rotation_speed,
      is_forward_pressed: false,
      is_backward_pressed: false,
      is_left_pressed: false,
      is_right_pressed: false,
      is_rotate_up_pressed: false,
      is_rotate_down_pressed: false,
    }
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => self.process_key(*keycode, *state == ElementState::Pressed),
      _ => false,
    }
  }

  pub fn process_key(&mut self, keycode: KeyCode, is_pressed: bool) -> bool {
    match keycode {
      KeyCode::KeyW | KeyCode::ArrowUp => {
        self.is_forward_pressed = is_pressed;
        true
      }
      KeyCode::KeyA | KeyCode::ArrowLeft => {
        self.is_left_pressed = is_pressed;
        true
      }
      KeyCode::KeyS | KeyCode::ArrowDown => {
        self.is_backward_pressed = is_pressed;
        true
      }
      KeyCode::KeyD | KeyCode::ArrowRight => {
        self.is_right_pressed = is_pressed;
        true
      }
      KeyCode::KeyQ => {
        self.is_rotate_up_pressed = is_pressed;
        true
      }
      KeyCode::KeyE => {
        self.is_rotate_down_pressed = is_pressed;
        true
      }
      _ => false,
    }
  }

  pub fn update_camera(&self, camera: &mut Camera) {
    let forward = camera.target - camera.eye;
    let forward_norm = forward.normalize();
    let forward_mag = forward.magnitude();

    if self.is_forward_pressed && forward_mag > self.speed {
      camera.eye += forward_norm * self.speed;
    }
    if self.is_backward_pressed {
      camera.eye -= forward_norm * self.speed;
    }

    let right = forward_norm.cross(camera.up);
    let forward = camera.target - camera.eye;
    let forward_mag = forward.magnitude();

    if self.is_right_pressed {
      camera.eye = camera.target - (forward + right * self.speed).normalize() * forward_mag;
    }
    if self.is_left_pressed {
      camera.eye = camera.target - (forward - right * self.speed).normalize() * forward_mag;
    }

    for (pressed, angle) in [
      (self.is_rotate_up_pressed, self.rotation_speed),
      (self.is_rotate_down_pressed, -self.rotation_speed),
    ] {
      if pressed {
        let forward = camera.target - camera.eye;
        let rotation = cgmath::Quaternion::from_axis_angle(right.normalize(), Rad(angle));
        camera.eye = camera.target - rotation.rotate_vector(forward);
        camera.up = rotation.rotate_vector(camera.up);
      }
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CameraMode {
  /// Keyboard controller drives the camera.
  Free,
  /// Camera is pinned to the body at this index every tick.
  Tracking { body: usize },
}

/// Switches between free flight and following a selected body.
pub struct CameraRig {
  mode: CameraMode,
}

impl Default for CameraRig {
  fn default() -> Self {
    Self {
      mode: CameraMode::Free,
    }
  }
}

impl CameraRig {
  pub fn mode(&self) -> CameraMode {
    self.mode
  }

  /// Starts tracking `name`. Unknown names leave the mode unchanged.
  pub fn select(&mut self, name: &str, bodies: &[Body], camera: &mut Camera) -> bool {
    match find_body(bodies, name) {
      Some((index, body)) => {
        log::info!("tracking {}", body.name);
        self.mode = CameraMode::Tracking { body: index };
        camera.up = Vector3::unit_y();
        self.follow(camera, bodies);
        true
      }
      None => {
        log::debug!("no body named {name}");
        false
      }
    }
  }

  /// Back to free flight at the default framing.
  pub fn home(&mut self, camera: &mut Camera) {
    self.mode = CameraMode::Free;
    camera.eye = HOME_EYE;
    camera.target = HOME_TARGET;
    camera.up = Vector3::unit_y();
  }

  pub fn follow(&self, camera: &mut Camera, bodies: &[Body]) {
    if let CameraMode::Tracking { body } = self.mode {
      if let Some(body) = bodies.get(body) {
        let target = Point3::from_vec(body.position);
        camera.eye = target + TRACKING_OFFSET;
        camera.target = target;
      }
    }
  }
}
