pub mod camera;
pub mod controls;
pub mod error;
pub mod field;
pub mod initialize;
pub mod mesh;
pub mod orbit;
pub mod render;
pub mod scene;
pub mod state;
pub mod texture;

/// Tunable parameters of the particle field. Every change triggers a full rebuild.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FieldParams {
  pub count: u32,
  pub size: f32,
  pub min_radius: f32,
  pub max_radius: f32,
  pub inside_color: Rgb,
  pub outside_color: Rgb,
  pub jitter: Option<Jitter>,
  /// Multiply the point size by the per-point scale attribute.
  pub scale_points: bool,
}

impl Default for FieldParams {
  fn default() -> Self {
    Self {
      count: 10_000,
      size: 0.4,
      min_radius: 50.0,
      max_radius: 100.0,
      inside_color: Rgb::new(1.0, 0x95 as f32 / 255.0, 0x95 as f32 / 255.0),
      outside_color: Rgb::new(
        0x1b as f32 / 255.0,
        0x39 as f32 / 255.0,
        0x84 as f32 / 255.0,
      ),
      jitter: None,
      scale_points: false,
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Jitter {
  pub randomness: f32,
  pub power: f32,
}

impl Default for Jitter {
  fn default() -> Self {
    Self {
      randomness: 0.2,
      power: 3.0,
    }
  }
}

/// Live settings that take effect without rebuilding the field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tuning {
  /// Multiplier on orbital angle.
  pub orbit_rate: f32,
  /// Multiplier on spin angle.
  pub rotation_rate: f32,
  pub lighting: Lighting,
}

impl Default for Tuning {
  fn default() -> Self {
    Self {
      orbit_rate: 1.0,
      rotation_rate: 1.0,
      lighting: Lighting::default(),
    }
  }
}

/// Scene lighting and clear colour.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Lighting {
  pub ambient: f32,
  /// Intensity of the light radiating from the centre body.
  pub sun: f32,
  pub background: Rgb,
}

impl Default for Lighting {
  fn default() -> Self {
    Self {
      ambient: 0.25,
      sun: 0.9,
      // #00141f
      background: Rgb::new(0.0, 0x14 as f32 / 255.0, 0x1f as f32 / 255.0),
    }
  }
}

pub struct CameraParams {
  pub speed: f32,
  pub rotational_speed: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      speed: 0.2,
      rotational_speed: 0.02,
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rgb {
  pub r: f32,
  pub g: f32,
  pub b: f32,
}

impl Rgb {
  pub const fn new(r: f32, g: f32, b: f32) -> Self {
    Self { r, g, b }
  }

  /// Unpacks `0xrrggbb`.
  pub fn from_rgb24(packed: u32) -> Self {
    let channel = |shift: u32| ((packed >> shift) & 0xff) as f32 / 255.0;
    Self::new(channel(16), channel(8), channel(0))
  }

  /// Parses `#rrggbb` (the leading `#` is optional).
  pub fn from_hex(hex: &str) -> Option<Self> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
      return None;
    }
    let channel = |i: usize| {
      u8::from_str_radix(&digits[i..i + 2], 16)
        .ok()
        .map(|c| c as f32 / 255.0)
    };
    Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
  }

  /// Linear interpolation towards `other`. `t` is not clamped.
  #[must_use]
  pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
    Rgb::new(
      self.r + (other.r - self.r) * t,
      self.g + (other.g - self.g) * t,
      self.b + (other.b - self.b) * t,
    )
  }

  pub fn to_array(self) -> [f32; 3] {
    [self.r, self.g, self.b]
  }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
  pub pos: [f32; 3],
  pub scale: f32,
  pub color: [f32; 3],
  pub _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BodyInstance {
  pub position: [f32; 3],
  pub radius: f32,
  pub color: [f32; 3],
  pub rotation_y: f32,
  pub emissive: f32,
  pub _pad: [f32; 3],
}
