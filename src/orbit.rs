//! Cosmetic orbital kinematics. Positions and spins are pure functions of
//! elapsed time; nothing here is simulated.

use crate::mesh::MeshHandle;
use crate::{BodyInstance, Tuning};
use cgmath::{Vector3, Zero};

/// Name of the reference body every other body orbits. It is never moved.
pub const CENTER_BODY: &str = "Sun";

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitalInfo {
  /// Relative angular frequency of revolution (Earth = 1).
  pub orbital_period: f32,
  /// Relative spin rate. Negative values spin retrograde.
  pub rotation_period: f32,
  /// Mean distance in AU.
  pub distance_from_sun: f32,
}

impl Default for OrbitalInfo {
  fn default() -> Self {
    Self {
      orbital_period: 1.0,
      rotation_period: 1.0,
      distance_from_sun: 0.0,
    }
  }
}

const fn info(orbital_period: f32, rotation_period: f32, distance_from_sun: f32) -> OrbitalInfo {
  OrbitalInfo {
    orbital_period,
    rotation_period,
    distance_from_sun,
  }
}

pub static ORBITAL_INFO: [(&str, OrbitalInfo); 8] = [
  ("Mercury", info(4.152, 0.017, 0.387)),
  ("Venus", info(1.624, -0.004, 0.723)),
  ("Earth", info(1.0, 1.0, 1.0)),
  ("Mars", info(0.532, 0.975, 1.524)),
  ("Jupiter", info(0.084, 2.418, 5.203)),
  ("Saturn", info(0.034, 2.252, 9.537)),
  ("Uranus", info(0.012, -1.392, 19.191)),
  ("Neptune", info(0.006, 1.490, 30.069)),
];

impl OrbitalInfo {
  /// Table entry for `name`, or the neutral default for unknown bodies.
  pub fn lookup(name: &str) -> OrbitalInfo {
    ORBITAL_INFO
      .iter()
      .find(|(n, _)| *n == name)
      .map(|(_, info)| *info)
      .unwrap_or_default()
  }
}

/// Constants shaping the log-compressed orbits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitModel {
  pub phase_offset: f32,
  pub angular_rate: f32,
  /// `k1` in `ln(period * k1 + 1)`.
  pub period_scale: f32,
  /// `k2` in `ln(distance * k2 + 1)`.
  pub distance_scale: f32,
}

impl Default for OrbitModel {
  fn default() -> Self {
    Self {
      phase_offset: 10.0,
      angular_rate: 0.25,
      period_scale: 1.0,
      distance_scale: 20.0,
    }
  }
}

impl OrbitModel {
  pub fn angular_factor(&self, orbital_period: f32) -> f32 {
    (orbital_period * self.period_scale + 1.0).ln()
  }

  pub fn orbit_radius(&self, distance_from_sun: f32) -> f32 {
    (distance_from_sun * self.distance_scale + 1.0).ln()
  }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
  pub position: Vector3<f32>,
  pub rotation: Vector3<f32>,
}

pub fn transform_at(info: &OrbitalInfo, elapsed: f32, tuning: &Tuning, model: &OrbitModel) -> Transform {
  let angle = model.phase_offset + elapsed * model.angular_rate * tuning.orbit_rate;
  let theta = angle * model.angular_factor(info.orbital_period);
  let radius = model.orbit_radius(info.distance_from_sun);
  Transform {
    position: Vector3::new(theta.cos() * radius, 0.0, theta.sin() * radius),
    rotation: Vector3::new(0.0, elapsed * info.rotation_period * tuning.rotation_rate, 0.0),
  }
}

#[derive(Clone, Debug)]
pub struct Body {
  pub name: String,
  pub mesh: MeshHandle,
  pub info: OrbitalInfo,
  pub position: Vector3<f32>,
  pub rotation: Vector3<f32>,
}

impl Body {
  pub fn new(name: impl Into<String>, mesh: MeshHandle) -> Self {
    let name = name.into();
    let info = OrbitalInfo::lookup(&name);
    Self {
      name,
      mesh,
      info,
      position: Vector3::zero(),
      rotation: Vector3::zero(),
    }
  }

  pub fn is_center(&self) -> bool {
    self.name == CENTER_BODY
  }

  pub fn apply(&mut self, transform: Transform) {
    self.position = transform.position;
    self.rotation = transform.rotation;
  }

  pub fn to_instance(&self) -> BodyInstance {
    BodyInstance {
      position: self.position.into(),
      radius: self.mesh.radius,
      color: self.mesh.color.to_array(),
      rotation_y: self.rotation.y,
      emissive: if self.mesh.emissive { 1.0 } else { 0.0 },
      _pad: [0.0; 3],
    }
  }
}

/// Recomputes every orbiting body's transform for this tick.
pub fn update(bodies: &mut [Body], elapsed: f32, tuning: &Tuning, model: &OrbitModel) {
  for body in bodies.iter_mut().filter(|b| !b.is_center()) {
    body.apply(transform_at(&body.info, elapsed, tuning, model));
  }
}

pub fn find_body<'a>(bodies: &'a [Body], name: &str) -> Option<(usize, &'a Body)> {
  bodies.iter().enumerate().find(|(_, b)| b.name == name)
}
