use crate::{FieldParams, Jitter, PointVertex};
use rand::Rng;
use rand_distr::Uniform;
use std::f32::consts::PI;

/// Render settings resolved alongside the point buffers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointMaterial {
  pub size: f32,
  pub size_attenuation: bool,
  pub additive: bool,
  pub vertex_colors: bool,
  pub depth_write: bool,
  pub scale_points: bool,
}

impl PointMaterial {
  fn from_params(params: &FieldParams) -> Self {
    Self {
      size: params.size,
      size_attenuation: true,
      additive: true,
      vertex_colors: true,
      depth_write: false,
      scale_points: params.scale_points,
    }
  }
}

/// Parallel flat buffers for one generation of the particle field.
#[derive(Clone, Debug)]
pub struct FieldBuffers {
  pub positions: Vec<f32>,
  pub colors: Vec<f32>,
  pub scales: Vec<f32>,
  pub material: PointMaterial,
}

impl FieldBuffers {
  pub fn len(&self) -> usize {
    self.scales.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scales.is_empty()
  }

  /// Interleaves the parallel buffers into the GPU vertex layout.
  pub fn vertices(&self) -> Vec<PointVertex> {
    self
      .positions
      .chunks_exact(3)
      .zip(self.colors.chunks_exact(3))
      .zip(&self.scales)
      .map(|((pos, color), &scale)| PointVertex {
        pos: [pos[0], pos[1], pos[2]],
        scale,
        color: [color[0], color[1], color[2]],
        _pad: 0.0,
      })
      .collect()
  }
}

/// Builds the shell-shaped point cloud.
///
/// The radius is `±min_radius + (u - 0.5) * max_radius`, where the sign of
/// the inner radius follows the sign of the outer offset. This pushes
/// negative offsets through the origin to the opposite side; it is a jitter
/// policy, not a uniform spherical fill.
#[must_use]
pub fn generate_field<R: Rng>(params: &FieldParams, rng: &mut R) -> FieldBuffers {
  let count = params.count as usize;
  let mut positions = Vec::with_capacity(count * 3);
  let mut colors = Vec::with_capacity(count * 3);
  let mut scales = Vec::with_capacity(count);
  let unit = Uniform::new(0.0f32, 1.0);

  for _ in 0..count {
    let outer = (rng.sample(unit) - 0.5) * params.max_radius;
    let mut inner = params.min_radius;
    if outer < 0.0 {
      inner = -inner;
    }
    let radius = inner + outer;

    let azimuth = rng.sample(unit) * 2.0 * PI;
    let polar = rng.sample(unit) * PI;

    let mut pos = [
      radius * azimuth.cos() * polar.sin(),
      radius * azimuth.sin() * polar.sin(),
      radius * polar.cos(),
    ];

    // colour mix is deliberately unclamped
    let mix = if params.max_radius == 0.0 {
      0.0
    } else {
      radius / params.max_radius
    };
    let color = params.inside_color.lerp(params.outside_color, mix);

    scales.push(rng.sample(unit));

    if let Some(jitter) = params.jitter {
      for axis in pos.iter_mut() {
        *axis += jitter_offset(rng, &jitter, radius);
      }
    }

    positions.extend_from_slice(&pos);
    colors.extend_from_slice(&color.to_array());
  }

  log::debug!(
    "generated particle field: {} points, radii {}..{}",
    count,
    params.min_radius,
    params.max_radius
  );

  FieldBuffers {
    positions,
    colors,
    scales,
    material: PointMaterial::from_params(params),
  }
}

fn jitter_offset<R: Rng>(rng: &mut R, jitter: &Jitter, radius: f32) -> f32 {
  let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
  rng.gen::<f32>().powf(jitter.power) * sign * jitter.randomness * radius
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Rgb;
  use rand::{rngs::SmallRng, SeedableRng};

  fn rng() -> SmallRng {
    SmallRng::seed_from_u64(42)
  }

  #[test]
  fn buffers_have_three_floats_per_point() {
    let params = FieldParams {
      count: 100,
      max_radius: 10.0,
      min_radius: 5.0,
      ..Default::default()
    };
    let field = generate_field(&params, &mut rng());
    assert_eq!(field.positions.len(), 300);
    assert_eq!(field.colors.len(), 300);
    assert_eq!(field.scales.len(), 100);
    assert!(field.positions.iter().all(|v| !v.is_nan()));
    assert!(field.colors.iter().all(|v| !v.is_nan()));
  }

  #[test]
  fn zero_count_is_an_empty_field() {
    let params = FieldParams {
      count: 0,
      ..Default::default()
    };
    let field = generate_field(&params, &mut rng());
    assert!(field.is_empty());
    assert!(field.positions.is_empty());
    assert!(field.vertices().is_empty());
  }

  #[test]
  fn shape_does_not_depend_on_random_content() {
    let params = FieldParams {
      count: 257,
      ..Default::default()
    };
    let a = generate_field(&params, &mut SmallRng::seed_from_u64(1));
    let b = generate_field(&params, &mut SmallRng::seed_from_u64(2));
    assert_eq!(a.positions.len(), b.positions.len());
    assert_eq!(a.colors.len(), b.colors.len());
    assert_ne!(a.positions, b.positions);
  }

  #[test]
  fn radius_stays_within_signed_shell() {
    let params = FieldParams {
      count: 2_000,
      max_radius: 10.0,
      min_radius: 5.0,
      ..Default::default()
    };
    let field = generate_field(&params, &mut rng());
    for p in field.positions.chunks_exact(3) {
      let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
      // |±5 + [-5, 5)| lies in [5, 10]
      assert!((5.0 - 1e-3..=10.0 + 1e-3).contains(&r), "radius {r}");
    }
  }

  #[test]
  fn colors_follow_signed_radius_mix() {
    let params = FieldParams {
      count: 500,
      max_radius: 10.0,
      min_radius: 5.0,
      inside_color: Rgb::new(0.0, 0.0, 0.0),
      outside_color: Rgb::new(1.0, 1.0, 1.0),
      ..Default::default()
    };
    let field = generate_field(&params, &mut rng());
    // mix = radius / max_radius, radius in [-10, -5] or [5, 10]
    for c in field.colors.chunks_exact(3) {
      assert!(c[0].abs() >= 0.5 - 1e-4 && c[0].abs() <= 1.0 + 1e-4, "mix {}", c[0]);
      assert_eq!(c[0], c[1]);
    }
  }

  #[test]
  fn zero_max_radius_collapses_without_nan() {
    let params = FieldParams {
      count: 50,
      max_radius: 0.0,
      min_radius: 0.0,
      ..Default::default()
    };
    let field = generate_field(&params, &mut rng());
    assert!(field.positions.iter().all(|v| *v == 0.0 || v.abs() < 1e-6));
    assert!(field.colors.iter().all(|v| v.is_finite()));
  }

  #[test]
  fn scales_are_unit_interval() {
    let field = generate_field(&FieldParams::default(), &mut rng());
    assert!(field.scales.iter().all(|s| (0.0..1.0).contains(s)));
  }

  #[test]
  fn jitter_moves_points_off_the_shell() {
    let base = FieldParams {
      count: 200,
      max_radius: 10.0,
      min_radius: 5.0,
      ..Default::default()
    };
    let jittered = FieldParams {
      jitter: Some(Jitter {
        randomness: 2.0,
        power: 1.0,
      }),
      ..base
    };
    let field = generate_field(&jittered, &mut rng());
    let outside = field
      .positions
      .chunks_exact(3)
      .map(|p| (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt())
      .filter(|r| *r > 10.0 + 1e-3 || *r < 5.0 - 1e-3)
      .count();
    assert!(outside > 0);
  }

  #[test]
  fn material_disables_depth_write() {
    let field = generate_field(&FieldParams::default(), &mut rng());
    assert!(!field.material.depth_write);
    assert!(field.material.additive);
    assert!(field.material.vertex_colors);
    assert_eq!(field.material.size, FieldParams::default().size);
  }

  #[test]
  fn vertices_interleave_buffers() {
    let params = FieldParams {
      count: 3,
      ..Default::default()
    };
    let field = generate_field(&params, &mut rng());
    let vertices = field.vertices();
    assert_eq!(vertices.len(), 3);
    assert_eq!(vertices[1].pos, [field.positions[3], field.positions[4], field.positions[5]]);
    assert_eq!(vertices[2].color[2], field.colors[8]);
    assert_eq!(vertices[0].scale, field.scales[0]);
  }
}
