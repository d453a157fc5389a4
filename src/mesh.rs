//! The shared sphere primitive every body is drawn with.

use crate::Rgb;

/// Per-body appearance; the geometry itself is shared.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeshHandle {
  pub radius: f32,
  pub color: Rgb,
  pub emissive: bool,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
  pub pos: [f32; 3],
  pub normal: [f32; 3],
}

pub struct SphereMesh {
  pub vertices: Vec<MeshVertex>,
  pub indices: Vec<u32>,
}

/// Unit UV sphere as a CCW triangle list. Positions double as normals.
pub fn uv_sphere(stacks: u32, slices: u32) -> SphereMesh {
  let stacks = stacks.max(2);
  let slices = slices.max(3);
  let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);

  for stack in 0..=stacks {
    let phi = stack as f32 / stacks as f32 * std::f32::consts::PI;
    let (sin_phi, cos_phi) = phi.sin_cos();
    for slice in 0..=slices {
      let theta = slice as f32 / slices as f32 * 2.0 * std::f32::consts::PI;
      let (sin_theta, cos_theta) = theta.sin_cos();
      let p = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
      vertices.push(MeshVertex { pos: p, normal: p });
    }
  }

  let ring = slices + 1;
  let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
  for stack in 0..stacks {
    for slice in 0..slices {
      let i0 = stack * ring + slice;
      let i1 = i0 + 1;
      let i2 = (stack + 1) * ring + slice;
      let i3 = i2 + 1;
      indices.extend_from_slice(&[i0, i1, i2, i1, i3, i2]);
    }
  }

  SphereMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sphere_counts() {
    let mesh = uv_sphere(8, 16);
    assert_eq!(mesh.vertices.len(), 9 * 17);
    assert_eq!(mesh.indices.len(), 8 * 16 * 6);
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
  }

  #[test]
  fn vertices_lie_on_unit_sphere() {
    for v in uv_sphere(6, 6).vertices {
      let len = (v.pos[0] * v.pos[0] + v.pos[1] * v.pos[1] + v.pos[2] * v.pos[2]).sqrt();
      assert!((len - 1.0).abs() < 1e-5);
    }
  }

  #[test]
  fn degenerate_resolution_is_clamped() {
    let mesh = uv_sphere(0, 1);
    assert_eq!(mesh.vertices.len(), 3 * 4);
  }
}
