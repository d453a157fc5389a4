//! Alpha mask applied to every particle sprite.

use crate::error::AssetError;
use std::path::Path;
use wgpu::util::DeviceExt;

/// Single-channel mask, one byte per pixel.
#[derive(Debug, Clone)]
pub struct MaskImage {
  pub data: Vec<u8>,
  pub width: u32,
  pub height: u32,
}

impl MaskImage {
  /// Loads an image and uses its luminance as alpha.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
    let img = image::open(path.as_ref())?.into_luma8();
    let (width, height) = img.dimensions();
    Ok(Self {
      data: img.into_raw(),
      width,
      height,
    })
  }

  /// Fully opaque 1x1 mask; points render as squares.
  pub fn solid() -> Self {
    Self {
      data: vec![255],
      width: 1,
      height: 1,
    }
  }

  /// Round sprite with a quadratic falloff towards the rim.
  pub fn soft_disc(size: u32) -> Self {
    let size = size.max(2);
    let half = size as f32 / 2.0;
    let mut data = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
      for x in 0..size {
        let dx = (x as f32 + 0.5 - half) / half;
        let dy = (y as f32 + 0.5 - half) / half;
        let d = (dx * dx + dy * dy).sqrt();
        let a = (1.0 - d).max(0.0);
        data.push((a * a * 255.0).round() as u8);
      }
    }
    Self {
      data,
      width: size,
      height: size,
    }
  }

  pub fn create_view(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    let texture = device.create_texture_with_data(
      queue,
      &wgpu::TextureDescriptor {
        label: Some("Point Mask"),
        size: wgpu::Extent3d {
          width: self.width,
          height: self.height,
          depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
      },
      wgpu::util::TextureDataOrder::LayerMajor,
      &self.data,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn soft_disc_is_opaque_in_the_middle_and_clear_at_corners() {
    let mask = MaskImage::soft_disc(32);
    assert_eq!(mask.data.len(), 32 * 32);
    let at = |x: u32, y: u32| mask.data[(y * mask.width + x) as usize];
    assert!(at(16, 16) > 200);
    assert_eq!(at(0, 0), 0);
    assert_eq!(at(31, 31), 0);
  }

  #[test]
  fn solid_mask_is_one_opaque_pixel() {
    let mask = MaskImage::solid();
    assert_eq!((mask.width, mask.height), (1, 1));
    assert_eq!(mask.data, vec![255]);
  }

  #[test]
  fn missing_mask_file_is_an_error() {
    assert!(MaskImage::from_file("no/such/mask.png").is_err());
  }
}
