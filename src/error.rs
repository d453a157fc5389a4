//! Error types for window/GPU start-up and asset loading.

use std::fmt;

/// Errors that can occur while bringing up the window and GPU.
#[derive(Debug)]
pub enum GpuError {
  /// Failed to create the winit event loop.
  EventLoop(winit::error::EventLoopError),
  /// Failed to open the window.
  Window(winit::error::OsError),
  /// Failed to create a surface for rendering.
  SurfaceCreation(wgpu::CreateSurfaceError),
  /// No compatible GPU adapter found.
  NoAdapter,
  /// The adapter cannot present to the window surface.
  IncompatibleSurface,
  /// Failed to create GPU device.
  DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GpuError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
      GpuError::Window(e) => write!(f, "Failed to create window: {}", e),
      GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
      GpuError::NoAdapter => write!(f, "No compatible GPU adapter found"),
      GpuError::IncompatibleSurface => write!(f, "Adapter cannot present to the window surface"),
      GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
    }
  }
}

impl std::error::Error for GpuError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GpuError::EventLoop(e) => Some(e),
      GpuError::Window(e) => Some(e),
      GpuError::SurfaceCreation(e) => Some(e),
      GpuError::DeviceCreation(e) => Some(e),
      GpuError::NoAdapter | GpuError::IncompatibleSurface => None,
    }
  }
}

impl From<winit::error::EventLoopError> for GpuError {
  fn from(e: winit::error::EventLoopError) -> Self {
    GpuError::EventLoop(e)
  }
}

impl From<winit::error::OsError> for GpuError {
  fn from(e: winit::error::OsError) -> Self {
    GpuError::Window(e)
  }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
  fn from(e: wgpu::CreateSurfaceError) -> Self {
    GpuError::SurfaceCreation(e)
  }
}

impl From<wgpu::RequestDeviceError> for GpuError {
  fn from(e: wgpu::RequestDeviceError) -> Self {
    GpuError::DeviceCreation(e)
  }
}

/// Errors that can occur while loading the scene or the point mask.
#[derive(Debug)]
pub enum AssetError {
  /// Failed to read file from disk.
  Io(std::io::Error),
  /// Scene file is not valid JSON or does not match the expected layout.
  Parse(serde_json::Error),
  /// Failed to decode an image.
  Image(image::ImageError),
  /// A mesh entry carries a colour that is not `#rrggbb`.
  Color(String),
  /// The loader thread went away without delivering a result.
  Disconnected,
}

impl fmt::Display for AssetError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AssetError::Io(e) => write!(f, "Failed to read asset: {}", e),
      AssetError::Parse(e) => write!(f, "Failed to parse scene: {}", e),
      AssetError::Image(e) => write!(f, "Failed to decode image: {}", e),
      AssetError::Color(c) => write!(f, "Invalid colour '{}', expected #rrggbb", c),
      AssetError::Disconnected => write!(f, "Asset loader stopped before delivering a result"),
    }
  }
}

impl std::error::Error for AssetError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      AssetError::Io(e) => Some(e),
      AssetError::Parse(e) => Some(e),
      AssetError::Image(e) => Some(e),
      _ => None,
    }
  }
}

impl From<std::io::Error> for AssetError {
  fn from(e: std::io::Error) -> Self {
    AssetError::Io(e)
  }
}

impl From<serde_json::Error> for AssetError {
  fn from(e: serde_json::Error) -> Self {
    AssetError::Parse(e)
  }
}

impl From<image::ImageError> for AssetError {
  fn from(e: image::ImageError) -> Self {
    AssetError::Image(e)
  }
}
