//! Scene asset: a JSON list of named meshes, loaded once in the background.

use crate::error::AssetError;
use crate::mesh::MeshHandle;
use crate::orbit::Body;
use crate::Rgb;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

pub const DEFAULT_SCENE: &str = "assets/solar_system.json";

#[derive(Debug, Clone, Deserialize)]
pub struct SceneAsset {
  pub meshes: Vec<MeshDesc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeshDesc {
  pub name: String,
  pub radius: f32,
  pub color: String,
  #[serde(default)]
  pub emissive: bool,
}

impl SceneAsset {
  pub fn from_json(text: &str) -> Result<Self, AssetError> {
    Ok(serde_json::from_str(text)?)
  }

  pub fn load(path: &Path) -> Result<Self, AssetError> {
    let text = std::fs::read_to_string(path)?;
    Self::from_json(&text)
  }

  /// One body per mesh, in asset order. Names are matched against the
  /// orbital table; unknown names keep neutral motion.
  pub fn bodies(&self) -> Result<Vec<Body>, AssetError> {
    self
      .meshes
      .iter()
      .map(|desc| {
        let color = Rgb::from_hex(&desc.color).ok_or_else(|| AssetError::Color(desc.color.clone()))?;
        Ok(Body::new(
          desc.name.clone(),
          MeshHandle {
            radius: desc.radius,
            color,
            emissive: desc.emissive,
          },
        ))
      })
      .collect()
  }
}

fn load_bodies(path: &Path) -> Result<Vec<Body>, AssetError> {
  SceneAsset::load(path)?.bodies()
}

/// Where the scene stands from the render loop's point of view.
#[derive(Debug)]
pub enum SceneState {
  Pending,
  Ready,
  Unavailable(AssetError),
}

/// Loads the scene on a worker thread and hands the bodies over exactly once.
pub struct SceneLoader {
  receiver: Option<Receiver<Result<Vec<Body>, AssetError>>>,
  state: SceneState,
}

impl SceneLoader {
  pub fn spawn(path: PathBuf) -> Self {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
      log::info!("loading scene from {}", path.display());
      // receiver may already be gone if the window closed first
      let _ = tx.send(load_bodies(&path));
    });
    Self::from_receiver(rx)
  }

  fn from_receiver(rx: Receiver<Result<Vec<Body>, AssetError>>) -> Self {
    Self {
      receiver: Some(rx),
      state: SceneState::Pending,
    }
  }

  pub fn state(&self) -> &SceneState {
    &self.state
  }

  /// Returns the bodies the first time they are available, `None` otherwise.
  pub fn poll(&mut self) -> Option<Vec<Body>> {
    let rx = self.receiver.as_ref()?;
    let result = match rx.try_recv() {
      Ok(result) => result,
      Err(TryRecvError::Empty) => return None,
      Err(TryRecvError::Disconnected) => Err(AssetError::Disconnected),
    };
    self.receiver = None;
    self.finish(result)
  }

  /// Blocks until the loader delivers.
  pub fn wait(&mut self) -> Option<Vec<Body>> {
    let rx = self.receiver.take()?;
    let result = rx.recv().unwrap_or(Err(AssetError::Disconnected));
    self.finish(result)
  }

  fn finish(&mut self, result: Result<Vec<Body>, AssetError>) -> Option<Vec<Body>> {
    match result {
      Ok(bodies) => {
        log::info!("scene ready: {} bodies", bodies.len());
        self.state = SceneState::Ready;
        Some(bodies)
      }
      Err(e) => {
        log::warn!("scene unavailable, planets will not be shown: {e}");
        self.state = SceneState::Unavailable(e);
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::orbit::OrbitalInfo;

  const SCENE: &str = r##"{
    "meshes": [
      { "name": "Sun", "radius": 1.0, "color": "#ffcc33", "emissive": true },
      { "name": "Earth", "radius": 0.2, "color": "#3a6bd1" },
      { "name": "Comet", "radius": 0.05, "color": "#ffffff" }
    ]
  }"##;

  #[test]
  fn bodies_follow_asset_order() {
    let bodies = SceneAsset::from_json(SCENE).unwrap().bodies().unwrap();
    let names: Vec<&str> = bodies.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["Sun", "Earth", "Comet"]);
    assert!(bodies[0].mesh.emissive);
    assert!(!bodies[1].mesh.emissive);
    assert_eq!(bodies[1].info, OrbitalInfo::lookup("Earth"));
  }

  #[test]
  fn unknown_names_get_default_info() {
    let bodies = SceneAsset::from_json(SCENE).unwrap().bodies().unwrap();
    assert_eq!(bodies[2].info.orbital_period, 1.0);
    assert_eq!(bodies[2].info.rotation_period, 1.0);
    assert_eq!(bodies[2].info.distance_from_sun, 0.0);
  }

  #[test]
  fn malformed_json_is_a_parse_error() {
    let err = SceneAsset::from_json("{ \"meshes\": [ { \"name\": 3 } ] }").unwrap_err();
    assert!(matches!(err, AssetError::Parse(_)));
  }

  #[test]
  fn bad_color_is_rejected() {
    let asset = SceneAsset::from_json(r#"{ "meshes": [ { "name": "Mars", "radius": 0.1, "color": "red" } ] }"#).unwrap();
    assert!(matches!(asset.bodies(), Err(AssetError::Color(c)) if c == "red"));
  }

  #[test]
  fn missing_file_leaves_scene_unavailable() {
    let mut loader = SceneLoader::spawn(PathBuf::from("does/not/exist.json"));
    assert!(loader.wait().is_none());
    assert!(matches!(loader.state(), SceneState::Unavailable(AssetError::Io(_))));
    // delivered once; later polls stay quiet
    assert!(loader.poll().is_none());
  }

  #[test]
  fn poll_stays_pending_until_delivery() {
    let (tx, rx) = mpsc::channel();
    let mut loader = SceneLoader::from_receiver(rx);
    assert!(loader.poll().is_none());
    assert!(matches!(loader.state(), SceneState::Pending));
    assert!(loader.poll().is_none());

    let bodies = SceneAsset::from_json(SCENE).unwrap().bodies().unwrap();
    tx.send(Ok(bodies)).unwrap();
    assert_eq!(loader.poll().map(|b| b.len()), Some(3));
    assert!(matches!(loader.state(), SceneState::Ready));
    assert!(loader.poll().is_none());
  }

  #[test]
  fn dropped_sender_is_disconnected() {
    let (tx, rx) = mpsc::channel::<Result<Vec<Body>, AssetError>>();
    let mut loader = SceneLoader::from_receiver(rx);
    drop(tx);
    assert!(loader.poll().is_none());
    assert!(matches!(loader.state(), SceneState::Unavailable(AssetError::Disconnected)));
  }

  #[test]
  fn bundled_scene_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_SCENE);
    let mut loader = SceneLoader::spawn(path);
    let bodies = loader.wait().expect("bundled scene should load");
    assert!(matches!(loader.state(), SceneState::Ready));
    assert!(bodies.iter().any(|b| b.is_center()));
    assert_eq!(bodies.len(), 9);
  }
}
