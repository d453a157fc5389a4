use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use solar_sim::scene::DEFAULT_SCENE;
use solar_sim::state::{MaskSource, Options};
use solar_sim::{FieldParams, Jitter};
use std::io;
use std::path::PathBuf;

/// Particle galaxy with orbiting planets
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Number of particles in the field
  #[arg(short, long)]
  count: Option<u32>,
  /// World-space size of each particle
  #[arg(long)]
  size: Option<f32>,
  /// Inner radius of the particle shell
  #[arg(long)]
  min_radius: Option<f32>,
  /// Outer radius of the particle shell
  #[arg(long)]
  max_radius: Option<f32>,
  /// Seed for particle placement (random when omitted)
  #[arg(long)]
  seed: Option<u64>,
  /// Scene file listing the planet meshes
  #[arg(long, default_value = DEFAULT_SCENE)]
  scene: PathBuf,
  /// Image used as the particle alpha mask
  #[arg(long, conflicts_with = "no_mask")]
  mask: Option<PathBuf>,
  /// Draw particles as plain squares
  #[arg(long, default_value_t = false)]
  no_mask: bool,
  /// Scatter particles off the shell
  #[arg(long, default_value_t = false)]
  jitter: bool,
  /// Vary particle size per point
  #[arg(long, default_value_t = false)]
  scale_points: bool,
  /// Follow this body once the scene has loaded
  #[arg(long)]
  track: Option<String>,
  /// Run in headless mode (no window)
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Ticks to simulate in headless mode
  #[arg(long, default_value_t = 600)]
  frames: u32,
  /// Fixed tick rate in headless mode
  #[arg(long, default_value_t = 60.0)]
  fps: f32,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

impl Args {
  fn options(&self) -> Options {
    let defaults = FieldParams::default();
    let params = FieldParams {
      count: self.count.unwrap_or(defaults.count),
      size: self.size.unwrap_or(defaults.size),
      min_radius: self.min_radius.unwrap_or(defaults.min_radius),
      max_radius: self.max_radius.unwrap_or(defaults.max_radius),
      jitter: self.jitter.then(Jitter::default),
      scale_points: self.scale_points,
      ..defaults
    };
    let mask = match (&self.mask, self.no_mask) {
      (_, true) => MaskSource::Solid,
      (Some(path), false) => MaskSource::File(path.clone()),
      (None, false) => MaskSource::SoftDisc,
    };
    Options {
      params,
      seed: self.seed,
      scene: self.scene.clone(),
      mask,
      track: self.track.clone(),
      frames: self.frames,
      fps: self.fps,
    }
  }
}

fn main() {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = &args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(*shell, &mut cmd, name, &mut io::stdout());
    return;
  }

  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let options = args.options();
  if args.headless {
    solar_sim::state::run_headless(options);
  } else if let Err(e) = solar_sim::state::run(options) {
    log::error!("{e}");
    std::process::exit(1);
  }
}
