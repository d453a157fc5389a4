//! Keyboard tuning panel. Key presses become `Control` messages; applying a
//! message reports whether the particle field must be rebuilt.

use crate::{FieldParams, Jitter, Rgb, Tuning};
use winit::keyboard::KeyCode;

pub const MIN_COUNT: u32 = 100;
pub const MAX_COUNT: u32 = 100_000;
const COUNT_STEP: i64 = 1_000;
const MIN_SIZE: f32 = 0.001;
const MAX_SIZE: f32 = 10.0;
const RATE_STEP: f32 = 1.25;

const MIN_RADIUS_RANGE: (f32, f32) = (1.0, 100.0);
const MAX_RADIUS_RANGE: (f32, f32) = (1.0, 500.0);
const RANDOMNESS_RANGE: (f32, f32) = (0.0, 2.0);
const POWER_RANGE: (f32, f32) = (1.0, 10.0);
const LIGHT_RANGE: (f32, f32) = (0.0, 3.0);

/// Colours the inside and outside of the field cycle through.
pub const FIELD_PALETTE: [u32; 6] = [0xff9595, 0x1b3984, 0xffcc33, 0x7fffd4, 0xff6ec7, 0xffffff];
pub const BACKGROUND_PALETTE: [u32; 5] = [0x00141f, 0x000000, 0x0b0b1a, 0x1f0a14, 0x102010];

/// Selectable bodies, bound to the number keys in order.
pub const PLANETS: [&str; 8] = [
  "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune",
];

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Control {
  /// Replace the whole parameter set.
  SetParams(FieldParams),
  AdjustCount(i64),
  ScaleSize(f32),
  StepMinRadius(f32),
  StepMaxRadius(f32),
  /// Turns jitter on if it was off.
  StepRandomness(f32),
  /// Turns jitter on if it was off.
  StepPower(f32),
  CycleInsideColor,
  CycleOutsideColor,
  ScaleOrbitRate(f32),
  ScaleRotationRate(f32),
  StepAmbient(f32),
  StepSun(f32),
  CycleBackground,
  ToggleJitter,
  ToggleScalePoints,
  /// Rebuild with fresh random draws and unchanged parameters.
  Regenerate,
  Select(&'static str),
  Home,
}

pub fn control_for_key(key: KeyCode) -> Option<Control> {
  let control = match key {
    KeyCode::BracketLeft => Control::AdjustCount(-COUNT_STEP),
    KeyCode::BracketRight => Control::AdjustCount(COUNT_STEP),
    KeyCode::Semicolon => Control::ScaleSize(1.0 / RATE_STEP),
    KeyCode::Quote => Control::ScaleSize(RATE_STEP),
    KeyCode::KeyZ => Control::StepMinRadius(-5.0),
    KeyCode::KeyX => Control::StepMinRadius(5.0),
    KeyCode::KeyC => Control::StepMaxRadius(-10.0),
    KeyCode::KeyV => Control::StepMaxRadius(10.0),
    KeyCode::KeyF => Control::StepRandomness(-0.05),
    KeyCode::KeyG => Control::StepRandomness(0.05),
    KeyCode::KeyT => Control::StepPower(-0.5),
    KeyCode::KeyY => Control::StepPower(0.5),
    KeyCode::KeyI => Control::CycleInsideColor,
    KeyCode::KeyO => Control::CycleOutsideColor,
    KeyCode::Backspace => Control::SetParams(FieldParams::default()),
    KeyCode::Minus => Control::ScaleOrbitRate(1.0 / RATE_STEP),
    KeyCode::Equal => Control::ScaleOrbitRate(RATE_STEP),
    KeyCode::Comma => Control::ScaleRotationRate(1.0 / RATE_STEP),
    KeyCode::Period => Control::ScaleRotationRate(RATE_STEP),
    KeyCode::KeyK => Control::StepAmbient(-0.05),
    KeyCode::KeyL => Control::StepAmbient(0.05),
    KeyCode::KeyN => Control::StepSun(-0.1),
    KeyCode::KeyM => Control::StepSun(0.1),
    KeyCode::KeyB => Control::CycleBackground,
    KeyCode::KeyJ => Control::ToggleJitter,
    KeyCode::KeyP => Control::ToggleScalePoints,
    KeyCode::KeyR => Control::Regenerate,
    KeyCode::Digit0 | KeyCode::KeyH => Control::Home,
    KeyCode::Digit1 => Control::Select(PLANETS[0]),
    KeyCode::Digit2 => Control::Select(PLANETS[1]),
    KeyCode::Digit3 => Control::Select(PLANETS[2]),
    KeyCode::Digit4 => Control::Select(PLANETS[3]),
    KeyCode::Digit5 => Control::Select(PLANETS[4]),
    KeyCode::Digit6 => Control::Select(PLANETS[5]),
    KeyCode::Digit7 => Control::Select(PLANETS[6]),
    KeyCode::Digit8 => Control::Select(PLANETS[7]),
    _ => return None,
  };
  Some(control)
}

/// Adds `delta` within `range`. Returns `true` if the value moved.
fn step(value: &mut f32, delta: f32, (lo, hi): (f32, f32)) -> bool {
  let next = (*value + delta).clamp(lo, hi);
  let changed = next != *value;
  *value = next;
  changed
}

/// The palette entry after `current`, or the first entry if `current` is
/// not in the palette.
pub fn next_color(palette: &[u32], current: Rgb) -> Rgb {
  let colors: Vec<Rgb> = palette.iter().copied().map(Rgb::from_rgb24).collect();
  match colors.iter().position(|c| *c == current) {
    Some(i) => colors[(i + 1) % colors.len()],
    None => colors[0],
  }
}

impl Control {
  /// Applies the parameter side of the message. Returns `true` when the
  /// particle field has to be rebuilt.
  pub fn apply(&self, params: &mut FieldParams, tuning: &mut Tuning) -> bool {
    match *self {
      Control::SetParams(new) => {
        let changed = *params != new;
        *params = new;
        changed
      }
      Control::AdjustCount(delta) => {
        let count = (i64::from(params.count) + delta).clamp(i64::from(MIN_COUNT), i64::from(MAX_COUNT));
        let changed = count != i64::from(params.count);
        params.count = count as u32;
        changed
      }
      Control::ScaleSize(factor) => {
        let size = (params.size * factor).clamp(MIN_SIZE, MAX_SIZE);
        let changed = size != params.size;
        params.size = size;
        changed
      }
      Control::StepMinRadius(delta) => step(&mut params.min_radius, delta, MIN_RADIUS_RANGE),
      Control::StepMaxRadius(delta) => step(&mut params.max_radius, delta, MAX_RADIUS_RANGE),
      Control::StepRandomness(delta) => {
        let enabled = params.jitter.is_none();
        let jitter = params.jitter.get_or_insert_with(Jitter::default);
        step(&mut jitter.randomness, delta, RANDOMNESS_RANGE) || enabled
      }
      Control::StepPower(delta) => {
        let enabled = params.jitter.is_none();
        let jitter = params.jitter.get_or_insert_with(Jitter::default);
        step(&mut jitter.power, delta, POWER_RANGE) || enabled
      }
      Control::CycleInsideColor => {
        params.inside_color = next_color(&FIELD_PALETTE, params.inside_color);
        true
      }
      Control::CycleOutsideColor => {
        params.outside_color = next_color(&FIELD_PALETTE, params.outside_color);
        true
      }
      Control::ScaleOrbitRate(factor) => {
        tuning.orbit_rate *= factor;
        false
      }
      Control::ScaleRotationRate(factor) => {
        tuning.rotation_rate *= factor;
        false
      }
      Control::StepAmbient(delta) => {
        step(&mut tuning.lighting.ambient, delta, LIGHT_RANGE);
        false
      }
      Control::StepSun(delta) => {
        step(&mut tuning.lighting.sun, delta, LIGHT_RANGE);
        false
      }
      Control::CycleBackground => {
        tuning.lighting.background = next_color(&BACKGROUND_PALETTE, tuning.lighting.background);
        false
      }
      Control::ToggleJitter => {
        params.jitter = match params.jitter {
          Some(_) => None,
          None => Some(Jitter::default()),
        };
        true
      }
      Control::ToggleScalePoints => {
        params.scale_points = !params.scale_points;
        true
      }
      Control::Regenerate => true,
      Control::Select(_) | Control::Home => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Lighting;

  #[test]
  fn count_is_clamped_to_slider_bounds() {
    let mut params = FieldParams {
      count: 99_500,
      ..Default::default()
    };
    let mut tuning = Tuning::default();
    assert!(Control::AdjustCount(1_000).apply(&mut params, &mut tuning));
    assert_eq!(params.count, MAX_COUNT);
    assert!(!Control::AdjustCount(1_000).apply(&mut params, &mut tuning));

    params.count = 600;
    Control::AdjustCount(-1_000).apply(&mut params, &mut tuning);
    assert_eq!(params.count, MIN_COUNT);
  }

  #[test]
  fn rate_changes_do_not_rebuild() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    assert!(!Control::ScaleOrbitRate(2.0).apply(&mut params, &mut tuning));
    assert!(!Control::ScaleRotationRate(0.5).apply(&mut params, &mut tuning));
    assert_eq!(tuning.orbit_rate, 2.0);
    assert_eq!(tuning.rotation_rate, 0.5);
    assert_eq!(params, FieldParams::default());
  }

  #[test]
  fn field_changes_rebuild() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    assert!(Control::ToggleJitter.apply(&mut params, &mut tuning));
    assert_eq!(params.jitter, Some(Jitter::default()));
    assert!(Control::ToggleJitter.apply(&mut params, &mut tuning));
    assert_eq!(params.jitter, None);
    assert!(Control::ToggleScalePoints.apply(&mut params, &mut tuning));
    assert!(params.scale_points);
    assert!(Control::Regenerate.apply(&mut params, &mut tuning));
  }

  #[test]
  fn set_params_rebuilds_only_on_change() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    assert!(!Control::SetParams(FieldParams::default()).apply(&mut params, &mut tuning));
    let bigger = FieldParams {
      max_radius: 200.0,
      ..Default::default()
    };
    assert!(Control::SetParams(bigger).apply(&mut params, &mut tuning));
    assert_eq!(params.max_radius, 200.0);
  }

  #[test]
  fn backspace_resets_field() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    Control::StepMaxRadius(50.0).apply(&mut params, &mut tuning);
    Control::ToggleJitter.apply(&mut params, &mut tuning);
    let reset = control_for_key(KeyCode::Backspace).unwrap();
    assert!(reset.apply(&mut params, &mut tuning));
    assert_eq!(params, FieldParams::default());
  }

  #[test]
  fn size_never_reaches_zero() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    for _ in 0..100 {
      Control::ScaleSize(0.5).apply(&mut params, &mut tuning);
    }
    assert_eq!(params.size, MIN_SIZE);
  }

  #[test]
  fn size_at_its_bound_does_not_rebuild() {
    let mut params = FieldParams {
      size: MIN_SIZE,
      ..Default::default()
    };
    let mut tuning = Tuning::default();
    assert!(!Control::ScaleSize(0.8).apply(&mut params, &mut tuning));
    assert!(Control::ScaleSize(1.25).apply(&mut params, &mut tuning));
    params.size = MAX_SIZE;
    assert!(!Control::ScaleSize(1.25).apply(&mut params, &mut tuning));
  }

  #[test]
  fn radius_steps_rebuild_within_bounds() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    assert!(control_for_key(KeyCode::KeyX).unwrap().apply(&mut params, &mut tuning));
    assert_eq!(params.min_radius, 55.0);
    assert!(control_for_key(KeyCode::KeyC).unwrap().apply(&mut params, &mut tuning));
    assert_eq!(params.max_radius, 90.0);

    params.min_radius = 2.0;
    assert!(Control::StepMinRadius(-5.0).apply(&mut params, &mut tuning));
    assert_eq!(params.min_radius, 1.0);
    assert!(!Control::StepMinRadius(-5.0).apply(&mut params, &mut tuning));

    params.max_radius = 500.0;
    assert!(!Control::StepMaxRadius(10.0).apply(&mut params, &mut tuning));
  }

  #[test]
  fn jitter_steps_enable_and_adjust() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    assert!(control_for_key(KeyCode::KeyG).unwrap().apply(&mut params, &mut tuning));
    let jitter = params.jitter.unwrap();
    assert!((jitter.randomness - 0.25).abs() < 1e-6);
    assert_eq!(jitter.power, 3.0);

    assert!(control_for_key(KeyCode::KeyT).unwrap().apply(&mut params, &mut tuning));
    assert_eq!(params.jitter.unwrap().power, 2.5);

    // already enabled and pinned at the lower bound
    params.jitter = Some(Jitter {
      randomness: 0.0,
      power: 1.0,
    });
    assert!(!Control::StepRandomness(-0.05).apply(&mut params, &mut tuning));
    assert!(!Control::StepPower(-0.5).apply(&mut params, &mut tuning));

    // enabling at a bound still rebuilds
    params.jitter = None;
    assert!(Control::StepPower(-100.0).apply(&mut params, &mut tuning));
    assert_eq!(params.jitter.unwrap().power, 1.0);
  }

  #[test]
  fn colors_cycle_through_palette() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    assert!(control_for_key(KeyCode::KeyI).unwrap().apply(&mut params, &mut tuning));
    assert_eq!(params.inside_color, Rgb::from_rgb24(FIELD_PALETTE[1]));
    assert!(control_for_key(KeyCode::KeyO).unwrap().apply(&mut params, &mut tuning));
    assert_eq!(params.outside_color, Rgb::from_rgb24(FIELD_PALETTE[2]));

    params.inside_color = Rgb::from_rgb24(FIELD_PALETTE[FIELD_PALETTE.len() - 1]);
    Control::CycleInsideColor.apply(&mut params, &mut tuning);
    assert_eq!(params.inside_color, Rgb::from_rgb24(FIELD_PALETTE[0]));

    params.outside_color = Rgb::new(0.3, 0.3, 0.3);
    Control::CycleOutsideColor.apply(&mut params, &mut tuning);
    assert_eq!(params.outside_color, Rgb::from_rgb24(FIELD_PALETTE[0]));
  }

  #[test]
  fn lighting_changes_do_not_rebuild() {
    let mut params = FieldParams::default();
    let mut tuning = Tuning::default();
    let defaults = Lighting::default();

    assert!(!control_for_key(KeyCode::KeyL).unwrap().apply(&mut params, &mut tuning));
    assert!((tuning.lighting.ambient - (defaults.ambient + 0.05)).abs() < 1e-6);
    assert!(!control_for_key(KeyCode::KeyN).unwrap().apply(&mut params, &mut tuning));
    assert!((tuning.lighting.sun - (defaults.sun - 0.1)).abs() < 1e-6);
    assert!(!control_for_key(KeyCode::KeyB).unwrap().apply(&mut params, &mut tuning));
    assert_eq!(tuning.lighting.background, Rgb::from_rgb24(BACKGROUND_PALETTE[1]));
    assert_eq!(params, FieldParams::default());

    for _ in 0..100 {
      Control::StepSun(0.1).apply(&mut params, &mut tuning);
      Control::StepAmbient(-0.05).apply(&mut params, &mut tuning);
    }
    assert_eq!(tuning.lighting.sun, 3.0);
    assert_eq!(tuning.lighting.ambient, 0.0);
  }

  #[test]
  fn number_keys_select_planets() {
    assert_eq!(control_for_key(KeyCode::Digit3), Some(Control::Select("Earth")));
    assert_eq!(control_for_key(KeyCode::Digit8), Some(Control::Select("Neptune")));
    assert_eq!(control_for_key(KeyCode::Digit0), Some(Control::Home));
    assert_eq!(control_for_key(KeyCode::KeyH), Some(Control::Home));
    assert_eq!(control_for_key(KeyCode::KeyW), None);
  }
}
