//! Ownership of the live particle field.

/// Explicitly frees resources held by a field generation.
pub trait Release {
  fn release(self);
}

/// The field is either absent or present; a rebuild replaces it wholesale.
#[derive(Debug)]
pub enum FieldSlot<R: Release> {
  Absent,
  Present(R),
}

impl<R: Release> Default for FieldSlot<R> {
  fn default() -> Self {
    FieldSlot::Absent
  }
}

impl<R: Release> FieldSlot<R> {
  /// Releases the current field, then builds and stores a new one.
  ///
  /// `build` is not invoked until the old resources have been released.
  pub fn rebuild<F>(&mut self, build: F)
  where
    F: FnOnce() -> R,
  {
    self.clear();
    *self = FieldSlot::Present(build());
  }

  pub fn clear(&mut self) {
    if let FieldSlot::Present(old) = std::mem::replace(self, FieldSlot::Absent) {
      old.release();
    }
  }

  pub fn get(&self) -> Option<&R> {
    match self {
      FieldSlot::Absent => None,
      FieldSlot::Present(r) => Some(r),
    }
  }
}
