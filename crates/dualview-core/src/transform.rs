//! Manual pan/zoom operations
//!
//! No clamping: the operator may push the frame arbitrarily far off-canvas or
//! zoom arbitrarily far in. Only scales that would break the `scale > 0`
//! invariant are refused.

use crate::{types::TransformState, Error, Result};

impl TransformState {
    /// Replace the zoom factor, keeping the pan
    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidScale(scale));
        }
        self.scale = scale;
        Ok(())
    }

    /// Shift by `(dx, dy)` canvas pixels
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.translate_x += dx;
        self.translate_y += dy;
    }

    /// Zero the pan, keep the zoom
    pub fn reset_center(&mut self) {
        self.translate_x = 0.0;
        self.translate_y = 0.0;
    }

    /// Back to identity
    pub fn reset_all(&mut self) {
        *self = TransformState::IDENTITY;
    }

    pub fn is_identity(&self) -> bool {
        *self == TransformState::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_is_additive_and_unbounded() {
        let mut t = TransformState::default();
        t.pan(10.0, -4.0);
        t.pan(-25.0, 1e6);
        assert_eq!(t.translate_x, -15.0);
        assert_eq!(t.translate_y, 1e6 - 4.0);
    }

    #[test]
    fn test_reset_center_keeps_scale() {
        let mut t = TransformState { scale: 2.5, translate_x: 30.0, translate_y: -8.0 };
        t.reset_center();
        assert_eq!(t, TransformState { scale: 2.5, translate_x: 0.0, translate_y: 0.0 });
    }

    #[test]
    fn test_reset_all_from_any_state() {
        for start in [
            TransformState { scale: 0.01, translate_x: -5000.0, translate_y: 5000.0 },
            TransformState { scale: 40.0, translate_x: 0.0, translate_y: 1.0 },
            TransformState::IDENTITY,
        ] {
            let mut t = start;
            t.reset_all();
            assert!(t.is_identity());
        }
    }

    #[test]
    fn test_set_scale_rejects_non_positive() {
        let mut t = TransformState::default();
        assert!(t.set_scale(0.0).is_err());
        assert!(t.set_scale(-1.0).is_err());
        assert!(t.set_scale(f64::NAN).is_err());
        assert_eq!(t.scale, 1.0);

        t.set_scale(12.0).unwrap();
        assert_eq!(t.scale, 12.0);
    }
}
