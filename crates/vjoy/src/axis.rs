//! Axis value transforms into the driver's 15-bit unsigned range.
//!
//! Every setter ends in [`Axis::set`], which masks to `0..=0x7FFF`. Values
//! outside a setter's documented domain are wrapped or clamped, never
//! reported.

use crate::state::StateBuffer;
use serde::Serialize;
use tracing::trace;
use vjoy_protocol::{AXIS_CENTER, AXIS_MAX, AXIS_MIN, AxisField, AxisName};

/// What discovery learned about one logical axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AxisInfo {
    pub name: AxisName,
    pub exists: bool,
    /// Logical `(min, max)` the driver reports. Informational only.
    pub bounds: Option<(i32, i32)>,
}

impl AxisInfo {
    pub const fn absent(name: AxisName) -> Self {
        Self { name, exists: false, bounds: None }
    }

    fn field(&self) -> Option<AxisField> {
        self.exists.then_some(self.name.field())
    }
}

/// Write access to one axis slot of a device's state buffer.
pub struct Axis<'a> {
    info: &'a AxisInfo,
    buf: &'a mut StateBuffer,
}

impl<'a> Axis<'a> {
    pub(crate) fn new(info: &'a AxisInfo, buf: &'a mut StateBuffer) -> Self {
        Self { info, buf }
    }

    pub fn name(&self) -> AxisName {
        self.info.name
    }

    pub fn exists(&self) -> bool {
        self.info.exists
    }

    pub fn bounds(&self) -> Option<(i32, i32)> {
        self.info.bounds
    }

    /// Current encoded value, `0..=0x7FFF`.
    pub fn value(&self) -> i32 {
        self.buf.axis(self.info.field())
    }

    /// Unsigned range `0..=0x7FFF`; anything else wraps through the mask.
    pub fn set(&mut self, value: i32) {
        let field = self.info.field();
        if field.is_none() {
            trace!(axis = %self.info.name, value, "write to absent axis discarded");
        }
        *self.buf.axis_mut(field) = value & AXIS_MAX;
    }

    /// Signed range `-0x4000..=0x3FFF` around the center; wraps outside it.
    pub fn set_signed(&mut self, value: i32) {
        self.set(value.wrapping_sub(AXIS_CENTER));
    }

    /// Unsigned range, saturating at both ends.
    pub fn set_clamped(&mut self, value: i32) {
        self.set(value.clamp(AXIS_MIN, AXIS_MAX));
    }

    /// `-1.0..=1.0`, with `0.0` at the center. The negative half spans
    /// `0..0x4000`, the positive half `0x4000..=0x7FFF`.
    pub fn set_normalized(&mut self, value: f32) {
        let v = if value < 0.0 {
            let v = (value + 1.0).max(0.0);
            (v * AXIS_CENTER as f32) as i32
        } else {
            let v = value.min(1.0);
            AXIS_CENTER + (v * (AXIS_MAX - AXIS_CENTER) as f32) as i32
        };
        self.set(v);
    }

    /// `0.0..=1.0` across the full range.
    pub fn set_unit(&mut self, value: f32) {
        self.set_clamped((value * AXIS_MAX as f32) as i32);
    }
}
