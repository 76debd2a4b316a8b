//! The per-device position buffer and the discard slots absent controls
//! write into.

use vjoy_protocol::{AXIS_CENTER, AxisField, DeviceId, HATS_NEUTRAL, JoystickPosition};

/// Everything one [`Update`](crate::Device::update) submits. Controls hold an
/// index into this buffer, never a reference into its fields.
///
/// The slot accessors take `None` for an absent control. Writes then land in
/// a discard slot; reads always see the neutral value, never what an earlier
/// absent write left behind.
#[derive(Clone, Debug)]
pub struct StateBuffer {
    pos: JoystickPosition,
    sink_i: i32,
    sink_u: u32,
}

impl StateBuffer {
    pub fn new(id: DeviceId) -> Self {
        Self { pos: JoystickPosition::neutral(id), sink_i: 0, sink_u: 0 }
    }

    /// Axes centered, buttons released, hats neutral.
    pub fn reset(&mut self) {
        self.pos.reset();
    }

    pub fn reset_buttons(&mut self) {
        for word in 0..vjoy_protocol::BUTTON_WORDS {
            if let Some(w) = self.pos.button_word_mut(word) {
                *w = 0;
            }
        }
    }

    pub fn reset_hats(&mut self) {
        for word in 0..vjoy_protocol::HAT_WORDS {
            if let Some(w) = self.pos.hat_word_mut(word) {
                *w = vjoy_protocol::HATS_NEUTRAL;
            }
        }
    }

    #[inline]
    pub fn position(&self) -> &JoystickPosition {
        &self.pos
    }

    pub(crate) fn axis(&self, field: Option<AxisField>) -> i32 {
        field.map_or(AXIS_CENTER, |f| self.pos.axis(f))
    }

    pub(crate) fn axis_mut(&mut self, field: Option<AxisField>) -> &mut i32 {
        match field {
            Some(f) => self.pos.axis_mut(f),
            None => &mut self.sink_i,
        }
    }

    pub(crate) fn button_word(&self, word: Option<usize>) -> i32 {
        word.and_then(|w| self.pos.button_word(w)).unwrap_or(0)
    }

    pub(crate) fn button_word_mut(&mut self, word: Option<usize>) -> &mut i32 {
        match word.and_then(|w| self.pos.button_word_mut(w)) {
            Some(w) => w,
            None => &mut self.sink_i,
        }
    }

    pub(crate) fn hat_word(&self, word: Option<usize>) -> u32 {
        word.and_then(|w| self.pos.hat_word(w)).unwrap_or(HATS_NEUTRAL)
    }

    pub(crate) fn hat_word_mut(&mut self, word: Option<usize>) -> &mut u32 {
        match word.and_then(|w| self.pos.hat_word_mut(w)) {
            Some(w) => w,
            None => &mut self.sink_u,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discard_slot_never_reaches_the_position() {
        let mut buf = StateBuffer::new(DeviceId::new(1).unwrap());
        let before = *buf.position();
        *buf.axis_mut(None) = 7;
        *buf.button_word_mut(None) = -1;
        *buf.hat_word_mut(Some(9)) = 0;
        assert_eq!(*buf.position(), before);
        assert_eq!(buf.axis(None), AXIS_CENTER);
        assert_eq!(buf.button_word(None), 0);
        assert_eq!(buf.hat_word(None), HATS_NEUTRAL);
    }

    #[test]
    fn partial_resets() {
        let mut buf = StateBuffer::new(DeviceId::new(1).unwrap());
        *buf.axis_mut(Some(AxisField::X)) = 0;
        *buf.button_word_mut(Some(2)) = 0x10;
        *buf.hat_word_mut(Some(1)) = 0;

        buf.reset_buttons();
        assert_eq!(buf.button_word(Some(2)), 0);
        assert_eq!(buf.hat_word(Some(1)), 0);

        buf.reset_hats();
        assert_eq!(buf.hat_word(Some(1)), HATS_NEUTRAL);
        assert_eq!(buf.axis(Some(AxisField::X)), 0);

        buf.reset();
        assert_eq!(buf.axis(Some(AxisField::X)), AXIS_CENTER);
    }
}
