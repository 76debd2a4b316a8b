use crate::state::StateBuffer;
use tracing::trace;
use vjoy_protocol::MAX_BUTTONS;

/// Word and bit of button `index` (0-based) within the four button words.
#[inline]
pub const fn button_slot(index: usize) -> (usize, i32) {
    (index / 32, (1u32 << (index % 32)) as i32)
}

/// Write access to one button bit of a device's state buffer.
pub struct Button<'a> {
    index: usize,
    exists: bool,
    buf: &'a mut StateBuffer,
}

impl<'a> Button<'a> {
    /// `count` is the number of buttons discovery reported.
    pub(crate) fn new(index: usize, count: usize, buf: &'a mut StateBuffer) -> Self {
        Self { index, exists: index < count.min(MAX_BUTTONS), buf }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    fn word(&self) -> Option<usize> {
        self.exists.then_some(button_slot(self.index).0)
    }

    pub fn is_pressed(&self) -> bool {
        let (_, mask) = button_slot(self.index);
        self.buf.button_word(self.word()) & mask != 0
    }

    pub fn set(&mut self, pressed: bool) {
        let word = self.word();
        if word.is_none() {
            trace!(button = self.index, pressed, "write to absent button discarded");
        }
        let (_, mask) = button_slot(self.index);
        let w = self.buf.button_word_mut(word);
        if pressed {
            *w |= mask;
        } else {
            *w &= !mask;
        }
    }

    pub fn press(&mut self) {
        self.set(true);
    }

    pub fn release(&mut self) {
        self.set(false);
    }
}
