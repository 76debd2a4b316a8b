//! Hat switches, two per 32-bit hat word.
//!
//! A discrete hat stores a direction index in the low nibble of its
//! half-word; a continuous hat stores hundredths of a degree in all 16 bits.
//! Both accept either representation and convert. `-1` is neutral.

use crate::state::StateBuffer;
use serde::Serialize;
use tracing::trace;
use vjoy_protocol::{HatState, MAX_HATS};

const NIBBLE: u32 = 0xF;
const HALF_WORD: u32 = 0xFFFF;
const QUARTER_TURN: i32 = 9000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HatSlot {
    Discrete { word: usize, shift: u32 },
    Continuous { word: usize, shift: u32 },
}

impl HatSlot {
    pub const fn discrete(index: usize) -> Self {
        HatSlot::Discrete { word: index / 2, shift: (index % 2) as u32 * 16 }
    }

    pub const fn continuous(index: usize) -> Self {
        HatSlot::Continuous { word: index / 2, shift: (index % 2) as u32 * 16 }
    }

    pub const fn position(self) -> (usize, u32) {
        match self {
            HatSlot::Discrete { word, shift } | HatSlot::Continuous { word, shift } => {
                (word, shift)
            }
        }
    }

    pub const fn is_continuous(self) -> bool {
        matches!(self, HatSlot::Continuous { .. })
    }
}

/// Assign hat indices: discrete hats first, continuous ones continue the
/// sequence. Hats past [`MAX_HATS`] have no word to live in and are dropped.
pub fn assign_hats(discrete: usize, continuous: usize) -> Vec<HatSlot> {
    (0..discrete)
        .map(HatSlot::discrete)
        .chain((discrete..discrete + continuous).map(HatSlot::continuous))
        .take(MAX_HATS)
        .collect()
}

/// Write access to one hat of a device's state buffer.
pub struct Hat<'a> {
    index: usize,
    slot: HatSlot,
    exists: bool,
    buf: &'a mut StateBuffer,
}

impl<'a> Hat<'a> {
    pub(crate) fn new(index: usize, slot: Option<HatSlot>, buf: &'a mut StateBuffer) -> Self {
        match slot {
            Some(slot) => Self { index, slot, exists: true, buf },
            None => Self { index, slot: HatSlot::discrete(0), exists: false, buf },
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn slot(&self) -> HatSlot {
        self.slot
    }

    fn word(&self) -> Option<usize> {
        self.exists.then_some(self.slot.position().0)
    }

    /// The hat's 16-bit half-word as stored.
    pub fn raw(&self) -> u16 {
        let (_, shift) = self.slot.position();
        ((self.buf.hat_word(self.word()) >> shift) & HALF_WORD) as u16
    }

    /// Current position, rounded to the nearest direction for continuous hats.
    pub fn state(&self) -> HatState {
        let raw = u32::from(self.raw());
        match self.slot {
            HatSlot::Discrete { .. } => HatState::from_nibble(raw),
            HatSlot::Continuous { .. } if raw == HALF_WORD => HatState::Off,
            HatSlot::Continuous { .. } => {
                HatState::from_nibble((raw + 4500) / QUARTER_TURN as u32 % 4)
            }
        }
    }

    /// Replace the `mask` bits of this hat's half-word, leaving the other
    /// hat in the word untouched.
    fn write(&mut self, mask: u32, value: i32) {
        let word = self.word();
        if word.is_none() {
            trace!(hat = self.index, value, "write to absent hat discarded");
        }
        let (_, shift) = self.slot.position();
        let w = self.buf.hat_word_mut(word);
        *w = (*w & !(mask << shift)) | ((value as u32 & mask) << shift);
    }

    pub fn set_discrete(&mut self, state: HatState) {
        match self.slot {
            HatSlot::Discrete { .. } => self.write(NIBBLE, state.raw()),
            HatSlot::Continuous { .. } => {
                let v = state.raw();
                self.write(HALF_WORD, if v > 0 { v * QUARTER_TURN } else { v });
            }
        }
    }

    /// Hundredths of a degree, `0..36000`, or `-1` for neutral. Discrete
    /// hats snap to the nearest of the four directions.
    pub fn set_degree_percent(&mut self, value: i32) {
        match self.slot {
            HatSlot::Discrete { .. } => {
                let v = if value > 0 {
                    ((i64::from(value) + 4500) / i64::from(QUARTER_TURN) % 4) as i32
                } else {
                    value
                };
                self.write(HALF_WORD, v);
            }
            HatSlot::Continuous { .. } => self.write(HALF_WORD, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vjoy_protocol::{DeviceId, HATS_NEUTRAL};

    fn buffer() -> StateBuffer {
        StateBuffer::new(DeviceId::new(1).unwrap())
    }

    #[test]
    fn hats_assigned_discrete_first() {
        let slots = assign_hats(2, 3);
        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0], HatSlot::Discrete { word: 0, shift: 0 });
        assert_eq!(slots[1], HatSlot::Discrete { word: 0, shift: 16 });
        assert_eq!(slots[2], HatSlot::Continuous { word: 1, shift: 0 });
        assert_eq!(slots[4], HatSlot::Continuous { word: 2, shift: 0 });
        assert_eq!(assign_hats(4, 6).len(), MAX_HATS);
    }

    #[test]
    fn continuous_accepts_directions() {
        let mut buf = buffer();
        let mut hat = Hat::new(0, Some(HatSlot::continuous(0)), &mut buf);
        hat.set_discrete(HatState::East);
        assert_eq!(hat.raw(), 9000);
        hat.set_discrete(HatState::West);
        assert_eq!(hat.raw(), 27000);
        hat.set_discrete(HatState::North);
        assert_eq!(hat.raw(), 0);
        hat.set_discrete(HatState::Off);
        assert_eq!(hat.raw(), 0xFFFF);
        assert_eq!(hat.state(), HatState::Off);
    }

    #[test]
    fn continuous_stores_degrees_verbatim() {
        let mut buf = buffer();
        let mut hat = Hat::new(1, Some(HatSlot::continuous(1)), &mut buf);
        hat.set_degree_percent(12345);
        assert_eq!(hat.raw(), 12345);
        assert_eq!(hat.state(), HatState::East);
        hat.set_degree_percent(-1);
        assert_eq!(hat.raw(), 0xFFFF);
    }

    #[test]
    fn discrete_snaps_degrees() {
        let mut buf = buffer();
        let mut hat = Hat::new(0, Some(HatSlot::discrete(0)), &mut buf);
        hat.set_degree_percent(13500);
        assert_eq!(hat.raw(), 2);
        assert_eq!(hat.state(), HatState::South);
        hat.set_degree_percent(35000);
        assert_eq!(hat.state(), HatState::North);
        hat.set_degree_percent(-1);
        assert_eq!(hat.state(), HatState::Off);
        hat.set_degree_percent(0);
        assert_eq!(hat.state(), HatState::North);
    }

    #[test]
    fn discrete_writes_the_low_nibble() {
        let mut buf = buffer();
        let mut hat = Hat::new(0, Some(HatSlot::discrete(0)), &mut buf);
        hat.set_discrete(HatState::West);
        assert_eq!(hat.raw(), 0xFFF3);
        assert_eq!(hat.state(), HatState::West);
        hat.set_discrete(HatState::Off);
        assert_eq!(hat.raw(), 0xFFFF);
    }

    #[test]
    fn neighbours_in_one_word_are_independent() {
        let mut buf = buffer();
        Hat::new(0, Some(HatSlot::continuous(0)), &mut buf).set_degree_percent(18000);
        assert_eq!(buf.position().hats, 0xFFFF_0000 | 18000);

        Hat::new(1, Some(HatSlot::discrete(1)), &mut buf).set_discrete(HatState::East);
        assert_eq!(buf.position().hats, 0xFFF1_0000 | 18000);

        Hat::new(0, Some(HatSlot::continuous(0)), &mut buf).set_discrete(HatState::Off);
        assert_eq!(buf.position().hats, 0xFFF1_FFFF);
    }

    #[test]
    fn absent_hat_is_a_no_op() {
        let mut buf = buffer();
        let mut hat = Hat::new(5, None, &mut buf);
        assert!(!hat.exists());
        hat.set_discrete(HatState::South);
        hat.set_degree_percent(9000);
        for w in 0..4 {
            assert_eq!(buf.position().hat_word(w), Some(HATS_NEUTRAL));
        }
    }
}
