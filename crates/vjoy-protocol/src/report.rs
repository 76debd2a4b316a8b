use crate::{AxisField, JoystickPosition, ProtocolError};
use std::mem::offset_of;

pub const REPORT_SIZE: usize = size_of::<JoystickPosition>();

pub const OFFSET_AXES: usize = offset_of!(JoystickPosition, throttle);
pub const OFFSET_BUTTONS: usize = offset_of!(JoystickPosition, buttons);
pub const OFFSET_HATS: usize = offset_of!(JoystickPosition, hats);
pub const OFFSET_BUTTONS_EX: usize = offset_of!(JoystickPosition, buttons_ex1);

const _: () = assert!(OFFSET_AXES == 4);
const _: () = assert!(OFFSET_BUTTONS == OFFSET_AXES + 18 * 4);
const _: () = assert!(OFFSET_HATS == OFFSET_BUTTONS + 4);
const _: () = assert!(OFFSET_BUTTONS_EX == OFFSET_HATS + 16);
const _: () = assert!(REPORT_SIZE == OFFSET_BUTTONS_EX + 12);

/// Little-endian byte image of a [`JoystickPosition`], padding zeroed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct JoystickReport(pub [u8; REPORT_SIZE]);

impl From<[u8; REPORT_SIZE]> for JoystickReport {
    fn from(data: [u8; REPORT_SIZE]) -> Self {
        JoystickReport(data)
    }
}

impl JoystickReport {
    #[inline]
    pub fn as_bytes(&self) -> &[u8; REPORT_SIZE] {
        &self.0
    }

    #[inline]
    pub fn device(&self) -> u8 {
        self.0[0]
    }

    fn word(&self, offset: usize) -> [u8; 4] {
        let mut w = [0u8; 4];
        w.copy_from_slice(&self.0[offset..offset + 4]);
        w
    }

    /// Decode the report back into the position the driver would see.
    pub fn position(&self) -> JoystickPosition {
        let mut pos = JoystickPosition { device: self.device(), ..JoystickPosition::default() };
        for (i, field) in AxisField::ALL.into_iter().enumerate() {
            *pos.axis_mut(field) = i32::from_le_bytes(self.word(OFFSET_AXES + i * 4));
        }
        pos.buttons = i32::from_le_bytes(self.word(OFFSET_BUTTONS));
        pos.hats = u32::from_le_bytes(self.word(OFFSET_HATS));
        pos.hats_ex1 = u32::from_le_bytes(self.word(OFFSET_HATS + 4));
        pos.hats_ex2 = u32::from_le_bytes(self.word(OFFSET_HATS + 8));
        pos.hats_ex3 = u32::from_le_bytes(self.word(OFFSET_HATS + 12));
        pos.buttons_ex1 = i32::from_le_bytes(self.word(OFFSET_BUTTONS_EX));
        pos.buttons_ex2 = i32::from_le_bytes(self.word(OFFSET_BUTTONS_EX + 4));
        pos.buttons_ex3 = i32::from_le_bytes(self.word(OFFSET_BUTTONS_EX + 8));
        pos
    }
}

impl TryFrom<&[u8]> for JoystickReport {
    type Error = ProtocolError;

    fn try_from(data: &[u8]) -> Result<Self, Self::Error> {
        if data.len() < REPORT_SIZE {
            return Err(ProtocolError::ShortReport { expected: REPORT_SIZE, actual: data.len() });
        }
        let mut b = [0u8; REPORT_SIZE];
        b.copy_from_slice(&data[..REPORT_SIZE]);
        Ok(JoystickReport(b))
    }
}

/// Pack a position into the driver's wire image.
impl From<&JoystickPosition> for JoystickReport {
    fn from(s: &JoystickPosition) -> Self {
        let mut b = [0u8; REPORT_SIZE];
        b[0] = s.device;
        // bytes 1..4 are alignment padding

        for (i, field) in AxisField::ALL.into_iter().enumerate() {
            let at = OFFSET_AXES + i * 4;
            b[at..at + 4].copy_from_slice(&s.axis(field).to_le_bytes());
        }

        b[OFFSET_BUTTONS..OFFSET_BUTTONS + 4].copy_from_slice(&s.buttons.to_le_bytes());
        for (i, hat) in [s.hats, s.hats_ex1, s.hats_ex2, s.hats_ex3].into_iter().enumerate() {
            let at = OFFSET_HATS + i * 4;
            b[at..at + 4].copy_from_slice(&hat.to_le_bytes());
        }
        for (i, word) in [s.buttons_ex1, s.buttons_ex2, s.buttons_ex3].into_iter().enumerate() {
            let at = OFFSET_BUTTONS_EX + i * 4;
            b[at..at + 4].copy_from_slice(&word.to_le_bytes());
        }

        JoystickReport(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AXIS_CENTER, DeviceId, HATS_NEUTRAL};

    #[test]
    fn neutral_report() {
        let s = JoystickPosition::neutral(DeviceId::new(1).unwrap());
        let r = JoystickReport::from(&s);
        let bytes = r.as_bytes();
        assert_eq!(bytes.len(), 108);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..4], &[0, 0, 0]);
        for i in 0..18 {
            let at = OFFSET_AXES + i * 4;
            assert_eq!(&bytes[at..at + 4], &AXIS_CENTER.to_le_bytes(), "axis slot {i}");
        }
        assert_eq!(&bytes[76..80], &[0, 0, 0, 0]);
        assert_eq!(&bytes[80..96], &[0xFF; 16]);
        assert_eq!(&bytes[96..108], &[0; 12]);
        assert_eq!(r.position().hats_ex3, HATS_NEUTRAL);
    }

    #[test]
    fn fields_land_at_driver_offsets() {
        let mut s = JoystickPosition::neutral(DeviceId::new(2).unwrap());
        s.axis_x = 0x1234;
        s.dial = 0x7FFF;
        s.buttons = i32::MIN; // button 32
        s.hats_ex1 = 0x2328_0002;
        s.buttons_ex3 = 1; // button 97

        let r = JoystickReport::from(&s);
        let bytes = r.as_bytes();
        assert_eq!(&bytes[16..20], &0x1234i32.to_le_bytes());
        assert_eq!(&bytes[44..48], &0x7FFFi32.to_le_bytes());
        assert_eq!(&bytes[76..80], &[0, 0, 0, 0x80]);
        assert_eq!(&bytes[84..88], &[0x02, 0x00, 0x28, 0x23]);
        assert_eq!(&bytes[104..108], &[1, 0, 0, 0]);
        assert_eq!(r.position(), s);
    }

    #[test]
    fn short_report_rejected() {
        let data = [0u8; 40];
        assert_eq!(
            JoystickReport::try_from(&data[..]),
            Err(ProtocolError::ShortReport { expected: REPORT_SIZE, actual: 40 })
        );
        let full = [0u8; 120];
        assert!(JoystickReport::try_from(&full[..]).is_ok());
    }
}
