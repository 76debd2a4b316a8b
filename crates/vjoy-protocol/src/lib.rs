#![deny(warnings)]
//! ABI-stable vJoy protocol: the packed joystick position, status codes,
//! axis usages and the small vocabulary shared by driver and client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod report;

pub use report::{JoystickReport, REPORT_SIZE};

pub const AXIS_MIN: i32 = 0;
pub const AXIS_MAX: i32 = 0x7FFF;
pub const AXIS_CENTER: i32 = 0x4000;

/// Every hat half-word set to all ones: all hats neutral.
pub const HATS_NEUTRAL: u32 = 0xFFFF_FFFF;

pub const BUTTON_WORDS: usize = 4;
pub const HAT_WORDS: usize = 4;
pub const MAX_BUTTONS: usize = BUTTON_WORDS * 32;
pub const MAX_HATS: usize = HAT_WORDS * 2;

/// Driver 2.0.4, the release this layout was written against.
pub const TESTED_DRIVER_VERSION: u16 = 0x0204;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("report too short: expected {expected} bytes, got {actual}")]
    ShortReport { expected: usize, actual: usize },

    #[error("unknown control name: {0:?}")]
    UnknownName(String),

    #[error("device ids are 1-based, got 0")]
    ZeroDeviceId,
}

/// 1-based report identifier of one virtual device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DeviceId(u8);

impl DeviceId {
    pub const fn new(id: u8) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The id as the driver's `UINT rID` argument.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<u8> for DeviceId {
    type Error = ProtocolError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id).ok_or(ProtocolError::ZeroDeviceId)
    }
}

impl From<DeviceId> for u8 {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ownership status of a device as reported by `GetVJDStatus`.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Owned by this process.
    Owned = 0,
    Free = 1,
    /// Owned by another process.
    Busy = 2,
    /// Not configured, or the driver is down.
    Missing = 3,
    Unknown = 4,
}

impl DeviceStatus {
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0 => DeviceStatus::Owned,
            1 => DeviceStatus::Free,
            2 => DeviceStatus::Busy,
            3 => DeviceStatus::Missing,
            _ => DeviceStatus::Unknown,
        }
    }
}

/// The 18 axis slots of [`JoystickPosition`], in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisField {
    Throttle,
    Rudder,
    Aileron,
    X,
    Y,
    Z,
    XRot,
    YRot,
    ZRot,
    Slider,
    Dial,
    Wheel,
    VX,
    VY,
    VZ,
    VBrakeX,
    VBrakeY,
    VBrakeZ,
}

impl AxisField {
    pub const ALL: [AxisField; 18] = [
        AxisField::Throttle,
        AxisField::Rudder,
        AxisField::Aileron,
        AxisField::X,
        AxisField::Y,
        AxisField::Z,
        AxisField::XRot,
        AxisField::YRot,
        AxisField::ZRot,
        AxisField::Slider,
        AxisField::Dial,
        AxisField::Wheel,
        AxisField::VX,
        AxisField::VY,
        AxisField::VZ,
        AxisField::VBrakeX,
        AxisField::VBrakeY,
        AxisField::VBrakeZ,
    ];
}

/// Logical axes addressable through the client API.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    Slider0,
    Slider1,
}

impl AxisName {
    pub const COUNT: usize = 8;

    pub const ALL: [AxisName; AxisName::COUNT] = [
        AxisName::X,
        AxisName::Y,
        AxisName::Z,
        AxisName::Rx,
        AxisName::Ry,
        AxisName::Rz,
        AxisName::Slider0,
        AxisName::Slider1,
    ];

    /// HID usage code (generic desktop page) the driver keys axis queries on.
    #[inline]
    pub const fn usage(self) -> u32 {
        0x30 + self as u32
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Slot of the position buffer this axis writes.
    pub const fn field(self) -> AxisField {
        match self {
            AxisName::X => AxisField::X,
            AxisName::Y => AxisField::Y,
            AxisName::Z => AxisField::Z,
            AxisName::Rx => AxisField::XRot,
            AxisName::Ry => AxisField::YRot,
            AxisName::Rz => AxisField::ZRot,
            AxisName::Slider0 => AxisField::Slider,
            AxisName::Slider1 => AxisField::Dial,
        }
    }

    pub const fn flag(self) -> AxisSet {
        AxisSet::from_bits_retain(1 << self as u8)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AxisName::X => "x",
            AxisName::Y => "y",
            AxisName::Z => "z",
            AxisName::Rx => "rx",
            AxisName::Ry => "ry",
            AxisName::Rz => "rz",
            AxisName::Slider0 => "slider0",
            AxisName::Slider1 => "slider1",
        }
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AxisName {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(AxisName::X),
            "y" => Ok(AxisName::Y),
            "z" => Ok(AxisName::Z),
            "rx" | "xrot" => Ok(AxisName::Rx),
            "ry" | "yrot" => Ok(AxisName::Ry),
            "rz" | "zrot" => Ok(AxisName::Rz),
            "slider0" | "slider" | "sl0" => Ok(AxisName::Slider0),
            "slider1" | "dial" | "sl1" => Ok(AxisName::Slider1),
            _ => Err(ProtocolError::UnknownName(s.to_owned())),
        }
    }
}

bitflags::bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AxisSet: u8 {
        const X       = 1 << 0;
        const Y       = 1 << 1;
        const Z       = 1 << 2;
        const RX      = 1 << 3;
        const RY      = 1 << 4;
        const RZ      = 1 << 5;
        const SLIDER0 = 1 << 6;
        const SLIDER1 = 1 << 7;
    }
}

/// Hat position. Discrete hats store the raw value, continuous hats store
/// it scaled to hundredths of a degree.
#[repr(i8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HatState {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
    #[default]
    Off = -1,
}

impl HatState {
    #[inline]
    pub const fn raw(self) -> i32 {
        self as i32
    }

    /// Decodes the low nibble of a discrete hat half-word.
    pub const fn from_nibble(nibble: u32) -> Self {
        match nibble & 0xF {
            0 => HatState::North,
            1 => HatState::East,
            2 => HatState::South,
            3 => HatState::West,
            _ => HatState::Off,
        }
    }
}

impl FromStr for HatState {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "n" | "north" | "up" => Ok(HatState::North),
            "e" | "east" | "right" => Ok(HatState::East),
            "s" | "south" | "down" => Ok(HatState::South),
            "w" | "west" | "left" => Ok(HatState::West),
            "off" | "neutral" | "-1" => Ok(HatState::Off),
            _ => Err(ProtocolError::UnknownName(s.to_owned())),
        }
    }
}

const _: [(); 108] = [(); size_of::<JoystickPosition>()];
const _: [(); 4] = [(); align_of::<JoystickPosition>()];

/// `JOYSTICK_POSITION_V2` as `UpdateVJD` reads it. The driver parses this
/// positionally: do not reorder or resize fields.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoystickPosition {
    pub device: u8,
    pub throttle: i32,
    pub rudder: i32,
    pub aileron: i32,
    pub axis_x: i32,
    pub axis_y: i32,
    pub axis_z: i32,
    pub axis_x_rot: i32,
    pub axis_y_rot: i32,
    pub axis_z_rot: i32,
    pub slider: i32,
    pub dial: i32,
    pub wheel: i32,
    pub axis_vx: i32,
    pub axis_vy: i32,
    pub axis_vz: i32,
    pub axis_vbrx: i32,
    pub axis_vbry: i32,
    pub axis_vbrz: i32,
    /// Buttons 1..32, bit 0 is button 1.
    pub buttons: i32,
    /// Hats 1 and 2: low half-word is the first hat.
    pub hats: u32,
    pub hats_ex1: u32,
    pub hats_ex2: u32,
    pub hats_ex3: u32,
    /// Buttons 33..64.
    pub buttons_ex1: i32,
    /// Buttons 65..96.
    pub buttons_ex2: i32,
    /// Buttons 97..128.
    pub buttons_ex3: i32,
}

impl JoystickPosition {
    /// A buffer for `id` in the neutral state.
    pub fn neutral(id: DeviceId) -> Self {
        let mut pos = Self { device: id.get(), ..Self::default() };
        pos.reset();
        pos
    }

    /// Axes centered, buttons released, hats off. The device byte is kept.
    pub fn reset(&mut self) {
        for field in AxisField::ALL {
            *self.axis_mut(field) = AXIS_CENTER;
        }
        self.buttons = 0;
        self.buttons_ex1 = 0;
        self.buttons_ex2 = 0;
        self.buttons_ex3 = 0;
        self.hats = HATS_NEUTRAL;
        self.hats_ex1 = HATS_NEUTRAL;
        self.hats_ex2 = HATS_NEUTRAL;
        self.hats_ex3 = HATS_NEUTRAL;
    }

    pub fn axis(&self, field: AxisField) -> i32 {
        match field {
            AxisField::Throttle => self.throttle,
            AxisField::Rudder => self.rudder,
            AxisField::Aileron => self.aileron,
            AxisField::X => self.axis_x,
            AxisField::Y => self.axis_y,
            AxisField::Z => self.axis_z,
            AxisField::XRot => self.axis_x_rot,
            AxisField::YRot => self.axis_y_rot,
            AxisField::ZRot => self.axis_z_rot,
            AxisField::Slider => self.slider,
            AxisField::Dial => self.dial,
            AxisField::Wheel => self.wheel,
            AxisField::VX => self.axis_vx,
            AxisField::VY => self.axis_vy,
            AxisField::VZ => self.axis_vz,
            AxisField::VBrakeX => self.axis_vbrx,
            AxisField::VBrakeY => self.axis_vbry,
            AxisField::VBrakeZ => self.axis_vbrz,
        }
    }

    pub fn axis_mut(&mut self, field: AxisField) -> &mut i32 {
        match field {
            AxisField::Throttle => &mut self.throttle,
            AxisField::Rudder => &mut self.rudder,
            AxisField::Aileron => &mut self.aileron,
            AxisField::X => &mut self.axis_x,
            AxisField::Y => &mut self.axis_y,
            AxisField::Z => &mut self.axis_z,
            AxisField::XRot => &mut self.axis_x_rot,
            AxisField::YRot => &mut self.axis_y_rot,
            AxisField::ZRot => &mut self.axis_z_rot,
            AxisField::Slider => &mut self.slider,
            AxisField::Dial => &mut self.dial,
            AxisField::Wheel => &mut self.wheel,
            AxisField::VX => &mut self.axis_vx,
            AxisField::VY => &mut self.axis_vy,
            AxisField::VZ => &mut self.axis_vz,
            AxisField::VBrakeX => &mut self.axis_vbrx,
            AxisField::VBrakeY => &mut self.axis_vbry,
            AxisField::VBrakeZ => &mut self.axis_vbrz,
        }
    }

    /// Button word `0..BUTTON_WORDS`; word 0 holds buttons 1..32.
    pub fn button_word(&self, word: usize) -> Option<i32> {
        match word {
            0 => Some(self.buttons),
            1 => Some(self.buttons_ex1),
            2 => Some(self.buttons_ex2),
            3 => Some(self.buttons_ex3),
            _ => None,
        }
    }

    pub fn button_word_mut(&mut self, word: usize) -> Option<&mut i32> {
        match word {
            0 => Some(&mut self.buttons),
            1 => Some(&mut self.buttons_ex1),
            2 => Some(&mut self.buttons_ex2),
            3 => Some(&mut self.buttons_ex3),
            _ => None,
        }
    }

    /// Hat word `0..HAT_WORDS`, two hats per word.
    pub fn hat_word(&self, word: usize) -> Option<u32> {
        match word {
            0 => Some(self.hats),
            1 => Some(self.hats_ex1),
            2 => Some(self.hats_ex2),
            3 => Some(self.hats_ex3),
            _ => None,
        }
    }

    pub fn hat_word_mut(&mut self, word: usize) -> Option<&mut u32> {
        match word {
            0 => Some(&mut self.hats),
            1 => Some(&mut self.hats_ex1),
            2 => Some(&mut self.hats_ex2),
            3 => Some(&mut self.hats_ex3),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_position() {
        let id = DeviceId::new(3).unwrap();
        let pos = JoystickPosition::neutral(id);
        assert_eq!(pos.device, 3);
        for field in AxisField::ALL {
            assert_eq!(pos.axis(field), AXIS_CENTER, "{field:?}");
        }
        for w in 0..BUTTON_WORDS {
            assert_eq!(pos.button_word(w), Some(0));
        }
        for w in 0..HAT_WORDS {
            assert_eq!(pos.hat_word(w), Some(HATS_NEUTRAL));
        }
        assert_eq!(pos.button_word(BUTTON_WORDS), None);
        assert_eq!(pos.hat_word(HAT_WORDS), None);
    }

    #[test]
    fn axis_usages_and_fields() {
        assert_eq!(AxisName::X.usage(), 0x30);
        assert_eq!(AxisName::Rz.usage(), 0x35);
        assert_eq!(AxisName::Slider1.usage(), 0x37);
        assert_eq!(AxisName::Slider0.field(), AxisField::Slider);
        assert_eq!(AxisName::Slider1.field(), AxisField::Dial);
        assert_eq!(AxisName::Ry.flag(), AxisSet::RY);
    }

    #[test]
    fn axis_names_parse() {
        assert_eq!("X".parse::<AxisName>(), Ok(AxisName::X));
        assert_eq!("zrot".parse::<AxisName>(), Ok(AxisName::Rz));
        assert_eq!("dial".parse::<AxisName>(), Ok(AxisName::Slider1));
        assert_eq!(
            "wheel".parse::<AxisName>(),
            Err(ProtocolError::UnknownName("wheel".into()))
        );
        for axis in AxisName::ALL {
            assert_eq!(axis.as_str().parse::<AxisName>(), Ok(axis));
        }
    }

    #[test]
    fn hat_states() {
        assert_eq!("up".parse::<HatState>(), Ok(HatState::North));
        assert_eq!("W".parse::<HatState>(), Ok(HatState::West));
        assert!("northeast".parse::<HatState>().is_err());
        assert_eq!(HatState::Off.raw(), -1);
        assert_eq!(HatState::from_nibble(0xFFF2), HatState::South);
        assert_eq!(HatState::from_nibble(0xF), HatState::Off);
    }

    #[test]
    fn status_codes() {
        assert_eq!(DeviceStatus::from_raw(0), DeviceStatus::Owned);
        assert_eq!(DeviceStatus::from_raw(1), DeviceStatus::Free);
        assert_eq!(DeviceStatus::from_raw(2), DeviceStatus::Busy);
        assert_eq!(DeviceStatus::from_raw(3), DeviceStatus::Missing);
        assert_eq!(DeviceStatus::from_raw(4), DeviceStatus::Unknown);
        assert_eq!(DeviceStatus::from_raw(-7), DeviceStatus::Unknown);
    }

    #[test]
    fn device_id_is_one_based() {
        assert!(DeviceId::new(0).is_none());
        assert_eq!(DeviceId::try_from(0), Err(ProtocolError::ZeroDeviceId));
        assert_eq!(DeviceId::try_from(16).map(u8::from), Ok(16));
    }
}
