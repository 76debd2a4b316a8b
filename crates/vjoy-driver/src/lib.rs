#![deny(warnings)]
//! Backends for the vJoy driver interface.
//!
//! [`Driver`] is the full surface the client consumes. Every call blocks until
//! the driver answers; nothing here is async or buffered.

pub mod mock;
pub mod once;

#[cfg(windows)]
pub mod dll;

use thiserror::Error;
use vjoy_protocol::{DeviceId, DeviceStatus, JoystickPosition};

pub use mock::{Mock, MockDevice};
pub use once::load_once;

#[cfg(windows)]
pub use dll::Dll;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to load {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("{path} does not export {symbol}")]
    MissingSymbol { path: String, symbol: &'static str },
}

pub trait Driver: Send + Sync + 'static {
    fn version(&self) -> u16;
    fn enabled(&self) -> bool;
    fn product_string(&self) -> Option<String>;
    fn manufacturer_string(&self) -> Option<String>;
    fn serial_string(&self) -> Option<String>;

    fn device_status(&self, id: DeviceId) -> DeviceStatus;
    fn acquire(&self, id: DeviceId) -> bool;
    fn relinquish(&self, id: DeviceId) -> bool;

    fn button_count(&self, id: DeviceId) -> i32;
    fn discrete_hat_count(&self, id: DeviceId) -> i32;
    fn continuous_hat_count(&self, id: DeviceId) -> i32;
    fn axis_exists(&self, id: DeviceId, usage: u32) -> bool;
    fn axis_min(&self, id: DeviceId, usage: u32) -> Option<i32>;
    fn axis_max(&self, id: DeviceId, usage: u32) -> Option<i32>;

    /// Submit a whole position snapshot; the driver takes all of it or none.
    fn submit(&self, id: DeviceId, state: &JoystickPosition) -> bool;

    fn reset_device(&self, id: DeviceId) -> bool;
    fn reset_all(&self) -> bool;
    fn reset_buttons(&self, id: DeviceId) -> bool;
    fn reset_hats(&self, id: DeviceId) -> bool;
}
