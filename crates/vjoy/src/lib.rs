#![deny(warnings)]
//! Client for vJoy virtual joysticks.
//!
//! Acquire a device by report id, set its axes, buttons and hats, then
//! [`Device::update`] submits the whole position in one driver call:
//!
//! ```no_run
//! # #[cfg(windows)]
//! # fn main() -> vjoy::Result<()> {
//! use vjoy::{AxisName, DeviceId, HatState};
//!
//! let vjoy = vjoy::connect()?;
//! let mut dev = vjoy.acquire(DeviceId::try_from(1)?)?;
//! dev.axis(AxisName::X).set_normalized(-0.5);
//! dev.button(0).press();
//! dev.hat(0).set_discrete(HatState::East);
//! dev.update()?;
//! dev.relinquish()
//! # }
//! # #[cfg(not(windows))]
//! # fn main() {}
//! ```

pub mod axis;
pub mod button;
pub mod device;
pub mod error;
pub mod hat;
pub mod state;

use std::sync::Arc;
use tracing::instrument;

pub use axis::{Axis, AxisInfo};
pub use button::{Button, button_slot};
pub use device::{Capabilities, Device};
pub use error::{Error, Result};
pub use hat::{Hat, HatSlot};
pub use state::StateBuffer;
pub use vjoy_driver::{Driver, DriverError, Mock, MockDevice};
pub use vjoy_protocol::{AxisName, AxisSet, DeviceId, DeviceStatus, HatState, JoystickPosition};

#[cfg(windows)]
pub use vjoy_driver::Dll;

/// Handle on a loaded driver. Cheap to clone.
pub struct Vjoy<D: Driver + ?Sized> {
    driver: Arc<D>,
}

impl<D: Driver + ?Sized> Clone for Vjoy<D> {
    fn clone(&self) -> Self {
        Self { driver: self.driver.clone() }
    }
}

/// Load `vJoyInterface.dll` (once per process) and check the driver is
/// enabled.
#[cfg(windows)]
pub fn connect() -> Result<Vjoy<Dll>> {
    connect_with(vjoy_driver::dll::DLL_NAME)
}

#[cfg(windows)]
pub fn connect_with(path: impl AsRef<std::path::Path>) -> Result<Vjoy<Dll>> {
    let vjoy = Vjoy::new(Dll::load_from(path)?);
    if !vjoy.is_available() {
        return Err(Error::DriverDisabled);
    }
    Ok(vjoy)
}

impl<D: Driver + ?Sized> Vjoy<D> {
    pub fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Whether the driver is installed and enabled.
    pub fn is_available(&self) -> bool {
        self.driver.enabled()
    }

    pub fn version(&self) -> u16 {
        self.driver.version()
    }

    pub fn product(&self) -> Option<String> {
        self.driver.product_string()
    }

    pub fn manufacturer(&self) -> Option<String> {
        self.driver.manufacturer_string()
    }

    pub fn serial_number(&self) -> Option<String> {
        self.driver.serial_string()
    }

    pub fn status(&self, id: DeviceId) -> DeviceStatus {
        self.driver.device_status(id)
    }

    /// Reset every device the driver knows of.
    #[instrument(level = "info", skip(self))]
    pub fn reset_all(&self) -> Result<()> {
        if self.driver.reset_all() { Ok(()) } else { Err(Error::ResetFailed { what: "global" }) }
    }

    /// Take ownership of device `id`, discover its controls and push the
    /// neutral state.
    pub fn acquire(&self, id: DeviceId) -> Result<Device<D>> {
        Device::acquire(self.driver.clone(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_metadata_passes_through() {
        let mock = Mock::new();
        let vjoy = Vjoy::new(mock.clone());
        assert!(vjoy.is_available());
        assert_eq!(vjoy.version(), vjoy_protocol::TESTED_DRIVER_VERSION);
        assert!(vjoy.product().is_some());
        mock.set_enabled(false);
        assert!(!vjoy.clone().is_available());
        assert!(matches!(vjoy.reset_all(), Err(Error::ResetFailed { what: "global" })));
    }

    #[test]
    fn works_behind_a_trait_object() {
        let id = DeviceId::new(2).unwrap();
        let driver: Arc<dyn Driver> = Mock::with_devices([(id, MockDevice::default())]);
        let vjoy = Vjoy::new(driver);
        assert_eq!(vjoy.status(id), DeviceStatus::Free);
        let dev = vjoy.acquire(id).unwrap();
        assert_eq!(vjoy.status(id), DeviceStatus::Owned);
        dev.relinquish().unwrap();
    }
}
