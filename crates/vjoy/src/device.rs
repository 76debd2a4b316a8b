use crate::axis::{Axis, AxisInfo};
use crate::button::Button;
use crate::error::{Error, Result};
use crate::hat::{Hat, HatSlot, assign_hats};
use crate::state::StateBuffer;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use vjoy_driver::Driver;
use vjoy_protocol::{
    AxisName, AxisSet, DeviceId, DeviceStatus, JoystickPosition, MAX_BUTTONS, MAX_HATS,
};

/// Controls a device exposes, read once when it is acquired.
///
/// A failed driver query is indistinguishable from an absent control: both
/// discover as `exists == false` (or a zero count).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub axes: [AxisInfo; AxisName::COUNT],
    pub buttons: usize,
    pub discrete_hats: usize,
    pub continuous_hats: usize,
    pub hats: Vec<HatSlot>,
}

impl Capabilities {
    pub fn discover<D: Driver + ?Sized>(driver: &D, id: DeviceId) -> Self {
        let axes = AxisName::ALL.map(|name| {
            let usage = name.usage();
            if !driver.axis_exists(id, usage) {
                return AxisInfo::absent(name);
            }
            let bounds = driver.axis_min(id, usage).zip(driver.axis_max(id, usage));
            AxisInfo { name, exists: true, bounds }
        });

        let count = |n: i32| usize::try_from(n).unwrap_or(0);
        let reported_buttons = count(driver.button_count(id));
        let discrete_hats = count(driver.discrete_hat_count(id));
        let continuous_hats = count(driver.continuous_hat_count(id));

        if reported_buttons > MAX_BUTTONS {
            warn!(%id, reported_buttons, "device reports more buttons than the report holds");
        }
        if discrete_hats + continuous_hats > MAX_HATS {
            warn!(
                %id,
                discrete_hats, continuous_hats, "device reports more hats than the report holds"
            );
        }

        let caps = Self {
            axes,
            buttons: reported_buttons.min(MAX_BUTTONS),
            discrete_hats,
            continuous_hats,
            hats: assign_hats(discrete_hats, continuous_hats),
        };
        debug!(
            %id,
            axes = ?caps.axis_set(),
            buttons = caps.buttons,
            discrete_hats,
            continuous_hats,
            "discovered"
        );
        caps
    }

    pub fn axis_set(&self) -> AxisSet {
        self.axes.iter().filter(|a| a.exists).fold(AxisSet::empty(), |set, a| set | a.name.flag())
    }

    pub fn axis(&self, name: AxisName) -> &AxisInfo {
        &self.axes[name.index()]
    }
}

/// An acquired vJoy device.
///
/// Owns the only state buffer submitted for its id. Control accessors borrow
/// the device mutably, so mutate-then-[`update`](Device::update) sequences
/// from several threads need an external lock. Dropping an owned device
/// relinquishes it.
pub struct Device<D: Driver + ?Sized> {
    driver: Arc<D>,
    id: DeviceId,
    caps: Capabilities,
    buf: StateBuffer,
    owned: bool,
}

impl<D: Driver + ?Sized> Device<D> {
    #[instrument(level = "info", skip_all, fields(%id))]
    pub(crate) fn acquire(driver: Arc<D>, id: DeviceId) -> Result<Self> {
        let status = driver.device_status(id);
        let refusal = match status {
            DeviceStatus::Owned => return Err(Error::AlreadyOwned(id)),
            // A free device the driver still refuses has no status to blame.
            DeviceStatus::Free => Error::DriverUnknownError(id),
            DeviceStatus::Busy => Error::Busy(id),
            DeviceStatus::Missing => Error::Missing(id),
            DeviceStatus::Unknown => Error::DriverUnknownError(id),
        };

        // The acquire call decides, whatever the status said.
        if !driver.acquire(id) {
            warn!(?status, "acquire refused");
            return Err(refusal);
        }
        if status != DeviceStatus::Free {
            info!(?status, "acquired despite status");
        }

        let caps = Capabilities::discover(&*driver, id);
        let mut device = Device { driver, id, caps, buf: StateBuffer::new(id), owned: true };
        device.reset();
        device.update()?;
        info!("device acquired");
        Ok(device)
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// The buffer the next [`update`](Device::update) submits.
    pub fn state(&self) -> &JoystickPosition {
        self.buf.position()
    }

    pub fn axis(&mut self, name: AxisName) -> Axis<'_> {
        Axis::new(&self.caps.axes[name.index()], &mut self.buf)
    }

    /// Look an axis up by name (`x`, `rz`, `slider0`, ...).
    pub fn axis_by_name(&mut self, name: &str) -> Result<Axis<'_>> {
        let name: AxisName = name.parse()?;
        Ok(self.axis(name))
    }

    /// Button `index`, 0-based. Indices past the discovered count are
    /// accepted and discard their writes.
    pub fn button(&mut self, index: usize) -> Button<'_> {
        Button::new(index, self.caps.buttons, &mut self.buf)
    }

    /// Hat `index`, 0-based: discrete hats first, then continuous ones.
    pub fn hat(&mut self, index: usize) -> Hat<'_> {
        Hat::new(index, self.caps.hats.get(index).copied(), &mut self.buf)
    }

    pub fn button_count(&self) -> usize {
        self.caps.buttons
    }

    pub fn hat_count(&self) -> usize {
        self.caps.hats.len()
    }

    /// Axes centered, buttons released, hats neutral. Local only; submit
    /// with [`update`](Device::update).
    pub fn reset(&mut self) {
        self.buf.reset();
    }

    /// Submit the whole buffer in one driver call.
    #[instrument(level = "debug", skip(self), fields(id = %self.id))]
    pub fn update(&self) -> Result<()> {
        if self.driver.submit(self.id, self.buf.position()) {
            Ok(())
        } else {
            Err(Error::UpdateFailed(self.id))
        }
    }

    /// Driver-side `ResetVJD`; the local buffer is reset to match.
    pub fn reset_driver(&mut self) -> Result<()> {
        if !self.driver.reset_device(self.id) {
            return Err(Error::ResetFailed { what: "device" });
        }
        self.buf.reset();
        Ok(())
    }

    /// Driver-side `ResetButtons`; local buttons are released to match.
    pub fn reset_buttons(&mut self) -> Result<()> {
        if !self.driver.reset_buttons(self.id) {
            return Err(Error::ResetFailed { what: "button" });
        }
        self.buf.reset_buttons();
        Ok(())
    }

    /// Driver-side `ResetPovs`; local hats are set neutral to match.
    pub fn reset_hats(&mut self) -> Result<()> {
        if !self.driver.reset_hats(self.id) {
            return Err(Error::ResetFailed { what: "hat" });
        }
        self.buf.reset_hats();
        Ok(())
    }

    #[instrument(level = "info", skip(self), fields(id = %self.id))]
    pub fn relinquish(mut self) -> Result<()> {
        self.owned = false;
        if self.driver.relinquish(self.id) {
            info!("device relinquished");
            Ok(())
        } else {
            Err(Error::RelinquishFailed(self.id))
        }
    }
}

impl<D: Driver + ?Sized> Drop for Device<D> {
    fn drop(&mut self) {
        if self.owned && !self.driver.relinquish(self.id) {
            warn!(id = %self.id, "relinquish on drop failed");
        }
    }
}
