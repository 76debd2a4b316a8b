use super::Driver;
use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tracing::debug;
use vjoy_protocol::{
    AXIS_MAX, AXIS_MIN, AxisName, AxisSet, DeviceId, DeviceStatus, JoystickPosition,
    JoystickReport, TESTED_DRIVER_VERSION,
};

/// Configuration of one simulated device slot.
#[derive(Clone, Debug)]
pub struct MockDevice {
    pub status: DeviceStatus,
    pub axes: AxisSet,
    pub axis_range: (i32, i32),
    pub buttons: i32,
    pub discrete_hats: i32,
    pub continuous_hats: i32,
    /// Forced result of `AcquireVJD`; `None` grants only free devices.
    pub acquire_result: Option<bool>,
    pub accept_updates: bool,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self {
            status: DeviceStatus::Free,
            axes: AxisSet::X | AxisSet::Y | AxisSet::Z,
            axis_range: (AXIS_MIN, AXIS_MAX),
            buttons: 8,
            discrete_hats: 1,
            continuous_hats: 0,
            acquire_result: None,
            accept_updates: true,
        }
    }
}

/// In-memory driver. Records every submitted snapshot as the wire image the
/// real driver would parse.
pub struct Mock {
    enabled: AtomicBool,
    devices: DashMap<DeviceId, MockDevice>,
    submitted: DashMap<DeviceId, Vec<JoystickReport>>,
    acquires: AtomicU64,
    button_queries: AtomicU64,
    driver_resets: AtomicU64,
}

impl Mock {
    pub fn new() -> Arc<Self> {
        Self::with_devices([])
    }

    pub fn with_devices(devices: impl IntoIterator<Item = (DeviceId, MockDevice)>) -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(true),
            devices: devices.into_iter().collect(),
            submitted: DashMap::new(),
            acquires: AtomicU64::new(0),
            button_queries: AtomicU64::new(0),
            driver_resets: AtomicU64::new(0),
        })
    }

    pub fn insert(&self, id: DeviceId, device: MockDevice) {
        self.devices.insert(id, device);
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_status(&self, id: DeviceId, status: DeviceStatus) {
        if let Some(mut d) = self.devices.get_mut(&id) {
            d.status = status;
        }
    }

    pub fn set_accept_updates(&self, id: DeviceId, accept: bool) {
        if let Some(mut d) = self.devices.get_mut(&id) {
            d.accept_updates = accept;
        }
    }

    pub fn submissions(&self, id: DeviceId) -> Vec<JoystickReport> {
        self.submitted.get(&id).map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last_position(&self, id: DeviceId) -> Option<JoystickPosition> {
        self.submitted.get(&id).and_then(|r| r.last().map(JoystickReport::position))
    }

    /// Number of `AcquireVJD` calls so far.
    pub fn acquire_calls(&self) -> u64 {
        self.acquires.load(Ordering::SeqCst)
    }

    /// Number of button-count queries, one per capability discovery.
    pub fn discovery_calls(&self) -> u64 {
        self.button_queries.load(Ordering::SeqCst)
    }

    pub fn driver_resets(&self) -> u64 {
        self.driver_resets.load(Ordering::SeqCst)
    }

    fn is_owned(&self, id: DeviceId) -> bool {
        self.devices.get(&id).is_some_and(|d| d.status == DeviceStatus::Owned)
    }

    fn axis_range(&self, id: DeviceId, usage: u32) -> Option<(i32, i32)> {
        let d = self.devices.get(&id)?;
        AxisName::ALL
            .into_iter()
            .find(|a| a.usage() == usage && d.axes.contains(a.flag()))
            .map(|_| d.axis_range)
    }
}

impl Driver for Mock {
    fn version(&self) -> u16 {
        TESTED_DRIVER_VERSION
    }

    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn product_string(&self) -> Option<String> {
        Some("vJoy - Virtual Joystick (mock)".to_owned())
    }

    fn manufacturer_string(&self) -> Option<String> {
        Some("vjoy-driver".to_owned())
    }

    fn serial_string(&self) -> Option<String> {
        Some(format!("{:x}", TESTED_DRIVER_VERSION))
    }

    fn device_status(&self, id: DeviceId) -> DeviceStatus {
        self.devices.get(&id).map(|d| d.status).unwrap_or(DeviceStatus::Missing)
    }

    fn acquire(&self, id: DeviceId) -> bool {
        self.acquires.fetch_add(1, Ordering::SeqCst);
        let Some(mut d) = self.devices.get_mut(&id) else {
            return false;
        };
        let granted = d.acquire_result.unwrap_or(d.status == DeviceStatus::Free);
        if granted {
            d.status = DeviceStatus::Owned;
        }
        debug!(%id, granted, "mock acquire");
        granted
    }

    fn relinquish(&self, id: DeviceId) -> bool {
        let Some(mut d) = self.devices.get_mut(&id) else {
            return false;
        };
        if d.status != DeviceStatus::Owned {
            return false;
        }
        d.status = DeviceStatus::Free;
        true
    }

    fn button_count(&self, id: DeviceId) -> i32 {
        self.button_queries.fetch_add(1, Ordering::SeqCst);
        self.devices.get(&id).map(|d| d.buttons).unwrap_or(0)
    }

    fn discrete_hat_count(&self, id: DeviceId) -> i32 {
        self.devices.get(&id).map(|d| d.discrete_hats).unwrap_or(0)
    }

    fn continuous_hat_count(&self, id: DeviceId) -> i32 {
        self.devices.get(&id).map(|d| d.continuous_hats).unwrap_or(0)
    }

    fn axis_exists(&self, id: DeviceId, usage: u32) -> bool {
        self.axis_range(id, usage).is_some()
    }

    fn axis_min(&self, id: DeviceId, usage: u32) -> Option<i32> {
        self.axis_range(id, usage).map(|r| r.0)
    }

    fn axis_max(&self, id: DeviceId, usage: u32) -> Option<i32> {
        self.axis_range(id, usage).map(|r| r.1)
    }

    fn submit(&self, id: DeviceId, state: &JoystickPosition) -> bool {
        let accepted = self
            .devices
            .get(&id)
            .is_some_and(|d| d.status == DeviceStatus::Owned && d.accept_updates);
        if accepted {
            self.submitted.entry(id).or_default().push(JoystickReport::from(state));
        }
        accepted
    }

    fn reset_device(&self, id: DeviceId) -> bool {
        self.driver_resets.fetch_add(1, Ordering::SeqCst);
        self.is_owned(id)
    }

    fn reset_all(&self) -> bool {
        self.driver_resets.fetch_add(1, Ordering::SeqCst);
        self.enabled()
    }

    fn reset_buttons(&self, id: DeviceId) -> bool {
        self.driver_resets.fetch_add(1, Ordering::SeqCst);
        self.is_owned(id)
    }

    fn reset_hats(&self, id: DeviceId) -> bool {
        self.driver_resets.fetch_add(1, Ordering::SeqCst);
        self.is_owned(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> DeviceId {
        DeviceId::new(n).unwrap()
    }

    #[test]
    fn unknown_slot_is_missing() {
        let m = Mock::new();
        assert_eq!(m.device_status(id(4)), DeviceStatus::Missing);
        assert!(!m.acquire(id(4)));
        assert_eq!(m.acquire_calls(), 1);
    }

    #[test]
    fn acquire_and_relinquish_flip_status() {
        let m = Mock::with_devices([(id(1), MockDevice::default())]);
        assert!(m.acquire(id(1)));
        assert_eq!(m.device_status(id(1)), DeviceStatus::Owned);
        assert!(m.relinquish(id(1)));
        assert_eq!(m.device_status(id(1)), DeviceStatus::Free);
        assert!(!m.relinquish(id(1)));
    }

    #[test]
    fn submit_requires_ownership() {
        let m = Mock::with_devices([(id(1), MockDevice::default())]);
        let pos = JoystickPosition::neutral(id(1));
        assert!(!m.submit(id(1), &pos));
        assert!(m.acquire(id(1)));
        assert!(m.submit(id(1), &pos));
        assert_eq!(m.submissions(id(1)).len(), 1);
        assert_eq!(m.last_position(id(1)), Some(pos));
    }

    #[test]
    fn axis_queries_follow_config() {
        let dev = MockDevice { axes: AxisSet::RX, axis_range: (0, 0x7FFF), ..Default::default() };
        let m = Mock::with_devices([(id(2), dev)]);
        assert!(m.axis_exists(id(2), AxisName::Rx.usage()));
        assert!(!m.axis_exists(id(2), AxisName::X.usage()));
        assert_eq!(m.axis_max(id(2), AxisName::Rx.usage()), Some(0x7FFF));
        assert_eq!(m.axis_min(id(2), AxisName::X.usage()), None);
    }
}
