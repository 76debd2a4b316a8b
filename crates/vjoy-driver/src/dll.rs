use super::{Driver, DriverError, once::load_once};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use vjoy_protocol::{DeviceId, DeviceStatus, JoystickPosition, TESTED_DRIVER_VERSION};
use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};
use windows::core::{PCSTR, PCWSTR};

pub const DLL_NAME: &str = "vJoyInterface.dll";

static LOADED: OnceLock<Arc<Dll>> = OnceLock::new();

type FnVersion = unsafe extern "C" fn() -> i16;
type FnEnabled = unsafe extern "C" fn() -> i32;
type FnWide = unsafe extern "C" fn() -> *const u16;
type FnId = unsafe extern "C" fn(u32) -> i32;
type FnIdVoid = unsafe extern "C" fn(u32);
type FnVoid = unsafe extern "C" fn();
type FnAxis = unsafe extern "C" fn(u32, u32) -> i32;
type FnAxisRange = unsafe extern "C" fn(u32, u32, *mut i32) -> i32;
type FnUpdate = unsafe extern "C" fn(u32, *const JoystickPosition) -> i32;

/// Entry points of `vJoyInterface.dll`, resolved once at load.
pub struct Dll {
    path: String,
    get_version: FnVersion,
    enabled: FnEnabled,
    product: FnWide,
    manufacturer: FnWide,
    serial: FnWide,
    button_number: FnId,
    disc_pov_number: FnId,
    cont_pov_number: FnId,
    axis_exist: FnAxis,
    axis_min: FnAxisRange,
    axis_max: FnAxisRange,
    acquire: FnId,
    relinquish: FnIdVoid,
    update: FnUpdate,
    status: FnId,
    reset: FnId,
    reset_all: FnVoid,
    reset_buttons: FnId,
    reset_povs: FnId,
}

impl Dll {
    /// Load `vJoyInterface.dll` from the default search path.
    pub fn load() -> Result<Arc<Self>, DriverError> {
        Self::load_from(DLL_NAME)
    }

    /// Load the interface library once per process. Later calls return the
    /// cached handle whatever path they name; a failed load can be retried.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Arc<Self>, DriverError> {
        load_once(&LOADED, || Self::open(path.as_ref()), |dll| {
            let version = dll.version();
            info!(
                path = %dll.path,
                version = format_args!("{version:#06x}"),
                "vJoy interface loaded"
            );
            if version != TESTED_DRIVER_VERSION {
                warn!(
                    version = format_args!("{version:#06x}"),
                    tested = format_args!("{TESTED_DRIVER_VERSION:#06x}"),
                    "untested vJoy driver version"
                );
            }
        })
    }

    fn open(path: &Path) -> Result<Self, DriverError> {
        let path = path.to_string_lossy().into_owned();
        let wide: Vec<u16> = path.encode_utf16().chain(std::iter::once(0)).collect();
        let module = unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) }
            .map_err(|e| DriverError::LoadFailed { path: path.clone(), reason: e.to_string() })?;
        if module.is_invalid() {
            return Err(DriverError::LoadFailed { path, reason: "invalid module handle".into() });
        }
        debug!(%path, "resolving vJoy entry points");

        // The module is never freed: the table below lives for the process.
        unsafe {
            Ok(Self {
                get_version: symbol(module, &path, "GetvJoyVersion\0")?,
                enabled: symbol(module, &path, "vJoyEnabled\0")?,
                product: symbol(module, &path, "GetvJoyProductString\0")?,
                manufacturer: symbol(module, &path, "GetvJoyManufacturerString\0")?,
                serial: symbol(module, &path, "GetvJoySerialNumberString\0")?,
                button_number: symbol(module, &path, "GetVJDButtonNumber\0")?,
                disc_pov_number: symbol(module, &path, "GetVJDDiscPovNumber\0")?,
                cont_pov_number: symbol(module, &path, "GetVJDContPovNumber\0")?,
                axis_exist: symbol(module, &path, "GetVJDAxisExist\0")?,
                axis_min: symbol(module, &path, "GetVJDAxisMin\0")?,
                axis_max: symbol(module, &path, "GetVJDAxisMax\0")?,
                acquire: symbol(module, &path, "AcquireVJD\0")?,
                relinquish: symbol(module, &path, "RelinquishVJD\0")?,
                update: symbol(module, &path, "UpdateVJD\0")?,
                status: symbol(module, &path, "GetVJDStatus\0")?,
                reset: symbol(module, &path, "ResetVJD\0")?,
                reset_all: symbol(module, &path, "ResetAll\0")?,
                reset_buttons: symbol(module, &path, "ResetButtons\0")?,
                reset_povs: symbol(module, &path, "ResetPovs\0")?,
                path,
            })
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// # Safety
/// `F` must be the `extern "C"` signature the library exports under `name`,
/// and `name` must be NUL-terminated.
unsafe fn symbol<F: Copy>(
    module: HMODULE,
    path: &str,
    name: &'static str,
) -> Result<F, DriverError> {
    let proc = unsafe { GetProcAddress(module, PCSTR(name.as_ptr())) };
    match proc {
        Some(f) => Ok(unsafe { std::mem::transmute_copy(&f) }),
        None => Err(DriverError::MissingSymbol {
            path: path.to_owned(),
            symbol: name.trim_end_matches('\0'),
        }),
    }
}

/// Decode a NUL-terminated UTF-16 string owned by the driver.
fn wide_string(p: *const u16) -> Option<String> {
    if p.is_null() {
        return None;
    }
    unsafe {
        let len = (0..).take_while(|&i| *p.add(i) != 0).count();
        String::from_utf16(std::slice::from_raw_parts(p, len)).ok()
    }
}

impl Driver for Dll {
    fn version(&self) -> u16 {
        unsafe { (self.get_version)() as u16 }
    }

    fn enabled(&self) -> bool {
        unsafe { (self.enabled)() != 0 }
    }

    fn product_string(&self) -> Option<String> {
        wide_string(unsafe { (self.product)() })
    }

    fn manufacturer_string(&self) -> Option<String> {
        wide_string(unsafe { (self.manufacturer)() })
    }

    fn serial_string(&self) -> Option<String> {
        wide_string(unsafe { (self.serial)() })
    }

    fn device_status(&self, id: DeviceId) -> DeviceStatus {
        DeviceStatus::from_raw(unsafe { (self.status)(id.raw()) })
    }

    fn acquire(&self, id: DeviceId) -> bool {
        unsafe { (self.acquire)(id.raw()) != 0 }
    }

    /// `RelinquishVJD` returns nothing; success is read back from the status.
    fn relinquish(&self, id: DeviceId) -> bool {
        unsafe { (self.relinquish)(id.raw()) };
        self.device_status(id) != DeviceStatus::Owned
    }

    fn button_count(&self, id: DeviceId) -> i32 {
        unsafe { (self.button_number)(id.raw()) }
    }

    fn discrete_hat_count(&self, id: DeviceId) -> i32 {
        unsafe { (self.disc_pov_number)(id.raw()) }
    }

    fn continuous_hat_count(&self, id: DeviceId) -> i32 {
        unsafe { (self.cont_pov_number)(id.raw()) }
    }

    fn axis_exists(&self, id: DeviceId, usage: u32) -> bool {
        unsafe { (self.axis_exist)(id.raw(), usage) != 0 }
    }

    fn axis_min(&self, id: DeviceId, usage: u32) -> Option<i32> {
        let mut v = 0i32;
        let ok = unsafe { (self.axis_min)(id.raw(), usage, &mut v) != 0 };
        ok.then_some(v)
    }

    fn axis_max(&self, id: DeviceId, usage: u32) -> Option<i32> {
        let mut v = 0i32;
        let ok = unsafe { (self.axis_max)(id.raw(), usage, &mut v) != 0 };
        ok.then_some(v)
    }

    fn submit(&self, id: DeviceId, state: &JoystickPosition) -> bool {
        unsafe { (self.update)(id.raw(), state) != 0 }
    }

    fn reset_device(&self, id: DeviceId) -> bool {
        unsafe { (self.reset)(id.raw()) != 0 }
    }

    /// `ResetAll` returns nothing.
    fn reset_all(&self) -> bool {
        unsafe { (self.reset_all)() };
        true
    }

    fn reset_buttons(&self, id: DeviceId) -> bool {
        unsafe { (self.reset_buttons)(id.raw()) != 0 }
    }

    fn reset_hats(&self, id: DeviceId) -> bool {
        unsafe { (self.reset_povs)(id.raw()) != 0 }
    }
}
