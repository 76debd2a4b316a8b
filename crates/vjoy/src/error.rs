use thiserror::Error;
use vjoy_driver::DriverError;
use vjoy_protocol::{DeviceId, ProtocolError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("vJoy device {0} is already owned by this process")]
    AlreadyOwned(DeviceId),

    #[error("vJoy device {0} is owned by another process")]
    Busy(DeviceId),

    #[error("vJoy device {0} is missing: not configured, or the driver is down")]
    Missing(DeviceId),

    #[error("unknown vJoy error on device {0}")]
    DriverUnknownError(DeviceId),

    #[error("{what} reset failed")]
    ResetFailed { what: &'static str },

    #[error("vJoy device {0} rejected the state update")]
    UpdateFailed(DeviceId),

    #[error("failed to relinquish vJoy device {0}")]
    RelinquishFailed(DeviceId),

    #[error("unknown control name: {0:?}")]
    UnknownControlName(String),

    #[error("vJoy is installed but not enabled")]
    DriverDisabled,

    #[error(transparent)]
    DriverUnavailable(#[from] DriverError),

    #[error(transparent)]
    Protocol(ProtocolError),
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::UnknownName(name) => Error::UnknownControlName(name),
            other => Error::Protocol(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
