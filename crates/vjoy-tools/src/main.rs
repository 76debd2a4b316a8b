#![deny(warnings)]
use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vjoy::{AxisName, AxisSet, DeviceId, Driver, HatState, Mock, MockDevice, Vjoy};

#[derive(Parser)]
#[command(name = "vjoyctl", about = "vJoy virtual joystick tools")]
struct Cli {
    /// Use an in-memory driver with one device at id 1.
    #[arg(long, global = true)]
    mock: bool,

    /// Path to vJoyInterface.dll.
    #[arg(long, global = true)]
    dll: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(clap::Subcommand)]
enum Cmd {
    /// Driver version and identification strings.
    Info {
        #[arg(long)]
        json: bool,
    },
    /// Ownership status of a device.
    Status { id: u8 },
    /// Acquire a device and print the controls it exposes.
    Caps {
        id: u8,
        #[arg(long)]
        json: bool,
    },
    /// Acquire a device, set controls and submit them.
    Set {
        id: u8,
        /// NAME=VALUE with VALUE in -1.0..=1.0, e.g. `x=-0.5`.
        #[arg(long = "axis", value_parser = parse_axis)]
        axes: Vec<(AxisName, f32)>,
        /// 0-based button index to press.
        #[arg(long = "button")]
        buttons: Vec<usize>,
        /// INDEX=DIRECTION (north, east, ..., off) or INDEX=HUNDREDTHS_OF_DEGREE.
        #[arg(long = "hat", value_parser = parse_hat)]
        hats: Vec<(usize, HatValue)>,
        /// Keep the device acquired this many seconds before releasing it.
        #[arg(long, default_value_t = 0.0)]
        hold: f64,
    },
    /// Reset every device on the driver side.
    ResetAll,
}

#[derive(Clone, Copy, Debug)]
enum HatValue {
    Direction(HatState),
    Degrees(i32),
}

fn parse_axis(s: &str) -> Result<(AxisName, f32)> {
    let (name, value) = s.split_once('=').context("expected NAME=VALUE")?;
    let name: AxisName = name.parse().map_err(vjoy::Error::from)?;
    let value: f32 = value.parse().with_context(|| format!("invalid axis value {value:?}"))?;
    Ok((name, value))
}

fn parse_hat(s: &str) -> Result<(usize, HatValue)> {
    let (index, value) = s.split_once('=').context("expected INDEX=VALUE")?;
    let index: usize = index.parse().with_context(|| format!("invalid hat index {index:?}"))?;
    let value = match value.parse::<i32>() {
        Ok(deg) => HatValue::Degrees(deg),
        Err(_) => HatValue::Direction(value.parse().map_err(vjoy::Error::from)?),
    };
    Ok((index, value))
}

fn device_id(id: u8) -> Result<DeviceId> {
    DeviceId::new(id).context("device ids start at 1")
}

fn connect(cli: &Cli) -> Result<Vjoy<dyn Driver>> {
    if cli.mock {
        let dev = MockDevice {
            axes: AxisSet::all(),
            buttons: 32,
            discrete_hats: 1,
            continuous_hats: 1,
            ..Default::default()
        };
        let driver: Arc<dyn Driver> = Mock::with_devices([(device_id(1)?, dev)]);
        return Ok(Vjoy::new(driver));
    }
    load_driver(cli.dll.as_deref())
}

#[cfg(windows)]
fn load_driver(path: Option<&std::path::Path>) -> Result<Vjoy<dyn Driver>> {
    let dll = match path {
        Some(p) => vjoy::Dll::load_from(p),
        None => vjoy::Dll::load(),
    }
    .context("loading the vJoy interface")?;
    let driver: Arc<dyn Driver> = dll;
    let vjoy = Vjoy::new(driver);
    if !vjoy.is_available() {
        bail!(vjoy::Error::DriverDisabled);
    }
    Ok(vjoy)
}

#[cfg(not(windows))]
fn load_driver(_path: Option<&std::path::Path>) -> Result<Vjoy<dyn Driver>> {
    bail!("the vJoy driver only exists on Windows; pass --mock for a dry run")
}

#[derive(Serialize)]
struct DriverInfo {
    version: String,
    enabled: bool,
    product: Option<String>,
    manufacturer: Option<String>,
    serial: Option<String>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(true)
        .compact()
        .init();

    let cli = Cli::parse();
    let vjoy = connect(&cli)?;

    match cli.cmd {
        Cmd::Info { json } => {
            let info = DriverInfo {
                version: format!("{:#06x}", vjoy.version()),
                enabled: vjoy.is_available(),
                product: vjoy.product(),
                manufacturer: vjoy.manufacturer(),
                serial: vjoy.serial_number(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("version:      {}", info.version);
                println!("enabled:      {}", info.enabled);
                println!("product:      {}", info.product.as_deref().unwrap_or("-"));
                println!("manufacturer: {}", info.manufacturer.as_deref().unwrap_or("-"));
                println!("serial:       {}", info.serial.as_deref().unwrap_or("-"));
            }
        }
        Cmd::Status { id } => {
            let id = device_id(id)?;
            println!("{}", serde_json::to_string(&vjoy.status(id))?);
        }
        Cmd::Caps { id, json } => {
            let dev = vjoy.acquire(device_id(id)?)?;
            let caps = dev.capabilities().clone();
            dev.relinquish()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&caps)?);
            } else {
                for axis in &caps.axes {
                    match (axis.exists, axis.bounds) {
                        (true, Some((min, max))) => println!("axis {:<8} {min}..={max}", axis.name),
                        (true, None) => println!("axis {:<8} (no bounds reported)", axis.name),
                        (false, _) => {}
                    }
                }
                println!("buttons      {}", caps.buttons);
                println!(
                    "hats         {} discrete, {} continuous",
                    caps.discrete_hats, caps.continuous_hats
                );
            }
        }
        Cmd::Set { id, axes, buttons, hats, hold } => {
            let mut dev = vjoy.acquire(device_id(id)?)?;
            for (name, value) in axes {
                let mut axis = dev.axis(name);
                if !axis.exists() {
                    info!(axis = %name, "axis not configured on this device");
                }
                axis.set_normalized(value);
            }
            for index in buttons {
                dev.button(index).press();
            }
            for (index, value) in hats {
                let mut hat = dev.hat(index);
                match value {
                    HatValue::Direction(state) => hat.set_discrete(state),
                    HatValue::Degrees(deg) => hat.set_degree_percent(deg),
                }
            }
            dev.update()?;
            info!(id = %dev.id(), "state submitted");
            if hold > 0.0 {
                std::thread::sleep(Duration::from_secs_f64(hold));
            }
            dev.relinquish()?;
        }
        Cmd::ResetAll => {
            vjoy.reset_all()?;
            info!("all devices reset");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_arguments() {
        let (name, v) = parse_axis("rz=-0.25").unwrap();
        assert_eq!(name, AxisName::Rz);
        assert_eq!(v, -0.25);
        assert!(parse_axis("rudder=1").is_err());
        assert!(parse_axis("x").is_err());
    }

    #[test]
    fn hat_arguments() {
        assert!(matches!(parse_hat("0=east"), Ok((0, HatValue::Direction(HatState::East)))));
        assert!(matches!(parse_hat("1=-1"), Ok((1, HatValue::Degrees(-1)))));
        assert!(matches!(parse_hat("2=27000"), Ok((2, HatValue::Degrees(27000)))));
        assert!(parse_hat("0=sideways").is_err());
    }

    #[test]
    fn cli_parses() {
        let cli = Cli::try_parse_from([
            "vjoyctl", "--mock", "set", "1", "--axis", "x=0.5", "--button", "3", "--hat", "0=n",
        ])
        .unwrap();
        assert!(cli.mock);
        assert!(matches!(cli.cmd, Cmd::Set { id: 1, .. }));
    }

    #[test]
    fn mock_session_runs() {
        let cli = Cli::try_parse_from(["vjoyctl", "--mock", "caps", "1"]).unwrap();
        let vjoy = connect(&cli).unwrap();
        let mut dev = vjoy.acquire(device_id(1).unwrap()).unwrap();
        assert_eq!(dev.capabilities().axis_set(), AxisSet::all());
        dev.hat(1).set_discrete(HatState::South);
        assert_eq!(dev.hat(1).raw(), 18000);
        dev.update().unwrap();
        dev.relinquish().unwrap();
    }
}
