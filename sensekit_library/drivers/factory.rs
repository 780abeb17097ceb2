//! Driver Factory - Create drivers from configuration
//!
//! Drivers are picked by name at runtime, so a devices file can describe a
//! whole board without compile-time selection.
//!
//! # Example
//!
//! ```rust,ignore
//! use sensekit_core::driver::DevicesConfig;
//! use sensekit_library::drivers::factory::{create_drivers_from_config, create_hal};
//!
//! let config = DevicesConfig::from_file("devices.yaml")?;
//! let hal = create_hal("simulation")?;
//! let mut drivers = create_drivers_from_config(&config, &hal)?;
//! drivers.init_all()?;
//! ```

use std::collections::BTreeMap;

use sensekit_core::driver::{canonical_backend, DeviceConfig, DevicesConfig, DriverStatus};
use sensekit_core::error::{SenseError, SenseResult};

use super::{CollisionSensor, DigitalInput, I2cRegisterDevice};
use crate::hal::Hal;
#[cfg(feature = "gpio-hardware")]
use crate::hal::HalBackend;

/// Driver names accepted in a device's `driver` field
pub const DRIVER_NAMES: &[&str] = &["collision", "digital_input", "i2c_register"];

// ============================================================================
// HAL Factory
// ============================================================================

/// Create a HAL from a backend name
///
/// # Supported Backends
///
/// - `simulation` - Always available, in-memory board
/// - `sysfs` - Linux sysfs GPIO (requires `gpio-hardware` feature)
pub fn create_hal(backend: &str) -> SenseResult<Hal> {
    match canonical_backend(backend) {
        "simulation" => Ok(Hal::simulation()),

        #[cfg(feature = "gpio-hardware")]
        "sysfs" => Hal::new(HalBackend::Sysfs),

        other => Err(SenseError::driver(format!(
            "HAL backend '{}' is not available. Available: {}",
            other,
            list_available_backends().join(", ")
        ))),
    }
}

// ============================================================================
// Device Driver Factory
// ============================================================================

/// Resolve a driver name or alias to its canonical name
pub fn canonical_driver(name: &str) -> Option<&'static str> {
    match name {
        "collision" | "bumper" => Some("collision"),
        "digital_input" | "input" => Some("digital_input"),
        "i2c_register" | "i2c" => Some("i2c_register"),
        _ => None,
    }
}

/// Type-erased device driver
#[derive(Debug)]
pub enum DeviceDriver {
    Collision(CollisionSensor),
    DigitalInput(DigitalInput),
    I2cRegister(I2cRegisterDevice),
}

impl DeviceDriver {
    /// Name used in the devices file
    pub fn driver_name(&self) -> &'static str {
        match self {
            Self::Collision(_) => "collision",
            Self::DigitalInput(_) => "digital_input",
            Self::I2cRegister(_) => "i2c_register",
        }
    }

    pub fn init(&mut self) -> SenseResult<()> {
        match self {
            Self::Collision(d) => d.init(),
            Self::DigitalInput(d) => d.init(),
            Self::I2cRegister(d) => d.init(),
        }
    }

    pub fn shutdown(&mut self) -> SenseResult<()> {
        match self {
            Self::Collision(d) => d.shutdown(),
            Self::DigitalInput(d) => d.shutdown(),
            Self::I2cRegister(d) => d.shutdown(),
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            Self::Collision(d) => d.is_available(),
            Self::DigitalInput(d) => d.is_available(),
            Self::I2cRegister(d) => d.is_available(),
        }
    }

    pub fn status(&self) -> DriverStatus {
        match self {
            Self::Collision(d) => d.status(),
            Self::DigitalInput(d) => d.status(),
            Self::I2cRegister(d) => d.status(),
        }
    }

    pub fn as_collision(&mut self) -> Option<&mut CollisionSensor> {
        match self {
            Self::Collision(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_digital_input(&mut self) -> Option<&mut DigitalInput> {
        match self {
            Self::DigitalInput(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_i2c_register(&mut self) -> Option<&mut I2cRegisterDevice> {
        match self {
            Self::I2cRegister(d) => Some(d),
            _ => None,
        }
    }
}

/// Create one driver from its device entry
///
/// The device's `backend` must name the backend `hal` runs on.
///
/// # Supported Drivers
///
/// - `collision` - Bumper switch on a GPIO input
/// - `digital_input` - Plain GPIO input, honors an `inverted` option
/// - `i2c_register` - Register-mapped I2C chip
pub fn create_driver(name: &str, config: &DeviceConfig, hal: &Hal) -> SenseResult<DeviceDriver> {
    if canonical_backend(&config.backend) != hal.name() {
        return Err(SenseError::driver(format!(
            "device '{}' wants backend '{}' but the HAL is '{}'",
            name,
            config.backend,
            hal.name()
        )));
    }

    let driver = match canonical_driver(&config.driver) {
        Some("collision") => DeviceDriver::Collision(CollisionSensor::new(&config.init, hal)?),
        Some("digital_input") => {
            let inverted = config.get_option_bool("inverted").unwrap_or(false);
            DeviceDriver::DigitalInput(DigitalInput::new(&config.init, hal)?.inverted(inverted))
        }
        Some("i2c_register") => {
            DeviceDriver::I2cRegister(I2cRegisterDevice::new(&config.init, hal)?)
        }
        _ => {
            return Err(SenseError::driver(format!(
                "device '{}': unknown driver '{}'. Available: {}",
                name,
                config.driver,
                DRIVER_NAMES.join(", ")
            )));
        }
    };

    log::debug!("created {} driver for '{}'", driver.driver_name(), name);
    Ok(driver)
}

// ============================================================================
// Convenience: Create all drivers from DevicesConfig
// ============================================================================

/// Drivers created from a devices file, keyed by device name
#[derive(Debug, Default)]
pub struct CreatedDrivers {
    drivers: BTreeMap<String, DeviceDriver>,
}

impl CreatedDrivers {
    pub fn get(&self, name: &str) -> Option<&DeviceDriver> {
        self.drivers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DeviceDriver> {
        self.drivers.get_mut(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.drivers.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Initialize every driver, stopping at the first failure
    pub fn init_all(&mut self) -> SenseResult<()> {
        for (name, driver) in self.drivers.iter_mut() {
            driver.init().map_err(|e| {
                log::error!("failed to initialize '{}': {}", name, e);
                e
            })?;
        }
        Ok(())
    }

    pub fn shutdown_all(&mut self) {
        for (name, driver) in self.drivers.iter_mut() {
            if let Err(e) = driver.shutdown() {
                log::warn!("failed to shut down '{}': {}", name, e);
            }
        }
    }
}

/// Create a driver for every enabled device
///
/// Creation is all or nothing: if one device fails, drivers created so far
/// are dropped and their resources released.
pub fn create_drivers_from_config(
    config: &DevicesConfig,
    hal: &Hal,
) -> SenseResult<CreatedDrivers> {
    let mut created = CreatedDrivers::default();

    for (name, device) in config.enabled_devices() {
        let driver = create_driver(name, device, hal).map_err(|e| {
            log::error!("device '{}' ({}): {}", name, device.driver, e);
            e
        })?;
        created.drivers.insert(name.to_string(), driver);
    }

    Ok(created)
}

/// List driver names accepted in devices files
pub fn list_available_drivers() -> Vec<&'static str> {
    DRIVER_NAMES.to_vec()
}

/// List HAL backends compiled into this build
#[allow(unused_mut)]
pub fn list_available_backends() -> Vec<&'static str> {
    let mut backends = vec!["simulation"];
    #[cfg(feature = "gpio-hardware")]
    backends.push("sysfs");
    backends
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_hal() {
        assert_eq!(create_hal("simulation").unwrap().name(), "simulation");
        assert_eq!(create_hal("sim").unwrap().name(), "simulation");
        assert!(create_hal("quantum").is_err());
    }

    #[test]
    fn test_create_each_driver() {
        let hal = Hal::simulation();
        let collision =
            create_driver("bumper", &DeviceConfig::new("collision", "gpio,25"), &hal).unwrap();
        let input =
            create_driver("button", &DeviceConfig::new("digital_input", "gpio,26"), &hal).unwrap();
        let chip =
            create_driver("imu", &DeviceConfig::new("i2c_register", "i2c,1,0x68"), &hal).unwrap();

        assert_eq!(collision.driver_name(), "collision");
        assert_eq!(input.driver_name(), "digital_input");
        assert_eq!(chip.driver_name(), "i2c_register");
        assert!(collision.is_available());
        assert_eq!(hal.claimed_count(), 3);
    }

    #[test]
    fn test_unknown_driver_error() {
        let hal = Hal::simulation();
        let result = create_driver("x", &DeviceConfig::new("teleporter", "gpio,1"), &hal);
        let err = result.err().unwrap().to_string();
        assert!(err.contains("teleporter"));
        assert!(err.contains("collision"));
    }

    #[test]
    fn test_backend_mismatch() {
        let hal = Hal::simulation();
        let config = DeviceConfig::new("collision", "gpio,1").with_backend("sysfs");
        assert!(create_driver("bumper", &config, &hal).is_err());
        assert_eq!(hal.claimed_count(), 0);
    }

    #[test]
    fn test_backend_prefix_is_not_simulation() {
        let hal = Hal::simulation();
        let config = DeviceConfig::new("collision", "gpio,1").with_backend("simd");
        assert!(!config.is_simulation());
        assert!(create_hal("simd").is_err());
        assert!(create_driver("bumper", &config, &hal).is_err());
    }

    #[test]
    fn test_inverted_option() {
        let hal = Hal::simulation();
        let config = DevicesConfig::from_yaml(
            r#"
devices:
  door:
    driver: digital_input
    init: "gpio,9"
    inverted: true
"#,
        )
        .unwrap();

        let mut drivers = create_drivers_from_config(&config, &hal).unwrap();
        drivers.init_all().unwrap();
        hal.as_simulation().unwrap().set_gpio(9, true);

        let door = drivers.get_mut("door").unwrap().as_digital_input().unwrap();
        assert!(!door.read().unwrap());
    }

    #[test]
    fn test_create_drivers_from_config() {
        let hal = Hal::simulation();
        let config = DevicesConfig::from_yaml(
            r#"
devices:
  bumper:
    driver: collision
    init: "gpio,25"
  display:
    driver: i2c_register
    init: "i2c,0,0x3C"
  spare:
    driver: collision
    init: "gpio,26"
    enabled: false
"#,
        )
        .unwrap();

        let mut drivers = create_drivers_from_config(&config, &hal).unwrap();
        assert_eq!(drivers.names(), vec!["bumper", "display"]);
        drivers.init_all().unwrap();
        assert_eq!(
            drivers.get("bumper").unwrap().status(),
            DriverStatus::Ready
        );

        drivers.shutdown_all();
        assert_eq!(
            drivers.get("display").unwrap().status(),
            DriverStatus::Shutdown
        );
    }

    #[test]
    fn test_failed_config_releases_everything() {
        let hal = Hal::simulation();
        let mut config = DevicesConfig::new();
        config.add_device("a", DeviceConfig::new("collision", "gpio,1"));
        config.add_device("b", DeviceConfig::new("collision", "gpio,1"));

        let err = create_drivers_from_config(&config, &hal).err().unwrap();
        assert!(err.is_busy());
        assert_eq!(hal.claimed_count(), 0);
    }

    #[test]
    fn test_driver_aliases() {
        assert_eq!(canonical_driver("bumper"), Some("collision"));
        assert_eq!(canonical_driver("i2c"), Some("i2c_register"));
        assert_eq!(canonical_driver("teleporter"), None);
    }

    #[test]
    fn test_list_available() {
        assert!(list_available_drivers().contains(&"collision"));
        assert_eq!(list_available_backends()[0], "simulation");
    }
}
