//! Driver utilities for SenseKit
//!
//! Common status type and configuration files for device drivers.
//! Drivers are standalone structs with direct methods; a device is described
//! in configuration by the driver it uses and the init string naming its
//! pins and buses.
//!
//! # Example YAML
//!
//! ```yaml
//! devices:
//!   bumper:
//!     driver: collision
//!     init: "gpio,25"
//!   display:
//!     driver: i2c_register
//!     init: "i2c,0,0x3C"
//!     backend: simulation
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{InitStringError, SenseError, SenseResult};
use crate::init_string::{self, ParseResult};

/// Driver status for lifecycle tracking
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DriverStatus {
    /// Driver has not been initialized yet
    #[default]
    Uninitialized,
    /// Driver is ready to operate
    Ready,
    /// Driver is actively reading/writing
    Running,
    /// Driver encountered an error
    Error(String),
    /// Driver has been shut down
    Shutdown,
}

impl DriverStatus {
    /// Ready or Running
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Ready | Self::Running)
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Ready => write!(f, "Ready"),
            Self::Running => write!(f, "Running"),
            Self::Error(msg) => write!(f, "Error: {}", msg),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

// ============================================================================
// Device Configuration (YAML/TOML support)
// ============================================================================

/// Configuration for a single device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Driver identifier (e.g., "collision", "digital_input")
    pub driver: String,

    /// Init string describing the device's pins and buses
    #[serde(default)]
    pub init: String,

    /// HAL backend identifier (default: "simulation")
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Enable/disable the device (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Additional driver-specific options
    #[serde(flatten)]
    pub options: HashMap<String, serde_yaml::Value>,
}

fn default_backend() -> String {
    "simulation".to_string()
}

/// Resolve a backend alias (`sim`, `gpio`) to its canonical name. Unknown
/// names come back unchanged.
pub fn canonical_backend(backend: &str) -> &str {
    match backend {
        "simulation" | "sim" => "simulation",
        "sysfs" | "gpio" => "sysfs",
        other => other,
    }
}

fn default_enabled() -> bool {
    true
}

impl DeviceConfig {
    pub fn new(driver: &str, init: &str) -> Self {
        Self {
            driver: driver.to_string(),
            init: init.to_string(),
            backend: default_backend(),
            enabled: true,
            options: HashMap::new(),
        }
    }

    pub fn with_backend(mut self, backend: &str) -> Self {
        self.backend = backend.to_string();
        self
    }

    /// Parse the init string
    pub fn descriptors(&self) -> Result<ParseResult, InitStringError> {
        init_string::parse(&self.init)
    }

    /// Check if this uses the simulation backend
    pub fn is_simulation(&self) -> bool {
        canonical_backend(&self.backend) == "simulation"
    }

    /// Get an option value as a string
    pub fn get_option(&self, key: &str) -> Option<String> {
        self.options.get(key).and_then(|v| match v {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Get an option value as i64
    pub fn get_option_i64(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_i64())
    }

    /// Get an option value as bool
    pub fn get_option_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(|v| v.as_bool())
    }
}

/// Outcome of parsing one device's init string
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCheck {
    pub name: String,
    pub driver: String,
    pub result: Result<ParseResult, InitStringError>,
}

/// Full device configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicesConfig {
    /// Map of device name -> device config
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceConfig>,
}

impl DevicesConfig {
    /// Create a new empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from a file (auto-detect format)
    pub fn from_file<P: AsRef<Path>>(path: P) -> SenseResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SenseError::config(format!(
                "Failed to read device config {}: {}",
                path.display(),
                e
            ))
        })?;

        log::debug!("loading device config from {}", path.display());

        let extension = path.extension().and_then(|s| s.to_str());
        match extension {
            Some("toml") => Self::from_toml(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            _ => Self::from_yaml(&contents).or_else(|_| Self::from_toml(&contents)),
        }
    }

    /// Parse config from YAML string
    pub fn from_yaml(contents: &str) -> SenseResult<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| SenseError::config(format!("Failed to parse device YAML: {}", e)))
    }

    /// Parse config from TOML string
    pub fn from_toml(contents: &str) -> SenseResult<Self> {
        toml::from_str(contents)
            .map_err(|e| SenseError::config(format!("Failed to parse device TOML: {}", e)))
    }

    /// Get a device config by name
    pub fn get_device(&self, name: &str) -> SenseResult<&DeviceConfig> {
        self.devices
            .get(name)
            .ok_or_else(|| SenseError::not_found(format!("Device '{}' not in config", name)))
    }

    /// Add a device config
    pub fn add_device(&mut self, name: &str, config: DeviceConfig) {
        self.devices.insert(name.to_string(), config);
    }

    /// List all configured device names
    pub fn list_devices(&self) -> Vec<&str> {
        self.devices.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a device is configured
    pub fn has_device(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// Get all enabled devices, sorted by name
    pub fn enabled_devices(&self) -> Vec<(&str, &DeviceConfig)> {
        self.devices
            .iter()
            .filter(|(_, c)| c.enabled)
            .map(|(n, c)| (n.as_str(), c))
            .collect()
    }

    /// Parse the init string of every enabled device
    pub fn check_devices(&self) -> Vec<DeviceCheck> {
        self.enabled_devices()
            .into_iter()
            .map(|(name, config)| DeviceCheck {
                name: name.to_string(),
                driver: config.driver.clone(),
                result: config.descriptors(),
            })
            .collect()
    }

    /// Fail on the first enabled device whose init string does not parse
    pub fn validate(&self) -> SenseResult<()> {
        for check in self.check_devices() {
            if let Err(err) = check.result {
                return Err(SenseError::config(format!(
                    "Device '{}': {}",
                    check.name, err
                )));
            }
        }
        Ok(())
    }

    /// Standard search locations, in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("devices.yaml"),
            PathBuf::from("devices.yml"),
            PathBuf::from("devices.toml"),
            PathBuf::from("sensekit_devices.yaml"),
            PathBuf::from("sensekit_devices.toml"),
        ];

        if let Some(home) = dirs::home_dir() {
            let sensekit_dir = home.join(".sensekit");
            paths.push(sensekit_dir.join("devices.yaml"));
            paths.push(sensekit_dir.join("devices.toml"));
        }

        paths
    }

    /// Find and load config from standard search paths
    pub fn find_and_load() -> SenseResult<Self> {
        Self::find_and_load_with_path().map(|(config, _)| config)
    }

    /// Like [`find_and_load`](Self::find_and_load), also returning the file
    /// that was loaded
    pub fn find_and_load_with_path() -> SenseResult<(Self, PathBuf)> {
        let searched = Self::search_paths();
        match searched.iter().find(|p| p.exists()) {
            Some(path) => {
                log::debug!("loading devices file {}", path.display());
                Ok((Self::from_file(path)?, path.clone()))
            }
            None => {
                let list: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
                Err(SenseError::config(format!(
                    "No devices file found. Searched: {}",
                    list.join(", ")
                )))
            }
        }
    }

    /// Save config to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SenseResult<()> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|s| s.to_str());

        let contents = match extension {
            Some("toml") => toml::to_string_pretty(self)?,
            _ => serde_yaml::to_string(self)?,
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_string::Descriptor;

    #[test]
    fn test_driver_status_display() {
        assert_eq!(DriverStatus::Ready.to_string(), "Ready");
        assert_eq!(
            DriverStatus::Error("test".to_string()).to_string(),
            "Error: test"
        );
        assert!(DriverStatus::Running.is_operational());
        assert!(!DriverStatus::Shutdown.is_operational());
    }

    #[test]
    fn test_device_config_defaults() {
        let config = DeviceConfig::new("collision", "gpio,25");
        assert_eq!(config.backend, "simulation");
        assert!(config.is_simulation());
        assert!(config.enabled);
        assert_eq!(
            config.descriptors().unwrap().descriptors(),
            &[Descriptor::gpio(25)]
        );
    }

    #[test]
    fn test_simulation_backend_aliases() {
        assert!(DeviceConfig::new("collision", "gpio,1").with_backend("sim").is_simulation());
        assert!(!DeviceConfig::new("collision", "gpio,1").with_backend("simd").is_simulation());
        assert!(!DeviceConfig::new("collision", "gpio,1").with_backend("sysfs").is_simulation());
        assert_eq!(canonical_backend("gpio"), "sysfs");
        assert_eq!(canonical_backend("simd"), "simd");
    }

    #[test]
    fn test_devices_config_yaml() {
        let yaml = r#"
devices:
  bumper:
    driver: collision
    init: "gpio,25"
  display:
    driver: i2c_register
    init: "i2c,0,0x3C"
    backend: sysfs
    inverted: true
"#;
        let config = DevicesConfig::from_yaml(yaml).unwrap();

        let bumper = config.get_device("bumper").unwrap();
        assert_eq!(bumper.driver, "collision");
        assert!(bumper.is_simulation());

        let display = config.get_device("display").unwrap();
        assert_eq!(display.backend, "sysfs");
        assert_eq!(display.get_option_bool("inverted"), Some(true));

        assert!(config.has_device("bumper"));
        assert!(config.get_device("nonexistent").unwrap_err().is_not_found());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_devices_config_toml() {
        let toml = r#"
[devices.bumper]
driver = "collision"
init = "gpio,25"

[devices.sensor]
driver = "i2c_register"
init = "i2c,1,0x68"
"#;
        let config = DevicesConfig::from_toml(toml).unwrap();
        assert_eq!(config.list_devices(), vec!["bumper", "sensor"]);
        let sensor = config.get_device("sensor").unwrap();
        assert_eq!(sensor.descriptors().unwrap().i2c(0).unwrap().address, 0x68);
    }

    #[test]
    fn test_enabled_devices() {
        let yaml = r#"
devices:
  active:
    driver: digital_input
    init: "gpio,1"
  inactive:
    driver: digital_input
    init: "not,valid"
    enabled: false
"#;
        let config = DevicesConfig::from_yaml(yaml).unwrap();
        let enabled = config.enabled_devices();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].0, "active");

        // Disabled devices are not validated
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_names_device() {
        let mut config = DevicesConfig::new();
        config.add_device("ok", DeviceConfig::new("collision", "gpio,2"));
        config.add_device("broken", DeviceConfig::new("collision", "gpio,-2"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("broken"));

        let checks = config.check_devices();
        assert_eq!(checks.len(), 2);
        assert!(checks.iter().any(|c| c.name == "ok" && c.result.is_ok()));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DevicesConfig::new();
        config.add_device("bumper", DeviceConfig::new("collision", "gpio,25"));

        for file in ["devices.yaml", "devices.toml"] {
            let path = dir.path().join(file);
            config.save(&path).unwrap();
            let loaded = DevicesConfig::from_file(&path).unwrap();
            assert_eq!(loaded, config);
        }
    }
}
