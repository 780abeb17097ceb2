//! Linux sysfs GPIO backend
//!
//! Only GPIO is available through sysfs; other resource kinds are rejected
//! when opened.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use sysfs_gpio::Pin;

use sensekit_core::error::{SenseError, SenseResult};
use sensekit_core::init_string::Direction;

const BACKEND: &str = "sysfs";

fn to_sysfs(direction: Direction) -> sysfs_gpio::Direction {
    match direction {
        Direction::In => sysfs_gpio::Direction::In,
        Direction::Out => sysfs_gpio::Direction::Out,
    }
}

/// sysfs GPIO backend
pub struct SysfsHal {
    /// Exported pins
    pins: Mutex<HashMap<u32, Pin>>,
}

impl SysfsHal {
    pub fn new() -> SenseResult<Self> {
        Ok(Self {
            pins: Mutex::new(HashMap::new()),
        })
    }

    pub fn is_available(&self) -> bool {
        std::path::Path::new("/sys/class/gpio").exists()
    }

    pub(super) fn open_gpio(&self, pin_num: u32, direction: Direction) -> SenseResult<()> {
        let pin = Pin::new(pin_num as u64);

        pin.export().map_err(|e| {
            SenseError::invalid_pin(format!("Failed to export GPIO {}: {}", pin_num, e))
        })?;

        // Wait for sysfs to settle
        thread::sleep(Duration::from_millis(10));

        if let Err(e) = pin.set_direction(to_sysfs(direction)) {
            let _ = pin.unexport();
            return Err(SenseError::hal(
                BACKEND,
                format!("Failed to set GPIO {} direction: {}", pin_num, e),
            ));
        }

        self.pins.lock().insert(pin_num, pin);
        Ok(())
    }

    pub(super) fn set_direction(&self, pin_num: u32, direction: Direction) -> SenseResult<()> {
        let pins = self.pins.lock();
        let pin = pins
            .get(&pin_num)
            .ok_or_else(|| SenseError::invalid_pin(format!("GPIO {} is not open", pin_num)))?;
        pin.set_direction(to_sysfs(direction)).map_err(|e| {
            SenseError::hal(
                BACKEND,
                format!("Failed to set GPIO {} direction: {}", pin_num, e),
            )
        })
    }

    pub(super) fn gpio_read(&self, pin_num: u32) -> SenseResult<bool> {
        let pins = self.pins.lock();
        let pin = pins
            .get(&pin_num)
            .ok_or_else(|| SenseError::invalid_pin(format!("GPIO {} is not open", pin_num)))?;
        let value = pin.get_value().map_err(|e| {
            SenseError::hal(BACKEND, format!("Failed to read GPIO {}: {}", pin_num, e))
        })?;
        Ok(value != 0)
    }

    pub(super) fn gpio_write(&self, pin_num: u32, value: bool) -> SenseResult<()> {
        let pins = self.pins.lock();
        let pin = pins
            .get(&pin_num)
            .ok_or_else(|| SenseError::invalid_pin(format!("GPIO {} is not open", pin_num)))?;
        pin.set_value(u8::from(value)).map_err(|e| {
            SenseError::hal(BACKEND, format!("Failed to write GPIO {}: {}", pin_num, e))
        })
    }

    pub(super) fn close_gpio(&self, pin_num: u32) {
        if let Some(pin) = self.pins.lock().remove(&pin_num) {
            if let Err(e) = pin.unexport() {
                log::warn!("Failed to unexport GPIO {}: {}", pin_num, e);
            }
        }
    }
}
